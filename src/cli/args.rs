//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};

/// Certificate-authority hierarchy resolver: CA forests, orphans, filtering, sorting and paging
#[derive(Parser, Debug)]
#[command(name = "catree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Directory searched for a local .catree.toml (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the CA forest as indented rows
    Tree {
        /// JSON file with CA records
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        /// Expand a node by id (repeatable)
        #[arg(short, long = "expand", value_name = "ID")]
        expand: Vec<String>,

        /// Expand every node
        #[arg(short = 'a', long)]
        expand_all: bool,
    },

    /// List orphaned CAs, one page at a time
    Orphans {
        /// JSON file with CA records
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        /// Page to show (1-indexed)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Orphans per page (default: from config)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Print the full hierarchy as a tree with a summary
    Show {
        /// JSON file with CA records
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Filter and sort options shared by `tree` and `orphans`.
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Keep records whose configured fields contain TEXT
    #[arg(short, long, value_name = "TEXT")]
    pub filter: Option<String>,

    /// Sort key: name, subject, issuer, status, type, cert_count, expiry
    #[arg(short, long, value_name = "KEY")]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long)]
    pub desc: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a template config file
    Template,
    /// Show config file locations
    Path,
}
