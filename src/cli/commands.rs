//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use tracing::{debug, instrument};

use crate::application::services::{HierarchyService, HierarchyView, ViewQuery};
use crate::cli::args::{Cli, Commands, ConfigCommands, ViewArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{flatten, ExpandedSet, SortDirection, SortKey, TreeNode};
use crate::infrastructure::{InfraError, JsonFileSource};
use crate::tree_traits::{TreeNodeConvert, MAX_RENDER_DEPTH};

/// Levels drawn as indentation; deeper rows show their level number instead.
const MAX_INDENT_LEVELS: usize = 32;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let config_dir = resolve_config_dir(cli.config_dir.as_deref())?;
    let settings = Settings::load(Some(&config_dir))?;
    debug!("settings: {:?}", settings);

    match command {
        Commands::Tree {
            file,
            view,
            expand,
            expand_all,
        } => cmd_tree(&settings, file, view, expand, *expand_all),
        Commands::Orphans {
            file,
            view,
            page,
            page_size,
        } => cmd_orphans(&settings, file, view, *page, *page_size),
        Commands::Show { file } => cmd_show(file),
        Commands::Config { command } => cmd_config(&settings, command, &config_dir),
        Commands::Completion { .. } => Ok(()),
    }
}

fn resolve_config_dir(dir: Option<&Path>) -> CliResult<PathBuf> {
    match dir {
        Some(d) => Ok(d.to_path_buf()),
        None => std::env::current_dir()
            .map_err(|e| CliError::Infra(InfraError::io("determine current directory", e))),
    }
}

fn load_service(file: &Path) -> CliResult<HierarchyService> {
    let mut service = HierarchyService::with_source(Arc::new(JsonFileSource::new(file)));
    service.try_refresh()?;
    let skipped = service.resolution().skipped_count();
    if skipped > 0 {
        output::warning(&format!("skipped {skipped} malformed record(s)"));
    }
    Ok(service)
}

fn build_query(settings: &Settings, view: &ViewArgs) -> CliResult<ViewQuery> {
    let mut query = ViewQuery::from_settings(settings);
    if let Some(text) = &view.filter {
        query = query.with_filter(settings.text_query(text)?);
    }
    let key = match &view.sort {
        Some(s) => s
            .parse::<SortKey>()
            .map_err(|e| CliError::InvalidArgs(e.to_string()))?,
        None => settings.sort.key,
    };
    let direction = if view.desc {
        SortDirection::Desc
    } else if view.sort.is_some() {
        SortDirection::Asc
    } else {
        settings.sort.direction
    };
    Ok(query.with_sort(key, direction))
}

#[instrument(skip(settings))]
fn cmd_tree(
    settings: &Settings,
    file: &Path,
    view: &ViewArgs,
    expand: &[String],
    expand_all: bool,
) -> CliResult<()> {
    let service = load_service(file)?;
    let query = build_query(settings, view)?;

    let mut expanded: ExpandedSet = expand.iter().cloned().collect();
    if expand_all {
        expanded.expand_all(&service.resolution().forest);
    } else if settings.expand_roots {
        for root in &service.resolution().forest {
            expanded.expand(root.ref_id.clone());
        }
    }

    let view = service.view(&query, &expanded);
    print_rows(&view);
    print_summary(&view, service.resolution().orphans.len());
    Ok(())
}

/// Row indentation, capped so output stays linear in the number of rows.
fn indent(level: usize) -> String {
    if level <= MAX_INDENT_LEVELS {
        "  ".repeat(level)
    } else {
        format!("{}[{level}] ", "  ".repeat(MAX_INDENT_LEVELS))
    }
}

fn print_rows(view: &HierarchyView) {
    for row in &view.forest_rows {
        let marker = match (row.has_children, row.expanded) {
            (true, true) => "▾",
            (true, false) => "▸",
            (false, _) => " ",
        };
        output::info(&format!(
            "{}{} {} {} {} {}",
            indent(row.level),
            marker,
            row.record,
            format!("[{}]", row.ref_id).dimmed(),
            output::status(row.record.status),
            output::link(row.link),
        ));
    }
}

fn print_summary(view: &HierarchyView, total_orphans: usize) {
    output::detail(&format!(
        "{} root(s) shown, {} orphan(s) matching of {}, {} skipped",
        view.forest.len(),
        view.orphans.len(),
        total_orphans,
        view.skipped_count
    ));
}

#[instrument(skip(settings))]
fn cmd_orphans(
    settings: &Settings,
    file: &Path,
    view: &ViewArgs,
    page: usize,
    page_size: Option<usize>,
) -> CliResult<()> {
    if page == 0 {
        return Err(CliError::InvalidArgs("page starts at 1".into()));
    }
    if page_size == Some(0) {
        return Err(CliError::InvalidArgs("page size must be at least 1".into()));
    }

    let service = load_service(file)?;
    let mut query = build_query(settings, view)?.with_page(page);
    if let Some(size) = page_size {
        query = query.with_page_size(size);
    }

    let view = service.view(&query, &ExpandedSet::new());
    output::header(&format!(
        "Orphans: page {} of {} ({} total)",
        page,
        view.orphan_total_pages,
        view.orphans.len()
    ));
    for row in &view.orphan_rows {
        output::info(&format!(
            "{} {} {} {}",
            row.record,
            format!("[{}]", row.record.id).dimmed(),
            output::status(row.record.status),
            output::orphan_reason(row.reason),
        ));
    }
    if view.orphan_rows.is_empty() && page > view.orphan_total_pages {
        output::warning(&format!("no orphans on page {page}"));
    }
    Ok(())
}

#[instrument]
fn cmd_show(file: &Path) -> CliResult<()> {
    let service = load_service(file)?;
    let resolution = service.resolution();

    output::header("Forest");
    for root in &resolution.forest {
        print_tree(root);
    }

    output::header("Orphans");
    for orphan in &resolution.orphans {
        output::detail(&format!(
            "{} [{}] {}",
            orphan,
            orphan.id,
            output::orphan_reason(resolution.orphan_reason(&orphan.id))
        ));
    }

    output::detail(&format!(
        "{} record(s): {} in forest under {} root(s), {} orphan(s), {} skipped",
        resolution.record_count() + resolution.skipped_count(),
        resolution.record_count() - resolution.orphans.len(),
        resolution.forest.len(),
        resolution.orphans.len(),
        resolution.skipped_count()
    ));
    Ok(())
}

fn print_tree(root: &TreeNode) {
    let depth = root.depth();
    if depth <= MAX_RENDER_DEPTH {
        output::info(&root.to_tree_string());
        return;
    }
    output::warning(&format!(
        "{} [{}] is {depth} levels deep, printing flat rows",
        root.record, root.ref_id
    ));
    let mut expanded = ExpandedSet::new();
    expanded.expand_all(std::slice::from_ref(root));
    for row in flatten(std::slice::from_ref(root), &expanded) {
        output::info(&format!(
            "{}{} {}",
            indent(row.level),
            row.node.record,
            format!("[{}]", row.node.ref_id).dimmed(),
        ));
    }
}

fn cmd_config(settings: &Settings, command: &ConfigCommands, config_dir: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unavailable>".into());
            output::info(&format!("global: {global}"));
            output::info(&format!(
                "local:  {}",
                local_config_path(config_dir).display()
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_shallow_level_when_indenting_then_two_spaces_per_level() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(3), "      ");
    }

    #[test]
    fn given_level_beyond_cap_when_indenting_then_width_capped_and_level_shown() {
        let deep = indent(100_000);
        assert_eq!(deep.len(), indent(MAX_INDENT_LEVELS).len() + "[100000] ".len());
        assert!(deep.ends_with("[100000] "));
    }
}
