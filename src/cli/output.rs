//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::{ColoredString, Colorize};

use crate::domain::{CaStatus, LinkKind, OrphanReason};

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print an error and each of its causes to stderr
pub fn error_chain(err: &(dyn std::error::Error + 'static)) {
    let mut messages = crate::cli::error::error_chain(err).into_iter();
    if let Some(top) = messages.next() {
        error(&top);
    }
    for cause in messages {
        eprintln!("  {}: {}", "caused by".dimmed(), cause);
    }
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

pub fn status(status: CaStatus) -> ColoredString {
    let s = status.to_string();
    match status {
        CaStatus::Active => s.green(),
        CaStatus::Pending => s.yellow(),
        CaStatus::Expired | CaStatus::Revoked => s.red(),
        CaStatus::Disabled | CaStatus::Unknown => s.dimmed(),
    }
}

/// Marker for soft-linked edges; empty for explicit ones and roots
pub fn link(link: Option<LinkKind>) -> ColoredString {
    match link {
        Some(LinkKind::Inferred) => "(inferred)".yellow(),
        _ => "".normal(),
    }
}

pub fn orphan_reason(reason: Option<OrphanReason>) -> ColoredString {
    let text = match reason {
        Some(OrphanReason::MissingParent) => "parent not found",
        Some(OrphanReason::Cycle) => "parent cycle",
        Some(OrphanReason::NoIssuerMatch) => "no issuer match",
        Some(OrphanReason::UnplacedAncestor) => "ancestor is orphaned",
        None => "unknown",
    };
    text.dimmed()
}
