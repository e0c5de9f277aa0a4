//! Shared styling utilities for terminal output.

use console::Style;

use rostermail_core::models::MatchStatus;

/// Create a success-styled string (green with checkmark).
pub fn success(msg: &str) -> String {
    let style = Style::new().green();
    format!("{} {}", style.apply_to("✓"), msg)
}

/// Create a warning-styled string (yellow).
pub fn warn(msg: &str) -> String {
    let style = Style::new().yellow();
    format!("{} {}", style.apply_to("⚠"), msg)
}

/// Create a header-styled string (bold, white).
pub fn header(msg: &str) -> String {
    let style = Style::new().bold();
    style.apply_to(msg).to_string()
}

/// Create a dim-styled string.
pub fn dim(msg: &str) -> String {
    let style = Style::new().dim();
    style.apply_to(msg).to_string()
}

/// Label for a match status, colored by how much attention it needs.
pub fn status(status: MatchStatus) -> String {
    let style = match status {
        MatchStatus::Exact => Style::new().green(),
        MatchStatus::Normalized => Style::new().cyan(),
        MatchStatus::Ambiguous => Style::new().yellow().bold(),
        MatchStatus::Unmatched => Style::new().red(),
    };
    style.apply_to(status.as_str()).to_string()
}
