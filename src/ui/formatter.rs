//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Styling goes through `console`, which drops colors when output is not a terminal.

use console::style;

use crate::boundary::BoundaryWarning;
use crate::domain::{Version, VersionBump};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Text of the release proposal shown before asking for confirmation.
pub fn format_proposed_release(latest: &Version, next: &Version, bump: VersionBump) -> String {
    format!(
        "{}\n  From: {}\n  To:   {} ({} bump)",
        style("Proposed release:").bold(),
        style(latest).red(),
        style(next).green(),
        bump
    )
}

/// Display the version change about to be released.
///
/// # Arguments
/// * `latest` - Latest released version (0.0.0 when there is none)
/// * `next` - Version that will be released
/// * `bump` - Which component was bumped
pub fn display_proposed_release(latest: &Version, next: &Version, bump: VersionBump) {
    println!("\n{}", format_proposed_release(latest, next, bump));
}

/// Report a boundary warning through the log.
///
/// # Arguments
/// * `warning` - The boundary warning to display
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    log::warn!("{}", warning);
}

/// Display the commands an operator has to run by hand.
pub fn display_manual_recovery(steps: &[String]) {
    eprintln!("{}", style("Manual recovery steps:").yellow().bold());
    for (i, step) in steps.iter().enumerate() {
        eprintln!("  {}. {}", i + 1, style(step).cyan());
    }
}
