//! Terminal styling for command output
//!
//! Printed through `anstream`, which strips the colors when stdout is not a
//! terminal.

use owo_colors::OwoColorize;
use std::fmt::Display;

/// Marker for completed work
pub const CHECK: &str = "✓";

/// Marker for skipped work
pub const SKIP: &str = "-";

/// Semantic styles for CLI output
pub trait Stylize {
    /// Headings and key values
    fn emphasis(&self) -> String;
    /// Secondary information
    fn muted(&self) -> String;
    /// Counts, names and URLs
    fn accent(&self) -> String;
    /// Successful outcomes
    fn success(&self) -> String;
    /// Things that need attention
    fn warning(&self) -> String;
}

impl<T: Display> Stylize for T {
    fn emphasis(&self) -> String {
        self.bold().to_string()
    }

    fn muted(&self) -> String {
        self.dimmed().to_string()
    }

    fn accent(&self) -> String {
        self.cyan().to_string()
    }

    fn success(&self) -> String {
        self.green().to_string()
    }

    fn warning(&self) -> String {
        self.yellow().to_string()
    }
}
