//! CLI commands

pub mod pr;
pub mod style;
