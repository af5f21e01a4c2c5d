//! updatebot - propagate version bumps to downstream repositories
//!
//! Reads a declarative set of update rules, applies each rule's changes to a
//! working copy of every target repository, and opens (or reuses) a pull
//! request per repository with resolved assignees.
//!
//! The crate is split along the flow of a run:
//!
//! - [`config`]: the `updatebot.yaml` schema and version/config loading
//! - [`discovery`]: dynamic target repository discovery for Go changes
//! - [`changes`]: the change strategies and the sparse-checkout planner
//! - [`engine`]: rule processing, PR reconciliation and assignee resolution
//! - [`git`], [`runner`], [`platform`]: collaborators for git, external
//!   commands and the hosting service

pub mod auth;
pub mod changes;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod git;
pub mod platform;
pub mod runner;
pub mod types;
