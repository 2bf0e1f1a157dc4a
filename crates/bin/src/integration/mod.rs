//! Glue between the command line and the dashboard crates.
//!
//! Artifact loading with progress reporting, view commands, result
//! presentation and the interactive shell.

pub(crate) mod commands;
pub(crate) mod loader;
pub(crate) mod present;
pub(crate) mod shell;
