//! Domain models for agent-context.
//!
//! # Core Concepts
//!
//! - [`Config`]: the declarative build configuration and its [`OutputTarget`]s.
//! - [`BuildOutput`]: one rendered file, produced fresh on every build and never cached.
//! - [`ValidationResult`]: drift between freshly computed outputs and the files on disk.
//! - [`WatcherStatus`]: the state of the single background watcher process.

mod config;
mod output;
mod watcher;

pub use config::*;
pub use output::*;
pub use watcher::*;
