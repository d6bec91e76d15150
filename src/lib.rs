//! Generate agent instruction files from shared partials and templates.
//!
//! A project declares its outputs in `.agent-instructions.yaml`. Each output
//! pairs a template with a destination; templates pull in partials with
//! `{{> name}}`. The same operations are available from the CLI, over MCP
//! stdio, and as JSON-RPC over HTTP.

pub mod api;
pub mod build;
pub mod config;
pub mod error;
pub mod init;
pub mod mcp;
pub mod models;
pub mod render;
pub mod store;
pub mod supervisor;
pub mod tools;
pub mod validate;
pub mod watch;

pub use error::{Error, Result};
