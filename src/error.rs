//! Error taxonomy shared by the build pipeline, the watcher and the tools.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{} not found. Please run \"init\" first.", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration in {}: {reason}", path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Template not found: {}", path.display())]
    TemplateNotFound { path: PathBuf },

    #[error("Failed to render {name}: {reason}")]
    RenderFailed { name: String, reason: String },

    #[error("Failed to write {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid file name '{0}': must be a plain file name")]
    InvalidName(String),

    #[error("File already exists: {}", path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Watcher is already running (pid {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("Watcher is not running")]
    NotRunning,

    #[error("Failed to start watcher: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to watch {}: {reason}", path.display())]
    WatchFailed { path: PathBuf, reason: String },

    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    #[error("Invalid arguments for '{tool}': {reason}")]
    InvalidArguments { tool: String, reason: String },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
