//! Loading and validating `.agent-instructions.yaml`.
//!
//! The build, validate and watch paths use [`load`] and hard-fail when the
//! file is missing or malformed. The tool layer resolves only the two
//! directories through [`ToolDirs::resolve`], whose fallback behaviour is an
//! explicit [`DirPolicy`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::{Config, SUPPORTED_SCHEMA};

/// File name of the configuration, relative to the project root.
pub const CONFIG_FILE: &str = ".agent-instructions.yaml";

/// Directories used by the tools when the fallback policy applies.
pub const DEFAULT_PARTIALS_DIR: &str = "docs/agent-partials";
pub const DEFAULT_TEMPLATES_DIR: &str = "docs/agent-templates";

/// Environment variable that turns on [`DirPolicy::FallbackToDefaults`].
pub const DEFAULT_DIRS_ENV: &str = "AGENT_CONTEXT_DEFAULT_DIRS";

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// Read and validate the configuration under `root`.
pub fn load(root: &Path) -> Result<Config> {
    let path = config_path(root);
    let text = read_config_text(&path)?;
    parse(&path, &text)
}

/// Validate configuration text. `path` is only used in error messages.
pub fn parse(path: &Path, text: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(text).map_err(|e| Error::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if config.schema_version != SUPPORTED_SCHEMA {
        return Err(Error::ConfigInvalid {
            path: path.to_path_buf(),
            reason: format!(
                "unsupported schema version {} (expected {})",
                config.schema_version, SUPPORTED_SCHEMA
            ),
        });
    }

    Ok(config)
}

fn read_config_text(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::ConfigNotFound {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// How the tool layer behaves when the configuration cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DirPolicy {
    /// Surface the configuration error, same as the CLI commands.
    #[default]
    Strict,
    /// Fall back to [`DEFAULT_PARTIALS_DIR`] and [`DEFAULT_TEMPLATES_DIR`].
    FallbackToDefaults,
}

impl DirPolicy {
    /// Policy from [`DEFAULT_DIRS_ENV`]; `1` or `true` enables the fallback.
    pub fn from_env() -> Self {
        match std::env::var(DEFAULT_DIRS_ENV).as_deref() {
            Ok("1") | Ok("true") => Self::FallbackToDefaults,
            _ => Self::Strict,
        }
    }
}

/// The subset of the configuration the tools need.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirsOnly {
    partials_dir: PathBuf,
    templates_dir: PathBuf,
}

/// Absolute partial and template directories for the tool layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDirs {
    pub partials_dir: PathBuf,
    pub templates_dir: PathBuf,
}

impl ToolDirs {
    pub fn resolve(root: &Path, policy: DirPolicy) -> Result<Self> {
        match Self::from_config(root) {
            Ok(dirs) => Ok(dirs),
            Err(e) if policy == DirPolicy::FallbackToDefaults => {
                tracing::warn!("{}. Using default 'docs' directories.", e);
                Ok(Self::defaults(root))
            }
            Err(e) => Err(e),
        }
    }

    pub fn defaults(root: &Path) -> Self {
        Self {
            partials_dir: root.join(DEFAULT_PARTIALS_DIR),
            templates_dir: root.join(DEFAULT_TEMPLATES_DIR),
        }
    }

    fn from_config(root: &Path) -> Result<Self> {
        let path = config_path(root);
        let text = read_config_text(&path)?;
        let dirs: DirsOnly = serde_yaml::from_str(&text).map_err(|e| Error::ConfigInvalid {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            partials_dir: root.join(dirs.partials_dir),
            templates_dir: root.join(dirs.templates_dir),
        })
    }
}
