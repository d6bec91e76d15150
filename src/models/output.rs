use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Directory, relative to the project root, that cursor rules are written to.
pub const CURSOR_RULES_DIR: &str = ".cursor/rules";

/// One rendered file, ready to be written or compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildOutput {
    pub out_file: PathBuf,
    pub content: String,
    pub is_cursor_rule: bool,
}

impl BuildOutput {
    /// Absolute destination under `root`.
    pub fn destination(&self, root: &Path) -> PathBuf {
        if self.is_cursor_rule {
            root.join(CURSOR_RULES_DIR).join(&self.out_file)
        } else {
            root.join(&self.out_file)
        }
    }
}

/// A configured output that could not be rendered because its template is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTarget {
    pub out_file: PathBuf,
    pub template: PathBuf,
}

/// Result of computing every output, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    pub outputs: Vec<BuildOutput>,
    pub skipped: Vec<SkippedTarget>,
}

/// Drift between computed outputs and files on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum Problem {
    Missing(PathBuf),
    OutOfDate(PathBuf),
}

impl Problem {
    pub fn path(&self) -> &Path {
        match self {
            Self::Missing(path) | Self::OutOfDate(path) => path,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(path) => write!(
                f,
                "File {} not found. Please run \"build\" first.",
                path.display()
            ),
            Self::OutOfDate(path) => write!(
                f,
                "File {} is out of date. Please run \"build\".",
                path.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub problems: Vec<Problem>,
}

impl ValidationResult {
    pub fn is_up_to_date(&self) -> bool {
        self.problems.is_empty()
    }
}
