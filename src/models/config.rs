use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The only configuration schema this build understands.
pub const SUPPORTED_SCHEMA: u32 = 1;

/// Parsed `.agent-instructions.yaml`.
///
/// Directory fields are kept exactly as written (project-relative); callers
/// join them onto the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(rename = "schema")]
    pub schema_version: u32,
    pub partials_dir: PathBuf,
    pub templates_dir: PathBuf,
    #[serde(rename = "output")]
    pub outputs: Vec<OutputTarget>,
}

/// Where a rendered template ends up.
///
/// The variant decides the destination root: agent outputs land relative to
/// the project root, cursor rules relative to `.cursor/rules`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawOutputTarget", into = "RawOutputTarget")]
pub enum OutputTarget {
    Agent {
        agent: String,
        template: PathBuf,
        out_file: PathBuf,
    },
    CursorRule {
        name: String,
        template: PathBuf,
        out_file: PathBuf,
    },
}

impl OutputTarget {
    pub fn template(&self) -> &PathBuf {
        match self {
            Self::Agent { template, .. } | Self::CursorRule { template, .. } => template,
        }
    }

    pub fn out_file(&self) -> &PathBuf {
        match self {
            Self::Agent { out_file, .. } | Self::CursorRule { out_file, .. } => out_file,
        }
    }

    pub fn is_cursor_rule(&self) -> bool {
        matches!(self, Self::CursorRule { .. })
    }

    /// Agent name or rule name, for log lines.
    pub fn label(&self) -> &str {
        match self {
            Self::Agent { agent, .. } => agent,
            Self::CursorRule { name, .. } => name,
        }
    }
}

/// Wire shape of one `output` entry before the variant is decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOutputTarget {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    template: PathBuf,
    out_file: PathBuf,
}

const CURSOR_RULE_KIND: &str = "cursor-rule";

impl TryFrom<RawOutputTarget> for OutputTarget {
    type Error = String;

    fn try_from(raw: RawOutputTarget) -> Result<Self, Self::Error> {
        match (raw.kind.as_deref(), raw.agent, raw.name) {
            (Some(CURSOR_RULE_KIND), _, Some(name)) => Ok(Self::CursorRule {
                name,
                template: raw.template,
                out_file: raw.out_file,
            }),
            (Some(CURSOR_RULE_KIND), _, None) => {
                Err("cursor-rule output is missing field `name`".to_string())
            }
            (_, Some(agent), _) => Ok(Self::Agent {
                agent,
                template: raw.template,
                out_file: raw.out_file,
            }),
            (Some(other), None, _) => Err(format!(
                "unknown output type '{}', expected '{}'",
                other, CURSOR_RULE_KIND
            )),
            (None, None, _) => Err(format!(
                "output entry needs either `agent` or `type: {}`",
                CURSOR_RULE_KIND
            )),
        }
    }
}

impl From<OutputTarget> for RawOutputTarget {
    fn from(target: OutputTarget) -> Self {
        match target {
            OutputTarget::Agent {
                agent,
                template,
                out_file,
            } => Self {
                kind: None,
                agent: Some(agent),
                name: None,
                template,
                out_file,
            },
            OutputTarget::CursorRule {
                name,
                template,
                out_file,
            } => Self {
                kind: Some(CURSOR_RULE_KIND.to_string()),
                agent: None,
                name: Some(name),
                template,
                out_file,
            },
        }
    }
}
