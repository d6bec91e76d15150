//! Typed requests and results for the tool surface.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================
// Request Types
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ReadPartialRequest {
    #[schemars(description = "The name of the partial to read.")]
    pub partial_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct UpdatePartialRequest {
    #[schemars(description = "The name of the partial to update.")]
    pub partial_name: String,
    #[schemars(description = "The new, complete content for the partial.")]
    pub new_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct CreatePartialRequest {
    #[schemars(description = "The name of the partial to create.")]
    pub partial_name: String,
    #[schemars(description = "The content of the partial to create.")]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct ReadTemplateRequest {
    #[schemars(description = "The name of the template to read.")]
    pub template_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct UpdateTemplateRequest {
    #[schemars(description = "The name of the template to update.")]
    pub template_name: String,
    #[schemars(description = "The new, complete content for the template.")]
    pub new_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct CreateTemplateRequest {
    #[schemars(description = "The name of the template to create.")]
    pub template_name: String,
    #[schemars(description = "The content of the template to create.")]
    pub content: String,
}

/// One validated tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    ListPartials,
    ReadPartial(ReadPartialRequest),
    UpdatePartial(UpdatePartialRequest),
    CreatePartial(CreatePartialRequest),
    ListTemplates,
    ReadTemplate(ReadTemplateRequest),
    UpdateTemplate(UpdateTemplateRequest),
    CreateTemplate(CreateTemplateRequest),
    BuildContextFiles,
    StartWatcher,
    StopWatcher,
}

impl ToolRequest {
    /// Every tool name, in catalogue order.
    pub const NAMES: [&'static str; 11] = [
        "list_partials",
        "read_partial",
        "update_partial",
        "create_new_partial",
        "list_templates",
        "read_template",
        "update_template",
        "create_new_template",
        "build_context_files",
        "start_watcher",
        "stop_watcher",
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListPartials => "list_partials",
            Self::ReadPartial(_) => "read_partial",
            Self::UpdatePartial(_) => "update_partial",
            Self::CreatePartial(_) => "create_new_partial",
            Self::ListTemplates => "list_templates",
            Self::ReadTemplate(_) => "read_template",
            Self::UpdateTemplate(_) => "update_template",
            Self::CreateTemplate(_) => "create_new_template",
            Self::BuildContextFiles => "build_context_files",
            Self::StartWatcher => "start_watcher",
            Self::StopWatcher => "stop_watcher",
        }
    }

    /// Decode a call by name. Missing arguments are treated as `{}`;
    /// arguments to tools that take none are ignored.
    pub fn parse(name: &str, arguments: Option<Value>) -> Result<Self> {
        let arguments = match arguments {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(value) => value,
        };

        Ok(match name {
            "list_partials" => Self::ListPartials,
            "read_partial" => Self::ReadPartial(decode(name, arguments)?),
            "update_partial" => Self::UpdatePartial(decode(name, arguments)?),
            "create_new_partial" => Self::CreatePartial(decode(name, arguments)?),
            "list_templates" => Self::ListTemplates,
            "read_template" => Self::ReadTemplate(decode(name, arguments)?),
            "update_template" => Self::UpdateTemplate(decode(name, arguments)?),
            "create_new_template" => Self::CreateTemplate(decode(name, arguments)?),
            "build_context_files" => Self::BuildContextFiles,
            "start_watcher" => Self::StartWatcher,
            "stop_watcher" => Self::StopWatcher,
            other => return Err(Error::UnknownTool(other.to_string())),
        })
    }
}

fn decode<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================
// Result Types
// ============================================================

/// Success payload of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    Names(Vec<String>),
    Content(String),
    Success { success: bool },
}

impl ToolOutput {
    pub fn success() -> Self {
        Self::Success { success: true }
    }

    /// Text form for transports that carry plain text: file content as-is,
    /// anything else as pretty JSON.
    pub fn to_text(&self) -> String {
        match self {
            Self::Content(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    UnknownTool,
    InvalidArguments,
    Failed,
}

/// Failure payload of a tool call. Every component error ends up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("Error: {message}")]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl From<Error> for ToolError {
    fn from(e: Error) -> Self {
        let kind = match e {
            Error::UnknownTool(_) => ToolErrorKind::UnknownTool,
            Error::InvalidArguments { .. } => ToolErrorKind::InvalidArguments,
            _ => ToolErrorKind::Failed,
        };
        Self {
            kind,
            message: e.to_string(),
        }
    }
}
