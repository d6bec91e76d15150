//! The tool surface shared by the stdio and HTTP transports.
//!
//! [`ToolDispatcher`] turns a [`ToolRequest`] into a call on the build
//! pipeline, the file store or the watcher supervisor, and converts every
//! failure into a [`ToolError`] so nothing escapes the protocol boundary raw.

mod types;

pub use types::*;

use std::path::PathBuf;

use serde_json::Value;

use crate::build::BuildPipeline;
use crate::config::{DirPolicy, ToolDirs};
use crate::error::Result;
use crate::store;
use crate::supervisor::WatcherSupervisor;

#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    root: PathBuf,
    policy: DirPolicy,
    supervisor: WatcherSupervisor,
}

impl ToolDispatcher {
    pub fn new(root: impl Into<PathBuf>, policy: DirPolicy, supervisor: WatcherSupervisor) -> Self {
        Self {
            root: root.into(),
            policy,
            supervisor,
        }
    }

    pub fn supervisor(&self) -> &WatcherSupervisor {
        &self.supervisor
    }

    /// Decode and run a call by name.
    pub fn dispatch(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> std::result::Result<ToolOutput, ToolError> {
        let request = ToolRequest::parse(name, arguments).map_err(|e| {
            tracing::warn!(tool = name, "Rejected tool call: {}", e);
            ToolError::from(e)
        })?;
        self.call(request)
    }

    pub fn call(&self, request: ToolRequest) -> std::result::Result<ToolOutput, ToolError> {
        let tool = request.name();
        tracing::info!(tool, "Executing tool");
        self.execute(request).map_err(|e| {
            tracing::error!(tool, "Error executing tool: {}", e);
            ToolError::from(e)
        })
    }

    fn execute(&self, request: ToolRequest) -> Result<ToolOutput> {
        match request {
            ToolRequest::ListPartials => Ok(ToolOutput::Names(store::list_files(
                &self.dirs()?.partials_dir,
            )?)),
            ToolRequest::ReadPartial(req) => Ok(ToolOutput::Content(store::read_file(
                &self.dirs()?.partials_dir,
                &req.partial_name,
            )?)),
            ToolRequest::UpdatePartial(req) => {
                store::write_file(
                    &self.dirs()?.partials_dir,
                    &req.partial_name,
                    &req.new_content,
                )?;
                Ok(ToolOutput::success())
            }
            ToolRequest::CreatePartial(req) => {
                store::create_file(&self.dirs()?.partials_dir, &req.partial_name, &req.content)?;
                Ok(ToolOutput::success())
            }
            ToolRequest::ListTemplates => Ok(ToolOutput::Names(store::list_files(
                &self.dirs()?.templates_dir,
            )?)),
            ToolRequest::ReadTemplate(req) => Ok(ToolOutput::Content(store::read_file(
                &self.dirs()?.templates_dir,
                &req.template_name,
            )?)),
            ToolRequest::UpdateTemplate(req) => {
                store::write_file(
                    &self.dirs()?.templates_dir,
                    &req.template_name,
                    &req.new_content,
                )?;
                Ok(ToolOutput::success())
            }
            ToolRequest::CreateTemplate(req) => {
                store::create_file(
                    &self.dirs()?.templates_dir,
                    &req.template_name,
                    &req.content,
                )?;
                Ok(ToolOutput::success())
            }
            ToolRequest::BuildContextFiles => {
                BuildPipeline::new(&self.root).build()?;
                Ok(ToolOutput::success())
            }
            ToolRequest::StartWatcher => {
                self.supervisor.start()?;
                Ok(ToolOutput::success())
            }
            ToolRequest::StopWatcher => {
                self.supervisor.stop()?;
                Ok(ToolOutput::success())
            }
        }
    }

    fn dirs(&self) -> Result<ToolDirs> {
        ToolDirs::resolve(&self.root, self.policy)
    }
}
