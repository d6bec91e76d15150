//! MCP server over stdio.
//!
//! Each tool forwards to the [`ToolDispatcher`]. Failures come back as a
//! tool result with `isError: true` rather than a protocol error, so a client
//! always sees the message.

use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerInfo, Tool},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};

use crate::tools::*;

#[derive(Clone)]
pub struct McpServer {
    dispatcher: ToolDispatcher,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self {
            dispatcher,
            tool_router: Self::tool_router(),
        }
    }

    /// Name, description and input schema of every tool.
    pub fn tool_catalog() -> Vec<Tool> {
        Self::tool_router().list_all()
    }

    /// Tools touch the filesystem synchronously, so calls run on the blocking pool.
    async fn respond(&self, request: ToolRequest) -> Result<CallToolResult, McpError> {
        let dispatcher = self.dispatcher.clone();
        let outcome = tokio::task::spawn_blocking(move || dispatcher.call(request))
            .await
            .map_err(|e| McpError::internal_error(format!("Tool task failed: {}", e), None))?;

        Ok(match outcome {
            Ok(output) => CallToolResult::success(vec![Content::text(output.to_text())]),
            Err(e) => CallToolResult::error(vec![Content::text(e.to_string())]),
        })
    }
}

#[tool_router]
impl McpServer {
    // ============================================================
    // Partials
    // ============================================================

    #[tool(description = "Lists all available content partials.")]
    async fn list_partials(&self) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::ListPartials).await
    }

    #[tool(description = "Reads the content of a specific partial.")]
    async fn read_partial(
        &self,
        params: Parameters<ReadPartialRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::ReadPartial(params.0)).await
    }

    #[tool(description = "Overwrites the content of a specific partial file.")]
    async fn update_partial(
        &self,
        params: Parameters<UpdatePartialRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::UpdatePartial(params.0)).await
    }

    #[tool(description = "Creates a new partial file. Fails if the partial already exists.")]
    async fn create_new_partial(
        &self,
        params: Parameters<CreatePartialRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::CreatePartial(params.0)).await
    }

    // ============================================================
    // Templates
    // ============================================================

    #[tool(description = "Lists all available templates.")]
    async fn list_templates(&self) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::ListTemplates).await
    }

    #[tool(description = "Reads the content of a specific template.")]
    async fn read_template(
        &self,
        params: Parameters<ReadTemplateRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::ReadTemplate(params.0)).await
    }

    #[tool(description = "Overwrites the content of a specific template file.")]
    async fn update_template(
        &self,
        params: Parameters<UpdateTemplateRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::UpdateTemplate(params.0)).await
    }

    #[tool(description = "Creates a new template file. Fails if the template already exists.")]
    async fn create_new_template(
        &self,
        params: Parameters<CreateTemplateRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::CreateTemplate(params.0)).await
    }

    // ============================================================
    // Build and watch
    // ============================================================

    #[tool(
        description = "Triggers the build process to regenerate all physical agent files from the partials."
    )]
    async fn build_context_files(&self) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::BuildContextFiles).await
    }

    #[tool(
        description = "Starts a background watcher that rebuilds the agent files whenever a partial or template changes. Only one watcher can run at a time."
    )]
    async fn start_watcher(&self) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::StartWatcher).await
    }

    #[tool(
        description = "Stops the background watcher. It is asked to exit gracefully and killed if it has not exited within five seconds."
    )]
    async fn stop_watcher(&self) -> Result<CallToolResult, McpError> {
        self.respond(ToolRequest::StopWatcher).await
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: rmcp::model::Implementation {
                name: "agent-context-sync".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            instructions: Some(
                r#"agent-context keeps agent instruction files (AGENTS.md, CLAUDE.md, cursor rules, ...) in sync with shared partials.

WORKFLOW:
1. list_partials / list_templates to see what exists (names include the file extension)
2. read_partial / read_template before editing
3. update_partial / update_template with the complete new content, or create_new_* for new files
4. build_context_files to regenerate every output file

Templates include partials with {{> partial_name}} where partial_name is the file name without extension.
Use start_watcher to rebuild automatically on every change, stop_watcher to end it."#
                    .into(),
            ),
            ..Default::default()
        }
    }
}

pub async fn run_stdio_server(dispatcher: ToolDispatcher) -> anyhow::Result<()> {
    use tokio::io::{stdin, stdout};

    tracing::info!("Starting MCP server in stdio mode...");

    let service = McpServer::new(dispatcher);
    let server = service.serve((stdin(), stdout())).await?;

    let quit_reason = server.waiting().await?;
    tracing::info!("MCP server stopped: {:?}", quit_reason);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DirPolicy;
    use crate::supervisor::{WatchCommand, WatcherSupervisor};

    fn server(root: &std::path::Path) -> McpServer {
        let supervisor = WatcherSupervisor::new(WatchCommand {
            program: "sleep".into(),
            args: vec!["30".to_string()],
            cwd: root.to_path_buf(),
        });
        McpServer::new(ToolDispatcher::new(root, DirPolicy::Strict, supervisor))
    }

    #[tokio::test]
    async fn build_runs_off_the_async_worker() {
        let dir = tempfile::tempdir().unwrap();
        crate::init::init(dir.path(), false).unwrap();

        let result = server(dir.path()).build_context_files().await.unwrap();

        assert_ne!(result.is_error, Some(true));
        assert!(dir.path().join("AGENTS.md").is_file());
    }

    #[tokio::test]
    async fn failures_are_tool_errors() {
        let dir = tempfile::tempdir().unwrap();

        let result = server(dir.path()).build_context_files().await.unwrap();

        assert_eq!(result.is_error, Some(true));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn watcher_starts_from_the_blocking_pool() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path());

        let started = server.start_watcher().await.unwrap();
        assert_ne!(started.is_error, Some(true));
        let stopped = server.stop_watcher().await.unwrap();
        assert_ne!(stopped.is_error, Some(true));
    }
}
