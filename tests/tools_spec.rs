//! Tool dispatcher integration tests.
//!
//! Tests are organized by tool family:
//! - Partials and templates: file I/O through the configured directories
//! - Build: regenerating outputs
//! - Boundary: name decoding, argument validation and error conversion

use std::path::Path;

use agent_context::config::DirPolicy;
use agent_context::supervisor::{WatchCommand, WatcherSupervisor};
use agent_context::tools::*;
use serde_json::json;

const CONFIG: &str = r#"schema: 1
partialsDir: partials
templatesDir: templates
output:
  - agent: codex
    template: AGENTS.md
    outFile: AGENTS.md
"#;

/// Helper to create a project with one partial and one template.
fn create_test_project(root: &Path) {
    std::fs::write(root.join(".agent-instructions.yaml"), CONFIG).unwrap();
    std::fs::create_dir_all(root.join("partials")).unwrap();
    std::fs::create_dir_all(root.join("templates")).unwrap();
    std::fs::write(root.join("partials/intro.md"), "Hello").unwrap();
    std::fs::write(root.join("templates/AGENTS.md"), "{{> intro}}").unwrap();
}

/// Helper to create a dispatcher whose watcher command is harmless.
fn setup(root: &Path, policy: DirPolicy) -> ToolDispatcher {
    let supervisor = WatcherSupervisor::new(WatchCommand {
        program: "sleep".into(),
        args: vec!["30".to_string()],
        cwd: root.to_path_buf(),
    });
    ToolDispatcher::new(root, policy, supervisor)
}

// ============================================================
// Partials and Templates
// ============================================================

mod partials {
    use super::*;

    #[test]
    fn lists_partial_file_names() {
        let dir = tempfile::tempdir().unwrap();
        create_test_project(dir.path());
        std::fs::write(dir.path().join("partials/extra.md"), "x").unwrap();
        let tools = setup(dir.path(), DirPolicy::Strict);

        let output = tools.dispatch("list_partials", None).unwrap();

        assert_eq!(
            output,
            ToolOutput::Names(vec!["extra.md".to_string(), "intro.md".to_string()])
        );
    }

    #[test]
    fn reads_a_partial() {
        let dir = tempfile::tempdir().unwrap();
        create_test_project(dir.path());
        let tools = setup(dir.path(), DirPolicy::Strict);

        let output = tools
            .dispatch("read_partial", Some(json!({ "partial_name": "intro.md" })))
            .unwrap();

        assert_eq!(output, ToolOutput::Content("Hello".to_string()));
        assert_eq!(output.to_text(), "Hello");
    }

    #[test]
    fn updates_a_partial() {
        let dir = tempfile::tempdir().unwrap();
        create_test_project(dir.path());
        let tools = setup(dir.path(), DirPolicy::Strict);

        let output = tools
            .call(ToolRequest::UpdatePartial(UpdatePartialRequest {
                partial_name: "intro.md".to_string(),
                new_content: "Hi".to_string(),
            }))
            .unwrap();

        assert_eq!(output, ToolOutput::success());
        assert_eq!(
            serde_json::to_value(&output).unwrap(),
            json!({ "success": true })
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("partials/intro.md")).unwrap(),
            "Hi"
        );
    }

    #[test]
    fn creates_a_partial_once() {
        let dir = tempfile::tempdir().unwrap();
        create_test_project(dir.path());
        let tools = setup(dir.path(), DirPolicy::Strict);
        let args = json!({ "partial_name": "new.md", "content": "fresh" });

        tools
            .dispatch("create_new_partial", Some(args.clone()))
            .unwrap();
        let err = tools.dispatch("create_new_partial", Some(args)).unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::Failed);
        assert!(err.message.contains("already exists"));
    }

    #[test]
    fn reading_a_missing_partial_is_a_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        create_test_project(dir.path());
        let tools = setup(dir.path(), DirPolicy::Strict);

        let err = tools
            .dispatch("read_partial", Some(json!({ "partial_name": "nope.md" })))
            .unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::Failed);
        assert!(err.to_string().starts_with("Error: "));
    }

    #[test]
    fn rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        create_test_project(dir.path());
        let tools = setup(dir.path(), DirPolicy::Strict);

        let err = tools
            .dispatch(
                "update_partial",
                Some(json!({ "partial_name": "../AGENTS.md", "new_content": "pwned" })),
            )
            .unwrap_err();

        assert!(err.message.contains("Invalid file name"));
        assert!(!dir.path().join("AGENTS.md").exists());
    }
}

mod templates {
    use super::*;

    #[test]
    fn lists_reads_updates_and_creates_templates() {
        let dir = tempfile::tempdir().unwrap();
        create_test_project(dir.path());
        let tools = setup(dir.path(), DirPolicy::Strict);

        assert_eq!(
            tools.dispatch("list_templates", None).unwrap(),
            ToolOutput::Names(vec!["AGENTS.md".to_string()])
        );
        assert_eq!(
            tools
                .dispatch("read_template", Some(json!({ "template_name": "AGENTS.md" })))
                .unwrap(),
            ToolOutput::Content("{{> intro}}".to_string())
        );

        tools
            .dispatch(
                "update_template",
                Some(json!({ "template_name": "AGENTS.md", "new_content": "# {{> intro}}" })),
            )
            .unwrap();
        tools
            .dispatch(
                "create_new_template",
                Some(json!({ "template_name": "CLAUDE.md", "content": "claude" })),
            )
            .unwrap();

        assert_eq!(
            tools.dispatch("list_templates", None).unwrap(),
            ToolOutput::Names(vec!["AGENTS.md".to_string(), "CLAUDE.md".to_string()])
        );
    }
}

// ============================================================
// Directory Policy
// ============================================================

mod dir_policy {
    use super::*;

    #[test]
    fn strict_policy_requires_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let tools = setup(dir.path(), DirPolicy::Strict);

        let err = tools.dispatch("list_partials", None).unwrap_err();

        assert!(err.message.contains(".agent-instructions.yaml not found"));
    }

    #[test]
    fn fallback_policy_uses_docs_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/agent-partials")).unwrap();
        std::fs::write(dir.path().join("docs/agent-partials/a.md"), "a").unwrap();
        let tools = setup(dir.path(), DirPolicy::FallbackToDefaults);

        let output = tools.dispatch("list_partials", None).unwrap();

        assert_eq!(output, ToolOutput::Names(vec!["a.md".to_string()]));
    }
}

// ============================================================
// Build
// ============================================================

mod build {
    use super::*;

    #[test]
    fn builds_context_files() {
        let dir = tempfile::tempdir().unwrap();
        create_test_project(dir.path());
        let tools = setup(dir.path(), DirPolicy::Strict);

        let output = tools.dispatch("build_context_files", None).unwrap();

        assert_eq!(output, ToolOutput::success());
        assert_eq!(
            std::fs::read_to_string(dir.path().join("AGENTS.md")).unwrap(),
            "Hello"
        );
    }

    #[test]
    fn build_errors_become_tool_errors() {
        let dir = tempfile::tempdir().unwrap();
        let tools = setup(dir.path(), DirPolicy::FallbackToDefaults);

        let err = tools.dispatch("build_context_files", None).unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::Failed);
        assert!(err.message.contains("init"));
    }
}

// ============================================================
// Boundary
// ============================================================

mod boundary {
    use super::*;

    #[test]
    fn unknown_tool_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let tools = setup(dir.path(), DirPolicy::Strict);

        let err = tools.dispatch("delete_everything", None).unwrap_err();

        assert_eq!(err.kind, ToolErrorKind::UnknownTool);
        assert_eq!(err.message, "Tool 'delete_everything' not found");
    }

    #[test]
    fn missing_arguments_are_rejected_before_any_io() {
        let err = ToolRequest::parse("read_partial", None).unwrap_err();
        assert!(matches!(
            err,
            agent_context::Error::InvalidArguments { ref tool, .. } if tool == "read_partial"
        ));

        let err = ToolRequest::parse("update_template", Some(json!({ "template_name": 7 })))
            .unwrap_err();
        assert_eq!(ToolError::from(err).kind, ToolErrorKind::InvalidArguments);
    }

    #[test]
    fn every_catalogued_name_parses() {
        for name in ToolRequest::NAMES {
            let args = json!({
                "partial_name": "a.md",
                "template_name": "a.md",
                "new_content": "",
                "content": "",
            });
            let request = ToolRequest::parse(name, Some(args)).unwrap();
            assert_eq!(request.name(), name);
        }
    }
}
