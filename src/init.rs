//! Project scaffolding for `init`.

use std::path::{Path, PathBuf};

use crate::config::{config_path, DEFAULT_PARTIALS_DIR, DEFAULT_TEMPLATES_DIR};
use crate::error::{Error, Result};

const DEFAULT_CONFIG: &str = r#"schema: 1
partialsDir: docs/agent-partials
templatesDir: docs/agent-templates
output:
  - agent: codex
    template: AGENTS.md
    outFile: AGENTS.md
  - agent: claude
    template: CLAUDE.md
    outFile: CLAUDE.md
  - type: cursor-rule
    name: project
    template: project.mdc
    outFile: project.mdc
"#;

const SAMPLE_PARTIAL: (&str, &str) = (
    "project-overview.md",
    "## Project overview\n\nDescribe what this project does and how it is organised.\n",
);

const SAMPLE_TEMPLATES: [(&str, &str); 3] = [
    ("AGENTS.md", "# Agent instructions\n\n{{> project-overview}}\n"),
    ("CLAUDE.md", "# Claude instructions\n\n{{> project-overview}}\n"),
    (
        "project.mdc",
        "---\ndescription: Project overview\nalwaysApply: true\n---\n\n{{> project-overview}}\n",
    ),
];

/// Write a default configuration plus sample partial and templates.
///
/// An existing configuration is only replaced when `force` is set; existing
/// partials and templates are never touched. Returns the files created.
pub fn init(root: &Path, force: bool) -> Result<Vec<PathBuf>> {
    let config = config_path(root);
    if config.exists() && !force {
        return Err(Error::AlreadyExists { path: config });
    }

    let partials_dir = root.join(DEFAULT_PARTIALS_DIR);
    let templates_dir = root.join(DEFAULT_TEMPLATES_DIR);
    for dir in [&partials_dir, &templates_dir] {
        std::fs::create_dir_all(dir).map_err(|e| Error::WriteFailed {
            path: dir.clone(),
            source: e,
        })?;
    }

    let mut created = Vec::new();
    write(&config, DEFAULT_CONFIG)?;
    created.push(config);

    let samples = std::iter::once((&partials_dir, SAMPLE_PARTIAL))
        .chain(SAMPLE_TEMPLATES.iter().map(|t| (&templates_dir, *t)));
    for (dir, (name, content)) in samples {
        let path = dir.join(name);
        if path.exists() {
            continue;
        }
        write(&path, content)?;
        created.push(path);
    }

    Ok(created)
}

fn write(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content).map_err(|e| Error::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
