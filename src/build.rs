//! The build pipeline: configuration + partials + templates -> output files.
//!
//! [`BuildPipeline::compute_outputs`] is pure with respect to the file tree:
//! it reads but never writes, and the same inputs always give byte-identical
//! content. Validation and watch both rely on that.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config;
use crate::error::{Error, Result};
use crate::models::{BuildOutput, BuildPlan, SkippedTarget};
use crate::render;
use crate::store;

/// Files written and targets skipped by one [`BuildPipeline::build`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub written: Vec<PathBuf>,
    pub skipped: Vec<SkippedTarget>,
}

#[derive(Debug, Clone)]
pub struct BuildPipeline {
    root: PathBuf,
}

impl BuildPipeline {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Render every configured output, in configuration order.
    ///
    /// A target whose template does not exist is logged and reported in
    /// [`BuildPlan::skipped`]; the remaining targets still render.
    pub fn compute_outputs(&self) -> Result<BuildPlan> {
        let config = config::load(&self.root)?;
        let partials = store::load_partials(&self.root.join(&config.partials_dir))?;
        let templates_dir = self.root.join(&config.templates_dir);

        let mut plan = BuildPlan::default();
        for target in &config.outputs {
            let template_path = templates_dir.join(target.template());
            if !template_path.is_file() {
                tracing::warn!(
                    output = target.label(),
                    "{}",
                    Error::TemplateNotFound {
                        path: template_path.clone()
                    }
                );
                plan.skipped.push(SkippedTarget {
                    out_file: target.out_file().clone(),
                    template: template_path,
                });
                continue;
            }

            let template = std::fs::read_to_string(&template_path)
                .map_err(|e| Error::io(&template_path, e))?;
            let content = render::render(&template, &partials).map_err(|e| match e {
                Error::RenderFailed { reason, .. } => Error::RenderFailed {
                    name: template_path.display().to_string(),
                    reason,
                },
                other => other,
            })?;

            plan.outputs.push(BuildOutput {
                out_file: target.out_file().clone(),
                content,
                is_cursor_rule: target.is_cursor_rule(),
            });
        }

        Ok(plan)
    }

    /// Write outputs to their destinations, creating directories as needed.
    ///
    /// Each file is replaced atomically. The first failed write aborts the
    /// remaining ones.
    pub fn materialize(&self, outputs: &[BuildOutput]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(outputs.len());
        for output in outputs {
            let path = output.destination(&self.root);
            write_atomic(&path, &output.content)?;
            tracing::info!("Successfully built: {}", path.display());
            written.push(path);
        }
        Ok(written)
    }

    /// Compute and write everything.
    pub fn build(&self) -> Result<BuildSummary> {
        let plan = self.compute_outputs()?;
        let written = self.materialize(&plan.outputs)?;
        Ok(BuildSummary {
            written,
            skipped: plan.skipped,
        })
    }
}

fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let write_failed = |source| Error::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent).map_err(write_failed)?;

    let mut file = NamedTempFile::new_in(parent).map_err(write_failed)?;
    file.write_all(content.as_bytes()).map_err(write_failed)?;
    file.persist(path).map_err(|e| write_failed(e.error))?;
    Ok(())
}
