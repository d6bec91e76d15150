//! Drift detection between freshly computed outputs and the files on disk.

use crate::build::BuildPipeline;
use crate::error::{Error, Result};
use crate::models::{Problem, ValidationResult};

/// Compare every computed output with its destination. Never writes.
pub fn check(pipeline: &BuildPipeline) -> Result<ValidationResult> {
    let plan = pipeline.compute_outputs()?;
    let mut result = ValidationResult::default();

    for output in &plan.outputs {
        let path = output.destination(pipeline.root());
        match std::fs::read(&path) {
            Ok(existing) if existing == output.content.as_bytes() => {}
            Ok(_) => result.problems.push(Problem::OutOfDate(output.out_file.clone())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                result.problems.push(Problem::Missing(output.out_file.clone()))
            }
            Err(e) => return Err(Error::io(&path, e)),
        }
    }

    Ok(result)
}
