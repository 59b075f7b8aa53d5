//! Loading and structural validation of workflow documents.

use std::path::Path;

use crate::{error::Error, model::Workflow};

/// Read and parse a workflow document, then validate its structure.
pub fn load_workflow(path: &Path) -> Result<Workflow, Error> {
    log::info!("loading workflow from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    let workflow: Workflow = serde_yaml::from_str(&text)?;
    validate(&workflow)?;
    Ok(workflow)
}

/// Check the invariants that hold before any FMU work begins: a non-empty
/// step list, non-empty unique names, and an FMU per step. Cross-step
/// references are checked at execution time against the result store.
pub fn validate(workflow: &Workflow) -> Result<(), Error> {
    if workflow.steps.is_empty() {
        return Err(Error::InvalidWorkflow("workflow has no steps".to_owned()));
    }

    let mut seen = std::collections::BTreeSet::new();
    for (index, step) in workflow.steps.iter().enumerate() {
        if step.name.is_empty() {
            return Err(Error::InvalidWorkflow(format!(
                "step {} has no name",
                index + 1
            )));
        }
        if step.fmu.is_empty() {
            return Err(Error::InvalidWorkflow(format!(
                "step '{}' names no FMU",
                step.name
            )));
        }
        if !seen.insert(step.name.as_str()) {
            return Err(Error::InvalidWorkflow(format!(
                "duplicate step name '{}'",
                step.name
            )));
        }
    }
    Ok(())
}
