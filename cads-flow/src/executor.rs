//! The sequential workflow executor.
//!
//! Steps run strictly in document order; step *k*+1 does not start until
//! step *k* has recorded its outputs. The result store is all-or-nothing:
//! the caller gets either every step's outputs or an error naming the
//! failing step. Snapshots written before a failure remain on disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cads_fmu::{OutputMap, RunConfig, TimingOverrides};
use indexmap::IndexMap;

use crate::{
    error::{Error, StepError},
    model::{Step, Workflow},
    parser, snapshot,
};

/// Ordered mapping of step name to that step's captured outputs.
pub type ResultStore = IndexMap<String, OutputMap>;

/// Load, validate and execute the workflow at `workflow_path`.
///
/// Relative paths (the workflow itself, FMU paths, result paths) are
/// resolved against `root`.
pub fn run_workflow(
    workflow_path: impl AsRef<Path>,
    root: impl AsRef<Path>,
) -> Result<ResultStore, Error> {
    let root = root.as_ref();
    let workflow = parser::load_workflow(&resolve(root, workflow_path.as_ref()))?;
    execute(&workflow, root)
}

/// Execute an already-parsed workflow.
pub fn execute(workflow: &Workflow, root: &Path) -> Result<ResultStore, Error> {
    parser::validate(workflow)?;

    let mut store = ResultStore::new();
    for step in &workflow.steps {
        let outputs = run_step(step, &store, root).map_err(|source| Error::Step {
            step: step.name.clone(),
            source,
        })?;
        log::info!(
            "step '{}' completed with {} outputs",
            step.name,
            outputs.len()
        );
        store.insert(step.name.clone(), outputs);
    }
    Ok(store)
}

fn run_step(step: &Step, store: &ResultStore, root: &Path) -> Result<OutputMap, StepError> {
    let start_bindings = build_bindings(step, store)?;

    let fmu_path = resolve(root, Path::new(&step.fmu));
    if std::fs::File::open(&fmu_path).is_err() {
        return Err(StepError::MissingFmu { path: fmu_path });
    }

    log::info!("running step '{}' ({})", step.name, step.fmu);
    let config = RunConfig {
        fmu_path,
        start_bindings,
        requested_outputs: if step.outputs.is_empty() {
            None
        } else {
            Some(step.outputs.clone())
        },
        timing: TimingOverrides {
            start_time: step.start_time,
            stop_time: step.stop_time,
            step_size: step.step_size,
        },
    };
    let outputs = cads_fmu::run(&config)?;

    if let Some(result) = &step.result {
        let result_path = resolve(root, result);
        snapshot::write(&result_path, &outputs).map_err(|source| StepError::Snapshot {
            path: result_path.clone(),
            source,
        })?;
        log::debug!("wrote result snapshot {}", result_path.display());
    }

    Ok(outputs)
}

/// Combine literal start values with derived ones. Literals are walked in
/// lexicographic key order; a derived reference targeting the same variable
/// overwrites the literal (and is flagged, since that is usually a mistake
/// in the document).
fn build_bindings(step: &Step, store: &ResultStore) -> Result<BTreeMap<String, String>, StepError> {
    let mut bindings = BTreeMap::new();

    for (name, value) in &step.start_values {
        bindings.insert(name.clone(), value.encode());
    }

    for (target, reference) in &step.start_from {
        let (prior, variable) = parse_reference(reference)?;
        let outputs = store.get(prior).ok_or_else(|| StepError::DataFlow {
            reference: reference.clone(),
            reason: format!("no prior step named '{prior}'"),
        })?;
        let value = outputs.get(variable).ok_or_else(|| StepError::DataFlow {
            reference: reference.clone(),
            reason: format!("step '{prior}' did not capture '{variable}'"),
        })?;
        if bindings.insert(target.clone(), value.encode()).is_some() {
            log::warn!(
                "start value for '{target}' is overridden by the reference '{reference}'"
            );
        }
    }

    Ok(bindings)
}

/// Split a `<prior_step>.<variable>` reference; exactly one dot, both sides
/// non-empty.
fn parse_reference(reference: &str) -> Result<(&str, &str), StepError> {
    let mut parts = reference.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(step), Some(variable), None) if !step.is_empty() && !variable.is_empty() => {
            Ok((step, variable))
        }
        _ => Err(StepError::DataFlow {
            reference: reference.to_owned(),
            reason: "expected a '<prior_step>.<variable>' pair".to_owned(),
        }),
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        root.join(path)
    }
}
