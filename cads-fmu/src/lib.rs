//! FMI Co-Simulation driver.
//!
//! Given an FMU archive, a set of textual start bindings and optional
//! timing overrides, [`run`] extracts the archive, detects the standard
//! version (FMI 2.0 or 3.0), loads the embedded binary interface, drives
//! the initialization-then-step state machine and returns the final output
//! snapshot. Every resource — scratch directory, shared library, FMU
//! instance — is released on all exit paths.
//!
//! Only Co-Simulation FMUs are accepted: they embed their own solver, so
//! the driver is a pure consumer of the standard time-stepping interface.

use std::{collections::BTreeMap, path::PathBuf};

mod fmi2;
mod fmi3;
pub mod import;
mod interpreter;
mod session;
pub mod timing;
pub mod values;

pub use timing::{Timing, TimingOverrides};
pub use values::{CodecError, ScalarValue};

/// Instance name reported to the FMU.
pub const INSTANCE_NAME: &str = "cads-runner";

/// Relative tolerance passed to initialization when the FMU declares none.
pub(crate) const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Final outputs of one run, key-sorted by variable name.
pub type OutputMap = BTreeMap<String, ScalarValue>;

/// Everything one driver invocation needs.
#[derive(Debug, Default, Clone)]
pub struct RunConfig {
    /// Path of the FMU archive.
    pub fmu_path: PathBuf,
    /// Start values as text, applied in lexicographic key order.
    pub start_bindings: BTreeMap<String, String>,
    /// Outputs to capture; `None` selects by causality.
    pub requested_outputs: Option<Vec<String>>,
    /// Caller overrides; unset fields defer to the FMU's default experiment.
    pub timing: TimingOverrides,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("error instantiating FMU")]
    Instantiation,

    #[error("unknown variable: {name}")]
    UnknownVariable { name: String },

    #[error("unknown output: {name}")]
    UnknownOutput { name: String },

    #[error("variable '{name}' has unsupported type {type_name}")]
    UnsupportedVariableType {
        name: String,
        type_name: &'static str,
    },

    #[error("invalid start value for '{name}': {source}")]
    InvalidStartValue {
        name: String,
        #[source]
        source: CodecError,
    },

    #[error("unsupported FMI version: {0}")]
    UnsupportedFmiVersion(String),

    #[error("FMU '{model}' does not implement Co-Simulation")]
    UnsupportedFmuKind { model: String },

    #[error("unsupported platform {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("FMU archive structure is not as expected: {0}")]
    ArchiveStructure(String),

    #[error("invalid timing: start {start} is after stop {stop}")]
    InvalidTiming { start: f64, stop: f64 },

    #[error("{call} returned status {status}")]
    Call {
        call: &'static str,
        status: &'static str,
    },

    #[error("co-simulation step at t = {time} returned status {status}")]
    StepFailure { time: f64, status: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Schema(#[from] cads_schema::Error),

    #[error(transparent)]
    LibLoading(#[from] libloading::Error),
}

/// Run one FMU to its stop time and return the captured outputs.
pub fn run(config: &RunConfig) -> Result<OutputMap, Error> {
    interpreter::preload();
    match import::from_path(&config.fmu_path)? {
        import::FmuImport::Fmi2(import) => fmi2::simulate(&import, config),
        import::FmuImport::Fmi3(import) => fmi3::simulate(&import, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn synthetic_fmu(descr: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        {
            let mut archive = zip::ZipWriter::new(file.as_file_mut());
            archive
                .start_file("modelDescription.xml", zip::write::FileOptions::default())
                .unwrap();
            archive.write_all(descr.as_bytes()).unwrap();
            archive.finish().unwrap();
        }
        file
    }

    #[test]
    fn rejects_model_exchange_only_fmus() {
        let fmu = synthetic_fmu(
            r#"<fmiModelDescription fmiVersion="2.0" modelName="MeOnly" guid="g">
                 <ModelExchange modelIdentifier="me_only"/>
                 <ModelVariables/>
               </fmiModelDescription>"#,
        );
        let config = RunConfig {
            fmu_path: fmu.path().to_owned(),
            ..Default::default()
        };
        assert!(matches!(
            run(&config),
            Err(Error::UnsupportedFmuKind { model }) if model == "MeOnly"
        ));
    }

    #[test]
    fn rejects_invalid_timing_before_loading_binaries() {
        let fmu = synthetic_fmu(
            r#"<fmiModelDescription fmiVersion="2.0" modelName="M" guid="g">
                 <CoSimulation modelIdentifier="m"/>
                 <ModelVariables/>
               </fmiModelDescription>"#,
        );
        let config = RunConfig {
            fmu_path: fmu.path().to_owned(),
            timing: TimingOverrides {
                start_time: Some(2.0),
                stop_time: Some(1.0),
                step_size: None,
            },
            ..Default::default()
        };
        assert!(matches!(run(&config), Err(Error::InvalidTiming { .. })));
    }

    #[test]
    fn missing_binary_surfaces_as_driver_error() {
        // Structurally valid CS FMU without a binaries/ tree.
        let fmu = synthetic_fmu(
            r#"<fmiModelDescription fmiVersion="2.0" modelName="M" guid="g">
                 <CoSimulation modelIdentifier="m"/>
                 <ModelVariables/>
               </fmiModelDescription>"#,
        );
        let config = RunConfig {
            fmu_path: fmu.path().to_owned(),
            ..Default::default()
        };
        assert!(matches!(run(&config), Err(Error::LibLoading(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let config = RunConfig {
            fmu_path: PathBuf::from("/nonexistent/model.fmu"),
            ..Default::default()
        };
        assert!(matches!(run(&config), Err(Error::Io(_))));
    }
}
