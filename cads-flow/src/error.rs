//! Failure taxonomy of a workflow run.
//!
//! Every failure carries the failing step's name where one exists and maps
//! onto exactly one [`ErrorKind`], so hosting layers can classify without
//! string matching.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid workflow: {0}")]
    InvalidWorkflow(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("error parsing workflow document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("step '{step}': {source}")]
    Step {
        step: String,
        #[source]
        source: StepError,
    },
}

/// A failure inside one step, before or during the driver call.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("cannot resolve '{reference}': {reason}")]
    DataFlow { reference: String, reason: String },

    #[error("FMU file {} is missing or unreadable", path.display())]
    MissingFmu { path: PathBuf },

    #[error(transparent)]
    Fmu(#[from] cads_fmu::Error),

    #[error("error writing result snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The closed classification of every surfaced failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidWorkflow,
    DataFlowError,
    MissingFmu,
    InvalidFmu,
    UnsupportedFmiVersion,
    UnsupportedFmuKind,
    UnknownVariable,
    UnknownOutput,
    UnsupportedVariableType,
    InvalidTiming,
    StepFailure,
    IoError,
    DriverError,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidWorkflow(_) => ErrorKind::InvalidWorkflow,
            Error::Yaml(_) => ErrorKind::InvalidWorkflow,
            Error::Io(_) => ErrorKind::IoError,
            Error::Step { source, .. } => source.kind(),
        }
    }

    /// Name of the failing step, if the failure happened inside one.
    pub fn step(&self) -> Option<&str> {
        match self {
            Error::Step { step, .. } => Some(step),
            _ => None,
        }
    }
}

impl StepError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StepError::DataFlow { .. } => ErrorKind::DataFlowError,
            StepError::MissingFmu { .. } => ErrorKind::MissingFmu,
            StepError::Snapshot { .. } => ErrorKind::IoError,
            StepError::Fmu(e) => match e {
                cads_fmu::Error::UnknownVariable { .. } => ErrorKind::UnknownVariable,
                cads_fmu::Error::UnknownOutput { .. } => ErrorKind::UnknownOutput,
                cads_fmu::Error::UnsupportedVariableType { .. } => {
                    ErrorKind::UnsupportedVariableType
                }
                cads_fmu::Error::UnsupportedFmiVersion(_) => ErrorKind::UnsupportedFmiVersion,
                cads_fmu::Error::UnsupportedFmuKind { .. } => ErrorKind::UnsupportedFmuKind,
                cads_fmu::Error::InvalidTiming { .. } => ErrorKind::InvalidTiming,
                cads_fmu::Error::StepFailure { .. } => ErrorKind::StepFailure,
                cads_fmu::Error::ArchiveStructure(_)
                | cads_fmu::Error::Zip(_)
                | cads_fmu::Error::Schema(_) => ErrorKind::InvalidFmu,
                cads_fmu::Error::Io(_) => ErrorKind::IoError,
                cads_fmu::Error::Instantiation
                | cads_fmu::Error::InvalidStartValue { .. }
                | cads_fmu::Error::UnsupportedPlatform { .. }
                | cads_fmu::Error::Call { .. }
                | cads_fmu::Error::LibLoading(_) => ErrorKind::DriverError,
            },
        }
    }
}
