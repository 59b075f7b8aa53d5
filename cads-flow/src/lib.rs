//! Declarative multi-step FMU co-simulation workflows.
//!
//! A workflow document names an ordered sequence of FMU invocations, wires
//! outputs of earlier steps into start values of later steps, and persists
//! per-step result snapshots. [`run_workflow`] is the synchronous entry
//! point; [`http::handle`] is the same operation behind a stateless
//! request/response façade.

pub mod error;
pub mod executor;
pub mod http;
pub mod model;
pub mod parser;
pub mod snapshot;

pub use error::{Error, ErrorKind, StepError};
pub use executor::{ResultStore, execute, run_workflow};
pub use model::{StartValue, Step, Workflow};
