//! Traits shared by the FMI 2.0 and 3.0 model descriptions.

use crate::Variable;

/// Access to the `<DefaultExperiment>` element, every attribute optional.
pub trait DefaultExperimentView {
    fn start_time(&self) -> Option<f64>;
    fn stop_time(&self) -> Option<f64>;
    fn step_size(&self) -> Option<f64>;
    fn tolerance(&self) -> Option<f64>;
}

/// Access to the declared model variables, normalized across versions.
pub trait ModelVariablesView {
    /// All declared variables.
    fn variables(&self) -> Vec<Variable<'_>>;

    /// Look up a single variable by name.
    fn variable(&self, name: &str) -> Option<Variable<'_>> {
        self.variables().into_iter().find(|v| v.name == name)
    }
}
