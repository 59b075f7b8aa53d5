//! Resolution of the simulation horizon from caller overrides and the
//! FMU's advertised default experiment.

use cads_schema::traits::DefaultExperimentView;

use crate::Error;

/// Optional caller overrides; unset fields defer to the FMU.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TimingOverrides {
    pub start_time: Option<f64>,
    pub stop_time: Option<f64>,
    pub step_size: Option<f64>,
}

/// The fully resolved horizon: `start <= stop` and `step > 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Timing {
    /// Overrides win over the default experiment, which wins over the
    /// fallback constants.
    pub fn resolve<DE: DefaultExperimentView>(
        overrides: &TimingOverrides,
        defaults: &DE,
    ) -> Result<Self, Error> {
        let start = overrides
            .start_time
            .or_else(|| defaults.start_time())
            .unwrap_or(0.0);

        let stop = overrides
            .stop_time
            .or_else(|| defaults.stop_time())
            .unwrap_or(start + 1.0);

        if stop < start {
            return Err(Error::InvalidTiming { start, stop });
        }

        let mut step = overrides
            .step_size
            .or_else(|| defaults.step_size())
            .unwrap_or_else(|| (stop - start).max(1e-3));

        if step <= 0.0 {
            step = if stop - start > 0.0 { stop - start } else { 1.0 };
        }

        Ok(Self { start, stop, step })
    }
}
