//! The version-independent part of a Co-Simulation run.
//!
//! Both standard versions expose the same capability set once an instance
//! is in initialization mode: typed setters and getters, leaving
//! initialization mode, and advancing time. Everything from start-value
//! application to output read-back is shared here; only instantiation and
//! the initialization-mode entry differ per version.

use std::collections::BTreeMap;

use cads_schema::{Causality, ScalarKind, Variable};

use crate::{
    Error, RunConfig,
    timing::Timing,
    values::{self, ScalarValue},
};

/// End-of-horizon guard: `current >= stop - STOP_TOLERANCE` stops the loop.
const STOP_TOLERANCE: f64 = 1e-12;

/// Key reported when an FMU declares no outputs at all.
const TIME_OUTPUT: &str = "time";

/// What one communication step reported back.
pub(crate) struct StepOutcome {
    /// FMI 3.0 FMUs may ask for termination; FMI 2.0 never sets this.
    pub terminate_requested: bool,
}

/// The capability set shared by the FMI 2.0 and 3.0 instances.
pub(crate) trait CoSimDriver {
    fn set_real(&mut self, vr: u32, value: f64) -> Result<(), Error>;
    fn set_integer(&mut self, vr: u32, value: i32) -> Result<(), Error>;
    fn set_boolean(&mut self, vr: u32, value: bool) -> Result<(), Error>;

    fn get_real(&mut self, vr: u32) -> Result<f64, Error>;
    fn get_integer(&mut self, vr: u32) -> Result<i32, Error>;
    fn get_boolean(&mut self, vr: u32) -> Result<bool, Error>;

    fn exit_initialization_mode(&mut self) -> Result<(), Error>;

    fn do_step(&mut self, current: f64, step: f64) -> Result<StepOutcome, Error>;
}

/// Drive an initialized instance through start values, the step loop and
/// output read-back. Returns the final output snapshot.
pub(crate) fn run_session<D: CoSimDriver>(
    driver: &mut D,
    variables: &[Variable<'_>],
    config: &RunConfig,
    timing: Timing,
) -> Result<BTreeMap<String, ScalarValue>, Error> {
    apply_start_bindings(driver, variables, &config.start_bindings)?;
    driver.exit_initialization_mode()?;

    let mut current = timing.start;
    let mut steps = 0u64;
    while current < timing.stop - STOP_TOLERANCE {
        let step = timing.step.min(timing.stop - current);
        let outcome = driver.do_step(current, step)?;
        current += step;
        steps += 1;
        if outcome.terminate_requested {
            log::debug!("FMU requested termination at t = {current}");
            break;
        }
    }
    log::debug!("completed {steps} communication steps, t = {current}");

    read_outputs(driver, variables, config.requested_outputs.as_deref(), current)
}

/// Apply the text start bindings in lexicographic key order.
fn apply_start_bindings<D: CoSimDriver>(
    driver: &mut D,
    variables: &[Variable<'_>],
    bindings: &BTreeMap<String, String>,
) -> Result<(), Error> {
    for (name, text) in bindings {
        let variable = variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| Error::UnknownVariable { name: name.clone() })?;
        let kind = variable.kind.ok_or_else(|| Error::UnsupportedVariableType {
            name: name.clone(),
            type_name: variable.type_name,
        })?;
        let value = values::parse_as(kind, text).map_err(|source| Error::InvalidStartValue {
            name: name.clone(),
            source,
        })?;
        log::trace!("setting start value {name} = {text}");
        match value {
            ScalarValue::Real(v) => driver.set_real(variable.value_reference, v)?,
            ScalarValue::Integer(v) => driver.set_integer(variable.value_reference, v)?,
            ScalarValue::Boolean(v) => driver.set_boolean(variable.value_reference, v)?,
        }
    }
    Ok(())
}

fn read_variable<D: CoSimDriver>(
    driver: &mut D,
    variable: &Variable<'_>,
    kind: ScalarKind,
) -> Result<ScalarValue, Error> {
    Ok(match kind {
        ScalarKind::Real => ScalarValue::Real(driver.get_real(variable.value_reference)?),
        ScalarKind::Integer => ScalarValue::Integer(driver.get_integer(variable.value_reference)?),
        ScalarKind::Boolean => ScalarValue::Boolean(driver.get_boolean(variable.value_reference)?),
    })
}

/// Read the requested outputs, or auto-select by causality when the caller
/// named none. The returned map is key-sorted by construction.
fn read_outputs<D: CoSimDriver>(
    driver: &mut D,
    variables: &[Variable<'_>],
    requested: Option<&[String]>,
    end_time: f64,
) -> Result<BTreeMap<String, ScalarValue>, Error> {
    let mut outputs = BTreeMap::new();

    match requested {
        Some(names) => {
            for name in names {
                let variable = variables
                    .iter()
                    .find(|v| v.name == name)
                    .ok_or_else(|| Error::UnknownOutput { name: name.clone() })?;
                let kind = variable.kind.ok_or_else(|| Error::UnsupportedVariableType {
                    name: name.clone(),
                    type_name: variable.type_name,
                })?;
                outputs.insert(name.clone(), read_variable(driver, variable, kind)?);
            }
        }
        None => {
            for variable in variables.iter().filter(|v| {
                matches!(
                    v.causality,
                    Causality::Output | Causality::CalculatedParameter
                )
            }) {
                match variable.kind {
                    Some(kind) => {
                        outputs.insert(
                            variable.name.to_owned(),
                            read_variable(driver, variable, kind)?,
                        );
                    }
                    None => log::debug!(
                        "skipping auto-selected output '{}' of unsupported type {}",
                        variable.name,
                        variable.type_name
                    ),
                }
            }
            if outputs.is_empty() {
                outputs.insert(TIME_OUTPUT.to_owned(), ScalarValue::Real(end_time));
            }
        }
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TimingOverrides;

    /// In-memory stand-in for a loaded FMU: `y` mirrors whatever was set
    /// on `x`, scaled by the number of steps taken.
    #[derive(Default)]
    struct FakeDriver {
        reals: BTreeMap<u32, f64>,
        integers: BTreeMap<u32, i32>,
        booleans: BTreeMap<u32, bool>,
        steps: Vec<(f64, f64)>,
        initialized: bool,
        terminate_after: Option<usize>,
    }

    impl CoSimDriver for FakeDriver {
        fn set_real(&mut self, vr: u32, value: f64) -> Result<(), Error> {
            self.reals.insert(vr, value);
            Ok(())
        }
        fn set_integer(&mut self, vr: u32, value: i32) -> Result<(), Error> {
            self.integers.insert(vr, value);
            Ok(())
        }
        fn set_boolean(&mut self, vr: u32, value: bool) -> Result<(), Error> {
            self.booleans.insert(vr, value);
            Ok(())
        }
        fn get_real(&mut self, vr: u32) -> Result<f64, Error> {
            Ok(self.reals.get(&vr).copied().unwrap_or_default())
        }
        fn get_integer(&mut self, vr: u32) -> Result<i32, Error> {
            Ok(self.integers.get(&vr).copied().unwrap_or_default())
        }
        fn get_boolean(&mut self, vr: u32) -> Result<bool, Error> {
            Ok(self.booleans.get(&vr).copied().unwrap_or_default())
        }
        fn exit_initialization_mode(&mut self) -> Result<(), Error> {
            self.initialized = true;
            Ok(())
        }
        fn do_step(&mut self, current: f64, step: f64) -> Result<StepOutcome, Error> {
            self.steps.push((current, step));
            Ok(StepOutcome {
                terminate_requested: self
                    .terminate_after
                    .is_some_and(|n| self.steps.len() >= n),
            })
        }
    }

    fn var(name: &str, vr: u32, causality: Causality, kind: ScalarKind) -> Variable<'_> {
        Variable {
            name,
            value_reference: vr,
            causality,
            kind: Some(kind),
            type_name: "Real",
        }
    }

    fn config(outputs: Option<Vec<String>>) -> RunConfig {
        RunConfig {
            fmu_path: Default::default(),
            start_bindings: BTreeMap::new(),
            requested_outputs: outputs,
            timing: TimingOverrides::default(),
        }
    }

    const TIMING: Timing = Timing {
        start: 0.0,
        stop: 10.0,
        step: 10.0,
    };

    #[test]
    fn sets_values_and_reads_outputs() {
        let vars = [
            var("x", 0, Causality::Input, ScalarKind::Real),
            var("y", 1, Causality::Output, ScalarKind::Real),
        ];
        let mut driver = FakeDriver::default();
        driver.reals.insert(1, 0.25);

        let mut cfg = config(Some(vec!["y".into()]));
        cfg.start_bindings.insert("x".into(), "3.5".into());

        let outputs = run_session(&mut driver, &vars, &cfg, TIMING).unwrap();
        assert!(driver.initialized);
        assert_eq!(driver.reals[&0], 3.5);
        assert_eq!(driver.steps, vec![(0.0, 10.0)]);
        assert_eq!(outputs["y"], ScalarValue::Real(0.25));
    }

    #[test]
    fn unknown_start_variable_is_rejected() {
        let vars = [var("x", 0, Causality::Input, ScalarKind::Real)];
        let mut driver = FakeDriver::default();
        let mut cfg = config(None);
        cfg.start_bindings.insert("not_a_var".into(), "1".into());
        assert!(matches!(
            run_session(&mut driver, &vars, &cfg, TIMING),
            Err(Error::UnknownVariable { name }) if name == "not_a_var"
        ));
    }

    #[test]
    fn unsupported_start_type_is_rejected() {
        let vars = [Variable {
            name: "label",
            value_reference: 4,
            causality: Causality::Parameter,
            kind: None,
            type_name: "String",
        }];
        let mut driver = FakeDriver::default();
        let mut cfg = config(None);
        cfg.start_bindings.insert("label".into(), "1".into());
        assert!(matches!(
            run_session(&mut driver, &vars, &cfg, TIMING),
            Err(Error::UnsupportedVariableType { type_name: "String", .. })
        ));
    }

    #[test]
    fn non_finite_start_value_is_rejected() {
        let vars = [var("x", 0, Causality::Input, ScalarKind::Real)];
        let mut driver = FakeDriver::default();
        let mut cfg = config(None);
        cfg.start_bindings.insert("x".into(), "NaN".into());
        assert!(matches!(
            run_session(&mut driver, &vars, &cfg, TIMING),
            Err(Error::InvalidStartValue { name, .. }) if name == "x"
        ));
    }

    #[test]
    fn step_larger_than_horizon_is_clamped() {
        let vars = [var("y", 1, Causality::Output, ScalarKind::Real)];
        let mut driver = FakeDriver::default();
        let timing = Timing {
            start: 0.0,
            stop: 3.0,
            step: 10.0,
        };
        run_session(&mut driver, &vars, &config(None), timing).unwrap();
        assert_eq!(driver.steps, vec![(0.0, 3.0)]);
    }

    #[test]
    fn zero_length_horizon_runs_no_steps() {
        let vars = [var("y", 1, Causality::Output, ScalarKind::Real)];
        let mut driver = FakeDriver::default();
        driver.reals.insert(1, 7.0);
        let timing = Timing {
            start: 5.0,
            stop: 5.0,
            step: 1.0,
        };
        let outputs = run_session(&mut driver, &vars, &config(None), timing).unwrap();
        assert!(driver.steps.is_empty());
        // Post-initialization snapshot is still read.
        assert_eq!(outputs["y"], ScalarValue::Real(7.0));
    }

    #[test]
    fn multiple_steps_cover_the_horizon() {
        let vars = [var("y", 1, Causality::Output, ScalarKind::Real)];
        let mut driver = FakeDriver::default();
        let timing = Timing {
            start: 0.0,
            stop: 1.0,
            step: 0.25,
        };
        run_session(&mut driver, &vars, &config(None), timing).unwrap();
        assert_eq!(driver.steps.len(), 4);
        let (last_t, last_h) = *driver.steps.last().unwrap();
        assert!((last_t + last_h - 1.0).abs() < 1e-9);
    }

    #[test]
    fn terminate_request_stops_the_loop() {
        let vars = [var("y", 1, Causality::Output, ScalarKind::Real)];
        let mut driver = FakeDriver {
            terminate_after: Some(2),
            ..Default::default()
        };
        let timing = Timing {
            start: 0.0,
            stop: 10.0,
            step: 1.0,
        };
        run_session(&mut driver, &vars, &config(None), timing).unwrap();
        assert_eq!(driver.steps.len(), 2);
    }

    #[test]
    fn auto_selects_outputs_by_causality() {
        let vars = [
            var("b", 2, Causality::CalculatedParameter, ScalarKind::Real),
            var("a", 1, Causality::Output, ScalarKind::Real),
            var("hidden", 3, Causality::Local, ScalarKind::Real),
        ];
        let mut driver = FakeDriver::default();
        driver.reals.insert(1, 1.0);
        driver.reals.insert(2, 2.0);
        let outputs = run_session(&mut driver, &vars, &config(None), TIMING).unwrap();
        assert_eq!(
            outputs.keys().collect::<Vec<_>>(),
            vec!["a", "b"],
            "key-sorted, locals excluded"
        );
    }

    #[test]
    fn falls_back_to_final_time_without_outputs() {
        let vars = [var("x", 0, Causality::Input, ScalarKind::Real)];
        let mut driver = FakeDriver::default();
        let outputs = run_session(&mut driver, &vars, &config(None), TIMING).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs["time"], ScalarValue::Real(10.0));
    }

    #[test]
    fn unknown_requested_output_is_rejected() {
        let vars = [var("y", 1, Causality::Output, ScalarKind::Real)];
        let mut driver = FakeDriver::default();
        let cfg = config(Some(vec!["z".into()]));
        assert!(matches!(
            run_session(&mut driver, &vars, &cfg, TIMING),
            Err(Error::UnknownOutput { name }) if name == "z"
        ));
    }
}
