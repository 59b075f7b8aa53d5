//! FMI 3.0 Co-Simulation driver.
//!
//! Structurally the same session as the 2.0 driver; the differences are the
//! combined initialization-mode entry (no separate setup_experiment call)
//! and the extended `fmi3DoStep` out-flags, of which `terminateSimulation`
//! is honored.

mod binding;

use std::ffi::CString;

use cads_schema::traits::{DefaultExperimentView, ModelVariablesView};

use crate::{
    DEFAULT_TOLERANCE, Error, INSTANCE_NAME, OutputMap, RunConfig,
    import::Fmi3Import,
    session::{self, CoSimDriver, StepOutcome},
    timing::Timing,
};

use binding::{Fmi3Api, status_name};

/// Run one Co-Simulation session against an extracted FMI 3.0 FMU.
pub(crate) fn simulate(import: &Fmi3Import, config: &RunConfig) -> Result<OutputMap, Error> {
    let descr = import.model_description();
    let co_simulation = descr
        .co_simulation
        .as_ref()
        .ok_or_else(|| Error::UnsupportedFmuKind {
            model: descr.model_name.clone(),
        })?;

    let timing = Timing::resolve(&config.timing, descr)?;
    let tolerance = descr.tolerance().unwrap_or(DEFAULT_TOLERANCE);

    let mut instance = Instance::new(import, &co_simulation.model_identifier, INSTANCE_NAME)?;
    instance.enter_initialization_mode(tolerance, timing.start, timing.stop)?;

    let variables = descr.variables();
    let outputs = session::run_session(&mut instance, &variables, config, timing)?;

    instance.terminate()?;
    Ok(outputs)
}

/// One instantiated FMU. Terminated (if still needed) and freed on drop.
struct Instance {
    api: Fmi3Api,
    instance: binding::fmi3Instance,
    terminated: bool,
}

impl Instance {
    fn new(import: &Fmi3Import, model_identifier: &str, name: &str) -> Result<Self, Error> {
        let lib_path = import.shared_lib_path(model_identifier)?;
        log::debug!("loading shared library {lib_path:?}");
        let api = unsafe { Fmi3Api::load(&lib_path) }?;

        let instance_name = CString::new(name).expect("Error building CString");
        let token = CString::new(import.model_description().instantiation_token.as_bytes())
            .expect("Error building CString");
        let resource_path = CString::new(import.resource_path()).expect("Invalid resource path");

        let instance = unsafe {
            (api.fmi3InstantiateCoSimulation)(
                instance_name.as_ptr(),
                token.as_ptr(),
                resource_path.as_ptr(),
                false, // visible
                true,  // loggingOn
                false, // eventModeUsed
                false, // earlyReturnAllowed
                std::ptr::null(),
                0,
                std::ptr::null_mut(),
                Some(binding::log_message_callback),
                None,
            )
        };
        if instance.is_null() {
            return Err(Error::Instantiation);
        }
        log::trace!("instantiated FMI 3.0 CS instance {instance:?}");

        Ok(Self {
            api,
            instance,
            terminated: false,
        })
    }

    fn check(&self, call: &'static str, status: binding::fmi3Status) -> Result<(), Error> {
        match status {
            binding::fmi3OK => Ok(()),
            binding::fmi3Warning => {
                log::warn!("{call} returned status Warning");
                Ok(())
            }
            status => Err(Error::Call {
                call,
                status: status_name(status),
            }),
        }
    }

    fn enter_initialization_mode(
        &mut self,
        tolerance: f64,
        start: f64,
        stop: f64,
    ) -> Result<(), Error> {
        let status = unsafe {
            (self.api.fmi3EnterInitializationMode)(
                self.instance,
                true,
                tolerance,
                start,
                true,
                stop,
            )
        };
        self.check("fmi3EnterInitializationMode", status)
    }

    fn terminate(&mut self) -> Result<(), Error> {
        self.terminated = true;
        let status = unsafe { (self.api.fmi3Terminate)(self.instance) };
        self.check("fmi3Terminate", status)
    }
}

impl CoSimDriver for Instance {
    fn set_real(&mut self, vr: u32, value: f64) -> Result<(), Error> {
        let status = unsafe { (self.api.fmi3SetFloat64)(self.instance, &vr, 1, &value, 1) };
        self.check("fmi3SetFloat64", status)
    }

    fn set_integer(&mut self, vr: u32, value: i32) -> Result<(), Error> {
        let status = unsafe { (self.api.fmi3SetInt32)(self.instance, &vr, 1, &value, 1) };
        self.check("fmi3SetInt32", status)
    }

    fn set_boolean(&mut self, vr: u32, value: bool) -> Result<(), Error> {
        let status = unsafe { (self.api.fmi3SetBoolean)(self.instance, &vr, 1, &value, 1) };
        self.check("fmi3SetBoolean", status)
    }

    fn get_real(&mut self, vr: u32) -> Result<f64, Error> {
        let mut value = 0.0;
        let status = unsafe { (self.api.fmi3GetFloat64)(self.instance, &vr, 1, &mut value, 1) };
        self.check("fmi3GetFloat64", status)?;
        Ok(value)
    }

    fn get_integer(&mut self, vr: u32) -> Result<i32, Error> {
        let mut value = 0;
        let status = unsafe { (self.api.fmi3GetInt32)(self.instance, &vr, 1, &mut value, 1) };
        self.check("fmi3GetInt32", status)?;
        Ok(value)
    }

    fn get_boolean(&mut self, vr: u32) -> Result<bool, Error> {
        let mut value = false;
        let status = unsafe { (self.api.fmi3GetBoolean)(self.instance, &vr, 1, &mut value, 1) };
        self.check("fmi3GetBoolean", status)?;
        Ok(value)
    }

    fn exit_initialization_mode(&mut self) -> Result<(), Error> {
        let status = unsafe { (self.api.fmi3ExitInitializationMode)(self.instance) };
        self.check("fmi3ExitInitializationMode", status)
    }

    fn do_step(&mut self, current: f64, step: f64) -> Result<StepOutcome, Error> {
        let mut event_handling_needed = false;
        let mut terminate_simulation = false;
        let mut early_return = false;
        let mut last_successful_time = current;

        let status = unsafe {
            (self.api.fmi3DoStep)(
                self.instance,
                current,
                step,
                true, // noSetFMUStatePriorToCurrentPoint
                &mut event_handling_needed,
                &mut terminate_simulation,
                &mut early_return,
                &mut last_successful_time,
            )
        };
        match status {
            binding::fmi3OK | binding::fmi3Warning => {
                if early_return {
                    // Early return was not allowed at instantiation; the FMU
                    // still reached last_successful_time, so keep going.
                    log::debug!("FMU returned early at t = {last_successful_time}");
                }
                Ok(StepOutcome {
                    terminate_requested: terminate_simulation,
                })
            }
            status => Err(Error::StepFailure {
                time: current,
                status: status_name(status),
            }),
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        log::trace!("freeing instance {:?}", self.instance);
        unsafe {
            if !self.terminated {
                (self.api.fmi3Terminate)(self.instance);
            }
            (self.api.fmi3FreeInstance)(self.instance);
        }
    }
}
