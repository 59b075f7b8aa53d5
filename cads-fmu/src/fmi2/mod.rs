//! FMI 2.0 Co-Simulation driver.

mod binding;
mod logger;

use std::ffi::CString;

use cads_schema::traits::{DefaultExperimentView, ModelVariablesView};

use crate::{
    DEFAULT_TOLERANCE, Error, INSTANCE_NAME, OutputMap, RunConfig,
    import::Fmi2Import,
    session::{self, CoSimDriver, StepOutcome},
    timing::Timing,
};

use binding::{Fmi2Api, status_name};

/// Run one Co-Simulation session against an extracted FMI 2.0 FMU.
pub(crate) fn simulate(import: &Fmi2Import, config: &RunConfig) -> Result<OutputMap, Error> {
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
    instance.setup_experiment(tolerance, timing.start, timing.stop)?;
    instance.enter_initialization_mode()?;

    let variables = descr.variables();
    let outputs = session::run_session(&mut instance, &variables, config, timing)?;

    instance.terminate()?;
    Ok(outputs)
}

/// One instantiated FMU component. Terminated (if still needed) and freed
/// on drop, so every exit path releases the native instance before the
/// scratch directory goes away.
struct Instance {
    api: Fmi2Api,
    component: binding::fmi2Component,
    /// Must outlive the component per the FMI 2.0 standard.
    #[allow(dead_code)]
    callbacks: Box<binding::fmi2CallbackFunctions>,
    terminated: bool,
}

impl Instance {
    fn new(import: &Fmi2Import, model_identifier: &str, name: &str) -> Result<Self, Error> {
        let lib_path = import.shared_lib_path(model_identifier)?;
        log::debug!("loading shared library {lib_path:?}");
        let api = unsafe { Fmi2Api::load(&lib_path) }?;

        let callbacks = Box::new(binding::fmi2CallbackFunctions {
            logger: Some(logger::cads_fmi2_log_shim as _),
            allocateMemory: Some(libc::calloc),
            freeMemory: Some(libc::free),
            stepFinished: None,
            componentEnvironment: std::ptr::null_mut(),
        });

        let instance_name = CString::new(name).expect("Error building CString");
        let guid =
            CString::new(import.model_description().guid.as_bytes()).expect("Error building CString");
        let resource_url = CString::new(import.resource_url()).expect("Invalid resource path");

        let component = unsafe {
            (api.fmi2Instantiate)(
                instance_name.as_ptr(),
                binding::fmi2CoSimulation,
                guid.as_ptr(),
                resource_url.as_ptr(),
                &*callbacks,
                binding::fmi2False,
                binding::fmi2True,
            )
        };
        if component.is_null() {
            return Err(Error::Instantiation);
        }
        log::trace!("instantiated FMI 2.0 CS component {component:?}");

        Ok(Self {
            api,
            component,
            callbacks,
            terminated: false,
        })
    }

    fn check(&self, call: &'static str, status: binding::fmi2Status) -> Result<(), Error> {
        match status {
            binding::fmi2OK => Ok(()),
            binding::fmi2Warning => {
                log::warn!("{call} returned status Warning");
                Ok(())
            }
            status => Err(Error::Call {
                call,
                status: status_name(status),
            }),
        }
    }

    fn setup_experiment(&mut self, tolerance: f64, start: f64, stop: f64) -> Result<(), Error> {
        let status = unsafe {
            (self.api.fmi2SetupExperiment)(
                self.component,
                binding::fmi2True,
                tolerance,
                start,
                binding::fmi2True,
                stop,
            )
        };
        self.check("fmi2SetupExperiment", status)
    }

    fn enter_initialization_mode(&mut self) -> Result<(), Error> {
        let status = unsafe { (self.api.fmi2EnterInitializationMode)(self.component) };
        self.check("fmi2EnterInitializationMode", status)
    }

    fn terminate(&mut self) -> Result<(), Error> {
        self.terminated = true;
        let status = unsafe { (self.api.fmi2Terminate)(self.component) };
        self.check("fmi2Terminate", status)
    }
}

impl CoSimDriver for Instance {
    fn set_real(&mut self, vr: u32, value: f64) -> Result<(), Error> {
        let status = unsafe { (self.api.fmi2SetReal)(self.component, &vr, 1, &value) };
        self.check("fmi2SetReal", status)
    }

    fn set_integer(&mut self, vr: u32, value: i32) -> Result<(), Error> {
        let status = unsafe { (self.api.fmi2SetInteger)(self.component, &vr, 1, &value) };
        self.check("fmi2SetInteger", status)
    }

    fn set_boolean(&mut self, vr: u32, value: bool) -> Result<(), Error> {
        let value = if value { binding::fmi2True } else { binding::fmi2False };
        let status = unsafe { (self.api.fmi2SetBoolean)(self.component, &vr, 1, &value) };
        self.check("fmi2SetBoolean", status)
    }

    fn get_real(&mut self, vr: u32) -> Result<f64, Error> {
        let mut value = 0.0;
        let status = unsafe { (self.api.fmi2GetReal)(self.component, &vr, 1, &mut value) };
        self.check("fmi2GetReal", status)?;
        Ok(value)
    }

    fn get_integer(&mut self, vr: u32) -> Result<i32, Error> {
        let mut value = 0;
        let status = unsafe { (self.api.fmi2GetInteger)(self.component, &vr, 1, &mut value) };
        self.check("fmi2GetInteger", status)?;
        Ok(value)
    }

    fn get_boolean(&mut self, vr: u32) -> Result<bool, Error> {
        let mut value: binding::fmi2Boolean = 0;
        let status = unsafe { (self.api.fmi2GetBoolean)(self.component, &vr, 1, &mut value) };
        self.check("fmi2GetBoolean", status)?;
        Ok(value != 0)
    }

    fn exit_initialization_mode(&mut self) -> Result<(), Error> {
        let status = unsafe { (self.api.fmi2ExitInitializationMode)(self.component) };
        self.check("fmi2ExitInitializationMode", status)
    }

    fn do_step(&mut self, current: f64, step: f64) -> Result<StepOutcome, Error> {
        let status =
            unsafe { (self.api.fmi2DoStep)(self.component, current, step, binding::fmi2True) };
        match status {
            binding::fmi2OK | binding::fmi2Warning => Ok(StepOutcome {
                terminate_requested: false,
            }),
            status => Err(Error::StepFailure {
                time: current,
                status: status_name(status),
            }),
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        log::trace!("freeing component {:?}", self.component);
        unsafe {
            if !self.terminated {
                (self.api.fmi2Terminate)(self.component);
            }
            (self.api.fmi2FreeInstance)(self.component);
        }
    }
}
