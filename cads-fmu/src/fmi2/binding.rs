//! Raw FMI 2.0 types and the dynamically loaded Co-Simulation API subset.
//!
//! Only the functions the driver actually calls are resolved; the symbol
//! table is looked up once when the FMU's shared library is opened and the
//! function pointers stay valid for as long as `_lib` is held.

#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

use libloading::Library;

pub type fmi2Component = *mut c_void;
pub type fmi2ComponentEnvironment = *mut c_void;
pub type fmi2String = *const c_char;
pub type fmi2Real = f64;
pub type fmi2Integer = c_int;
pub type fmi2Boolean = c_int;
pub type fmi2ValueReference = c_uint;
pub type fmi2Status = c_int;

pub const fmi2OK: fmi2Status = 0;
pub const fmi2Warning: fmi2Status = 1;
pub const fmi2Discard: fmi2Status = 2;
pub const fmi2Error: fmi2Status = 3;
pub const fmi2Fatal: fmi2Status = 4;
pub const fmi2Pending: fmi2Status = 5;

pub const fmi2True: fmi2Boolean = 1;
pub const fmi2False: fmi2Boolean = 0;

/// `fmi2Type` argument of `fmi2Instantiate`.
pub const fmi2CoSimulation: c_int = 1;

pub type fmi2CallbackLogger = Option<
    unsafe extern "C" fn(
        fmi2ComponentEnvironment,
        fmi2String,
        fmi2Status,
        fmi2String,
        fmi2String,
        ...
    ),
>;
pub type fmi2CallbackAllocateMemory = Option<unsafe extern "C" fn(usize, usize) -> *mut c_void>;
pub type fmi2CallbackFreeMemory = Option<unsafe extern "C" fn(*mut c_void)>;
pub type fmi2StepFinished = Option<unsafe extern "C" fn(fmi2ComponentEnvironment, fmi2Status)>;

#[repr(C)]
pub struct fmi2CallbackFunctions {
    pub logger: fmi2CallbackLogger,
    pub allocateMemory: fmi2CallbackAllocateMemory,
    pub freeMemory: fmi2CallbackFreeMemory,
    pub stepFinished: fmi2StepFinished,
    pub componentEnvironment: fmi2ComponentEnvironment,
}

pub fn status_name(status: fmi2Status) -> &'static str {
    match status {
        fmi2OK => "OK",
        fmi2Warning => "Warning",
        fmi2Discard => "Discard",
        fmi2Error => "Error",
        fmi2Fatal => "Fatal",
        fmi2Pending => "Pending",
        _ => "Unknown",
    }
}

/// The FMI 2.0 Co-Simulation function table.
pub struct Fmi2Api {
    /// Keeps the shared library mapped while the function pointers live.
    _lib: Library,
    pub fmi2GetVersion: unsafe extern "C" fn() -> fmi2String,
    pub fmi2Instantiate: unsafe extern "C" fn(
        fmi2String,
        c_int,
        fmi2String,
        fmi2String,
        *const fmi2CallbackFunctions,
        fmi2Boolean,
        fmi2Boolean,
    ) -> fmi2Component,
    pub fmi2FreeInstance: unsafe extern "C" fn(fmi2Component),
    pub fmi2SetupExperiment: unsafe extern "C" fn(
        fmi2Component,
        fmi2Boolean,
        fmi2Real,
        fmi2Real,
        fmi2Boolean,
        fmi2Real,
    ) -> fmi2Status,
    pub fmi2EnterInitializationMode: unsafe extern "C" fn(fmi2Component) -> fmi2Status,
    pub fmi2ExitInitializationMode: unsafe extern "C" fn(fmi2Component) -> fmi2Status,
    pub fmi2Terminate: unsafe extern "C" fn(fmi2Component) -> fmi2Status,
    pub fmi2DoStep:
        unsafe extern "C" fn(fmi2Component, fmi2Real, fmi2Real, fmi2Boolean) -> fmi2Status,
    pub fmi2GetReal: unsafe extern "C" fn(
        fmi2Component,
        *const fmi2ValueReference,
        usize,
        *mut fmi2Real,
    ) -> fmi2Status,
    pub fmi2GetInteger: unsafe extern "C" fn(
        fmi2Component,
        *const fmi2ValueReference,
        usize,
        *mut fmi2Integer,
    ) -> fmi2Status,
    pub fmi2GetBoolean: unsafe extern "C" fn(
        fmi2Component,
        *const fmi2ValueReference,
        usize,
        *mut fmi2Boolean,
    ) -> fmi2Status,
    pub fmi2SetReal: unsafe extern "C" fn(
        fmi2Component,
        *const fmi2ValueReference,
        usize,
        *const fmi2Real,
    ) -> fmi2Status,
    pub fmi2SetInteger: unsafe extern "C" fn(
        fmi2Component,
        *const fmi2ValueReference,
        usize,
        *const fmi2Integer,
    ) -> fmi2Status,
    pub fmi2SetBoolean: unsafe extern "C" fn(
        fmi2Component,
        *const fmi2ValueReference,
        usize,
        *const fmi2Boolean,
    ) -> fmi2Status,
}

impl Fmi2Api {
    /// Open the shared library and resolve the Co-Simulation symbols.
    ///
    /// # Safety
    /// The file at `path` must be a library implementing the FMI 2.0 C API.
    pub unsafe fn load(path: &std::path::Path) -> Result<Self, libloading::Error> {
        let lib = Library::new(path)?;
        macro_rules! sym {
            ($name:ident) => {{
                let symbol = lib.get(concat!(stringify!($name), "\0").as_bytes())?;
                *symbol
            }};
        }
        Ok(Self {
            fmi2GetVersion: sym!(fmi2GetVersion),
            fmi2Instantiate: sym!(fmi2Instantiate),
            fmi2FreeInstance: sym!(fmi2FreeInstance),
            fmi2SetupExperiment: sym!(fmi2SetupExperiment),
            fmi2EnterInitializationMode: sym!(fmi2EnterInitializationMode),
            fmi2ExitInitializationMode: sym!(fmi2ExitInitializationMode),
            fmi2Terminate: sym!(fmi2Terminate),
            fmi2DoStep: sym!(fmi2DoStep),
            fmi2GetReal: sym!(fmi2GetReal),
            fmi2GetInteger: sym!(fmi2GetInteger),
            fmi2GetBoolean: sym!(fmi2GetBoolean),
            fmi2SetReal: sym!(fmi2SetReal),
            fmi2SetInteger: sym!(fmi2SetInteger),
            fmi2SetBoolean: sym!(fmi2SetBoolean),
            _lib: lib,
        })
    }
}
