//! Raw FMI 3.0 types and the dynamically loaded Co-Simulation API subset.

#![allow(non_camel_case_types, non_snake_case, non_upper_case_globals)]

use std::os::raw::{c_char, c_int, c_uint, c_void};

use libloading::Library;

pub type fmi3Instance = *mut c_void;
pub type fmi3InstanceEnvironment = *mut c_void;
pub type fmi3String = *const c_char;
pub type fmi3Float64 = f64;
pub type fmi3Int32 = i32;
pub type fmi3Boolean = bool;
pub type fmi3ValueReference = c_uint;
pub type fmi3Status = c_int;

pub const fmi3OK: fmi3Status = 0;
pub const fmi3Warning: fmi3Status = 1;
pub const fmi3Discard: fmi3Status = 2;
pub const fmi3Error: fmi3Status = 3;
pub const fmi3Fatal: fmi3Status = 4;

pub type fmi3LogMessageCallback =
    Option<unsafe extern "C" fn(fmi3InstanceEnvironment, fmi3Status, fmi3String, fmi3String)>;

pub type fmi3IntermediateUpdateCallback = Option<
    unsafe extern "C" fn(
        fmi3InstanceEnvironment,
        fmi3Float64,
        fmi3Boolean,
        fmi3Boolean,
        fmi3Boolean,
        fmi3Boolean,
        *mut fmi3Boolean,
        *mut fmi3Float64,
    ),
>;

pub fn status_name(status: fmi3Status) -> &'static str {
    match status {
        fmi3OK => "OK",
        fmi3Warning => "Warning",
        fmi3Discard => "Discard",
        fmi3Error => "Error",
        fmi3Fatal => "Fatal",
        _ => "Unknown",
    }
}

/// The FMI 3.0 Co-Simulation function table.
pub struct Fmi3Api {
    /// Keeps the shared library mapped while the function pointers live.
    _lib: Library,
    pub fmi3GetVersion: unsafe extern "C" fn() -> fmi3String,
    pub fmi3InstantiateCoSimulation: unsafe extern "C" fn(
        fmi3String,
        fmi3String,
        fmi3String,
        fmi3Boolean,
        fmi3Boolean,
        fmi3Boolean,
        fmi3Boolean,
        *const fmi3ValueReference,
        usize,
        fmi3InstanceEnvironment,
        fmi3LogMessageCallback,
        fmi3IntermediateUpdateCallback,
    ) -> fmi3Instance,
    pub fmi3FreeInstance: unsafe extern "C" fn(fmi3Instance),
    pub fmi3EnterInitializationMode: unsafe extern "C" fn(
        fmi3Instance,
        fmi3Boolean,
        fmi3Float64,
        fmi3Float64,
        fmi3Boolean,
        fmi3Float64,
    ) -> fmi3Status,
    pub fmi3ExitInitializationMode: unsafe extern "C" fn(fmi3Instance) -> fmi3Status,
    pub fmi3Terminate: unsafe extern "C" fn(fmi3Instance) -> fmi3Status,
    pub fmi3DoStep: unsafe extern "C" fn(
        fmi3Instance,
        fmi3Float64,
        fmi3Float64,
        fmi3Boolean,
        *mut fmi3Boolean,
        *mut fmi3Boolean,
        *mut fmi3Boolean,
        *mut fmi3Float64,
    ) -> fmi3Status,
    pub fmi3GetFloat64: unsafe extern "C" fn(
        fmi3Instance,
        *const fmi3ValueReference,
        usize,
        *mut fmi3Float64,
        usize,
    ) -> fmi3Status,
    pub fmi3GetInt32: unsafe extern "C" fn(
        fmi3Instance,
        *const fmi3ValueReference,
        usize,
        *mut fmi3Int32,
        usize,
    ) -> fmi3Status,
    pub fmi3GetBoolean: unsafe extern "C" fn(
        fmi3Instance,
        *const fmi3ValueReference,
        usize,
        *mut fmi3Boolean,
        usize,
    ) -> fmi3Status,
    pub fmi3SetFloat64: unsafe extern "C" fn(
        fmi3Instance,
        *const fmi3ValueReference,
        usize,
        *const fmi3Float64,
        usize,
    ) -> fmi3Status,
    pub fmi3SetInt32: unsafe extern "C" fn(
        fmi3Instance,
        *const fmi3ValueReference,
        usize,
        *const fmi3Int32,
        usize,
    ) -> fmi3Status,
    pub fmi3SetBoolean: unsafe extern "C" fn(
        fmi3Instance,
        *const fmi3ValueReference,
        usize,
        *const fmi3Boolean,
        usize,
    ) -> fmi3Status,
}

impl Fmi3Api {
    /// Open the shared library and resolve the Co-Simulation symbols.
    ///
    /// # Safety
    /// The file at `path` must be a library implementing the FMI 3.0 C API.
    pub unsafe fn load(path: &std::path::Path) -> Result<Self, libloading::Error> {
        let lib = Library::new(path)?;
        macro_rules! sym {
            ($name:ident) => {{
                let symbol = lib.get(concat!(stringify!($name), "\0").as_bytes())?;
                *symbol
            }};
        }
        Ok(Self {
            fmi3GetVersion: sym!(fmi3GetVersion),
            fmi3InstantiateCoSimulation: sym!(fmi3InstantiateCoSimulation),
            fmi3FreeInstance: sym!(fmi3FreeInstance),
            fmi3EnterInitializationMode: sym!(fmi3EnterInitializationMode),
            fmi3ExitInitializationMode: sym!(fmi3ExitInitializationMode),
            fmi3Terminate: sym!(fmi3Terminate),
            fmi3DoStep: sym!(fmi3DoStep),
            fmi3GetFloat64: sym!(fmi3GetFloat64),
            fmi3GetInt32: sym!(fmi3GetInt32),
            fmi3GetBoolean: sym!(fmi3GetBoolean),
            fmi3SetFloat64: sym!(fmi3SetFloat64),
            fmi3SetInt32: sym!(fmi3SetInt32),
            fmi3SetBoolean: sym!(fmi3SetBoolean),
            _lib: lib,
        })
    }
}

/// Forwards FMU log lines into the `log` facade.
pub(crate) unsafe extern "C" fn log_message_callback(
    _instance_environment: fmi3InstanceEnvironment,
    status: fmi3Status,
    category: fmi3String,
    message: fmi3String,
) {
    let category = if category.is_null() {
        "NULL"
    } else {
        std::ffi::CStr::from_ptr(category).to_str().unwrap_or("NULL")
    };
    let message = if message.is_null() {
        "NULL"
    } else {
        std::ffi::CStr::from_ptr(message).to_str().unwrap_or("NULL")
    };

    let level = match status {
        fmi3OK => log::Level::Info,
        fmi3Warning | fmi3Discard => log::Level::Warn,
        _ => log::Level::Error,
    };

    log::logger().log(
        &log::Record::builder()
            .args(format_args!("{message}"))
            .level(level)
            .module_path(Some("fmu"))
            .target(category)
            .build(),
    );
}
