//! Forwarding of FMU log lines into the `log` facade.

use super::binding;

/// Called from the C shim with the message already formatted.
#[no_mangle]
extern "C" fn cads_fmi2_log(
    _environment: binding::fmi2ComponentEnvironment,
    instance_name: binding::fmi2String,
    status: binding::fmi2Status,
    category: binding::fmi2String,
    message: binding::fmi2String,
) {
    let instance_name = unsafe { cstr_or(instance_name, "NULL") };
    let category = unsafe { cstr_or(category, "NULL") };
    let message = unsafe { cstr_or(message, "NULL") };

    let level = match status {
        binding::fmi2OK => log::Level::Info,
        binding::fmi2Warning | binding::fmi2Discard => log::Level::Warn,
        _ => log::Level::Error,
    };

    log::logger().log(
        &log::Record::builder()
            .args(format_args!("[{category}] {message}"))
            .level(level)
            .module_path(Some("fmu"))
            .target(instance_name)
            .build(),
    );
}

unsafe fn cstr_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> &'a str {
    if ptr.is_null() {
        return fallback;
    }
    std::ffi::CStr::from_ptr(ptr).to_str().unwrap_or(fallback)
}

#[link(name = "cads_fmi2_logger", kind = "static")]
extern "C" {
    /// The variadic shim implemented in logger.c.
    pub fn cads_fmi2_log_shim(
        environment: binding::fmi2ComponentEnvironment,
        instance_name: binding::fmi2String,
        status: binding::fmi2Status,
        category: binding::fmi2String,
        message: binding::fmi2String,
        ...
    );
}
