//! Preload of an embedded interpreter runtime.
//!
//! Some FMUs are exported against a Python interpreter and resolve its
//! symbols lazily when their own library is loaded. On Linux this requires
//! the interpreter library to be in the global symbol namespace before the
//! FMU binary is opened. `CADS_PYTHON_LIBRARY` names the library to load;
//! when unset a short candidate list is probed. Failure is non-fatal: the
//! FMU may not need an interpreter at all.

pub(crate) const ENV_PYTHON_LIBRARY: &str = "CADS_PYTHON_LIBRARY";

#[cfg(target_os = "linux")]
pub(crate) fn preload() {
    use std::sync::OnceLock;

    use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_NOW};

    // Held for the lifetime of the process; dropped at teardown.
    static HANDLE: OnceLock<Option<Library>> = OnceLock::new();

    const CANDIDATES: &[&str] = &[
        "libpython3.12.so.1.0",
        "libpython3.11.so.1.0",
        "libpython3.10.so.1.0",
        "libpython3.so",
    ];

    HANDLE.get_or_init(|| {
        let names: Vec<String> = match std::env::var(ENV_PYTHON_LIBRARY) {
            Ok(name) => vec![name],
            Err(_) => CANDIDATES.iter().map(|s| (*s).to_owned()).collect(),
        };
        for name in &names {
            match unsafe { Library::open(Some(name), RTLD_NOW | RTLD_GLOBAL) } {
                Ok(lib) => {
                    log::debug!("preloaded interpreter library {name}");
                    return Some(lib);
                }
                Err(e) => log::trace!("interpreter library {name} not available: {e}"),
            }
        }
        log::debug!("no embedded interpreter library found, continuing without one");
        None
    });
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn preload() {}
