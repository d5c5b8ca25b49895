//! Location of the shim's own module on disk
//!
//! The configuration file, the log file name and the chained runtime are all
//! derived from where the shim library was loaded from.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of the configuration file next to the module
pub const CONFIG_EXTENSION: &str = "cfg";

/// Extension of the log file
pub const LOG_EXTENSION: &str = "log";

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Could not resolve the module containing the shim")]
    ModuleNotFound,

    #[error("Module path is not valid text")]
    InvalidPath,
}

/// Where the shim lives, and the file names derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    /// Directory containing the module
    pub dir: PathBuf,
    /// Module file name without extension
    pub base_name: String,
}

impl ModuleLocation {
    /// Locate the module this code was loaded from (the shim library, or the
    /// executable when linked statically).
    pub fn current() -> Result<Self, LocationError> {
        Self::from_module_path(&current_module_path()?)
    }

    pub fn from_module_path(path: &Path) -> Result<Self, LocationError> {
        let base_name = path
            .file_stem()
            .ok_or(LocationError::InvalidPath)?
            .to_str()
            .ok_or(LocationError::InvalidPath)?
            .to_string();
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self { dir, base_name })
    }

    /// Fallback used when the module cannot be resolved
    pub fn fallback() -> Self {
        Self {
            dir: PathBuf::new(),
            base_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.base_name, CONFIG_EXTENSION))
    }

    /// Log file inside the per-user local data directory
    pub fn log_path(&self) -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(format!("{}.{}", self.base_name, LOG_EXTENSION)))
    }
}

// Any address inside this module identifies it.
static MODULE_ANCHOR: u8 = 0;

#[cfg(unix)]
fn current_module_path() -> Result<PathBuf, LocationError> {
    use std::ffi::CStr;
    use std::os::unix::ffi::OsStrExt;

    let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
    let addr = &MODULE_ANCHOR as *const u8 as *const libc::c_void;

    // SAFETY: `addr` points into this module; `info` is a valid out parameter.
    let found = unsafe { libc::dladdr(addr, &mut info) };
    if found == 0 || info.dli_fname.is_null() {
        return Err(LocationError::ModuleNotFound);
    }

    // SAFETY: dladdr returns a NUL-terminated path owned by the dynamic linker.
    let name = unsafe { CStr::from_ptr(info.dli_fname) };
    if name.to_bytes().is_empty() {
        // glibc reports the main program with an empty name
        return std::env::current_exe().map_err(|_| LocationError::ModuleNotFound);
    }
    Ok(PathBuf::from(std::ffi::OsStr::from_bytes(name.to_bytes())))
}

#[cfg(windows)]
fn current_module_path() -> Result<PathBuf, LocationError> {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use windows_sys::Win32::Foundation::HMODULE;
    use windows_sys::Win32::System::LibraryLoader::{
        GetModuleFileNameW, GetModuleHandleExW, GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS,
        GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
    };

    let mut module: HMODULE = std::ptr::null_mut();
    let addr = &MODULE_ANCHOR as *const u8 as *const u16;

    // SAFETY: with FROM_ADDRESS the name argument is an address inside the module.
    let found = unsafe {
        GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
            addr,
            &mut module,
        )
    };
    if found == 0 {
        return Err(LocationError::ModuleNotFound);
    }

    let mut buf = vec![0u16; 32 * 1024];
    // SAFETY: `buf` is writable for `buf.len()` wide characters.
    let len = unsafe { GetModuleFileNameW(module, buf.as_mut_ptr(), buf.len() as u32) };
    if len == 0 {
        return Err(LocationError::ModuleNotFound);
    }
    buf.truncate(len as usize);
    Ok(PathBuf::from(OsString::from_wide(&buf)))
}

#[cfg(not(any(unix, windows)))]
fn current_module_path() -> Result<PathBuf, LocationError> {
    std::env::current_exe().map_err(|_| LocationError::ModuleNotFound)
}
