//! Dynamic library loading and symbol resolution
//!
//! Native extensions hand us symbol names; this turns them into entry-point
//! addresses. Platform-agnostic wrapper around dlopen/LoadLibrary.

use crate::error::{InteropError, Result};
use crate::logging::log_library_load;
use core::ffi::c_void;
use core::ptr::NonNull;
use std::ffi::CString;

/// Handle to a dynamically loaded library
pub struct Library {
    handle: NonNull<c_void>,
    name: String,
}

impl Library {
    /// Load library by name or path
    pub fn load(name: &str) -> Result<Self> {
        let handle = Self::load_impl(name)?;
        log_library_load(name);
        Ok(Self {
            handle,
            name: name.to_string(),
        })
    }

    /// Handle to the running executable and everything it links
    #[cfg(unix)]
    pub fn this_process() -> Result<Self> {
        // SAFETY: a null filename asks for the main program handle.
        let handle = unsafe { libc::dlopen(core::ptr::null(), libc::RTLD_NOW) };
        NonNull::new(handle)
            .map(|handle| Self {
                handle,
                name: "<process>".to_string(),
            })
            .ok_or_else(|| InteropError::LibraryLoad(last_dl_error()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[cfg(unix)]
    fn load_impl(name: &str) -> Result<NonNull<c_void>> {
        let cname = CString::new(name).map_err(|_| InteropError::InvalidName)?;

        // SAFETY: `cname` is a valid NUL-terminated string.
        let handle = unsafe { libc::dlopen(cname.as_ptr(), libc::RTLD_NOW) };
        NonNull::new(handle).ok_or_else(|| InteropError::LibraryLoad(last_dl_error()))
    }

    #[cfg(windows)]
    fn load_impl(name: &str) -> Result<NonNull<c_void>> {
        use std::ffi::OsStr;
        use std::os::windows::ffi::OsStrExt;
        use winapi::um::errhandlingapi::GetLastError;
        use winapi::um::libloaderapi::LoadLibraryW;

        if name.contains('\0') {
            return Err(InteropError::InvalidName);
        }
        let wide: Vec<u16> = OsStr::new(name).encode_wide().chain(Some(0)).collect();

        // SAFETY: `wide` is NUL-terminated.
        unsafe {
            let handle = LoadLibraryW(wide.as_ptr());
            NonNull::new(handle as *mut c_void).ok_or_else(|| {
                InteropError::LibraryLoad(format!("Error code: {}", GetLastError()))
            })
        }
    }

    /// Resolve a symbol to a code address
    pub fn symbol(&self, name: &str) -> Result<*const c_void> {
        let cname = CString::new(name).map_err(|_| InteropError::InvalidName)?;
        let ptr = self.symbol_impl(&cname);
        if ptr.is_null() {
            Err(InteropError::SymbolNotFound(name.to_string()))
        } else {
            Ok(ptr)
        }
    }

    #[cfg(unix)]
    fn symbol_impl(&self, name: &CString) -> *const c_void {
        // SAFETY: handle is live for `self`, name is NUL-terminated.
        unsafe { libc::dlsym(self.handle.as_ptr(), name.as_ptr()) as *const c_void }
    }

    #[cfg(windows)]
    fn symbol_impl(&self, name: &CString) -> *const c_void {
        use winapi::shared::minwindef::HMODULE;
        use winapi::um::libloaderapi::GetProcAddress;

        // SAFETY: handle is live for `self`, name is NUL-terminated.
        unsafe { GetProcAddress(self.handle.as_ptr() as HMODULE, name.as_ptr()) as *const c_void }
    }
}

impl Drop for Library {
    #[cfg(unix)]
    fn drop(&mut self) {
        // SAFETY: handle came from dlopen and is closed exactly once.
        unsafe {
            libc::dlclose(self.handle.as_ptr());
        }
    }

    #[cfg(windows)]
    fn drop(&mut self) {
        use winapi::shared::minwindef::HMODULE;
        use winapi::um::libloaderapi::FreeLibrary;

        // SAFETY: handle came from LoadLibraryW and is freed exactly once.
        unsafe {
            FreeLibrary(self.handle.as_ptr() as HMODULE);
        }
    }
}

unsafe impl Send for Library {}
unsafe impl Sync for Library {}

#[cfg(unix)]
fn last_dl_error() -> String {
    // SAFETY: dlerror returns null or a NUL-terminated thread-local message.
    unsafe {
        let err = libc::dlerror();
        if err.is_null() {
            "Unknown error".into()
        } else {
            std::ffi::CStr::from_ptr(err).to_string_lossy().into_owned()
        }
    }
}
