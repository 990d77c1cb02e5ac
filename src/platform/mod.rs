// ── Platform abstraction layer ────────────────────────────────────────────────
//
// This module defines the interface that the rest of the codebase uses to
// talk to the OS loader.  No `unsafe` lives here; all Win32 FFI is confined to
// the `win32` sub-module and never leaks outward.

use std::path::PathBuf;

use crate::{error::Result, search_order::SearchDirs, wide::WideCString};

#[cfg(windows)]
pub(crate) mod win32;

#[cfg(not(windows))]
mod unsupported;

#[cfg(test)]
pub(crate) mod fake;

/// Raw module handle (`HMODULE`) as returned by the loader.
///
/// Plain address so that non-Windows builds and test doubles can mint one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ModuleHandle(usize);

impl ModuleHandle {
    #[cfg_attr(not(any(windows, test)), allow(dead_code))]
    pub(crate) fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    pub(crate) fn as_raw(self) -> usize {
        self.0
    }
}

/// The loader calls dllguard makes, one method per Win32 function.
pub(crate) trait DllApi {
    /// `SetDllDirectoryW(path)`.  `path` is always a real string, never null.
    fn set_dll_directory(&self, path: &WideCString) -> Result<()>;

    /// `SetDefaultDllDirectories(dirs)`.
    fn set_default_dll_directories(&self, dirs: SearchDirs) -> Result<()>;

    /// `LoadLibraryW(name)`.
    fn load_library(&self, name: &WideCString) -> Result<ModuleHandle>;

    /// `FreeLibrary(module)`.
    fn free_library(&self, module: ModuleHandle) -> Result<()>;

    /// `GetModuleFileNameW(module)`.
    fn module_path(&self, module: ModuleHandle) -> Result<PathBuf>;

    /// `GetSystemDirectoryW()`.
    fn system_directory(&self) -> Result<PathBuf>;
}

/// The implementation backed by the running OS.
pub(crate) fn native() -> &'static dyn DllApi {
    #[cfg(windows)]
    {
        &win32::Win32Api
    }
    #[cfg(not(windows))]
    {
        &unsupported::UnsupportedApi
    }
}
