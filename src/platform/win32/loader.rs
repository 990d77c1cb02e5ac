#![allow(unsafe_code)]

use std::{ffi::c_void, path::PathBuf};

use log::debug;
use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{FreeLibrary, GetLastError, HMODULE},
        System::{
            LibraryLoader::{
                GetModuleFileNameW, LoadLibraryW, SetDefaultDllDirectories, SetDllDirectoryW,
                LOAD_LIBRARY_FLAGS,
            },
            SystemInformation::GetSystemDirectoryW,
        },
    },
};

use crate::{
    error::{DllGuardError, Result},
    platform::{DllApi, ModuleHandle},
    search_order::SearchDirs,
    wide::{path_from_buf, WideCString},
};

/// Maximum path length in `WCHAR`s, including the null terminator.
/// `MAX_PATH` (260) is too short for modern Windows paths; use 32 768 which
/// is the documented maximum for `\\?\` extended paths.
const PATH_BUF_LEN: usize = 32_768;

/// `DllApi` backed by kernel32.
pub(crate) struct Win32Api;

impl DllApi for Win32Api {
    fn set_dll_directory(&self, path: &WideCString) -> Result<()> {
        debug!("SetDllDirectoryW: {} code unit(s) before NUL", path.len());
        // SAFETY: path is a null-terminated UTF-16 buffer that outlives the
        // call.  The pointer is never null, so "" means "remove the current
        // directory" and not "restore the default order".
        unsafe { SetDllDirectoryW(pcwstr(path)) }
            .map_err(|e| DllGuardError::win32("SetDllDirectoryW", &e))
    }

    fn set_default_dll_directories(&self, dirs: SearchDirs) -> Result<()> {
        debug!("SetDefaultDllDirectories: flags {:#06x}", dirs.bits());
        // SAFETY: takes flags by value; invalid combinations are reported
        // through the return value, not undefined behaviour.
        unsafe { SetDefaultDllDirectories(LOAD_LIBRARY_FLAGS(dirs.bits())) }
            .map_err(|e| DllGuardError::win32("SetDefaultDllDirectories", &e))
    }

    fn load_library(&self, name: &WideCString) -> Result<ModuleHandle> {
        // SAFETY: name is a valid null-terminated UTF-16 string.  Running the
        // library's DllMain is the point of the call.
        let module = unsafe { LoadLibraryW(pcwstr(name)) }
            .map_err(|e| DllGuardError::win32("LoadLibraryW", &e))?;
        Ok(ModuleHandle::from_raw(module.0 as usize))
    }

    fn free_library(&self, module: ModuleHandle) -> Result<()> {
        // SAFETY: module was returned by a successful LoadLibraryW and the
        // owning `Library` frees it exactly once.
        unsafe { FreeLibrary(hmodule(module)) }
            .map_err(|e| DllGuardError::win32("FreeLibrary", &e))
    }

    fn module_path(&self, module: ModuleHandle) -> Result<PathBuf> {
        let mut buf = vec![0u16; PATH_BUF_LEN];
        // SAFETY: module is a live handle owned by the caller; the buffer
        // length is passed implicitly through the slice.
        let len = unsafe { GetModuleFileNameW(hmodule(module), &mut buf) } as usize;
        if len == 0 {
            return Err(last_error("GetModuleFileNameW"));
        }
        Ok(path_from_buf(&buf[..len]))
    }

    fn system_directory(&self) -> Result<PathBuf> {
        let mut buf = vec![0u16; PATH_BUF_LEN];
        // SAFETY: the slice bounds the write; no other preconditions.
        let len = unsafe { GetSystemDirectoryW(Some(&mut buf)) } as usize;
        if len == 0 || len >= buf.len() {
            return Err(last_error("GetSystemDirectoryW"));
        }
        Ok(path_from_buf(&buf[..len]))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// The exact pointer handed to Win32 for `s`.  Borrows `s`, so the buffer
/// outlives the call.
fn pcwstr(s: &WideCString) -> PCWSTR {
    PCWSTR(s.as_ptr())
}

fn hmodule(module: ModuleHandle) -> HMODULE {
    HMODULE(module.as_raw() as *mut c_void)
}

fn last_error(function: &'static str) -> DllGuardError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    DllGuardError::Win32 {
        function,
        code: code.0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
