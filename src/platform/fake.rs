// Recording test double for `DllApi`.  Stores exactly what each "native" call
// received so tests can inspect the marshaled arguments.

use std::{
    cell::{Cell, RefCell},
    path::PathBuf,
};

use crate::{
    error::{DllGuardError, Result},
    platform::{DllApi, ModuleHandle},
    search_order::SearchDirs,
    wide::WideCString,
};

pub(crate) const SYSTEM_DIR: &str = r"C:\Windows\System32";

const ERROR_MOD_NOT_FOUND: u32 = 126;
const ERROR_PROC_NOT_FOUND: u32 = 127;
const ERROR_INVALID_PARAMETER: u32 = 87;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    /// Units received, terminator included, and whether the pointer was null.
    SetDllDirectory { units: Vec<u16>, null: bool },
    SetDefaultDllDirectories(u32),
    LoadLibrary(Vec<u16>),
    FreeLibrary(usize),
}

#[derive(Default)]
pub(crate) struct FakeApi {
    calls: RefCell<Vec<Call>>,
    modules: Vec<(String, PathBuf)>,
    pub(crate) fail_default_dirs: Cell<bool>,
    pub(crate) fail_set_dll_directory: Cell<bool>,
    pub(crate) fail_free: Cell<bool>,
}

impl FakeApi {
    /// Register a library the fake loader can resolve, and where it lives.
    pub(crate) fn with_module(mut self, name: &str, path: &str) -> Self {
        self.modules.push((name.to_owned(), PathBuf::from(path)));
        self
    }

    /// `Library` keeps a `&'static dyn DllApi`.
    pub(crate) fn leak(self) -> &'static Self {
        Box::leak(Box::new(self))
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn handle_for(index: usize) -> ModuleHandle {
        ModuleHandle::from_raw((index + 1) * 0x1_0000)
    }
}

impl DllApi for FakeApi {
    fn set_dll_directory(&self, path: &WideCString) -> Result<()> {
        self.record(Call::SetDllDirectory {
            units: path.as_slice_with_nul().to_vec(),
            null: path.as_ptr().is_null(),
        });
        if self.fail_set_dll_directory.get() {
            return Err(DllGuardError::Win32 {
                function: "SetDllDirectoryW",
                code: ERROR_INVALID_PARAMETER,
            });
        }
        Ok(())
    }

    fn set_default_dll_directories(&self, dirs: SearchDirs) -> Result<()> {
        self.record(Call::SetDefaultDllDirectories(dirs.bits()));
        if self.fail_default_dirs.get() {
            return Err(DllGuardError::Win32 {
                function: "SetDefaultDllDirectories",
                code: ERROR_PROC_NOT_FOUND,
            });
        }
        Ok(())
    }

    fn load_library(&self, name: &WideCString) -> Result<ModuleHandle> {
        let units = name.as_slice_with_nul();
        self.record(Call::LoadLibrary(units.to_vec()));
        let wanted = String::from_utf16_lossy(&units[..name.len()]);
        self.modules
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(&wanted))
            .map(Self::handle_for)
            .ok_or(DllGuardError::Win32 {
                function: "LoadLibraryW",
                code: ERROR_MOD_NOT_FOUND,
            })
    }

    fn free_library(&self, module: ModuleHandle) -> Result<()> {
        self.record(Call::FreeLibrary(module.as_raw()));
        if self.fail_free.get() {
            return Err(DllGuardError::Win32 {
                function: "FreeLibrary",
                code: ERROR_INVALID_PARAMETER,
            });
        }
        Ok(())
    }

    fn module_path(&self, module: ModuleHandle) -> Result<PathBuf> {
        (0..self.modules.len())
            .find(|&i| Self::handle_for(i) == module)
            .map(|i| self.modules[i].1.clone())
            .ok_or(DllGuardError::Win32 {
                function: "GetModuleFileNameW",
                code: ERROR_MOD_NOT_FOUND,
            })
    }

    fn system_directory(&self) -> Result<PathBuf> {
        Ok(PathBuf::from(SYSTEM_DIR))
    }
}
