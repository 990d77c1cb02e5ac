// Off Windows there is no DLL search order to restrict.  Every call fails with
// `Unsupported` so callers take their normal error path.

use std::path::PathBuf;

use crate::{
    error::{DllGuardError, Result},
    platform::{DllApi, ModuleHandle},
    search_order::SearchDirs,
    wide::WideCString,
};

pub(crate) struct UnsupportedApi;

impl DllApi for UnsupportedApi {
    fn set_dll_directory(&self, _path: &WideCString) -> Result<()> {
        Err(DllGuardError::Unsupported("SetDllDirectoryW"))
    }

    fn set_default_dll_directories(&self, _dirs: SearchDirs) -> Result<()> {
        Err(DllGuardError::Unsupported("SetDefaultDllDirectories"))
    }

    fn load_library(&self, _name: &WideCString) -> Result<ModuleHandle> {
        Err(DllGuardError::Unsupported("LoadLibraryW"))
    }

    fn free_library(&self, _module: ModuleHandle) -> Result<()> {
        Err(DllGuardError::Unsupported("FreeLibrary"))
    }

    fn module_path(&self, _module: ModuleHandle) -> Result<PathBuf> {
        Err(DllGuardError::Unsupported("GetModuleFileNameW"))
    }

    fn system_directory(&self) -> Result<PathBuf> {
        Err(DllGuardError::Unsupported("GetSystemDirectoryW"))
    }
}
