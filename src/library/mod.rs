// ── Library loading ───────────────────────────────────────────────────────────
//
// `Library` owns one `LoadLibraryW` reference.  `FreeLibrary` is called on
// `Drop`.  Loading goes by bare file name only, so which copy gets mapped is
// decided entirely by the search order set up in `search_order`.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::{
    error::{DllGuardError, Result},
    platform::{self, DllApi, ModuleHandle},
    search_order::SafeSearchOrder,
    wide::WideCString,
};

/// RAII handle to a DLL loaded by name.
pub struct Library {
    api: &'static dyn DllApi,
    module: ModuleHandle,
    name: String,
}

impl Library {
    /// Load `name` (a bare file name such as `"dwmapi.dll"`).
    ///
    /// `_order` proves the current working directory has already been removed
    /// from the search order.
    pub fn load(_order: &SafeSearchOrder, name: &str) -> Result<Self> {
        Self::load_with(platform::native(), name)
    }

    /// Load `name` under whatever search order the process currently has.
    ///
    /// This is the vulnerable path: a same-named DLL in the working directory
    /// can win.
    pub fn load_unprotected(name: &str) -> Result<Self> {
        Self::load_unprotected_with(platform::native(), name)
    }

    pub(crate) fn load_unprotected_with(api: &'static dyn DllApi, name: &str) -> Result<Self> {
        warn!("loading {name} without a restricted DLL search order");
        Self::load_with(api, name)
    }

    pub(crate) fn load_with(api: &'static dyn DllApi, name: &str) -> Result<Self> {
        let wide = bare_file_name(name)?;
        let module = api.load_library(&wide)?;
        let lib = Self {
            api,
            module,
            name: name.to_owned(),
        };
        match lib.path() {
            Ok(path) => info!("loaded {name} from {}", path.display()),
            Err(e) => warn!("loaded {name}, but could not resolve its path: {e}"),
        }
        Ok(lib)
    }

    /// The name the library was requested by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path of the module the loader actually mapped.
    pub fn path(&self) -> Result<PathBuf> {
        self.api.module_path(self.module)
    }

    /// `true` if the mapped module lives directly in the system directory.
    pub fn is_from_system_directory(&self) -> Result<bool> {
        let path = self.path()?;
        let system = self.api.system_directory()?;
        Ok(parent_dir(&path).is_some_and(|dir| same_dir(&dir, &system.to_string_lossy())))
    }
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("module", &format_args!("{:#x}", self.module.as_raw()))
            .finish()
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        if let Err(e) = self.api.free_library(self.module) {
            warn!("{}: {e}", self.name);
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Validate that `name` resolves through the search order and nothing else,
/// then encode it for Win32.
///
/// Anything with a directory component (`\`, `/`) or a drive (`:`) bypasses
/// the search order entirely, which defeats the point of the guard.
fn bare_file_name(name: &str) -> Result<WideCString> {
    let invalid = |reason| DllGuardError::InvalidLibraryName {
        name: name.to_owned(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("empty"));
    }
    if name.contains(['\\', '/', ':']) {
        return Err(invalid("not a bare file name"));
    }
    if name == "." || name == ".." {
        return Err(invalid("not a file"));
    }
    WideCString::new(name).map_err(|_| invalid("contains NUL"))
}

/// Everything before the last separator.  Splits on `\` as well as `/`
/// regardless of the host, since module paths always come from Windows.
fn parent_dir(path: &Path) -> Option<String> {
    let s = path.to_string_lossy();
    s.rfind(['\\', '/']).map(|i| s[..i].to_owned())
}

/// Windows paths compare case-insensitively; trailing separators are ignored.
fn same_dir(a: &str, b: &str) -> bool {
    let norm = |p: &str| p.trim_end_matches(['\\', '/']).to_lowercase();
    norm(a) == norm(b)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
