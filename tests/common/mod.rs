// Shared setup for the end-to-end loader tests.
//
// The DLL search order and the working directory are both process-wide, so
// every scenario lives in its own test binary and runs exactly one test.

use std::{
    fs,
    path::{Path, PathBuf},
};

/// A temporary working directory holding decoy DLLs.
pub struct Sandbox {
    dir: PathBuf,
    previous_cwd: PathBuf,
}

impl Sandbox {
    pub fn new(tag: &str) -> Self {
        let dir = std::env::temp_dir().join(format!("dllguard-{tag}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("create sandbox");
        let previous_cwd = std::env::current_dir().expect("current dir");
        Self { dir, previous_cwd }
    }

    /// Copy a real system DLL into the sandbox under `name`.
    pub fn plant_decoy(&self, name: &str) -> PathBuf {
        let target = self.dir.join(name);
        fs::copy(system_dir().join("version.dll"), &target).expect("plant decoy");
        target
    }

    /// Make the sandbox the current working directory.
    pub fn enter(&self) {
        std::env::set_current_dir(&self.dir).expect("enter sandbox");
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous_cwd);
        // Decoys that are still mapped cannot be deleted; leave them behind.
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// A DLL name that exists nowhere on the system except in a sandbox.
pub fn decoy_only_name() -> String {
    format!("dllguard_decoy_{}.dll", std::process::id())
}

pub fn system_dir() -> PathBuf {
    let root = std::env::var_os("SystemRoot").unwrap_or_else(|| r"C:\Windows".into());
    Path::new(&root).join("System32")
}
