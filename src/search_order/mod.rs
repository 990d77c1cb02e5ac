// ── Safe DLL search order ─────────────────────────────────────────────────────
//
// Removes the current working directory from the process-wide DLL search
// order.  This must run once, early, before anything is loaded by bare file
// name.  No `unsafe`; the OS calls go through `platform::DllApi`.

use std::{
    fmt,
    sync::atomic::{AtomicU8, Ordering},
};

use bitflags::bitflags;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DllGuardError, Result},
    platform::{self, DllApi},
    wide::WideCString,
};

bitflags! {
    /// Directories `SetDefaultDllDirectories` may search
    /// (the `LOAD_LIBRARY_SEARCH_*` values).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SearchDirs: u32 {
        /// The directory of the executable.
        const APPLICATION_DIR = 0x0000_0200;
        /// Directories added with `AddDllDirectory`.
        const USER_DIRS = 0x0000_0400;
        /// `%windir%\System32`.
        const SYSTEM32 = 0x0000_0800;
        /// Application directory, user directories and System32 together.
        const DEFAULT_DIRS = 0x0000_1000;
    }
}

impl Default for SearchDirs {
    fn default() -> Self {
        Self::SYSTEM32
    }
}

/// How to restrict the search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    /// `SetDllDirectoryW("")`.  Works on every supported Windows version.
    #[default]
    SetDllDirectory,
    /// `SetDefaultDllDirectories(dirs)`.  Windows 8 and later.
    DefaultDirectories,
    /// `SetDefaultDllDirectories`, falling back to `SetDllDirectoryW("")`.
    Auto,
}

/// The OS call that actually took effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    EmptyDllDirectory,
    DefaultDirectories(SearchDirs),
}

impl fmt::Display for Applied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyDllDirectory => f.write_str(r#"SetDllDirectoryW("")"#),
            Self::DefaultDirectories(dirs) => {
                write!(f, "SetDefaultDllDirectories({:#06x})", dirs.bits())
            }
        }
    }
}

/// Proof that the safe search order is in effect for this process.
///
/// Only `enable_safe_search_order` can create one.  `Library::load` takes a
/// reference to it, so a protected load cannot be written before the search
/// order has been restricted.
#[derive(Debug)]
pub struct SafeSearchOrder {
    applied: Applied,
}

impl SafeSearchOrder {
    pub fn applied(&self) -> Applied {
        self.applied
    }
}

/// Process-wide progress of the one-time search-order call.
///
/// `IN_FLIGHT` is held while the OS call runs, so a concurrent caller can
/// tell "someone is trying" from "it is done".  A failed call goes back to
/// `IDLE`.
pub(crate) struct EnableGuard(AtomicU8);

impl EnableGuard {
    const IDLE: u8 = 0;
    const IN_FLIGHT: u8 = 1;
    const ENABLED: u8 = 2;

    pub(crate) const fn new() -> Self {
        Self(AtomicU8::new(Self::IDLE))
    }

    /// Claim the guard, or report why it cannot be claimed.
    fn begin(&self) -> Result<()> {
        match self.0.compare_exchange(
            Self::IDLE,
            Self::IN_FLIGHT,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => Ok(()),
            Err(Self::IN_FLIGHT) => Err(DllGuardError::EnableInProgress),
            Err(_) => Err(DllGuardError::AlreadyEnabled),
        }
    }

    fn finish(&self, succeeded: bool) {
        let next = if succeeded { Self::ENABLED } else { Self::IDLE };
        self.0.store(next, Ordering::Release);
    }

    #[cfg(test)]
    fn is_idle(&self) -> bool {
        self.0.load(Ordering::Acquire) == Self::IDLE
    }
}

static GUARD: EnableGuard = EnableGuard::new();

/// Restrict the process DLL search order so that the current working
/// directory is never searched.
///
/// Succeeds at most once per process; later calls return
/// `DllGuardError::AlreadyEnabled` without touching the OS.  A call made
/// while another thread's call is still running returns
/// `DllGuardError::EnableInProgress` instead: the order is not restricted
/// yet and may never be.  On failure the process keeps the default (unsafe)
/// order and the call may be retried.
pub fn enable_safe_search_order(mechanism: Mechanism, dirs: SearchDirs) -> Result<SafeSearchOrder> {
    enable_with(platform::native(), &GUARD, mechanism, dirs)
}

/// The guard used by `enable_safe_search_order`.
pub(crate) fn process_guard() -> &'static EnableGuard {
    &GUARD
}

pub(crate) fn enable_with(
    api: &dyn DllApi,
    guard: &EnableGuard,
    mechanism: Mechanism,
    dirs: SearchDirs,
) -> Result<SafeSearchOrder> {
    if mechanism != Mechanism::SetDllDirectory && dirs.is_empty() {
        return Err(DllGuardError::InvalidSearchDirs);
    }

    guard.begin()?;

    let result = apply(api, mechanism, dirs);
    guard.finish(result.is_ok());
    if let Ok(order) = &result {
        info!("safe DLL search order enabled: {}", order.applied);
    }
    result
}

fn apply(api: &dyn DllApi, mechanism: Mechanism, dirs: SearchDirs) -> Result<SafeSearchOrder> {
    let applied = match mechanism {
        Mechanism::SetDllDirectory => empty_dll_directory(api)?,
        Mechanism::DefaultDirectories => {
            api.set_default_dll_directories(dirs)?;
            Applied::DefaultDirectories(dirs)
        }
        Mechanism::Auto => match api.set_default_dll_directories(dirs) {
            Ok(()) => Applied::DefaultDirectories(dirs),
            Err(e) => {
                warn!(r#"{e}; falling back to SetDllDirectoryW("")"#);
                empty_dll_directory(api)?
            }
        },
    };
    Ok(SafeSearchOrder { applied })
}

fn empty_dll_directory(api: &dyn DllApi) -> Result<Applied> {
    // A null pointer here would restore the default order, cwd included.
    let empty = WideCString::empty();
    debug_assert_eq!(empty.as_slice_with_nul(), &[0u16]);
    api.set_dll_directory(&empty)?;
    Ok(Applied::EmptyDllDirectory)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
