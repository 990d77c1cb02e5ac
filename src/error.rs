// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in dllguard return `error::Result<T>`.  No panics
// in production paths; `main` logs the error and maps it to an exit status.

/// Every error that dllguard can produce.
#[derive(Debug, thiserror::Error)]
pub enum DllGuardError {
    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error (config file read, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for `Config`.
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    /// The config file was written for a format this build does not know.
    #[error("unsupported config version {0}")]
    UnsupportedConfigVersion(u32),

    /// A library name that could resolve outside the search order.
    #[error("invalid library name {name:?}: {reason}")]
    InvalidLibraryName {
        name: String,
        reason: &'static str,
    },

    /// `SetDefaultDllDirectories` needs at least one directory flag.
    #[error("no search directories selected")]
    InvalidSearchDirs,

    /// A string handed to Win32 would be truncated at an embedded NUL.
    #[error("string contains an interior NUL")]
    InteriorNul,

    /// The process-wide search order was already restricted.
    #[error("safe DLL search order is already enabled")]
    AlreadyEnabled,

    /// Another thread is applying the search order right now.
    #[error("safe DLL search order is being enabled by another caller")]
    EnableInProgress,

    /// The call has no meaning on this platform.
    #[error("{0} is only available on Windows")]
    Unsupported(&'static str),
}

impl DllGuardError {
    /// Wrap a windows-crate error, keeping the name of the failing call.
    #[cfg(windows)]
    pub(crate) fn win32(function: &'static str, e: &windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        // Win32 errors appear as 0x8007xxxx HRESULTs.
        Self::Win32 {
            function,
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DllGuardError>;

// ── Tests ─────────────────────────────────────────────────────────────────────
