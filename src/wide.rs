// ── UTF-16 marshaling ─────────────────────────────────────────────────────────
//
// Every string handed to Win32 goes through `WideCString`.  No `unsafe` here;
// `platform::win32` turns the buffer into a `PCWSTR` at the call site.

use std::path::PathBuf;

use crate::error::{DllGuardError, Result};

/// A NUL-terminated UTF-16 string with no interior NULs.
///
/// The terminator is always present, so even the empty string is a valid
/// non-null pointer to a single `0u16`.  That distinction matters for
/// `SetDllDirectoryW`: `""` removes the current directory from the search
/// order, while a null pointer restores the default order that includes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideCString(Vec<u16>);

impl WideCString {
    /// Encode `s`, rejecting embedded NULs that Win32 would silently truncate at.
    pub fn new(s: &str) -> Result<Self> {
        let mut buf: Vec<u16> = s.encode_utf16().collect();
        if buf.contains(&0) {
            return Err(DllGuardError::InteriorNul);
        }
        buf.push(0);
        Ok(Self(buf))
    }

    /// The empty string: exactly one NUL.
    pub fn empty() -> Self {
        Self(vec![0])
    }

    /// `true` when the string has no characters before the terminator.
    pub fn is_empty(&self) -> bool {
        self.0.len() == 1
    }

    /// Length in UTF-16 code units, excluding the terminator.
    pub fn len(&self) -> usize {
        self.0.len() - 1
    }

    /// The full buffer, terminator included.
    pub fn as_slice_with_nul(&self) -> &[u16] {
        &self.0
    }

    /// Pointer to the first code unit.  Never null; valid while `self` lives.
    pub fn as_ptr(&self) -> *const u16 {
        self.0.as_ptr()
    }
}

/// Convert a (possibly) null-terminated UTF-16 buffer to a `PathBuf`.
#[cfg_attr(not(any(windows, test)), allow(dead_code))]
pub(crate) fn path_from_buf(buf: &[u16]) -> PathBuf {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    PathBuf::from(String::from_utf16_lossy(&buf[..len]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
