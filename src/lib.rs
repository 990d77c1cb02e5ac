// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32` – Win32 / WinAPI FFI
// Each unsafe block in that module MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

//! Load DLLs by bare file name on Windows without letting the current
//! working directory take part in the search.
//!
//! ```no_run
//! use dllguard::{
//!     library::Library,
//!     search_order::{enable_safe_search_order, Mechanism, SearchDirs},
//! };
//!
//! # fn main() -> dllguard::error::Result<()> {
//! let order = enable_safe_search_order(Mechanism::SetDllDirectory, SearchDirs::SYSTEM32)?;
//! let dwmapi = Library::load(&order, "dwmapi.dll")?;
//! assert!(dwmapi.is_from_system_directory()?);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod library;
pub mod search_order;
pub mod wide;

mod platform;
