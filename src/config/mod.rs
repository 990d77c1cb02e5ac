// ── Configuration ─────────────────────────────────────────────────────────────
//
// Reads `$DLLGUARD_CONFIG`, or `%APPDATA%\DllGuard\config.json` when unset.
// Every field is optional; a missing file means "all defaults".
// No `unsafe`; safe Rust + serde_json only.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    error::{DllGuardError, Result},
    search_order::{Mechanism, SearchDirs},
};

// ── On-disk types ─────────────────────────────────────────────────────────────

/// Root of the JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: u32,
    /// `false` skips the search-order call and loads the library anyway.
    pub enabled: bool,
    pub mechanism: Mechanism,
    /// Only used by `default_directories` and `auto`.
    pub search_dirs: Vec<SearchDir>,
    /// Bare file name to load.
    pub library: String,
    /// Exit with status 1 if any step fails.
    pub strict: bool,
}

/// One `LOAD_LIBRARY_SEARCH_*` flag, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDir {
    System32,
    ApplicationDir,
    UserDirs,
    DefaultDirs,
}

impl SearchDir {
    fn flag(self) -> SearchDirs {
        match self {
            Self::System32 => SearchDirs::SYSTEM32,
            Self::ApplicationDir => SearchDirs::APPLICATION_DIR,
            Self::UserDirs => SearchDirs::USER_DIRS,
            Self::DefaultDirs => SearchDirs::DEFAULT_DIRS,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            enabled: true,
            mechanism: Mechanism::default(),
            search_dirs: vec![SearchDir::System32],
            library: DEFAULT_LIBRARY.to_owned(),
            strict: false,
        }
    }
}

impl Config {
    /// The configured directories as one flag set.
    pub fn search_dirs(&self) -> SearchDirs {
        self.search_dirs
            .iter()
            .fold(SearchDirs::empty(), |acc, d| acc | d.flag())
    }
}

// ── Format version ────────────────────────────────────────────────────────────

pub const CONFIG_VERSION: u32 = 1;

const DEFAULT_LIBRARY: &str = "dwmapi.dll";

/// Environment variable that overrides the config file location.
pub const CONFIG_ENV: &str = "DLLGUARD_CONFIG";

// ── Path ──────────────────────────────────────────────────────────────────────

/// Return the config file path: `$DLLGUARD_CONFIG`, else
/// `%APPDATA%\DllGuard\config.json`.
///
/// Returns `None` if neither variable is set.
pub fn config_path() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    let appdata = std::env::var_os("APPDATA")?;
    let mut p = PathBuf::from(appdata);
    p.push("DllGuard");
    p.push("config.json");
    Some(p)
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Read and parse `path`.  A missing file yields the defaults.
pub fn load_from(path: &Path) -> Result<Config> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("{} not found; using defaults", path.display());
            return Ok(Config::default());
        }
        Err(e) => return Err(e.into()),
    };
    let config: Config = serde_json::from_slice(&data)?;
    if config.version != CONFIG_VERSION {
        return Err(DllGuardError::UnsupportedConfigVersion(config.version));
    }
    Ok(config)
}

/// Load the config from `config_path()`.
///
/// Never fails: any error is logged and the defaults are used, so the
/// search order is still restricted when the file is broken.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        debug!("no config path; using defaults");
        return Config::default();
    };
    load_from(&path).unwrap_or_else(|e| {
        warn!("{}: {e}; using defaults", path.display());
        Config::default()
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// Write `contents` to a file unique to this test and process.
    fn temp_config(test: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "dllguard-{}-{test}.json",
            std::process::id()
        ));
        fs::write(&path, contents).expect("write temp config");
        path
    }

    #[test]
    fn defaults_match_the_demo() {
        let c = Config::default();
        assert_eq!(c.version, CONFIG_VERSION);
        assert!(c.enabled);
        assert_eq!(c.mechanism, Mechanism::SetDllDirectory);
        assert_eq!(c.search_dirs(), SearchDirs::SYSTEM32);
        assert_eq!(c.library, "dwmapi.dll");
        assert!(!c.strict);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("dllguard-definitely-missing.json");
        assert_eq!(load_from(&path).expect("load"), Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = temp_config("partial", r#"{"mechanism":"auto","strict":true}"#);
        let c = load_from(&path).expect("load");
        fs::remove_file(&path).ok();

        assert_eq!(c.mechanism, Mechanism::Auto);
        assert!(c.strict);
        assert!(c.enabled);
        assert_eq!(c.library, "dwmapi.dll");
    }

    #[test]
    fn search_dirs_are_combined() {
        let json = r#"{"version":1,"search_dirs":["system32","application_dir","user_dirs"]}"#;
        let c: Config = serde_json::from_str(json).expect("deserialize");
        assert_eq!(
            c.search_dirs(),
            SearchDirs::SYSTEM32 | SearchDirs::APPLICATION_DIR | SearchDirs::USER_DIRS
        );
        assert_eq!(c.search_dirs().bits(), 0x0e00);
    }

    #[test]
    fn empty_search_dirs_give_no_flags() {
        let c: Config = serde_json::from_str(r#"{"search_dirs":[]}"#).expect("deserialize");
        assert!(c.search_dirs().is_empty());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let path = temp_config("malformed", "{ not json");
        let err = load_from(&path).expect_err("should fail");
        fs::remove_file(&path).ok();
        assert!(matches!(err, DllGuardError::Config(_)));
    }

    #[test]
    fn unknown_mechanism_is_rejected() {
        let r: std::result::Result<Config, _> =
            serde_json::from_str(r#"{"mechanism":"set_dll_directory_a"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn wrong_version_is_rejected() {
        let path = temp_config("version", r#"{"version":99}"#);
        let err = load_from(&path).expect_err("should fail");
        fs::remove_file(&path).ok();
        assert!(matches!(err, DllGuardError::UnsupportedConfigVersion(99)));
    }

    /// `DLLGUARD_CONFIG` is process-wide, so both cases share one test.
    #[test]
    fn env_override_is_read_and_broken_files_fall_back() {
        let good = temp_config("env-good", r#"{"version":1,"strict":true,"library":"version.dll"}"#);
        std::env::set_var(CONFIG_ENV, &good);
        assert_eq!(config_path().as_deref(), Some(good.as_path()));
        let c = load();
        assert!(c.strict);
        assert_eq!(c.library, "version.dll");

        let bad = temp_config("env-bad", r#"{"version":2,"strict":true}"#);
        std::env::set_var(CONFIG_ENV, &bad);
        assert_eq!(load(), Config::default());

        std::env::remove_var(CONFIG_ENV);
        fs::remove_file(&good).ok();
        fs::remove_file(&bad).ok();
    }

    #[test]
    fn roundtrip_keeps_every_field() {
        let c = Config {
            version: CONFIG_VERSION,
            enabled: false,
            mechanism: Mechanism::DefaultDirectories,
            search_dirs: vec![SearchDir::DefaultDirs],
            library: "version.dll".to_owned(),
            strict: true,
        };
        let json = serde_json::to_string(&c).expect("serialize");
        let c2: Config = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(c2, c);
    }
}
