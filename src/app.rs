// ── Program flow ──────────────────────────────────────────────────────────────
//
// Restrict the search order, load the configured library, report where it
// came from.  `main` only sets up logging, loads the config and maps the
// result to an exit status.

use log::{info, warn};

use crate::{
    config::Config,
    error::Result,
    library::Library,
    platform::{self, DllApi},
    search_order::{self, EnableGuard},
};

/// Run the configured scenario against the real OS loader.
pub fn run(config: &Config) -> Result<()> {
    run_with(platform::native(), search_order::process_guard(), config)
}

pub(crate) fn run_with(
    api: &'static dyn DllApi,
    guard: &EnableGuard,
    config: &Config,
) -> Result<()> {
    let library = if !config.enabled {
        Library::load_unprotected_with(api, &config.library)?
    } else {
        match search_order::enable_with(api, guard, config.mechanism, config.search_dirs()) {
            Ok(_order) => Library::load_with(api, &config.library)?,
            Err(e) if config.strict => return Err(e),
            Err(e) => {
                warn!("could not restrict the DLL search order: {e}");
                Library::load_unprotected_with(api, &config.library)?
            }
        }
    };

    match library.is_from_system_directory() {
        Ok(true) => info!("{} is the system copy", library.name()),
        Ok(false) => warn!("{} was not loaded from the system directory", library.name()),
        Err(e) => warn!("could not check where {} came from: {e}", library.name()),
    }
    Ok(())
}

/// Process exit status for the outcome of `run`.
///
/// Failures are reported but ignored unless `strict` is set.
pub fn exit_code(strict: bool, result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(_) => i32::from(strict),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
