#![deny(unsafe_code)]

use dllguard::{app, config};
use log::error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::load();
    let result = app::run(&config);
    if let Err(e) = &result {
        error!("{e}");
    }
    std::process::exit(app::exit_code(config.strict, &result));
}
