pub mod doctor;
pub mod output;
pub mod run;
pub mod time;

use botshim_core::config::loader::ConfigLoader;
use botshim_core::config::types::ResolvedConfig;
use std::path::Path;

/// Load config (or defaults) and install logging, exiting on failure.
pub fn load_config(config_path: Option<&Path>, profile: Option<&str>) -> ResolvedConfig {
    let rc = match ConfigLoader::load_or_default(config_path, profile) {
        Ok(rc) => rc,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };
    crate::logging::init(&rc);
    rc
}

/// Print `message` to stderr and exit with status 1.
pub fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{message}");
    crate::logging::flush();
    std::process::exit(1);
}
