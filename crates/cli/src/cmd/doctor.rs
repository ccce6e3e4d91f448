use botshim_core::config::loader::{ConfigLoader, default_config_path};
use std::path::Path;

pub fn run(config_path: Option<&Path>, profile: Option<&str>) {
    match ConfigLoader::load(config_path, profile) {
        Ok(rc) => {
            crate::logging::init(&rc);
            tracing::debug!(profile = %rc.active_profile, "config loaded");

            println!("OK   botshim doctor");
            println!(
                "path: {}",
                config_path.map_or_else(
                    || default_config_path().display().to_string(),
                    |p| p.display().to_string()
                )
            );
            println!("profile: {}", rc.active_profile);
            println!("timezone: {}", rc.host.timezone.as_deref().unwrap_or("(none)"));
            println!("use_bot_timezone: {}", rc.host.use_bot_timezone);
            println!("effective_timezone: {}", rc.default_timezone().name());
            println!(
                "scripts_dir: {}",
                rc.scripts_dir.as_ref().map_or("(none)".to_string(), |p| p.display().to_string())
            );
            println!("exceptions.capture: {}", rc.exceptions.capture);
            println!("exceptions.variable: {}", rc.exceptions.variable);
            println!("http.timeout_secs: {}", rc.http.timeout_secs);
            println!("sandbox.memory_limit_mb: {}", rc.sandbox.memory_limit_mb);
            crate::logging::flush();
        }
        Err(e) => {
            println!("FAIL botshim doctor");
            println!("{e}");
            if config_path.is_none() {
                println!("looked for: {}", default_config_path().display());
            }
            std::process::exit(1);
        }
    }
}
