use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    pub profile: Option<String>,
    pub profiles: HashMap<String, Profile>,
    #[serde(default)]
    pub exceptions: ExceptionCapture,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sandbox: SandboxLimits,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One bot's host settings.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Profile {
    /// IANA zone configured for the bot.
    pub timezone: Option<String>,
    /// Feature flag: honour `timezone` instead of the fallback zone.
    #[serde(default)]
    pub use_bot_timezone: bool,
    /// Directory searched for scripts given by relative path.
    pub scripts_dir: Option<String>,
    /// Per-bot override of the global exception capture settings.
    pub exceptions: Option<ExceptionCapture>,
}

/// Script-level exception capture.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ExceptionCapture {
    #[serde(default)]
    pub capture: bool,
    #[serde(default = "default_exception_variable")]
    pub variable: String,
}

impl Default for ExceptionCapture {
    fn default() -> Self {
        Self { capture: false, variable: default_exception_variable() }
    }
}

fn default_exception_variable() -> String {
    "scriptException".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: default_timeout_secs() }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SandboxLimits {
    /// Lua memory limit in megabytes. 0 = unlimited.
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self { memory_limit_mb: default_memory_limit_mb() }
    }
}

fn default_memory_limit_mb() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

/// Host settings for the active bot.
#[derive(Debug, Clone)]
pub struct HostSettings {
    pub timezone: Option<String>,
    pub use_bot_timezone: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub active_profile: String,
    pub host: HostSettings,
    pub scripts_dir: Option<PathBuf>,
    pub exceptions: ExceptionCapture,
    pub http: HttpConfig,
    pub sandbox: SandboxLimits,
    pub logging: LoggingConfig,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            active_profile: "default".to_string(),
            host: HostSettings { timezone: None, use_bot_timezone: false },
            scripts_dir: None,
            exceptions: ExceptionCapture::default(),
            http: HttpConfig::default(),
            sandbox: SandboxLimits::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ResolvedConfig {
    /// Zone the `time` object uses when a call names none.
    pub fn default_timezone(&self) -> chrono_tz::Tz {
        crate::time::resolve_default_zone(
            self.host.timezone.as_deref(),
            self.host.use_bot_timezone,
        )
    }
}
