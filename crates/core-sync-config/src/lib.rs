//! Loading and parsing of `sync.toml`: timer durations and the host-attach
//! descriptor. Unknown fields are ignored so the file can grow without
//! breaking older binaries.

use std::{fs, path::PathBuf, time::Duration};

use anyhow::Result;
use serde::Deserialize;

const DEFAULT_TOKEN_TIMEOUT_MS: u64 = 200;
const DEFAULT_IDLE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Deserialize, Clone)]
pub struct TimersConfig {
    #[serde(default = "TimersConfig::default_token_timeout_ms")]
    pub token_timeout_ms: u64,
    #[serde(default = "TimersConfig::default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,
}

impl TimersConfig {
    const fn default_token_timeout_ms() -> u64 {
        DEFAULT_TOKEN_TIMEOUT_MS
    }

    const fn default_idle_timeout_ms() -> u64 {
        DEFAULT_IDLE_TIMEOUT_MS
    }
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            token_timeout_ms: Self::default_token_timeout_ms(),
            idle_timeout_ms: Self::default_idle_timeout_ms(),
        }
    }
}

/// Which host process/widget to attach to. Both fields are optional so a
/// file can name either a bundle id (macOS accessibility) or a bare process
/// name and leave the other for the binary's `--attach` flag to fill in.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct HostAttachConfig {
    pub bundle_id: Option<String>,
    pub process_name: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub timers: TimersConfig,
    #[serde(default)]
    pub attach: HostAttachConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub raw: Option<String>,
    pub file: ConfigFile,
    pub token_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Config {
    fn from_file(raw: Option<String>, file: ConfigFile) -> Self {
        let token_timeout = Duration::from_millis(file.timers.token_timeout_ms);
        let idle_timeout = Duration::from_millis(file.timers.idle_timeout_ms);
        Self { raw, file, token_timeout, idle_timeout }
    }
}

/// Best-effort config path: a local `sync.toml` first, then the platform
/// config dir, falling back to a bare relative filename if neither resolves.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("sync.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("sync-bridge").join("sync.toml");
    }
    PathBuf::from("sync.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config::from_file(Some(content), file)),
            Err(_e) => Ok(Config::from_file(None, ConfigFile::default())),
        },
        Err(_) => Ok(Config::from_file(None, ConfigFile::default())),
    }
}
