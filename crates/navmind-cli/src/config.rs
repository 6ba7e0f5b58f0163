//! Configuration Vault – reads/writes `~/.navmind/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Persisted user configuration stored in `~/.navmind/config.toml`.
///
/// Every field has a serde default, so a partial file (or none at all)
/// yields a usable configuration — with one exception: an endpoint must be
/// resolvable via [`Config::resolve_endpoint`] before the process may start.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the completion service (e.g. `https://api.example.com/v1`).
    #[serde(default)]
    pub api_base: String,

    /// Path joined onto `api_base`.
    #[serde(default = "default_api_path")]
    pub api_path: String,

    /// Full legacy endpoint URL.  Deprecated; prefer `api_base` + `api_path`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_endpoint: String,

    /// Model identifier sent with every completion request.
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// System prompt override; empty selects the built-in prompt.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_prompt: String,

    /// Structured-output hint: `"json_object"`, `"json_schema"`, or empty.
    #[serde(default = "default_response_format")]
    pub response_format: String,

    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: f64,

    /// API credential (stored as plain text – users should restrict file
    /// permissions on `~/.navmind/config.toml`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Header the credential is sent under, bearer form.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,

    /// Environment variable consulted when `api_key` is empty.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// External name of the inbound directive channel.
    #[serde(default = "default_instruction_topic")]
    pub instruction_topic: String,

    /// External name of the outbound command channel (rosbridge frames).
    #[serde(default = "default_command_topic")]
    pub command_topic: String,

    /// Outbound command cadence, Hz.
    #[serde(default = "default_publish_rate")]
    pub publish_rate: f64,

    /// Maximum age (seconds) a held command may reach before publish ticks
    /// substitute the zero command.
    #[serde(default = "default_command_hold_secs")]
    pub command_hold_secs: f64,

    #[serde(default = "default_max_linear_speed")]
    pub max_linear_speed: f64,

    #[serde(default = "default_max_side_speed")]
    pub max_side_speed: f64,

    #[serde(default = "default_max_angular_speed")]
    pub max_angular_speed: f64,

    #[serde(default)]
    pub allow_y_motion: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base", &self.api_base)
            .field("api_path", &self.api_path)
            .field("api_endpoint", &self.api_endpoint)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("response_format", &self.response_format)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "api_key",
                if self.api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("api_key_header", &self.api_key_header)
            .field("api_key_env", &self.api_key_env)
            .field("instruction_topic", &self.instruction_topic)
            .field("command_topic", &self.command_topic)
            .field("publish_rate", &self.publish_rate)
            .field("command_hold_secs", &self.command_hold_secs)
            .field("max_linear_speed", &self.max_linear_speed)
            .field("max_side_speed", &self.max_side_speed)
            .field("max_angular_speed", &self.max_angular_speed)
            .field("allow_y_motion", &self.allow_y_motion)
            .finish()
    }
}

fn default_api_path() -> String {
    "/chat/completions".to_string()
}
fn default_model() -> String {
    "gpt-4.1-mini".to_string()
}
fn default_temperature() -> f64 {
    0.1
}
fn default_response_format() -> String {
    "json_object".to_string()
}
fn default_api_timeout_secs() -> f64 {
    20.0
}
fn default_api_key_header() -> String {
    "Authorization".to_string()
}
fn default_api_key_env() -> String {
    "LLM_API_KEY".to_string()
}
fn default_instruction_topic() -> String {
    "/llm_motion/instruction".to_string()
}
fn default_command_topic() -> String {
    "/cmd_vel".to_string()
}
fn default_publish_rate() -> f64 {
    5.0
}
fn default_command_hold_secs() -> f64 {
    1.5
}
fn default_max_linear_speed() -> f64 {
    0.6
}
fn default_max_side_speed() -> f64 {
    0.2
}
fn default_max_angular_speed() -> f64 {
    1.2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            api_path: default_api_path(),
            api_endpoint: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            system_prompt: String::new(),
            response_format: default_response_format(),
            api_timeout_secs: default_api_timeout_secs(),
            api_key: String::new(),
            api_key_header: default_api_key_header(),
            api_key_env: default_api_key_env(),
            instruction_topic: default_instruction_topic(),
            command_topic: default_command_topic(),
            publish_rate: default_publish_rate(),
            command_hold_secs: default_command_hold_secs(),
            max_linear_speed: default_max_linear_speed(),
            max_side_speed: default_max_side_speed(),
            max_angular_speed: default_max_angular_speed(),
            allow_y_motion: false,
        }
    }
}

impl Config {
    /// Resolve the completions URL.
    ///
    /// The legacy `api_endpoint` wins when set (with a deprecation warning);
    /// otherwise `api_base` and `api_path` are joined.  A missing `api_base`
    /// is a fatal configuration error — the process must refuse to start.
    pub fn resolve_endpoint(&self) -> Result<String, String> {
        if !self.api_endpoint.is_empty() {
            warn!("'api_endpoint' is deprecated; prefer 'api_base' and 'api_path'");
            return Ok(self.api_endpoint.clone());
        }
        if self.api_base.is_empty() {
            return Err("'api_base' is required (set it in ~/.navmind/config.toml)".to_string());
        }
        Ok(format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            self.api_path.trim_start_matches('/')
        ))
    }

    /// Resolve the API credential: the config field, else the environment
    /// variable named by `api_key_env`.  Empty means unauthenticated — the
    /// caller warns but proceeds.
    pub fn resolve_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        std::env::var(&self.api_key_env).unwrap_or_default()
    }
}

/// Return the path to `~/.navmind/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".navmind").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `NAVMIND_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `NAVMIND_API_BASE` | `api_base` |
/// | `NAVMIND_MODEL` | `model` |
/// | `NAVMIND_COMMAND_TOPIC` | `command_topic` |
/// | `NAVMIND_PUBLISH_RATE` | `publish_rate` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("NAVMIND_API_BASE") {
        cfg.api_base = v;
    }
    if let Ok(v) = std::env::var("NAVMIND_MODEL") {
        cfg.model = v;
    }
    if let Ok(v) = std::env::var("NAVMIND_COMMAND_TOPIC") {
        cfg.command_topic = v;
    }
    if let Ok(v) = std::env::var("NAVMIND_PUBLISH_RATE")
        && let Ok(rate) = v.parse::<f64>() {
            cfg.publish_rate = rate;
        }
}

/// Save the config to disk, creating `~/.navmind/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Restrict the config directory to the owner only (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Write the file with owner-only read/write (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
