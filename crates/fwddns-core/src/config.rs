//! Configuration resolution
//!
//! A [`Configuration`] is built once at startup from two sources:
//!
//! - **Environment**: the process environment, layered over an optional
//!   `.env` file. The `.env` file is read without modifying the process
//!   environment, and process values win.
//! - **Settings file**: a JSON object with the managed rule names and the
//!   debug flag.
//!
//! Resolution is all-or-nothing: either every required value is present and
//! valid, or an error is returned and nothing else happens.
//!
//! ## Environment
//!
//! - `API_BASE_URL` (optional, defaults to [`DEFAULT_API_BASE_URL`])
//! - `HETZNER_SERVER_ID`, `HETZNER_API_USER`, `HETZNER_API_PASSWORD` (required)
//! - `FWDDNS_MODE` (optional, `dry-run` disables submission)
//!
//! ## Settings file
//!
//! ```json
//! {
//!   "rule_names": ["home ssh", "home https"],
//!   "debug": false,
//!   "request_timeout_secs": 30
//! }
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Robot webservice endpoint used when `API_BASE_URL` is unset
pub const DEFAULT_API_BASE_URL: &str = "https://robot-ws.your-server.de";

/// Settings file read when no other path is given
pub const DEFAULT_SETTINGS_PATH: &str = "config.json";

/// Env file read when no other path is given
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Per-request HTTP timeout used when the settings file does not set one
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable names
pub mod env_keys {
    pub const API_BASE_URL: &str = "API_BASE_URL";
    pub const SERVER_ID: &str = "HETZNER_SERVER_ID";
    pub const API_USER: &str = "HETZNER_API_USER";
    pub const API_PASSWORD: &str = "HETZNER_API_PASSWORD";
    pub const MODE: &str = "FWDDNS_MODE";
}

/// Where to look for configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSources {
    /// Optional `.env` file (skipped if it does not exist)
    pub env_file: Option<PathBuf>,

    /// JSON settings file
    pub settings_path: PathBuf,
}

impl ConfigSources {
    /// Sources with the given settings file and no `.env` file
    pub fn new(settings_path: impl Into<PathBuf>) -> Self {
        Self {
            env_file: None,
            settings_path: settings_path.into(),
        }
    }

    /// Also read the given `.env` file
    pub fn with_env_file(mut self, env_file: impl Into<PathBuf>) -> Self {
        self.env_file = Some(env_file.into());
        self
    }
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self::new(DEFAULT_SETTINGS_PATH).with_env_file(DEFAULT_ENV_FILE)
    }
}

/// Contents of the settings file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Names of the input rules this tool may rewrite
    #[serde(alias = "ruleNames")]
    pub rule_names: Vec<String>,

    /// Verbose request/response dumps
    pub debug: bool,

    /// Compute the update but never submit it
    #[serde(default)]
    pub dry_run: bool,

    /// Per-request HTTP timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Settings {
    /// Read and parse the settings file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::SettingsNotFound(path.to_path_buf()),
            _ => Error::config(format!("Failed to read {}: {}", path.display(), e)),
        })?;

        Self::from_json(&text)
    }

    /// Parse settings from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| Error::invalid_settings(e.to_string()))?;

        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_settings("expected a JSON object at the top level"))?;

        if !object.contains_key("rule_names") && !object.contains_key("ruleNames") {
            return Err(Error::MissingSettingsKey("rule_names".to_string()));
        }
        if !object.contains_key("debug") {
            return Err(Error::MissingSettingsKey("debug".to_string()));
        }

        let settings: Settings =
            serde_json::from_value(value).map_err(|e| Error::invalid_settings(e.to_string()))?;
        settings.validate()?;

        Ok(settings)
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<()> {
        if !(1..=300).contains(&self.request_timeout_secs) {
            return Err(Error::invalid_settings(format!(
                "request_timeout_secs must be between 1 and 300 seconds. Got: {}",
                self.request_timeout_secs
            )));
        }

        Ok(())
    }
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Validated runtime configuration
///
/// The API password never appears in `Debug` output.
#[derive(Clone)]
pub struct Configuration {
    /// Robot webservice base URL, without trailing slash
    pub api_base_url: String,

    /// Robot server number or main IP
    pub server_id: String,

    /// Webservice user
    pub api_user: String,

    /// Webservice password
    /// ⚠️ NEVER log this value
    api_password: String,

    /// Names of the managed input rules
    pub rule_names: BTreeSet<String>,

    /// Verbose request/response dumps
    pub debug: bool,

    /// Skip submission even when rules changed
    pub dry_run: bool,

    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("api_base_url", &self.api_base_url)
            .field("server_id", &self.server_id)
            .field("api_user", &self.api_user)
            .field("api_password", &"<REDACTED>")
            .field("rule_names", &self.rule_names)
            .field("debug", &self.debug)
            .field("dry_run", &self.dry_run)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Configuration {
    /// Resolve configuration from the environment and the settings file
    ///
    /// The environment is checked first, so missing credentials are reported
    /// even when the settings file is also broken.
    pub fn resolve(sources: &ConfigSources) -> Result<Self> {
        let env = load_env(sources.env_file.as_deref())?;
        let credentials = Credentials::from_env(&env)?;
        let settings = Settings::load(&sources.settings_path)?;

        Ok(Self::assemble(credentials, settings, &env))
    }

    /// Build configuration from an explicit variable map and parsed settings
    pub fn from_parts(env: &HashMap<String, String>, settings: Settings) -> Result<Self> {
        let credentials = Credentials::from_env(env)?;
        settings.validate()?;

        Ok(Self::assemble(credentials, settings, env))
    }

    /// Webservice password
    pub fn api_password(&self) -> &str {
        &self.api_password
    }

    fn assemble(credentials: Credentials, settings: Settings, env: &HashMap<String, String>) -> Self {
        let mode_dry_run = lookup(env, env_keys::MODE)
            .is_some_and(|mode| mode.eq_ignore_ascii_case("dry-run"));

        Self {
            api_base_url: credentials.api_base_url,
            server_id: credentials.server_id,
            api_user: credentials.api_user,
            api_password: credentials.api_password,
            rule_names: settings.rule_names.into_iter().collect(),
            debug: settings.debug,
            dry_run: settings.dry_run || mode_dry_run,
            request_timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}

/// Environment-derived part of the configuration
struct Credentials {
    api_base_url: String,
    server_id: String,
    api_user: String,
    api_password: String,
}

impl Credentials {
    fn from_env(env: &HashMap<String, String>) -> Result<Self> {
        let required = [env_keys::SERVER_ID, env_keys::API_USER, env_keys::API_PASSWORD];

        let missing: Vec<String> = required
            .iter()
            .filter(|key| lookup(env, key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(Error::MissingEnv(missing));
        }

        let api_base_url = lookup(env, env_keys::API_BASE_URL)
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("https://") && !api_base_url.starts_with("http://") {
            return Err(Error::config(format!(
                "API_BASE_URL must use HTTP or HTTPS scheme. Got: {}",
                api_base_url
            )));
        }

        let get = |key: &str| lookup(env, key).unwrap_or_default().to_string();

        Ok(Self {
            api_base_url,
            server_id: get(env_keys::SERVER_ID),
            api_user: get(env_keys::API_USER),
            api_password: get(env_keys::API_PASSWORD),
        })
    }
}

/// Non-empty value of `key`
fn lookup<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Collect environment variables, process values layered over the `.env` file
///
/// A missing `.env` file is not an error; a malformed one is.
pub fn load_env(env_file: Option<&Path>) -> Result<HashMap<String, String>> {
    let mut vars = HashMap::new();

    if let Some(path) = env_file
        && path.exists()
    {
        let iter = dotenvy::from_path_iter(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))?;
        for item in iter {
            let (key, value) = item
                .map_err(|e| Error::config(format!("Failed to parse {}: {}", path.display(), e)))?;
            vars.insert(key, value);
        }
    }

    vars.extend(
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
    );

    Ok(vars)
}
