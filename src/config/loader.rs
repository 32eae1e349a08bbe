use crate::config::schema::Config;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
static CONFIG_TEST_ENV_LOCK: Mutex<()> = Mutex::new(());

/// Environment variables consulted for the API key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["CRYPTO_AGENT_API_KEY", "TOGETHER_API_KEY"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No API key configured. Set TOGETHER_API_KEY (or CRYPTO_AGENT_API_KEY) in the environment or a .env file"
    )]
    MissingApiKey,

    #[error("Configuration file contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Loads configuration: defaults, then file, then environment, then CLI flags
///
/// The result is not validated; call [`Config::validate`] before use.
pub fn load_config(
    cli_model: Option<String>,
    cli_config_path: Option<PathBuf>,
) -> Result<Config, ConfigError> {
    tracing::debug!("Loading configuration");

    let mut config = Config::default();

    let config_file = cli_config_path.or_else(get_default_config_path);

    if let Some(ref path) = config_file {
        if path.exists() {
            tracing::debug!(config_path = %path.display(), "Loading configuration from file");
            config = merge_config_from_file(config, path)?;
        } else {
            tracing::debug!(config_path = %path.display(), "Config file not found, using defaults");
        }
    }

    tracing::debug!("Applying environment variable overrides");
    config = merge_env_variables(config);

    if let Some(model) = cli_model.filter(|m| !m.trim().is_empty()) {
        tracing::debug!(model = %model, "Applying CLI model override");
        config.model = model;
    }

    let summary = config.get_safe_summary();
    tracing::debug!(
        api_key_configured = summary.api_key_configured,
        model = %summary.model,
        llm_base_url = %summary.llm_base_url,
        pricing_url = %summary.pricing_url,
        "Configuration loaded"
    );

    Ok(config)
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".crypto-agent").join("config.json"))
}

fn merge_config_from_file(config: Config, path: &Path) -> Result<Config, ConfigError> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(config),
        Err(e) => return Err(e.into()),
    };

    #[cfg(unix)]
    {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            tracing::error!(
                "Config file {:?} has permissions {:o}, expected 0600 - skipping for security",
                path,
                mode
            );
            return Ok(config);
        }
    }
    #[cfg(not(unix))]
    let _ = metadata;

    let content = fs::read_to_string(path)?;
    let file_config: Config = serde_json::from_str(&content)?;
    Ok(file_config)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn merge_env_variables(mut config: Config) -> Config {
    if let Some(key) = API_KEY_ENV_VARS.iter().find_map(|name| non_empty_env(name)) {
        config.api_key = Some(key);
    }
    if let Some(model) = non_empty_env("CRYPTO_AGENT_MODEL") {
        config.model = model;
    }
    if let Some(url) = non_empty_env("CRYPTO_AGENT_LLM_BASE_URL") {
        config.llm_base_url = url;
    }
    if let Some(url) = non_empty_env("CRYPTO_AGENT_PRICING_URL") {
        config.pricing_url = url;
    }
    config
}
