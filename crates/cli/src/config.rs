use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "sockpipe";

pub const VALID_KEYS: [&str; 2] = ["client.socket_path", "client.response_timeout_ms"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub socket_path: Option<PathBuf>,
    /// Upper bound on each inline-handler wait; unbounded when unset
    pub response_timeout_ms: Option<u64>,
}

impl ClientConfig {
    pub fn response_timeout(&self) -> Option<Duration> {
        self.response_timeout_ms.map(Duration::from_millis)
    }
}

pub fn get_config_dir() -> Result<PathBuf> {
    // SOCKPIPE_CONFIG_PATH overrides the default config directory
    if let Ok(path) = std::env::var("SOCKPIPE_CONFIG_PATH") {
        return Ok(PathBuf::from(path));
    }

    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
        .context("Could not determine config directory")
}

pub fn get_config_file() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Resolve the socket path: explicit flag, then config, then the default
pub fn get_socket_path(config: &Config, flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = &config.client.socket_path {
        return Ok(path.clone());
    }
    Ok(get_config_dir()?.join("sockpipe.sock"))
}

pub fn load_config() -> Result<Config> {
    let config_file = get_config_file()?;
    load_config_from(&config_file)
}

fn load_config_from(config_file: &Path) -> Result<Config> {
    if !config_file.exists() {
        return Ok(Config::default());
    }

    let contents = fs::read_to_string(config_file)
        .with_context(|| format!("Failed to read config file: {}", config_file.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", config_file.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    let config_dir = get_config_dir()?;
    save_config_to(config, &config_dir)
}

fn save_config_to(config: &Config, config_dir: &Path) -> Result<()> {
    let config_file = config_dir.join("config.toml");

    if !config_dir.exists() {
        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(config_dir, perms)?;
        }
    }

    let contents = toml::to_string_pretty(config)?;
    fs::write(&config_file, contents)
        .with_context(|| format!("Failed to write config file: {}", config_file.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&config_file, perms)?;
    }

    Ok(())
}

pub fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "client.socket_path" => config.client.socket_path.as_ref().map(|p| p.display().to_string()),
        "client.response_timeout_ms" => config.client.response_timeout_ms.map(|ms| ms.to_string()),
        _ => None,
    }
}

pub fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "client.socket_path" => config.client.socket_path = Some(PathBuf::from(value)),
        "client.response_timeout_ms" => {
            let ms = value
                .parse()
                .with_context(|| format!("Invalid timeout in milliseconds: {}", value))?;
            config.client.response_timeout_ms = Some(ms);
        }
        _ => anyhow::bail!("Unknown config key: {}", key),
    }
    Ok(())
}
