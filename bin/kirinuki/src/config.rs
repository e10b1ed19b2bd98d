use std::path::{Path, PathBuf};

use clap::Args;
use kirinuki::config::DownloadConfig;
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "kirinuki.toml";

/// Contents of `kirinuki.toml`. Command line flags take precedence.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub download: DownloadConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// `Name: value` pairs sent with every request.
    pub headers: Vec<String>,
    /// `Set-Cookie` style cookies for the playlist host.
    pub cookies: Vec<String>,
}

impl Config {
    /// Load `path`, or `./kirinuki.toml` if it exists, or the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let data = std::fs::read_to_string(&file)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", file.display()))?;
        let config = toml::from_str(&data)?;
        tracing::debug!("Loaded config from {}", file.display());
        Ok(config)
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct ConfigOptions {
    /// Config file, `./kirinuki.toml` when present
    #[clap(short, long, env = "KIRINUKI_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigOptions {
    pub fn load(&self) -> anyhow::Result<Config> {
        Config::load(self.config.as_deref())
    }
}
