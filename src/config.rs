// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::crawl::DEFAULT_DETAILS_ENDPOINT;
use crate::fetch::MAX_FETCH_ATTEMPTS;

pub const ENV_CONFIG_PATH: &str = "AD_SCRAPER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/scraper.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub fetch: FetchConfig,
    pub alert: AlertConfig,
    pub recovery: RecoveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/ads.sqlite"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_retries: u8,
    /// Upper bound of the random pause between two fetches.
    pub max_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_DETAILS_ENDPOINT.to_string(),
            timeout_secs: 30,
            max_retries: 3,
            max_delay_ms: 3_000,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AlertConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// "ENV" means: read from SMTP_USER
    pub username: String,
    /// "ENV" means: read from SMTP_PASS
    pub password: String,
    pub from: String,
    pub to: String,
    pub subject: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.live.com".to_string(),
            smtp_port: 587,
            username: "ENV".to_string(),
            password: "ENV".to_string(),
            from: String::new(),
            to: String::new(),
            subject: "Error in ad copy scraper".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecoveryConfig {
    pub dir: PathBuf,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("recovery"),
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: Config =
            toml::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
        cfg.finish()
    }

    /// Resolve the config path:
    /// 1) explicit argument
    /// 2) $AD_SCRAPER_CONFIG
    /// 3) config/scraper.toml
    /// 4) built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::load_from_file(p);
        }
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from_file(&pb);
        }
        let default = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default.exists() {
            return Self::load_from_file(&default);
        }
        Config::default().finish()
    }

    fn finish(mut self) -> Result<Self> {
        // Sanitize
        if self.fetch.timeout_secs == 0 {
            self.fetch.timeout_secs = FetchConfig::default().timeout_secs;
        }
        self.fetch.max_retries = self.fetch.max_retries.clamp(1, MAX_FETCH_ATTEMPTS);
        self.fetch.endpoint = self.fetch.endpoint.trim_end_matches(['?', '/']).to_string();

        if self.alert.enabled {
            self.alert.username = resolve_secret(&self.alert.username, "SMTP_USER")?;
            self.alert.password = resolve_secret(&self.alert.password, "SMTP_PASS")?;
            if self.alert.to.trim().is_empty() {
                bail!("alert.enabled requires alert.to");
            }
            if self.alert.from.trim().is_empty() {
                self.alert.from = self.alert.username.clone();
            }
        }
        Ok(self)
    }
}

fn resolve_secret(value: &str, var: &str) -> Result<String> {
    if value.trim().eq_ignore_ascii_case("env") {
        env::var(var).map_err(|_| anyhow!("Missing {var} env var"))
    } else {
        Ok(value.to_string())
    }
}
