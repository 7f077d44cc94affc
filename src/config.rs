use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::analysis::RankingParams;
use crate::price_source::RetryPolicy;
use crate::stats::WinsorBounds;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub price_source: PriceSourceConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PriceSourceConfig {
    pub url: String,
    pub source_label: String,
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub cache_ttl_secs: u64,
}

impl Default for PriceSourceConfig {
    fn default() -> Self {
        Self {
            url: "https://www.bullbitcoin.com/api/price".to_string(),
            source_label: "BullBitcoin Index USD".to_string(),
            timeout_ms: 10_000,
            max_attempts: 3,
            backoff_ms: 1_000,
            cache_ttl_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub bootstrap_path: String,
    pub history_daily_path: String,
    pub history_hourly_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            bootstrap_path: "data/bootstrap.csv".to_string(),
            history_daily_path: "data/history_365d.csv".to_string(),
            history_hourly_path: "data/history_30d_hourly.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub winsor_lower_pct: f64,
    pub winsor_upper_pct: f64,
    /// Earliest bucket admitted into the history ranking distributions.
    pub cutoff: String,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            winsor_lower_pct: 1.0,
            winsor_upper_pct: 99.0,
            cutoff: "2015-01-01T00:00:00Z".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl PriceSourceConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

impl AnalysisConfig {
    pub fn cutoff_utc(&self) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.cutoff.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("invalid analysis.cutoff '{}'", self.cutoff))
    }

    pub fn ranking_params(&self) -> Result<RankingParams> {
        Ok(RankingParams {
            bounds: WinsorBounds {
                lower_pct: self.winsor_lower_pct,
                upper_pct: self.winsor_upper_pct,
            },
            cutoff: self.cutoff_utc()?,
        })
    }
}

impl Config {
    /// Load `.env`, then `config/default.toml`. A missing file yields defaults.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = Path::new(DEFAULT_CONFIG_PATH);
        let mut config = if path.exists() {
            Self::from_path(path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        if let Ok(port) = std::env::var("PORT") {
            config.server.bind_addr = with_port(&config.server.bind_addr, &port)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let a = &self.analysis;
        if !(0.0..100.0).contains(&a.winsor_lower_pct)
            || a.winsor_upper_pct > 100.0
            || a.winsor_lower_pct >= a.winsor_upper_pct
        {
            bail!(
                "invalid winsor bounds {}..{}: expected 0 <= lower < upper <= 100",
                a.winsor_lower_pct,
                a.winsor_upper_pct
            );
        }
        if self.price_source.max_attempts == 0 {
            bail!("price_source.max_attempts must be >= 1");
        }
        a.cutoff_utc()?;
        Ok(())
    }
}

fn with_port(bind_addr: &str, port: &str) -> Result<String> {
    let port: u16 = port
        .trim()
        .parse()
        .with_context(|| format!("invalid PORT '{}'", port))?;
    let host = bind_addr
        .rsplit_once(':')
        .map(|(h, _)| h)
        .unwrap_or(bind_addr);
    Ok(format!("{}:{}", host, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_default_toml() {
        let toml_str = r#"
[server]
bind_addr = "127.0.0.1:8080"

[price_source]
url = "https://example.test/api/price"
max_attempts = 5
backoff_ms = 250

[data]
bootstrap_path = "data/bootstrap_10min.csv"

[analysis]
winsor_lower_pct = 2.5
winsor_upper_pct = 97.5

[logging]
level = "debug"
"#;
        let config = Config::from_toml_str(toml_str).unwrap();
        assert_eq!(config.server.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.price_source.max_attempts, 5);
        assert_eq!(config.price_source.cache_ttl_secs, 30);
        assert_eq!(config.data.bootstrap_path, "data/bootstrap_10min.csv");
        assert_eq!(config.data.history_daily_path, "data/history_365d.csv");
        assert!((config.analysis.winsor_lower_pct - 2.5).abs() < f64::EPSILON);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.price_source.max_attempts, 3);
        assert_eq!(
            config.analysis.ranking_params().unwrap(),
            RankingParams::default()
        );
    }

    #[test]
    fn rejects_inverted_winsor_bounds() {
        let toml_str = r#"
[analysis]
winsor_lower_pct = 60.0
winsor_upper_pct = 40.0
"#;
        assert!(Config::from_toml_str(toml_str).is_err());
    }

    #[test]
    fn rejects_bad_cutoff_and_zero_attempts() {
        assert!(Config::from_toml_str("[analysis]\ncutoff = \"yesterday\"\n").is_err());
        assert!(Config::from_toml_str("[price_source]\nmax_attempts = 0\n").is_err());
    }

    #[test]
    fn port_override_keeps_host() {
        assert_eq!(with_port("0.0.0.0:3000", "8081").unwrap(), "0.0.0.0:8081");
        assert!(with_port("0.0.0.0:3000", "http").is_err());
    }
}
