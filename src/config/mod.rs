use anyhow::{ bail, Context, Result };
use dotenv::dotenv;
use serde::{ Deserialize, Serialize };
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

use crate::aggregation::AggregationStep;
use crate::app::refresher::RefreshConfig;
use crate::display::{ DisplaySettings, Precision };
use crate::display::settings::MAX_LEVELS_TO_SHOW;
use crate::exchange::binance::VALID_DEPTH_LIMITS;
use crate::utils::serde_helpers::{ serialize_level, deserialize_level };

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub debug: bool,
    pub symbol: String,
    pub api_url: String,
    pub depth_limit: u16,

    pub aggregation_step: AggregationStep,
    pub price_precision: Precision,
    pub quantity_precision: Precision,
    pub levels_to_show: usize,

    pub refresh_interval_ms: u64,
    pub request_timeout_ms: u64,

    #[serde(serialize_with = "serialize_level", deserialize_with = "deserialize_level")]
    pub log_level: Level,
    pub log_config: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub directory: PathBuf,
    pub filename_prefix: String,
    pub rotation: LogRotation,
    pub max_files: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRotation {
    Hourly,
    Daily,
    Never,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load environment variables from .env file; a missing file is fine
        if let Ok(path) = dotenv() {
            eprintln!("Loaded .env file from: {}", path.display());
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self> where F: Fn(&str) -> Option<String> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // Parse DEBUG
        let debug = var("DL_DEBUG", "false")
            .parse::<bool>()
            .context("Failed to parse DL_DEBUG environment variable")?;

        let symbol = var("DL_SYMBOL", "ETHUSDT").trim().to_uppercase();
        if symbol.is_empty() {
            bail!("DL_SYMBOL must not be empty");
        }

        let api_url = var("DL_API_URL", "https://api.binance.com/api/");

        // Parse DEPTH_LIMIT
        let depth_limit = var("DL_DEPTH_LIMIT", "100")
            .parse::<u16>()
            .context("Failed to parse DL_DEPTH_LIMIT environment variable")?;
        if !VALID_DEPTH_LIMITS.contains(&depth_limit) {
            bail!("DL_DEPTH_LIMIT must be one of {:?}, got {}", VALID_DEPTH_LIMITS, depth_limit);
        }

        // Parse AGGREGATION_STEP as an exact decimal
        let aggregation_step = var("DL_AGGREGATION_STEP", "0.01")
            .parse::<AggregationStep>()
            .context("Failed to parse DL_AGGREGATION_STEP environment variable")?;

        let price_precision = parse_precision(&var("DL_PRICE_PRECISION", "2"), "DL_PRICE_PRECISION")?;
        let quantity_precision = parse_precision(
            &var("DL_QUANTITY_PRECISION", "4"),
            "DL_QUANTITY_PRECISION"
        )?;

        let levels_to_show = var("DL_LEVELS_TO_SHOW", "10")
            .parse::<usize>()
            .context("Failed to parse DL_LEVELS_TO_SHOW environment variable")?;
        if levels_to_show == 0 || levels_to_show > MAX_LEVELS_TO_SHOW {
            bail!("DL_LEVELS_TO_SHOW must be within 1..={}, got {}", MAX_LEVELS_TO_SHOW, levels_to_show);
        }

        let refresh_interval_ms = var("DL_REFRESH_INTERVAL_MS", "3000")
            .parse::<u64>()
            .context("Failed to parse DL_REFRESH_INTERVAL_MS environment variable")?;
        if refresh_interval_ms == 0 {
            bail!("DL_REFRESH_INTERVAL_MS must be positive");
        }

        let request_timeout_ms = var("DL_REQUEST_TIMEOUT_MS", "5000")
            .parse::<u64>()
            .context("Failed to parse DL_REQUEST_TIMEOUT_MS environment variable")?;
        if request_timeout_ms == 0 {
            bail!("DL_REQUEST_TIMEOUT_MS must be positive");
        }

        // Parse LOG_LEVEL
        let log_level = match var("DL_LOG_LEVEL", "info").to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // Set up logging configuration
        let log_rotation = match var("DL_LOG_ROTATION", "daily").to_lowercase().as_str() {
            "hourly" => LogRotation::Hourly,
            "never" => LogRotation::Never,
            _ => LogRotation::Daily,
        };

        let max_files = lookup("DL_LOG_MAX_FILES").and_then(|s| s.parse::<usize>().ok());

        let log_config = LogConfig {
            directory: PathBuf::from(var("DL_LOG_DIRECTORY", "logs")),
            filename_prefix: var("DL_LOG_FILENAME_PREFIX", "depth_ladder"),
            rotation: log_rotation,
            max_files,
        };

        Ok(Config {
            debug,
            symbol,
            api_url,
            depth_limit,
            aggregation_step,
            price_precision,
            quantity_precision,
            levels_to_show,
            refresh_interval_ms,
            request_timeout_ms,
            log_level,
            log_config,
        })
    }

    /// Initial ladder settings; the TUI mutates its own copy afterwards
    pub fn display_settings(&self) -> DisplaySettings {
        DisplaySettings {
            step: self.aggregation_step,
            price_precision: self.price_precision,
            quantity_precision: self.quantity_precision,
            levels_to_show: self.levels_to_show,
        }
    }

    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            symbol: self.symbol.clone(),
            depth_limit: self.depth_limit,
            interval: self.refresh_interval(),
            request_timeout: self.request_timeout(),
        }
    }

    #[inline]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    #[inline]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_precision(raw: &str, key: &str) -> Result<Precision> {
    let digits = raw
        .trim()
        .parse::<u32>()
        .with_context(|| format!("Failed to parse {} environment variable", key))?;
    Precision::new(digits).with_context(|| format!("{} is out of range", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use rust_decimal_macros::dec;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.symbol, "ETHUSDT");
        assert_eq!(config.depth_limit, 100);
        assert_eq!(config.aggregation_step.value(), dec!(0.01));
        assert_eq!(config.levels_to_show, 10);
        assert_eq!(config.refresh_interval(), Duration::from_millis(3000));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.log_config.rotation, LogRotation::Daily);
        assert_eq!(config.display_settings(), DisplaySettings::default());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(
            &[
                ("DL_SYMBOL", "btcusdt"),
                ("DL_AGGREGATION_STEP", "10"),
                ("DL_PRICE_PRECISION", "0"),
                ("DL_LOG_LEVEL", "DEBUG"),
                ("DL_LOG_ROTATION", "never"),
                ("DL_LOG_MAX_FILES", "3"),
            ]
        ).unwrap();
        assert_eq!(config.symbol, "BTCUSDT");
        assert_eq!(config.aggregation_step.value(), dec!(10));
        assert_eq!(config.price_precision.digits(), 0);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.log_config.rotation, LogRotation::Never);
        assert_eq!(config.log_config.max_files, Some(3));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(config_from(&[("DL_AGGREGATION_STEP", "0")]).is_err());
        assert!(config_from(&[("DL_AGGREGATION_STEP", "-1")]).is_err());
        assert!(config_from(&[("DL_PRICE_PRECISION", "5")]).is_err());
        assert!(config_from(&[("DL_DEPTH_LIMIT", "42")]).is_err());
        assert!(config_from(&[("DL_LEVELS_TO_SHOW", "0")]).is_err());
        assert!(config_from(&[("DL_DEBUG", "yes")]).is_err());
    }

    #[test]
    fn serializes_for_startup_banner() {
        let json = serde_json::to_string(&config_from(&[]).unwrap()).unwrap();
        assert!(json.contains("\"log_level\":\"info\""));
        assert!(json.contains("\"aggregation_step\":\"0.01\""));
    }
}
