use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::services::charts::ChartConfig;

fn default_max_upload_bytes() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub charts: ChartConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let defaults = ChartConfig::default();
        let charts = ChartConfig {
            numeric_fraction: env_or("CHART_NUMERIC_FRACTION", defaults.numeric_fraction)?,
            unique_x_fraction: env_or("CHART_UNIQUE_X_FRACTION", defaults.unique_x_fraction)?,
            scatter_min_rows: env_or("CHART_SCATTER_MIN_ROWS", defaults.scatter_min_rows)?,
            pie_max_categories: env_or("CHART_PIE_MAX_CATEGORIES", defaults.pie_max_categories)?,
            ..defaults
        };

        Ok(Config {
            bind_addr: env_or("SHEET_INSIGHTS_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            max_upload_bytes: env_or("SHEET_INSIGHTS_MAX_UPLOAD_BYTES", default_max_upload_bytes())?,
            charts,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_keys_fall_back_to_defaults() {
        let value: usize = env_or("SHEET_INSIGHTS_TEST_UNSET_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn malformed_values_are_errors() {
        std::env::set_var("SHEET_INSIGHTS_TEST_BAD_FRACTION", "eighty");
        let err = env_or::<f64>("SHEET_INSIGHTS_TEST_BAD_FRACTION", 0.8).unwrap_err();
        assert!(err.to_string().contains("SHEET_INSIGHTS_TEST_BAD_FRACTION"));
    }

    #[test]
    fn parses_set_values() {
        std::env::set_var("SHEET_INSIGHTS_TEST_ROWS", " 35 ");
        let value: usize = env_or("SHEET_INSIGHTS_TEST_ROWS", 20).unwrap();
        assert_eq!(value, 35);
    }
}
