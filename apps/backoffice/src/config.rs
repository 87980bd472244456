//! # Configuration
//!
//! Loaded once at startup from environment variables, falling back to
//! defaults. Read-only afterwards.
//!
//! | Variable                 | Default                               |
//! |--------------------------|---------------------------------------|
//! | `SICONI_DB_PATH`         | `<platform data dir>/siconi.db`       |
//! | `SICONI_STORE_NAME`      | `SICONI`                              |
//! | `SICONI_REPORTS_DIR`     | `<platform data dir>/reports`         |
//! | `SICONI_EXCHANGE_RATE`   | unset (sales store 1.0)               |
//! | `SICONI_CURRENCY_SYMBOL` | `$`                                   |

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use siconi_core::validation::validate_exchange_rate;
use siconi_core::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Store name, printed in report headers
    pub store_name: String,

    /// Where `report summary --out` writes its files
    pub reports_dir: PathBuf,

    /// Default exchange rate captured on new sales
    pub exchange_rate: Option<f64>,

    /// Currency symbol for display
    pub currency_symbol: String,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let data_dir = default_data_dir();

        let exchange_rate = match get("SICONI_EXCHANGE_RATE").filter(|v| !v.trim().is_empty()) {
            Some(raw) => {
                let rate: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("SICONI_EXCHANGE_RATE".to_string()))?;
                validate_exchange_rate(rate)
                    .map_err(|_| ConfigError::InvalidValue("SICONI_EXCHANGE_RATE".to_string()))?;
                Some(rate)
            }
            None => None,
        };

        let store_name = get("SICONI_STORE_NAME").unwrap_or_else(|| "SICONI".to_string());
        if store_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue("SICONI_STORE_NAME".to_string()));
        }

        Ok(AppConfig {
            database_path: get("SICONI_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("siconi.db")),
            store_name,
            reports_dir: get("SICONI_REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("reports")),
            exchange_rate,
            currency_symbol: get("SICONI_CURRENCY_SYMBOL").unwrap_or_else(|| "$".to_string()),
        })
    }

    /// Formats an amount with the configured symbol: `Bs 1234.50`, `$-5.00`.
    pub fn format_currency(&self, amount: Money) -> String {
        let sign = if amount.is_negative() { "-" } else { "" };
        let separator = if self.currency_symbol.chars().count() > 1 { " " } else { "" };
        format!(
            "{}{}{}{}.{:02}",
            self.currency_symbol,
            separator,
            sign,
            amount.units().abs(),
            amount.cents_part()
        )
    }
}

/// Platform data directory, or the working directory when there is none.
///
/// - **Linux**: `~/.local/share/siconi`
/// - **macOS**: `~/Library/Application Support/com.siconi.siconi`
/// - **Windows**: `%APPDATA%\siconi\siconi\data`
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "siconi", "siconi")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
