//! # Shop Configuration
//!
//! Settings loaded once at startup and read-only afterwards.
//!
//! ## Load Order (later overrides earlier)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Defaults            TSh, 16% VAT, 500 delivery fee, 5 check-in pts  │
//! │  2. shopdesk.toml       <config dir>/shopdesk.toml or an explicit path  │
//! │  3. Environment         SHOPDESK_STORE_NAME      "Duka Kuu"             │
//! │                         SHOPDESK_TAX_RATE        "16" (percent)         │
//! │                         SHOPDESK_DELIVERY_FEE    "500"                  │
//! │                         SHOPDESK_DB_PATH         "./shopdesk.db"        │
//! │                         SHOPDESK_CHECKIN_POINTS  "5"                    │
//! │  4. validate()                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use shopdesk_core::validation::validate_tax_rate_bps;
use shopdesk_core::{Money, PricingConfig, TaxRate, DEFAULT_DELIVERY_FEE, DEFAULT_TAX_RATE_BPS};

const CONFIG_FILE: &str = "shopdesk.toml";
const DB_FILE: &str = "shopdesk.db";

/// Errors while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read or write config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not determine the app data directory")]
    NoProjectDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Shop-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    /// Printed at the top of every receipt.
    pub store_name: String,

    /// ISO 4217 code.
    pub currency_code: String,
    pub currency_symbol: String,
    /// Digits after the decimal point in a minor-unit amount.
    pub currency_decimals: u8,

    /// VAT in basis points (1600 = 16%).
    pub tax_rate_bps: u32,
    pub tax_enabled: bool,

    /// Flat fee for non-pickup delivery, in minor units.
    pub delivery_fee: i64,

    /// Loyalty points awarded per check-in.
    pub checkin_points: i64,

    /// Days without a visit before a customer counts as inactive.
    pub inactive_after_days: u32,

    /// SQLite file; the platform data dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_path: Option<PathBuf>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            store_name: "ShopDesk".to_string(),
            currency_code: "TZS".to_string(),
            currency_symbol: "TSh".to_string(),
            currency_decimals: 0,
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            tax_enabled: true,
            delivery_fee: DEFAULT_DELIVERY_FEE,
            checkin_points: 5,
            inactive_after_days: 90,
            db_path: None,
        }
    }
}

impl ShopConfig {
    /// Loads defaults, then the TOML file (if present), then environment
    /// overrides, then validates.
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = match config_path.or_else(Self::default_config_path) {
            Some(path) if path.exists() => {
                info!(?path, "Loading shop config from file");
                toml::from_str(&std::fs::read_to_string(&path)?)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                ShopConfig::default()
            }
            None => ShopConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Loads config or falls back to defaults when loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load shop config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or(ConfigError::NoProjectDir)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        info!(?path, "Shop config saved");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.store_name.trim().is_empty() {
            return Err(ConfigError::Invalid("store_name cannot be empty".into()));
        }
        validate_tax_rate_bps(self.tax_rate_bps).map_err(|_| {
            ConfigError::Invalid(format!(
                "tax rate cannot exceed 100%, got {}%",
                TaxRate::from_bps(self.tax_rate_bps).percentage()
            ))
        })?;
        if self.delivery_fee < 0 {
            return Err(ConfigError::Invalid("delivery_fee cannot be negative".into()));
        }
        if self.checkin_points < 0 {
            return Err(ConfigError::Invalid("checkin_points cannot be negative".into()));
        }
        if self.currency_decimals > 4 {
            return Err(ConfigError::Invalid("currency_decimals must be 0-4".into()));
        }
        Ok(())
    }

    /// Applies `SHOPDESK_*` overrides read through `var`.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(name) = var("SHOPDESK_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(rate) = var("SHOPDESK_TAX_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(pct) if pct >= 0.0 => {
                    debug!(rate = %rate, "Overriding tax rate from environment");
                    self.tax_rate_bps = TaxRate::from_percentage(pct).bps();
                }
                _ => warn!(rate = %rate, "Ignoring invalid SHOPDESK_TAX_RATE"),
            }
        }

        if let Some(fee) = var("SHOPDESK_DELIVERY_FEE") {
            match fee.trim().parse::<i64>() {
                Ok(f) => self.delivery_fee = f,
                Err(_) => warn!(fee = %fee, "Ignoring invalid SHOPDESK_DELIVERY_FEE"),
            }
        }

        if let Some(path) = var("SHOPDESK_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.db_path = Some(PathBuf::from(path));
        }

        if let Some(points) = var("SHOPDESK_CHECKIN_POINTS") {
            match points.trim().parse::<i64>() {
                Ok(p) => self.checkin_points = p,
                Err(_) => warn!(points = %points, "Ignoring invalid SHOPDESK_CHECKIN_POINTS"),
            }
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "shopdesk", "shopdesk")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Database file: the configured path, else `<data dir>/shopdesk.db`.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let dirs = Self::project_dirs().ok_or(ConfigError::NoProjectDir)?;
        Ok(dirs.data_dir().join(DB_FILE))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn pricing(&self) -> PricingConfig {
        PricingConfig {
            tax_rate: TaxRate::from_bps(self.tax_rate_bps),
            tax_enabled: self.tax_enabled,
            delivery_fee: Money::from_minor(self.delivery_fee),
        }
    }

    /// Renders a minor-unit amount: `TSh 1,740,000`, `$ 12.50`.
    pub fn format_currency(&self, minor: i64) -> String {
        let sign = if minor < 0 { "-" } else { "" };
        let scale = 10_u64.pow(u32::from(self.currency_decimals));
        let abs = minor.unsigned_abs();
        let major = Money::from_minor(i64::try_from(abs / scale).unwrap_or(i64::MAX));

        if self.currency_decimals == 0 {
            format!("{} {}{}", self.currency_symbol, sign, major)
        } else {
            let frac = abs % scale;
            format!(
                "{} {}{}.{:0width$}",
                self.currency_symbol,
                sign,
                major,
                frac,
                width = usize::from(self.currency_decimals)
            )
        }
    }
}
