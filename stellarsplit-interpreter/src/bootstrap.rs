use std::env;
use stellarsplit_presentation::CurrencyProfile;
use tracing_subscriber::EnvFilter;

pub const CURRENCY_VAR: &str = "STELLARSPLIT_CURRENCY";
pub const DISPLAY_DECIMALS_VAR: &str = "STELLARSPLIT_DISPLAY_DECIMALS";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("STELLARSPLIT_CURRENCY must be XLM or USDC, got `{0}`")]
    UnknownCurrency(String),
    #[error("STELLARSPLIT_DISPLAY_DECIMALS must be an integer between 0 and {max}, got `{value}`")]
    InvalidDisplayDecimals { value: String, max: u32 },
}

/// Interpreter settings read from the environment (and `.env`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    pub currency: CurrencyProfile,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let currency = match lookup(CURRENCY_VAR) {
            None => CurrencyProfile::xlm(),
            Some(code) => match code.trim().to_ascii_uppercase().as_str() {
                "XLM" => CurrencyProfile::xlm(),
                "USDC" => CurrencyProfile::usdc(),
                _ => return Err(ConfigError::UnknownCurrency(code)),
            },
        };

        let currency = match lookup(DISPLAY_DECIMALS_VAR) {
            None => currency,
            Some(raw) => {
                let invalid = || ConfigError::InvalidDisplayDecimals {
                    value: raw.clone(),
                    max: currency.scale,
                };
                let decimals: u32 = raw.trim().parse().map_err(|_| invalid())?;
                if decimals > currency.scale {
                    return Err(invalid());
                }
                currency.with_display_decimals(decimals)
            }
        };

        Ok(Self { currency })
    }
}

/// Initialize logging; `RUST_LOG` overrides the default `warn` level.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
}
