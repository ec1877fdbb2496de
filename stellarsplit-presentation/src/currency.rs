use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use stellarsplit_domain::Money;

/// How a token's smallest units map to human-readable decimals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrencyProfile {
    pub code: &'static str,
    /// Decimal places of the smallest unit (7 for XLM stroops).
    pub scale: u32,
    pub display_decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("`{0}` is not a decimal amount")]
    Invalid(String),
    #[error("`{input}` has more than {max} decimal places")]
    TooPrecise { input: String, max: u32 },
    #[error("amount must be greater than zero, got `{0}`")]
    NonPositive(String),
    #[error("`{0}` is too large")]
    OutOfRange(String),
}

impl CurrencyProfile {
    pub const fn xlm() -> Self {
        Self {
            code: "XLM",
            scale: 7,
            display_decimals: 2,
        }
    }

    pub const fn usdc() -> Self {
        Self {
            code: "USDC",
            scale: 7,
            display_decimals: 2,
        }
    }

    /// Display precision never exceeds the unit scale.
    pub fn with_display_decimals(mut self, display_decimals: u32) -> Self {
        self.display_decimals = display_decimals.min(self.scale);
        self
    }

    fn unit_factor(self) -> Option<i128> {
        10_i128.checked_pow(self.scale)
    }

    /// Converts a decimal display string like `12.5` into smallest units.
    pub fn parse_amount(self, input: &str) -> Result<Money, AmountParseError> {
        let trimmed = input.trim();
        let value = Decimal::from_str_exact(trimmed)
            .map_err(|_| AmountParseError::Invalid(trimmed.to_string()))?
            .normalize();

        if value.scale() > self.scale {
            return Err(AmountParseError::TooPrecise {
                input: trimmed.to_string(),
                max: self.scale,
            });
        }
        if value <= Decimal::ZERO {
            return Err(AmountParseError::NonPositive(trimmed.to_string()));
        }

        let out_of_range = || AmountParseError::OutOfRange(trimmed.to_string());
        let factor = self
            .unit_factor()
            .and_then(|factor| Decimal::try_from_i128_with_scale(factor, 0).ok())
            .ok_or_else(out_of_range)?;
        let units = value.checked_mul(factor).ok_or_else(out_of_range)?;
        units
            .to_i128()
            .map(Money::from_units)
            .ok_or_else(out_of_range)
    }

    /// Renders smallest units as a decimal rounded half away from zero to
    /// `display_decimals`, without trailing zeros.
    pub fn format_amount(self, amount: Money) -> String {
        let Ok(value) = Decimal::try_from_i128_with_scale(amount.units(), self.scale) else {
            return self.format_exact(amount);
        };
        let rounded = value
            .round_dp_with_strategy(self.display_decimals, RoundingStrategy::MidpointAwayFromZero)
            .normalize();
        if rounded.is_zero() {
            return "0".to_string();
        }
        rounded.to_string()
    }

    /// Like [`format_amount`](Self::format_amount) with a leading `+` on
    /// credits.
    pub fn format_signed(self, amount: Money) -> String {
        let formatted = self.format_amount(amount);
        if amount.is_positive() && formatted != "0" {
            format!("+{formatted}")
        } else {
            formatted
        }
    }

    // Amounts beyond Decimal's 96-bit mantissa are printed unrounded.
    fn format_exact(self, amount: Money) -> String {
        let Some(factor) = self.unit_factor() else {
            return amount.to_string();
        };
        let units = amount.units();
        let whole = units / factor;
        let frac = (units % factor).unsigned_abs();
        let sign = if units < 0 && whole == 0 { "-" } else { "" };
        if frac == 0 {
            return format!("{sign}{whole}");
        }
        let digits = format!("{frac:0width$}", width = self.scale as usize);
        format!("{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl Default for CurrencyProfile {
    fn default() -> Self {
        Self::xlm()
    }
}

/// Shortens a Stellar address to `GABC...WXYZ`. Addresses too short to
/// benefit are returned unchanged.
pub fn mask_address(address: &str, start: usize, end: usize) -> String {
    let len = address.chars().count();
    if len <= start + end + 3 {
        return address.to_string();
    }
    let head: String = address.chars().take(start).collect();
    let tail: String = address.chars().skip(len - end).collect();
    format!("{head}...{tail}")
}
