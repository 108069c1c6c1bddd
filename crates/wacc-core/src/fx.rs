//! Currency conversion into the home (reporting) currency.
//!
//! Every rate in this module is quoted as home units per one foreign unit,
//! so converting a foreign amount is always a multiplication.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::WaccError;
use crate::types::{Currency, Money, Rate};
use crate::WaccCalcResult;

const MAX_ANNUAL_FX_GROWTH: Rate = dec!(0.50);
const MAX_HORIZON_YEARS: u32 = 30;

/// Expected annual change of an FX rate, compounded over a horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FxGrowth {
    /// Expected annual rate change (0.03 = foreign currency strengthens 3% a year)
    pub annual_rate: Rate,
    /// Number of years to compound over
    pub horizon_years: u32,
}

impl FxGrowth {
    pub fn validate(&self) -> WaccCalcResult<()> {
        if self.annual_rate.abs() > MAX_ANNUAL_FX_GROWTH {
            return Err(WaccError::InvalidInput {
                field: "fx_growth.annual_rate".into(),
                reason: format!(
                    "Annual FX change must be between -{MAX_ANNUAL_FX_GROWTH} and {MAX_ANNUAL_FX_GROWTH}"
                ),
            });
        }
        if self.horizon_years == 0 || self.horizon_years > MAX_HORIZON_YEARS {
            return Err(WaccError::InvalidInput {
                field: "fx_growth.horizon_years".into(),
                reason: format!("Horizon must be between 1 and {MAX_HORIZON_YEARS} years"),
            });
        }
        Ok(())
    }

    /// True when the projection would change any rate.
    pub fn is_active(&self) -> bool {
        !self.annual_rate.is_zero()
    }
}

/// Project a spot rate forward: `current * (1 + g)^n`.
pub fn project_rate(current: Rate, growth: &FxGrowth) -> WaccCalcResult<Rate> {
    validate_rate(current, "fx_rate")?;
    growth.validate()?;

    (Decimal::ONE + growth.annual_rate)
        .checked_powi(i64::from(growth.horizon_years))
        .and_then(|factor| current.checked_mul(factor))
        .ok_or_else(|| WaccError::InvalidInput {
            field: "fx_rate".into(),
            reason: format!("Projected FX rate overflows from {current}"),
        })
}

/// Turn a "foreign per home" quote into "home per foreign".
pub fn invert_quote(foreign_per_home: Rate) -> WaccCalcResult<Rate> {
    if foreign_per_home.is_zero() {
        return Err(WaccError::DivisionByZero {
            context: "FX quote inversion".into(),
        });
    }
    validate_rate(foreign_per_home, "fx_rate")?;
    Ok(Decimal::ONE / foreign_per_home)
}

/// Convert a foreign amount into home currency.
pub fn convert(amount: Money, rate: Rate) -> WaccCalcResult<Money> {
    validate_rate(rate, "fx_rate")?;
    amount
        .checked_mul(rate)
        .ok_or_else(|| WaccError::InvalidInput {
            field: "amount".into(),
            reason: format!("{amount} at FX rate {rate} exceeds the representable range"),
        })
}

fn validate_rate(rate: Rate, field: &str) -> WaccCalcResult<()> {
    if rate <= Decimal::ZERO {
        return Err(WaccError::InvalidInput {
            field: field.into(),
            reason: format!("FX rate must be positive, got {rate}"),
        });
    }
    Ok(())
}

/// Caller-supplied FX rates against the home currency, keyed by currency code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FxTable {
    pub rates: BTreeMap<Currency, Rate>,
}

impl FxTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_rate(mut self, currency: &Currency, home_per_foreign: Rate) -> Self {
        self.rates.insert(currency.clone(), home_per_foreign);
        self
    }

    /// Look up the rate for `foreign`. The home currency always converts at 1.
    pub fn rate(&self, home: &Currency, foreign: &Currency) -> Option<Rate> {
        if home == foreign {
            return Some(Decimal::ONE);
        }
        self.rates.get(foreign).copied()
    }

    pub fn validate(&self) -> WaccCalcResult<()> {
        for (code, rate) in &self.rates {
            validate_rate(*rate, &format!("fx_rates.{code}"))?;
        }
        Ok(())
    }
}
