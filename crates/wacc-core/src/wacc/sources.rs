//! Capital sources entered in any currency and their aggregation into
//! home-currency buckets.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::error::WaccError;
use crate::fx::{self, FxGrowth, FxTable};
use crate::types::{Currency, Money, Rate};
use crate::wacc::engine::{DebtSource, EquityInput};
use crate::WaccCalcResult;

/// Which side of the capital structure a source funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapitalKind {
    Equity,
    Debt,
}

impl fmt::Display for CapitalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapitalKind::Equity => write!(f, "Equity"),
            CapitalKind::Debt => write!(f, "Debt"),
        }
    }
}

/// One equity or debt position as entered by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub currency: Currency,
    /// Amount in `currency`
    pub amount: Money,
    /// Required return (equity) or pre-tax interest rate (debt)
    pub cost: Rate,
    /// Home units per one unit of `currency`; falls back to the FX table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx_rate: Option<Rate>,
}

impl CapitalSource {
    /// A home-currency source with no FX involved.
    pub fn home(amount: Money, cost: Rate) -> Self {
        Self {
            label: None,
            currency: Currency::default(),
            amount,
            cost,
            fx_rate: None,
        }
    }
}

/// A source after conversion into home currency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub label: String,
    pub currency: Currency,
    pub original_amount: Money,
    /// `None` when the source is already in home currency
    pub fx_rate: Option<Rate>,
    /// Spot rate before any FX growth projection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_fx_rate: Option<Rate>,
    pub home_value: Money,
    pub cost: Rate,
}

/// All sources of one kind, converted and summed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapitalBucket {
    pub kind: CapitalKind,
    pub total_value: Money,
    /// Sum of `home_value * cost`
    pub weighted_cost: Money,
    /// `weighted_cost / total_value`, zero for an empty bucket
    pub blended_cost: Rate,
    pub sources: Vec<SourceBreakdown>,
    /// Labels of sources whose FX rate came from the FX table
    #[serde(skip)]
    pub table_priced: Vec<String>,
}

impl CapitalBucket {
    /// Collapse an equity bucket into the engine's equity input.
    pub fn as_equity(&self) -> EquityInput {
        EquityInput {
            value: self.total_value,
            cost_of_equity: self.blended_cost,
        }
    }

    /// One engine debt source per converted source, in entry order.
    pub fn as_debt_sources(&self) -> Vec<DebtSource> {
        self.sources
            .iter()
            .map(|s| DebtSource {
                principal: s.home_value,
                rate: s.cost,
            })
            .collect()
    }
}

/// Convert a single source into home currency.
///
/// The explicit `fx_rate` wins over the table. When `fx_growth` is active the
/// projected rate replaces the spot rate.
pub fn convert_to_home(
    source: &CapitalSource,
    label: String,
    home: &Currency,
    fx_table: Option<&FxTable>,
    fx_growth: Option<&FxGrowth>,
) -> WaccCalcResult<(SourceBreakdown, bool)> {
    validate_source(source, &label)?;

    if source.currency == *home {
        let breakdown = SourceBreakdown {
            label,
            currency: source.currency.clone(),
            original_amount: source.amount,
            fx_rate: None,
            spot_fx_rate: None,
            home_value: source.amount,
            cost: source.cost,
        };
        return Ok((breakdown, false));
    }

    let (spot, from_table) = match source.fx_rate {
        Some(rate) => (rate, false),
        None => match fx_table.and_then(|t| t.rate(home, &source.currency)) {
            Some(rate) => (rate, true),
            None => {
                return Err(WaccError::InvalidInput {
                    field: format!("{label}.fx_rate"),
                    reason: format!(
                        "No FX rate for {} -> {home}; supply fx_rate or an fx_rates entry",
                        source.currency
                    ),
                })
            }
        },
    };

    let rate = match fx_growth {
        Some(growth) if growth.is_active() => {
            fx::project_rate(spot, growth).map_err(|e| prefix_field(&label, e))?
        }
        _ => spot,
    };
    let home_value = fx::convert(source.amount, rate).map_err(|e| prefix_field(&label, e))?;

    debug!(
        source = %label,
        currency = %source.currency,
        spot = %spot,
        rate = %rate,
        home_value = %home_value,
        "converted capital source"
    );

    let breakdown = SourceBreakdown {
        label,
        currency: source.currency.clone(),
        original_amount: source.amount,
        fx_rate: Some(rate),
        spot_fx_rate: (rate != spot).then_some(spot),
        home_value,
        cost: source.cost,
    };
    Ok((breakdown, from_table))
}

/// Convert and sum every source of one kind.
pub fn aggregate_sources(
    kind: CapitalKind,
    sources: &[CapitalSource],
    home: &Currency,
    fx_table: Option<&FxTable>,
    fx_growth: Option<&FxGrowth>,
) -> WaccCalcResult<CapitalBucket> {
    let mut total_value = Decimal::ZERO;
    let mut weighted_cost = Decimal::ZERO;
    let mut breakdowns = Vec::with_capacity(sources.len());
    let mut table_priced = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        let label = source
            .label
            .clone()
            .unwrap_or_else(|| format!("{kind} {}", i + 1));
        let (breakdown, from_table) = convert_to_home(source, label, home, fx_table, fx_growth)?;

        let overflow = || WaccError::InvalidInput {
            field: format!("{}.amount", breakdown.label),
            reason: format!("Total {kind} value exceeds the representable range"),
        };
        total_value = total_value
            .checked_add(breakdown.home_value)
            .ok_or_else(overflow)?;
        weighted_cost = breakdown
            .home_value
            .checked_mul(breakdown.cost)
            .and_then(|cost| weighted_cost.checked_add(cost))
            .ok_or_else(overflow)?;
        if from_table {
            table_priced.push(breakdown.label.clone());
        }
        breakdowns.push(breakdown);
    }

    let blended_cost = if total_value.is_zero() {
        Decimal::ZERO
    } else {
        weighted_cost / total_value
    };

    debug!(
        kind = %kind,
        sources = breakdowns.len(),
        total_value = %total_value,
        blended_cost = %blended_cost,
        "aggregated capital sources"
    );

    Ok(CapitalBucket {
        kind,
        total_value,
        weighted_cost,
        blended_cost,
        sources: breakdowns,
        table_priced,
    })
}

/// Scope a field-level error from the fx module to one source.
fn prefix_field(label: &str, err: WaccError) -> WaccError {
    match err {
        WaccError::InvalidInput { field, reason } => WaccError::InvalidInput {
            field: format!("{label}.{field}"),
            reason,
        },
        other => other,
    }
}

fn validate_source(source: &CapitalSource, label: &str) -> WaccCalcResult<()> {
    if source.amount < Decimal::ZERO {
        return Err(WaccError::InvalidInput {
            field: format!("{label}.amount"),
            reason: "Capital amount cannot be negative".into(),
        });
    }
    if source.cost < Decimal::ZERO || source.cost > Decimal::ONE {
        return Err(WaccError::InvalidInput {
            field: format!("{label}.cost"),
            reason: "Cost must be between 0 and 1".into(),
        });
    }
    Ok(())
}
