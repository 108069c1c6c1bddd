use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// A single borrowing instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSource {
    /// Outstanding principal in home currency
    pub principal: Money,
    /// Pre-tax annual cost of this debt
    pub rate: Rate,
}

/// Market value of equity and the return shareholders require on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityInput {
    pub value: Money,
    pub cost_of_equity: Rate,
}

/// Derived WACC figures for one input snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaccResult {
    pub total_debt: Money,
    pub firm_value: Money,
    pub equity_weight: Rate,
    pub debt_weight: Rate,
    /// Principal-weighted blended pre-tax cost of debt
    pub weighted_debt_cost: Rate,
    pub wacc: Rate,
}

/// Compute WACC for an equity position, a list of debt sources and a tax rate.
///
/// WACC = E/V * Re + D/V * Rd * (1 - T), where Rd is the principal-weighted
/// blend of the individual debt rates.
///
/// Returns `None` when the firm value is zero: the weights are undefined and no
/// division is attempted. Inputs are assumed validated (non-negative amounts).
pub fn compute_wacc(
    equity: &EquityInput,
    debt_sources: &[DebtSource],
    tax_rate: Rate,
) -> Option<WaccResult> {
    let total_debt = total_debt(debt_sources);
    let firm_value = equity.value + total_debt;
    if firm_value.is_zero() {
        return None;
    }

    let equity_weight = equity.value / firm_value;
    let debt_weight = total_debt / firm_value;
    let weighted_debt_cost = blended_cost_of_debt(debt_sources, total_debt);

    let wacc = equity_weight * equity.cost_of_equity
        + debt_weight * weighted_debt_cost * (Decimal::ONE - tax_rate);

    Some(WaccResult {
        total_debt,
        firm_value,
        equity_weight,
        debt_weight,
        weighted_debt_cost,
        wacc,
    })
}

/// `equity.value + sum(principal)`, or `None` if it exceeds `Decimal`'s range.
///
/// Callers with unbounded amounts check this before `compute_wacc`.
pub fn checked_firm_value(equity: &EquityInput, debt_sources: &[DebtSource]) -> Option<Money> {
    debt_sources
        .iter()
        .try_fold(equity.value, |acc, d| acc.checked_add(d.principal))
}

/// Sum of all principals.
pub fn total_debt(debt_sources: &[DebtSource]) -> Money {
    debt_sources.iter().map(|d| d.principal).sum()
}

fn blended_cost_of_debt(debt_sources: &[DebtSource], total_debt: Money) -> Rate {
    if total_debt.is_zero() {
        return Decimal::ZERO;
    }
    debt_sources
        .iter()
        .map(|d| d.principal / total_debt * d.rate)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn equity(value: Decimal, cost: Decimal) -> EquityInput {
        EquityInput {
            value,
            cost_of_equity: cost,
        }
    }

    fn debt(principal: Decimal, rate: Decimal) -> DebtSource {
        DebtSource { principal, rate }
    }

    #[test]
    fn test_single_debt_source() {
        let result = compute_wacc(
            &equity(dec!(600), dec!(0.10)),
            &[debt(dec!(400), dec!(0.05))],
            dec!(0.30),
        )
        .unwrap();

        assert_eq!(result.total_debt, dec!(400));
        assert_eq!(result.firm_value, dec!(1000));
        assert_eq!(result.equity_weight, dec!(0.6));
        assert_eq!(result.debt_weight, dec!(0.4));
        assert_eq!(result.weighted_debt_cost, dec!(0.05));
        // 0.6 * 0.10 + 0.4 * 0.05 * 0.70 = 0.06 + 0.014
        assert_eq!(result.wacc, dec!(0.074));
    }

    #[test]
    fn test_two_debt_sources_blend() {
        let result = compute_wacc(
            &equity(dec!(600), dec!(0.10)),
            &[debt(dec!(300), dec!(0.04)), debt(dec!(100), dec!(0.08))],
            Decimal::ZERO,
        )
        .unwrap();

        // 300/400 * 0.04 + 100/400 * 0.08 = 0.03 + 0.02
        assert_eq!(result.weighted_debt_cost, dec!(0.05));
        // 0.6 * 0.10 + 0.4 * 0.05
        assert_eq!(result.wacc, dec!(0.08));
    }

    #[test]
    fn test_zero_firm_value_is_undefined() {
        assert_eq!(compute_wacc(&equity(Decimal::ZERO, dec!(0.12)), &[], dec!(0.25)), None);
        assert_eq!(
            compute_wacc(
                &equity(Decimal::ZERO, dec!(0.12)),
                &[debt(Decimal::ZERO, dec!(0.05))],
                dec!(0.25)
            ),
            None
        );
    }

    #[test]
    fn test_equity_only() {
        let result = compute_wacc(&equity(dec!(500), dec!(0.09)), &[], dec!(0.21)).unwrap();
        assert_eq!(result.total_debt, Decimal::ZERO);
        assert_eq!(result.equity_weight, Decimal::ONE);
        assert_eq!(result.debt_weight, Decimal::ZERO);
        assert_eq!(result.weighted_debt_cost, Decimal::ZERO);
        assert_eq!(result.wacc, dec!(0.09));
    }

    #[test]
    fn test_debt_only_applies_tax_shield() {
        let result = compute_wacc(
            &equity(Decimal::ZERO, dec!(0.15)),
            &[debt(dec!(250), dec!(0.06))],
            dec!(0.25),
        )
        .unwrap();
        assert_eq!(result.debt_weight, Decimal::ONE);
        // 0.06 * 0.75
        assert_eq!(result.wacc, dec!(0.045));
    }

    #[test]
    fn test_weights_sum_to_one() {
        let cases = [
            (dec!(1), vec![debt(dec!(2), dec!(0.05))]),
            (dec!(333.33), vec![debt(dec!(123.45), dec!(0.07)), debt(dec!(0.01), dec!(0.2))]),
            (dec!(0), vec![debt(dec!(7), dec!(0.03)), debt(dec!(11), dec!(0.09))]),
            (dec!(1000000), vec![debt(dec!(3), dec!(0.01))]),
        ];
        for (value, debts) in cases {
            let result = compute_wacc(&equity(value, dec!(0.1)), &debts, dec!(0.2)).unwrap();
            let sum = result.equity_weight + result.debt_weight;
            assert!(
                (sum - Decimal::ONE).abs() < dec!(0.0000000001),
                "Weights must sum to 1, got {sum} for equity {value}"
            );
        }
    }

    #[test]
    fn test_deterministic() {
        let eq = equity(dec!(820), dec!(0.11));
        let debts = vec![debt(dec!(150), dec!(0.045)), debt(dec!(75), dec!(0.065))];
        let first = compute_wacc(&eq, &debts, dec!(0.27));
        for _ in 0..10 {
            assert_eq!(compute_wacc(&eq, &debts, dec!(0.27)), first);
        }
    }

    #[test]
    fn test_adding_and_removing_debt_recomputes() {
        let eq = equity(dec!(600), dec!(0.10));
        let mut debts = vec![debt(dec!(400), dec!(0.05))];
        let before = compute_wacc(&eq, &debts, dec!(0.30)).unwrap();

        debts.push(debt(dec!(1000), dec!(0.08)));
        let added = compute_wacc(&eq, &debts, dec!(0.30)).unwrap();
        assert_eq!(added.total_debt, dec!(1400));
        assert_eq!(added.firm_value, dec!(2000));
        assert_eq!(added.equity_weight, dec!(0.3));
        assert!(added.wacc != before.wacc);

        debts.pop();
        let removed = compute_wacc(&eq, &debts, dec!(0.30)).unwrap();
        assert_eq!(removed, before);
    }

    #[test]
    fn test_checked_firm_value() {
        let debts = vec![debt(dec!(300), dec!(0.04)), debt(dec!(100), dec!(0.08))];
        assert_eq!(
            checked_firm_value(&equity(dec!(600), dec!(0.1)), &debts),
            Some(dec!(1000))
        );

        let huge: Decimal = "50000000000000000000000000000".parse().unwrap();
        assert_eq!(
            checked_firm_value(&equity(huge, dec!(0.1)), &[debt(huge, dec!(0.05))]),
            None
        );
    }

    #[test]
    fn test_inputs_not_mutated() {
        let debts = vec![debt(dec!(10), dec!(0.05)), debt(dec!(20), dec!(0.06))];
        let snapshot = debts.clone();
        let _ = compute_wacc(&equity(dec!(5), dec!(0.1)), &debts, dec!(0.1));
        assert_eq!(debts, snapshot);
    }
}
