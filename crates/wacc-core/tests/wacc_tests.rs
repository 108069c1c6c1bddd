use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use wacc_core::fx::{FxGrowth, FxTable};
use wacc_core::types::Currency;
use wacc_core::wacc::sources::CapitalSource;
use wacc_core::wacc::{self, DebtSource, EquityInput, WaccInput};
use wacc_core::WaccError;

// ===========================================================================
// Engine
// ===========================================================================

#[test]
fn test_engine_reference_example() {
    let equity = EquityInput {
        value: dec!(600),
        cost_of_equity: dec!(0.10),
    };
    let debts = [DebtSource {
        principal: dec!(400),
        rate: dec!(0.05),
    }];
    let result = wacc::compute_wacc(&equity, &debts, dec!(0.30)).unwrap();

    assert_eq!(result.total_debt, dec!(400));
    assert_eq!(result.firm_value, dec!(1000));
    assert_eq!(result.wacc, dec!(0.074));
}

#[test]
fn test_engine_two_sources_any_cost_of_equity() {
    let debts = [
        DebtSource {
            principal: dec!(300),
            rate: dec!(0.04),
        },
        DebtSource {
            principal: dec!(100),
            rate: dec!(0.08),
        },
    ];
    for ke in [dec!(0.05), dec!(0.10), dec!(0.2)] {
        let equity = EquityInput {
            value: dec!(600),
            cost_of_equity: ke,
        };
        let result = wacc::compute_wacc(&equity, &debts, Decimal::ZERO).unwrap();
        assert_eq!(result.weighted_debt_cost, dec!(0.05));
        assert_eq!(result.wacc, dec!(0.6) * ke + dec!(0.4) * dec!(0.05));
    }
}

#[test]
fn test_engine_undefined_for_any_tax_rate() {
    let equity = EquityInput {
        value: Decimal::ZERO,
        cost_of_equity: dec!(0.1),
    };
    for t in [Decimal::ZERO, dec!(0.21), Decimal::ONE] {
        assert!(wacc::compute_wacc(&equity, &[], t).is_none());
    }
}

// ===========================================================================
// Calculator
// ===========================================================================

#[test]
fn test_calculator_matches_engine_for_home_sources() {
    let input = WaccInput {
        home_currency: Currency::USD,
        tax_rate: Decimal::ZERO,
        equity_sources: vec![CapitalSource::home(dec!(600), dec!(0.10))],
        debt_sources: vec![
            CapitalSource::home(dec!(300), dec!(0.04)),
            CapitalSource::home(dec!(100), dec!(0.08)),
        ],
        fx_rates: None,
        fx_growth: None,
    };
    let out = wacc::calculate_wacc(&input).unwrap().result;
    assert_eq!(out.cost_of_debt, dec!(0.05));
    assert_eq!(out.wacc, dec!(0.08));
    assert_eq!(out.debt_sources.len(), 2);
}

#[test]
fn test_multi_currency_capital_structure() {
    // Home GBP; 100,000 JPY debt quoted as 212.77 JPY per GBP
    let jpy_per_gbp = dec!(212.77);
    let gbp_per_jpy = wacc_core::fx::invert_quote(jpy_per_gbp).unwrap();

    let input = WaccInput {
        home_currency: Currency::GBP,
        tax_rate: dec!(0.25),
        equity_sources: vec![CapitalSource::home(dec!(1530), dec!(0.11))],
        debt_sources: vec![CapitalSource {
            label: None,
            currency: Currency::JPY,
            amount: dec!(100000),
            cost: dec!(0.015),
            fx_rate: Some(gbp_per_jpy),
        }],
        fx_rates: None,
        fx_growth: None,
    };
    let out = wacc::calculate_wacc(&input).unwrap().result;

    assert!(
        (out.total_debt - dec!(470)).abs() < dec!(0.05),
        "JPY debt in GBP: expected ~470, got {}",
        out.total_debt
    );
    let weight_sum = out.equity_weight + out.debt_weight;
    assert!((weight_sum - Decimal::ONE).abs() < dec!(0.0000000001));
    // ~0.765 * 0.11 + ~0.235 * 0.015 * 0.75
    assert!(
        (out.wacc - dec!(0.0868)).abs() < dec!(0.001),
        "Expected WACC ~8.68%, got {}",
        out.wacc
    );
}

#[test]
fn test_fx_table_and_growth_from_json() {
    let json = r#"{
        "home_currency": "USD",
        "tax_rate": "0.21",
        "equity_sources": [
            { "amount": "700", "cost": "0.10" }
        ],
        "debt_sources": [
            { "label": "Euro notes", "currency": "EUR", "amount": "200", "cost": "0.04" }
        ],
        "fx_rates": { "rates": { "EUR": "1.10" } },
        "fx_growth": { "annual_rate": "0.10", "horizon_years": 1 }
    }"#;
    let input: WaccInput = serde_json::from_str(json).unwrap();
    let result = wacc::calculate_wacc(&input).unwrap();
    let out = &result.result;

    // 200 EUR * 1.10 * 1.10 = 242 USD
    assert_eq!(out.total_debt, dec!(242));
    assert_eq!(out.debt_sources[0].label, "Euro notes");
    assert_eq!(out.debt_sources[0].spot_fx_rate, Some(dec!(1.10)));
    assert!(result
        .warnings
        .iter()
        .any(|w| w.contains("Euro notes converted using the fx_rates table")));
}

#[test]
fn test_invalid_fx_table_rejected() {
    let input = WaccInput {
        home_currency: Currency::USD,
        tax_rate: dec!(0.2),
        equity_sources: vec![CapitalSource::home(dec!(1), dec!(0.1))],
        debt_sources: vec![],
        fx_rates: Some(FxTable::new().with_rate(&Currency::EUR, dec!(-1))),
        fx_growth: None,
    };
    assert!(matches!(
        wacc::calculate_wacc(&input),
        Err(WaccError::InvalidInput { .. })
    ));
}

#[test]
fn test_invalid_growth_rejected() {
    let input = WaccInput {
        home_currency: Currency::USD,
        tax_rate: dec!(0.2),
        equity_sources: vec![CapitalSource::home(dec!(1), dec!(0.1))],
        debt_sources: vec![],
        fx_rates: None,
        fx_growth: Some(FxGrowth {
            annual_rate: dec!(0.02),
            horizon_years: 40,
        }),
    };
    assert!(wacc::calculate_wacc(&input).is_err());
}

#[test]
fn test_zero_amount_sources_are_undefined() {
    let input = WaccInput {
        home_currency: Currency::USD,
        tax_rate: dec!(0.2),
        equity_sources: vec![CapitalSource::home(Decimal::ZERO, dec!(0.1))],
        debt_sources: vec![CapitalSource::home(Decimal::ZERO, dec!(0.05))],
        fx_rates: None,
        fx_growth: None,
    };
    let err = wacc::calculate_wacc(&input).unwrap_err();
    assert!(matches!(err, WaccError::UndefinedWeights));
    assert!(err.to_string().contains("firm value is zero"));
}

#[test]
fn test_output_serializes_rates_as_strings() {
    let input = WaccInput {
        home_currency: Currency::USD,
        tax_rate: dec!(0.30),
        equity_sources: vec![CapitalSource::home(dec!(600), dec!(0.10))],
        debt_sources: vec![CapitalSource::home(dec!(400), dec!(0.05))],
        fx_rates: None,
        fx_growth: None,
    };
    let result = wacc::calculate_wacc(&input).unwrap();
    let value = serde_json::to_value(&result).unwrap();
    let wacc_str = value["result"]["wacc"].as_str().unwrap();
    assert_eq!(wacc_str.parse::<Decimal>().unwrap(), dec!(0.074));
    assert_eq!(value["result"]["home_currency"], "USD");
    assert_eq!(value["metadata"]["precision"], "rust_decimal_128bit");
}
