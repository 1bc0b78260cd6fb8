//! Property tests for rate normalization and conversion.
//!
//! Rate tables are generated relative to an arbitrary anchor; every property
//! must hold regardless of which codes are present or which base is shown.

use haremfx::{
    ConversionResult, CurrencyCode, RateError, RawRateTable, convert, convert_amount,
    convert_raw, normalize,
};
use proptest::prelude::*;

const CODES: [&str; 6] = ["USD", "EUR", "GBP", "CHF", "JPY", "TRY"];

fn code(s: &str) -> CurrencyCode {
    s.parse().unwrap()
}

fn all_codes() -> Vec<CurrencyCode> {
    CODES.iter().map(|s| code(s)).collect()
}

fn relative_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

// =============================================================================
// Generators
// =============================================================================

fn arb_rate() -> impl Strategy<Value = f64> {
    1e-3f64..1e4
}

/// A full table with one rate per displayed code.
fn arb_table() -> impl Strategy<Value = RawRateTable> {
    proptest::collection::vec(arb_rate(), CODES.len()).prop_map(|rates| {
        RawRateTable::new(all_codes().into_iter().zip(rates), Some(1_700_000_000))
    })
}

fn arb_code() -> impl Strategy<Value = CurrencyCode> {
    proptest::sample::select(CODES.to_vec()).prop_map(code)
}

fn arb_amount() -> impl Strategy<Value = f64> {
    -1e6f64..1e6
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn round_trip_returns_to_one(raw in arb_table(), base in arb_code(), x in arb_code(), y in arb_code()) {
        let table = normalize(&raw, &base, &all_codes());
        let there = convert_amount(&table, &x, &y, 1.0).unwrap();
        let back = convert_amount(&table, &y, &x, there).unwrap();
        prop_assert!(relative_eq(back, 1.0), "{} -> {} -> {} = {}", x, y, x, back);
    }

    #[test]
    fn identity_ignores_the_table(raw in arb_table(), base in arb_code(), x in arb_code(), amount in arb_amount()) {
        let table = normalize(&raw, &base, &all_codes());
        prop_assert_eq!(convert_amount(&table, &x, &x, amount).unwrap(), amount);

        let empty = haremfx::NormalizedRateTable::empty(base.clone());
        prop_assert_eq!(convert_amount(&empty, &x, &x, amount).unwrap(), amount);
        prop_assert_eq!(convert_raw(&RawRateTable::default(), &x, &x, amount).unwrap(), amount);
    }

    #[test]
    fn conversions_do_not_depend_on_base(
        raw in arb_table(),
        b1 in arb_code(),
        b2 in arb_code(),
        x in arb_code(),
        y in arb_code(),
        amount in arb_amount(),
    ) {
        let first = convert_amount(&normalize(&raw, &b1, &all_codes()), &x, &y, amount).unwrap();
        let second = convert_amount(&normalize(&raw, &b2, &all_codes()), &x, &y, amount).unwrap();
        let direct = convert_raw(&raw, &x, &y, amount).unwrap();
        prop_assert!(relative_eq(first, second));
        prop_assert!(relative_eq(first, direct));
    }

    #[test]
    fn missing_code_is_isolated(raw in arb_table(), missing in arb_code(), x in arb_code(), y in arb_code()) {
        let codes: Vec<CurrencyCode> = all_codes().into_iter().filter(|c| *c != missing).collect();
        let base = codes[0].clone();
        let partial = RawRateTable::new(
            codes.iter().map(|c| (c.clone(), raw.get(c).unwrap())),
            None,
        );
        let table = normalize(&partial, &base, &all_codes());

        prop_assert_eq!(table.get(&missing), Err(RateError::DataUnavailable(missing.clone())));
        if x != missing && y != missing {
            prop_assert!(convert(&table, &x, &y, "1").is_available());
        } else if x != y {
            prop_assert!(!convert(&table, &x, &y, "1").is_available());
        }
    }

    #[test]
    fn garbage_amounts_are_unavailable(raw in arb_table(), x in arb_code(), y in arb_code(), input in "[a-zA-Z ]{0,8}") {
        let table = normalize(&raw, &x, &all_codes());
        let result = convert(&table, &x, &y, &input);
        prop_assert_eq!(result, ConversionResult::Unavailable(RateError::ParseError(input.clone())));
    }
}

// =============================================================================
// Worked examples
// =============================================================================

fn example_table() -> RawRateTable {
    RawRateTable::new(
        vec![(code("USD"), 1.0), (code("EUR"), 0.9), (code("TRY"), 30.0)],
        None,
    )
}

#[test]
fn ten_euro_in_dollars() {
    let table = normalize(&example_table(), &code("TRY"), &all_codes());
    let value = convert(&table, &code("EUR"), &code("USD"), "10").amount().unwrap();
    assert!(relative_eq(value, 10.0 * (1.0 / 0.9)));
    assert!((value - 11.111).abs() < 1e-3);

    let direct = convert_raw(&example_table(), &code("EUR"), &code("USD"), 10.0).unwrap();
    assert!(relative_eq(direct, value));
}

#[test]
fn one_dollar_in_lira() {
    let table = normalize(&example_table(), &code("TRY"), &all_codes());
    assert_eq!(table.get(&code("USD")).unwrap(), 30.0);
}

#[test]
fn empty_and_nan_inputs() {
    let table = normalize(&example_table(), &code("TRY"), &all_codes());
    for input in ["", "abc", "NaN", "inf", "1.2.3"] {
        let result = convert(&table, &code("USD"), &code("EUR"), input);
        assert_eq!(
            result,
            ConversionResult::Unavailable(RateError::ParseError(input.to_string()))
        );
    }
}
