//! Rounding shared by premium display paths.

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero, which is how premium
/// amounts are shown to payers.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use premium_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(2501.625)), dec!(2501.63));
/// assert_eq!(round_half_up(dec!(357.375)), dec!(357.38));
/// assert_eq!(round_half_up(dec!(714.754)), dec!(714.75));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}
