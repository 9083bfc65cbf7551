//! Conversion between major-unit decimals and integer minor units.
//!
//! Minor units have a fixed scale of 1000. Amounts with more than three
//! decimal places are rounded half-to-even before conversion, so the same
//! source amount always maps to the same minor value.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Minor units per major unit.
pub const MINOR_SCALE: i64 = 1000;

/// Decimal places carried by minor units.
pub const MINOR_DECIMALS: u32 = 3;

/// Round to minor-unit precision, half to even.
pub fn quantize(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MINOR_DECIMALS, RoundingStrategy::MidpointNearestEven)
}

/// Major units to minor units; `None` when the result does not fit in `i64`.
pub fn to_minor(amount: Decimal) -> Option<i64> {
    quantize(amount)
        .checked_mul(Decimal::from(MINOR_SCALE))?
        .to_i64()
}

/// Minor units to major units, exactly.
pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, MINOR_DECIMALS)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[rstest]
    #[case("1000.00", 1_000_000)]
    #[case("950", 950_000)]
    #[case("0.01", 10)]
    #[case("-12.34", -12_340)]
    #[case("1234.5678", 1_234_568)]
    #[case("0.0005", 0)]
    #[case("0.0015", 2)]
    #[case("-0.0025", -2)]
    fn converts_with_half_even_rounding(#[case] major: &str, #[case] minor: i64) {
        assert_eq!(to_minor(dec(major)), Some(minor));
    }

    #[test]
    fn two_decimal_amounts_round_trip_exactly() {
        for cents in [-99_999i64, -1, 0, 1, 5, 99, 12_345_678] {
            let major = Decimal::new(cents, 2);
            let minor = to_minor(major).unwrap();
            assert_eq!(minor, cents * 10);
            assert_eq!(from_minor(minor), major);
        }
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(to_minor(Decimal::MAX), None);
    }
}
