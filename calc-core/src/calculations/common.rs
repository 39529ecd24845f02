//! Shared arithmetic helpers for the calculation engine.
//!
//! Everything here operates on [`Decimal`] so that money never passes through
//! binary floating point. Powers and roots are computed iteratively because
//! `rust_decimal` has no exact transcendental functions.

use rust_decimal::{Decimal, RoundingStrategy};

/// Iterations used by [`newton_sqrt`]. Converges well past 20 significant
/// digits for any value representable as a rate ratio.
const NEWTON_SQRT_ITERATIONS: usize = 40;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use calc_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the larger of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Clamps a value at zero. Used wherever a taxable base or net figure must
/// never go negative.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// Converts a percentage expressed in points (e.g. `22`) into a fraction
/// (`0.22`).
pub fn percent_to_fraction(points: Decimal) -> Decimal {
    points / Decimal::ONE_HUNDRED
}

/// Computes `(1 + rate)^periods` by repeated multiplication.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use calc_core::calculations::common::compound_factor;
///
/// assert_eq!(compound_factor(dec!(0.10), 2), dec!(1.21));
/// assert_eq!(compound_factor(dec!(0.10), 0), dec!(1));
/// ```
pub fn compound_factor(
    rate: Decimal,
    periods: u32,
) -> Decimal {
    let factor = Decimal::ONE + rate;
    let mut result = Decimal::ONE;
    for _ in 0..periods {
        result *= factor;
    }
    result
}

/// Square root by Newton's method.
///
/// Negative input yields zero; callers only take roots of price ratios, which
/// are positive by construction.
pub fn newton_sqrt(value: Decimal) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if value == Decimal::ONE {
        return Decimal::ONE;
    }

    let mut guess = if value > Decimal::ONE {
        value / Decimal::TWO
    } else {
        value
    };

    for _ in 0..NEWTON_SQRT_ITERATIONS {
        let next = (guess + value / guess) / Decimal::TWO;
        if next == guess {
            break;
        }
        guess = next;
    }

    guess
}
