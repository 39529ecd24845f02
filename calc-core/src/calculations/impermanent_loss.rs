//! Impermanent loss of a two-asset, constant-product liquidity position.
//!
//! With `k` the ratio between the relative price moves of the two assets,
//! the value of the pooled position compared with simply holding both is
//!
//! ```text
//! IL = 2√k / (1 + k) − 1
//! ```
//!
//! `IL` is zero when both prices move together and negative otherwise.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{newton_sqrt, non_negative, round_half_up};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpermanentLossResult {
    pub price_ratio: Decimal,
    /// Negative fraction; `-0.0011` is a loss of 0.11%.
    pub loss_fraction: Decimal,
    /// Value had the deposit been held outside the pool.
    pub hold_value: Decimal,
    pub pool_value: Decimal,
    pub loss_amount: Decimal,
}

/// Ratio of the two assets' relative price moves, given as fractions
/// (`0.10` for +10%).
///
/// Returns `None` when asset B's price falls to zero or below, where the
/// ratio is undefined. A wiped-out asset A yields a ratio of zero.
pub fn price_ratio(
    change_a: Decimal,
    change_b: Decimal,
) -> Option<Decimal> {
    let relative_a = non_negative(Decimal::ONE + change_a);
    let relative_b = Decimal::ONE + change_b;
    if relative_b <= Decimal::ZERO {
        return None;
    }
    Some(relative_a / relative_b)
}

/// `2√k / (1 + k) − 1`, unrounded.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use calc_core::calculations::impermanent_loss;
///
/// assert_eq!(impermanent_loss(dec!(4)), dec!(-0.2));
/// assert_eq!(impermanent_loss(dec!(1)), dec!(0));
/// ```
pub fn impermanent_loss(k: Decimal) -> Decimal {
    let k = non_negative(k);
    Decimal::TWO * newton_sqrt(k) / (Decimal::ONE + k) - Decimal::ONE
}

/// Loss on a deposit split evenly between the two assets.
///
/// Returns `None` under the same condition as [`price_ratio`].
pub fn position_loss(
    deposit: Decimal,
    change_a: Decimal,
    change_b: Decimal,
) -> Option<ImpermanentLossResult> {
    let k = price_ratio(change_a, change_b)?;
    let loss_fraction = impermanent_loss(k);

    let half = non_negative(deposit) / Decimal::TWO;
    let hold = half * non_negative(Decimal::ONE + change_a) + half * (Decimal::ONE + change_b);
    let pool = hold * (Decimal::ONE + loss_fraction);

    Some(ImpermanentLossResult {
        price_ratio: k,
        loss_fraction,
        hold_value: round_half_up(hold),
        pool_value: round_half_up(pool),
        loss_amount: round_half_up(hold - pool),
    })
}
