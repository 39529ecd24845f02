//! Flat (substitute) rate taxation over a presumptive base.
//!
//! Gross revenue is scaled by a profitability coefficient to derive income
//! without itemised expenses, deductible contributions are subtracted, and a
//! single rate is applied to what remains:
//!
//! ```text
//! gross_income = revenue × coefficient
//! taxable      = max(0, gross_income − contributions)
//! tax          = taxable × rate
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_half_up};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRateInput {
    pub revenue: Decimal,
    /// Share of revenue presumed to be profit, in `(0, 1]`.
    pub coefficient: Decimal,
    pub contributions: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRateResult {
    pub gross_income: Decimal,
    pub taxable: Decimal,
    pub tax: Decimal,
    /// Revenue left after contributions and tax.
    pub net_income: Decimal,
}

/// Computes the flat-rate liability.
///
/// Negative revenue and contributions are treated as zero and a coefficient
/// outside `(0, 1]` is clamped into that range.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use calc_core::calculations::{FlatRateInput, flat_rate};
///
/// let result = flat_rate(&FlatRateInput {
///     revenue: dec!(30000),
///     coefficient: dec!(0.78),
///     contributions: dec!(3000),
///     rate: dec!(0.05),
/// });
///
/// assert_eq!(result.taxable, dec!(20400.00));
/// assert_eq!(result.tax, dec!(1020.00));
/// ```
pub fn flat_rate(input: &FlatRateInput) -> FlatRateResult {
    let revenue = non_negative(input.revenue);
    let contributions = non_negative(input.contributions);
    let coefficient = input.coefficient.clamp(Decimal::ZERO, Decimal::ONE);

    let gross_income = round_half_up(revenue * coefficient);
    let taxable = non_negative(round_half_up(gross_income - contributions));
    let tax = round_half_up(taxable * non_negative(input.rate));
    let net_income = round_half_up(revenue - contributions - tax);

    FlatRateResult {
        gross_income,
        taxable,
        tax,
        net_income,
    }
}
