//! Progressive (marginal) bracket taxation.
//!
//! The taxable base is consumed bracket by bracket starting from zero; each
//! slice is taxed at its own bracket's rate:
//!
//! | Bracket | Width                 | Tax on slice                       |
//! |---------|-----------------------|------------------------------------|
//! | 1       | `t1 - 0`              | `min(B, t1) × r1`                  |
//! | 2       | `t2 - t1`             | `min(B - t1, t2 - t1) × r2`        |
//! | n       | unbounded             | `(B - t(n-1)) × rn`                |
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use calc_core::calculations::ProgressiveSchedule;
//! use calc_core::{RateBand, RateTable};
//!
//! let table = RateTable::new(vec![
//!     RateBand::bounded(dec!(28000), dec!(0.23)),
//!     RateBand::bounded(dec!(50000), dec!(0.35)),
//!     RateBand::unbounded(dec!(0.43)),
//! ])
//! .unwrap();
//!
//! let schedule = ProgressiveSchedule::new(table);
//! assert_eq!(schedule.tax(dec!(40000)), dec!(10640.00));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{non_negative, round_half_up};
use crate::models::RateTable;

/// The part of a taxable base that fell inside one bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketSlice {
    pub lower: Decimal,
    pub upper: Option<Decimal>,
    pub rate: Decimal,
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressiveSchedule {
    table: RateTable,
}

impl ProgressiveSchedule {
    pub fn new(table: RateTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    /// Total tax on `base`, rounded half-up to cents.
    ///
    /// A negative base is taxed as zero.
    pub fn tax(
        &self,
        base: Decimal,
    ) -> Decimal {
        let total: Decimal = self.breakdown(base).iter().map(|s| s.tax).sum();
        round_half_up(total)
    }

    /// Per-bracket slices of `base`, stopping at the first empty bracket.
    ///
    /// Slice taxes are not rounded so that their sum equals the exact total.
    pub fn breakdown(
        &self,
        base: Decimal,
    ) -> Vec<BracketSlice> {
        let mut remaining = non_negative(base);
        let mut lower = Decimal::ZERO;
        let mut slices = Vec::new();

        for band in self.table.bands() {
            if remaining <= Decimal::ZERO {
                break;
            }
            let taxed_amount = match band.upper_bound {
                Some(upper) => remaining.min(non_negative(upper - lower)),
                None => remaining,
            };
            slices.push(BracketSlice {
                lower,
                upper: band.upper_bound,
                rate: band.rate,
                taxed_amount,
                tax: taxed_amount * band.rate,
            });
            remaining -= taxed_amount;
            if let Some(upper) = band.upper_bound {
                lower = lower.max(upper);
            }
        }

        slices
    }

    /// Rate applied to the last unit of `base`.
    ///
    /// A bracket's upper bound belongs to that bracket.
    pub fn marginal_rate(
        &self,
        base: Decimal,
    ) -> Decimal {
        let base = non_negative(base);
        self.table
            .bands()
            .iter()
            .find(|band| band.upper_bound.is_none_or(|upper| base <= upper))
            .unwrap_or_else(|| self.table.last())
            .rate
    }

    /// Tax divided by base; zero for a zero base.
    pub fn effective_rate(
        &self,
        base: Decimal,
    ) -> Decimal {
        let base = non_negative(base);
        if base.is_zero() {
            return Decimal::ZERO;
        }
        self.tax(base) / base
    }
}
