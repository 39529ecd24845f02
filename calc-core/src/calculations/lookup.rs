//! Step-function lookups over banded tables.
//!
//! Unlike [`ProgressiveSchedule`](super::ProgressiveSchedule), a lookup selects
//! exactly one band and returns its value unchanged; there is no
//! interpolation between bands. Whether a value equal to a bound belongs to
//! that band or the next one is a property of the table, see [`BoundaryRule`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{RateBand, RateTable};

/// Where a value sitting exactly on a band bound lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryRule {
    /// `x <= bound` selects the band, so the bound belongs to the lower band.
    #[default]
    Inclusive,
    /// `x < bound` selects the band, so the bound belongs to the next band.
    Exclusive,
}

impl BoundaryRule {
    fn admits(
        self,
        value: Decimal,
        bound: Decimal,
    ) -> bool {
        match self {
            Self::Inclusive => value <= bound,
            Self::Exclusive => value < bound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandTable {
    table: RateTable,
    boundary: BoundaryRule,
}

impl BandTable {
    pub fn new(
        table: RateTable,
        boundary: BoundaryRule,
    ) -> Self {
        Self { table, boundary }
    }

    pub fn inclusive(table: RateTable) -> Self {
        Self::new(table, BoundaryRule::Inclusive)
    }

    pub fn exclusive(table: RateTable) -> Self {
        Self::new(table, BoundaryRule::Exclusive)
    }

    pub fn boundary(&self) -> BoundaryRule {
        self.boundary
    }

    pub fn table(&self) -> &RateTable {
        &self.table
    }

    /// Index of the band selected for `value`: the first whose bound admits
    /// it, or the last band when `value` exceeds every bound.
    pub fn band_index(
        &self,
        value: Decimal,
    ) -> usize {
        self.table
            .bands()
            .iter()
            .position(|band| {
                band.upper_bound
                    .is_none_or(|bound| self.boundary.admits(value, bound))
            })
            .unwrap_or(self.table.len() - 1)
    }

    pub fn band_for(
        &self,
        value: Decimal,
    ) -> &RateBand {
        &self.table.bands()[self.band_index(value)]
    }

    /// The amount (or rate) of the band selected for `value`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use calc_core::calculations::BandTable;
    /// use calc_core::{RateBand, RateTable};
    ///
    /// let table = BandTable::inclusive(
    ///     RateTable::new(vec![
    ///         RateBand::bounded(dec!(8), dec!(20)),
    ///         RateBand::bounded(dec!(11.99), dec!(59)),
    ///         RateBand::unbounded(dec!(224)),
    ///     ])
    ///     .unwrap(),
    /// );
    ///
    /// assert_eq!(table.lookup(dec!(10.5)), dec!(59));
    /// ```
    pub fn lookup(
        &self,
        value: Decimal,
    ) -> Decimal {
        self.band_for(value).rate
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn vehicle_table(boundary: BoundaryRule) -> BandTable {
        BandTable::new(
            RateTable::new(vec![
                RateBand::bounded(dec!(8), dec!(20)),
                RateBand::bounded(dec!(11.99), dec!(59)),
                RateBand::bounded(dec!(15.99), dec!(129)),
                RateBand::bounded(dec!(19.99), dec!(159)),
                RateBand::bounded(dec!(999), dec!(224)),
            ])
            .unwrap(),
            boundary,
        )
    }

    #[test]
    fn selects_first_band_covering_value() {
        assert_eq!(vehicle_table(BoundaryRule::Inclusive).lookup(dec!(10.5)), dec!(59));
    }

    #[test]
    fn small_values_use_first_band() {
        assert_eq!(vehicle_table(BoundaryRule::Inclusive).lookup(dec!(0)), dec!(20));
    }

    #[test]
    fn inclusive_bound_belongs_to_lower_band() {
        assert_eq!(vehicle_table(BoundaryRule::Inclusive).lookup(dec!(8)), dec!(20));
    }

    #[test]
    fn exclusive_bound_belongs_to_next_band() {
        assert_eq!(vehicle_table(BoundaryRule::Exclusive).lookup(dec!(8)), dec!(59));
    }

    #[test]
    fn value_beyond_all_bounds_uses_last_band() {
        assert_eq!(vehicle_table(BoundaryRule::Inclusive).lookup(dec!(5000)), dec!(224));
    }

    #[test]
    fn band_index_reports_selected_position() {
        let table = vehicle_table(BoundaryRule::Inclusive);

        assert_eq!(table.band_index(dec!(3)), 0);
        assert_eq!(table.band_index(dec!(16)), 3);
        assert_eq!(table.band_index(dec!(5000)), 4);
    }

    #[test]
    fn result_is_a_step_function() {
        let table = vehicle_table(BoundaryRule::Inclusive);

        assert_eq!(table.lookup(dec!(12)), table.lookup(dec!(15.99)));
    }

    #[test]
    fn unbounded_tail_admits_everything() {
        let table = BandTable::exclusive(
            RateTable::new(vec![
                RateBand::bounded(dec!(100), dec!(0)),
                RateBand::unbounded(dec!(5)),
            ])
            .unwrap(),
        );

        assert_eq!(table.lookup(dec!(100)), dec!(5));
        assert_eq!(table.lookup(dec!(99.99)), dec!(0));
        assert_eq!(table.lookup(dec!(1000000)), dec!(5));
    }
}
