//! Reduced penalty and legal interest for a tax paid late.
//!
//! The penalty rate is looked up from the number of days late (inclusive
//! bounds). The first band holds a per-day rate that is multiplied by the
//! days late; every later band holds a flat rate:
//!
//! | Days late | Penalty rate            |
//! |-----------|-------------------------|
//! | ≤ 14      | 0.083% per day          |
//! | ≤ 30      | 1.25%                   |
//! | ≤ 90      | 1.39%                   |
//! | ≤ 365     | 3.125%                  |
//! | ≤ 730     | 3.57%                   |
//! | > 730     | 4.17%                   |
//!
//! A replacement table keeps the same reading: its first band is per-day
//! whatever its bound, so a table with a single unbounded band grows the
//! penalty with every day late and never caps it.
//!
//! Interest is simple: `tax × legal_rate × days / 365`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::{Calculator, CatalogError, Chart, ChartKind, spec};
use crate::calculations::BandTable;
use crate::calculations::common::{non_negative, percent_to_fraction, round_half_up};
use crate::models::{
    DerivedOutputs, FieldDescriptor, FieldUnit, InputSpec, InputState, OutputDescriptor,
    OutputSpec, OutputUnit, RateBand, RateTable, RateTableError,
};

const DAYS_PER_YEAR: Decimal = dec!(365);
const PER_DAY_BAND: usize = 0;

pub struct LatePaymentPenalty {
    penalties: BandTable,
    inputs: InputSpec,
    outputs: OutputSpec,
}

impl LatePaymentPenalty {
    pub const SLUG: &'static str = "late-payment-penalty";

    pub fn default_table() -> Result<RateTable, RateTableError> {
        RateTable::new(vec![
            RateBand::bounded(dec!(14), dec!(0.00083)),
            RateBand::bounded(dec!(30), dec!(0.0125)),
            RateBand::bounded(dec!(90), dec!(0.0139)),
            RateBand::bounded(dec!(365), dec!(0.03125)),
            RateBand::bounded(dec!(730), dec!(0.0357)),
            RateBand::unbounded(dec!(0.0417)),
        ])
    }

    pub fn new(table: RateTable) -> Result<Self, CatalogError> {
        let inputs = spec(
            Self::SLUG,
            vec![
                FieldDescriptor::number("tax_due", "Tax due", dec!(1000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(100000000))
                    .step(dec!(100)),
                FieldDescriptor::date("due_date", "Due date", "2024-06-17"),
                FieldDescriptor::date("payment_date", "Payment date", "2024-07-07"),
                FieldDescriptor::number("legal_interest_rate", "Legal interest rate", dec!(2.5))
                    .unit(FieldUnit::Percent)
                    .range(dec!(0), dec!(20))
                    .step(dec!(0.1)),
            ],
        )?;

        let outputs = OutputSpec::new(vec![
            OutputDescriptor::new("days_late", "Days late", OutputUnit::Count),
            OutputDescriptor::new("penalty_rate", "Penalty rate", OutputUnit::Percent),
            OutputDescriptor::new("penalty", "Penalty", OutputUnit::Currency),
            OutputDescriptor::new("interest", "Interest", OutputUnit::Currency),
            OutputDescriptor::new("total_due", "Total to pay", OutputUnit::Currency),
        ]);

        Ok(Self {
            penalties: BandTable::inclusive(table),
            inputs,
            outputs,
        })
    }

    /// Whole days from `due` to `paid`; zero when paid on time.
    pub fn days_late(
        due: NaiveDate,
        paid: NaiveDate,
    ) -> i64 {
        (paid - due).num_days().max(0)
    }

    /// Effective penalty rate for `days` late.
    pub fn penalty_rate(
        &self,
        days: i64,
    ) -> Decimal {
        let days = Decimal::from(days.max(0));
        let index = self.penalties.band_index(days);
        let rate = self.penalties.table().bands()[index].rate;
        if index == PER_DAY_BAND {
            rate * days
        } else {
            rate
        }
    }
}

impl Calculator for LatePaymentPenalty {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn title(&self) -> &'static str {
        "Late payment penalty"
    }

    fn input_spec(&self) -> &InputSpec {
        &self.inputs
    }

    fn output_spec(&self) -> &OutputSpec {
        &self.outputs
    }

    fn compute(
        &self,
        inputs: &InputState,
    ) -> DerivedOutputs {
        let days = match (inputs.date("due_date"), inputs.date("payment_date")) {
            (Some(due), Some(paid)) => Self::days_late(due, paid),
            _ => {
                warn!(slug = Self::SLUG, "missing date, treating payment as on time");
                0
            }
        };
        debug!(slug = Self::SLUG, days, "computing late payment penalty");

        let tax = non_negative(inputs.number("tax_due"));
        let rate = self.penalty_rate(days);
        let penalty = round_half_up(tax * rate);
        let interest = round_half_up(
            tax * percent_to_fraction(inputs.number("legal_interest_rate")) * Decimal::from(days)
                / DAYS_PER_YEAR,
        );

        DerivedOutputs::new()
            .with("days_late", Decimal::from(days))
            .with("penalty_rate", rate)
            .with("penalty", penalty)
            .with("interest", interest)
            .with("total_due", round_half_up(tax) + penalty + interest)
    }

    fn chart(
        &self,
        inputs: &InputState,
        outputs: &DerivedOutputs,
    ) -> Chart {
        Chart::new(ChartKind::Pie, "Amount to pay", OutputUnit::Currency)
            .row("Tax", round_half_up(inputs.number("tax_due")))
            .row("Penalty", outputs.number("penalty"))
            .row("Interest", outputs.number("interest"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn calculator() -> LatePaymentPenalty {
        LatePaymentPenalty::new(LatePaymentPenalty::default_table().unwrap()).unwrap()
    }

    fn compute(edits: &[(&str, &str)]) -> DerivedOutputs {
        let calc = calculator();
        let mut state = calc.default_inputs();
        for (id, raw) in edits {
            state.set_raw(calc.input_spec(), id, raw).unwrap();
        }
        calc.compute(&state)
    }

    #[test]
    fn twenty_days_late() {
        let outputs = compute(&[]);

        assert_eq!(outputs.number("days_late"), dec!(20));
        assert_eq!(outputs.number("penalty_rate"), dec!(0.0125));
        assert_eq!(outputs.number("penalty"), dec!(12.50));
        // 1000 × 0.025 × 20 / 365
        assert_eq!(outputs.number("interest"), dec!(1.37));
        assert_eq!(outputs.number("total_due"), dec!(1013.87));
    }

    #[test]
    fn first_two_weeks_accrue_per_day() {
        let outputs = compute(&[("payment_date", "2024-06-27")]);

        assert_eq!(outputs.number("days_late"), dec!(10));
        assert_eq!(outputs.number("penalty_rate"), dec!(0.0083));
        assert_eq!(outputs.number("penalty"), dec!(8.30));
    }

    #[test]
    fn band_bounds_are_inclusive() {
        let calc = calculator();

        assert_eq!(calc.penalty_rate(14), dec!(0.01162));
        assert_eq!(calc.penalty_rate(15), dec!(0.0125));
        assert_eq!(calc.penalty_rate(30), dec!(0.0125));
        assert_eq!(calc.penalty_rate(31), dec!(0.0139));
        assert_eq!(calc.penalty_rate(1000), dec!(0.0417));
    }

    #[test]
    fn replacement_table_first_band_is_per_day() {
        let calc = LatePaymentPenalty::new(
            RateTable::new(vec![
                RateBand::bounded(dec!(10), dec!(0.001)),
                RateBand::unbounded(dec!(0.05)),
            ])
            .unwrap(),
        )
        .unwrap();

        assert_eq!(calc.penalty_rate(5), dec!(0.005));
        assert_eq!(calc.penalty_rate(10), dec!(0.010));
        assert_eq!(calc.penalty_rate(11), dec!(0.05));
    }

    #[test]
    fn single_unbounded_band_is_per_day_without_cap() {
        let calc = LatePaymentPenalty::new(
            RateTable::new(vec![RateBand::unbounded(dec!(0.001))]).unwrap(),
        )
        .unwrap();
        let mut state = calc.default_inputs();
        state
            .set_raw(calc.input_spec(), "payment_date", "2027-03-14")
            .unwrap();

        let outputs = calc.compute(&state);

        // 2024-06-17 to 2027-03-14
        assert_eq!(outputs.number("days_late"), dec!(1000));
        assert_eq!(outputs.number("penalty_rate"), dec!(1.000));
        assert_eq!(outputs.number("penalty"), dec!(1000.00));
    }

    #[test]
    fn payment_on_time_owes_nothing_extra() {
        let outputs = compute(&[("payment_date", "2024-06-01")]);

        assert_eq!(outputs.number("days_late"), dec!(0));
        assert_eq!(outputs.number("penalty"), dec!(0));
        assert_eq!(outputs.number("interest"), dec!(0));
        assert_eq!(outputs.number("total_due"), dec!(1000.00));
    }

    #[test]
    fn invalid_date_keeps_default() {
        let outputs = compute(&[("payment_date", "next tuesday")]);

        assert_eq!(outputs.number("days_late"), dec!(20));
    }
}
