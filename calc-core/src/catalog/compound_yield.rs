//! Compound yield of a deposit or staking position with periodic
//! contributions and an annual management fee.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use tracing::debug;

use super::{Calculator, CatalogError, Chart, ChartKind, spec};
use crate::calculations::common::percent_to_fraction;
use crate::calculations::{CompoundingInput, apy_from_apr, project};
use crate::models::{
    DerivedOutputs, FieldDescriptor, FieldUnit, InputSpec, InputState, OutputDescriptor,
    OutputSpec, OutputUnit, SelectOption,
};

const DEFAULT_PERIODS_PER_YEAR: u32 = 365;

pub struct CompoundYield {
    inputs: InputSpec,
    outputs: OutputSpec,
}

impl CompoundYield {
    pub const SLUG: &'static str = "compound-yield";

    pub fn new() -> Result<Self, CatalogError> {
        let frequencies = vec![
            SelectOption::new(dec!(1), "Annually"),
            SelectOption::new(dec!(4), "Quarterly"),
            SelectOption::new(dec!(12), "Monthly"),
            SelectOption::new(dec!(52), "Weekly"),
            SelectOption::new(dec!(365), "Daily"),
        ];

        let inputs = spec(
            Self::SLUG,
            vec![
                FieldDescriptor::number("principal", "Initial deposit", dec!(1000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(1000000000))
                    .step(dec!(100)),
                FieldDescriptor::number("apr", "Nominal annual rate (APR)", dec!(20))
                    .unit(FieldUnit::Percent)
                    .range(dec!(0), dec!(50))
                    .step(dec!(0.1)),
                FieldDescriptor::select(
                    "compounding",
                    "Compounding frequency",
                    frequencies,
                    Decimal::from(DEFAULT_PERIODS_PER_YEAR),
                )
                .unit(FieldUnit::Count),
                FieldDescriptor::number("years", "Horizon", dec!(1))
                    .unit(FieldUnit::Years)
                    .range(dec!(0), dec!(50))
                    .step(dec!(0.5)),
                FieldDescriptor::number("contribution", "Contribution per period", dec!(0))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(1000000))
                    .step(dec!(10)),
                FieldDescriptor::number("annual_fee", "Annual fee", dec!(0))
                    .unit(FieldUnit::Percent)
                    .range(dec!(0), dec!(10))
                    .step(dec!(0.05)),
            ],
        )?;

        let outputs = OutputSpec::new(vec![
            OutputDescriptor::new("apy", "Effective annual yield (APY)", OutputUnit::Percent),
            OutputDescriptor::new("final_balance", "Final balance", OutputUnit::Currency),
            OutputDescriptor::new("total_contributed", "Total contributions", OutputUnit::Currency),
            OutputDescriptor::new("total_interest", "Interest earned", OutputUnit::Currency),
            OutputDescriptor::new("total_fees", "Fees paid", OutputUnit::Currency),
        ]);

        Ok(Self { inputs, outputs })
    }

    fn compounding_input(inputs: &InputState) -> CompoundingInput {
        CompoundingInput {
            principal: inputs.number("principal"),
            annual_rate: percent_to_fraction(inputs.number("apr")),
            periods_per_year: inputs
                .number("compounding")
                .to_u32()
                .unwrap_or(DEFAULT_PERIODS_PER_YEAR),
            years: inputs.number("years"),
            contribution: inputs.number("contribution"),
            annual_fee_rate: percent_to_fraction(inputs.number("annual_fee")),
        }
    }
}

impl Calculator for CompoundYield {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn title(&self) -> &'static str {
        "Compound yield"
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
        let input = Self::compounding_input(inputs);
        debug!(
            slug = Self::SLUG,
            n = input.periods_per_year,
            years = %input.years,
            "projecting compound growth"
        );

        let projection = project(&input);
        let apy = apy_from_apr(input.annual_rate, input.periods_per_year);

        DerivedOutputs::new()
            .with("apy", apy.round_dp(6))
            .with("final_balance", projection.final_balance)
            .with("total_contributed", projection.total_contributed)
            .with("total_interest", projection.total_interest)
            .with("total_fees", projection.total_fees)
    }

    fn chart(
        &self,
        inputs: &InputState,
        _outputs: &DerivedOutputs,
    ) -> Chart {
        let projection = project(&Self::compounding_input(inputs));
        let n = Decimal::from(projection.periods_per_year);

        projection.yearly().into_iter().fold(
            Chart::new(ChartKind::Line, "Balance over time", OutputUnit::Currency),
            |chart, point| {
                let year = (Decimal::from(point.period) / n).round_dp(2).normalize();
                chart.row(format!("Year {year}"), point.balance)
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn state(edits: &[(&str, &str)]) -> (CompoundYield, InputState) {
        let calc = CompoundYield::new().unwrap();
        let mut state = calc.default_inputs();
        for (id, raw) in edits {
            state.set_raw(calc.input_spec(), id, raw).unwrap();
        }
        (calc, state)
    }

    #[test]
    fn daily_compounding_at_twenty_percent() {
        let (calc, inputs) = state(&[]);
        let outputs = calc.compute(&inputs);

        assert_eq!(outputs.number("final_balance"), dec!(1221.34));
        assert_eq!(outputs.number("apy").round_dp(4), dec!(0.2213));
        assert_eq!(outputs.number("total_interest"), dec!(221.34));
    }

    #[test]
    fn annual_compounding_matches_simple_growth() {
        let (calc, inputs) = state(&[("compounding", "1"), ("years", "2")]);
        let outputs = calc.compute(&inputs);

        assert_eq!(outputs.number("final_balance"), dec!(1440.00));
        assert_eq!(outputs.number("apy"), dec!(0.2));
    }

    #[test]
    fn unsupported_frequency_keeps_daily_default() {
        let (calc, inputs) = state(&[("compounding", "7")]);

        assert_eq!(inputs.number("compounding"), dec!(365));
        assert_eq!(calc.compute(&inputs).number("final_balance"), dec!(1221.34));
    }

    #[test]
    fn rate_above_range_is_clamped() {
        let (_, inputs) = state(&[("apr", "900")]);

        assert_eq!(inputs.number("apr"), dec!(50));
    }

    #[test]
    fn fees_reduce_final_balance() {
        let (calc, inputs) = state(&[("compounding", "1"), ("annual_fee", "1")]);
        let outputs = calc.compute(&inputs);

        // 1200 grown, 12 fee
        assert_eq!(outputs.number("total_fees"), dec!(12.00));
        assert_eq!(outputs.number("final_balance"), dec!(1188.00));
    }

    #[test]
    fn chart_samples_each_year() {
        let (calc, inputs) = state(&[("compounding", "12"), ("years", "2.5")]);
        let chart = calc.chart(&inputs, &calc.compute(&inputs));

        let labels: Vec<_> = chart.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["Year 0", "Year 1", "Year 2", "Year 2.5"]);
        assert_eq!(chart.kind, ChartKind::Line);
    }
}
