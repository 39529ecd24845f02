//! Flat-rate regime for sole traders: revenue scaled by a profitability
//! coefficient, minus contributions, taxed at 5% (startup) or 15%.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::{Calculator, CatalogError, Chart, ChartKind, spec};
use crate::calculations::common::percent_to_fraction;
use crate::calculations::{FlatRateInput, flat_rate};
use crate::models::{
    DerivedOutputs, FieldDescriptor, FieldUnit, InputSpec, InputState, OutputDescriptor,
    OutputSpec, OutputUnit, SelectOption,
};

const STARTUP_RATE: Decimal = dec!(0.05);
const STANDARD_RATE: Decimal = dec!(0.15);

pub struct FlatRateRegime {
    inputs: InputSpec,
    outputs: OutputSpec,
}

impl FlatRateRegime {
    pub const SLUG: &'static str = "flat-rate-regime";

    pub fn new() -> Result<Self, CatalogError> {
        let coefficients: Vec<SelectOption> = [
            (dec!(40), "40% - retail and wholesale trade"),
            (dec!(54), "54% - street trading of food"),
            (dec!(62), "62% - intermediaries and other activities"),
            (dec!(67), "67% - other economic activities"),
            (dec!(78), "78% - professional services"),
            (dec!(86), "86% - construction and real estate"),
        ]
        .into_iter()
        .map(|(value, label)| SelectOption::new(value, label))
        .collect();

        let inputs = spec(
            Self::SLUG,
            vec![
                FieldDescriptor::number("revenue", "Annual revenue", dec!(30000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(85000))
                    .step(dec!(500)),
                FieldDescriptor::select(
                    "coefficient",
                    "Profitability coefficient",
                    coefficients,
                    dec!(78),
                )
                .unit(FieldUnit::Percent),
                FieldDescriptor::number("contributions", "Social security contributions", dec!(3000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(85000))
                    .step(dec!(100)),
                FieldDescriptor::boolean("startup", "First five years of activity", true),
            ],
        )?;

        let outputs = OutputSpec::new(vec![
            OutputDescriptor::new("gross_income", "Presumed income", OutputUnit::Currency),
            OutputDescriptor::new("taxable_income", "Taxable income", OutputUnit::Currency),
            OutputDescriptor::new("applied_rate", "Substitute rate", OutputUnit::Percent),
            OutputDescriptor::new("tax", "Substitute tax", OutputUnit::Currency),
            OutputDescriptor::new("net_income", "Net income", OutputUnit::Currency),
        ]);

        Ok(Self { inputs, outputs })
    }
}

impl Calculator for FlatRateRegime {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn title(&self) -> &'static str {
        "Flat-rate regime"
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
        let rate = if inputs.flag("startup") {
            STARTUP_RATE
        } else {
            STANDARD_RATE
        };
        debug!(slug = Self::SLUG, %rate, "computing flat-rate tax");

        let result = flat_rate(&FlatRateInput {
            revenue: inputs.number("revenue"),
            coefficient: percent_to_fraction(inputs.number("coefficient")),
            contributions: inputs.number("contributions"),
            rate,
        });

        DerivedOutputs::new()
            .with("gross_income", result.gross_income)
            .with("taxable_income", result.taxable)
            .with("applied_rate", rate)
            .with("tax", result.tax)
            .with("net_income", result.net_income)
    }

    fn chart(
        &self,
        inputs: &InputState,
        outputs: &DerivedOutputs,
    ) -> Chart {
        Chart::new(ChartKind::Pie, "Where revenue goes", OutputUnit::Currency)
            .row("Contributions", inputs.number("contributions"))
            .row("Substitute tax", outputs.number("tax"))
            .row("Net income", outputs.number("net_income"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn compute(edits: &[(&str, &str)]) -> DerivedOutputs {
        let calc = FlatRateRegime::new().unwrap();
        let mut state = calc.default_inputs();
        for (id, raw) in edits {
            state.set_raw(calc.input_spec(), id, raw).unwrap();
        }
        calc.compute(&state)
    }

    #[test]
    fn defaults_use_startup_rate() {
        let outputs = compute(&[]);

        assert_eq!(outputs.number("taxable_income"), dec!(20400.00));
        assert_eq!(outputs.number("applied_rate"), dec!(0.05));
        assert_eq!(outputs.number("tax"), dec!(1020.00));
    }

    #[test]
    fn standard_rate_when_not_startup() {
        let outputs = compute(&[("startup", "no")]);

        assert_eq!(outputs.number("applied_rate"), dec!(0.15));
        assert_eq!(outputs.number("tax"), dec!(3060.00));
    }

    #[test]
    fn undeclared_coefficient_keeps_default() {
        let outputs = compute(&[("coefficient", "50")]);

        assert_eq!(outputs.number("gross_income"), dec!(23400.00));
    }

    #[test]
    fn other_coefficient_changes_presumed_income() {
        let outputs = compute(&[("coefficient", "40")]);

        assert_eq!(outputs.number("gross_income"), dec!(12000.00));
        assert_eq!(outputs.number("taxable_income"), dec!(9000.00));
    }

    #[test]
    fn revenue_above_regime_ceiling_is_clamped() {
        let outputs = compute(&[("revenue", "120000"), ("contributions", "0")]);

        // 85000 × 0.78
        assert_eq!(outputs.number("gross_income"), dec!(66300.00));
    }
}
