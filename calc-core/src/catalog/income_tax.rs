//! Progressive personal income tax.
//!
//! ```text
//! taxable_income = max(0, gross_income − deductions)
//! gross_tax      = Σ bracket slices of taxable_income
//! net_tax        = max(0, gross_tax − tax_credits)
//! net_income     = gross_income − net_tax
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::{Calculator, CatalogError, Chart, ChartKind, spec};
use crate::calculations::ProgressiveSchedule;
use crate::calculations::common::{non_negative, round_half_up};
use crate::models::{
    DerivedOutputs, FieldDescriptor, FieldUnit, InputSpec, InputState, OutputDescriptor,
    OutputSpec, OutputUnit, RateBand, RateTable, RateTableError,
};

pub struct IncomeTax {
    schedule: ProgressiveSchedule,
    inputs: InputSpec,
    outputs: OutputSpec,
}

impl IncomeTax {
    pub const SLUG: &'static str = "income-tax";

    pub fn default_table() -> Result<RateTable, RateTableError> {
        RateTable::new(vec![
            RateBand::bounded(dec!(28000), dec!(0.23)),
            RateBand::bounded(dec!(50000), dec!(0.35)),
            RateBand::unbounded(dec!(0.43)),
        ])
    }

    pub fn new(table: RateTable) -> Result<Self, CatalogError> {
        let inputs = spec(
            Self::SLUG,
            vec![
                FieldDescriptor::number("gross_income", "Gross annual income", dec!(50000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(100000000))
                    .step(dec!(1000)),
                FieldDescriptor::number("deductions", "Deductible expenses", dec!(0))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(100000000))
                    .step(dec!(100)),
                FieldDescriptor::number("tax_credits", "Tax credits", dec!(0))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(100000000))
                    .step(dec!(100)),
            ],
        )?;

        let outputs = OutputSpec::new(vec![
            OutputDescriptor::new("taxable_income", "Taxable income", OutputUnit::Currency),
            OutputDescriptor::new("gross_tax", "Gross tax", OutputUnit::Currency),
            OutputDescriptor::new("net_tax", "Net tax", OutputUnit::Currency),
            OutputDescriptor::new("effective_rate", "Effective rate", OutputUnit::Percent),
            OutputDescriptor::new("marginal_rate", "Marginal rate", OutputUnit::Percent),
            OutputDescriptor::new("net_income", "Net income", OutputUnit::Currency),
        ]);

        Ok(Self {
            schedule: ProgressiveSchedule::new(table),
            inputs,
            outputs,
        })
    }
}

impl Calculator for IncomeTax {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn title(&self) -> &'static str {
        "Income tax"
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
        let gross_income = inputs.number("gross_income");
        let taxable = non_negative(gross_income - inputs.number("deductions"));
        debug!(slug = Self::SLUG, %gross_income, %taxable, "computing income tax");

        let gross_tax = self.schedule.tax(taxable);
        let net_tax = non_negative(gross_tax - inputs.number("tax_credits"));
        let effective_rate = if gross_income > Decimal::ZERO {
            (net_tax / gross_income).round_dp(4)
        } else {
            Decimal::ZERO
        };

        DerivedOutputs::new()
            .with("taxable_income", round_half_up(taxable))
            .with("gross_tax", gross_tax)
            .with("net_tax", net_tax)
            .with("effective_rate", effective_rate)
            .with("marginal_rate", self.schedule.marginal_rate(taxable))
            .with("net_income", round_half_up(gross_income - net_tax))
    }

    fn chart(
        &self,
        inputs: &InputState,
        outputs: &DerivedOutputs,
    ) -> Chart {
        let taxable = outputs.number("taxable_income");
        let chart = Chart::new(ChartKind::Bar, "Tax by bracket", OutputUnit::Currency);

        let chart = self
            .schedule
            .breakdown(taxable)
            .into_iter()
            .fold(chart, |chart, slice| {
                chart.row(
                    format!("{}%", (slice.rate * Decimal::ONE_HUNDRED).normalize()),
                    round_half_up(slice.tax),
                )
            });

        if chart.rows.is_empty() {
            return chart.row("No tax", Decimal::ZERO).row(
                "Net income",
                round_half_up(inputs.number("gross_income")),
            );
        }
        chart
    }
}
