use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use super::{Calculator, CatalogError, Chart, ChartKind, spec};
use crate::calculations::common::percent_to_fraction;
use crate::calculations::position_loss;
use crate::models::{
    DerivedOutputs, FieldDescriptor, FieldUnit, InputSpec, InputState, OutputDescriptor,
    OutputSpec, OutputUnit,
};

/// Liquidity-pool impermanent loss for an even two-asset deposit.
pub struct ImpermanentLoss {
    inputs: InputSpec,
    outputs: OutputSpec,
}

impl ImpermanentLoss {
    pub const SLUG: &'static str = "impermanent-loss";

    pub fn new() -> Result<Self, CatalogError> {
        let inputs = spec(
            Self::SLUG,
            vec![
                FieldDescriptor::number("price_change_a", "Price change of token A", dec!(10))
                    .unit(FieldUnit::Percent)
                    .range(dec!(-99), dec!(10000))
                    .step(dec!(1)),
                FieldDescriptor::number("price_change_b", "Price change of token B", dec!(0))
                    .unit(FieldUnit::Percent)
                    .range(dec!(-99), dec!(10000))
                    .step(dec!(1)),
                FieldDescriptor::number("deposit", "Initial deposit value", dec!(1000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(1000000000))
                    .step(dec!(100)),
            ],
        )?;

        let outputs = OutputSpec::new(vec![
            OutputDescriptor::new("price_ratio", "Price ratio (k)", OutputUnit::Text),
            OutputDescriptor::new("impermanent_loss", "Impermanent loss", OutputUnit::Percent),
            OutputDescriptor::new("hold_value", "Value if held", OutputUnit::Currency),
            OutputDescriptor::new("pool_value", "Value in pool", OutputUnit::Currency),
            OutputDescriptor::new("loss_amount", "Loss versus holding", OutputUnit::Currency),
        ]);

        Ok(Self { inputs, outputs })
    }
}

impl Calculator for ImpermanentLoss {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn title(&self) -> &'static str {
        "Impermanent loss"
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
        let change_a = percent_to_fraction(inputs.number("price_change_a"));
        let change_b = percent_to_fraction(inputs.number("price_change_b"));
        debug!(slug = Self::SLUG, %change_a, %change_b, "computing impermanent loss");

        match position_loss(inputs.number("deposit"), change_a, change_b) {
            Some(result) => DerivedOutputs::new()
                .with_text("price_ratio", format!("{:.4}", result.price_ratio))
                .with("impermanent_loss", result.loss_fraction.round_dp(6))
                .with("hold_value", result.hold_value)
                .with("pool_value", result.pool_value)
                .with("loss_amount", result.loss_amount),
            None => {
                warn!(slug = Self::SLUG, %change_b, "token B price wiped out, ratio undefined");
                DerivedOutputs::new()
                    .with_text("price_ratio", "undefined")
                    .with("impermanent_loss", Decimal::ZERO)
                    .with("hold_value", Decimal::ZERO)
                    .with("pool_value", Decimal::ZERO)
                    .with("loss_amount", Decimal::ZERO)
            }
        }
    }

    fn chart(
        &self,
        _inputs: &InputState,
        outputs: &DerivedOutputs,
    ) -> Chart {
        Chart::new(ChartKind::Bar, "Hold versus pool", OutputUnit::Currency)
            .row("Hold", outputs.number("hold_value"))
            .row("Pool", outputs.number("pool_value"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::OutputValue;

    #[test]
    fn ten_percent_move_of_one_token() {
        let calc = ImpermanentLoss::new().unwrap();
        let outputs = calc.compute(&calc.default_inputs());

        assert_eq!(
            outputs.get("price_ratio"),
            Some(&OutputValue::Text("1.1000".to_string()))
        );
        assert_eq!(outputs.number("impermanent_loss").round_dp(4), dec!(-0.0011));
        assert_eq!(outputs.number("hold_value"), dec!(1050.00));
        assert_eq!(outputs.number("pool_value"), dec!(1048.81));
        assert_eq!(outputs.number("loss_amount"), dec!(1.19));
    }

    #[test]
    fn price_change_below_total_loss_is_clamped() {
        let calc = ImpermanentLoss::new().unwrap();
        let mut inputs = calc.default_inputs();
        inputs
            .set_raw(calc.input_spec(), "price_change_b", "-150")
            .unwrap();

        assert_eq!(inputs.number("price_change_b"), dec!(-99));
        assert!(calc.compute(&inputs).number("impermanent_loss") < Decimal::ZERO);
    }
}
