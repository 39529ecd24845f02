//! Amortised cost of owning a vehicle.
//!
//! The annual circulation tax is a step lookup on fiscal power; everything
//! else is straight-line:
//!
//! | Component     | Per year                                       |
//! |---------------|------------------------------------------------|
//! | Tax           | band amount for fiscal power (inclusive bound) |
//! | Depreciation  | `max(0, price − resale) / years`               |
//! | Running costs | `km × cost_per_km + insurance + maintenance`   |

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::debug;

use super::{Calculator, CatalogError, Chart, ChartKind, spec};
use crate::calculations::BandTable;
use crate::calculations::common::{max, non_negative, round_half_up};
use crate::models::{
    DerivedOutputs, FieldDescriptor, FieldUnit, InputSpec, InputState, OutputDescriptor,
    OutputSpec, OutputUnit, RateBand, RateTable, RateTableError,
};

const MONTHS_PER_YEAR: Decimal = dec!(12);

pub struct VehicleCost {
    tax_table: BandTable,
    inputs: InputSpec,
    outputs: OutputSpec,
}

impl VehicleCost {
    pub const SLUG: &'static str = "vehicle-cost";

    /// Fiscal power → annual circulation tax.
    pub fn default_table() -> Result<RateTable, RateTableError> {
        RateTable::new(vec![
            RateBand::bounded(dec!(8), dec!(20)),
            RateBand::bounded(dec!(11.99), dec!(59)),
            RateBand::bounded(dec!(15.99), dec!(129)),
            RateBand::bounded(dec!(19.99), dec!(159)),
            RateBand::unbounded(dec!(224)),
        ])
    }

    pub fn new(table: RateTable) -> Result<Self, CatalogError> {
        let inputs = spec(
            Self::SLUG,
            vec![
                FieldDescriptor::number("fiscal_power", "Fiscal horsepower", dec!(10.5))
                    .range(dec!(0), dec!(60))
                    .step(dec!(0.5)),
                FieldDescriptor::number("purchase_price", "Purchase price", dec!(20000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(10000000))
                    .step(dec!(500)),
                FieldDescriptor::number("resale_value", "Expected resale value", dec!(8000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(10000000))
                    .step(dec!(500)),
                FieldDescriptor::number("ownership_years", "Years of ownership", dec!(5))
                    .unit(FieldUnit::Years)
                    .range(dec!(1), dec!(30))
                    .step(dec!(1)),
                FieldDescriptor::number("annual_km", "Kilometres per year", dec!(15000))
                    .unit(FieldUnit::Count)
                    .range(dec!(0), dec!(500000))
                    .step(dec!(1000)),
                FieldDescriptor::number("cost_per_km", "Fuel cost per kilometre", dec!(0.12))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(10))
                    .step(dec!(0.01)),
                FieldDescriptor::number("insurance", "Insurance per year", dec!(600))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(100000))
                    .step(dec!(50)),
                FieldDescriptor::number("maintenance", "Maintenance per year", dec!(400))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(100000))
                    .step(dec!(50)),
            ],
        )?;

        let outputs = OutputSpec::new(vec![
            OutputDescriptor::new("annual_tax", "Circulation tax per year", OutputUnit::Currency),
            OutputDescriptor::new("depreciation_per_year", "Depreciation per year", OutputUnit::Currency),
            OutputDescriptor::new("running_cost_per_year", "Running costs per year", OutputUnit::Currency),
            OutputDescriptor::new("total_per_year", "Total cost per year", OutputUnit::Currency),
            OutputDescriptor::new("total_per_month", "Total cost per month", OutputUnit::Currency),
            OutputDescriptor::new("total_ownership_cost", "Total cost of ownership", OutputUnit::Currency),
            OutputDescriptor::new("cost_per_km", "Cost per kilometre", OutputUnit::Currency),
        ]);

        Ok(Self {
            tax_table: BandTable::inclusive(table),
            inputs,
            outputs,
        })
    }
}

impl Calculator for VehicleCost {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn title(&self) -> &'static str {
        "Vehicle cost of ownership"
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
        let fiscal_power = inputs.number("fiscal_power");
        let years = max(inputs.number("ownership_years"), Decimal::ONE);
        let annual_km = inputs.number("annual_km");
        debug!(slug = Self::SLUG, %fiscal_power, %years, "computing vehicle cost");

        let annual_tax = round_half_up(self.tax_table.lookup(fiscal_power));
        let depreciation = round_half_up(
            non_negative(inputs.number("purchase_price") - inputs.number("resale_value")) / years,
        );
        let running = round_half_up(
            annual_km * inputs.number("cost_per_km")
                + inputs.number("insurance")
                + inputs.number("maintenance"),
        );
        let per_year = annual_tax + depreciation + running;
        let cost_per_km = if annual_km > Decimal::ZERO {
            round_half_up(per_year / annual_km)
        } else {
            Decimal::ZERO
        };

        DerivedOutputs::new()
            .with("annual_tax", annual_tax)
            .with("depreciation_per_year", depreciation)
            .with("running_cost_per_year", running)
            .with("total_per_year", per_year)
            .with("total_per_month", round_half_up(per_year / MONTHS_PER_YEAR))
            .with("total_ownership_cost", round_half_up(per_year * years))
            .with("cost_per_km", cost_per_km)
    }

    fn chart(
        &self,
        _inputs: &InputState,
        outputs: &DerivedOutputs,
    ) -> Chart {
        Chart::new(ChartKind::Pie, "Yearly cost breakdown", OutputUnit::Currency)
            .row("Tax", outputs.number("annual_tax"))
            .row("Depreciation", outputs.number("depreciation_per_year"))
            .row("Running costs", outputs.number("running_cost_per_year"))
    }
}
