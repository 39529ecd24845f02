//! Invoice of a self-employed professional.
//!
//! Lines are assembled in this order:
//!
//! 1. pension surcharge on the fee;
//! 2. VAT on fee + surcharge;
//! 3. stamp duty, only on VAT-exempt invoices whose total exceeds 77.47;
//! 4. withholding (when enabled) on fee + surcharge, deducted from the total.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, error};

use super::{Calculator, CatalogError, Chart, ChartKind, spec};
use crate::calculations::common::percent_to_fraction;
use crate::calculations::{Assembly, AssemblyError, BandTable, InvoiceAssembler, LevyBase};
use crate::models::{
    DerivedOutputs, FieldDescriptor, FieldUnit, InputSpec, InputState, OutputDescriptor,
    OutputSpec, OutputUnit, RateBand, RateTable, RateTableError, SelectOption,
};

const STAMP_DUTY_THRESHOLD: Decimal = dec!(77.47);
const STAMP_DUTY: Decimal = dec!(2.00);

pub struct ProfessionalInvoice {
    stamp_duty: BandTable,
    inputs: InputSpec,
    outputs: OutputSpec,
}

impl ProfessionalInvoice {
    pub const SLUG: &'static str = "professional-invoice";

    fn stamp_duty_table() -> Result<RateTable, RateTableError> {
        RateTable::new(vec![
            RateBand::bounded(STAMP_DUTY_THRESHOLD, Decimal::ZERO),
            RateBand::unbounded(STAMP_DUTY),
        ])
    }

    pub fn new() -> Result<Self, CatalogError> {
        let stamp_duty = Self::stamp_duty_table()
            .map(BandTable::inclusive)
            .map_err(|source| CatalogError::InvalidTable {
                slug: Self::SLUG,
                source,
            })?;

        let surcharges = vec![
            SelectOption::new(dec!(0), "None"),
            SelectOption::new(dec!(2), "2%"),
            SelectOption::new(dec!(4), "4%"),
        ];
        let vat_rates = vec![
            SelectOption::new(dec!(22), "22% standard"),
            SelectOption::new(dec!(10), "10% reduced"),
            SelectOption::new(dec!(4), "4% super-reduced"),
            SelectOption::new(dec!(0), "Exempt"),
        ];

        let inputs = spec(
            Self::SLUG,
            vec![
                FieldDescriptor::number("fee", "Professional fee", dec!(1000))
                    .unit(FieldUnit::Currency)
                    .range(dec!(0), dec!(100000000))
                    .step(dec!(50)),
                FieldDescriptor::select("pension_surcharge", "Pension surcharge", surcharges, dec!(4))
                    .unit(FieldUnit::Percent),
                FieldDescriptor::select("vat_rate", "VAT rate", vat_rates, dec!(22))
                    .unit(FieldUnit::Percent),
                FieldDescriptor::boolean("withholding_enabled", "Client withholds tax", true),
                FieldDescriptor::number("withholding_rate", "Withholding rate", dec!(20))
                    .unit(FieldUnit::Percent)
                    .range(dec!(0), dec!(50))
                    .step(dec!(1))
                    .visible_when("withholding_enabled", true),
            ],
        )?;

        let outputs = OutputSpec::new(vec![
            OutputDescriptor::new("fee", "Fee", OutputUnit::Currency),
            OutputDescriptor::new("surcharge", "Pension surcharge", OutputUnit::Currency),
            OutputDescriptor::new("taxable_amount", "Taxable amount", OutputUnit::Currency),
            OutputDescriptor::new("vat", "VAT", OutputUnit::Currency),
            OutputDescriptor::new("stamp_duty", "Stamp duty", OutputUnit::Currency),
            OutputDescriptor::new("invoice_total", "Invoice total", OutputUnit::Currency),
            OutputDescriptor::new("withholding", "Withholding", OutputUnit::Currency),
            OutputDescriptor::new("net_payable", "Net payable", OutputUnit::Currency),
        ]);

        Ok(Self {
            stamp_duty,
            inputs,
            outputs,
        })
    }

    fn assemble(
        &self,
        inputs: &InputState,
    ) -> Result<Assembly, AssemblyError> {
        let vat_rate = percent_to_fraction(inputs.number("vat_rate"));
        let mut builder = InvoiceAssembler::builder()
            .levy(
                "surcharge",
                percent_to_fraction(inputs.number("pension_surcharge")),
                LevyBase::Net,
            )
            .levy("vat", vat_rate, LevyBase::Running);

        if vat_rate.is_zero() {
            builder = builder.fixed("stamp_duty", self.stamp_duty.clone(), LevyBase::Running);
        }
        if inputs.flag("withholding_enabled") {
            builder = builder.deduction(
                "withholding",
                percent_to_fraction(inputs.number("withholding_rate")),
                LevyBase::Subtotal(vec!["surcharge".to_string()]),
            );
        }

        Ok(builder.build()?.assemble(inputs.number("fee")))
    }
}

impl Calculator for ProfessionalInvoice {
    fn slug(&self) -> &'static str {
        Self::SLUG
    }

    fn title(&self) -> &'static str {
        "Professional invoice"
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
        debug!(slug = Self::SLUG, fee = %inputs.number("fee"), "assembling invoice");
        let assembly = match self.assemble(inputs) {
            Ok(assembly) => assembly,
            Err(e) => {
                error!(slug = Self::SLUG, "invalid invoice layout: {}", e);
                return self
                    .outputs
                    .outputs
                    .iter()
                    .fold(DerivedOutputs::new(), |acc, o| acc.with(&o.id, Decimal::ZERO));
            }
        };
        let surcharge = assembly.amount("surcharge");

        DerivedOutputs::new()
            .with("fee", assembly.base)
            .with("surcharge", surcharge)
            .with("taxable_amount", assembly.base + surcharge)
            .with("vat", assembly.amount("vat"))
            .with("stamp_duty", assembly.amount("stamp_duty"))
            .with("invoice_total", assembly.gross_total)
            .with("withholding", assembly.amount("withholding"))
            .with("net_payable", assembly.net_total)
    }

    fn chart(
        &self,
        _inputs: &InputState,
        outputs: &DerivedOutputs,
    ) -> Chart {
        Chart::new(ChartKind::Bar, "Invoice composition", OutputUnit::Currency)
            .row("Fee", outputs.number("fee"))
            .row("Pension surcharge", outputs.number("surcharge"))
            .row("VAT", outputs.number("vat"))
            .row("Stamp duty", outputs.number("stamp_duty"))
            .row("Withholding", outputs.number("withholding"))
            .row("Net payable", outputs.number("net_payable"))
    }
}
