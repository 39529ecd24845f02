//! Calculator definitions and the registry that serves them by slug.
//!
//! Every calculator is a thin configuration record over the engine in
//! [`crate::calculations`]: an input spec, an output spec, the rate tables it
//! needs, and a `compute` that maps an [`InputState`] to fresh
//! [`DerivedOutputs`].

mod chart;
mod compound_yield;
mod flat_rate_regime;
mod impermanent_loss;
mod income_tax;
mod late_payment_penalty;
mod professional_invoice;
mod vehicle_cost;

use std::collections::HashMap;

use thiserror::Error;

use crate::models::{
    DerivedOutputs, InputSpec, InputState, OutputSpec, RateTable, RateTableError, SpecError,
};

pub use chart::{Chart, ChartKind, ChartRow};
pub use compound_yield::CompoundYield;
pub use flat_rate_regime::FlatRateRegime;
pub use impermanent_loss::ImpermanentLoss;
pub use income_tax::IncomeTax;
pub use late_payment_penalty::LatePaymentPenalty;
pub use professional_invoice::ProfessionalInvoice;
pub use vehicle_cost::VehicleCost;

/// Key of the progressive income tax table.
pub const INCOME_TAX_TABLE: &str = "income-tax";
/// Key of the vehicle tax table (fiscal power → annual amount).
pub const VEHICLE_COST_TABLE: &str = "vehicle-cost";
/// Key of the late payment penalty table (days late → penalty rate).
pub const LATE_PAYMENT_TABLE: &str = "late-payment-penalty";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown calculator '{slug}'; available: {available:?}")]
    UnknownCalculator {
        slug: String,
        available: Vec<&'static str>,
    },

    #[error("calculator '{slug}' has an invalid input spec: {source}")]
    InvalidSpec {
        slug: &'static str,
        #[source]
        source: SpecError,
    },

    #[error("calculator '{slug}' has an invalid rate table: {source}")]
    InvalidTable {
        slug: &'static str,
        #[source]
        source: RateTableError,
    },
}

pub trait Calculator: Send + Sync {
    /// Unique, lowercase, hyphenated identifier.
    fn slug(&self) -> &'static str;

    fn title(&self) -> &'static str;

    fn input_spec(&self) -> &InputSpec;

    fn output_spec(&self) -> &OutputSpec;

    /// Derives every output from scratch. Never fails: inputs are already
    /// coerced and clamped by the time they reach this point.
    fn compute(
        &self,
        inputs: &InputState,
    ) -> DerivedOutputs;

    fn chart(
        &self,
        inputs: &InputState,
        outputs: &DerivedOutputs,
    ) -> Chart;

    /// Input state seeded with every field's default.
    fn default_inputs(&self) -> InputState {
        InputState::from_spec(self.input_spec())
    }
}

/// Registry of [`Calculator`] instances, keyed by slug.
pub struct Catalog {
    calculators: HashMap<&'static str, Box<dyn Calculator>>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self {
            calculators: HashMap::new(),
        }
    }

    /// Every built-in calculator with its default tables.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if a built-in spec or table fails validation.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::builtin_with_tables(&HashMap::new())
    }

    /// Every built-in calculator, with tables found in `tables` (keyed by
    /// [`INCOME_TAX_TABLE`], [`VEHICLE_COST_TABLE`], [`LATE_PAYMENT_TABLE`])
    /// replacing the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if a built-in spec or table fails validation.
    pub fn builtin_with_tables(tables: &HashMap<String, RateTable>) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();

        catalog.register(Box::new(IncomeTax::new(
            override_or(tables, INCOME_TAX_TABLE, IncomeTax::default_table)
                .map_err(|source| table_error(IncomeTax::SLUG, source))?,
        )?));
        catalog.register(Box::new(FlatRateRegime::new()?));
        catalog.register(Box::new(CompoundYield::new()?));
        catalog.register(Box::new(ImpermanentLoss::new()?));
        catalog.register(Box::new(VehicleCost::new(
            override_or(tables, VEHICLE_COST_TABLE, VehicleCost::default_table)
                .map_err(|source| table_error(VehicleCost::SLUG, source))?,
        )?));
        catalog.register(Box::new(ProfessionalInvoice::new()?));
        catalog.register(Box::new(LatePaymentPenalty::new(
            override_or(tables, LATE_PAYMENT_TABLE, LatePaymentPenalty::default_table)
                .map_err(|source| table_error(LatePaymentPenalty::SLUG, source))?,
        )?));

        Ok(catalog)
    }

    /// Register a calculator, replacing any with the same slug.
    pub fn register(
        &mut self,
        calculator: Box<dyn Calculator>,
    ) {
        self.calculators.insert(calculator.slug(), calculator);
    }

    /// Every registered slug, sorted alphabetically.
    pub fn slugs(&self) -> Vec<&'static str> {
        let mut slugs: Vec<_> = self.calculators.keys().copied().collect();
        slugs.sort_unstable();
        slugs
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCalculator`] naming the requested slug
    /// and every available one.
    pub fn get(
        &self,
        slug: &str,
    ) -> Result<&dyn Calculator, CatalogError> {
        self.calculators
            .get(slug)
            .map(|c| c.as_ref())
            .ok_or_else(|| CatalogError::UnknownCalculator {
                slug: slug.to_string(),
                available: self.slugs(),
            })
    }

    /// Calculators in slug order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Calculator> {
        self.slugs()
            .into_iter()
            .filter_map(|slug| self.calculators.get(slug).map(|c| c.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.calculators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calculators.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn override_or(
    tables: &HashMap<String, RateTable>,
    key: &str,
    default: fn() -> Result<RateTable, RateTableError>,
) -> Result<RateTable, RateTableError> {
    match tables.get(key) {
        Some(table) => Ok(table.clone()),
        None => default(),
    }
}

fn table_error(
    slug: &'static str,
    source: RateTableError,
) -> CatalogError {
    CatalogError::InvalidTable { slug, source }
}

/// Builds a spec, attributing a validation failure to `slug`.
fn spec(
    slug: &'static str,
    fields: Vec<crate::models::FieldDescriptor>,
) -> Result<InputSpec, CatalogError> {
    InputSpec::new(fields).map_err(|source| CatalogError::InvalidSpec { slug, source })
}
