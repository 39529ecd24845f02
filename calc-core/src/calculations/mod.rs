//! Pure calculation engine shared by every calculator.
//!
//! Each module is a stateless function of its inputs, parametrized by rate
//! tables and coefficients rather than by calculator.

pub mod assembler;
pub mod brackets;
pub mod common;
pub mod compounding;
pub mod flat_rate;
pub mod impermanent_loss;
pub mod lookup;

pub use assembler::{
    Assembly, AssemblyError, AssemblyLine, InvoiceAssembler, InvoiceAssemblerBuilder, LevyBase,
    LineKind,
};
pub use brackets::{BracketSlice, ProgressiveSchedule};
pub use compounding::{
    CompoundingInput, MAX_PERIODS, Projection, ProjectionPoint, apr_from_apy, apy_from_apr,
    period_count, project,
};
pub use flat_rate::{FlatRateInput, FlatRateResult, flat_rate};
pub use impermanent_loss::{ImpermanentLossResult, impermanent_loss, position_loss, price_ratio};
pub use lookup::{BandTable, BoundaryRule};
