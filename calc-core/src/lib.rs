pub mod calculations;
pub mod catalog;
pub mod format;
pub mod models;
pub mod store;

pub use catalog::{Calculator, Catalog, CatalogError, Chart, ChartKind, ChartRow};
pub use models::*;
pub use store::{ResultStore, StoreError};
