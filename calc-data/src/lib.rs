mod loader;

pub use loader::{RateTableLoader, RateTableLoaderError, RateTableRecord};
