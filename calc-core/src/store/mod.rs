pub mod factory;
pub mod memory;
pub mod repository;

pub use factory::{StoreConfig, StoreFactory, StoreRegistry};
pub use memory::{InMemoryResultStore, MemoryStoreFactory};
pub use repository::{DEFAULT_HISTORY_CAP, ResultStore, StoreError, effective_cap};
