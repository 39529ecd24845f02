mod input;
mod output;
mod rate_table;
mod saved_result;

pub use input::{
    DATE_FORMAT, FieldDescriptor, FieldKind, FieldUnit, InputError, InputSpec, InputState,
    InputValue, SelectOption, SpecError, VisibilityCondition, coerce_bool, coerce_number,
};
pub use output::{DerivedOutputs, OutputDescriptor, OutputSpec, OutputUnit, OutputValue};
pub use rate_table::{RateBand, RateTable, RateTableError};
pub use saved_result::SavedResult;
