use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputUnit {
    Currency,
    /// Stored as a fraction (`0.2213` renders as `22.13%`).
    Percent,
    Count,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDescriptor {
    pub id: String,
    pub label: String,
    pub unit: OutputUnit,
}

impl OutputDescriptor {
    pub fn new(
        id: &str,
        label: &str,
        unit: OutputUnit,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            unit,
        }
    }
}

/// Ordered list of the quantities a calculator displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub outputs: Vec<OutputDescriptor>,
}

impl OutputSpec {
    pub fn new(outputs: Vec<OutputDescriptor>) -> Self {
        Self { outputs }
    }

    pub fn descriptor(
        &self,
        id: &str,
    ) -> Option<&OutputDescriptor> {
        self.outputs.iter().find(|o| o.id == id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputValue {
    Number(Decimal),
    Text(String),
}

impl OutputValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

/// Derived quantities in display order. Always rebuilt from scratch by
/// `Calculator::compute`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedOutputs {
    values: Vec<(String, OutputValue)>,
}

impl DerivedOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a numeric output, builder style.
    pub fn with(
        mut self,
        id: &str,
        value: Decimal,
    ) -> Self {
        self.values.push((id.to_string(), OutputValue::Number(value)));
        self
    }

    pub fn with_text(
        mut self,
        id: &str,
        value: impl Into<String>,
    ) -> Self {
        self.values.push((id.to_string(), OutputValue::Text(value.into())));
        self
    }

    pub fn get(
        &self,
        id: &str,
    ) -> Option<&OutputValue> {
        self.values.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    /// Numeric output by id; zero when missing or textual.
    pub fn number(
        &self,
        id: &str,
    ) -> Decimal {
        self.get(id)
            .and_then(OutputValue::as_number)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OutputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
