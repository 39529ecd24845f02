use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::OutputUnit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRow {
    pub label: String,
    pub value: Decimal,
}

/// Renderer-agnostic chart data: a list of `{label, value}` rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    /// How row values should be formatted.
    pub unit: OutputUnit,
    pub rows: Vec<ChartRow>,
}

impl Chart {
    pub fn new(
        kind: ChartKind,
        title: &str,
        unit: OutputUnit,
    ) -> Self {
        Self {
            kind,
            title: title.to_string(),
            unit,
            rows: Vec::new(),
        }
    }

    pub fn row(
        mut self,
        label: impl Into<String>,
        value: Decimal,
    ) -> Self {
        self.rows.push(ChartRow {
            label: label.into(),
            value,
        });
        self
    }

    /// Largest row value, or zero for an empty chart.
    pub fn max_value(&self) -> Decimal {
        self.rows
            .iter()
            .map(|r| r.value)
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}
