//! Plain-text rendering of calculator descriptions, results, charts and
//! saved history.

use std::fmt::Write;

use calc_core::format::{Locale, format_output, format_percent};
use calc_core::{
    Calculator, Catalog, Chart, ChartKind, DerivedOutputs, FieldDescriptor, FieldKind, InputState,
    OutputSpec, OutputUnit, OutputValue, SavedResult,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::utils::format_timestamp;

/// Width of the longest bar in a chart, in characters.
pub const BAR_WIDTH: usize = 40;

const BAR: char = '█';

fn unit_name(unit: OutputUnit) -> &'static str {
    match unit {
        OutputUnit::Currency => "currency",
        OutputUnit::Percent => "percent",
        OutputUnit::Count => "count",
        OutputUnit::Text => "text",
    }
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Number => "number",
        FieldKind::Boolean => "boolean",
        FieldKind::Select => "select",
        FieldKind::Date => "date",
    }
}

fn describe_field(field: &FieldDescriptor) -> String {
    let mut line = kind_name(field.kind).to_string();
    if let Some(unit) = field.unit {
        let suffix = unit.suffix();
        if !suffix.is_empty() {
            let _ = write!(line, ", {suffix}");
        }
    }
    let _ = write!(line, "; default {}", field.default);

    match (field.min, field.max) {
        (Some(min), Some(max)) => {
            let _ = write!(line, "; range {}..{}", min.normalize(), max.normalize());
        }
        (Some(min), None) => {
            let _ = write!(line, "; min {}", min.normalize());
        }
        (None, Some(max)) => {
            let _ = write!(line, "; max {}", max.normalize());
        }
        (None, None) => {}
    }

    if !field.options.is_empty() {
        let options: Vec<String> = field.options.iter().map(|o| o.value.to_string()).collect();
        let _ = write!(line, "; one of {}", options.join("|"));
    }

    if let Some(condition) = &field.visible_when {
        let _ = write!(line, "; shown when {} = {}", condition.field, condition.equals);
    }

    line
}

/// Input fields and outputs of a calculator.
///
/// Fields hidden by their current visibility condition are marked.
pub fn render_description(
    calculator: &dyn Calculator,
    inputs: &InputState,
) -> String {
    let spec = calculator.input_spec();
    let id_width = spec.fields().iter().map(|f| f.id.len()).max().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", calculator.title(), calculator.slug());
    let _ = writeln!(out);
    let _ = writeln!(out, "Inputs:");
    for field in spec.fields() {
        let hidden = if inputs.is_visible(field) { "" } else { " [hidden]" };
        let _ = writeln!(
            out,
            "  {:<id_width$}  {}{hidden}",
            field.id, field.label
        );
        let _ = writeln!(out, "  {:<id_width$}    {}", "", describe_field(field));
    }

    let outputs = &calculator.output_spec().outputs;
    let out_width = outputs.iter().map(|o| o.id.len()).max().unwrap_or(0);
    let _ = writeln!(out);
    let _ = writeln!(out, "Outputs:");
    for output in outputs {
        let _ = writeln!(
            out,
            "  {:<out_width$}  {} ({})",
            output.id,
            output.label,
            unit_name(output.unit)
        );
    }
    out
}

/// One line per declared output, labels left-aligned and values
/// right-aligned.
pub fn render_outputs(
    spec: &OutputSpec,
    outputs: &DerivedOutputs,
    locale: Locale,
) -> String {
    let rows: Vec<(&str, String)> = spec
        .outputs
        .iter()
        .filter_map(|descriptor| {
            outputs.get(&descriptor.id).map(|value| {
                (
                    descriptor.label.as_str(),
                    format_output(value, descriptor.unit, locale),
                )
            })
        })
        .collect();

    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    for (label, value) in rows {
        let _ = writeln!(out, "{label:<label_width$}  {value:>value_width$}");
    }
    out
}

/// Bar length for `value` on a scale where `max` fills [`BAR_WIDTH`].
/// Non-positive values draw nothing.
pub fn bar_length(
    value: Decimal,
    max: Decimal,
) -> usize {
    if value <= Decimal::ZERO || max <= Decimal::ZERO {
        return 0;
    }
    (value / max * Decimal::from(BAR_WIDTH))
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(BAR_WIDTH)
}

/// Horizontal bar chart. Pie charts also show each row's share of the total.
pub fn render_chart(
    chart: &Chart,
    locale: Locale,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", chart.title);

    if chart.rows.is_empty() {
        let _ = writeln!(out, "  (no data)");
        return out;
    }

    let max = chart.max_value();
    let total: Decimal = chart
        .rows
        .iter()
        .map(|r| r.value.max(Decimal::ZERO))
        .sum();
    let label_width = chart
        .rows
        .iter()
        .map(|r| r.label.chars().count())
        .max()
        .unwrap_or(0);

    for row in &chart.rows {
        let bar: String = std::iter::repeat_n(BAR, bar_length(row.value, max)).collect();
        let value = format_output(&OutputValue::Number(row.value), chart.unit, locale);
        let _ = write!(
            out,
            "  {:<label_width$}  {bar:<BAR_WIDTH$}  {value}",
            row.label
        );
        if chart.kind == ChartKind::Pie && total > Decimal::ZERO {
            let _ = write!(out, " ({})", format_percent(row.value / total, locale));
        }
        let _ = writeln!(out);
    }
    out
}

/// Saved records, newest first. Outputs are formatted with the units their
/// calculator declares; records of calculators no longer in `catalog` fall
/// back to plain numbers.
pub fn render_history(
    records: &[SavedResult],
    catalog: &Catalog,
    locale: Locale,
) -> String {
    if records.is_empty() {
        return "No saved results.\n".to_string();
    }

    let mut out = String::new();
    for record in records {
        let _ = writeln!(
            out,
            "{}  {} ({})",
            format_timestamp(record.timestamp),
            record.title,
            record.slug
        );
        let spec = catalog.get(&record.slug).ok().map(|c| c.output_spec());
        for (id, value) in record.outputs.iter() {
            let (label, unit) = spec
                .and_then(|s| s.descriptor(id))
                .map_or((id, OutputUnit::Text), |d| (d.label.as_str(), d.unit));
            let _ = writeln!(out, "    {label}: {}", format_output(value, unit, locale));
        }
    }
    out
}
