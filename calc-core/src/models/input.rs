//! Input descriptors and the live input state of a calculator form.
//!
//! Raw values arrive as text (from a form field or a command-line override)
//! and are coerced, never rejected: unparseable numbers become zero, numbers
//! are clamped to the declared range, and unknown select values keep the
//! field default. Only a reference to a field that does not exist is an
//! error.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Date format accepted by date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SpecError {
    #[error("duplicate field id '{0}'")]
    DuplicateField(String),

    #[error("field '{field}' is conditional on unknown field '{referenced}'")]
    UnknownVisibilityField { field: String, referenced: String },

    #[error("select field '{0}' has no options")]
    EmptySelect(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("unknown input field '{0}'")]
    UnknownField(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Number,
    Boolean,
    Select,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUnit {
    Currency,
    /// Entered in percentage points (`22` means 22%).
    Percent,
    Count,
    Years,
    Days,
    Text,
}

impl FieldUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Currency => "currency",
            Self::Percent => "%",
            Self::Count => "",
            Self::Years => "years",
            Self::Days => "days",
            Self::Text => "",
        }
    }
}

/// A single form value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputValue {
    Number(Decimal),
    Bool(bool),
    Text(String),
}

impl InputValue {
    pub fn as_number(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for InputValue {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n.normalize()),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<Decimal> for InputValue {
    fn from(value: Decimal) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for InputValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for InputValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: InputValue,
    pub label: String,
}

impl SelectOption {
    pub fn new(
        value: impl Into<InputValue>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Shows a field only while another field equals a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityCondition {
    pub field: String,
    pub equals: InputValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    pub unit: Option<FieldUnit>,
    pub min: Option<Decimal>,
    pub max: Option<Decimal>,
    pub step: Option<Decimal>,
    pub options: Vec<SelectOption>,
    pub visible_when: Option<VisibilityCondition>,
    pub default: InputValue,
}

impl FieldDescriptor {
    fn base(
        id: &str,
        label: &str,
        kind: FieldKind,
        default: InputValue,
    ) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            unit: None,
            min: None,
            max: None,
            step: None,
            options: Vec::new(),
            visible_when: None,
            default,
        }
    }

    pub fn number(
        id: &str,
        label: &str,
        default: Decimal,
    ) -> Self {
        Self::base(id, label, FieldKind::Number, InputValue::Number(default))
    }

    pub fn boolean(
        id: &str,
        label: &str,
        default: bool,
    ) -> Self {
        Self::base(id, label, FieldKind::Boolean, InputValue::Bool(default))
    }

    pub fn select(
        id: &str,
        label: &str,
        options: Vec<SelectOption>,
        default: impl Into<InputValue>,
    ) -> Self {
        let mut field = Self::base(id, label, FieldKind::Select, default.into());
        field.options = options;
        field
    }

    pub fn date(
        id: &str,
        label: &str,
        default: &str,
    ) -> Self {
        Self::base(id, label, FieldKind::Date, InputValue::from(default))
    }

    pub fn unit(
        mut self,
        unit: FieldUnit,
    ) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn range(
        mut self,
        min: Decimal,
        max: Decimal,
    ) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn min(
        mut self,
        min: Decimal,
    ) -> Self {
        self.min = Some(min);
        self
    }

    pub fn step(
        mut self,
        step: Decimal,
    ) -> Self {
        self.step = Some(step);
        self
    }

    pub fn visible_when(
        mut self,
        field: &str,
        equals: impl Into<InputValue>,
    ) -> Self {
        self.visible_when = Some(VisibilityCondition {
            field: field.to_string(),
            equals: equals.into(),
        });
        self
    }

    /// Clamps a number to the declared `[min, max]`.
    pub fn clamp(
        &self,
        value: Decimal,
    ) -> Decimal {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }

    /// Turns raw text into a value of this field's kind.
    ///
    /// Never fails; see the module docs for the fallback rules.
    pub fn coerce(
        &self,
        raw: &str,
    ) -> InputValue {
        match self.kind {
            FieldKind::Number => InputValue::Number(self.clamp(coerce_number(&self.id, raw))),
            FieldKind::Boolean => InputValue::Bool(coerce_bool(raw)),
            FieldKind::Select => self.coerce_select(raw),
            FieldKind::Date => match NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT) {
                Ok(date) => InputValue::Text(date.format(DATE_FORMAT).to_string()),
                Err(e) => {
                    warn!(field = %self.id, input = %raw, "invalid date, keeping default: {}", e);
                    self.default.clone()
                }
            },
        }
    }

    fn coerce_select(
        &self,
        raw: &str,
    ) -> InputValue {
        let raw = raw.trim();
        let parsed = normalize_number(raw).parse::<Decimal>().ok();

        let matched = self.options.iter().find(|option| match &option.value {
            InputValue::Number(n) => parsed == Some(*n),
            other => other.to_string().eq_ignore_ascii_case(raw),
        });

        match matched {
            Some(option) => option.value.clone(),
            None => {
                warn!(field = %self.id, input = %raw, "value is not a declared option, keeping default");
                self.default.clone()
            }
        }
    }
}

fn normalize_number(s: &str) -> String {
    s.trim().replace(',', "")
}

/// Parses numeric text, treating empty or invalid input as zero.
///
/// Commas are treated as thousands separators.
pub fn coerce_number(
    field: &str,
    raw: &str,
) -> Decimal {
    let normalized = normalize_number(raw);
    if normalized.is_empty() {
        return Decimal::ZERO;
    }
    normalized
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&normalized))
        .unwrap_or_else(|e| {
            warn!(field = %field, input = %raw, "invalid number, using 0: {}", e);
            Decimal::ZERO
        })
}

/// Parses boolean text; anything unrecognised is `false`.
pub fn coerce_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "y"
    )
}

/// Ordered field descriptors for one calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    fields: Vec<FieldDescriptor>,
}

impl InputSpec {
    /// # Errors
    ///
    /// Returns [`SpecError`] if an id repeats, a select has no options, or a
    /// visibility condition names a field that does not exist.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, SpecError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.id.as_str()) {
                return Err(SpecError::DuplicateField(field.id.clone()));
            }
            if field.kind == FieldKind::Select && field.options.is_empty() {
                return Err(SpecError::EmptySelect(field.id.clone()));
            }
        }
        for field in &fields {
            if let Some(condition) = &field.visible_when {
                if !seen.contains(condition.field.as_str()) {
                    return Err(SpecError::UnknownVisibilityField {
                        field: field.id.clone(),
                        referenced: condition.field.clone(),
                    });
                }
            }
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(
        &self,
        id: &str,
    ) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// Current value of every field, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputState {
    values: BTreeMap<String, InputValue>,
}

impl InputState {
    /// Seeds every field with its literal default.
    pub fn from_spec(spec: &InputSpec) -> Self {
        let values = spec
            .fields()
            .iter()
            .map(|f| (f.id.clone(), f.default.clone()))
            .collect();
        Self { values }
    }

    /// Applies a raw text edit to one field.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownField`] if `id` is not declared in `spec`.
    pub fn set_raw(
        &mut self,
        spec: &InputSpec,
        id: &str,
        raw: &str,
    ) -> Result<(), InputError> {
        let field = spec
            .field(id)
            .ok_or_else(|| InputError::UnknownField(id.to_string()))?;
        self.values.insert(id.to_string(), field.coerce(raw));
        Ok(())
    }

    /// Stores an already-typed value, clamping numbers to the field range.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::UnknownField`] if `id` is not declared in `spec`.
    pub fn set(
        &mut self,
        spec: &InputSpec,
        id: &str,
        value: InputValue,
    ) -> Result<(), InputError> {
        let field = spec
            .field(id)
            .ok_or_else(|| InputError::UnknownField(id.to_string()))?;
        let value = match value {
            InputValue::Number(n) => InputValue::Number(field.clamp(n)),
            other => other,
        };
        self.values.insert(id.to_string(), value);
        Ok(())
    }

    pub fn get(
        &self,
        id: &str,
    ) -> Option<&InputValue> {
        self.values.get(id)
    }

    /// Numeric value of a field; zero when missing or not numeric.
    pub fn number(
        &self,
        id: &str,
    ) -> Decimal {
        self.values
            .get(id)
            .and_then(InputValue::as_number)
            .unwrap_or(Decimal::ZERO)
    }

    /// Boolean value of a field; `false` when missing or not boolean.
    pub fn flag(
        &self,
        id: &str,
    ) -> bool {
        matches!(self.values.get(id), Some(InputValue::Bool(true)))
    }

    pub fn text(
        &self,
        id: &str,
    ) -> Option<&str> {
        match self.values.get(id) {
            Some(InputValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn date(
        &self,
        id: &str,
    ) -> Option<NaiveDate> {
        self.text(id)
            .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
    }

    pub fn is_visible(
        &self,
        field: &FieldDescriptor,
    ) -> bool {
        match &field.visible_when {
            None => true,
            Some(condition) => self.values.get(&condition.field) == Some(&condition.equals),
        }
    }

    /// Fields whose visibility condition currently holds, in spec order.
    pub fn visible_fields<'a>(
        &self,
        spec: &'a InputSpec,
    ) -> Vec<&'a FieldDescriptor> {
        spec.fields()
            .iter()
            .filter(|f| self.is_visible(f))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &InputValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn test_spec() -> InputSpec {
        InputSpec::new(vec![
            FieldDescriptor::number("amount", "Amount", dec!(1000))
                .unit(FieldUnit::Currency)
                .range(dec!(0), dec!(10000)),
            FieldDescriptor::boolean("withholding", "Apply withholding", false),
            FieldDescriptor::number("withholding_rate", "Withholding rate", dec!(20))
                .unit(FieldUnit::Percent)
                .visible_when("withholding", true),
            FieldDescriptor::select(
                "vat_rate",
                "VAT rate",
                vec![
                    SelectOption::new(dec!(22), "22%"),
                    SelectOption::new(dec!(10), "10%"),
                    SelectOption::new(dec!(0), "Exempt"),
                ],
                dec!(22),
            ),
            FieldDescriptor::date("due_date", "Due date", "2025-06-30"),
        ])
        .unwrap()
    }

    // =========================================================================
    // InputSpec validation
    // =========================================================================

    #[test]
    fn spec_rejects_duplicate_ids() {
        let result = InputSpec::new(vec![
            FieldDescriptor::number("a", "A", dec!(0)),
            FieldDescriptor::number("a", "A again", dec!(0)),
        ]);

        assert_eq!(result, Err(SpecError::DuplicateField("a".to_string())));
    }

    #[test]
    fn spec_rejects_condition_on_unknown_field() {
        let result = InputSpec::new(vec![
            FieldDescriptor::number("a", "A", dec!(0)).visible_when("missing", true),
        ]);

        assert_eq!(
            result,
            Err(SpecError::UnknownVisibilityField {
                field: "a".to_string(),
                referenced: "missing".to_string(),
            })
        );
    }

    #[test]
    fn spec_rejects_select_without_options() {
        let result = InputSpec::new(vec![FieldDescriptor::select("s", "S", vec![], "x")]);

        assert_eq!(result, Err(SpecError::EmptySelect("s".to_string())));
    }

    // =========================================================================
    // InputState coercion
    // =========================================================================

    #[test]
    fn from_spec_seeds_defaults() {
        let spec = test_spec();
        let state = InputState::from_spec(&spec);

        assert_eq!(state.number("amount"), dec!(1000));
        assert!(!state.flag("withholding"));
        assert_eq!(state.number("vat_rate"), dec!(22));
        assert_eq!(state.text("due_date"), Some("2025-06-30"));
    }

    #[test]
    fn set_raw_parses_grouped_numbers() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        state.set_raw(&spec, "amount", " 1,234.50 ").unwrap();

        assert_eq!(state.number("amount"), dec!(1234.50));
    }

    #[test]
    fn set_raw_coerces_garbage_to_zero() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        state.set_raw(&spec, "amount", "abc").unwrap();

        assert_eq!(state.number("amount"), dec!(0));
    }

    #[test]
    fn set_raw_coerces_empty_to_zero() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        state.set_raw(&spec, "amount", "").unwrap();

        assert_eq!(state.number("amount"), dec!(0));
    }

    #[test]
    fn set_raw_clamps_to_declared_range() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        state.set_raw(&spec, "amount", "25000").unwrap();
        assert_eq!(state.number("amount"), dec!(10000));

        state.set_raw(&spec, "amount", "-5").unwrap();
        assert_eq!(state.number("amount"), dec!(0));
    }

    #[test]
    fn set_clamps_typed_numbers() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        state
            .set(&spec, "amount", InputValue::Number(dec!(-1)))
            .unwrap();

        assert_eq!(state.number("amount"), dec!(0));
    }

    #[test]
    fn set_raw_rejects_unknown_field() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        let result = state.set_raw(&spec, "nope", "1");

        assert_eq!(result, Err(InputError::UnknownField("nope".to_string())));
    }

    #[test]
    fn boolean_accepts_common_spellings() {
        for raw in ["true", "1", "YES", "on"] {
            assert!(coerce_bool(raw), "{raw} should be true");
        }
        for raw in ["false", "0", "no", "maybe", ""] {
            assert!(!coerce_bool(raw), "{raw} should be false");
        }
    }

    #[test]
    fn select_matches_numeric_option() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        state.set_raw(&spec, "vat_rate", "10.0").unwrap();

        assert_eq!(state.number("vat_rate"), dec!(10));
    }

    #[test]
    fn select_keeps_default_for_unknown_option() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        state.set_raw(&spec, "vat_rate", "17").unwrap();

        assert_eq!(state.number("vat_rate"), dec!(22));
    }

    #[test]
    fn date_keeps_default_when_unparseable() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        state.set_raw(&spec, "due_date", "31/12/2025").unwrap();
        assert_eq!(state.text("due_date"), Some("2025-06-30"));

        state.set_raw(&spec, "due_date", "2025-12-31").unwrap();
        assert_eq!(
            state.date("due_date"),
            NaiveDate::from_ymd_opt(2025, 12, 31)
        );
    }

    // =========================================================================
    // visibility
    // =========================================================================

    #[test]
    fn conditional_field_hidden_until_condition_holds() {
        let spec = test_spec();
        let mut state = InputState::from_spec(&spec);

        let ids: Vec<_> = state.visible_fields(&spec).iter().map(|f| f.id.as_str()).collect();
        assert!(!ids.contains(&"withholding_rate"));

        state.set_raw(&spec, "withholding", "yes").unwrap();

        let ids: Vec<_> = state.visible_fields(&spec).iter().map(|f| f.id.as_str()).collect();
        assert!(ids.contains(&"withholding_rate"));
    }

    #[test]
    fn state_round_trips_through_json() {
        let spec = test_spec();
        let state = InputState::from_spec(&spec);

        let json = serde_json::to_string(&state).unwrap();
        let back: InputState = serde_json::from_str(&json).unwrap();

        assert_eq!(back, state);
    }
}
