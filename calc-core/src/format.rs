//! Locale-aware rendering of output values.
//!
//! | Locale | Currency       | Percent  | Count   |
//! |--------|----------------|----------|---------|
//! | `en`   | `$1,234.56`    | `22.13%` | `1,234` |
//! | `it`   | `1.234,56 €`   | `22,13%` | `1.234` |
//! | `es`   | `1.234,56 €`   | `22,13%` | `1.234` |

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::round_half_up;
use crate::models::{OutputUnit, OutputValue};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown locale '{0}'; expected one of: en, it, es")]
pub struct UnknownLocale(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    It,
    Es,
}

impl Locale {
    fn separators(self) -> (char, char) {
        match self {
            Self::En => (',', '.'),
            Self::It | Self::Es => ('.', ','),
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::It => "it",
            Self::Es => "es",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "it" => Ok(Self::It),
            "es" => Ok(Self::Es),
            other => Err(UnknownLocale(other.to_string())),
        }
    }
}

/// Inserts `separator` between groups of three digits.
fn group_digits(
    digits: &str,
    separator: char,
) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped
}

/// `|value|` with exactly `dp` decimals, grouped and using the locale
/// decimal mark. The sign is left to the caller.
fn format_magnitude(
    value: Decimal,
    dp: u32,
    locale: Locale,
) -> String {
    let (group, decimal) = locale.separators();
    let rounded = value
        .abs()
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.*}", dp as usize, rounded);

    match text.split_once('.') {
        Some((whole, fraction)) => format!("{}{decimal}{fraction}", group_digits(whole, group)),
        None => group_digits(&text, group),
    }
}

fn sign(value: Decimal) -> &'static str {
    if value.is_sign_negative() && !value.is_zero() {
        "-"
    } else {
        ""
    }
}

/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use calc_core::format::{Locale, format_currency};
///
/// assert_eq!(format_currency(dec!(1234.56), Locale::En), "$1,234.56");
/// assert_eq!(format_currency(dec!(1234.56), Locale::It), "1.234,56 €");
/// ```
pub fn format_currency(
    amount: Decimal,
    locale: Locale,
) -> String {
    let amount = round_half_up(amount);
    let magnitude = format_magnitude(amount, 2, locale);
    match locale {
        Locale::En => format!("{}${magnitude}", sign(amount)),
        Locale::It | Locale::Es => format!("{}{magnitude} €", sign(amount)),
    }
}

/// Renders a fraction as a percentage with two decimals (`0.2213` → `22.13%`).
pub fn format_percent(
    fraction: Decimal,
    locale: Locale,
) -> String {
    let points = round_half_up(fraction * Decimal::ONE_HUNDRED);
    format!("{}{}%", sign(points), format_magnitude(points, 2, locale))
}

pub fn format_count(
    value: Decimal,
    locale: Locale,
) -> String {
    let whole = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{}{}", sign(whole), format_magnitude(whole, 0, locale))
}

pub fn format_output(
    value: &OutputValue,
    unit: OutputUnit,
    locale: Locale,
) -> String {
    match (value, unit) {
        (OutputValue::Text(text), _) => text.clone(),
        (OutputValue::Number(n), OutputUnit::Currency) => format_currency(*n, locale),
        (OutputValue::Number(n), OutputUnit::Percent) => format_percent(*n, locale),
        (OutputValue::Number(n), OutputUnit::Count) => format_count(*n, locale),
        (OutputValue::Number(n), OutputUnit::Text) => n.normalize().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    // =========================================================================
    // currency
    // =========================================================================

    #[test]
    fn english_currency() {
        assert_eq!(format_currency(dec!(1234.56), Locale::En), "$1,234.56");
        assert_eq!(format_currency(dec!(1234567.891), Locale::En), "$1,234,567.89");
        assert_eq!(format_currency(dec!(0), Locale::En), "$0.00");
        assert_eq!(format_currency(dec!(12), Locale::En), "$12.00");
    }

    #[test]
    fn italian_and_spanish_currency() {
        assert_eq!(format_currency(dec!(1234.56), Locale::It), "1.234,56 €");
        assert_eq!(format_currency(dec!(1234.56), Locale::Es), "1.234,56 €");
        assert_eq!(format_currency(dec!(999.999), Locale::It), "1.000,00 €");
    }

    #[test]
    fn negative_currency_is_prefixed() {
        assert_eq!(format_currency(dec!(-1234.5), Locale::En), "-$1,234.50");
        assert_eq!(format_currency(dec!(-1234.5), Locale::It), "-1.234,50 €");
    }

    #[test]
    fn currency_rounds_half_up() {
        assert_eq!(format_currency(dec!(0.005), Locale::En), "$0.01");
        assert_eq!(format_currency(dec!(-0.001), Locale::En), "$0.00");
    }

    // =========================================================================
    // percent / count
    // =========================================================================

    #[test]
    fn percent_has_two_decimals() {
        assert_eq!(format_percent(dec!(0.2213358), Locale::En), "22.13%");
        assert_eq!(format_percent(dec!(0.05), Locale::It), "5,00%");
        assert_eq!(format_percent(dec!(-0.00113), Locale::En), "-0.11%");
    }

    #[test]
    fn count_is_grouped_integer() {
        assert_eq!(format_count(dec!(15000), Locale::En), "15,000");
        assert_eq!(format_count(dec!(1234567), Locale::Es), "1.234.567");
        assert_eq!(format_count(dec!(20), Locale::It), "20");
    }

    // =========================================================================
    // dispatch / locale parsing
    // =========================================================================

    #[test]
    fn output_dispatches_on_unit() {
        let number = OutputValue::Number(dec!(0.35));

        assert_eq!(format_output(&number, OutputUnit::Currency, Locale::En), "$0.35");
        assert_eq!(format_output(&number, OutputUnit::Percent, Locale::En), "35.00%");
        assert_eq!(
            format_output(&OutputValue::Text("1.1000".to_string()), OutputUnit::Text, Locale::It),
            "1.1000"
        );
    }

    #[test]
    fn locale_parses_case_insensitively() {
        assert_eq!("IT".parse::<Locale>(), Ok(Locale::It));
        assert_eq!(" es ".parse::<Locale>(), Ok(Locale::Es));
        assert_eq!("fr".parse::<Locale>(), Err(UnknownLocale("fr".to_string())));
        assert_eq!(Locale::default().to_string(), "en");
    }
}
