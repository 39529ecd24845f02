//! Ordered composition of additive levies and subtractive items over a base.
//!
//! The order of components is part of the contract: each line's base is
//! computed from the raw amount and the lines before it, so moving a levy
//! changes every figure that follows. A typical professional invoice:
//!
//! | Order | Line          | Kind      | Base                         |
//! |-------|---------------|-----------|------------------------------|
//! | 1     | `surcharge`   | levy      | fee                          |
//! | 2     | `vat`         | levy      | fee + surcharge (running)    |
//! | 3     | `stamp_duty`  | fixed     | fee + surcharge + vat        |
//! | 4     | `withholding` | deduction | fee + surcharge (subtotal)   |
//!
//! Every line records the base it was computed on, so any subtotal can be
//! reproduced as `round_half_up(base × rate)`.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::{non_negative, round_half_up};
use crate::calculations::lookup::BandTable;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AssemblyError {
    #[error("duplicate line id '{0}'")]
    DuplicateLine(String),

    #[error("line '{line}' refers to '{referenced}', which is not an earlier levy")]
    UnknownReference { line: String, referenced: String },

    #[error("levy '{levy}' is declared after deduction '{deduction}'")]
    LevyAfterDeduction { levy: String, deduction: String },
}

/// What a component's amount is computed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevyBase {
    /// The raw base amount only.
    Net,
    /// The raw base plus every levy computed so far.
    Running,
    /// The raw base plus the named earlier levies.
    Subtotal(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Levy,
    Deduction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Amount {
    Rate(Decimal),
    Banded(BandTable),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Component {
    id: String,
    kind: LineKind,
    amount: Amount,
    base: LevyBase,
}

/// One computed line of an [`Assembly`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyLine {
    pub id: String,
    pub kind: LineKind,
    pub base: Decimal,
    /// `None` for fixed amounts chosen from a band table.
    pub rate: Option<Decimal>,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assembly {
    pub base: Decimal,
    pub lines: Vec<AssemblyLine>,
    /// Base plus every levy.
    pub gross_total: Decimal,
    pub deductions_total: Decimal,
    /// Gross total minus every deduction.
    pub net_total: Decimal,
}

impl Assembly {
    pub fn line(
        &self,
        id: &str,
    ) -> Option<&AssemblyLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    /// Amount of a line; zero if the line is absent.
    pub fn amount(
        &self,
        id: &str,
    ) -> Decimal {
        self.line(id).map_or(Decimal::ZERO, |l| l.amount)
    }
}

#[derive(Debug, Default)]
pub struct InvoiceAssemblerBuilder {
    components: Vec<Component>,
}

impl InvoiceAssemblerBuilder {
    /// Adds a proportional levy.
    pub fn levy(
        mut self,
        id: &str,
        rate: Decimal,
        base: LevyBase,
    ) -> Self {
        self.components.push(Component {
            id: id.to_string(),
            kind: LineKind::Levy,
            amount: Amount::Rate(rate),
            base,
        });
        self
    }

    /// Adds a levy whose amount is looked up from `table` using its base.
    pub fn fixed(
        mut self,
        id: &str,
        table: BandTable,
        base: LevyBase,
    ) -> Self {
        self.components.push(Component {
            id: id.to_string(),
            kind: LineKind::Levy,
            amount: Amount::Banded(table),
            base,
        });
        self
    }

    /// Adds a proportional item subtracted from the gross total.
    pub fn deduction(
        mut self,
        id: &str,
        rate: Decimal,
        base: LevyBase,
    ) -> Self {
        self.components.push(Component {
            id: id.to_string(),
            kind: LineKind::Deduction,
            amount: Amount::Rate(rate),
            base,
        });
        self
    }

    /// # Errors
    ///
    /// Returns [`AssemblyError`] if an id repeats, a subtotal names
    /// something other than an earlier levy, or a levy follows a deduction.
    /// Deductions are always computed on the finished levies.
    pub fn build(self) -> Result<InvoiceAssembler, AssemblyError> {
        let mut ids = HashSet::new();
        let mut levies = HashSet::new();
        let mut first_deduction: Option<&str> = None;

        for component in &self.components {
            if let LevyBase::Subtotal(names) = &component.base {
                if let Some(unknown) = names.iter().find(|n| !levies.contains(n.as_str())) {
                    return Err(AssemblyError::UnknownReference {
                        line: component.id.clone(),
                        referenced: unknown.clone(),
                    });
                }
            }
            if !ids.insert(component.id.as_str()) {
                return Err(AssemblyError::DuplicateLine(component.id.clone()));
            }
            match component.kind {
                LineKind::Levy => {
                    if let Some(deduction) = first_deduction {
                        return Err(AssemblyError::LevyAfterDeduction {
                            levy: component.id.clone(),
                            deduction: deduction.to_string(),
                        });
                    }
                    levies.insert(component.id.as_str());
                }
                LineKind::Deduction => {
                    first_deduction.get_or_insert(component.id.as_str());
                }
            }
        }

        Ok(InvoiceAssembler {
            components: self.components,
        })
    }
}

/// A validated, ordered list of levies and deductions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceAssembler {
    components: Vec<Component>,
}

impl InvoiceAssembler {
    pub fn builder() -> InvoiceAssemblerBuilder {
        InvoiceAssemblerBuilder::default()
    }

    /// Computes every line in declaration order. A negative base is treated
    /// as zero.
    pub fn assemble(
        &self,
        base: Decimal,
    ) -> Assembly {
        let base = round_half_up(non_negative(base));
        let mut lines: Vec<AssemblyLine> = Vec::with_capacity(self.components.len());
        let mut levies_total = Decimal::ZERO;
        let mut deductions_total = Decimal::ZERO;

        for component in &self.components {
            let line_base = match &component.base {
                LevyBase::Net => base,
                LevyBase::Running => base + levies_total,
                LevyBase::Subtotal(names) => {
                    base + lines
                        .iter()
                        .filter(|l| l.kind == LineKind::Levy && names.contains(&l.id))
                        .map(|l| l.amount)
                        .sum::<Decimal>()
                }
            };

            let (rate, amount) = match &component.amount {
                Amount::Rate(rate) => (Some(*rate), round_half_up(line_base * *rate)),
                Amount::Banded(table) => (None, round_half_up(table.lookup(line_base))),
            };

            match component.kind {
                LineKind::Levy => levies_total += amount,
                LineKind::Deduction => deductions_total += amount,
            }

            lines.push(AssemblyLine {
                id: component.id.clone(),
                kind: component.kind,
                base: line_base,
                rate,
                amount,
            });
        }

        let gross_total = base + levies_total;
        Assembly {
            base,
            lines,
            gross_total,
            deductions_total,
            net_total: gross_total - deductions_total,
        }
    }
}
