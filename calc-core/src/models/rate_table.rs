use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when a rate table violates its ordering invariants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RateTableError {
    #[error("rate table has no bands")]
    Empty,

    #[error("band {index} upper bound {bound} must be greater than zero")]
    NonPositiveBound { index: usize, bound: Decimal },

    #[error("band {index} upper bound {bound} is not greater than the previous bound {previous}")]
    NotIncreasing {
        index: usize,
        bound: Decimal,
        previous: Decimal,
    },

    #[error("unbounded band at position {0} must be the last band")]
    UnboundedNotLast(usize),

    #[error("band {index} has a negative rate {rate}")]
    NegativeRate { index: usize, rate: Decimal },
}

/// One entry of a rate table. `upper_bound == None` means the band extends to
/// infinity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateBand {
    pub upper_bound: Option<Decimal>,
    pub rate: Decimal,
}

impl RateBand {
    pub fn bounded(
        upper_bound: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            upper_bound: Some(upper_bound),
            rate,
        }
    }

    pub fn unbounded(rate: Decimal) -> Self {
        Self {
            upper_bound: None,
            rate,
        }
    }
}

/// An ordered list of bands with strictly increasing upper bounds.
///
/// The same table shape backs both progressive schedules (rates are marginal
/// percentages) and step lookups (the "rate" is a fixed amount), so the rate
/// column is not restricted to `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RateBand>", into = "Vec<RateBand>")]
pub struct RateTable {
    bands: Vec<RateBand>,
}

impl RateTable {
    /// Validates and wraps `bands`.
    ///
    /// # Errors
    ///
    /// Returns [`RateTableError`] if the list is empty, a bound is zero or
    /// negative, bounds are not strictly increasing, an unbounded band is
    /// followed by another band, or any rate is negative.
    pub fn new(bands: Vec<RateBand>) -> Result<Self, RateTableError> {
        if bands.is_empty() {
            return Err(RateTableError::Empty);
        }

        let mut previous: Option<Decimal> = None;
        for (index, band) in bands.iter().enumerate() {
            if band.rate < Decimal::ZERO {
                return Err(RateTableError::NegativeRate {
                    index,
                    rate: band.rate,
                });
            }
            match band.upper_bound {
                None if index + 1 != bands.len() => {
                    return Err(RateTableError::UnboundedNotLast(index));
                }
                None => {}
                Some(bound) => {
                    if bound <= Decimal::ZERO {
                        return Err(RateTableError::NonPositiveBound { index, bound });
                    }
                    if let Some(prev) = previous.filter(|prev| bound <= *prev) {
                        return Err(RateTableError::NotIncreasing {
                            index,
                            bound,
                            previous: prev,
                        });
                    }
                    previous = Some(bound);
                }
            }
        }

        Ok(Self { bands })
    }

    pub fn bands(&self) -> &[RateBand] {
        &self.bands
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// The last band, used when a value exceeds every declared bound.
    pub fn last(&self) -> &RateBand {
        // Non-empty by construction.
        &self.bands[self.bands.len() - 1]
    }
}

impl TryFrom<Vec<RateBand>> for RateTable {
    type Error = RateTableError;

    fn try_from(bands: Vec<RateBand>) -> Result<Self, Self::Error> {
        Self::new(bands)
    }
}

impl From<RateTable> for Vec<RateBand> {
    fn from(table: RateTable) -> Self {
        table.bands
    }
}
