//! Period-by-period compounding with contributions and a management fee.
//!
//! For each of the `N = round(n × years)` periods:
//!
//! | Step | Operation                                         |
//! |------|---------------------------------------------------|
//! | 1    | `balance += contribution` (start of period)       |
//! | 2    | `grown = balance × (1 + r / n)`                   |
//! | 3    | `fee = grown × fee_rate / n`                      |
//! | 4    | `balance = grown − fee`                           |
//!
//! The projection is a pure function of its input: calling [`project`] twice
//! yields identical sequences. If a balance outgrows the `Decimal` range the
//! sequence stops at the last representable period.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::calculations::common::{compound_factor, non_negative, round_half_up};

/// Upper bound on simulated periods (daily compounding for 200 years).
pub const MAX_PERIODS: u32 = 365 * 200;

const ROOT_ITERATIONS: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundingInput {
    pub principal: Decimal,
    /// Nominal annual rate as a fraction (APR).
    pub annual_rate: Decimal,
    pub periods_per_year: u32,
    /// Horizon in years; may be fractional.
    pub years: Decimal,
    /// Added at the start of every period.
    pub contribution: Decimal,
    /// Annual fee as a fraction, charged pro rata on the grown balance.
    pub annual_fee_rate: Decimal,
}

/// Balance at the end of one period. Amounts are rounded to cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub period: u32,
    pub balance: Decimal,
    /// Cumulative contributions, excluding the principal.
    pub contributed: Decimal,
    /// Cumulative fees.
    pub fees: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    pub periods_per_year: u32,
    /// Indexed by period, `points[0]` being the opening principal.
    pub points: Vec<ProjectionPoint>,
    pub final_balance: Decimal,
    pub total_contributed: Decimal,
    pub total_interest: Decimal,
    pub total_fees: Decimal,
}

impl Projection {
    /// One point per completed year plus the final point if the horizon ends
    /// mid-year.
    pub fn yearly(&self) -> Vec<&ProjectionPoint> {
        let n = self.periods_per_year.max(1);
        let mut sampled: Vec<&ProjectionPoint> = self
            .points
            .iter()
            .filter(|p| p.period % n == 0)
            .collect();
        if let Some(last) = self.points.last() {
            if last.period % n != 0 {
                sampled.push(last);
            }
        }
        sampled
    }
}

/// Unrounded running state of a projection.
#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    balance: Decimal,
    contributed: Decimal,
    interest: Decimal,
    fees: Decimal,
}

impl Totals {
    /// One period of steps 1 to 4; `None` once any amount leaves the
    /// `Decimal` range.
    fn advance(
        self,
        contribution: Decimal,
        growth: Decimal,
        fee_rate: Decimal,
    ) -> Option<Self> {
        let funded = self.balance.checked_add(contribution)?;
        let grown = funded.checked_mul(growth)?;
        let fee = grown.checked_mul(fee_rate)?;

        Some(Self {
            balance: grown.checked_sub(fee)?,
            contributed: self.contributed.checked_add(contribution)?,
            interest: self.interest.checked_add(grown.checked_sub(funded)?)?,
            fees: self.fees.checked_add(fee)?,
        })
    }
}

/// Number of periods for a horizon, rounded half-up and capped at
/// [`MAX_PERIODS`].
pub fn period_count(
    periods_per_year: u32,
    years: Decimal,
) -> u32 {
    let exact = Decimal::from(periods_per_year.max(1)) * non_negative(years);
    exact
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(MAX_PERIODS)
        .min(MAX_PERIODS)
}

/// Runs the projection described in the module docs.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use calc_core::calculations::{CompoundingInput, project};
///
/// let projection = project(&CompoundingInput {
///     principal: dec!(1000),
///     annual_rate: dec!(0.20),
///     periods_per_year: 365,
///     years: dec!(1),
///     contribution: dec!(0),
///     annual_fee_rate: dec!(0),
/// });
///
/// assert_eq!(projection.points.len(), 366);
/// assert_eq!(projection.final_balance, dec!(1221.34));
/// ```
pub fn project(input: &CompoundingInput) -> Projection {
    let n = input.periods_per_year.max(1);
    let periods = period_count(n, input.years);
    let n_dec = Decimal::from(n);
    let growth = Decimal::ONE + input.annual_rate / n_dec;
    let fee_rate = non_negative(input.annual_fee_rate) / n_dec;
    let contribution = non_negative(input.contribution);

    let mut totals = Totals {
        balance: non_negative(input.principal),
        ..Totals::default()
    };

    let mut points = Vec::with_capacity(periods as usize + 1);
    points.push(ProjectionPoint {
        period: 0,
        balance: round_half_up(totals.balance),
        contributed: Decimal::ZERO,
        fees: Decimal::ZERO,
    });

    for period in 1..=periods {
        let Some(next) = totals.advance(contribution, growth, fee_rate) else {
            warn!(period, "balance overflowed decimal range, projection truncated");
            break;
        };
        totals = next;

        points.push(ProjectionPoint {
            period,
            balance: round_half_up(totals.balance),
            contributed: round_half_up(totals.contributed),
            fees: round_half_up(totals.fees),
        });
    }

    let final_balance = points
        .last()
        .map(|p| p.balance)
        .unwrap_or(Decimal::ZERO);

    Projection {
        periods_per_year: n,
        points,
        final_balance,
        total_contributed: round_half_up(totals.contributed),
        total_interest: round_half_up(totals.interest),
        total_fees: round_half_up(totals.fees),
    }
}

/// Effective annual yield of a nominal rate compounded `n` times a year:
/// `APY = (1 + APR / n)^n − 1`.
pub fn apy_from_apr(
    apr: Decimal,
    periods_per_year: u32,
) -> Decimal {
    let n = periods_per_year.max(1);
    compound_factor(apr / Decimal::from(n), n) - Decimal::ONE
}

/// Inverse of [`apy_from_apr`]: `APR = n × ((1 + APY)^(1/n) − 1)`.
pub fn apr_from_apy(
    apy: Decimal,
    periods_per_year: u32,
) -> Decimal {
    let n = periods_per_year.max(1);
    let n_dec = Decimal::from(n);
    n_dec * (nth_root(Decimal::ONE + apy, n) - Decimal::ONE)
}

/// Positive n-th root by Newton's method.
fn nth_root(
    value: Decimal,
    n: u32,
) -> Decimal {
    if value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if n == 1 {
        return value;
    }
    let n_dec = Decimal::from(n);
    let mut x = Decimal::ONE + (value - Decimal::ONE) / n_dec;
    for _ in 0..ROOT_ITERATIONS {
        let power = compound_factor(x - Decimal::ONE, n - 1);
        if power.is_zero() {
            break;
        }
        let next = x - (power * x - value) / (n_dec * power);
        if next == x {
            break;
        }
        x = next;
    }
    x
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::{prop_assert, proptest};
    use rust_decimal_macros::dec;

    use super::*;

    fn daily_input() -> CompoundingInput {
        CompoundingInput {
            principal: dec!(1000),
            annual_rate: dec!(0.20),
            periods_per_year: 365,
            years: dec!(1),
            contribution: dec!(0),
            annual_fee_rate: dec!(0),
        }
    }

    fn assert_close(
        actual: Decimal,
        expected: Decimal,
        tolerance: Decimal,
    ) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    // =========================================================================
    // project tests
    // =========================================================================

    #[test]
    fn daily_compounding_one_year() {
        let projection = project(&daily_input());

        assert_eq!(projection.points.len(), 366);
        assert_eq!(projection.points[0].balance, dec!(1000.00));
        assert_eq!(projection.final_balance, dec!(1221.34));
        assert_eq!(projection.total_interest, dec!(221.34));
        assert_eq!(projection.total_fees, dec!(0.00));
    }

    #[test]
    fn final_balance_equals_last_point() {
        let projection = project(&CompoundingInput {
            contribution: dec!(10),
            annual_fee_rate: dec!(0.01),
            ..daily_input()
        });

        assert_eq!(
            projection.final_balance,
            projection.points.last().unwrap().balance
        );
    }

    #[test]
    fn points_are_indexed_by_period() {
        let projection = project(&CompoundingInput {
            periods_per_year: 12,
            years: dec!(2),
            ..daily_input()
        });

        for (index, point) in projection.points.iter().enumerate() {
            assert_eq!(point.period as usize, index);
        }
    }

    #[test]
    fn projection_is_restartable() {
        let input = CompoundingInput {
            contribution: dec!(50),
            annual_fee_rate: dec!(0.005),
            ..daily_input()
        };

        assert_eq!(project(&input), project(&input));
    }

    #[test]
    fn annual_contribution_added_before_growth() {
        let projection = project(&CompoundingInput {
            principal: dec!(0),
            annual_rate: dec!(0.10),
            periods_per_year: 1,
            years: dec!(2),
            contribution: dec!(100),
            annual_fee_rate: dec!(0),
        });

        // (100 × 1.1 + 100) × 1.1 = 231
        assert_eq!(projection.final_balance, dec!(231.00));
        assert_eq!(projection.total_contributed, dec!(200.00));
        assert_eq!(projection.total_interest, dec!(31.00));
    }

    #[test]
    fn fee_is_charged_on_grown_balance() {
        let projection = project(&CompoundingInput {
            principal: dec!(1000),
            annual_rate: dec!(0.10),
            periods_per_year: 1,
            years: dec!(1),
            contribution: dec!(0),
            annual_fee_rate: dec!(0.02),
        });

        // grown = 1100, fee = 22
        assert_eq!(projection.total_fees, dec!(22.00));
        assert_eq!(projection.final_balance, dec!(1078.00));
    }

    #[test]
    fn overflowing_contribution_truncates_projection() {
        let projection = project(&CompoundingInput {
            principal: Decimal::MAX,
            annual_rate: dec!(0.05),
            periods_per_year: 12,
            years: dec!(1),
            contribution: dec!(1),
            annual_fee_rate: dec!(0.01),
        });

        assert_eq!(projection.points.len(), 1);
        assert_eq!(projection.final_balance, Decimal::MAX);
        assert_eq!(projection.total_contributed, dec!(0));
    }

    #[test]
    fn overflowing_growth_keeps_last_representable_period() {
        let projection = project(&CompoundingInput {
            principal: Decimal::MAX / dec!(3),
            annual_rate: dec!(1),
            periods_per_year: 1,
            years: dec!(5),
            contribution: dec!(0),
            annual_fee_rate: dec!(0),
        });

        // × 2 fits once, the second doubling does not.
        assert_eq!(projection.points.len(), 2);
    }

    #[test]
    fn fractional_years_round_to_nearest_period() {
        assert_eq!(period_count(12, dec!(1.5)), 18);
        assert_eq!(period_count(4, dec!(0.375)), 2);
        assert_eq!(period_count(1, dec!(2.5)), 3);
        assert_eq!(period_count(365, dec!(-1)), 0);
    }

    #[test]
    fn zero_periods_per_year_treated_as_annual() {
        let projection = project(&CompoundingInput {
            periods_per_year: 0,
            years: dec!(3),
            ..daily_input()
        });

        assert_eq!(projection.periods_per_year, 1);
        assert_eq!(projection.points.len(), 4);
    }

    #[test]
    fn yearly_samples_year_ends_and_partial_tail() {
        let projection = project(&CompoundingInput {
            periods_per_year: 12,
            years: dec!(2.5),
            ..daily_input()
        });

        let periods: Vec<u32> = projection.yearly().iter().map(|p| p.period).collect();

        assert_eq!(periods, vec![0, 12, 24, 30]);
    }

    // =========================================================================
    // APR / APY tests
    // =========================================================================

    #[test]
    fn apy_for_daily_twenty_percent() {
        let apy = apy_from_apr(dec!(0.20), 365);

        assert_close(apy, dec!(0.2213358), dec!(0.0000001));
    }

    #[test]
    fn apy_for_annual_compounding_equals_apr() {
        assert_eq!(apy_from_apr(dec!(0.07), 1), dec!(0.07));
    }

    #[test]
    fn apr_from_apy_inverts_apy_from_apr() {
        let apy = apy_from_apr(dec!(0.12), 12);

        assert_close(apr_from_apy(apy, 12), dec!(0.12), dec!(0.000000001));
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_apy_matches_direct_simulation(rate_bp in 0u32..5_000, n_index in 0usize..5) {
            let n = [1u32, 4, 12, 52, 365][n_index];
            let apr = Decimal::new(i64::from(rate_bp), 4);

            let mut balance = Decimal::ONE;
            for _ in 0..n {
                balance *= Decimal::ONE + apr / Decimal::from(n);
            }
            let simulated = balance - Decimal::ONE;

            prop_assert!((apy_from_apr(apr, n) - simulated).abs() <= dec!(0.000000001));
        }

        #[test]
        fn prop_balances_non_negative_without_fees(
            principal in 0u32..100_000,
            rate_bp in 0u32..3_000,
            contribution in 0u32..1_000,
        ) {
            let projection = project(&CompoundingInput {
                principal: Decimal::from(principal),
                annual_rate: Decimal::new(i64::from(rate_bp), 4),
                periods_per_year: 12,
                years: dec!(3),
                contribution: Decimal::from(contribution),
                annual_fee_rate: dec!(0),
            });

            prop_assert!(projection.points.iter().all(|p| p.balance >= Decimal::ZERO));
            prop_assert!(projection.final_balance >= Decimal::from(principal));
        }
    }
}
