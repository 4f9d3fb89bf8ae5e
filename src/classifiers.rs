//! Heuristic pattern classifiers over user/vendor transaction groups.
//!
//! Each classifier is a pure function of the target transaction and a
//! group resolved through [`HistoryIndex`](crate::history::HistoryIndex).
//! They share the tuning knobs in [`ClassifierConfig`] and the interval
//! statistics from [`intervals`](crate::intervals). None of them mutate
//! state or allocate beyond scratch space, and all of them return a
//! defined value for degenerate groups (empty, singleton, all-same-day).

use chrono::{Datelike, NaiveDate};

use crate::data::Transaction;
use crate::intervals;

/// Base intervals (in days) that count as subscription-like billing cycles.
const BILLING_CYCLES: [i64; 4] = [7, 14, 30, 60];

/// Gap range treated as a weekly cycle, inclusive.
const WEEKLY_RANGE: (i64, i64) = (6, 8);

/// Gap range treated as a monthly cycle, inclusive.
const MONTHLY_RANGE: (i64, i64) = (28, 31);

/// Gap range treated as an annual (seasonal) cycle, inclusive.
const ANNUAL_RANGE: (i64, i64) = (360, 370);

/// Tuning knobs shared by the pattern classifiers.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Slack (in days) when matching a gap against a billing cycle
    pub n_days_off: i64,
    /// Slack (in days) when matching gaps against the 30-day fixed interval
    pub margin_days: i64,
    /// Relative tolerance when comparing amounts
    pub amount_tolerance: f64,
    /// Minimum group size before interval patterns are trusted
    pub min_occurrences: usize,
    /// Smoothing factor for the EWMA interval baseline
    pub ewma_alpha: f64,
    /// Fraction of gaps that must fall in a cycle range for a consistency flag
    pub consistency_threshold: f64,
    /// Sample z-score magnitude above which an amount is an outlier
    pub outlier_z: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            n_days_off: 0,
            margin_days: 1,
            amount_tolerance: 0.05,
            min_occurrences: 3,
            ewma_alpha: 0.3,
            consistency_threshold: 0.7,
            outlier_z: 2.0,
        }
    }
}

/// Gap-cadence verdicts derived from one pass over a group's gap sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemporalConsistency {
    /// Average of the weekly and monthly gap fractions, in [0, 1]
    pub score: f64,
    /// True when the monthly gap fraction clears the consistency threshold
    pub is_monthly_consistent: bool,
    /// True when the weekly gap fraction clears the consistency threshold
    pub is_weekly_consistent: bool,
}

fn sorted_dates(group: &[&Transaction]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = group.iter().map(|t| t.date).collect();
    dates.sort_unstable();
    dates
}

fn in_range(gap: i64, (lo, hi): (i64, i64)) -> bool {
    gap >= lo && gap <= hi
}

/// Integer cents of an amount, robust to binary float representation.
fn cents(amount: f64) -> i64 {
    ((amount * 100.0).round() as i64).rem_euclid(100)
}

/// Whether the amount ends in .99.
pub fn ends_in_99(amount: f64) -> bool {
    cents(amount) == 99
}

/// Whether the amount is a whole-dollar figure.
pub fn ends_in_00(amount: f64) -> bool {
    cents(amount) == 0
}

/// Longest run of consecutive billing-cycle gaps, counted in transactions.
///
/// A gap matches when it lands within `n_days_off` of any base cycle in
/// [`BILLING_CYCLES`]. A single dated transaction is a streak of one.
pub fn interval_streak(dates: &[NaiveDate], n_days_off: i64) -> usize {
    if dates.is_empty() {
        return 0;
    }
    let gaps = intervals::gaps(dates);
    let mut best = 1;
    let mut current = 1;
    for gap in gaps {
        let matches = BILLING_CYCLES
            .iter()
            .any(|&cycle| (gap - cycle).abs() <= n_days_off);
        if matches {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    best
}

/// Price-pattern recurrence: a .99 price charged on a billing-cycle streak.
///
/// Requires the target amount to end in .99, at least
/// `config.min_occurrences` transactions in the group, and a streak of at
/// least three transactions whose gaps match a billing cycle.
pub fn is_recurring_based_on_price_pattern(
    tx: &Transaction,
    group: &[&Transaction],
    config: &ClassifierConfig,
) -> bool {
    if !ends_in_99(tx.amount) || group.len() < config.min_occurrences {
        return false;
    }
    interval_streak(&sorted_dates(group), config.n_days_off) >= 3
}

/// Whether every gap in the group sits on the 30-day cycle within
/// `config.margin_days`. False for fewer than two dated transactions.
pub fn is_fixed_interval_recurring(group: &[&Transaction], config: &ClassifierConfig) -> bool {
    let gaps = intervals::gaps(&sorted_dates(group));
    if gaps.is_empty() {
        return false;
    }
    gaps.iter().all(|&gap| (gap - 30).abs() <= config.margin_days)
}

/// Whether every gap in the group is an annual cycle. Requires at least
/// two dated transactions.
pub fn is_seasonal(group: &[&Transaction]) -> bool {
    let gaps = intervals::gaps(&sorted_dates(group));
    !gaps.is_empty() && gaps.iter().all(|&gap| in_range(gap, ANNUAL_RANGE))
}

/// Fraction of group dates landing within one day of the modal day-of-month.
///
/// Ties on the modal day break toward the smallest day. Returns 0.0 for
/// fewer than two transactions.
pub fn day_of_month_consistency(group: &[&Transaction]) -> f64 {
    if group.len() < 2 {
        return 0.0;
    }
    let mut counts = [0usize; 32];
    for tx in group {
        counts[tx.date.day() as usize] += 1;
    }
    let modal_day = (1..32)
        .max_by_key(|&day| (counts[day], std::cmp::Reverse(day)))
        .unwrap_or(1) as i64;
    let near = group
        .iter()
        .filter(|tx| (tx.date.day() as i64 - modal_day).abs() <= 1)
        .count();
    near as f64 / group.len() as f64
}

/// Whether at least three transactions all fall on the same weekday.
pub fn is_weekday_consistent(group: &[&Transaction]) -> bool {
    if group.len() < 3 {
        return false;
    }
    let first = group[0].date.weekday();
    group.iter().all(|tx| tx.date.weekday() == first)
}

/// Gap-cadence consistency over the group's interval sequence.
///
/// The score averages the weekly and monthly gap fractions; the flags fire
/// when the corresponding fraction clears `config.consistency_threshold`.
/// Degenerate groups (fewer than two dates) score 0.0 with both flags off.
pub fn temporal_consistency(group: &[&Transaction], config: &ClassifierConfig) -> TemporalConsistency {
    let gaps = intervals::gaps(&sorted_dates(group));
    if gaps.is_empty() {
        return TemporalConsistency {
            score: 0.0,
            is_monthly_consistent: false,
            is_weekly_consistent: false,
        };
    }
    let total = gaps.len() as f64;
    let weekly = gaps.iter().filter(|&&g| in_range(g, WEEKLY_RANGE)).count() as f64 / total;
    let monthly = gaps.iter().filter(|&&g| in_range(g, MONTHLY_RANGE)).count() as f64 / total;
    TemporalConsistency {
        score: (weekly + monthly) / 2.0,
        is_monthly_consistent: monthly > config.consistency_threshold,
        is_weekly_consistent: weekly > config.consistency_threshold,
    }
}

/// Fraction of group amounts exactly equal to the target's.
///
/// The canonical amount-stability signal: exact equality, no tolerance
/// band. Returns 0.0 for fewer than two transactions, so a one-off charge
/// scores the neutral default instead of trivially agreeing with itself.
pub fn amount_consistency(tx: &Transaction, group: &[&Transaction]) -> f64 {
    if group.len() < 2 {
        return 0.0;
    }
    let same = group.iter().filter(|t| t.amount == tx.amount).count();
    same as f64 / group.len() as f64
}

/// Whether two amounts agree within the relative tolerance band.
///
/// A zero target amount only matches exactly.
pub fn amounts_match(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance * b.abs()
}

/// Number of group transactions whose amount matches the target's within
/// `config.amount_tolerance`.
pub fn n_transactions_same_amount(
    tx: &Transaction,
    group: &[&Transaction],
    config: &ClassifierConfig,
) -> usize {
    group
        .iter()
        .filter(|t| amounts_match(t.amount, tx.amount, config.amount_tolerance))
        .count()
}

/// Fraction of group transactions whose amount matches the target's.
///
/// Counts the target itself, so a singleton group scores 1.0 and a group
/// of three distinct amounts scores one third.
pub fn pct_transactions_same_amount(
    tx: &Transaction,
    group: &[&Transaction],
    config: &ClassifierConfig,
) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    n_transactions_same_amount(tx, group, config) as f64 / group.len() as f64
}

/// Number of group transactions whose date is (approximately) a whole
/// multiple of `n_days_apart` days away from the target.
///
/// A distance matches when its remainder modulo the cycle is within
/// `n_days_off` of zero or of the full cycle. Distances shorter than one
/// slack-adjusted cycle (including the target itself) never count.
pub fn n_transactions_days_apart(
    tx: &Transaction,
    group: &[&Transaction],
    n_days_apart: i64,
    n_days_off: i64,
) -> usize {
    group
        .iter()
        .filter(|t| {
            let days = (t.date - tx.date).num_days().abs();
            if days < n_days_apart - n_days_off {
                return false;
            }
            let remainder = days % n_days_apart;
            remainder <= n_days_off || n_days_apart - remainder <= n_days_off
        })
        .count()
}

/// Fraction form of [`n_transactions_days_apart`].
pub fn pct_transactions_days_apart(
    tx: &Transaction,
    group: &[&Transaction],
    n_days_apart: i64,
    n_days_off: i64,
) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    n_transactions_days_apart(tx, group, n_days_apart, n_days_off) as f64 / group.len() as f64
}

/// Number of group transactions whose day-of-month is within `n_days_off`
/// of the target's. The target counts toward its own total.
pub fn n_transactions_same_day(tx: &Transaction, group: &[&Transaction], n_days_off: i64) -> usize {
    let day = tx.date.day() as i64;
    group
        .iter()
        .filter(|t| (t.date.day() as i64 - day).abs() <= n_days_off)
        .count()
}

/// Fraction form of [`n_transactions_same_day`].
pub fn pct_transactions_same_day(tx: &Transaction, group: &[&Transaction], n_days_off: i64) -> f64 {
    if group.is_empty() {
        return 0.0;
    }
    n_transactions_same_day(tx, group, n_days_off) as f64 / group.len() as f64
}

/// Probability that the amount repeats given the last few group amounts.
///
/// Order-`n` Markov check: 1.0 when the last `n + 1` amounts in date order
/// are all identical, otherwise 0.0. Groups with `n` or fewer transactions
/// score 0.0.
pub fn markovian_probability(group: &[&Transaction], n: usize) -> f64 {
    if group.len() <= n {
        return 0.0;
    }
    let mut ordered: Vec<&&Transaction> = group.iter().collect();
    ordered.sort_by_key(|t| t.date);
    let tail = &ordered[ordered.len() - (n + 1)..];
    let first = tail[0].amount;
    if tail.iter().all(|t| t.amount == first) {
        1.0
    } else {
        0.0
    }
}

/// Trial-period conversion: the group's earliest charge is zero and every
/// later charge is positive. Requires at least two transactions.
pub fn has_trial_period(group: &[&Transaction]) -> bool {
    if group.len() < 2 {
        return false;
    }
    let mut ordered: Vec<&&Transaction> = group.iter().collect();
    ordered.sort_by_key(|t| t.date);
    ordered[0].amount == 0.0 && ordered[1..].iter().all(|t| t.amount > 0.0)
}

/// Whether the target amount spikes above 1.5x the group's mean amount.
pub fn has_irregular_spike(tx: &Transaction, group: &[&Transaction]) -> bool {
    if group.len() < 2 {
        return false;
    }
    let mean = group.iter().map(|t| t.amount).sum::<f64>() / group.len() as f64;
    mean > 0.0 && tx.amount > 1.5 * mean
}

/// Days since the most recent strictly earlier transaction in the group.
///
/// Returns 0 when the target is the earliest (or only) transaction.
pub fn days_since_last(tx: &Transaction, group: &[&Transaction]) -> i64 {
    group
        .iter()
        .filter(|t| t.date < tx.date)
        .map(|t| (tx.date - t.date).num_days())
        .min()
        .unwrap_or(0)
}

/// Sample z-score of the target amount within the group's amounts.
///
/// Returns 0.0 when the group is too small or has zero spread.
pub fn amount_z_score(tx: &Transaction, group: &[&Transaction]) -> f64 {
    if group.len() < 2 {
        return 0.0;
    }
    let amounts: Vec<f64> = group.iter().map(|t| t.amount).collect();
    let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
    let variance = amounts
        .iter()
        .map(|a| {
            let diff = a - mean;
            diff * diff
        })
        .sum::<f64>()
        / (amounts.len() - 1) as f64;
    let stdev = variance.sqrt();
    if stdev == 0.0 {
        return 0.0;
    }
    (tx.amount - mean) / stdev
}

/// Whether the target amount is an outlier against the user's full history.
pub fn is_amount_outlier(tx: &Transaction, user_group: &[&Transaction], config: &ClassifierConfig) -> bool {
    amount_z_score(tx, user_group).abs() > config.outlier_z
}

/// Coefficient of variation of the group's amounts; 0.0 when degenerate.
pub fn amount_coefficient_of_variation(group: &[&Transaction]) -> f64 {
    if group.len() < 2 {
        return 0.0;
    }
    let amounts: Vec<f64> = group.iter().map(|t| t.amount).collect();
    let mean = amounts.iter().sum::<f64>() / amounts.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    let variance = amounts
        .iter()
        .map(|a| {
            let diff = a - mean;
            diff * diff
        })
        .sum::<f64>()
        / (amounts.len() - 1) as f64;
    variance.sqrt() / mean
}

/// Blended recurrence confidence in [0, 1].
///
/// Weights amount stability ([`amount_consistency`]) and gap cadence
/// equally, with a smaller contribution from the vendor prior supplied by
/// the caller. Monotonic in each input; clamped.
pub fn recurring_confidence_score(tx: &Transaction, group: &[&Transaction], vendor_prior: f64) -> f64 {
    let amount = amount_consistency(tx, group);
    let gaps = intervals::gaps(&sorted_dates(group));
    let cadence = if gaps.is_empty() {
        0.0
    } else {
        let total = gaps.len() as f64;
        let weekly = gaps.iter().filter(|&&g| in_range(g, WEEKLY_RANGE)).count() as f64 / total;
        let monthly = gaps.iter().filter(|&&g| in_range(g, MONTHLY_RANGE)).count() as f64 / total;
        weekly.max(monthly)
    };
    (0.4 * amount + 0.4 * cadence + 0.2 * vendor_prior).clamp(0.0, 1.0)
}
