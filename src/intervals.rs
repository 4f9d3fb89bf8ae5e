//! Interval statistics over date-sorted transaction groups.
//!
//! Every periodicity classifier in the crate is built on the whole-day gap
//! sequence between chronologically consecutive transactions of a group.
//! This module derives that sequence and computes the statistics over it:
//! mean/stdev/coefficient of variation, EWMA deviation, a rescaled-range
//! Hurst estimate, and a Fourier dominant-frequency score.
//!
//! All statistics operate on integer day counts, never sub-day precision.
//! Division-by-zero and small-sample paths return documented sentinel
//! defaults instead of NaN — a feature vector must always be total.

use chrono::NaiveDate;

/// Minimum number of gaps required before the EWMA deviation is meaningful.
const MIN_EWMA_GAPS: usize = 3;

/// Minimum number of gaps required for the Hurst estimate.
const MIN_HURST_GAPS: usize = 4;

/// Minimum number of gaps required for the Fourier periodicity score.
const MIN_FOURIER_GAPS: usize = 6;

/// Whole-day gaps between consecutive dates, sorted ascending.
///
/// Returns an empty series for fewer than two dates. Duplicate dates
/// collapse to a gap of zero, which is legal input for every statistic
/// below. The input slice is never mutated; sorting happens on a copy.
pub fn gaps(dates: &[NaiveDate]) -> Vec<i64> {
    if dates.len() < 2 {
        return Vec::new();
    }
    let mut sorted = dates.to_vec();
    sorted.sort_unstable();
    sorted
        .windows(2)
        .map(|w| w[1].signed_duration_since(w[0]).num_days())
        .collect()
}

/// Arithmetic mean of a gap sequence; 0.0 for an empty sequence.
pub fn mean_gap(gaps: &[i64]) -> f64 {
    if gaps.is_empty() {
        return 0.0;
    }
    gaps.iter().sum::<i64>() as f64 / gaps.len() as f64
}

/// Sample standard deviation of a gap sequence; 0.0 for fewer than two gaps.
pub fn stdev_gap(gaps: &[i64]) -> f64 {
    if gaps.len() < 2 {
        return 0.0;
    }
    let mean = mean_gap(gaps);
    let variance = gaps
        .iter()
        .map(|&g| {
            let diff = g as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / (gaps.len() - 1) as f64;
    variance.sqrt()
}

/// Coefficient of variation of a gap sequence.
///
/// Returns 1.0 (maximally inconsistent) when the mean gap is zero or fewer
/// than two gaps exist. Duplicate-day spam would otherwise present a zero
/// mean as a perfectly clean recurring signal.
pub fn coefficient_of_variation(gaps: &[i64]) -> f64 {
    if gaps.len() < 2 {
        return 1.0;
    }
    let mean = mean_gap(gaps);
    if mean == 0.0 {
        return 1.0;
    }
    stdev_gap(gaps) / mean
}

/// Deviation of the most recent gap from the EWMA of the gaps before it.
///
/// The EWMA is seeded with the first gap and updated with smoothing factor
/// `alpha`. Returns `|last - ewma| / ewma`, or 1.0 when the EWMA is zero or
/// fewer than [`MIN_EWMA_GAPS`] gaps exist. A slowly-adapting baseline
/// tolerates one-off irregular intervals better than a flat mean.
pub fn ewma_deviation(gaps: &[i64], alpha: f64) -> f64 {
    if gaps.len() < MIN_EWMA_GAPS {
        return 1.0;
    }
    let (history, last) = gaps.split_at(gaps.len() - 1);
    let mut ewma = history[0] as f64;
    for &gap in &history[1..] {
        ewma = alpha * gap as f64 + (1.0 - alpha) * ewma;
    }
    if ewma == 0.0 {
        return 1.0;
    }
    (last[0] as f64 - ewma).abs() / ewma
}

/// Rescaled-range Hurst exponent estimate for a gap sequence.
///
/// Computes `sqrt(R/S)` where R is the range of cumulative deviations from
/// the mean and S the sample standard deviation. Returns 0.5
/// (random-walk-neutral) when fewer than [`MIN_HURST_GAPS`] gaps exist or
/// the deviation is zero. Values above 0.5 indicate persistent, trending
/// interval behavior; treat as a regularity proxy, not authoritative alone.
pub fn hurst_exponent(gaps: &[i64]) -> f64 {
    if gaps.len() < MIN_HURST_GAPS {
        return 0.5;
    }
    let mean = mean_gap(gaps);
    let mut cumulative = 0.0;
    let mut min_dev = f64::INFINITY;
    let mut max_dev = f64::NEG_INFINITY;
    for &gap in gaps {
        cumulative += gap as f64 - mean;
        min_dev = min_dev.min(cumulative);
        max_dev = max_dev.max(cumulative);
    }
    let s = stdev_gap(gaps);
    if s == 0.0 {
        return 0.5;
    }
    ((max_dev - min_dev) / s).sqrt()
}

/// Dominant-frequency share of the gap spectrum, in [0, 1].
///
/// Mean-centers the gap sequence, takes the discrete Fourier transform and
/// reports `max(|c[1..]|) / sum(|c[1..]|)`. A single dominant frequency
/// (clean periodicity) drives the score toward 1; a flat or noisy spectrum
/// drives it toward 0. Requires at least [`MIN_FOURIER_GAPS`] gaps (seven
/// dated transactions), else 0.0.
pub fn fourier_periodicity_score(gaps: &[i64]) -> f64 {
    if gaps.len() < MIN_FOURIER_GAPS {
        return 0.0;
    }
    let mean = mean_gap(gaps);
    let centered: Vec<f64> = gaps.iter().map(|&g| g as f64 - mean).collect();
    let magnitudes = dft_magnitudes(&centered);

    // Skip the DC component; the signal is already mean-centered but the
    // zero bin still only measures residual offset.
    let tail = &magnitudes[1..];
    let sum: f64 = tail.iter().sum();
    if sum == 0.0 {
        return 0.0;
    }
    let max = tail.iter().cloned().fold(0.0, f64::max);
    max / sum
}

/// Magnitudes of the full discrete Fourier transform of a real signal.
///
/// The gap sequences seen here are tiny (a handful to a few dozen values),
/// so the direct O(n²) transform is both sufficient and dependency-free.
fn dft_magnitudes(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let mut magnitudes = Vec::with_capacity(n);
    for k in 0..n {
        let mut re = 0.0;
        let mut im = 0.0;
        for (t, &x) in signal.iter().enumerate() {
            let angle = -2.0 * std::f64::consts::PI * (k * t) as f64 / n as f64;
            re += x * angle.cos();
            im += x * angle.sin();
        }
        magnitudes.push((re * re + im * im).sqrt());
    }
    magnitudes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn gaps_require_two_dates() {
        assert!(gaps(&[]).is_empty());
        assert!(gaps(&[date(2024, 1, 1)]).is_empty());
    }

    #[test]
    fn gaps_sort_internally() {
        let dates = vec![date(2024, 3, 1), date(2024, 1, 1), date(2024, 2, 1)];
        assert_eq!(gaps(&dates), vec![31, 29]);
    }

    #[test]
    fn duplicate_dates_collapse_to_zero_gap() {
        let dates = vec![date(2024, 1, 1), date(2024, 1, 1), date(2024, 1, 8)];
        assert_eq!(gaps(&dates), vec![0, 7]);
    }

    #[test]
    fn cv_is_one_for_zero_mean() {
        // All-duplicate dates: gaps of zero must not look like a clean signal.
        assert_eq!(coefficient_of_variation(&[0, 0, 0]), 1.0);
        assert_eq!(coefficient_of_variation(&[30]), 1.0);
        assert_eq!(coefficient_of_variation(&[]), 1.0);
    }

    #[test]
    fn cv_is_zero_for_perfectly_regular_gaps() {
        assert_eq!(coefficient_of_variation(&[30, 30, 30, 30]), 0.0);
    }

    #[test]
    fn stdev_matches_sample_formula() {
        // Gaps 28, 30, 32: mean 30, sample variance (4 + 0 + 4) / 2 = 4.
        let s = stdev_gap(&[28, 30, 32]);
        assert!((s - 2.0).abs() < 1e-12);
    }

    #[test]
    fn ewma_deviation_small_samples_are_maximal() {
        assert_eq!(ewma_deviation(&[30, 30], 0.3), 1.0);
        assert_eq!(ewma_deviation(&[], 0.3), 1.0);
    }

    #[test]
    fn ewma_deviation_zero_for_steady_gaps() {
        assert!(ewma_deviation(&[30, 30, 30, 30], 0.3).abs() < 1e-12);
    }

    #[test]
    fn ewma_deviation_flags_a_late_charge() {
        // Three steady monthly gaps, then a 45-day straggler.
        let deviation = ewma_deviation(&[30, 30, 30, 45], 0.3);
        assert!((deviation - 0.5).abs() < 1e-12);
    }

    #[test]
    fn hurst_defaults_to_half() {
        assert_eq!(hurst_exponent(&[30, 30, 30]), 0.5);
        assert_eq!(hurst_exponent(&[30, 30, 30, 30]), 0.5); // zero stdev
    }

    #[test]
    fn hurst_is_positive_for_varied_gaps() {
        let h = hurst_exponent(&[7, 30, 7, 30, 7, 30]);
        assert!(h > 0.0);
        assert!(h.is_finite());
    }

    #[test]
    fn fourier_requires_six_gaps() {
        assert_eq!(fourier_periodicity_score(&[30, 30, 30, 30, 30]), 0.0);
    }

    #[test]
    fn fourier_zero_spectrum_scores_zero() {
        // Constant gaps center to the zero signal.
        assert_eq!(fourier_periodicity_score(&[30; 8]), 0.0);
    }

    #[test]
    fn fourier_alternating_gaps_have_dominant_frequency() {
        // A strict 2-period alternation concentrates the spectrum in one
        // conjugate pair of bins.
        let score = fourier_periodicity_score(&[7, 30, 7, 30, 7, 30, 7, 30]);
        assert!(score > 0.4, "score was {}", score);
        assert!(score <= 1.0);
    }

    #[test]
    fn fourier_noisy_gaps_score_lower_than_periodic() {
        let periodic = fourier_periodicity_score(&[7, 30, 7, 30, 7, 30, 7, 30]);
        let noisy = fourier_periodicity_score(&[3, 19, 41, 8, 27, 13, 35, 5]);
        assert!(periodic > noisy);
    }
}
