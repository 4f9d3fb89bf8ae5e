//! Feature aggregation: one total, deterministic vector per transaction.
//!
//! [`FeatureExtractor`] wires the vendor knowledge, interval statistics and
//! pattern classifiers into a single vector keyed by stable feature names.
//! The vector is total: every extraction yields every feature name with a
//! defined value, no matter how degenerate the history is, so downstream
//! model code can rely on a fixed column set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classifiers::{self, ClassifierConfig};
use crate::data::Transaction;
use crate::history::HistoryIndex;
use crate::intervals;
use crate::vendors::VendorKnowledge;

/// A single feature value.
///
/// Serializes untagged so a vector renders as plain JSON scalars. Booleans
/// widen to 0.0/1.0 through [`FeatureValue::as_f64`] for model consumption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl FeatureValue {
    /// Numeric view of the value.
    pub fn as_f64(&self) -> f64 {
        match *self {
            FeatureValue::Bool(b) => f64::from(u8::from(b)),
            FeatureValue::Int(i) => i as f64,
            FeatureValue::Float(f) => f,
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(value: bool) -> Self {
        FeatureValue::Bool(value)
    }
}

impl From<i64> for FeatureValue {
    fn from(value: i64) -> Self {
        FeatureValue::Int(value)
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Float(value)
    }
}

/// A named, ordered feature vector. `BTreeMap` keeps column order stable.
pub type FeatureVector = BTreeMap<String, FeatureValue>;

/// Computes the full feature vector for transactions against their history.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ClassifierConfig,
    knowledge: VendorKnowledge,
}

impl FeatureExtractor {
    /// Build an extractor from explicit configuration and vendor knowledge.
    pub fn new(config: ClassifierConfig, knowledge: VendorKnowledge) -> Self {
        Self { config, knowledge }
    }

    /// Borrow the classifier configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Extract the feature vector for one transaction.
    ///
    /// `transactions` must be the same slice `index` was built from.
    pub fn extract(
        &self,
        tx: &Transaction,
        transactions: &[Transaction],
        index: &HistoryIndex,
    ) -> FeatureVector {
        let group = index.user_vendor_group(transactions, tx);
        let vendor_group = index.vendor_group(transactions, tx);
        let user_group = index.user_group(transactions, tx);

        let mut dates: Vec<_> = group.iter().map(|t| t.date).collect();
        dates.sort_unstable();
        let gaps = intervals::gaps(&dates);

        let vendor_prior = if self.knowledge.is_always_recurring(&tx.name) {
            1.0
        } else {
            self.knowledge.subscription_keyword_score(&tx.name)
        };
        let temporal = classifiers::temporal_consistency(&group, &self.config);

        let mut features = FeatureVector::new();
        let mut put = |name: &str, value: FeatureValue| {
            features.insert(name.to_string(), value);
        };

        // Vendor priors
        put("is_always_recurring", self.knowledge.is_always_recurring(&tx.name).into());
        put("is_utility", self.knowledge.is_utility(&tx.name).into());
        put("is_phone", self.knowledge.is_phone(&tx.name).into());
        put("is_insurance", self.knowledge.is_insurance(&tx.name).into());
        put(
            "is_common_subscription_amount",
            self.knowledge.is_common_subscription_amount(tx.amount).into(),
        );
        put(
            "subscription_keyword_score",
            self.knowledge.subscription_keyword_score(&tx.name).into(),
        );

        // Amount shape
        put("ends_in_99", classifiers::ends_in_99(tx.amount).into());
        put("ends_in_00", classifiers::ends_in_00(tx.amount).into());
        put("amount_consistency", classifiers::amount_consistency(tx, &group).into());
        put(
            "n_transactions_same_amount",
            (classifiers::n_transactions_same_amount(tx, &group, &self.config) as i64).into(),
        );
        put(
            "pct_transactions_same_amount",
            classifiers::pct_transactions_same_amount(tx, &group, &self.config).into(),
        );
        put(
            "amount_coefficient_of_variation",
            classifiers::amount_coefficient_of_variation(&group).into(),
        );
        put("amount_z_score", classifiers::amount_z_score(tx, &user_group).into());
        put(
            "is_amount_outlier",
            classifiers::is_amount_outlier(tx, &user_group, &self.config).into(),
        );
        put(
            "has_irregular_spike",
            classifiers::has_irregular_spike(tx, &group).into(),
        );
        put(
            "markovian_probability",
            classifiers::markovian_probability(&group, 3).into(),
        );

        // Timing
        put("days_since_last", classifiers::days_since_last(tx, &group).into());
        for cycle in [7i64, 14, 30, 60] {
            put(
                &format!("n_transactions_days_apart_{}", cycle),
                (classifiers::n_transactions_days_apart(tx, &group, cycle, self.config.n_days_off)
                    as i64)
                    .into(),
            );
            put(
                &format!("pct_transactions_days_apart_{}", cycle),
                classifiers::pct_transactions_days_apart(tx, &group, cycle, self.config.n_days_off)
                    .into(),
            );
        }
        put(
            "n_transactions_same_day",
            (classifiers::n_transactions_same_day(tx, &group, self.config.n_days_off) as i64).into(),
        );
        put(
            "pct_transactions_same_day",
            classifiers::pct_transactions_same_day(tx, &group, self.config.n_days_off).into(),
        );
        put(
            "day_of_month_consistency",
            classifiers::day_of_month_consistency(&group).into(),
        );
        put(
            "is_weekday_consistent",
            classifiers::is_weekday_consistent(&group).into(),
        );
        put(
            "interval_streak",
            (classifiers::interval_streak(&dates, self.config.n_days_off) as i64).into(),
        );

        // Interval statistics
        put("gap_mean", intervals::mean_gap(&gaps).into());
        put("gap_stdev", intervals::stdev_gap(&gaps).into());
        put(
            "gap_coefficient_of_variation",
            intervals::coefficient_of_variation(&gaps).into(),
        );
        put(
            "ewma_interval_deviation",
            intervals::ewma_deviation(&gaps, self.config.ewma_alpha).into(),
        );
        put("hurst_exponent", intervals::hurst_exponent(&gaps).into());
        put(
            "fourier_periodicity",
            intervals::fourier_periodicity_score(&gaps).into(),
        );

        // Pattern verdicts
        put(
            "is_recurring_price_pattern",
            classifiers::is_recurring_based_on_price_pattern(tx, &group, &self.config).into(),
        );
        put(
            "is_fixed_interval_recurring",
            classifiers::is_fixed_interval_recurring(&group, &self.config).into(),
        );
        put("is_seasonal", classifiers::is_seasonal(&group).into());
        put("has_trial_period", classifiers::has_trial_period(&group).into());
        put("temporal_consistency_score", temporal.score.into());
        put("is_monthly_consistent", temporal.is_monthly_consistent.into());
        put("is_weekly_consistent", temporal.is_weekly_consistent.into());
        put(
            "recurring_confidence_score",
            classifiers::recurring_confidence_score(tx, &group, vendor_prior).into(),
        );

        // Group shape
        put("n_same_vendor", (group.len() as i64).into());
        put("n_vendor_all_users", (vendor_group.len() as i64).into());
        put("n_user_total", (user_group.len() as i64).into());

        features
    }

    /// Extract feature vectors for a whole dataset, building the history
    /// index once. The output is aligned with the input by position.
    pub fn extract_all(&self, transactions: &[Transaction]) -> Vec<FeatureVector> {
        let index = HistoryIndex::new(transactions);
        let vectors: Vec<FeatureVector> = transactions
            .iter()
            .map(|tx| self.extract(tx, transactions, &index))
            .collect();
        info!(
            transactions = transactions.len(),
            features = vectors.first().map(BTreeMap::len).unwrap_or(0),
            "extracted feature vectors"
        );
        vectors
    }

    /// The stable, sorted list of feature names this extractor emits.
    pub fn feature_names(&self) -> Vec<String> {
        let probe = Transaction::new(
            0,
            "probe",
            "probe",
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            0.0,
        );
        let index = HistoryIndex::new(&[]);
        self.extract(&probe, &[], &index).into_keys().collect()
    }
}
