//! Recurrence feature engine for personal transaction histories.
//!
//! This crate turns raw per-user transaction records into the numeric and
//! boolean features a recurring-payment classifier trains on: interval
//! statistics over gap sequences, curated vendor knowledge with fuzzy name
//! matching, and a set of heuristic pattern classifiers. The
//! [`FeatureExtractor`](features::FeatureExtractor) ties them together and
//! always emits a total vector, so degenerate histories (one transaction,
//! duplicate dates) produce defined defaults instead of NaN or panics.

pub mod classifiers;
pub mod data;
pub mod errors;
pub mod features;
pub mod history;
pub mod intervals;
pub mod report;
pub mod vendors;

#[cfg(test)]
mod tests {
    mod basic;
    mod pipeline_tests;
}

/// Convenient re-export of the most common items used when writing examples or tests.
pub mod prelude {
    pub use crate::classifiers::{ClassifierConfig, TemporalConsistency};
    pub use crate::data::{read_labeled_transactions, read_unlabeled_transactions, Transaction};
    pub use crate::errors::{RecurScanError, Result};
    pub use crate::features::{FeatureExtractor, FeatureValue, FeatureVector};
    pub use crate::history::HistoryIndex;
    pub use crate::report::FeatureMatrix;
    pub use crate::vendors::{normalize_vendor_name, VendorKnowledge, VendorLists};
}
