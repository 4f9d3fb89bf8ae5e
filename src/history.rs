//! History index: grouped views over a transaction dataset.
//!
//! Feature extraction is group-relative: a charge is judged against the
//! other charges from the same user at the same vendor, the same vendor
//! across all users, and everything the user has spent anywhere. Building
//! those groups per transaction would make a batch run quadratic, so the
//! index is built once per dataset and shared across all extractions.
//!
//! Vendor keys are the normalized names from
//! [`normalize_vendor_name`](crate::vendors::normalize_vendor_name), which
//! makes "Netflix.com" and "NETFLIX 4421" land in the same group. Groups
//! preserve dataset order and always include the target transaction itself.

use std::collections::HashMap;

use crate::data::Transaction;
use crate::vendors::normalize_vendor_name;

/// Precomputed group views over a transaction slice.
///
/// Holds indices into the slice it was built from, not clones; the caller
/// keeps ownership of the transactions and passes the same slice back when
/// resolving groups.
#[derive(Debug, Default)]
pub struct HistoryIndex {
    by_vendor: HashMap<String, Vec<usize>>,
    by_user_vendor: HashMap<(String, String), Vec<usize>>,
    by_user: HashMap<String, Vec<usize>>,
}

impl HistoryIndex {
    /// Build the index in one pass over the dataset.
    pub fn new(transactions: &[Transaction]) -> Self {
        let mut index = Self::default();
        for (i, tx) in transactions.iter().enumerate() {
            let vendor = normalize_vendor_name(&tx.name);
            index
                .by_user_vendor
                .entry((tx.user_id.clone(), vendor.clone()))
                .or_default()
                .push(i);
            index.by_vendor.entry(vendor).or_default().push(i);
            index
                .by_user
                .entry(tx.user_id.clone())
                .or_default()
                .push(i);
        }
        index
    }

    /// All transactions at the same (normalized) vendor, across users.
    pub fn vendor_group<'a>(
        &self,
        transactions: &'a [Transaction],
        tx: &Transaction,
    ) -> Vec<&'a Transaction> {
        self.resolve(transactions, self.by_vendor.get(&normalize_vendor_name(&tx.name)))
    }

    /// Transactions from the same user at the same (normalized) vendor.
    ///
    /// This is the group most features operate on; it includes `tx` itself.
    pub fn user_vendor_group<'a>(
        &self,
        transactions: &'a [Transaction],
        tx: &Transaction,
    ) -> Vec<&'a Transaction> {
        let key = (tx.user_id.clone(), normalize_vendor_name(&tx.name));
        self.resolve(transactions, self.by_user_vendor.get(&key))
    }

    /// Everything the user has spent, at any vendor.
    pub fn user_group<'a>(
        &self,
        transactions: &'a [Transaction],
        tx: &Transaction,
    ) -> Vec<&'a Transaction> {
        self.resolve(transactions, self.by_user.get(&tx.user_id))
    }

    fn resolve<'a>(
        &self,
        transactions: &'a [Transaction],
        indices: Option<&Vec<usize>>,
    ) -> Vec<&'a Transaction> {
        indices
            .map(|ids| ids.iter().map(|&i| &transactions[i]).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(id: u64, user: &str, name: &str, day: u32, amount: f64) -> Transaction {
        Transaction::new(
            id,
            user,
            name,
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            amount,
        )
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx(0, "u1", "Netflix", 1, 15.99),
            tx(1, "u1", "Netflix.com", 2, 15.99),
            tx(2, "u2", "NETFLIX 4421", 3, 15.99),
            tx(3, "u1", "Coffee Shop", 4, 4.50),
        ]
    }

    #[test]
    fn vendor_group_collapses_name_variants() {
        let data = sample();
        let index = HistoryIndex::new(&data);
        let group = index.vendor_group(&data, &data[0]);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn user_vendor_group_is_scoped_to_the_user() {
        let data = sample();
        let index = HistoryIndex::new(&data);
        let group = index.user_vendor_group(&data, &data[0]);
        assert_eq!(group.len(), 2);
        assert!(group.iter().all(|t| t.user_id == "u1"));
        // The target transaction is part of its own group.
        assert!(group.iter().any(|t| t.id == data[0].id));
    }

    #[test]
    fn user_group_spans_vendors() {
        let data = sample();
        let index = HistoryIndex::new(&data);
        let group = index.user_group(&data, &data[3]);
        assert_eq!(group.len(), 3);
    }

    #[test]
    fn groups_preserve_dataset_order() {
        let data = sample();
        let index = HistoryIndex::new(&data);
        let group = index.user_vendor_group(&data, &data[1]);
        let ids: Vec<u64> = group.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 1]);
    }

    #[test]
    fn unknown_vendor_yields_empty_group() {
        let data = sample();
        let index = HistoryIndex::new(&data);
        let stranger = tx(99, "u9", "Unknown Vendor", 5, 1.0);
        assert!(index.user_vendor_group(&data, &stranger).is_empty());
    }
}
