//! # Transaction Data Model and CSV Ingestion
//!
//! This module provides the core [`Transaction`] record consumed by every
//! feature function, together with the CSV ingestion boundary used by the
//! offline feature-generation job.
//!
//! ## Ingestion contract
//!
//! - Dates arrive as `YYYY-MM-DD` text and are parsed exactly once, here.
//!   A date or amount that does not parse is a **fatal** ingestion error:
//!   the job aborts with a [`RecurScanError::MalformedRecord`] naming the
//!   offending row. No record is silently coerced or zeroed.
//! - Labeled datasets carry a trailing `recurring` column; a label is `1`
//!   iff the trimmed cell equals `"1"`.
//! - Transaction ids are assigned from the zero-based row index, so they
//!   are unique within a dataset.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use recur_scan::data::read_labeled_transactions;
//!
//! let (transactions, labels) = read_labeled_transactions("training.csv")?;
//! assert_eq!(transactions.len(), labels.len());
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{RecurScanError, Result};

/// Date format accepted at the ingestion boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single financial transaction.
///
/// Immutable once constructed; feature functions never mutate transactions,
/// only borrow them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier within the dataset (assigned from the row index)
    pub id: u64,
    /// Owning user
    pub user_id: String,
    /// Vendor label, free text as it appeared on the statement
    pub name: String,
    /// Calendar date of the transaction (no time component)
    pub date: NaiveDate,
    /// Monetary amount
    pub amount: f64,
}

impl Transaction {
    /// Create a new transaction record.
    pub fn new(
        id: u64,
        user_id: impl Into<String>,
        name: impl Into<String>,
        date: NaiveDate,
        amount: f64,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            name: name.into(),
            date,
            amount,
        }
    }

    /// Calendar day-of-month of the transaction date (1-31).
    pub fn day_of_month(&self) -> u32 {
        use chrono::Datelike;
        self.date.day()
    }
}

/// Parse a `YYYY-MM-DD` date string into a calendar date.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)?)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| RecurScanError::validation_error(format!("missing column: {}", name)))
}

fn parse_rows(path: &Path, extract_labels: bool) -> Result<(Vec<Transaction>, Vec<u8>)> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let user_idx = column_index(&headers, "user_id")?;
    let name_idx = column_index(&headers, "name")?;
    let date_idx = column_index(&headers, "date")?;
    let amount_idx = column_index(&headers, "amount")?;
    let label_idx = if extract_labels {
        Some(column_index(&headers, "recurring")?)
    } else {
        None
    };

    let mut transactions = Vec::new();
    let mut labels = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: usize| -> Result<&str> {
            record
                .get(idx)
                .ok_or_else(|| RecurScanError::malformed_record(row, "short record"))
        };

        let date = parse_date(field(date_idx)?).map_err(|e| {
            RecurScanError::malformed_record(row, format!("unparseable date: {}", e))
        })?;
        let amount: f64 = field(amount_idx)?.trim().parse().map_err(|e| {
            RecurScanError::malformed_record(row, format!("unparseable amount: {}", e))
        })?;

        transactions.push(Transaction::new(
            row as u64,
            field(user_idx)?,
            field(name_idx)?,
            date,
            amount,
        ));

        if let Some(idx) = label_idx {
            labels.push(u8::from(field(idx)?.trim() == "1"));
        }
    }

    Ok((transactions, labels))
}

/// Read labeled transactions (with a `recurring` column) from a CSV file.
///
/// Returns the transactions together with their 0/1 labels, aligned by index.
pub fn read_labeled_transactions<P: AsRef<Path>>(path: P) -> Result<(Vec<Transaction>, Vec<u8>)> {
    let path = path.as_ref();
    let (transactions, labels) = parse_rows(path, true)?;
    info!(
        count = transactions.len(),
        path = %path.display(),
        "loaded labeled transactions"
    );
    Ok((transactions, labels))
}

/// Read unlabeled transactions from a CSV file.
pub fn read_unlabeled_transactions<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>> {
    let path = path.as_ref();
    let (transactions, _) = parse_rows(path, false)?;
    info!(
        count = transactions.len(),
        path = %path.display(),
        "loaded unlabeled transactions"
    );
    Ok(transactions)
}

/// Write transactions and their labels back to a CSV file.
///
/// Labels are aligned with the transaction slice by index.
pub fn write_transactions<P: AsRef<Path>>(
    path: P,
    transactions: &[Transaction],
    labels: &[u8],
) -> Result<()> {
    if transactions.len() != labels.len() {
        return Err(RecurScanError::validation_error(format!(
            "label count {} does not match transaction count {}",
            labels.len(),
            transactions.len()
        )));
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["id", "user_id", "name", "date", "amount", "recurring"])?;
    for (tx, label) in transactions.iter().zip(labels) {
        writer.write_record([
            tx.id.to_string(),
            tx.user_id.clone(),
            tx.name.clone(),
            tx.date.format(DATE_FORMAT).to_string(),
            format!("{:.2}", tx.amount),
            label.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write csv");
        file
    }

    #[test]
    fn parses_labeled_csv() {
        let file = write_temp_csv(
            "user_id,name,date,amount,recurring\n\
             u1,Netflix,2024-01-01,15.99,1\n\
             u1,Coffee,2024-01-02,4.50,0\n",
        );
        let (transactions, labels) = read_labeled_transactions(file.path()).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(labels, vec![1, 0]);
        assert_eq!(transactions[0].id, 0);
        assert_eq!(transactions[0].name, "Netflix");
        assert_eq!(transactions[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn unparseable_date_is_fatal() {
        let file = write_temp_csv(
            "user_id,name,date,amount\n\
             u1,Netflix,01/05/2024,15.99\n",
        );
        let err = read_unlabeled_transactions(file.path()).unwrap_err();
        assert!(matches!(
            err,
            RecurScanError::MalformedRecord { row: 0, .. }
        ));
    }

    #[test]
    fn unparseable_amount_is_fatal() {
        let file = write_temp_csv(
            "user_id,name,date,amount\n\
             u1,Netflix,2024-01-01,free\n",
        );
        assert!(read_unlabeled_transactions(file.path()).is_err());
    }

    #[test]
    fn round_trips_through_write() {
        let transactions = vec![
            Transaction::new(
                0,
                "u1",
                "Spotify",
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                9.99,
            ),
            Transaction::new(
                1,
                "u1",
                "Gym",
                NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                35.0,
            ),
        ];
        let file = tempfile::NamedTempFile::new().unwrap();
        write_transactions(file.path(), &transactions, &[1, 0]).unwrap();

        let (read_back, labels) = read_labeled_transactions(file.path()).unwrap();
        assert_eq!(read_back, transactions);
        assert_eq!(labels, vec![1, 0]);
    }

    #[test]
    fn label_length_mismatch_rejected() {
        let transactions = vec![Transaction::new(
            0,
            "u1",
            "Gym",
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            35.0,
        )];
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(write_transactions(file.path(), &transactions, &[]).is_err());
    }
}
