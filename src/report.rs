//! Feature matrix export for downstream model training.
//!
//! A [`FeatureMatrix`] pairs each transaction with its extracted feature
//! vector (plus an optional 0/1 label column) and writes the whole dataset
//! as CSV or JSON. Column order is fixed: the transaction identity columns
//! first, then every feature name in sorted order, then the label.

use std::path::Path;

use serde_json::{json, Map, Value};
use tracing::info;

use crate::data::{Transaction, DATE_FORMAT};
use crate::errors::{RecurScanError, Result};
use crate::features::{FeatureValue, FeatureVector};

/// Transactions joined with their feature vectors, ready for export.
#[derive(Debug)]
pub struct FeatureMatrix {
    transactions: Vec<Transaction>,
    vectors: Vec<FeatureVector>,
    labels: Option<Vec<u8>>,
}

impl FeatureMatrix {
    /// Join transactions with their feature vectors, aligned by position.
    pub fn new(transactions: Vec<Transaction>, vectors: Vec<FeatureVector>) -> Result<Self> {
        if transactions.len() != vectors.len() {
            return Err(RecurScanError::validation_error(format!(
                "feature vector count {} does not match transaction count {}",
                vectors.len(),
                transactions.len()
            )));
        }
        Ok(Self {
            transactions,
            vectors,
            labels: None,
        })
    }

    /// Attach the 0/1 label column, aligned by position.
    pub fn with_labels(mut self, labels: Vec<u8>) -> Result<Self> {
        if labels.len() != self.transactions.len() {
            return Err(RecurScanError::validation_error(format!(
                "label count {} does not match transaction count {}",
                labels.len(),
                self.transactions.len()
            )));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Number of rows in the matrix.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the matrix has no rows.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Feature column names, in output order.
    ///
    /// Taken from the first row; every extractor-produced vector carries
    /// the same keys.
    pub fn feature_columns(&self) -> Vec<&str> {
        self.vectors
            .first()
            .map(|v| v.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Write the matrix as CSV.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let columns = self.feature_columns();
        let mut writer = csv::Writer::from_path(path)?;

        let mut header: Vec<&str> = vec!["id", "user_id", "name", "date", "amount"];
        header.extend(columns.iter());
        if self.labels.is_some() {
            header.push("recurring");
        }
        writer.write_record(&header)?;

        for (i, (tx, vector)) in self.transactions.iter().zip(&self.vectors).enumerate() {
            let mut row = vec![
                tx.id.to_string(),
                tx.user_id.clone(),
                tx.name.clone(),
                tx.date.format(DATE_FORMAT).to_string(),
                format!("{:.2}", tx.amount),
            ];
            for column in &columns {
                let value = vector.get(*column).ok_or_else(|| {
                    RecurScanError::validation_error(format!("row {} is missing feature {}", i, column))
                })?;
                row.push(render(value));
            }
            if let Some(labels) = &self.labels {
                row.push(labels[i].to_string());
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;
        info!(rows = self.len(), path = %path.display(), "wrote feature matrix csv");
        Ok(())
    }

    /// Write the matrix as a JSON array of row objects.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut rows = Vec::with_capacity(self.len());
        for (i, (tx, vector)) in self.transactions.iter().zip(&self.vectors).enumerate() {
            let mut row = Map::new();
            row.insert("id".into(), json!(tx.id));
            row.insert("user_id".into(), json!(tx.user_id));
            row.insert("name".into(), json!(tx.name));
            row.insert("date".into(), json!(tx.date.format(DATE_FORMAT).to_string()));
            row.insert("amount".into(), json!(tx.amount));
            for (name, value) in vector {
                row.insert(name.clone(), serde_json::to_value(value)?);
            }
            if let Some(labels) = &self.labels {
                row.insert("recurring".into(), json!(labels[i]));
            }
            rows.push(Value::Object(row));
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(std::io::BufWriter::new(file), &rows)?;
        info!(rows = self.len(), path = %path.display(), "wrote feature matrix json");
        Ok(())
    }
}

fn render(value: &FeatureValue) -> String {
    match *value {
        FeatureValue::Bool(b) => u8::from(b).to_string(),
        FeatureValue::Int(i) => i.to_string(),
        FeatureValue::Float(f) => format!("{:.6}", f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use chrono::NaiveDate;

    fn sample() -> Vec<Transaction> {
        vec![
            Transaction::new(
                0,
                "u1",
                "Netflix",
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                15.99,
            ),
            Transaction::new(
                1,
                "u1",
                "Netflix",
                NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(),
                15.99,
            ),
        ]
    }

    #[test]
    fn csv_round_trip_has_expected_shape() {
        let data = sample();
        let extractor = FeatureExtractor::default();
        let vectors = extractor.extract_all(&data);
        let matrix = FeatureMatrix::new(data, vectors)
            .unwrap()
            .with_labels(vec![1, 1])
            .unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        matrix.write_csv(file.path()).unwrap();

        let mut reader = csv::Reader::from_path(file.path()).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("id"));
        assert_eq!(headers.get(headers.len() - 1), Some("recurring"));
        assert_eq!(
            headers.len(),
            5 + extractor.feature_names().len() + 1
        );
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let data = sample();
        assert!(FeatureMatrix::new(data.clone(), Vec::new()).is_err());
        let vectors = FeatureExtractor::default().extract_all(&data);
        let matrix = FeatureMatrix::new(data, vectors).unwrap();
        assert!(matrix.with_labels(vec![1]).is_err());
    }

    #[test]
    fn json_export_writes_row_objects() {
        let data = sample();
        let vectors = FeatureExtractor::default().extract_all(&data);
        let matrix = FeatureMatrix::new(data, vectors).unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        matrix.write_json(file.path()).unwrap();

        let contents = std::fs::read_to_string(file.path()).unwrap();
        let parsed: Vec<serde_json::Value> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["name"], "Netflix");
        assert!(parsed[0]["recurring_confidence_score"].is_number());
    }
}
