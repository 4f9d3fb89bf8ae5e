use std::io::Write;

use crate::data::{read_labeled_transactions, write_transactions, Transaction};
use crate::features::{FeatureExtractor, FeatureValue};
use crate::report::FeatureMatrix;
use chrono::NaiveDate;

fn mock_csv() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(
        file,
        "user_id,name,date,amount,recurring\n\
         u1,Netflix,2024-01-15,15.99,1\n\
         u1,Netflix.com,2024-02-14,15.99,1\n\
         u1,NETFLIX 4421,2024-03-15,15.99,1\n\
         u1,Corner Bakery,2024-01-20,7.35,0\n\
         u2,Gym Membership,2024-02-01,35.00,0\n"
    )
    .expect("write csv");
    file
}

#[test]
fn end_to_end_feature_generation_flow() {
    let file = mock_csv();
    let (transactions, labels) = read_labeled_transactions(file.path()).expect("read csv");
    assert_eq!(transactions.len(), 5);
    assert_eq!(labels, vec![1, 1, 1, 0, 0]);

    let extractor = FeatureExtractor::default();
    let vectors = extractor.extract_all(&transactions);
    assert_eq!(vectors.len(), transactions.len());

    // The three Netflix name variants resolve to one monthly group.
    let netflix = &vectors[0];
    assert_eq!(netflix["n_same_vendor"], FeatureValue::Int(3));
    assert_eq!(netflix["is_always_recurring"], FeatureValue::Bool(true));
    assert_eq!(netflix["is_fixed_interval_recurring"], FeatureValue::Bool(true));
    assert_eq!(netflix["is_recurring_price_pattern"], FeatureValue::Bool(true));
    assert!(netflix["recurring_confidence_score"].as_f64() > 0.5);

    // The one-off bakery charge stays unconvincing.
    let bakery = &vectors[3];
    assert_eq!(bakery["n_same_vendor"], FeatureValue::Int(1));
    assert_eq!(bakery["is_always_recurring"], FeatureValue::Bool(false));
    assert!(bakery["recurring_confidence_score"].as_f64() < netflix["recurring_confidence_score"].as_f64());

    let out = tempfile::NamedTempFile::new().expect("temp file");
    let matrix = FeatureMatrix::new(transactions, vectors)
        .expect("aligned matrix")
        .with_labels(labels)
        .expect("aligned labels");
    matrix.write_csv(out.path()).expect("write matrix");

    let mut reader = csv::Reader::from_path(out.path()).expect("reopen matrix");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.get(0), Some("id"));
    assert!(headers.iter().any(|h| h == "recurring_confidence_score"));
    assert_eq!(headers.get(headers.len() - 1), Some("recurring"));
    assert_eq!(reader.records().count(), 5);
}

#[test]
fn every_vector_in_a_batch_has_the_same_columns() {
    let file = mock_csv();
    let (transactions, _) = read_labeled_transactions(file.path()).expect("read csv");
    let extractor = FeatureExtractor::default();
    let vectors = extractor.extract_all(&transactions);
    let names = extractor.feature_names();
    for vector in &vectors {
        let keys: Vec<String> = vector.keys().cloned().collect();
        assert_eq!(keys, names);
    }
}

#[test]
fn dataset_round_trips_before_feature_generation() {
    let transactions = vec![
        Transaction::new(
            0,
            "u1",
            "Spotify",
            NaiveDate::from_ymd_opt(2024, 1, 3).expect("valid date"),
            9.99,
        ),
        Transaction::new(
            1,
            "u1",
            "Spotify",
            NaiveDate::from_ymd_opt(2024, 2, 2).expect("valid date"),
            9.99,
        ),
    ];
    let file = tempfile::NamedTempFile::new().expect("temp file");
    write_transactions(file.path(), &transactions, &[1, 1]).expect("write");
    let (read_back, labels) = read_labeled_transactions(file.path()).expect("read");
    assert_eq!(read_back, transactions);
    assert_eq!(labels, vec![1, 1]);

    let vectors = FeatureExtractor::default().extract_all(&read_back);
    assert_eq!(vectors[0]["is_always_recurring"], FeatureValue::Bool(true));
    assert_eq!(vectors[0]["is_monthly_consistent"], FeatureValue::Bool(true));
}
