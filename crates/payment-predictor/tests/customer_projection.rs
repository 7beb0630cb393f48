mod common;

use common::*;
use payment_predictor::customer::{build_model_view, build_raw_view};
use payment_predictor::stats::round_to;
use payment_predictor::{CustomerProjector, PredictorError, ScoringContext};

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn two_codes_with_constant_probability() {
    let fx = fixture(&two_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.9);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let p = CustomerProjector::new(1, &ctx).unwrap();
    assert_eq!(p.payment_prediction, vec![1, 1]);
    assert_eq!(p.next_payment_probability, vec![0.9, 0.9]);
    assert_eq!(p.certainty, 90.0);
    assert_eq!(p.payment_codes, vec![204, 206]);
    assert_eq!(p.payment_dates, vec![day(4), day(5)]);
    assert_eq!(p.accuracy, 0.75);
}

#[test]
fn future_rows_advance_latest_payment_per_code() {
    let fx = fixture(&two_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.9);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let p = CustomerProjector::new(1, &ctx).unwrap();
    assert_eq!(p.number_of_payments, 4.0);
    assert_eq!(p.payment_number_distance, 0.75);
    assert_eq!(p.future_codes, vec![204, 206]);
    assert_eq!(p.future.row_slice(0), &[3.75, 204.0]);
    assert_eq!(p.future.row_slice(1), &[4.75, 206.0]);
}

#[test]
fn single_payment_number_is_not_enough_history() {
    let fx = fixture(&[(7, 1, 204, 1), (7, 1, 206, 0)]);
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.9);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let err = CustomerProjector::new(7, &ctx).unwrap_err();
    assert!(matches!(
        err,
        PredictorError::NotEnoughHistory {
            acctrefno: 7,
            distinct_payment_numbers: 1
        }
    ));
}

#[test]
fn missing_customer_fails_before_scoring() {
    let fx = fixture(&two_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.9);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let err = CustomerProjector::new(99, &ctx).unwrap_err();
    assert!(matches!(err, PredictorError::NotFound { acctrefno: 99 }));
    assert_eq!(scaler.calls(), 0);
    assert_eq!(classifier.calls(), 0);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn three_code_rows() -> Vec<Row> {
    vec![
        (2, 1, 204, 1),
        (2, 2, 206, 0),
        (2, 3, 208, 1),
        (2, 4, 204, 1),
        (2, 6, 206, 0),
        (2, 8, 204, 1),
    ]
}

#[test]
fn repeated_projection_is_identical() {
    let fx = fixture(&three_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = PaymentNumberClassifier::new(9.0);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let a = CustomerProjector::new(2, &ctx).unwrap();
    let b = CustomerProjector::new(2, &ctx).unwrap();
    assert_eq!(a.accuracy.to_bits(), b.accuracy.to_bits());
    assert_eq!(a.certainty.to_bits(), b.certainty.to_bits());
    assert_eq!(a.next_payment_probability, b.next_payment_probability);
    assert_eq!(a.payment_prediction, b.payment_prediction);
}

#[test]
fn prediction_follows_threshold_and_certainty_is_mean() {
    let fx = fixture(&three_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = PaymentNumberClassifier::new(12.0);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let p = CustomerProjector::new(2, &ctx).unwrap();
    for (prob, pred) in p.next_payment_probability.iter().zip(&p.payment_prediction) {
        assert!((0.0..=1.0).contains(prob));
        assert_eq!(*pred == 1, *prob >= 0.5);
    }
    assert!(p.payment_prediction.contains(&0));
    assert!(p.payment_prediction.contains(&1));

    let mean = p.next_payment_probability.iter().sum::<f64>()
        / p.next_payment_probability.len() as f64;
    assert!((0.0..=100.0).contains(&p.certainty));
    assert_eq!(p.certainty, round_to(mean * 100.0, 2));
}

#[test]
fn one_future_row_per_distinct_code() {
    let fx = fixture(&three_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.4);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let p = CustomerProjector::new(2, &ctx).unwrap();
    assert_eq!(p.future.nrows(), 3);
    let mut codes = p.future_codes.clone();
    codes.sort_unstable();
    assert_eq!(codes, vec![204, 206, 208]);
    assert!(p.payment_prediction.len() <= p.payment_codes.len());
    assert_eq!(p.payment_prediction.len(), p.next_payment_probability.len());
    assert_eq!(p.payment_codes, vec![204, 206, 208]);
}

#[test]
fn history_is_most_recent_first() {
    let fx = fixture(&three_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.6);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let p = CustomerProjector::new(2, &ctx).unwrap();
    let numbers: Vec<i64> = p.history().iter().map(|r| r.payment_number).collect();
    assert_eq!(numbers, vec![8, 6, 4, 3, 2, 1]);
    assert_eq!(p.predicted_history().unwrap().len(), 6);
}

#[test]
fn customer_missing_from_feature_table_is_not_found() {
    let mut fx = fixture(&two_code_rows());
    let other = fixture(&[(5, 1, 204, 1), (5, 2, 206, 1)]);
    fx.transactions.records.extend(other.transactions.records);

    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.9);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let err = CustomerProjector::new(5, &ctx).unwrap_err();
    assert!(matches!(err, PredictorError::NotFound { acctrefno: 5 }));
    assert_eq!(scaler.calls(), 0);
}

#[test]
fn model_trained_on_other_columns_is_rejected() {
    let fx = fixture(&two_code_rows());
    let scaler = IdentityScaler::new();
    let mut classifier = ConstantClassifier::new(0.9);
    classifier.names = vec!["payment_number".to_string(), "balance".to_string()];
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let err = CustomerProjector::new(1, &ctx).unwrap_err();
    assert!(matches!(err, PredictorError::SchemaMismatch(_)));
    assert_eq!(err.kind(), "schema_mismatch");
}

#[test]
fn label_column_must_align_with_features() {
    let fx = fixture(&two_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.9);
    let short = &fx.labels[..2];
    let err = ScoringContext::new(&fx.transactions, &fx.features, short, &classifier, &scaler)
        .err()
        .unwrap();
    assert!(matches!(err, PredictorError::SchemaMismatch(_)));
}

#[test]
fn codes_keep_log_order_while_dates_follow_latest_rows() {
    let fx = fixture(&three_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.4);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let p = CustomerProjector::new(2, &ctx).unwrap();
    assert_eq!(p.payment_codes, vec![204, 206, 208]);
    // latest rows: 208 at 3, 206 at 6, 204 at 8
    assert_eq!(p.payment_dates, vec![day(4), day(7), day(9)]);
    assert_eq!(p.future_codes, vec![208, 206, 204]);
}

#[test]
fn non_positive_payment_numbers_have_their_own_error() {
    let fx = fixture(&[(4, -3, 204, 1), (4, -2, 206, 0), (4, -1, 204, 1)]);
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.9);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let err = CustomerProjector::new(4, &ctx).unwrap_err();
    assert!(matches!(
        err,
        PredictorError::NonPositivePaymentNumbers { acctrefno: 4, .. }
    ));
    assert_eq!(err.kind(), "non_positive_payment_numbers");
    assert!(!err.to_string().contains("at least 2"));
    assert_eq!(classifier.calls(), 0);
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[test]
fn views_are_sorted_most_recent_first() {
    let fx = fixture(&two_code_rows());
    let scaler = IdentityScaler::new();
    let classifier = ConstantClassifier::new(0.9);
    let ctx = ScoringContext::new(&fx.transactions, &fx.features, &fx.labels, &classifier, &scaler)
        .unwrap();

    let raw = build_raw_view(1, &fx.transactions).unwrap();
    assert_eq!(raw.max_payment_number(), Some(4));
    assert_eq!(
        raw.rows.iter().map(|r| r.payment_number).collect::<Vec<_>>(),
        vec![4, 3, 2, 1]
    );

    let model = build_model_view(1, &ctx).unwrap();
    assert_eq!(model.scaled.column(model.payment_number_idx), vec![4.0, 3.0, 2.0, 1.0]);
    assert_eq!(model.target, vec![1, 0, 1, 1]);
    assert_eq!(model.distinct_payment_numbers(), 4);
    assert_eq!(scaler.calls(), 1);
}
