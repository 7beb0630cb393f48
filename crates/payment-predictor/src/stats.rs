//! Scoring helpers: accuracy, ROC AUC and decimal rounding.

/// Fraction of positions where `predicted` equals `actual`.
///
/// Both slices must have the same length; an empty input scores 0.
pub fn accuracy_score(actual: &[u8], predicted: &[u8]) -> f64 {
    assert_eq!(
        actual.len(),
        predicted.len(),
        "accuracy_score: label and prediction lengths differ"
    );
    if actual.is_empty() {
        return 0.0;
    }
    let hits = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| a == p)
        .count();
    hits as f64 / actual.len() as f64
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) statistic.
///
/// Tied scores receive their average rank. Returns `None` when only one
/// class is present, where the AUC is undefined.
pub fn roc_auc(scores: &[f64], labels: &[u8]) -> Option<f64> {
    assert_eq!(scores.len(), labels.len(), "roc_auc: length mismatch");

    let n_pos = labels.iter().filter(|&&l| l == 1).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut ranks = vec![0.0f64; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; ties share the mean of their positions
        let avg = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = labels
        .iter()
        .zip(ranks.iter())
        .filter(|(&l, _)| l == 1)
        .map(|(_, &r)| r)
        .sum();
    let n_pos = n_pos as f64;
    let u = pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0;
    Some(u / (n_pos * n_neg as f64))
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
