//! Fit-quality metrics computed on the training data

use ndarray::Array1;

/// Fraction of exact label matches
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (*t - *p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Confusion matrix over the sorted union of true and predicted labels.
///
/// Rows are true labels, columns are predicted labels.
pub fn confusion_matrix(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Vec<Vec<usize>> {
    let mut labels: Vec<i64> = y_true
        .iter()
        .chain(y_pred.iter())
        .map(|&v| v.round() as i64)
        .collect();
    labels.sort_unstable();
    labels.dedup();

    let index = |v: f64| labels.binary_search(&(v.round() as i64)).unwrap_or(0);

    let mut matrix = vec![vec![0usize; labels.len()]; labels.len()];
    for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
        matrix[index(t)][index(p)] += 1;
    }
    matrix
}

/// Mean squared residual
pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    ss_res / y_true.len() as f64
}

/// Coefficient of determination.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let y_mean = y_true.mean().unwrap_or(0.0);
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - y_mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
