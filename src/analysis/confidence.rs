//! Confidence intervals for the mean of repeated runs.
//!
//! Samples larger than [`LARGE_SAMPLE`] use the normal critical value; smaller
//! ones use Student's t with `n - 1` degrees of freedom.

use crate::error::{Result, SummaryError};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

/// Above this many observations the normal approximation is used.
pub const LARGE_SAMPLE: usize = 30;

/// Mean and margin of error of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub mean: f64,
    /// Half-width of the interval. NaN for a single observation.
    pub margin: f64,
}

impl ConfidenceInterval {
    /// Render as `"mean ±margin"` with three decimals each.
    pub fn combined(&self) -> String {
        format!("{} ±{}", format_value(self.mean), format_value(self.margin))
    }
}

/// Format a value with three decimals; undefined values render as `nan`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.3}", value)
    }
}

/// Check that a confidence level lies strictly between 0 and 1.
pub fn validate_confidence(confidence: f64) -> Result<()> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(SummaryError::InvalidConfidence(confidence))
    }
}

/// Compute the two-sided confidence interval for the population mean.
///
/// Returns `Ok(None)` for empty input; callers skip such metrics.
pub fn compute_confidence_interval(
    data: &[f64],
    confidence: f64,
) -> Result<Option<ConfidenceInterval>> {
    if data.is_empty() {
        return Ok(None);
    }
    validate_confidence(confidence)?;

    let n = data.len();
    let mean = data.iter().sum::<f64>() / n as f64;
    if n < 2 {
        return Ok(Some(ConfidenceInterval {
            mean,
            margin: f64::NAN,
        }));
    }

    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let stderr = variance.sqrt() / (n as f64).sqrt();
    let margin = stderr * critical_value(n, confidence);

    Ok(Some(ConfidenceInterval { mean, margin }))
}

/// Two-sided critical value at quantile `(1 + confidence) / 2`.
///
/// `n` must be at least 2.
pub fn critical_value(n: usize, confidence: f64) -> f64 {
    let quantile = (1.0 + confidence) / 2.0;
    if n > LARGE_SAMPLE {
        match Normal::new(0.0, 1.0) {
            Ok(normal) => normal.inverse_cdf(quantile),
            Err(_) => f64::NAN,
        }
    } else {
        match StudentsT::new(0.0, 1.0, (n - 1) as f64) {
            Ok(t) => t.inverse_cdf(quantile),
            Err(_) => f64::NAN,
        }
    }
}
