#[cfg(test)]
use crate::errors::DetectorError;
use std::cmp::Ordering;

/// Create a string of all available items.
pub fn items_to_strings(items: Vec<&str>) -> String {
    items.join(", ")
}

// Validation of detector hyperparameters, used by the detectors in tests.
#[cfg(test)]
pub(crate) fn validate_positive_float_parameter(value: f64, parameter: &str) -> Result<(), DetectorError> {
    validate_float_parameter(value, 0.0, f64::INFINITY, parameter)
}

#[cfg(test)]
pub(crate) fn validate_float_parameter(value: f64, min: f64, max: f64, parameter: &str) -> Result<(), DetectorError> {
    if value.is_nan() || value < min || max < value {
        let ex_msg = format!("real value within range {} and {}", min, max);
        Err(DetectorError::InvalidParameterValue(
            parameter.to_string(),
            ex_msg,
            value.to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Sort a copy of `v` in ascending order, NaN last.
pub fn sorted(v: &[f64]) -> Vec<f64> {
    let mut s = v.to_vec();
    s.sort_unstable_by(|a, b| a.total_cmp(b));
    s
}

/// Percentile of already sorted values, linear interpolation between the
/// two closest order statistics.
///
/// * `sorted` - Ascending values, must not be empty.
/// * `q` - Percentile in [0, 100].
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let rank = (q / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    if lo == hi || frac == 0.0 {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Number of values in an ascending slice that are `<= x`.
#[inline]
pub fn count_less_equal(sorted: &[f64], x: f64) -> usize {
    sorted.partition_point(|v| v.total_cmp(&x) != Ordering::Greater)
}

pub fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

/// Population standard deviation (no degrees of freedom correction).
pub fn std(v: &[f64]) -> f64 {
    let mu = mean(v);
    (v.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / v.len() as f64).sqrt()
}

/// Render a float the way a human would type it: shortest round trip
/// representation, always with a decimal point for finite values. Decimal
/// exponents outside [-4, 16) switch to scientific notation with a signed,
/// two digit exponent, e.g. `1e+20` and `1.5e-07`.
pub fn format_float(v: f64) -> String {
    if !v.is_finite() {
        return if v.is_nan() {
            "nan".to_string()
        } else if v > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let sci = format!("{:e}", v);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };
    if !(-4..16).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }
    let s = format!("{}", v);
    if s.contains('.') {
        s
    } else {
        format!("{}.0", s)
    }
}

/// Render a float with at most `precision` decimals, trailing zeros removed.
pub fn format_float_precision(v: f64, precision: usize) -> String {
    if !v.is_finite() {
        return format_float(v);
    }
    let s = format!("{:.*}", precision, v);
    if !s.contains('.') {
        return format!("{}.0", s);
    }
    let trimmed = s.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{}0", trimmed)
    } else {
        trimmed.to_string()
    }
}
