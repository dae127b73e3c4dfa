//! Numerically stable reductions over log-probabilities.

/// Computes `ln(sum(exp(x)))` without overflow.
///
/// The empty sum is zero, so an empty slice yields negative infinity. A slice
/// containing NaN yields NaN.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.iter().any(|value| value.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = values.iter().map(|&value| (value - max).exp()).sum();
    max + sum.ln()
}

/// Computes `ln(mean(exp(x)))` without overflow.
///
/// The mean of an empty slice is undefined and yields NaN.
pub fn log_mean_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let lse = log_sum_exp(values);
    if !lse.is_finite() {
        return lse;
    }
    lse - (values.len() as f64).ln()
}

/// Clamps `value` to `[lower, upper]`.
pub fn clip(value: f64, lower: f64, upper: f64) -> f64 {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

/// Returns `ln(n!)`.
pub fn log_factorial(n: usize) -> f64 {
    (2..=n).map(|k| (k as f64).ln()).sum()
}

/// Shannon entropy contribution `-p ln p`, with the `0 ln 0 = 0` convention.
pub fn entropy_term(p: f64) -> f64 {
    if p <= 0.0 {
        0.0
    } else {
        -p * p.ln()
    }
}

/// Arithmetic mean of the slice, NaN when empty.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
