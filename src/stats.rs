//! Small statistics helpers shared by the reducers
//!
//! All variance/deviation here is the population form (divide by `n`),
//! matching the conventions the feature formulas were defined with.
//! Empty input yields `None` so callers can map it to their documented
//! fallback instead of propagating NaN.

/// Arithmetic mean, `None` on empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance, `None` on empty input.
pub fn population_variance(values: &[f64]) -> Option<f64> {
    let mu = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mu) * (v - mu)).sum();
    Some(sum_sq / values.len() as f64)
}

/// Population standard deviation, `None` on empty input.
pub fn population_std(values: &[f64]) -> Option<f64> {
    population_variance(values).map(f64::sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_variance(&[]), None);
        assert_eq!(population_std(&[]), None);
    }

    #[test]
    fn population_variance_divides_by_n() {
        // Population variance of [2, 3, 4] is 2/3; the sample form gives 1.
        let var = population_variance(&[2.0, 3.0, 4.0]).unwrap();
        assert!((var - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn std_is_sqrt_of_variance() {
        let values = [1.0, 5.0, 9.0];
        let var = population_variance(&values).unwrap();
        let std = population_std(&values).unwrap();
        assert!((std * std - var).abs() < 1e-12);
    }

    #[test]
    fn constant_input_has_zero_variance() {
        let values = [3.5; 16];
        assert_eq!(population_variance(&values), Some(0.0));
    }
}
