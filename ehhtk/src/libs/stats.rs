use color_eyre::Result;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use statrs::statistics::Statistics;

/// Maximum likelihood rate of an exponential distribution
pub fn exponential_rate(xs: &[f64]) -> f64 {
    1.0 / xs.mean()
}

pub fn exponential_log_likelihood(xs: &[f64], rate: f64) -> f64 {
    xs.iter().map(|x| rate.ln() - rate * x).sum()
}

/// Likelihood ratio statistic of two separately fitted exponential distributions against a
/// single pooled one
pub fn exponential_lrt(target: &[f64], background: &[f64]) -> f64 {
    let alternative = exponential_log_likelihood(target, exponential_rate(target))
        + exponential_log_likelihood(background, exponential_rate(background));

    let pooled = target.iter().chain(background).copied().collect::<Vec<f64>>();
    let null = exponential_log_likelihood(&pooled, exponential_rate(&pooled));

    2.0 * (alternative - null)
}

/// Upper tail of the chi-square distribution
pub fn chi_square_sf(x: f64, df: f64) -> Result<f64> {
    let dist = ChiSquared::new(df)?;
    Ok(1.0 - dist.cdf(x))
}

/// Z-scores with the sample standard deviation, NaN for fewer than two values
pub fn standardize(xs: &[f64]) -> Vec<f64> {
    let mean = xs.mean();
    let sd = xs.std_dev();
    xs.iter().map(|x| (x - mean) / sd).collect()
}
