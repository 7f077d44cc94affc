use crate::stats::{RankedDistribution, WinsorBounds};

/// Fewest defined log-multiples a sigma window needs: `max(10, window / 2)`.
pub fn min_sigma_samples(window: usize) -> usize {
    10.max(window / 2)
}

/// `ln(multiple)` where the multiple is defined and positive.
pub fn log_multiples(multiples: &[Option<f64>]) -> Vec<Option<f64>> {
    multiples
        .iter()
        .map(|m| m.filter(|v| *v > 0.0).map(f64::ln))
        .collect()
}

/// Population standard deviation of the defined `log_r` values in the prior
/// window `[i - window, i)`. `None` before the window fills, when the window has
/// fewer than [`min_sigma_samples`] defined values, or when sigma is zero.
pub fn rolling_sigma(log_r: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let min_samples = min_sigma_samples(window);
    (0..log_r.len())
        .map(|i| {
            if window == 0 || i < window {
                return None;
            }
            let prior = &log_r[i - window..i];
            let (count, sum) = prior
                .iter()
                .flatten()
                .fold((0usize, 0.0), |(c, s), v| (c + 1, s + v));
            if count < min_samples {
                return None;
            }
            let n = count as f64;
            let mean = sum / n;
            let variance = prior
                .iter()
                .flatten()
                .map(|v| (v - mean) * (v - mean))
                .sum::<f64>()
                / n;
            let sigma = variance.max(0.0).sqrt();
            (sigma > 0.0).then_some(sigma)
        })
        .collect()
}

/// Volatility-normalised log-multiple `z = ln(R) / sigma`.
pub fn z_scores(log_r: &[Option<f64>], sigma: &[Option<f64>]) -> Vec<Option<f64>> {
    log_r
        .iter()
        .zip(sigma)
        .map(|(lr, s)| match (lr, s) {
            (Some(lr), Some(s)) => Some(lr / s),
            _ => None,
        })
        .collect()
}

/// Rank every defined z against the winsorized z values of positions admitted by
/// `in_base`. Output is percent in `[0, 100]`.
pub fn vol_adjusted_percentiles(
    multiples: &[Option<f64>],
    window: usize,
    bounds: WinsorBounds,
    in_base: impl Fn(usize) -> bool,
) -> Vec<Option<f64>> {
    let log_r = log_multiples(multiples);
    let sigma = rolling_sigma(&log_r, window);
    let z = z_scores(&log_r, &sigma);

    let base: Vec<f64> = z
        .iter()
        .enumerate()
        .filter(|(i, _)| in_base(*i))
        .filter_map(|(_, z)| *z)
        .collect();
    let ranked = RankedDistribution::winsorized(&base, bounds);
    if ranked.is_empty() {
        return vec![None; multiples.len()];
    }

    z.iter()
        .map(|z| z.map(|z| ranked.percentile_of(z) * 100.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_samples_floor_is_ten() {
        assert_eq!(min_sigma_samples(4), 10);
        assert_eq!(min_sigma_samples(20), 10);
        assert_eq!(min_sigma_samples(365), 182);
        assert_eq!(min_sigma_samples(720), 360);
    }

    #[test]
    fn log_multiples_skip_undefined() {
        let lr = log_multiples(&[None, Some(1.0), Some(0.0), Some(std::f64::consts::E)]);
        assert_eq!(lr[0], None);
        assert!(lr[1].unwrap().abs() < f64::EPSILON);
        assert_eq!(lr[2], None);
        assert!((lr[3].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sigma_uses_prior_window_only() {
        // alternating +-0.1 gives population sigma 0.1 over any even-length window
        let log_r: Vec<Option<f64>> = (0..30)
            .map(|i| Some(if i % 2 == 0 { 0.1 } else { -0.1 }))
            .collect();
        let sigma = rolling_sigma(&log_r, 20);
        assert!(sigma[..20].iter().all(Option::is_none));
        assert!((sigma[20].unwrap() - 0.1).abs() < 1e-12);
        assert!((sigma[29].unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn sigma_requires_enough_defined_points() {
        let mut log_r: Vec<Option<f64>> = vec![None; 12];
        log_r.extend((0..9).map(|i| Some(i as f64 * 0.01)));
        let sigma = rolling_sigma(&log_r, 12);
        // window [8, 20) holds only 8 defined values, below the floor of 10
        assert_eq!(sigma[20], None);
    }

    #[test]
    fn flat_window_has_no_sigma() {
        let log_r = vec![Some(0.0); 40];
        assert!(rolling_sigma(&log_r, 20).iter().all(Option::is_none));
    }
}
