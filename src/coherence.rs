use std::f64::consts::FRAC_PI_2;

use num_complex::Complex;

use crate::utils::{normalize_angle, safe_arg};

/// Mean relative phase and its spread for one (dwell, channel pair).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseComparisonResult {
    /// Disambiguated mean phase, normalized into `[-PI, PI]`.
    pub mean_phase_radians: f64,
    /// Standard deviation of the winning rotated fit, always >= 0.
    pub spread: f64,
}

/// The four quadrant rotations `i^r` for `r` in `0..4`.
const QUADRANT_ROTATIONS: [Complex<f64>; 4] = [
    Complex { re: 1.0, im: 0.0 },
    Complex { re: 0.0, im: 1.0 },
    Complex { re: -1.0, im: 0.0 },
    Complex { re: 0.0, im: -1.0 },
];

/// Pointwise `wf0[i] * conj(wf1[i])` over the common prefix of the two
/// waveforms: the instantaneous phase-difference signal. Convention: a `+t`
/// phase rotation applied to `wf1` reads back as `-t` here.
pub fn phase_comparison(wf0: &[Complex<f64>], wf1: &[Complex<f64>]) -> Vec<Complex<f64>> {
    wf0.iter()
        .zip(wf1.iter())
        .map(|(s0, s1)| s0 * s1.conj())
        .collect()
}

/// Angles of a complex sequence, suitable for direct histogramming.
pub fn phase_angles(sequence: &[Complex<f64>]) -> Vec<f64> {
    sequence.iter().map(safe_arg).collect()
}

/// Mean and population standard deviation (divide by N) of the angles
/// treated as plain reals. `(0, 0)` for an empty slice, sigma `0` for a
/// single sample.
fn linear_fit(angles: &[f64]) -> (f64, f64) {
    if angles.is_empty() {
        return (0.0, 0.0);
    }
    let n = angles.len() as f64;
    let mean = angles.iter().sum::<f64>() / n;
    if angles.len() < 2 {
        return (mean, 0.0);
    }
    let variance = angles.iter().map(|a| (a - mean) * (a - mean)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

/// Fit a Gaussian to the angles of `phase_cmp` under each of the four
/// quadrant rotations and keep the tightest fit, un-rotating its mean back.
///
/// A phase-difference cluster sitting near the 180 degree branch cut looks
/// bimodal to a plain linear fit; one of the 90 degree rotations moves the
/// cut away from the cluster and makes the linear fit meaningful again. The
/// fit deliberately stays linear-on-wrapped-angles rather than using true
/// circular statistics; inputs that remain bimodal under all four rotations
/// are ill-defined, matching the calibration behavior this reproduces.
///
/// Ties go to the smaller rotation index. An empty input returns
/// `(0.0, 0.0)` so sparse dwells still produce a plottable value.
pub fn rotating_fit(phase_cmp: &[Complex<f64>]) -> PhaseComparisonResult {
    let mut best_rotation = 0usize;
    let mut best_mean = 0.0;
    let mut best_sigma = f64::INFINITY;
    for (rotation, factor) in QUADRANT_ROTATIONS.iter().enumerate() {
        let angles: Vec<f64> = phase_cmp.iter().map(|z| safe_arg(&(z * factor))).collect();
        let (mean, sigma) = linear_fit(&angles);
        if sigma < best_sigma {
            best_rotation = rotation;
            best_mean = mean;
            best_sigma = sigma;
        }
    }

    let mean = normalize_angle(best_mean - best_rotation as f64 * FRAC_PI_2);
    PhaseComparisonResult {
        mean_phase_radians: mean,
        spread: best_sigma,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn from_angles(angles: &[f64]) -> Vec<Complex<f64>> {
        angles.iter().map(|&a| Complex::from_polar(1.0, a)).collect()
    }

    /// Deterministic jitter in [-1, 1], evenly spread.
    fn jitter(i: usize, count: usize) -> f64 {
        (i as f64 / (count - 1) as f64) * 2.0 - 1.0
    }

    #[test]
    fn tight_cluster_at_zero_matches_plain_linear_statistics() {
        let angles: Vec<f64> = (0..1000).map(|i| jitter(i, 1000) * 0.01).collect();
        let fit = rotating_fit(&from_angles(&angles));
        let (linear_mean, linear_sigma) = linear_fit(&angles);
        assert!((fit.mean_phase_radians - linear_mean).abs() < 1e-9);
        assert!((fit.spread - linear_sigma).abs() < 1e-9);
        assert!(fit.mean_phase_radians.abs() < 1e-9);
    }

    #[test]
    fn cluster_straddling_the_branch_cut_is_disambiguated() {
        // Tight cluster around +/-PI, split across the cut: the naive linear
        // mean would collapse to ~0, which is exactly the wrong answer.
        let angles: Vec<f64> = (0..1000)
            .map(|i| {
                let j = jitter(i, 1000) * 0.01;
                if i % 2 == 0 {
                    PI - 0.02 + j
                } else {
                    -PI + 0.02 + j
                }
            })
            .collect();
        let fit = rotating_fit(&from_angles(&angles));
        let circular_error = normalize_angle(fit.mean_phase_radians - PI).abs();
        assert!(circular_error < 0.05, "mean {}", fit.mean_phase_radians);
        assert!(fit.spread < 0.05, "spread {}", fit.spread);
        assert!(fit.mean_phase_radians.abs() > 3.0);
    }

    #[test]
    fn mean_stays_normalized_for_any_cluster_center() {
        for &center in &[-PI, -2.5, -1.0, 0.0, 0.7, 1.9, 3.0, PI] {
            let angles: Vec<f64> =
                (0..200).map(|i| center + jitter(i, 200) * 0.02).collect();
            let sequence: Vec<Complex<f64>> =
                angles.iter().map(|&a| Complex::from_polar(2.5, a)).collect();
            let fit = rotating_fit(&sequence);
            assert!(
                (-PI..=PI).contains(&fit.mean_phase_radians),
                "center {center}: mean {}",
                fit.mean_phase_radians
            );
            let circular_error =
                normalize_angle(fit.mean_phase_radians - center).abs();
            assert!(circular_error < 0.05, "center {center}");
            assert!(fit.spread >= 0.0);
        }
    }

    #[test]
    fn empty_input_returns_the_documented_convention() {
        let fit = rotating_fit(&[]);
        assert_eq!(fit.mean_phase_radians, 0.0);
        assert_eq!(fit.spread, 0.0);
    }

    #[test]
    fn single_sample_has_zero_spread() {
        let fit = rotating_fit(&from_angles(&[0.4]));
        assert!((fit.mean_phase_radians - 0.4).abs() < 1e-12);
        assert_eq!(fit.spread, 0.0);
    }

    #[test]
    fn phase_comparison_runs_over_the_common_prefix() {
        let wf0 = from_angles(&[0.0, 0.1, 0.2, 0.3]);
        let wf1 = from_angles(&[0.0, 0.1]);
        assert_eq!(phase_comparison(&wf0, &wf1).len(), 2);
    }

    #[test]
    fn positive_rotation_of_the_second_channel_reads_back_negated() {
        let wf0: Vec<Complex<f64>> = (0..500)
            .map(|i| Complex::from_polar(100.0, 0.013 * i as f64))
            .collect();
        let wf1: Vec<Complex<f64>> = wf0
            .iter()
            .map(|s| s * Complex::from_polar(1.0, 0.3))
            .collect();
        let fit = rotating_fit(&phase_comparison(&wf0, &wf1));
        assert!((fit.mean_phase_radians + 0.3).abs() < 1e-9);
        assert!(fit.spread < 1e-9);
    }

    #[test]
    fn phase_angles_pins_all_zero_samples() {
        let angles = phase_angles(&[Complex::new(0.0, 0.0), Complex::new(-1.0, 0.0)]);
        assert_eq!(angles[0], 0.0);
        assert!((angles[1] - PI).abs() < 1e-12);
    }
}
