use num_complex::Complex;
use rustfft::FftPlanner;

use crate::utils::DynError;

/// Frequency axis and scaled FFT magnitudes for a single waveform, for
/// spectrum display.
///
/// Bin layout follows the summary-plot convention: the negative-frequency
/// half first, then the positive half, the DC bin dropped, magnitudes
/// scaled by `1/N`, and `center_freq_hz` added to every axis value. The
/// frequency axis comes out monotonically increasing. An empty waveform
/// yields an empty series.
pub fn magnitude_series(
    waveform: &[Complex<f64>],
    center_freq_hz: f64,
    rate_sps: f64,
) -> Result<(Vec<f64>, Vec<f64>), DynError> {
    if rate_sps <= 0.0 {
        return Err(format!("Sample rate must be positive, received {rate_sps}").into());
    }
    let fft_size = waveform.len();
    if fft_size == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut spectrum = waveform.to_vec();
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);
    fft.process(&mut spectrum);

    let dt = 1.0 / rate_sps;
    let scale = 1.0 / fft_size as f64;
    let half = fft_size / 2;

    let mut freqs = Vec::with_capacity(fft_size);
    let mut magnitudes = Vec::with_capacity(fft_size);
    for bin in (half..fft_size).chain(0..half) {
        let offset = if bin >= half {
            bin as f64 - fft_size as f64
        } else {
            bin as f64
        };
        let freq = offset / (fft_size as f64 * dt);
        if freq.abs() > 0.0 {
            freqs.push(freq + center_freq_hz);
            magnitudes.push(spectrum[bin].norm() * scale);
        }
    }
    Ok((freqs, magnitudes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn single_bin_tone_peaks_at_its_frequency() {
        let n = 64usize;
        let rate = 64.0;
        let tone_bin = 5.0;
        let waveform: Vec<Complex<f64>> = (0..n)
            .map(|i| Complex::from_polar(1.0, 2.0 * PI * tone_bin * i as f64 / n as f64))
            .collect();

        let (freqs, magnitudes) = magnitude_series(&waveform, 1000.0, rate).unwrap();
        assert_eq!(freqs.len(), n - 1); // DC bin dropped

        let (peak_idx, &peak) = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap();
        assert!((peak - 1.0).abs() < 1e-9);
        assert!((freqs[peak_idx] - (1000.0 + tone_bin)).abs() < 1e-9);
        for (idx, &mag) in magnitudes.iter().enumerate() {
            if idx != peak_idx {
                assert!(mag < 1e-9, "bin {idx} leaked {mag}");
            }
        }
    }

    #[test]
    fn axis_is_monotonic_with_negative_half_first() {
        let waveform = vec![Complex::new(1.0, 0.0); 16];
        let (freqs, _) = magnitude_series(&waveform, 0.0, 16.0).unwrap();
        assert_eq!(freqs.first().copied(), Some(-8.0));
        assert!(freqs.windows(2).all(|w| w[0] < w[1]));
        assert!(freqs.iter().all(|&f| f != 0.0));
    }

    #[test]
    fn empty_waveform_yields_empty_series() {
        let (freqs, magnitudes) = magnitude_series(&[], 0.0, 1.0).unwrap();
        assert!(freqs.is_empty());
        assert!(magnitudes.is_empty());
    }

    #[test]
    fn non_positive_rate_is_rejected() {
        assert!(magnitude_series(&[Complex::new(1.0, 0.0)], 0.0, 0.0).is_err());
        assert!(magnitude_series(&[Complex::new(1.0, 0.0)], 0.0, -5.0).is_err());
    }
}
