//! Continuous wavelet transform over a monthly series.
//!
//! The transform convolves the signal with the integral of the mother wavelet
//! resampled at each scale, then differentiates and scales the result by
//! `-sqrt(scale)`. The integral is tabulated once on `2^10` points over the
//! wavelet's effective support.

use crate::analysis::error::AnalysisError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Points used to tabulate the integrated mother wavelet.
const PRECISION: usize = 1 << 10;

pub const MIN_SCALES: usize = 32;
pub const MAX_SCALES: usize = 256;
pub const SCALES_STEP: usize = 16;
pub const DEFAULT_SCALES: usize = 128;

/// Real-valued mother wavelets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveletKind {
    /// Mexican hat (negative normalized second derivative of a Gaussian).
    #[default]
    #[serde(rename = "mexh")]
    MexicanHat,
    /// First derivative of a Gaussian.
    Gaus1,
    /// Second derivative of a Gaussian.
    Gaus2,
    /// Real Morlet wavelet.
    #[serde(rename = "morl")]
    Morlet,
}

impl WaveletKind {
    pub const ALL: [WaveletKind; 4] = [
        WaveletKind::MexicanHat,
        WaveletKind::Gaus1,
        WaveletKind::Gaus2,
        WaveletKind::Morlet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WaveletKind::MexicanHat => "mexh",
            WaveletKind::Gaus1 => "gaus1",
            WaveletKind::Gaus2 => "gaus2",
            WaveletKind::Morlet => "morl",
        }
    }

    /// Effective support `[lower, upper]`.
    fn support(self) -> (f64, f64) {
        match self {
            WaveletKind::MexicanHat | WaveletKind::Morlet => (-8.0, 8.0),
            WaveletKind::Gaus1 | WaveletKind::Gaus2 => (-5.0, 5.0),
        }
    }

    fn psi(self, t: f64) -> f64 {
        match self {
            WaveletKind::MexicanHat => {
                2.0 / (3.0f64.sqrt() * PI.powf(0.25)) * (1.0 - t * t) * (-t * t / 2.0).exp()
            }
            WaveletKind::Gaus1 => -2.0 * t * (-t * t).exp() / (PI / 2.0).sqrt().sqrt(),
            WaveletKind::Gaus2 => {
                -2.0 * (2.0 * t * t - 1.0) * (-t * t).exp() / (3.0 * (PI / 2.0).sqrt()).sqrt()
            }
            WaveletKind::Morlet => (-t * t / 2.0).exp() * (5.0 * t).cos(),
        }
    }

    /// Tabulated running integral of the wavelet and the sampling step.
    fn integrated(self) -> (Vec<f64>, f64) {
        let (lower, upper) = self.support();
        let step = (upper - lower) / (PRECISION - 1) as f64;
        let mut acc = 0.0;
        let table = (0..PRECISION)
            .map(|i| {
                acc += self.psi(lower + step * i as f64);
                acc * step
            })
            .collect();
        (table, step)
    }
}

impl fmt::Display for WaveletKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WaveletKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WaveletKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AnalysisError::InvalidParameter(format!("unknown wavelet '{}'", s)))
    }
}

/// Fills gaps in a series: linear interpolation between known values, then
/// leading gaps take the first known value and trailing gaps the last one.
///
/// Fails with `InsufficientObservations` when no value is known.
pub fn prepare_signal(values: &[Option<f64>]) -> Result<Vec<f64>, AnalysisError> {
    let known: Vec<(usize, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.filter(|x| x.is_finite()).map(|x| (i, x)))
        .collect();
    let (Some(&(first_idx, first)), Some(&(last_idx, last))) = (known.first(), known.last()) else {
        return Err(AnalysisError::InsufficientObservations {
            found: 0,
            required: 1,
        });
    };

    let mut signal = vec![0.0; values.len()];
    signal[..first_idx].fill(first);
    signal[last_idx..].fill(last);
    for pair in known.windows(2) {
        let ((i0, v0), (i1, v1)) = (pair[0], pair[1]);
        for (k, slot) in signal[i0..=i1].iter_mut().enumerate() {
            *slot = v0 + (v1 - v0) * k as f64 / (i1 - i0) as f64;
        }
    }
    Ok(signal)
}

/// The scales analysed for a slider value: `1..num_scales`.
pub fn scales(num_scales: usize) -> Result<Vec<f64>, AnalysisError> {
    if !(MIN_SCALES..=MAX_SCALES).contains(&num_scales) || num_scales % SCALES_STEP != 0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "number of scales must be a multiple of {} in [{}, {}], got {}",
            SCALES_STEP, MIN_SCALES, MAX_SCALES, num_scales
        )));
    }
    Ok((1..num_scales).map(|s| s as f64).collect())
}

/// Magnitudes of the wavelet coefficients, one row per scale and one column per
/// sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WaveletTransform {
    pub wavelet: WaveletKind,
    pub scales: Vec<f64>,
    pub magnitudes: Vec<Vec<f64>>,
    /// 99th percentile of all magnitudes, the colour-scale ceiling.
    pub color_ceiling: f64,
}

/// Runs the transform of `signal` at every scale.
pub fn cwt(signal: &[f64], scales: &[f64], wavelet: WaveletKind) -> Result<WaveletTransform, AnalysisError> {
    if signal.is_empty() {
        return Err(AnalysisError::InsufficientObservations {
            found: 0,
            required: 1,
        });
    }
    if let Some(bad) = scales.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
        return Err(AnalysisError::InvalidParameter(format!(
            "scales must be positive, got {}",
            bad
        )));
    }

    let (int_psi, step) = wavelet.integrated();
    let width = step * (PRECISION - 1) as f64;

    let magnitudes: Vec<Vec<f64>> = scales
        .iter()
        .map(|&scale| {
            let len = (scale * width + 1.0).ceil() as usize;
            let mut kernel: Vec<f64> = (0..len)
                .map(|k| (k as f64 / (scale * step)) as usize)
                .take_while(|&j| j < int_psi.len())
                .map(|j| int_psi[j])
                .collect();
            kernel.reverse();
            coefficients(signal, &kernel, scale)
                .into_iter()
                .map(f64::abs)
                .collect()
        })
        .collect();

    let color_ceiling = percentile(magnitudes.iter().flatten().copied(), 99.0).unwrap_or_default();
    Ok(WaveletTransform {
        wavelet,
        scales: scales.to_vec(),
        magnitudes,
        color_ceiling,
    })
}

/// Full convolution, first difference scaled by `-sqrt(scale)`, trimmed
/// symmetrically back to the signal length.
fn coefficients(signal: &[f64], kernel: &[f64], scale: f64) -> Vec<f64> {
    let n = signal.len();
    let m = kernel.len();
    let mut conv = vec![0.0; n + m - 1];
    for (i, s) in signal.iter().enumerate() {
        for (j, k) in kernel.iter().enumerate() {
            conv[i + j] += s * k;
        }
    }
    let factor = -scale.sqrt();
    let diff: Vec<f64> = conv.windows(2).map(|w| factor * (w[1] - w[0])).collect();

    let extra = diff.len().saturating_sub(n);
    let front = extra / 2;
    diff[front..front + n.min(diff.len())].to_vec()
}

/// Linear-interpolated percentile (`p` in `[0, 100]`) of the finite values.
pub fn percentile(values: impl IntoIterator<Item = f64>, p: f64) -> Option<f64> {
    let mut sorted: Vec<OrderedFloat<f64>> = values
        .into_iter()
        .filter(|v| v.is_finite())
        .map(OrderedFloat)
        .collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort();
    let rank = p.clamp(0.0, 100.0) / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo].0 + (sorted[hi].0 - sorted[lo].0) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_signal_fills_gaps() -> Result<(), Box<dyn std::error::Error>> {
        let values = [None, Some(1.0), None, None, Some(4.0), None];
        assert_eq!(prepare_signal(&values)?, vec![1.0, 1.0, 2.0, 3.0, 4.0, 4.0]);
        assert_eq!(prepare_signal(&[Some(2.0)])?, vec![2.0]);
        assert!(prepare_signal(&[None, None]).is_err());
        Ok(())
    }

    #[test]
    fn test_scales_slider_bounds() {
        assert_eq!(scales(32).unwrap().len(), 31);
        assert_eq!(scales(128).unwrap().first(), Some(&1.0));
        assert!(scales(16).is_err());
        assert!(scales(100).is_err());
        assert!(scales(272).is_err());
    }

    #[test]
    fn test_transform_shape() -> Result<(), Box<dyn std::error::Error>> {
        let signal: Vec<f64> = (0..60).map(|i| (i as f64 * PI / 6.0).sin()).collect();
        let scales = scales(32)?;
        for kind in WaveletKind::ALL {
            let transform = cwt(&signal, &scales, kind)?;
            assert_eq!(transform.magnitudes.len(), scales.len());
            assert!(transform.magnitudes.iter().all(|row| row.len() == signal.len()));
            assert!(transform.magnitudes.iter().flatten().all(|v| v.is_finite() && *v >= 0.0));
            assert!(transform.color_ceiling > 0.0);
        }
        Ok(())
    }

    #[test]
    fn test_constant_signal_has_small_interior_response() -> Result<(), Box<dyn std::error::Error>> {
        let signal = vec![5.0; 200];
        let transform = cwt(&signal, &[2.0], WaveletKind::MexicanHat)?;
        // zero-mean wavelet: away from the edges the response vanishes
        let interior = &transform.magnitudes[0][50..150];
        assert!(interior.iter().all(|v| *v < 1e-2), "{:?}", interior);
        Ok(())
    }

    #[test]
    fn test_mother_wavelets_integrate_to_zero() {
        for kind in WaveletKind::ALL {
            let (table, _) = kind.integrated();
            let total = *table.last().unwrap();
            assert!(total.abs() < 1e-3, "{} integrates to {}", kind, total);
        }
    }

    #[test]
    fn test_percentile() {
        let values = (1..=100).map(|v| v as f64);
        assert_eq!(percentile(values.clone(), 0.0), Some(1.0));
        assert_eq!(percentile(values.clone(), 100.0), Some(100.0));
        assert!((percentile(values, 99.0).unwrap() - 99.01).abs() < 1e-9);
        assert_eq!(percentile(std::iter::empty(), 50.0), None);
    }

    #[test]
    fn test_wavelet_names() {
        assert_eq!("mexh".parse::<WaveletKind>().unwrap(), WaveletKind::MexicanHat);
        assert_eq!("MORL".parse::<WaveletKind>().unwrap(), WaveletKind::Morlet);
        assert!("db4".parse::<WaveletKind>().is_err());
    }
}
