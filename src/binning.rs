//! Phase folding and binning of raw light curves.
//!
//! The segment search operates on an already-binned series: it never sees
//! individual samples.  This module is the stage in front of it — it takes
//! a raw, possibly gappy and NaN-ridden light curve and, for one trial
//! period, produces the `(time, flux, samples)` triplet the search
//! consumes:
//!
//! 1. **Filter** — drop every sample whose time or flux is non-finite.
//!    Spacecraft light curves routinely carry NaN flux for flagged
//!    cadences, and the search assumes finite input throughout.
//! 2. **Centre** — subtract the mean of the remaining flux.  The
//!    signal-residual numerator is a flux *excess*, so the binned sums
//!    must be residuals around zero.
//! 3. **Fold** — map each timestamp to its phase within the trial period,
//!    measured from the first valid sample.
//! 4. **Bin** — accumulate per-bin flux sums, sample counts, and
//!    quadrature-summed uncertainties over `nbins` equal phase slices,
//!    and stamp each bin with its midpoint time within the period.
//!
//! Empty bins are legitimate output: they carry a zero flux sum and zero
//! weight, and the search's normalisation guard keeps them from ever
//! producing an undefined score.

use log::debug;

use crate::types::BinnedSegment;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur while folding and binning a light curve.
#[derive(Debug, thiserror::Error)]
pub enum BinningError {
    #[error("input arrays are empty")]
    EmptyInput,

    #[error("array length mismatch: {name} has {actual} elements, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("trial period must be positive and finite, got {0}")]
    InvalidPeriod(f64),

    #[error("number of bins must be positive")]
    NoBins,

    #[error("no finite samples remain after filtering")]
    NoFiniteSamples,
}

// ---------------------------------------------------------------------------
// Folding and binning
// ---------------------------------------------------------------------------

/// Fold a light curve at `period` and bin it into `nbins` phase slices.
///
/// Timestamps are expected in ascending order; phases are measured from
/// the first sample that survives filtering.  A sample is kept when both
/// its time and flux are finite; a non-finite `fluxerr` is treated as an
/// unknown (zero) uncertainty rather than grounds for rejection.
///
/// The returned [`BinnedSegment`] carries bin-midpoint timestamps
/// `(i + 0.5) * period / nbins`, per-bin sums of mean-subtracted flux,
/// quadrature-summed errors, per-bin sample counts, and the total number
/// of kept samples.
///
/// # Errors
///
/// Fails on empty input, mismatched array lengths, a non-positive or
/// non-finite period, a zero bin count, or when filtering leaves no
/// sample behind.
pub fn fold_and_bin(
    time: &[f64],
    flux: &[f64],
    fluxerr: &[f64],
    period: f64,
    nbins: usize,
) -> Result<BinnedSegment, BinningError> {
    if time.is_empty() {
        return Err(BinningError::EmptyInput);
    }
    if flux.len() != time.len() {
        return Err(BinningError::LengthMismatch {
            name: "flux",
            expected: time.len(),
            actual: flux.len(),
        });
    }
    if fluxerr.len() != time.len() {
        return Err(BinningError::LengthMismatch {
            name: "fluxerr",
            expected: time.len(),
            actual: fluxerr.len(),
        });
    }
    if !period.is_finite() || period <= 0.0 {
        return Err(BinningError::InvalidPeriod(period));
    }
    if nbins == 0 {
        return Err(BinningError::NoBins);
    }

    let keep = |t: f64, f: f64| t.is_finite() && f.is_finite();

    // First pass: count the valid samples and their mean flux.
    let mut n = 0usize;
    let mut flux_sum = 0.0;
    let mut t0 = f64::NAN;
    for (&t, &f) in time.iter().zip(flux) {
        if keep(t, f) {
            if n == 0 {
                t0 = t;
            }
            n += 1;
            flux_sum += f;
        }
    }
    if n == 0 {
        return Err(BinningError::NoFiniteSamples);
    }
    let mean = flux_sum / n as f64;

    let dropped = time.len() - n;
    if dropped > 0 {
        debug!(
            "fold_and_bin: dropped {} non-finite of {} samples",
            dropped,
            time.len(),
        );
    }

    // Second pass: fold each kept sample and accumulate its bin.
    let mut bin_flux = vec![0.0; nbins];
    let mut bin_errsq = vec![0.0; nbins];
    let mut bin_samples = vec![0.0; nbins];

    for ((&t, &f), &e) in time.iter().zip(flux).zip(fluxerr) {
        if !keep(t, f) {
            continue;
        }
        let phase = ((t - t0) / period).fract();
        // phase is in [0, 1) for ascending input; the min() guards the
        // floating-point edge where phase * nbins rounds up to nbins.
        let bin = ((phase * nbins as f64) as usize).min(nbins - 1);
        bin_flux[bin] += f - mean;
        bin_samples[bin] += 1.0;
        if e.is_finite() {
            bin_errsq[bin] += e * e;
        }
    }

    let bin_width = period / nbins as f64;
    let bin_time: Vec<f64> = (0..nbins).map(|i| (i as f64 + 0.5) * bin_width).collect();
    let bin_fluxerr: Vec<f64> = bin_errsq.iter().map(|&v| v.sqrt()).collect();

    Ok(BinnedSegment {
        time: bin_time,
        flux: bin_flux,
        fluxerr: bin_fluxerr,
        samples: bin_samples,
        n,
    })
}

// ---------------------------------------------------------------------------
// Python bindings
// ---------------------------------------------------------------------------

/// Fold and bin a light curve from Python.
#[cfg(feature = "python-bindings")]
#[pyo3::pyfunction]
#[pyo3(name = "fold_and_bin", signature = (time, flux, fluxerr, period, nbins=100))]
pub fn py_fold_and_bin(
    time: Vec<f64>,
    flux: Vec<f64>,
    fluxerr: Vec<f64>,
    period: f64,
    nbins: usize,
) -> pyo3::PyResult<BinnedSegment> {
    fold_and_bin(&time, &flux, &fluxerr, period, nbins)
        .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn folds_two_cycles_onto_the_same_bins() {
        // Two exact cycles of period 4 at unit cadence: every bin collects
        // one sample from each cycle.
        let time: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let flux = [1.0, 2.0, 3.0, 4.0, 1.0, 2.0, 3.0, 4.0];
        let fluxerr = vec![0.1; 8];

        let seg = fold_and_bin(&time, &flux, &fluxerr, 4.0, 4).unwrap();

        assert_eq!(seg.nbins(), 4);
        assert_eq!(seg.n, 8);
        assert_eq!(seg.samples, vec![2.0, 2.0, 2.0, 2.0]);

        // Mean is 2.5; bin sums are residual pairs.
        assert_relative_eq!(seg.flux[0], -3.0, epsilon = 1e-12);
        assert_relative_eq!(seg.flux[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(seg.flux[2], 1.0, epsilon = 1e-12);
        assert_relative_eq!(seg.flux[3], 3.0, epsilon = 1e-12);

        // Bin-midpoint timestamps, ascending.
        assert_eq!(seg.time, vec![0.5, 1.5, 2.5, 3.5]);

        // Quadrature-summed errors: sqrt(2) * 0.1 per bin.
        for &e in &seg.fluxerr {
            assert_relative_eq!(e, 0.1 * 2.0f64.sqrt(), epsilon = 1e-12);
        }
    }

    #[test]
    fn binned_residuals_sum_to_zero() {
        let time: Vec<f64> = (0..50).map(|i| i as f64 * 0.3).collect();
        let flux: Vec<f64> = (0..50).map(|i| 10.0 + (i as f64 * 1.7).sin()).collect();
        let fluxerr = vec![0.0; 50];

        let seg = fold_and_bin(&time, &flux, &fluxerr, 2.4, 8).unwrap();
        let total: f64 = seg.flux.iter().sum();
        assert!(total.abs() < 1e-9, "residual sum {}", total);
    }

    #[test]
    fn non_finite_samples_are_dropped() {
        let time = [0.0, 1.0, f64::NAN, 3.0, 4.0, 5.0];
        let flux = [1.0, f64::NAN, 1.0, 1.0, 1.0, 1.0];
        let fluxerr = [0.1, 0.1, 0.1, f64::INFINITY, 0.1, 0.1];

        let seg = fold_and_bin(&time, &flux, &fluxerr, 6.0, 3).unwrap();

        // Samples at indices 1 and 2 are gone; the infinite error at
        // index 3 contributes nothing but the sample itself is kept.
        assert_eq!(seg.n, 4);
        assert_relative_eq!(seg.samples.iter().sum::<f64>(), 4.0, epsilon = 1e-12);

        // All-flat kept flux means every residual bin sum is zero.
        for &f in &seg.flux {
            assert_relative_eq!(f, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_invalid_inputs() {
        let time = [0.0, 1.0];
        let flux = [1.0, 2.0];
        let fluxerr = [0.0, 0.0];

        assert!(matches!(
            fold_and_bin(&[], &[], &[], 1.0, 4),
            Err(BinningError::EmptyInput)
        ));
        assert!(matches!(
            fold_and_bin(&time, &flux[..1], &fluxerr, 1.0, 4),
            Err(BinningError::LengthMismatch { name: "flux", .. })
        ));
        assert!(matches!(
            fold_and_bin(&time, &flux, &fluxerr, 0.0, 4),
            Err(BinningError::InvalidPeriod(_))
        ));
        assert!(matches!(
            fold_and_bin(&time, &flux, &fluxerr, f64::NAN, 4),
            Err(BinningError::InvalidPeriod(_))
        ));
        assert!(matches!(
            fold_and_bin(&time, &flux, &fluxerr, 1.0, 0),
            Err(BinningError::NoBins)
        ));
        assert!(matches!(
            fold_and_bin(&[f64::NAN, f64::NAN], &flux, &fluxerr, 1.0, 4),
            Err(BinningError::NoFiniteSamples)
        ));
    }
}
