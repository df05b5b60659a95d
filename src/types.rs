//! Common types shared across the BoxPulse transit-search pipeline.
//!
//! These structures represent the fundamental data objects in a
//! box-least-squares search: the binned, phase-folded light curve handed
//! to the segment search, the configuration of a trial-period sweep, and
//! the per-period and aggregated detection results.

use serde::{Deserialize, Serialize};

#[cfg(feature = "python-bindings")]
use pyo3::prelude::*;

// ---------------------------------------------------------------------------
// BinnedSegment
// ---------------------------------------------------------------------------

/// One phase-folded, binned light-curve segment for a single trial period.
///
/// Each bin collapses many raw samples into a `(time, flux, samples)`
/// triplet: a representative timestamp, the summed flux residual of the
/// samples that fell into the bin, and the number of those samples.  All
/// vectors share a common bin index and the timestamps are ascending and
/// unique.  Produced by [`crate::binning::fold_and_bin`] and consumed by
/// [`crate::segment_search::search_segment`].
#[cfg_attr(feature = "python-bindings", pyclass(get_all))]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BinnedSegment {
    /// Bin-midpoint timestamp within the folded period, ascending.
    pub time: Vec<f64>,

    /// Per-bin sum of mean-subtracted flux values.
    pub flux: Vec<f64>,

    /// Per-bin quadrature-summed flux uncertainty.  Carried through the
    /// search interface but never read by the search itself.
    pub fluxerr: Vec<f64>,

    /// Number of raw samples folded into each bin.
    pub samples: Vec<f64>,

    /// Total number of finite raw samples across the whole series; the
    /// global normalisation term of the signal-residual statistic.
    pub n: usize,
}

impl BinnedSegment {
    /// Number of bins in the segment.
    pub fn nbins(&self) -> usize {
        self.time.len()
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl BinnedSegment {
    #[new]
    #[pyo3(signature = (time, flux, fluxerr, samples, n))]
    pub fn py_new(
        time: Vec<f64>,
        flux: Vec<f64>,
        fluxerr: Vec<f64>,
        samples: Vec<f64>,
        n: usize,
    ) -> Self {
        Self {
            time,
            flux,
            fluxerr,
            samples,
            n,
        }
    }

    fn __repr__(&self) -> String {
        format!("BinnedSegment(nbins={}, n={})", self.nbins(), self.n)
    }
}

// ---------------------------------------------------------------------------
// PeriodSearchParams
// ---------------------------------------------------------------------------

/// Configuration for a trial-period sweep.
///
/// These parameters control the period grid, the phase binning, and the
/// admissible transit durations of a [`crate::period_search::PeriodSearch`].
#[cfg_attr(feature = "python-bindings", pyclass(get_all, set_all))]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PeriodSearchParams {
    /// Shortest trial period, in the time units of the input series.
    pub min_period: f64,

    /// Longest trial period.  Must not exceed the observed time span —
    /// a period longer than the data cannot complete a single fold.
    pub max_period: f64,

    /// Number of trial periods, spaced evenly in frequency between
    /// `1/min_period` and `1/max_period`.
    pub n_periods: usize,

    /// Minimum admissible transit duration as a fraction of the trial
    /// period.  Typical transits last well under a tenth of the orbit.
    pub min_duration_frac: f64,

    /// Maximum admissible transit duration as a fraction of the trial
    /// period.
    pub max_duration_frac: f64,

    /// Number of phase bins per trial period.  Capped per trial at the
    /// number of cadences the period contains.
    pub nbins: usize,

    /// Number of rayon worker threads for the trial sweep.  Set to 0 to
    /// use all available CPU cores.
    pub n_workers: usize,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PeriodSearchParams {
    #[new]
    #[pyo3(signature = (min_period, max_period, n_periods=1000, min_duration_frac=0.01, max_duration_frac=0.1, nbins=100, n_workers=0))]
    pub fn py_new(
        min_period: f64,
        max_period: f64,
        n_periods: usize,
        min_duration_frac: f64,
        max_duration_frac: f64,
        nbins: usize,
        n_workers: usize,
    ) -> Self {
        Self {
            min_period,
            max_period,
            n_periods,
            min_duration_frac,
            max_duration_frac,
            nbins,
            n_workers,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "PeriodSearchParams(periods=[{:.4}, {:.4}] x{}, durations=[{:.3}, {:.3}], nbins={})",
            self.min_period,
            self.max_period,
            self.n_periods,
            self.min_duration_frac,
            self.max_duration_frac,
            self.nbins,
        )
    }
}

// ---------------------------------------------------------------------------
// PulseCandidate
// ---------------------------------------------------------------------------

/// The strongest box-shaped dip found at one trial period.
///
/// A `srsq` of 0 means no window at this period scored above zero; the
/// remaining fields then describe no detection and must be ignored.
#[cfg_attr(feature = "python-bindings", pyclass(get_all))]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PulseCandidate {
    /// Trial period that produced this candidate.
    pub period: f64,

    /// Maximum signal-residual statistic over all admissible windows.
    pub srsq: f64,

    /// Time span of the winning window.
    pub duration: f64,

    /// Minimum flux residual inside the winning window — an absolute
    /// level, not a relative depth.  Negative for a dip.
    pub depth: f64,

    /// Temporal midpoint of the winning window within the folded period.
    pub midtime: f64,
}

impl PulseCandidate {
    /// The signal-residual amplitude `sqrt(srsq)` reported by the
    /// original periodogram formulation.
    pub fn sr(&self) -> f64 {
        self.srsq.sqrt()
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PulseCandidate {
    #[getter(sr)]
    fn py_sr(&self) -> f64 {
        self.sr()
    }

    fn __repr__(&self) -> String {
        format!(
            "PulseCandidate(period={:.6}, sr={:.4}, duration={:.4}, depth={:.5}, midtime={:.4})",
            self.period,
            self.sr(),
            self.duration,
            self.depth,
            self.midtime,
        )
    }
}

// ---------------------------------------------------------------------------
// SearchOutcome
// ---------------------------------------------------------------------------

/// Aggregated results of a trial-period sweep.
#[cfg_attr(feature = "python-bindings", pyclass(get_all))]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// The strongest candidate across all trial periods, or `None` when
    /// no trial produced a positive statistic.
    pub best: Option<PulseCandidate>,

    /// One candidate per trial period, in period-grid order — the
    /// periodogram of the sweep.
    pub periodogram: Vec<PulseCandidate>,

    /// Number of trial periods searched.
    pub n_periods: usize,

    /// Wall-clock processing time for the sweep, in milliseconds.
    pub processing_time_ms: u64,
}

impl SearchOutcome {
    /// Serialise the outcome to a JSON string for interoperability.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl SearchOutcome {
    #[pyo3(name = "to_json")]
    fn py_to_json(&self) -> PyResult<String> {
        self.to_json()
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        match &self.best {
            Some(c) => format!(
                "SearchOutcome(best_period={:.6}, sr={:.4}, n_periods={}, time={}ms)",
                c.period,
                c.sr(),
                self.n_periods,
                self.processing_time_ms,
            ),
            None => format!(
                "SearchOutcome(no detection, n_periods={}, time={}ms)",
                self.n_periods, self.processing_time_ms,
            ),
        }
    }
}
