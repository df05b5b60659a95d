//! Trial-period sweep — the driver around the box-least-squares core.
//!
//! A transit repeats once per orbit, but the orbital period is unknown.
//! The classical remedy is brute force: lay a grid of trial periods over
//! the plausible range, phase-fold and bin the light curve at each one,
//! run the segment search on the folded series, and keep the period whose
//! best window scores highest.  A genuine periodic dip only stacks up
//! coherently when the trial period matches the true one; at every other
//! trial the dip smears across phase and the statistic collapses.
//!
//! Trial periods are independent of one another, so the sweep is
//! parallelised across the rayon thread pool, one fold-bin-search
//! pipeline per trial.

use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::binning::{fold_and_bin, BinningError};
use crate::segment_search::{search_segment, SegmentSearchError};
use crate::types::{PeriodSearchParams, PulseCandidate, SearchOutcome};

#[cfg(feature = "python-bindings")]
use pyo3::prelude::*;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during a trial-period sweep.
#[derive(Debug, thiserror::Error)]
pub enum PeriodSearchError {
    #[error("input arrays are empty")]
    EmptyInput,

    #[error("array length mismatch: {name} has {actual} elements, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("period range invalid: min_period={min}, max_period={max}")]
    BadPeriodRange { min: f64, max: f64 },

    #[error("max_period {max_period} exceeds the observed time span {span}")]
    PeriodExceedsSpan { max_period: f64, span: f64 },

    #[error("duration fractions invalid: min={min}, max={max}")]
    BadDurationFractions { min: f64, max: f64 },

    #[error("number of phase bins must be positive")]
    NoBins,

    #[error("number of trial periods must be positive")]
    NoTrialPeriods,

    #[error(transparent)]
    Binning(#[from] BinningError),

    #[error(transparent)]
    Segment(#[from] SegmentSearchError),
}

// ---------------------------------------------------------------------------
// PeriodSearch
// ---------------------------------------------------------------------------

/// The trial-period sweep engine.
///
/// Construct with a [`PeriodSearchParams`] and call [`PeriodSearch::run`]
/// on a raw light curve to obtain a [`SearchOutcome`] with the strongest
/// candidate and the full periodogram.
#[cfg_attr(feature = "python-bindings", pyclass)]
#[derive(Clone, Debug)]
pub struct PeriodSearch {
    /// Configuration controlling the period grid, binning, and duration
    /// bounds.
    params: PeriodSearchParams,
}

impl PeriodSearch {
    /// Create a new sweep engine with the given parameters.
    pub fn new(params: PeriodSearchParams) -> Self {
        Self { params }
    }

    /// Run the sweep over a raw light curve.
    ///
    /// `time` must be ascending; `flux` and `fluxerr` are aligned with it.
    /// Non-finite samples are dropped by the binning stage, never seen by
    /// the core search.
    ///
    /// # Errors
    ///
    /// Fails fast on an invalid configuration or malformed input arrays;
    /// per-trial binning or search failures abort the sweep and propagate.
    pub fn run(
        &self,
        time: &[f64],
        flux: &[f64],
        fluxerr: &[f64],
    ) -> Result<SearchOutcome, PeriodSearchError> {
        let start = Instant::now();
        self.validate(time, flux, fluxerr)?;

        // -- configure rayon thread pool -----------------------------------
        if self.params.n_workers > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.params.n_workers)
                .build_global()
                .ok(); // ignore if already initialised
        }

        let freqs = trial_frequencies(
            self.params.min_period,
            self.params.max_period,
            self.params.n_periods,
        );
        let cadence = median_cadence(time);

        info!(
            "Starting period search: {} samples, {} trial periods in [{:.4}, {:.4}]",
            time.len(),
            freqs.len(),
            self.params.min_period,
            self.params.max_period,
        );

        // -- parallel sweep over trial periods -----------------------------
        let periodogram: Vec<PulseCandidate> = freqs
            .par_iter()
            .map(|&f| self.search_single_period(time, flux, fluxerr, 1.0 / f, cadence))
            .collect::<Result<_, _>>()?;

        // -- aggregate: strongest positive statistic, first trial wins -----
        let mut best: Option<&PulseCandidate> = None;
        for c in &periodogram {
            if c.srsq > best.map_or(0.0, |b| b.srsq) {
                best = Some(c);
            }
        }
        let best = best.cloned();

        let elapsed = start.elapsed().as_millis() as u64;
        match &best {
            Some(c) => info!(
                "Period search complete in {} ms — best period {:.6} (sr = {:.4})",
                elapsed,
                c.period,
                c.sr(),
            ),
            None => info!("Period search complete in {} ms — no detection", elapsed),
        }

        Ok(SearchOutcome {
            best,
            periodogram,
            n_periods: self.params.n_periods,
            processing_time_ms: elapsed,
        })
    }

    // ======================================================================
    // Internal helpers
    // ======================================================================

    /// Fold, bin, and search one trial period; reduce the per-start
    /// outputs to the single best candidate for this trial.
    fn search_single_period(
        &self,
        time: &[f64],
        flux: &[f64],
        fluxerr: &[f64],
        period: f64,
        cadence: f64,
    ) -> Result<PulseCandidate, PeriodSearchError> {
        // A trial period spanning fewer cadences than the bin count would
        // leave most bins empty; cap the bin count at the number of
        // samples one period can hold.
        let mut nbins = self.params.nbins;
        if cadence > 0.0 {
            let cap = (period / cadence + 1.0) as usize;
            if cap < nbins {
                nbins = cap.max(1);
            }
        }

        let min_dur = ((self.params.min_duration_frac * nbins as f64) as usize).max(1);
        let max_dur = ((self.params.max_duration_frac * nbins as f64) as usize + 1).max(min_dur);

        let seg = fold_and_bin(time, flux, fluxerr, period, nbins)?;

        let nb = seg.nbins();
        let mut srsq = vec![0.0; nb];
        let mut duration = vec![0.0; nb];
        let mut depth = vec![0.0; nb];
        let mut midtime = vec![0.0; nb];
        search_segment(
            &seg.time,
            &seg.flux,
            &seg.fluxerr,
            &seg.samples,
            seg.n,
            min_dur,
            max_dur,
            &mut srsq,
            &mut duration,
            &mut depth,
            &mut midtime,
        )?;

        let mut best_i = None;
        let mut best_v = 0.0;
        for (i, &v) in srsq.iter().enumerate() {
            if v > best_v {
                best_v = v;
                best_i = Some(i);
            }
        }

        debug!(
            "trial period {:.6}: nbins={}, durations=[{}, {}), srsq_max={:.6e}",
            period, nbins, min_dur, max_dur, best_v,
        );

        Ok(match best_i {
            Some(i) => PulseCandidate {
                period,
                srsq: srsq[i],
                duration: duration[i],
                depth: depth[i],
                midtime: midtime[i],
            },
            None => PulseCandidate {
                period,
                srsq: 0.0,
                duration: 0.0,
                depth: 0.0,
                midtime: 0.0,
            },
        })
    }

    /// Sanity-check the configuration and input arrays before any work.
    fn validate(
        &self,
        time: &[f64],
        flux: &[f64],
        fluxerr: &[f64],
    ) -> Result<(), PeriodSearchError> {
        if time.is_empty() {
            return Err(PeriodSearchError::EmptyInput);
        }
        if flux.len() != time.len() {
            return Err(PeriodSearchError::LengthMismatch {
                name: "flux",
                expected: time.len(),
                actual: flux.len(),
            });
        }
        if fluxerr.len() != time.len() {
            return Err(PeriodSearchError::LengthMismatch {
                name: "fluxerr",
                expected: time.len(),
                actual: fluxerr.len(),
            });
        }

        let p = &self.params;
        if !p.min_period.is_finite()
            || !p.max_period.is_finite()
            || p.min_period <= 0.0
            || p.max_period <= p.min_period
        {
            return Err(PeriodSearchError::BadPeriodRange {
                min: p.min_period,
                max: p.max_period,
            });
        }
        let span = time[time.len() - 1] - time[0];
        if p.max_period > span {
            return Err(PeriodSearchError::PeriodExceedsSpan {
                max_period: p.max_period,
                span,
            });
        }
        if !(p.min_duration_frac > 0.0
            && p.min_duration_frac < p.max_duration_frac
            && p.max_duration_frac <= 1.0)
        {
            return Err(PeriodSearchError::BadDurationFractions {
                min: p.min_duration_frac,
                max: p.max_duration_frac,
            });
        }
        if p.nbins == 0 {
            return Err(PeriodSearchError::NoBins);
        }
        if p.n_periods == 0 {
            return Err(PeriodSearchError::NoTrialPeriods);
        }

        Ok(())
    }
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl PeriodSearch {
    #[new]
    pub fn py_new(params: PeriodSearchParams) -> Self {
        Self::new(params)
    }

    /// Run the sweep from Python.
    #[pyo3(name = "run")]
    pub fn py_run(
        &self,
        time: Vec<f64>,
        flux: Vec<f64>,
        fluxerr: Vec<f64>,
    ) -> PyResult<SearchOutcome> {
        self.run(&time, &flux, &fluxerr)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!("PeriodSearch({:?})", self.params)
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

/// Trial frequencies evenly spaced between `1/min_period` and
/// `1/max_period`, highest frequency (shortest period) first.
fn trial_frequencies(min_period: f64, max_period: f64, n: usize) -> Vec<f64> {
    let f_hi = 1.0 / min_period;
    let f_lo = 1.0 / max_period;
    if n == 1 {
        return vec![f_hi];
    }
    let step = (f_hi - f_lo) / (n - 1) as f64;
    (0..n).map(|k| f_hi - k as f64 * step).collect()
}

/// Median spacing between consecutive timestamps; 0 when none is usable.
fn median_cadence(time: &[f64]) -> f64 {
    let mut dts: Vec<f64> = time
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|d| d.is_finite() && *d > 0.0)
        .collect();
    if dts.is_empty() {
        return 0.0;
    }
    dts.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    dts[dts.len() / 2]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
