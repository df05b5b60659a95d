//! Box-least-squares segment search — the heart of box-shaped transit
//! detection.
//!
//! # Background
//!
//! A planet crossing the disc of its host star blocks a small, roughly
//! constant fraction of the starlight for the duration of the crossing.
//! In a phase-folded, binned light curve the signature is a *box-shaped
//! dip*: a contiguous run of bins whose summed flux sits below the local
//! baseline.  The box-least-squares (BLS) method of Kovacs, Zucker &
//! Mazeh (2002) scores every candidate box by its *signal residual*
//! statistic and keeps the strongest one.
//!
//! # Algorithm overview
//!
//! For every candidate start bin `i`:
//!
//! 1. **Seed** — fold bins `i .. i+nbins_min_dur` into a running flux sum
//!    `s`, weight sum `r`, and running minimum flux `d`, so the shortest
//!    admissible window never has to be rebuilt from scratch.
//! 2. **Extend** — grow the window one bin at a time up to the maximum
//!    admissible duration, updating `s`, `r`, and `d` in O(1) per step.
//! 3. **Score** — at each extension evaluate `s² / (r · (n − r))`: the
//!    squared in-window flux excess over a binomial-variance-like
//!    normalisation built from the fraction of samples inside the window.
//! 4. **Track** — remember the strictly-best score seen for this start,
//!    together with the end bin and minimum flux that produced it.
//! 5. **Record** — write the winning score, time span, depth, and
//!    midpoint into the caller's output arrays at index `i`.
//!
//! The running sums are what make this affordable: a naïve evaluation of
//! every `(start, end)` pair re-sums each window and costs
//! O(N_start × N_end × N_window).  Reusing the partial sums across the
//! inner scan collapses that to O(N_start × N_end) with O(1) additional
//! memory.
//!
//! The outer loop over start bins is embarrassingly parallel — every
//! iteration reads only the shared input slices and writes only its own
//! output index — so [`search_segment_parallel`] offers a rayon
//! parallel-for over the same contract with bit-identical results.

use rayon::prelude::*;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during a segment search.
///
/// All of these are caller-fixable input problems; the search either fully
/// succeeds or fails before any output is written.
#[derive(Debug, thiserror::Error)]
pub enum SegmentSearchError {
    #[error("array length mismatch: {name} has {actual} elements, expected {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("total sample count n must be positive")]
    NoSamples,

    #[error("duration bounds invalid: nbins_min_dur={min}, nbins_max_dur={max}")]
    BadDurationBounds { min: usize, max: usize },
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Search one binned segment for the strongest box-shaped dip at every
/// admissible start bin.
///
/// For each start bin `i` in `[0, nbins - nbins_min_dur)` the scan finds
/// the end bin `j` with `i + nbins_min_dur <= j < min(i + nbins_max_dur,
/// nbins)` that maximises the signal-residual statistic, and records at
/// index `i`:
///
/// * `srsq[i]`    — the winning statistic (0 when no window scored above 0),
/// * `duration[i]`— `time[j] - time[i]`, the span of the winning window,
/// * `depth[i]`   — the minimum flux inside the winning window (an
///   absolute level, not a relative depth),
/// * `midtime[i]` — `(time[j] + time[i]) / 2`.
///
/// When the inner scan has no admissible window, or nothing scores above
/// zero, the outputs describe the seeded minimum-duration window and
/// `srsq[i]` stays 0 — consumers must treat `srsq[i] == 0` as "no signal
/// at this start" and ignore the other three fields there.  Output
/// entries at `i >= nbins - nbins_min_dur` are never written.
///
/// # Arguments
///
/// * `time`      — representative timestamp per bin, ascending.
/// * `flux`      — per-bin summed flux residuals.
/// * `fluxerr`   — per-bin flux uncertainties; carried for interface
///   symmetry with the binning stage, never read by the search.
/// * `samples`   — per-bin raw-sample counts (weights).
/// * `n`         — total number of raw samples in the whole series.
/// * `nbins_min_dur` / `nbins_max_dur` — inclusive/exclusive bounds on the
///   event duration, in bins.  A maximum beyond `nbins` is clamped.
/// * `srsq`, `duration`, `depth`, `midtime` — caller-allocated outputs,
///   one entry per bin.
///
/// All slices must have exactly `time.len()` elements.  Inputs are
/// expected to be finite; the caller filters invalid samples beforehand.
///
/// # Errors
///
/// Fails fast, before writing any output, on mismatched slice lengths,
/// `n == 0`, `nbins_min_dur == 0`, or `nbins_min_dur > nbins_max_dur`.
#[allow(clippy::too_many_arguments)]
pub fn search_segment(
    time: &[f64],
    flux: &[f64],
    fluxerr: &[f64],
    samples: &[f64],
    n: usize,
    nbins_min_dur: usize,
    nbins_max_dur: usize,
    srsq: &mut [f64],
    duration: &mut [f64],
    depth: &mut [f64],
    midtime: &mut [f64],
) -> Result<(), SegmentSearchError> {
    validate(
        time, flux, fluxerr, samples, n, nbins_min_dur, nbins_max_dur, srsq, duration, depth,
        midtime,
    )?;

    let nbins = time.len();
    let nn = n as f64;

    for i in 0..nbins.saturating_sub(nbins_min_dur) {
        let best = best_window(flux, samples, nn, i, nbins_min_dur, nbins_max_dur);
        srsq[i] = best.srsq;
        duration[i] = time[best.end] - time[i];
        depth[i] = best.depth;
        midtime[i] = (time[best.end] + time[i]) / 2.0;
    }

    Ok(())
}

/// Parallel variant of [`search_segment`]: identical contract, identical
/// (bit-for-bit) results, with the start-bin loop partitioned across the
/// rayon thread pool.
///
/// Each start bin writes only its own output index and reads only the
/// shared immutable inputs, so no synchronisation is needed beyond the
/// final join.
#[allow(clippy::too_many_arguments)]
pub fn search_segment_parallel(
    time: &[f64],
    flux: &[f64],
    fluxerr: &[f64],
    samples: &[f64],
    n: usize,
    nbins_min_dur: usize,
    nbins_max_dur: usize,
    srsq: &mut [f64],
    duration: &mut [f64],
    depth: &mut [f64],
    midtime: &mut [f64],
) -> Result<(), SegmentSearchError> {
    validate(
        time, flux, fluxerr, samples, n, nbins_min_dur, nbins_max_dur, srsq, duration, depth,
        midtime,
    )?;

    let nbins = time.len();
    let nn = n as f64;
    let limit = nbins.saturating_sub(nbins_min_dur);

    (
        &mut srsq[..limit],
        &mut duration[..limit],
        &mut depth[..limit],
        &mut midtime[..limit],
    )
        .into_par_iter()
        .enumerate()
        .for_each(|(i, (sr, dur, dep, mid))| {
            let best = best_window(flux, samples, nn, i, nbins_min_dur, nbins_max_dur);
            *sr = best.srsq;
            *dur = time[best.end] - time[i];
            *dep = best.depth;
            *mid = (time[best.end] + time[i]) / 2.0;
        });

    Ok(())
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Winning window for a single start bin.
struct BestWindow {
    /// Maximum signal-residual statistic; 0 when nothing scored above 0.
    srsq: f64,
    /// End bin of the winning window; the last seed bin when `srsq` is 0.
    end: usize,
    /// Minimum flux inside the winning window.
    depth: f64,
}

/// Scan all admissible end bins for the window starting at `i`.
///
/// Requires `i + min_dur < flux.len()`, which the callers' loop bounds
/// guarantee.
fn best_window(
    flux: &[f64],
    samples: &[f64],
    nn: f64,
    i: usize,
    min_dur: usize,
    max_dur: usize,
) -> BestWindow {
    let nbins = flux.len();

    // Seed with the minimum-duration window [i, i + min_dur).
    let mut s = 0.0;
    let mut r = 0.0;
    let mut d = flux[i];
    for k in i..i + min_dur {
        s += flux[k];
        r += samples[k];
        d = d.min(flux[k]);
    }

    let mut best = BestWindow {
        srsq: 0.0,
        end: i + min_dur - 1,
        depth: d,
    };

    for j in (i + min_dur).min(nbins)..(i + max_dur).min(nbins) {
        s += flux[j];
        r += samples[j];
        d = d.min(flux[j]);

        // A window holding none or all of the samples has no defined
        // variance normalisation; such candidates can never win.
        if r <= 0.0 || r >= nn {
            continue;
        }

        let srsq_new = (s * s) / (r * (nn - r));
        if srsq_new.is_finite() && srsq_new > best.srsq {
            best.srsq = srsq_new;
            best.end = j;
            best.depth = d;
        }
    }

    best
}

/// Check every slice length and scalar bound before any output is written.
#[allow(clippy::too_many_arguments)]
fn validate(
    time: &[f64],
    flux: &[f64],
    fluxerr: &[f64],
    samples: &[f64],
    n: usize,
    nbins_min_dur: usize,
    nbins_max_dur: usize,
    srsq: &[f64],
    duration: &[f64],
    depth: &[f64],
    midtime: &[f64],
) -> Result<(), SegmentSearchError> {
    let nbins = time.len();
    let check = |name: &'static str, actual: usize| {
        if actual == nbins {
            Ok(())
        } else {
            Err(SegmentSearchError::LengthMismatch {
                name,
                expected: nbins,
                actual,
            })
        }
    };
    check("flux", flux.len())?;
    check("fluxerr", fluxerr.len())?;
    check("samples", samples.len())?;
    check("srsq", srsq.len())?;
    check("duration", duration.len())?;
    check("depth", depth.len())?;
    check("midtime", midtime.len())?;

    if n == 0 {
        return Err(SegmentSearchError::NoSamples);
    }
    if nbins_min_dur == 0 || nbins_min_dur > nbins_max_dur {
        return Err(SegmentSearchError::BadDurationBounds {
            min: nbins_min_dur,
            max: nbins_max_dur,
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Python bindings
// ---------------------------------------------------------------------------

/// Run the segment search from Python.
///
/// Allocates zero-filled output arrays of `len(time)` entries, runs the
/// serial search, and returns `(srsq, duration, depth, midtime)`.
/// Entries the search does not process stay 0.
#[cfg(feature = "python-bindings")]
#[pyo3::pyfunction]
#[pyo3(name = "search_segment")]
#[allow(clippy::too_many_arguments)]
pub fn py_search_segment(
    time: Vec<f64>,
    flux: Vec<f64>,
    fluxerr: Vec<f64>,
    samples: Vec<f64>,
    n: usize,
    nbins_min_dur: usize,
    nbins_max_dur: usize,
) -> pyo3::PyResult<(Vec<f64>, Vec<f64>, Vec<f64>, Vec<f64>)> {
    let nbins = time.len();
    let mut srsq = vec![0.0; nbins];
    let mut duration = vec![0.0; nbins];
    let mut depth = vec![0.0; nbins];
    let mut midtime = vec![0.0; nbins];
    search_segment(
        &time, &flux, &fluxerr, &samples, n, nbins_min_dur, nbins_max_dur, &mut srsq,
        &mut duration, &mut depth, &mut midtime,
    )
    .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))?;
    Ok((srsq, duration, depth, midtime))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
