//! # boxpulse-core
//!
//! Box-least-squares (BLS) transit-search library written in Rust with
//! optional Python bindings via [PyO3](https://pyo3.rs).
//!
//! ## Overview
//!
//! This crate provides the computational core of the **BoxPulse**
//! pipeline:
//!
//! | Module             | Purpose                                                   |
//! |--------------------|-----------------------------------------------------------|
//! | [`segment_search`] | Signal-residual box search over one binned segment        |
//! | [`binning`]        | Phase-folds and bins raw light curves for one trial period|
//! | [`period_search`]  | Sweeps a trial-period grid and aggregates detections      |
//! | [`types`]          | Shared data structures (segments, params, candidates)     |
//!
//! The segment search is the hot loop: an exhaustive scan over every
//! admissible `(start, duration)` window of a binned series, made
//! quadratic instead of cubic by carrying running sums across the inner
//! scan.  Everything else prepares its input or drives it across trial
//! periods.
//!
//! ## Rust usage
//!
//! ```no_run
//! use boxpulse_core::{PeriodSearch, PeriodSearchParams};
//!
//! let (time, flux, fluxerr): (Vec<f64>, Vec<f64>, Vec<f64>) = unimplemented!();
//!
//! let params = PeriodSearchParams {
//!     min_period: 0.5,
//!     max_period: 20.0,
//!     n_periods: 2000,
//!     min_duration_frac: 0.01,
//!     max_duration_frac: 0.1,
//!     nbins: 100,
//!     n_workers: 0,
//! };
//! let outcome = PeriodSearch::new(params).run(&time, &flux, &fluxerr)?;
//! if let Some(best) = outcome.best {
//!     println!("best period {:.6}, sr {:.4}", best.period, best.sr());
//! }
//! # Ok::<(), boxpulse_core::PeriodSearchError>(())
//! ```
//!
//! ## Python usage
//!
//! When compiled with the `python-bindings` feature (the default for
//! wheel builds), the library exposes a Python module called
//! `boxpulse_core`:
//!
//! ```python
//! import boxpulse_core
//!
//! params = boxpulse_core.PeriodSearchParams(min_period=0.5, max_period=20.0)
//! outcome = boxpulse_core.PeriodSearch(params).run(time, flux, fluxerr)
//! print(outcome.best)
//!
//! # Or drive the stages directly:
//! seg = boxpulse_core.fold_and_bin(time, flux, fluxerr, period=2.0, nbins=100)
//! srsq, duration, depth, midtime = boxpulse_core.search_segment(
//!     seg.time, seg.flux, seg.fluxerr, seg.samples, seg.n, 1, 11)
//! ```

pub mod binning;
pub mod period_search;
pub mod segment_search;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use binning::{fold_and_bin, BinningError};
pub use period_search::{PeriodSearch, PeriodSearchError};
pub use segment_search::{search_segment, search_segment_parallel, SegmentSearchError};
pub use types::{BinnedSegment, PeriodSearchParams, PulseCandidate, SearchOutcome};

#[cfg(feature = "python-bindings")]
use pyo3::prelude::*;

/// The top-level Python module exposed by this crate.
///
/// Registered items:
/// - `PeriodSearch` — the trial-period sweep engine
/// - `PeriodSearchParams` — sweep configuration
/// - `BinnedSegment` — one folded, binned light-curve segment
/// - `PulseCandidate` — the best window at one trial period
/// - `SearchOutcome` — aggregated sweep output
/// - `fold_and_bin` — fold and bin a light curve at one trial period
/// - `search_segment` — run the box search on one binned segment
#[cfg(feature = "python-bindings")]
#[pymodule]
fn boxpulse_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<period_search::PeriodSearch>()?;
    m.add_class::<types::PeriodSearchParams>()?;
    m.add_class::<types::BinnedSegment>()?;
    m.add_class::<types::PulseCandidate>()?;
    m.add_class::<types::SearchOutcome>()?;
    m.add_function(wrap_pyfunction!(binning::py_fold_and_bin, m)?)?;
    m.add_function(wrap_pyfunction!(segment_search::py_search_segment, m)?)?;

    // Module-level metadata
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Box-least-squares transit search core.")?;

    Ok(())
}
