//! Numerical and geometrical core for railway track-geometry maintenance
//! planning: restoration of the maintenance-realizable waveform from noisy
//! measurements, plan-line generation, movement and MTT correction, and
//! quality statistics.
//!
//! The crate is organized as five cooperating components, composed
//! bottom-up: signal primitives ([`sample`]), the spectral engine
//! ([`spectral`]), the restoration pipeline ([`restore`]), the geometry
//! engine ([`geometry`]), and correction & quality ([`correction`]). Each
//! layer depends only on the previous one. [`curve`] and [`editor`] are data
//! model and interactive-editing support consumed alongside the pipeline;
//! [`cache`] is an optional session-scoped memoization helper.
//!
//! The crate owns no global mutable state: every pipeline call is a total
//! function of its inputs and an [`abort::AbortToken`], and every fallible
//! operation returns [`error::Result`].

pub mod abort;
pub mod cache;
pub mod correction;
pub mod curve;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod restore;
pub mod sample;
pub mod spectral;
mod util;

pub use abort::AbortToken;
pub use error::{Diagnostics, Result, TrackGeomError, Warning};
pub use restore::{restore, RestoreConfig};
pub use sample::{pearson_correlation, resample, statistics, std_dev, ResampledSeries, Sample, Series, Statistics};
pub use spectral::{FftEngine, FilterSpec, SpectralBuffer};
