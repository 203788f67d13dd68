//! Generator and transform modules for cadena chains.
//!
//! Everything here implements [`cadena_core::Module`] and composes into
//! chains through `cadena_core::chain`:
//!
//! - [`SineOscillator`], [`SquareOscillator`], [`SawtoothOscillator`],
//!   [`TriangleOscillator`]: fundamental waveforms with a continuous phase
//! - [`AmplitudeScale`], [`AmplitudeAdd`]: gain and DC offset stages
//! - [`ConstSource`], [`BufferSource`]: fixed-value and stored-stream
//!   sources
//! - [`Counter`]: pass-through throughput counter
//!
//! ## Example
//!
//! ```
//! use cadena_core::chain::{Chain, PeriodSink, Source};
//! use cadena_modules::{AmplitudeScale, SineOscillator};
//!
//! let chain = Chain::new(
//!     AmplitudeScale::new(0.5),
//!     Source::new(SineOscillator::new(440.0)),
//! );
//! let mut sink = PeriodSink::new(chain);
//! sink.meta_info_sync().unwrap();
//! sink.meta_start().unwrap();
//! sink.meta_process().unwrap();
//! let out = sink.take_output().unwrap();
//! assert!(out.iter_sequential().all(|s| s.abs() <= 0.5));
//! ```

pub mod amp;
pub mod meta;
pub mod oscillator;

pub use amp::{AmplitudeAdd, AmplitudeScale};
pub use meta::{BufferSource, ConstSource, Counter};
pub use oscillator::{SawtoothOscillator, SineOscillator, SquareOscillator, TriangleOscillator};
