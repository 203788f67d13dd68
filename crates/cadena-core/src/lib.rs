//! Pull-based audio processing chains.
//!
//! A chain is a line (or DAG) of modules ending in a sink. The sink drives
//! everything: one [`PeriodSink::meta_process`](chain::PeriodSink) call
//! recursively pulls the backward modules down to the sources, and each
//! module transforms the buffer handed to it on the way forward. Ownership
//! follows the pull direction: every module owns its backward neighbor, so
//! topology is acyclic by construction and a chain is dropped as one value.
//!
//! # Modules
//!
//! - [`buffer`]: the multi-channel [`SampleBuffer`] with sequential and
//!   interleaved views over one flat allocation
//! - [`ring`]: an endless index-wrapping [`RingBuffer`]
//! - [`module`]: the [`Module`] lifecycle trait and [`ModuleBase`] state
//! - [`chain`]: the [`ChainModule`] meta-operation protocol, static and
//!   dynamic composition, the sink, and fan-in/fan-out nodes
//! - [`parallel`]: a chain segment decoupled onto a worker thread
//! - [`info`]: chain-wide and per-module configuration
//! - [`error`]: the [`ChainError`] type shared by every operation
//!
//! # Example
//!
//! ```
//! use cadena_core::chain::{Chain, PeriodSink, Source};
//! use cadena_core::error::Result;
//! use cadena_core::module::{Module, ModuleBase};
//!
//! struct Impulse {
//!     base: ModuleBase,
//! }
//!
//! impl Module for Impulse {
//!     fn base(&self) -> &ModuleBase {
//!         &self.base
//!     }
//!
//!     fn base_mut(&mut self) -> &mut ModuleBase {
//!         &mut self.base
//!     }
//!
//!     fn process(&mut self) -> Result<()> {
//!         self.base.make_buffer();
//!         if let Some(buf) = self.base.buffer_mut() {
//!             buf.set(0, 0, 1.0);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<()> {
//!     let source = Source::new(Impulse { base: ModuleBase::new() });
//!     let mut sink = PeriodSink::new(source);
//!     sink.meta_info_sync()?;
//!     sink.meta_start()?;
//!     sink.meta_process()?;
//!     let out = sink.take_output();
//!     assert!(out.is_some());
//!     sink.meta_stop()
//! }
//! ```

pub mod buffer;
pub mod chain;
pub mod error;
pub mod info;
pub mod module;
pub mod parallel;
pub mod ring;

pub use buffer::SampleBuffer;
pub use chain::{Chain, ChainModule, DynModule, MixDown, MixUp, MixUpTap, PeriodSink, Source};
pub use error::{ChainError, ErrorKind, Result};
pub use info::{ChainInfo, ModuleInfo};
pub use module::{Module, ModuleBase, State};
pub use parallel::ParallelModule;
pub use ring::RingBuffer;
