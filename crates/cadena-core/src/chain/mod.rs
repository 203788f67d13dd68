//! The chain-binding protocol: meta-operations over linked modules.
//!
//! A chain is a backward-directed graph of modules terminating in sources.
//! The terminal sink, asked for output, recursively asks its backward module
//! to run, which asks *its* backward module, down to a source; buffers flow
//! forward as each node finishes. The recursive drivers are the
//! *meta-operations* on [`ChainModule`]: each one completes the entire
//! reachable backward subtree before acting on the current node
//! (post-order), so data dependencies are satisfied by construction.
//!
//! # Two composition strategies
//!
//! - **Static chains** nest concrete types: [`Chain<M, B>`](Chain) owns its
//!   backward node outright, the whole chain monomorphizes, and every
//!   `process()` call is direct. Topology is fixed at compile time and
//!   cycles are impossible by construction.
//! - **Dynamic chains** are assembled at run time from boxed trait objects:
//!   [`DynModule`] holds a `Box<dyn ChainModule>` backward slot installed
//!   via [`link`](DynModule::link). `Box<dyn ChainModule>` itself implements
//!   `ChainModule`, so dynamic and static segments compose freely.
//!
//! The two paths share the same [`Module`](crate::module::Module) lifecycle
//! trait; they are deliberately *not* unified behind one abstraction, so
//! static chains pay no dynamic dispatch. There is no `link` on a static
//! chain — value composition replaces it, making the misuse a compile error
//! rather than a silent no-op.
//!
//! # Info sync
//!
//! Configuration flows sink-to-source: the sink seeds its own
//! [`ModuleInfo`] from the chain-owned [`ChainInfo`] and hands it backward;
//! each node adopts the forward node's info (or adjusts it) and passes its
//! own info further back. One [`PeriodSink::meta_info_sync`] call from the
//! sink configures the entire chain. It must run after topology is fixed
//! and before `meta_start`.

mod binding;
mod dynamic;
mod mix;
mod sink;
mod source;

pub use binding::Chain;
pub use dynamic::DynModule;
pub use mix::{MixDown, MixUp, MixUpTap};
pub use sink::PeriodSink;
pub use source::Source;

use crate::buffer::SampleBuffer;
use crate::error::{ChainError, Result};
use crate::info::{ChainInfo, ModuleInfo};
use crate::module::State;

/// Protocol surface a forward node needs from its backward neighbor.
///
/// Implemented by every chain-composable node: static compositions
/// ([`Chain`], [`Source`]), dynamic nodes ([`DynModule`]), fan-in/fan-out
/// specializations ([`MixDown`], [`MixUpTap`]), and the thread-decoupled
/// [`ParallelModule`](crate::parallel::ParallelModule). `Box<dyn
/// ChainModule>` delegates, so boxed nodes compose like concrete ones.
pub trait ChainModule {
    /// Runs a full processing pass over the backward subtree, then this
    /// node. After return, this node's buffer holds the result of exactly
    /// one processing pass over exactly one pull from backward.
    fn meta_process(&mut self) -> Result<()>;

    /// Starts the backward subtree, then this node.
    fn meta_start(&mut self) -> Result<()>;

    /// Stops the backward subtree, then this node.
    fn meta_stop(&mut self) -> Result<()>;

    /// Finishes the backward subtree, then this node.
    fn meta_finish(&mut self) -> Result<()>;

    /// Adopts configuration from the forward node, then recurses backward.
    /// `chain` is the sink-owned chain configuration; each node increments
    /// its module count.
    fn meta_info_sync(&mut self, forward: &ModuleInfo, chain: &mut ChainInfo) -> Result<()>;

    /// Transfers this node's buffer to the caller (exclusive ownership).
    fn take_buffer(&mut self) -> Option<SampleBuffer>;

    /// Lifecycle state of this node.
    fn state(&self) -> State;

    /// Configuration snapshot of this node (the subtree head).
    fn head_info(&self) -> ModuleInfo;

    /// Number of modules in this subtree, this node included.
    fn module_count(&self) -> usize;

    /// Number of modules in this subtree that have reached
    /// [`State::Finished`].
    fn finished_modules(&self) -> usize;
}

impl<T: ChainModule + ?Sized> ChainModule for Box<T> {
    fn meta_process(&mut self) -> Result<()> {
        (**self).meta_process()
    }

    fn meta_start(&mut self) -> Result<()> {
        (**self).meta_start()
    }

    fn meta_stop(&mut self) -> Result<()> {
        (**self).meta_stop()
    }

    fn meta_finish(&mut self) -> Result<()> {
        (**self).meta_finish()
    }

    fn meta_info_sync(&mut self, forward: &ModuleInfo, chain: &mut ChainInfo) -> Result<()> {
        (**self).meta_info_sync(forward, chain)
    }

    fn take_buffer(&mut self) -> Option<SampleBuffer> {
        (**self).take_buffer()
    }

    fn state(&self) -> State {
        (**self).state()
    }

    fn head_info(&self) -> ModuleInfo {
        (**self).head_info()
    }

    fn module_count(&self) -> usize {
        (**self).module_count()
    }

    fn finished_modules(&self) -> usize {
        (**self).finished_modules()
    }
}

/// Processing requires a node that has been started and not yet stopped.
/// Finishing/finished nodes still process: the chain drains gracefully
/// until every module reports done.
pub(crate) fn ensure_processable(state: State) -> Result<()> {
    if state < State::Started || state == State::Stopped {
        return Err(ChainError::NotInState {
            required: State::Started,
            actual: state,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_processable() {
        assert!(ensure_processable(State::Created).is_err());
        assert!(ensure_processable(State::Started).is_ok());
        assert!(ensure_processable(State::Finishing).is_ok());
        assert!(ensure_processable(State::Finished).is_ok());
        assert!(ensure_processable(State::Stopped).is_err());
    }
}
