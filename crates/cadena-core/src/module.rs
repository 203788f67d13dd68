//! Module lifecycle: state machine, shared base state, and the hook trait.
//!
//! A module is one unit in a processing chain. Its externally observable
//! lifecycle is the [`State`] enum, which only ever moves forward:
//!
//! ```text
//! Created -> Started -> Finishing -> Finished -> Stopped
//! ```
//!
//! `Finishing -> Finished` may be instantaneous (the default `finish` hook
//! calls `done` immediately), and a module may be stopped without ever
//! finishing — an ungraceful shutdown skips states forward, never backward.
//!
//! Concrete modules implement [`Module`] by embedding a [`ModuleBase`]
//! (state + info + buffer slot) and overriding the hooks they care about.
//! The chain protocol in [`crate::chain`] drives these hooks; see the
//! `ChainModule` trait there for the recursive meta-operations.

use crate::buffer::SampleBuffer;
use crate::error::{ChainError, Result};
use crate::info::ModuleInfo;

/// Lifecycle state of a module.
///
/// States are ordered; a valid transition never decreases. Skipping forward
/// (e.g. `Started -> Stopped` without finishing) is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// Constructed, not yet started.
    Created,
    /// Started; participating in processing passes.
    Started,
    /// Asked to stop; performing graceful-shutdown work.
    Finishing,
    /// Graceful-shutdown work complete; ready to be stopped.
    Finished,
    /// Stopped; no longer processing.
    Stopped,
}

/// State, configuration, and buffer slot shared by every module.
///
/// Embed one of these in a concrete module and hand it out through
/// [`Module::base`] / [`Module::base_mut`].
#[derive(Debug, Default, Clone)]
pub struct ModuleBase {
    state: StateCell,
    info: ModuleInfo,
    buffer: Option<SampleBuffer>,
}

/// Wrapper so `ModuleBase` can derive `Default` with `State::Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct StateCell(State);

impl Default for StateCell {
    fn default() -> Self {
        Self(State::Created)
    }
}

impl ModuleBase {
    /// Creates a base in the `Created` state with default info.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a base with explicit module info.
    pub fn with_info(info: ModuleInfo) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state.0
    }

    /// Advances the state, rejecting backward transitions.
    pub fn advance(&mut self, to: State) -> Result<()> {
        if to < self.state.0 {
            return Err(ChainError::InvalidTransition {
                from: self.state.0,
                to,
            });
        }
        self.state.0 = to;
        Ok(())
    }

    /// Resets the state to `Created`. Intended for reusing a module after a
    /// full stop; the chain protocol never calls this.
    pub fn reset(&mut self) {
        self.state.0 = State::Created;
    }

    /// This module's configuration snapshot.
    pub fn info(&self) -> &ModuleInfo {
        &self.info
    }

    /// Mutable access to this module's configuration snapshot.
    pub fn info_mut(&mut self) -> &mut ModuleInfo {
        &mut self.info
    }

    /// Replaces this module's configuration snapshot.
    pub fn set_info(&mut self, info: ModuleInfo) {
        self.info = info;
    }

    /// Installs a buffer, replacing any previous one.
    pub fn set_buffer(&mut self, buffer: SampleBuffer) {
        self.buffer = Some(buffer);
    }

    /// Transfers the buffer out, leaving the slot empty.
    ///
    /// Buffer exchange is exclusive-ownership: once taken, the module must
    /// not assume a buffer is still present.
    pub fn take_buffer(&mut self) -> Option<SampleBuffer> {
        self.buffer.take()
    }

    /// Borrows the buffer, if present.
    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.buffer.as_ref()
    }

    /// Mutably borrows the buffer, if present.
    pub fn buffer_mut(&mut self) -> Option<&mut SampleBuffer> {
        self.buffer.as_mut()
    }

    /// Installs a fresh zeroed output buffer sized from this module's info
    /// (`out_buffer` frames x `channels`), replacing any previous one.
    pub fn make_buffer(&mut self) {
        self.buffer = Some(SampleBuffer::new(
            self.info.out_buffer,
            self.info.channels,
            self.info.sample_rate,
        ));
    }
}

/// Hook trait every concrete module implements.
///
/// Default lifecycle hooks only advance [`State`]; override them for
/// module-specific setup and teardown, and call `done()` from `finish()`
/// (the default does) once graceful shutdown is complete. `process()` is
/// where the audio work happens: transformers consume the buffer currently
/// in the base slot and leave their output there; sources fill a fresh
/// buffer.
pub trait Module {
    /// Shared state embedded in this module.
    fn base(&self) -> &ModuleBase;

    /// Mutable access to the shared state.
    fn base_mut(&mut self) -> &mut ModuleBase;

    /// Performs one processing pass over the buffer in the base slot.
    fn process(&mut self) -> Result<()> {
        Ok(())
    }

    /// One-time setup once chain configuration is final.
    fn start(&mut self) -> Result<()> {
        self.base_mut().advance(State::Started)
    }

    /// Releases resources acquired in `start()`. Valid even if `finish()`
    /// was never called.
    fn stop(&mut self) -> Result<()> {
        self.base_mut().advance(State::Stopped)
    }

    /// Begins graceful shutdown. The default marks the module done
    /// immediately; modules with tail work (e.g. envelope release)
    /// override this and call [`Module::done`] later themselves. A module
    /// that already finished on its own is left alone.
    fn finish(&mut self) -> Result<()> {
        if self.state() >= State::Finishing {
            return Ok(());
        }
        self.base_mut().advance(State::Finishing)?;
        self.done()
    }

    /// Signals that graceful shutdown is complete.
    fn done(&mut self) -> Result<()> {
        self.base_mut().advance(State::Finished)
    }

    /// Adopts configuration from the forward module during the info-sync
    /// pass. The default mirrors the forward info wholesale; override to
    /// adjust buffer sizes or channel counts locally (do so by mutating the
    /// mirrored copy).
    fn info_sync(&mut self, forward: &ModuleInfo) {
        self.base_mut().set_info(forward.clone());
    }

    /// Current lifecycle state.
    fn state(&self) -> State {
        self.base().state()
    }
}

impl<T: Module + ?Sized> Module for Box<T> {
    fn base(&self) -> &ModuleBase {
        (**self).base()
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        (**self).base_mut()
    }

    fn process(&mut self) -> Result<()> {
        (**self).process()
    }

    fn start(&mut self) -> Result<()> {
        (**self).start()
    }

    fn stop(&mut self) -> Result<()> {
        (**self).stop()
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }

    fn done(&mut self) -> Result<()> {
        (**self).done()
    }

    fn info_sync(&mut self, forward: &ModuleInfo) {
        (**self).info_sync(forward);
    }

    fn state(&self) -> State {
        (**self).state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain {
        base: ModuleBase,
    }

    impl Module for Plain {
        fn base(&self) -> &ModuleBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ModuleBase {
            &mut self.base
        }
    }

    #[test]
    fn test_full_lifecycle_order() {
        let mut m = Plain {
            base: ModuleBase::new(),
        };
        assert_eq!(m.state(), State::Created);
        m.start().unwrap();
        assert_eq!(m.state(), State::Started);
        m.finish().unwrap();
        // Default finish marks done immediately.
        assert_eq!(m.state(), State::Finished);
        m.stop().unwrap();
        assert_eq!(m.state(), State::Stopped);
    }

    #[test]
    fn test_stop_without_finish_is_valid() {
        let mut m = Plain {
            base: ModuleBase::new(),
        };
        m.start().unwrap();
        m.stop().unwrap();
        assert_eq!(m.state(), State::Stopped);
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut m = Plain {
            base: ModuleBase::new(),
        };
        m.start().unwrap();
        m.stop().unwrap();
        let err = m.start().unwrap_err();
        assert_eq!(
            err,
            ChainError::InvalidTransition {
                from: State::Stopped,
                to: State::Started,
            }
        );
        // Failed transition leaves state untouched.
        assert_eq!(m.state(), State::Stopped);
    }

    #[test]
    fn test_state_ordering() {
        assert!(State::Created < State::Started);
        assert!(State::Started < State::Finishing);
        assert!(State::Finishing < State::Finished);
        assert!(State::Finished < State::Stopped);
    }

    #[test]
    fn test_buffer_exchange_is_exclusive() {
        let mut base = ModuleBase::new();
        base.set_buffer(SampleBuffer::new(4, 1, 44100.0));
        assert!(base.buffer().is_some());
        let taken = base.take_buffer();
        assert!(taken.is_some());
        assert!(base.take_buffer().is_none());
    }

    #[test]
    fn test_make_buffer_uses_info() {
        let mut base = ModuleBase::new();
        base.info_mut().out_buffer = 32;
        base.info_mut().channels = 2;
        base.info_mut().sample_rate = 48000.0;
        base.make_buffer();
        let buf = base.take_buffer().unwrap();
        assert_eq!(buf.channel_capacity(), 32);
        assert_eq!(buf.channels(), 2);
        assert_eq!(buf.sample_rate(), 48000.0);
    }
}
