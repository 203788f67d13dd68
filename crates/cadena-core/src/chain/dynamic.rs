//! Run-time chain composition over boxed trait objects.

use crate::buffer::SampleBuffer;
use crate::error::{ChainError, Result};
use crate::info::{ChainInfo, ModuleInfo};
use crate::module::{Module, State};

use super::{ChainModule, ensure_processable};

/// A module whose backward neighbor is installed at run time.
///
/// The backward slot holds a `Box<dyn ChainModule>`, so any chain segment,
/// static or dynamic, can be linked behind it. The slot accepts exactly one
/// neighbor; [`link`](Self::link) on an occupied slot fails with
/// [`ChainError::BackwardOccupied`] rather than silently replacing the
/// subtree. Meta-operations on an unlinked node fail with
/// [`ChainError::MissingBackward`]; wrap a generator in
/// [`Source`](super::Source) to terminate a dynamic chain.
pub struct DynModule {
    module: Box<dyn Module + Send>,
    backward: Option<Box<dyn ChainModule + Send>>,
}

impl DynModule {
    /// Wraps `module` with an empty backward slot.
    pub fn new(module: impl Module + Send + 'static) -> Self {
        Self {
            module: Box::new(module),
            backward: None,
        }
    }

    /// Installs `backward` in the empty slot.
    ///
    /// # Errors
    ///
    /// [`ChainError::BackwardOccupied`] if a neighbor is already installed.
    pub fn link(&mut self, backward: impl ChainModule + Send + 'static) -> Result<()> {
        if self.backward.is_some() {
            return Err(ChainError::BackwardOccupied);
        }
        self.backward = Some(Box::new(backward));
        Ok(())
    }

    /// Builder form of [`link`](Self::link).
    ///
    /// # Errors
    ///
    /// [`ChainError::BackwardOccupied`] if a neighbor is already installed.
    pub fn linked(mut self, backward: impl ChainModule + Send + 'static) -> Result<Self> {
        self.link(backward)?;
        Ok(self)
    }

    /// Removes and returns the backward subtree, emptying the slot.
    pub fn unlink(&mut self) -> Option<Box<dyn ChainModule + Send>> {
        self.backward.take()
    }

    /// Whether a backward neighbor is installed.
    pub fn is_linked(&self) -> bool {
        self.backward.is_some()
    }

    /// Borrows the backward subtree, if installed.
    pub fn backward(&self) -> Option<&(dyn ChainModule + Send)> {
        self.backward.as_deref()
    }

    fn backward_mut(&mut self) -> Result<&mut Box<dyn ChainModule + Send>> {
        self.backward.as_mut().ok_or(ChainError::MissingBackward)
    }
}

impl ChainModule for DynModule {
    fn meta_process(&mut self) -> Result<()> {
        ensure_processable(self.module.state())?;
        let backward = self.backward_mut()?;
        backward.meta_process()?;
        let buf = backward.take_buffer().ok_or(ChainError::MissingBuffer)?;
        self.module.base_mut().set_buffer(buf);
        self.module.process()
    }

    fn meta_start(&mut self) -> Result<()> {
        self.backward_mut()?.meta_start()?;
        self.module.start()
    }

    fn meta_stop(&mut self) -> Result<()> {
        self.backward_mut()?.meta_stop()?;
        self.module.stop()
    }

    fn meta_finish(&mut self) -> Result<()> {
        self.backward_mut()?.meta_finish()?;
        self.module.finish()
    }

    fn meta_info_sync(&mut self, forward: &ModuleInfo, chain: &mut ChainInfo) -> Result<()> {
        self.module.info_sync(forward);
        chain.modules += 1;
        let own = self.module.base().info().clone();
        self.backward_mut()?.meta_info_sync(&own, chain)
    }

    fn take_buffer(&mut self) -> Option<SampleBuffer> {
        self.module.base_mut().take_buffer()
    }

    fn state(&self) -> State {
        self.module.state()
    }

    fn head_info(&self) -> ModuleInfo {
        self.module.base().info().clone()
    }

    fn module_count(&self) -> usize {
        1 + self.backward.as_ref().map_or(0, |b| b.module_count())
    }

    fn finished_modules(&self) -> usize {
        let own = usize::from(self.module.state() >= State::Finished);
        own + self.backward.as_ref().map_or(0, |b| b.finished_modules())
    }
}

#[cfg(test)]
mod tests {
    use super::super::Source;
    use super::*;
    use crate::module::ModuleBase;

    struct Noop {
        base: ModuleBase,
    }

    impl Noop {
        fn new() -> Self {
            Self {
                base: ModuleBase::new(),
            }
        }
    }

    impl Module for Noop {
        fn base(&self) -> &ModuleBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ModuleBase {
            &mut self.base
        }
    }

    struct Silence {
        base: ModuleBase,
    }

    impl Silence {
        fn new() -> Self {
            Self {
                base: ModuleBase::new(),
            }
        }
    }

    impl Module for Silence {
        fn base(&self) -> &ModuleBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ModuleBase {
            &mut self.base
        }

        fn process(&mut self) -> Result<()> {
            self.base.make_buffer();
            Ok(())
        }
    }

    #[test]
    fn test_link_rejects_second_neighbor() {
        let mut node = DynModule::new(Noop::new());
        node.link(Source::new(Silence::new())).unwrap();
        let err = node.link(Source::new(Silence::new())).unwrap_err();
        assert!(matches!(err, ChainError::BackwardOccupied));
    }

    #[test]
    fn test_unlinked_meta_op_fails() {
        let mut node = DynModule::new(Noop::new());
        let err = node.meta_start().unwrap_err();
        assert!(matches!(err, ChainError::MissingBackward));
    }

    #[test]
    fn test_relink_after_unlink() {
        let mut node = DynModule::new(Noop::new());
        node.link(Source::new(Silence::new())).unwrap();
        assert!(node.is_linked());
        let sub = node.unlink();
        assert!(sub.is_some());
        assert!(!node.is_linked());
        node.link(Source::new(Silence::new())).unwrap();
    }

    #[test]
    fn test_dynamic_chain_processes() {
        let mut node = DynModule::new(Noop::new())
            .linked(
                DynModule::new(Noop::new())
                    .linked(Source::new(Silence::new()))
                    .unwrap(),
            )
            .unwrap();
        let mut info = ChainInfo::default();
        let forward = ModuleInfo::from_chain(&info);
        node.meta_info_sync(&forward, &mut info).unwrap();
        assert_eq!(info.modules, 3);
        assert_eq!(node.module_count(), 3);

        node.meta_start().unwrap();
        node.meta_process().unwrap();
        let buf = node.take_buffer().unwrap();
        assert_eq!(buf.total_capacity(), info.buffer_size);
    }
}
