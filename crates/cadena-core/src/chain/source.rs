//! Chain terminator for generator modules.

use crate::buffer::SampleBuffer;
use crate::error::Result;
use crate::info::{ChainInfo, ModuleInfo};
use crate::module::{Module, State};

use super::{ChainModule, ensure_processable};

/// Wraps a generator module as the backward end of a chain.
///
/// A source has no backward neighbor: its meta-operations act on the
/// wrapped module alone and the recursion bottoms out here. The wrapped
/// module is expected to produce its own buffer in
/// [`process`](Module::process).
#[derive(Debug)]
pub struct Source<M> {
    module: M,
}

impl<M: Module> Source<M> {
    /// Wraps `module` as a chain source.
    pub fn new(module: M) -> Self {
        Self { module }
    }

    /// The wrapped generator.
    pub fn module(&self) -> &M {
        &self.module
    }

    /// Mutable access to the wrapped generator.
    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    /// Unwraps the generator.
    pub fn into_inner(self) -> M {
        self.module
    }
}

impl<M: Module> ChainModule for Source<M> {
    fn meta_process(&mut self) -> Result<()> {
        ensure_processable(self.module.state())?;
        self.module.process()
    }

    fn meta_start(&mut self) -> Result<()> {
        self.module.start()
    }

    fn meta_stop(&mut self) -> Result<()> {
        self.module.stop()
    }

    fn meta_finish(&mut self) -> Result<()> {
        self.module.finish()
    }

    fn meta_info_sync(&mut self, forward: &ModuleInfo, chain: &mut ChainInfo) -> Result<()> {
        self.module.info_sync(forward);
        chain.modules += 1;
        Ok(())
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
        1
    }

    fn finished_modules(&self) -> usize {
        usize::from(self.module.state() >= State::Finished)
    }
}
