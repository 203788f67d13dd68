//! Static chain composition.

use crate::buffer::SampleBuffer;
use crate::error::{ChainError, Result};
use crate::info::{ChainInfo, ModuleInfo};
use crate::module::{Module, State};

use super::{ChainModule, ensure_processable};

/// A module with its backward neighbor bound at compile time.
///
/// `Chain<M, B>` owns both the processing module `M` and the backward
/// subtree `B` by value, so nesting `Chain`s builds the whole topology as
/// one concrete type: no allocation per node, no dynamic dispatch, and no
/// way to form a cycle. Rebinding means building a new value; for run-time
/// topology use [`DynModule`](super::DynModule) instead.
///
/// ```
/// use cadena_core::chain::{Chain, Source};
/// use cadena_core::module::ModuleBase;
/// # use cadena_core::module::Module;
/// # struct Gain(ModuleBase);
/// # impl Module for Gain {
/// #     fn base(&self) -> &ModuleBase { &self.0 }
/// #     fn base_mut(&mut self) -> &mut ModuleBase { &mut self.0 }
/// # }
/// # struct Osc(ModuleBase);
/// # impl Module for Osc {
/// #     fn base(&self) -> &ModuleBase { &self.0 }
/// #     fn base_mut(&mut self) -> &mut ModuleBase { &mut self.0 }
/// # }
/// let chain = Chain::new(Gain(ModuleBase::new()), Source::new(Osc(ModuleBase::new())));
/// ```
#[derive(Debug)]
pub struct Chain<M, B> {
    module: M,
    backward: B,
}

impl<M: Module, B: ChainModule> Chain<M, B> {
    /// Binds `module` in front of `backward`.
    pub fn new(module: M, backward: B) -> Self {
        Self { module, backward }
    }

    /// The processing module at this link.
    pub fn module(&self) -> &M {
        &self.module
    }

    /// Mutable access to the processing module, for parameter changes
    /// between passes.
    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    /// The backward subtree.
    pub fn backward(&self) -> &B {
        &self.backward
    }

    /// Mutable access to the backward subtree.
    pub fn backward_mut(&mut self) -> &mut B {
        &mut self.backward
    }

    /// Unbinds the link, returning both halves.
    pub fn into_parts(self) -> (M, B) {
        (self.module, self.backward)
    }
}

impl<M: Module, B: ChainModule> ChainModule for Chain<M, B> {
    fn meta_process(&mut self) -> Result<()> {
        ensure_processable(self.module.state())?;
        self.backward.meta_process()?;
        let buf = self
            .backward
            .take_buffer()
            .ok_or(ChainError::MissingBuffer)?;
        self.module.base_mut().set_buffer(buf);
        self.module.process()
    }

    fn meta_start(&mut self) -> Result<()> {
        self.backward.meta_start()?;
        self.module.start()
    }

    fn meta_stop(&mut self) -> Result<()> {
        self.backward.meta_stop()?;
        self.module.stop()
    }

    fn meta_finish(&mut self) -> Result<()> {
        self.backward.meta_finish()?;
        self.module.finish()
    }

    fn meta_info_sync(&mut self, forward: &ModuleInfo, chain: &mut ChainInfo) -> Result<()> {
        self.module.info_sync(forward);
        chain.modules += 1;
        let own = self.module.base().info().clone();
        self.backward.meta_info_sync(&own, chain)
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
        1 + self.backward.module_count()
    }

    fn finished_modules(&self) -> usize {
        let own = usize::from(self.module.state() >= State::Finished);
        own + self.backward.finished_modules()
    }
}
