//! Terminal sink driving the chain.

use crate::buffer::SampleBuffer;
use crate::error::{ChainError, Result};
use crate::info::{ChainInfo, ModuleInfo};
use crate::module::{ModuleBase, State};

use super::{ChainModule, ensure_processable};

/// Forward end of a chain: owns the chain configuration and drives all
/// meta-operations.
///
/// A sink pulls `period` buffers per pass and concatenates them, in
/// interleaved sample order, into one output of `period * buffer_size`
/// frames. Backends with a fixed block size larger than the chain's buffer
/// size set the period accordingly and pull once per device callback.
///
/// The sink is also where [`ChainInfo`] lives: call
/// [`meta_info_sync`](Self::meta_info_sync) after the topology is complete
/// and before [`meta_start`](Self::meta_start) to propagate configuration
/// to every module. The module and finished counts in the owned info are
/// refreshed from the chain itself, never written by other modules.
pub struct PeriodSink<B> {
    base: ModuleBase,
    chain: ChainInfo,
    period: usize,
    backward: B,
}

impl<B: ChainModule> PeriodSink<B> {
    /// Builds a sink over `backward` with default configuration and a
    /// period of one.
    pub fn new(backward: B) -> Self {
        Self::with_chain_info(backward, ChainInfo::default())
    }

    /// Builds a sink over `backward` with an explicit configuration.
    pub fn with_chain_info(backward: B, chain: ChainInfo) -> Self {
        Self {
            base: ModuleBase::new(),
            chain,
            period: 1,
            backward,
        }
    }

    /// Number of backward pulls aggregated per pass.
    pub fn period(&self) -> usize {
        self.period
    }

    /// Sets the aggregation period.
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    pub fn set_period(&mut self, period: usize) {
        assert!(period > 0, "sink period must be positive");
        self.period = period;
    }

    /// Builder form of [`set_period`](Self::set_period).
    ///
    /// # Panics
    ///
    /// Panics if `period` is zero.
    #[must_use]
    pub fn with_period(mut self, period: usize) -> Self {
        self.set_period(period);
        self
    }

    /// The chain-wide configuration.
    pub fn chain_info(&self) -> &ChainInfo {
        &self.chain
    }

    /// Mutable access to the configuration. Changes take effect at the
    /// next [`meta_info_sync`](Self::meta_info_sync).
    pub fn chain_info_mut(&mut self) -> &mut ChainInfo {
        &mut self.chain
    }

    /// The backward subtree.
    pub fn backward(&self) -> &B {
        &self.backward
    }

    /// Mutable access to the backward subtree.
    pub fn backward_mut(&mut self) -> &mut B {
        &mut self.backward
    }

    /// Unbinds the sink, returning the backward subtree.
    pub fn into_backward(self) -> B {
        self.backward
    }

    /// Lifecycle state of the sink itself.
    pub fn state(&self) -> State {
        self.base.state()
    }

    /// Whether every module in the chain has reported done.
    pub fn all_finished(&self) -> bool {
        self.chain.modules > 0 && self.chain.modules_finished >= self.chain.modules
    }

    /// Propagates configuration sink-to-source and recounts the chain.
    pub fn meta_info_sync(&mut self) -> Result<()> {
        self.chain.sync_pass += 1;
        self.chain.modules = 1;
        self.chain.modules_finished = 0;
        self.base.set_info(ModuleInfo::from_chain(&self.chain));
        let forward = self.base.info().clone();
        self.backward.meta_info_sync(&forward, &mut self.chain)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            modules = self.chain.modules,
            sample_rate = self.chain.sample_rate,
            buffer_size = self.chain.buffer_size,
            channels = self.chain.channels,
            "chain info synced"
        );
        Ok(())
    }

    /// Starts the backward subtree, then the sink.
    pub fn meta_start(&mut self) -> Result<()> {
        self.backward.meta_start()?;
        self.base.advance(State::Started)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(modules = self.chain.modules, "chain started");
        Ok(())
    }

    /// Stops the backward subtree, then the sink. Legal from any started
    /// state, finished or not.
    pub fn meta_stop(&mut self) -> Result<()> {
        self.backward.meta_stop()?;
        self.base.advance(State::Stopped)?;
        #[cfg(feature = "tracing")]
        tracing::debug!("chain stopped");
        Ok(())
    }

    /// Asks the backward subtree to finish, then the sink, and refreshes
    /// the finished count.
    pub fn meta_finish(&mut self) -> Result<()> {
        self.backward.meta_finish()?;
        self.base.advance(State::Finishing)?;
        self.base.advance(State::Finished)?;
        self.chain.modules_finished = 1 + self.backward.finished_modules();
        #[cfg(feature = "tracing")]
        tracing::debug!(
            finished = self.chain.modules_finished,
            modules = self.chain.modules,
            "chain finished"
        );
        Ok(())
    }

    /// Runs one pass: pulls `period` buffers from backward and
    /// concatenates them in interleaved order into the sink's buffer.
    pub fn meta_process(&mut self) -> Result<()> {
        ensure_processable(self.base.state())?;
        let capacity = self.chain.buffer_size * self.chain.channels * self.period;
        let mut stream = Vec::with_capacity(capacity);
        for _ in 0..self.period {
            self.backward.meta_process()?;
            let buf = self
                .backward
                .take_buffer()
                .ok_or(ChainError::MissingBuffer)?;
            stream.extend(buf.iter_interleaved());
        }
        let out =
            SampleBuffer::from_interleaved(&stream, self.chain.channels, self.chain.sample_rate);
        self.base.set_buffer(out);
        Ok(())
    }

    /// Transfers the aggregated output of the last pass.
    pub fn take_output(&mut self) -> Option<SampleBuffer> {
        self.base.take_buffer()
    }

    /// Number of modules in the chain, the sink included.
    pub fn module_count(&self) -> usize {
        1 + self.backward.module_count()
    }
}
