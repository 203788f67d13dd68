//! Fan-in and fan-out chain nodes.
//!
//! [`MixDown`] merges several backward subtrees into one stream by
//! elementwise summation. [`MixUp`] splits one backward stream to several
//! forward consumers: each [`MixUpTap`] is an independent chain node, and
//! the shared upstream advances only once every tap has consumed the
//! current buffer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::buffer::SampleBuffer;
use crate::error::{ChainError, Result};
use crate::info::{ChainInfo, ModuleInfo};
use crate::module::{ModuleBase, State};

use super::{ChainModule, ensure_processable};

/// N:1 merge node: sums the buffers of all inputs elementwise.
///
/// Inputs must agree on shape (channels and frames); a mismatch is a
/// [`ChainError::ShapeMismatch`], detected both at info sync, from the
/// declared configurations, and at process time, from the buffers actually
/// produced. Meta-operations visit inputs in link order.
pub struct MixDown {
    base: ModuleBase,
    inputs: Vec<Box<dyn ChainModule + Send>>,
}

impl MixDown {
    /// An empty merge node. Link at least one input before use.
    pub fn new() -> Self {
        Self {
            base: ModuleBase::new(),
            inputs: Vec::new(),
        }
    }

    /// Links another input subtree.
    pub fn link(&mut self, input: impl ChainModule + Send + 'static) {
        self.inputs.push(Box::new(input));
    }

    /// Builder form of [`link`](Self::link).
    #[must_use]
    pub fn with_input(mut self, input: impl ChainModule + Send + 'static) -> Self {
        self.link(input);
        self
    }

    /// Number of linked inputs.
    pub fn inputs(&self) -> usize {
        self.inputs.len()
    }

    fn check_shapes(&self) -> Result<()> {
        let mut shapes = self
            .inputs
            .iter()
            .map(|i| (i.head_info().channels, i.head_info().out_buffer));
        if let Some((channels, frames)) = shapes.next() {
            for (c, f) in shapes {
                if (c, f) != (channels, frames) {
                    return Err(ChainError::ShapeMismatch {
                        expected_channels: channels,
                        expected_frames: frames,
                        channels: c,
                        frames: f,
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for MixDown {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainModule for MixDown {
    fn meta_process(&mut self) -> Result<()> {
        ensure_processable(self.base.state())?;
        if self.inputs.is_empty() {
            return Err(ChainError::MissingBackward);
        }
        let mut acc: Option<SampleBuffer> = None;
        for input in &mut self.inputs {
            input.meta_process()?;
            let buf = input.take_buffer().ok_or(ChainError::MissingBuffer)?;
            match &mut acc {
                None => acc = Some(buf),
                Some(acc) => {
                    if buf.channels() != acc.channels()
                        || buf.channel_capacity() != acc.channel_capacity()
                    {
                        return Err(ChainError::ShapeMismatch {
                            expected_channels: acc.channels(),
                            expected_frames: acc.channel_capacity(),
                            channels: buf.channels(),
                            frames: buf.channel_capacity(),
                        });
                    }
                    for (a, b) in acc.iter_sequential_mut().zip(buf.iter_sequential()) {
                        *a += *b;
                    }
                }
            }
        }
        if let Some(acc) = acc {
            self.base.set_buffer(acc);
        }
        Ok(())
    }

    fn meta_start(&mut self) -> Result<()> {
        for input in &mut self.inputs {
            input.meta_start()?;
        }
        self.base.advance(State::Started)
    }

    fn meta_stop(&mut self) -> Result<()> {
        for input in &mut self.inputs {
            input.meta_stop()?;
        }
        self.base.advance(State::Stopped)
    }

    fn meta_finish(&mut self) -> Result<()> {
        for input in &mut self.inputs {
            input.meta_finish()?;
        }
        self.base.advance(State::Finishing)?;
        self.base.advance(State::Finished)
    }

    fn meta_info_sync(&mut self, forward: &ModuleInfo, chain: &mut ChainInfo) -> Result<()> {
        self.base.set_info(forward.clone());
        chain.modules += 1;
        let own = self.base.info().clone();
        for input in &mut self.inputs {
            input.meta_info_sync(&own, chain)?;
        }
        self.check_shapes()
    }

    fn take_buffer(&mut self) -> Option<SampleBuffer> {
        self.base.take_buffer()
    }

    fn state(&self) -> State {
        self.base.state()
    }

    fn head_info(&self) -> ModuleInfo {
        self.base.info().clone()
    }

    fn module_count(&self) -> usize {
        1 + self.inputs.iter().map(|i| i.module_count()).sum::<usize>()
    }

    fn finished_modules(&self) -> usize {
        let own = usize::from(self.base.state() >= State::Finished);
        own + self
            .inputs
            .iter()
            .map(|i| i.finished_modules())
            .sum::<usize>()
    }
}

struct MixUpCore {
    base: ModuleBase,
    backward: Box<dyn ChainModule + Send>,
    current: Option<SampleBuffer>,
    consumed: Vec<bool>,
    last_sync_pass: Option<u64>,
}

impl MixUpCore {
    fn all_consumed(&self) -> bool {
        self.consumed.iter().all(|&c| c)
    }
}

/// 1:N split node: hands deep copies of one backward stream to several
/// forward consumers.
///
/// `MixUp` itself is a factory; [`tap`](Self::tap) mints the chain nodes.
/// All taps share the backward subtree through the factory. The upstream
/// is pulled when a tap processes and every tap has consumed the current
/// buffer, so consumers stay on the same generation regardless of the
/// order their sinks drive them in.
pub struct MixUp {
    core: Arc<Mutex<MixUpCore>>,
}

fn locked(core: &Mutex<MixUpCore>) -> MutexGuard<'_, MixUpCore> {
    core.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MixUp {
    /// Builds a split node over `backward` with no taps yet.
    pub fn new(backward: impl ChainModule + Send + 'static) -> Self {
        Self {
            core: Arc::new(Mutex::new(MixUpCore {
                base: ModuleBase::new(),
                backward: Box::new(backward),
                current: None,
                consumed: Vec::new(),
                last_sync_pass: None,
            })),
        }
    }

    /// Mints a new forward consumer handle.
    pub fn tap(&self) -> MixUpTap {
        let mut core = locked(&self.core);
        // A fresh tap has nothing pending from the current generation.
        core.consumed.push(true);
        MixUpTap {
            slot: core.consumed.len() - 1,
            core: Arc::clone(&self.core),
        }
    }

    /// Number of taps minted so far.
    pub fn taps(&self) -> usize {
        locked(&self.core).consumed.len()
    }
}

/// One forward consumer of a [`MixUp`] split.
///
/// Behaves as an ordinary chain node. Meta-operations other than
/// processing are applied to the shared subtree once; repeat calls from
/// sibling taps are no-ops.
pub struct MixUpTap {
    core: Arc<Mutex<MixUpCore>>,
    slot: usize,
}

impl ChainModule for MixUpTap {
    fn meta_process(&mut self) -> Result<()> {
        let mut core = locked(&self.core);
        ensure_processable(core.base.state())?;
        if core.current.is_none() || core.all_consumed() {
            core.backward.meta_process()?;
            let buf = core
                .backward
                .take_buffer()
                .ok_or(ChainError::MissingBuffer)?;
            core.current = Some(buf);
            for flag in &mut core.consumed {
                *flag = false;
            }
        }
        Ok(())
    }

    fn meta_start(&mut self) -> Result<()> {
        let mut core = locked(&self.core);
        if core.base.state() < State::Started {
            core.backward.meta_start()?;
            core.base.advance(State::Started)?;
        }
        Ok(())
    }

    fn meta_stop(&mut self) -> Result<()> {
        let mut core = locked(&self.core);
        if core.base.state() < State::Stopped {
            core.backward.meta_stop()?;
            core.base.advance(State::Stopped)?;
        }
        Ok(())
    }

    fn meta_finish(&mut self) -> Result<()> {
        let mut core = locked(&self.core);
        if core.base.state() < State::Finishing {
            core.backward.meta_finish()?;
            core.base.advance(State::Finishing)?;
            core.base.advance(State::Finished)?;
        }
        Ok(())
    }

    fn meta_info_sync(&mut self, forward: &ModuleInfo, chain: &mut ChainInfo) -> Result<()> {
        let mut core = locked(&self.core);
        // The shared subtree syncs once per pass; sibling taps that arrive
        // later see the pass marker and return.
        if core.last_sync_pass == Some(chain.sync_pass) {
            return Ok(());
        }
        core.last_sync_pass = Some(chain.sync_pass);
        core.base.set_info(forward.clone());
        chain.modules += 1;
        let own = core.base.info().clone();
        core.backward.meta_info_sync(&own, chain)
    }

    fn take_buffer(&mut self) -> Option<SampleBuffer> {
        let mut core = locked(&self.core);
        // One copy per generation; a tap that already consumed it gets
        // nothing until every sibling has caught up.
        if core.consumed[self.slot] {
            return None;
        }
        let buf = core.current.clone()?;
        core.consumed[self.slot] = true;
        Some(buf)
    }

    fn state(&self) -> State {
        locked(&self.core).base.state()
    }

    fn head_info(&self) -> ModuleInfo {
        locked(&self.core).base.info().clone()
    }

    fn module_count(&self) -> usize {
        // The shared subtree is reachable through every tap; the first
        // tap answers for it so siblings don't double-count.
        if self.slot == 0 {
            1 + locked(&self.core).backward.module_count()
        } else {
            0
        }
    }

    fn finished_modules(&self) -> usize {
        if self.slot == 0 {
            let core = locked(&self.core);
            let own = usize::from(core.base.state() >= State::Finished);
            own + core.backward.finished_modules()
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Source;
    use super::*;
    use crate::module::Module;

    struct Const {
        base: ModuleBase,
        value: f64,
    }

    impl Const {
        fn new(value: f64) -> Self {
            Self {
                base: ModuleBase::new(),
                value,
            }
        }
    }

    impl Module for Const {
        fn base(&self) -> &ModuleBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ModuleBase {
            &mut self.base
        }

        fn process(&mut self) -> Result<()> {
            self.base.make_buffer();
            let value = self.value;
            if let Some(buf) = self.base.buffer_mut() {
                buf.fill(value);
            }
            Ok(())
        }
    }

    struct Counting {
        base: ModuleBase,
        pulls: u32,
    }

    impl Counting {
        fn new() -> Self {
            Self {
                base: ModuleBase::new(),
                pulls: 0,
            }
        }
    }

    impl Module for Counting {
        fn base(&self) -> &ModuleBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ModuleBase {
            &mut self.base
        }

        fn process(&mut self) -> Result<()> {
            self.pulls += 1;
            self.base.make_buffer();
            let value = f64::from(self.pulls);
            if let Some(buf) = self.base.buffer_mut() {
                buf.fill(value);
            }
            Ok(())
        }
    }

    fn synced(chain: &mut impl ChainModule, info: &mut ChainInfo) {
        let forward = ModuleInfo::from_chain(info);
        chain.meta_info_sync(&forward, info).unwrap();
    }

    #[test]
    fn test_mixdown_sums_inputs() {
        let mut mix = MixDown::new()
            .with_input(Source::new(Const::new(1.0)))
            .with_input(Source::new(Const::new(2.0)))
            .with_input(Source::new(Const::new(3.0)));
        let mut info = ChainInfo::new(44_100.0, 16, 1);
        synced(&mut mix, &mut info);
        assert_eq!(info.modules, 4);

        mix.meta_start().unwrap();
        mix.meta_process().unwrap();
        let buf = mix.take_buffer().unwrap();
        assert!(buf.iter_sequential().all(|&s| (s - 6.0).abs() < 1e-12));
    }

    #[test]
    fn test_mixdown_without_inputs_fails() {
        let mut mix = MixDown::new();
        mix.meta_start().unwrap();
        assert!(matches!(
            mix.meta_process(),
            Err(ChainError::MissingBackward)
        ));
    }

    #[test]
    fn test_mixdown_shape_mismatch_at_sync() {
        struct Narrow {
            base: ModuleBase,
        }

        impl Module for Narrow {
            fn base(&self) -> &ModuleBase {
                &self.base
            }

            fn base_mut(&mut self) -> &mut ModuleBase {
                &mut self.base
            }

            fn info_sync(&mut self, forward: &ModuleInfo) {
                let mut info = forward.clone();
                info.channels = forward.channels + 1;
                self.base.set_info(info);
            }
        }

        let mut mix = MixDown::new()
            .with_input(Source::new(Const::new(0.0)))
            .with_input(Source::new(Narrow {
                base: ModuleBase::new(),
            }));
        let mut info = ChainInfo::new(44_100.0, 16, 1);
        let forward = ModuleInfo::from_chain(&info);
        let err = mix.meta_info_sync(&forward, &mut info).unwrap_err();
        assert!(matches!(err, ChainError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_mixup_taps_share_one_generation() {
        let split = MixUp::new(Source::new(Counting::new()));
        let mut a = split.tap();
        let mut b = split.tap();
        let mut info = ChainInfo::new(44_100.0, 8, 1);
        synced(&mut a, &mut info);
        synced(&mut b, &mut info);
        assert_eq!(info.modules, 2);

        a.meta_start().unwrap();
        b.meta_start().unwrap();

        // Both taps see generation 1 even with interleaved driving.
        a.meta_process().unwrap();
        let first = a.take_buffer().unwrap();
        b.meta_process().unwrap();
        let second = b.take_buffer().unwrap();
        assert!((first.get(0, 0) - 1.0).abs() < 1e-12);
        assert!((second.get(0, 0) - 1.0).abs() < 1e-12);

        // Every tap consumed, so the next pass advances upstream.
        a.meta_process().unwrap();
        let third = a.take_buffer().unwrap();
        assert!((third.get(0, 0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mixup_tap_yields_each_generation_once() {
        let split = MixUp::new(Source::new(Counting::new()));
        let mut a = split.tap();
        let mut b = split.tap();
        let mut info = ChainInfo::new(44_100.0, 8, 1);
        synced(&mut a, &mut info);
        synced(&mut b, &mut info);

        a.meta_start().unwrap();
        a.meta_process().unwrap();
        let first = a.take_buffer().unwrap();
        assert!((first.get(0, 0) - 1.0).abs() < 1e-12);

        // Driving the same tap again while its sibling lags must not hand
        // out a second copy of the same generation.
        a.meta_process().unwrap();
        assert!(a.take_buffer().is_none());

        // The lagging tap still gets generation 1.
        let late = b.take_buffer().unwrap();
        assert!((late.get(0, 0) - 1.0).abs() < 1e-12);

        // With everyone caught up, the upstream advances again.
        a.meta_process().unwrap();
        let next = a.take_buffer().unwrap();
        assert!((next.get(0, 0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_mixup_copies_are_independent() {
        let split = MixUp::new(Source::new(Const::new(5.0)));
        let mut a = split.tap();
        let mut b = split.tap();
        let mut info = ChainInfo::default();
        synced(&mut a, &mut info);

        a.meta_start().unwrap();
        a.meta_process().unwrap();
        let mut first = a.take_buffer().unwrap();
        first.fill(0.0);
        let second = b.take_buffer().unwrap();
        assert!((second.get(0, 0) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_mixup_meta_ops_apply_once() {
        let split = MixUp::new(Source::new(Const::new(0.0)));
        let mut a = split.tap();
        let mut b = split.tap();
        a.meta_start().unwrap();
        b.meta_start().unwrap();
        assert_eq!(a.state(), State::Started);
        a.meta_finish().unwrap();
        b.meta_finish().unwrap();
        assert_eq!(a.finished_modules() + b.finished_modules(), 2);
        a.meta_stop().unwrap();
        b.meta_stop().unwrap();
        assert_eq!(b.state(), State::Stopped);
    }
}
