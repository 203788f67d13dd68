//! Utility modules: fixed-value sources, stored-buffer playback, and a
//! pass-through counter.

use cadena_core::error::{ChainError, Result};
use cadena_core::module::{Module, ModuleBase, State};

/// Emits the same value in every sample.
#[derive(Debug, Clone)]
pub struct ConstSource {
    base: ModuleBase,
    value: f64,
}

impl ConstSource {
    /// A source producing `value` forever.
    pub fn new(value: f64) -> Self {
        Self {
            base: ModuleBase::new(),
            value,
        }
    }

    /// The emitted value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Sets the emitted value. Takes effect at the next pass.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }
}

impl Module for ConstSource {
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

/// Plays back a stored interleaved sample stream, one chunk per pass.
///
/// When the stream runs out the remainder of the chunk is silence and the
/// module reports done; the chain keeps draining silence until stopped.
#[derive(Debug, Clone)]
pub struct BufferSource {
    base: ModuleBase,
    samples: Vec<f64>,
    position: usize,
}

impl BufferSource {
    /// A source playing `samples`, interpreted in interleaved order for
    /// the channel count configured at info sync.
    pub fn new(samples: Vec<f64>) -> Self {
        Self {
            base: ModuleBase::new(),
            samples,
            position: 0,
        }
    }

    /// Samples not yet played.
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }

    /// Whether the stored stream has been fully played.
    pub fn exhausted(&self) -> bool {
        self.position >= self.samples.len()
    }
}

impl Module for BufferSource {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        self.base.make_buffer();
        let start = self.position;
        let total = self.samples.len();
        if let Some(buf) = self.base.buffer_mut() {
            let mut cursor = buf.inter_cursor();
            let mut at = start;
            while cursor.is_valid() {
                let value = if at < total { self.samples[at] } else { 0.0 };
                cursor.write(value);
                at += 1;
            }
            self.position = at.min(total);
        }
        if self.exhausted() && self.base.state() == State::Started {
            // Ran dry: report done so the chain can wind down.
            self.base.advance(State::Finishing)?;
            self.base.advance(State::Finished)?;
        }
        Ok(())
    }
}

/// Pass-through stage counting passes and samples seen, for tests and
/// diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    base: ModuleBase,
    passes: u64,
    samples: u64,
}

impl Counter {
    /// A fresh counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Processing passes observed.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Total samples that flowed through.
    pub fn samples(&self) -> u64 {
        self.samples
    }
}

impl Module for Counter {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn process(&mut self) -> Result<()> {
        let buf = self.base.buffer().ok_or(ChainError::MissingBuffer)?;
        self.passes += 1;
        self.samples += buf.total_capacity() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadena_core::SampleBuffer;
    use cadena_core::info::ModuleInfo;

    fn small_info(frames: usize, channels: usize) -> ModuleInfo {
        ModuleInfo {
            sample_rate: 44_100.0,
            in_buffer: frames,
            out_buffer: frames,
            channels,
        }
    }

    #[test]
    fn test_const_fills_every_sample() {
        let mut src = ConstSource::new(0.25);
        src.info_sync(&small_info(8, 2));
        src.start().unwrap();
        src.process().unwrap();
        let buf = src.base_mut().take_buffer().unwrap();
        assert_eq!(buf.total_capacity(), 16);
        assert!(buf.iter_sequential().all(|&s| s == 0.25));
    }

    #[test]
    fn test_buffer_source_plays_in_chunks() {
        let samples: Vec<f64> = (0..10).map(f64::from).collect();
        let mut src = BufferSource::new(samples);
        src.info_sync(&small_info(4, 1));
        src.start().unwrap();

        src.process().unwrap();
        let first = src.base_mut().take_buffer().unwrap();
        let out: Vec<f64> = first.iter_interleaved().collect();
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(src.remaining(), 6);
        assert_eq!(src.state(), State::Started);

        src.process().unwrap();
        src.base_mut().take_buffer().unwrap();

        // Third chunk: two real samples, then silence, and the source
        // reports done.
        src.process().unwrap();
        let third = src.base_mut().take_buffer().unwrap();
        let out: Vec<f64> = third.iter_interleaved().collect();
        assert_eq!(out, vec![8.0, 9.0, 0.0, 0.0]);
        assert!(src.exhausted());
        assert_eq!(src.state(), State::Finished);
    }

    #[test]
    fn test_counter_tracks_throughput() {
        let mut counter = Counter::new();
        counter.info_sync(&small_info(4, 2));
        counter.start().unwrap();
        for _ in 0..3 {
            counter
                .base_mut()
                .set_buffer(SampleBuffer::new(4, 2, 44_100.0));
            counter.process().unwrap();
            counter.base_mut().take_buffer().unwrap();
        }
        assert_eq!(counter.passes(), 3);
        assert_eq!(counter.samples(), 24);
    }
}
