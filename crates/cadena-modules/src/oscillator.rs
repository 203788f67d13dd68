//! Fundamental waveform generators.
//!
//! All four oscillators share one phase accumulator: phase runs over
//! `[0, 1)` and advances by `frequency / sample_rate` per frame, so
//! frequency changes between passes keep the waveform continuous. Every
//! channel of a frame carries the same sample.

use std::f64::consts::TAU;

use cadena_core::error::Result;
use cadena_core::module::{Module, ModuleBase};

/// Phase accumulator shared by the waveform generators.
#[derive(Debug, Clone)]
struct OscCore {
    base: ModuleBase,
    frequency: f64,
    phase: f64,
}

impl OscCore {
    fn new(frequency: f64) -> Self {
        Self {
            base: ModuleBase::new(),
            frequency,
            phase: 0.0,
        }
    }

    /// Fills the buffer frame by frame with `wave(phase)`.
    fn generate(&mut self, wave: impl Fn(f64) -> f64) {
        self.base.make_buffer();
        let step = self.frequency / self.base.info().sample_rate;
        let mut phase = self.phase;
        if let Some(buf) = self.base.buffer_mut() {
            let channels = buf.channels();
            let frames = buf.channel_capacity();
            for s in 0..frames {
                let value = wave(phase);
                for ch in 0..channels {
                    buf.set(ch, s, value);
                }
                phase = (phase + step).fract();
            }
        }
        self.phase = phase;
    }
}

macro_rules! oscillator {
    ($(#[$doc:meta])* $name:ident, $wave:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            core: OscCore,
        }

        impl $name {
            /// Builds the oscillator at `frequency` Hz.
            pub fn new(frequency: f64) -> Self {
                Self {
                    core: OscCore::new(frequency),
                }
            }

            /// Oscillation frequency in Hz.
            pub fn frequency(&self) -> f64 {
                self.core.frequency
            }

            /// Retunes the oscillator. Takes effect at the next pass,
            /// phase-continuous.
            pub fn set_frequency(&mut self, frequency: f64) {
                self.core.frequency = frequency;
            }
        }

        impl Module for $name {
            fn base(&self) -> &ModuleBase {
                &self.core.base
            }

            fn base_mut(&mut self) -> &mut ModuleBase {
                &mut self.core.base
            }

            fn process(&mut self) -> Result<()> {
                self.core.generate($wave);
                Ok(())
            }
        }
    };
}

oscillator!(
    /// Pure sine wave.
    SineOscillator,
    |phase: f64| (phase * TAU).sin()
);

oscillator!(
    /// Square wave: +1 for the first half of the cycle, -1 for the rest.
    SquareOscillator,
    |phase: f64| if phase < 0.5 { 1.0 } else { -1.0 }
);

oscillator!(
    /// Rising sawtooth from -1 to +1 over one cycle.
    SawtoothOscillator,
    |phase: f64| 2.0 * phase - 1.0
);

oscillator!(
    /// Triangle wave, peaking at the half cycle.
    TriangleOscillator,
    |phase: f64| 4.0 * (phase - (phase + 0.5).floor()).abs() - 1.0
);

#[cfg(test)]
mod tests {
    use super::*;
    use cadena_core::info::ModuleInfo;

    fn run(module: &mut impl Module, sample_rate: f64, frames: usize) -> Vec<f64> {
        let info = ModuleInfo {
            sample_rate,
            in_buffer: frames,
            out_buffer: frames,
            channels: 1,
        };
        module.info_sync(&info);
        module.start().unwrap();
        module.process().unwrap();
        module
            .base_mut()
            .take_buffer()
            .expect("oscillator produced no buffer")
            .iter_sequential()
            .copied()
            .collect()
    }

    #[test]
    fn test_sine_hits_quadrature_points() {
        // 4 samples per cycle: 0, 1, 0, -1.
        let mut osc = SineOscillator::new(1.0);
        let out = run(&mut osc, 4.0, 8);
        let expected = [0.0, 1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_square_duty_cycle() {
        let mut osc = SquareOscillator::new(1.0);
        let out = run(&mut osc, 8.0, 8);
        assert_eq!(out, vec![1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_sawtooth_ramps_per_cycle() {
        let mut osc = SawtoothOscillator::new(1.0);
        let out = run(&mut osc, 4.0, 4);
        let expected = [-1.0, -0.5, 0.0, 0.5];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_triangle_peaks_mid_cycle() {
        let mut osc = TriangleOscillator::new(1.0);
        let out = run(&mut osc, 4.0, 4);
        let expected = [-1.0, 0.0, 1.0, 0.0];
        for (got, want) in out.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_phase_continues_across_pulls() {
        let mut osc = SineOscillator::new(1.0);
        let info = ModuleInfo {
            sample_rate: 8.0,
            in_buffer: 3,
            out_buffer: 3,
            channels: 1,
        };
        osc.info_sync(&info);
        osc.start().unwrap();

        let mut joined = Vec::new();
        for _ in 0..4 {
            osc.process().unwrap();
            let buf = osc.base_mut().take_buffer().unwrap();
            joined.extend(buf.iter_sequential().copied());
        }

        let mut whole = SineOscillator::new(1.0);
        let reference = run(&mut whole, 8.0, 12);
        for (got, want) in joined.iter().zip(reference) {
            assert!((got - want).abs() < 1e-9);
        }
    }

    #[test]
    fn test_all_channels_share_the_frame() {
        let mut osc = SineOscillator::new(440.0);
        let info = ModuleInfo {
            sample_rate: 44_100.0,
            in_buffer: 16,
            out_buffer: 16,
            channels: 3,
        };
        osc.info_sync(&info);
        osc.start().unwrap();
        osc.process().unwrap();
        let buf = osc.base_mut().take_buffer().unwrap();
        for s in 0..16 {
            let first = buf.get(0, s);
            assert_eq!(buf.get(1, s), first);
            assert_eq!(buf.get(2, s), first);
        }
    }
}
