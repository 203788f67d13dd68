//! WAV file reading and writing.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavWriter};

use cadena_core::SampleBuffer;
use cadena_core::error::{ChainError, Result as ChainResult};
use cadena_core::module::{Module, ModuleBase};

use crate::{Error, Result};

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Total number of frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// WAV file specification for writing.
#[derive(Debug, Clone, Copy)]
pub struct WavSpec {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample. 32 writes IEEE float, anything lower PCM.
    pub bits_per_sample: u16,
}

impl Default for WavSpec {
    fn default() -> Self {
        Self {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
        }
    }
}

impl WavSpec {
    /// Derives a spec from a buffer's shape, keeping the default bit depth.
    pub fn for_buffer(buf: &SampleBuffer) -> Self {
        Self {
            channels: buf.channels() as u16,
            sample_rate: buf.sample_rate() as u32,
            ..Self::default()
        }
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: if spec.bits_per_sample == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        }
    }
}

/// Reads WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let total_samples = u64::from(reader.len());
    let num_frames = total_samples / u64::from(spec.channels);
    let duration_secs = num_frames as f64 / f64::from(spec.sample_rate);

    let format = match spec.sample_format {
        SampleFormat::Float => WavFormat::IeeeFloat,
        SampleFormat::Int => WavFormat::Pcm,
    };

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs,
        format,
    })
}

/// Reads a WAV file into a [`SampleBuffer`], all channels preserved.
///
/// Integer formats are normalized to `[-1, 1]`. A trailing partial frame
/// is dropped.
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<SampleBuffer> {
    let reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels);
    let sample_rate = f64::from(spec.sample_rate);

    let mut samples: Vec<f64> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<_, _>>()?,
        SampleFormat::Int => {
            // An i32 shift would wrap negative at 32 bits.
            let max_val = 2.0f64.powi(i32::from(spec.bits_per_sample) - 1);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    if samples.len() < channels {
        return Err(Error::MalformedData {
            samples: samples.len(),
            channels,
        });
    }
    samples.truncate(samples.len() - samples.len() % channels);

    tracing::debug!(
        channels,
        sample_rate,
        frames = samples.len() / channels,
        "wav file loaded"
    );
    Ok(SampleBuffer::from_interleaved(
        &samples,
        channels,
        sample_rate,
    ))
}

/// Writes a [`SampleBuffer`] to a WAV file, interleaved, per `spec`.
///
/// The spec's channel count is taken from the buffer; bit depth 32 writes
/// IEEE float, lower depths scale and clamp to PCM.
pub fn write_wav<P: AsRef<Path>>(path: P, buf: &SampleBuffer, spec: WavSpec) -> Result<()> {
    let mut spec = spec;
    spec.channels = buf.channels() as u16;
    let mut writer = WavWriter::create(path, hound::WavSpec::from(spec))?;

    if spec.bits_per_sample == 32 {
        for sample in buf.iter_interleaved() {
            writer.write_sample(sample as f32)?;
        }
    } else {
        let max_val = 2.0f64.powi(i32::from(spec.bits_per_sample) - 1);
        for sample in buf.iter_interleaved() {
            let int_sample = (sample * max_val).clamp(-max_val, max_val - 1.0) as i32;
            writer.write_sample(int_sample)?;
        }
    }

    writer.finalize()?;
    tracing::debug!(
        channels = spec.channels,
        sample_rate = spec.sample_rate,
        frames = buf.channel_capacity(),
        "wav file written"
    );
    Ok(())
}

/// Pass-through chain module recording every sample that flows by.
///
/// Processing never touches the disk: samples accumulate in memory, in
/// interleaved order, and [`save`](Self::save) writes them out after the
/// run. This keeps file errors out of the chain's processing path.
#[derive(Debug, Default)]
pub struct WavCapture {
    base: ModuleBase,
    recorded: Vec<f64>,
}

impl WavCapture {
    /// An empty capture stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Samples recorded so far (interleaved).
    pub fn recorded(&self) -> &[f64] {
        &self.recorded
    }

    /// Frames recorded so far.
    pub fn frames(&self) -> usize {
        let channels = self.base.info().channels.max(1);
        self.recorded.len() / channels
    }

    /// Writes the recording to `path` with the capture's channel count and
    /// sample rate.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let info = self.base.info();
        let buf = SampleBuffer::from_interleaved(
            &self.recorded,
            info.channels.max(1),
            info.sample_rate,
        );
        let spec = WavSpec {
            channels: info.channels.max(1) as u16,
            sample_rate: info.sample_rate as u32,
            ..WavSpec::default()
        };
        write_wav(path, &buf, spec)
    }

    /// Drops everything recorded so far.
    pub fn clear(&mut self) {
        self.recorded.clear();
    }
}

impl Module for WavCapture {
    fn base(&self) -> &ModuleBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ModuleBase {
        &mut self.base
    }

    fn process(&mut self) -> ChainResult<()> {
        let buf = self.base.buffer().ok_or(ChainError::MissingBuffer)?;
        self.recorded.extend(buf.iter_interleaved());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_round_trip_through_hound() {
        let spec = WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 16,
        };
        let hs = hound::WavSpec::from(spec);
        assert_eq!(hs.sample_format, SampleFormat::Int);
        let back = WavSpec::from(hs);
        assert_eq!(back.channels, 2);
        assert_eq!(back.sample_rate, 48000);
        assert_eq!(back.bits_per_sample, 16);
    }

    #[test]
    fn test_float_spec_selects_ieee() {
        let hs = hound::WavSpec::from(WavSpec::default());
        assert_eq!(hs.sample_format, SampleFormat::Float);
    }

    #[test]
    fn test_capture_accumulates_interleaved() {
        use cadena_core::info::ModuleInfo;

        let mut cap = WavCapture::new();
        cap.info_sync(&ModuleInfo {
            sample_rate: 44_100.0,
            in_buffer: 4,
            out_buffer: 4,
            channels: 2,
        });
        cap.start().unwrap();
        for _ in 0..2 {
            cap.base_mut()
                .set_buffer(SampleBuffer::from_interleaved(
                    &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
                    2,
                    44_100.0,
                ));
            cap.process().unwrap();
            cap.base_mut().take_buffer().unwrap();
        }
        assert_eq!(cap.frames(), 8);
        assert_eq!(cap.recorded().len(), 16);
        assert_eq!(cap.recorded()[..4], [1.0, 2.0, 3.0, 4.0]);
    }
}
