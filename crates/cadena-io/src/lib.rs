//! WAV file I/O for cadena chains.
//!
//! - [`read_wav`] / [`write_wav`]: load a file into a
//!   [`SampleBuffer`](cadena_core::SampleBuffer) and back
//! - [`read_wav_info`]: header-only metadata
//! - [`WavCapture`]: a pass-through chain module that records everything
//!   flowing by, for saving after the run
//!
//! ## Example
//!
//! ```ignore
//! use cadena_io::{read_wav, write_wav, WavSpec};
//!
//! let buf = read_wav("input.wav")?;
//! let spec = WavSpec {
//!     sample_rate: buf.sample_rate() as u32,
//!     channels: buf.channels() as u16,
//!     ..Default::default()
//! };
//! write_wav("output.wav", &buf, spec)?;
//! ```

mod wav;

pub use wav::{WavCapture, WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, write_wav};

/// Error type for WAV file operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// The file holds no complete frame for its channel count.
    #[error("malformed sample data: {samples} samples across {channels} channels")]
    MalformedData {
        /// Total samples present in the file.
        samples: usize,
        /// Channel count declared in the header.
        channels: usize,
    },

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for WAV file operations.
pub type Result<T> = std::result::Result<T, Error>;
