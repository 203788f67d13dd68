//! Chain-wide and per-module configuration.
//!
//! [`ChainInfo`] describes how audio leaves the chain: one instance per
//! chain, owned by the sink, handed to each node by reference during the
//! info-sync pass and never duplicated. [`ModuleInfo`] is a per-node
//! snapshot seeded from the chain (or from the forward node) during sync,
//! after which a module may adjust it locally.
//!
//! Defaults are explicit values threaded through construction rather than
//! ambient globals; override them on the sink's `ChainInfo` before syncing.

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f64 = 44100.0;

/// Default number of frames per buffer as it reaches the sink.
pub const DEFAULT_BUFFER_SIZE: usize = 440;

/// Configuration shared by every module in one chain.
///
/// The values describe audio as it *leaves* the chain: `buffer_size` is the
/// per-pull frame count arriving at the sink. Modules read these fields
/// during info-sync to configure themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainInfo {
    /// Sample rate of the audio data in Hz.
    pub sample_rate: f64,
    /// Frames per buffer entering the sink.
    pub buffer_size: usize,
    /// Number of audio channels.
    pub channels: usize,
    /// Number of modules in the chain. Recomputed by each info-sync pass.
    pub modules: usize,
    /// Number of modules that have reached the finished state. Recomputed
    /// by the sink after `meta_finish`.
    pub modules_finished: usize,
    /// Monotonic counter bumped by the sink at the start of each info-sync
    /// pass; lets shared fan-out nodes detect a fresh pass.
    pub(crate) sync_pass: u64,
}

impl ChainInfo {
    /// Creates a `ChainInfo` with explicit audio parameters.
    pub fn new(sample_rate: f64, buffer_size: usize, channels: usize) -> Self {
        Self {
            sample_rate,
            buffer_size,
            channels,
            modules: 0,
            modules_finished: 0,
            sync_pass: 0,
        }
    }
}

impl Default for ChainInfo {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE, DEFAULT_BUFFER_SIZE, 1)
    }
}

/// Per-module configuration snapshot.
///
/// Seeded from [`ChainInfo`] (at the sink) or from the forward module's
/// info (everywhere else) during the info-sync pass. After a full pass, a
/// module's `in_buffer` equals its predecessor's `out_buffer`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleInfo {
    /// Sample rate of the audio data in Hz.
    pub sample_rate: f64,
    /// Frames per incoming buffer.
    pub in_buffer: usize,
    /// Frames per outgoing buffer.
    pub out_buffer: usize,
    /// Number of audio channels.
    pub channels: usize,
}

impl ModuleInfo {
    /// Seeds a `ModuleInfo` from chain-wide configuration.
    ///
    /// Both buffer sizes start at the chain's `buffer_size`; modules that
    /// resize buffers adjust them after sync.
    pub fn from_chain(chain: &ChainInfo) -> Self {
        Self {
            sample_rate: chain.sample_rate,
            in_buffer: chain.buffer_size,
            out_buffer: chain.buffer_size,
            channels: chain.channels,
        }
    }
}

impl Default for ModuleInfo {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            in_buffer: DEFAULT_BUFFER_SIZE,
            out_buffer: DEFAULT_BUFFER_SIZE,
            channels: 1,
        }
    }
}
