//! Multi-channel sample buffer with dual-layout addressing.
//!
//! [`SampleBuffer`] owns `channels x channel_capacity` samples in one flat,
//! channel-major store. The same storage is addressable through two logical
//! index spaces:
//!
//! - **sequential** (channel-major): `index = channel * channel_capacity + sample`
//!   — all frames of channel 0, then channel 1, and so on. This equals the
//!   storage order.
//! - **interleaved** (time-major): `index = sample * channels + channel`
//!   — every channel's value at frame 0, then frame 1, and so on. This is the
//!   order most output backends expect.
//!
//! Converting between the two is pure index arithmetic; no samples move.
//! Read-only traversal in either order goes through [`SampleBuffer::iter_sequential`]
//! and [`SampleBuffer::iter_interleaved`]; positional mutation goes through
//! [`SeqCursor`] and [`InterCursor`], which resolve the storage slot lazily
//! from the current index on each move.

/// A flat multi-channel buffer of `f64` samples.
///
/// Storage is channel-major: the sequential index of a `(channel, sample)`
/// pair is also its storage offset. The interleaved index space is a
/// permutation over the same storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Flat channel-major sample store, length `channels * channel_capacity`.
    data: Vec<f64>,
    channels: usize,
    channel_capacity: usize,
    sample_rate: f64,
}

impl SampleBuffer {
    /// Creates a zero-filled buffer of `channel_capacity` frames per channel.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is zero.
    pub fn new(channel_capacity: usize, channels: usize, sample_rate: f64) -> Self {
        assert!(channels > 0, "a buffer needs at least one channel");
        Self {
            data: vec![0.0; channels * channel_capacity],
            channels,
            channel_capacity,
            sample_rate,
        }
    }

    /// Builds a buffer from channel-major (sequential order) data.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is zero or does not divide `data.len()`.
    pub fn from_sequential(data: Vec<f64>, channels: usize, sample_rate: f64) -> Self {
        assert!(channels > 0, "a buffer needs at least one channel");
        assert_eq!(
            data.len() % channels,
            0,
            "sample count must be a multiple of the channel count"
        );
        let channel_capacity = data.len() / channels;
        Self {
            data,
            channels,
            channel_capacity,
            sample_rate,
        }
    }

    /// Builds a buffer from time-major (interleaved order) data, remapping
    /// it into the channel-major store.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is zero or does not divide `data.len()`.
    pub fn from_interleaved(data: &[f64], channels: usize, sample_rate: f64) -> Self {
        assert!(channels > 0, "a buffer needs at least one channel");
        assert_eq!(
            data.len() % channels,
            0,
            "sample count must be a multiple of the channel count"
        );
        let channel_capacity = data.len() / channels;
        let mut buf = Self::new(channel_capacity, channels, sample_rate);
        for (idx, &value) in data.iter().enumerate() {
            let slot = buf.resolve_interleaved(idx);
            buf.data[slot] = value;
        }
        buf
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Frames per channel.
    pub fn channel_capacity(&self) -> usize {
        self.channel_capacity
    }

    /// Total number of samples across all channels.
    pub fn total_capacity(&self) -> usize {
        self.data.len()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Sets the sample rate in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    // --- Index arithmetic ---

    /// Sequential (channel-major) logical index of a `(channel, sample)` pair.
    #[inline]
    pub fn seq_index(&self, channel: usize, sample: usize) -> usize {
        channel * self.channel_capacity + sample
    }

    /// Interleaved (time-major) logical index of a `(channel, sample)` pair.
    #[inline]
    pub fn inter_index(&self, channel: usize, sample: usize) -> usize {
        sample * self.channels + channel
    }

    /// Storage slot addressed by an interleaved logical index.
    ///
    /// Sequential indices need no translation; they equal storage offsets.
    #[inline]
    fn resolve_interleaved(&self, index: usize) -> usize {
        let channel = index % self.channels;
        let sample = index / self.channels;
        channel * self.channel_capacity + sample
    }

    // --- Positional access ---

    /// Reads the sample at `(channel, sample)`.
    #[inline]
    pub fn get(&self, channel: usize, sample: usize) -> f64 {
        self.data[self.seq_index(channel, sample)]
    }

    /// Writes the sample at `(channel, sample)`.
    #[inline]
    pub fn set(&mut self, channel: usize, sample: usize, value: f64) {
        let idx = self.seq_index(channel, sample);
        self.data[idx] = value;
    }

    /// Reads by sequential logical index.
    #[inline]
    pub fn get_seq(&self, index: usize) -> f64 {
        self.data[index]
    }

    /// Writes by sequential logical index.
    #[inline]
    pub fn set_seq(&mut self, index: usize, value: f64) {
        self.data[index] = value;
    }

    /// Reads by interleaved logical index.
    #[inline]
    pub fn get_inter(&self, index: usize) -> f64 {
        self.data[self.resolve_interleaved(index)]
    }

    /// Writes by interleaved logical index.
    #[inline]
    pub fn set_inter(&mut self, index: usize, value: f64) {
        let slot = self.resolve_interleaved(index);
        self.data[slot] = value;
    }

    // --- Traversal ---

    /// Read-only sequential (channel-major) traversal: channel 0 in full,
    /// then channel 1, and so on. Reversible via `rev()`.
    pub fn iter_sequential(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    /// Mutable sequential traversal. The sequential order equals storage
    /// order, so this is a plain slice iterator.
    pub fn iter_sequential_mut(&mut self) -> std::slice::IterMut<'_, f64> {
        self.data.iter_mut()
    }

    /// Read-only interleaved (time-major) traversal: every channel at frame
    /// 0, then frame 1, and so on. Reversible via `rev()`.
    pub fn iter_interleaved(&self) -> InterleavedIter<'_> {
        InterleavedIter {
            buf: self,
            front: 0,
            back: self.total_capacity(),
        }
    }

    /// Cursor for positional reads/writes in the sequential index space.
    pub fn seq_cursor(&mut self) -> SeqCursor<'_> {
        SeqCursor { buf: self, index: 0 }
    }

    /// Cursor for positional reads/writes in the interleaved index space.
    pub fn inter_cursor(&mut self) -> InterCursor<'_> {
        InterCursor { buf: self, index: 0 }
    }

    /// Fills every sample with `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// The flat channel-major storage.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// One channel's frames as a contiguous slice.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel(&self, channel: usize) -> &[f64] {
        let start = self.seq_index(channel, 0);
        &self.data[start..start + self.channel_capacity]
    }

    /// Mutable access to one channel's frames.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f64] {
        let start = self.seq_index(channel, 0);
        &mut self.data[start..start + self.channel_capacity]
    }
}

/// Read-only iterator over a buffer in interleaved (time-major) order.
///
/// Yields `total_capacity` samples by value; supports reverse traversal.
#[derive(Debug)]
pub struct InterleavedIter<'a> {
    buf: &'a SampleBuffer,
    front: usize,
    back: usize,
}

impl Iterator for InterleavedIter<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let slot = self.buf.resolve_interleaved(self.front);
        self.front += 1;
        Some(self.buf.data[slot])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.back - self.front;
        (rem, Some(rem))
    }
}

impl DoubleEndedIterator for InterleavedIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        let slot = self.buf.resolve_interleaved(self.back);
        Some(self.buf.data[slot])
    }
}

impl ExactSizeIterator for InterleavedIter<'_> {}

/// Positional cursor over the sequential (channel-major) index space.
///
/// The cursor holds a logical index; the storage slot is resolved from the
/// index on each access, not cached across moves. Index arithmetic behaves
/// like flat array iteration: [`advance`](SeqCursor::advance),
/// [`retreat`](SeqCursor::retreat), and direct [`set_index`](SeqCursor::set_index)
/// all land on the slot the index denotes.
#[derive(Debug)]
pub struct SeqCursor<'a> {
    buf: &'a mut SampleBuffer,
    index: usize,
}

impl SeqCursor<'_> {
    /// Current logical index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Jumps to a logical index.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Moves forward by `n` positions.
    pub fn advance(&mut self, n: usize) {
        self.index += n;
    }

    /// Moves backward by `n` positions, saturating at zero.
    pub fn retreat(&mut self, n: usize) {
        self.index = self.index.saturating_sub(n);
    }

    /// True while the cursor addresses a valid sample.
    pub fn is_valid(&self) -> bool {
        self.index < self.buf.total_capacity()
    }

    /// Channel the cursor currently addresses.
    pub fn channel(&self) -> usize {
        self.index / self.buf.channel_capacity
    }

    /// Frame within the channel the cursor currently addresses.
    pub fn sample(&self) -> usize {
        self.index % self.buf.channel_capacity
    }

    /// Jumps to the start of a channel.
    pub fn set_channel(&mut self, channel: usize) {
        self.index = self.buf.seq_index(channel, 0);
    }

    /// Jumps to a `(channel, sample)` position.
    pub fn set_position(&mut self, channel: usize, sample: usize) {
        self.index = self.buf.seq_index(channel, sample);
    }

    /// Reads the sample under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is past the end of the buffer.
    pub fn get(&self) -> f64 {
        self.buf.data[self.index]
    }

    /// Writes the sample under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is past the end of the buffer.
    pub fn set(&mut self, value: f64) {
        self.buf.data[self.index] = value;
    }

    /// Writes the sample under the cursor and advances one position.
    pub fn write(&mut self, value: f64) {
        self.set(value);
        self.advance(1);
    }
}

/// Positional cursor over the interleaved (time-major) index space.
///
/// Same surface as [`SeqCursor`] with channel and sample swapped in the
/// index formula: `index = sample * channels + channel`.
#[derive(Debug)]
pub struct InterCursor<'a> {
    buf: &'a mut SampleBuffer,
    index: usize,
}

impl InterCursor<'_> {
    /// Current logical index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Jumps to a logical index.
    pub fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Moves forward by `n` positions.
    pub fn advance(&mut self, n: usize) {
        self.index += n;
    }

    /// Moves backward by `n` positions, saturating at zero.
    pub fn retreat(&mut self, n: usize) {
        self.index = self.index.saturating_sub(n);
    }

    /// True while the cursor addresses a valid sample.
    pub fn is_valid(&self) -> bool {
        self.index < self.buf.total_capacity()
    }

    /// Channel the cursor currently addresses.
    pub fn channel(&self) -> usize {
        self.index % self.buf.channels
    }

    /// Frame the cursor currently addresses.
    pub fn sample(&self) -> usize {
        self.index / self.buf.channels
    }

    /// Jumps to channel 0 of a frame.
    pub fn set_sample(&mut self, sample: usize) {
        self.index = self.buf.inter_index(0, sample);
    }

    /// Jumps to a `(channel, sample)` position.
    pub fn set_position(&mut self, channel: usize, sample: usize) {
        self.index = self.buf.inter_index(channel, sample);
    }

    /// Reads the sample under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is past the end of the buffer.
    pub fn get(&self) -> f64 {
        let slot = self.buf.resolve_interleaved(self.index);
        self.buf.data[slot]
    }

    /// Writes the sample under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is past the end of the buffer.
    pub fn set(&mut self, value: f64) {
        let slot = self.buf.resolve_interleaved(self.index);
        self.buf.data[slot] = value;
    }

    /// Writes the sample under the cursor and advances one position.
    pub fn write(&mut self, value: f64) {
        self.set(value);
        self.advance(1);
    }
}
