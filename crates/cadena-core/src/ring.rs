//! Fixed-capacity ring buffer with modulo indexing.
//!
//! Stateful filters that need historical context (delay lines, FIR taps)
//! index relative positions without worrying about bounds: every index is
//! normalized modulo the capacity before it touches storage, so wrapping is
//! the defined behavior rather than a failure mode.

use std::ops::{Index, IndexMut};

/// A circular buffer where index `i` resolves to storage slot `i % len`.
///
/// Indexing never leaves the allocated region regardless of how large the
/// index value is.
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer<T> {
    data: Vec<T>,
}

impl<T: Default + Clone> RingBuffer<T> {
    /// Creates a ring of `size` default-valued slots.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "ring buffer capacity must be non-zero");
        Self {
            data: vec![T::default(); size],
        }
    }
}

impl<T> RingBuffer<T> {
    /// Wraps existing data without copying.
    ///
    /// # Panics
    ///
    /// Panics if `data` is empty.
    pub fn from_vec(data: Vec<T>) -> Self {
        assert!(!data.is_empty(), "ring buffer capacity must be non-zero");
        Self { data }
    }

    /// Capacity of the ring.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false; the ring has fixed non-zero capacity.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Normalizes a logical index into the storage range.
    #[inline]
    fn normalize(&self, index: usize) -> usize {
        index % self.data.len()
    }

    /// Endless iterator over the ring, wrapping from the end back to the
    /// start. Combine with `take(n)` for a bounded traversal.
    pub fn iter(&self) -> RingIter<'_, T> {
        RingIter {
            ring: self,
            index: 0,
        }
    }
}

impl<T> Index<usize> for RingBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.data[self.normalize(index)]
    }
}

impl<T> IndexMut<usize> for RingBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let slot = self.normalize(index);
        &mut self.data[slot]
    }
}

/// Endless wrapping iterator over a [`RingBuffer`].
#[derive(Debug)]
pub struct RingIter<'a, T> {
    ring: &'a RingBuffer<T>,
    index: usize,
}

impl<'a, T> Iterator for RingIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = &self.ring[self.index];
        self.index = self.index.wrapping_add(1);
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_wraps_modulo_capacity() {
        let ring = RingBuffer::from_vec(vec![10, 20, 30]);
        for i in 0..50 {
            assert_eq!(ring[i], ring[i % 3]);
        }
        assert_eq!(ring[3], 10);
        assert_eq!(ring[4], 20);
        assert_eq!(ring[3000], 10);
    }

    #[test]
    fn test_write_past_end_wraps_to_start() {
        let mut ring: RingBuffer<f64> = RingBuffer::new(4);
        for i in 0..6 {
            ring[i] = i as f64;
        }
        // Writes 4 and 5 wrapped over slots 0 and 1.
        assert_eq!(ring[0], 4.0);
        assert_eq!(ring[1], 5.0);
        assert_eq!(ring[2], 2.0);
        assert_eq!(ring[3], 3.0);
    }

    #[test]
    fn test_endless_iteration() {
        let ring = RingBuffer::from_vec(vec![1, 2]);
        let seen: Vec<i32> = ring.iter().take(5).copied().collect();
        assert_eq!(seen, vec![1, 2, 1, 2, 1]);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_zero_capacity_rejected() {
        let _: RingBuffer<f64> = RingBuffer::new(0);
    }
}
