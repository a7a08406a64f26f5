//! # Frame Memory
//!
//! Byte-addressable memory, grown on demand in 32-byte words. Expansion cost
//! is the delta of the quadratic polynomial between the old and new word
//! counts, and is always charged before the buffer grows.

use crate::errors::VmError;
use crate::gas::costs;

/// Word size in bytes.
pub const WORD_SIZE: usize = 32;

/// Growable frame memory.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

/// Quadratic memory cost at a given word count: `3·w + w²/512`.
#[must_use]
pub fn memory_cost(words: u64) -> u64 {
    let words = u128::from(words);
    let cost = u128::from(costs::MEMORY_WORD) * words + words * words / 512;
    u64::try_from(cost).unwrap_or(u64::MAX)
}

/// Cost of growing from `old_words` to `new_words`.
#[must_use]
pub fn expansion_cost(old_words: u64, new_words: u64) -> u64 {
    if new_words <= old_words {
        0
    } else {
        memory_cost(new_words) - memory_cost(old_words)
    }
}

impl Memory {
    /// Creates an empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes (always word-aligned).
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been touched yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current size in words.
    #[must_use]
    pub fn words(&self) -> u64 {
        (self.data.len() as u64).div_ceil(WORD_SIZE as u64)
    }

    /// Gas needed to make `[offset, offset + size)` addressable, without
    /// growing anything. Zero-size spans never cost.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` when the span passes `max_size`.
    pub fn growth_cost(
        &self,
        offset: usize,
        size: usize,
        max_size: usize,
    ) -> Result<u64, VmError> {
        if size == 0 {
            return Ok(0);
        }
        let end = offset
            .checked_add(size)
            .ok_or(VmError::MemoryLimitExceeded {
                requested: usize::MAX,
                max: max_size,
            })?;
        if end > max_size {
            return Err(VmError::MemoryLimitExceeded {
                requested: end,
                max: max_size,
            });
        }
        let new_words = (end as u64).div_ceil(WORD_SIZE as u64);
        Ok(expansion_cost(self.words(), new_words))
    }

    /// Grows the buffer so `[offset, offset + size)` is addressable. Call
    /// only after the matching `growth_cost` has been charged.
    pub fn grow(&mut self, offset: usize, size: usize) {
        if size == 0 {
            return;
        }
        let end = offset.saturating_add(size);
        if end > self.data.len() {
            let aligned = end.div_ceil(WORD_SIZE) * WORD_SIZE;
            self.data.resize(aligned, 0);
        }
    }

    /// Reads a 32-byte word; out-of-range bytes read as zero.
    #[must_use]
    pub fn read_word(&self, offset: usize) -> [u8; 32] {
        let mut word = [0u8; 32];
        for (i, byte) in word.iter_mut().enumerate() {
            if let Some(&b) = self.data.get(offset.saturating_add(i)) {
                *byte = b;
            }
        }
        word
    }

    /// Copies `size` bytes out of memory; out-of-range bytes read as zero.
    #[must_use]
    pub fn read_bytes(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut out = vec![0u8; size];
        for (i, byte) in out.iter_mut().enumerate() {
            if let Some(&b) = self.data.get(offset.saturating_add(i)) {
                *byte = b;
            }
        }
        out
    }

    /// Writes a single byte. The span must already be grown.
    pub fn write_byte(&mut self, offset: usize, value: u8) {
        self.grow(offset, 1);
        self.data[offset] = value;
    }

    /// Writes a 32-byte word. The span must already be grown.
    pub fn write_word(&mut self, offset: usize, word: &[u8; 32]) {
        self.grow(offset, WORD_SIZE);
        self.data[offset..offset + WORD_SIZE].copy_from_slice(word);
    }

    /// Writes a byte slice. The span must already be grown.
    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.grow(offset, bytes.len());
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// MCOPY: moves `size` bytes from `src` to `dest`, handling overlap.
    pub fn copy_within(&mut self, dest: usize, src: usize, size: usize) {
        if size == 0 {
            return;
        }
        let end = dest.max(src).saturating_add(size);
        self.grow(0, end);
        self.data.copy_within(src..src + size, dest);
    }
}

// =============================================================================
// TESTS
// =============================================================================
