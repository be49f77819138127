//! Closure Window Implementation

use crate::{WindowError, WindowStats};

/// Default window capacity (1800 frames = ~60s at 30fps)
pub const DEFAULT_CAPACITY: usize = 1800;

/// Fixed-capacity FIFO of eye-closed flags
///
/// Invariant: `closed_count` equals the number of `true` entries retained.
#[derive(Debug, Clone)]
pub struct ClosureWindow {
    /// Pre-allocated storage
    storage: Box<[bool]>,
    /// Next write position
    head: usize,
    /// Number of retained entries
    len: usize,
    /// Retained entries that are `true`
    closed_count: usize,
}

impl ClosureWindow {
    /// Create a new window with given capacity
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }
        Ok(Self::allocate(capacity))
    }

    /// Create a window with default capacity (1800 frames)
    pub fn with_default_capacity() -> Self {
        Self::allocate(DEFAULT_CAPACITY)
    }

    // capacity must be non-zero
    fn allocate(capacity: usize) -> Self {
        Self {
            storage: vec![false; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            closed_count: 0,
        }
    }

    /// Append a flag, evicting the oldest when full. Returns the evicted flag.
    pub fn push(&mut self, is_closed: bool) -> Option<bool> {
        let evicted = if self.len == self.capacity() {
            // head points at the oldest entry once the window has wrapped
            let old = self.storage[self.head];
            if old {
                self.closed_count -= 1;
            }
            Some(old)
        } else {
            self.len += 1;
            None
        };

        self.storage[self.head] = is_closed;
        if is_closed {
            self.closed_count += 1;
        }
        self.head = (self.head + 1) % self.capacity();

        evicted
    }

    /// Percentage of retained frames flagged closed (0 when empty)
    pub fn perclos(&self) -> f64 {
        if self.len == 0 {
            return 0.0;
        }
        100.0 * self.closed_count as f64 / self.len as f64
    }

    /// Retained frames flagged closed
    pub fn closed_count(&self) -> usize {
        self.closed_count
    }

    /// Number of retained frames
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Retained flags, oldest first
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        let capacity = self.capacity();
        let tail = (self.head + capacity - self.len) % capacity;
        (0..self.len).map(move |i| self.storage[(tail + i) % capacity])
    }

    pub fn stats(&self) -> WindowStats {
        WindowStats {
            len: self.len,
            closed_count: self.closed_count,
            perclos: self.perclos(),
        }
    }

    /// Drop every retained flag
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.closed_count = 0;
    }
}

impl Default for ClosureWindow {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
