//! Fixed-size trailing window over `f64` observations.
//!
//! Backed by a ring buffer with a running sum. The sum is recomputed from the
//! buffer each time the write head wraps, so rounding drift is bounded by one
//! window. Variance is always two-pass over the buffered values.

use serde::{Deserialize, Serialize};

/// Standard deviation convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdDevKind {
    /// Divide by N.
    Population,
    /// Divide by N - 1.
    #[default]
    Sample,
}

impl StdDevKind {
    pub fn ddof(self) -> usize {
        match self {
            StdDevKind::Population => 0,
            StdDevKind::Sample => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RollingWindow {
    buffer: Vec<f64>,
    /// Index of the oldest value once full.
    head: usize,
    len: usize,
    sum: f64,
    nonzero: usize,
}

impl RollingWindow {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 1, "rolling window capacity must be >= 1");
        Self {
            buffer: vec![0.0; capacity],
            head: 0,
            len: 0,
            sum: 0.0,
            nonzero: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buffer.len()
    }

    /// Push a value, returning the evicted one when the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        if value != 0.0 {
            self.nonzero += 1;
        }

        if !self.is_full() {
            self.buffer[self.len] = value;
            self.len += 1;
            self.sum += value;
            return None;
        }

        let old = std::mem::replace(&mut self.buffer[self.head], value);
        if old != 0.0 {
            self.nonzero -= 1;
        }
        self.head += 1;
        if self.head == self.buffer.len() {
            self.head = 0;
            self.sum = self.buffer.iter().sum();
        } else {
            self.sum += value - old;
        }
        Some(old)
    }

    /// Every buffered value is exactly zero.
    pub fn is_all_zero(&self) -> bool {
        self.nonzero == 0
    }

    /// Mean of a full window.
    pub fn mean(&self) -> Option<f64> {
        self.is_full().then(|| self.sum / self.len as f64)
    }

    /// Standard deviation of a full window; `None` when the window is too
    /// small for the convention (a single sample value).
    pub fn std_dev(&self, kind: StdDevKind) -> Option<f64> {
        if !self.is_full() || self.len <= kind.ddof() {
            return None;
        }
        let n = self.len as f64;
        let mean = self.buffer.iter().sum::<f64>() / n;
        let squares: f64 = self.buffer.iter().map(|x| (x - mean) * (x - mean)).sum();
        Some((squares / (n - kind.ddof() as f64)).sqrt())
    }

    /// Buffered values, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let (newer, older) = self.buffer[..self.len].split_at(if self.is_full() { self.head } else { 0 });
        older.iter().chain(newer.iter()).copied()
    }
}
