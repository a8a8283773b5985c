//! # Sample History
//!
//! Fixed-capacity rolling buffer with a simple-moving-average readout.
//!
//! The mean is deliberately not exponential: latency is bounded by exactly
//! `capacity` samples.
//!
//! ## Usage
//!
//! ```
//! use motion_relay::signal::history::SampleHistory;
//! use motion_relay::signal::math::Angles;
//!
//! let mut history = SampleHistory::new(3)?;
//! history.push(Angles::new(0.0, 50.0, 10.0));
//! history.push(Angles::new(0.0, 40.0, 20.0));
//! assert_eq!(history.mean(), Angles::new(0.0, 45.0, 15.0));
//! # Ok::<(), motion_relay::error::RelayError>(())
//! ```

use std::collections::VecDeque;

use super::math::Channel;
use crate::error::{RelayError, Result};

/// Rolling buffer of the `capacity` most recent samples of one channel.
#[derive(Debug, Clone)]
pub struct SampleHistory<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T: Channel> SampleHistory<T> {
    /// Creates an empty history.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(RelayError::InvalidConfig(
                "history capacity must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        })
    }

    /// Appends a sample, evicting the oldest one on overflow.
    ///
    /// Non-finite components are stored as `0.0`.
    pub fn push(&mut self, sample: T) {
        self.samples.push_back(sample.sanitized());
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Mean of the buffered samples, or the zero value when empty.
    #[must_use]
    pub fn mean(&self) -> T {
        if self.samples.is_empty() {
            return T::default();
        }
        let sum = self
            .samples
            .iter()
            .fold(T::default(), |acc, sample| acc + *sample);
        (sum * (1.0 / self.samples.len() as f32)).sanitized()
    }

    /// Most recently pushed sample.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.samples.back().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every buffered sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
