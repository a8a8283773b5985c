//! # Pulse Gate
//!
//! Turns a level condition ("magnitude above threshold", "button requested")
//! into a debounced pulse: it fires at most once per cooldown window,
//! measured from the previous firing.
//!
//! Shared by the live mapper and the simulation fallback so both input
//! sources debounce identically.

use std::time::{Duration, Instant};

/// Cooldown-gated edge trigger.
///
/// # Examples
///
/// ```
/// use std::time::{Duration, Instant};
/// use motion_relay::input::PulseGate;
///
/// let mut gate = PulseGate::new(Duration::from_millis(500));
/// let t0 = Instant::now();
///
/// assert!(gate.poll(true, t0));
/// assert!(!gate.poll(true, t0 + Duration::from_millis(100)));
/// assert!(gate.poll(true, t0 + Duration::from_millis(500)));
/// ```
#[derive(Debug, Clone)]
pub struct PulseGate {
    cooldown: Duration,
    last_fired: Option<Instant>,
}

impl PulseGate {
    #[must_use]
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: None,
        }
    }

    /// Returns `true` when `condition` holds and the cooldown has elapsed.
    ///
    /// Firing restarts the cooldown window.
    pub fn poll(&mut self, condition: bool, now: Instant) -> bool {
        if !condition || self.cooling_down(now) {
            return false;
        }
        self.last_fired = Some(now);
        true
    }

    /// Returns `true` while inside the cooldown window of the last firing.
    #[must_use]
    pub fn cooling_down(&self, now: Instant) -> bool {
        match self.last_fired {
            Some(fired) => now.saturating_duration_since(fired) < self.cooldown,
            None => false,
        }
    }

    #[must_use]
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Forgets the last firing.
    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}
