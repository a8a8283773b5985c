//! # Simulation Fallback
//!
//! Produces [`GameInput`] from keyboard, pointer and button events when no
//! live sensor is available.
//!
//! Held keys set a target for each axis; every tick moves the live value a
//! fixed fraction (`blend_rate`) toward its target, a first-order low-pass
//! that avoids input snap. Button pulses go through the same [`PulseGate`]
//! cooldowns as live sensor pulses.
//!
//! ## Key Mapping
//!
//! | Key | Target |
//! |-----|--------|
//! | `Left` / `Right` | `x = -1 / +1` |
//! | `Up` / `Down` | `y = -1 / +1` (flipped with `invert_y`) |
//! | `Accelerate` | `speed = 1` |
//! | `Brake` | `brake = 1` |
//!
//! Opposite keys held together cancel out. A pointer position, when set,
//! overrides the directional keys for `x`/`y`.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use super::game_input::GameInput;
use super::profile::{MappingProfile, TriggerSpec};
use super::pulse::PulseGate;
use crate::error::{RelayError, Result};
use crate::signal::math::{approach, clamp};

/// Cooldown used for buttons the mapping profile has no trigger for.
pub const DEFAULT_BUTTON_COOLDOWN: Duration = Duration::from_millis(250);

/// Held keys driving the continuous axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimKey {
    Up,
    Down,
    Left,
    Right,
    Accelerate,
    Brake,
}

/// Buttons producing pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimButton {
    Jump,
    Shoot,
    Action,
}

/// Tuning for the simulation source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Fraction of the remaining distance covered per tick (0.0 exclusive to 1.0).
    pub blend_rate: f32,
    /// Makes `Up` produce `y = +1`.
    pub invert_y: bool,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            blend_rate: 0.15,
            invert_y: false,
        }
    }
}

/// Button request waiting for the next tick, paired with its cooldown.
#[derive(Debug, Clone)]
struct ButtonSlot {
    gate: PulseGate,
    requested: bool,
}

impl ButtonSlot {
    fn new(cooldown: Duration) -> Self {
        Self {
            gate: PulseGate::new(cooldown),
            requested: false,
        }
    }

    fn take(&mut self, now: Instant) -> bool {
        let fired = self.gate.poll(self.requested, now);
        self.requested = false;
        fired
    }
}

/// Keyboard/pointer driven input source.
#[derive(Debug, Clone)]
pub struct SimulationFallback {
    settings: SimulationSettings,
    held: HashSet<SimKey>,
    pointer: Option<(f32, f32)>,
    current: GameInput,
    jump: ButtonSlot,
    shoot: ButtonSlot,
    action: ButtonSlot,
}

impl SimulationFallback {
    /// Creates a fallback whose button cooldowns mirror the profile's triggers.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::InvalidConfig`] if `blend_rate` is outside `(0, 1]`.
    pub fn new(settings: SimulationSettings, profile: &MappingProfile) -> Result<Self> {
        if !settings.blend_rate.is_finite() || settings.blend_rate <= 0.0 || settings.blend_rate > 1.0 {
            return Err(RelayError::InvalidConfig(
                "blend_rate must be between 0.0 (exclusive) and 1.0".to_string(),
            ));
        }

        let cooldown = |trigger: Option<TriggerSpec>| {
            trigger.map_or(DEFAULT_BUTTON_COOLDOWN, |t| t.cooldown())
        };

        Ok(Self {
            settings,
            held: HashSet::new(),
            pointer: None,
            current: GameInput::default(),
            jump: ButtonSlot::new(cooldown(profile.jump)),
            shoot: ButtonSlot::new(cooldown(profile.shoot)),
            action: ButtonSlot::new(cooldown(profile.action)),
        })
    }

    pub fn press(&mut self, key: SimKey) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: SimKey) {
        self.held.remove(&key);
    }

    /// Releases every key and clears the pointer.
    pub fn release_all(&mut self) {
        self.held.clear();
        self.pointer = None;
    }

    /// Requests a pulse on the next tick (subject to cooldown).
    pub fn trigger(&mut self, button: SimButton) {
        match button {
            SimButton::Jump => self.jump.requested = true,
            SimButton::Shoot => self.shoot.requested = true,
            SimButton::Action => self.action.requested = true,
        }
    }

    /// Sets a normalized pointer position, or `None` to return to the keys.
    pub fn set_pointer(&mut self, position: Option<(f32, f32)>) {
        self.pointer = position.map(|(x, y)| (clamp(x, -1.0, 1.0), clamp(y, -1.0, 1.0)));
    }

    /// Continues blending from `input` so switching sources does not snap.
    /// Button requests made before the switch are dropped.
    pub fn resume_from(&mut self, input: &GameInput) {
        self.current = input.without_pulses().clamped();
        for slot in [&mut self.jump, &mut self.shoot, &mut self.action] {
            slot.requested = false;
        }
    }

    /// Last value produced by [`tick`](Self::tick), without pulses.
    #[must_use]
    pub fn current(&self) -> GameInput {
        self.current
    }

    /// Target each continuous axis is blending toward.
    #[must_use]
    pub fn target(&self) -> GameInput {
        let held = |key: SimKey| -> f32 { if self.held.contains(&key) { 1.0 } else { 0.0 } };

        let (x, y) = match self.pointer {
            Some(position) => position,
            None => {
                let y = held(SimKey::Down) - held(SimKey::Up);
                let y = if self.settings.invert_y { -y } else { y };
                (held(SimKey::Right) - held(SimKey::Left), y)
            }
        };

        GameInput {
            x,
            y,
            brake: held(SimKey::Brake),
            speed: held(SimKey::Accelerate),
            ..GameInput::default()
        }
    }

    /// Advances one tick and returns the new input.
    pub fn tick(&mut self, now: Instant) -> GameInput {
        let target = self.target();
        let rate = self.settings.blend_rate;

        self.current = GameInput {
            x: approach(self.current.x, target.x, rate),
            y: approach(self.current.y, target.y, rate),
            brake: approach(self.current.brake, target.brake, rate),
            speed: approach(self.current.speed, target.speed, rate),
            ..GameInput::default()
        }
        .clamped();

        GameInput {
            jump: self.jump.take(now),
            shoot: self.shoot.take(now),
            action: self.action.take(now),
            ..self.current
        }
    }
}
