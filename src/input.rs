//! What the simulation knows about the player's hands: a per-frame snapshot
//! of held keys/pointer/fingers, discrete press events, and the on-screen
//! touch joystick used by the Mobile control scheme.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    Space,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Active input-to-aim policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlScheme {
    /// Touch joystick to move, tap to shoot toward the tap.
    Mobile,
    /// WASD + mouse; Space shoots at the nearest enemy.
    #[default]
    Simple,
    /// WASD + mouse; arrow keys aim with snapping.
    Mixed,
    /// WASD + mouse; every shot goes where the mouse points.
    Expert,
}

impl ControlScheme {
    pub const ALL: [Self; 4] = [Self::Mobile, Self::Simple, Self::Mixed, Self::Expert];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mobile => "Mobile",
            Self::Simple => "Simple",
            Self::Mixed => "Mixed",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for ControlScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown control scheme {s:?} (expected Mobile|Simple|Mixed|Expert)"))
    }
}

// ── Per-frame snapshot ────────────────────────────────────────────────────────

/// Input state, queried once per frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSnapshot {
    held: HashSet<Key>,
    /// Pointer position in display pixels, if known.
    pub pointer: Option<Vec2>,
    /// Primary pointer button currently held.
    pub pointer_pressed: bool,
    /// Active touch points by finger id.
    pub fingers: BTreeMap<u64, Vec2>,
}

impl InputSnapshot {
    pub fn press(&mut self, key: Key) {
        self.held.insert(key);
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    /// Builder form of `press`, mostly for tests.
    pub fn with_held(mut self, key: Key) -> Self {
        self.press(key);
        self
    }

    pub fn with_pointer(mut self, position: Vec2, pressed: bool) -> Self {
        self.pointer = Some(position);
        self.pointer_pressed = pressed;
        self
    }

    fn axis(&self, neg: Key, pos: Key) -> f32 {
        let mut v = 0.0;
        if self.is_held(neg) {
            v -= 1.0;
        }
        if self.is_held(pos) {
            v += 1.0;
        }
        v
    }

    /// WASD movement, normalised. Zero when nothing (or opposing keys) is held.
    pub fn wasd_vector(&self) -> Vec2 {
        Vec2::new(self.axis(Key::A, Key::D), self.axis(Key::W, Key::S)).normalize_or_zero()
    }

    /// Arrow-key aim, normalised. Zero when nothing is held.
    pub fn arrow_vector(&self) -> Vec2 {
        Vec2::new(self.axis(Key::Left, Key::Right), self.axis(Key::Up, Key::Down))
            .normalize_or_zero()
    }
}

/// Discrete presses, delivered between frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    MouseDown { button: MouseButton, position: Vec2 },
    FingerDown { id: u64, position: Vec2 },
    FingerUp { id: u64 },
}

// ── Touch joystick ────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Joystick {
    start: Vec2,
    pub pos: Vec2,
    grab_id: Option<u64>,
    amplitude: f32,
    deadzone: f32,
}

impl Joystick {
    /// `deadzone` is a fraction of `amplitude` below which the stick reads as
    /// centred.
    pub fn new(position: Vec2, amplitude: f32, deadzone: f32) -> Self {
        Self {
            start: position,
            pos: position,
            grab_id: None,
            amplitude,
            deadzone,
        }
    }

    pub fn start(&self) -> Vec2 {
        self.start
    }

    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    pub fn is_grabbed(&self) -> bool {
        self.grab_id.is_some()
    }

    pub fn grab_id(&self) -> Option<u64> {
        self.grab_id
    }

    pub fn can_grab(&self, at: Vec2) -> bool {
        at.distance(self.start) <= self.amplitude
    }

    /// Attach to a finger. Fails when already held or out of reach.
    pub fn grab(&mut self, finger_id: u64, at: Vec2) -> bool {
        if self.is_grabbed() || !self.can_grab(at) {
            return false;
        }
        self.grab_id = Some(finger_id);
        self.pos = at;
        self.clamp_pos();
        true
    }

    pub fn stop_grab(&mut self) {
        self.pos = self.start;
        self.grab_id = None;
    }

    /// Follow the grabbing finger; let go if it disappeared.
    pub fn update(&mut self, fingers: &BTreeMap<u64, Vec2>) {
        match self.grab_id.map(|id| fingers.get(&id)) {
            Some(Some(&at)) => self.pos = at,
            Some(None) => self.stop_grab(),
            None => self.pos = self.start,
        }
        self.clamp_pos();
    }

    fn clamp_pos(&mut self) {
        let offset = (self.pos - self.start).clamp_length_max(self.amplitude);
        self.pos = self.start + offset;
    }

    /// Unit direction while pushed past the dead zone, else zero.
    pub fn vector(&self) -> Vec2 {
        if !self.is_grabbed() {
            return Vec2::ZERO;
        }
        let offset = self.pos - self.start;
        let Some(direction) = offset.try_normalize() else {
            return Vec2::ZERO;
        };
        if offset.length() > self.amplitude * self.deadzone {
            direction
        } else {
            Vec2::ZERO
        }
    }
}
