//! Session tuning.
//!
//! Everything here is gameplay configuration handed to `GameSession::new`:
//! display size, pool capacities, aim-assist thresholds and the wave table.
//! Every section falls back to its defaults, so a config file only needs the
//! fields it changes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entities::ZombieKind;
use crate::error::PersistError;
use crate::geometry::Rect;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub display: DisplayConfig,
    pub pools: PoolConfig,
    pub player: PlayerTuning,
    pub aim: AimTuning,
    pub projectiles: ProjectileTuning,
    pub spitter: SpitterTuning,
    pub waves: WaveTable,
}

impl GameConfig {
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        info!(path = %path.display(), waves = config.waves.waves.len(), "config loaded");
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub width: i32,
    pub height: i32,
}

impl DisplayConfig {
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
        }
    }
}

/// Slots per pool. These must cover worst-case concurrency: running out is a
/// fatal `PoolExhausted`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub players: usize,
    pub zombies: usize,
    /// Fastest fire rate × projectile lifetime, plus room for spit.
    pub projectiles: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            players: 1,
            zombies: 64,
            projectiles: 256,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    pub base_hp: f32,
    /// Pixels per frame unit (1/60 s).
    pub speed: f32,
    /// Bonus per perk level, as a buff magnitude.
    pub perk_step: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            base_hp: 5.0,
            speed: 7.0,
            perk_step: 0.2,
        }
    }
}

/// Aim-assist and touch tuning. The angles were tuned by feel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AimTuning {
    /// Corrections smaller than this are skipped.
    pub min_snap_deg: f32,
    /// Largest correction in the Mixed scheme.
    pub mixed_snap_deg: f32,
    /// Largest correction in the Simple scheme.
    pub simple_snap_deg: f32,
    /// Fraction of the joystick amplitude that reads as centred.
    pub joystick_deadzone: f32,
    pub joystick_amplitude: f32,
    /// Seconds into a run before a held mouse button auto-fires, so the click
    /// that started the run does not shoot.
    pub mouse_hold_delay: f32,
}

impl Default for AimTuning {
    fn default() -> Self {
        Self {
            min_snap_deg: 0.8,
            mixed_snap_deg: 17.5,
            simple_snap_deg: 22.5,
            joystick_deadzone: 0.2,
            joystick_amplitude: 60.0,
            mouse_hold_delay: 0.3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Seconds before a projectile expires.
    pub ttl: f32,
    /// Total fan angle for multi-pellet weapons.
    pub shotgun_spread_deg: f32,
    /// Seconds between the rounds of a burst.
    pub burst_spacing: f32,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            ttl: 1.5,
            shotgun_spread_deg: 30.0,
            burst_spacing: 0.06,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpitterTuning {
    /// Pixels; spitters only fire inside this distance.
    pub range: f32,
    /// Spitters stop advancing inside this distance.
    pub keep_distance: f32,
    pub cooldown: f32,
    pub speed: f32,
    pub damage: f32,
}

impl Default for SpitterTuning {
    fn default() -> Self {
        Self {
            range: 320.0,
            keep_distance: 200.0,
            cooldown: 2.5,
            speed: 5.0,
            damage: 1.0,
        }
    }
}

// ── Waves ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveGroup {
    pub kind: ZombieKind,
    pub count: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    pub groups: Vec<WaveGroup>,
    /// Seconds between individual spawns.
    pub spawn_interval: f32,
}

impl WaveSpec {
    pub fn total(&self) -> u32 {
        self.groups.iter().map(|g| g.count).sum()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTable {
    pub waves: Vec<WaveSpec>,
    /// Seconds of quiet between a cleared wave and the next.
    pub wave_break: f32,
}

impl Default for WaveTable {
    fn default() -> Self {
        let waves = (1..=10u32)
            .map(|n| {
                let mut groups = vec![WaveGroup {
                    kind: ZombieKind::Walker,
                    count: 4 + n * 2,
                }];
                if n >= 2 {
                    groups.push(WaveGroup {
                        kind: ZombieKind::Runner,
                        count: n,
                    });
                }
                if n >= 4 {
                    groups.push(WaveGroup {
                        kind: ZombieKind::Spitter,
                        count: n / 2,
                    });
                }
                if n >= 6 {
                    groups.push(WaveGroup {
                        kind: ZombieKind::Brute,
                        count: n - 5,
                    });
                }
                WaveSpec {
                    groups,
                    spawn_interval: (1.2 - n as f32 * 0.08).max(0.35),
                }
            })
            .collect();
        Self {
            waves,
            wave_break: 3.0,
        }
    }
}
