//! The closed set of weapons and how each one turns a trigger pull into
//! projectiles.

use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::audio::{shot_cue, SoundSink};
use crate::config::ProjectileTuning;
use crate::entities::{Hostility, Projectile, ProjectileSpawn, SpriteId};
use crate::error::GameError;
use crate::pool::Pool;
use crate::stats::{FireMode, StatSheet, WeaponStat, WeaponStats};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponKind {
    #[default]
    Pistol,
    Rifle,
    Shotgun,
    Piercer,
}

impl WeaponKind {
    pub const ALL: [Self; 4] = [Self::Pistol, Self::Rifle, Self::Shotgun, Self::Piercer];

    pub fn name(self) -> &'static str {
        match self {
            Self::Pistol => "Pistol",
            Self::Rifle => "Rifle",
            Self::Shotgun => "Shotgun",
            Self::Piercer => "Piercer",
        }
    }

    /// Unbuffed stats for a freshly equipped weapon.
    pub fn base_stats(self) -> WeaponStats {
        use WeaponStat::*;
        match self {
            Self::Pistol => WeaponStats::new(
                StatSheet::new(&[(Damage, 5.0), (Firerate, 3.0), (ProjectileSpeed, 12.0), (Pellets, 1.0)]),
                FireMode::Manual,
                false,
            ),
            Self::Rifle => WeaponStats::new(
                StatSheet::new(&[(Damage, 2.0), (Firerate, 8.0), (ProjectileSpeed, 14.0), (Pellets, 1.0)]),
                FireMode::Automatic,
                false,
            ),
            Self::Shotgun => WeaponStats::new(
                StatSheet::new(&[(Damage, 2.0), (Firerate, 1.2), (ProjectileSpeed, 11.0), (Pellets, 5.0)]),
                FireMode::Manual,
                false,
            ),
            Self::Piercer => WeaponStats::new(
                StatSheet::new(&[(Damage, 4.0), (Firerate, 1.5), (ProjectileSpeed, 16.0), (Pellets, 1.0)]),
                FireMode::Burst(2),
                true,
            ),
        }
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeaponKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GameError::UnknownEquipment { name: s.to_string() })
    }
}

// ── Weapon instance ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub stats: WeaponStats,
    /// Seconds until the next trigger pull is accepted. Goes negative by the
    /// overshoot of the tick that cleared it.
    cooldown: f32,
    burst_left: u8,
    burst_timer: f32,
    burst_direction: Vec2,
}

impl Weapon {
    pub fn new(kind: WeaponKind) -> Self {
        Self {
            kind,
            stats: kind.base_stats(),
            cooldown: 0.0,
            burst_left: 0,
            burst_timer: 0.0,
            burst_direction: Vec2::ZERO,
        }
    }

    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Make the next trigger pull fire immediately.
    pub fn ready_shot_cooldown(&mut self) {
        self.cooldown = 0.0;
        self.burst_left = 0;
        self.burst_timer = 0.0;
    }

    pub fn can_shoot(&self) -> bool {
        self.cooldown <= 0.0 && self.burst_left == 0
    }

    pub fn is_automatic(&self) -> bool {
        self.stats.fire_mode == FireMode::Automatic
    }

    /// Pull the trigger. Returns `Ok(false)` while cooling down, or when the
    /// direction is degenerate.
    pub fn shoot<S: SoundSink + ?Sized>(
        &mut self,
        origin: Vec2,
        direction: Vec2,
        projectiles: &mut Pool<Projectile>,
        tuning: &ProjectileTuning,
        sounds: &mut S,
    ) -> Result<bool, GameError> {
        if !self.can_shoot() {
            return Ok(false);
        }
        let Some(direction) = direction.try_normalize() else {
            return Ok(false);
        };
        self.fire(origin, direction, projectiles, tuning)?;
        sounds.play_sfx(shot_cue(self.stats.fire_interval()));
        // Overshoot carries into the next interval so the rate holds at any frame rate
        self.cooldown = (self.cooldown + self.stats.fire_interval()).max(f32::MIN_POSITIVE);

        if let FireMode::Burst(rounds) = self.stats.fire_mode {
            self.burst_left = rounds.saturating_sub(1);
            self.burst_timer = tuning.burst_spacing;
            self.burst_direction = direction;
        }
        debug!(weapon = %self.kind, x = origin.x, y = origin.y, "shot fired");
        Ok(true)
    }

    /// Tick the cooldown and fire any pending burst rounds from `origin`.
    /// Returns the number of follow-up rounds fired.
    pub fn update<S: SoundSink + ?Sized>(
        &mut self,
        secs: f32,
        origin: Vec2,
        projectiles: &mut Pool<Projectile>,
        tuning: &ProjectileTuning,
        sounds: &mut S,
    ) -> Result<u32, GameError> {
        if self.cooldown > 0.0 {
            self.cooldown -= secs;
        }
        let mut fired = 0;
        if self.burst_left == 0 {
            return Ok(fired);
        }
        self.burst_timer -= secs;
        while self.burst_left > 0 && self.burst_timer <= 0.0 {
            self.fire(origin, self.burst_direction, projectiles, tuning)?;
            sounds.play_sfx(shot_cue(self.stats.fire_interval()));
            self.burst_left -= 1;
            self.burst_timer += tuning.burst_spacing.max(f32::EPSILON);
            fired += 1;
        }
        Ok(fired)
    }

    fn fire(
        &self,
        origin: Vec2,
        direction: Vec2,
        projectiles: &mut Pool<Projectile>,
        tuning: &ProjectileTuning,
    ) -> Result<(), GameError> {
        match self.kind {
            WeaponKind::Pistol | WeaponKind::Rifle | WeaponKind::Piercer => {
                projectiles.spawn(self.projectile(origin, direction, tuning))?;
            }
            WeaponKind::Shotgun => {
                let pellets = self.stats.pellet_count();
                if pellets == 1 {
                    projectiles.spawn(self.projectile(origin, direction, tuning))?;
                    return Ok(());
                }
                let spread = tuning.shotgun_spread_deg.to_radians();
                let step = spread / (pellets - 1) as f32;
                for i in 0..pellets {
                    let angle = -spread / 2.0 + step * i as f32;
                    let pellet = Vec2::from_angle(angle).rotate(direction);
                    projectiles.spawn(self.projectile(origin, pellet, tuning))?;
                }
            }
        }
        Ok(())
    }

    fn projectile(&self, origin: Vec2, direction: Vec2, tuning: &ProjectileTuning) -> ProjectileSpawn {
        ProjectileSpawn {
            position: origin,
            direction,
            speed: self.stats.projectile_speed(),
            damage: self.stats.damage(),
            hostility: Hostility::Friendly,
            piercing: self.stats.piercing,
            ttl: tuning.ttl,
            sprite: SpriteId::Bullet,
        }
    }
}
