//! Armor: a secondary health pool that soaks part of each hit and
//! regenerates after a quiet period.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GameError;
use crate::stats::{ArmorStat, ArmorStats, Buff, BuffKind, StatSheet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ArmorKind {
    Light,
    Balanced,
    Heavy,
    /// Hardens under fire: every hit adds a temporary resistance stack.
    Adaptative,
}

/// Resistance added per hit by `Adaptative` armor.
pub const ADAPTIVE_STEP: f32 = 0.05;
pub const ADAPTIVE_MAX_STACKS: usize = 5;

impl ArmorKind {
    pub const ALL: [Self; 4] = [Self::Light, Self::Balanced, Self::Heavy, Self::Adaptative];

    pub fn name(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Balanced => "Balanced",
            Self::Heavy => "Heavy",
            Self::Adaptative => "Adaptative",
        }
    }

    pub fn base_stats(self) -> ArmorStats {
        use ArmorStat::*;
        // (health, resistance, regen cooldown, regen rate, speed penalty)
        let (health, resistance, cooldown, rate, penalty) = match self {
            Self::Light => (2.0, 0.5, 2.0, 1.0, 0.95),
            Self::Balanced => (3.0, 0.6, 3.0, 1.0, 0.9),
            Self::Heavy => (5.0, 0.75, 4.0, 0.75, 0.8),
            Self::Adaptative => (3.0, 0.7, 1.5, 1.5, 0.9),
        };
        ArmorStats::new(StatSheet::new(&[
            (MaxHealth, health),
            (Resistance, resistance),
            (RegenCooldown, cooldown),
            (RegenRate, rate),
            (SpeedPenalty, penalty),
        ]))
    }
}

impl fmt::Display for ArmorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ArmorKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GameError::UnknownEquipment { name: s.to_string() })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Armor {
    pub kind: ArmorKind,
    pub stats: ArmorStats,
    /// Seconds since the last hit.
    since_hit: f32,
}

impl Armor {
    pub fn new(kind: ArmorKind) -> Self {
        Self::with_stats(kind, kind.base_stats())
    }

    /// Armor with a custom stat block, e.g. for tuning experiments.
    pub fn with_stats(kind: ArmorKind, stats: ArmorStats) -> Self {
        Self {
            kind,
            stats,
            since_hit: 0.0,
        }
    }

    pub fn since_hit(&self) -> f32 {
        self.since_hit
    }

    pub fn speed_pen(&self) -> f32 {
        self.stats.speed_penalty()
    }

    /// Soak up to `resistance × damage` from armor health and return what
    /// passes through to the wearer.
    pub fn take_damage(&mut self, damage: f32) -> f32 {
        let absorbed = (self.stats.resistance() * damage).min(self.stats.health).max(0.0);
        self.stats.health -= absorbed;
        self.since_hit = 0.0;

        if self.kind == ArmorKind::Adaptative {
            let stacks = self
                .stats
                .sheet()
                .buffs()
                .iter()
                .filter(|b| b.stat == ArmorStat::Resistance && b.kind == BuffKind::Temporary)
                .count();
            if stacks < ADAPTIVE_MAX_STACKS {
                self.stats.apply_temp_buff(ArmorStat::Resistance, ADAPTIVE_STEP);
            }
        }
        debug!(armor = %self.kind, absorbed, health = self.stats.health, "armor hit");
        damage - absorbed
    }

    /// Regenerate once the cooldown has passed without a hit. Temporary buffs
    /// are dropped when the armor is back to full.
    pub fn update(&mut self, secs: f32) {
        self.since_hit += secs;
        if self.since_hit < self.stats.regen_cooldown() {
            return;
        }
        let max = self.stats.max_health();
        if self.stats.health < max {
            self.stats.health = (self.stats.health + self.stats.regen_rate() * secs).min(max);
            if self.stats.health >= max {
                self.stats.reset();
            }
        }
    }

    /// Armor health as a fraction of its maximum.
    pub fn fraction(&self) -> f32 {
        let max = self.stats.max_health();
        if max > 0.0 {
            (self.stats.health / max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn remove_buff(&mut self, buff: &Buff<ArmorStat>) -> bool {
        self.stats.remove_buff(buff)
    }
}
