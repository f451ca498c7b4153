//! Stat blocks with layered buffs.
//!
//! effective = base × (1 + Σ permanent) × (1 + Σ temporary)
//!
//! Buffs of the same kind add; the two kinds multiply. Effective values are
//! cached and recomputed on every mutation, so reads are plain lookups.

use std::fmt;

// ── Buffs ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuffKind {
    /// Survives until `full_reset` (meta-progression perks).
    Permanent,
    /// Cleared by `reset` at run/encounter boundaries.
    Temporary,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Buff<S> {
    pub stat: S,
    pub kind: BuffKind,
    /// Fractional bonus: `0.2` is +20 %.
    pub magnitude: f32,
}

impl<S> Buff<S> {
    pub fn permanent(stat: S, magnitude: f32) -> Self {
        Self {
            stat,
            kind: BuffKind::Permanent,
            magnitude,
        }
    }

    pub fn temporary(stat: S, magnitude: f32) -> Self {
        Self {
            stat,
            kind: BuffKind::Temporary,
            magnitude,
        }
    }
}

/// A closed set of stat names usable as an index into a sheet.
pub trait StatKey: Copy + Eq + fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn index(self) -> usize;
}

// ── Generic sheet ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct StatSheet<S: StatKey> {
    base: Vec<f32>,
    effective: Vec<f32>,
    buffs: Vec<Buff<S>>,
}

impl<S: StatKey> StatSheet<S> {
    /// Stats missing from `base` start at zero.
    pub fn new(base: &[(S, f32)]) -> Self {
        let mut values = vec![0.0; S::ALL.len()];
        for &(stat, value) in base {
            values[stat.index()] = value;
        }
        Self {
            effective: values.clone(),
            base: values,
            buffs: Vec::new(),
        }
    }

    pub fn base(&self, stat: S) -> f32 {
        self.base[stat.index()]
    }

    pub fn get(&self, stat: S) -> f32 {
        self.effective[stat.index()]
    }

    pub fn buffs(&self) -> &[Buff<S>] {
        &self.buffs
    }

    /// `(1 + Σ permanent) × (1 + Σ temporary)` for one stat.
    pub fn multiplier(&self, stat: S) -> f32 {
        let (perm, temp) = self
            .buffs
            .iter()
            .filter(|b| b.stat == stat)
            .fold((0.0, 0.0), |(p, t), b| match b.kind {
                BuffKind::Permanent => (p + b.magnitude, t),
                BuffKind::Temporary => (p, t + b.magnitude),
            });
        (1.0 + perm) * (1.0 + temp)
    }

    pub fn apply(&mut self, buff: Buff<S>) {
        self.buffs.push(buff);
        self.recompute();
    }

    pub fn apply_perma_buff(&mut self, stat: S, magnitude: f32) {
        self.apply(Buff::permanent(stat, magnitude));
    }

    pub fn apply_temp_buff(&mut self, stat: S, magnitude: f32) {
        self.apply(Buff::temporary(stat, magnitude));
    }

    /// Remove the first buff equal to `buff`. Returns whether one was found.
    pub fn remove_buff(&mut self, buff: &Buff<S>) -> bool {
        let Some(pos) = self.buffs.iter().position(|b| b == buff) else {
            return false;
        };
        self.buffs.remove(pos);
        self.recompute();
        true
    }

    /// Drop temporary buffs only.
    pub fn reset(&mut self) {
        self.buffs.retain(|b| b.kind == BuffKind::Permanent);
        self.recompute();
    }

    /// Drop every buff and restore base values.
    pub fn full_reset(&mut self) {
        self.buffs.clear();
        self.recompute();
    }

    fn recompute(&mut self) {
        for &stat in S::ALL {
            self.effective[stat.index()] = self.base[stat.index()] * self.multiplier(stat);
        }
    }
}

// ── Weapon stats ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeaponStat {
    Damage,
    /// Shots per second.
    Firerate,
    /// Pixels per frame unit.
    ProjectileSpeed,
    Pellets,
}

impl StatKey for WeaponStat {
    const ALL: &'static [Self] = &[
        Self::Damage,
        Self::Firerate,
        Self::ProjectileSpeed,
        Self::Pellets,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FireMode {
    /// One shot per trigger press.
    Manual,
    /// Fires whenever the trigger is held and the cooldown is over.
    Automatic,
    /// One press fires this many rounds in quick succession.
    Burst(u8),
}

#[derive(Clone, Debug, PartialEq)]
pub struct WeaponStats {
    sheet: StatSheet<WeaponStat>,
    pub fire_mode: FireMode,
    pub piercing: bool,
}

impl WeaponStats {
    pub fn new(sheet: StatSheet<WeaponStat>, fire_mode: FireMode, piercing: bool) -> Self {
        Self {
            sheet,
            fire_mode,
            piercing,
        }
    }

    pub fn sheet(&self) -> &StatSheet<WeaponStat> {
        &self.sheet
    }

    pub fn damage(&self) -> f32 {
        self.sheet.get(WeaponStat::Damage)
    }

    pub fn firerate(&self) -> f32 {
        self.sheet.get(WeaponStat::Firerate)
    }

    /// Seconds between shots. A non-positive firerate never fires.
    pub fn fire_interval(&self) -> f32 {
        let rate = self.firerate();
        if rate > 0.0 {
            1.0 / rate
        } else {
            f32::INFINITY
        }
    }

    pub fn projectile_speed(&self) -> f32 {
        self.sheet.get(WeaponStat::ProjectileSpeed)
    }

    pub fn pellet_count(&self) -> u32 {
        self.sheet.get(WeaponStat::Pellets).round().max(1.0) as u32
    }

    pub fn apply_perma_buff(&mut self, stat: WeaponStat, magnitude: f32) {
        self.sheet.apply_perma_buff(stat, magnitude);
    }

    pub fn apply_temp_buff(&mut self, stat: WeaponStat, magnitude: f32) {
        self.sheet.apply_temp_buff(stat, magnitude);
    }

    pub fn remove_buff(&mut self, buff: &Buff<WeaponStat>) -> bool {
        self.sheet.remove_buff(buff)
    }

    pub fn reset(&mut self) {
        self.sheet.reset();
    }

    pub fn full_reset(&mut self) {
        self.sheet.full_reset();
    }
}

// ── Armor stats ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArmorStat {
    MaxHealth,
    /// Fraction of each hit the armor tries to absorb.
    Resistance,
    /// Seconds without damage before regeneration starts.
    RegenCooldown,
    /// Armor health per second while regenerating.
    RegenRate,
    /// Multiplier on the wearer's movement speed.
    SpeedPenalty,
}

impl StatKey for ArmorStat {
    const ALL: &'static [Self] = &[
        Self::MaxHealth,
        Self::Resistance,
        Self::RegenCooldown,
        Self::RegenRate,
        Self::SpeedPenalty,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArmorStats {
    sheet: StatSheet<ArmorStat>,
    /// Current armor health; never above `max_health()`.
    pub health: f32,
}

impl ArmorStats {
    pub fn new(sheet: StatSheet<ArmorStat>) -> Self {
        let health = sheet.get(ArmorStat::MaxHealth);
        Self { sheet, health }
    }

    pub fn sheet(&self) -> &StatSheet<ArmorStat> {
        &self.sheet
    }

    pub fn max_health(&self) -> f32 {
        self.sheet.get(ArmorStat::MaxHealth)
    }

    pub fn resistance(&self) -> f32 {
        self.sheet.get(ArmorStat::Resistance).clamp(0.0, 1.0)
    }

    pub fn regen_cooldown(&self) -> f32 {
        self.sheet.get(ArmorStat::RegenCooldown)
    }

    pub fn regen_rate(&self) -> f32 {
        self.sheet.get(ArmorStat::RegenRate)
    }

    pub fn speed_penalty(&self) -> f32 {
        self.sheet.get(ArmorStat::SpeedPenalty)
    }

    pub fn apply_perma_buff(&mut self, stat: ArmorStat, magnitude: f32) {
        self.sheet.apply_perma_buff(stat, magnitude);
        self.clamp_health();
    }

    pub fn apply_temp_buff(&mut self, stat: ArmorStat, magnitude: f32) {
        self.sheet.apply_temp_buff(stat, magnitude);
        self.clamp_health();
    }

    pub fn remove_buff(&mut self, buff: &Buff<ArmorStat>) -> bool {
        let removed = self.sheet.remove_buff(buff);
        self.clamp_health();
        removed
    }

    pub fn reset(&mut self) {
        self.sheet.reset();
        self.clamp_health();
    }

    /// Drop every buff and refill armor health.
    pub fn full_reset(&mut self) {
        self.sheet.full_reset();
        self.health = self.max_health();
    }

    /// Fill armor health to the current maximum.
    pub fn refill(&mut self) {
        self.health = self.max_health();
    }

    fn clamp_health(&mut self) {
        self.health = self.health.min(self.max_health());
    }
}
