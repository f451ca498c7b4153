/// Combat entity types and their pooled lifecycle hooks. Behaviour lives in
/// `compute`; this module only holds the data and its sentinels.
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::armor::Armor;
use crate::geometry::{Mask, Rect};
use crate::input::Joystick;
use crate::pool::{EntityId, Pooled};
use crate::weapons::Weapon;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hostility {
    /// Fired by the player; hurts zombies.
    #[default]
    Friendly,
    /// Fired by zombies; hurts the player.
    Hostile,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunState {
    #[default]
    NotStarted,
    Running,
    Paused,
    Won,
    Lost,
}

impl RunState {
    pub fn is_over(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

// ── Sprites ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SpriteId {
    #[default]
    Player,
    Walker,
    Runner,
    Brute,
    Spitter,
    Bullet,
    Spit,
}

impl SpriteId {
    pub const ALL: [Self; 7] = [
        Self::Player,
        Self::Walker,
        Self::Runner,
        Self::Brute,
        Self::Spitter,
        Self::Bullet,
        Self::Spit,
    ];

    /// Pixel size of the sprite's image and mask.
    pub fn size(self) -> (i32, i32) {
        match self {
            Self::Player => (32, 32),
            Self::Walker | Self::Spitter => (28, 28),
            Self::Runner => (24, 24),
            Self::Brute => (40, 40),
            Self::Bullet => (8, 8),
            Self::Spit => (10, 10),
        }
    }
}

/// Collision masks for every sprite, built once per session.
#[derive(Clone, Debug)]
pub struct SpriteBank {
    masks: Vec<Mask>,
}

impl SpriteBank {
    pub fn new() -> Self {
        let masks = SpriteId::ALL
            .into_iter()
            .map(|sprite| match sprite {
                SpriteId::Bullet => {
                    let (w, h) = sprite.size();
                    Mask::filled(w, h)
                }
                other => Mask::circle(other.size().0 / 2),
            })
            .collect();
        Self { masks }
    }

    pub fn mask(&self, sprite: SpriteId) -> &Mask {
        &self.masks[sprite as usize]
    }
}

impl Default for SpriteBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Where drawn entities end up. The terminal front end implements this; tests
/// can record the calls.
pub trait Surface {
    fn blit(&mut self, sprite: SpriteId, rect: Rect);
}

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillCause {
    /// The zombie ran into the player and was used up.
    Contact,
    Projectile,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CombatEvent {
    ZombieKilled { kind: ZombieKind, cause: KillCause },
    PlayerHit { damage: f32, hp_left: f32 },
    PlayerDied,
}

// ── Player ────────────────────────────────────────────────────────────────────

/// Full width of a healthbar, in pixels.
pub const HEALTHBAR_WIDTH: f32 = 150.0;

/// Bar width for a fill fraction.
pub fn healthbar_width(fraction: f32, full: f32) -> f32 {
    full * fraction.clamp(0.0, 1.0)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Player {
    pub position: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// Base speed before the armor penalty.
    pub speed: f32,
    pub weapon: Option<Weapon>,
    pub armor: Option<Armor>,
    /// Movement direction from the last frame.
    pub current_direction: Vec2,
    /// Falls back here when an aim input is degenerate.
    pub last_shot_direction: Vec2,
    pub joystick: Option<Joystick>,
    /// Touch ids in press order, excluding the joystick finger.
    pub finger_stack: Vec<u64>,
    pub hp_bar: f32,
    pub armor_bar: f32,
}

pub struct PlayerSpawn {
    pub position: Vec2,
    pub weapon: Option<Weapon>,
    pub armor: Option<Armor>,
    pub max_hp: f32,
    pub speed: f32,
    pub joystick: Option<Joystick>,
}

impl Pooled for Player {
    const POOL_NAME: &'static str = "player";
    type Spawn = PlayerSpawn;

    fn on_spawn(&mut self, args: PlayerSpawn) {
        self.position = args.position;
        self.max_hp = args.max_hp;
        self.hp = args.max_hp;
        self.speed = args.speed;
        self.weapon = args.weapon;
        self.armor = args.armor;
        self.joystick = args.joystick;
        self.last_shot_direction = Vec2::NEG_Y;
        self.update_healthbars();
    }
}

impl Player {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, SpriteId::Player.size())
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Apply a hit: armor soaks its share first, the rest comes off hp.
    /// Returns the damage that reached hp.
    pub fn take_damage(&mut self, damage: f32) -> f32 {
        let through = match self.armor.as_mut() {
            Some(armor) => armor.take_damage(damage),
            None => damage,
        };
        self.hp = (self.hp - through).max(0.0);
        self.update_healthbars();
        through
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn armor_fraction(&self) -> Option<f32> {
        self.armor.as_ref().map(Armor::fraction)
    }

    pub fn update_healthbars(&mut self) {
        self.hp_bar = healthbar_width(self.health_fraction(), HEALTHBAR_WIDTH);
        self.armor_bar = healthbar_width(self.armor_fraction().unwrap_or(0.0), HEALTHBAR_WIDTH);
    }
}

// ── Zombies ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZombieKind {
    #[default]
    Walker,
    Runner,
    Brute,
    /// Keeps its distance and spits at the player when it has line of sight.
    Spitter,
}

impl ZombieKind {
    /// Pixels per frame unit.
    pub fn speed(self) -> f32 {
        match self {
            Self::Walker => 1.2,
            Self::Runner => 2.2,
            Self::Brute => 0.8,
            Self::Spitter => 0.9,
        }
    }

    pub fn max_hp(self) -> f32 {
        match self {
            Self::Walker => 4.0,
            Self::Runner => 2.0,
            Self::Brute => 12.0,
            Self::Spitter => 3.0,
        }
    }

    pub fn contact_damage(self) -> f32 {
        match self {
            Self::Brute => 2.0,
            _ => 1.0,
        }
    }

    pub fn score(self) -> u32 {
        match self {
            Self::Walker => 10,
            Self::Runner => 15,
            Self::Brute => 30,
            Self::Spitter => 20,
        }
    }

    pub fn sprite(self) -> SpriteId {
        match self {
            Self::Walker => SpriteId::Walker,
            Self::Runner => SpriteId::Runner,
            Self::Brute => SpriteId::Brute,
            Self::Spitter => SpriteId::Spitter,
        }
    }
}

/// Seconds a new spitter waits before its first shot.
pub const FIRST_SPIT_DELAY: f32 = 1.0;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Zombie {
    pub kind: ZombieKind,
    pub position: Vec2,
    pub hp: f32,
    /// Seconds until the next spit (spitters only).
    pub spit_cooldown: f32,
}

pub struct ZombieSpawn {
    pub kind: ZombieKind,
    pub position: Vec2,
}

impl Pooled for Zombie {
    const POOL_NAME: &'static str = "zombie";
    type Spawn = ZombieSpawn;

    fn on_spawn(&mut self, args: ZombieSpawn) {
        self.kind = args.kind;
        self.position = args.position;
        self.hp = args.kind.max_hp();
        self.spit_cooldown = FIRST_SPIT_DELAY;
    }
}

impl Zombie {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, self.kind.sprite().size())
    }
}

// ── Projectiles ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projectile {
    pub position: Vec2,
    /// Unit vector.
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub hostility: Hostility,
    pub piercing: bool,
    /// Seconds left before expiry.
    pub ttl: f32,
    pub sprite: SpriteId,
    /// Zombies already hit by a piercing projectile.
    pub pierced: Vec<EntityId>,
}

pub struct ProjectileSpawn {
    pub position: Vec2,
    pub direction: Vec2,
    pub speed: f32,
    pub damage: f32,
    pub hostility: Hostility,
    pub piercing: bool,
    pub ttl: f32,
    pub sprite: SpriteId,
}

impl Pooled for Projectile {
    const POOL_NAME: &'static str = "projectile";
    type Spawn = ProjectileSpawn;

    fn on_spawn(&mut self, args: ProjectileSpawn) {
        self.position = args.position;
        self.direction = args.direction.normalize_or_zero();
        self.speed = args.speed;
        self.damage = args.damage;
        self.hostility = args.hostility;
        self.piercing = args.piercing;
        self.ttl = args.ttl;
        self.sprite = args.sprite;
    }

    fn clean_instance(&mut self) {
        let mut pierced = std::mem::take(&mut self.pierced);
        pierced.clear();
        *self = Self {
            pierced,
            ..Self::default()
        };
    }
}

impl Projectile {
    pub fn rect(&self) -> Rect {
        Rect::from_center(self.position, self.sprite.size())
    }
}
