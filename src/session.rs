//! One run of the game: loadout, wave spawning, scoring and the win/loss
//! decision, on top of the `World` pools.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::armor::Armor;
use crate::audio::SoundCue;
use crate::config::GameConfig;
use crate::entities::{CombatEvent, PlayerSpawn, RunState, Surface, ZombieKind, ZombieSpawn};
use crate::error::GameError;
use crate::input::{ControlScheme, InputEvent, InputSnapshot, Joystick};
use crate::stats::{ArmorStat, WeaponStat};
use crate::storage::{GameStorage, Perk};
use crate::weapons::Weapon;
use crate::world::{FrameContext, World};

/// Result of a finished run, as shown on the game-over screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSummary {
    pub score: u32,
    pub wave: u32,
    pub tokens_gained: u32,
    pub victory: bool,
}

/// Feeds the current wave's zombies in one at a time and waits out the
/// break between waves.
#[derive(Clone, Debug, Default)]
pub struct WaveSpawner {
    /// Zombies still to spawn this wave; popped from the back.
    queue: Vec<ZombieKind>,
    spawn_timer: f32,
    spawn_interval: f32,
    break_timer: f32,
}

impl WaveSpawner {
    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

/// Build the player's starting state from the save: equipped gear with perk
/// buffs, health from general upgrades, and a joystick for touch play.
pub fn loadout(storage: &GameStorage, config: &GameConfig, control: ControlScheme) -> PlayerSpawn {
    let step = config.player.perk_step;

    let kind = storage.weapon_equipped;
    let mut weapon = Weapon::new(kind);
    weapon.stats.full_reset();
    for (perk, stat) in [(Perk::Firerate, WeaponStat::Firerate), (Perk::Damage, WeaponStat::Damage)] {
        let level = storage.weapon_perk_level(kind, perk) + storage.general_level(perk);
        if level > 0 {
            weapon.stats.apply_perma_buff(stat, step * level as f32);
        }
    }
    weapon.ready_shot_cooldown();

    let armor = storage.armor_equipped.map(|kind| {
        let mut armor = Armor::new(kind);
        armor.stats.full_reset();
        let level = storage.armor_perk_level(kind, Perk::Vitality);
        if level > 0 {
            armor.stats.apply_perma_buff(ArmorStat::MaxHealth, step * level as f32);
        }
        armor.stats.refill();
        armor
    });

    let vitality = storage.general_level(Perk::Vitality) as f32;
    let display = &config.display;
    let joystick = (control == ControlScheme::Mobile).then(|| {
        let amplitude = config.aim.joystick_amplitude;
        Joystick::new(
            Vec2::new(10.0 + amplitude, display.height as f32 - 10.0 - amplitude),
            amplitude,
            config.aim.joystick_deadzone,
        )
    });

    PlayerSpawn {
        position: Vec2::new(display.width as f32 / 2.0, display.height as f32 / 2.0),
        weapon: Some(weapon),
        armor,
        max_hp: config.player.base_hp * (1.0 + step * vitality),
        speed: config.player.speed,
        joystick,
    }
}

pub struct GameSession {
    config: GameConfig,
    pub world: World,
    spawner: WaveSpawner,
    state: RunState,
    score: u32,
    wave_count: u32,
    /// Seconds since `start`, paused time excluded.
    run_time: f32,
    control: ControlScheme,
    rng: StdRng,
}

impl GameSession {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let world = World::new(&config.pools);
        Self {
            config,
            world,
            spawner: WaveSpawner::default(),
            state: RunState::NotStarted,
            score: 0,
            wave_count: 0,
            run_time: 0.0,
            control: ControlScheme::default(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn wave_count(&self) -> u32 {
        self.wave_count
    }

    pub fn run_time(&self) -> f32 {
        self.run_time
    }

    pub fn spawner(&self) -> &WaveSpawner {
        &self.spawner
    }

    pub fn control(&self) -> ControlScheme {
        self.control
    }

    pub fn set_control_scheme(&mut self, control: ControlScheme) {
        self.control = control;
    }

    /// Clear the pools and spawn the player with the saved loadout.
    pub fn start(&mut self, storage: &GameStorage) -> Result<(), GameError> {
        self.world.recycle_all();
        self.world.sounds.clear();
        self.spawner = WaveSpawner::default();
        self.score = 0;
        self.wave_count = 0;
        self.run_time = 0.0;

        let spawn = loadout(storage, &self.config, self.control);
        self.world.players.spawn(spawn)?;
        self.state = RunState::Running;
        info!(
            weapon = %storage.weapon_equipped,
            armor = ?storage.armor_equipped,
            control = %self.control,
            "run started"
        );
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.state = RunState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = RunState::Running;
        }
    }

    /// One simulation tick. `delta` is elapsed time in 1/60 s units. Does
    /// nothing unless the run is in progress.
    pub fn frame(&mut self, delta: f32, input: &InputSnapshot) -> Result<(), GameError> {
        if self.state != RunState::Running {
            return Ok(());
        }
        self.run_time += delta / 60.0;

        let ctx = FrameContext {
            input,
            bounds: self.config.display.bounds(),
            control: self.control,
            config: &self.config,
            run_time: self.run_time,
            running: true,
        };
        self.world.update_all_sprites(delta, &ctx)?;
        self.update_all_registered_classes(delta)?;
        self.main_logic();
        Ok(())
    }

    /// Deliver a discrete input event to the player.
    pub fn handle_event(&mut self, event: InputEvent, input: &InputSnapshot) -> Result<(), GameError> {
        let ctx = FrameContext {
            input,
            bounds: self.config.display.bounds(),
            control: self.control,
            config: &self.config,
            run_time: self.run_time,
            running: self.state == RunState::Running,
        };
        self.world.handle_event(event, &ctx)
    }

    /// Class-level per-frame hooks: the wave spawner.
    pub fn update_all_registered_classes(&mut self, delta: f32) -> Result<(), GameError> {
        let secs = delta / 60.0;

        if !self.spawner.queue.is_empty() {
            self.spawner.spawn_timer -= secs;
            while self.spawner.spawn_timer <= 0.0 {
                let Some(kind) = self.spawner.queue.pop() else {
                    break;
                };
                let position = self.edge_position();
                self.world.zombies.spawn(ZombieSpawn { kind, position })?;
                self.spawner.spawn_timer += self.spawner.spawn_interval.max(f32::EPSILON);
            }
            return Ok(());
        }
        if !self.world.zombies.is_empty() || self.wave_count as usize >= self.config.waves.waves.len() {
            return Ok(());
        }

        self.spawner.break_timer -= secs;
        if self.spawner.break_timer > 0.0 {
            return Ok(());
        }
        self.start_next_wave();
        Ok(())
    }

    fn start_next_wave(&mut self) {
        let Some(spec) = self.config.waves.waves.get(self.wave_count as usize) else {
            return;
        };
        self.wave_count += 1;
        let mut queue: Vec<ZombieKind> = spec
            .groups
            .iter()
            .flat_map(|group| std::iter::repeat(group.kind).take(group.count as usize))
            .collect();
        queue.shuffle(&mut self.rng);

        self.spawner.spawn_interval = spec.spawn_interval;
        self.spawner.spawn_timer = 0.0;
        self.spawner.break_timer = self.config.waves.wave_break;
        info!(wave = self.wave_count, queued = queue.len(), "wave started");
        self.spawner.queue = queue;
    }

    /// A random point on the display edge.
    fn edge_position(&mut self) -> Vec2 {
        let w = self.config.display.width.max(1) as f32;
        let h = self.config.display.height.max(1) as f32;
        match self.rng.gen_range(0..4) {
            0 => Vec2::new(self.rng.gen_range(0.0..w), 0.0),
            1 => Vec2::new(w, self.rng.gen_range(0.0..h)),
            2 => Vec2::new(self.rng.gen_range(0.0..w), h),
            _ => Vec2::new(0.0, self.rng.gen_range(0.0..h)),
        }
    }

    /// Score the frame's kills and decide whether the run is over.
    fn main_logic(&mut self) {
        for event in self.world.events.drain(..) {
            if let CombatEvent::ZombieKilled { kind, .. } = event {
                self.score += kind.score();
            }
        }

        if !self.world.player_alive() {
            self.state = RunState::Lost;
            info!(score = self.score, wave = self.wave_count, "run lost");
        } else if self.wave_count as usize >= self.config.waves.waves.len()
            && self.spawner.queue.is_empty()
            && self.world.zombies.is_empty()
        {
            self.state = RunState::Won;
            info!(score = self.score, wave = self.wave_count, "run won");
        }
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.world.draw_all_sprites(surface);
    }

    pub fn drain_sounds(&mut self) -> std::vec::Drain<'_, SoundCue> {
        self.world.sounds.drain(..)
    }

    /// End the run: bank tokens and records, then clear the pools.
    pub fn finish(&mut self, storage: &mut GameStorage) -> RunSummary {
        let tokens_gained = storage.record_run(self.score, self.wave_count);
        let summary = RunSummary {
            score: self.score,
            wave: self.wave_count,
            tokens_gained,
            victory: self.state == RunState::Won,
        };
        self.world.recycle_all();
        self.spawner = WaveSpawner::default();
        self.state = RunState::NotStarted;
        summary
    }
}
