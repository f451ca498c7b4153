//! The pools of one session and the per-frame passes over them.

use tracing::debug;

use crate::audio::SoundCue;
use crate::compute;
use crate::config::{GameConfig, PoolConfig};
use crate::entities::{CombatEvent, Player, Projectile, SpriteBank, SpriteId, Surface, Zombie};
use crate::error::GameError;
use crate::geometry::Rect;
use crate::input::{ControlScheme, InputEvent, InputSnapshot};
use crate::pool::{EntityId, Pool};

/// Everything a per-entity update may read besides the pools themselves.
pub struct FrameContext<'a> {
    pub input: &'a InputSnapshot,
    pub bounds: Rect,
    pub control: ControlScheme,
    pub config: &'a GameConfig,
    /// Seconds since the run started.
    pub run_time: f32,
    /// False while paused or before/after a run.
    pub running: bool,
}

pub struct World {
    pub players: Pool<Player>,
    pub zombies: Pool<Zombie>,
    pub projectiles: Pool<Projectile>,
    pub sprites: SpriteBank,
    /// Combat outcomes of the current frame, drained by the session.
    pub events: Vec<CombatEvent>,
    /// Sound cues queued since the front end last drained them.
    pub sounds: Vec<SoundCue>,
    /// Snapshot of the ids being updated; entities may recycle each other
    /// mid-pass.
    pass: Vec<EntityId>,
    pub(crate) hits: Vec<EntityId>,
}

impl World {
    pub fn new(pools: &PoolConfig) -> Self {
        debug!(
            players = pools.players,
            zombies = pools.zombies,
            projectiles = pools.projectiles,
            "allocating pools"
        );
        Self {
            players: Pool::with_capacity(pools.players),
            zombies: Pool::with_capacity(pools.zombies),
            projectiles: Pool::with_capacity(pools.projectiles),
            sprites: SpriteBank::new(),
            events: Vec::new(),
            sounds: Vec::new(),
            pass: Vec::with_capacity(pools.zombies.max(pools.projectiles)),
            hits: Vec::with_capacity(pools.zombies),
        }
    }

    /// Run the per-instance update of every active player, then zombie, then
    /// projectile.
    pub fn update_all_sprites(&mut self, delta: f32, ctx: &FrameContext) -> Result<(), GameError> {
        let mut pass = std::mem::take(&mut self.pass);
        let result = self.run_passes(&mut pass, delta, ctx);
        self.pass = pass;
        result
    }

    fn run_passes(
        &mut self,
        pass: &mut Vec<EntityId>,
        delta: f32,
        ctx: &FrameContext,
    ) -> Result<(), GameError> {
        pass.clear();
        pass.extend_from_slice(self.players.active_ids());
        for &id in pass.iter() {
            compute::update_player(id, delta, ctx, self)?;
        }

        pass.clear();
        pass.extend_from_slice(self.zombies.active_ids());
        for &id in pass.iter() {
            compute::update_zombie(id, delta, ctx, self)?;
        }

        pass.clear();
        pass.extend_from_slice(self.projectiles.active_ids());
        for &id in pass.iter() {
            compute::update_projectile(id, delta, ctx, self)?;
        }
        Ok(())
    }

    /// Blit every active entity, player last so it stays on top.
    pub fn draw_all_sprites<S: Surface + ?Sized>(&self, surface: &mut S) {
        for (_, zombie) in self.zombies.iter() {
            surface.blit(zombie.kind.sprite(), zombie.rect());
        }
        for (_, projectile) in self.projectiles.iter() {
            surface.blit(projectile.sprite, projectile.rect());
        }
        for (_, player) in self.players.iter() {
            surface.blit(SpriteId::Player, player.rect());
        }
    }

    /// Route a discrete input event to every active player.
    pub fn handle_event(&mut self, event: InputEvent, ctx: &FrameContext) -> Result<(), GameError> {
        let mut pass = std::mem::take(&mut self.pass);
        pass.clear();
        pass.extend_from_slice(self.players.active_ids());
        let mut result = Ok(());
        for &id in pass.iter() {
            result = compute::handle_player_event(id, event, ctx, self);
            if result.is_err() {
                break;
            }
        }
        self.pass = pass;
        result
    }

    pub fn recycle_all(&mut self) {
        self.players.recycle_all();
        self.zombies.recycle_all();
        self.projectiles.recycle_all();
        self.events.clear();
    }

    pub fn player(&self) -> Option<&Player> {
        self.players.iter().next().map(|(_, player)| player)
    }

    pub fn player_alive(&self) -> bool {
        self.players.iter().any(|(_, player)| player.is_alive())
    }
}
