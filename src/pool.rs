//! Fixed-capacity object pools.
//!
//! Every slot is allocated once when the pool is built and then cycled
//! between the active and inactive rosters for the rest of the session.
//! Nothing is allocated or freed per spawn.

use tracing::{error, trace};

use crate::error::GameError;

/// Behaviour every pooled entity type provides.
pub trait Pooled: Default {
    /// Name used in logs and `PoolExhausted` errors.
    const POOL_NAME: &'static str;

    /// Arguments needed to bring a slot to life.
    type Spawn;

    /// Initialise a freshly cleaned slot.
    fn on_spawn(&mut self, args: Self::Spawn);

    /// Reset every per-instance field to its sentinel. The default puts the
    /// slot back to `Default::default()`.
    fn clean_instance(&mut self) {
        *self = Self::default();
    }
}

/// Handle to a pooled slot. The generation changes on every spawn, so an id
/// held across a recycle never resolves to the slot's next occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    index: u32,
    generation: u32,
}

impl EntityId {
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

pub struct Pool<T: Pooled> {
    slots: Vec<T>,
    generations: Vec<u32>,
    live: Vec<bool>,
    /// Spawn order is preserved so per-frame passes are deterministic.
    active: Vec<EntityId>,
    /// Free slot indices; popped from the back.
    inactive: Vec<u32>,
}

impl<T: Pooled> Pool<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| T::default()).collect(),
            generations: vec![0; capacity],
            live: vec![false; capacity],
            active: Vec::with_capacity(capacity),
            // Reversed so slot 0 is handed out first.
            inactive: (0..capacity as u32).rev().collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn inactive_len(&self) -> usize {
        self.inactive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Take an inactive slot, initialise it and append it to the active
    /// roster. Fails with `PoolExhausted` when every slot is active.
    pub fn spawn(&mut self, args: T::Spawn) -> Result<EntityId, GameError> {
        let Some(index) = self.inactive.pop() else {
            error!(
                pool = T::POOL_NAME,
                capacity = self.capacity(),
                "pool exhausted"
            );
            return Err(GameError::PoolExhausted {
                pool: T::POOL_NAME,
                capacity: self.capacity(),
            });
        };
        let i = index as usize;
        self.generations[i] = self.generations[i].wrapping_add(1);
        // Free slots are always clean: built by `Default` or reset by
        // `clean_instance` on recycle.
        self.slots[i].on_spawn(args);
        self.live[i] = true;

        let id = EntityId {
            index,
            generation: self.generations[i],
        };
        self.active.push(id);
        trace!(pool = T::POOL_NAME, index, "spawned");
        Ok(id)
    }

    /// Move an active entity back to the inactive roster and clean it.
    /// Returns `false` (and does nothing) for inactive or stale ids.
    pub fn recycle(&mut self, id: EntityId) -> bool {
        if !self.is_active(id) {
            return false;
        }
        if let Some(pos) = self.active.iter().position(|&a| a == id) {
            self.active.remove(pos);
        }
        let i = id.index();
        self.live[i] = false;
        self.slots[i].clean_instance();
        self.inactive.push(id.index);
        trace!(pool = T::POOL_NAME, index = id.index, "recycled");
        true
    }

    pub fn recycle_all(&mut self) {
        while let Some(&id) = self.active.last() {
            self.recycle(id);
        }
    }

    pub fn is_active(&self, id: EntityId) -> bool {
        let i = id.index();
        i < self.slots.len() && self.live[i] && self.generations[i] == id.generation
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.is_active(id).then(|| &self.slots[id.index()])
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        if self.is_active(id) {
            Some(&mut self.slots[id.index()])
        } else {
            None
        }
    }

    /// Raw slot access regardless of state, for inspecting recycled slots.
    pub fn slot(&self, index: usize) -> Option<&T> {
        self.slots.get(index)
    }

    /// Active ids in spawn order.
    pub fn active_ids(&self) -> &[EntityId] {
        &self.active
    }

    /// How many times `id`'s slot shows up in each roster: `(active, inactive)`.
    pub fn roster_count(&self, index: usize) -> (usize, usize) {
        let active = self.active.iter().filter(|id| id.index() == index).count();
        let inactive = self
            .inactive
            .iter()
            .filter(|&&i| i as usize == index)
            .count();
        (active, inactive)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> + '_ {
        self.active.iter().map(|&id| (id, &self.slots[id.index()]))
    }
}
