//! Persistent meta-progression: tokens, owned and equipped gear, perk
//! levels and records. Saved as a flat JSON object.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::armor::ArmorKind;
use crate::error::{GameError, PersistError, PurchaseError};
use crate::weapons::WeaponKind;

/// Saves older than this are ignored.
pub const SCHEMA_VERSION: u32 = 2;

pub const STARTING_TOKENS: u32 = 20;

/// Cost of reaching perk level `n` is `PERK_COST_TABLE[n]`.
pub const PERK_COST_TABLE: [u32; 6] = [0, 5, 10, 20, 40, 50];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Perk {
    /// +20 % firerate per level.
    Firerate,
    /// +20 % damage per level.
    Damage,
    /// +20 % health per level.
    Vitality,
}

pub fn weapon_cost(kind: WeaponKind) -> u32 {
    match kind {
        WeaponKind::Pistol => 0,
        WeaponKind::Rifle | WeaponKind::Shotgun => 50,
        WeaponKind::Piercer => 100,
    }
}

pub fn armor_cost(kind: ArmorKind) -> u32 {
    match kind {
        ArmorKind::Light => 30,
        ArmorKind::Balanced => 50,
        ArmorKind::Heavy => 80,
        ArmorKind::Adaptative => 100,
    }
}

/// Highest level of `perk` on `kind`.
pub fn weapon_perk_max(kind: WeaponKind, perk: Perk) -> Result<u32, GameError> {
    match perk {
        Perk::Firerate | Perk::Damage => Ok(5),
        Perk::Vitality => Err(GameError::UnknownPerk {
            equipment: kind.name().to_string(),
            perk,
        }),
    }
}

pub fn armor_perk_max(kind: ArmorKind, perk: Perk) -> Result<u32, GameError> {
    match perk {
        Perk::Vitality => Ok(5),
        Perk::Firerate | Perk::Damage => Err(GameError::UnknownPerk {
            equipment: kind.name().to_string(),
            perk,
        }),
    }
}

pub fn perk_cost(equipment: &str, perk: Perk, level: u32) -> Result<u32, GameError> {
    PERK_COST_TABLE
        .get(level as usize)
        .copied()
        .ok_or_else(|| GameError::PerkLevelOutOfRange {
            equipment: equipment.to_string(),
            perk,
            level,
        })
}

/// Tokens earned by a finished run. Runs that never scored earn nothing.
pub fn tokens_for_run(score: u32, wave: u32) -> u32 {
    if wave > 0 && score > 0 {
        wave * 5 + score / 12 + 10
    } else {
        0
    }
}

/// What a successful shop interaction did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShopOutcome {
    Bought { cost: u32 },
    Equipped,
    Unequipped,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStorage {
    #[serde(default, deserialize_with = "known_or_default")]
    pub armor_equipped: Option<ArmorKind>,
    #[serde(deserialize_with = "known_items")]
    pub owned_armors: Vec<ArmorKind>,
    #[serde(deserialize_with = "known_or_default")]
    pub weapon_equipped: WeaponKind,
    #[serde(deserialize_with = "known_items")]
    pub owned_weapons: Vec<WeaponKind>,
    #[serde(deserialize_with = "known_perk_tables")]
    pub current_weapon_perks: BTreeMap<WeaponKind, BTreeMap<Perk, u32>>,
    #[serde(deserialize_with = "known_perk_tables")]
    pub current_armor_perks: BTreeMap<ArmorKind, BTreeMap<Perk, u32>>,
    pub highscore: u32,
    pub highest_wave: u32,
    pub tokens: u32,
    /// Perks that apply regardless of equipment.
    #[serde(default, deserialize_with = "known_entries")]
    pub general_upgrades: BTreeMap<Perk, u32>,
    pub isvalid: u32,
}

// Loading skips entries this build does not know instead of rejecting the save.

fn parse_known<T: DeserializeOwned>(field: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(field, %value, error = %err, "skipping unknown save entry");
            None
        }
    }
}

fn keep_known<K, V>(field: &str, raw: BTreeMap<String, Value>) -> BTreeMap<K, V>
where
    K: DeserializeOwned + Ord,
    V: DeserializeOwned,
{
    raw.into_iter()
        .filter_map(|(key, value)| {
            let key = parse_known(field, Value::String(key))?;
            Some((key, parse_known(field, value)?))
        })
        .collect()
}

fn known_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_known("equipped", value).unwrap_or_default())
}

fn known_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().filter_map(|value| parse_known("owned", value)).collect())
}

fn known_entries<'de, D>(deserializer: D) -> Result<BTreeMap<Perk, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(keep_known("general_upgrades", raw))
}

fn known_perk_tables<'de, D, K>(deserializer: D) -> Result<BTreeMap<K, BTreeMap<Perk, u32>>, D::Error>
where
    D: Deserializer<'de>,
    K: DeserializeOwned + Ord,
{
    let raw = BTreeMap::<String, BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, perks)| {
            let kind = parse_known("perks", Value::String(key))?;
            Some((kind, keep_known("perks", perks)))
        })
        .collect())
}

impl Default for GameStorage {
    fn default() -> Self {
        Self {
            armor_equipped: None,
            owned_armors: Vec::new(),
            weapon_equipped: WeaponKind::Pistol,
            owned_weapons: vec![WeaponKind::Pistol],
            current_weapon_perks: WeaponKind::ALL
                .into_iter()
                .map(|kind| (kind, BTreeMap::new()))
                .collect(),
            current_armor_perks: ArmorKind::ALL
                .into_iter()
                .map(|kind| (kind, BTreeMap::new()))
                .collect(),
            highscore: 0,
            highest_wave: 1,
            tokens: STARTING_TOKENS,
            general_upgrades: BTreeMap::new(),
            isvalid: SCHEMA_VERSION,
        }
    }
}

fn buy_perk(
    tokens: &mut u32,
    levels: &mut BTreeMap<Perk, u32>,
    equipment: &str,
    perk: Perk,
    max: u32,
) -> Result<u32, PurchaseError> {
    let current = levels.get(&perk).copied().unwrap_or(0);
    if current >= max {
        return Err(PurchaseError::AlreadyMaxed { level: current });
    }
    let next = current + 1;
    let cost = perk_cost(equipment, perk, next)?;
    if cost > *tokens {
        return Err(PurchaseError::NotEnoughTokens {
            cost,
            available: *tokens,
        });
    }
    *tokens -= cost;
    levels.insert(perk, next);
    info!(equipment, ?perk, level = next, cost, "perk upgraded");
    Ok(next)
}

impl GameStorage {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn weapon_perk_level(&self, kind: WeaponKind, perk: Perk) -> u32 {
        self.current_weapon_perks
            .get(&kind)
            .and_then(|perks| perks.get(&perk))
            .copied()
            .unwrap_or(0)
    }

    pub fn armor_perk_level(&self, kind: ArmorKind, perk: Perk) -> u32 {
        self.current_armor_perks
            .get(&kind)
            .and_then(|perks| perks.get(&perk))
            .copied()
            .unwrap_or(0)
    }

    pub fn general_level(&self, perk: Perk) -> u32 {
        self.general_upgrades.get(&perk).copied().unwrap_or(0)
    }

    fn spend(&mut self, cost: u32) -> Result<(), PurchaseError> {
        if cost > self.tokens {
            return Err(PurchaseError::NotEnoughTokens {
                cost,
                available: self.tokens,
            });
        }
        self.tokens -= cost;
        Ok(())
    }

    /// Equip an owned weapon, or buy and equip an unowned one.
    pub fn weapon_interact(&mut self, kind: WeaponKind) -> Result<ShopOutcome, PurchaseError> {
        if self.weapon_equipped == kind {
            return Err(PurchaseError::AlreadyEquipped);
        }
        if self.owned_weapons.contains(&kind) {
            self.weapon_equipped = kind;
            return Ok(ShopOutcome::Equipped);
        }
        let cost = weapon_cost(kind);
        self.spend(cost)?;
        self.owned_weapons.push(kind);
        self.weapon_equipped = kind;
        info!(weapon = %kind, cost, "weapon bought");
        Ok(ShopOutcome::Bought { cost })
    }

    /// Toggle an owned armor, or buy and equip an unowned one.
    pub fn armor_interact(&mut self, kind: ArmorKind) -> Result<ShopOutcome, PurchaseError> {
        if self.armor_equipped == Some(kind) {
            self.armor_equipped = None;
            return Ok(ShopOutcome::Unequipped);
        }
        if self.owned_armors.contains(&kind) {
            self.armor_equipped = Some(kind);
            return Ok(ShopOutcome::Equipped);
        }
        let cost = armor_cost(kind);
        self.spend(cost)?;
        self.owned_armors.push(kind);
        self.armor_equipped = Some(kind);
        info!(armor = %kind, cost, "armor bought");
        Ok(ShopOutcome::Bought { cost })
    }

    /// Buy the next level of `perk` for `kind`. Returns the new level.
    pub fn upgrade_weapon_perk(&mut self, kind: WeaponKind, perk: Perk) -> Result<u32, PurchaseError> {
        let max = weapon_perk_max(kind, perk)?;
        let levels = self.current_weapon_perks.entry(kind).or_default();
        buy_perk(&mut self.tokens, levels, kind.name(), perk, max)
    }

    pub fn upgrade_armor_perk(&mut self, kind: ArmorKind, perk: Perk) -> Result<u32, PurchaseError> {
        let max = armor_perk_max(kind, perk)?;
        let levels = self.current_armor_perks.entry(kind).or_default();
        buy_perk(&mut self.tokens, levels, kind.name(), perk, max)
    }

    /// Credit a finished run and update the records. Returns the tokens
    /// gained.
    pub fn record_run(&mut self, score: u32, wave: u32) -> u32 {
        let gained = tokens_for_run(score, wave);
        self.tokens += gained;
        self.highscore = self.highscore.max(score);
        self.highest_wave = self.highest_wave.max(wave);
        info!(score, wave, gained, tokens = self.tokens, "run recorded");
        gained
    }

    /// Parse a save. `Ok(None)` means the save predates `SCHEMA_VERSION`.
    pub fn from_json_str(text: &str) -> Result<Option<Self>, PersistError> {
        let value: Value = serde_json::from_str(text)?;
        let version = value.get("isvalid").and_then(Value::as_u64).unwrap_or(0);
        if version < u64::from(SCHEMA_VERSION) {
            return Ok(None);
        }
        let mut storage: Self = serde_json::from_value(value)?;
        storage.isvalid = SCHEMA_VERSION;
        Ok(Some(storage))
    }

    /// Load a save, falling back to a fresh one when the file is missing,
    /// unreadable or outdated.
    pub fn load_from_file(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %path.display(), %err, "no save file; starting fresh");
                return Self::default();
            }
        };
        match Self::from_json_str(&text) {
            Ok(Some(storage)) => {
                info!(path = %path.display(), tokens = storage.tokens, "save loaded");
                storage
            }
            Ok(None) => {
                warn!(path = %path.display(), "outdated save schema; starting fresh");
                Self::default()
            }
            Err(err) => {
                warn!(path = %path.display(), %err, "corrupt save; starting fresh");
                Self::default()
            }
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), PersistError> {
        let text = serde_json::to_string_pretty(self)?;
        fs::write(path, text)?;
        info!(path = %path.display(), "save written");
        Ok(())
    }
}
