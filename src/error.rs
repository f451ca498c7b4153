use std::fmt;

use crate::storage::Perk;

/// Failures that indicate a sizing or data-table bug rather than something a
/// player did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameError {
    /// `spawn` was requested while every slot of the pool was active.
    PoolExhausted { pool: &'static str, capacity: usize },
    /// A weapon or armor name that the catalog does not know.
    UnknownEquipment { name: String },
    /// A perk that the named equipment does not offer.
    UnknownPerk { equipment: String, perk: Perk },
    /// A perk level with no entry in the cost table.
    PerkLevelOutOfRange { equipment: String, perk: Perk, level: u32 },
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PoolExhausted { pool, capacity } => {
                write!(f, "{pool} pool exhausted: all {capacity} slots are active")
            }
            Self::UnknownEquipment { name } => write!(f, "unknown equipment: {name:?}"),
            Self::UnknownPerk { equipment, perk } => {
                write!(f, "{equipment} has no {perk:?} perk")
            }
            Self::PerkLevelOutOfRange {
                equipment,
                perk,
                level,
            } => write!(f, "{equipment} {perk:?} has no cost entry for level {level}"),
        }
    }
}

impl std::error::Error for GameError {}

/// Shop rejections. Everything except `Catalog` is a normal, player-facing
/// outcome ("not enough tokens", "already maxed").
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurchaseError {
    NotEnoughTokens { cost: u32, available: u32 },
    AlreadyMaxed { level: u32 },
    AlreadyEquipped,
    Catalog(GameError),
}

impl fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEnoughTokens { cost, available } => {
                write!(f, "Not enough tokens! ({available}/{cost})")
            }
            Self::AlreadyMaxed { .. } => write!(f, "This upgrade is already maxed out!"),
            Self::AlreadyEquipped => write!(f, "You are already equipping this item!"),
            Self::Catalog(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PurchaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Catalog(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GameError> for PurchaseError {
    fn from(err: GameError) -> Self {
        Self::Catalog(err)
    }
}

/// Explicit save/config file I/O.
#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "i/o error: {err}"),
            Self::Json(err) => write!(f, "json error: {err}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}
