use thiserror::Error;

use crate::battle::participant::Side;
use crate::core::types::HeroId;

#[derive(Error, Debug)]
pub enum BattleError {
    #[error("Speed x{requested} not permitted at VIP {vip_level} (max x{max})")]
    SpeedNotPermitted { requested: u8, max: u8, vip_level: u8 },

    #[error("Invalid battle speed: {0} (expected 1, 2 or 3)")]
    InvalidSpeed(u8),

    #[error("{0:?} roster is empty")]
    EmptyRoster(Side),

    #[error("Hero id appears more than once in the battle: {0}")]
    DuplicateHero(HeroId),

    #[error("Hero {hero_id} has invalid position {position} (expected 1-5)")]
    InvalidPosition { hero_id: HeroId, position: u8 },

    #[error("Unknown hero: {0}")]
    UnknownHero(HeroId),

    #[error("Hero is defeated: {0}")]
    HeroDefeated(HeroId),

    #[error("Hero is not player controlled: {0}")]
    NotPlayerControlled(HeroId),

    #[error("Hero {hero_id} has {energy} energy, ultimate needs a full gauge")]
    InsufficientEnergy { hero_id: HeroId, energy: u32 },

    #[error("Invalid tuning: {0}")]
    InvalidTuning(String),

    #[error("Tuning parse error: {0}")]
    TuningParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BattleError>;
