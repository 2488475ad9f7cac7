pub mod config;
pub mod error;
pub mod types;

pub use config::BattleTuning;
pub use error::{BattleError, Result};
pub use types::{BattleId, HeroId, Turn, WaveNumber};
