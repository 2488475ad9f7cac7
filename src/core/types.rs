//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a hero taking part in a battle
///
/// Hero ids come from the caller's roster data, so they are strings rather
/// than generated values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HeroId(pub String);

impl HeroId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HeroId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HeroId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for HeroId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Unique identifier for one battle instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BattleId(pub Uuid);

impl BattleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BattleId {
    fn default() -> Self {
        Self::new()
    }
}

/// Battle turn counter (1-based once the first turn starts)
pub type Turn = u32;

/// Wave number (1-based)
pub type WaveNumber = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hero_id_equality() {
        let a = HeroId::new("h1");
        let b = HeroId::from("h1");
        let c = HeroId::from("h2".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_hero_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&HeroId::new("arthur")).unwrap();
        assert_eq!(json, "\"arthur\"");
    }

    #[test]
    fn test_battle_ids_are_unique() {
        assert_ne!(BattleId::new(), BattleId::new());
    }
}
