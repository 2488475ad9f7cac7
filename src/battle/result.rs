//! Battle result aggregation

use std::time::Duration;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::battle::action::{ActionKind, BattleAction};
use crate::battle::options::BattleSpeed;
use crate::battle::participant::Side;
use crate::battle::waves::RewardBundle;
use crate::core::error::Result;
use crate::core::types::{BattleId, HeroId, Turn};

/// Totals over the player roster's actions, effect ticks excluded
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleStats {
    pub total_damage_dealt: u64,
    pub total_healing_done: u64,
    pub critical_hits: u32,
    pub ultimates_used: u32,
}

impl BattleStats {
    /// Sum stats over actions whose actor is in `player_ids`
    pub fn from_actions<'a>(
        actions: impl IntoIterator<Item = &'a BattleAction>,
        player_ids: &AHashSet<HeroId>,
    ) -> Self {
        let mut stats = Self::default();
        for action in actions {
            // Effect ticks are things that happened to a hero, not things it did
            if action.kind == ActionKind::Passive || !player_ids.contains(&action.actor_id) {
                continue;
            }
            stats.total_damage_dealt += action.damage.unwrap_or(0) as u64;
            stats.total_healing_done += action.healing.unwrap_or(0) as u64;
            if action.critical {
                stats.critical_hits += 1;
            }
            if action.kind == ActionKind::Ultimate {
                stats.ultimates_used += 1;
            }
        }
        stats
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleResult {
    pub battle_id: BattleId,
    pub victory: bool,
    pub winner: Side,
    pub total_turns: Turn,
    /// Simulation wall-clock time divided by the speed multiplier
    pub duration_ms: u64,
    pub rewards: RewardBundle,
    pub stats: BattleStats,
    /// Cleared waves, only set for multi-wave battles
    pub completed_waves: Option<u32>,
}

impl BattleResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Reported duration for a run that took `elapsed` at the given speed
pub fn scaled_duration(elapsed: Duration, speed: BattleSpeed) -> Duration {
    elapsed / speed.multiplier() as u32
}
