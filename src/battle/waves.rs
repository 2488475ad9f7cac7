//! Multi-wave encounters
//!
//! A wave config is static input: the enemy roster of one sub-encounter and
//! its rewards. `WaveData` is what the engine records while the waves play
//! out; each wave snapshot is written once, when the wave is cleared.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::battle::participant::Participant;
use crate::core::types::{HeroId, Turn, WaveNumber};

/// Rewards handed to the caller's economy layer
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardBundle {
    pub gold: u64,
    pub gems: u64,
    pub experience: u64,
    /// Materials, hero fragments and other counted items by id
    #[serde(default)]
    pub items: BTreeMap<String, u32>,
}

impl RewardBundle {
    pub fn new(gold: u64, gems: u64, experience: u64) -> Self {
        Self {
            gold,
            gems,
            experience,
            items: BTreeMap::new(),
        }
    }

    pub fn with_item(mut self, item_id: impl Into<String>, count: u32) -> Self {
        *self.items.entry(item_id.into()).or_insert(0) += count;
        self
    }

    /// Add another bundle into this one
    pub fn merge(&mut self, other: &RewardBundle) {
        self.gold += other.gold;
        self.gems += other.gems;
        self.experience += other.experience;
        for (item, count) in &other.items {
            *self.items.entry(item.clone()).or_insert(0) += count;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gold == 0 && self.gems == 0 && self.experience == 0 && self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveConfig {
    pub enemies: Vec<Participant>,
    /// Presentation delay before the wave appears, reported only
    #[serde(default)]
    pub spawn_delay_ms: u64,
    #[serde(default)]
    pub is_boss: bool,
    #[serde(default)]
    pub rewards: RewardBundle,
}

impl WaveConfig {
    pub fn new(enemies: Vec<Participant>) -> Self {
        Self {
            enemies,
            spawn_delay_ms: 0,
            is_boss: false,
            rewards: RewardBundle::default(),
        }
    }

    pub fn with_rewards(mut self, rewards: RewardBundle) -> Self {
        self.rewards = rewards;
        self
    }

    pub fn boss(mut self) -> Self {
        self.is_boss = true;
        self
    }

    /// Fresh copy of this wave's enemies, ready to fight
    pub fn spawn_enemies(&self) -> Vec<Participant> {
        let mut enemies = self.enemies.clone();
        for enemy in &mut enemies {
            enemy.reset_for_battle();
        }
        enemies
    }
}

/// Player hero state at the end of a cleared wave
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroWaveState {
    pub hero_id: HeroId,
    pub current_hp: u32,
    pub energy: u32,
    pub alive: bool,
}

impl HeroWaveState {
    pub fn of(participant: &Participant) -> Self {
        Self {
            hero_id: participant.hero_id.clone(),
            current_hp: participant.current_hp,
            energy: participant.energy,
            alive: participant.is_alive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveSnapshot {
    pub wave: WaveNumber,
    pub turns_taken: Turn,
    pub heroes: Vec<HeroWaveState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaveData {
    pub total_waves: u32,
    pub completed_waves: u32,
    /// Wave being fought (1-based), 0 before the first wave spawns
    pub current_wave: WaveNumber,
    pub collected_rewards: RewardBundle,
    pub snapshots: Vec<WaveSnapshot>,
}

impl WaveData {
    pub fn new(total_waves: u32) -> Self {
        Self {
            total_waves,
            ..Self::default()
        }
    }

    /// Record a cleared wave: snapshot the player roster and bank the rewards
    pub fn record_clear(
        &mut self,
        wave: WaveNumber,
        turns_taken: Turn,
        player: &[Participant],
        rewards: &RewardBundle,
    ) {
        self.snapshots.push(WaveSnapshot {
            wave,
            turns_taken,
            heroes: player.iter().map(HeroWaveState::of).collect(),
        });
        self.collected_rewards.merge(rewards);
        self.completed_waves = wave;
    }

    pub fn all_cleared(&self) -> bool {
        self.completed_waves >= self.total_waves
    }

    pub fn snapshot(&self, wave: WaveNumber) -> Option<&WaveSnapshot> {
        self.snapshots.iter().find(|s| s.wave == wave)
    }
}
