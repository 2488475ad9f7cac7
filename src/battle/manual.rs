//! Manual-mode ultimate queue
//!
//! One pending entry per hero. Queueing the same hero again replaces the
//! previous entry; executing an entry consumes it.

use ahash::AHashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::battle::action::ActionKind;
use crate::battle::participant::Participant;
use crate::core::error::{BattleError, Result};
use crate::core::types::HeroId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingManualAction {
    pub hero_id: HeroId,
    /// Always `Ultimate`
    pub kind: ActionKind,
    pub targets: Option<Vec<HeroId>>,
    pub created_at: DateTime<Utc>,
}

impl PendingManualAction {
    pub fn ultimate(hero_id: HeroId, targets: Option<Vec<HeroId>>) -> Self {
        Self {
            hero_id,
            kind: ActionKind::Ultimate,
            targets,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ManualQueue {
    pending: AHashMap<HeroId, PendingManualAction>,
}

impl ManualQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an entry, returning the one it replaced
    pub fn insert(&mut self, action: PendingManualAction) -> Option<PendingManualAction> {
        self.pending.insert(action.hero_id.clone(), action)
    }

    /// Consume the entry for a hero
    pub fn take(&mut self, hero_id: &HeroId) -> Option<PendingManualAction> {
        self.pending.remove(hero_id)
    }

    pub fn get(&self, hero_id: &HeroId) -> Option<&PendingManualAction> {
        self.pending.get(hero_id)
    }

    pub fn contains(&self, hero_id: &HeroId) -> bool {
        self.pending.contains_key(hero_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pending entries, oldest first
    pub fn entries(&self) -> Vec<PendingManualAction> {
        let mut entries: Vec<PendingManualAction> = self.pending.values().cloned().collect();
        entries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.hero_id.cmp(&b.hero_id))
        });
        entries
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

/// Check that a hero may queue its ultimate
///
/// The hero must be on the player roster, alive, and sitting on a full gauge.
pub fn check_manual_ultimate(
    hero_id: &HeroId,
    player: &[Participant],
    enemy: &[Participant],
    energy_cap: u32,
) -> Result<()> {
    let Some(hero) = player.iter().find(|p| &p.hero_id == hero_id) else {
        if enemy.iter().any(|p| &p.hero_id == hero_id) {
            return Err(BattleError::NotPlayerControlled(hero_id.clone()));
        }
        return Err(BattleError::UnknownHero(hero_id.clone()));
    };

    if !hero.is_alive() {
        return Err(BattleError::HeroDefeated(hero_id.clone()));
    }

    if !hero.has_full_energy(energy_cap) {
        return Err(BattleError::InsufficientEnergy {
            hero_id: hero_id.clone(),
            energy: hero.energy,
        });
    }

    Ok(())
}
