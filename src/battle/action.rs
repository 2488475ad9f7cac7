//! Battle action records
//!
//! Every resolved action becomes one immutable `BattleAction` appended to the
//! `ActionLog`. Each record carries a post-action snapshot of every
//! participant, which is what replays are rendered from.

use serde::{Deserialize, Serialize};

use crate::battle::participant::{Buff, Debuff, Participant, Side};
use crate::core::types::{HeroId, Turn, WaveNumber};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Attack,
    Skill,
    Ultimate,
    Passive,
}

/// What an action does to one participant
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetHit {
    pub target_id: HeroId,
    pub damage: u32,
    pub healing: u32,
    pub critical: bool,
    #[serde(default)]
    pub buffs: Vec<Buff>,
    #[serde(default)]
    pub debuffs: Vec<Debuff>,
}

impl TargetHit {
    pub fn damage(target_id: HeroId, damage: u32) -> Self {
        Self {
            target_id,
            damage,
            ..Self::default()
        }
    }

    pub fn healing(target_id: HeroId, healing: u32) -> Self {
        Self {
            target_id,
            healing,
            ..Self::default()
        }
    }
}

/// Post-action state of one participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSnapshot {
    pub hero_id: HeroId,
    pub side: Side,
    pub current_hp: u32,
    pub max_hp: u32,
    pub energy: u32,
    pub buffs: Vec<Buff>,
    pub debuffs: Vec<Debuff>,
    pub alive: bool,
}

impl ParticipantSnapshot {
    pub fn of(participant: &Participant, side: Side) -> Self {
        Self {
            hero_id: participant.hero_id.clone(),
            side,
            current_hp: participant.current_hp,
            max_hp: participant.stats.max_hp,
            energy: participant.energy,
            buffs: participant.status.buffs.clone(),
            debuffs: participant.status.debuffs.clone(),
            alive: participant.is_alive(),
        }
    }
}

/// One resolved action
///
/// Built by the resolver (or the ability system), then sealed by the engine:
/// hits are applied, the summary fields are filled with the amounts that
/// actually landed, and the snapshot is captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleAction {
    pub turn: Turn,
    pub kind: ActionKind,
    pub actor_id: HeroId,
    pub actor_name: String,
    pub ability_id: Option<String>,
    pub target_ids: Vec<HeroId>,
    pub hits: Vec<TargetHit>,
    pub damage: Option<u32>,
    pub healing: Option<u32>,
    pub energy_gained: Option<u32>,
    pub energy_spent: Option<u32>,
    pub critical: bool,
    pub elemental_multiplier: Option<f64>,
    pub buffs_applied: Vec<Buff>,
    pub debuffs_applied: Vec<Debuff>,
    pub message: Option<String>,
    pub snapshot: Vec<ParticipantSnapshot>,
    pub wave: Option<WaveNumber>,
}

impl BattleAction {
    pub fn new(turn: Turn, kind: ActionKind, actor: &Participant) -> Self {
        Self {
            turn,
            kind,
            actor_id: actor.hero_id.clone(),
            actor_name: actor.name.clone(),
            ability_id: None,
            target_ids: Vec::new(),
            hits: Vec::new(),
            damage: None,
            healing: None,
            energy_gained: None,
            energy_spent: None,
            critical: false,
            elemental_multiplier: None,
            buffs_applied: Vec::new(),
            debuffs_applied: Vec::new(),
            message: None,
            snapshot: Vec::new(),
            wave: None,
        }
    }

    /// Record a hit; the hit's target also becomes an action target
    pub fn with_hit(mut self, hit: TargetHit) -> Self {
        if !self.target_ids.contains(&hit.target_id) {
            self.target_ids.push(hit.target_id.clone());
        }
        self.hits.push(hit);
        self
    }

    pub fn with_ability(mut self, ability_id: impl Into<String>) -> Self {
        self.ability_id = Some(ability_id.into());
        self
    }

    pub fn with_energy_gained(mut self, amount: u32) -> Self {
        self.energy_gained = Some(amount);
        self
    }

    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn is_ultimate(&self) -> bool {
        self.kind == ActionKind::Ultimate
    }
}

/// Ordered, append-only log of resolved actions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLog {
    entries: Vec<BattleAction>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: BattleAction) {
        self.entries.push(action);
    }

    pub fn entries(&self) -> &[BattleAction] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BattleAction> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&BattleAction> {
        self.entries.last()
    }
}
