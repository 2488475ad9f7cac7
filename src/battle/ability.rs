//! Ability and status-effect system boundary
//!
//! Architecture: Trait + Data hybrid
//! - `AbilitySystem` is the seam to the spell/effect rules, which the engine
//!   treats as a black box
//! - Loadouts are plain data handed in per hero at construction
//! - `DecisionContext` gives the ability system a read-only view of the battle
//!
//! Each engine owns its ability system instance, so nothing is shared
//! between battles running in parallel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::action::BattleAction;
use crate::battle::participant::Participant;
use crate::core::types::{Turn, WaveNumber};

/// One ability equipped by a hero
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AbilitySlot {
    pub ability_id: String,
    pub level: u32,
    #[serde(default)]
    pub is_ultimate: bool,
}

impl AbilitySlot {
    pub fn new(ability_id: impl Into<String>, level: u32) -> Self {
        Self {
            ability_id: ability_id.into(),
            level,
            is_ultimate: false,
        }
    }

    pub fn ultimate(ability_id: impl Into<String>, level: u32) -> Self {
        Self {
            is_ultimate: true,
            ..Self::new(ability_id, level)
        }
    }
}

/// Ability the system wants an actor to cast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellChoice {
    pub ability_id: String,
    pub level: u32,
    pub is_ultimate: bool,
}

impl From<&AbilitySlot> for SpellChoice {
    fn from(slot: &AbilitySlot) -> Self {
        Self {
            ability_id: slot.ability_id.clone(),
            level: slot.level,
            is_ultimate: slot.is_ultimate,
        }
    }
}

/// Result of one status-effect tick on a participant
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectTick {
    pub damage: Option<u32>,
    pub healing: Option<u32>,
    pub message: Option<String>,
}

/// Read-only battle state handed to the ability system
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub turn: Turn,
    pub wave: Option<WaveNumber>,
    pub player: &'a [Participant],
    pub enemy: &'a [Participant],
    /// False when the actor is player controlled, in manual mode, and has no
    /// ultimate queued
    pub allow_ultimate: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbilityError {
    #[error("Unknown ability: {0}")]
    UnknownAbility(String),

    #[error("Ability on cooldown: {0}")]
    OnCooldown(String),

    #[error("No valid target for ability: {0}")]
    NoValidTarget(String),

    #[error("Cast failed: {0}")]
    CastFailed(String),
}

/// Spell and status-effect rules consumed by the engine
pub trait AbilitySystem {
    /// Advance every cooldown by one turn
    fn reduce_cooldowns(&mut self);

    /// Best ability for `actor` right now, or `None` to fall back to the
    /// engine's own attack logic
    fn determine_best_spell(
        &self,
        actor: &Participant,
        loadout: &[AbilitySlot],
        allies: &[&Participant],
        targets: &[&Participant],
        context: &DecisionContext,
    ) -> Option<SpellChoice>;

    /// Ultimate a player hero fires when its manual ultimate is executed
    ///
    /// The default picks the first ultimate slot in the loadout.
    fn ultimate_for(&self, _actor: &Participant, loadout: &[AbilitySlot]) -> Option<SpellChoice> {
        loadout.iter().find(|slot| slot.is_ultimate).map(SpellChoice::from)
    }

    /// Cast an ability. The returned action lists its hits; the engine
    /// applies them and seals the record.
    fn cast_spell(
        &mut self,
        ability_id: &str,
        actor: &Participant,
        targets: &[&Participant],
        level: u32,
        context: &DecisionContext,
    ) -> Result<BattleAction, AbilityError>;

    /// Tick the participant's status effects once
    ///
    /// Reported damage and healing are applied by the engine, not here.
    fn process_effects(&mut self, participant: &mut Participant) -> Vec<EffectTick>;
}

/// Ability system with no abilities and no effects
///
/// Every hero falls back to basic attacks and the built-in ultimate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAbilities;

impl AbilitySystem for NoAbilities {
    fn reduce_cooldowns(&mut self) {}

    fn determine_best_spell(
        &self,
        _actor: &Participant,
        _loadout: &[AbilitySlot],
        _allies: &[&Participant],
        _targets: &[&Participant],
        _context: &DecisionContext,
    ) -> Option<SpellChoice> {
        None
    }

    fn ultimate_for(&self, _actor: &Participant, _loadout: &[AbilitySlot]) -> Option<SpellChoice> {
        None
    }

    fn cast_spell(
        &mut self,
        ability_id: &str,
        _actor: &Participant,
        _targets: &[&Participant],
        _level: u32,
        _context: &DecisionContext,
    ) -> Result<BattleAction, AbilityError> {
        Err(AbilityError::UnknownAbility(ability_id.to_string()))
    }

    fn process_effects(&mut self, _participant: &mut Participant) -> Vec<EffectTick> {
        Vec::new()
    }
}
