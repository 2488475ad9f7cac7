//! Damage and critical hit math
//!
//! Pure functions. Random inputs (variance factor, crit roll) are passed in
//! so the formulas can be checked with pinned values; the `roll_*` helpers
//! draw them from the battle RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::constants::{
    ELEMENT_ADVANTAGE, ELEMENT_DISADVANTAGE, ELEMENT_NEUTRAL, MAGIC_DEF_WEIGHT, MELEE_FORCE_SCALE,
    PHYSICAL_DEF_WEIGHT, SKILL_DAMAGE_MULTIPLIER, SKILL_INTELLIGENCE_SCALE,
    ULTIMATE_DAMAGE_MULTIPLIER, ULTIMATE_INTELLIGENCE_SCALE,
};
use crate::battle::participant::{Element, Participant};
use crate::core::config::BattleTuning;

/// Which formula a hit uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageKind {
    Attack,
    Skill,
    Ultimate,
}

/// Outcome of the damage formula
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub amount: u32,
    pub elemental_multiplier: f64,
}

/// Elemental multiplier for `attacker` hitting `defender`
pub fn elemental_multiplier(attacker: Element, defender: Element) -> f64 {
    if attacker.beats() == defender {
        ELEMENT_ADVANTAGE
    } else if defender.beats() == attacker {
        ELEMENT_DISADVANTAGE
    } else {
        ELEMENT_NEUTRAL
    }
}

/// Offensive value before defense and multipliers
fn offensive_power(attacker: &Participant, kind: DamageKind) -> f64 {
    let stats = &attacker.stats;
    let mut power = stats.atk as f64;

    match kind {
        DamageKind::Attack => {}
        DamageKind::Skill => {
            power += SKILL_INTELLIGENCE_SCALE * stats.intelligence as f64;
            power *= SKILL_DAMAGE_MULTIPLIER;
        }
        DamageKind::Ultimate => {
            power += ULTIMATE_INTELLIGENCE_SCALE * stats.intelligence as f64;
            power *= ULTIMATE_DAMAGE_MULTIPLIER;
        }
    }

    if attacker.role.is_melee() {
        power += MELEE_FORCE_SCALE * stats.force as f64;
    }

    power
}

/// Defense the hit is checked against
fn effective_defense(defender: &Participant, kind: DamageKind) -> f64 {
    let stats = &defender.stats;
    match kind {
        DamageKind::Attack => stats.def as f64,
        DamageKind::Skill | DamageKind::Ultimate => {
            MAGIC_DEF_WEIGHT * stats.magic_def as f64 + PHYSICAL_DEF_WEIGHT * stats.def as f64
        }
    }
}

/// Damage of one hit before any critical bonus
///
/// `max(1, power - defense / 2)` scaled by element, attacker rarity and the
/// variance factor, floored.
pub fn calculate_damage(
    attacker: &Participant,
    defender: &Participant,
    kind: DamageKind,
    variance: f64,
) -> DamageRoll {
    let raw = (offensive_power(attacker, kind) - effective_defense(defender, kind) / 2.0).max(1.0);
    let element = elemental_multiplier(attacker.element, defender.element);
    let amount = (raw * element * attacker.rarity.multiplier() * variance).floor();

    DamageRoll {
        amount: amount.max(0.0) as u32,
        elemental_multiplier: element,
    }
}

/// Draw a variance factor in [variance_min, variance_max]
pub fn roll_variance<R: Rng + ?Sized>(rng: &mut R, tuning: &BattleTuning) -> f64 {
    if tuning.variance_max <= tuning.variance_min {
        return tuning.variance_min;
    }
    rng.gen_range(tuning.variance_min..=tuning.variance_max)
}

/// Critical chance of a basic attack
pub fn critical_chance(attacker: &Participant, tuning: &BattleTuning) -> f64 {
    let chance = tuning.crit_base_chance
        + attacker.stats.speed as f64 / tuning.crit_speed_divisor
        + attacker.rarity.multiplier() * tuning.crit_rarity_weight;
    chance.min(tuning.crit_chance_cap)
}

/// Whether a roll in [0, 1) lands a critical
pub fn is_critical(attacker: &Participant, roll: f64, tuning: &BattleTuning) -> bool {
    roll < critical_chance(attacker, tuning)
}

pub fn roll_critical<R: Rng + ?Sized>(
    rng: &mut R,
    attacker: &Participant,
    tuning: &BattleTuning,
) -> bool {
    is_critical(attacker, rng.gen::<f64>(), tuning)
}

/// Apply the critical multiplier to a basic attack
pub fn apply_critical(damage: u32, tuning: &BattleTuning) -> u32 {
    (damage as f64 * tuning.crit_multiplier).floor() as u32
}
