//! Battle system - turn-based hero battles with an energy economy
//!
//! Two rosters of up to five heroes fight in rounds. Positions gate who can
//! be hit, energy gates ultimates, and spells come from a pluggable ability
//! system.
//!
//! Key rules:
//! - The back line (slots 3-5) is untouchable while its front line stands
//! - Initiative is re-rolled every turn
//! - In manual mode, player ultimates only fire when queued
//! - Multi-wave battles keep the player roster's state between waves

pub mod ability;
pub mod action;
pub mod constants;
pub mod damage;
pub mod engine;
pub mod manual;
pub mod options;
pub mod participant;
pub mod resolver;
pub mod result;
pub mod targeting;
pub mod waves;

// Re-exports for convenient access
pub use ability::{
    AbilityError, AbilitySlot, AbilitySystem, DecisionContext, EffectTick, NoAbilities, SpellChoice,
};
pub use action::{ActionKind, ActionLog, BattleAction, ParticipantSnapshot, TargetHit};
pub use constants::*;
pub use damage::{
    apply_critical, calculate_damage, critical_chance, elemental_multiplier, is_critical,
    roll_critical, roll_variance, DamageKind, DamageRoll,
};
pub use engine::{BattleEngine, BattlePhase, BattleSetup, HeroStatus, TurnOutcome};
pub use manual::{check_manual_ultimate, ManualQueue, PendingManualAction};
pub use options::{BattleMode, BattleOptions, BattleSpeed};
pub use participant::{
    ActiveEffect, Buff, CombatStatus, Debuff, Element, Participant, Position, Rarity, Role, Side,
    Stats,
};
pub use resolver::{choose_directive, Directive, Resolver, TurnView, DEFAULT_ULTIMATE_ID};
pub use result::{scaled_duration, BattleResult, BattleStats};
pub use targeting::{available_targets, select_best_target_by_role, select_target, weakest};
pub use waves::{HeroWaveState, RewardBundle, WaveConfig, WaveData, WaveSnapshot};
