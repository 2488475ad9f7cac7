//! Action resolution
//!
//! Decides what an actor does on its turn: an ability picked by the ability
//! system, the built-in ultimate, or a basic attack. Resolution never
//! mutates participants; it produces a `BattleAction` whose hits the engine
//! then applies.

use rand::Rng;

use crate::battle::ability::{AbilitySlot, AbilitySystem, DecisionContext, SpellChoice};
use crate::battle::action::{ActionKind, BattleAction, TargetHit};
use crate::battle::damage::{
    apply_critical, calculate_damage, roll_critical, roll_variance, DamageKind,
};
use crate::battle::manual::{ManualQueue, PendingManualAction};
use crate::battle::options::BattleMode;
use crate::battle::participant::{Buff, Debuff, Participant, Role, Side};
use crate::battle::targeting::{available_targets, select_target};
use crate::core::config::BattleTuning;
use crate::core::types::{Turn, WaveNumber};

/// Ability id recorded on built-in ultimates
pub const DEFAULT_ULTIMATE_ID: &str = "default_ultimate";

/// Read-only view of the battle from one actor's turn
#[derive(Debug, Clone, Copy)]
pub struct TurnView<'a> {
    pub turn: Turn,
    pub wave: Option<WaveNumber>,
    pub side: Side,
    pub actor: &'a Participant,
    pub loadout: &'a [AbilitySlot],
    pub player: &'a [Participant],
    pub enemy: &'a [Participant],
}

impl<'a> TurnView<'a> {
    fn roster_of(&self, side: Side) -> &'a [Participant] {
        match side {
            Side::Player => self.player,
            Side::Enemy => self.enemy,
        }
    }

    pub fn allies(&self) -> &'a [Participant] {
        self.roster_of(self.side)
    }

    pub fn opponents(&self) -> &'a [Participant] {
        self.roster_of(self.side.opponent())
    }

    pub fn context(&self, allow_ultimate: bool) -> DecisionContext<'a> {
        DecisionContext {
            turn: self.turn,
            wave: self.wave,
            player: self.player,
            enemy: self.enemy,
            allow_ultimate,
        }
    }
}

/// How an actor's turn is to be resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// AI decides, ultimates allowed
    Auto,
    /// AI decides, but no ultimate this turn
    AutoWithoutUltimate,
    /// Fire the queued manual ultimate
    ForcedUltimate(PendingManualAction),
}

/// Pick the directive for an actor, consuming its manual entry if it fires
///
/// Enemies and auto-mode heroes are always AI driven. In manual mode a
/// player hero only ultimates when its gauge is full and an entry is queued.
pub fn choose_directive(
    side: Side,
    mode: BattleMode,
    actor: &Participant,
    energy_cap: u32,
    queue: &mut ManualQueue,
) -> Directive {
    if side != Side::Player || mode != BattleMode::Manual {
        return Directive::Auto;
    }

    if !actor.has_full_energy(energy_cap) {
        return Directive::AutoWithoutUltimate;
    }

    match queue.take(&actor.hero_id) {
        Some(pending) => Directive::ForcedUltimate(pending),
        None => Directive::AutoWithoutUltimate,
    }
}

/// Resolves one actor's action against the battle RNG and ability system
pub struct Resolver<'r, R: Rng + ?Sized> {
    pub abilities: &'r mut (dyn AbilitySystem + Send),
    pub rng: &'r mut R,
    pub tuning: &'r BattleTuning,
}

impl<'r, R: Rng + ?Sized> Resolver<'r, R> {
    pub fn new(
        abilities: &'r mut (dyn AbilitySystem + Send),
        rng: &'r mut R,
        tuning: &'r BattleTuning,
    ) -> Self {
        Self {
            abilities,
            rng,
            tuning,
        }
    }

    /// Resolve the actor's action. `None` when there is nothing to hit.
    pub fn resolve(&mut self, view: &TurnView, directive: Directive) -> Option<BattleAction> {
        match directive {
            Directive::Auto => self.resolve_auto(view, true),
            Directive::AutoWithoutUltimate => self.resolve_auto(view, false),
            Directive::ForcedUltimate(pending) => self.resolve_forced_ultimate(view, &pending),
        }
    }

    fn resolve_auto(&mut self, view: &TurnView, allow_ultimate: bool) -> Option<BattleAction> {
        let eligible = available_targets(view.opponents());
        if eligible.is_empty() {
            return None;
        }

        let allies: Vec<&Participant> = view.allies().iter().filter(|p| p.is_alive()).collect();
        let context = view.context(allow_ultimate);

        let choice = self
            .abilities
            .determine_best_spell(view.actor, view.loadout, &allies, &eligible, &context);

        match choice {
            Some(choice) if choice.is_ultimate && !allow_ultimate => {
                tracing::debug!(actor = %view.actor.hero_id, "ultimate held for manual control");
                self.basic_attack(view, &eligible)
            }
            Some(choice) => match self.cast(view, &choice, &eligible, &context) {
                Some(action) => Some(action),
                None => self.basic_attack(view, &eligible),
            },
            None if allow_ultimate && view.actor.has_full_energy(self.tuning.energy_cap) => {
                self.default_ultimate(view, &eligible, &[])
            }
            None => self.basic_attack(view, &eligible),
        }
    }

    fn resolve_forced_ultimate(
        &mut self,
        view: &TurnView,
        pending: &PendingManualAction,
    ) -> Option<BattleAction> {
        let eligible = available_targets(view.opponents());
        if eligible.is_empty() {
            return None;
        }

        // Requested targets still have to be legal: alive and not shielded
        // by a standing front line
        let explicit: Vec<&Participant> = match &pending.targets {
            Some(ids) => eligible
                .iter()
                .copied()
                .filter(|p| ids.contains(&p.hero_id))
                .collect(),
            None => Vec::new(),
        };

        match self.abilities.ultimate_for(view.actor, view.loadout) {
            Some(choice) => {
                let targets = if explicit.is_empty() { &eligible } else { &explicit };
                let context = view.context(true);
                match self.cast(view, &choice, targets, &context) {
                    Some(action) => Some(action),
                    None => self.resolve_auto(view, true),
                }
            }
            None => self.default_ultimate(view, &eligible, &explicit),
        }
    }

    /// Cast through the ability system; `None` means fall back
    fn cast(
        &mut self,
        view: &TurnView,
        choice: &SpellChoice,
        targets: &[&Participant],
        context: &DecisionContext,
    ) -> Option<BattleAction> {
        let cast = self.abilities.cast_spell(
            &choice.ability_id,
            view.actor,
            targets,
            choice.level,
            context,
        );

        match cast {
            Ok(action) if action.kind == ActionKind::Ultimate && !context.allow_ultimate => {
                tracing::warn!(
                    actor = %view.actor.hero_id,
                    ability = %choice.ability_id,
                    "ability system cast an ultimate that was not allowed, using basic attack"
                );
                None
            }
            Ok(mut action) => {
                action.turn = view.turn;
                action.actor_id = view.actor.hero_id.clone();
                action.actor_name = view.actor.name.clone();
                if action.ability_id.is_none() {
                    action.ability_id = Some(choice.ability_id.clone());
                }
                if action.kind == ActionKind::Ultimate {
                    action.critical = true;
                }
                Some(action)
            }
            Err(err) => {
                tracing::warn!(
                    actor = %view.actor.hero_id,
                    ability = %choice.ability_id,
                    error = %err,
                    "cast failed, falling back to basic attack"
                );
                None
            }
        }
    }

    /// Single-target basic attack
    pub fn basic_attack(&mut self, view: &TurnView, eligible: &[&Participant]) -> Option<BattleAction> {
        let actor = view.actor;
        let target = select_target(actor, eligible)?;

        let variance = roll_variance(&mut *self.rng, self.tuning);
        let roll = calculate_damage(actor, target, DamageKind::Attack, variance);
        let critical = roll_critical(&mut *self.rng, actor, self.tuning);
        let damage = if critical {
            apply_critical(roll.amount, self.tuning)
        } else {
            roll.amount
        };

        let energy = self.tuning.attack_energy_base + self.jitter(self.tuning.attack_energy_jitter);

        let hit = TargetHit {
            critical,
            ..TargetHit::damage(target.hero_id.clone(), damage)
        };
        let mut action = BattleAction::new(view.turn, ActionKind::Attack, actor)
            .with_hit(hit)
            .with_critical(critical)
            .with_energy_gained(energy);
        action.elemental_multiplier = Some(roll.elemental_multiplier);

        Some(action)
    }

    /// Built-in ultimate for heroes without one in the ability system
    ///
    /// `atk * multiplier * rarity`, split 1.2x single target or 0.8x per
    /// target over the whole pool. Ranged DPS always hit the area; everyone
    /// else rolls `ultimate_aoe_chance`. `explicit` narrows the pool when
    /// a manual ultimate named its targets.
    pub fn default_ultimate(
        &mut self,
        view: &TurnView,
        eligible: &[&Participant],
        explicit: &[&Participant],
    ) -> Option<BattleAction> {
        let actor = view.actor;
        let pool = if explicit.is_empty() { eligible } else { explicit };
        if pool.is_empty() {
            return None;
        }

        let area = actor.role == Role::DpsRanged || self.rng.gen_bool(self.tuning.ultimate_aoe_chance);

        let targets: Vec<&Participant> = if area {
            pool.to_vec()
        } else {
            select_target(actor, pool).into_iter().collect()
        };

        let factor = if area {
            self.tuning.ultimate_aoe_factor
        } else {
            self.tuning.ultimate_single_target_factor
        };
        let base = actor.stats.atk as f64 * self.tuning.ultimate_atk_multiplier * actor.rarity.multiplier();
        let per_target = (base * factor).floor() as u32;

        let mut action = BattleAction::new(view.turn, ActionKind::Ultimate, actor)
            .with_ability(DEFAULT_ULTIMATE_ID)
            .with_critical(true)
            .with_message(if area { "area ultimate" } else { "single-target ultimate" });

        for target in targets {
            action = action.with_hit(TargetHit {
                critical: true,
                debuffs: vec![Debuff::DefenseDown],
                ..TargetHit::damage(target.hero_id.clone(), per_target)
            });
        }

        // Self buff rides along as a hit on the actor, not as a target
        action.hits.push(TargetHit {
            buffs: vec![Buff::AttackUp],
            ..TargetHit::damage(actor.hero_id.clone(), 0)
        });

        Some(action)
    }

    fn jitter(&mut self, upper: u32) -> u32 {
        if upper == 0 {
            0
        } else {
            self.rng.gen_range(0..upper)
        }
    }
}
