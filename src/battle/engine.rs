//! Battle engine
//!
//! Each turn: cooldowns -> initiative -> per actor (energy, effects, action) -> end check
//!
//! The engine owns both rosters for the lifetime of the battle. Callers only
//! see participants through read-only accessors and the action log snapshots.

use std::time::{Duration, Instant};

use ahash::{AHashMap, AHashSet};
use ordered_float::OrderedFloat;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::battle::ability::{AbilitySlot, AbilitySystem, NoAbilities};
use crate::battle::action::{ActionKind, ActionLog, BattleAction, ParticipantSnapshot};
use crate::battle::manual::{check_manual_ultimate, ManualQueue, PendingManualAction};
use crate::battle::options::BattleOptions;
use crate::battle::participant::{Participant, Side};
use crate::battle::resolver::{choose_directive, Resolver, TurnView};
use crate::battle::result::{scaled_duration, BattleResult, BattleStats};
use crate::battle::waves::{RewardBundle, WaveConfig, WaveData};
use crate::core::config::BattleTuning;
use crate::core::error::{BattleError, Result};
use crate::core::types::{BattleId, HeroId, Turn, WaveNumber};

/// Battle lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattlePhase {
    #[default]
    Pending, // Constructed, no turn run yet
    Active,   // Turns in progress
    Finished, // Result computed
}

/// What a single `step_turn` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    InProgress,
    /// The given wave was cleared and the next one spawned
    WaveCleared(WaveNumber),
    Finished,
}

/// Live status of one hero, as shown to the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroStatus {
    pub hero_id: HeroId,
    pub side: Side,
    pub current_hp: u32,
    pub max_hp: u32,
    pub energy: u32,
    pub alive: bool,
    pub can_ultimate: bool,
}

/// Everything needed to start a battle
#[derive(Debug, Clone, Default)]
pub struct BattleSetup {
    pub player: Vec<Participant>,
    /// Enemy roster for classic battles; wave battles spawn from `waves`
    pub enemy: Vec<Participant>,
    /// Ability loadouts by hero, for either side
    pub loadouts: AHashMap<HeroId, Vec<AbilitySlot>>,
    pub options: BattleOptions,
    /// More than one wave switches the battle to wave mode
    pub waves: Vec<WaveConfig>,
    pub tuning: BattleTuning,
    /// Granted on a classic-mode victory
    pub victory_rewards: RewardBundle,
}

impl BattleSetup {
    pub fn new(player: Vec<Participant>, enemy: Vec<Participant>) -> Self {
        Self {
            player,
            enemy,
            ..Self::default()
        }
    }

    /// Wave battle: enemies come from the wave configs
    pub fn waves(player: Vec<Participant>, waves: Vec<WaveConfig>) -> Self {
        Self {
            player,
            waves,
            ..Self::default()
        }
    }

    pub fn with_options(mut self, options: BattleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_tuning(mut self, tuning: BattleTuning) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn with_loadout(mut self, hero_id: impl Into<HeroId>, slots: Vec<AbilitySlot>) -> Self {
        self.loadouts.insert(hero_id.into(), slots);
        self
    }

    pub fn with_victory_rewards(mut self, rewards: RewardBundle) -> Self {
        self.victory_rewards = rewards;
        self
    }
}

/// Turn-based battle between a player roster and an enemy roster
pub struct BattleEngine<R: Rng = ChaCha8Rng> {
    id: BattleId,

    // Rosters
    player: Vec<Participant>,
    enemy: Vec<Participant>,
    player_ids: AHashSet<HeroId>,
    loadouts: AHashMap<HeroId, Vec<AbilitySlot>>,

    // Configuration
    options: BattleOptions,
    tuning: BattleTuning,
    waves: Vec<WaveConfig>,
    victory_rewards: RewardBundle,

    // Systems
    abilities: Box<dyn AbilitySystem + Send>,
    rng: R,
    manual_queue: ManualQueue,

    // Progress
    phase: BattlePhase,
    turn: Turn,
    wave_turn: Turn,
    wave_data: Option<WaveData>,
    log: ActionLog,
    elapsed: Duration,
    result: Option<BattleResult>,
}

impl BattleEngine<ChaCha8Rng> {
    /// Build an engine whose randomness is fully determined by `seed`
    pub fn new(setup: BattleSetup, seed: u64) -> Result<Self> {
        Self::with_rng(setup, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> BattleEngine<R> {
    /// Build an engine around an injected RNG
    ///
    /// Fails before anything is simulated when the options, tuning or
    /// rosters are invalid.
    pub fn with_rng(setup: BattleSetup, rng: R) -> Result<Self> {
        let BattleSetup {
            mut player,
            mut enemy,
            loadouts,
            options,
            mut waves,
            tuning,
            mut victory_rewards,
        } = setup;

        options.validate()?;
        tuning.validate()?;

        if waves.len() == 1 {
            tracing::warn!("single wave config treated as a classic battle");
            if let Some(wave) = waves.pop() {
                if enemy.is_empty() {
                    enemy = wave.enemies;
                    victory_rewards.merge(&wave.rewards);
                }
            }
        }

        if player.is_empty() {
            return Err(BattleError::EmptyRoster(Side::Player));
        }
        validate_positions(&player)?;

        let wave_data = if waves.is_empty() {
            if enemy.is_empty() {
                return Err(BattleError::EmptyRoster(Side::Enemy));
            }
            validate_positions(&enemy)?;
            check_unique(player.iter().chain(enemy.iter()))?;
            None
        } else {
            if !enemy.is_empty() {
                tracing::warn!(
                    ignored = enemy.len(),
                    "enemy roster ignored in a wave battle"
                );
            }
            for wave in &waves {
                if wave.enemies.is_empty() {
                    return Err(BattleError::EmptyRoster(Side::Enemy));
                }
                validate_positions(&wave.enemies)?;
                check_unique(player.iter().chain(wave.enemies.iter()))?;
            }
            enemy = waves[0].spawn_enemies();
            let mut data = WaveData::new(waves.len() as u32);
            data.current_wave = 1;
            Some(data)
        };

        for participant in player.iter_mut().chain(enemy.iter_mut()) {
            participant.reset_for_battle();
        }

        let player_ids = player.iter().map(|p| p.hero_id.clone()).collect();

        Ok(Self {
            id: BattleId::new(),
            player,
            enemy,
            player_ids,
            loadouts,
            options,
            tuning,
            waves,
            victory_rewards,
            abilities: Box::new(NoAbilities),
            rng,
            manual_queue: ManualQueue::new(),
            phase: BattlePhase::Pending,
            turn: 0,
            wave_turn: 0,
            wave_data,
            log: ActionLog::new(),
            elapsed: Duration::ZERO,
            result: None,
        })
    }

    /// Plug in the ability and status-effect system
    pub fn with_abilities(mut self, abilities: Box<dyn AbilitySystem + Send>) -> Self {
        self.abilities = abilities;
        self
    }

    // ------------------------------------------------------------------
    // Simulation
    // ------------------------------------------------------------------

    /// Run the battle to completion
    ///
    /// Calling this on a finished battle returns the stored result.
    pub fn simulate_battle(&mut self) -> BattleResult {
        loop {
            if let Some(result) = &self.result {
                return result.clone();
            }
            self.step_turn();
        }
    }

    /// Run exactly one turn, plus the wave transition or finish it triggers
    pub fn step_turn(&mut self) -> TurnOutcome {
        match self.phase {
            BattlePhase::Finished => return TurnOutcome::Finished,
            BattlePhase::Pending => {
                self.phase = BattlePhase::Active;
                tracing::info!(
                    battle_id = %self.id.0,
                    mode = ?self.options.mode,
                    player = self.player.len(),
                    waves = self.waves.len(),
                    "battle started"
                );
            }
            BattlePhase::Active => {}
        }

        let started = Instant::now();
        let outcome = self.run_turn();
        self.elapsed += started.elapsed();

        if outcome == TurnOutcome::Finished {
            self.finish();
        }
        outcome
    }

    fn run_turn(&mut self) -> TurnOutcome {
        self.turn += 1;
        self.wave_turn += 1;
        self.abilities.reduce_cooldowns();

        let order = self.turn_order();
        tracing::debug!(turn = self.turn, actors = order.len(), "turn order rolled");

        for (side, idx) in order {
            if !self.roster(side)[idx].is_alive() {
                continue;
            }
            self.take_turn(side, idx);
            if !side_alive(&self.player) || !side_alive(&self.enemy) {
                break;
            }
        }

        if !side_alive(&self.player) {
            return TurnOutcome::Finished;
        }

        if !side_alive(&self.enemy) {
            if self.wave_data.is_some() {
                return self.advance_wave();
            }
            return TurnOutcome::Finished;
        }

        let (turns, cap) = match self.wave_data {
            Some(_) => (self.wave_turn, self.tuning.max_wave_turns),
            None => (self.turn, self.tuning.max_turns),
        };
        if turns >= cap {
            tracing::warn!(turn = self.turn, cap, "turn cap reached, ending battle");
            return TurnOutcome::Finished;
        }

        TurnOutcome::InProgress
    }

    /// Living participants of both sides, fastest first
    ///
    /// Initiative is `speed + uniform[0, jitter)`, rolled fresh every turn.
    fn turn_order(&mut self) -> Vec<(Side, usize)> {
        let jitter = self.tuning.initiative_jitter;
        let mut order: Vec<(Side, usize, OrderedFloat<f64>)> = Vec::new();

        for (side, roster) in [(Side::Player, &self.player), (Side::Enemy, &self.enemy)] {
            for (idx, participant) in roster.iter().enumerate() {
                if !participant.is_alive() {
                    continue;
                }
                let roll = if jitter > 0.0 {
                    self.rng.gen_range(0.0..jitter)
                } else {
                    0.0
                };
                order.push((side, idx, OrderedFloat(participant.stats.speed as f64 + roll)));
            }
        }

        order.sort_by(|a, b| b.2.cmp(&a.2));
        order.into_iter().map(|(side, idx, _)| (side, idx)).collect()
    }

    fn take_turn(&mut self, side: Side, idx: usize) {
        let cap = self.tuning.energy_cap;

        // Energy
        let base = self.tuning.energy_base_gain as f64;
        let divisor = self.tuning.moral_energy_divisor as f64;
        let jitter = match self.tuning.energy_gain_jitter {
            0 => 0.0,
            upper => self.rng.gen_range(0.0..upper as f64),
        };
        let actor = self.roster_mut(side, idx);
        let raw = base + actor.stats.moral as f64 / divisor + jitter;
        let gained = actor.gain_energy(raw.floor() as u32, cap);
        tracing::trace!(actor = %actor.hero_id, gained, energy = actor.energy, "energy tick");

        // Status effects
        if let Some(tick) = self.tick_effects(side, idx) {
            self.seal(tick);
        }
        if !self.roster(side)[idx].is_alive() {
            tracing::debug!(actor = %self.roster(side)[idx].hero_id, "died to status effects");
            return;
        }

        // Action
        let wave = self.current_wave();
        let actor = match side {
            Side::Player => &self.player[idx],
            Side::Enemy => &self.enemy[idx],
        };
        let directive = choose_directive(side, self.options.mode, actor, cap, &mut self.manual_queue);
        let loadout = self
            .loadouts
            .get(&actor.hero_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let view = TurnView {
            turn: self.turn,
            wave,
            side,
            actor,
            loadout,
            player: &self.player,
            enemy: &self.enemy,
        };

        let mut resolver = Resolver::new(&mut *self.abilities, &mut self.rng, &self.tuning);
        match resolver.resolve(&view, directive) {
            Some(action) => self.apply_action(side, idx, action),
            None => tracing::debug!(actor = %actor.hero_id, "no target available"),
        }
    }

    /// Apply the actor's status-effect ticks, returning a passive record
    /// when anything landed
    fn tick_effects(&mut self, side: Side, idx: usize) -> Option<BattleAction> {
        let actor = match side {
            Side::Player => &mut self.player[idx],
            Side::Enemy => &mut self.enemy[idx],
        };
        let ticks = self.abilities.process_effects(actor);
        if ticks.is_empty() {
            return None;
        }

        let mut damage = 0;
        let mut healing = 0;
        let mut messages = Vec::new();
        for tick in ticks {
            if let Some(amount) = tick.damage {
                damage += actor.take_damage(amount);
            }
            if let Some(amount) = tick.healing {
                healing += actor.heal(amount);
            }
            if let Some(message) = tick.message {
                messages.push(message);
            }
        }

        if damage == 0 && healing == 0 {
            return None;
        }

        let mut action = BattleAction::new(self.turn, ActionKind::Passive, actor);
        action.target_ids.push(actor.hero_id.clone());
        action.damage = (damage > 0).then_some(damage);
        action.healing = (healing > 0).then_some(healing);
        if !messages.is_empty() {
            action.message = Some(messages.join("; "));
        }
        Some(action)
    }

    /// Apply a resolved action's hits and energy, then log it
    fn apply_action(&mut self, side: Side, idx: usize, mut action: BattleAction) {
        let mut damage = 0;
        let mut healing = 0;
        let mut dealt_damage = false;
        let mut dealt_healing = false;

        for hit in &action.hits {
            let target = self
                .player
                .iter_mut()
                .chain(self.enemy.iter_mut())
                .find(|p| p.hero_id == hit.target_id && p.is_alive());
            let Some(target) = target else {
                tracing::debug!(target = %hit.target_id, "hit target not found or dead, skipping");
                continue;
            };

            if hit.damage > 0 {
                dealt_damage = true;
                damage += target.take_damage(hit.damage);
            }
            if hit.healing > 0 {
                dealt_healing = true;
                healing += target.heal(hit.healing);
            }
            for buff in &hit.buffs {
                target.add_buff(buff.clone());
                if !action.buffs_applied.contains(buff) {
                    action.buffs_applied.push(buff.clone());
                }
            }
            for debuff in &hit.debuffs {
                target.add_debuff(debuff.clone());
                if !action.debuffs_applied.contains(debuff) {
                    action.debuffs_applied.push(debuff.clone());
                }
            }
        }

        action.damage = dealt_damage.then_some(damage);
        action.healing = dealt_healing.then_some(healing);

        let cap = self.tuning.energy_cap;
        let actor = self.roster_mut(side, idx);
        if action.kind == ActionKind::Ultimate {
            action.energy_spent = Some(actor.drain_energy());
            action.energy_gained = None;
        } else {
            if let Some(cost) = action.energy_spent {
                action.energy_spent = Some(actor.spend_energy(cost));
            }
            if let Some(gain) = action.energy_gained {
                action.energy_gained = Some(actor.gain_energy(gain, cap));
            }
        }

        tracing::debug!(
            turn = self.turn,
            actor = %action.actor_id,
            kind = ?action.kind,
            targets = action.target_ids.len(),
            damage = action.damage.unwrap_or(0),
            critical = action.critical,
            "action resolved"
        );
        self.seal(action);
    }

    /// Stamp turn, wave and snapshot onto an action and append it
    fn seal(&mut self, mut action: BattleAction) {
        action.turn = self.turn;
        action.wave = self.current_wave();
        action.snapshot = self
            .player
            .iter()
            .map(|p| ParticipantSnapshot::of(p, Side::Player))
            .chain(self.enemy.iter().map(|p| ParticipantSnapshot::of(p, Side::Enemy)))
            .collect();
        self.log.push(action);
        self.drop_fallen_from_queue();
    }

    /// Fallen heroes can never fire their queued ultimate
    fn drop_fallen_from_queue(&mut self) {
        if self.manual_queue.is_empty() {
            return;
        }
        for hero in self.player.iter().filter(|p| !p.is_alive()) {
            if self.manual_queue.contains(&hero.hero_id) {
                self.manual_queue.take(&hero.hero_id);
                tracing::debug!(hero = %hero.hero_id, "dropped queued ultimate of fallen hero");
            }
        }
    }

    /// Record the cleared wave and spawn the next one
    fn advance_wave(&mut self) -> TurnOutcome {
        let Some(data) = self.wave_data.as_mut() else {
            return TurnOutcome::Finished;
        };

        let wave = data.current_wave;
        let rewards = self
            .waves
            .get(wave as usize - 1)
            .map(|config| config.rewards.clone())
            .unwrap_or_default();
        data.record_clear(wave, self.wave_turn, &self.player, &rewards);
        tracing::info!(wave, turns = self.wave_turn, "wave cleared");

        if data.all_cleared() {
            return TurnOutcome::Finished;
        }

        let next = wave + 1;
        let Some(config) = self.waves.get(next as usize - 1) else {
            return TurnOutcome::Finished;
        };
        data.current_wave = next;
        self.enemy = config.spawn_enemies();
        self.wave_turn = 0;
        tracing::info!(
            wave = next,
            enemies = self.enemy.len(),
            boss = config.is_boss,
            "wave spawned"
        );

        TurnOutcome::WaveCleared(wave)
    }

    fn finish(&mut self) {
        let player_alive = side_alive(&self.player);
        let victory = match &self.wave_data {
            Some(data) => player_alive && data.all_cleared(),
            None => player_alive,
        };

        let rewards = match &self.wave_data {
            Some(data) => data.collected_rewards.clone(),
            None if victory => self.victory_rewards.clone(),
            None => RewardBundle::default(),
        };

        let result = BattleResult {
            battle_id: self.id,
            victory,
            winner: if victory { Side::Player } else { Side::Enemy },
            total_turns: self.turn,
            duration_ms: scaled_duration(self.elapsed, self.options.speed).as_millis() as u64,
            rewards,
            stats: BattleStats::from_actions(self.log.iter(), &self.player_ids),
            completed_waves: self.wave_data.as_ref().map(|data| data.completed_waves),
        };

        tracing::info!(
            battle_id = %self.id.0,
            victory,
            turns = self.turn,
            actions = self.log.len(),
            "battle finished"
        );

        self.phase = BattlePhase::Finished;
        self.manual_queue.clear();
        self.result = Some(result);
    }

    // ------------------------------------------------------------------
    // Manual control
    // ------------------------------------------------------------------

    /// Queue a hero's ultimate for its next turn, replacing any earlier entry
    pub fn queue_manual_ultimate(
        &mut self,
        hero_id: &HeroId,
        targets: Option<Vec<HeroId>>,
    ) -> Result<()> {
        check_manual_ultimate(hero_id, &self.player, &self.enemy, self.tuning.energy_cap)?;

        let replaced = self
            .manual_queue
            .insert(PendingManualAction::ultimate(hero_id.clone(), targets));
        tracing::debug!(hero = %hero_id, replaced = replaced.is_some(), "manual ultimate queued");
        Ok(())
    }

    /// `queue_manual_ultimate` without targets, reporting only success
    pub fn add_manual_ultimate(&mut self, hero_id: &HeroId) -> bool {
        match self.queue_manual_ultimate(hero_id, None) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(hero = %hero_id, error = %err, "manual ultimate rejected");
                false
            }
        }
    }

    pub fn pending_manual_actions(&self) -> Vec<PendingManualAction> {
        self.manual_queue.entries()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn id(&self) -> BattleId {
        self.id
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == BattlePhase::Finished
    }

    /// Turns run so far, across all waves
    pub fn turn(&self) -> Turn {
        self.turn
    }

    pub fn options(&self) -> &BattleOptions {
        &self.options
    }

    pub fn tuning(&self) -> &BattleTuning {
        &self.tuning
    }

    /// Copy of the action log so far
    pub fn actions(&self) -> Vec<BattleAction> {
        self.log.entries().to_vec()
    }

    pub fn action_log(&self) -> &ActionLog {
        &self.log
    }

    pub fn wave_data(&self) -> Option<&WaveData> {
        self.wave_data.as_ref()
    }

    pub fn result(&self) -> Option<&BattleResult> {
        self.result.as_ref()
    }

    pub fn player_roster(&self) -> &[Participant] {
        &self.player
    }

    /// Current enemy roster (the active wave in wave battles)
    pub fn enemy_roster(&self) -> &[Participant] {
        &self.enemy
    }

    pub fn hero_status(&self, hero_id: &HeroId) -> Option<HeroStatus> {
        self.hero_statuses()
            .into_iter()
            .find(|status| &status.hero_id == hero_id)
    }

    /// Status of every hero on both current rosters, player first
    pub fn hero_statuses(&self) -> Vec<HeroStatus> {
        let cap = self.tuning.energy_cap;
        let status = |p: &Participant, side: Side| HeroStatus {
            hero_id: p.hero_id.clone(),
            side,
            current_hp: p.current_hp,
            max_hp: p.stats.max_hp,
            energy: p.energy,
            alive: p.is_alive(),
            can_ultimate: p.is_alive() && p.has_full_energy(cap),
        };

        self.player
            .iter()
            .map(|p| status(p, Side::Player))
            .chain(self.enemy.iter().map(|p| status(p, Side::Enemy)))
            .collect()
    }

    fn current_wave(&self) -> Option<WaveNumber> {
        self.wave_data.as_ref().map(|data| data.current_wave)
    }

    fn roster(&self, side: Side) -> &[Participant] {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    fn roster_mut(&mut self, side: Side, idx: usize) -> &mut Participant {
        match side {
            Side::Player => &mut self.player[idx],
            Side::Enemy => &mut self.enemy[idx],
        }
    }
}

fn side_alive(roster: &[Participant]) -> bool {
    roster.iter().any(Participant::is_alive)
}

fn validate_positions(roster: &[Participant]) -> Result<()> {
    match roster.iter().find(|p| !p.position.is_valid()) {
        Some(p) => Err(BattleError::InvalidPosition {
            hero_id: p.hero_id.clone(),
            position: p.position.slot(),
        }),
        None => Ok(()),
    }
}

fn check_unique<'a>(participants: impl Iterator<Item = &'a Participant>) -> Result<()> {
    let mut seen = AHashSet::new();
    for participant in participants {
        if !seen.insert(&participant.hero_id) {
            return Err(BattleError::DuplicateHero(participant.hero_id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ability::{AbilityError, DecisionContext, EffectTick, SpellChoice};
    use crate::battle::action::TargetHit;
    use crate::battle::options::{BattleMode, BattleSpeed};

    fn squad() -> Vec<Participant> {
        vec![
            Participant::test_tank("p_tank", 1),
            Participant::test_warrior("p_warrior", 2),
            Participant::test_archer("p_archer", 3),
            Participant::test_healer("p_healer", 4),
        ]
    }

    fn foes() -> Vec<Participant> {
        vec![
            Participant::test_tank("e_tank", 1),
            Participant::test_warrior("e_warrior", 2),
            Participant::test_archer("e_archer", 4),
        ]
    }

    /// Player hero that one-shots anything and always acts first
    fn crusher(id: &str, slot: u8) -> Participant {
        let mut hero = Participant::test_warrior(id, slot);
        hero.stats.atk = 100_000;
        hero.stats.speed = 10_000;
        hero
    }

    fn engine(seed: u64) -> BattleEngine {
        BattleEngine::new(BattleSetup::new(squad(), foes()), seed).unwrap()
    }

    #[test]
    fn test_speed_above_vip_ceiling_is_rejected() {
        let setup = BattleSetup::new(squad(), foes())
            .with_options(BattleOptions::new(BattleMode::Auto, BattleSpeed::X3, 0));
        assert!(matches!(
            BattleEngine::new(setup, 1),
            Err(BattleError::SpeedNotPermitted { requested: 3, max: 1, vip_level: 0 })
        ));
    }

    #[test]
    fn test_roster_validation() {
        assert!(matches!(
            BattleEngine::new(BattleSetup::new(Vec::new(), foes()), 1),
            Err(BattleError::EmptyRoster(Side::Player))
        ));
        assert!(matches!(
            BattleEngine::new(BattleSetup::new(squad(), Vec::new()), 1),
            Err(BattleError::EmptyRoster(Side::Enemy))
        ));

        let mut clash = foes();
        clash[0].hero_id = HeroId::new("p_tank");
        assert!(matches!(
            BattleEngine::new(BattleSetup::new(squad(), clash), 1),
            Err(BattleError::DuplicateHero(_))
        ));

        let mut misplaced = squad();
        misplaced[3].position.0 = 6;
        assert!(matches!(
            BattleEngine::new(BattleSetup::new(misplaced, foes()), 1),
            Err(BattleError::InvalidPosition { position: 6, .. })
        ));
    }

    #[test]
    fn test_construction_resets_participants() {
        let mut player = squad();
        player[0].take_damage(500);
        player[0].energy = 70;
        player[1].take_damage(u32::MAX);

        let engine = BattleEngine::new(BattleSetup::new(player, foes()), 1).unwrap();

        for p in engine.player_roster() {
            assert!(p.is_alive());
            assert_eq!(p.current_hp, p.stats.max_hp);
            assert_eq!(p.energy, 0);
        }
        assert_eq!(engine.phase(), BattlePhase::Pending);
    }

    #[test]
    fn test_simulate_runs_to_completion() {
        let mut engine = engine(42);
        let result = engine.simulate_battle();

        assert!(engine.is_finished());
        assert!(result.total_turns >= 1);
        assert!(result.total_turns <= 200);
        assert_eq!(result.battle_id, engine.id());
        assert_eq!(result.completed_waves, None);
        assert!(!engine.action_log().is_empty());

        // Finished battles keep returning the same result
        let again = engine.simulate_battle();
        assert_eq!(again, result);
        assert_eq!(engine.step_turn(), TurnOutcome::Finished);
    }

    #[test]
    fn test_same_seed_same_log() {
        let mut a = engine(7);
        let mut b = engine(7);
        let ra = a.simulate_battle();
        let rb = b.simulate_battle();

        assert_eq!(a.actions(), b.actions());
        assert_eq!(ra.total_turns, rb.total_turns);
        assert_eq!(ra.victory, rb.victory);
    }

    #[test]
    fn test_actions_are_sealed_with_snapshots() {
        let mut engine = engine(3);
        engine.step_turn();

        let actions = engine.actions();
        assert!(!actions.is_empty());
        for action in &actions {
            assert_eq!(action.turn, 1);
            assert_eq!(action.wave, None);
            assert_eq!(action.snapshot.len(), 7);
        }
    }

    #[test]
    fn test_turn_cap_ends_battle() {
        let tuning = BattleTuning {
            max_turns: 2,
            ..BattleTuning::default()
        };
        let setup = BattleSetup::new(squad(), foes()).with_tuning(tuning);
        let mut engine = BattleEngine::new(setup, 5).unwrap();

        assert_eq!(engine.step_turn(), TurnOutcome::InProgress);
        assert_eq!(engine.step_turn(), TurnOutcome::Finished);
        let result = engine.result().unwrap();
        assert_eq!(result.total_turns, 2);
        // Both sides standing counts as a player win
        assert!(result.victory);
    }

    #[test]
    fn test_classic_victory_grants_rewards() {
        let setup = BattleSetup::new(vec![crusher("hero", 1)], vec![Participant::test_archer("rat", 3)])
            .with_victory_rewards(RewardBundle::new(250, 5, 80));
        let mut engine = BattleEngine::new(setup, 9).unwrap();

        let result = engine.simulate_battle();
        assert!(result.victory);
        assert_eq!(result.winner, Side::Player);
        assert_eq!(result.total_turns, 1);
        assert_eq!(result.rewards.gold, 250);
        assert_eq!(result.stats.total_damage_dealt, 1200);
    }

    #[test]
    fn test_manual_queue_through_engine() {
        let setup = BattleSetup::new(squad(), foes()).with_options(BattleOptions::manual());
        let mut engine = BattleEngine::new(setup, 1).unwrap();
        let tank = HeroId::new("p_tank");

        assert!(!engine.add_manual_ultimate(&tank));
        assert!(matches!(
            engine.queue_manual_ultimate(&HeroId::new("e_tank"), None),
            Err(BattleError::NotPlayerControlled(_))
        ));

        engine.player[0].energy = 100;
        assert!(engine.add_manual_ultimate(&tank));
        assert!(engine.add_manual_ultimate(&tank));
        assert_eq!(engine.pending_manual_actions().len(), 1);
        assert!(engine.hero_status(&tank).unwrap().can_ultimate);
    }

    #[test]
    fn test_hero_statuses_cover_both_sides() {
        let engine = engine(1);
        let statuses = engine.hero_statuses();

        assert_eq!(statuses.len(), 7);
        assert_eq!(statuses[0].side, Side::Player);
        assert_eq!(statuses[6].side, Side::Enemy);
        assert!(statuses.iter().all(|s| s.alive && !s.can_ultimate));
        assert!(engine.hero_status(&HeroId::new("nobody")).is_none());
    }

    /// Burns one hero for lethal damage every turn
    struct Doom {
        victim: HeroId,
    }

    impl AbilitySystem for Doom {
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

        fn cast_spell(
            &mut self,
            ability_id: &str,
            _actor: &Participant,
            _targets: &[&Participant],
            _level: u32,
            _context: &DecisionContext,
        ) -> std::result::Result<BattleAction, AbilityError> {
            Err(AbilityError::UnknownAbility(ability_id.to_string()))
        }

        fn process_effects(&mut self, participant: &mut Participant) -> Vec<EffectTick> {
            if participant.hero_id != self.victim {
                return Vec::new();
            }
            vec![EffectTick {
                damage: Some(1_000_000),
                healing: None,
                message: Some("burn".into()),
            }]
        }
    }

    #[test]
    fn test_effect_death_skips_action() {
        let doomed = HeroId::new("p_archer");
        let mut engine = engine(4).with_abilities(Box::new(Doom { victim: doomed.clone() }));
        engine.step_turn();

        let actions = engine.actions();
        let by_doomed: Vec<&BattleAction> = actions.iter().filter(|a| a.actor_id == doomed).collect();
        assert_eq!(by_doomed.len(), 1);
        assert_eq!(by_doomed[0].kind, ActionKind::Passive);
        assert_eq!(by_doomed[0].damage, Some(1200));
        assert_eq!(by_doomed[0].message.as_deref(), Some("burn"));
        assert!(!engine.hero_status(&doomed).unwrap().alive);
    }

    #[test]
    fn test_fallen_hero_leaves_manual_queue() {
        let doomed = HeroId::new("p_archer");
        let setup = BattleSetup::new(squad(), foes()).with_options(BattleOptions::manual());
        let mut engine = BattleEngine::new(setup, 4)
            .unwrap()
            .with_abilities(Box::new(Doom { victim: doomed.clone() }));

        engine.player[2].energy = 100;
        engine.queue_manual_ultimate(&doomed, None).unwrap();
        assert_eq!(engine.pending_manual_actions().len(), 1);

        engine.step_turn();

        assert!(!engine.hero_status(&doomed).unwrap().alive);
        assert!(engine.pending_manual_actions().is_empty());
        assert!(engine
            .actions()
            .iter()
            .all(|a| !(a.actor_id == doomed && a.kind == ActionKind::Ultimate)));
    }

    /// Every actor heals itself for a fixed amount
    struct Mend;

    impl AbilitySystem for Mend {
        fn reduce_cooldowns(&mut self) {}

        fn determine_best_spell(
            &self,
            _actor: &Participant,
            _loadout: &[AbilitySlot],
            _allies: &[&Participant],
            _targets: &[&Participant],
            _context: &DecisionContext,
        ) -> Option<SpellChoice> {
            Some(SpellChoice {
                ability_id: "mend".into(),
                level: 1,
                is_ultimate: false,
            })
        }

        fn cast_spell(
            &mut self,
            _ability_id: &str,
            actor: &Participant,
            _targets: &[&Participant],
            _level: u32,
            context: &DecisionContext,
        ) -> std::result::Result<BattleAction, AbilityError> {
            Ok(BattleAction::new(context.turn, ActionKind::Skill, actor)
                .with_hit(TargetHit::healing(actor.hero_id.clone(), 500)))
        }

        fn process_effects(&mut self, _participant: &mut Participant) -> Vec<EffectTick> {
            Vec::new()
        }
    }

    #[test]
    fn test_healing_reports_applied_amount() {
        let mut engine = engine(9).with_abilities(Box::new(Mend));
        let max = engine.player[0].stats.max_hp;
        engine.player[0].current_hp = max - 120;

        engine.step_turn();

        assert_eq!(engine.player[0].current_hp, max);
        for action in engine.actions() {
            let expected = if action.actor_id.as_str() == "p_tank" { 120 } else { 0 };
            assert_eq!(action.healing, Some(expected), "{}", action.actor_id);
            assert_eq!(action.damage, None);
        }
    }

    /// Casts a skill that also names a hero who is not in the battle
    struct StrayHits;

    impl AbilitySystem for StrayHits {
        fn reduce_cooldowns(&mut self) {}

        fn determine_best_spell(
            &self,
            _actor: &Participant,
            _loadout: &[AbilitySlot],
            _allies: &[&Participant],
            _targets: &[&Participant],
            _context: &DecisionContext,
        ) -> Option<SpellChoice> {
            Some(SpellChoice {
                ability_id: "scatter".into(),
                level: 1,
                is_ultimate: false,
            })
        }

        fn cast_spell(
            &mut self,
            _ability_id: &str,
            actor: &Participant,
            targets: &[&Participant],
            _level: u32,
            context: &DecisionContext,
        ) -> std::result::Result<BattleAction, AbilityError> {
            let target = targets
                .first()
                .ok_or_else(|| AbilityError::NoValidTarget("scatter".into()))?;
            let mut action = BattleAction::new(context.turn, ActionKind::Skill, actor)
                .with_hit(TargetHit::damage(HeroId::new("ghost"), 500))
                .with_hit(TargetHit::damage(target.hero_id.clone(), 30));
            action.energy_spent = Some(5);
            Ok(action)
        }

        fn process_effects(&mut self, _participant: &mut Participant) -> Vec<EffectTick> {
            Vec::new()
        }
    }

    #[test]
    fn test_missing_hit_targets_are_skipped() {
        let mut engine = engine(8).with_abilities(Box::new(StrayHits));
        engine.step_turn();

        let actions = engine.actions();
        assert!(!actions.is_empty());
        for action in &actions {
            assert_eq!(action.kind, ActionKind::Skill);
            assert_eq!(action.damage, Some(30));
            assert_eq!(action.ability_id.as_deref(), Some("scatter"));
        }
    }

    #[test]
    fn test_waves_advance_and_tag_actions() {
        let waves = vec![
            WaveConfig::new(vec![Participant::test_archer("w1_rat", 3)])
                .with_rewards(RewardBundle::new(10, 0, 5)),
            WaveConfig::new(vec![Participant::test_archer("w2_rat", 3)])
                .with_rewards(RewardBundle::new(20, 1, 5)),
        ];
        let setup = BattleSetup::waves(vec![crusher("hero", 1)], waves);
        let mut engine = BattleEngine::new(setup, 2).unwrap();
        assert_eq!(engine.enemy_roster()[0].hero_id, HeroId::new("w1_rat"));

        assert_eq!(engine.step_turn(), TurnOutcome::WaveCleared(1));
        assert_eq!(engine.enemy_roster()[0].hero_id, HeroId::new("w2_rat"));
        assert_eq!(engine.step_turn(), TurnOutcome::Finished);

        let result = engine.result().unwrap();
        assert!(result.victory);
        assert_eq!(result.completed_waves, Some(2));
        assert_eq!(result.rewards.gold, 30);
        assert_eq!(result.rewards.gems, 1);

        let waves_seen: Vec<Option<WaveNumber>> = engine.actions().iter().map(|a| a.wave).collect();
        assert_eq!(waves_seen, vec![Some(1), Some(2)]);
        assert_eq!(engine.wave_data().unwrap().snapshots.len(), 2);
    }

    #[test]
    fn test_single_wave_is_classic() {
        let setup = BattleSetup::waves(
            vec![crusher("hero", 1)],
            vec![WaveConfig::new(vec![Participant::test_archer("rat", 3)])
                .with_rewards(RewardBundle::new(40, 0, 0))],
        );
        let mut engine = BattleEngine::new(setup, 2).unwrap();
        assert!(engine.wave_data().is_none());

        let result = engine.simulate_battle();
        assert!(result.victory);
        assert_eq!(result.completed_waves, None);
        assert_eq!(result.rewards.gold, 40);
    }
}
