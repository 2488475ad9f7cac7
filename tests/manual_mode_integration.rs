//! Manual-mode ultimate control integration tests

use gacha_arena::battle::*;
use gacha_arena::core::{BattleError, BattleTuning, HeroId};

/// Sturdy rosters so battles last long enough for gauges to fill
fn party() -> Vec<Participant> {
    let mut party = vec![
        Participant::test_tank("p_tank", 1),
        Participant::test_warrior("p_warrior", 2),
        Participant::test_healer("p_sage", 3),
        Participant::test_healer("p_healer", 4),
    ];
    for hero in &mut party {
        hero.stats.max_hp *= 200;
    }
    party
}

fn foes() -> Vec<Participant> {
    let mut foes = vec![
        Participant::test_tank("e_tank", 1),
        Participant::test_warrior("e_warrior", 2),
        Participant::test_archer("e_archer", 3),
    ];
    for foe in &mut foes {
        foe.stats.max_hp *= 20;
    }
    foes
}

fn manual_engine(seed: u64, tuning: BattleTuning) -> BattleEngine {
    let setup = BattleSetup::new(party(), foes())
        .with_options(BattleOptions::manual())
        .with_tuning(tuning);
    BattleEngine::new(setup, seed).unwrap()
}

fn is_player(engine: &BattleEngine, hero_id: &HeroId) -> bool {
    engine.player_roster().iter().any(|p| &p.hero_id == hero_id)
}

/// Step until some player hero sits on a full gauge
fn charge_any(engine: &mut BattleEngine) -> Option<HeroId> {
    for _ in 0..50 {
        let ready = engine
            .hero_statuses()
            .into_iter()
            .find(|s| s.side == Side::Player && s.can_ultimate);
        if let Some(status) = ready {
            return Some(status.hero_id);
        }
        if engine.step_turn() == TurnOutcome::Finished {
            return None;
        }
    }
    None
}

#[test]
fn test_unqueued_heroes_never_ultimate() {
    for seed in 0..5 {
        let mut engine = manual_engine(seed, BattleTuning::default());
        engine.simulate_battle();

        let player_ultimates = engine
            .actions()
            .iter()
            .filter(|a| a.kind == ActionKind::Ultimate && is_player(&engine, &a.actor_id))
            .count();
        assert_eq!(player_ultimates, 0, "seed {}", seed);

        // Full gauges were reached and held
        assert!(engine
            .actions()
            .iter()
            .flat_map(|a| a.snapshot.iter())
            .any(|s| s.side == Side::Player && s.energy == 100));
    }
}

#[test]
fn test_enemies_still_ultimate_in_manual_mode() {
    let mut engine = manual_engine(3, BattleTuning::default());
    engine.simulate_battle();

    assert!(engine
        .actions()
        .iter()
        .any(|a| a.kind == ActionKind::Ultimate && !is_player(&engine, &a.actor_id)));
}

#[test]
fn test_queued_ultimate_fires_and_is_consumed() {
    let mut engine = manual_engine(12, BattleTuning::default());
    let hero = charge_any(&mut engine).expect("a player gauge should fill");

    assert!(engine.add_manual_ultimate(&hero));
    assert_eq!(engine.pending_manual_actions().len(), 1);

    let logged = engine.action_log().len();
    engine.step_turn();

    let fired: Vec<&BattleAction> = engine
        .action_log()
        .iter()
        .skip(logged)
        .filter(|a| a.actor_id == hero)
        .collect();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].kind, ActionKind::Ultimate);
    assert!(fired[0].critical);
    assert_eq!(fired[0].energy_spent, Some(100));
    assert!(engine.pending_manual_actions().is_empty());
}

#[test]
fn test_queued_ultimate_honours_explicit_target() {
    let tuning = BattleTuning {
        ultimate_aoe_chance: 0.0,
        ..BattleTuning::default()
    };
    let mut engine = manual_engine(30, tuning);
    let hero = charge_any(&mut engine).expect("a player gauge should fill");

    let target = HeroId::new("e_warrior");
    engine
        .queue_manual_ultimate(&hero, Some(vec![target.clone()]))
        .unwrap();

    let logged = engine.action_log().len();
    engine.step_turn();

    let ultimate = engine
        .action_log()
        .iter()
        .skip(logged)
        .find(|a| a.actor_id == hero && a.kind == ActionKind::Ultimate)
        .expect("queued ultimate should fire");
    assert_eq!(ultimate.target_ids, vec![target]);
}

#[test]
fn test_queue_rejections() {
    let mut engine = manual_engine(1, BattleTuning::default());

    assert!(matches!(
        engine.queue_manual_ultimate(&HeroId::new("p_tank"), None),
        Err(BattleError::InsufficientEnergy { energy: 0, .. })
    ));
    assert!(matches!(
        engine.queue_manual_ultimate(&HeroId::new("e_tank"), None),
        Err(BattleError::NotPlayerControlled(_))
    ));
    assert!(matches!(
        engine.queue_manual_ultimate(&HeroId::new("nobody"), None),
        Err(BattleError::UnknownHero(_))
    ));
    assert!(!engine.add_manual_ultimate(&HeroId::new("p_tank")));
    assert!(engine.pending_manual_actions().is_empty());
}

#[test]
fn test_requeue_replaces_entry() {
    let mut engine = manual_engine(12, BattleTuning::default());
    let hero = charge_any(&mut engine).expect("a player gauge should fill");

    engine
        .queue_manual_ultimate(&hero, Some(vec![HeroId::new("e_tank")]))
        .unwrap();
    engine.queue_manual_ultimate(&hero, None).unwrap();

    let pending = engine.pending_manual_actions();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].hero_id, hero);
    assert_eq!(pending[0].targets, None);
    assert_eq!(pending[0].kind, ActionKind::Ultimate);
}

#[test]
fn test_auto_mode_fires_player_ultimates() {
    let setup = BattleSetup::new(party(), foes());
    let mut engine = BattleEngine::new(setup, 12).unwrap();
    engine.simulate_battle();

    assert!(engine
        .actions()
        .iter()
        .any(|a| a.kind == ActionKind::Ultimate && is_player(&engine, &a.actor_id)));
}
