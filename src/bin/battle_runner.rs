//! Headless Battle Runner
//!
//! Runs seeded sample battles and prints their results as JSON or text.

use std::path::PathBuf;

use clap::Parser;
use gacha_arena::battle::{
    BattleEngine, BattleMode, BattleOptions, BattleResult, BattleSetup, BattleSpeed, Element,
    Participant, Position, Rarity, RewardBundle, Role, Side, Stats, TurnOutcome, WaveConfig,
};
use gacha_arena::core::{BattleTuning, Result};
use rayon::prelude::*;
use serde::Serialize;

/// Headless Battle Runner - sample hero battles for balancing
#[derive(Parser, Debug)]
#[command(name = "battle_runner")]
#[command(about = "Run seeded sample battles and output their results")]
struct Args {
    /// Random seed of the first battle; later battles use seed + n
    #[arg(long)]
    seed: Option<u64>,

    /// Number of battles to run (in parallel)
    #[arg(long, default_value_t = 1)]
    count: u64,

    /// Battle mode: auto or manual
    #[arg(long, default_value = "auto")]
    mode: String,

    /// Speed multiplier (1, 2 or 3)
    #[arg(long, default_value_t = 1)]
    speed: u8,

    /// VIP level of the acting player
    #[arg(long, default_value_t = 0)]
    vip: u8,

    /// Number of enemy waves (1 = classic battle)
    #[arg(long, default_value_t = 1)]
    waves: u32,

    /// TOML file overriding the battle tuning
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Print every action to stderr
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport {
    seed: u64,
    actions: usize,
    result: BattleResult,
}

fn main() {
    let args = Args::parse();

    // Initialize tracing
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let tuning = match &args.tuning {
        Some(path) => match BattleTuning::from_toml_file(path) {
            Ok(tuning) => tuning,
            Err(e) => {
                eprintln!("Failed to load tuning '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => BattleTuning::default(),
    };

    let mode = match args.mode.as_str() {
        "auto" => BattleMode::Auto,
        "manual" => BattleMode::Manual,
        other => {
            eprintln!("Unknown mode '{}', defaulting to auto", other);
            BattleMode::Auto
        }
    };

    let speed = match BattleSpeed::try_from(args.speed) {
        Ok(speed) => speed,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let options = BattleOptions::new(mode, speed, args.vip);
    let first_seed = args.seed.unwrap_or_else(rand::random);

    let reports: Vec<Result<RunReport>> = (0..args.count.max(1))
        .into_par_iter()
        .map(|n| {
            let seed = first_seed.wrapping_add(n);
            run_battle(seed, options, tuning.clone(), args.waves, args.verbose)
        })
        .collect();

    let mut failed = false;
    for report in reports {
        match report {
            Ok(report) => print_report(&report, &args.format),
            Err(e) => {
                eprintln!("Battle rejected: {}", e);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}

fn run_battle(
    seed: u64,
    options: BattleOptions,
    tuning: BattleTuning,
    waves: u32,
    verbose: bool,
) -> Result<RunReport> {
    let setup = if waves > 1 {
        BattleSetup::waves(sample_party(), sample_waves(waves))
    } else {
        BattleSetup::new(sample_party(), sample_enemies("e", 1.0))
            .with_victory_rewards(RewardBundle::new(500, 10, 120).with_item("hero_fragment", 2))
    };
    let setup = setup.with_options(options).with_tuning(tuning);

    let mut engine = BattleEngine::new(setup, seed)?;

    loop {
        // Manual mode: tap every ultimate as soon as it is ready
        if options.mode == BattleMode::Manual {
            let ready: Vec<_> = engine
                .hero_statuses()
                .into_iter()
                .filter(|status| status.side == Side::Player && status.can_ultimate)
                .map(|status| status.hero_id)
                .collect();
            for hero_id in ready {
                engine.add_manual_ultimate(&hero_id);
            }
        }

        let logged = engine.action_log().len();
        let outcome = engine.step_turn();

        if verbose {
            for action in engine.action_log().iter().skip(logged) {
                eprintln!(
                    "  [seed {} turn {}] {} {:?} -> {:?} dmg={} heal={}{}",
                    seed,
                    action.turn,
                    action.actor_name,
                    action.kind,
                    action.target_ids.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
                    action.damage.unwrap_or(0),
                    action.healing.unwrap_or(0),
                    if action.critical { " (crit)" } else { "" }
                );
            }
            if let TurnOutcome::WaveCleared(wave) = outcome {
                eprintln!("=== [seed {}] Wave {} cleared ===", seed, wave);
            }
        }

        if outcome == TurnOutcome::Finished {
            break;
        }
    }

    let result = engine.simulate_battle();
    Ok(RunReport {
        seed,
        actions: engine.action_log().len(),
        result,
    })
}

fn print_report(report: &RunReport, format: &str) {
    match format {
        "text" => {
            let result = &report.result;
            println!("Battle Result");
            println!("=============");
            println!("Seed: {}", report.seed);
            println!("Victory: {}", result.victory);
            println!("Turns: {}", result.total_turns);
            if let Some(waves) = result.completed_waves {
                println!("Waves cleared: {}", waves);
            }
            println!("Actions: {}", report.actions);
            println!("Damage dealt: {}", result.stats.total_damage_dealt);
            println!("Healing done: {}", result.stats.total_healing_done);
            println!("Critical hits: {}", result.stats.critical_hits);
            println!("Ultimates used: {}", result.stats.ultimates_used);
            println!(
                "Rewards: {} gold, {} gems, {} xp",
                result.rewards.gold, result.rewards.gems, result.rewards.experience
            );
            println!();
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{}', defaulting to json", other);
            }
            match serde_json::to_string_pretty(report) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("Failed to serialize result: {}", e),
            }
        }
    }
}

fn hero(
    id: &str,
    name: &str,
    role: Role,
    element: Element,
    rarity: Rarity,
    stats: Stats,
    slot: u8,
) -> Participant {
    Participant::new(id, name, role, element, rarity, stats, Position::new(slot))
}

/// Five-hero sample party
fn sample_party() -> Vec<Participant> {
    let mut guardian = Stats::new(3200, 140, 180, 80);
    guardian.magic_def = 150;
    guardian.force = 90;
    guardian.moral = 60;

    let mut blade = Stats::new(2100, 260, 90, 120);
    blade.magic_def = 70;
    blade.force = 120;
    blade.moral = 40;

    let mut archer = Stats::new(1700, 280, 70, 135);
    archer.magic_def = 60;
    archer.intelligence = 60;
    archer.moral = 40;

    let mut mage = Stats::new(1500, 150, 60, 110);
    mage.magic_def = 120;
    mage.intelligence = 300;
    mage.moral = 50;

    let mut cleric = Stats::new(1600, 120, 70, 105);
    cleric.magic_def = 130;
    cleric.intelligence = 240;
    cleric.moral = 80;

    vec![
        hero("p_guardian", "Guardian", Role::Tank, Element::Water, Rarity::Epic, guardian, 1),
        hero("p_blade", "Blade", Role::DpsMelee, Element::Fire, Rarity::Legendary, blade, 2),
        hero("p_archer", "Archer", Role::DpsRanged, Element::Wind, Rarity::Epic, archer, 3),
        hero("p_mage", "Mage", Role::DpsRanged, Element::Electric, Rarity::Rare, mage, 4),
        hero("p_cleric", "Cleric", Role::Support, Element::Light, Rarity::Rare, cleric, 5),
    ]
}

/// Enemy line-up scaled by `power`, ids prefixed so waves never collide
fn sample_enemies(prefix: &str, power: f64) -> Vec<Participant> {
    let scaled = |value: u32| (value as f64 * power).round() as u32;

    let mut brute = Stats::new(scaled(2800), scaled(150), scaled(150), 75);
    brute.magic_def = scaled(100);
    brute.force = 80;
    brute.moral = 40;

    let mut raider = Stats::new(scaled(1900), scaled(240), scaled(80), 115);
    raider.magic_def = scaled(60);
    raider.force = 100;
    raider.moral = 30;

    let mut shaman = Stats::new(scaled(1400), scaled(130), scaled(60), 100);
    shaman.magic_def = scaled(110);
    shaman.intelligence = scaled(220);
    shaman.moral = 70;

    let mut stalker = Stats::new(scaled(1500), scaled(250), scaled(60), 130);
    stalker.magic_def = scaled(50);
    stalker.moral = 30;

    vec![
        hero(&format!("{}_brute", prefix), "Brute", Role::Tank, Element::Dark, Rarity::Rare, brute, 1),
        hero(&format!("{}_raider", prefix), "Raider", Role::DpsMelee, Element::Electric, Rarity::Rare, raider, 2),
        hero(&format!("{}_shaman", prefix), "Shaman", Role::Support, Element::Water, Rarity::Common, shaman, 4),
        hero(&format!("{}_stalker", prefix), "Stalker", Role::DpsRanged, Element::Fire, Rarity::Rare, stalker, 5),
    ]
}

/// Waves of rising strength, the last one a boss wave
fn sample_waves(count: u32) -> Vec<WaveConfig> {
    (1..=count)
        .map(|wave| {
            let power = 0.6 + 0.15 * wave as f64;
            let rewards = RewardBundle::new(100 * wave as u64, wave as u64, 40 * wave as u64);
            let config = WaveConfig::new(sample_enemies(&format!("w{}", wave), power)).with_rewards(rewards);
            if wave == count {
                config.boss()
            } else {
                config
            }
        })
        .collect()
}
