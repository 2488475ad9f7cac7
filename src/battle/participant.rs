//! Battle participants
//!
//! A participant is a hero (or monster) with stats already resolved by the
//! caller. The engine owns every participant for the lifetime of a battle and
//! is the only thing that mutates combat state.

use serde::{Deserialize, Serialize};

use crate::battle::constants::{FRONT_LINE_MAX_SLOT, MAX_SLOT, MIN_SLOT};
use crate::core::types::HeroId;

/// Which roster a participant fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Player => Side::Enemy,
            Side::Enemy => Side::Player,
        }
    }
}

/// Combat role, drives targeting preferences and the force bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Tank,
    #[serde(rename = "DPS Melee")]
    DpsMelee,
    #[serde(rename = "DPS Ranged")]
    DpsRanged,
    Support,
}

impl Role {
    /// Melee roles add force to their damage
    pub fn is_melee(&self) -> bool {
        matches!(self, Role::Tank | Role::DpsMelee)
    }

    pub fn is_dps(&self) -> bool {
        matches!(self, Role::DpsMelee | Role::DpsRanged)
    }
}

/// Element for the advantage triangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Fire,
    Water,
    Wind,
    Electric,
    Light,
    Dark,
}

impl Element {
    /// The element this one has advantage over
    ///
    /// Fire -> Wind -> Electric -> Water -> Fire, while Light and Dark
    /// each beat the other.
    pub fn beats(self) -> Element {
        match self {
            Element::Fire => Element::Wind,
            Element::Water => Element::Fire,
            Element::Wind => Element::Electric,
            Element::Electric => Element::Water,
            Element::Light => Element::Dark,
            Element::Dark => Element::Light,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Damage multiplier granted by rarity
    pub fn multiplier(&self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Rare => 1.15,
            Rarity::Epic => 1.35,
            Rarity::Legendary => 1.7,
        }
    }
}

/// Formation slot, 1-2 front line and 3-5 back line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(pub u8);

impl Position {
    pub fn new(slot: u8) -> Self {
        Self(slot)
    }

    pub fn slot(&self) -> u8 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        (MIN_SLOT..=MAX_SLOT).contains(&self.0)
    }

    pub fn is_front_line(&self) -> bool {
        self.0 <= FRONT_LINE_MAX_SLOT
    }

    pub fn is_back_line(&self) -> bool {
        !self.is_front_line()
    }
}

/// Resolved combat stats, fixed for the whole battle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub hp: u32,
    pub max_hp: u32,
    pub atk: u32,
    pub def: u32,
    pub magic_def: u32,
    pub speed: u32,
    pub intelligence: u32,
    pub force: u32,
    pub moral: u32,
    pub cooldown_reduction: f64,
    // Derived by the stat pipeline
    pub magic_resistance: f64,
    pub energy_generation: f64,
    pub critical_chance: f64,
}

impl Stats {
    /// Minimal stat block: the rest of the stats default to zero
    pub fn new(max_hp: u32, atk: u32, def: u32, speed: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            atk,
            def,
            speed,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Buff {
    AttackUp,
    DefenseUp,
    SpeedUp,
    Shield,
    Regeneration,
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Debuff {
    AttackDown,
    DefenseDown,
    SpeedDown,
    Burn,
    Poison,
    Stun,
    Silence,
    Custom(String),
}

/// Status effect instance owned by the ability/effect system
///
/// The engine never interprets these; it only resets them between battles
/// and hands the participant to the effect system once per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveEffect {
    pub effect_id: String,
    pub source_id: Option<HeroId>,
    pub remaining_turns: u32,
    pub stacks: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatStatus {
    pub alive: bool,
    pub buffs: Vec<Buff>,
    pub debuffs: Vec<Debuff>,
}

impl Default for CombatStatus {
    fn default() -> Self {
        Self {
            alive: true,
            buffs: Vec::new(),
            debuffs: Vec::new(),
        }
    }
}

/// A combatant in a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub hero_id: HeroId,
    pub name: String,
    pub role: Role,
    pub element: Element,
    pub rarity: Rarity,
    pub level: u32,
    pub stars: u32,
    pub stats: Stats,
    pub current_hp: u32,
    pub energy: u32,
    pub status: CombatStatus,
    #[serde(default)]
    pub active_effects: Vec<ActiveEffect>,
    pub position: Position,
}

impl Participant {
    pub fn new(
        hero_id: impl Into<HeroId>,
        name: impl Into<String>,
        role: Role,
        element: Element,
        rarity: Rarity,
        stats: Stats,
        position: Position,
    ) -> Self {
        let current_hp = stats.max_hp;
        Self {
            hero_id: hero_id.into(),
            name: name.into(),
            role,
            element,
            rarity,
            level: 1,
            stars: 1,
            stats,
            current_hp,
            energy: 0,
            status: CombatStatus::default(),
            active_effects: Vec::new(),
            position,
        }
    }

    /// Test participant: front-line tank
    pub fn test_tank(id: &str, slot: u8) -> Self {
        let mut stats = Stats::new(2400, 80, 120, 70);
        stats.magic_def = 90;
        stats.force = 60;
        stats.moral = 40;
        Self::new(id, id, Role::Tank, Element::Water, Rarity::Rare, stats, Position(slot))
    }

    /// Test participant: melee damage dealer
    pub fn test_warrior(id: &str, slot: u8) -> Self {
        let mut stats = Stats::new(1600, 160, 70, 95);
        stats.magic_def = 50;
        stats.force = 80;
        stats.moral = 30;
        Self::new(id, id, Role::DpsMelee, Element::Fire, Rarity::Epic, stats, Position(slot))
    }

    /// Test participant: ranged damage dealer
    pub fn test_archer(id: &str, slot: u8) -> Self {
        let mut stats = Stats::new(1200, 180, 50, 110);
        stats.magic_def = 40;
        stats.intelligence = 40;
        stats.moral = 30;
        Self::new(id, id, Role::DpsRanged, Element::Wind, Rarity::Epic, stats, Position(slot))
    }

    /// Test participant: back-line support
    pub fn test_healer(id: &str, slot: u8) -> Self {
        let mut stats = Stats::new(1100, 90, 50, 100);
        stats.magic_def = 80;
        stats.intelligence = 150;
        stats.moral = 60;
        Self::new(id, id, Role::Support, Element::Light, Rarity::Rare, stats, Position(slot))
    }

    /// Reset combat state for the start of a battle or wave
    pub fn reset_for_battle(&mut self) {
        self.current_hp = self.stats.max_hp;
        self.energy = 0;
        self.status = CombatStatus::default();
        self.active_effects.clear();
    }

    pub fn is_alive(&self) -> bool {
        self.status.alive
    }

    pub fn is_front_line(&self) -> bool {
        self.position.is_front_line()
    }

    /// Current hp as a fraction of max hp
    pub fn hp_fraction(&self) -> f64 {
        if self.stats.max_hp == 0 {
            return 0.0;
        }
        self.current_hp as f64 / self.stats.max_hp as f64
    }

    pub fn has_full_energy(&self, cap: u32) -> bool {
        self.energy >= cap
    }

    /// Apply damage, returns the amount actually removed
    ///
    /// Death happens exactly once, when hp first reaches zero. A dead
    /// participant takes no further damage.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let dealt = amount.min(self.current_hp);
        self.current_hp -= dealt;
        if self.current_hp == 0 {
            self.status.alive = false;
        }
        dealt
    }

    /// Restore hp up to max, returns the amount actually restored
    ///
    /// There is no revival: healing a dead participant does nothing.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        let missing = self.stats.max_hp.saturating_sub(self.current_hp);
        let healed = amount.min(missing);
        self.current_hp += healed;
        healed
    }

    /// Add energy clamped to `cap`, returns the amount actually gained
    pub fn gain_energy(&mut self, amount: u32, cap: u32) -> u32 {
        let before = self.energy.min(cap);
        self.energy = before.saturating_add(amount).min(cap);
        self.energy - before
    }

    /// Remove energy, returns the amount actually spent
    pub fn spend_energy(&mut self, amount: u32) -> u32 {
        let spent = amount.min(self.energy);
        self.energy -= spent;
        spent
    }

    /// Empty the gauge, returns what was in it
    pub fn drain_energy(&mut self) -> u32 {
        std::mem::take(&mut self.energy)
    }

    pub fn add_buff(&mut self, buff: Buff) {
        if !self.status.buffs.contains(&buff) {
            self.status.buffs.push(buff);
        }
    }

    pub fn add_debuff(&mut self, debuff: Debuff) {
        if !self.status.debuffs.contains(&debuff) {
            self.status.debuffs.push(debuff);
        }
    }
}
