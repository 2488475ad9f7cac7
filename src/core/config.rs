//! Battle tuning with documented constants
//!
//! All magic numbers of the battle rules are collected here with an
//! explanation of what they control. Each engine owns its own copy, so
//! battles running side by side can use different tunings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{BattleError, Result};

/// Upper bound for any damage multiplier or factor
pub const MAX_DAMAGE_MULTIPLIER: f64 = 100.0;

/// Upper bound for the damage variance factor
pub const MAX_VARIANCE: f64 = 10.0;

/// Tunable numbers for one battle
///
/// The defaults reproduce the live game rules. Changing them affects pacing
/// and balance, not correctness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleTuning {
    // === TURN CAPS ===
    /// Hard turn cap for a classic (single encounter) battle
    ///
    /// Reaching it is not an error: the result is computed from whatever
    /// state exists at that point.
    pub max_turns: u32,

    /// Turn cap applied to each wave of a multi-wave battle
    pub max_wave_turns: u32,

    // === ENERGY ===
    /// Size of the ultimate gauge. Energy is always clamped to [0, energy_cap]
    /// and a full gauge is what permits an ultimate.
    pub energy_cap: u32,

    /// Flat energy every actor gains at the start of its turn
    pub energy_base_gain: u32,

    /// Moral contributes `moral / moral_energy_divisor` to the turn gain
    pub moral_energy_divisor: u32,

    /// Upper bound (exclusive) of the random part of the turn gain
    pub energy_gain_jitter: u32,

    /// Energy a basic attack grants its attacker
    pub attack_energy_base: u32,

    /// Upper bound (exclusive) of the random part of the basic attack gain
    pub attack_energy_jitter: u32,

    // === TURN ORDER ===
    /// Initiative is `speed + uniform[0, initiative_jitter)`, rerolled every turn
    ///
    /// The reroll keeps evenly matched rosters from locking into the same
    /// order forever.
    pub initiative_jitter: f64,

    // === CRITICAL HITS ===
    /// Base critical chance of a basic attack
    pub crit_base_chance: f64,

    /// Speed contributes `speed / crit_speed_divisor` to critical chance
    pub crit_speed_divisor: f64,

    /// Rarity multiplier contributes `rarity * crit_rarity_weight`
    pub crit_rarity_weight: f64,

    /// Critical chance never exceeds this value
    pub crit_chance_cap: f64,

    /// Damage multiplier applied to a critical basic attack
    pub crit_multiplier: f64,

    // === DEFAULT ULTIMATE ===
    /// Attack multiplier of the built-in ultimate (before rarity)
    pub ultimate_atk_multiplier: f64,

    /// Chance that a non-ranged hero's built-in ultimate hits the whole
    /// eligible line instead of a single target
    ///
    /// Ranged DPS always use the area version. Whether 0.4 is a deliberate
    /// balance value is unconfirmed, so it is kept overridable rather than
    /// folded into the formula.
    pub ultimate_aoe_chance: f64,

    /// Damage factor of the single-target built-in ultimate
    pub ultimate_single_target_factor: f64,

    /// Damage factor (per target) of the area built-in ultimate
    pub ultimate_aoe_factor: f64,

    // === DAMAGE VARIANCE ===
    /// Lower bound of the uniform damage variance factor
    pub variance_min: f64,

    /// Upper bound of the uniform damage variance factor
    pub variance_max: f64,
}

impl Default for BattleTuning {
    fn default() -> Self {
        Self {
            // Caps
            max_turns: 200,
            max_wave_turns: 100,

            // Energy (turn gain = 10 + moral/8 + [0,5), attack gain = 12 + [0,8))
            energy_cap: 100,
            energy_base_gain: 10,
            moral_energy_divisor: 8,
            energy_gain_jitter: 5,
            attack_energy_base: 12,
            attack_energy_jitter: 8,

            // Turn order
            initiative_jitter: 10.0,

            // Crits
            crit_base_chance: 0.08,
            crit_speed_divisor: 1000.0,
            crit_rarity_weight: 0.02,
            crit_chance_cap: 0.5,
            crit_multiplier: 1.75,

            // Built-in ultimate
            ultimate_atk_multiplier: 3.5,
            ultimate_aoe_chance: 0.4,
            ultimate_single_target_factor: 1.2,
            ultimate_aoe_factor: 0.8,

            // Variance
            variance_min: 0.9,
            variance_max: 1.1,
        }
    }
}

impl BattleTuning {
    /// Parse a tuning from TOML. Missing keys fall back to the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let tuning: BattleTuning = toml::from_str(contents)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load a tuning from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    fn float_fields(&self) -> [(&'static str, f64); 12] {
        [
            ("initiative_jitter", self.initiative_jitter),
            ("crit_base_chance", self.crit_base_chance),
            ("crit_speed_divisor", self.crit_speed_divisor),
            ("crit_rarity_weight", self.crit_rarity_weight),
            ("crit_chance_cap", self.crit_chance_cap),
            ("crit_multiplier", self.crit_multiplier),
            ("ultimate_atk_multiplier", self.ultimate_atk_multiplier),
            ("ultimate_aoe_chance", self.ultimate_aoe_chance),
            ("ultimate_single_target_factor", self.ultimate_single_target_factor),
            ("ultimate_aoe_factor", self.ultimate_aoe_factor),
            ("variance_min", self.variance_min),
            ("variance_max", self.variance_max),
        ]
    }

    /// Validate configuration for internal consistency
    ///
    /// Every float must be finite; range checks come after that.
    pub fn validate(&self) -> Result<()> {
        if self.max_turns == 0 || self.max_wave_turns == 0 {
            return Err(BattleError::InvalidTuning(
                "turn caps must be positive".into(),
            ));
        }

        if self.energy_cap == 0 {
            return Err(BattleError::InvalidTuning("energy_cap must be positive".into()));
        }

        if self.moral_energy_divisor == 0 {
            return Err(BattleError::InvalidTuning(
                "moral_energy_divisor must be positive".into(),
            ));
        }

        for (name, value) in self.float_fields() {
            if !value.is_finite() {
                return Err(BattleError::InvalidTuning(format!(
                    "{} ({}) must be finite",
                    name, value
                )));
            }
        }

        if self.crit_speed_divisor <= 0.0 {
            return Err(BattleError::InvalidTuning(
                "crit_speed_divisor must be positive".into(),
            ));
        }

        for (name, value) in [
            ("crit_base_chance", self.crit_base_chance),
            ("crit_rarity_weight", self.crit_rarity_weight),
            ("crit_chance_cap", self.crit_chance_cap),
            ("ultimate_aoe_chance", self.ultimate_aoe_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BattleError::InvalidTuning(format!(
                    "{} ({}) must be within [0, 1]",
                    name, value
                )));
            }
        }

        for (name, value) in [
            ("crit_multiplier", self.crit_multiplier),
            ("ultimate_atk_multiplier", self.ultimate_atk_multiplier),
            ("ultimate_single_target_factor", self.ultimate_single_target_factor),
            ("ultimate_aoe_factor", self.ultimate_aoe_factor),
        ] {
            if !(0.0..=MAX_DAMAGE_MULTIPLIER).contains(&value) {
                return Err(BattleError::InvalidTuning(format!(
                    "{} ({}) must be within [0, {}]",
                    name, value, MAX_DAMAGE_MULTIPLIER
                )));
            }
        }

        if self.variance_min <= 0.0
            || self.variance_min > self.variance_max
            || self.variance_max > MAX_VARIANCE
        {
            return Err(BattleError::InvalidTuning(format!(
                "variance range [{}, {}] is invalid",
                self.variance_min, self.variance_max
            )));
        }

        if self.initiative_jitter < 0.0 {
            return Err(BattleError::InvalidTuning(
                "initiative_jitter must not be negative".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_is_valid() {
        assert!(BattleTuning::default().validate().is_ok());
    }

    #[test]
    fn test_default_caps() {
        let tuning = BattleTuning::default();
        assert_eq!(tuning.max_turns, 200);
        assert_eq!(tuning.max_wave_turns, 100);
        assert_eq!(tuning.energy_cap, 100);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let tuning = BattleTuning::from_toml_str("ultimate_aoe_chance = 0.25\nmax_turns = 50\n")
            .expect("partial tuning should parse");
        assert_eq!(tuning.ultimate_aoe_chance, 0.25);
        assert_eq!(tuning.max_turns, 50);
        assert_eq!(tuning.crit_multiplier, 1.75);
    }

    #[test]
    fn test_rejects_out_of_range_chance() {
        let result = BattleTuning::from_toml_str("crit_chance_cap = 1.5\n");
        assert!(matches!(result, Err(BattleError::InvalidTuning(_))));
    }

    #[test]
    fn test_rejects_inverted_variance() {
        let tuning = BattleTuning {
            variance_min: 1.2,
            variance_max: 1.0,
            ..BattleTuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_non_finite_values() {
        for toml in [
            "variance_max = inf\n",
            "variance_min = nan\n",
            "variance_max = nan\n",
            "initiative_jitter = inf\n",
            "crit_multiplier = inf\n",
            "crit_speed_divisor = nan\n",
        ] {
            let result = BattleTuning::from_toml_str(toml);
            assert!(
                matches!(result, Err(BattleError::InvalidTuning(_))),
                "{} was accepted",
                toml.trim()
            );
        }

        let tuning = BattleTuning {
            ultimate_aoe_factor: f64::NAN,
            ..BattleTuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_multipliers() {
        let tuning = BattleTuning {
            ultimate_atk_multiplier: 1e12,
            ..BattleTuning::default()
        };
        assert!(tuning.validate().is_err());

        let tuning = BattleTuning {
            variance_max: 50.0,
            ..BattleTuning::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = BattleTuning::from_toml_str("max_turns = \"many\"");
        assert!(matches!(result, Err(BattleError::TuningParse(_))));
    }
}
