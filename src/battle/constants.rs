//! Battle system constants that are rules rather than tuning
//!
//! Numbers that balance designers adjust live in `core::config::BattleTuning`.

// Formation slots
pub const MIN_SLOT: u8 = 1;
pub const MAX_SLOT: u8 = 5;
pub const FRONT_LINE_MAX_SLOT: u8 = 2;

// Damage formula
pub const SKILL_INTELLIGENCE_SCALE: f64 = 0.4;
pub const SKILL_DAMAGE_MULTIPLIER: f64 = 1.6;
pub const ULTIMATE_INTELLIGENCE_SCALE: f64 = 0.6;
pub const ULTIMATE_DAMAGE_MULTIPLIER: f64 = 2.5;
pub const MELEE_FORCE_SCALE: f64 = 0.3;
pub const MAGIC_DEF_WEIGHT: f64 = 0.7;
pub const PHYSICAL_DEF_WEIGHT: f64 = 0.3;

// Elemental triangle
pub const ELEMENT_ADVANTAGE: f64 = 1.5;
pub const ELEMENT_DISADVANTAGE: f64 = 0.75;
pub const ELEMENT_NEUTRAL: f64 = 1.0;

// VIP speed gates: minimum VIP level for each speed
pub const VIP_FOR_SPEED_X2: u8 = 2;
pub const VIP_FOR_SPEED_X3: u8 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_layout() {
        assert!(MIN_SLOT <= FRONT_LINE_MAX_SLOT && FRONT_LINE_MAX_SLOT < MAX_SLOT);
    }

    #[test]
    fn test_element_ordering() {
        assert!(ELEMENT_ADVANTAGE > ELEMENT_NEUTRAL);
        assert!(ELEMENT_NEUTRAL > ELEMENT_DISADVANTAGE);
    }

    #[test]
    fn test_def_weights_sum_to_one() {
        assert!((MAGIC_DEF_WEIGHT + PHYSICAL_DEF_WEIGHT - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vip_gates_ordered() {
        assert!(VIP_FOR_SPEED_X2 < VIP_FOR_SPEED_X3);
    }
}
