//! Battle options and the VIP speed gate

use serde::{Deserialize, Serialize};

use crate::battle::constants::{VIP_FOR_SPEED_X2, VIP_FOR_SPEED_X3};
use crate::core::error::{BattleError, Result};

/// Who decides when player ultimates fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BattleMode {
    #[default]
    Auto,
    Manual,
}

/// Replay speed multiplier
///
/// Only affects the reported duration; the simulation never sleeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum BattleSpeed {
    #[default]
    X1 = 1,
    X2 = 2,
    X3 = 3,
}

impl BattleSpeed {
    pub fn multiplier(&self) -> u8 {
        *self as u8
    }

    /// Fastest speed a VIP level may request
    pub fn max_for_vip(vip_level: u8) -> BattleSpeed {
        if vip_level >= VIP_FOR_SPEED_X3 {
            BattleSpeed::X3
        } else if vip_level >= VIP_FOR_SPEED_X2 {
            BattleSpeed::X2
        } else {
            BattleSpeed::X1
        }
    }
}

impl TryFrom<u8> for BattleSpeed {
    type Error = BattleError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(BattleSpeed::X1),
            2 => Ok(BattleSpeed::X2),
            3 => Ok(BattleSpeed::X3),
            other => Err(BattleError::InvalidSpeed(other)),
        }
    }
}

impl From<BattleSpeed> for u8 {
    fn from(speed: BattleSpeed) -> u8 {
        speed.multiplier()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BattleOptions {
    pub mode: BattleMode,
    pub speed: BattleSpeed,
    /// VIP tier of the acting player, only used to gate `speed`
    pub vip_level: u8,
}

impl BattleOptions {
    pub fn new(mode: BattleMode, speed: BattleSpeed, vip_level: u8) -> Self {
        Self {
            mode,
            speed,
            vip_level,
        }
    }

    pub fn auto() -> Self {
        Self::default()
    }

    pub fn manual() -> Self {
        Self {
            mode: BattleMode::Manual,
            ..Self::default()
        }
    }

    /// Reject a speed above the VIP ceiling
    pub fn validate(&self) -> Result<()> {
        let max = BattleSpeed::max_for_vip(self.vip_level);
        if self.speed > max {
            return Err(BattleError::SpeedNotPermitted {
                requested: self.speed.multiplier(),
                max: max.multiplier(),
                vip_level: self.vip_level,
            });
        }
        Ok(())
    }
}
