//! Gacha Arena - turn-based hero battle simulation

pub mod battle;
pub mod core;
