//! Positional targeting
//!
//! The back line is protected while any front-line member of a side is
//! alive. Within the eligible set, actors pick by position and role, with
//! the lowest hp fraction as the universal tie-break.

use ordered_float::OrderedFloat;

use crate::battle::participant::{Participant, Role};

/// Living members of `candidates` that may be attacked right now
///
/// Only the front line (slots 1-2) is eligible while any of it stands.
/// Once the front line is down, every living member is eligible.
pub fn available_targets(candidates: &[Participant]) -> Vec<&Participant> {
    let living: Vec<&Participant> = candidates.iter().filter(|p| p.is_alive()).collect();

    if living.iter().any(|p| p.is_front_line()) {
        living.into_iter().filter(|p| p.is_front_line()).collect()
    } else {
        living
    }
}

/// Target with the lowest hp fraction (first one wins exact ties)
pub fn weakest<'a>(targets: &[&'a Participant]) -> Option<&'a Participant> {
    targets
        .iter()
        .copied()
        .min_by_key(|p| OrderedFloat(p.hp_fraction()))
}

/// Pick a single target for `actor` from an already eligible set
pub fn select_target<'a>(actor: &Participant, eligible: &[&'a Participant]) -> Option<&'a Participant> {
    if eligible.is_empty() {
        return None;
    }

    if actor.is_front_line() {
        let front: Vec<&Participant> = eligible.iter().copied().filter(|p| p.is_front_line()).collect();
        if !front.is_empty() {
            return select_best_target_by_role(actor, &front);
        }
        let back: Vec<&Participant> = eligible.iter().copied().filter(|p| !p.is_front_line()).collect();
        return select_best_target_by_role(actor, &back);
    }

    // Back-line ranged and supports reach for the enemy back line
    if matches!(actor.role, Role::DpsRanged | Role::Support) {
        let back: Vec<&Participant> = eligible.iter().copied().filter(|p| !p.is_front_line()).collect();

        let back_supports: Vec<&Participant> =
            back.iter().copied().filter(|p| p.role == Role::Support).collect();
        if let Some(target) = weakest(&back_supports) {
            return Some(target);
        }
        if let Some(target) = weakest(&back) {
            return Some(target);
        }
    }

    select_best_target_by_role(actor, eligible)
}

/// Role-driven priority
///
/// Supports always focus the weakest target. Everyone else goes for
/// supports first, then damage dealers, then the weakest of whatever is left.
pub fn select_best_target_by_role<'a>(
    actor: &Participant,
    targets: &[&'a Participant],
) -> Option<&'a Participant> {
    if actor.role == Role::Support {
        return weakest(targets);
    }

    let supports: Vec<&Participant> = targets.iter().copied().filter(|p| p.role == Role::Support).collect();
    if let Some(target) = weakest(&supports) {
        return Some(target);
    }

    let dps: Vec<&Participant> = targets.iter().copied().filter(|p| p.role.is_dps()).collect();
    if let Some(target) = weakest(&dps) {
        return Some(target);
    }

    weakest(targets)
}
