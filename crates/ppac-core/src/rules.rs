//! Per-cell stochastic transition rules.
//!
//! Every rule is a pure function of the cell's current state, its neighbor
//! counts in the frozen snapshot, the probabilities and the draws it pulls.
//! Draws are taken in a fixed order per cell; see [`next_state`].

use serde::{Deserialize, Serialize};

use crate::Probabilities;
use crate::grid::CellState;
use crate::neighborhood::NeighborCounts;
use crate::random::DrawSource;

/// Selects one of the supported rule tables.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum RuleSet {
    /// Prey colonise any empty cell next to prey when no predator is near;
    /// predators die with a flat probability regardless of surroundings.
    #[default]
    FlatPredatorDeath,
    /// Prey colonise empty cells with 2 to 4 prey neighbors that outnumber
    /// predators; predators with no adjacent prey always die.
    PreyGated,
}

/// Computes the next state of one cell.
///
/// Draw order for [`RuleSet::FlatPredatorDeath`]:
/// - empty, prey and no predators nearby: one draw against the prey birth rate;
/// - empty, prey and predators nearby: two draws, predator birth then prey death;
/// - prey threatened by a predator: a prey death draw, then a predator birth
///   draw only if the prey died;
/// - predator: one draw against the predator death rate.
///
/// [`RuleSet::PreyGated`] shares the prey rule and skips draws for outcomes
/// that are certain.
pub fn next_state<D: DrawSource + ?Sized>(
    rule_set: RuleSet,
    current: CellState,
    counts: NeighborCounts,
    rates: &Probabilities,
    draws: &mut D,
) -> CellState {
    match (rule_set, current) {
        (_, CellState::Prey) => prey_transition(counts, rates, draws),
        (RuleSet::FlatPredatorDeath, CellState::Empty) => flat_empty(counts, rates, draws),
        (RuleSet::FlatPredatorDeath, CellState::Predator) => {
            predator_starvation(rates.predator_death_rate, draws)
        }
        (RuleSet::PreyGated, CellState::Empty) => gated_empty(counts, rates, draws),
        (RuleSet::PreyGated, CellState::Predator) => {
            if counts.prey == 0 {
                CellState::Empty
            } else {
                predator_starvation(rates.predator_death_rate, draws)
            }
        }
    }
}

fn flat_empty<D: DrawSource + ?Sized>(
    counts: NeighborCounts,
    rates: &Probabilities,
    draws: &mut D,
) -> CellState {
    if counts.prey == 0 {
        return CellState::Empty;
    }
    if counts.predators == 0 {
        return if draws.draw() <= rates.prey_birth_rate {
            CellState::Prey
        } else {
            CellState::Empty
        };
    }
    // Both draws are consumed even when the first fails.
    let birth = draws.draw();
    let predation = draws.draw();
    if birth <= rates.predator_birth_rate && predation <= rates.prey_death_rate {
        CellState::Predator
    } else {
        CellState::Empty
    }
}

fn gated_empty<D: DrawSource + ?Sized>(
    counts: NeighborCounts,
    rates: &Probabilities,
    draws: &mut D,
) -> CellState {
    let breeding = (2..=4).contains(&counts.prey) && counts.prey > counts.predators;
    if breeding && draws.draw() <= rates.prey_birth_rate {
        CellState::Prey
    } else {
        CellState::Empty
    }
}

fn prey_transition<D: DrawSource + ?Sized>(
    counts: NeighborCounts,
    rates: &Probabilities,
    draws: &mut D,
) -> CellState {
    if counts.predators == 0 || draws.draw() > rates.prey_death_rate {
        return CellState::Prey;
    }
    if draws.draw() <= rates.predator_birth_rate {
        CellState::Predator
    } else {
        CellState::Empty
    }
}

fn predator_starvation<D: DrawSource + ?Sized>(death_rate: f64, draws: &mut D) -> CellState {
    if draws.draw() <= death_rate {
        CellState::Empty
    } else {
        CellState::Predator
    }
}
