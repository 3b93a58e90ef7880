//! Continuous Lotka–Volterra reference series for comparison plots.
//!
//! Forward-Euler integration of
//! `prey' = a·prey − b·prey·predators` and
//! `predators' = −c·predators + d·prey·predators`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LotkaVolterraParams {
    /// `a`: prey growth rate.
    pub prey_birth_rate: f64,
    /// `b`: prey lost per predator encounter.
    pub predation_rate: f64,
    /// `c`: predator death rate.
    pub predator_death_rate: f64,
    /// `d`: predator growth per prey encounter.
    pub predator_birth_rate: f64,
    pub initial_prey: f64,
    pub initial_predators: f64,
    /// Integration time step.
    pub dt: f64,
    pub steps: usize,
}

impl Default for LotkaVolterraParams {
    fn default() -> Self {
        Self {
            prey_birth_rate: 0.5,
            predation_rate: 0.1,
            predator_death_rate: 0.5,
            predator_birth_rate: 0.015,
            initial_prey: 1000.0,
            initial_predators: 0.0,
            dt: 0.01,
            steps: 4500,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReferencePoint {
    pub step: usize,
    pub time: f64,
    pub prey: f64,
    pub predators: f64,
}

/// Returns `steps + 1` points, starting with the initial populations.
#[must_use]
pub fn integrate(params: &LotkaVolterraParams) -> Vec<ReferencePoint> {
    let mut points = Vec::with_capacity(params.steps + 1);
    let mut prey = params.initial_prey;
    let mut predators = params.initial_predators;
    points.push(ReferencePoint {
        step: 0,
        time: 0.0,
        prey,
        predators,
    });
    for step in 1..=params.steps {
        let encounters = prey * predators;
        let next_prey =
            prey + params.dt * (params.prey_birth_rate * prey - params.predation_rate * encounters);
        let next_predators = predators
            + params.dt
                * (params.predator_birth_rate * encounters
                    - params.predator_death_rate * predators);
        prey = next_prey;
        predators = next_predators;
        points.push(ReferencePoint {
            step,
            time: step as f64 * params.dt,
            prey,
            predators,
        });
    }
    points
}
