//! Canned input regimes for exercising the controller against the simulator.

use crate::controller::ControllerConfig;
use crate::error::{Error, Result};
use crate::flow::{Constant, Controlled, Noise};
use crate::system::ThermalSystem;
use crate::thermal::ThermalMass;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Plant parameters shared by every scenario.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScenarioConfig {
    /// Mass of the body
    pub mass: f64,
    /// Heat capacity per unit mass
    pub heat_capacity: f64,
    /// Temperature at the first timestep
    pub start_state: f64,
    /// Constant rate at which heat is pumped in
    pub in_rate: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        ScenarioConfig {
            mass: 1.0,
            heat_capacity: 1.0,
            start_state: 0.0,
            in_rate: 1.0,
        }
    }
}

impl ScenarioConfig {
    fn thermal_mass(&self) -> Result<ThermalMass> {
        ThermalMass::new(self.mass, self.heat_capacity, self.start_state)
    }
}

/// `start, start + step, ...` up to and including `end`.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if `step` is not positive or `end`
/// comes before `start`.
pub fn timesteps(start: i64, end: i64, step: i64) -> Result<Vec<i64>> {
    if step <= 0 {
        return Err(Error::InvalidParameter("step must be positive"));
    }
    if end < start {
        return Err(Error::InvalidParameter("end must not come before start"));
    }

    let step = usize::try_from(step).map_err(|_| Error::InvalidParameter("step is too large"))?;
    Ok((start..=end).step_by(step).collect())
}

/// Heat leaves exactly as fast as it arrives; the state never moves.
pub fn equilibrium(config: &ScenarioConfig) -> Result<ThermalSystem<Constant, Constant>> {
    Ok(ThermalSystem::new(
        config.thermal_mass()?,
        Constant(config.in_rate),
        Constant(config.in_rate),
    ))
}

/// Heat arrives and nothing removes it; the state drifts without bound.
pub fn runaway(config: &ScenarioConfig) -> Result<ThermalSystem<Constant, Constant>> {
    Ok(ThermalSystem::new(
        config.thermal_mass()?,
        Constant(config.in_rate),
        Constant(0.0),
    ))
}

/// Heat is removed at a random rate drawn from `[low, high)` each step.
pub fn noise(
    config: &ScenarioConfig,
    low: f64,
    high: f64,
    seed: u64,
) -> Result<ThermalSystem<Constant, Noise>> {
    Ok(ThermalSystem::new(
        config.thermal_mass()?,
        Constant(config.in_rate),
        Noise::new(low, high, seed)?,
    ))
}

/// Heat removal is set by a PID controller watching the state.
///
/// The controller starts at `config.start_state` at `t0 = 0`, so timesteps
/// passed to `simulate` must not be negative. `limits` clamps the
/// controller's output to what the actuator can deliver, and is rejected
/// with [`Error::InvalidParameter`] if inverted or non-finite.
pub fn closed_loop(
    config: &ScenarioConfig,
    controller: &ControllerConfig,
    limits: Option<(f64, f64)>,
) -> Result<ThermalSystem<Constant, Controlled>> {
    let controller = controller.build(config.start_state, 0)?;
    let out_flow = match limits {
        Some((min, max)) => Controlled::new(controller).with_limits(min, max)?,
        None => Controlled::new(controller),
    };

    Ok(ThermalSystem::new(
        config.thermal_mass()?,
        Constant(config.in_rate),
        out_flow,
    ))
}
