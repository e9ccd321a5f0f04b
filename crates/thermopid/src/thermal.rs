use crate::error::{Error, Result};

/// A lumped body that stores heat as a single temperature.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermalMass {
    mass: f64,
    heat_capacity: f64,
    temperature: f64,
}

impl ThermalMass {
    /// Create a mass at `start_state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateMass`] if `mass * heat_capacity` is zero and
    /// [`Error::InvalidParameter`] if any argument is NaN or infinite, or if
    /// `mass` or `heat_capacity` is negative.
    pub fn new(mass: f64, heat_capacity: f64, start_state: f64) -> Result<Self> {
        if !mass.is_finite() || !heat_capacity.is_finite() {
            return Err(Error::InvalidParameter(
                "mass and heat capacity must be finite numbers",
            ));
        }
        if !start_state.is_finite() {
            return Err(Error::InvalidParameter("start state must be a finite number"));
        }
        if mass * heat_capacity == 0.0 {
            return Err(Error::DegenerateMass {
                mass,
                heat_capacity,
            });
        }
        if mass < 0.0 || heat_capacity < 0.0 {
            return Err(Error::InvalidParameter(
                "mass and heat capacity must be positive",
            ));
        }

        Ok(ThermalMass {
            mass,
            heat_capacity,
            temperature: start_state,
        })
    }

    pub fn current_state(&self) -> f64 {
        self.temperature
    }

    /// Apply one interval's worth of heat flowing in and out.
    pub fn update(&mut self, heat_in: f64, heat_out: f64) {
        self.temperature += (heat_in - heat_out) / self.thermal_capacity();
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn heat_capacity(&self) -> f64 {
        self.heat_capacity
    }

    /// Heat needed to raise the temperature by one unit (`mass * heat_capacity`).
    pub fn thermal_capacity(&self) -> f64 {
        self.mass * self.heat_capacity
    }
}
