//! Flow sources that drive a [`ThermalSystem`](crate::ThermalSystem).
//!
//! Any closure `FnMut(i64) -> f64` is an [`InFlow`] and any closure
//! `FnMut(i64, f64) -> f64` is an [`OutFlow`]. The types here cover the
//! sources that need state of their own: seeded noise and a controller
//! closing the loop.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::controller::Controller;
use crate::error::{Error, Result};

/// Rate at which heat enters the system, as a function of time.
pub trait InFlow {
    fn rate(&mut self, t: i64) -> Result<f64>;
}

/// Rate at which heat leaves the system, as a function of time and the
/// current state.
pub trait OutFlow {
    fn rate(&mut self, t: i64, state: f64) -> Result<f64>;
}

impl<F> InFlow for F
where
    F: FnMut(i64) -> f64,
{
    fn rate(&mut self, t: i64) -> Result<f64> {
        Ok(self(t))
    }
}

impl<F> OutFlow for F
where
    F: FnMut(i64, f64) -> f64,
{
    fn rate(&mut self, t: i64, state: f64) -> Result<f64> {
        Ok(self(t, state))
    }
}

/// A flow that never changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constant(pub f64);

impl InFlow for Constant {
    fn rate(&mut self, _t: i64) -> Result<f64> {
        Ok(self.0)
    }
}

impl OutFlow for Constant {
    fn rate(&mut self, _t: i64, _state: f64) -> Result<f64> {
        Ok(self.0)
    }
}

/// Uniform random flow in `[low, high)`, reproducible from its seed.
#[derive(Debug, Clone)]
pub struct Noise {
    low: f64,
    high: f64,
    rng: StdRng,
}

impl Noise {
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] unless both bounds are finite and
    /// `low < high`.
    pub fn new(low: f64, high: f64, seed: u64) -> Result<Self> {
        if !low.is_finite() || !high.is_finite() {
            return Err(Error::InvalidParameter("noise bounds must be finite numbers"));
        }
        if low >= high {
            return Err(Error::InvalidParameter(
                "noise lower bound must be below the upper bound",
            ));
        }

        Ok(Noise {
            low,
            high,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn draw(&mut self) -> f64 {
        self.rng.gen_range(self.low..self.high)
    }
}

impl InFlow for Noise {
    fn rate(&mut self, _t: i64) -> Result<f64> {
        Ok(self.draw())
    }
}

impl OutFlow for Noise {
    fn rate(&mut self, _t: i64, _state: f64) -> Result<f64> {
        Ok(self.draw())
    }
}

/// Closes the loop: the out-flow is whatever the controller asks for.
///
/// Optional actuator limits clamp the controller's output before it reaches
/// the plant; the controller itself never saturates.
#[derive(Debug, Clone)]
pub struct Controlled {
    controller: Controller,
    limits: Option<(f64, f64)>,
}

impl Controlled {
    pub fn new(controller: Controller) -> Self {
        Controlled {
            controller,
            limits: None,
        }
    }

    /// Clamp every rate to `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] unless both limits are finite and
    /// `min <= max`.
    pub fn with_limits(mut self, min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(Error::InvalidParameter("actuator limits must be finite numbers"));
        }
        if min > max {
            return Err(Error::InvalidParameter(
                "actuator lower limit must not exceed the upper limit",
            ));
        }
        self.limits = Some((min, max));
        Ok(self)
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn into_controller(self) -> Controller {
        self.controller
    }
}

impl OutFlow for Controlled {
    fn rate(&mut self, t: i64, state: f64) -> Result<f64> {
        let output = self.controller.sample(t, state)?;
        Ok(match self.limits {
            Some((min, max)) => output.max(min).min(max),
            None => output,
        })
    }
}
