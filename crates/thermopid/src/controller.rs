use log::{trace, warn};

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for a PID controller.
///
/// Uses a builder pattern to configure the controller parameters. Unlike
/// [`Controller::new`], [`ControllerConfig::build`] validates every value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ControllerConfig {
    kp: f64,                // Proportional gain
    ki: f64,                // Integral gain
    kd: f64,                // Derivative gain
    target: f64,            // Setpoint, fixed for the controller's lifetime
    settled_threshold: f64, // |error| at or below this counts as "at target"
}

impl Default for ControllerConfig {
    fn default() -> Self {
        ControllerConfig {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
            target: 0.0,
            settled_threshold: 0.05,
        }
    }
}

impl ControllerConfig {
    /// Create a new PID controller configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the proportional gain (Kp).
    ///
    /// Negative gains are allowed; they flip the sign of the control action.
    pub fn with_kp(mut self, kp: f64) -> Self {
        self.kp = kp;
        self
    }

    /// Set the integral gain (Ki).
    pub fn with_ki(mut self, ki: f64) -> Self {
        self.ki = ki;
        self
    }

    /// Set the derivative gain (Kd).
    pub fn with_kd(mut self, kd: f64) -> Self {
        self.kd = kd;
        self
    }

    /// Set the setpoint (target value).
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = target;
        self
    }

    /// Set the error band used by [`ControllerStatistics`] to decide when the
    /// process has reached and settled at the target.
    pub fn with_settled_threshold(mut self, threshold: f64) -> Self {
        self.settled_threshold = threshold;
        self
    }

    pub fn kp(&self) -> f64 {
        self.kp
    }

    pub fn ki(&self) -> f64 {
        self.ki
    }

    pub fn kd(&self) -> f64 {
        self.kd
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    /// Validate the configuration and create a controller starting from
    /// `initial_state` at time `t0`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if any gain, the target, the
    /// threshold or `initial_state` is NaN or infinite, or if the threshold is
    /// negative.
    pub fn build(&self, initial_state: f64, t0: i64) -> Result<Controller> {
        if !self.kp.is_finite() {
            return Err(Error::InvalidParameter("kp must be a finite number"));
        }
        if !self.ki.is_finite() {
            return Err(Error::InvalidParameter("ki must be a finite number"));
        }
        if !self.kd.is_finite() {
            return Err(Error::InvalidParameter("kd must be a finite number"));
        }
        if !self.target.is_finite() {
            return Err(Error::InvalidParameter("target must be a finite number"));
        }
        if !self.settled_threshold.is_finite() || self.settled_threshold < 0.0 {
            return Err(Error::InvalidParameter(
                "settled threshold must be a finite, non-negative number",
            ));
        }
        if !initial_state.is_finite() {
            return Err(Error::InvalidParameter(
                "initial state must be a finite number",
            ));
        }

        let mut controller = Controller::new(
            self.kp,
            self.ki,
            self.kd,
            self.target,
            initial_state,
            t0,
        );
        controller.stats.settled_threshold = self.settled_threshold;
        Ok(controller)
    }
}

/// The individual contributions that make up one control output.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlTerms {
    pub error: f64, // state - target at this sample
    pub p: f64,     // Proportional term
    pub i: f64,     // Integral term
    pub d: f64,     // Derivative term
}

impl ControlTerms {
    /// The control signal, `p + i + d`.
    pub fn output(&self) -> f64 {
        self.p + self.i + self.d
    }
}

/// Statistics about the controller's performance.
///
/// Times are measured in the caller's timestamp units, relative to the
/// controller's `t0`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControllerStatistics {
    pub samples: u64,               // Number of accepted samples
    pub average_error: f64,         // Mean absolute error over all samples
    pub max_overshoot: f64,         // Largest absolute error seen
    pub rise_time: Option<i64>,     // First time the error entered the band
    pub settling_time: Option<i64>, // Time since which the error stayed in the band
}

#[derive(Debug, Clone)]
struct Tracker {
    t0: i64,
    settled_threshold: f64,
    error_sum: f64,
    error_count: u64,
    max_error: f64,
    rise_time: Option<i64>,
    settle_time: Option<i64>,
}

impl Tracker {
    fn new(t0: i64) -> Self {
        Tracker {
            t0,
            settled_threshold: 0.05,
            error_sum: 0.0,
            error_count: 0,
            max_error: 0.0,
            rise_time: None,
            settle_time: None,
        }
    }

    fn record(&mut self, t: i64, error: f64) {
        let magnitude = error.abs();
        self.error_sum += magnitude;
        self.error_count += 1;
        self.max_error = self.max_error.max(magnitude);

        if magnitude <= self.settled_threshold {
            let elapsed = t.saturating_sub(self.t0);
            if self.rise_time.is_none() {
                self.rise_time = Some(elapsed);
            }
            if self.settle_time.is_none() {
                self.settle_time = Some(elapsed);
            }
        } else {
            // Leaving the band restarts the settling clock.
            self.settle_time = None;
        }
    }

    fn snapshot(&self) -> ControllerStatistics {
        let average_error = if self.error_count > 0 {
            self.error_sum / self.error_count as f64
        } else {
            0.0
        };

        ControllerStatistics {
            samples: self.error_count,
            average_error,
            max_overshoot: self.max_error,
            rise_time: self.rise_time,
            settling_time: self.settle_time,
        }
    }
}

/// Time from `from` to `to` as a float. Widened first, since the span
/// between two `i64` timestamps can exceed `i64::MAX`.
pub(crate) fn interval(from: i64, to: i64) -> f64 {
    (i128::from(to) - i128::from(from)) as f64
}

/// Area under the straight line from `from` to `to` over an interval `dt`.
///
/// Split into the rectangle under the smaller endpoint plus the triangle
/// between the two endpoints.
pub(crate) fn trapezoid_area(from: f64, to: f64, dt: f64) -> f64 {
    from.min(to) * dt + (to - from).abs() * dt / 2.0
}

/// A discrete-time PID controller driven by caller-supplied timestamps.
///
/// This implementation follows the standard PID algorithm:
/// u(t) = Kp * e(t) + Ki * ∫e(t)dt + Kd * de(t)/dt
///
/// Where:
/// - u(t) is the control signal
/// - e(t) is the error (process_variable - target)
/// - Kp, Ki, Kd are the proportional, integral, and derivative gains
///
/// The integral is accumulated with the trapezoidal rule and the output is
/// never clamped; actuator limits are the caller's concern.
#[derive(Debug, Clone)]
pub struct Controller {
    kp: f64,
    ki: f64,
    kd: f64,
    target: f64,
    accumulated_error: f64, // Trapezoidal integral of error from t0 to last_t
    last_error: f64,        // Error at the most recent sample
    last_t: i64,            // Timestamp of the most recent sample
    stats: Tracker,
}

impl Controller {
    /// Create a controller whose history starts at `initial_state` at `t0`.
    ///
    /// Accepts any values, including negative gains. Use
    /// [`ControllerConfig::build`] for a validated controller.
    pub fn new(kp: f64, ki: f64, kd: f64, target: f64, initial_state: f64, t0: i64) -> Self {
        Controller {
            kp,
            ki,
            kd,
            target,
            accumulated_error: 0.0,
            last_error: initial_state - target,
            last_t: t0,
            stats: Tracker::new(t0),
        }
    }

    /// Compute the control output for `state` measured at time `t`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimeOrder`] if `t` is earlier than the previous
    /// sample (or `t0`). The controller is left unchanged in that case.
    pub fn sample(&mut self, t: i64, state: f64) -> Result<f64> {
        self.sample_terms(t, state).map(|terms| terms.output())
    }

    /// Like [`Controller::sample`], but returns the individual P, I and D
    /// contributions.
    pub fn sample_terms(&mut self, t: i64, state: f64) -> Result<ControlTerms> {
        let prev_t = self.last_t;
        let prev_error = self.last_error;

        if t < prev_t {
            warn!("rejecting sample at t={t}: previous sample was at t={prev_t}");
            return Err(Error::InvalidTimeOrder {
                previous: prev_t,
                current: t,
            });
        }

        let error = state - self.target;
        let dt = interval(prev_t, t);

        let p = self.kp * error;

        let accumulated_error = self.accumulated_error + trapezoid_area(prev_error, error, dt);
        let i = self.ki * accumulated_error;

        // A repeated timestamp carries no rate information.
        let d = if dt > 0.0 {
            self.kd * (error - prev_error) / dt
        } else {
            0.0
        };

        self.accumulated_error = accumulated_error;
        self.last_error = error;
        self.last_t = t;
        self.stats.record(t, error);

        let terms = ControlTerms { error, p, i, d };
        trace!(
            "t={t} state={state} error={error} p={p} i={i} d={d} output={}",
            terms.output()
        );
        Ok(terms)
    }

    pub fn kp(&self) -> f64 {
        self.kp
    }

    pub fn ki(&self) -> f64 {
        self.ki
    }

    pub fn kd(&self) -> f64 {
        self.kd
    }

    /// Get the setpoint (target value).
    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn accumulated_error(&self) -> f64 {
        self.accumulated_error
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    pub fn last_t(&self) -> i64 {
        self.last_t
    }

    /// Get the controller statistics.
    pub fn statistics(&self) -> ControllerStatistics {
        self.stats.snapshot()
    }
}
