use thiserror::Error;

/// Errors returned by the controller and the simulator.
///
/// Every variant is a precondition violation on caller-supplied data; none of
/// them are transient, so nothing in this crate retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A timestamp went backwards relative to the one before it.
    #[error("timestamp {current} is earlier than the previous timestamp {previous}")]
    InvalidTimeOrder { previous: i64, current: i64 },

    /// `mass * heat_capacity` is zero, so the mass cannot absorb heat.
    #[error("thermal mass is degenerate: mass {mass} * heat capacity {heat_capacity} is zero")]
    DegenerateMass { mass: f64, heat_capacity: f64 },

    /// `simulate` was given no timesteps.
    #[error("timestep sequence is empty")]
    EmptyInput,

    /// Invalid parameter value (NaN, infinity, or out of allowed range)
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
