// Thermopid: A PID controller and thermal process simulator written in Rust
// Copyright 2024

//! A discrete-time PID controller and the thermal process simulator used to
//! validate it.
//!
//! The [`Controller`] turns `(time, state)` samples into a control signal.
//! The [`ThermalSystem`] advances a [`ThermalMass`] under an in-flow and an
//! out-flow of heat and records a [`Trace`]. Closing the loop means using a
//! [`flow::Controlled`] as the out-flow:
//!
//! ```
//! use thermopid::flow::{Constant, Controlled};
//! use thermopid::{ControllerConfig, ThermalMass, ThermalSystem};
//!
//! let controller = ControllerConfig::new()
//!     .with_kp(2.0)
//!     .with_ki(0.1)
//!     .with_target(20.0)
//!     .build(15.0, 0)?;
//! let mass = ThermalMass::new(10.0, 1.0, 15.0)?;
//!
//! let mut system = ThermalSystem::new(
//!     mass,
//!     Constant(2.0),
//!     Controlled::new(controller).with_limits(0.0, 10.0)?,
//! );
//! let timesteps: Vec<i64> = (0..=300).collect();
//! let trace = system.simulate(&timesteps)?;
//!
//! assert_eq!(trace.len(), timesteps.len());
//! # Ok::<(), thermopid::Error>(())
//! ```

mod controller;
mod error;
pub mod flow;
pub mod scenario;
mod system;
mod thermal;

pub use controller::{ControlTerms, Controller, ControllerConfig, ControllerStatistics};
pub use error::{Error, Result};
pub use flow::{InFlow, OutFlow};
pub use system::{ThermalSystem, Trace, TraceRecord};
pub use thermal::ThermalMass;
