use thermopid::scenario::{self, ScenarioConfig};
use thermopid::ControllerConfig;

// Simulation constants - easy to adjust
const SIMULATION_END: i64 = 600; // Last timestep in seconds
const STEP: i64 = 5; // Seconds between samples
const TARGET_TEMPERATURE: f64 = 22.0; // Setpoint in Celsius
const HEATER_POWER: f64 = 150.0; // W - constant heat input
const MAX_COOLING: f64 = 400.0; // W - most heat the cooler can remove

/// This example regulates the temperature of a small water tank that is
/// heated at a constant rate and cooled by a PID-driven chiller.
///
/// Run with `RUST_LOG=thermopid=trace` to see every controller sample.
fn main() -> Result<(), thermopid::Error> {
    env_logger::init();

    let plant = ScenarioConfig {
        mass: 2.0,             // kg of water
        heat_capacity: 4186.0, // J/(kg·°C)
        start_state: 30.0,     // Starting temperature
        in_rate: HEATER_POWER,
    };

    let controller = ControllerConfig::new()
        .with_kp(120.0) // Proportional gain
        .with_ki(0.5) // Integral gain
        .with_kd(40.0) // Derivative gain
        .with_target(TARGET_TEMPERATURE)
        .with_settled_threshold(0.1);

    let mut system = scenario::closed_loop(&plant, &controller, Some((0.0, MAX_COOLING)))?;
    let timesteps = scenario::timesteps(0, SIMULATION_END, STEP)?;

    println!("Tank Temperature Control Simulation");
    println!("===================================");
    println!("Target temperature: {:.1}°C", TARGET_TEMPERATURE);
    println!("Starting temperature: {:.1}°C", plant.start_state);
    println!();
    println!("Time(s) | Temperature(°C) | Heat in(W) | Heat out(W)");
    println!("--------|-----------------|------------|------------");

    let trace = system.simulate(&timesteps)?;
    for record in &trace {
        println!(
            "{:7} | {:15.3} | {:10.1} | {:10.1}",
            record.t, record.state, record.flow_in, record.flow_out
        );
    }

    let (_, _, cooler) = system.into_parts();
    let stats = cooler.controller().statistics();

    println!("\nController Performance Statistics:");
    println!("----------------------------------");
    println!("Samples: {}", stats.samples);
    println!("Average error: {:.3}°C", stats.average_error);
    println!("Max overshoot: {:.3}°C", stats.max_overshoot);
    match stats.rise_time {
        Some(t) => println!("Rise time: {t} seconds"),
        None => println!("Rise time: target not reached"),
    }
    match stats.settling_time {
        Some(t) => println!("Settling time: {t} seconds"),
        None => println!("Settling time: not settled"),
    }

    Ok(())
}
