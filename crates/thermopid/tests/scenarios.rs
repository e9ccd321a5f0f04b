//! End-to-end runs of the controller against the thermal simulator.

use thermopid::flow::{Constant, Controlled};
use thermopid::scenario::{self, ScenarioConfig};
use thermopid::{Controller, ControllerConfig, Error, ThermalMass, ThermalSystem};

#[test]
fn test_open_loop_equilibrium_matches_reference() {
    let mass = ThermalMass::new(1.0, 1.0, 0.0).unwrap();
    let mut system = ThermalSystem::new(mass, |_t: i64| 1.0, |_t: i64, _state: f64| 1.0);

    let trace = system.simulate(&[0, 1, 2, 3]).unwrap();
    assert_eq!(
        trace.into_tuples(),
        vec![
            (0, 0.0, 1.0, 1.0),
            (1, 0.0, 1.0, 1.0),
            (2, 0.0, 1.0, 1.0),
            (3, 0.0, 1.0, 1.0),
        ]
    );
}

#[test]
fn test_driver_loop_matches_closed_loop_flow() {
    // Drive the controller by hand the way an external loop would, and
    // check it agrees with the Controlled out-flow.
    let config = ControllerConfig::new()
        .with_kp(1.5)
        .with_ki(0.2)
        .with_kd(0.3)
        .with_target(5.0);
    let steps = scenario::timesteps(0, 40, 2).unwrap();

    let mut controller = config.build(0.0, 0).unwrap();
    let mut mass = ThermalMass::new(4.0, 1.0, 0.0).unwrap();
    let mut manual = Vec::new();
    let mut prev: Option<(i64, f64)> = None;
    for &t in &steps {
        if let Some((prev_t, prev_out)) = prev {
            let dt = (t - prev_t) as f64;
            mass.update(3.0 * dt, prev_out * dt);
        }
        let out = controller.sample(t, mass.current_state()).unwrap();
        manual.push(mass.current_state());
        prev = Some((t, out));
    }

    let mut system = ThermalSystem::new(
        ThermalMass::new(4.0, 1.0, 0.0).unwrap(),
        Constant(3.0),
        Controlled::new(config.build(0.0, 0).unwrap()),
    );
    let trace = system.simulate(&steps).unwrap();

    assert_eq!(trace.states(), manual);
    let (_, _, flow) = system.into_parts();
    assert_eq!(
        flow.into_controller().accumulated_error(),
        controller.accumulated_error()
    );
}

#[test]
fn test_closed_loop_beats_runaway() {
    let plant = ScenarioConfig {
        mass: 10.0,
        start_state: 15.0,
        in_rate: 2.0,
        ..ScenarioConfig::default()
    };
    let steps = scenario::timesteps(0, 300, 1).unwrap();

    let runaway = scenario::runaway(&plant).unwrap().simulate(&steps).unwrap();
    let controlled = scenario::closed_loop(
        &plant,
        &ControllerConfig::new().with_kp(2.0).with_ki(0.1).with_target(20.0),
        Some((0.0, 10.0)),
    )
    .unwrap()
    .simulate(&steps)
    .unwrap();

    let runaway_final = runaway.last().unwrap().state;
    let controlled_final = controlled.last().unwrap().state;
    assert!(runaway_final > 70.0);
    assert!((controlled_final - 20.0).abs() < 0.1);
}

#[test]
fn test_closed_loop_rejects_negative_time() {
    let mut system = scenario::closed_loop(
        &ScenarioConfig::default(),
        &ControllerConfig::new(),
        None,
    )
    .unwrap();

    assert_eq!(
        system.simulate(&[-3, -2]),
        Err(Error::InvalidTimeOrder {
            previous: 0,
            current: -3
        })
    );
}

#[test]
fn test_controller_statistics_after_run() {
    let plant = ScenarioConfig {
        mass: 10.0,
        start_state: 15.0,
        in_rate: 2.0,
        ..ScenarioConfig::default()
    };
    let config = ControllerConfig::new()
        .with_kp(2.0)
        .with_ki(0.1)
        .with_target(20.0)
        .with_settled_threshold(0.5);
    let mut system = scenario::closed_loop(&plant, &config, Some((0.0, 10.0))).unwrap();
    system.simulate(&scenario::timesteps(0, 300, 1).unwrap()).unwrap();

    let stats = system.out_flow().controller().statistics();
    assert_eq!(stats.samples, 301);
    assert_eq!(stats.max_overshoot, 5.0);
    assert!(stats.rise_time.is_some());
    assert!(stats.settling_time.is_some());
}

#[test]
fn test_unchecked_constructor_matches_builder() {
    let mut direct = Controller::new(1.0, 0.5, 0.25, 3.0, 1.0, 0);
    let mut built = ControllerConfig::new()
        .with_kp(1.0)
        .with_ki(0.5)
        .with_kd(0.25)
        .with_target(3.0)
        .build(1.0, 0)
        .unwrap();

    for (t, state) in [(1, 1.5), (2, 2.5), (4, 3.5)] {
        assert_eq!(direct.sample(t, state), built.sample(t, state));
    }
}

#[cfg(feature = "serde")]
#[test]
fn test_trace_serializes_to_json() {
    let mut system = scenario::equilibrium(&ScenarioConfig::default()).unwrap();
    let trace = system.simulate(&[0, 1]).unwrap();

    let json = serde_json::to_string(&trace).unwrap();
    let decoded: thermopid::Trace = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, trace);
}

#[cfg(feature = "serde")]
#[test]
fn test_scenario_config_fills_defaults() {
    let config: ScenarioConfig = serde_json::from_str(r#"{"start_state": 18.5}"#).unwrap();
    assert_eq!(config.start_state, 18.5);
    assert_eq!(config.mass, 1.0);
    assert_eq!(config.in_rate, 1.0);
}
