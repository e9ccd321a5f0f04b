use log::{debug, warn};

use crate::controller::interval;
use crate::error::{Error, Result};
use crate::flow::{InFlow, OutFlow};
use crate::thermal::ThermalMass;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One simulated timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceRecord {
    pub t: i64,
    pub state: f64,
    pub flow_in: f64,
    pub flow_out: f64,
}

impl From<TraceRecord> for (i64, f64, f64, f64) {
    fn from(record: TraceRecord) -> Self {
        (record.t, record.state, record.flow_in, record.flow_out)
    }
}

/// The records produced by one [`ThermalSystem::simulate`] call, in
/// timestep order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trace {
    records: Vec<TraceRecord>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TraceRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TraceRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TraceRecord> {
        self.records.last()
    }

    /// The state column.
    pub fn states(&self) -> Vec<f64> {
        self.records.iter().map(|record| record.state).collect()
    }

    /// `(t, state, flow_in, flow_out)` tuples, for CSV writers and plotters.
    pub fn into_tuples(self) -> Vec<(i64, f64, f64, f64)> {
        self.records.into_iter().map(Into::into).collect()
    }
}

impl IntoIterator for Trace {
    type Item = TraceRecord;
    type IntoIter = std::vec::IntoIter<TraceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a TraceRecord;
    type IntoIter = std::slice::Iter<'a, TraceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn check_order(timesteps: &[i64]) -> Result<()> {
    match timesteps.windows(2).find(|pair| pair[1] < pair[0]) {
        Some(pair) => Err(Error::InvalidTimeOrder {
            previous: pair[0],
            current: pair[1],
        }),
        None => Ok(()),
    }
}

/// A [`ThermalMass`] driven by an in-flow and an out-flow.
///
/// Flow rates are sampled once per timestep and held for the following
/// interval (zero-order hold).
pub struct ThermalSystem<I, O> {
    mass: ThermalMass,
    in_flow: I,
    out_flow: O,
}

impl<I: InFlow, O: OutFlow> ThermalSystem<I, O> {
    pub fn new(mass: ThermalMass, in_flow: I, out_flow: O) -> Self {
        ThermalSystem {
            mass,
            in_flow,
            out_flow,
        }
    }

    /// Run the simulation over `timesteps`, returning one record per entry.
    ///
    /// The first record is taken before any heat moves. The mass is updated
    /// in place, so a second call continues from where this one stopped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] for an empty slice and
    /// [`Error::InvalidTimeOrder`] if the timestamps ever decrease; both are
    /// detected before the mass is touched. Errors raised by a flow source
    /// are passed through.
    pub fn simulate(&mut self, timesteps: &[i64]) -> Result<Trace> {
        let Some((&t0, rest)) = timesteps.split_first() else {
            warn!("refusing to simulate an empty timestep sequence");
            return Err(Error::EmptyInput);
        };
        if let Err(err) = check_order(timesteps) {
            warn!("refusing to simulate: {err}");
            return Err(err);
        }

        let mut records = Vec::with_capacity(timesteps.len());

        let state = self.mass.current_state();
        let mut flow_in = self.in_flow.rate(t0)?;
        let mut flow_out = self.out_flow.rate(t0, state)?;
        records.push(TraceRecord {
            t: t0,
            state,
            flow_in,
            flow_out,
        });

        let mut prev_t = t0;
        for &t in rest {
            let dt = interval(prev_t, t);
            self.mass.update(flow_in * dt, flow_out * dt);

            let state = self.mass.current_state();
            flow_in = self.in_flow.rate(t)?;
            flow_out = self.out_flow.rate(t, state)?;
            records.push(TraceRecord {
                t,
                state,
                flow_in,
                flow_out,
            });
            prev_t = t;
        }

        debug!(
            "simulated {} steps from t={t0} to t={prev_t}, final state {}",
            records.len(),
            self.mass.current_state()
        );
        Ok(Trace { records })
    }

    pub fn mass(&self) -> &ThermalMass {
        &self.mass
    }

    pub fn in_flow(&self) -> &I {
        &self.in_flow
    }

    pub fn out_flow(&self) -> &O {
        &self.out_flow
    }

    /// Take the system apart, e.g. to inspect a controller after a run.
    pub fn into_parts(self) -> (ThermalMass, I, O) {
        (self.mass, self.in_flow, self.out_flow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::Constant;

    fn unit_mass(start: f64) -> ThermalMass {
        ThermalMass::new(1.0, 1.0, start).unwrap()
    }

    #[test]
    fn test_balanced_flows_stay_flat() {
        let mut system = ThermalSystem::new(unit_mass(0.0), Constant(1.0), Constant(1.0));

        let trace = system.simulate(&[0, 1, 2, 3]).unwrap();
        assert_eq!(trace.states(), vec![0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_trace_has_one_record_per_timestep() {
        let timesteps = [-4, 0, 0, 3, 10, 11];
        let mut system = ThermalSystem::new(unit_mass(2.0), |t: i64| t as f64, Constant(0.5));

        let trace = system.simulate(&timesteps).unwrap();
        assert_eq!(trace.len(), timesteps.len());
        for (record, &t) in trace.iter().zip(timesteps.iter()) {
            assert_eq!(record.t, t);
        }
    }

    #[test]
    fn test_single_timestep_records_initial_state() {
        let mut system = ThermalSystem::new(unit_mass(7.0), Constant(3.0), Constant(1.0));

        let trace = system.simulate(&[5]).unwrap();
        assert_eq!(trace.into_tuples(), vec![(5, 7.0, 3.0, 1.0)]);
        assert_eq!(system.mass().current_state(), 7.0);
    }

    #[test]
    fn test_rates_are_held_from_previous_timestep() {
        // in-flow equals the timestamp, so a hold from the previous step is
        // distinguishable from sampling at the new one.
        let mut system = ThermalSystem::new(unit_mass(0.0), |t: i64| t as f64, Constant(0.0));

        let trace = system.simulate(&[1, 3, 4]).unwrap();
        // 0 + 1 * 2 = 2, then 2 + 3 * 1 = 5
        assert_eq!(trace.states(), vec![0.0, 2.0, 5.0]);
        assert_eq!(trace.records()[2].flow_in, 4.0);
    }

    #[test]
    fn test_out_flow_sees_updated_state() {
        let mut seen = Vec::new();
        let mut system = ThermalSystem::new(unit_mass(10.0), Constant(0.0), |_t: i64, state: f64| {
            seen.push(state);
            1.0
        });

        system.simulate(&[0, 2, 3]).unwrap();
        drop(system);
        assert_eq!(seen, vec![10.0, 8.0, 7.0]);
    }

    #[test]
    fn test_second_run_continues_from_mass() {
        let mut system = ThermalSystem::new(unit_mass(0.0), Constant(1.0), Constant(0.0));

        let first = system.simulate(&[0, 1, 2]).unwrap();
        assert_eq!(first.last().map(|r| r.state), Some(2.0));

        let second = system.simulate(&[2, 3]).unwrap();
        assert_eq!(second.states(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut system = ThermalSystem::new(unit_mass(0.0), Constant(1.0), Constant(1.0));
        assert_eq!(system.simulate(&[]), Err(Error::EmptyInput));
    }

    #[test]
    fn test_decreasing_timesteps_are_rejected_before_mutation() {
        let mut system = ThermalSystem::new(unit_mass(1.0), Constant(5.0), Constant(0.0));

        let result = system.simulate(&[0, 1, 2, 1, 4]);
        assert_eq!(
            result,
            Err(Error::InvalidTimeOrder {
                previous: 2,
                current: 1
            })
        );
        assert_eq!(system.mass().current_state(), 1.0);
    }

    #[test]
    fn test_simulate_across_full_timestamp_range() {
        let mut system = ThermalSystem::new(unit_mass(0.0), Constant(1.0), Constant(0.0));

        let trace = system.simulate(&[-10, i64::MAX]).unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace.records()[1].t, i64::MAX);
        assert_eq!(trace.records()[1].state, i64::MAX as f64 + 10.0);
    }

    #[test]
    fn test_trace_iterates_in_order() {
        let mut system = ThermalSystem::new(unit_mass(0.0), Constant(2.0), Constant(1.0));
        let trace = system.simulate(&[0, 1, 2]).unwrap();

        let borrowed: Vec<i64> = (&trace).into_iter().map(|r| r.t).collect();
        let owned: Vec<f64> = trace.into_iter().map(|r| r.state).collect();
        assert_eq!(borrowed, vec![0, 1, 2]);
        assert_eq!(owned, vec![0.0, 1.0, 2.0]);
    }
}
