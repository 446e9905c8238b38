//! Event-driven simulation of a circuit, with stuck-at fault injection
//!
//! Values change through [`Circuit::fire`], which returns the events for the objects to update.
//! An [`EventQueue`] collects them and processes them in level order, so that only the objects
//! affected by a change are evaluated. A [`FaultSimulator`] uses the same mechanism to grade up
//! to 64 patterns at once against a list of faults.

mod event_queue;
mod fault;
mod fault_sim;

pub use event_queue::{Event, EventQueue};
pub use fault::{Fault, FaultSite};
pub use fault_sim::{FaultSimulator, NB_LANES};

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::value::{FaultyValue, Logic, Value};

/// Assign all primary inputs and propagate the changes
pub fn assign_inputs<V: Logic>(circuit: &mut Circuit<V>, values: &[V]) -> Result<()> {
    if values.len() != circuit.nb_inputs() {
        return Err(Error::InputCount {
            expected: circuit.nb_inputs(),
            found: values.len(),
        });
    }
    let mut queue = EventQueue::new();
    for (i, v) in values.iter().enumerate() {
        let input = circuit.inputs()[i];
        queue.extend(circuit.fire(input, Some(*v)));
    }
    queue.process(circuit)
}

/// Simulate one stimulus; return the output values
pub fn simulate<V: Logic>(circuit: &mut Circuit<V>, values: &[V]) -> Result<Vec<V>> {
    assign_inputs(circuit, values)?;
    Ok(circuit.outputs().iter().map(|o| circuit.value(*o)).collect())
}

/// Simple conversion to 64b lane format, one pattern per lane
fn patterns_to_lanes(patterns: &[Vec<Option<bool>>], nb_inputs: usize) -> Vec<Value> {
    let mut ret = vec![Value::new(0, 0); nb_inputs];
    for (lane, p) in patterns.iter().enumerate() {
        for (i, b) in p.iter().enumerate() {
            if let Some(b) = b {
                let v = &mut ret[i];
                *v = Value::new(
                    v.magnitude() | (u64::from(*b) << lane),
                    v.valid() | (1 << lane),
                );
            }
        }
    }
    ret
}

/// Simple conversion from 64b lane format
fn lanes_to_patterns(values: &[Value], nb_patterns: usize) -> Vec<Vec<Option<bool>>> {
    (0..nb_patterns)
        .map(|lane| {
            values
                .iter()
                .map(|v| {
                    if (v.valid() >> lane) & 1 != 0 {
                        Some((v.magnitude() >> lane) & 1 != 0)
                    } else {
                        None
                    }
                })
                .collect()
        })
        .collect()
}

/// Simulate many patterns, 64 at a time; unknown inputs are given as None
///
/// Returns the output values for each pattern, None meaning X.
pub fn simulate_patterns(
    circuit: &mut Circuit<Value>,
    patterns: &[Vec<Option<bool>>],
) -> Result<Vec<Vec<Option<bool>>>> {
    let mut ret = Vec::new();
    for chunk in patterns.chunks(64) {
        if let Some(p) = chunk.iter().find(|p| p.len() != circuit.nb_inputs()) {
            return Err(Error::InputCount {
                expected: circuit.nb_inputs(),
                found: p.len(),
            });
        }
        let stimulus = patterns_to_lanes(chunk, circuit.nb_inputs());
        let outputs = simulate(circuit, &stimulus)?;
        ret.extend(lanes_to_patterns(&outputs, chunk.len()));
    }
    circuit.reset();
    Ok(ret)
}

/// Returns whether a fully specified pattern exposes a fault at a primary output
///
/// The circuit is left with every value at X and no fault registered.
pub fn detects(
    circuit: &mut Circuit<FaultyValue>,
    pattern: &[bool],
    site: FaultSite,
) -> Result<bool> {
    let sim = FaultSimulator::new(circuit, &[site]);
    let det = sim.detections(circuit, &[pattern.to_vec()], |_| true);
    sim.remove(circuit)?;
    Ok(det?.first().map_or(false, |d| d[0]))
}
