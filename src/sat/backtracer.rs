use fxhash::FxHashSet;

use crate::circuit::{Circuit, ObjId, Role};
use crate::error::{Error, Result};
use crate::sat::implication::AlternativeEvent;
use crate::value::Logic;

/// Walks from a desired (location, value) back to a primary input assignment
///
/// The direction is always the first candidate whose value is unknown. The value is complemented
/// when walking through an inverting gate.
#[derive(Clone, Copy, Debug, Default)]
pub struct Backtracer;

impl Backtracer {
    /// Create a backtracer
    pub fn new() -> Self {
        Backtracer
    }

    /// Backtrace from the first unknown entry of the frontier
    ///
    /// Returns one marker per traversed location, followed by the decision at a primary input.
    /// Fails with [`Error::NoDirection`] if no entry or no input on the way is unknown, or if the
    /// walk comes back to a location it already went through.
    pub fn backtrace<V: Logic>(
        &self,
        circuit: &Circuit<V>,
        frontier: &[(ObjId, V)],
    ) -> Result<Vec<AlternativeEvent<V>>> {
        let (mut location, mut value) = Self::direction(circuit, frontier.iter().copied())?;
        let mut ret = Vec::new();
        let mut visited = FxHashSet::default();
        loop {
            if !visited.insert(location) {
                return Err(Error::NoDirection);
            }
            if circuit.role(location) == Role::Input {
                ret.push(AlternativeEvent::decision(location, value));
                return Ok(ret);
            }
            ret.push(AlternativeEvent::marker(location));
            if let Role::Gate(f) = circuit.role(location) {
                if f.is_inverting() {
                    value = !value;
                }
            }
            (location, value) = Self::direction(
                circuit,
                circuit.fanin(location).iter().map(|i| (*i, value)),
            )?;
        }
    }

    fn direction<V: Logic>(
        circuit: &Circuit<V>,
        mut candidates: impl Iterator<Item = (ObjId, V)>,
    ) -> Result<(ObjId, V)> {
        candidates
            .find(|(l, _)| circuit.value(*l).is_unknown())
            .ok_or(Error::NoDirection)
    }
}
