use crate::circuit::{Circuit, ObjId};
use crate::error::{Error, Result};
use crate::sat::goal::{Goal, Phase};
use crate::value::{increment_vector, Logic, Value};

/// Goal requiring a set of lines to hold given values simultaneously
///
/// The combination attaches a watch node to the fanout of each line. The first time all lines hold
/// their target, the watch node disconnects itself and the goal stays satisfied from then on.
#[derive(Clone, Debug)]
pub struct Combination<V> {
    watch: ObjId,
    targets: Vec<(ObjId, V)>,
    phase: Phase,
    frontier: Vec<(ObjId, V)>,
}

impl<V: Logic> Combination<V> {
    /// Attach a new combination of (line, value) targets
    pub fn new(circuit: &mut Circuit<V>, targets: Vec<(ObjId, V)>) -> Result<Self> {
        if targets.is_empty() {
            return Err(Error::InvalidCombination(
                "at least one line is required".to_string(),
            ));
        }
        for (i, (line, value)) in targets.iter().enumerate() {
            let contradiction = targets[..i]
                .iter()
                .any(|(l, v)| l == line && v.conflicts(value));
            if contradiction {
                return Err(Error::InvalidCombination(format!(
                    "contradictory targets on {}",
                    circuit.name(*line)
                )));
            }
        }
        let lines: Vec<ObjId> = targets.iter().map(|(l, _)| *l).collect();
        let values: Vec<V> = targets.iter().map(|(_, v)| *v).collect();
        let name = format!("combination_{}", circuit.nb_objects());
        let watch = circuit.add_watch(&name, &lines, values);
        Ok(Combination {
            watch,
            targets,
            phase: Phase::default(),
            frontier: Vec::new(),
        })
    }

    /// Attach a new combination from matching lists of lines and values
    pub fn from_values(circuit: &mut Circuit<V>, lines: &[ObjId], values: &[V]) -> Result<Self> {
        if lines.len() != values.len() {
            return Err(Error::InvalidCombination(format!(
                "{} lines but {} values",
                lines.len(),
                values.len()
            )));
        }
        let targets = lines.iter().copied().zip(values.iter().copied()).collect();
        Self::new(circuit, targets)
    }

    /// Attach a combination targeting the current values of the lines
    pub fn capture(circuit: &mut Circuit<V>, lines: &[ObjId]) -> Result<Self> {
        let targets = lines.iter().map(|l| (*l, circuit.value(*l))).collect();
        Self::new(circuit, targets)
    }

    /// Attach one combination per possible assignment of the inputs of a node
    ///
    /// Returns an empty vector for a node without input.
    pub fn all_node_combinations(circuit: &mut Circuit<V>, node: ObjId) -> Result<Vec<Self>> {
        let lines = circuit.fanin(node).to_vec();
        let mut ret = Vec::new();
        if lines.is_empty() {
            return Ok(ret);
        }
        let mut counters = vec![Value::with_width(1)?; lines.len()];
        loop {
            let targets = lines
                .iter()
                .zip(counters.iter())
                .map(|(l, c)| (*l, V::constant(c.magnitude() != 0)))
                .collect();
            ret.push(Self::new(circuit, targets)?);
            if increment_vector(&mut counters) {
                break;
            }
        }
        Ok(ret)
    }

    /// Target (line, value) pairs
    pub fn targets(&self) -> &[(ObjId, V)] {
        &self.targets
    }

    /// Watch node observing the lines
    pub fn watch(&self) -> ObjId {
        self.watch
    }

    /// Detach the watch node from the lines
    pub fn release(self, circuit: &mut Circuit<V>) {
        circuit.detach_watch(self.watch);
    }
}

impl<V: Logic> Goal<V> for Combination<V> {
    fn success(&mut self, circuit: &Circuit<V>) -> bool {
        let ret = circuit.is_watch_latched(self.watch);
        self.phase = if ret {
            Phase::NeedsSuccessCheck
        } else {
            Phase::NeedsImpossibleCheck
        };
        ret
    }

    fn impossible(&mut self, circuit: &Circuit<V>) -> bool {
        if self.phase == Phase::NeedsSuccessCheck && self.success(circuit) {
            return false;
        }
        let ret = self
            .targets
            .iter()
            .any(|(l, v)| circuit.value(*l).conflicts(v));
        if ret {
            self.phase = Phase::NeedsSuccessCheck;
            self.frontier.clear();
        } else {
            self.phase = Phase::HasFrontier;
            self.frontier = self
                .targets
                .iter()
                .filter(|(l, _)| circuit.value(*l).is_unknown())
                .copied()
                .collect();
        }
        ret
    }

    fn frontier(&mut self, circuit: &Circuit<V>) -> Vec<(ObjId, V)> {
        if self.phase != Phase::HasFrontier && (self.success(circuit) || self.impossible(circuit)) {
            return Vec::new();
        }
        self.phase = Phase::NeedsSuccessCheck;
        self.frontier.clone()
    }
}
