use fxhash::FxHashSet;

use crate::circuit::{Circuit, ObjId, Role};
use crate::sat::{Goal, Phase};
use crate::sim::Fault;
use crate::value::Logic;

/// Goal propagating the effect of a fault to a primary output
///
/// The fault must be active while the search runs. Each round traces the fault effect forward
/// from the fault location: the goal succeeds when it reaches a primary output. Otherwise the
/// frontier is the set of side inputs to set so that the effect crosses one more gate, or the
/// location itself if the fault is not excited yet.
#[derive(Clone, Debug)]
pub struct DFrontier<V> {
    fault: Fault,
    phase: Phase,
    frontier: Vec<(ObjId, V)>,
}

impl<V: Logic> DFrontier<V> {
    /// Create the goal for a registered fault
    pub fn new(fault: Fault) -> Self {
        DFrontier {
            fault,
            phase: Phase::default(),
            frontier: Vec::new(),
        }
    }

    /// Fault targeted by the goal
    pub fn fault(&self) -> Fault {
        self.fault
    }

    /// Trace the fault effect; returns true if it reaches a primary output
    ///
    /// The frontier is filled with the most forward locations carrying the effect.
    fn trace(&mut self, circuit: &Circuit<V>) -> bool {
        self.frontier.clear();
        let mut visited = FxHashSet::default();
        let mut to_visit: Vec<(ObjId, Option<ObjId>)> = vec![(self.fault.location(), None)];
        while let Some((location, backup)) = to_visit.pop() {
            if !visited.insert(location) {
                continue;
            }
            let value = circuit.value(location);
            if value.fault_effect() == 0 {
                if let Some(b) = backup {
                    if !self.frontier.iter().any(|(l, _)| *l == b) {
                        self.frontier.push((b, circuit.value(b)));
                    }
                }
                continue;
            }
            match circuit.role(location) {
                Role::Output => return true,
                Role::Constant(_) => continue,
                _ => (),
            }
            for o in circuit.fanout(location) {
                if circuit.role(*o) != Role::Watch {
                    to_visit.push((*o, Some(location)));
                }
            }
        }
        false
    }

    /// Side inputs to set so that the effect crosses the undetermined gates after the frontier
    fn propagating_choices(&self, circuit: &Circuit<V>) -> Vec<(ObjId, V)> {
        let mut ret: Vec<(ObjId, V)> = Vec::new();
        for (location, _) in &self.frontier {
            for gate in circuit.fanout(*location) {
                if !circuit.value(*gate).is_unknown() {
                    continue;
                }
                let Role::Gate(f) = circuit.role(*gate) else {
                    continue;
                };
                let Some(s) = f.sensitizing_value() else {
                    continue;
                };
                for i in circuit.fanin(*gate) {
                    if circuit.value(*i).is_unknown() && !ret.iter().any(|(l, _)| l == i) {
                        ret.push((*i, V::constant(s)));
                    }
                }
            }
        }
        ret
    }
}

impl<V: Logic> Goal<V> for DFrontier<V> {
    fn success(&mut self, circuit: &Circuit<V>) -> bool {
        let ret = self.trace(circuit);
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
        let ret = if self.frontier.is_empty() {
            // No effect anywhere: excite the fault if the fault-free value is still open
            let location = self.fault.location();
            if circuit.value(location).good().valid() != 0 {
                true
            } else {
                self.frontier = vec![(location, V::constant(!self.fault.stuck()))];
                false
            }
        } else {
            self.frontier = self.propagating_choices(circuit);
            self.frontier.is_empty()
        };
        self.phase = if ret {
            Phase::NeedsSuccessCheck
        } else {
            Phase::HasFrontier
        };
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::generators::testcases;
    use crate::circuit::Function;
    use crate::sat::{Outcome, Solver, Status};
    use crate::sim::EventQueue;
    use crate::value::FaultyValue;

    fn inject(c: &mut Circuit<FaultyValue>, location: ObjId, stuck: bool) -> Fault {
        let fault = Fault::new(c, location, stuck);
        let mut queue = EventQueue::new();
        queue.extend(fault.activate(c).unwrap());
        queue.process(c).unwrap();
        fault
    }

    fn assign(c: &mut Circuit<FaultyValue>, id: ObjId, v: bool) {
        let mut queue = EventQueue::new();
        queue.extend(c.fire(id, Some(FaultyValue::constant(v))));
        queue.process(c).unwrap();
    }

    #[test]
    fn test_and_gate() {
        let (mut c, [a, _, _, _]) = testcases::and_gate::<FaultyValue>().unwrap();
        let fault = inject(&mut c, a, false);
        let mut goal = DFrontier::new(fault);
        let outcome = Solver::default().solve(&mut c, &mut goal).unwrap();
        let one = FaultyValue::constant(true);
        assert_eq!(outcome, Outcome::Satisfied(vec![one, one]));
    }

    #[test]
    fn test_steps() {
        let (mut c, [a, b, g, _]) = testcases::and_gate::<FaultyValue>().unwrap();
        let fault = inject(&mut c, a, false);
        let mut goal = DFrontier::new(fault);
        // Excitation first
        assert_eq!(
            goal.status(&c),
            Status::Frontier(vec![(a, FaultyValue::constant(true))])
        );
        assign(&mut c, a, true);
        assert_eq!(c.value(a), FaultyValue::d());
        // Then the side input of the And gate
        assert_eq!(
            goal.status(&c),
            Status::Frontier(vec![(b, FaultyValue::constant(true))])
        );
        assign(&mut c, b, true);
        assert_eq!(c.value(g), FaultyValue::d());
        assert_eq!(goal.status(&c), Status::Success);
    }

    #[test]
    fn test_blocked() {
        let (mut c, [a, b, _, _]) = testcases::and_gate::<FaultyValue>().unwrap();
        let fault = inject(&mut c, a, false);
        let mut goal = DFrontier::new(fault);
        assign(&mut c, b, false);
        assign(&mut c, a, true);
        // D on a, but the gate output is already 0
        assert!(!goal.success(&c));
        assert!(goal.impossible(&c));
        // Not excitable: a is already at the stuck value
        assign(&mut c, a, false);
        assert!(goal.impossible(&c));
    }

    #[test]
    fn test_redundant() {
        let mut c = Circuit::<FaultyValue>::new();
        let a = c.add_input("a");
        let n = c.add_gate("n", Function::Not);
        let g = c.add_gate("g", Function::And);
        let po = c.add_output("po");
        c.add_net("a", a, &[n, g]);
        c.add_net("n", n, &[g]);
        c.add_net("g", g, &[po]);
        c.levelize().unwrap();
        let fault = inject(&mut c, g, false);
        let mut goal = DFrontier::new(fault);
        let outcome = Solver::default().solve(&mut c, &mut goal).unwrap();
        assert_eq!(outcome, Outcome::Impossible);
        for id in c.ids() {
            assert!(c.nominal(id).is_unknown());
        }
    }

    #[test]
    fn test_or_gate() {
        let mut c = Circuit::<FaultyValue>::new();
        let a = c.add_input("a");
        let b = c.add_input("b");
        let g = c.add_gate("g", Function::Nor);
        let po = c.add_output("po");
        c.connect(a, g);
        c.connect(b, g);
        c.connect(g, po);
        c.levelize().unwrap();
        let fault = inject(&mut c, a, true);
        let mut goal = DFrontier::new(fault);
        let outcome = Solver::default().solve(&mut c, &mut goal).unwrap();
        let zero = FaultyValue::constant(false);
        assert_eq!(outcome, Outcome::Satisfied(vec![zero, zero]));
    }
}
