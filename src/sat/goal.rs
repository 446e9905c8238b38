use crate::circuit::{Circuit, ObjId};
use crate::value::Logic;

/// Where a goal stands in its success, impossible, frontier sequence
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// `success` has to run on the current circuit state
    #[default]
    NeedsSuccessCheck,
    /// `success` returned false, `impossible` has to run
    NeedsImpossibleCheck,
    /// Both checks returned false: the frontier is up to date
    HasFrontier,
}

/// Result of one round of checks on a goal
#[derive(Clone, Debug, PartialEq)]
pub enum Status<V> {
    /// The goal is reached
    Success,
    /// The goal cannot be reached from the current assignment
    Impossible,
    /// Candidate (location, value) assignments to move toward the goal
    Frontier(Vec<(ObjId, V)>),
}

/// Objective for the search: a condition on the circuit state
///
/// Each iteration calls [`Goal::success`], then if false [`Goal::impossible`], then if false
/// [`Goal::frontier`]. Each call may update the internal frontier. Implementations track the
/// sequence with a [`Phase`], and run the missing checks themselves when called out of order.
pub trait Goal<V: Logic> {
    /// Returns whether the goal is reached
    fn success(&mut self, circuit: &Circuit<V>) -> bool;

    /// Returns whether the goal cannot be reached anymore
    fn impossible(&mut self, circuit: &Circuit<V>) -> bool;

    /// Candidate assignments, in order of preference
    fn frontier(&mut self, circuit: &Circuit<V>) -> Vec<(ObjId, V)>;

    /// Run the checks in order
    fn status(&mut self, circuit: &Circuit<V>) -> Status<V> {
        if self.success(circuit) {
            Status::Success
        } else if self.impossible(circuit) {
            Status::Impossible
        } else {
            Status::Frontier(self.frontier(circuit))
        }
    }
}
