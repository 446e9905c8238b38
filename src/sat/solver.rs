use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::sat::backtracer::Backtracer;
use crate::sat::goal::{Goal, Status};
use crate::sat::implication::ImplicationStack;
use crate::value::Logic;

/// Parameters of the search
#[derive(Clone, Copy, Debug)]
pub struct SolverConfig {
    /// Wall-clock limit for a single goal
    pub time_limit: Duration,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_limit: Duration::from_secs(10),
        }
    }
}

/// Result of the search for a single goal
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome<V> {
    /// The goal was reached with these primary input values; unassigned inputs are X
    Satisfied(Vec<V>),
    /// The whole decision space was explored without reaching the goal
    Impossible,
    /// The time limit was reached first
    TimedOut,
}

impl<V> Outcome<V> {
    /// Returns whether the goal was reached
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Outcome::Satisfied(_))
    }

    /// Input values reaching the goal, if any
    pub fn pattern(&self) -> Option<&[V]> {
        match self {
            Outcome::Satisfied(p) => Some(p),
            _ => None,
        }
    }
}

/// Decision-based search over primary input assignments
///
/// Each iteration asks the goal for its status. On success, the input values are captured. When
/// the goal is impossible, the most recent decision is flipped or undone. Otherwise a backtrace
/// from the goal frontier adds a new input decision. The circuit is returned to an all-X state
/// before returning, except on error.
#[derive(Clone, Debug, Default)]
pub struct Solver {
    config: SolverConfig,
    backtracer: Backtracer,
}

impl Solver {
    /// Create a solver with the given parameters
    pub fn new(config: SolverConfig) -> Self {
        Solver {
            config,
            backtracer: Backtracer::new(),
        }
    }

    /// Parameters of the search
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Search for primary input values reaching the goal
    pub fn solve<V, G>(&self, circuit: &mut Circuit<V>, goal: &mut G) -> Result<Outcome<V>>
    where
        V: Logic,
        G: Goal<V> + ?Sized,
    {
        let start = Instant::now();
        let mut stack = ImplicationStack::new();
        let mut nb_iterations = 0usize;
        while start.elapsed() < self.config.time_limit {
            nb_iterations += 1;
            match goal.status(circuit) {
                Status::Success => {
                    let pattern = circuit
                        .inputs()
                        .iter()
                        .map(|i| circuit.nominal(*i))
                        .collect();
                    stack.backtrack(circuit, true).process(circuit)?;
                    debug!(nb_iterations, "goal satisfied");
                    return Ok(Outcome::Satisfied(pattern));
                }
                Status::Impossible => {
                    if Self::backtrack(circuit, &mut stack)? {
                        debug!(nb_iterations, "goal impossible");
                        return Ok(Outcome::Impossible);
                    }
                }
                Status::Frontier(frontier) => {
                    match self.backtracer.backtrace(circuit, &frontier) {
                        Ok(events) => {
                            if let Some(decision) = events.last() {
                                debug!(%decision, depth = stack.len(), "new decision");
                            }
                            stack.add(circuit, events).process(circuit)?;
                        }
                        Err(Error::NoDirection) => {
                            // Nothing left to assign toward the frontier
                            if Self::backtrack(circuit, &mut stack)? {
                                return Ok(Outcome::Impossible);
                            }
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }
        warn!(
            nb_iterations,
            time_limit = ?self.config.time_limit,
            "search aborted on time limit"
        );
        stack.backtrack(circuit, true).process(circuit)?;
        Ok(Outcome::TimedOut)
    }

    /// Backtrack one decision; returns true if the decision space is exhausted
    fn backtrack<V: Logic>(
        circuit: &mut Circuit<V>,
        stack: &mut ImplicationStack<V>,
    ) -> Result<bool> {
        stack.backtrack(circuit, false).process(circuit)?;
        Ok(stack.is_empty())
    }

    /// Returns whether the goal can be reached before the time limit
    pub fn satisfy<V, G>(&self, circuit: &mut Circuit<V>, goal: &mut G) -> Result<bool>
    where
        V: Logic,
        G: Goal<V> + ?Sized,
    {
        Ok(self.solve(circuit, goal)?.is_satisfied())
    }

    /// Search for each goal in turn; returns the indices of the satisfied goals
    pub fn satisfy_all<V: Logic>(
        &self,
        circuit: &mut Circuit<V>,
        goals: &mut [Box<dyn Goal<V>>],
    ) -> Result<Vec<usize>> {
        let mut ret = Vec::new();
        for (i, goal) in goals.iter_mut().enumerate() {
            if self.satisfy(circuit, goal.as_mut())? {
                ret.push(i);
            }
        }
        Ok(ret)
    }
}
