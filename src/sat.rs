//! Goal-directed search for primary input assignments
//!
//! A [`Goal`] describes a condition on the circuit state. The [`Solver`] makes decisions on primary
//! inputs through a [`Backtracer`], records them on an [`ImplicationStack`], and backtracks when
//! the goal becomes impossible.
//!
//! ```
//! # use stuckat::circuit::generators::testcases;
//! # use stuckat::sat::{Combination, Outcome, Solver};
//! # use stuckat::Value;
//! let (mut circuit, [_, _, g, _]) = testcases::and_gate::<Value>().unwrap();
//! let one = Value::constant(true);
//! let mut goal = Combination::new(&mut circuit, vec![(g, one)]).unwrap();
//! let outcome = Solver::default().solve(&mut circuit, &mut goal).unwrap();
//! assert_eq!(outcome, Outcome::Satisfied(vec![one, one]));
//! ```

mod backtracer;
mod combination;
mod goal;
mod implication;
mod solver;

pub use backtracer::Backtracer;
pub use combination::Combination;
pub use goal::{Goal, Phase, Status};
pub use implication::{AlternativeEvent, ImplicationStack};
pub use solver::{Outcome, Solver, SolverConfig};
