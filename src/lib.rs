//! Stuck-at fault simulation and test pattern generation
//!
//! This crate generates test patterns for stuck-at faults in combinational gate-level circuits.
//! It is built around three parts that work together:
//! * bit-parallel logic values, with a five-valued algebra to simulate a good and a faulty circuit
//!   at once;
//! * an event-driven simulator that only re-evaluates the part of the circuit affected by a change;
//! * a goal-directed search that assigns primary inputs, backtracks on contradictions, and proves
//!   faults undetectable when no assignment exists.
//!
//! # Usage
//!
//! ```bash
//! # Show available commands
//! # At the moment, only .bench files are supported
//! stuckat help
//! # Show statistics about a circuit
//! stuckat show mydesign.bench
//! # Generate test patterns
//! stuckat atpg mydesign.bench -o atpg.test
//! # Simulate the patterns
//! stuckat simulate mydesign.bench -i atpg.test -o outputs.test
//! ```
//!
//! # Datastructures
//!
//! A [`Circuit`] owns its nodes and lines in an arena, addressed by [`ObjId`].
//! Each signal has a stem line, and a branch line per sink when it drives several objects, so
//! that a fault can be placed on every branch independently.
//! Circuits are generic over the value they hold: [`Value`] for fault-free simulation, or
//! [`FaultyValue`] to simulate a fault alongside the fault-free circuit.
//!
//! For example, here is how to find a pattern for a single fault:
//! ```
//! # use stuckat::{Circuit, FaultSite, FaultyValue, Function};
//! # use stuckat::atpg::find_pattern;
//! # use stuckat::sat::Solver;
//! let mut circuit = Circuit::<FaultyValue>::new();
//! let a = circuit.add_input("a");
//! let b = circuit.add_input("b");
//! let g = circuit.add_gate("g", Function::Nand);
//! let o = circuit.add_output("o");
//! circuit.add_net("a", a, &[g]);
//! circuit.add_net("b", b, &[g]);
//! circuit.add_net("g", g, &[o]);
//! circuit.levelize().unwrap();
//!
//! let site = FaultSite { location: a, stuck: true };
//! let outcome = find_pattern(&mut circuit, site, &Solver::default()).unwrap();
//! assert!(outcome.is_satisfied());
//! ```

#![warn(missing_docs)]

pub mod atpg;
pub mod circuit;
pub mod error;
pub mod io;
pub mod sat;
pub mod sim;
pub mod value;

pub use circuit::{stats, Circuit, Function, ObjId, Role};
pub use error::{Error, Result};
pub use sim::{Event, EventQueue, Fault, FaultSite};
pub use value::{FaultyValue, Logic, Value};
