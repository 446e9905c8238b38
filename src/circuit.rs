//! Representation of gate-level circuits
//!
//! A [`Circuit`] is an arena of nodes (inputs, outputs, constants and gates) and lines.
//! Lines model wires: each signal has a stem line, and a branch line per fanout when it drives
//! more than one object, so that faults can be placed on every branch independently.

mod circuit;
mod function;
pub mod generators;
pub mod stats;

pub use circuit::{Circuit, ObjId, Role};
pub use function::Function;

pub(crate) use circuit::FaultId;
