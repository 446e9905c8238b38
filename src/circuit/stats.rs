//! Compute circuit statistics
//!
//! ```
//! # use stuckat::{Circuit, Value};
//! # let circuit = Circuit::<Value>::new();
//! use stuckat::circuit::stats::stats;
//! let stats = stats(&circuit);
//!
//! // Check that there is no gate
//! assert_eq!(stats.nb_gates(), 0);
//!
//! // Show the statistics
//! println!("{}", stats);
//! ```

use std::fmt;

use crate::circuit::{Circuit, Function, Role};
use crate::value::Logic;

/// Number of inputs, outputs, gates and lines in a circuit
#[derive(Clone, Debug)]
pub struct CircuitStats {
    /// Number of inputs
    pub nb_inputs: usize,
    /// Number of outputs
    pub nb_outputs: usize,
    /// Number of constant drivers
    pub nb_constants: usize,
    /// Number of lines
    pub nb_lines: usize,
    /// Number of lines that are fanout branches
    pub nb_branches: usize,
    /// Number of gates per function, in the order of [`Function::ALL`]
    pub nb_by_function: [usize; 8],
    /// Maximum gate arity
    pub max_arity: usize,
    /// Maximum level of an output
    pub depth: usize,
}

impl CircuitStats {
    /// Total number of gates
    pub fn nb_gates(&self) -> usize {
        self.nb_by_function.iter().sum()
    }
}

impl fmt::Display for CircuitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stats:")?;
        writeln!(f, "  Inputs: {}", self.nb_inputs)?;
        writeln!(f, "  Outputs: {}", self.nb_outputs)?;
        writeln!(f, "  Gates: {}", self.nb_gates())?;
        for (func, nb) in Function::ALL.iter().zip(self.nb_by_function.iter()) {
            if *nb != 0 {
                writeln!(f, "      {}: {}", func, nb)?;
            }
        }
        if self.nb_constants != 0 {
            writeln!(f, "  Constants: {}", self.nb_constants)?;
        }
        writeln!(f, "  Lines: {}", self.nb_lines)?;
        if self.nb_branches != 0 {
            writeln!(f, "      branches: {}", self.nb_branches)?;
        }
        writeln!(f, "  Max arity: {}", self.max_arity)?;
        writeln!(f, "  Depth: {}", self.depth)?;
        fmt::Result::Ok(())
    }
}

/// Compute the statistics of the circuit
pub fn stats<V: Logic>(c: &Circuit<V>) -> CircuitStats {
    let mut ret = CircuitStats {
        nb_inputs: c.nb_inputs(),
        nb_outputs: c.nb_outputs(),
        nb_constants: 0,
        nb_lines: 0,
        nb_branches: 0,
        nb_by_function: [0; 8],
        max_arity: 0,
        depth: c.depth(),
    };
    for id in c.ids() {
        match c.role(id) {
            Role::Constant(_) => ret.nb_constants += 1,
            Role::Line => {
                ret.nb_lines += 1;
                if c.fanin(id).iter().any(|d| c.fanout(*d).len() > 1) {
                    ret.nb_branches += 1;
                }
            }
            Role::Gate(func) => {
                let pos = Function::ALL.iter().position(|f| *f == func).unwrap_or(0);
                ret.nb_by_function[pos] += 1;
                ret.max_arity = ret.max_arity.max(c.fanin(id).len());
            }
            Role::Input | Role::Output | Role::Watch => (),
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::stats;
    use crate::circuit::generators::testcases;
    use crate::circuit::Function;

    #[test]
    fn test_and_gate_stats() {
        let (c, _) = testcases::and_gate::<crate::Value>().unwrap();
        let s = stats(&c);
        assert_eq!(s.nb_inputs, 2);
        assert_eq!(s.nb_outputs, 1);
        assert_eq!(s.nb_gates(), 1);
        assert_eq!(s.nb_by_function[0], 1);
        assert_eq!(Function::ALL[0], Function::And);
        assert_eq!(s.max_arity, 2);
        assert_eq!(s.depth, 2);
        assert!(s.to_string().contains("and: 1"));
    }
}
