//! Error types shared by the whole crate

use thiserror::Error;

/// Errors raised while building, simulating or searching a circuit
///
/// Structural, value-range and fault-state errors abort the current search and propagate to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// An object that must be driven has no input
    #[error("{name} has no driver")]
    MissingDriver {
        /// Name of the undriven object
        name: String,
    },

    /// Levelization found a cycle
    #[error("combinational loop through {name}")]
    CombinationalLoop {
        /// Name of one object on the loop
        name: String,
    },

    /// An event was produced for a level that is already being drained
    #[error("event for {name} at level {level} scheduled while draining level {draining}")]
    OutOfOrderEvent {
        /// Name of the event target
        name: String,
        /// Level of the event target
        level: usize,
        /// Level being drained when the event was produced
        draining: usize,
    },

    /// Gate function name that is not supported
    #[error("unknown gate function {0}")]
    UnknownFunction(String),

    /// Malformed netlist or pattern file
    #[error("line {line}: {message}")]
    Parse {
        /// One-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// Stimulus with a number of values different from the number of primary inputs
    #[error("{found} values given for {expected} primary inputs")]
    InputCount {
        /// Number of primary inputs
        expected: usize,
        /// Number of values given
        found: usize,
    },

    /// File format that cannot be read or written
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Magnitude assigned outside of the declared bounds
    #[error("magnitude {magnitude:#x} is outside of [{min:#x}, {max:#x}]")]
    ValueRange {
        /// Rejected magnitude
        magnitude: u64,
        /// Lower bound
        min: u64,
        /// Upper bound
        max: u64,
    },

    /// Counter width outside of the lanes of a value
    #[error("width {0} is outside of [1, 64]")]
    InvalidWidth(u32),

    /// Probability of a 1 outside of [0, 1]
    #[error("weight {0} is not a probability")]
    InvalidWeight(f64),

    /// A fault is already active at this location
    #[error("a fault is already active on {location}")]
    FaultAlreadyActive {
        /// Name of the fault location
        location: String,
    },

    /// Deactivation requested while no fault is active
    #[error("no fault is active on {location}")]
    NoActiveFault {
        /// Name of the fault location
        location: String,
    },

    /// Deactivation requested with a fault that is not the active one
    #[error("fault {fault} is not the active fault on {location}")]
    FaultMismatch {
        /// Fault that was requested
        fault: usize,
        /// Name of the fault location
        location: String,
    },

    /// A fault was dropped while still active
    #[error("fault {fault} on {location} dropped while active")]
    ActiveFaultDropped {
        /// Fault that was dropped
        fault: usize,
        /// Name of the fault location
        location: String,
    },

    /// Fault handle that is not registered in this circuit
    #[error("fault {0} is not registered")]
    UnknownFault(usize),

    /// A combination needs a non-empty list of targets, with a single value per line
    #[error("invalid combination: {0}")]
    InvalidCombination(String),

    /// The backtracer found no unassigned location to work from
    #[error("no backtrace direction: every candidate location is already assigned")]
    NoDirection,

    /// File access
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
