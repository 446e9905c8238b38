//! Command line interface

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand};
use stuckat::atpg::{generate_test_patterns, AtpgConfig, FaultList, Fill};
use stuckat::io::{read_circuit_file, read_pattern_file, write_pattern_file};
use stuckat::sim::simulate_patterns;
use stuckat::{stats, FaultyValue, Result, Value};

/// Command line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase the verbosity; RUST_LOG takes precedence when set
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Command line arguments
#[derive(Subcommand)]
pub enum Commands {
    /// Show statistics about a circuit
    ///
    /// Will print statistics on the number of inputs, outputs, gates and lines in the circuit.
    #[clap()]
    Show(ShowArgs),

    /// Simulate a circuit
    ///
    /// This uses the same test pattern format as Atalanta, with one bit per input:
    ///    1: 00011101
    ///    2: 01110000
    /// An X marks an unknown input.
    #[clap(alias = "sim")]
    Simulate(SimulateArgs),

    /// Test pattern generation for a circuit
    ///
    /// Generate patterns to detect all stuck-at faults in a combinational circuit.
    /// Random patterns can be simulated first to detect the easy faults cheaply.
    /// Each fault is targeted with a decision-based search that assigns primary inputs,
    /// and either finds a pattern or proves the fault undetectable.
    ///
    /// By default, only the checkpoint faults are targeted: primary inputs and fanout branches,
    /// both stuck at 0 and stuck at 1.
    #[clap()]
    Atpg(AtpgArgs),
}

impl Commands {
    /// Run the command
    pub fn run(&self) -> Result<()> {
        match self {
            Commands::Show(a) => a.run(),
            Commands::Simulate(a) => a.run(),
            Commands::Atpg(a) => a.run(),
        }
    }
}

/// Command arguments for circuit informations
#[derive(Args)]
pub struct ShowArgs {
    /// Circuit to show
    file: PathBuf,

    /// Also print every node and line
    #[arg(long)]
    netlist: bool,
}

impl ShowArgs {
    pub fn run(&self) -> Result<()> {
        let circuit = read_circuit_file::<Value>(&self.file)?;
        println!("Circuit stats:\n{}", stats::stats(&circuit));
        if self.netlist {
            println!("{circuit}");
        }
        Ok(())
    }
}

/// Command arguments for simulation
#[derive(Args)]
pub struct SimulateArgs {
    /// Circuit to simulate
    circuit: PathBuf,

    /// Input patterns file
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Output file for output patterns
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl SimulateArgs {
    pub fn run(&self) -> Result<()> {
        let mut circuit = read_circuit_file::<Value>(&self.circuit)?;
        let input_values = read_pattern_file(&self.input)?;
        let output_values = simulate_patterns(&mut circuit, &input_values)?;
        write_pattern_file(&self.output, &output_values)
    }
}

/// Command arguments for test pattern generation
#[derive(Args)]
pub struct AtpgArgs {
    /// Circuit to write test patterns for
    circuit: PathBuf,

    /// Output file for test patterns
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Random seed for the unassigned inputs
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Time limit for each fault, in seconds
    #[arg(long, default_value_t = 10.0)]
    time_limit: f64,

    /// Target all faults instead of the checkpoint faults
    #[arg(long)]
    all_faults: bool,

    /// Set unassigned inputs to 0 instead of random values
    #[arg(long)]
    zero_fill: bool,

    /// Do not simulate new patterns to skip the faults they already detect
    #[arg(long)]
    no_drop: bool,

    /// Keep a minimal subset of the patterns
    #[arg(long)]
    compress: bool,

    /// Number of random patterns to simulate before targeting individual faults
    #[arg(long, default_value_t = 0)]
    random_patterns: usize,

    /// Probability of a 1 on each input of the random patterns
    #[arg(long, default_value_t = 0.5)]
    random_weight: f64,
}

impl AtpgArgs {
    fn config(&self) -> AtpgConfig {
        AtpgConfig {
            seed: self.seed,
            time_limit: Duration::from_secs_f64(self.time_limit.max(0.0)),
            fault_list: if self.all_faults {
                FaultList::All
            } else {
                FaultList::Checkpoints
            },
            fill: if self.zero_fill {
                Fill::Zero
            } else {
                Fill::Random
            },
            drop_detected: !self.no_drop,
            compress: self.compress,
            random_patterns: self.random_patterns,
            random_weight: self.random_weight,
        }
    }

    pub fn run(&self) -> Result<()> {
        let mut circuit = read_circuit_file::<FaultyValue>(&self.circuit)?;
        let report = generate_test_patterns(&mut circuit, &self.config())?;
        let patterns: Vec<Vec<Option<bool>>> = report
            .patterns
            .iter()
            .map(|p| p.iter().map(|b| Some(*b)).collect())
            .collect();
        write_pattern_file(&self.output, &patterns)
    }
}
