//! Test pattern generation

mod dfrontier;

pub use dfrontier::DFrontier;

use std::fmt;
use std::time::Duration;

use kdam::{tqdm, BarExt};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::sat::{Outcome, Solver, SolverConfig};
use crate::sim::{EventQueue, Fault, FaultSimulator, FaultSite, NB_LANES};
use crate::value::{random_vector, FaultyValue, Logic};

/// Faults targeted by test pattern generation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FaultList {
    /// Primary input stems and fanout branches
    #[default]
    Checkpoints,
    /// Every input, gate and line
    All,
}

/// How inputs left unassigned by the search are set in the patterns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Fill {
    /// Random values, from the configured seed
    #[default]
    Random,
    /// Zero
    Zero,
}

/// Parameters of test pattern generation
#[derive(Clone, Debug)]
pub struct AtpgConfig {
    /// Seed for the don't-care fill
    pub seed: u64,
    /// Time limit of the search for each fault
    pub time_limit: Duration,
    /// Faults to target
    pub fault_list: FaultList,
    /// Don't-care fill
    pub fill: Fill,
    /// Simulate each new pattern against the remaining faults, and skip those it detects
    pub drop_detected: bool,
    /// Keep a minimal subset of the patterns detecting the same faults
    pub compress: bool,
    /// Number of random patterns simulated before the search, 0 to disable
    pub random_patterns: usize,
    /// Probability of a 1 on each input of the random patterns
    pub random_weight: f64,
}

impl Default for AtpgConfig {
    fn default() -> Self {
        AtpgConfig {
            seed: 1,
            time_limit: SolverConfig::default().time_limit,
            fault_list: FaultList::default(),
            fill: Fill::default(),
            drop_detected: true,
            compress: false,
            random_patterns: 0,
            random_weight: 0.5,
        }
    }
}

/// What test pattern generation concluded for a fault
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultStatus {
    /// Not processed
    Undetected,
    /// Detected by one of the patterns
    Detected,
    /// Proven undetectable
    Redundant,
    /// The search ran out of time
    Aborted,
}

/// Result of test pattern generation
#[derive(Clone, Debug)]
pub struct AtpgReport {
    /// Fully specified patterns, one value per primary input
    pub patterns: Vec<Vec<bool>>,
    /// Targeted faults
    pub faults: Vec<FaultSite>,
    /// Status of each targeted fault
    pub status: Vec<FaultStatus>,
}

impl AtpgReport {
    /// Number of targeted faults
    pub fn nb_faults(&self) -> usize {
        self.faults.len()
    }

    fn nb_with(&self, status: FaultStatus) -> usize {
        self.status.iter().filter(|s| **s == status).count()
    }

    /// Number of faults detected by the patterns
    pub fn nb_detected(&self) -> usize {
        self.nb_with(FaultStatus::Detected)
    }

    /// Number of faults proven undetectable
    pub fn nb_redundant(&self) -> usize {
        self.nb_with(FaultStatus::Redundant)
    }

    /// Number of faults whose search ran out of time
    pub fn nb_aborted(&self) -> usize {
        self.nb_with(FaultStatus::Aborted)
    }

    /// Ratio of detected faults, in percent
    pub fn coverage(&self) -> f64 {
        if self.faults.is_empty() {
            100.0
        } else {
            100.0 * self.nb_detected() as f64 / self.nb_faults() as f64
        }
    }
}

impl fmt::Display for AtpgReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} patterns detecting {}/{} faults ({:.2}% coverage), {} redundant, {} aborted",
            self.patterns.len(),
            self.nb_detected(),
            self.nb_faults(),
            self.coverage(),
            self.nb_redundant(),
            self.nb_aborted()
        )
    }
}

/// Search for a pattern exposing a single fault
///
/// The fault is registered and activated for the duration of the search only. Returns the primary
/// input values found, with X for the inputs the search did not need to assign.
pub fn find_pattern(
    circuit: &mut Circuit<FaultyValue>,
    site: FaultSite,
    solver: &Solver,
) -> Result<Outcome<FaultyValue>> {
    let fault = Fault::at(circuit, site);
    let mut queue = EventQueue::new();
    queue.extend(fault.activate(circuit)?);
    queue.process(circuit)?;
    let mut goal = DFrontier::new(fault);
    let outcome = solver.solve(circuit, &mut goal);
    queue.extend(fault.deactivate(circuit)?);
    queue.process(circuit)?;
    fault.remove(circuit)?;
    outcome
}

/// Handling of the actual test pattern generation
struct TestPatternGenerator<'a> {
    circuit: &'a mut Circuit<FaultyValue>,
    config: &'a AtpgConfig,
    faults: Vec<FaultSite>,
    sim: FaultSimulator,
    status: Vec<FaultStatus>,
    patterns: Vec<Vec<bool>>,
    pattern_detections: Vec<Vec<bool>>,
    rng: SmallRng,
}

impl<'a> TestPatternGenerator<'a> {
    fn new(circuit: &'a mut Circuit<FaultyValue>, config: &'a AtpgConfig) -> Self {
        let faults = match config.fault_list {
            FaultList::Checkpoints => FaultSite::checkpoints(circuit),
            FaultList::All => FaultSite::all(circuit),
        };
        let status = vec![FaultStatus::Undetected; faults.len()];
        let sim = FaultSimulator::new(circuit, &faults);
        TestPatternGenerator {
            circuit,
            config,
            faults,
            sim,
            status,
            patterns: Vec::new(),
            pattern_detections: Vec::new(),
            rng: SmallRng::seed_from_u64(config.seed),
        }
    }

    fn nb_faults(&self) -> usize {
        self.faults.len()
    }

    fn nb_processed(&self) -> usize {
        self.status
            .iter()
            .filter(|s| **s != FaultStatus::Undetected)
            .count()
    }

    /// Turn the search result into a fully specified pattern
    fn fill(&mut self, pattern: &[FaultyValue]) -> Vec<bool> {
        pattern
            .iter()
            .map(|v| {
                if Logic::valid(v) != 0 {
                    v.good().magnitude() & 1 != 0
                } else {
                    match self.config.fill {
                        Fill::Random => self.rng.gen(),
                        Fill::Zero => false,
                    }
                }
            })
            .collect()
    }

    fn nb_detected(&self) -> usize {
        self.status
            .iter()
            .filter(|s| **s == FaultStatus::Detected)
            .count()
    }

    /// Add patterns and record the faults they detect
    ///
    /// With a target, the patterns were generated for this fault and are always kept; the other
    /// faults are only simulated for fault dropping or compression. Without a target, the patterns
    /// are kept only if they detect a new fault. Returns the number of patterns kept.
    fn add_patterns(&mut self, patterns: Vec<Vec<bool>>, target: Option<usize>) -> Result<usize> {
        let simulate = target.is_none() || self.config.drop_detected || self.config.compress;
        let detections = if simulate {
            let status = &self.status;
            let compress = self.config.compress;
            self.sim
                .detections(self.circuit, &patterns, |i| match status[i] {
                    FaultStatus::Redundant => false,
                    FaultStatus::Detected => compress,
                    _ => true,
                })?
        } else {
            vec![vec![false; self.nb_faults()]; patterns.len()]
        };
        let mut nb_kept = 0;
        for (pattern, mut det) in patterns.into_iter().zip(detections) {
            if let Some(t) = target {
                det[t] = true;
            }
            let detects_new = det
                .iter()
                .zip(self.status.iter())
                .any(|(d, s)| *d && *s != FaultStatus::Detected);
            if target.is_none() && !detects_new {
                continue;
            }
            for (i, d) in det.iter().enumerate() {
                if *d && (target.is_none() || self.config.drop_detected || target == Some(i)) {
                    self.status[i] = FaultStatus::Detected;
                }
            }
            self.patterns.push(pattern);
            self.pattern_detections.push(det);
            nb_kept += 1;
        }
        Ok(nb_kept)
    }

    /// Simulate up to 64 random patterns, and keep those that detect new faults
    fn add_random_patterns(&mut self, nb: usize) -> Result<usize> {
        let nb_inputs = self.circuit.nb_inputs();
        let weights = vec![self.config.random_weight; nb_inputs];
        let values = random_vector(&mut self.rng, nb_inputs, &weights)?;
        let patterns: Vec<Vec<bool>> = (0..nb.min(NB_LANES))
            .map(|lane| {
                values
                    .iter()
                    .map(|v| (v.magnitude() >> lane) & 1 != 0)
                    .collect()
            })
            .collect();
        self.add_patterns(patterns, None)
    }

    /// Compress the existing patterns to keep as few as possible
    ///
    /// This is a minimum set cover problem, solved with a greedy algorithm: take the pattern that
    /// detects the most new faults each time.
    fn compress_patterns(&mut self) {
        let nb_patterns = self.patterns.len();

        // Which patterns detect a given fault
        let mut fault_to_patterns: Vec<Vec<usize>> = (0..self.nb_faults())
            .map(|f| {
                (0..nb_patterns)
                    .filter(|p| self.pattern_detections[*p][f])
                    .collect()
            })
            .collect();
        let mut remaining_to_detect = fault_to_patterns.iter().filter(|p| !p.is_empty()).count();

        // Which faults are detected by a given pattern
        let pattern_to_faults: Vec<Vec<usize>> = self
            .pattern_detections
            .iter()
            .map(|det| (0..det.len()).filter(|f| det[*f]).collect())
            .collect();

        // How many new faults each pattern detects
        let mut nb_detected_by_pattern: Vec<usize> =
            pattern_to_faults.iter().map(|v| v.len()).collect();

        let mut selected_patterns = Vec::new();
        while remaining_to_detect > 0 {
            let best = nb_detected_by_pattern
                .iter()
                .enumerate()
                .max_by_key(|(_, n)| **n)
                .map(|(i, _)| i);
            let Some(best) = best else {
                break;
            };
            if nb_detected_by_pattern[best] == 0 {
                break;
            }
            selected_patterns.push(best);
            remaining_to_detect -= nb_detected_by_pattern[best];

            // Remove the faults detected by the pattern from consideration
            for f in &pattern_to_faults[best] {
                for p in &fault_to_patterns[*f] {
                    nb_detected_by_pattern[*p] -= 1;
                }
                // So we don't remove a fault twice
                fault_to_patterns[*f].clear();
            }
        }

        selected_patterns.sort();
        self.patterns = selected_patterns
            .iter()
            .map(|p| self.patterns[*p].clone())
            .collect();
        self.pattern_detections = selected_patterns
            .iter()
            .map(|p| self.pattern_detections[*p].clone())
            .collect();
    }

    /// Unregister the simulated faults and return the results
    fn report(self) -> Result<AtpgReport> {
        self.sim.remove(self.circuit)?;
        Ok(AtpgReport {
            patterns: self.patterns,
            faults: self.faults,
            status: self.status,
        })
    }
}

/// Generate test patterns for the stuck-at faults of a combinational circuit
///
/// Optional random patterns are simulated first, keeping those that detect new faults. Each
/// remaining fault is then targeted in turn with a [`DFrontier`] search. The circuit is left with
/// every value at X and no fault registered.
pub fn generate_test_patterns(
    circuit: &mut Circuit<FaultyValue>,
    config: &AtpgConfig,
) -> Result<AtpgReport> {
    if !(0.0..=1.0).contains(&config.random_weight) {
        return Err(Error::InvalidWeight(config.random_weight));
    }
    let solver = Solver::new(SolverConfig {
        time_limit: config.time_limit,
    });
    let nb_inputs = circuit.nb_inputs();
    let nb_outputs = circuit.nb_outputs();
    let mut gen = TestPatternGenerator::new(circuit, config);
    let mut progress = tqdm!(total = gen.nb_faults());
    progress.set_description("Faults processed");
    progress.write(format!(
        "Analyzing circuit with {} inputs, {} outputs and {} faults",
        nb_inputs,
        nb_outputs,
        gen.nb_faults(),
    ))?;
    if config.random_patterns > 0 {
        let mut nb_simulated = 0;
        while nb_simulated < config.random_patterns && gen.nb_processed() < gen.nb_faults() {
            let nb = (config.random_patterns - nb_simulated).min(NB_LANES);
            gen.add_random_patterns(nb)?;
            nb_simulated += nb;
            progress.set_postfix(format!("patterns={}", gen.patterns.len()));
            progress.update_to(gen.nb_processed())?;
        }
        info!(
            nb_simulated,
            nb_kept = gen.patterns.len(),
            detected = gen.nb_detected(),
            "random patterns done"
        );
    }
    for i in 0..gen.nb_faults() {
        if gen.status[i] != FaultStatus::Undetected {
            continue;
        }
        let site = gen.faults[i];
        let outcome = find_pattern(gen.circuit, site, &solver)?;
        debug!(fault = %site.describe(gen.circuit), ?outcome, "fault processed");
        match outcome {
            Outcome::Satisfied(p) => {
                let pattern = gen.fill(&p);
                gen.add_patterns(vec![pattern], Some(i))?;
            }
            Outcome::Impossible => gen.status[i] = FaultStatus::Redundant,
            Outcome::TimedOut => gen.status[i] = FaultStatus::Aborted,
        }
        progress.set_postfix(format!("patterns={}", gen.patterns.len()));
        progress.update_to(gen.nb_processed())?;
    }
    if config.compress {
        let before = gen.patterns.len();
        gen.compress_patterns();
        progress.write(format!(
            "Kept {} patterns out of {}",
            gen.patterns.len(),
            before
        ))?;
    }
    let report = gen.report()?;
    progress.write(format!("Generated {report}"))?;
    info!(
        nb_patterns = report.patterns.len(),
        detected = report.nb_detected(),
        redundant = report.nb_redundant(),
        aborted = report.nb_aborted(),
        "test pattern generation done"
    );
    Ok(report)
}
