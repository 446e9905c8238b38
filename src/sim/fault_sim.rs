use crate::circuit::Circuit;
use crate::error::{Error, Result};
use crate::sim::{assign_inputs, EventQueue, Fault, FaultSite};
use crate::value::{FaultyValue, Value};

/// Number of patterns simulated together, one per lane of a value
pub const NB_LANES: usize = 64;

/// Bit-parallel fault simulation of up to 64 patterns at once
///
/// The good circuit is settled once per batch of patterns. Each fault is then toggled in turn, and
/// only the objects its value change reaches are evaluated before toggling it back.
#[derive(Clone, Debug)]
pub struct FaultSimulator {
    faults: Vec<Fault>,
}

impl FaultSimulator {
    /// Register one inactive fault per site
    pub fn new(circuit: &mut Circuit<FaultyValue>, sites: &[FaultSite]) -> Self {
        let faults = sites.iter().map(|s| Fault::at(circuit, *s)).collect();
        FaultSimulator { faults }
    }

    /// Number of simulated faults
    pub fn nb_faults(&self) -> usize {
        self.faults.len()
    }

    /// Registered faults, in the order of the sites
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    /// Lanes where the fault reaches a primary output, with the good values already settled
    fn lanes_detecting(
        circuit: &mut Circuit<FaultyValue>,
        fault: Fault,
        queue: &mut EventQueue,
    ) -> Result<u64> {
        let events = fault.go(circuit)?;
        if circuit.value(fault.location()).faulty() == 0 {
            // Not excited on any lane: nothing downstream changed
            fault.go(circuit)?;
            return Ok(0);
        }
        queue.extend(events);
        queue.process(circuit)?;
        let mask = circuit
            .outputs()
            .iter()
            .fold(0, |m, o| m | circuit.value(*o).faulty());
        queue.extend(fault.go(circuit)?);
        queue.process(circuit)?;
        Ok(mask)
    }

    /// Detection mask of each fault for a stimulus with one pattern per lane
    ///
    /// Faults for which `selected` returns false are skipped and get an empty mask. The circuit is
    /// left with every value at X.
    pub fn detection_masks<F: Fn(usize) -> bool>(
        &self,
        circuit: &mut Circuit<FaultyValue>,
        stimulus: &[Value],
        selected: F,
    ) -> Result<Vec<u64>> {
        let stimulus: Vec<FaultyValue> = stimulus.iter().map(|v| FaultyValue::from(*v)).collect();
        assign_inputs(circuit, &stimulus)?;
        let mut queue = EventQueue::new();
        let mut ret = vec![0; self.faults.len()];
        for (i, fault) in self.faults.iter().enumerate() {
            if selected(i) {
                ret[i] = Self::lanes_detecting(circuit, *fault, &mut queue)?;
            }
        }
        circuit.reset();
        Ok(ret)
    }

    /// Which faults each pattern detects, simulating the patterns 64 at a time
    ///
    /// Returns one vector per pattern, with one entry per fault.
    pub fn detections<F: Fn(usize) -> bool>(
        &self,
        circuit: &mut Circuit<FaultyValue>,
        patterns: &[Vec<bool>],
        selected: F,
    ) -> Result<Vec<Vec<bool>>> {
        if let Some(p) = patterns.iter().find(|p| p.len() != circuit.nb_inputs()) {
            return Err(Error::InputCount {
                expected: circuit.nb_inputs(),
                found: p.len(),
            });
        }
        let mut ret = Vec::with_capacity(patterns.len());
        for chunk in patterns.chunks(NB_LANES) {
            let stimulus = pack_patterns(chunk, circuit.nb_inputs());
            let masks = self.detection_masks(circuit, &stimulus, &selected)?;
            for lane in 0..chunk.len() {
                ret.push(masks.iter().map(|m| (m >> lane) & 1 != 0).collect());
            }
        }
        Ok(ret)
    }

    /// Unregister all faults
    pub fn remove(self, circuit: &mut Circuit<FaultyValue>) -> Result<()> {
        for fault in self.faults {
            fault.remove(circuit)?;
        }
        Ok(())
    }
}

/// Pack up to 64 fully specified patterns, one per lane; unused lanes are X
fn pack_patterns(patterns: &[Vec<bool>], nb_inputs: usize) -> Vec<Value> {
    let valid = if patterns.len() >= NB_LANES {
        !0
    } else {
        (1u64 << patterns.len()) - 1
    };
    (0..nb_inputs)
        .map(|i| {
            let magnitude = patterns
                .iter()
                .enumerate()
                .fold(0, |m, (lane, p)| m | (u64::from(p[i]) << lane));
            Value::new(magnitude, valid)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::circuit::generators::testcases;
    use crate::value::Logic;

    /// Detection by injecting the fault before simulating a single pattern
    fn detects_serially(
        circuit: &mut Circuit<FaultyValue>,
        pattern: &[bool],
        site: FaultSite,
    ) -> bool {
        let fault = Fault::at(circuit, site);
        let mut queue = EventQueue::new();
        queue.extend(fault.activate(circuit).unwrap());
        queue.process(circuit).unwrap();
        let stimulus: Vec<FaultyValue> = pattern.iter().map(|b| FaultyValue::from(*b)).collect();
        assign_inputs(circuit, &stimulus).unwrap();
        let ret = circuit
            .outputs()
            .iter()
            .any(|o| circuit.value(*o).faulty() != 0);
        fault.deactivate(circuit).unwrap();
        fault.remove(circuit).unwrap();
        circuit.reset();
        ret
    }

    #[test]
    fn test_matches_serial_simulation() {
        let mut c = testcases::c17::<FaultyValue>().unwrap();
        let sites = FaultSite::all(&c);
        let mut rng = SmallRng::seed_from_u64(3);
        let patterns: Vec<Vec<bool>> = (0..100)
            .map(|_| (0..c.nb_inputs()).map(|_| rng.gen()).collect())
            .collect();
        let sim = FaultSimulator::new(&mut c, &sites);
        let det = sim.detections(&mut c, &patterns, |_| true).unwrap();
        sim.remove(&mut c).unwrap();
        assert_eq!(det.len(), 100);
        for (p, d) in patterns.iter().zip(det.iter()) {
            for (site, detected) in sites.iter().zip(d.iter()) {
                assert_eq!(
                    *detected,
                    detects_serially(&mut c, p, *site),
                    "{} with pattern {:?}",
                    site.describe(&c),
                    p
                );
            }
        }
    }

    #[test]
    fn test_masks() {
        let (mut c, [a, b, g, _]) = testcases::and_gate::<FaultyValue>().unwrap();
        let sites = [
            FaultSite {
                location: a,
                stuck: false,
            },
            FaultSite {
                location: g,
                stuck: true,
            },
            FaultSite {
                location: b,
                stuck: false,
            },
        ];
        let sim = FaultSimulator::new(&mut c, &sites);
        // Lanes: a = 1100, b = 1010
        let stimulus = [Value::new(0b1100, 0b1111), Value::new(0b1010, 0b1111)];
        let masks = sim.detection_masks(&mut c, &stimulus, |i| i != 2).unwrap();
        assert_eq!(masks, vec![0b1000, 0b0111, 0]);
        for id in c.ids() {
            assert!(c.value(id).is_unknown());
        }
        for f in sim.faults() {
            assert!(!f.is_active(&c));
        }
        sim.remove(&mut c).unwrap();
        assert!(Fault::registered_at(&c, a).is_empty());
    }

    #[test]
    fn test_partial_batch() {
        let (mut c, [a, _, _, _]) = testcases::and_gate::<FaultyValue>().unwrap();
        let sim = FaultSimulator::new(
            &mut c,
            &[FaultSite {
                location: a,
                stuck: false,
            }],
        );
        // 65 patterns: a full batch, then a single lane
        let patterns = vec![vec![true, true]; NB_LANES + 1];
        let det = sim.detections(&mut c, &patterns, |_| true).unwrap();
        assert_eq!(det.len(), NB_LANES + 1);
        assert!(det.iter().all(|d| d[0]));
        assert!(sim.detections(&mut c, &[vec![true]], |_| true).is_err());
        sim.remove(&mut c).unwrap();
    }
}
