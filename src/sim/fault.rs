use std::fmt;

use crate::circuit::{Circuit, FaultId, ObjId, Role};
use crate::error::{Error, Result};
use crate::sim::Event;
use crate::value::{Logic, Value};

/// Stuck-at fault location and polarity, independent of any registration
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FaultSite {
    /// Object whose value is stuck
    pub location: ObjId,
    /// Stuck value
    pub stuck: bool,
}

impl FaultSite {
    /// Get all fault sites of a circuit: inputs, gates and lines, stuck at 0 and 1
    pub fn all<V: Logic>(circuit: &Circuit<V>) -> Vec<FaultSite> {
        let mut ret = Vec::new();
        for location in circuit.ids() {
            if matches!(
                circuit.role(location),
                Role::Input | Role::Gate(_) | Role::Line
            ) {
                for stuck in [false, true] {
                    ret.push(FaultSite { location, stuck });
                }
            }
        }
        ret
    }

    /// Get the checkpoint fault sites: primary input stems and fanout branches
    ///
    /// Detecting every checkpoint fault detects every stuck-at fault of a circuit without
    /// reconvergent Xor gates. Inputs driving several objects directly are their own stem.
    pub fn checkpoints<V: Logic>(circuit: &Circuit<V>) -> Vec<FaultSite> {
        let mut locations = Vec::new();
        for input in circuit.inputs() {
            match circuit.fanout(*input) {
                [stem] if circuit.role(*stem) == Role::Line => locations.push(*stem),
                _ => locations.push(*input),
            }
        }
        for id in circuit.ids() {
            if circuit.role(id) != Role::Line {
                continue;
            }
            let is_branch = circuit
                .fanin(id)
                .iter()
                .any(|d| circuit.fanout(*d).len() > 1);
            if is_branch {
                locations.push(id);
            }
        }
        locations.sort();
        locations.dedup();
        locations
            .into_iter()
            .flat_map(|location| {
                [false, true]
                    .into_iter()
                    .map(move |stuck| FaultSite { location, stuck })
            })
            .collect()
    }

    /// Describe the site using object names
    pub fn describe<V: Logic>(&self, circuit: &Circuit<V>) -> String {
        format!(
            "{} stuck at {}",
            circuit.name(self.location),
            i32::from(self.stuck)
        )
    }
}

impl fmt::Display for FaultSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stuck at {}", self.location, i32::from(self.stuck))
    }
}

/// Stuck-at fault registered on a circuit object
///
/// The fault is registered in the location's fault set on creation, and must be removed
/// explicitly with [`Fault::remove`] once inactive. At most one fault is active per location.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Fault {
    id: FaultId,
    site: FaultSite,
}

impl Fault {
    /// Register a new, inactive fault
    pub fn new<V: Logic>(circuit: &mut Circuit<V>, location: ObjId, stuck: bool) -> Fault {
        let id = circuit.register_fault(location, stuck);
        Fault {
            id,
            site: FaultSite { location, stuck },
        }
    }

    /// Register a new, inactive fault at a site
    pub fn at<V: Logic>(circuit: &mut Circuit<V>, site: FaultSite) -> Fault {
        Fault::new(circuit, site.location, site.stuck)
    }

    /// Identifier of the fault within its circuit
    pub fn id(&self) -> usize {
        self.id
    }

    /// Location and polarity
    pub fn site(&self) -> FaultSite {
        self.site
    }

    /// Object whose value is stuck
    pub fn location(&self) -> ObjId {
        self.site.location
    }

    /// Stuck value
    pub fn stuck(&self) -> bool {
        self.site.stuck
    }

    /// Value injected in the faulty frame
    pub fn value(&self) -> Value {
        Value::constant(self.site.stuck)
    }

    /// Returns whether the fault is currently injected
    pub fn is_active<V: Logic>(&self, circuit: &Circuit<V>) -> bool {
        circuit.active_fault(self.location()) == Some(self.id)
    }

    fn check_registered<V: Logic>(&self, circuit: &Circuit<V>) -> Result<()> {
        match circuit.fault_record(self.id) {
            Some(_) => Ok(()),
            None => Err(Error::UnknownFault(self.id)),
        }
    }

    /// Toggle the fault, returning the fanout events if the value at its location changed
    pub fn go<V: Logic>(&self, circuit: &mut Circuit<V>) -> Result<Vec<Event>> {
        if self.is_active(circuit) {
            self.deactivate(circuit)
        } else {
            self.activate(circuit)
        }
    }

    /// Inject the fault, returning the fanout events if the value at its location changed
    pub fn activate<V: Logic>(&self, circuit: &mut Circuit<V>) -> Result<Vec<Event>> {
        self.check_registered(circuit)?;
        let location = self.location();
        if circuit.active_fault(location).is_some() {
            return Err(Error::FaultAlreadyActive {
                location: circuit.name(location).to_string(),
            });
        }
        let before = circuit.value(location);
        circuit.set_active_fault(location, Some(self.id));
        Ok(Self::changed_events(circuit, location, before))
    }

    /// Remove the injected fault, returning the fanout events if the value at its location changed
    pub fn deactivate<V: Logic>(&self, circuit: &mut Circuit<V>) -> Result<Vec<Event>> {
        self.check_registered(circuit)?;
        let location = self.location();
        match circuit.active_fault(location) {
            None => Err(Error::NoActiveFault {
                location: circuit.name(location).to_string(),
            }),
            Some(active) if active != self.id => Err(Error::FaultMismatch {
                fault: self.id,
                location: circuit.name(location).to_string(),
            }),
            Some(_) => {
                let before = circuit.value(location);
                circuit.set_active_fault(location, None);
                Ok(Self::changed_events(circuit, location, before))
            }
        }
    }

    fn changed_events<V: Logic>(circuit: &Circuit<V>, location: ObjId, before: V) -> Vec<Event> {
        if circuit.value(location) != before {
            circuit.fanout_events(location)
        } else {
            Vec::new()
        }
    }

    /// Unregister the fault; it must not be active
    pub fn remove<V: Logic>(self, circuit: &mut Circuit<V>) -> Result<()> {
        self.check_registered(circuit)?;
        if self.is_active(circuit) {
            return Err(Error::ActiveFaultDropped {
                fault: self.id,
                location: circuit.name(self.location()).to_string(),
            });
        }
        circuit.unregister_fault(self.id);
        Ok(())
    }

    /// Faults registered at a location
    pub fn registered_at<V: Logic>(circuit: &Circuit<V>, location: ObjId) -> Vec<Fault> {
        circuit
            .faults_at(location)
            .iter()
            .filter_map(|id| {
                circuit.fault_record(*id).map(|r| Fault {
                    id: *id,
                    site: FaultSite {
                        location: r.location,
                        stuck: r.stuck,
                    },
                })
            })
            .collect()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fault {}: {}", self.id, self.site)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::generators::testcases;
    use crate::sim::EventQueue;
    use crate::value::FaultyValue;

    #[test]
    fn test_round_trip() {
        let (mut c, [a, b, g, po]) = testcases::and_gate::<FaultyValue>().unwrap();
        let mut queue = EventQueue::new();
        queue.extend(c.fire(a, Some(FaultyValue::constant(true))));
        queue.extend(c.fire(b, Some(FaultyValue::constant(true))));
        queue.process(&mut c).unwrap();
        let before = c.value(po);

        let fault = Fault::new(&mut c, a, false);
        assert_eq!(Fault::registered_at(&c, a), vec![fault]);
        let events = fault.go(&mut c).unwrap();
        assert_eq!(events.len(), 1);
        assert!(fault.is_active(&c));
        queue.extend(events);
        queue.process(&mut c).unwrap();
        assert_eq!(c.value(a), FaultyValue::d());
        assert_eq!(c.value(g), FaultyValue::d());
        assert_eq!(c.value(po), FaultyValue::d());

        queue.extend(fault.go(&mut c).unwrap());
        queue.process(&mut c).unwrap();
        assert!(!fault.is_active(&c));
        assert_eq!(c.value(po), before);
        fault.remove(&mut c).unwrap();
        assert!(Fault::registered_at(&c, a).is_empty());
    }

    #[test]
    fn test_no_change() {
        let (mut c, [a, _, _, _]) = testcases::and_gate::<FaultyValue>().unwrap();
        c.fire(a, Some(FaultyValue::constant(false)));
        let fault = Fault::new(&mut c, a, false);
        assert!(fault.activate(&mut c).unwrap().is_empty());
        assert!(fault.deactivate(&mut c).unwrap().is_empty());
    }

    #[test]
    fn test_state_errors() {
        let (mut c, [a, _, _, _]) = testcases::and_gate::<FaultyValue>().unwrap();
        let f0 = Fault::new(&mut c, a, false);
        let f1 = Fault::new(&mut c, a, true);
        assert!(matches!(
            f0.deactivate(&mut c),
            Err(Error::NoActiveFault { .. })
        ));
        f0.activate(&mut c).unwrap();
        assert!(matches!(
            f0.activate(&mut c),
            Err(Error::FaultAlreadyActive { .. })
        ));
        assert!(matches!(
            f1.activate(&mut c),
            Err(Error::FaultAlreadyActive { .. })
        ));
        assert!(matches!(
            f1.deactivate(&mut c),
            Err(Error::FaultMismatch { .. })
        ));
        assert!(matches!(
            f0.remove(&mut c),
            Err(Error::ActiveFaultDropped { .. })
        ));
        f0.deactivate(&mut c).unwrap();
        f0.remove(&mut c).unwrap();
        assert!(matches!(
            f0.activate(&mut c),
            Err(Error::UnknownFault(_))
        ));
        f1.remove(&mut c).unwrap();
    }

    #[test]
    fn test_sites() {
        let c = testcases::c17::<FaultyValue>().unwrap();
        let checkpoints = FaultSite::checkpoints(&c);
        // 5 input stems and 6 branches
        assert_eq!(checkpoints.len(), 2 * 11);
        let all = FaultSite::all(&c);
        assert_eq!(all.len(), 2 * (5 + 6 + 17));
        let s = checkpoints[0];
        assert_eq!(s.describe(&c), "1_line stuck at 0");
    }
}
