use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::trace;

use crate::circuit::{Circuit, ObjId, Role};
use crate::error::{Error, Result};
use crate::value::Logic;

/// Request to re-evaluate an object, ordered by its level
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Event {
    /// Level of the target when the event was created
    pub level: usize,
    /// Object to re-evaluate
    pub target: ObjId,
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.target, self.level)
    }
}

impl<V: Logic> Circuit<V> {
    /// Events for every object driven by `id`, at their current level
    pub fn fanout_events(&self, id: ObjId) -> Vec<Event> {
        self.fanout(id)
            .iter()
            .map(|o| Event {
                level: self.level(*o),
                target: *o,
            })
            .collect()
    }

    /// Value an object would take when fired without override
    ///
    /// Inputs have no function to evaluate and return None.
    fn next_value(&self, id: ObjId) -> Option<V> {
        match self.role(id) {
            Role::Input => None,
            Role::Constant(b) => Some(V::constant(b)),
            Role::Gate(f) => {
                let inputs: Vec<V> = self.fanin(id).iter().map(|i| self.value(*i)).collect();
                Some(f.evaluate(&inputs))
            }
            Role::Line | Role::Output => Some(
                self.fanin(id)
                    .first()
                    .map(|i| self.value(*i))
                    .unwrap_or_else(V::unknown),
            ),
            Role::Watch => Some(V::unknown()),
        }
    }

    /// Store a new nominal value, and return the fanout events if the visible value changed
    fn commit(&mut self, id: ObjId, nominal: V) -> Vec<Event> {
        if self.role(id) == Role::Watch {
            self.check_watch(id);
            return Vec::new();
        }
        let before = self.value(id);
        self.set_nominal(id, nominal);
        if self.value(id) != before {
            self.fanout_events(id)
        } else {
            Vec::new()
        }
    }

    /// Evaluate every object once in level order, without events
    ///
    /// Used after levelization or reset, so that constant drivers reach their fanout cone.
    pub(crate) fn settle(&mut self) {
        let mut order: Vec<ObjId> = self.ids().collect();
        order.sort_by_key(|id| self.level(*id));
        for id in order {
            if matches!(self.role(id), Role::Input | Role::Watch) {
                continue;
            }
            if let Some(v) = self.next_value(id) {
                self.set_nominal(id, v);
            }
        }
    }

    /// Recompute the value of an object, returning the events for its fanout if it changed
    ///
    /// With an explicit value (stimulus, search decisions) the value is assigned directly.
    /// Otherwise it is computed from the current input values. A primary input fired without value
    /// always propagates, so that the stimulus already stored there reaches its fanout.
    pub fn fire(&mut self, id: ObjId, value: Option<V>) -> Vec<Event> {
        match value.or_else(|| self.next_value(id)) {
            Some(v) => self.commit(id, v),
            None => self.fanout_events(id),
        }
    }
}

/// Level-indexed buckets of pending events
///
/// Processing drains the buckets from level 0 upward. All targets of a level only read values
/// from strictly lower levels, so they can be evaluated in any order.
#[derive(Clone, Debug, Default)]
pub struct EventQueue {
    buckets: Vec<Vec<ObjId>>,
    len: usize,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether no event is pending
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add an event to the bucket of its level
    pub fn add(&mut self, event: Event) {
        if self.buckets.len() <= event.level {
            self.buckets.resize_with(event.level + 1, Vec::new);
        }
        self.buckets[event.level].push(event.target);
        self.len += 1;
    }

    /// Add several events
    pub fn extend<I: IntoIterator<Item = Event>>(&mut self, events: I) {
        for e in events {
            self.add(e);
        }
    }

    /// Drop all pending events
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.len = 0;
    }

    /// Fire every pending event and the events they cause, in level order
    ///
    /// An event produced for a level that is not strictly above the level being drained means the
    /// circuit has a cycle or stale levels: processing stops with a structural error. The queue
    /// is empty on return in all cases.
    pub fn process<V: Logic>(&mut self, circuit: &mut Circuit<V>) -> Result<()> {
        let ret = self.drain(circuit);
        self.clear();
        ret
    }

    fn drain<V: Logic>(&mut self, circuit: &mut Circuit<V>) -> Result<()> {
        let mut level = 0;
        while level < self.buckets.len() {
            let mut targets = std::mem::take(&mut self.buckets[level]);
            self.len -= targets.len();
            targets.sort_unstable();
            targets.dedup();
            trace!(level, nb_events = targets.len(), "draining level");

            let values = Self::evaluate_level(circuit, &targets);
            for (target, value) in targets.into_iter().zip(values) {
                let events = match value {
                    Some(v) => circuit.commit(target, v),
                    None => circuit.fanout_events(target),
                };
                for e in events {
                    if e.level <= level {
                        return Err(Error::OutOfOrderEvent {
                            name: circuit.name(e.target).to_string(),
                            level: e.level,
                            draining: level,
                        });
                    }
                    self.add(e);
                }
            }
            level += 1;
        }
        Ok(())
    }

    #[cfg(not(feature = "parallel"))]
    fn evaluate_level<V: Logic>(circuit: &Circuit<V>, targets: &[ObjId]) -> Vec<Option<V>> {
        targets.iter().map(|t| circuit.next_value(*t)).collect()
    }

    #[cfg(feature = "parallel")]
    fn evaluate_level<V: Logic>(circuit: &Circuit<V>, targets: &[ObjId]) -> Vec<Option<V>> {
        targets.par_iter().map(|t| circuit.next_value(*t)).collect()
    }
}
