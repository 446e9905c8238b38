use std::fmt;

use tracing::trace;

use crate::circuit::{Circuit, ObjId};
use crate::sim::EventQueue;
use crate::value::Logic;

/// An entry of the implication stack
///
/// A decision carries an alternative value to try on backtrack; a marker only records that the
/// backtracer walked through a location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlternativeEvent<V> {
    /// Object the entry applies to
    pub location: ObjId,
    /// Value assigned when the entry is pushed
    pub assignment: Option<V>,
    /// Value tried on backtrack before giving up on the entry
    pub alternative: Option<V>,
    /// Value restored when the entry is popped for good
    pub backtrack: Option<V>,
}

impl<V: Logic> AlternativeEvent<V> {
    /// A decision at a location, with the opposite value as alternative
    pub fn decision(location: ObjId, value: V) -> Self {
        AlternativeEvent {
            location,
            assignment: Some(value),
            alternative: Some(!value),
            backtrack: Some(V::unknown()),
        }
    }

    /// A marker entry, without any assignment
    pub fn marker(location: ObjId) -> Self {
        AlternativeEvent {
            location,
            assignment: None,
            alternative: None,
            backtrack: None,
        }
    }

    /// Returns whether the entry is a decision
    pub fn is_decision(&self) -> bool {
        self.assignment.is_some()
    }
}

impl<V: Logic> fmt::Display for AlternativeEvent<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.assignment {
            Some(v) => write!(f, "{} <- {}", self.location, v),
            None => write!(f, "{} (marker)", self.location),
        }
    }
}

/// Stack of the decisions made by the search, in order
#[derive(Clone, Debug, Default)]
pub struct ImplicationStack<V> {
    stack: Vec<AlternativeEvent<V>>,
}

impl<V: Logic> ImplicationStack<V> {
    /// Create an empty stack
    pub fn new() -> Self {
        ImplicationStack { stack: Vec::new() }
    }

    /// Number of entries, decisions and markers alike
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// Returns whether the stack holds no entry
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Entries, oldest first
    pub fn entries(&self) -> &[AlternativeEvent<V>] {
        &self.stack
    }

    /// Push entries, applying their assignments
    ///
    /// Returns the events to process for the assignments to take effect.
    pub fn add<I>(&mut self, circuit: &mut Circuit<V>, events: I) -> EventQueue
    where
        I: IntoIterator<Item = AlternativeEvent<V>>,
    {
        let mut queue = EventQueue::new();
        for e in events {
            if let Some(v) = e.assignment {
                queue.extend(circuit.fire(e.location, Some(v)));
            }
            self.stack.push(e);
        }
        queue
    }

    /// Undo the most recent decision
    ///
    /// Entries are popped until one has an alternative: it is applied, and the entry is pushed
    /// back without alternative. Popped entries get their backtrack value. With `clear`, the
    /// alternatives are ignored and the whole stack is unwound.
    ///
    /// Returns the events to process for the changes to take effect.
    pub fn backtrack(&mut self, circuit: &mut Circuit<V>, clear: bool) -> EventQueue {
        let mut queue = EventQueue::new();
        while let Some(mut e) = self.stack.pop() {
            if !clear {
                if let Some(alt) = e.alternative.take() {
                    trace!(location = %circuit.name(e.location), value = %alt, "trying alternative");
                    queue.extend(circuit.fire(e.location, Some(alt)));
                    e.assignment = Some(alt);
                    self.stack.push(e);
                    break;
                }
            }
            if let Some(v) = e.backtrack {
                queue.extend(circuit.fire(e.location, Some(v)));
            }
        }
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::generators::testcases;
    use crate::value::Value;

    #[test]
    fn test_backtrack_clear() {
        let (mut c, [a, b, g, po]) = testcases::and_gate::<Value>().unwrap();
        let one = Value::constant(true);
        let mut stack = ImplicationStack::new();
        stack
            .add(
                &mut c,
                [AlternativeEvent::marker(g), AlternativeEvent::decision(a, one)],
            )
            .process(&mut c)
            .unwrap();
        stack
            .add(&mut c, [AlternativeEvent::decision(b, one)])
            .process(&mut c)
            .unwrap();
        assert_eq!(stack.len(), 3);
        assert_eq!(c.value(po), one);

        stack.backtrack(&mut c, true).process(&mut c).unwrap();
        assert!(stack.is_empty());
        for id in [a, b, g, po] {
            assert!(c.value(id).is_unknown());
        }
    }

    #[test]
    fn test_alternative() {
        let (mut c, [a, b, _, po]) = testcases::and_gate::<Value>().unwrap();
        let one = Value::constant(true);
        let zero = Value::constant(false);
        let mut stack = ImplicationStack::new();
        stack
            .add(&mut c, [AlternativeEvent::decision(a, one)])
            .process(&mut c)
            .unwrap();
        stack
            .add(&mut c, [AlternativeEvent::decision(b, one)])
            .process(&mut c)
            .unwrap();

        // b flips to 0 and stays on the stack
        stack.backtrack(&mut c, false).process(&mut c).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(c.value(b), zero);
        assert_eq!(c.value(po), zero);

        // b is exhausted and popped, a flips to 0
        stack.backtrack(&mut c, false).process(&mut c).unwrap();
        assert_eq!(stack.len(), 1);
        assert!(c.value(b).is_unknown());
        assert_eq!(c.value(a), zero);
        assert_eq!(stack.entries()[0].assignment, Some(zero));

        stack.backtrack(&mut c, false).process(&mut c).unwrap();
        assert!(stack.is_empty());
        assert!(c.value(a).is_unknown());
    }

    #[test]
    fn test_display() {
        let (_, [a, _, _, _]) = testcases::and_gate::<Value>().unwrap();
        let d = AlternativeEvent::decision(a, Value::constant(true));
        assert!(d.is_decision());
        assert_eq!(d.alternative, Some(Value::constant(false)));
        assert_eq!(d.to_string(), "#0 <- 1");
        assert!(!AlternativeEvent::<Value>::marker(a).is_decision());
    }
}
