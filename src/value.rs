//! Bit-parallel logic values
//!
//! [`Value`] is the three-valued (0, 1, X) lane vector used for fault-free simulation.
//! [`FaultyValue`] pairs two of them to represent the five-valued (0, 1, X, D, U) algebra
//! used to simulate a good and a faulty circuit at once.
//!
//! ```
//! # use stuckat::{FaultyValue, Value};
//! let d = FaultyValue::d();
//! let x = FaultyValue::unknown();
//! assert_eq!((d & FaultyValue::constant(true)).name(), "D");
//! assert_eq!((d | x).name(), "1X");
//! assert_eq!(Value::constant(false) & Value::unknown(), Value::constant(false));
//! ```

mod faulty;
mod three_valued;

use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

use rand::Rng;

pub use faulty::FaultyValue;
pub use three_valued::Value;

use crate::error::{Error, Result};

/// Operations the circuit, scheduler and search need from a value type
pub trait Logic:
    Copy
    + PartialEq
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
{
    /// Unknown on every lane
    fn unknown() -> Self;

    /// Same logic level on every lane
    fn constant(value: bool) -> Self;

    /// Lanes that are fully determined
    fn valid(&self) -> u64;

    /// Fault-free part of the value
    fn good(&self) -> Value;

    /// Lanes carrying a fault effect
    fn fault_effect(&self) -> u64;

    /// Value seen at a location where `stuck` has been injected
    fn with_fault(&self, stuck: Value) -> Self;

    /// Returns whether some lane known on both sides disagrees with `target`
    fn conflicts(&self, target: &Self) -> bool;

    /// Returns whether no lane is determined
    fn is_unknown(&self) -> bool {
        self.valid() == 0
    }
}

impl Logic for Value {
    fn unknown() -> Self {
        Value::unknown()
    }

    fn constant(value: bool) -> Self {
        Value::constant(value)
    }

    fn valid(&self) -> u64 {
        Value::valid(self)
    }

    fn good(&self) -> Value {
        *self
    }

    fn fault_effect(&self) -> u64 {
        0
    }

    fn with_fault(&self, stuck: Value) -> Self {
        stuck
    }

    fn conflicts(&self, target: &Self) -> bool {
        self.valid() & target.valid() & (self.magnitude() ^ target.magnitude()) != 0
    }
}

impl Logic for FaultyValue {
    fn unknown() -> Self {
        FaultyValue::unknown()
    }

    fn constant(value: bool) -> Self {
        FaultyValue::constant(value)
    }

    fn valid(&self) -> u64 {
        FaultyValue::valid(self)
    }

    fn good(&self) -> Value {
        FaultyValue::good(self)
    }

    fn fault_effect(&self) -> u64 {
        self.faulty()
    }

    fn with_fault(&self, stuck: Value) -> Self {
        FaultyValue::new(FaultyValue::good(self), stuck)
    }

    fn conflicts(&self, target: &Self) -> bool {
        let valid = Logic::valid(self) & Logic::valid(target);
        let good = FaultyValue::good(self).magnitude() ^ FaultyValue::good(target).magnitude();
        let faulty = self.faulty_frame().magnitude() ^ target.faulty_frame().magnitude();
        valid & (good | faulty) != 0
    }
}

/// Random values for `size` inputs, with the probability of a 1 given per input
///
/// Without weights, every lane of every input is even odds.
pub fn random_vector<R: Rng + ?Sized>(
    rng: &mut R,
    size: usize,
    weights: &[f64],
) -> Result<Vec<Value>> {
    if weights.is_empty() {
        return (0..size).map(|_| Value::random(rng, 0.5)).collect();
    }
    if weights.len() != size {
        return Err(Error::InputCount {
            expected: size,
            found: weights.len(),
        });
    }
    weights.iter().map(|w| Value::random(rng, *w)).collect()
}

/// Odometer-style increment over a vector of values, first element fastest
///
/// Returns true when every element wrapped, meaning the enumeration is complete.
pub fn increment_vector(values: &mut [Value]) -> bool {
    for v in values.iter_mut() {
        if !v.increment() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn value() -> impl Strategy<Value = Value> {
        (any::<u64>(), any::<u64>()).prop_map(|(m, v)| Value::new(m, v))
    }

    proptest! {
        #[test]
        fn prop_double_not(a in value()) {
            prop_assert_eq!(!!a, a);
        }

        #[test]
        fn prop_commutative(a in value(), b in value()) {
            prop_assert_eq!(a & b, b & a);
            prop_assert_eq!(a | b, b | a);
            prop_assert_eq!(a ^ b, b ^ a);
        }

        #[test]
        fn prop_associative(a in value(), b in value(), c in value()) {
            prop_assert_eq!((a & b) & c, a & (b & c));
            prop_assert_eq!((a | b) | c, a | (b | c));
        }

        #[test]
        fn prop_idempotent(a in value()) {
            prop_assert_eq!(a & a, a);
            prop_assert_eq!(a | a, a);
        }

        #[test]
        fn prop_no_effect_on_agreeing_lanes(good in value(), faulty in value()) {
            let f = FaultyValue::new(good, faulty);
            let agree = !(good.magnitude() ^ faulty.magnitude());
            prop_assert_eq!(f.faulty() & agree, 0);
            prop_assert_eq!(FaultyValue::new(good, good).faulty(), 0);
        }

        #[test]
        fn prop_increment_wraps(width in 1u32..=6, start in any::<u64>()) {
            let mut v = Value::with_width(width).unwrap();
            let start = start % (1u64 << width);
            v.set_magnitude(start).unwrap();
            let mut wraps = 0;
            for _ in 0..(1u64 << width) {
                if v.increment() {
                    wraps += 1;
                }
            }
            prop_assert_eq!(v.magnitude(), start);
            prop_assert_eq!(wraps, 1);
        }
    }

    #[test]
    fn test_increment_vector() {
        let mut values = vec![Value::with_width(1).unwrap(); 3];
        let mut count = 1;
        while !increment_vector(&mut values) {
            count += 1;
        }
        assert_eq!(count, 8);
        assert!(values.iter().all(|v| v.magnitude() == 0));
    }

    #[test]
    fn test_random_vector() {
        use rand::rngs::SmallRng;
        use rand::SeedableRng;

        let mut rng = SmallRng::seed_from_u64(3);
        let values = random_vector(&mut rng, 3, &[0.0, 1.0, 0.5]).unwrap();
        assert_eq!(values[0], Value::constant(false));
        assert_eq!(values[1], Value::constant(true));
        assert_eq!(random_vector(&mut rng, 5, &[]).unwrap().len(), 5);
        assert!(matches!(
            random_vector(&mut rng, 2, &[0.5]),
            Err(Error::InputCount {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_conflicts() {
        let one = FaultyValue::constant(true);
        assert!(FaultyValue::constant(false).conflicts(&one));
        assert!(!FaultyValue::unknown().conflicts(&one));
        assert!(FaultyValue::d().conflicts(&one));
        assert!(Value::constant(false).conflicts(&Value::constant(true)));
        assert!(!Value::unknown().conflicts(&Value::constant(true)));
    }
}
