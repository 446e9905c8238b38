use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{BitAnd, BitOr, BitXor, Not};

use rand::Rng;

use crate::error::{Error, Result};

/// Bit-parallel three-valued logic: each of the 64 lanes holds 0, 1 or X
///
/// A lane is X when its validity bit is cleared; its magnitude bit is then meaningless and never
/// takes part in comparisons. The magnitude is additionally bounded by `[min, max]`, which is
/// only relevant when the value is used as a counter with [`Value::increment`].
#[derive(Clone, Copy, Debug)]
pub struct Value {
    magnitude: u64,
    valid: u64,
    min: u64,
    max: u64,
}

impl Value {
    /// Fully unknown value (X on every lane)
    pub const fn unknown() -> Value {
        Value {
            magnitude: 0,
            valid: 0,
            min: u64::MIN,
            max: u64::MAX,
        }
    }

    /// Value with the same logic level on every lane
    pub const fn constant(value: bool) -> Value {
        Value {
            magnitude: if value { !0 } else { 0 },
            valid: !0,
            min: u64::MIN,
            max: u64::MAX,
        }
    }

    /// Value from raw magnitude and validity bits
    pub const fn new(magnitude: u64, valid: u64) -> Value {
        Value {
            magnitude,
            valid,
            min: u64::MIN,
            max: u64::MAX,
        }
    }

    /// Value with explicit magnitude bounds
    pub fn with_bounds(magnitude: u64, valid: u64, min: u64, max: u64) -> Result<Value> {
        if magnitude < min || magnitude > max {
            return Err(Error::ValueRange {
                magnitude,
                min,
                max,
            });
        }
        Ok(Value {
            magnitude,
            valid,
            min,
            max,
        })
    }

    /// Counter over `width` lanes, starting at zero, with all of them valid
    pub fn with_width(width: u32) -> Result<Value> {
        if !(1..=64).contains(&width) {
            return Err(Error::InvalidWidth(width));
        }
        let mask = if width == 64 { !0 } else { (1u64 << width) - 1 };
        Ok(Value {
            magnitude: 0,
            valid: mask,
            min: 0,
            max: mask,
        })
    }

    /// Random value, known on every lane, where each lane is 1 with probability `weight`
    pub fn random<R: Rng + ?Sized>(rng: &mut R, weight: f64) -> Result<Value> {
        if !(0.0..=1.0).contains(&weight) {
            return Err(Error::InvalidWeight(weight));
        }
        let magnitude = if weight == 0.5 {
            rng.gen::<u64>()
        } else {
            (0..64).fold(0, |acc, lane| {
                acc | (u64::from(rng.gen_bool(weight)) << lane)
            })
        };
        Ok(Value::new(magnitude, !0))
    }

    /// Magnitude bits
    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    /// Validity bits
    pub fn valid(&self) -> u64 {
        self.valid
    }

    /// Lower bound of the magnitude
    pub fn min(&self) -> u64 {
        self.min
    }

    /// Upper bound of the magnitude
    pub fn max(&self) -> u64 {
        self.max
    }

    /// Number of magnitudes between the bounds
    pub fn cardinality(&self) -> u128 {
        self.max as u128 - self.min as u128 + 1
    }

    /// Returns whether no lane is determined
    pub fn is_unknown(&self) -> bool {
        self.valid == 0
    }

    /// Set the magnitude, which must stay within the bounds
    pub fn set_magnitude(&mut self, magnitude: u64) -> Result<()> {
        if magnitude < self.min || magnitude > self.max {
            return Err(Error::ValueRange {
                magnitude,
                min: self.min,
                max: self.max,
            });
        }
        self.magnitude = magnitude;
        Ok(())
    }

    /// Set the validity bits
    pub fn set_valid(&mut self, valid: u64) {
        self.valid = valid;
    }

    /// Invert the magnitude in place and return it
    pub fn flip(&mut self) -> u64 {
        self.magnitude = !self.magnitude;
        self.magnitude
    }

    /// Step the magnitude to the next value within the bounds
    ///
    /// Returns true when the magnitude wrapped from `max` back to `min`.
    pub fn increment(&mut self) -> bool {
        if self.magnitude >= self.max {
            self.magnitude = self.min;
            true
        } else {
            self.magnitude += 1;
            false
        }
    }

    /// Single-lane display name: "0", "1" or "X"
    pub fn name(&self) -> &'static str {
        if self.valid == 0 {
            "X"
        } else if self.magnitude == 0 {
            "0"
        } else {
            "1"
        }
    }

    fn with_bits(&self, magnitude: u64, valid: u64) -> Value {
        Value {
            magnitude,
            valid,
            min: self.min,
            max: self.max,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::unknown()
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::constant(value)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.valid == other.valid
            && (self.magnitude & self.valid) == (other.magnitude & other.valid)
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.valid.hash(state);
        (self.magnitude & self.valid).hash(state);
    }
}

impl BitAnd for Value {
    type Output = Value;

    fn bitand(self, rhs: Value) -> Value {
        // A lane is known if both are known, or if either is a known 0
        let valid = (self.valid & rhs.valid)
            | (rhs.valid & !rhs.magnitude)
            | (self.valid & !self.magnitude);
        self.with_bits(self.magnitude & rhs.magnitude, valid)
    }
}

impl BitOr for Value {
    type Output = Value;

    fn bitor(self, rhs: Value) -> Value {
        // A lane is known if both are known, or if either is a known 1
        let valid =
            (self.valid & rhs.valid) | (rhs.valid & rhs.magnitude) | (self.valid & self.magnitude);
        self.with_bits(self.magnitude | rhs.magnitude, valid)
    }
}

impl BitXor for Value {
    type Output = Value;

    fn bitxor(self, rhs: Value) -> Value {
        self.with_bits(self.magnitude ^ rhs.magnitude, self.valid & rhs.valid)
    }
}

impl Not for Value {
    type Output = Value;

    fn not(self) -> Value {
        self.with_bits(!self.magnitude, self.valid)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    const X: Value = Value::unknown();
    const ZERO: Value = Value::constant(false);
    const ONE: Value = Value::constant(true);

    #[test]
    fn test_and() {
        assert_eq!(ZERO & X, ZERO);
        assert_eq!(X & ZERO, ZERO);
        assert_eq!(ONE & X, X);
        assert_eq!(ONE & ONE, ONE);
        assert_eq!(ONE & ZERO, ZERO);
        assert_eq!(X & X, X);
    }

    #[test]
    fn test_or() {
        assert_eq!(ONE | X, ONE);
        assert_eq!(X | ONE, ONE);
        assert_eq!(ZERO | X, X);
        assert_eq!(ZERO | ZERO, ZERO);
        assert_eq!(ZERO | ONE, ONE);
    }

    #[test]
    fn test_xor_not() {
        assert_eq!(ONE ^ X, X);
        assert_eq!(ONE ^ ONE, ZERO);
        assert_eq!(ONE ^ ZERO, ONE);
        assert_eq!(!ONE, ZERO);
        assert_eq!(!X, X);
    }

    #[test]
    fn test_invalid_lanes_ignored() {
        let a = Value::new(0b1010, 0b0011);
        let b = Value::new(0b0110, 0b0011);
        assert_eq!(a, b);
        assert_ne!(a, Value::new(0b1011, 0b0011));
        assert_ne!(a, Value::new(0b1010, 0b0111));
    }

    #[test]
    fn test_bounds() {
        assert!(Value::with_bounds(5, !0, 0, 3).is_err());
        let mut v = Value::with_bounds(2, !0, 1, 3).unwrap();
        assert_eq!(v.cardinality(), 3);
        assert!(matches!(
            v.set_magnitude(4),
            Err(Error::ValueRange { magnitude: 4, .. })
        ));
        v.set_magnitude(3).unwrap();
        assert!(v.increment());
        assert_eq!(v.magnitude(), 1);
        assert!(!v.increment());
        assert_eq!(v.magnitude(), 2);
    }

    #[test]
    fn test_width() {
        let v = Value::with_width(3).unwrap();
        assert_eq!(v.cardinality(), 8);
        assert_eq!(Value::with_width(64).unwrap().max(), u64::MAX);
        assert!(matches!(Value::with_width(0), Err(Error::InvalidWidth(0))));
        assert!(matches!(Value::with_width(65), Err(Error::InvalidWidth(65))));
    }

    #[test]
    fn test_random() {
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(Value::random(&mut rng, 0.0).unwrap(), ZERO);
        assert_eq!(Value::random(&mut rng, 1.0).unwrap(), ONE);
        let v = Value::random(&mut rng, 0.5).unwrap();
        assert_eq!(v.valid(), !0);
        assert!(matches!(
            Value::random(&mut rng, 1.5),
            Err(Error::InvalidWeight(_))
        ));
        assert!(Value::random(&mut rng, f64::NAN).is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!(X.name(), "X");
        assert_eq!(ZERO.name(), "0");
        assert_eq!(ONE.to_string(), "1");
        let mut v = ZERO;
        v.flip();
        assert_eq!(v, ONE);
    }
}
