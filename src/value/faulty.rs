use std::fmt;
use std::ops::{BitAnd, BitOr, BitXor, Not};

use super::Value;

/// Five-valued logic for simultaneous good/faulty simulation
///
/// The good frame holds the fault-free value and the faulty frame the value after fault injection.
/// Every operator applies framewise. Per lane this gives 0, 1, X, D (good 1, faulty 0) and
/// U (good 0, faulty 1).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FaultyValue {
    good: Value,
    faulty: Value,
}

impl FaultyValue {
    /// Build from the two frames
    pub const fn new(good: Value, faulty: Value) -> FaultyValue {
        FaultyValue { good, faulty }
    }

    /// Unknown on both frames
    pub const fn unknown() -> FaultyValue {
        FaultyValue::new(Value::unknown(), Value::unknown())
    }

    /// Same logic level on both frames and every lane
    pub const fn constant(value: bool) -> FaultyValue {
        FaultyValue::new(Value::constant(value), Value::constant(value))
    }

    /// Good 1, faulty 0 on every lane
    pub const fn d() -> FaultyValue {
        FaultyValue::new(Value::constant(true), Value::constant(false))
    }

    /// Good 0, faulty 1 on every lane
    pub const fn u() -> FaultyValue {
        FaultyValue::new(Value::constant(false), Value::constant(true))
    }

    /// Fault-free frame
    pub fn good(&self) -> Value {
        self.good
    }

    /// Post-fault frame
    pub fn faulty_frame(&self) -> Value {
        self.faulty
    }

    /// Lanes that are known on both frames
    pub fn valid(&self) -> u64 {
        self.good.valid() & self.faulty.valid()
    }

    /// Lanes where both frames are known and disagree
    pub fn faulty(&self) -> u64 {
        self.valid() & (self.good.magnitude() ^ self.faulty.magnitude())
    }

    /// Invert both frames in place, returning the faulty magnitude
    pub fn flip(&mut self) -> u64 {
        self.good.flip();
        self.faulty.flip()
    }

    /// Step both frames, returning whether both of them wrapped
    pub fn increment(&mut self) -> bool {
        let good = self.good.increment();
        let faulty = self.faulty.increment();
        good && faulty
    }

    /// Single-lane display name
    ///
    /// Besides 0, 1, X, D and U, values known on a single frame show as "0X", "X1", ...
    pub fn name(&self) -> &'static str {
        let g_valid = self.good.valid() != 0;
        let g_mag = self.good.magnitude() != 0;
        let f_valid = self.faulty.valid() != 0;
        let f_mag = self.faulty.magnitude() != 0;
        match (g_valid, g_mag, f_valid, f_mag) {
            (false, _, false, _) => "X",
            (false, _, true, false) => "X0",
            (false, _, true, true) => "X1",
            (true, false, false, _) => "0X",
            (true, true, false, _) => "1X",
            (true, false, true, false) => "0",
            (true, false, true, true) => "U",
            (true, true, true, false) => "D",
            (true, true, true, true) => "1",
        }
    }
}

impl From<bool> for FaultyValue {
    fn from(value: bool) -> Self {
        FaultyValue::constant(value)
    }
}

impl From<Value> for FaultyValue {
    fn from(value: Value) -> Self {
        FaultyValue::new(value, value)
    }
}

impl BitAnd for FaultyValue {
    type Output = FaultyValue;

    fn bitand(self, rhs: FaultyValue) -> FaultyValue {
        FaultyValue::new(self.good & rhs.good, self.faulty & rhs.faulty)
    }
}

impl BitOr for FaultyValue {
    type Output = FaultyValue;

    fn bitor(self, rhs: FaultyValue) -> FaultyValue {
        FaultyValue::new(self.good | rhs.good, self.faulty | rhs.faulty)
    }
}

impl BitXor for FaultyValue {
    type Output = FaultyValue;

    fn bitxor(self, rhs: FaultyValue) -> FaultyValue {
        FaultyValue::new(self.good ^ rhs.good, self.faulty ^ rhs.faulty)
    }
}

impl Not for FaultyValue {
    type Output = FaultyValue;

    fn not(self) -> FaultyValue {
        FaultyValue::new(!self.good, !self.faulty)
    }
}

impl fmt::Display for FaultyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: FaultyValue = FaultyValue::unknown();
    const ZERO: FaultyValue = FaultyValue::constant(false);
    const ONE: FaultyValue = FaultyValue::constant(true);
    const D: FaultyValue = FaultyValue::d();
    const U: FaultyValue = FaultyValue::u();

    /// Compare on composite validity, so that a value known on a single frame reads as X
    fn same(a: FaultyValue, b: FaultyValue) -> bool {
        let valid = a.valid();
        valid == b.valid()
            && (a.good().magnitude() & valid) == (b.good().magnitude() & valid)
            && (a.faulty_frame().magnitude() & valid) == (b.faulty_frame().magnitude() & valid)
    }

    #[test]
    fn test_and_table() {
        assert!(same(ZERO & D, ZERO));
        assert!(same(U & ZERO, ZERO));
        assert!(same(ONE & ONE, ONE));
        assert!(same(D & D, D));
        assert!(same(D & U, ZERO));
        assert!(same(U & U, U));
        assert!(same(D & X, X));
        assert!(same(U & X, X));
        assert!(same(X & X, X));
        assert!(same(ONE & D, D));
    }

    #[test]
    fn test_or_table() {
        assert!(same(ONE | D, ONE));
        assert!(same(U | ONE, ONE));
        assert!(same(ZERO | ZERO, ZERO));
        assert!(same(D | D, D));
        assert!(same(D | U, ONE));
        assert!(same(U | U, U));
        assert!(same(D | X, X));
        assert!(same(U | X, X));
        assert!(same(ZERO | U, U));
    }

    #[test]
    fn test_xor_not_table() {
        assert!(same(D ^ D, ZERO));
        assert!(same(D ^ U, ONE));
        assert!(same(U ^ U, ZERO));
        assert!(same(ONE ^ X, X));
        assert!(same(D ^ X, X));
        assert!(same(!ZERO, ONE));
        assert!(same(!D, U));
        assert!(same(!U, D));
        assert!(same(!X, X));
    }

    #[test]
    fn test_faulty_mask() {
        assert_eq!(D.faulty(), !0);
        assert_eq!(U.faulty(), !0);
        assert_eq!(ONE.faulty(), 0);
        assert_eq!(X.faulty(), 0);
        let half = FaultyValue::new(Value::unknown(), Value::constant(true));
        assert_eq!(half.valid(), 0);
        assert_eq!(half.faulty(), 0);
    }

    #[test]
    fn test_increment() {
        let counter = Value::with_width(1).unwrap();
        let mut v = FaultyValue::new(counter, counter);
        assert!(!v.increment());
        assert!(v.increment());
        assert_eq!(v.good().magnitude(), 0);

        // Only the good frame wraps
        let mut top = counter;
        top.increment();
        let mut v = FaultyValue::new(top, counter);
        assert!(!v.increment());
        assert_eq!(v.good().magnitude(), 0);
        assert_eq!(v.faulty_frame().magnitude(), 1);
    }

    #[test]
    fn test_names() {
        assert_eq!(D.name(), "D");
        assert_eq!(U.name(), "U");
        assert_eq!(ZERO.name(), "0");
        assert_eq!(ONE.name(), "1");
        assert_eq!(X.name(), "X");
        assert_eq!(
            FaultyValue::new(Value::unknown(), Value::constant(false)).name(),
            "X0"
        );
        assert_eq!(
            FaultyValue::new(Value::constant(true), Value::unknown()).to_string(),
            "1X"
        );
    }
}
