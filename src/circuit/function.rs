use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::value::Logic;

/// Boolean function computed by a gate
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Function {
    /// N-ary And
    And,
    /// N-ary Nand
    Nand,
    /// N-ary Or
    Or,
    /// N-ary Nor
    Nor,
    /// N-ary Xor
    Xor,
    /// N-ary Xnor
    Xnor,
    /// Buffer
    Buf,
    /// Inverter
    Not,
}

impl Function {
    /// All supported functions
    pub const ALL: [Function; 8] = [
        Function::And,
        Function::Nand,
        Function::Or,
        Function::Nor,
        Function::Xor,
        Function::Xnor,
        Function::Buf,
        Function::Not,
    ];

    /// Evaluate the function on the given inputs
    pub fn evaluate<V: Logic>(&self, inputs: &[V]) -> V {
        use Function::*;
        match self {
            And => inputs.iter().fold(V::constant(true), |acc, v| acc & *v),
            Nand => !inputs.iter().fold(V::constant(true), |acc, v| acc & *v),
            Or => inputs.iter().fold(V::constant(false), |acc, v| acc | *v),
            Nor => !inputs.iter().fold(V::constant(false), |acc, v| acc | *v),
            Xor => inputs.iter().fold(V::constant(false), |acc, v| acc ^ *v),
            Xnor => !inputs.iter().fold(V::constant(false), |acc, v| acc ^ *v),
            Buf => inputs.first().copied().unwrap_or_else(V::unknown),
            Not => inputs.first().map(|v| !*v).unwrap_or_else(V::unknown),
        }
    }

    /// Returns whether the output is the complement of the underlying And/Or/Xor/Buf
    pub fn is_inverting(&self) -> bool {
        matches!(self, Function::Nand | Function::Nor | Function::Not)
    }

    /// Side-input value that lets a fault effect through, if the function has side inputs
    pub fn sensitizing_value(&self) -> Option<bool> {
        use Function::*;
        match self {
            And | Nand | Xor | Xnor => Some(true),
            Or | Nor => Some(false),
            Buf | Not => None,
        }
    }

    /// Number of inputs the function requires, if fixed
    pub fn arity(&self) -> Option<usize> {
        match self {
            Function::Buf | Function::Not => Some(1),
            _ => None,
        }
    }

    /// Lowercase name of the function
    pub fn name(&self) -> &'static str {
        use Function::*;
        match self {
            And => "and",
            Nand => "nand",
            Or => "or",
            Nor => "nor",
            Xor => "xor",
            Xnor => "xnor",
            Buf => "buf",
            Not => "not",
        }
    }
}

impl FromStr for Function {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Function::*;
        match s.to_lowercase().as_str() {
            "and" => Ok(And),
            "nand" => Ok(Nand),
            "or" => Ok(Or),
            "nor" => Ok(Nor),
            "xor" => Ok(Xor),
            "xnor" => Ok(Xnor),
            "buf" | "buff" | "copy" => Ok(Buf),
            "not" => Ok(Not),
            _ => Err(Error::UnknownFunction(s.to_string())),
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FaultyValue, Value};

    #[test]
    fn test_parse() {
        for f in Function::ALL {
            assert_eq!(f.name().parse::<Function>().unwrap(), f);
            assert_eq!(f.name().to_uppercase().parse::<Function>().unwrap(), f);
        }
        assert_eq!("BUFF".parse::<Function>().unwrap(), Function::Buf);
        assert!(matches!(
            "mux".parse::<Function>(),
            Err(Error::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_evaluate() {
        let zero = Value::constant(false);
        let one = Value::constant(true);
        let x = Value::unknown();
        assert_eq!(Function::And.evaluate(&[one, one, one]), one);
        assert_eq!(Function::And.evaluate(&[one, x, zero]), zero);
        assert_eq!(Function::Nand.evaluate(&[one, x]), x);
        assert_eq!(Function::Or.evaluate(&[x, one]), one);
        assert_eq!(Function::Nor.evaluate(&[zero, zero]), one);
        assert_eq!(Function::Xor.evaluate(&[one, one, one]), one);
        assert_eq!(Function::Xnor.evaluate(&[one, zero]), zero);
        assert_eq!(Function::Buf.evaluate(&[x]), x);
        assert_eq!(Function::Not.evaluate(&[zero]), one);
    }

    #[test]
    fn test_evaluate_faulty() {
        let d = FaultyValue::d();
        let one = FaultyValue::constant(true);
        let zero = FaultyValue::constant(false);
        assert_eq!(Function::Nand.evaluate(&[d, one]), FaultyValue::u());
        assert_eq!(Function::Nor.evaluate(&[d, zero]), FaultyValue::u());
        assert_eq!(Function::Xnor.evaluate(&[d, one]), d);
    }
}
