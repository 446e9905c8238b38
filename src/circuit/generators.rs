//! Circuit generators and templates

/// Small circuits to test functionality
pub mod testcases {
    use crate::circuit::{Circuit, Function, ObjId};
    use crate::error::Result;
    use crate::value::Logic;

    /// A single And gate driving a primary output, without lines
    ///
    /// Returns the circuit and the handles of the inputs `a` and `b`, the gate `g` and the output `po`.
    pub fn and_gate<V: Logic>() -> Result<(Circuit<V>, [ObjId; 4])> {
        let mut ret = Circuit::new();
        let a = ret.add_input("a");
        let b = ret.add_input("b");
        let g = ret.add_gate("g", Function::And);
        let po = ret.add_output("po");
        ret.connect(a, g);
        ret.connect(b, g);
        ret.connect(g, po);
        ret.levelize()?;
        Ok((ret, [a, b, g, po]))
    }

    /// A chain of inverters from a single input to a single output
    pub fn inverter_chain<V: Logic>(len: usize) -> Result<Circuit<V>> {
        let mut ret = Circuit::new();
        let mut x = ret.add_input("i");
        for i in 0..len {
            let g = ret.add_gate(&format!("n{i}"), Function::Not);
            let name = ret.name(x).to_string();
            ret.add_net(&name, x, &[g]);
            x = g;
        }
        let po = ret.add_output("o");
        ret.add_net("o", x, &[po]);
        ret.levelize()?;
        Ok(ret)
    }

    /// The ISCAS-85 c17 benchmark: 5 inputs, 2 outputs and 6 Nand gates
    pub fn c17<V: Logic>() -> Result<Circuit<V>> {
        let mut ret = Circuit::new();
        let inputs: Vec<ObjId> = ["1", "2", "3", "6", "7"]
            .iter()
            .map(|n| ret.add_input(n))
            .collect();
        let gates: Vec<ObjId> = ["10", "11", "16", "19", "22", "23"]
            .iter()
            .map(|n| ret.add_gate(n, Function::Nand))
            .collect();
        let o22 = ret.add_output("22_po");
        let o23 = ret.add_output("23_po");
        let (i1, i2, i3, i6, i7) = (inputs[0], inputs[1], inputs[2], inputs[3], inputs[4]);
        let (g10, g11, g16, g19, g22, g23) =
            (gates[0], gates[1], gates[2], gates[3], gates[4], gates[5]);
        ret.add_net("1", i1, &[g10]);
        ret.add_net("2", i2, &[g16]);
        ret.add_net("3", i3, &[g10, g11]);
        ret.add_net("6", i6, &[g11]);
        ret.add_net("7", i7, &[g19]);
        ret.add_net("10", g10, &[g22]);
        ret.add_net("11", g11, &[g16, g19]);
        ret.add_net("16", g16, &[g22, g23]);
        ret.add_net("19", g19, &[g23]);
        ret.add_net("22", g22, &[o22]);
        ret.add_net("23", g23, &[o23]);
        ret.levelize()?;
        Ok(ret)
    }
}

#[cfg(test)]
mod tests {
    use super::testcases;
    use crate::circuit::Role;
    use crate::Value;

    #[test]
    fn test_and_gate() {
        let (c, [a, b, g, po]) = testcases::and_gate::<Value>().unwrap();
        assert_eq!(c.fanin(g), &[a, b]);
        assert_eq!(c.level(po), 2);
        assert!(c.value(g).is_unknown());
    }

    #[test]
    fn test_c17() {
        let c = testcases::c17::<Value>().unwrap();
        assert_eq!(c.nb_inputs(), 5);
        assert_eq!(c.nb_outputs(), 2);
        let nb_lines = c.ids().filter(|i| c.role(*i) == Role::Line).count();
        // 11 stems, plus 2 branches for each of 3, 11 and 16
        assert_eq!(nb_lines, 17);
        // Input, stem, branch, Nand, ... three gates deep
        assert_eq!(c.depth(), 11);
    }

    #[test]
    fn test_inverter_chain() {
        let c = testcases::inverter_chain::<Value>(3).unwrap();
        assert_eq!(c.nb_objects(), 1 + 3 + 4 + 1);
        assert_eq!(c.depth(), 8);
    }
}
