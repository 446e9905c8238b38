//! IO for .bench (ISCAS) files

use std::io::{BufRead, BufReader, Read};
use std::str::FromStr;

use fxhash::FxHashMap;

use crate::circuit::{Circuit, Function, ObjId};
use crate::error::{Error, Result};
use crate::value::Logic;

/// A `name = FUNCTION(deps)` statement, with its line number
struct Statement {
    line: usize,
    name: String,
    function: String,
    deps: Vec<String>,
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        line,
        message: message.into(),
    }
}

fn is_constant_keyword(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "vdd" => Some(true),
        "gnd" | "vss" => Some(false),
        _ => None,
    }
}

/// Statements of a .bench file, with the declared inputs and outputs
#[derive(Default)]
struct BenchFile {
    inputs: Vec<(usize, String)>,
    outputs: Vec<(usize, String)>,
    statements: Vec<Statement>,
}

impl BenchFile {
    fn parse<R: Read>(r: R) -> Result<BenchFile> {
        let mut ret = BenchFile::default();
        for (i, l) in BufReader::new(r).lines().enumerate() {
            let line = i + 1;
            let s = l?;
            let t = s.trim();
            if t.is_empty() || t.starts_with('#') {
                continue;
            }
            if !t.contains('=') {
                let parts: Vec<_> = t
                    .split(['(', ')'])
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .collect();
                if parts.len() != 2 {
                    return Err(parse_error(line, format!("malformed declaration {t}")));
                }
                match parts[0].to_uppercase().as_str() {
                    "INPUT" | "PINPUT" => ret.inputs.push((line, parts[1].to_string())),
                    "OUTPUT" | "POUTPUT" => ret.outputs.push((line, parts[1].to_string())),
                    _ => return Err(parse_error(line, format!("unknown keyword {}", parts[0]))),
                }
            } else {
                let mut parts = t
                    .split(['=', '(', ',', ')'])
                    .map(|s| s.trim().to_owned())
                    .filter(|s| !s.is_empty());
                let (Some(name), Some(function)) = (parts.next(), parts.next()) else {
                    return Err(parse_error(line, format!("malformed statement {t}")));
                };
                ret.statements.push(Statement {
                    line,
                    name,
                    function,
                    deps: parts.collect(),
                });
            }
        }
        Ok(ret)
    }

    /// Create the nodes, and return the driver of each signal in definition order
    fn create_nodes<V: Logic>(
        &self,
        circuit: &mut Circuit<V>,
    ) -> Result<(Vec<String>, FxHashMap<String, ObjId>)> {
        let mut order = Vec::new();
        let mut drivers = FxHashMap::default();
        let mut define = |name: &str, id: ObjId, line: usize| {
            if drivers.insert(name.to_string(), id).is_some() {
                return Err(parse_error(line, format!("{name} is defined twice")));
            }
            order.push(name.to_string());
            Ok(())
        };
        for (line, name) in &self.inputs {
            let id = circuit.add_input(name);
            define(name, id, *line)?;
        }
        for s in &self.statements {
            let id = match is_constant_keyword(&s.function) {
                Some(b) if s.deps.is_empty() => circuit.add_constant(&s.name, b),
                _ => {
                    let f = Function::from_str(&s.function)
                        .map_err(|e| parse_error(s.line, e.to_string()))?;
                    if s.deps.is_empty() {
                        return Err(parse_error(s.line, format!("{} has no input", s.name)));
                    }
                    if f.arity().is_some_and(|a| a != s.deps.len()) {
                        return Err(parse_error(
                            s.line,
                            format!("{} takes a single input", f.name()),
                        ));
                    }
                    circuit.add_gate(&s.name, f)
                }
            };
            define(&s.name, id, s.line)?;
        }
        Ok((order, drivers))
    }
}

/// Read a circuit in .bench format, as used by the ISCAS benchmarks
///
/// These files describe the design with simple statements like:
/// ```text
///     # This is a comment
///     INPUT(i0)
///     INPUT(i1)
///     x0 = AND(i0, i1)
///     x1 = NAND(x0, i1)
///     x2 = OR(x0, i0)
///     x3 = NOR(i0, x1)
///     x4 = XOR(x3, x2)
///     x5 = BUF(x4)
///     x6 = NOT(x5)
///     x7 = gnd
///     x8 = vdd
///     OUTPUT(x0)
/// ```
///
/// Each signal gets a stem line named `<signal>_line`, and one branch line `<signal>_b<i>` per
/// sink when it drives several. Primary outputs are separate nodes named `<signal>_po`.
pub fn read_bench<V: Logic, R: Read>(r: R) -> Result<Circuit<V>> {
    let file = BenchFile::parse(r)?;
    let mut ret = Circuit::new();
    let (mut order, mut drivers) = file.create_nodes(&mut ret)?;

    // Sinks of each signal, in the order the gates and outputs use them
    let mut sinks: FxHashMap<String, Vec<ObjId>> = FxHashMap::default();
    let mut uses: Vec<(usize, &str, ObjId)> = Vec::new();
    for s in &file.statements {
        let gate = drivers[&s.name];
        for d in &s.deps {
            uses.push((s.line, d.as_str(), gate));
        }
    }
    for (line, name) in &file.outputs {
        let po = ret.add_output(&format!("{name}_po"));
        uses.push((*line, name.as_str(), po));
    }
    for (line, name, sink) in &uses {
        if !drivers.contains_key(*name) {
            // ABC-style naming for constant signals
            match is_constant_keyword(name) {
                Some(b) => {
                    let id = ret.add_constant(name, b);
                    drivers.insert(name.to_string(), id);
                    order.push(name.to_string());
                }
                None => {
                    return Err(parse_error(
                        *line,
                        format!("{name} is not generated anywhere"),
                    ))
                }
            }
        }
        sinks.entry(name.to_string()).or_default().push(*sink);
    }

    // Stem and branch lines
    let mut lines: FxHashMap<String, std::vec::IntoIter<ObjId>> = FxHashMap::default();
    for name in &order {
        let Some(s) = sinks.get(name) else {
            continue;
        };
        let stem = ret.add_line(&format!("{name}_line"));
        ret.connect(drivers[name], stem);
        let mut l = vec![stem];
        if s.len() > 1 {
            l = (0..s.len())
                .map(|i| {
                    let branch = ret.add_line(&format!("{name}_b{i}"));
                    ret.connect(stem, branch);
                    branch
                })
                .collect();
        }
        lines.insert(name.clone(), l.into_iter());
    }

    // Connect the sinks, preserving the input order of each gate
    for (line, name, sink) in &uses {
        let Some(l) = lines.get_mut(*name).and_then(|it| it.next()) else {
            return Err(parse_error(*line, format!("no line left for {name}")));
        };
        ret.connect(l, *sink);
    }

    ret.levelize()?;
    Ok(ret)
}
