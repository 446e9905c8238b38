use std::fmt;

use fxhash::FxHashMap;
use itertools::Itertools;

use crate::circuit::function::Function;
use crate::error::{Error, Result};
use crate::value::{Logic, Value};

/// Stable handle to a node or line of a [`Circuit`]
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ObjId(u32);

impl ObjId {
    /// Position of the object in the circuit
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> ObjId {
        ObjId(index as u32)
    }
}

impl fmt::Display for ObjId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an object does in the circuit
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Role {
    /// Primary input, driven by stimulus only
    Input,
    /// Primary output, copying its driver
    Output,
    /// Constant driver
    Constant(bool),
    /// Logic gate
    Gate(Function),
    /// Wire copying its driver; stems and fanout branches are lines
    Line,
    /// Pseudo-node observing a set of lines for a target combination
    Watch,
}

impl Role {
    /// Short name of the role
    pub fn name(&self) -> &'static str {
        match self {
            Role::Input => "pi",
            Role::Output => "po",
            Role::Constant(_) => "const",
            Role::Gate(f) => f.name(),
            Role::Line => "line",
            Role::Watch => "watch",
        }
    }
}

/// Id of a fault registered in a circuit
pub(crate) type FaultId = usize;

#[derive(Clone, Copy, Debug)]
pub(crate) struct FaultRecord {
    pub(crate) location: ObjId,
    pub(crate) stuck: bool,
}

#[derive(Clone, Debug)]
struct Object<V> {
    name: String,
    role: Role,
    level: usize,
    inputs: Vec<ObjId>,
    outputs: Vec<ObjId>,
    value: V,
    faults: Vec<FaultId>,
    active_fault: Option<FaultId>,
}

/// Leveled gate-level circuit, owning all its nodes and lines
///
/// Objects live in an arena and are addressed by [`ObjId`]. Each object holds its current value.
/// Values only change through [`Circuit::fire`], so that the event queue sees every change.
#[derive(Clone, Debug)]
pub struct Circuit<V> {
    objects: Vec<Object<V>>,
    inputs: Vec<ObjId>,
    outputs: Vec<ObjId>,
    names: FxHashMap<String, ObjId>,
    watch_targets: FxHashMap<ObjId, Vec<V>>,
    faults: Vec<Option<FaultRecord>>,
}

impl<V: Logic> Default for Circuit<V> {
    fn default() -> Self {
        Circuit {
            objects: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            names: FxHashMap::default(),
            watch_targets: FxHashMap::default(),
            faults: Vec::new(),
        }
    }
}

impl<V: Logic> Circuit<V> {
    /// Create a new empty circuit
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the number of objects, nodes and lines alike
    pub fn nb_objects(&self) -> usize {
        self.objects.len()
    }

    /// Return the number of primary inputs
    pub fn nb_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Return the number of primary outputs
    pub fn nb_outputs(&self) -> usize {
        self.outputs.len()
    }

    /// Primary inputs, in creation order
    pub fn inputs(&self) -> &[ObjId] {
        &self.inputs
    }

    /// Primary outputs, in creation order
    pub fn outputs(&self) -> &[ObjId] {
        &self.outputs
    }

    /// All object handles
    pub fn ids(&self) -> impl Iterator<Item = ObjId> {
        (0..self.nb_objects()).map(ObjId::from_index)
    }

    /// Look up an object by name
    pub fn find(&self, name: &str) -> Option<ObjId> {
        self.names.get(name).copied()
    }

    /// Name of an object
    pub fn name(&self, id: ObjId) -> &str {
        &self.objects[id.index()].name
    }

    /// Role of an object
    pub fn role(&self, id: ObjId) -> Role {
        self.objects[id.index()].role
    }

    /// Level of an object, as computed by [`Circuit::levelize`]
    pub fn level(&self, id: ObjId) -> usize {
        self.objects[id.index()].level
    }

    /// Drivers of an object
    pub fn fanin(&self, id: ObjId) -> &[ObjId] {
        &self.objects[id.index()].inputs
    }

    /// Objects driven by an object, including watch nodes
    pub fn fanout(&self, id: ObjId) -> &[ObjId] {
        &self.objects[id.index()].outputs
    }

    /// Current value of an object, as seen by its fanout
    ///
    /// If a fault is active on the object, its faulty frame is replaced by the stuck value.
    pub fn value(&self, id: ObjId) -> V {
        let obj = &self.objects[id.index()];
        match obj.active_fault.and_then(|f| self.faults[f]) {
            Some(record) => obj.value.with_fault(Value::constant(record.stuck)),
            None => obj.value,
        }
    }

    /// Value of an object ignoring any active fault
    pub fn nominal(&self, id: ObjId) -> V {
        self.objects[id.index()].value
    }

    /// Depth of the circuit: maximum level of a primary output
    pub fn depth(&self) -> usize {
        self.outputs.iter().map(|o| self.level(*o)).max().unwrap_or(0)
    }

    fn add_object(&mut self, name: &str, role: Role) -> ObjId {
        let id = ObjId::from_index(self.objects.len());
        self.objects.push(Object {
            name: name.to_string(),
            role,
            level: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
            value: V::unknown(),
            faults: Vec::new(),
            active_fault: None,
        });
        self.names.entry(name.to_string()).or_insert(id);
        id
    }

    /// Add a new primary input
    pub fn add_input(&mut self, name: &str) -> ObjId {
        let id = self.add_object(name, Role::Input);
        self.inputs.push(id);
        id
    }

    /// Add a new primary output; it must be connected to a driver
    pub fn add_output(&mut self, name: &str) -> ObjId {
        let id = self.add_object(name, Role::Output);
        self.outputs.push(id);
        id
    }

    /// Add a constant driver
    pub fn add_constant(&mut self, name: &str, value: bool) -> ObjId {
        let id = self.add_object(name, Role::Constant(value));
        self.objects[id.index()].value = V::constant(value);
        id
    }

    /// Add a gate; its inputs are added with [`Circuit::connect`]
    pub fn add_gate(&mut self, name: &str, function: Function) -> ObjId {
        self.add_object(name, Role::Gate(function))
    }

    /// Add a line; its driver is set with [`Circuit::connect`]
    pub fn add_line(&mut self, name: &str) -> ObjId {
        self.add_object(name, Role::Line)
    }

    /// Add an edge from `from` to `to`
    ///
    /// Levels are not updated: call [`Circuit::levelize`] once the structure is complete.
    pub fn connect(&mut self, from: ObjId, to: ObjId) {
        self.objects[from.index()].outputs.push(to);
        self.objects[to.index()].inputs.push(from);
    }

    /// Add a line between a driver and a gate
    pub fn connect_through_line(&mut self, from: ObjId, to: ObjId, name: &str) -> ObjId {
        let line = self.add_line(name);
        self.connect(from, line);
        self.connect(line, to);
        line
    }

    /// Wire a driver to its sinks: a stem line, then one branch line per sink if there are several
    ///
    /// Returns the stem line followed by the branch lines.
    pub fn add_net(&mut self, name: &str, driver: ObjId, sinks: &[ObjId]) -> Vec<ObjId> {
        let stem = self.add_line(&format!("{name}_line"));
        self.connect(driver, stem);
        let mut ret = vec![stem];
        if sinks.len() == 1 {
            self.connect(stem, sinks[0]);
        } else {
            for (i, sink) in sinks.iter().enumerate() {
                let branch = self.connect_through_line(stem, *sink, &format!("{name}_b{i}"));
                ret.push(branch);
            }
        }
        ret
    }

    /// Compute the level of every object
    ///
    /// Inputs, constants and watch nodes without input are at level 0; every other object is one
    /// level above its highest driver. Values driven by constants are then propagated.
    pub fn levelize(&mut self) -> Result<()> {
        for obj in &self.objects {
            let needs_driver = matches!(obj.role, Role::Gate(_) | Role::Line | Role::Output);
            if needs_driver && obj.inputs.is_empty() {
                return Err(Error::MissingDriver {
                    name: obj.name.clone(),
                });
            }
        }

        // Kahn's algorithm, counting unvisited drivers
        let mut count_deps: Vec<usize> = self.objects.iter().map(|o| o.inputs.len()).collect();
        let mut to_visit: Vec<usize> = (0..self.nb_objects())
            .filter(|i| count_deps[*i] == 0)
            .collect();
        let mut nb_visited = 0;
        while let Some(i) = to_visit.pop() {
            nb_visited += 1;
            let level = self.objects[i]
                .inputs
                .iter()
                .map(|d| self.objects[d.index()].level + 1)
                .max()
                .unwrap_or(0);
            self.objects[i].level = level;
            for o in self.objects[i].outputs.clone() {
                count_deps[o.index()] -= 1;
                if count_deps[o.index()] == 0 {
                    to_visit.push(o.index());
                }
            }
        }

        if nb_visited != self.nb_objects() {
            let culprit = (0..self.nb_objects())
                .find(|i| count_deps[*i] != 0)
                .map(|i| self.objects[i].name.clone())
                .unwrap_or_default();
            return Err(Error::CombinationalLoop { name: culprit });
        }
        self.settle();
        Ok(())
    }

    /// Set every input back to X, and recompute the other values without firing
    ///
    /// Objects driven by constants get their constant value, everything else is X.
    pub fn reset(&mut self) {
        for obj in self.objects.iter_mut() {
            obj.value = match obj.role {
                Role::Constant(b) => V::constant(b),
                _ => V::unknown(),
            };
        }
        self.settle();
    }

    /// Add a watch node observing `lines` for the `targets` values
    ///
    /// The node is placed one level above its highest line and checked immediately.
    pub(crate) fn add_watch(&mut self, name: &str, lines: &[ObjId], targets: Vec<V>) -> ObjId {
        let id = self.add_object(name, Role::Watch);
        let level = lines.iter().map(|l| self.level(*l) + 1).max().unwrap_or(0);
        self.objects[id.index()].level = level;
        for l in lines {
            self.connect(*l, id);
        }
        self.watch_targets.insert(id, targets);
        self.check_watch(id);
        id
    }

    /// Returns whether the watch node has observed its target combination
    pub(crate) fn is_watch_latched(&self, id: ObjId) -> bool {
        self.fanin(id).is_empty()
    }

    /// Disconnect a watch node from the lines it observes
    pub(crate) fn detach_watch(&mut self, id: ObjId) {
        let lines = std::mem::take(&mut self.objects[id.index()].inputs);
        for l in lines {
            self.objects[l.index()].outputs.retain(|o| *o != id);
        }
    }

    /// Latch the watch node if all observed lines hold their target
    pub(crate) fn check_watch(&mut self, id: ObjId) {
        let Some(targets) = self.watch_targets.get(&id) else {
            return;
        };
        let inputs = self.fanin(id);
        if inputs.is_empty() {
            return;
        }
        let matched = inputs
            .iter()
            .zip(targets.iter())
            .all(|(l, t)| self.value(*l) == *t);
        if matched {
            self.detach_watch(id);
        }
    }

    /// Replace the nominal value of an object
    pub(crate) fn set_nominal(&mut self, id: ObjId, value: V) {
        self.objects[id.index()].value = value;
    }

    /// Register a fault at a location
    pub(crate) fn register_fault(&mut self, location: ObjId, stuck: bool) -> FaultId {
        let id = self.faults.len();
        self.faults.push(Some(FaultRecord { location, stuck }));
        self.objects[location.index()].faults.push(id);
        id
    }

    /// Unregister a fault; the caller checks it is inactive
    pub(crate) fn unregister_fault(&mut self, id: FaultId) {
        if let Some(record) = self.faults.get_mut(id).and_then(|r| r.take()) {
            self.objects[record.location.index()]
                .faults
                .retain(|f| *f != id);
        }
    }

    /// Registered fault, if it exists
    pub(crate) fn fault_record(&self, id: FaultId) -> Option<FaultRecord> {
        self.faults.get(id).copied().flatten()
    }

    /// Faults registered at a location
    pub(crate) fn faults_at(&self, location: ObjId) -> &[FaultId] {
        &self.objects[location.index()].faults
    }

    /// Fault currently active at a location
    pub(crate) fn active_fault(&self, location: ObjId) -> Option<FaultId> {
        self.objects[location.index()].active_fault
    }

    pub(crate) fn set_active_fault(&mut self, location: ObjId, fault: Option<FaultId>) {
        self.objects[location.index()].active_fault = fault;
    }
}

impl<V: Logic> fmt::Display for Circuit<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit with {} inputs, {} outputs, {} objects:",
            self.nb_inputs(),
            self.nb_outputs(),
            self.nb_objects()
        )?;
        for id in self.ids() {
            let deps = self.fanin(id).iter().map(|d| self.name(*d)).join(", ");
            writeln!(
                f,
                "\t{} = {}({}) @{} : {}",
                self.name(id),
                self.role(id).name(),
                deps,
                self.level(id),
                self.value(id)
            )?;
        }
        Ok(())
    }
}
