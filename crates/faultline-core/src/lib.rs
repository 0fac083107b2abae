//! # faultline-core: Network Model for Short-Circuit Studies
//!
//! Provides the network data structures consumed by the fault-current engine
//! in `faultline-algo`.
//!
//! ## Design Philosophy
//!
//! Networks are modeled as **undirected multigraphs** where:
//! - **Nodes**: Buses, Generators, Loads, Shunts
//! - **Edges**: Lines and two-winding transformers
//!
//! Generators, loads and shunts are stored as unconnected nodes that reference
//! their bus by id. Three-winding transformers join three buses, so they live
//! in a side table on [`Network`] rather than in the graph.
//!
//! Impedances are stored in physical units (ohms, siemens, kV, MVA), the way
//! they appear on nameplates and in the IEC 60909 examples. Conversion to
//! per-unit on the 100 MVA base happens in the engine.
//!
//! The pre-fault operating point (voltage magnitude and angle of every bus)
//! comes from an external power flow and is stored on [`Bus`].
//!
//! ## Quick Start
//!
//! ```rust
//! use faultline_core::*;
//!
//! let mut network = Network::new();
//! network.add_bus(Bus::new(BusId::new(1), "B1", Kilovolts(20.0)));
//! network.add_bus(Bus::new(BusId::new(2), "B2", Kilovolts(20.0)));
//!
//! network
//!     .add_line(Line::new(LineId::new(1), "L1", BusId::new(1), BusId::new(2), 0.5, 2.0))
//!     .unwrap();
//! network
//!     .add_generator(Generator::new(
//!         GenId::new(1),
//!         "G1",
//!         BusId::new(1),
//!         GeneratorShortCircuit::with_impedance(0.1, 4.0),
//!     ))
//!     .unwrap();
//!
//! assert_eq!(network.stats().num_buses, 2);
//! ```
//!
//! ## Modules
//!
//! - [`short_circuit`] - Zero-sequence, grounding and machine data per equipment
//! - [`diagnostics`] - Non-fatal issues collected during validation and runs
//! - [`graph_utils`] - Island detection
//! - [`units`] - Unit newtypes

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod short_circuit;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{ScError, ScResult};
pub use graph_utils::{find_islands, Island, IslandAnalysis};
pub use petgraph::graph::NodeIndex;
pub use short_circuit::{
    AsynchronousMotor, FeederInfeed, GeneratorKind, GeneratorShortCircuit, GroundImpedance,
    LegShortCircuit, LineShortCircuit, TransformerShortCircuit, WindingConnection,
};
pub use units::{
    Degrees, Kiloamperes, Kilovolts, MegavoltAmperes, Megavars, Megawatts, Ohms, PerUnit, Radians,
};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(usize);

        impl $name {
            #[inline]
            pub fn new(value: usize) -> Self {
                $name(value)
            }
            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }
    };
}

define_id!(BusId);
define_id!(LineId);
define_id!(TransformerId);
define_id!(
    /// Id of a three-winding transformer
    ThreeWindingTransformerId
);
define_id!(GenId);
define_id!(LoadId);
define_id!(ShuntId);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    pub nominal_kv: Kilovolts,
    /// Pre-fault voltage magnitude in per-unit of the nominal voltage
    #[serde(default = "default_voltage")]
    pub voltage_pu: PerUnit,
    /// Pre-fault voltage angle
    #[serde(default)]
    pub angle_rad: Radians,
}

fn default_voltage() -> PerUnit {
    PerUnit(1.0)
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            id: BusId(0),
            name: String::new(),
            nominal_kv: Kilovolts(0.0),
            voltage_pu: PerUnit(1.0),
            angle_rad: Radians(0.0),
        }
    }
}

impl Bus {
    pub fn new(id: BusId, name: impl Into<String>, nominal_kv: Kilovolts) -> Self {
        Self {
            id,
            name: name.into(),
            nominal_kv,
            ..Self::default()
        }
    }

    /// Set the pre-fault operating point from a power flow solution.
    pub fn with_operating_point(mut self, voltage_pu: f64, angle_rad: f64) -> Self {
        self.voltage_pu = PerUnit(voltage_pu);
        self.angle_rad = Radians(angle_rad);
        self
    }
}

/// AC line. `r`/`x` in ohms, shunt `g`/`b` in siemens at each end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub name: String,
    pub bus1: BusId,
    pub bus2: BusId,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub g1: f64,
    #[serde(default)]
    pub b1: f64,
    #[serde(default)]
    pub g2: f64,
    #[serde(default)]
    pub b2: f64,
    #[serde(default = "default_in_service")]
    pub in_service: bool,
    #[serde(default)]
    pub short_circuit: Option<LineShortCircuit>,
}

fn default_in_service() -> bool {
    true
}

impl Line {
    pub fn new(
        id: LineId,
        name: impl Into<String>,
        bus1: BusId,
        bus2: BusId,
        r: f64,
        x: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            bus1,
            bus2,
            r,
            x,
            g1: 0.0,
            b1: 0.0,
            g2: 0.0,
            b2: 0.0,
            in_service: true,
            short_circuit: None,
        }
    }

    /// Charging susceptance split equally between both ends.
    pub fn with_charging(mut self, b_total: f64) -> Self {
        self.b1 = b_total / 2.0;
        self.b2 = b_total / 2.0;
        self
    }

    pub fn with_short_circuit(mut self, data: LineShortCircuit) -> Self {
        self.short_circuit = Some(data);
        self
    }
}

/// Two-winding transformer.
///
/// `r`/`x` are in ohms and the magnetizing `g`/`b` in siemens, all referred to
/// side 2. The ideal ratio is `rated_u2 / rated_u1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwoWindingTransformer {
    pub id: TransformerId,
    pub name: String,
    pub bus1: BusId,
    pub bus2: BusId,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
    pub rated_u1: Kilovolts,
    pub rated_u2: Kilovolts,
    #[serde(default)]
    pub rated_s: Option<MegavoltAmperes>,
    #[serde(default)]
    pub phase_shift: Degrees,
    #[serde(default = "default_in_service")]
    pub in_service: bool,
    #[serde(default)]
    pub short_circuit: Option<TransformerShortCircuit>,
}

impl TwoWindingTransformer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TransformerId,
        name: impl Into<String>,
        bus1: BusId,
        bus2: BusId,
        rated_u1: Kilovolts,
        rated_u2: Kilovolts,
        r: f64,
        x: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            bus1,
            bus2,
            r,
            x,
            g: 0.0,
            b: 0.0,
            rated_u1,
            rated_u2,
            rated_s: None,
            phase_shift: Degrees(0.0),
            in_service: true,
            short_circuit: None,
        }
    }

    pub fn with_rated_s(mut self, rated_s: MegavoltAmperes) -> Self {
        self.rated_s = Some(rated_s);
        self
    }

    pub fn with_phase_shift(mut self, shift: Degrees) -> Self {
        self.phase_shift = shift;
        self
    }

    pub fn with_short_circuit(mut self, data: TransformerShortCircuit) -> Self {
        self.short_circuit = Some(data);
        self
    }
}

/// One winding of a three-winding transformer, modeled as a branch between
/// its bus and the star point. Impedances are in ohms referred to `rated_u0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerLeg {
    pub bus: BusId,
    pub r: f64,
    pub x: f64,
    #[serde(default)]
    pub g: f64,
    #[serde(default)]
    pub b: f64,
    pub rated_u: Kilovolts,
    #[serde(default)]
    pub rated_s: Option<MegavoltAmperes>,
    pub short_circuit: LegShortCircuit,
}

impl TransformerLeg {
    pub fn new(bus: BusId, rated_u: Kilovolts, r: f64, x: f64, short_circuit: LegShortCircuit) -> Self {
        Self {
            bus,
            r,
            x,
            g: 0.0,
            b: 0.0,
            rated_u,
            rated_s: None,
            short_circuit,
        }
    }

    pub fn with_rated_s(mut self, rated_s: MegavoltAmperes) -> Self {
        self.rated_s = Some(rated_s);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreeWindingTransformer {
    pub id: ThreeWindingTransformerId,
    pub name: String,
    /// Rated voltage of the star point
    pub rated_u0: Kilovolts,
    pub legs: [TransformerLeg; 3],
    #[serde(default = "default_in_service")]
    pub in_service: bool,
}

impl ThreeWindingTransformer {
    pub fn new(
        id: ThreeWindingTransformerId,
        name: impl Into<String>,
        rated_u0: Kilovolts,
        legs: [TransformerLeg; 3],
    ) -> Self {
        Self {
            id,
            name: name.into(),
            rated_u0,
            legs,
            in_service: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generator {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    #[serde(default = "default_in_service")]
    pub in_service: bool,
    #[serde(default)]
    pub short_circuit: GeneratorShortCircuit,
}

impl Generator {
    pub fn new(
        id: GenId,
        name: impl Into<String>,
        bus: BusId,
        short_circuit: GeneratorShortCircuit,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            in_service: true,
            short_circuit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: BusId,
    pub active_power: Megawatts,
    pub reactive_power: Megavars,
    /// Present when the load is an asynchronous motor contributing to faults
    #[serde(default)]
    pub motor: Option<AsynchronousMotor>,
}

impl Load {
    pub fn new(id: LoadId, name: impl Into<String>, bus: BusId, p_mw: f64, q_mvar: f64) -> Self {
        Self {
            id,
            name: name.into(),
            bus,
            active_power: Megawatts(p_mw),
            reactive_power: Megavars(q_mvar),
            motor: None,
        }
    }

    pub fn with_motor(mut self, motor: AsynchronousMotor) -> Self {
        self.motor = Some(motor);
        self
    }
}

/// Shunt compensation at a bus, in per-unit on the 100 MVA base.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shunt {
    pub id: ShuntId,
    pub name: String,
    pub bus: BusId,
    #[serde(default)]
    pub g_pu: f64,
    pub b_pu: f64,
    #[serde(default = "default_in_service")]
    pub in_service: bool,
}

impl Default for Shunt {
    fn default() -> Self {
        Self {
            id: ShuntId(0),
            name: String::new(),
            bus: BusId(0),
            g_pu: 0.0,
            b_pu: 0.0,
            in_service: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub enum Node {
    Bus(Bus),
    Gen(Generator),
    Load(Load),
    Shunt(Shunt),
}

#[derive(Debug, Clone, Serialize)]
pub enum Edge {
    Line(Line),
    Transformer(TwoWindingTransformer),
}

/// The power network graph plus the three-winding transformer table.
#[derive(Debug, Default)]
pub struct Network {
    pub graph: Graph<Node, Edge, Undirected>,
    pub three_winding_transformers: Vec<ThreeWindingTransformer>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
            three_winding_transformers: Vec::new(),
        }
    }

    pub fn add_bus(&mut self, bus: Bus) -> NodeIndex {
        self.graph.add_node(Node::Bus(bus))
    }

    /// Graph node of a bus.
    pub fn bus_node(&self, id: BusId) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| matches!(&self.graph[idx], Node::Bus(b) if b.id == id))
    }

    fn require_bus(&self, id: BusId, owner: &str) -> ScResult<NodeIndex> {
        self.bus_node(id).ok_or_else(|| {
            ScError::Network(format!("{} references unknown bus {}", owner, id.value()))
        })
    }

    pub fn add_line(&mut self, line: Line) -> ScResult<EdgeIndex> {
        let a = self.require_bus(line.bus1, &line.name)?;
        let b = self.require_bus(line.bus2, &line.name)?;
        Ok(self.graph.add_edge(a, b, Edge::Line(line)))
    }

    pub fn add_transformer(&mut self, transformer: TwoWindingTransformer) -> ScResult<EdgeIndex> {
        let a = self.require_bus(transformer.bus1, &transformer.name)?;
        let b = self.require_bus(transformer.bus2, &transformer.name)?;
        Ok(self.graph.add_edge(a, b, Edge::Transformer(transformer)))
    }

    pub fn add_three_winding_transformer(
        &mut self,
        transformer: ThreeWindingTransformer,
    ) -> ScResult<()> {
        for leg in &transformer.legs {
            self.require_bus(leg.bus, &transformer.name)?;
        }
        self.three_winding_transformers.push(transformer);
        Ok(())
    }

    pub fn add_generator(&mut self, generator: Generator) -> ScResult<NodeIndex> {
        self.require_bus(generator.bus, &generator.name)?;
        Ok(self.graph.add_node(Node::Gen(generator)))
    }

    pub fn add_load(&mut self, load: Load) -> ScResult<NodeIndex> {
        self.require_bus(load.bus, &load.name)?;
        Ok(self.graph.add_node(Node::Load(load)))
    }

    pub fn add_shunt(&mut self, shunt: Shunt) -> ScResult<NodeIndex> {
        self.require_bus(shunt.bus, &shunt.name)?;
        Ok(self.graph.add_node(Node::Shunt(shunt)))
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();

        for node in self.graph.node_weights() {
            match node {
                Node::Bus(_) => stats.num_buses += 1,
                Node::Gen(_) => stats.num_gens += 1,
                Node::Load(l) => {
                    stats.num_loads += 1;
                    stats.total_load_mw += l.active_power.value();
                }
                Node::Shunt(_) => stats.num_shunts += 1,
            }
        }
        for edge in self.graph.edge_weights() {
            match edge {
                Edge::Line(_) => stats.num_lines += 1,
                Edge::Transformer(_) => stats.num_transformers += 1,
            }
        }
        stats.num_three_winding_transformers = self.three_winding_transformers.len();
        stats
    }

    /// Hash of every equipment record, in insertion order.
    ///
    /// Two networks with the same fingerprint hold the same data; any edit to
    /// an impedance, a rating, a connection or an in-service flag changes it.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for node in self.graph.node_weights() {
            hash_json(&mut hasher, node);
        }
        for edge in self.graph.edge_weights() {
            hash_json(&mut hasher, edge);
        }
        hash_json(&mut hasher, &self.three_winding_transformers);
        hasher.finish()
    }

    /// Validate network data for issues that would make a fault study fail.
    ///
    /// Populates the provided `Diagnostics` with any warnings/errors found.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();
        if stats.num_buses == 0 {
            diag.add_error("structure", "Network has no buses");
            return;
        }

        let mut seen = std::collections::HashSet::new();
        for bus in self.buses() {
            if !seen.insert(bus.id) {
                diag.add_error_with_entity("structure", "Duplicate bus id", &bus.name);
            }
            if bus.nominal_kv.value() <= 0.0 {
                diag.add_error_with_entity(
                    "structure",
                    "Bus nominal voltage must be positive",
                    &bus.name,
                );
            }
        }

        let known = |id: BusId| seen.contains(&id);
        for edge in self.graph.edge_weights() {
            let (name, bus1, bus2) = match edge {
                Edge::Line(l) => (&l.name, l.bus1, l.bus2),
                Edge::Transformer(t) => {
                    if t.rated_u1.value() <= 0.0 || t.rated_u2.value() <= 0.0 {
                        diag.add_error_with_entity(
                            "structure",
                            "Transformer rated voltages must be positive",
                            &t.name,
                        );
                    }
                    (&t.name, t.bus1, t.bus2)
                }
            };
            if !known(bus1) || !known(bus2) {
                diag.add_error_with_entity("reference", "Branch references unknown bus", name);
            }
        }

        for t3w in &self.three_winding_transformers {
            if t3w.rated_u0.value() <= 0.0 {
                diag.add_error_with_entity(
                    "structure",
                    "Star point rated voltage must be positive",
                    &t3w.name,
                );
            }
            if t3w.legs.iter().any(|leg| !known(leg.bus)) {
                diag.add_error_with_entity(
                    "reference",
                    "Three-winding transformer leg references unknown bus",
                    &t3w.name,
                );
            }
        }

        for node in self.graph.node_weights() {
            let (name, bus) = match node {
                Node::Bus(_) => continue,
                Node::Gen(g) => {
                    let sc = &g.short_circuit;
                    if !sc.is_feeder() && sc.transient_x == 0.0 && sc.sub_transient_x == 0.0 {
                        diag.add_warning_with_entity(
                            "machine",
                            "Generator has no transient or sub-transient reactance and will not feed faults",
                            &g.name,
                        );
                    }
                    (&g.name, g.bus)
                }
                Node::Load(l) => (&l.name, l.bus),
                Node::Shunt(s) => (&s.name, s.bus),
            };
            if !known(bus) {
                diag.add_error_with_entity("reference", "Equipment references unknown bus", name);
            }
        }

        if stats.num_gens == 0 && stats.num_loads == 0 {
            diag.add_warning("structure", "Network has no generators or loads to feed faults");
        }
    }

    pub fn buses(&self) -> Vec<&Bus> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Bus(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.graph.node_weights().find_map(|n| match n {
            Node::Bus(b) if b.id == id => Some(b),
            _ => None,
        })
    }

    pub fn bus_by_name(&self, name: &str) -> Option<&Bus> {
        self.graph.node_weights().find_map(|n| match n {
            Node::Bus(b) if b.name == name => Some(b),
            _ => None,
        })
    }

    pub fn lines(&self) -> Vec<&Line> {
        self.graph
            .edge_weights()
            .filter_map(|e| match e {
                Edge::Line(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn two_winding_transformers(&self) -> Vec<&TwoWindingTransformer> {
        self.graph
            .edge_weights()
            .filter_map(|e| match e {
                Edge::Transformer(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    pub fn generators(&self) -> Vec<&Generator> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Gen(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn generators_at_bus(&self, bus_id: BusId) -> Vec<&Generator> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Gen(g) if g.bus == bus_id => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn loads_at_bus(&self, bus_id: BusId) -> Vec<&Load> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Load(l) if l.bus == bus_id => Some(l),
                _ => None,
            })
            .collect()
    }

    pub fn shunts_at_bus(&self, bus_id: BusId) -> Vec<&Shunt> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Shunt(s) if s.bus == bus_id => Some(s),
                _ => None,
            })
            .collect()
    }
}

/// Statistics about a network's size
#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_gens: usize,
    pub num_loads: usize,
    pub num_shunts: usize,
    pub num_lines: usize,
    pub num_transformers: usize,
    pub num_three_winding_transformers: usize,
    pub total_load_mw: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses, {} lines, {} transformers ({} three-winding), {} gens, {} loads",
            self.num_buses,
            self.num_lines,
            self.num_transformers + self.num_three_winding_transformers,
            self.num_three_winding_transformers,
            self.num_gens,
            self.num_loads,
        )
    }
}

impl Edge {
    pub fn in_service(&self) -> bool {
        match self {
            Edge::Line(line) => line.in_service,
            Edge::Transformer(tx) => tx.in_service,
        }
    }
}

fn hash_json<T: Serialize>(hasher: &mut DefaultHasher, value: &T) {
    match serde_json::to_vec(value) {
        Ok(bytes) => hasher.write(&bytes),
        Err(_) => hasher.write_u8(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus_network() -> Network {
        let mut network = Network::new();
        network.add_bus(Bus::new(BusId::new(1), "B1", Kilovolts(20.0)));
        network.add_bus(Bus::new(BusId::new(2), "B2", Kilovolts(0.4)));
        network
            .add_transformer(
                TwoWindingTransformer::new(
                    TransformerId::new(1),
                    "T1",
                    BusId::new(1),
                    BusId::new(2),
                    Kilovolts(20.0),
                    Kilovolts(0.41),
                    0.0027,
                    0.0103,
                )
                .with_rated_s(MegavoltAmperes(0.63)),
            )
            .unwrap();
        network
            .add_load(Load::new(LoadId::new(1), "Q", BusId::new(1), 31.3, 313.5))
            .unwrap();
        network
    }

    #[test]
    fn test_network_creation() {
        let network = two_bus_network();
        let stats = network.stats();
        assert_eq!(stats.num_buses, 2);
        assert_eq!(stats.num_transformers, 1);
        assert_eq!(stats.num_loads, 1);
        assert_eq!(network.two_winding_transformers()[0].name, "T1");
        assert_eq!(network.bus_by_name("B2").map(|b| b.id), Some(BusId::new(2)));
    }

    #[test]
    fn test_add_line_unknown_bus_fails() {
        let mut network = two_bus_network();
        let err = network
            .add_line(Line::new(LineId::new(9), "L9", BusId::new(1), BusId::new(42), 1.0, 1.0))
            .unwrap_err();
        assert!(err.to_string().contains("L9"));
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_network_validation_empty() {
        let network = Network::new();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.errors().any(|i| i.message.contains("no buses")));
    }

    #[test]
    fn test_validation_flags_bad_voltage_and_dangling_equipment() {
        let mut network = two_bus_network();
        network.add_bus(Bus::new(BusId::new(3), "B3", Kilovolts(0.0)));
        // bypass the checked helper to simulate an inconsistent import
        network.graph.add_node(Node::Gen(Generator::new(
            GenId::new(1),
            "G-orphan",
            BusId::new(77),
            GeneratorShortCircuit::default(),
        )));

        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag
            .errors()
            .any(|i| i.entity.as_deref() == Some("B3") && i.message.contains("positive")));
        assert!(diag
            .errors()
            .any(|i| i.entity.as_deref() == Some("G-orphan")));
    }

    #[test]
    fn test_validation_warns_on_generator_without_reactance() {
        let mut network = two_bus_network();
        network
            .add_generator(Generator::new(
                GenId::new(1),
                "G0",
                BusId::new(2),
                GeneratorShortCircuit::with_impedance(0.0, 0.0),
            ))
            .unwrap();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(!diag.has_errors());
        assert!(diag.warnings().any(|i| i.entity.as_deref() == Some("G0")));
    }

    #[test]
    fn test_equipment_at_bus_accessors() {
        let mut network = two_bus_network();
        network
            .add_generator(Generator::new(
                GenId::new(1),
                "G1",
                BusId::new(2),
                GeneratorShortCircuit::default(),
            ))
            .unwrap();
        network
            .add_shunt(Shunt {
                id: ShuntId::new(1),
                name: "SH1".into(),
                bus: BusId::new(2),
                b_pu: 0.2,
                ..Shunt::default()
            })
            .unwrap();

        assert_eq!(network.generators_at_bus(BusId::new(2)).len(), 1);
        assert!(network.generators_at_bus(BusId::new(1)).is_empty());
        assert_eq!(network.loads_at_bus(BusId::new(1)).len(), 1);
        assert_eq!(network.shunts_at_bus(BusId::new(2)).len(), 1);
    }

    #[test]
    fn test_three_winding_transformer_registration() {
        let mut network = two_bus_network();
        network.add_bus(Bus::new(BusId::new(3), "B3", Kilovolts(10.0)));
        let legs = [
            TransformerLeg::new(BusId::new(1), Kilovolts(20.0), 0.1, 1.0, LegShortCircuit::default_for_leg(1)),
            TransformerLeg::new(BusId::new(2), Kilovolts(0.4), 0.1, 1.0, LegShortCircuit::default_for_leg(2)),
            TransformerLeg::new(BusId::new(3), Kilovolts(10.0), 0.1, 1.0, LegShortCircuit::default_for_leg(3)),
        ];
        network
            .add_three_winding_transformer(ThreeWindingTransformer::new(
                ThreeWindingTransformerId::new(1),
                "T3",
                Kilovolts(1.0),
                legs,
            ))
            .unwrap();
        assert_eq!(network.stats().num_three_winding_transformers, 1);
        assert!(network.stats().to_string().contains("2 transformers"));
    }

    #[test]
    fn test_bus_json_defaults_operating_point() {
        let bus: Bus = serde_json::from_str(r#"{"id": 4, "name": "B4", "nominal_kv": 110.0}"#).unwrap();
        assert_eq!(bus.voltage_pu, PerUnit(1.0));
        assert_eq!(bus.angle_rad, Radians(0.0));
    }

    #[test]
    fn test_fingerprint_follows_equipment_data() {
        let mut network = two_bus_network();
        assert_eq!(network.fingerprint(), two_bus_network().fingerprint());

        for edge in network.graph.edge_weights_mut() {
            if let Edge::Transformer(t2w) = edge {
                t2w.x *= 2.0;
            }
        }
        assert_ne!(network.fingerprint(), two_bus_network().fingerprint());
    }
}
