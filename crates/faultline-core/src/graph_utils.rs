use crate::{BusId, Edge, Network, Node};
use std::collections::{HashMap, HashSet, VecDeque};

/// A set of buses connected through in-service branches.
#[derive(Debug, Clone)]
pub struct Island {
    pub island_id: usize,
    pub buses: Vec<BusId>,
    /// True when a generator or asynchronous motor sits on one of the buses
    pub has_source: bool,
}

/// Aggregated island analysis result.
#[derive(Debug, Clone, Default)]
pub struct IslandAnalysis {
    pub islands: Vec<Island>,
    pub assignments: HashMap<BusId, usize>,
}

impl IslandAnalysis {
    pub fn island_of(&self, bus: BusId) -> Option<usize> {
        self.assignments.get(&bus).copied()
    }

    /// Islands with no machine to feed a fault.
    pub fn dead_islands(&self) -> impl Iterator<Item = &Island> {
        self.islands.iter().filter(|i| !i.has_source)
    }
}

/// Labels bus islands by breadth-first search over in-service lines,
/// transformers and three-winding transformer legs.
pub fn find_islands(network: &Network) -> IslandAnalysis {
    let mut adjacency: HashMap<BusId, Vec<BusId>> = HashMap::new();
    let mut sources = HashSet::new();
    let mut order = Vec::new();

    for idx in network.graph.node_indices() {
        match &network.graph[idx] {
            Node::Bus(bus) => {
                adjacency.entry(bus.id).or_default();
                order.push(bus.id);
            }
            Node::Gen(gen) if gen.in_service => {
                sources.insert(gen.bus);
            }
            Node::Load(load) if load.motor.is_some() => {
                sources.insert(load.bus);
            }
            _ => {}
        }
    }

    for edge in network.graph.edge_references() {
        if !edge.weight().in_service() {
            continue;
        }
        let (a, b) = match edge.weight() {
            Edge::Line(l) => (l.bus1, l.bus2),
            Edge::Transformer(t) => (t.bus1, t.bus2),
        };
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    }

    // the star point is not a bus in the model, so join the legs pairwise
    for t3w in network.three_winding_transformers.iter().filter(|t| t.in_service) {
        let hub = t3w.legs[0].bus;
        for leg in &t3w.legs[1..] {
            adjacency.entry(hub).or_default().push(leg.bus);
            adjacency.entry(leg.bus).or_default().push(hub);
        }
    }

    let mut analysis = IslandAnalysis::default();
    for start in order {
        if analysis.assignments.contains_key(&start) {
            continue;
        }
        let island_id = analysis.islands.len();
        let mut queue = VecDeque::from([start]);
        let mut members = Vec::new();
        while let Some(bus) = queue.pop_front() {
            if analysis.assignments.contains_key(&bus) {
                continue;
            }
            analysis.assignments.insert(bus, island_id);
            members.push(bus);
            for neighbor in adjacency.get(&bus).into_iter().flatten() {
                if !analysis.assignments.contains_key(neighbor) {
                    queue.push_back(*neighbor);
                }
            }
        }
        let has_source = members.iter().any(|b| sources.contains(b));
        analysis.islands.push(Island {
            island_id,
            buses: members,
            has_source,
        });
    }
    analysis
}
