//! JSON network case and TOML run configuration.

use anyhow::{Context, Result};
use faultline_algo::{Fault, ShortCircuitParameters};
use faultline_core::{
    Bus, Generator, Line, Load, Network, ScResult, Shunt, ThreeWindingTransformer,
    TwoWindingTransformer,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A network together with the faults to study on it.
///
/// Every equipment list may be omitted. Ids and field names follow the
/// `faultline_core` types.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkCase {
    pub buses: Vec<Bus>,
    pub lines: Vec<Line>,
    pub transformers: Vec<TwoWindingTransformer>,
    pub three_winding_transformers: Vec<ThreeWindingTransformer>,
    pub generators: Vec<Generator>,
    pub loads: Vec<Load>,
    pub shunts: Vec<Shunt>,
    pub faults: Vec<Fault>,
}

impl NetworkCase {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading network case {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing network case {}", path.display()))
    }

    /// Build the network graph. Buses go in first so equipment can refer to them.
    pub fn into_network(self) -> ScResult<(Network, Vec<Fault>)> {
        let mut network = Network::new();
        for bus in self.buses {
            network.add_bus(bus);
        }
        for line in self.lines {
            network.add_line(line)?;
        }
        for transformer in self.transformers {
            network.add_transformer(transformer)?;
        }
        for transformer in self.three_winding_transformers {
            network.add_three_winding_transformer(transformer)?;
        }
        for generator in self.generators {
            network.add_generator(generator)?;
        }
        for load in self.loads {
            network.add_load(load)?;
        }
        for shunt in self.shunts {
            network.add_shunt(shunt)?;
        }
        debug!("network case loaded: {}", network.stats());
        Ok((network, self.faults))
    }
}

/// Read run parameters from a TOML file. Missing keys keep their defaults.
pub fn load_parameters(path: &Path) -> Result<ShortCircuitParameters> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading configuration {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing configuration {}", path.display()))
}
