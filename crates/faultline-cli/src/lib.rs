//! Library side of the `faultline` binary: argument parsing, case loading and
//! result printing.

pub mod case;
pub mod cli;
pub mod report;

use anyhow::{Context, Result};
use faultline_algo::{
    AnalysisType, BalancedEngine, ShortCircuitEngine, ShortCircuitParameters, UnbalancedEngine,
};
use std::io::Write;
use tracing::{info, warn};

use case::{load_parameters, NetworkCase};
use cli::{Cli, OutputFormat};

/// Configuration file first, then command-line overrides.
pub fn resolve_parameters(cli: &Cli) -> Result<ShortCircuitParameters> {
    let mut params = match &cli.config {
        Some(path) => load_parameters(path)?,
        None => ShortCircuitParameters::new(),
    };
    if let Some(norm) = cli.norm {
        params.norm = norm.into();
    }
    if let Some(period) = cli.period {
        params.period = period.into();
    }
    if let Some(profile) = cli.profile {
        params.voltage_profile = profile.into();
    }
    if cli.systematic {
        params.analysis_type = AnalysisType::Systematic;
    }
    if cli.no_voltage_update {
        params.voltage_update = false;
    }
    Ok(params)
}

/// Load the case, run the engine that fits its faults and write the results.
pub fn run<W: Write>(cli: &Cli, out: W) -> Result<()> {
    let params = resolve_parameters(cli)?;
    let (network, faults) = NetworkCase::from_path(&cli.case)?
        .into_network()
        .context("building network from case")?;

    let balanced = params.analysis_type == AnalysisType::Systematic
        || faults.iter().all(|fault| fault.fault_type().is_balanced());
    let engine_name = if balanced { "balanced" } else { "unbalanced" };
    info!(
        faults = faults.len(),
        norm = %params.norm,
        period = %params.period,
        engine = engine_name,
        "running short-circuit analysis"
    );

    let mut engine: Box<dyn ShortCircuitEngine + '_> = if balanced {
        Box::new(BalancedEngine::new(&network, params, faults))
    } else {
        Box::new(UnbalancedEngine::new(&network, params, faults))
    };
    engine.run()?;

    let diagnostics = engine.diagnostics();
    if diagnostics.has_warnings() || diagnostics.has_errors() {
        warn!("{}", diagnostics.summary());
    }

    let results = engine.results_per_fault();
    match cli.format {
        OutputFormat::Table => report::write_table(out, results),
        OutputFormat::Json => report::write_json(out, results),
    }
}
