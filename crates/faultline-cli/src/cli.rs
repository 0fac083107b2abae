use clap::{Parser, ValueEnum};
use faultline_algo::{Norm, PeriodType, VoltageProfile};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "faultline", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    /// Network case (JSON) listing buses, branches, machines and faults
    pub case: PathBuf,

    /// Run parameters (TOML); flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Norm used to correct machine and transformer impedances
    #[arg(long, value_enum)]
    pub norm: Option<NormArg>,

    /// Machine reactance period
    #[arg(long, value_enum)]
    pub period: Option<PeriodArg>,

    /// Source of the pre-fault voltages
    #[arg(long, value_enum)]
    pub profile: Option<ProfileArg>,

    /// Ignore the case faults and put a three-phase fault on every bus
    #[arg(long)]
    pub systematic: bool,

    /// Skip post-fault voltage deltas and feeder contributions
    #[arg(long)]
    pub no_voltage_update: bool,

    /// Output format for the results
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormArg {
    None,
    Iec,
    Courcirc,
}

impl From<NormArg> for Norm {
    fn from(arg: NormArg) -> Self {
        match arg {
            NormArg::None => Norm::None,
            NormArg::Iec => Norm::Iec,
            NormArg::Courcirc => Norm::Courcirc,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodArg {
    SubTransient,
    Transient,
}

impl From<PeriodArg> for PeriodType {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::SubTransient => PeriodType::SubTransient,
            PeriodArg::Transient => PeriodType::Transient,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileArg {
    Nominal,
    Calculated,
}

impl From<ProfileArg> for VoltageProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Nominal => VoltageProfile::Nominal,
            ProfileArg::Calculated => VoltageProfile::Calculated,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table, one row per fault
    Table,
    /// Pretty-printed JSON list of results
    Json,
}
