//! Run parameters shared by the balanced and unbalanced engines.

use serde::{Deserialize, Serialize};

use crate::norm::Norm;

/// Which faults a run computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisType {
    /// Only the faults supplied by the caller
    #[default]
    Selective,
    /// One three-phase fault per bus
    Systematic,
}

/// Source of the pre-fault voltages used as Thevenin sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoltageProfile {
    /// 1 pu at angle 0 on every bus
    #[default]
    Nominal,
    /// Magnitudes and angles from the pre-fault power flow
    Calculated,
}

/// Machine reactance used in the direct and inverse sequence networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeriodType {
    /// X"d
    #[default]
    SubTransient,
    /// X'd
    Transient,
}

impl std::fmt::Display for PeriodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodType::SubTransient => f.write_str("SUB_TRANSIENT"),
            PeriodType::Transient => f.write_str("TRANSIENT"),
        }
    }
}

fn default_voltage_update() -> bool {
    true
}

fn default_low_impedance_threshold() -> f64 {
    1e-8
}

fn default_homopolar_ratio() -> f64 {
    3.0
}

fn default_infinite_impedance_admittance() -> f64 {
    1e-8
}

/// Parameters of a short-circuit run.
///
/// All fields have defaults so a configuration file only needs to name what
/// it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortCircuitParameters {
    #[serde(default)]
    pub analysis_type: AnalysisType,
    #[serde(default)]
    pub voltage_profile: VoltageProfile,
    #[serde(default)]
    pub period: PeriodType,
    #[serde(default)]
    pub norm: Norm,
    /// Leave bus shunts out of the sequence networks
    #[serde(default)]
    pub ignore_shunts: bool,
    /// Compute post-fault voltage deltas on every bus and the feeder contributions
    #[serde(default = "default_voltage_update")]
    pub voltage_update: bool,
    /// Branches with |x| below this value (pu) are left out of the networks
    #[serde(default = "default_low_impedance_threshold")]
    pub low_impedance_threshold: f64,
    /// Zd/Zo ratio used when a branch carries no zero-sequence data
    #[serde(default = "default_homopolar_ratio")]
    pub homopolar_default_ratio: f64,
    /// Admittance placed on the diagonal of terminals isolated in the zero sequence
    #[serde(default = "default_infinite_impedance_admittance")]
    pub infinite_impedance_admittance: f64,
}

impl ShortCircuitParameters {
    pub fn new() -> Self {
        Self {
            analysis_type: AnalysisType::Selective,
            voltage_profile: VoltageProfile::Nominal,
            period: PeriodType::SubTransient,
            norm: Norm::None,
            ignore_shunts: false,
            voltage_update: true,
            low_impedance_threshold: default_low_impedance_threshold(),
            homopolar_default_ratio: default_homopolar_ratio(),
            infinite_impedance_admittance: default_infinite_impedance_admittance(),
        }
    }

    pub fn with_analysis_type(mut self, analysis_type: AnalysisType) -> Self {
        self.analysis_type = analysis_type;
        self
    }

    pub fn with_voltage_profile(mut self, profile: VoltageProfile) -> Self {
        self.voltage_profile = profile;
        self
    }

    pub fn with_period(mut self, period: PeriodType) -> Self {
        self.period = period;
        self
    }

    pub fn with_norm(mut self, norm: Norm) -> Self {
        self.norm = norm;
        self
    }

    pub fn with_ignore_shunts(mut self, ignore: bool) -> Self {
        self.ignore_shunts = ignore;
        self
    }

    pub fn with_voltage_update(mut self, update: bool) -> Self {
        self.voltage_update = update;
        self
    }

    pub fn with_low_impedance_threshold(mut self, threshold: f64) -> Self {
        self.low_impedance_threshold = threshold;
        self
    }

    pub fn with_homopolar_default_ratio(mut self, ratio: f64) -> Self {
        self.homopolar_default_ratio = ratio;
        self
    }
}

impl Default for ShortCircuitParameters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ShortCircuitParameters::default();
        assert_eq!(params.analysis_type, AnalysisType::Selective);
        assert_eq!(params.voltage_profile, VoltageProfile::Nominal);
        assert_eq!(params.period, PeriodType::SubTransient);
        assert_eq!(params.norm, Norm::None);
        assert!(params.voltage_update);
        assert!(!params.ignore_shunts);
        assert_eq!(params.homopolar_default_ratio, 3.0);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: ShortCircuitParameters =
            serde_json::from_str(r#"{"norm": "IEC", "period": "TRANSIENT"}"#).unwrap();
        assert_eq!(params.norm, Norm::Iec);
        assert_eq!(params.period, PeriodType::Transient);
        assert!(params.voltage_update);
        assert_eq!(params.low_impedance_threshold, 1e-8);
    }

    #[test]
    fn test_builder() {
        let params = ShortCircuitParameters::new()
            .with_analysis_type(AnalysisType::Systematic)
            .with_voltage_profile(VoltageProfile::Calculated)
            .with_voltage_update(false);
        assert_eq!(params.analysis_type, AnalysisType::Systematic);
        assert_eq!(params.voltage_profile, VoltageProfile::Calculated);
        assert!(!params.voltage_update);
    }

    #[test]
    fn test_builder_zero_sequence_settings() {
        let params = ShortCircuitParameters::new()
            .with_ignore_shunts(true)
            .with_homopolar_default_ratio(2.5)
            .with_low_impedance_threshold(1e-6);
        assert!(params.ignore_shunts);
        assert_eq!(params.homopolar_default_ratio, 2.5);
        assert_eq!(params.low_impedance_threshold, 1e-6);
    }
}
