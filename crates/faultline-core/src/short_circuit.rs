//! Short-circuit data attached to network equipment.
//!
//! These records carry what a fault study needs beyond the positive-sequence
//! model: zero-sequence coefficients, winding connections, grounding, machine
//! reactances and ratings. They are plain typed fields on the equipment
//! structs; the norm layer never writes into them, it produces its own
//! coefficient table instead.

use crate::units::{Kilovolts, MegavoltAmperes, Megawatts};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Winding connection at one side of a transformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WindingConnection {
    /// Star with isolated neutral
    Y,
    /// Star with the neutral connected to ground (possibly through an impedance)
    YGrounded,
    Delta,
}

impl fmt::Display for WindingConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WindingConnection::Y => "Y",
            WindingConnection::YGrounded => "Y_GROUNDED",
            WindingConnection::Delta => "DELTA",
        };
        f.write_str(label)
    }
}

/// Neutral grounding impedance in ohms.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundImpedance {
    pub r: f64,
    pub x: f64,
}

impl GroundImpedance {
    pub const fn new(r: f64, x: f64) -> Self {
        Self { r, x }
    }

    pub fn is_zero(&self) -> bool {
        self.r == 0.0 && self.x == 0.0
    }
}

/// Zero-sequence data of a line: `Ro = R * coeff_ro`, `Xo = X * coeff_xo`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineShortCircuit {
    pub coeff_ro: f64,
    pub coeff_xo: f64,
}

impl Default for LineShortCircuit {
    fn default() -> Self {
        Self {
            coeff_ro: 1.0,
            coeff_xo: 1.0,
        }
    }
}

impl LineShortCircuit {
    pub fn new(coeff_ro: f64, coeff_xo: f64) -> Self {
        Self { coeff_ro, coeff_xo }
    }
}

/// Short-circuit data of a two-winding transformer.
///
/// Grounding impedances are in ohms on the nominal voltage of their own side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerShortCircuit {
    pub coeff_ro: f64,
    pub coeff_xo: f64,
    pub connection1: WindingConnection,
    pub connection2: WindingConnection,
    pub grounding1: GroundImpedance,
    pub grounding2: GroundImpedance,
    /// Magnetizing branch ignored in the zero-sequence model
    pub free_fluxes: bool,
    /// Step-up transformer of a power-station unit
    pub part_of_generating_unit: bool,
    pub on_load_tap_changer: bool,
}

impl Default for TransformerShortCircuit {
    fn default() -> Self {
        Self {
            coeff_ro: 1.0,
            coeff_xo: 1.0,
            connection1: WindingConnection::Delta,
            connection2: WindingConnection::YGrounded,
            grounding1: GroundImpedance::default(),
            grounding2: GroundImpedance::default(),
            free_fluxes: true,
            part_of_generating_unit: false,
            on_load_tap_changer: false,
        }
    }
}

impl TransformerShortCircuit {
    pub fn with_connections(mut self, side1: WindingConnection, side2: WindingConnection) -> Self {
        self.connection1 = side1;
        self.connection2 = side2;
        self
    }

    pub fn with_coefficients(mut self, coeff_ro: f64, coeff_xo: f64) -> Self {
        self.coeff_ro = coeff_ro;
        self.coeff_xo = coeff_xo;
        self
    }

    pub fn with_grounding(mut self, side1: GroundImpedance, side2: GroundImpedance) -> Self {
        self.grounding1 = side1;
        self.grounding2 = side2;
        self
    }

    pub fn with_free_fluxes(mut self, free_fluxes: bool) -> Self {
        self.free_fluxes = free_fluxes;
        self
    }

    pub fn as_generating_unit(mut self, on_load_tap_changer: bool) -> Self {
        self.part_of_generating_unit = true;
        self.on_load_tap_changer = on_load_tap_changer;
        self
    }
}

/// Short-circuit data of one leg of a three-winding transformer.
///
/// The star-point side of every leg is treated as grounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegShortCircuit {
    pub connection: WindingConnection,
    #[serde(default = "default_coeff")]
    pub coeff_ro: f64,
    #[serde(default = "default_coeff")]
    pub coeff_xo: f64,
    #[serde(default)]
    pub free_fluxes: bool,
}

fn default_coeff() -> f64 {
    1.0
}

impl LegShortCircuit {
    /// Default data for leg 1, 2 or 3: DELTA, Y_GROUNDED, DELTA.
    pub fn default_for_leg(leg: usize) -> Self {
        let connection = if leg == 2 {
            WindingConnection::YGrounded
        } else {
            WindingConnection::Delta
        };
        Self {
            connection,
            coeff_ro: 1.0,
            coeff_xo: 1.0,
            free_fluxes: false,
        }
    }

    pub fn new(connection: WindingConnection, coeff_ro: f64, coeff_xo: f64, free_fluxes: bool) -> Self {
        Self {
            connection,
            coeff_ro,
            coeff_xo,
            free_fluxes,
        }
    }
}

/// Parameters of an external network equivalent (IEC 60909 feeder `Q`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeederInfeed {
    /// Initial symmetrical short-circuit current of the equivalent, in amperes
    pub ikq_max_a: f64,
    /// Voltage factor used to size the equivalent impedance
    pub cq: f64,
    pub r_to_x_ratio: f64,
}

impl Default for FeederInfeed {
    fn default() -> Self {
        Self {
            ikq_max_a: 10.0,
            cq: 1.1,
            r_to_x_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum GeneratorKind {
    #[default]
    Rotating,
    Feeder(FeederInfeed),
}

/// Machine impedances (ohms, on the generator bus voltage) and ratings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorShortCircuit {
    pub transient_r: f64,
    pub transient_x: f64,
    pub sub_transient_r: f64,
    pub sub_transient_x: f64,
    pub step_up_r: f64,
    pub step_up_x: f64,
    pub grounded: bool,
    pub grounding: GroundImpedance,
    pub coeff_ro: f64,
    pub coeff_xo: f64,
    pub rated_u: Option<Kilovolts>,
    pub rated_s: Option<MegavoltAmperes>,
    pub cos_phi: f64,
    /// pG, in percent of the rated voltage
    pub voltage_regulation_range: f64,
    pub kind: GeneratorKind,
}

impl Default for GeneratorShortCircuit {
    fn default() -> Self {
        Self {
            transient_r: 0.0,
            transient_x: 20.0,
            sub_transient_r: 0.0,
            sub_transient_x: 20.0,
            step_up_r: 0.0,
            step_up_x: 0.0,
            grounded: false,
            grounding: GroundImpedance::default(),
            coeff_ro: 1.0,
            coeff_xo: 1.0,
            rated_u: None,
            rated_s: None,
            cos_phi: 0.85,
            voltage_regulation_range: 0.0,
            kind: GeneratorKind::Rotating,
        }
    }
}

impl GeneratorShortCircuit {
    /// Same impedance for the transient and sub-transient periods.
    pub fn with_impedance(r: f64, x: f64) -> Self {
        Self {
            transient_r: r,
            transient_x: x,
            sub_transient_r: r,
            sub_transient_x: x,
            ..Self::default()
        }
    }

    pub fn with_transient(mut self, r: f64, x: f64) -> Self {
        self.transient_r = r;
        self.transient_x = x;
        self
    }

    pub fn with_sub_transient(mut self, r: f64, x: f64) -> Self {
        self.sub_transient_r = r;
        self.sub_transient_x = x;
        self
    }

    pub fn with_step_up(mut self, r: f64, x: f64) -> Self {
        self.step_up_r = r;
        self.step_up_x = x;
        self
    }

    pub fn grounded(mut self, coeff_ro: f64, coeff_xo: f64) -> Self {
        self.grounded = true;
        self.coeff_ro = coeff_ro;
        self.coeff_xo = coeff_xo;
        self
    }

    pub fn with_ratings(mut self, rated_u: Kilovolts, rated_s: MegavoltAmperes, cos_phi: f64) -> Self {
        self.rated_u = Some(rated_u);
        self.rated_s = Some(rated_s);
        self.cos_phi = cos_phi;
        self
    }

    pub fn as_feeder(mut self, infeed: FeederInfeed) -> Self {
        self.kind = GeneratorKind::Feeder(infeed);
        self
    }

    pub fn is_feeder(&self) -> bool {
        matches!(self.kind, GeneratorKind::Feeder(_))
    }
}

/// Locked-rotor data of an asynchronous motor modeled as a load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsynchronousMotor {
    pub rated_u: Kilovolts,
    pub rated_mechanical_p: Megawatts,
    /// Efficiency in percent
    pub efficiency: f64,
    pub rated_cos_phi: f64,
    /// Locked-rotor to rated current ratio Ilr/Irm
    pub ia_ir_ratio: f64,
    /// R/X ratio at locked rotor
    pub r_x_locked_rotor: f64,
}

impl AsynchronousMotor {
    /// Locked-rotor impedance `(R, X)` in ohms at the rated voltage.
    pub fn locked_rotor_impedance(&self) -> (f64, f64) {
        let u = self.rated_u.value();
        let s_rated = self.rated_mechanical_p.value() / (self.efficiency / 100.0 * self.rated_cos_phi);
        let z = u * u / (self.ia_ir_ratio * s_rated);
        let x = z / (self.r_x_locked_rotor * self.r_x_locked_rotor + 1.0).sqrt();
        (x * self.r_x_locked_rotor, x)
    }
}
