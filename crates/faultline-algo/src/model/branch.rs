use faultline_core::{LineId, ThreeWindingTransformerId, TransformerId};
use num_complex::Complex64;
use serde::Serialize;

use crate::homopolar::HomopolarData;

/// Equipment a sequence-network branch comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchKind {
    Line(LineId),
    Transformer(TransformerId),
    /// Leg `leg` (0, 1 or 2) of a three-winding transformer, from the leg bus
    /// to the star bus
    Leg {
        transformer: ThreeWindingTransformerId,
        leg: usize,
    },
}

/// 2x2 complex nodal admittance block of a branch:
///
/// ```text
/// [I1]   [y11 y12] [V1]
/// [I2] = [y21 y22] [V2]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BranchBlock {
    pub y11: Complex64,
    pub y12: Complex64,
    pub y21: Complex64,
    pub y22: Complex64,
}

impl BranchBlock {
    /// Pi model with series impedance `z`, end shunts `y1`/`y2` and an ideal
    /// transformer `rho e^{j alpha}` on side 1.
    pub fn pi_model(z: Complex64, y1: Complex64, y2: Complex64, rho: f64, alpha: f64) -> Self {
        let y = z.inv();
        Self {
            y11: (y + y1) * rho * rho,
            y12: -y * Complex64::from_polar(rho, -alpha),
            y21: -y * Complex64::from_polar(rho, alpha),
            y22: y + y2,
        }
    }

    /// Both terminals disconnected from the network; each keeps a tiny
    /// admittance to ground so the matrix stays regular.
    pub fn isolated(infinite_impedance_admittance: f64) -> Self {
        let y = Complex64::new(infinite_impedance_admittance, 0.0);
        Self {
            y11: y,
            y22: y,
            ..Self::default()
        }
    }

    /// Admittance to ground on side 1 only.
    pub fn grounded_side1(y: Complex64, infinite_impedance_admittance: f64) -> Self {
        Self {
            y11: y,
            ..Self::isolated(infinite_impedance_admittance)
        }
    }

    /// Admittance to ground on side 2 only.
    pub fn grounded_side2(y: Complex64, infinite_impedance_admittance: f64) -> Self {
        Self {
            y22: y,
            ..Self::isolated(infinite_impedance_admittance)
        }
    }

    /// Terminal currents for the terminal voltages `(v1, v2)`.
    pub fn currents(&self, v1: Complex64, v2: Complex64) -> (Complex64, Complex64) {
        (
            self.y11 * v1 + self.y12 * v2,
            self.y21 * v1 + self.y22 * v2,
        )
    }

    /// Real expansion on `[V1x, V1y, V2x, V2y]`, each complex entry `g + jb`
    /// becoming `[[g, -b], [b, g]]`.
    pub fn to_real_4x4(&self) -> [[f64; 4]; 4] {
        let mut m = [[0.0; 4]; 4];
        let entries = [
            (0, 0, self.y11),
            (0, 2, self.y12),
            (2, 0, self.y21),
            (2, 2, self.y22),
        ];
        for (row, col, y) in entries {
            m[row][col] = y.re;
            m[row][col + 1] = -y.im;
            m[row + 1][col] = y.im;
            m[row + 1][col + 1] = y.re;
        }
        m
    }

    pub fn is_finite(&self) -> bool {
        [self.y11, self.y12, self.y21, self.y22]
            .iter()
            .all(|y| y.re.is_finite() && y.im.is_finite())
    }

    /// Whether the block couples its two terminals.
    pub fn is_coupling(&self) -> bool {
        self.y12 != Complex64::default() || self.y21 != Complex64::default()
    }

    /// Whether each terminal has a path to ground through this block.
    ///
    /// A series element (rank one block) has none; an uncoupled terminal with
    /// a non-zero diagonal, or a regular block, has one.
    pub fn grounds(&self) -> (bool, bool) {
        let zero = Complex64::default();
        if !self.is_coupling() {
            return (self.y11 != zero, self.y22 != zero);
        }
        let det = self.y11 * self.y22 - self.y12 * self.y21;
        let scale = (self.y11 * self.y22).norm().max((self.y12 * self.y21).norm());
        let regular = det.norm() > 1e-10 * scale;
        (regular, regular)
    }
}

/// One branch of the sequence networks, in per-unit on 100 MVA.
#[derive(Debug, Clone, Serialize)]
pub struct ScBranch {
    pub name: String,
    pub kind: BranchKind,
    pub bus1: usize,
    pub bus2: usize,
    /// Series impedance on the side-2 base
    pub z: Complex64,
    pub y1: Complex64,
    pub y2: Complex64,
    pub rho: f64,
    /// Phase shift in radians
    pub alpha: f64,
    pub homopolar: HomopolarData,
    /// Direct (and inverse) sequence block
    pub direct: BranchBlock,
    /// Zero-sequence block
    pub zero: BranchBlock,
}
