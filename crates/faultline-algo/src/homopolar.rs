//! # Zero-Sequence (Homopolar) Branch Models
//!
//! Lines keep a pi model in the zero sequence. Transformers do not: whether
//! zero-sequence current can cross a transformer, or reach ground through it,
//! depends on the winding connection at each side, on the neutral grounding
//! impedances and on the magnetizing branch.
//!
//! ## Transformer reduction
//!
//! With `Zoa = Zob = Zo / 2` the leakage halves, `Zom = 1 / Yom` the
//! magnetizing impedance (taken as 0 when `Yom = 0`), `Zg` the neutral
//! grounding impedances and `k = rho e^{j alpha}` the ideal ratio on side 1:
//!
//! | Side 1 | Side 2 | Free fluxes | Block |
//! |--------|--------|-------------|-------|
//! | Y or D | Y or D | any | isolated |
//! | YG | Y | yes | isolated |
//! | Y | YG | yes | isolated |
//! | YG | Y | no | `y11 = 1 / (3Zga + (Zo + Zom)/k²)` |
//! | Y | YG | no | `y22 = 1 / (3Zgb + Zo + Zom)` |
//! | YG | D | no | `y11 = 1 / (3Zga + (Zoa + 1/(Yom + 1/Zob))/k²)` |
//! | YG | D | yes | `y11 = 1 / (3Zga + (Zoa + Zob)/k²)` |
//! | D | YG | no | `y22 = 1 / (3Zgb + Zob + 1/(Yom + 1/Zoa))` |
//! | D | YG | yes | `y22 = 1 / (3Zgb + Zob + Zoa)` |
//! | YG | YG | no | T network, see [`WindingData`] |
//! | YG | YG | yes | series `Zoa + Zob + 3Zgb` behind `3Zga` |
//!
//! Isolated terminals get the infinite-impedance admittance on their diagonal
//! so that buses fed only through delta windings keep a regular matrix.
//!
//! All impedances are per-unit: leakage and magnetizing values on the side-2
//! base, `Zga` on the side-1 base and `Zgb` on the side-2 base.

use faultline_core::{ScError, ScResult, WindingConnection};
use num_complex::Complex64;
use serde::Serialize;

use crate::model::BranchBlock;

/// Zero-sequence data of a transformer or three-winding transformer leg.
///
/// For two grounded stars with forced fluxes the block is the inverse of the
/// T network impedance matrix:
///
/// ```text
/// Zc = (Zom + Zoa)/k² + 3Zga
/// Zd = Zom + Zob + 3Zgb
/// Ze = Zom / k
///
///                 1        [ Zd  -Ze ]
/// Y = ---------------  *   [         ]
///      Zc Zd - Ze²         [-Ze   Zc ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindingData {
    /// Total leakage impedance `Zoa + Zob`
    pub zo: Complex64,
    /// Magnetizing admittance
    pub yom: Complex64,
    pub connection1: WindingConnection,
    pub connection2: WindingConnection,
    /// Neutral grounding impedance on side 1
    pub zg1: Complex64,
    /// Neutral grounding impedance on side 2
    pub zg2: Complex64,
    pub free_fluxes: bool,
}

/// Zero-sequence data of one branch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HomopolarData {
    Line {
        zo: Complex64,
        y1o: Complex64,
        y2o: Complex64,
    },
    Transformer(WindingData),
}

impl HomopolarData {
    /// Zero-sequence block of the branch.
    ///
    /// Fails with a configuration error naming the branch and its connections
    /// when the reduction divides by zero (for example a zero leakage impedance
    /// behind a delta winding).
    pub fn block(
        &self,
        branch: &str,
        rho: f64,
        alpha: f64,
        infinite_impedance_admittance: f64,
    ) -> ScResult<BranchBlock> {
        match self {
            HomopolarData::Line { zo, y1o, y2o } => {
                let block = BranchBlock::pi_model(*zo, *y1o, *y2o, rho, alpha);
                if block.is_finite() {
                    Ok(block)
                } else {
                    Err(ScError::config(format!(
                        "line {branch}: zero-sequence impedance is zero"
                    )))
                }
            }
            HomopolarData::Transformer(data) => {
                let k = Complex64::from_polar(rho, alpha);
                let block = data.block(k, infinite_impedance_admittance);
                if block.is_finite() {
                    Ok(block)
                } else {
                    Err(ScError::config(format!(
                        "transformer {branch}: zero-sequence reduction of {}/{} is degenerate",
                        data.connection1, data.connection2
                    )))
                }
            }
        }
    }
}

impl WindingData {
    fn magnetizing_impedance(&self) -> Complex64 {
        if self.yom == Complex64::default() {
            Complex64::default()
        } else {
            self.yom.inv()
        }
    }

    /// Block for the connection pair, with `k = rho e^{j alpha}`.
    pub fn block(&self, k: Complex64, infinite_impedance_admittance: f64) -> BranchBlock {
        use WindingConnection::{Delta, YGrounded, Y};

        let y_inf = infinite_impedance_admittance;
        let k2 = k * k;
        let zoa = self.zo / 2.0;
        let zob = self.zo / 2.0;
        let zom = self.magnetizing_impedance();
        let (zga3, zgb3) = (self.zg1 * 3.0, self.zg2 * 3.0);

        match (self.connection1, self.connection2, self.free_fluxes) {
            (Y | Delta, Y | Delta, _) | (YGrounded, Y, true) | (Y, YGrounded, true) => {
                BranchBlock::isolated(y_inf)
            }
            (YGrounded, Y, false) => {
                BranchBlock::grounded_side1((zga3 + (self.zo + zom) / k2).inv(), y_inf)
            }
            (Y, YGrounded, false) => BranchBlock::grounded_side2((zgb3 + self.zo + zom).inv(), y_inf),
            (YGrounded, Delta, false) => {
                let z = zga3 + (zoa + (self.yom + zob.inv()).inv()) / k2;
                BranchBlock::grounded_side1(z.inv(), y_inf)
            }
            (YGrounded, Delta, true) => {
                BranchBlock::grounded_side1((zga3 + (zoa + zob) / k2).inv(), y_inf)
            }
            (Delta, YGrounded, false) => {
                let z = zgb3 + zob + (self.yom + zoa.inv()).inv();
                BranchBlock::grounded_side2(z.inv(), y_inf)
            }
            (Delta, YGrounded, true) => BranchBlock::grounded_side2((zgb3 + zob + zoa).inv(), y_inf),
            (YGrounded, YGrounded, false) => {
                let zc = (zom + zoa) / k2 + zga3;
                let zd = zom + zob + zgb3;
                let ze = zom / k;
                let det = zc * zd - ze * ze;
                BranchBlock {
                    y11: zd / det,
                    y12: -ze / det,
                    y21: -ze / det,
                    y22: zc / det,
                }
            }
            (YGrounded, YGrounded, true) => {
                let zc = zga3 + (zoa + zob + zgb3) / k2;
                let y = zc.inv();
                BranchBlock {
                    y11: y,
                    y12: -y / k,
                    y21: -y / k,
                    y22: y / k2,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const Y_INF: f64 = 1e-8;

    fn data(c1: WindingConnection, c2: WindingConnection, free_fluxes: bool) -> WindingData {
        WindingData {
            zo: Complex64::new(0.02, 0.2),
            yom: Complex64::new(0.001, -0.5),
            connection1: c1,
            connection2: c2,
            zg1: Complex64::new(0.01, 0.03),
            zg2: Complex64::new(0.05, 0.0),
            free_fluxes,
        }
    }

    fn close(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-9 * (1.0 + b.norm())
    }

    #[test]
    fn test_ungrounded_pairs_are_isolated() {
        use WindingConnection::*;
        let k = Complex64::new(1.0, 0.0);
        for (c1, c2) in [(Y, Y), (Y, Delta), (Delta, Y), (Delta, Delta)] {
            for free in [true, false] {
                assert_eq!(data(c1, c2, free).block(k, Y_INF), BranchBlock::isolated(Y_INF));
            }
        }
        assert_eq!(data(YGrounded, Y, true).block(k, Y_INF), BranchBlock::isolated(Y_INF));
        assert_eq!(data(Y, YGrounded, true).block(k, Y_INF), BranchBlock::isolated(Y_INF));
    }

    #[test]
    fn test_grounded_star_behind_delta() {
        let d = data(WindingConnection::Delta, WindingConnection::YGrounded, false);
        let block = d.block(Complex64::new(1.0, 0.0), Y_INF);
        let zoa = d.zo / 2.0;
        let expected = (d.zg2 * 3.0 + zoa + (d.yom + zoa.inv()).inv()).inv();
        assert!(close(block.y22, expected));
        assert_eq!(block.y11, Complex64::new(Y_INF, 0.0));
        assert!(!block.is_coupling());

        let free = data(WindingConnection::Delta, WindingConnection::YGrounded, true)
            .block(Complex64::new(1.0, 0.0), Y_INF);
        assert!(close(free.y22, (d.zg2 * 3.0 + d.zo).inv()));
    }

    #[test]
    fn test_off_nominal_ratio_refers_side2_impedances() {
        let d = data(WindingConnection::YGrounded, WindingConnection::Delta, true);
        let k = Complex64::from_polar(1.1, 0.2);
        let block = d.block(k, Y_INF);
        let expected = (d.zg1 * 3.0 + d.zo / (k * k)).inv();
        assert!(close(block.y11, expected));
    }

    // Hand reduction of the T network: grounded stars on both sides, forced
    // fluxes, unit ratio. Injecting at side 1 with side 2 shorted to ground
    // must see 3Zga + Zoa + (Zom // (Zob + 3Zgb)).
    #[test]
    fn test_grounded_stars_forced_fluxes_match_t_network() {
        let d = data(WindingConnection::YGrounded, WindingConnection::YGrounded, false);
        let block = d.block(Complex64::new(1.0, 0.0), Y_INF);

        let zoa = d.zo / 2.0;
        let zom = d.yom.inv();
        let branch_b = zoa + d.zg2 * 3.0;
        let parallel = (zom.inv() + branch_b.inv()).inv();
        let z_in = d.zg1 * 3.0 + zoa + parallel;
        assert!(close(block.y11, z_in.inv()));

        // reciprocal network
        assert!(close(block.y12, block.y21));
        // transfer: current out of side 2 (shorted) for 1 pu at side 1
        let i1 = z_in.inv();
        let v_mid = i1 * parallel;
        let i2 = -v_mid / branch_b;
        assert!(close(block.y21, i2));

        // 4x4 form carries the same entries
        let m = block.to_real_4x4();
        assert!((m[0][0] - block.y11.re).abs() < 1e-15);
        assert!((m[1][0] - block.y11.im).abs() < 1e-15);
        assert!((m[2][0] - block.y21.re).abs() < 1e-15);
        assert!((m[0][3] + block.y12.im).abs() < 1e-15);
    }

    #[test]
    fn test_grounded_stars_free_fluxes_are_a_series_element() {
        let d = data(WindingConnection::YGrounded, WindingConnection::YGrounded, true);
        let k = Complex64::from_polar(0.95, 0.1);
        let block = d.block(k, Y_INF);
        let zc = d.zg1 * 3.0 + (d.zo + d.zg2 * 3.0) / (k * k);
        assert!(close(block.y11, zc.inv()));
        assert!(close(block.y22 * k * k, zc.inv()));
        assert!(close(block.y12, -zc.inv() / k));
    }

    #[test]
    fn test_zero_magnetizing_admittance_decouples_sides() {
        let mut d = data(WindingConnection::YGrounded, WindingConnection::YGrounded, false);
        d.yom = Complex64::default();
        let block = d.block(Complex64::new(1.0, 0.0), Y_INF);
        assert!(!block.is_coupling());
        assert!(close(block.y11, (d.zo / 2.0 + d.zg1 * 3.0).inv()));
    }

    #[test]
    fn test_degenerate_reduction_names_branch() {
        let mut d = data(WindingConnection::Delta, WindingConnection::YGrounded, false);
        d.zo = Complex64::default();
        d.zg2 = Complex64::default();
        d.yom = Complex64::default();
        let err = HomopolarData::Transformer(d)
            .block("T7", 1.0, 0.0, Y_INF)
            .unwrap_err();
        assert!(err.is_config());
        let message = err.to_string();
        assert!(message.contains("T7"));
        assert!(message.contains("DELTA/Y_GROUNDED"));
    }

    #[test]
    fn test_line_is_a_pi_model() {
        let homopolar = HomopolarData::Line {
            zo: Complex64::new(0.03, 0.3),
            y1o: Complex64::new(0.0, 0.01),
            y2o: Complex64::new(0.0, 0.01),
        };
        let block = homopolar.block("L1", 1.0, 0.0, Y_INF).unwrap();
        let y = Complex64::new(0.03, 0.3).inv();
        assert!(close(block.y11, y + Complex64::new(0.0, 0.01)));
        assert!(close(block.y12, -y));
    }
}
