//! Physical quantities carried by the equipment data.
//!
//! Equipment ratings and operating points are stored in engineering units
//! (kV, MVA, MW) and converted to per-unit on the 100 MVA system base when
//! the sequence networks are built. The wrappers below keep a kV rating from
//! being mixed with a per-unit magnitude; they serialize as bare numbers.
//!
//! ```
//! use faultline_core::units::{Degrees, Kilovolts, MegavoltAmperes};
//!
//! let zb = Kilovolts(20.0).base_impedance(MegavoltAmperes(100.0));
//! assert!((zb.value() - 4.0).abs() < 1e-12);
//!
//! let shift = Degrees(30.0).to_radians();
//! assert!((shift.value() - std::f64::consts::PI / 6.0).abs() < 1e-12);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! quantity {
    ($(#[$meta:meta])* $name:ident, $symbol:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub f64);

        impl $name {
            #[inline]
            pub const fn value(self) -> f64 {
                self.0
            }

            #[inline]
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            #[inline]
            pub fn min(self, other: Self) -> Self {
                Self(self.0.min(other.0))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", self.0, $symbol)
            }
        }
    };
}

quantity!(
    /// Active power
    Megawatts,
    "MW"
);
quantity!(
    /// Reactive power
    Megavars,
    "Mvar"
);
quantity!(
    /// Apparent power: equipment ratings and the system base
    MegavoltAmperes,
    "MVA"
);
quantity!(
    /// Pre-fault voltage magnitude relative to the bus nominal voltage
    PerUnit,
    "pu"
);
quantity!(
    /// Phase-to-phase voltage
    Kilovolts,
    "kV"
);
quantity!(Ohms, "ohm");
quantity!(Kiloamperes, "kA");
quantity!(Radians, "rad");
quantity!(
    /// Transformer phase shift as given on nameplates
    Degrees,
    "deg"
);

impl Kilovolts {
    /// `U² / S`
    #[inline]
    pub fn base_impedance(self, base: MegavoltAmperes) -> Ohms {
        Ohms(self.0 * self.0 / base.0)
    }

    /// `S / (√3 U)`, the current of 1 pu at this voltage level.
    #[inline]
    pub fn base_current(self, base: MegavoltAmperes) -> Kiloamperes {
        Kiloamperes(base.0 / (3f64.sqrt() * self.0))
    }
}

impl Degrees {
    #[inline]
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}
