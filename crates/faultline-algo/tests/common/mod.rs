//! Reference networks shared by the integration tests.
//!
//! Both networks come from the IEC 60909-4 worked examples. External grids
//! are modeled as constant-impedance loads, except the grounded feeder Q2
//! which is a machine so that it appears in the zero-sequence network.

#![allow(dead_code)]

use faultline_core::{
    Bus, BusId, GenId, Generator, GeneratorShortCircuit, Kilovolts, LegShortCircuit, Line, LineId,
    LineShortCircuit, Load, LoadId, MegavoltAmperes, Network, ThreeWindingTransformer,
    ThreeWindingTransformerId, TransformerId, TransformerLeg, TransformerShortCircuit,
    TwoWindingTransformer, WindingConnection,
};

pub fn close(actual: f64, expected: f64, tol: f64) -> bool {
    (actual - expected).abs() < tol
}

fn add_buses(network: &mut Network, buses: &[(usize, f64)]) {
    for &(id, kv) in buses {
        network.add_bus(Bus::new(BusId::new(id), format!("B{id}"), Kilovolts(kv)));
    }
}

fn add_line(network: &mut Network, id: usize, from: usize, to: usize, r: f64, x: f64, ro: f64, xo: f64) {
    network
        .add_line(
            Line::new(
                LineId::new(id),
                format!("L{id}"),
                BusId::new(from),
                BusId::new(to),
                r,
                x,
            )
            .with_short_circuit(LineShortCircuit::new(ro, xo)),
        )
        .unwrap();
}

/// IEC 60909-4 section 3.1: a 20 kV feeder supplying a 0.4 kV network
/// through two transformers.
///
/// Buses: B1 at 20 kV, B2 to B6 at 0.4 kV. The feeder sits at B1.
pub fn iec_31_network() -> Network {
    let mut network = Network::new();
    add_buses(
        &mut network,
        &[(1, 20.0), (2, 0.4), (3, 0.4), (4, 0.4), (5, 0.4), (6, 0.4)],
    );

    // Zfeeder = 0.126115 + j1.26353 ohm expressed as a load
    network
        .add_load(Load::new(LoadId::new(1), "LOAD_FEEDER", BusId::new(1), 31.286, 313.451))
        .unwrap();

    let kt = 0.975;
    let windings = TransformerShortCircuit::default()
        .with_coefficients(1.0, 0.95)
        .with_connections(WindingConnection::Delta, WindingConnection::YGrounded);
    for (id, name, bus, r, x, rated_s) in [
        (1, "T1", 3, 0.002753, 0.010312, 0.63),
        (2, "T2", 2, 0.004833, 0.016100, 0.4),
    ] {
        network
            .add_transformer(
                TwoWindingTransformer::new(
                    TransformerId::new(id),
                    name,
                    BusId::new(1),
                    BusId::new(bus),
                    Kilovolts(20.0),
                    Kilovolts(0.41),
                    r * kt,
                    x * kt,
                )
                .with_rated_s(MegavoltAmperes(rated_s))
                .with_short_circuit(windings),
            )
            .unwrap();
    }

    add_line(&mut network, 2, 2, 4, 0.000416, 0.000136, 4.23, 1.21);
    add_line(&mut network, 1, 3, 4, 0.000385, 0.000395, 3.7, 1.81);
    add_line(&mut network, 3, 4, 5, 0.005420, 0.001740, 3.0, 4.46);
    add_line(&mut network, 4, 5, 6, 0.01850, 0.01485, 2.0, 3.0);
    network
}

fn machine(id: usize, name: &str, bus: usize, r: f64, x: f64) -> Generator {
    Generator::new(
        GenId::new(id),
        name,
        BusId::new(bus),
        GeneratorShortCircuit::with_impedance(r, x),
    )
}

/// IEC 60909-4 section 6: 380/110/30/10 kV test network.
///
/// Buses B1 (380 kV), B2 to B5 (110 kV), B6 and B7 (10 kV), B8 and B9
/// (30 kV). Two three-winding transformers T3 and T4 join B1, B2 and B8/B9;
/// T5 and T6 feed B6 from B5.
pub fn iec_test_network() -> Network {
    let mut network = Network::new();
    add_buses(
        &mut network,
        &[
            (1, 380.0),
            (2, 110.0),
            (3, 110.0),
            (4, 110.0),
            (5, 110.0),
            (6, 10.0),
            (7, 10.0),
            (8, 30.0),
            (9, 30.0),
        ],
    );

    // Zfeeder = 0.631933 + j6.319335 ohm expressed as a load
    network
        .add_load(Load::new(LoadId::new(1), "LOAD_FEEDER1", BusId::new(1), 2262.42, 22624.3))
        .unwrap();

    let q2 = Generator::new(
        GenId::new(1),
        "Q2",
        BusId::new(5),
        GeneratorShortCircuit::with_impedance(0.434454, 4.344543).grounded(6.6, 3.3),
    );
    let (r_g1, x_g1) = (0.498795, 26.336676);
    let g1 = Generator::new(
        GenId::new(2),
        "G1",
        BusId::new(4),
        GeneratorShortCircuit::with_impedance(r_g1, x_g1)
            .grounded(0.439059 / r_g1, (13.340874 + 66.0) / x_g1),
    );
    for generator in [
        q2,
        g1,
        machine(3, "G2", 3, 1.203944, 35.340713),
        machine(4, "G3", 6, 0.01779, 1.089623),
        machine(5, "M1", 7, 0.341497, 3.414968),
        machine(6, "M2", 7, 0.412137, 4.121368),
    ] {
        network.add_generator(generator).unwrap();
    }

    add_line(&mut network, 1, 2, 3, 2.4, 7.8, 6.4 / 2.4, 25.2 / 7.8);
    add_line(&mut network, 2, 3, 4, 1.2, 3.9, 3.2 / 1.2, 12.6 / 3.9);
    add_line(&mut network, 3, 2, 5, 0.3, 0.975, 1.3 / 0.3, 4.65 / 0.975);
    add_line(&mut network, 4, 5, 3, 0.96, 3.88, 2.2 / 0.96, 11.0 / 3.88);
    add_line(&mut network, 5, 5, 4, 1.8, 5.79, 3.3 / 1.8, 16.5 / 5.79);
    add_line(&mut network, 6, 6, 7, 0.082, 0.086, 1.0, 1.0);

    // T5/T6 data is given on the 115 kV side
    let rho = 115.0 * 115.0 / (10.5 * 10.5);
    for (id, name, side2) in [
        (5, "T5", WindingConnection::Y),
        (6, "T6", WindingConnection::YGrounded),
    ] {
        network
            .add_transformer(
                TwoWindingTransformer::new(
                    TransformerId::new(id),
                    name,
                    BusId::new(5),
                    BusId::new(6),
                    Kilovolts(115.0),
                    Kilovolts(10.5),
                    2.046454 / rho,
                    49.072241 / rho,
                )
                .with_rated_s(MegavoltAmperes(31.5))
                .with_short_circuit(
                    TransformerShortCircuit::default()
                        .with_connections(WindingConnection::Y, side2),
                ),
            )
            .unwrap();
    }

    let rb = 1.0 / (120.0 * 120.0);
    let (ra, xa) = (0.045714 * rb, 8.0969989 * rb);
    let (rb2, xb2) = (0.053563 * rb, -0.079062 * rb);
    let (rc, xc) = (0.408560 * rb, 20.292035 * rb);
    let ro_t4 = 0.107281 / (rb2 + rc) * rb;
    let xo_t4 = 18.195035 / (xb2 + xc) * rb;

    let t3 = ThreeWindingTransformer::new(
        ThreeWindingTransformerId::new(3),
        "T3",
        Kilovolts(1.0),
        [
            TransformerLeg::new(
                BusId::new(1),
                Kilovolts(400.0),
                ra,
                xa,
                LegShortCircuit::new(WindingConnection::YGrounded, 1.0, 1.0, false),
            )
            .with_rated_s(MegavoltAmperes(100.0)),
            TransformerLeg::new(
                BusId::new(2),
                Kilovolts(120.0),
                rb2,
                xb2,
                LegShortCircuit::new(WindingConnection::Y, 1.0, 1.0, false),
            )
            .with_rated_s(MegavoltAmperes(100.0)),
            TransformerLeg::new(
                BusId::new(8),
                Kilovolts(30.0),
                rc,
                xc,
                LegShortCircuit::new(WindingConnection::Delta, 1.0, 1.0, false),
            )
            .with_rated_s(MegavoltAmperes(100.0)),
        ],
    );
    let t4 = ThreeWindingTransformer::new(
        ThreeWindingTransformerId::new(4),
        "T4",
        Kilovolts(1.0),
        [
            TransformerLeg::new(
                BusId::new(1),
                Kilovolts(400.0),
                ra,
                xa,
                LegShortCircuit::new(WindingConnection::Y, 1.0, 1.0, true),
            ),
            TransformerLeg::new(
                BusId::new(2),
                Kilovolts(120.0),
                rb2,
                xb2,
                LegShortCircuit::new(WindingConnection::YGrounded, ro_t4, xo_t4, true),
            ),
            TransformerLeg::new(
                BusId::new(9),
                Kilovolts(30.0),
                rc,
                xc,
                LegShortCircuit::new(WindingConnection::Delta, ro_t4, xo_t4, true),
            ),
        ],
    );
    network.add_three_winding_transformer(t3).unwrap();
    network.add_three_winding_transformer(t4).unwrap();
    network
}

/// Ik (kA) expected for bolted three-phase faults on B1..B8 of
/// [`iec_test_network`], transient period, IEC norm.
pub const IEC_TEST_NETWORK_IK: [f64; 8] = [
    40.64478476116188,
    31.783052222534174,
    19.672955775750143,
    16.227655866910894,
    33.18941481677016,
    37.56287899040728,
    25.589463480212533,
    13.577771545200052,
];
