//! End-to-end Jacobians on the reference device

use approx::assert_abs_diff_eq;
use num_complex::Complex64;
use qtape_core::{
    expval, flatten_results, probs, sample, var, Device, DeviceError, GateKind, Measurement,
    MeasurementResult, Observable, Operation, Param, ReturnType, Tape, TapeError, Wire,
};
use qtape_sim::{
    DefaultQubit, Differentiable, FiniteDifferenceOrder, GradientError, Jacobian, JacobianOptions,
};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, TAU};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn assert_jacobians_close(a: &Jacobian, b: &Jacobian, tol: f64) {
    assert_eq!(a.shape(), b.shape());
    for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
        assert_abs_diff_eq!(x, y, epsilon = tol);
    }
}

fn outputs(tape: &mut Tape, dev: &mut dyn Device, values: &[f64]) -> Vec<f64> {
    flatten_results(&tape.execute(dev, Some(values)).unwrap())
}

/// Passes through to the reference device but never hands out its state
struct NoStateDevice(DefaultQubit);

impl Device for NoStateDevice {
    fn name(&self) -> &str {
        "no.state"
    }

    fn num_wires(&self) -> usize {
        self.0.num_wires()
    }

    fn execute(
        &mut self,
        operations: &[Operation],
        measurements: &[Measurement],
    ) -> Result<Vec<MeasurementResult>, DeviceError> {
        self.0.execute(operations, measurements)
    }

    fn state(&self) -> Option<&[Complex64]> {
        None
    }
}

struct OfflineDevice;

impl Device for OfflineDevice {
    fn name(&self) -> &str {
        "offline"
    }

    fn num_wires(&self) -> usize {
        2
    }

    fn execute(
        &mut self,
        _operations: &[Operation],
        _measurements: &[Measurement],
    ) -> Result<Vec<MeasurementResult>, DeviceError> {
        Err(DeviceError::Simulation("device offline".to_string()))
    }

    fn state(&self) -> Option<&[Complex64]> {
        None
    }
}

/// Seven evenly spaced angles over [-2π, 2π], both ends and 0 included
fn angle_grid() -> Vec<f64> {
    (0..7u32).map(|i| -TAU + f64::from(i) * TAU / 3.0).collect()
}

#[test]
fn test_ry_gradient() {
    init_tracing();
    for theta in [1.0, -2.0, 1.623, -0.051, 0.0] {
        let mut tape = Tape::record(|| {
            Operation::ry(theta, 0).queue();
            expval(Observable::pauli_x(0)).queue();
        })
        .unwrap();
        let mut dev = DefaultQubit::new(1).unwrap();

        let analytic = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
        let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
        assert_abs_diff_eq!(analytic[(0, 0)], theta.cos(), epsilon = 1e-10);
        assert_abs_diff_eq!(numeric[(0, 0)], theta.cos(), epsilon = 1e-6);
    }
}

#[test]
fn test_rotations_match_shift_rule() {
    init_tracing();
    let minus = vec![
        Complex64::new(FRAC_1_SQRT_2, 0.0),
        Complex64::new(-FRAC_1_SQRT_2, 0.0),
    ];
    for kind in [GateKind::RX, GateKind::RY, GateKind::RZ] {
        for theta in angle_grid() {
            let gate = Operation::new(kind, vec![Param::new(theta)], &[Wire::new(0)]).unwrap();
            let mut tape = Tape::new(
                vec![
                    Operation::qubit_state_vector(minus.clone(), &[Wire::new(0)]).unwrap(),
                    gate,
                ],
                vec![expval(Observable::pauli_z(0)), expval(Observable::pauli_y(0))],
            );
            assert_eq!(tape.trainable_params().iter().copied().collect::<Vec<_>>(), vec![1]);

            let mut dev = DefaultQubit::new(1).unwrap();
            let plus = outputs(&mut tape, &mut dev, &[theta + FRAC_PI_2]);
            let less = outputs(&mut tape, &mut dev, &[theta - FRAC_PI_2]);

            let analytic = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
            let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
            for row in 0..2 {
                let shifted = (plus[row] - less[row]) / 2.0;
                assert_abs_diff_eq!(analytic[(row, 0)], shifted, epsilon = 1e-10);
                assert_abs_diff_eq!(numeric[(row, 0)], shifted, epsilon = 1e-6);
            }
        }
    }
}

#[test]
fn test_rot_with_shared_angles() {
    // RX(π/4) fixed, then Rot(θ2, θ1, 2θ1) with every angle trainable
    let theta2 = -0.7;
    for theta1 in angle_grid() {
        let mut tape = Tape::new(
            vec![
                Operation::rx(Param::fixed(FRAC_PI_4), 0),
                Operation::rot(theta2, theta1, 2.0 * theta1, 0),
            ],
            vec![expval(Observable::pauli_x(0))],
        );
        let mut dev = DefaultQubit::new(1).unwrap();

        let analytic = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
        let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
        assert_eq!(analytic.shape(), (1, 3));
        assert_jacobians_close(&analytic, &numeric, 1e-6);

        // chain rule through the shared angle
        let h = 1e-6;
        let plus = outputs(&mut tape, &mut dev, &[theta2, theta1 + h, 2.0 * (theta1 + h)]);
        let less = outputs(&mut tape, &mut dev, &[theta2, theta1 - h, 2.0 * (theta1 - h)]);
        let expected = (plus[0] - less[0]) / (2.0 * h);
        assert_abs_diff_eq!(analytic[(0, 1)] + 2.0 * analytic[(0, 2)], expected, epsilon = 1e-6);
    }
}

#[test]
fn test_rot_mixed_trainable_angles() {
    init_tracing();
    let angles = [0.3, -1.1, 0.8];
    for mask in 0..8u32 {
        let param = |k: usize| {
            if mask & (1 << k) != 0 {
                Param::new(angles[k])
            } else {
                Param::fixed(angles[k])
            }
        };
        let mut tape = Tape::new(
            vec![
                Operation::rx(Param::fixed(FRAC_PI_4), 0),
                Operation::rot(param(0), param(1), param(2), 0),
                Operation::ry(Param::fixed(0.2), 0),
            ],
            vec![expval(Observable::pauli_z(0)), expval(Observable::pauli_x(0))],
        );
        let mut dev = DefaultQubit::new(1).unwrap();

        let analytic = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
        let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
        assert_eq!(analytic.shape(), (2, mask.count_ones() as usize), "mask {:03b}", mask);
        assert_jacobians_close(&analytic, &numeric, 1e-6);
    }
}

#[test]
fn test_rot_middle_angle_only() {
    // only the RY angle moves <Z> when starting from |0>
    for theta in angle_grid() {
        let mut tape = Tape::new(
            vec![Operation::rot(Param::fixed(0.4), theta, Param::fixed(-1.3), 0)],
            vec![expval(Observable::pauli_z(0))],
        );
        let mut dev = DefaultQubit::new(1).unwrap();

        let jac = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
        assert_eq!(jac.shape(), (1, 1));
        assert_abs_diff_eq!(jac[(0, 0)], -theta.sin(), epsilon = 1e-10);
    }
}

#[test]
fn test_rot_all_columns_nonzero() {
    let mut tape = Tape::new(
        vec![
            Operation::ry(Param::fixed(0.3), 0),
            Operation::rx(Param::fixed(0.4), 0),
            Operation::rot(0.2, 0.5, 0.7, 0),
        ],
        vec![expval(Observable::pauli_x(0))],
    );
    let mut dev = DefaultQubit::new(1).unwrap();

    let jac = tape.jacobian(&mut dev, &JacobianOptions::default()).unwrap();
    assert_eq!(jac.shape(), (1, 3));
    assert!(jac.row(0).iter().all(|d| d.abs() > 1e-2), "{}", jac);

    let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
    assert_jacobians_close(&jac, &numeric, 1e-6);
}

#[test]
fn test_shared_value_fan_out() {
    init_tracing();
    let p2 = 0.7;
    for p1 in angle_grid() {
        let mut tape = Tape::record(|| {
            Operation::rx(Param::fixed(0.31), 0).queue();
            Operation::ry(p1, 0).queue();
            Operation::rz(p2, 0).queue();
            Operation::rx(p1, 0).queue();
            expval(Observable::pauli_z(0)).queue();
        })
        .unwrap();
        assert_eq!(
            tape.trainable_params().iter().copied().collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        let mut dev = DefaultQubit::new(1).unwrap();

        let jac = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
        assert_eq!(jac.shape(), (1, 3));

        let h = 1e-6;
        let plus = outputs(&mut tape, &mut dev, &[p1 + h, p2, p1 + h]);
        let less = outputs(&mut tape, &mut dev, &[p1 - h, p2, p1 - h]);
        let manual = (plus[0] - less[0]) / (2.0 * h);
        assert_abs_diff_eq!(jac[(0, 0)] + jac[(0, 2)], manual, epsilon = 1e-6);
    }
}

#[test]
fn test_independent_wires_give_diagonal() {
    let thetas = [0.1, 0.4, 1.3];
    let mut tape = Tape::new(
        thetas
            .iter()
            .enumerate()
            .map(|(w, &t)| Operation::rx(t, w))
            .collect(),
        (0..3).map(|w| expval(Observable::pauli_z(w))).collect(),
    );
    let mut dev = DefaultQubit::new(3).unwrap();

    let jac = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
    assert_eq!(jac.shape(), (3, 3));
    for row in 0..3 {
        for col in 0..3 {
            let expected = if row == col { -thetas[row].sin() } else { 0.0 };
            assert_abs_diff_eq!(jac[(row, col)], expected, epsilon = 1e-10);
        }
    }
}

#[test]
fn test_supported_gates_match_finite_differences() {
    init_tracing();
    let gates = vec![
        Operation::rx(0.37, 0),
        Operation::ry(0.37, 1),
        Operation::rz(0.37, 0),
        Operation::rot(0.1, -0.2, 0.3, 1),
    ];
    for gate in gates {
        let name = gate.name();
        let ops = vec![
            Operation::hadamard(0),
            Operation::cnot(0, 1),
            Operation::ry(Param::fixed(0.3), 1),
            gate,
            Operation::s(0),
            Operation::t(1),
            Operation::sx(0),
            Operation::cz(0, 1),
            Operation::swap(0, 1),
            Operation::rx(Param::fixed(-0.8), 0),
        ];
        let measurements = vec![
            expval(Observable::pauli_z(0)),
            expval(Observable::pauli_x(1)),
            expval(
                Observable::pauli_y(0)
                    .tensor(Observable::pauli_z(1))
                    .unwrap(),
            ),
        ];
        let mut tape = Tape::new(ops, measurements);
        let mut dev = DefaultQubit::new(2).unwrap();

        let analytic = tape.jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
        let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
        assert_eq!(analytic.rows(), 3, "{}", name);
        assert_jacobians_close(&analytic, &numeric, 1e-6);
    }
}

#[test]
fn test_tensor_observable_circuit() {
    let (a, b) = (0.54, 0.12);
    let mut tape = Tape::record(|| {
        Operation::rx(a, 0).queue();
        Operation::ry(b, 1).queue();
        Operation::cnot(0, 1).queue();
        let obs = Observable::pauli_x(0)
            .tensor(Observable::pauli_z(1))
            .unwrap();
        expval(obs).queue();
    })
    .unwrap();
    let mut dev = DefaultQubit::new(2).unwrap();

    let analytic = tape.jacobian(&mut dev, &JacobianOptions::default()).unwrap();
    let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
    assert_eq!(analytic.shape(), (1, 2));
    assert_jacobians_close(&analytic, &numeric, 1e-6);
}

#[test]
fn test_unsupported_gates_rejected_analytically() {
    let gates = vec![
        Operation::controlled_rotation(GateKind::CRX, 0.3, 0, 1).unwrap(),
        Operation::controlled_rotation(GateKind::CRY, 0.3, 0, 1).unwrap(),
        Operation::controlled_rotation(GateKind::CRZ, 0.3, 0, 1).unwrap(),
        Operation::crot(0.1, 0.2, 0.3, 0, 1).unwrap(),
        Operation::phase_shift(0.3, 0),
    ];
    for gate in gates {
        let name = gate.name();
        let mut tape = Tape::new(
            vec![Operation::hadamard(0), Operation::hadamard(1), gate],
            vec![expval(Observable::pauli_x(1))],
        );
        let mut dev = DefaultQubit::new(2).unwrap();

        let err = tape.jacobian(&mut dev, &JacobianOptions::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "The {} gate is not currently supported with the reversible gradient method",
                name
            )
        );
        assert_eq!(dev.executions(), 0);

        let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
        assert_eq!(numeric.rows(), 1);
    }
}

#[test]
fn test_unsupported_measurements_rejected_analytically() {
    let theta = 0.6;
    let mut dev = DefaultQubit::new(1).unwrap();

    let mut tape = Tape::new(vec![Operation::rx(theta, 0)], vec![var(Observable::pauli_z(0))]);
    let err = tape.jacobian(&mut dev, &JacobianOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Variance is not supported with the reversible gradient method"
    );
    // var = sin²θ
    let jac = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
    assert_abs_diff_eq!(jac[(0, 0)], (2.0 * theta).sin(), epsilon = 1e-6);

    let mut tape = Tape::new(vec![Operation::rx(theta, 0)], vec![probs(&[0usize])]);
    let err = tape.jacobian(&mut dev, &JacobianOptions::default()).unwrap_err();
    assert_eq!(
        err,
        GradientError::UnsupportedMeasurement {
            kind: ReturnType::Probability
        }
    );
    // p0 = cos²(θ/2)
    let jac = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
    assert_eq!(jac.shape(), (2, 1));
    assert_abs_diff_eq!(jac[(0, 0)], -theta.sin() / 2.0, epsilon = 1e-6);
    assert_abs_diff_eq!(jac[(1, 0)], theta.sin() / 2.0, epsilon = 1e-6);
}

#[test]
fn test_samples_not_differentiable() {
    let mut tape = Tape::new(
        vec![Operation::rx(0.6, 0)],
        vec![expval(Observable::pauli_x(0)), sample(Observable::pauli_z(0))],
    );
    let mut dev = DefaultQubit::new(1).unwrap();

    assert_eq!(
        tape.jacobian(&mut dev, &JacobianOptions::numeric()),
        Err(GradientError::SampleNotDifferentiable)
    );
    assert_eq!(
        tape.jacobian(&mut dev, &JacobianOptions::default()),
        Err(GradientError::UnsupportedMeasurement {
            kind: ReturnType::Sample
        })
    );
    assert_eq!(dev.executions(), 0);
}

#[test]
fn test_numeric_only_gate_falls_back() {
    let mut tape = Tape::new(
        vec![Operation::rx(0.3, 0), Operation::u3(0.2, 0.3, 0.4, 0)],
        vec![expval(Observable::pauli_x(0))],
    );
    let mut dev = DefaultQubit::new(1).unwrap();

    assert_eq!(
        tape.jacobian(&mut dev, &JacobianOptions::analytic()),
        Err(GradientError::AnalyticUnavailable {
            index: 1,
            gate: "U3".to_string()
        })
    );

    let best = tape.jacobian(&mut dev, &JacobianOptions::default()).unwrap();
    let numeric = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
    assert_eq!(best.shape(), (1, 4));
    assert_jacobians_close(&best, &numeric, 1e-6);
}

#[test]
fn test_execution_counts() {
    let build = || {
        Tape::new(
            vec![
                Operation::rx(0.1, 0),
                Operation::ry(0.2, 1),
                Operation::cnot(0, 1),
                Operation::rz(0.3, 1),
            ],
            vec![expval(Observable::pauli_z(1)), expval(Observable::pauli_x(0))],
        )
    };

    let mut dev = DefaultQubit::new(2).unwrap();
    build().jacobian(&mut dev, &JacobianOptions::analytic()).unwrap();
    assert_eq!(dev.executions(), 1);

    let mut dev = DefaultQubit::new(2).unwrap();
    build().jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
    assert_eq!(dev.executions(), 6);

    let mut dev = DefaultQubit::new(2).unwrap();
    let forward = JacobianOptions::numeric()
        .with_order(FiniteDifferenceOrder::Forward)
        .with_step(1e-7);
    build().jacobian(&mut dev, &forward).unwrap();
    assert_eq!(dev.executions(), 4);
}

#[test]
fn test_forward_differences() {
    let theta = 0.9;
    let mut tape = Tape::new(vec![Operation::ry(theta, 0)], vec![expval(Observable::pauli_z(0))]);
    let mut dev = DefaultQubit::new(1).unwrap();
    let options = JacobianOptions::numeric()
        .with_order(FiniteDifferenceOrder::Forward)
        .with_step(1e-6);
    let jac = tape.jacobian(&mut dev, &options).unwrap();
    assert_abs_diff_eq!(jac[(0, 0)], -theta.sin(), epsilon = 1e-5);
}

#[test]
fn test_device_without_state() {
    let mut tape = Tape::new(vec![Operation::rx(0.3, 0)], vec![expval(Observable::pauli_z(0))]);
    let mut dev = NoStateDevice(DefaultQubit::new(1).unwrap());

    assert_eq!(
        tape.jacobian(&mut dev, &JacobianOptions::analytic()),
        Err(GradientError::MissingState {
            device: "no.state".to_string()
        })
    );
    assert!(tape.jacobian(&mut dev, &JacobianOptions::numeric()).is_ok());
}

#[test]
fn test_parameters_restored_after_device_failure() {
    let mut tape = Tape::new(
        vec![Operation::rx(0.3, 0), Operation::ry(0.4, 1)],
        vec![expval(Observable::pauli_z(0))],
    );
    let before = tape.get_parameters(false);

    let err = tape
        .jacobian(&mut OfflineDevice, &JacobianOptions::numeric())
        .unwrap_err();
    assert_eq!(
        err,
        GradientError::Tape(TapeError::Device(DeviceError::Simulation(
            "device offline".to_string()
        )))
    );
    assert_eq!(tape.get_parameters(false), before);

    assert!(tape
        .jacobian(&mut OfflineDevice, &JacobianOptions::analytic())
        .is_err());
    assert_eq!(tape.get_parameters(false), before);
}

#[test]
fn test_invalid_options() {
    let mut tape = Tape::new(vec![Operation::rx(0.3, 0)], vec![expval(Observable::pauli_z(0))]);
    let mut dev = DefaultQubit::new(1).unwrap();
    let err = tape
        .jacobian(&mut dev, &JacobianOptions::numeric().with_step(-1.0))
        .unwrap_err();
    assert!(matches!(err, GradientError::InvalidConfig(_)));
    assert_eq!(dev.executions(), 0);
}

#[test]
fn test_no_trainable_parameters() {
    let mut tape = Tape::new(
        vec![Operation::rx(Param::fixed(0.3), 0)],
        vec![expval(Observable::pauli_z(0)), probs(&[0usize])],
    );
    let mut dev = DefaultQubit::new(1).unwrap();
    let jac = tape.jacobian(&mut dev, &JacobianOptions::numeric()).unwrap();
    assert_eq!(jac.shape(), (3, 0));
    assert_eq!(dev.executions(), 0);
}
