use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use qtape_core::{expval, Observable, Operation, Tape};
use qtape_sim::{DefaultQubit, Differentiable, JacobianOptions};

// Layered RX/RY ansatz with a CNOT ladder between layers
fn create_param_tape(num_wires: usize, depth: usize) -> Tape {
    let mut ops = Vec::with_capacity(num_wires * depth * 3);
    let mut angle = 0.0;
    for d in 0..depth {
        for w in 0..num_wires {
            angle += 0.1;
            ops.push(Operation::rx(angle, w));
            ops.push(Operation::ry(angle * 0.5, w));
        }
        if d < depth - 1 {
            for w in 0..(num_wires - 1) {
                ops.push(Operation::cnot(w, w + 1));
            }
        }
    }
    let measurements = (0..num_wires)
        .map(|w| expval(Observable::pauli_z(w)))
        .collect();
    Tape::new(ops, measurements)
}

fn bench_jacobian(c: &mut Criterion) {
    let mut group = c.benchmark_group("jacobian");

    for num_wires in [4, 8].iter() {
        let depth = 3;
        let num_params = num_wires * depth * 2;
        let label = format!("{}q_d{}_{}params", num_wires, depth, num_params);

        for (name, options) in [
            ("reversible", JacobianOptions::analytic()),
            ("central_difference", JacobianOptions::numeric()),
        ] {
            group.bench_with_input(BenchmarkId::new(name, &label), num_wires, |b, &n| {
                let mut tape = create_param_tape(n, depth);
                let mut dev = DefaultQubit::new(n).unwrap();
                b.iter(|| {
                    let jac = tape.jacobian(&mut dev, black_box(&options)).unwrap();
                    black_box(jac);
                })
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_jacobian);
criterion_main!(benches);
