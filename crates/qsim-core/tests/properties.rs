use proptest::prelude::*;

use qsim_core::entanglement::{detect_tripartite, schmidt_coefficients};
use qsim_core::scenarios::{Oracle, OracleInput};
use qsim_core::{Gate, StateVector};

fn single_qubit_gate() -> impl Strategy<Value = Gate> {
    prop_oneof![
        Just(Gate::H),
        Just(Gate::X),
        Just(Gate::Y),
        Just(Gate::Z),
        Just(Gate::S),
        Just(Gate::T),
        (0.0f64..=2.0).prop_map(Gate::XPow),
        (0.0f64..=2.0).prop_map(Gate::ZPow),
    ]
}

/// A random circuit on three qubits as (gate, targets) pairs.
fn circuit_ops() -> impl Strategy<Value = Vec<(Gate, Vec<usize>)>> {
    let single = (single_qubit_gate(), 0usize..3).prop_map(|(g, t)| (g, vec![t]));
    let pair = (prop_oneof![Just(Gate::Cnot), Just(Gate::Cz)], 0usize..3, 1usize..3)
        .prop_map(|(g, c, offset)| (g, vec![c, (c + offset) % 3]));
    prop::collection::vec(prop_oneof![single, pair], 0..24)
}

fn run(ops: &[(Gate, Vec<usize>)]) -> StateVector {
    let mut state = StateVector::zero(3);
    for (gate, targets) in ops {
        state.apply(&gate.matrix().unwrap(), targets).unwrap();
    }
    state
}

proptest! {
    #[test]
    fn power_gates_are_unitary(t in -4.0f64..4.0) {
        prop_assert!(Gate::XPow(t).matrix().unwrap().is_unitary(1e-9));
        prop_assert!(Gate::ZPow(t).matrix().unwrap().is_unitary(1e-9));
    }

    #[test]
    fn gates_preserve_norm(ops in circuit_ops()) {
        let state = run(&ops);
        prop_assert!((state.norm() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reduced_density_matrices_have_unit_trace(ops in circuit_ops(), q in 0usize..3) {
        let state = run(&ops);
        let rho = state.density_matrix_of(&[q]).unwrap();
        prop_assert!((rho.trace().unwrap().re - 1.0).abs() < 1e-9);
        let bloch = state.bloch_vector_of(q).unwrap();
        let length = bloch.iter().map(|c| c * c).sum::<f64>().sqrt();
        prop_assert!(length <= 1.0 + 1e-9);
    }

    #[test]
    fn local_gates_never_create_entanglement(
        gates in prop::collection::vec((single_qubit_gate(), 0usize..3), 0..16)
    ) {
        let ops: Vec<(Gate, Vec<usize>)> = gates.into_iter().map(|(g, t)| (g, vec![t])).collect();
        let state = run(&ops);
        prop_assert!(!detect_tripartite(&state, [0, 1, 2]).unwrap().is_entangled());
    }

    #[test]
    fn schmidt_coefficients_are_normalised(
        a in single_qubit_gate(), b in single_qubit_gate(), entangle in any::<bool>()
    ) {
        let mut state = StateVector::zero(2);
        state.apply(&a.matrix().unwrap(), &[0]).unwrap();
        state.apply(&b.matrix().unwrap(), &[1]).unwrap();
        if entangle {
            state.apply(&Gate::Cnot.matrix().unwrap(), &[0, 1]).unwrap();
        }
        let [high, low] = schmidt_coefficients(&state).unwrap();
        prop_assert!(high >= low);
        prop_assert!((high * high + low * low - 1.0).abs() < 1e-9);
    }

    #[test]
    fn oracle_permutations_parse(perm in Just((1u8..=8).collect::<Vec<_>>()).prop_shuffle()) {
        let digits: String = perm.iter().map(|d| char::from(b'0' + d)).collect();
        prop_assert_eq!(Oracle::validate(&digits), OracleInput::Acceptable);
        let oracle = Oracle::parse(&digits).unwrap();
        prop_assert!(oracle.matrix().is_unitary(1e-12));
        prop_assert_eq!(Oracle::validate(&digits[..5]), OracleInput::Intermediate);
    }
}
