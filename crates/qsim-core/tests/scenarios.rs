use qsim_core::scenarios::{DeutschJozsa, Oracle, SetupGate, Teleportation};
use qsim_core::{ScenarioConfig, ScenarioRegistry, Session, Simulator};

fn run(config: ScenarioConfig, seed: u64) -> (Session, Vec<qsim_core::StepReport>) {
    let registry = ScenarioRegistry::with_builtins();
    let scenario = registry.build(&config).unwrap();
    let mut session = Session::new(scenario, Simulator::seeded(seed)).unwrap();
    let reports = session.run_to_end().unwrap();
    (session, reports)
}

#[test]
fn teleportation_succeeds_for_every_setup() {
    for gate in [SetupGate::X, SetupGate::T] {
        for phase in [0.0, 0.25, 0.5, 0.73, 1.0] {
            for seed in 0..8 {
                let config = ScenarioConfig::new("teleportation")
                    .with_gate(gate)
                    .with_phase(phase);
                let (session, reports) = run(config, seed);
                assert_eq!(reports.len(), 9);
                let verdict = session.finish().unwrap();
                assert!(
                    verdict.success,
                    "teleportation failed for {:?}^{} with seed {}",
                    gate, phase, seed
                );
                assert_eq!(verdict.message, "Teleportation succeeded!");
            }
        }
    }
}

#[test]
fn teleportation_detects_bell_pair_then_three_way_entanglement() {
    let scenario = Teleportation::new(SetupGate::X, 0.5).unwrap();
    let mut session = Session::new(Box::new(scenario), Simulator::seeded(4)).unwrap();
    let reports = session.run_to_end().unwrap();

    // After preparing the message only, nothing is entangled.
    assert!(reports[0].entangled.is_empty());
    // Bell pair between Alice and Bob.
    assert_eq!(reports[2].entangled, vec!["alice", "bob"]);
    // CNOT(msg, alice) involves the message as well.
    assert_eq!(reports[3].entangled, vec!["msg", "alice", "bob"]);
    // Measuring the message removes it.
    assert!(!reports[5].entangled.contains(&"msg".to_string()));
    assert_eq!(reports[5].measured.as_ref().unwrap().qubit, "msg");
}

#[test]
fn deutsch_jozsa_identifies_constant_functions() {
    // f(x) = 0 and f(x) = 1
    for digits in ["12345678", "21436587"] {
        for seed in 0..4 {
            let (session, _) = run(ScenarioConfig::new("deutsch-jozsa").with_oracle(digits), seed);
            let verdict = session.finish().unwrap();
            assert!(verdict.success, "oracle {} should be constant", digits);
            assert_eq!(verdict.message, "The function is constant");
        }
    }
}

#[test]
fn deutsch_jozsa_identifies_balanced_functions() {
    // f(x) = x1, f(x) = x2 and f(x) = x1 xor x2
    for digits in ["12346587", "12435687", "12436578"] {
        for seed in 0..4 {
            let oracle = Oracle::parse(digits).unwrap();
            let scenario = DeutschJozsa::new(oracle).unwrap();
            let mut session = Session::new(Box::new(scenario), Simulator::seeded(seed)).unwrap();
            session.run_to_end().unwrap();
            let verdict = session.finish().unwrap();
            assert!(!verdict.success, "oracle {} should be balanced", digits);
            assert_eq!(verdict.message, "The function is balanced");
        }
    }
}

#[test]
fn bell_measurements_always_agree() {
    for seed in 0..16 {
        let (session, reports) = run(ScenarioConfig::new("bell"), seed);
        let alice = reports[4].measured.as_ref().unwrap();
        let bob = reports[5].measured.as_ref().unwrap();
        assert_eq!(alice.outcome, bob.outcome);
        assert!(session.finish().unwrap().success);
    }
}

#[test]
fn bloch_vectors_are_unit_for_product_states() {
    let (_, reports) = run(ScenarioConfig::new("bell"), 0);
    let first = &reports[0];
    // H on Alice: |+>
    assert_eq!(first.bloch[0].vector, [1.0, 0.0, 0.0]);
    assert_eq!(first.bloch[1].vector, [0.0, 0.0, 1.0]);
    // Entangled qubits have a zero-length Bloch vector.
    assert_eq!(reports[1].bloch[0].vector, [0.0, 0.0, 0.0]);
}

#[test]
fn reports_serialize_to_json() {
    let (_, reports) = run(ScenarioConfig::new("deutsch-jozsa"), 9);
    let json = serde_json::to_value(&reports).unwrap();
    let steps = json.as_array().unwrap();
    assert_eq!(steps.len(), 11);
    assert_eq!(steps[4]["operation"], "Uf(q1, q2, control)");
    assert_eq!(steps[8]["measured"]["qubit"], "q1");
}
