//! Plain-text rendering of sessions for the `run` and `describe` commands.

use std::fmt::Write;

use qsim_core::linalg::{round_to, MAX_DECIMALS};
use qsim_core::session::{Measurement, QubitBloch};
use qsim_core::{Scenario, StepReport, Verdict};

/// Title, qubits and circuit diagram of a scenario.
pub fn render_scenario(scenario: &dyn Scenario) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "{} ({})", scenario.title(), scenario.name())?;
    writeln!(out, "Qubits: {}", scenario.register().names().join(", "))?;
    writeln!(out)?;
    writeln!(out, "{}", scenario.circuit()?)?;
    for (i, step) in scenario.script()?.iter().enumerate() {
        writeln!(out, "{:>3}. {:<24} {}", i + 1, step.operation.to_string(), step.description)?;
    }
    Ok(out)
}

pub fn render_vector(vector: [f64; 3], decimals: usize) -> String {
    let decimals = decimals.min(MAX_DECIMALS);
    let [x, y, z] = vector.map(|c| round_to(c, decimals));
    format!("({:.*}, {:.*}, {:.*})", decimals, x, decimals, y, decimals, z)
}

pub fn render_bloch(bloch: &QubitBloch, decimals: usize) -> String {
    let mut line = format!("{}: {}", bloch.name, render_vector(bloch.vector, decimals));
    if bloch.entangled {
        line.push_str("  [entangled]");
    }
    line
}

pub fn render_entangled(names: &[String]) -> String {
    if names.is_empty() {
        "No entanglement".to_string()
    } else {
        format!("ENTANGLEMENT DETECTED between: {}", names.join(", "))
    }
}

pub fn render_measurement(measurement: &Measurement) -> String {
    format!("Measured {} = {}", measurement.qubit, u8::from(measurement.outcome))
}

/// Block of text describing one step.
pub fn render_step(report: &StepReport, total: usize, decimals: usize) -> String {
    let mut lines = vec![
        format!("Step {}/{}: {}", report.index + 1, total, report.description),
        format!("  Operation: {}", report.operation),
        format!("  State: {}", report.state.dirac_notation(decimals)),
        "  Bloch vectors:".to_string(),
    ];
    lines.extend(report.bloch.iter().map(|b| format!("    {}", render_bloch(b, decimals))));
    if let Some(measurement) = &report.measured {
        lines.push(format!("  {}", render_measurement(measurement)));
    }
    if report.is_entangled() {
        lines.push(format!("  {}", render_entangled(&report.entangled)));
    }
    lines.join("\n")
}

pub fn render_verdict(verdict: &Verdict) -> String {
    let mark = if verdict.success { "SUCCESS" } else { "FAILURE" };
    format!("[{}] {}", mark, verdict.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsim_core::scenarios::BellPair;
    use qsim_core::{Session, Simulator};

    #[test]
    fn test_render_vector_rounds_and_clears_negative_zero() {
        assert_eq!(render_vector([1.0, -0.00001, 0.5], 2), "(1.00, 0.00, 0.50)");
    }

    #[test]
    fn test_render_vector_clamps_decimals() {
        let text = render_vector([0.0, 0.0, 1.0], 400);
        assert_eq!(text, "(0.000000000000000, 0.000000000000000, 1.000000000000000)");
    }

    #[test]
    fn test_render_bloch_marks_entangled() {
        let bloch = QubitBloch {
            name: "alice".to_string(),
            vector: [0.0, 0.0, 0.0],
            entangled: true,
        };
        assert_eq!(render_bloch(&bloch, 1), "alice: (0.0, 0.0, 0.0)  [entangled]");
    }

    #[test]
    fn test_render_entangled() {
        assert_eq!(render_entangled(&[]), "No entanglement");
        let names = vec!["alice".to_string(), "bob".to_string()];
        assert_eq!(render_entangled(&names), "ENTANGLEMENT DETECTED between: alice, bob");
    }

    #[test]
    fn test_render_bell_steps() {
        let mut session = Session::new(Box::new(BellPair::new().unwrap()), Simulator::seeded(1)).unwrap();
        let reports = session.run_to_end().unwrap();
        let second = render_step(&reports[1], reports.len(), 4);
        assert!(second.starts_with("Step 2/6:"));
        assert!(second.contains("CNOT(alice, bob)"));
        assert!(second.contains("0.7071|00⟩ + 0.7071|11⟩"));
        assert!(second.contains("ENTANGLEMENT DETECTED between: alice, bob"));

        let measured = render_step(&reports[4], reports.len(), 4);
        assert!(measured.contains("Measured alice = "));

        let verdict = render_verdict(&session.finish().unwrap());
        assert_eq!(verdict, "[SUCCESS] Nothing to check here ;)");
    }

    #[test]
    fn test_render_scenario_lists_script() {
        let text = render_scenario(&BellPair::new().unwrap()).unwrap();
        assert!(text.contains("Qubits: alice, bob"));
        assert!(text.contains("alice: ───"));
        assert!(text.lines().any(|l| l.trim_start().starts_with("1. H(alice)")));
    }
}
