//! Circuits as ordered moments of operations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::gate::{Operation, Register};

/// Operations that act on disjoint qubits during the same time slice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Moment {
    operations: Vec<Operation>,
}

impl Moment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// True if any operation in this moment touches qubit `index`.
    pub fn touches(&self, index: usize) -> bool {
        self.operations
            .iter()
            .any(|op| op.targets.iter().any(|q| q.index == index))
    }

    fn push(&mut self, op: Operation) -> SimResult<()> {
        if let Some(q) = op.targets.iter().find(|q| self.touches(q.index)) {
            return Err(SimError::InvalidOperation(format!(
                "qubit '{}' already used in this moment",
                q.name
            )));
        }
        self.operations.push(op);
        Ok(())
    }
}

/// A register together with an ordered list of moments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    register: Register,
    moments: Vec<Moment>,
}

impl Circuit {
    pub fn new(register: Register) -> Self {
        Self {
            register,
            moments: Vec::new(),
        }
    }

    pub fn register(&self) -> &Register {
        &self.register
    }

    pub fn moments(&self) -> &[Moment] {
        &self.moments
    }

    /// Number of moments.
    pub fn len(&self) -> usize {
        self.moments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    pub fn operation_count(&self) -> usize {
        self.moments.iter().map(|m| m.operations.len()).sum()
    }

    /// Append `op` as a moment of its own.
    pub fn push_new_moment(&mut self, op: Operation) -> SimResult<()> {
        self.check_targets(&op)?;
        let mut moment = Moment::new();
        moment.push(op)?;
        self.moments.push(moment);
        Ok(())
    }

    /// Place `op` in the earliest moment after every moment that already
    /// touches one of its qubits.
    pub fn push_earliest(&mut self, op: Operation) -> SimResult<()> {
        self.check_targets(&op)?;
        let earliest = self
            .moments
            .iter()
            .rposition(|m| op.targets.iter().any(|q| m.touches(q.index)))
            .map(|i| i + 1)
            .unwrap_or(0);
        if earliest == self.moments.len() {
            self.moments.push(Moment::new());
        }
        self.moments[earliest].push(op)
    }

    fn check_targets(&self, op: &Operation) -> SimResult<()> {
        for q in &op.targets {
            let known = self.register.qubit(&q.name)?;
            if known.index != q.index {
                return Err(SimError::InvalidOperation(format!(
                    "qubit '{}' does not belong to this register",
                    q.name
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Circuit {
    /// Text diagram: one wire per qubit, one column per moment.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.register.len();
        let mut columns: Vec<Vec<String>> = Vec::with_capacity(self.moments.len());
        for moment in &self.moments {
            let mut cells = vec![String::new(); n];
            for op in moment.operations() {
                for (q, symbol) in op.targets.iter().zip(op.gate.wire_symbols()) {
                    cells[q.index] = symbol;
                }
            }
            columns.push(cells);
        }

        let label_width = self.register.iter().map(|q| q.name.len()).max().unwrap_or(0);
        for (row, qubit) in self.register.iter().enumerate() {
            write!(f, "{:>width$}: ───", qubit.name, width = label_width)?;
            for column in &columns {
                let width = column.iter().map(|s| s.chars().count()).max().unwrap_or(0).max(1);
                let cell = &column[row];
                let pad = width - cell.chars().count();
                if cell.is_empty() {
                    write!(f, "{}───", "─".repeat(width))?;
                } else {
                    write!(f, "{}{}───", cell, "─".repeat(pad))?;
                }
            }
            if row + 1 < n {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
