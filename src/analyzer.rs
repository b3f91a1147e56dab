//! This module checks transition tables. `validate` enforces the invariants every `Machine`
//! holds, while `analyze` reports findings that are legal but usually unintended, such as
//! states that can never be entered.

use crate::types::{Machine, TuringMachineError, STATE_WIDTH, TRANSITION_WIDTH};
use std::collections::HashSet;

/// Represents the problems that can be found in a transition table.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The table length is zero or not a multiple of 6.
    InvalidLength(usize),
    /// A write byte other than 0 or 1.
    InvalidSymbol { state: usize, symbol: u8, value: u8 },
    /// A move byte other than 0 or 1.
    InvalidMove { state: usize, symbol: u8, value: u8 },
    /// A transition targets a state past the end of the table.
    UndefinedNextState { state: usize, symbol: u8, target: usize },
    /// States that no sequence of transitions from `A` can enter.
    UnreachableStates(Vec<usize>),
    /// No transition halts, so the machine can never halt.
    NoHaltingTransition,
}

impl From<AnalysisError> for TuringMachineError {
    /// Converts an `AnalysisError` into the matching `TuringMachineError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::InvalidLength(len) => TuringMachineError::InvalidMachine(format!(
                "table length {} is not a positive multiple of {}",
                len, STATE_WIDTH
            )),
            AnalysisError::InvalidSymbol {
                state,
                symbol,
                value,
            } => TuringMachineError::InvalidMachine(format!(
                "state {} symbol {} writes {}",
                state, symbol, value
            )),
            AnalysisError::InvalidMove {
                state,
                symbol,
                value,
            } => TuringMachineError::InvalidMachine(format!(
                "state {} symbol {} moves {}",
                state, symbol, value
            )),
            AnalysisError::UndefinedNextState { target, .. } => {
                TuringMachineError::InvalidState(target)
            }
            AnalysisError::UnreachableStates(states) => TuringMachineError::InvalidMachine(
                format!("unreachable states: {:?}", states),
            ),
            AnalysisError::NoHaltingTransition => {
                TuringMachineError::InvalidMachine("no halting transition".to_string())
            }
        }
    }
}

/// Validates a raw transition table.
///
/// # Returns
///
/// * `Ok(())` if `bytes` can back a `Machine`.
/// * `Err(TuringMachineError)` for the first violated invariant.
pub fn validate(bytes: &[u8]) -> Result<(), TuringMachineError> {
    check_length(bytes)?;
    check_fields(bytes)?;
    Ok(())
}

/// Analyzes a machine for legal but suspicious structure.
///
/// # Returns
///
/// * `Vec<AnalysisError>` - every finding, empty when nothing was found.
pub fn analyze(machine: &Machine) -> Vec<AnalysisError> {
    [check_reachable_states, check_halting_transition]
        .iter()
        .filter_map(|f| f(machine).err())
        .collect()
}

/// Checks that the table holds a whole, non-zero number of states.
fn check_length(bytes: &[u8]) -> Result<(), AnalysisError> {
    if bytes.is_empty() || bytes.len() % STATE_WIDTH != 0 {
        return Err(AnalysisError::InvalidLength(bytes.len()));
    }

    Ok(())
}

/// Checks the write, move and next-state bytes of every transition.
fn check_fields(bytes: &[u8]) -> Result<(), AnalysisError> {
    let state_count = bytes.len() / STATE_WIDTH;

    for (i, t) in bytes.chunks_exact(TRANSITION_WIDTH).enumerate() {
        let (state, symbol) = (i / 2, (i % 2) as u8);

        if t[0] > 1 {
            return Err(AnalysisError::InvalidSymbol {
                state,
                symbol,
                value: t[0],
            });
        }
        if t[1] > 1 {
            return Err(AnalysisError::InvalidMove {
                state,
                symbol,
                value: t[1],
            });
        }
        if usize::from(t[2]) > state_count {
            return Err(AnalysisError::UndefinedNextState {
                state,
                symbol,
                target: usize::from(t[2]) - 1,
            });
        }
    }

    Ok(())
}

/// Finds states that cannot be reached from the start state.
fn check_reachable_states(machine: &Machine) -> Result<(), AnalysisError> {
    let mut reachable = HashSet::from([0]);
    let mut to_visit = vec![0];

    while let Some(state) = to_visit.pop() {
        for symbol in 0..2 {
            let Ok(transition) = machine.transition(state, symbol) else {
                continue;
            };
            if let Some(next) = transition.next {
                if reachable.insert(next) {
                    to_visit.push(next);
                }
            }
        }
    }

    let unreachable: Vec<usize> = (0..machine.state_count())
        .filter(|state| !reachable.contains(state))
        .collect();

    if !unreachable.is_empty() {
        return Err(AnalysisError::UnreachableStates(unreachable));
    }

    Ok(())
}

/// Checks that at least one transition halts.
fn check_halting_transition(machine: &Machine) -> Result<(), AnalysisError> {
    if machine.transitions().any(|(_, _, t)| t.is_halting()) {
        Ok(())
    } else {
        Err(AnalysisError::NoHaltingTransition)
    }
}
