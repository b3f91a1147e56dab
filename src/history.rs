//! This module unrolls a machine into its execution history: one snapshot per step,
//! each holding its own copy of the tape so any row can be inspected on its own.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::machine::TuringMachine;
use crate::tape::Tape;
use crate::types::{Machine, State, Step, DEFAULT_MAX_STEPS};

/// The configuration of the machine at one point of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tape: Tape,
    pub state: State,
    /// Head position. On the halted row this is where the halting transition was read.
    pub head: i64,
}

/// An ordered, finite trace of a run. Row 0 is the initial configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct History {
    snapshots: Vec<Snapshot>,
}

impl History {
    /// Simulates `machine` from state `A`, head 0, over `initial_tape`.
    ///
    /// At most `max_steps` steps are taken after the initial snapshot. If the machine halts
    /// first, a final row in the halted state is appended and the run stops there, so a
    /// machine halting on its `k`-th step yields `k + 1` rows.
    pub fn run(machine: &Machine, initial_tape: &str, max_steps: usize) -> Self {
        let state_count = machine.state_count();
        let mut tm = TuringMachine::new(machine.clone(), Tape::from_bits(initial_tape));
        let mut snapshots = vec![Self::snapshot(&tm)];

        for _ in 0..max_steps {
            let result = match tm.step() {
                Ok(result) => result,
                Err(e) => {
                    warn!("run stopped at step {}: {}", tm.step_count(), e);
                    break;
                }
            };
            snapshots.push(Self::snapshot(&tm));

            match result {
                Step::Halt => break,
                Step::Continue { state, .. } if state >= state_count => {
                    warn!("run stopped: state {} is outside the table", state);
                    break;
                }
                Step::Continue { .. } => {}
            }
        }

        debug!(
            "history of {} rows, final state {}",
            snapshots.len(),
            tm.state()
        );

        Self { snapshots }
    }

    /// `run` with a blank initial tape and the default step bound.
    pub fn from_blank(machine: &Machine) -> Self {
        Self::run(machine, "0", DEFAULT_MAX_STEPS)
    }

    fn snapshot(tm: &TuringMachine) -> Snapshot {
        Snapshot {
            tape: tm.tape().clone(),
            state: tm.state(),
            head: tm.head(),
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&Snapshot> {
        self.snapshots.get(row)
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Returns true if the trace ends in the halted state.
    pub fn halted(&self) -> bool {
        self.last().is_some_and(|s| s.state.is_halted())
    }

    /// The smallest and largest positions touched by any row, head positions included.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        self.snapshots
            .iter()
            .flat_map(|s| {
                s.tape
                    .bounds()
                    .into_iter()
                    .flat_map(|(lo, hi)| [lo, hi])
                    .chain(std::iter::once(s.head))
            })
            .fold(None, |acc, p| {
                Some(match acc {
                    None => (p, p),
                    Some((lo, hi)) => (lo.min(p), hi.max(p)),
                })
            })
    }

    /// Renders one row as `step state cells`, cells covering positions `lo..=hi`.
    ///
    /// Each cell takes three columns, ` 0 ` or ` 1 `, with the head cell shown as `[0]` or `[1]`.
    pub fn format_row(&self, row: usize, lo: i64, hi: i64) -> Option<String> {
        let snapshot = self.get(row)?;

        let cells: String = (lo..=hi)
            .map(|position| {
                let symbol = snapshot.tape.get(position);
                if position == snapshot.head {
                    format!("[{symbol}]")
                } else {
                    format!(" {symbol} ")
                }
            })
            .collect();

        Some(format!("{:>6} {} {}", row, snapshot.state, cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Machine {
        Machine::new(vec![1, 0, 2, 1, 1, 2, 0, 0, 0, 0, 0, 0]).unwrap()
    }

    fn runner() -> Machine {
        // A writes 1, moves right and stays in A on both symbols.
        Machine::new(vec![1, 0, 1, 1, 0, 1]).unwrap()
    }

    #[test]
    fn test_initial_snapshot() {
        let history = History::run(&runner(), "0", 0);

        assert_eq!(history.len(), 1);
        let first = history.get(0).unwrap();
        assert_eq!(first.state, State::START);
        assert_eq!(first.head, 0);
        assert_eq!(first.tape, Tape::from_bits("0"));
    }

    #[test]
    fn test_step_bound() {
        let history = History::run(&runner(), "0", 10);

        assert_eq!(history.len(), 11);
        assert!(!history.halted());
        let last = history.last().unwrap();
        assert_eq!(last.state, State::Running(0));
        assert_eq!(last.head, 10);
        assert_eq!(last.tape.ones(), 10);
    }

    #[test]
    fn test_scenario_halts_after_one_move() {
        let history = History::run(&scenario(), "0", DEFAULT_MAX_STEPS);

        assert_eq!(history.len(), 3);
        assert!(history.halted());
        assert_eq!(history.get(1).unwrap().state, State::Running(1));
        assert_eq!(history.get(1).unwrap().head, 1);
        assert_eq!(history.last().unwrap().tape.get(0), 1);
    }

    #[test]
    fn test_immediate_halt() {
        let machine = Machine::new(vec![0, 0, 0, 0, 0, 0]).unwrap();
        let history = History::from_blank(&machine);

        assert_eq!(history.len(), 2);
        assert!(history.halted());
        assert_eq!(history.get(1).unwrap().tape, history.get(0).unwrap().tape);
    }

    #[test]
    fn test_rows_are_independent_copies() {
        let history = History::run(&runner(), "0", 3);

        assert_eq!(history.get(0).unwrap().tape.ones(), 0);
        assert_eq!(history.get(1).unwrap().tape.ones(), 1);
        assert_eq!(history.get(2).unwrap().tape.ones(), 2);
        assert_eq!(history.get(3).unwrap().tape.ones(), 3);
    }

    #[test]
    fn test_initial_tape_is_read() {
        // Reading 1 in A moves left, so the initial tape changes the run.
        let history = History::run(&scenario(), "1", DEFAULT_MAX_STEPS);

        assert_eq!(history.get(1).unwrap().head, -1);
    }

    #[test]
    fn test_bounds_include_head() {
        let history = History::run(&runner(), "0", 4);
        assert_eq!(history.bounds(), Some((0, 4)));
    }

    #[test]
    fn test_format_row() {
        let history = History::run(&scenario(), "0", DEFAULT_MAX_STEPS);

        assert_eq!(
            history.format_row(0, -1, 1).unwrap(),
            "     0 A  0 [0] 0 "
        );
        assert_eq!(
            history.format_row(1, -1, 1).unwrap(),
            "     1 B  0  1 [0]"
        );
        assert_eq!(
            history.format_row(2, 0, 1).unwrap(),
            "     2 -  1 [0]"
        );
        assert!(history.format_row(3, 0, 1).is_none());
    }

    #[test]
    fn test_history_serializes() {
        let history = History::run(&scenario(), "0", 1);
        let json = serde_json::to_string(&history).unwrap();
        let back: History = serde_json::from_str(&json).unwrap();
        assert_eq!(back, history);
    }
}
