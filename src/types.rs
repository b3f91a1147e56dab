//! This module defines the core data structures and types used throughout the simulator,
//! including the binary machine representation, execution states, decision statuses and
//! error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::analyzer::validate;
use crate::Rule;

/// Number of bytes used to encode one transition: write, move, next state + 1.
pub const TRANSITION_WIDTH: usize = 3;
/// Number of bytes used to encode one state (a transition for each of the two symbols).
pub const STATE_WIDTH: usize = 2 * TRANSITION_WIDTH;
/// The default number of steps simulated after the initial configuration.
pub const DEFAULT_MAX_STEPS: usize = 1000;
/// The blank symbol. Every unvisited cell of the tape reads as this symbol.
pub const BLANK: u8 = 0;
/// Number of machines in the published seed database.
pub const DB_SIZE: usize = 88664064;

/// A 2-symbol Turing machine stored as its binary transition table.
///
/// Byte offset `6 * s + 3 * symbol` starts the transition of state `s` on `symbol`. A
/// transition is `write`, `move` (0 = right, 1 = left) and `next + 1` where 0 means halt.
/// A `Machine` is immutable once built and always satisfies those invariants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Machine {
    bytes: Vec<u8>,
}

impl Machine {
    /// Builds a machine from its raw transition table.
    ///
    /// # Returns
    ///
    /// * `Err(TuringMachineError::InvalidMachine)` if the length is not a non-zero multiple of
    ///   6 or a write/move byte is not 0 or 1.
    /// * `Err(TuringMachineError::InvalidState)` if a transition targets a state outside the table.
    pub fn new(bytes: Vec<u8>) -> Result<Self, TuringMachineError> {
        validate(&bytes)?;
        Ok(Self { bytes })
    }

    /// Decodes and validates a machine from its `m`-prefixed URL-safe base64 form.
    pub fn from_encoded(text: &str) -> Result<Self, TuringMachineError> {
        Self::new(crate::encoder::decode(text)?)
    }

    /// Returns the `m`-prefixed URL-safe base64 form of this machine.
    pub fn encode(&self) -> String {
        crate::encoder::encode(&self.bytes)
    }

    /// Number of states in the table.
    pub fn state_count(&self) -> usize {
        self.bytes.len() / STATE_WIDTH
    }

    /// The raw transition table.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the transition for `state` reading `symbol`.
    ///
    /// Any non-zero `symbol` is read as 1.
    pub fn transition(&self, state: usize, symbol: u8) -> Result<Transition, TuringMachineError> {
        if state >= self.state_count() {
            return Err(TuringMachineError::InvalidState(state));
        }

        let offset = STATE_WIDTH * state + TRANSITION_WIDTH * usize::from(symbol != BLANK);
        Ok(Transition::from_bytes(
            &self.bytes[offset..offset + TRANSITION_WIDTH],
        ))
    }

    /// Iterates over every `(state, symbol, transition)` triple in table order.
    pub fn transitions(&self) -> impl Iterator<Item = (usize, u8, Transition)> + '_ {
        self.bytes
            .chunks_exact(TRANSITION_WIDTH)
            .enumerate()
            .map(|(i, chunk)| (i / 2, (i % 2) as u8, Transition::from_bytes(chunk)))
    }
}

impl TryFrom<Vec<u8>> for Machine {
    type Error = TuringMachineError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        Self::new(bytes)
    }
}

impl From<Machine> for Vec<u8> {
    fn from(machine: Machine) -> Self {
        machine.bytes
    }
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// A single decoded transition of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The symbol written under the head.
    pub write: u8,
    /// Where the head moves after writing.
    pub direction: Direction,
    /// The 0-based successor state, or `None` when the transition halts.
    pub next: Option<usize>,
}

impl Transition {
    /// Decodes the 3-byte `write, move, next + 1` layout.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            write: bytes[0],
            direction: Direction::from_byte(bytes[1]),
            next: (bytes[2] as usize).checked_sub(1),
        }
    }

    /// Returns true if taking this transition halts the machine.
    pub fn is_halting(&self) -> bool {
        self.next.is_none()
    }
}

/// Represents the possible directions the head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the right (encoded as 0).
    Right,
    /// Move the head one position to the left (encoded as 1).
    Left,
}

impl Direction {
    pub fn from_byte(byte: u8) -> Self {
        if byte == 0 {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Direction::Right => 0,
            Direction::Left => 1,
        }
    }

    /// The offset applied to the head position.
    pub fn delta(self) -> i64 {
        match self {
            Direction::Right => 1,
            Direction::Left => -1,
        }
    }

    /// The single letter used by the text table format.
    pub fn letter(self) -> char {
        match self {
            Direction::Right => 'R',
            Direction::Left => 'L',
        }
    }
}

/// The control state of a running machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    /// Running in the 0-based state index.
    Running(usize),
    /// A halting transition was taken.
    Halted,
}

impl State {
    /// The initial state `A`.
    pub const START: State = State::Running(0);

    /// Returns the state index, or `None` once halted.
    pub fn index(&self) -> Option<usize> {
        match self {
            State::Running(index) => Some(*index),
            State::Halted => None,
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, State::Halted)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            State::Running(index) => write!(f, "{}", state_letter(*index)),
            State::Halted => f.write_str("-"),
        }
    }
}

/// Returns the letter naming state `index`: `A`, `B`, `C`, ...
pub fn state_letter(index: usize) -> char {
    u32::try_from(index)
        .ok()
        .and_then(|i| char::from_u32(u32::from(b'A') + i))
        .unwrap_or('?')
}

/// Represents the outcome of a single application of the step engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The transition was applied; the machine continues in `state` with the head at `head`.
    Continue { state: usize, head: i64 },
    /// The transition read is a halting one. The tape is left untouched.
    Halt,
}

/// Halting classification attached to a machine by an external decider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStatus {
    Undecided,
    HeuristicallyDecidedHalt,
    HeuristicallyDecidedNonHalt,
    DecidedHalt,
    DecidedNonHalt,
}

impl DecisionStatus {
    /// Maps a status code reported by the external classifier.
    ///
    /// `"heuristic"` results are reported as `Undecided`: heuristic verdicts are not
    /// surfaced yet.
    pub fn from_api_status(status: Option<&str>) -> Option<Self> {
        let status = status?;

        Some(match status {
            "decided" => DecisionStatus::DecidedNonHalt,
            "heuristic" => DecisionStatus::Undecided,
            _ => DecisionStatus::Undecided,
        })
    }
}

/// A machine together with the metadata carried by the text table format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Program {
    /// Display name, empty when the source does not provide one.
    pub name: String,
    /// The initial tape as a bitstring.
    pub tape: String,
    /// The transition table.
    pub machine: Machine,
}

/// Represents various errors that can occur while decoding, loading or running a machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// The encoded machine string is malformed.
    #[error("Invalid machine encoding: {0}")]
    Format(String),
    /// A transition or lookup references a state outside the table.
    #[error("Invalid state: {0}")]
    InvalidState(usize),
    /// The transition table itself is malformed.
    #[error("Invalid machine: {0}")]
    InvalidMachine(String),
    /// Indicates an error while parsing a text table.
    #[error("Table parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    /// A catalogue lookup found nothing.
    #[error("Not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENARIO: [u8; 12] = [1, 0, 2, 1, 1, 2, 0, 0, 0, 0, 0, 0];

    #[test]
    fn test_machine_state_count() {
        let machine = Machine::new(SCENARIO.to_vec()).unwrap();
        assert_eq!(machine.state_count(), 2);
        assert_eq!(machine.bytes(), &SCENARIO);
    }

    #[test]
    fn test_machine_rejects_bad_length() {
        let result = Machine::new(vec![1, 0, 1, 1, 0]);
        assert!(matches!(result, Err(TuringMachineError::InvalidMachine(_))));

        let result = Machine::new(Vec::new());
        assert!(matches!(result, Err(TuringMachineError::InvalidMachine(_))));
    }

    #[test]
    fn test_machine_rejects_out_of_range_next_state() {
        let result = Machine::new(vec![1, 0, 3, 1, 0, 1]);
        assert_eq!(result, Err(TuringMachineError::InvalidState(2)));
    }

    #[test]
    fn test_transition_lookup() {
        let machine = Machine::new(SCENARIO.to_vec()).unwrap();

        let t = machine.transition(0, 1).unwrap();
        assert_eq!(t.write, 1);
        assert_eq!(t.direction, Direction::Left);
        assert_eq!(t.next, Some(1));

        let t = machine.transition(1, 0).unwrap();
        assert!(t.is_halting());

        assert_eq!(
            machine.transition(2, 0),
            Err(TuringMachineError::InvalidState(2))
        );
    }

    #[test]
    fn test_transitions_iterates_in_table_order() {
        let machine = Machine::new(SCENARIO.to_vec()).unwrap();
        let keys: Vec<_> = machine.transitions().map(|(s, sym, _)| (s, sym)).collect();
        assert_eq!(keys, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_state_letters() {
        assert_eq!(state_letter(0), 'A');
        assert_eq!(state_letter(4), 'E');
        assert_eq!(State::Running(1).to_string(), "B");
        assert_eq!(State::Halted.to_string(), "-");
        assert_eq!(State::START.index(), Some(0));
        assert_eq!(State::Halted.index(), None);
    }

    #[test]
    fn test_decision_status_mapping() {
        assert_eq!(DecisionStatus::from_api_status(None), None);
        assert_eq!(
            DecisionStatus::from_api_status(Some("decided")),
            Some(DecisionStatus::DecidedNonHalt)
        );
        assert_eq!(
            DecisionStatus::from_api_status(Some("heuristic")),
            Some(DecisionStatus::Undecided)
        );
        assert_eq!(
            DecisionStatus::from_api_status(Some("anything")),
            Some(DecisionStatus::Undecided)
        );
    }

    #[test]
    fn test_decision_status_serialization() {
        let json = serde_json::to_string(&DecisionStatus::DecidedNonHalt).unwrap();
        assert_eq!(json, "\"DECIDED_NON_HALT\"");
    }

    #[test]
    fn test_machine_serde_validates() {
        let json = serde_json::to_string(&Machine::new(SCENARIO.to_vec()).unwrap()).unwrap();
        assert_eq!(json, "[1,0,2,1,1,2,0,0,0,0,0,0]");

        let result: Result<Machine, _> = serde_json::from_str("[1,0,2]");
        assert!(result.is_err());
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::InvalidState(7);

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Invalid state"));
        assert!(error_msg.contains('7'));
    }
}
