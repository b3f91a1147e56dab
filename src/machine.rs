//! This module defines the step engine and the `TuringMachine` struct, which runs a binary
//! transition table over an unbounded tape.

use tracing::{debug, trace};

use crate::tape::Tape;
use crate::types::{Machine, State, Step, TuringMachineError};

/// Applies one transition of `machine` to `tape`.
///
/// Reads the symbol under `head` and looks up the transition of `state` for it. A halting
/// transition leaves the tape untouched and yields `Step::Halt`. Otherwise the transition's
/// symbol is written at `head` and the new state and head position are returned.
///
/// # Returns
///
/// * `Err(TuringMachineError::InvalidState)` if `state` is outside the table.
pub fn step(
    machine: &Machine,
    state: usize,
    head: i64,
    tape: &mut Tape,
) -> Result<Step, TuringMachineError> {
    let transition = machine.transition(state, tape.get(head))?;

    let Some(next) = transition.next else {
        return Ok(Step::Halt);
    };

    tape.set(head, transition.write);

    Ok(Step::Continue {
        state: next,
        head: head + transition.direction.delta(),
    })
}

/// A running binary Turing machine.
///
/// Owns the transition table together with the tape, control state, head position and
/// the number of transitions applied so far.
#[derive(Debug, Clone)]
pub struct TuringMachine {
    machine: Machine,
    initial_tape: Tape,
    tape: Tape,
    state: State,
    head: i64,
    step_count: usize,
}

impl TuringMachine {
    /// Creates a machine in state `A` with the head at position 0 over `tape`.
    pub fn new(machine: Machine, tape: Tape) -> Self {
        Self {
            machine,
            initial_tape: tape.clone(),
            tape,
            state: State::START,
            head: 0,
            step_count: 0,
        }
    }

    /// Executes a single step.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue { .. })` if a transition was applied.
    /// * `Ok(Step::Halt)` if a halting transition was read, or the machine had already halted.
    /// * `Err(TuringMachineError::InvalidState)` if the current state is outside the table.
    pub fn step(&mut self) -> Result<Step, TuringMachineError> {
        let State::Running(state) = self.state else {
            return Ok(Step::Halt);
        };

        let result = step(&self.machine, state, self.head, &mut self.tape)?;
        self.step_count += 1;

        match result {
            Step::Continue { state, head } => {
                trace!(
                    "step {}: {} -> {} at {}",
                    self.step_count,
                    self.state,
                    State::Running(state),
                    head
                );
                self.state = State::Running(state);
                self.head = head;
            }
            Step::Halt => {
                debug!("halted after {} steps", self.step_count);
                self.state = State::Halted;
            }
        }

        Ok(result)
    }

    /// Runs until the machine halts or `max_steps` steps have been executed.
    pub fn run(&mut self, max_steps: usize) -> Result<Step, TuringMachineError> {
        for _ in 0..max_steps {
            match self.step()? {
                Step::Continue { .. } => continue,
                halt => return Ok(halt),
            }
        }

        Ok(match self.state {
            State::Running(state) => Step::Continue {
                state,
                head: self.head,
            },
            State::Halted => Step::Halt,
        })
    }

    /// Resets the state, head, tape and step count to the initial configuration.
    pub fn reset(&mut self) {
        self.tape = self.initial_tape.clone();
        self.state = State::START;
        self.head = 0;
        self.step_count = 0;
    }

    /// Returns the current control state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the head position. Once halted, this is where the halting transition was read.
    pub fn head(&self) -> i64 {
        self.head
    }

    pub fn tape(&self) -> &Tape {
        &self.tape
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    /// Returns the number of steps executed, the halting one included.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_halted()
    }
}
