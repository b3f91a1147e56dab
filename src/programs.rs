use crate::parser::parse;
use crate::types::{Program, TuringMachineError};

use tracing::warn;

// Embedded busy beaver champions
const PROGRAM_TEXTS: [&str; 4] = [
    include_str!("../machines/bb2.tm"),
    include_str!("../machines/bb3.tm"),
    include_str!("../machines/bb4.tm"),
    include_str!("../machines/bb5.tm"),
];

lazy_static::lazy_static! {
    /// The embedded catalogue, parsed on first use.
    pub static ref PROGRAMS: Vec<Program> = PROGRAM_TEXTS
        .iter()
        .enumerate()
        .filter_map(|(index, text)| match parse(text) {
            Ok(program) => Some(program),
            Err(e) => {
                warn!("embedded program {} failed to parse: {}", index, e);
                None
            }
        })
        .collect();
}

pub struct ProgramManager;

impl ProgramManager {
    /// Get the number of available programs
    pub fn get_program_count() -> usize {
        PROGRAMS.len()
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, TuringMachineError> {
        PROGRAMS
            .get(index)
            .cloned()
            .ok_or_else(|| {
                TuringMachineError::NotFound(format!("Program index {} out of range", index))
            })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<Program, TuringMachineError> {
        PROGRAMS
            .iter()
            .find(|program| program.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| TuringMachineError::NotFound(format!("Program '{}' not found", name)))
    }

    /// List all program names
    pub fn list_program_names() -> Vec<String> {
        PROGRAMS
            .iter()
            .map(|program| program.name.clone())
            .collect()
    }

    /// Get information about a program by its index
    pub fn get_program_info(index: usize) -> Result<ProgramInfo, TuringMachineError> {
        let program = Self::get_program_by_index(index)?;
        let machine = &program.machine;

        Ok(ProgramInfo {
            index,
            name: program.name.clone(),
            encoded: machine.encode(),
            initial_tape: program.tape.clone(),
            state_count: machine.state_count(),
            halting_transitions: machine
                .transitions()
                .filter(|(_, _, t)| t.is_halting())
                .count(),
        })
    }

    /// Search for programs by name
    pub fn search_programs(query: &str) -> Vec<usize> {
        let query = query.to_lowercase();

        PROGRAMS
            .iter()
            .enumerate()
            .filter(|(_, program)| program.name.to_lowercase().contains(&query))
            .map(|(index, _)| index)
            .collect()
    }

    /// Get the original text of a program by its index
    pub fn get_program_text_by_index(index: usize) -> Result<&'static str, TuringMachineError> {
        PROGRAM_TEXTS.get(index).copied().ok_or_else(|| {
            TuringMachineError::NotFound(format!("Program text index {} out of range", index))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInfo {
    pub index: usize,
    pub name: String,
    pub encoded: String,
    pub initial_tape: String,
    pub state_count: usize,
    pub halting_transitions: usize,
}
