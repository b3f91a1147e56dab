//! This module provides the `ProgramLoader` struct, responsible for loading machines from
//! files, strings and the seed database.

use crate::encoder::MARKER;
use crate::parser::parse;
use crate::types::{Machine, Program, TuringMachineError};
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Size of the seed database header, in bytes.
pub const DB_HEADER_SIZE: u64 = 30;
/// Size of one seed database record: a 5-state machine.
pub const DB_RECORD_SIZE: u64 = 30;
/// Extension of machine files picked up by `load_programs`.
pub const PROGRAM_EXTENSION: &str = "tm";

/// `ProgramLoader` is a utility struct for loading machines.
pub struct ProgramLoader;

impl ProgramLoader {
    /// Loads a program from the specified file path.
    ///
    /// # Returns
    ///
    /// * `Ok(Program)` if the file holds an encoded machine or a valid text table.
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read.
    /// * Any decoding or parsing error of the content otherwise.
    pub fn load_program(path: &Path) -> Result<Program, TuringMachineError> {
        let content = fs::read_to_string(path).map_err(|e| {
            TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
        })?;

        Self::load_program_from_string(&content)
    }

    /// Loads a program from string content.
    ///
    /// Content starting with `m` is read as an encoded machine, anything else as a text table.
    pub fn load_program_from_string(content: &str) -> Result<Program, TuringMachineError> {
        let content = content.trim();

        if content.starts_with(MARKER) {
            return Ok(Program {
                name: String::new(),
                tape: "0".to_string(),
                machine: Machine::from_encoded(content)?,
            });
        }

        parse(content)
    }

    /// Loads every `.tm` file of a directory.
    ///
    /// Directories and files with other extensions are skipped.
    ///
    /// # Returns
    ///
    /// * One result per candidate file, holding the path and program, or the load error.
    pub fn load_programs(directory: &Path) -> Vec<Result<(PathBuf, Program), TuringMachineError>> {
        if !directory.exists() {
            return vec![Err(TuringMachineError::FileError(format!(
                "Directory {} does not exist",
                directory.display()
            )))];
        }

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) => {
                return vec![Err(TuringMachineError::FileError(format!(
                    "Failed to read directory {}: {}",
                    directory.display(),
                    e
                )))]
            }
        };

        entries
            .filter_map(|entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        return Some(Err(TuringMachineError::FileError(format!(
                            "Failed to read directory entry: {}",
                            e
                        ))))
                    }
                };

                let path = entry.path();

                // Skip directories and non-.tm files
                if path.is_dir() || path.extension().is_none_or(|ext| ext != PROGRAM_EXTENSION) {
                    return None;
                }

                Some(Self::load_program(&path).map(|program| (path, program)))
            })
            .collect()
    }

    /// Loads machine `index` from a seed database file.
    ///
    /// The file is a 30-byte header followed by 30-byte records, one 5-state machine each.
    ///
    /// # Returns
    ///
    /// * `Err(TuringMachineError::FileError)` if the file cannot be read or has no record `index`.
    /// * `Err(TuringMachineError::InvalidMachine)` or `InvalidState` if the record is malformed.
    pub fn load_from_database(path: &Path, index: usize) -> Result<Machine, TuringMachineError> {
        let file_error = |e: std::io::Error| {
            TuringMachineError::FileError(format!(
                "Failed to read database {}: {}",
                path.display(),
                e
            ))
        };

        let mut file = File::open(path).map_err(file_error)?;
        let len = file.metadata().map_err(file_error)?.len();
        let count = len.saturating_sub(DB_HEADER_SIZE) / DB_RECORD_SIZE;

        if index as u64 >= count {
            return Err(TuringMachineError::FileError(format!(
                "Machine index {} out of range: {} holds {} machines",
                index,
                path.display(),
                count
            )));
        }

        let mut record = vec![0; DB_RECORD_SIZE as usize];
        file.seek(SeekFrom::Start(DB_HEADER_SIZE + index as u64 * DB_RECORD_SIZE))
            .map_err(file_error)?;
        file.read_exact(&mut record).map_err(file_error)?;

        Machine::new(record)
    }
}
