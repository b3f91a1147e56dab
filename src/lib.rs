//! This crate provides the core logic for simulating and visualizing 2-symbol Turing machines.
//! It includes modules for encoding transition tables, stepping machines over an unbounded tape,
//! recording execution histories, rendering them as space-time diagrams, and converting
//! machines to and from the text table format.

pub mod analyzer;
pub mod encoder;
pub mod export;
pub mod history;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod render;
pub mod tape;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the encoding functions from the encoder module.
pub use encoder::{decode, encode};
/// Re-exports the text table exporter.
pub use export::to_table_text;
/// Re-exports the execution history types.
pub use history::{History, Snapshot};
/// Re-exports the `ProgramLoader` struct from the loader module.
pub use loader::ProgramLoader;
/// Re-exports the step engine and the `TuringMachine` struct from the machine module.
pub use machine::{step, TuringMachine};
/// Re-exports the `parse` function from the parser module.
pub use parser::parse;
/// Re-exports `ProgramInfo`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{ProgramInfo, ProgramManager, PROGRAMS};
/// Re-exports the raster types and entry points.
pub use render::{render_image, trace_to_image, ImageOptions, PixelBuffer, Surface, Viewport};
/// Re-exports the tape and the position mapping.
pub use tape::{to_index, to_position, Tape};
/// Re-exports various types related to machine definition and execution from the types module.
pub use types::{
    DecisionStatus, Direction, Machine, Program, State, Step, Transition, TuringMachineError,
    DEFAULT_MAX_STEPS,
};
