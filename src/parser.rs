//! This module parses the text table format back into a `Program`, utilizing the `pest` crate.
//! It is the inverse of `export::to_table_text`, with the optional `name:` and `input:` headers
//! used by third-party simulators on top.

use crate::types::{
    Direction, Machine, Program, TuringMachineError, STATE_WIDTH, TRANSITION_WIDTH,
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::Pair,
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashMap;

/// Largest state count whose successor indices still fit the one-byte `next + 1` field.
const MAX_STATES: usize = u8::MAX as usize;

/// Derives a `PestParser` for the text table grammar defined in `table.pest`.
#[derive(PestParser)]
#[grammar = "table.pest"]
pub struct TableParser;

/// A transition entry as written, before state names are resolved.
struct ParsedEntry<'a> {
    symbol: u8,
    write: u8,
    direction: Direction,
    /// `None` means the machine stays in the declaring state.
    next: Option<Pair<'a, Rule>>,
    span: Span<'a>,
}

/// A state block as written.
struct ParsedState<'a> {
    name: String,
    span: Span<'a>,
    entries: Vec<ParsedEntry<'a>>,
}

/// Parses the given text table into a `Program`.
///
/// States are numbered in declaration order and the start state must be declared first.
/// Symbols without an entry halt, as do states declared with no entries at all.
///
/// # Arguments
///
/// * `input` - A string slice containing the text table.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed. The name is empty and the tape is `"0"`
///   unless the `name:` and `input:` headers say otherwise.
/// * `Err(TuringMachineError::ParseError)` if there are syntax errors, duplicate or undefined
///   states, duplicate entries, or a blank symbol other than `'0'`.
pub fn parse(input: &str) -> Result<Program, TuringMachineError> {
    let root = TableParser::parse(Rule::document, input.trim())
        .map_err(|e| TuringMachineError::ParseError(Box::new(e)))?
        .next()
        .ok_or_else(|| TuringMachineError::InvalidMachine("empty document".to_string()))?;
    let root_span = root.as_span();

    let mut name = String::new();
    let mut tape: Option<String> = None;
    let mut start: Option<Pair<Rule>> = None;
    let mut states = Vec::new();

    for p in root.into_inner() {
        match p.as_rule() {
            Rule::name => name = inner_str(&p).trim().to_string(),
            Rule::input => tape = Some(inner_str(&p).trim_matches('\'').to_string()),
            Rule::blank => {
                if parse_symbol(inner_str(&p)) != 0 {
                    return Err(parse_error("Only the blank symbol '0' is supported", p.as_span()));
                }
            }
            Rule::start => start = p.into_inner().next(),
            Rule::table => states = parse_states(p)?,
            _ => {}
        }
    }

    let machine = build_machine(&states, start, root_span)?;

    Ok(Program {
        name,
        tape: tape.unwrap_or_else(|| "0".to_string()),
        machine,
    })
}

/// Collects the state blocks of a `Pair<Rule::table>`.
fn parse_states(pair: Pair<Rule>) -> Result<Vec<ParsedState>, TuringMachineError> {
    let mut states = Vec::new();

    // Rule: table > [state_block] > state_name, [entry]
    for block in pair.into_inner() {
        let span = block.as_span();
        let mut inner = block.into_inner();
        let name = inner.next().map(|p| p.as_str().to_string()).unwrap_or_default();

        let mut entries = Vec::new();
        for entry in inner {
            entries.push(parse_entry(entry)?);
        }

        states.push(ParsedState {
            name,
            span,
            entries,
        });
    }

    Ok(states)
}

/// Parses a single `Pair<Rule::entry>`.
///
/// If `write` is omitted, the read symbol is written back.
fn parse_entry(pair: Pair<Rule>) -> Result<ParsedEntry, TuringMachineError> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();

    let symbol = inner
        .next()
        .map(|p| parse_symbol(p.as_str()))
        .ok_or_else(|| parse_error("Missing symbol", span))?;
    let action = inner
        .next()
        .ok_or_else(|| parse_error("Missing action", span))?;

    let mut write = symbol;
    let mut direction = None;
    let mut next = None;

    for p in action.into_inner() {
        match p.as_rule() {
            Rule::write => write = parse_symbol(inner_str(&p)),
            Rule::direction => direction = Some(parse_direction(&p)?),
            Rule::state_name => next = Some(p),
            _ => {}
        }
    }

    Ok(ParsedEntry {
        symbol,
        write,
        direction: direction.ok_or_else(|| parse_error("Missing direction", span))?,
        next,
        span,
    })
}

/// Resolves state names and lays the transitions out as a binary table.
fn build_machine(
    states: &[ParsedState],
    start: Option<Pair<Rule>>,
    span: Span,
) -> Result<Machine, TuringMachineError> {
    let first = states
        .first()
        .ok_or_else(|| parse_error("The table declares no states", span))?;

    if states.len() > MAX_STATES {
        return Err(parse_error(
            &format!("At most {MAX_STATES} states are supported"),
            span,
        ));
    }

    let mut indices = HashMap::new();
    for (index, state) in states.iter().enumerate() {
        if indices.insert(state.name.as_str(), index).is_some() {
            return Err(parse_error(
                &format!("Duplicate state: {}", state.name),
                state.span,
            ));
        }
    }

    if let Some(start) = start {
        if start.as_str() != first.name {
            return Err(parse_error(
                &format!(
                    "Start state {} must be declared first in the table",
                    start.as_str()
                ),
                start.as_span(),
            ));
        }
    }

    let mut bytes = vec![0u8; STATE_WIDTH * states.len()];
    for (index, state) in states.iter().enumerate() {
        let mut seen = [false; 2];

        for entry in &state.entries {
            let slot = usize::from(entry.symbol);
            if seen[slot] {
                return Err(parse_error(
                    &format!("Duplicate entry for symbol {} in state {}", entry.symbol, state.name),
                    entry.span,
                ));
            }
            seen[slot] = true;

            let next = match &entry.next {
                None => index,
                Some(target) => *indices.get(target.as_str()).ok_or_else(|| {
                    parse_error(
                        &format!("Undefined state: {}", target.as_str()),
                        target.as_span(),
                    )
                })?,
            };

            let offset = STATE_WIDTH * index + TRANSITION_WIDTH * slot;
            bytes[offset] = entry.write;
            bytes[offset + 1] = entry.direction.to_byte();
            // `next` < MAX_STATES, so the shifted index fits a byte.
            bytes[offset + 2] = (next + 1) as u8;
        }
    }

    Machine::new(bytes)
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Parses a single direction from a `Pair<Rule::direction>`.
fn parse_direction(pair: &Pair<Rule>) -> Result<Direction, TuringMachineError> {
    match pair.as_str() {
        "R" => Ok(Direction::Right),
        "L" => Ok(Direction::Left),
        other => Err(parse_error(
            &format!("Unsupported direction: {other}"),
            pair.as_span(),
        )),
    }
}

/// Parses a quoted or unquoted bit.
fn parse_symbol(input: &str) -> u8 {
    u8::from(input.trim_matches('\'') == "1")
}

/// Extracts the text of the first inner `Pair`, or an empty string.
fn inner_str<'a>(pair: &Pair<'a, Rule>) -> &'a str {
    pair.clone()
        .into_inner()
        .next()
        .map(|p| p.as_str())
        .unwrap_or_default()
}
