//! This module maps the unbounded, two-sided tape onto dense zero-based storage.
//!
//! Positions interleave around the origin: `0, -1, 1, -2, 2, ...` occupy indices
//! `0, 1, 2, 3, 4, ...`, so cells near the start of the run stay at low indices.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::types::BLANK;

/// Maps a signed tape position to its storage index.
///
/// Non-negative positions land on even indices, negative positions on odd ones.
pub fn to_index(position: i64) -> usize {
    if position < 0 {
        // !p == -p - 1 for negative p, so this is -2p - 1.
        (!position as usize) * 2 + 1
    } else {
        position as usize * 2
    }
}

/// Maps a storage index back to its signed tape position.
pub fn to_position(index: usize) -> i64 {
    let half = (index / 2) as i64;
    if index % 2 == 0 {
        half
    } else {
        -half - 1
    }
}

/// A binary tape, blank everywhere it has not been written.
///
/// Reads past the end of storage return the blank symbol; writes grow storage as needed.
/// Every index below `len()` counts as occupied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    cells: Vec<u8>,
    /// Smallest and largest positions ever written.
    written: Option<(i64, i64)>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tape from a bitstring, character `i` landing at position `i`.
    ///
    /// `'0'` is the blank symbol; any other character reads as 1.
    pub fn from_bits(bits: &str) -> Self {
        let mut tape = Self::new();
        for (i, c) in bits.chars().enumerate() {
            tape.set(i as i64, u8::from(c != '0'));
        }
        tape
    }

    /// Returns the symbol at `position`.
    pub fn get(&self, position: i64) -> u8 {
        self.cells
            .get(to_index(position))
            .copied()
            .unwrap_or(BLANK)
    }

    /// Writes `symbol` at `position`, growing storage with blanks if needed.
    pub fn set(&mut self, position: i64, symbol: u8) {
        let index = to_index(position);
        if index >= self.cells.len() {
            self.cells.resize(index + 1, BLANK);
        }
        self.cells[index] = symbol;
        self.written = Some(match self.written {
            None => (position, position),
            Some((lo, hi)) => (lo.min(position), hi.max(position)),
        });
    }

    /// Number of occupied storage slots.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Raw storage, in index order.
    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Iterates over occupied cells as `(position, symbol)`, in storage order.
    pub fn occupied(&self) -> impl Iterator<Item = (i64, u8)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(index, &symbol)| (to_position(index), symbol))
    }

    /// Counts the cells holding a 1.
    pub fn ones(&self) -> usize {
        self.cells.iter().filter(|&&symbol| symbol != BLANK).count()
    }

    /// The smallest and largest positions ever written, or `None` for an untouched tape.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        self.written
    }

    /// Renders the positions in `range` as a bitstring.
    pub fn to_bits(&self, range: RangeInclusive<i64>) -> String {
        range
            .map(|position| if self.get(position) == BLANK { '0' } else { '1' })
            .collect()
    }
}
