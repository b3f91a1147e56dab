//! This module converts transition tables to and from their shareable text form:
//! the marker `m` followed by the unpadded URL-safe base64 of the raw bytes.

use crate::types::TuringMachineError;
use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine as _,
};

/// Leading character of every encoded machine.
pub const MARKER: char = 'm';

/// Encodes a raw transition table.
///
/// # Arguments
///
/// * `machine` - The raw transition table bytes.
///
/// # Returns
///
/// * `String` - `m` followed by the URL-safe base64 of `machine`, without `=` padding.
pub fn encode(machine: &[u8]) -> String {
    format!("{MARKER}{}", URL_SAFE_NO_PAD.encode(machine))
}

/// Decodes an encoded transition table back into raw bytes.
///
/// Both base64 alphabets are accepted, as is trailing `=` padding, so strings produced by
/// encoders that only substitute part of the alphabet still decode.
///
/// # Returns
///
/// * `Ok(Vec<u8>)` with the raw bytes. The result is not validated as a machine; use
///   `Machine::from_encoded` for that.
/// * `Err(TuringMachineError::Format)` if the marker is missing or the payload is not base64.
pub fn decode(text: &str) -> Result<Vec<u8>, TuringMachineError> {
    let payload = text.strip_prefix(MARKER).ok_or_else(|| {
        TuringMachineError::Format(format!("must start with '{MARKER}', got {text:?}"))
    })?;

    let standard: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();

    STANDARD_NO_PAD
        .decode(standard.as_bytes())
        .map_err(|e| TuringMachineError::Format(format!("invalid base64 payload: {e}")))
}
