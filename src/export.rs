//! This module exports machines to the text table format read by third-party simulators.

use crate::types::{state_letter, Machine};

/// Formats `machine` as a text table.
///
/// ```text
/// blank: '0'
/// start state: A
/// table:
///   A:
///     0: {write: 1, R: B}
///     1: {write: 1, L: B}
///   B:
/// ```
///
/// Halting transitions are left out; a reader infers halting from the missing entry.
pub fn to_table_text(machine: &Machine) -> String {
    let mut text = String::from("blank: '0'\nstart state: A\ntable:\n");
    let mut current = None;

    for (state, symbol, transition) in machine.transitions() {
        if current != Some(state) {
            text.push_str(&format!("  {}:\n", state_letter(state)));
            current = Some(state);
        }

        if let Some(next) = transition.next {
            text.push_str(&format!(
                "    {}: {{write: {}, {}: {}}}\n",
                symbol,
                transition.write,
                transition.direction.letter(),
                state_letter(next)
            ));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_scenario() {
        let machine = Machine::new(vec![1, 0, 2, 1, 1, 2, 0, 0, 0, 0, 0, 0]).unwrap();

        assert_eq!(
            to_table_text(&machine),
            "blank: '0'\n\
             start state: A\n\
             table:\n  \
             A:\n    \
             0: {write: 1, R: B}\n    \
             1: {write: 1, L: B}\n  \
             B:\n"
        );
    }

    #[test]
    fn test_export_omits_halting_transitions() {
        let machine = Machine::new(vec![1, 0, 2, 1, 1, 2, 1, 1, 1, 1, 0, 0]).unwrap();
        let text = to_table_text(&machine);

        assert!(text.contains("  B:\n    0: {write: 1, L: A}\n"));
        assert!(!text.contains("    1: {write: 1, R"));
        assert_eq!(text.lines().count(), 3 + 2 + 3);
    }
}
