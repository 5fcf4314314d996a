//! Centralized row-position translation to keep slot assignment consistent
//! across the codebase.
//!
//! Result-set drivers report column positions 1-based; the in-memory row
//! buffer is a dense 0-based array. Every place a raw column position crosses
//! that boundary MUST go through these two functions, so that two executions
//! of the same statement shape always produce identical slot assignments.

/// Translate a 1-based result-set column position into a 0-based row-buffer
/// index.
///
/// # Examples
/// ```
/// use relmap::utils::row_position::values_array_position;
///
/// assert_eq!(values_array_position(1), 0);
/// assert_eq!(values_array_position(7), 6);
/// ```
///
/// # Panics
/// Panics on position 0 - drivers never report it, so a zero here is a
/// caller bug, not data.
pub fn values_array_position(jdbc_position: usize) -> usize {
    assert!(jdbc_position > 0, "column positions are 1-based");
    jdbc_position - 1
}

/// Translate a 0-based row-buffer index back into a 1-based result-set
/// column position.
///
/// # Examples
/// ```
/// use relmap::utils::row_position::jdbc_position;
///
/// assert_eq!(jdbc_position(0), 1);
/// assert_eq!(jdbc_position(6), 7);
/// ```
pub fn jdbc_position(values_array_position: usize) -> usize {
    values_array_position + 1
}
