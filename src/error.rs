//! Error taxonomy shared by both map backends.

use core::fmt;
use thiserror::Error;

/// Which cursor step was rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CursorOp {
    Next,
    Prev,
    Remove,
}

impl fmt::Display for CursorOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CursorOp::Next => "advance past the end",
            CursorOp::Prev => "step before the first entry",
            CursorOp::Remove => "remove at the end position",
        })
    }
}

#[derive(Error, Copy, Clone, Debug, Eq, PartialEq)]
pub enum MapError {
    /// Lookup of an absent key, or dereference of the end position.
    #[error("key not found")]
    KeyNotFound,
    /// A cursor step or cursor removal that has no valid target.
    #[error("invalid cursor operation: {0}")]
    InvalidCursorOperation(CursorOp),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_rejected_step() {
        assert_eq!(MapError::KeyNotFound.to_string(), "key not found");
        assert_eq!(
            MapError::InvalidCursorOperation(CursorOp::Prev).to_string(),
            "invalid cursor operation: step before the first entry"
        );
    }
}
