use std::fmt;

/// Errors that can occur in the interpreter at the Rust level.
///
/// These are the hard failures: resource exhaustion, unreadable input,
/// host I/O. Recoverable language-level faults (arity mismatches, unbound
/// symbols, illegal operators) are reported through `log::warn!` and
/// evaluate to nil instead — see `eval.rs`.
#[derive(Debug, Clone)]
pub enum LispError {
    /// The cell arena is full. There is no reclamation, so this is
    /// permanent for the life of the machine.
    CellsExhausted,

    /// The symbol pool's byte budget is spent.
    SymbolsExhausted,

    /// Reader error: malformed S-expression text.
    ReadError(String),

    /// I/O error from the read primitive.
    IoError(String),

    /// Internal interpreter error (should not happen in correct code).
    Internal(String),
}

impl fmt::Display for LispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LispError::CellsExhausted => write!(f, "Error: cell arena exhausted"),
            LispError::SymbolsExhausted => write!(f, "Error: symbol pool exhausted"),
            LispError::ReadError(msg) => write!(f, "Read error: {}", msg),
            LispError::IoError(msg) => write!(f, "I/O error: {}", msg),
            LispError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for LispError {}

pub type LispResult<T> = Result<T, LispError>;
