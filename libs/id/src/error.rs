use thiserror::Error;

/// Why a string failed to parse as a prefixed identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("empty identifier")]
    Empty,

    #[error("`{input}` is not of the form `{expected}_<ulid>`")]
    Malformed {
        input: String,
        expected: &'static str,
    },

    /// Well-formed, but names a different kind of thing.
    #[error("expected a `{expected}_` identifier, found `{found}_`")]
    WrongKind {
        expected: &'static str,
        found: String,
    },

    #[error("bad ULID: {0}")]
    Ulid(#[from] ulid::DecodeError),
}

impl IdError {
    pub fn is_wrong_kind(&self) -> bool {
        matches!(self, IdError::WrongKind { .. })
    }
}
