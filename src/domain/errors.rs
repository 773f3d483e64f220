use thiserror::Error;

/// Reasons a request body could not be rendered as shell text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BodyDecodeFailure {
    /// Bytes that are not valid UTF-8 outside the tolerated BOM/tail cases.
    #[error("invalid UTF-8 sequence at byte {offset}")]
    InvalidUtf8 { offset: usize },

    /// Decoded text contains NUL, which no shell argument can carry.
    #[error("NUL character at position {position}")]
    NulByte { position: usize },
}
