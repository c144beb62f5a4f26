//! # Protocol Error Types

use thiserror::Error;

/// Wire decode and encode failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer ended before the value did.
    #[error("Truncated packet: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },

    /// String bytes were not UTF-8.
    #[error("Invalid UTF-8 in {field}")]
    InvalidUtf8 {
        /// Field being decoded.
        field: &'static str,
    },

    /// A record carried an empty identifier.
    #[error("Empty identifier in {record}")]
    EmptyId {
        /// Record type.
        record: &'static str,
    },

    /// Enum discriminant out of range.
    #[error("Unknown {field} discriminant: {value}")]
    InvalidEnum {
        /// Field being decoded.
        field: &'static str,
        /// Raw value.
        value: u32,
    },

    /// A float field held NaN or an infinity.
    #[error("Non-finite value in {field}")]
    NonFinite {
        /// Field being decoded.
        field: &'static str,
    },

    /// String or array longer than a `u16` length prefix allows.
    #[error("{field} too long for the wire: {len}")]
    TooLong {
        /// Field being encoded.
        field: &'static str,
        /// Actual length.
        len: usize,
    },

    /// Bytes left after a complete payload.
    #[error("{count} trailing bytes after payload")]
    TrailingBytes {
        /// Leftover byte count.
        count: usize,
    },
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
