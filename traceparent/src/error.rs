//! Errors returned while decoding, deriving or generating trace contexts.
use crate::trace_state::TraceStateError;
use thiserror::Error;

/// A specialized `Result` type for traceparent operations.
pub type TraceparentResult<T> = Result<T, TraceparentError>;

/// Errors returned by the codec and by context derivation.
///
/// The offending raw input is included in every variant so a rejected header
/// can be diagnosed from the error alone. No variant is ever returned
/// alongside a partially decoded context.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceparentError {
    /// The header does not have four `-` separated fields of widths 2, 32,
    /// 16 and 2 made of hex digits.
    #[error("invalid traceparent format: {0}")]
    InvalidFormat(String),

    /// The version field is well formed but not one of the supported
    /// versions.
    #[error("invalid traceparent version: {0}")]
    InvalidVersion(String),

    /// The trace-id field could not be decoded.
    #[error("failed to decode trace ID {value}: {source}")]
    TraceIdDecodeFailed {
        /// Raw field text.
        value: String,
        /// Underlying hex error.
        #[source]
        source: ParseIdError,
    },

    /// The parent-id field could not be decoded.
    #[error("failed to decode parent ID {value}: {source}")]
    SpanIdDecodeFailed {
        /// Raw field text.
        value: String,
        /// Underlying hex error.
        #[source]
        source: ParseIdError,
    },

    /// The trace-flags field could not be decoded.
    #[error("failed to decode flags {value}: {source}")]
    FlagsDecodeFailed {
        /// Raw field text.
        value: String,
        /// Underlying hex error.
        #[source]
        source: ParseIdError,
    },

    /// The companion `tracestate` header could not be parsed.
    #[error("failed to parse tracestate: {0}")]
    TraceStateInvalid(#[from] TraceStateError),

    /// A replacement span id is not exactly 16 lowercase hex digits.
    #[error("invalid spanID format: {0}")]
    InvalidSpanIdFormat(String),

    /// The identifier source failed to produce a trace id.
    #[error("failed to generate traceID: {0}")]
    Generation(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Error returned when a fixed-width lowercase hex field cannot be decoded.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseIdError {
    /// The field does not have the expected number of hex digits.
    #[error("expected {expected} hex digits, found {found}")]
    InvalidLength {
        /// Required number of hex digits.
        expected: usize,
        /// Number of characters found.
        found: usize,
    },

    /// The field contains a character other than `0-9` or `a-f`.
    #[error("invalid character {c:?} at position {index}")]
    InvalidCharacter {
        /// The rejected character.
        c: char,
        /// Byte offset of the character within the field.
        index: usize,
    },

    /// Hex decoding failed.
    #[error(transparent)]
    Hex(#[from] const_hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_carry_raw_input() {
        let err = TraceparentError::InvalidFormat("00-abc".to_string());
        assert_eq!(err.to_string(), "invalid traceparent format: 00-abc");

        let err = TraceparentError::InvalidSpanIdFormat("not-hex!!".to_string());
        assert_eq!(err.to_string(), "invalid spanID format: not-hex!!");

        let err = TraceparentError::SpanIdDecodeFailed {
            value: "00F067AA0BA902B7".to_string(),
            source: ParseIdError::InvalidCharacter { c: 'F', index: 2 },
        };
        assert_eq!(
            err.to_string(),
            "failed to decode parent ID 00F067AA0BA902B7: invalid character 'F' at position 2"
        );
    }

    #[test]
    fn generation_error_exposes_cause() {
        let err = TraceparentError::Generation("clock went backwards".into());
        assert_eq!(
            err.to_string(),
            "failed to generate traceID: clock went backwards"
        );
        assert!(std::error::Error::source(&err).is_some());
    }
}
