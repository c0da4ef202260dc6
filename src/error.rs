use std::error;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, Error>;

/// An error that occurred while building, converting or deserializing a DFA.
///
/// No error can occur during a search. Once an automaton has been built or
/// successfully deserialized, every transition lookup and state predicate is
/// total and infallible.
#[derive(Clone, Debug)]
pub struct Error {
    kind: ErrorKind,
}

/// The kind of error that occurred.
#[derive(Clone, Debug)]
pub enum ErrorKind {
    /// An error that occurred because a state identifier---possibly scaled
    /// by the alphabet stride during premultiplication---could not fit into
    /// the chosen state identifier representation.
    StateIDOverflow {
        /// The maximum state ID supported by the representation.
        max: usize,
        /// The state ID that was actually needed, which exceeded `max`.
        requested: usize,
    },
    /// An error that occurred while re-encoding a DFA from one transition
    /// table variant into another, where the requested direction of
    /// conversion is not supported.
    UnsupportedVariantConversion(&'static str),
    /// An error that occurred while deserializing a DFA because the buffer's
    /// tags or declared sizes did not match what the decoder supports. This
    /// includes truncated buffers, unsupported format versions, foreign
    /// endianness and state identifier representations of the wrong width.
    SerializationFormatMismatch(String),
    /// An error that occurred because a byte class map was internally
    /// inconsistent, e.g., a class index at or beyond the declared number of
    /// classes. This is a defensive check; the maps produced by this crate's
    /// builders and serializers always satisfy it.
    InvalidByteClassPartition(String),
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub(crate) fn state_id_overflow(max: usize, requested: usize) -> Error {
        Error { kind: ErrorKind::StateIDOverflow { max, requested } }
    }

    pub(crate) fn unsupported_conversion(msg: &'static str) -> Error {
        Error { kind: ErrorKind::UnsupportedVariantConversion(msg) }
    }

    pub(crate) fn format_mismatch(msg: impl Into<String>) -> Error {
        Error { kind: ErrorKind::SerializationFormatMismatch(msg.into()) }
    }

    pub(crate) fn invalid_byte_classes(msg: impl Into<String>) -> Error {
        Error { kind: ErrorKind::InvalidByteClassPartition(msg.into()) }
    }
}

impl error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            ErrorKind::StateIDOverflow { max, requested } => write!(
                f,
                "building the DFA requires a state ID of {}, but the \
                 chosen representation supports at most {}",
                requested, max,
            ),
            ErrorKind::UnsupportedVariantConversion(msg) => {
                write!(f, "unsupported DFA variant conversion: {}", msg)
            }
            ErrorKind::SerializationFormatMismatch(ref msg) => {
                write!(f, "DFA deserialization failed: {}", msg)
            }
            ErrorKind::InvalidByteClassPartition(ref msg) => {
                write!(f, "invalid byte class map: {}", msg)
            }
        }
    }
}
