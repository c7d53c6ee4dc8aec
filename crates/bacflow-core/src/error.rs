use core::fmt;

/// Errors raised while writing a frame or a tagged value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    BufferTooSmall,
    ValueOutOfRange,
    InvalidLength,
    Message(&'static str),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => f.write_str("buffer too small"),
            Self::ValueOutOfRange => f.write_str("value out of range"),
            Self::InvalidLength => f.write_str("invalid length"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

/// The class of tag a structural grammar position requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Application,
    Context,
    Opening,
    Closing,
}

impl fmt::Display for TagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Application => "application",
            Self::Context => "context",
            Self::Opening => "opening",
            Self::Closing => "closing",
        })
    }
}

/// Errors raised while reading a frame.
///
/// Decoding stops at the first structural error; nothing is recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// Too few bytes for a required field.
    MalformedFrame,
    /// A tag sat at a grammar position that requires a different tag number.
    IncorrectTag { expected: u8, actual: u8 },
    /// Tag discriminant outside the known set.
    UnsupportedTag(u8),
    /// A context, opening or closing tag was required but something else was found.
    WrongTagType { expected: TagClass },
    InvalidLength,
    InvalidValue,
    Message(&'static str),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedFrame => f.write_str("malformed frame: not enough bytes"),
            Self::IncorrectTag { expected, actual } => {
                write!(f, "incorrect tag: expected {expected}, found {actual}")
            }
            Self::UnsupportedTag(tag) => write!(f, "unsupported tag {tag}"),
            Self::WrongTagType { expected } => write!(f, "expected {expected} tag"),
            Self::InvalidLength => f.write_str("invalid length"),
            Self::InvalidValue => f.write_str("invalid value"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}
