use std::error;
use std::fmt;
use std::io;
use std::result;

/// A type alias for `Result<T, textrec::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when decoding lines or writing records.
///
/// Every error is reported to the immediate caller. Nothing in this crate
/// retries: feeding the same bytes or fields again fails the same way.
#[derive(Debug)]
pub enum Error {
    /// The configuration was rejected before any data was processed.
    Config(ConfigError),
    /// The input contained bytes that are invalid in the configured
    /// encoding. The decode pass that produced it is over.
    Decode(DecodeError),
    /// A formatted line contained a character that the output encoding
    /// cannot represent.
    Encode(EncodeError),
    /// An I/O error that occurred while writing formatted records.
    Io(io::Error),
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Error {
        Error::Config(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Error {
        Error::Decode(err)
    }
}

impl From<EncodeError> for Error {
    fn from(err: EncodeError) -> Error {
        Error::Encode(err)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Config(ref err) => Some(err),
            Error::Decode(ref err) => Some(err),
            Error::Encode(ref err) => Some(err),
            Error::Io(ref err) => Some(err),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::Config(ref err) => {
                write!(f, "configuration error: {}", err)
            }
            Error::Decode(ref err) => write!(f, "decode error: {}", err),
            Error::Encode(ref err) => write!(f, "encode error: {}", err),
            Error::Io(ref err) => err.fmt(f),
        }
    }
}

/// A structurally invalid codec configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// The encoding label does not name an encoding known to this crate.
    UnknownEncoding(String),
    /// The encoding label names a charset that is only available as an
    /// approximation, such as `ISO-8859-9` read as `windows-1254`.
    LossyEncoding {
        /// The label as configured.
        label: String,
        /// The encoding the label would have resolved to.
        resolved: &'static str,
    },
    /// The encoding has no encoder, so it cannot be used for output.
    UnsupportedOutputEncoding(&'static str),
    /// Two options that must be distinct were set to the same character.
    SameCharacter {
        /// The first option name.
        first: &'static str,
        /// The second option name.
        second: &'static str,
        /// The character both options share.
        ch: char,
    },
    /// An option was set to `\r` or `\n`, which are reserved for line
    /// breaks.
    LineBreak {
        /// The option name.
        option: &'static str,
        /// The offending character.
        ch: char,
    },
    /// A timestamp format contains an invalid directive.
    TimestampFormat(String),
    /// A timezone is neither `UTC` nor a fixed offset such as `+09:00`.
    UnknownTimezone(String),
    /// Column options name a column that is not in the header.
    UnknownColumn(String),
}

impl error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ConfigError::UnknownEncoding(ref label) => {
                write!(f, "unknown encoding '{}'", label)
            }
            ConfigError::LossyEncoding { ref label, resolved } => write!(
                f,
                "encoding '{}' is only available as {}, which differs",
                label, resolved
            ),
            ConfigError::UnsupportedOutputEncoding(name) => {
                write!(f, "encoding {} cannot be used for output", name)
            }
            ConfigError::SameCharacter { first, second, ch } => write!(
                f,
                "options '{}' and '{}' must differ, but both are {:?}",
                first, second, ch
            ),
            ConfigError::LineBreak { option, ch } => write!(
                f,
                "option '{}' cannot be a line break character, got {:?}",
                option, ch
            ),
            ConfigError::TimestampFormat(ref format) => {
                write!(f, "invalid timestamp format '{}'", format)
            }
            ConfigError::UnknownTimezone(ref zone) => {
                write!(f, "unknown timezone '{}'", zone)
            }
            ConfigError::UnknownColumn(ref name) => {
                write!(f, "column options name unknown column '{}'", name)
            }
        }
    }
}

/// A byte sequence that is invalid in the configured encoding.
///
/// The error includes the index of the chunk being decoded when the invalid
/// sequence was detected and the offset of that sequence from the start of
/// the whole input. The sequence may begin in an earlier chunk. A character
/// left incomplete by the end of input is detected after the last chunk, so
/// its chunk index equals the number of chunks.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodeError {
    encoding: &'static str,
    chunk: u64,
    offset: u64,
    length: usize,
}

impl DecodeError {
    pub(crate) fn new(
        encoding: &'static str,
        chunk: u64,
        offset: u64,
        length: usize,
    ) -> DecodeError {
        DecodeError { encoding, chunk, offset, length }
    }

    /// The name of the encoding that rejected the input.
    pub fn encoding(&self) -> &'static str {
        self.encoding
    }

    /// The zero based index of the chunk in which decoding failed.
    pub fn chunk(&self) -> u64 {
        self.chunk
    }

    /// The byte offset, from the start of the input, of the invalid
    /// sequence.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The length in bytes of the invalid sequence.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl error::Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid {} sequence of {} byte(s) in chunk {} at byte {}",
            self.encoding, self.length, self.chunk, self.offset
        )
    }
}

/// A character that the output encoding cannot represent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodeError {
    encoding: &'static str,
    ch: char,
    line: u64,
}

impl EncodeError {
    pub(crate) fn new(
        encoding: &'static str,
        ch: char,
        line: u64,
    ) -> EncodeError {
        EncodeError { encoding, ch, line }
    }

    /// The name of the output encoding.
    pub fn encoding(&self) -> &'static str {
        self.encoding
    }

    /// The unmappable character.
    pub fn character(&self) -> char {
        self.ch
    }

    /// The one based number of the output line, counting the header.
    pub fn line(&self) -> u64 {
        self.line
    }
}

impl error::Error for EncodeError {}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: character {:?} cannot be encoded in {}",
            self.line, self.ch, self.encoding
        )
    }
}
