use core::fmt;
use core::str::FromStr;

use memchr::memchr;

/// A line ending convention.
///
/// The same variants serve two purposes: the record separator recognized when
/// splitting decoded text into lines (and written after each output record),
/// and the canonical form that line breaks embedded in a quoted field are
/// rewritten to.
///
/// The default is `CRLF`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum LineEnding {
    /// `\n`
    LF,
    /// `\r\n`
    CRLF,
    /// `\r`
    CR,
}

impl LineEnding {
    /// The text of this line ending.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match *self {
            LineEnding::LF => "\n",
            LineEnding::CRLF => "\r\n",
            LineEnding::CR => "\r",
        }
    }

    /// The bytes of this line ending. Line endings are always ASCII, so
    /// these are identical in every ASCII compatible encoding.
    #[inline]
    pub fn as_bytes(&self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// The option name of this line ending, e.g., `CRLF`.
    pub fn name(&self) -> &'static str {
        match *self {
            LineEnding::LF => "LF",
            LineEnding::CRLF => "CRLF",
            LineEnding::CR => "CR",
        }
    }

    /// Search `text` for the first separator of this convention.
    ///
    /// `text` is decoded text, so every separator byte found is a complete
    /// character. Under `CRLF`, a bare `\r` that is the very last byte of
    /// `text` is reported as [`Separator::Partial`]: its `\n` may still be
    /// on its way. A bare `\r` followed by anything other than `\n` is
    /// ordinary text and never splits a line.
    pub fn find(&self, text: &[u8]) -> Separator {
        match *self {
            LineEnding::LF => match memchr(b'\n', text) {
                Some(at) => Separator::Found { at, len: 1 },
                None => Separator::None,
            },
            LineEnding::CR => match memchr(b'\r', text) {
                Some(at) => Separator::Found { at, len: 1 },
                None => Separator::None,
            },
            LineEnding::CRLF => {
                let mut from = 0;
                while let Some(i) = memchr(b'\r', &text[from..]) {
                    let at = from + i;
                    match text.get(at + 1) {
                        Some(&b'\n') => return Separator::Found { at, len: 2 },
                        Some(_) => from = at + 1,
                        None => return Separator::Partial { at },
                    }
                }
                Separator::None
            }
        }
    }
}

impl Default for LineEnding {
    fn default() -> LineEnding {
        LineEnding::CRLF
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LineEnding {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<LineEnding, ParseOptionError> {
        if s.eq_ignore_ascii_case("LF") {
            Ok(LineEnding::LF)
        } else if s.eq_ignore_ascii_case("CRLF") {
            Ok(LineEnding::CRLF)
        } else if s.eq_ignore_ascii_case("CR") {
            Ok(LineEnding::CR)
        } else {
            Err(ParseOptionError { option: "newline" })
        }
    }
}

/// The result of searching decoded text for a record separator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Separator {
    /// A complete separator of `len` bytes starting at `at`.
    Found {
        /// Offset of the first separator byte.
        at: usize,
        /// Length of the separator in bytes.
        len: usize,
    },
    /// A bare `\r` at offset `at` ends the text, and the convention is
    /// `CRLF`. Whether it starts a separator is decided by what follows.
    Partial {
        /// Offset of the trailing `\r`.
        at: usize,
    },
    /// No separator, complete or partial, occurs in the text.
    None,
}

/// An error returned when an option name is not recognized.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseOptionError {
    option: &'static str,
}

impl ParseOptionError {
    pub(crate) fn new(option: &'static str) -> ParseOptionError {
        ParseOptionError { option }
    }

    /// The name of the option whose value was not recognized.
    pub fn option(&self) -> &'static str {
        self.option
    }
}

impl fmt::Display for ParseOptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized value for option '{}'", self.option)
    }
}

#[cfg(test)]
mod tests {
    use super::{LineEnding, Separator};

    fn found(at: usize, len: usize) -> Separator {
        Separator::Found { at, len }
    }

    #[test]
    fn find_lf() {
        assert_eq!(LineEnding::LF.find(b"ab\ncd\n"), found(2, 1));
        assert_eq!(LineEnding::LF.find(b"ab\r\ncd"), found(3, 1));
        assert_eq!(LineEnding::LF.find(b"ab\rcd"), Separator::None);
        assert_eq!(LineEnding::LF.find(b""), Separator::None);
    }

    #[test]
    fn find_cr() {
        assert_eq!(LineEnding::CR.find(b"ab\r\ncd"), found(2, 1));
        assert_eq!(LineEnding::CR.find(b"ab\r"), found(2, 1));
        assert_eq!(LineEnding::CR.find(b"ab\ncd"), Separator::None);
    }

    #[test]
    fn find_crlf() {
        assert_eq!(LineEnding::CRLF.find(b"ab\r\ncd"), found(2, 2));
        assert_eq!(LineEnding::CRLF.find(b"a\rb\r\n"), found(3, 2));
        assert_eq!(LineEnding::CRLF.find(b"ab\ncd"), Separator::None);
        assert_eq!(LineEnding::CRLF.find(b"a\rb"), Separator::None);
    }

    #[test]
    fn find_crlf_partial() {
        assert_eq!(
            LineEnding::CRLF.find(b"ab\r"),
            Separator::Partial { at: 2 }
        );
        assert_eq!(
            LineEnding::CRLF.find(b"a\rb\r"),
            Separator::Partial { at: 3 }
        );
        assert_eq!(LineEnding::CRLF.find(b"\r"), Separator::Partial { at: 0 });
    }

    #[test]
    fn parse_names() {
        assert_eq!("LF".parse(), Ok(LineEnding::LF));
        assert_eq!("crlf".parse(), Ok(LineEnding::CRLF));
        assert_eq!("Cr".parse(), Ok(LineEnding::CR));
        let err = "\\n".parse::<LineEnding>().unwrap_err();
        assert_eq!(err.option(), "newline");
    }

    #[test]
    fn text_and_default() {
        assert_eq!(LineEnding::default(), LineEnding::CRLF);
        assert_eq!(LineEnding::CRLF.as_bytes(), b"\r\n");
        assert_eq!(LineEnding::CR.as_str(), "\r");
    }
}
