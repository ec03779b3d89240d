use core::fmt;
use core::str::FromStr;

use crate::newline::{LineEnding, ParseOptionError};

/// The quoting policy to use when writing fields.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum QuotePolicy {
    /// This puts quotes around every field. Always.
    #[cfg_attr(feature = "serde", serde(rename = "ALWAYS", alias = "ALL"))]
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields are empty or contain a quote, delimiter
    /// or line break.
    ///
    /// This is the default.
    #[cfg_attr(feature = "serde", serde(rename = "MINIMAL"))]
    Minimal,
    /// This *never* writes quotes.
    ///
    /// Delimiters and line breaks are instead prefixed with the escape
    /// character. Quote characters are written as-is, so a reader cannot
    /// tell an embedded quote apart from a quoting one.
    #[cfg_attr(feature = "serde", serde(rename = "NEVER", alias = "NONE"))]
    Never,
}

impl Default for QuotePolicy {
    fn default() -> QuotePolicy {
        QuotePolicy::Minimal
    }
}

impl QuotePolicy {
    /// The option name of this policy, e.g., `MINIMAL`.
    pub fn name(&self) -> &'static str {
        match *self {
            QuotePolicy::Always => "ALWAYS",
            QuotePolicy::Minimal => "MINIMAL",
            QuotePolicy::Never => "NEVER",
        }
    }
}

impl fmt::Display for QuotePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuotePolicy {
    type Err = ParseOptionError;

    fn from_str(s: &str) -> Result<QuotePolicy, ParseOptionError> {
        let policy = if s.eq_ignore_ascii_case("ALWAYS")
            || s.eq_ignore_ascii_case("ALL")
        {
            QuotePolicy::Always
        } else if s.eq_ignore_ascii_case("MINIMAL") {
            QuotePolicy::Minimal
        } else if s.eq_ignore_ascii_case("NEVER")
            || s.eq_ignore_ascii_case("NONE")
        {
            QuotePolicy::Never
        } else {
            return Err(ParseOptionError::new("quote_policy"));
        };
        Ok(policy)
    }
}

/// What happens to a non-null field on its way out.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Treatment {
    Verbatim,
    Quote,
    Escape,
}

/// A builder for configuring a field formatter.
///
/// This builder permits specifying the delimiter, quote and escape
/// characters, the quoting policy, the line ending used inside quoted
/// fields and the null marker.
#[derive(Debug)]
pub struct FieldFormatBuilder<'a> {
    fmt: FieldFormat<'a>,
    escape: Option<char>,
}

impl<'a> Default for FieldFormatBuilder<'a> {
    fn default() -> FieldFormatBuilder<'a> {
        FieldFormatBuilder::new()
    }
}

impl<'a> FieldFormatBuilder<'a> {
    /// Create a new builder for configuring a field formatter.
    pub fn new() -> FieldFormatBuilder<'a> {
        FieldFormatBuilder { fmt: FieldFormat::default(), escape: None }
    }

    /// Build a field formatter from this configuration.
    pub fn build(&self) -> FieldFormat<'a> {
        let mut fmt = self.fmt;
        fmt.escape = self.escape.unwrap_or(fmt.quote);
        fmt
    }

    /// The field delimiter. Only consulted to decide whether a field needs
    /// quoting (or escaping, under `QuotePolicy::Never`).
    ///
    /// The default is `','`.
    pub fn delimiter(
        &mut self,
        delimiter: char,
    ) -> &mut FieldFormatBuilder<'a> {
        self.fmt.delimiter = delimiter;
        self
    }

    /// The quote character.
    ///
    /// The default is `'"'`.
    pub fn quote(&mut self, quote: char) -> &mut FieldFormatBuilder<'a> {
        self.fmt.quote = quote;
        self
    }

    /// The escape character, written immediately before every quote inside
    /// a quoted field, and before every delimiter and line break when
    /// quoting is disabled.
    ///
    /// When unset (the default), the quote character is used, which escapes
    /// quotes by doubling them.
    pub fn escape(
        &mut self,
        escape: Option<char>,
    ) -> &mut FieldFormatBuilder<'a> {
        self.escape = escape;
        self
    }

    /// The quoting policy.
    ///
    /// By default, this is set to `QuotePolicy::Minimal`.
    pub fn quote_policy(
        &mut self,
        policy: QuotePolicy,
    ) -> &mut FieldFormatBuilder<'a> {
        self.fmt.policy = policy;
        self
    }

    /// The line ending that every line break inside a quoted field is
    /// rewritten to.
    ///
    /// The default is `LineEnding::LF`.
    pub fn newline_in_field(
        &mut self,
        newline: LineEnding,
    ) -> &mut FieldFormatBuilder<'a> {
        self.fmt.newline_in_field = newline;
        self
    }

    /// The text written in place of a null field.
    ///
    /// The default is the empty string.
    pub fn null_string(
        &mut self,
        null: &'a str,
    ) -> &mut FieldFormatBuilder<'a> {
        self.fmt.null = null;
        self
    }
}

/// A formatter for single fields of delimited text.
///
/// A `FieldFormat` holds no state between calls. Formatting one field never
/// affects another, so any number of fields may be formatted concurrently
/// from shared references.
#[derive(Clone, Copy, Debug)]
pub struct FieldFormat<'a> {
    delimiter: char,
    quote: char,
    escape: char,
    policy: QuotePolicy,
    newline_in_field: LineEnding,
    null: &'a str,
}

impl<'a> Default for FieldFormat<'a> {
    fn default() -> FieldFormat<'a> {
        FieldFormat {
            delimiter: ',',
            quote: '"',
            escape: '"',
            policy: QuotePolicy::default(),
            newline_in_field: LineEnding::LF,
            null: "",
        }
    }
}

impl<'a> FieldFormat<'a> {
    /// Creates a field formatter with the default configuration.
    pub fn new() -> FieldFormat<'a> {
        FieldFormat::default()
    }

    /// The field delimiter.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The quote character.
    pub fn quote(&self) -> char {
        self.quote
    }

    /// The escape character.
    pub fn escape(&self) -> char {
        self.escape
    }

    /// The quoting policy.
    pub fn quote_policy(&self) -> QuotePolicy {
        self.policy
    }

    /// The line ending used inside quoted fields.
    pub fn newline_in_field(&self) -> LineEnding {
        self.newline_in_field
    }

    /// The null marker.
    pub fn null_string(&self) -> &'a str {
        self.null
    }

    /// Write one field to `out`.
    ///
    /// `None` is a null field and is always written as the bare null marker,
    /// regardless of the quoting policy. `Some(value)` is literal data.
    pub fn write_field<W: fmt::Write + ?Sized>(
        &self,
        value: Option<&str>,
        out: &mut W,
    ) -> fmt::Result {
        let value = match value {
            None => return out.write_str(self.null),
            Some(value) => value,
        };
        match self.treatment(value) {
            Treatment::Verbatim => out.write_str(value),
            Treatment::Quote => self.write_quoted(value, out),
            Treatment::Escape => self.write_escaped(value, out),
        }
    }

    /// Returns true if and only if `value` contains a delimiter, a quote or
    /// a line break, or is empty.
    pub fn needs_protection(&self, value: &str) -> bool {
        value.is_empty()
            || value.contains(|c: char| {
                c == self.delimiter
                    || c == self.quote
                    || c == '\r'
                    || c == '\n'
            })
    }

    fn treatment(&self, value: &str) -> Treatment {
        // A non-empty null marker makes an unquoted empty field unambiguous,
        // but literal text equal to the marker must be told apart from it.
        if !self.null.is_empty() {
            if value.is_empty() {
                return Treatment::Verbatim;
            }
            if value == self.null {
                return match self.policy {
                    QuotePolicy::Never => Treatment::Verbatim,
                    QuotePolicy::Always | QuotePolicy::Minimal => {
                        Treatment::Quote
                    }
                };
            }
        }
        match self.policy {
            QuotePolicy::Always => Treatment::Quote,
            QuotePolicy::Minimal if self.needs_protection(value) => {
                Treatment::Quote
            }
            QuotePolicy::Minimal => Treatment::Verbatim,
            QuotePolicy::Never => Treatment::Escape,
        }
    }

    fn write_quoted<W: fmt::Write + ?Sized>(
        &self,
        value: &str,
        out: &mut W,
    ) -> fmt::Result {
        out.write_char(self.quote)?;
        let mut start = 0;
        let mut chars = value.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '\r' || c == '\n' {
                out.write_str(&value[start..i])?;
                out.write_str(self.newline_in_field.as_str())?;
                start = i + 1;
                if c == '\r' {
                    if let Some(&(_, '\n')) = chars.peek() {
                        chars.next();
                        start += 1;
                    }
                }
            } else if c == self.quote {
                out.write_str(&value[start..i])?;
                out.write_char(self.escape)?;
                // The quote itself goes out with the next run.
                start = i;
            }
        }
        out.write_str(&value[start..])?;
        out.write_char(self.quote)
    }

    fn write_escaped<W: fmt::Write + ?Sized>(
        &self,
        value: &str,
        out: &mut W,
    ) -> fmt::Result {
        let mut start = 0;
        for (i, c) in value.char_indices() {
            if c == self.delimiter || c == '\r' || c == '\n' {
                out.write_str(&value[start..i])?;
                out.write_char(self.escape)?;
                start = i;
            }
        }
        out.write_str(&value[start..])
    }
}
