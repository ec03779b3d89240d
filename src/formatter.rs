use textrec_core::{FieldFormat, FieldFormatBuilder, LineEnding, QuotePolicy};

use crate::error::{ConfigError, Result};

/// Format a single field.
///
/// `None` is a null field and produces the configured null marker verbatim.
/// `Some(value)` is literal data, quoted or escaped according to `config`.
///
/// # Example
///
/// ```
/// use textrec::{format_field, FormatterConfig};
///
/// let config = FormatterConfig::builder().null_string("N/A").build()?;
/// assert_eq!(format_field(None, &config), "N/A");
/// assert_eq!(format_field(Some("N/A"), &config), "\"N/A\"");
/// assert_eq!(format_field(Some(""), &config), "");
/// assert_eq!(format_field(Some("1,000"), &config), "\"1,000\"");
/// # Ok::<(), textrec::Error>(())
/// ```
pub fn format_field(value: Option<&str>, config: &FormatterConfig) -> String {
    let mut out = String::with_capacity(value.map_or(0, |v| v.len() + 2));
    config.format_into(value, &mut out);
    out
}

/// Check the characters that structure delimited output.
///
/// The delimiter must differ from the quote and escape characters, and none
/// of the three may be a line break. The quote and escape characters may be
/// equal, in which case quotes are escaped by doubling them.
pub(crate) fn validate_chars(
    delimiter: char,
    quote: char,
    escape: char,
) -> std::result::Result<(), ConfigError> {
    for &(option, ch) in
        &[("delimiter", delimiter), ("quote", quote), ("escape", escape)]
    {
        if ch == '\r' || ch == '\n' {
            return Err(ConfigError::LineBreak { option, ch });
        }
    }
    if delimiter == quote {
        return Err(ConfigError::SameCharacter {
            first: "delimiter",
            second: "quote",
            ch: delimiter,
        });
    }
    if delimiter == escape {
        return Err(ConfigError::SameCharacter {
            first: "delimiter",
            second: "escape",
            ch: delimiter,
        });
    }
    Ok(())
}

/// A builder for a validated [`FormatterConfig`].
#[derive(Debug)]
pub struct FormatterConfigBuilder {
    config: FormatterConfig,
    escape: Option<char>,
}

impl Default for FormatterConfigBuilder {
    fn default() -> FormatterConfigBuilder {
        FormatterConfigBuilder {
            config: FormatterConfig::default(),
            escape: None,
        }
    }
}

impl FormatterConfigBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> FormatterConfigBuilder {
        FormatterConfigBuilder::default()
    }

    /// Validate this configuration and build a `FormatterConfig` from it.
    pub fn build(&self) -> Result<FormatterConfig> {
        let mut config = self.config.clone();
        config.escape = self.escape.unwrap_or(config.quote);
        validate_chars(config.delimiter, config.quote, config.escape)?;
        Ok(config)
    }

    /// The field delimiter. The default is `','`.
    pub fn delimiter(
        &mut self,
        delimiter: char,
    ) -> &mut FormatterConfigBuilder {
        self.config.delimiter = delimiter;
        self
    }

    /// The quote character. The default is `'"'`.
    pub fn quote(&mut self, quote: char) -> &mut FormatterConfigBuilder {
        self.config.quote = quote;
        self
    }

    /// The escape character. When unset (the default), the quote character
    /// is used.
    pub fn escape(
        &mut self,
        escape: Option<char>,
    ) -> &mut FormatterConfigBuilder {
        self.escape = escape;
        self
    }

    /// The quoting policy. The default is `QuotePolicy::Minimal`.
    pub fn quote_policy(
        &mut self,
        policy: QuotePolicy,
    ) -> &mut FormatterConfigBuilder {
        self.config.policy = policy;
        self
    }

    /// The line ending that line breaks inside quoted fields are rewritten
    /// to. The default is `LineEnding::LF`.
    pub fn newline_in_field(
        &mut self,
        newline: LineEnding,
    ) -> &mut FormatterConfigBuilder {
        self.config.newline_in_field = newline;
        self
    }

    /// The text written for null fields. The default is empty.
    pub fn null_string<S: Into<String>>(
        &mut self,
        null: S,
    ) -> &mut FormatterConfigBuilder {
        self.config.null_string = null.into();
        self
    }
}

/// The immutable configuration of a field formatting run.
///
/// A `FormatterConfig` can only be obtained through validation, so
/// formatting with it never fails. It is `Send` and `Sync`: sibling fields
/// and whole records can be formatted in parallel from one shared config.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormatterConfig {
    delimiter: char,
    quote: char,
    escape: char,
    policy: QuotePolicy,
    newline_in_field: LineEnding,
    null_string: String,
}

impl Default for FormatterConfig {
    fn default() -> FormatterConfig {
        FormatterConfig {
            delimiter: ',',
            quote: '"',
            escape: '"',
            policy: QuotePolicy::Minimal,
            newline_in_field: LineEnding::LF,
            null_string: String::new(),
        }
    }
}

impl FormatterConfig {
    /// The default configuration: comma delimited, double quotes escaped by
    /// doubling, minimal quoting, `\n` inside fields and an empty null
    /// marker.
    pub fn new() -> FormatterConfig {
        FormatterConfig::default()
    }

    /// Start building a configuration.
    pub fn builder() -> FormatterConfigBuilder {
        FormatterConfigBuilder::new()
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
    pub fn null_string(&self) -> &str {
        &self.null_string
    }

    /// The allocation free formatter borrowing this configuration.
    pub fn field_format(&self) -> FieldFormat<'_> {
        FieldFormatBuilder::new()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(Some(self.escape))
            .quote_policy(self.policy)
            .newline_in_field(self.newline_in_field)
            .null_string(&self.null_string)
            .build()
    }

    /// Format a field and append it to `out`.
    pub fn format_into(&self, value: Option<&str>, out: &mut String) {
        // Writing to a `String` cannot fail.
        let _ = self.field_format().write_field(value, out);
    }
}
