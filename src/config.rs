use std::collections::BTreeMap;
use std::io;

use textrec_core::{LineEnding, QuotePolicy};

use crate::charset::Charset;
use crate::decoder::LineDecoder;
use crate::error::{ConfigError, Result};
use crate::formatter::{validate_chars, FormatterConfig};
use crate::record::RecordFormatter;
use crate::timestamp::{
    TimestampFormat, DEFAULT_TIMESTAMP_FORMAT, DEFAULT_TIMEZONE,
};
use crate::writer::{RecordWriter, RecordWriterBuilder};

/// The codec options of one transfer.
///
/// This is the configuration handed over by the surrounding engine. With the
/// `serde` feature (enabled by default) it can be deserialized directly from
/// a plugin configuration; missing options take their defaults and options
/// not listed here are ignored.
///
/// | option                     | default                      |
/// |----------------------------|------------------------------|
/// | `encoding`                 | `utf-8`                      |
/// | `newline`                  | `CRLF`                       |
/// | `newline_in_field`         | `LF`                         |
/// | `delimiter`                | `,`                          |
/// | `quote`                    | `"`                          |
/// | `escape`                   | the quote character          |
/// | `quote_policy`             | `MINIMAL`                    |
/// | `null_string`              | empty                        |
/// | `header_line`              | `true`                       |
/// | `default_timezone`         | `UTC`                        |
/// | `default_timestamp_format` | `%Y-%m-%d %H:%M:%S.%6N %z`   |
/// | `column_options`           | none                         |
///
/// `charset` is accepted as an alias of `encoding`. `column_options` maps
/// column names to [`ColumnOptions`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CodecConfig {
    #[cfg_attr(feature = "serde", serde(alias = "charset"))]
    encoding: String,
    newline: LineEnding,
    newline_in_field: LineEnding,
    delimiter: char,
    quote: char,
    escape: Option<char>,
    quote_policy: QuotePolicy,
    null_string: String,
    header_line: bool,
    default_timezone: String,
    default_timestamp_format: String,
    column_options: BTreeMap<String, ColumnOptions>,
}

/// Timestamp options of a single column. Unset options fall back to
/// `default_timezone` and `default_timestamp_format`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ColumnOptions {
    /// The timezone timestamps of this column are shown in.
    pub timezone: Option<String>,
    /// The timestamp format of this column.
    pub format: Option<String>,
}

impl Default for CodecConfig {
    fn default() -> CodecConfig {
        CodecConfig {
            encoding: "utf-8".to_string(),
            newline: LineEnding::CRLF,
            newline_in_field: LineEnding::LF,
            delimiter: ',',
            quote: '"',
            escape: None,
            quote_policy: QuotePolicy::Minimal,
            null_string: String::new(),
            header_line: true,
            default_timezone: DEFAULT_TIMEZONE.to_string(),
            default_timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            column_options: BTreeMap::new(),
        }
    }
}

impl CodecConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::new()
    }

    /// Check that this configuration can be used.
    ///
    /// This resolves the charset label, checks the delimiter, quote and
    /// escape characters against each other, and checks every timestamp
    /// format and timezone.
    pub fn validate(&self) -> Result<()> {
        self.charset()?;
        validate_chars(self.delimiter, self.quote, self.escape())?;
        self.timestamp_format()?;
        for options in self.column_options.values() {
            self.column_timestamp_format(options)?;
        }
        Ok(())
    }

    /// The charset label as configured.
    pub fn encoding_label(&self) -> &str {
        &self.encoding
    }

    /// Resolve the charset label.
    pub fn charset(&self) -> Result<Charset> {
        Charset::for_label(&self.encoding)
    }

    /// The record line ending.
    pub fn newline(&self) -> LineEnding {
        self.newline
    }

    /// The line ending used inside quoted fields.
    pub fn newline_in_field(&self) -> LineEnding {
        self.newline_in_field
    }

    /// The field delimiter.
    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// The quote character.
    pub fn quote(&self) -> char {
        self.quote
    }

    /// The escape character, which falls back to the quote character.
    pub fn escape(&self) -> char {
        self.escape.unwrap_or(self.quote)
    }

    /// The quoting policy.
    pub fn quote_policy(&self) -> QuotePolicy {
        self.quote_policy
    }

    /// The null marker.
    pub fn null_string(&self) -> &str {
        &self.null_string
    }

    /// Whether a header record precedes the data.
    pub fn header_line(&self) -> bool {
        self.header_line
    }

    /// The timezone of timestamps in columns without their own.
    pub fn default_timezone(&self) -> &str {
        &self.default_timezone
    }

    /// The format of timestamps in columns without their own.
    pub fn default_timestamp_format(&self) -> &str {
        &self.default_timestamp_format
    }

    /// The options of the named column, if any were configured.
    pub fn column_options(&self, column: &str) -> Option<&ColumnOptions> {
        self.column_options.get(column)
    }

    /// The timestamp format of columns without options of their own.
    pub fn timestamp_format(&self) -> Result<TimestampFormat> {
        TimestampFormat::new(
            &self.default_timestamp_format,
            &self.default_timezone,
        )
    }

    fn column_timestamp_format(
        &self,
        options: &ColumnOptions,
    ) -> Result<TimestampFormat> {
        let format = options
            .format
            .as_deref()
            .unwrap_or(&self.default_timestamp_format);
        let timezone =
            options.timezone.as_deref().unwrap_or(&self.default_timezone);
        TimestampFormat::new(format, timezone)
    }

    /// The field formatter configuration.
    pub fn formatter(&self) -> Result<FormatterConfig> {
        FormatterConfig::builder()
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(self.escape)
            .quote_policy(self.quote_policy)
            .newline_in_field(self.newline_in_field)
            .null_string(self.null_string.as_str())
            .build()
    }

    /// The record formatter, terminating records with `newline`.
    ///
    /// Timestamps use the default format and timezone. Use
    /// [`CodecConfig::record_formatter_for`] to apply column options.
    pub fn record_formatter(&self) -> Result<RecordFormatter> {
        let fmt = RecordFormatter::new(self.formatter()?, self.newline);
        Ok(fmt.with_timestamp_format(self.timestamp_format()?))
    }

    /// The record formatter for records with the given columns.
    ///
    /// Column options are matched to columns by name. This fails if an
    /// option names a column that is not in `columns`.
    pub fn record_formatter_for<S: AsRef<str>>(
        &self,
        columns: &[S],
    ) -> Result<RecordFormatter> {
        let mut fmt = self.record_formatter()?;
        for (name, options) in &self.column_options {
            let index = columns
                .iter()
                .position(|column| column.as_ref() == name)
                .ok_or_else(|| ConfigError::UnknownColumn(name.clone()))?;
            let format = self.column_timestamp_format(options)?;
            fmt = fmt.with_column_timestamp_format(index, format);
        }
        Ok(fmt)
    }

    /// A line decoder over `chunks` splitting on `newline`.
    pub fn line_decoder<T>(
        &self,
        chunks: T,
    ) -> Result<LineDecoder<T::IntoIter>>
    where
        T: IntoIterator,
    {
        Ok(LineDecoder::with_charset(chunks, self.charset()?, self.newline))
    }

    /// A record writer to `wtr` with the given column names.
    ///
    /// The column names are written as a header before the first record when
    /// `header_line` is enabled. Column options are applied either way.
    pub fn record_writer<W, I, S>(
        &self,
        wtr: W,
        columns: I,
    ) -> Result<RecordWriter<W>>
    where
        W: io::Write,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> =
            columns.into_iter().map(Into::into).collect();
        let mut builder = RecordWriterBuilder::new();
        builder
            .charset(self.charset()?)
            .record_formatter(self.record_formatter_for(&columns)?);
        if self.header_line {
            builder.header(columns);
        }
        builder.from_writer(wtr)
    }
}

/// Builds a [`CodecConfig`] in code.
#[derive(Debug, Default)]
pub struct CodecConfigBuilder {
    config: CodecConfig,
}

impl CodecConfigBuilder {
    /// Create a new builder with the default options.
    pub fn new() -> CodecConfigBuilder {
        CodecConfigBuilder::default()
    }

    /// Validate and return the configuration.
    pub fn build(&self) -> Result<CodecConfig> {
        self.config.validate()?;
        Ok(self.config.clone())
    }

    /// The charset label.
    pub fn encoding<S: Into<String>>(
        &mut self,
        label: S,
    ) -> &mut CodecConfigBuilder {
        self.config.encoding = label.into();
        self
    }

    /// The record line ending.
    pub fn newline(&mut self, newline: LineEnding) -> &mut CodecConfigBuilder {
        self.config.newline = newline;
        self
    }

    /// The line ending used inside quoted fields.
    pub fn newline_in_field(
        &mut self,
        newline: LineEnding,
    ) -> &mut CodecConfigBuilder {
        self.config.newline_in_field = newline;
        self
    }

    /// The field delimiter.
    pub fn delimiter(&mut self, delimiter: char) -> &mut CodecConfigBuilder {
        self.config.delimiter = delimiter;
        self
    }

    /// The quote character.
    pub fn quote(&mut self, quote: char) -> &mut CodecConfigBuilder {
        self.config.quote = quote;
        self
    }

    /// The escape character.
    pub fn escape(&mut self, escape: Option<char>) -> &mut CodecConfigBuilder {
        self.config.escape = escape;
        self
    }

    /// The quoting policy.
    pub fn quote_policy(
        &mut self,
        policy: QuotePolicy,
    ) -> &mut CodecConfigBuilder {
        self.config.quote_policy = policy;
        self
    }

    /// The null marker.
    pub fn null_string<S: Into<String>>(
        &mut self,
        null: S,
    ) -> &mut CodecConfigBuilder {
        self.config.null_string = null.into();
        self
    }

    /// Whether a header record precedes the data.
    pub fn header_line(&mut self, yes: bool) -> &mut CodecConfigBuilder {
        self.config.header_line = yes;
        self
    }

    /// The timezone of timestamps in columns without their own.
    pub fn default_timezone<S: Into<String>>(
        &mut self,
        zone: S,
    ) -> &mut CodecConfigBuilder {
        self.config.default_timezone = zone.into();
        self
    }

    /// The format of timestamps in columns without their own.
    pub fn default_timestamp_format<S: Into<String>>(
        &mut self,
        format: S,
    ) -> &mut CodecConfigBuilder {
        self.config.default_timestamp_format = format.into();
        self
    }

    /// Options for the named column.
    pub fn column_options<S: Into<String>>(
        &mut self,
        column: S,
        options: ColumnOptions,
    ) -> &mut CodecConfigBuilder {
        self.config.column_options.insert(column.into(), options);
        self
    }
}
