use chrono::{DateTime, Utc};
use textrec_core::LineEnding;

use crate::formatter::FormatterConfig;
use crate::timestamp::TimestampFormat;

/// One typed field of an output record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<'a> {
    /// An absent value, written as the null marker.
    Null,
    /// Written as `true` or `false`.
    Boolean(bool),
    /// Written in decimal.
    Long(i64),
    /// Written in the shortest form that reads back to the same `f64`.
    /// Non-finite values are written `NaN`, `Infinity` and `-Infinity`.
    Double(f64),
    /// Written as-is, subject to quoting.
    String(&'a str),
    /// Written with the timestamp format of its column.
    Timestamp(DateTime<Utc>),
}

impl<'a> Value<'a> {
    /// Returns true if and only if this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        match *self {
            Value::Null => true,
            _ => false,
        }
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Value<'a> {
        Value::String(s)
    }
}

impl<'a> From<&'a String> for Value<'a> {
    fn from(s: &'a String) -> Value<'a> {
        Value::String(s)
    }
}

impl<'a> From<bool> for Value<'a> {
    fn from(b: bool) -> Value<'a> {
        Value::Boolean(b)
    }
}

impl<'a> From<i64> for Value<'a> {
    fn from(n: i64) -> Value<'a> {
        Value::Long(n)
    }
}

impl<'a> From<f64> for Value<'a> {
    fn from(x: f64) -> Value<'a> {
        Value::Double(x)
    }
}

impl<'a> From<DateTime<Utc>> for Value<'a> {
    fn from(ts: DateTime<Utc>) -> Value<'a> {
        Value::Timestamp(ts)
    }
}

impl<'a, T: Into<Value<'a>>> From<Option<T>> for Value<'a> {
    fn from(v: Option<T>) -> Value<'a> {
        v.map_or(Value::Null, Into::into)
    }
}

/// Joins formatted fields into complete output lines.
///
/// Each field goes through the field formatter on its own; the results are
/// separated by the delimiter and the line is terminated by the record line
/// ending. Like [`FormatterConfig`], a `RecordFormatter` is immutable and
/// may be shared between threads.
///
/// Timestamps are written with the format of their column, if one was set,
/// and with the default timestamp format otherwise.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordFormatter {
    field: FormatterConfig,
    newline: LineEnding,
    timestamp: TimestampFormat,
    columns: Vec<Option<TimestampFormat>>,
}

impl RecordFormatter {
    /// Create a record formatter from a field configuration and the line
    /// ending that terminates records.
    pub fn new(
        field: FormatterConfig,
        newline: LineEnding,
    ) -> RecordFormatter {
        RecordFormatter {
            field,
            newline,
            timestamp: TimestampFormat::default(),
            columns: vec![],
        }
    }

    /// Use `format` for timestamps in columns without a format of their
    /// own.
    pub fn with_timestamp_format(
        mut self,
        format: TimestampFormat,
    ) -> RecordFormatter {
        self.timestamp = format;
        self
    }

    /// Use `format` for timestamps in the zero based `column`.
    pub fn with_column_timestamp_format(
        mut self,
        column: usize,
        format: TimestampFormat,
    ) -> RecordFormatter {
        if self.columns.len() <= column {
            self.columns.resize(column + 1, None);
        }
        self.columns[column] = Some(format);
        self
    }

    /// The timestamp format of the zero based `column`.
    pub fn timestamp_format(&self, column: usize) -> &TimestampFormat {
        match self.columns.get(column) {
            Some(Some(format)) => format,
            _ => &self.timestamp,
        }
    }

    /// The field configuration.
    pub fn field_config(&self) -> &FormatterConfig {
        &self.field
    }

    /// The record line ending.
    pub fn newline(&self) -> LineEnding {
        self.newline
    }

    /// Format one record as a terminated line.
    ///
    /// # Example
    ///
    /// ```
    /// use textrec::{FormatterConfig, LineEnding, RecordFormatter, Value};
    ///
    /// let fmt =
    ///     RecordFormatter::new(FormatterConfig::new(), LineEnding::CRLF);
    /// let line = fmt.format_record(vec![
    ///     Value::Long(1),
    ///     Value::String("a,b"),
    ///     Value::Null,
    ///     Value::Double(2.5),
    /// ]);
    /// assert_eq!(line, "1,\"a,b\",,2.5\r\n");
    /// ```
    pub fn format_record<'v, I, V>(&self, values: I) -> String
    where
        I: IntoIterator<Item = V>,
        V: Into<Value<'v>>,
    {
        let mut line = String::new();
        self.write_record(values, &mut line);
        line
    }

    /// Append one record, as a terminated line, to `out`.
    pub fn write_record<'v, I, V>(&self, values: I, out: &mut String)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value<'v>>,
    {
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                out.push(self.field.delimiter());
            }
            self.write_column(self.timestamp_format(i), value.into(), out);
        }
        out.push_str(self.newline.as_str());
    }

    /// Append a header line of column names to `out`.
    ///
    /// Column names are literal text: they are never written as nulls.
    pub fn write_header<I, S>(&self, names: I, out: &mut String)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (i, name) in names.into_iter().enumerate() {
            if i > 0 {
                out.push(self.field.delimiter());
            }
            self.field.format_into(Some(name.as_ref()), out);
        }
        out.push_str(self.newline.as_str());
    }

    /// Append a single formatted field to `out`.
    ///
    /// A timestamp is written with the default timestamp format.
    pub fn write_value(&self, value: Value<'_>, out: &mut String) {
        self.write_column(&self.timestamp, value, out)
    }

    fn write_column(
        &self,
        timestamp: &TimestampFormat,
        value: Value<'_>,
        out: &mut String,
    ) {
        match value {
            Value::Null => self.field.format_into(None, out),
            Value::Boolean(b) => {
                let text = if b { "true" } else { "false" };
                self.field.format_into(Some(text), out)
            }
            Value::Long(n) => {
                let mut buf = itoa::Buffer::new();
                self.field.format_into(Some(buf.format(n)), out)
            }
            Value::Double(x) => {
                let mut buf = ryu::Buffer::new();
                let text = if x.is_nan() {
                    "NaN"
                } else if x.is_infinite() {
                    if x > 0.0 {
                        "Infinity"
                    } else {
                        "-Infinity"
                    }
                } else {
                    buf.format_finite(x)
                };
                self.field.format_into(Some(text), out)
            }
            Value::String(s) => self.field.format_into(Some(s), out),
            Value::Timestamp(ts) => {
                let mut text = String::with_capacity(32);
                timestamp.write(&ts, &mut text);
                self.field.format_into(Some(&text), out)
            }
        }
    }
}
