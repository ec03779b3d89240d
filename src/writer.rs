use std::fmt;
use std::io;

use tracing::{debug, trace};

use crate::charset::Charset;
use crate::error::{ConfigError, EncodeError, Result};
use crate::record::{RecordFormatter, Value};

/// Builds a record writer with various configuration knobs.
///
/// Once a `RecordWriter` is built, its configuration cannot be changed.
#[derive(Debug)]
pub struct RecordWriterBuilder {
    charset: Charset,
    fmt: Option<RecordFormatter>,
    header: Option<Vec<String>>,
    capacity: usize,
}

impl Default for RecordWriterBuilder {
    fn default() -> RecordWriterBuilder {
        RecordWriterBuilder {
            charset: Charset::default(),
            fmt: None,
            header: None,
            capacity: 8 * (1 << 10),
        }
    }
}

impl RecordWriterBuilder {
    /// Create a new builder for configuring a record writer.
    pub fn new() -> RecordWriterBuilder {
        RecordWriterBuilder::default()
    }

    /// Build a record writer that writes to `wtr`.
    ///
    /// This fails if the configured charset cannot be used for output.
    pub fn from_writer<W: io::Write>(
        &self,
        wtr: W,
    ) -> Result<RecordWriter<W>> {
        RecordWriter::new(self, wtr)
    }

    /// The charset that lines are written in.
    ///
    /// The default is UTF-8. `Charset::UTF_16` writes big endian output
    /// that starts with a byte order mark.
    pub fn charset<C: Into<Charset>>(
        &mut self,
        charset: C,
    ) -> &mut RecordWriterBuilder {
        self.charset = charset.into();
        self
    }

    /// The formatter for records.
    ///
    /// The default formats with `FormatterConfig::default()` and terminates
    /// records with `\r\n`.
    pub fn record_formatter(
        &mut self,
        fmt: RecordFormatter,
    ) -> &mut RecordWriterBuilder {
        self.fmt = Some(fmt);
        self
    }

    /// Column names to write as a header line before the first record.
    ///
    /// By default, no header is written.
    pub fn header<I, S>(&mut self, names: I) -> &mut RecordWriterBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// The number of bytes buffered before they are handed to the
    /// underlying writer.
    pub fn buffer_capacity(
        &mut self,
        capacity: usize,
    ) -> &mut RecordWriterBuilder {
        self.capacity = capacity;
        self
    }
}

/// A writer of formatted records.
///
/// Each record is formatted into a line, encoded into the output charset
/// and buffered. The buffer is handed to the underlying writer when it
/// fills up, on `flush`, and when the writer is dropped. Errors on drop are
/// ignored, so call `flush` to observe them.
///
/// Buffered bytes are handed over at most once. After the underlying writer
/// fails, they are discarded and nothing more is written on drop.
///
/// # Example
///
/// ```
/// use textrec::{RecordWriterBuilder, Value};
///
/// let mut wtr = RecordWriterBuilder::new()
///     .header(vec!["id", "name"])
///     .from_writer(vec![])?;
/// wtr.write_record(vec![Value::Long(1), Value::String("Wile E.")])?;
/// wtr.write_record(vec![Value::Long(2), Value::Null])?;
///
/// let data = String::from_utf8(wtr.into_inner()?).unwrap();
/// assert_eq!(data, "id,name\r\n1,Wile E.\r\n2,\r\n");
/// # Ok::<(), textrec::Error>(())
/// ```
pub struct RecordWriter<W: io::Write> {
    wtr: Option<W>,
    fmt: RecordFormatter,
    charset: Charset,
    /// Written before the first line, then empty.
    bom: &'static [u8],
    header: Option<Vec<String>>,
    line: String,
    buf: Vec<u8>,
    capacity: usize,
    lines: u64,
    failed: bool,
}

impl<W: io::Write> RecordWriter<W> {
    fn new(builder: &RecordWriterBuilder, wtr: W) -> Result<RecordWriter<W>> {
        let charset = builder.charset;
        if !charset.can_encode() {
            let err = ConfigError::UnsupportedOutputEncoding(charset.name());
            return Err(err.into());
        }
        let fmt = builder.fmt.clone().unwrap_or_else(|| {
            RecordFormatter::new(Default::default(), Default::default())
        });
        debug!(
            charset = charset.name(),
            newline = %fmt.newline(),
            header = builder.header.is_some(),
            "record writer created"
        );
        Ok(RecordWriter {
            wtr: Some(wtr),
            fmt,
            charset,
            bom: charset.bom(),
            header: builder.header.clone(),
            line: String::new(),
            buf: Vec::with_capacity(builder.capacity),
            capacity: builder.capacity,
            lines: 0,
            failed: false,
        })
    }

    /// Write one record.
    pub fn write_record<'v, I, V>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value<'v>>,
    {
        self.write_pending_header()?;
        self.line.clear();
        self.fmt.write_record(values, &mut self.line);
        self.emit_line()
    }

    /// Write the header now if it has not been written yet.
    ///
    /// This is done automatically before the first record, and by `flush`,
    /// so that output with zero records still carries its header.
    pub fn write_pending_header(&mut self) -> Result<()> {
        if let Some(names) = self.header.take() {
            trace!(columns = names.len(), "writing header");
            self.line.clear();
            self.fmt.write_header(&names, &mut self.line);
            self.emit_line()?;
        }
        Ok(())
    }

    /// The number of lines written so far, counting the header.
    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    /// The record formatter in use.
    pub fn record_formatter(&self) -> &RecordFormatter {
        &self.fmt
    }

    /// The charset lines are written in.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// Flush the header (if pending) and all buffered lines to the
    /// underlying writer, then flush it.
    pub fn flush(&mut self) -> Result<()> {
        self.write_pending_header()?;
        self.flush_buf()?;
        self.wtr.as_mut().unwrap().flush()?;
        Ok(())
    }

    /// Flush this writer and return the underlying writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.wtr.take().unwrap())
    }

    /// A reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.wtr.as_ref().unwrap()
    }

    fn emit_line(&mut self) -> Result<()> {
        let line = self.lines + 1;
        let start = self.buf.len();
        self.buf.extend_from_slice(self.bom);
        if let Err(ch) = self.charset.encode(&self.line, &mut self.buf) {
            self.buf.truncate(start);
            let err = EncodeError::new(self.charset.name(), ch, line);
            return Err(err.into());
        }
        self.bom = &[];
        self.lines = line;
        if self.buf.len() >= self.capacity {
            self.flush_buf()?;
        }
        Ok(())
    }

    fn flush_buf(&mut self) -> io::Result<()> {
        let result = self.wtr.as_mut().unwrap().write_all(&self.buf);
        // Part of the buffer may have been written already.
        self.buf.clear();
        if result.is_err() {
            self.failed = true;
        }
        result
    }
}

impl<W: io::Write> Drop for RecordWriter<W> {
    fn drop(&mut self) {
        if self.wtr.is_some() && !self.failed {
            let _ = self.flush();
        }
    }
}

impl<W: io::Write + fmt::Debug> fmt::Debug for RecordWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordWriter")
            .field("wtr", &self.wtr)
            .field("fmt", &self.fmt)
            .field("charset", &self.charset)
            .field("buffered", &self.buf.len())
            .field("lines", &self.lines)
            .field("failed", &self.failed)
            .finish()
    }
}
