/*!
The `textrec` crate provides the codec layer for moving delimited text
records in and out of a bulk data transfer engine.

There are two halves:

* [`LineDecoder`] turns a stream of raw byte chunks into lines of text. It
  decodes with a [`Charset`], backed by
  [`encoding_rs`](https://docs.rs/encoding_rs), and splits on a configured
  [`LineEnding`]. The lines it produces do not depend on where the chunk
  boundaries fall.
* [`FormatterConfig`] and [`RecordFormatter`] turn field values into
  delimited text under a [`QuotePolicy`], keeping a configured null marker
  distinguishable from real values. Timestamps are rendered with
  [`chrono`](https://docs.rs/chrono) through a [`TimestampFormat`].
  [`RecordWriter`] writes formatted records to an `io::Write` in the output
  charset.

Both halves are usually configured together through [`CodecConfig`], which
can be deserialized with serde when the default `serde` feature is enabled.

# Example

```
use textrec::{CodecConfig, LineEnding, QuotePolicy, Value};

let config = CodecConfig::builder()
    .newline(LineEnding::LF)
    .quote_policy(QuotePolicy::Minimal)
    .null_string("\\N")
    .build()?;

let lines = config
    .line_decoder(vec![&b"id,na"[..], &b"me\n1,Bob\n"[..]])?
    .collect::<textrec::Result<Vec<String>>>()?;
assert_eq!(lines, vec!["id,name", "1,Bob"]);

let mut wtr = config.record_writer(vec![], vec!["id", "name"])?;
wtr.write_record(vec![Value::Long(1), Value::String("Bob, Jr.")])?;
wtr.write_record(vec![Value::Long(2), Value::Null])?;
let out = String::from_utf8(wtr.into_inner()?).unwrap();
assert_eq!(out, "id,name\n1,\"Bob, Jr.\"\n2,\\N\n");
# Ok::<(), textrec::Error>(())
```

# Logging

Construction of decoders and writers, and aborted decode passes, are
reported through [`tracing`](https://docs.rs/tracing) at `debug` level.
Nothing is logged per line above `trace` level.
*/

#![deny(missing_docs)]

pub use encoding_rs::Encoding;
pub use textrec_core::{
    FieldFormat, FieldFormatBuilder, LineEnding, ParseOptionError,
    QuotePolicy, Separator,
};

pub use crate::charset::Charset;
pub use crate::chunk::ByteChunk;
pub use crate::config::{CodecConfig, CodecConfigBuilder, ColumnOptions};
pub use crate::decoder::LineDecoder;
pub use crate::error::{
    ConfigError, DecodeError, EncodeError, Error, Result,
};
pub use crate::formatter::{
    format_field, FormatterConfig, FormatterConfigBuilder,
};
pub use crate::record::{RecordFormatter, Value};
pub use crate::timestamp::{
    TimestampFormat, DEFAULT_TIMESTAMP_FORMAT, DEFAULT_TIMEZONE,
};
pub use crate::writer::{RecordWriter, RecordWriterBuilder};

mod charset;
mod chunk;
mod config;
mod decoder;
mod error;
mod formatter;
mod record;
mod timestamp;
mod writer;
