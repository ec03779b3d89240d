use std::fmt;
use std::iter::FusedIterator;

use textrec_core::{LineEnding, Separator};
use tracing::{debug, trace};

use crate::charset::{Charset, CharsetDecoder};
use crate::error::{DecodeError, Error, Result};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// Pulling chunks from upstream.
    Reading,
    /// Upstream is exhausted; lines still buffered are being handed out.
    Draining,
    /// Everything has been handed out, or an error ended the pass.
    Done,
}

/// A streaming decoder from byte chunks to lines of text.
///
/// A `LineDecoder` pulls chunks from an iterator, decodes them with the
/// configured charset and splits the decoded text on the configured line
/// ending. Lines are produced lazily, one per call to `next`, and never
/// include their separator.
///
/// Chunk boundaries have no effect on the lines produced. A multi-byte
/// character split across chunks is completed by the following chunk, and
/// so is a `\r\n` separator whose `\r` ends one chunk. All of this carried
/// state lives in the decoder itself, so the upstream iterator is free to
/// block between chunks, and a caller may stop pulling at any point without
/// further cleanup.
///
/// A decoder makes a single pass: once it returns `None` (or an error), it
/// returns `None` forever.
///
/// # Example
///
/// ```
/// use textrec::{LineDecoder, LineEnding};
///
/// let chunks = vec!["t", "1", "\r", "\n", "t", "2"];
/// let lines = LineDecoder::new(chunks, "utf-8", LineEnding::CRLF)?
///     .collect::<textrec::Result<Vec<String>>>()?;
/// assert_eq!(lines, vec!["t1", "t2"]);
/// # Ok::<(), textrec::Error>(())
/// ```
pub struct LineDecoder<I> {
    chunks: I,
    decoder: CharsetDecoder,
    charset: Charset,
    ending: LineEnding,
    /// Decoded text. Everything before `start` has been handed out.
    text: String,
    start: usize,
    /// Offset in `text` where the next separator search begins. Only a
    /// trailing `\r` awaiting its `\n` is ever scanned twice.
    scan: usize,
    chunk: u64,
    offset: u64,
    lines: u64,
    state: State,
}

impl<I: Iterator> LineDecoder<I> {
    /// Create a decoder over `chunks` for the charset named by `label`.
    ///
    /// This fails immediately if the label does not name a known charset.
    /// See [`Charset::for_label`] for the accepted labels.
    pub fn new<T>(
        chunks: T,
        label: &str,
        ending: LineEnding,
    ) -> Result<LineDecoder<I>>
    where
        T: IntoIterator<IntoIter = I>,
    {
        let charset = Charset::for_label(label)?;
        Ok(LineDecoder::with_charset(chunks, charset, ending))
    }

    /// Create a decoder over `chunks` for an already resolved charset.
    ///
    /// Any `&'static Encoding` converts into a charset.
    pub fn with_charset<T, C>(
        chunks: T,
        charset: C,
        ending: LineEnding,
    ) -> LineDecoder<I>
    where
        T: IntoIterator<IntoIter = I>,
        C: Into<Charset>,
    {
        let charset = charset.into();
        debug!(
            charset = charset.name(),
            newline = %ending,
            "line decoder created"
        );
        LineDecoder {
            chunks: chunks.into_iter(),
            decoder: charset.new_decoder(),
            charset,
            ending,
            text: String::new(),
            start: 0,
            scan: 0,
            chunk: 0,
            offset: 0,
            lines: 0,
            state: State::Reading,
        }
    }

    /// The charset used to decode chunks.
    pub fn charset(&self) -> Charset {
        self.charset
    }

    /// The line ending that separates lines.
    pub fn line_ending(&self) -> LineEnding {
        self.ending
    }

    /// The number of chunks pulled from upstream so far.
    pub fn chunks_read(&self) -> u64 {
        self.chunk
    }

    /// The number of bytes pulled from upstream so far.
    pub fn bytes_read(&self) -> u64 {
        self.offset
    }

    /// The number of lines handed out so far.
    pub fn lines_read(&self) -> u64 {
        self.lines
    }

    /// Hand out the next complete line already in `text`, if any.
    fn split(&mut self) -> Option<String> {
        match self.ending.find(&self.text.as_bytes()[self.scan..]) {
            Separator::Found { at, len } => {
                let end = self.scan + at;
                let line = self.text[self.start..end].to_string();
                self.start = end + len;
                self.scan = self.start;
                Some(line)
            }
            Separator::Partial { at } => {
                self.scan += at;
                None
            }
            Separator::None => {
                self.scan = self.text.len();
                None
            }
        }
    }

    fn feed(&mut self, bytes: &[u8]) -> std::result::Result<(), DecodeError> {
        trace!(chunk = self.chunk, bytes = bytes.len(), "decoding chunk");
        if self.start > 0 {
            self.text.drain(..self.start);
            self.scan -= self.start;
            self.start = 0;
        }
        self.decode(bytes, false)?;
        self.chunk += 1;
        self.offset += bytes.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> std::result::Result<(), DecodeError> {
        trace!(chunks = self.chunk, bytes = self.offset, "end of input");
        self.state = State::Draining;
        // Bytes of a character still incomplete at this point are invalid.
        self.decode(&[], true)
    }

    fn decode(
        &mut self,
        src: &[u8],
        last: bool,
    ) -> std::result::Result<(), DecodeError> {
        self.decoder.decode(src, &mut self.text, last).map_err(|bad| {
            let end = self.offset + bad.end as u64;
            DecodeError::new(
                self.charset.name(),
                self.chunk,
                end.saturating_sub(bad.back as u64),
                bad.len,
            )
        })
    }

    /// The final line, which has no separator after it.
    fn remainder(&mut self) -> Option<String> {
        let rest = &self.text[self.start..];
        let crlf = self.ending == LineEnding::CRLF;
        let line = if crlf && rest.ends_with('\r') {
            // A bare `\r` at the very end terminates the last line.
            &rest[..rest.len() - 1]
        } else if rest.is_empty() {
            return None;
        } else {
            rest
        };
        let line = line.to_string();
        self.text.clear();
        self.start = 0;
        self.scan = 0;
        Some(line)
    }
}

impl<I> Iterator for LineDecoder<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        loop {
            if self.state == State::Done {
                return None;
            }
            if let Some(line) = self.split() {
                self.lines += 1;
                return Some(Ok(line));
            }
            let result = match self.state {
                State::Reading => match self.chunks.next() {
                    Some(chunk) => self.feed(chunk.as_ref()),
                    None => self.finish(),
                },
                State::Draining => {
                    self.state = State::Done;
                    let line = self.remainder();
                    if line.is_some() {
                        self.lines += 1;
                    }
                    return line.map(Ok);
                }
                State::Done => return None,
            };
            if let Err(err) = result {
                debug!(error = %err, "decode pass aborted");
                self.state = State::Done;
                return Some(Err(Error::Decode(err)));
            }
        }
    }
}

impl<I> FusedIterator for LineDecoder<I>
where
    I: Iterator,
    I::Item: AsRef<[u8]>,
{
}

impl<I> fmt::Debug for LineDecoder<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineDecoder")
            .field("charset", &self.charset)
            .field("ending", &self.ending)
            .field("pending", &&self.text[self.start..])
            .field("chunk", &self.chunk)
            .field("offset", &self.offset)
            .field("lines", &self.lines)
            .field("state", &self.state)
            .finish()
    }
}
