use std::fmt;

use encoding_rs::{
    mem, Decoder, DecoderResult, Encoding, EncoderResult, REPLACEMENT,
    UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252, WINDOWS_1254, WINDOWS_874,
    X_USER_DEFINED,
};

use crate::error::{ConfigError, Result};

/// A character set resolved from a configuration label.
///
/// Labels are registered charset names such as `UTF-8`, `Shift_JIS`,
/// `ISO-8859-1` or `UTF-16`, matched case-insensitively. Each name keeps
/// its own meaning:
///
/// * `UTF-16` detects the byte order from a byte order mark and reads big
///   endian without one. Output is big endian after a byte order mark.
///   `UTF-16BE` and `UTF-16LE` never read or write a byte order mark.
/// * `US-ASCII` rejects every byte above `0x7F`.
/// * `ISO-8859-1` maps every byte to the code point of the same value.
///
/// A label that the web platform silently maps to a different code page
/// (for example `ISO-8859-9`, which browsers read as `windows-1254`) is
/// rejected instead of being decoded with the wrong table.
///
/// # Example
///
/// ```
/// use textrec::Charset;
///
/// assert_eq!(Charset::for_label("utf-16")?, Charset::UTF_16);
/// assert_eq!(Charset::for_label(" latin1 ")?.name(), "ISO-8859-1");
/// assert!(Charset::for_label("iso-8859-9").is_err());
/// # Ok::<(), textrec::Error>(())
/// ```
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct Charset {
    kind: Kind,
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum Kind {
    Ascii,
    Latin1,
    Utf16,
    Encoding(&'static Encoding),
}

impl Charset {
    /// Seven bit ASCII.
    pub const US_ASCII: Charset = Charset { kind: Kind::Ascii };
    /// ISO-8859-1, where byte `n` is code point `n`.
    pub const ISO_8859_1: Charset = Charset { kind: Kind::Latin1 };
    /// UTF-16 with a byte order mark.
    pub const UTF_16: Charset = Charset { kind: Kind::Utf16 };

    /// Resolve a charset label.
    ///
    /// This fails if the label is unknown, or if it names a charset that
    /// can only be approximated.
    pub fn for_label(label: &str) -> Result<Charset> {
        let name = label.trim().to_ascii_lowercase();
        let kind = match name.as_str() {
            "utf-16" | "utf16" | "utf_16" | "unicode" | "unicodebig" => {
                Kind::Utf16
            }
            "us-ascii" | "ascii" | "us" | "ansi_x3.4-1968" | "iso646-us"
            | "csascii" | "cp367" | "ibm367" => Kind::Ascii,
            "iso-8859-1" | "iso8859-1" | "iso8859_1" | "iso88591"
            | "iso_8859-1" | "iso_8859-1:1987" | "iso-ir-100" | "latin1"
            | "l1" | "cp819" | "ibm819" | "csisolatin1" => Kind::Latin1,
            _ => {
                let encoding = Encoding::for_label(name.as_bytes())
                    .ok_or_else(|| {
                        ConfigError::UnknownEncoding(label.to_string())
                    })?;
                if !names_exactly(&name, encoding) {
                    return Err(ConfigError::LossyEncoding {
                        label: label.to_string(),
                        resolved: encoding.name(),
                    }
                    .into());
                }
                Kind::Encoding(encoding)
            }
        };
        Ok(Charset { kind })
    }

    /// The canonical name of this charset, e.g., `UTF-8`.
    pub fn name(&self) -> &'static str {
        match self.kind {
            Kind::Ascii => "US-ASCII",
            Kind::Latin1 => "ISO-8859-1",
            Kind::Utf16 => "UTF-16",
            Kind::Encoding(encoding) => encoding.name(),
        }
    }

    /// Whether lines can be written in this charset.
    ///
    /// Only the `replacement` encoding, which has no encoder, cannot be
    /// written.
    pub fn can_encode(&self) -> bool {
        match self.kind {
            Kind::Encoding(encoding) => {
                encoding == UTF_16BE
                    || encoding == UTF_16LE
                    || encoding.output_encoding() == encoding
            }
            _ => true,
        }
    }

    /// The bytes written once at the start of output.
    pub(crate) fn bom(&self) -> &'static [u8] {
        match self.kind {
            Kind::Utf16 => &[0xFE, 0xFF],
            _ => &[],
        }
    }

    pub(crate) fn new_decoder(&self) -> CharsetDecoder {
        match self.kind {
            Kind::Ascii => CharsetDecoder::Ascii,
            Kind::Latin1 => CharsetDecoder::Latin1,
            // Sniffs a byte order mark, big endian otherwise.
            Kind::Utf16 => CharsetDecoder::Decoder(UTF_16BE.new_decoder()),
            Kind::Encoding(encoding) => CharsetDecoder::Decoder(
                encoding.new_decoder_without_bom_handling(),
            ),
        }
    }

    /// Append `line` encoded in this charset to `out`.
    ///
    /// On failure, returns the first character that cannot be represented.
    /// `out` may then hold part of the line.
    pub(crate) fn encode(
        &self,
        line: &str,
        out: &mut Vec<u8>,
    ) -> std::result::Result<(), char> {
        let big_endian = match self.kind {
            Kind::Ascii => return encode_latin1(line, 0x7F, out),
            Kind::Latin1 => return encode_latin1(line, 0xFF, out),
            Kind::Utf16 => true,
            Kind::Encoding(encoding) if encoding == UTF_16BE => true,
            Kind::Encoding(encoding) if encoding == UTF_16LE => false,
            Kind::Encoding(encoding) if encoding == UTF_8 => {
                out.extend_from_slice(line.as_bytes());
                return Ok(());
            }
            Kind::Encoding(encoding) => {
                return encode_with(encoding, line, out)
            }
        };
        encode_utf16(line, big_endian, out);
        Ok(())
    }
}

/// Whether `label` resolving to `encoding` keeps the meaning of the name.
fn names_exactly(label: &str, encoding: &'static Encoding) -> bool {
    if encoding == REPLACEMENT || encoding == X_USER_DEFINED {
        false
    } else if encoding == UTF_16BE || encoding == UTF_16LE {
        label.eq_ignore_ascii_case(encoding.name())
    } else if encoding == WINDOWS_1252 || encoding == WINDOWS_1254 {
        label.starts_with("windows-")
            || label.starts_with("cp")
            || label.starts_with("x-cp")
    } else if encoding == WINDOWS_874 {
        label == "windows-874" || label == "dos-874"
    } else {
        true
    }
}

fn encode_latin1(
    line: &str,
    max: u32,
    out: &mut Vec<u8>,
) -> std::result::Result<(), char> {
    if let Some(ch) = line.chars().find(|&ch| ch as u32 > max) {
        return Err(ch);
    }
    out.extend_from_slice(&mem::encode_latin1_lossy(line));
    Ok(())
}

fn encode_utf16(line: &str, big_endian: bool, out: &mut Vec<u8>) {
    out.reserve(2 * line.len());
    for unit in line.encode_utf16() {
        if big_endian {
            out.extend_from_slice(&unit.to_be_bytes());
        } else {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    }
}

fn encode_with(
    encoding: &'static Encoding,
    mut line: &str,
    out: &mut Vec<u8>,
) -> std::result::Result<(), char> {
    // A fresh encoder per line: stateful encodings return to their initial
    // state at the end of every line.
    let mut encoder = encoding.new_encoder();
    loop {
        let need = encoder
            .max_buffer_length_from_utf8_without_replacement(line.len())
            .unwrap_or(line.len());
        out.reserve(need);
        let (result, read) = encoder
            .encode_from_utf8_to_vec_without_replacement(line, out, true);
        line = &line[read..];
        match result {
            EncoderResult::InputEmpty => return Ok(()),
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(ch) => return Err(ch),
        }
    }
}

impl Default for Charset {
    fn default() -> Charset {
        Charset { kind: Kind::Encoding(UTF_8) }
    }
}

impl From<&'static Encoding> for Charset {
    fn from(encoding: &'static Encoding) -> Charset {
        Charset { kind: Kind::Encoding(encoding) }
    }
}

impl fmt::Debug for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Charset({})", self.name())
    }
}

impl fmt::Display for Charset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A malformed byte sequence. It starts `back` bytes before `end`, the
/// number of input bytes consumed when it was found.
#[derive(Debug)]
pub(crate) struct Malformed {
    pub(crate) end: usize,
    pub(crate) back: usize,
    pub(crate) len: usize,
}

/// The decoding state of one pass.
pub(crate) enum CharsetDecoder {
    Decoder(Decoder),
    Ascii,
    Latin1,
}

impl CharsetDecoder {
    /// Decode `src` onto the end of `dst`. With `last` set, bytes of an
    /// incomplete character are malformed.
    pub(crate) fn decode(
        &mut self,
        mut src: &[u8],
        dst: &mut String,
        last: bool,
    ) -> std::result::Result<(), Malformed> {
        match *self {
            CharsetDecoder::Ascii => {
                let valid = Encoding::ascii_valid_up_to(src);
                if valid < src.len() {
                    return Err(Malformed { end: valid + 1, back: 1, len: 1 });
                }
                dst.push_str(&mem::decode_latin1(src));
                Ok(())
            }
            CharsetDecoder::Latin1 => {
                dst.push_str(&mem::decode_latin1(src));
                Ok(())
            }
            CharsetDecoder::Decoder(ref mut decoder) => {
                let mut end = 0;
                loop {
                    let need = decoder
                        .max_utf8_buffer_length_without_replacement(src.len())
                        .unwrap_or(src.len());
                    dst.reserve(need);
                    let (result, read) = decoder
                        .decode_to_string_without_replacement(src, dst, last);
                    end += read;
                    match result {
                        DecoderResult::InputEmpty => return Ok(()),
                        DecoderResult::OutputFull => src = &src[read..],
                        DecoderResult::Malformed(len, after) => {
                            return Err(Malformed {
                                end,
                                back: len as usize + after as usize,
                                len: len as usize,
                            });
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::{SHIFT_JIS, UTF_16LE, UTF_8, WINDOWS_1252};

    use super::Charset;
    use crate::error::{ConfigError, Error};

    fn decode(charset: Charset, bytes: &[u8]) -> Result<String, usize> {
        let mut dec = charset.new_decoder();
        let mut out = String::new();
        dec.decode(bytes, &mut out, true).map_err(|bad| bad.end - bad.back)?;
        Ok(out)
    }

    fn encode(charset: Charset, line: &str) -> Result<Vec<u8>, char> {
        let mut out = vec![];
        charset.encode(line, &mut out)?;
        Ok(out)
    }

    #[test]
    fn registered_names() {
        let cases: &[(&str, &str)] = &[
            ("utf-8", "UTF-8"),
            ("UTF8", "UTF-8"),
            ("Shift_JIS", "Shift_JIS"),
            ("euc-jp", "EUC-JP"),
            ("UTF-16", "UTF-16"),
            ("utf-16le", "UTF-16LE"),
            ("UTF-16BE", "UTF-16BE"),
            ("US-ASCII", "US-ASCII"),
            ("ISO-8859-1", "ISO-8859-1"),
            ("latin1", "ISO-8859-1"),
            ("iso-8859-2", "ISO-8859-2"),
            ("windows-1252", "windows-1252"),
            ("cp1254", "windows-1254"),
        ];
        for &(label, name) in cases {
            assert_eq!(Charset::for_label(label).unwrap().name(), name);
        }
    }

    #[test]
    fn approximated_names_are_rejected() {
        for &label in &["iso-8859-9", "latin5", "tis-620", "ucs-2"] {
            match Charset::for_label(label) {
                Err(Error::Config(ConfigError::LossyEncoding {
                    label: got,
                    ..
                })) => assert_eq!(got, label),
                got => panic!("{}: expected lossy, got {:?}", label, got),
            }
        }
        assert!(Charset::for_label("iso-2022-kr").is_err());
        assert!(Charset::for_label("x-user-defined").is_err());
    }

    #[test]
    fn unknown_name() {
        match Charset::for_label("utf-9") {
            Err(Error::Config(ConfigError::UnknownEncoding(label))) => {
                assert_eq!(label, "utf-9")
            }
            got => panic!("expected unknown encoding, got {:?}", got),
        }
    }

    #[test]
    fn us_ascii_is_strict() {
        assert_eq!(decode(Charset::US_ASCII, b"abc"), Ok("abc".to_string()));
        assert_eq!(decode(Charset::US_ASCII, b"a\xe9"), Err(1));
        assert_eq!(encode(Charset::US_ASCII, "abc"), Ok(b"abc".to_vec()));
        assert_eq!(encode(Charset::US_ASCII, "caf\u{e9}"), Err('\u{e9}'));
    }

    #[test]
    fn latin1_maps_every_byte() {
        let bytes: Vec<u8> = (0..=255).collect();
        let text = decode(Charset::ISO_8859_1, &bytes).unwrap();
        assert!(text.chars().map(|ch| ch as u32).eq(0..=255));
        assert_eq!(encode(Charset::ISO_8859_1, &text), Ok(bytes));
        assert_eq!(encode(Charset::ISO_8859_1, "\u{20ac}"), Err('\u{20ac}'));
        // windows-1252 reads the same byte as the euro sign.
        let cp1252 = decode(Charset::from(WINDOWS_1252), b"\x80").unwrap();
        assert_eq!(cp1252, "\u{20ac}");
        assert_eq!(decode(Charset::ISO_8859_1, b"\x80").unwrap(), "\u{80}");
    }

    #[test]
    fn utf16_byte_order() {
        let be = [0xFE, 0xFF, 0x00, 0x61, 0x00, 0x62];
        assert_eq!(decode(Charset::UTF_16, &be).unwrap(), "ab");
        let le = [0xFF, 0xFE, 0x61, 0x00, 0x62, 0x00];
        assert_eq!(decode(Charset::UTF_16, &le).unwrap(), "ab");
        let unmarked = [0x00, 0x61, 0x00, 0x62];
        assert_eq!(decode(Charset::UTF_16, &unmarked).unwrap(), "ab");
        // An explicit byte order keeps a leading mark as a character.
        let le = [0xFF, 0xFE, 0x61, 0x00];
        let got = decode(Charset::from(UTF_16LE), &le).unwrap();
        assert_eq!(got, "\u{feff}a");
    }

    #[test]
    fn utf16_output() {
        assert_eq!(Charset::UTF_16.bom(), &[0xFE, 0xFF]);
        assert_eq!(
            encode(Charset::UTF_16, "a\u{e9}"),
            Ok(vec![0x00, 0x61, 0x00, 0xE9])
        );
        assert_eq!(
            encode(Charset::from(UTF_16LE), "a\u{1F600}"),
            Ok(vec![0x61, 0x00, 0x3D, 0xD8, 0x00, 0xDE])
        );
        assert!(Charset::from(UTF_16LE).bom().is_empty());
        assert!(Charset::from(UTF_16LE).can_encode());
    }

    #[test]
    fn legacy_output() {
        assert_eq!(
            encode(Charset::from(SHIFT_JIS), "\u{8868}"),
            Ok(vec![0x95, 0x5C])
        );
        let sjis = Charset::from(SHIFT_JIS);
        assert_eq!(encode(sjis, "\u{1F600}"), Err('\u{1F600}'));
        assert_eq!(encode(Charset::default(), "\u{e9}"), Ok(vec![0xC3, 0xA9]));
        assert_eq!(Charset::default(), Charset::from(UTF_8));
        assert!(!Charset::from(encoding_rs::REPLACEMENT).can_encode());
    }
}
