use proptest::prelude::*;
use textrec::{
    FormatterConfig, LineDecoder, LineEnding, QuotePolicy, RecordFormatter,
};

type Record = Vec<Option<String>>;

/// A minimal reader for a single formatted line, just enough to undo what
/// the formatter does.
fn parse_line(line: &str, fmt: &FormatterConfig) -> Record {
    let (delim, quote, escape) = (fmt.delimiter(), fmt.quote(), fmt.escape());
    let never = fmt.quote_policy() == QuotePolicy::Never;
    let mut chars = line.chars().peekable();
    let mut fields = vec![];
    loop {
        let mut field = String::new();
        if !never && chars.peek() == Some(&quote) {
            chars.next();
            while let Some(ch) = chars.next() {
                if ch == escape && escape != quote {
                    field.extend(chars.next());
                } else if ch == quote {
                    if escape == quote && chars.peek() == Some(&quote) {
                        chars.next();
                        field.push(quote);
                    } else {
                        break;
                    }
                } else {
                    field.push(ch);
                }
            }
            fields.push(Some(field));
        } else {
            // The null marker is written verbatim, so compare the raw text.
            let mut raw = String::new();
            while let Some(&ch) = chars.peek() {
                if ch == delim {
                    break;
                }
                chars.next();
                raw.push(ch);
                if never && ch == escape {
                    if let Some(next) = chars.next() {
                        raw.push(next);
                        field.push(next);
                    }
                } else {
                    field.push(ch);
                }
            }
            if raw == fmt.null_string() {
                fields.push(None);
            } else {
                fields.push(Some(field));
            }
        }
        match chars.next() {
            None => break,
            Some(ch) => assert_eq!(ch, delim, "line: {:?}", line),
        }
    }
    fields
}

/// Format `records`, cut the output into chunks, decode it back into lines
/// and parse every line.
fn roundtrip(
    records: &[Record],
    fmt: &FormatterConfig,
    cuts: &[usize],
) -> Vec<Record> {
    let rfmt = RecordFormatter::new(fmt.clone(), LineEnding::CRLF);
    let mut out = String::new();
    for record in records {
        rfmt.write_record(record.iter().map(|f| f.as_deref()), &mut out);
    }

    let bytes = out.as_bytes();
    let mut at: Vec<usize> =
        cuts.iter().map(|&c| c % (bytes.len() + 1)).collect();
    at.push(0);
    at.push(bytes.len());
    at.sort();
    at.dedup();
    let chunks: Vec<&[u8]> =
        at.windows(2).map(|w| &bytes[w[0]..w[1]]).collect();

    LineDecoder::new(chunks, "utf-8", LineEnding::CRLF)
        .unwrap()
        .map(|line| parse_line(&line.unwrap(), fmt))
        .collect()
}

fn records(alphabet: &'static str) -> impl Strategy<Value = Vec<Record>> {
    let field = prop::option::of(alphabet);
    prop::collection::vec(prop::collection::vec(field, 1..5), 0..6)
}

proptest! {
    #[test]
    fn prop_minimal(
        records in records("[abNA/,\"\né ]{0,5}"),
        cuts in prop::collection::vec(any::<usize>(), 0..6),
    ) {
        let fmt =
            FormatterConfig::builder().null_string("N/A").build().unwrap();
        prop_assert_eq!(roundtrip(&records, &fmt, &cuts), records);
    }

    #[test]
    fn prop_always_with_empty_null(
        records in records("[ab,\"\né ]{0,5}"),
        cuts in prop::collection::vec(any::<usize>(), 0..6),
    ) {
        let fmt = FormatterConfig::builder()
            .quote_policy(QuotePolicy::Always)
            .build()
            .unwrap();
        prop_assert_eq!(roundtrip(&records, &fmt, &cuts), records);
    }

    #[test]
    fn prop_never_with_escape(
        records in records("[ab|'\"\r\né ]{0,5}"),
        cuts in prop::collection::vec(any::<usize>(), 0..6),
    ) {
        let fmt = FormatterConfig::builder()
            .delimiter('|')
            .quote('\'')
            .escape(Some('\\'))
            .quote_policy(QuotePolicy::Never)
            .null_string("\\N")
            .build()
            .unwrap();
        prop_assert_eq!(roundtrip(&records, &fmt, &cuts), records);
    }
}

#[test]
fn distinct_escape_character() {
    let fmt = FormatterConfig::builder()
        .quote('\'')
        .escape(Some('\\'))
        .build()
        .unwrap();
    let records = vec![
        vec![Some("it's".to_string()), Some("a,b".to_string()), None],
        vec![Some("".to_string()), Some("x\ny".to_string())],
    ];
    assert_eq!(roundtrip(&records, &fmt, &[3, 7, 11]), records);
}

#[test]
fn normalized_newlines_come_back_as_the_in_field_form() {
    let fmt = FormatterConfig::builder()
        .newline_in_field(LineEnding::LF)
        .build()
        .unwrap();
    let records = vec![vec![Some("a\r\nb\rc\nd".to_string())]];
    let want = vec![vec![Some("a\nb\nc\nd".to_string())]];
    assert_eq!(roundtrip(&records, &fmt, &[]), want);
}
