#![cfg(feature = "serde")]

use chrono::{NaiveDate, TimeZone, Utc};
use textrec::{
    Charset, CodecConfig, ConfigError, Error, LineEnding, QuotePolicy, Value,
};

fn load(json: &str) -> CodecConfig {
    let config: CodecConfig = serde_json::from_str(json).unwrap();
    config.validate().unwrap();
    config
}

#[test]
fn load_defaults() {
    let config = load("{}");
    assert_eq!(config, CodecConfig::default());
    assert_eq!(config.charset().unwrap(), Charset::from(encoding_rs::UTF_8));
    assert_eq!(config.newline(), LineEnding::CRLF);
    assert!(config.header_line());
    assert_eq!(config.default_timezone(), "UTC");
    assert_eq!(config.default_timestamp_format(), "%Y-%m-%d %H:%M:%S.%6N %z");
}

#[test]
fn load_every_option() {
    let config = load(
        r#"{
            "charset": "utf-16",
            "newline": "LF",
            "header_line": false,
            "delimiter": "\t",
            "quote": "\\",
            "quote_policy": "ALL",
            "escape": "\"",
            "null_string": "\\N",
            "newline_in_field": "CRLF",
            "default_timezone": "+09:00",
            "default_timestamp_format": "%Y/%m/%d",
            "column_options": {
                "created": {"timezone": "UTC", "format": "%H:%M"},
                "seen": {"format": "%s"}
            }
        }"#,
    );
    assert_eq!(config.charset().unwrap(), Charset::UTF_16);
    assert_eq!(config.newline(), LineEnding::LF);
    assert!(!config.header_line());
    assert_eq!(config.delimiter(), '\t');
    assert_eq!(config.quote(), '\\');
    assert_eq!(config.quote_policy(), QuotePolicy::Always);
    assert_eq!(config.escape(), '"');
    assert_eq!(config.null_string(), "\\N");
    assert_eq!(config.newline_in_field(), LineEnding::CRLF);
    assert_eq!(config.default_timezone(), "+09:00");
    assert_eq!(config.default_timestamp_format(), "%Y/%m/%d");
    let created = config.column_options("created").unwrap();
    assert_eq!(created.timezone.as_deref(), Some("UTC"));
    assert_eq!(created.format.as_deref(), Some("%H:%M"));
    let seen = config.column_options("seen").unwrap();
    assert_eq!(seen.timezone, None);
    assert!(config.column_options("other").is_none());
}

#[test]
fn unrecognized_options_are_ignored() {
    let config = load(r#"{"type": "csv", "encoding": "Shift_JIS"}"#);
    let charset = config.charset().unwrap();
    assert_eq!(charset, Charset::from(encoding_rs::SHIFT_JIS));
}

#[test]
fn invalid_option_values() {
    let parse = |json: &str| serde_json::from_str::<CodecConfig>(json);
    assert!(parse(r#"{"newline": "NL"}"#).is_err());
    assert!(parse(r#"{"quote_policy": "SOME"}"#).is_err());
    assert!(parse(r#"{"delimiter": "::"}"#).is_err());
    assert!(parse(r#"{"column_options": []}"#).is_err());
}

#[test]
fn structurally_invalid_config() {
    let config: CodecConfig =
        serde_json::from_str(r#"{"delimiter": "\"", "quote": "\""}"#).unwrap();
    match config.validate() {
        Err(Error::Config(ConfigError::SameCharacter { ch, .. })) => {
            assert_eq!(ch, '"')
        }
        got => panic!("expected a configuration error, got {:?}", got),
    }

    let config: CodecConfig =
        serde_json::from_str(r#"{"escape": "\n"}"#).unwrap();
    assert!(matches!(
        config.validate(),
        Err(Error::Config(ConfigError::LineBreak { option: "escape", .. }))
    ));

    let config: CodecConfig =
        serde_json::from_str(r#"{"charset": "iso-8859-9"}"#).unwrap();
    assert!(matches!(
        config.validate(),
        Err(Error::Config(ConfigError::LossyEncoding { .. }))
    ));

    let config: CodecConfig =
        serde_json::from_str(r#"{"default_timezone": "Asia/Tokyo"}"#)
            .unwrap();
    assert!(matches!(
        config.validate(),
        Err(Error::Config(ConfigError::UnknownTimezone(_)))
    ));
}

#[test]
fn utf16_config_round_trips() {
    let config = load(r#"{"charset": "utf-16", "newline": "LF"}"#);
    let mut wtr = config.record_writer(Vec::<u8>::new(), vec!["a"]).unwrap();
    wtr.write_record(vec!["\u{e9}t\u{e9}"]).unwrap();
    wtr.write_record(vec!["\u{1F600}"]).unwrap();
    let bytes = wtr.into_inner().unwrap();
    assert_eq!(&bytes[..4], &[0xFE, 0xFF, 0x00, 0x61]);

    let chunks: Vec<Vec<u8>> = bytes.chunks(3).map(|c| c.to_vec()).collect();
    let lines = config
        .line_decoder(chunks)
        .unwrap()
        .collect::<textrec::Result<Vec<String>>>()
        .unwrap();
    assert_eq!(lines, vec!["a", "\u{e9}t\u{e9}", "\u{1F600}"]);
}

#[test]
fn us_ascii_config_is_strict() {
    let config = load(r#"{"charset": "US-ASCII", "newline": "LF"}"#);
    let chunks = vec![vec![0x61, 0xE9]];
    let mut dec = config.line_decoder(chunks).unwrap();
    match dec.next() {
        Some(Err(Error::Decode(err))) => {
            assert_eq!(err.offset(), 1);
            assert_eq!(err.length(), 1);
        }
        got => panic!("expected decode error, got {:?}", got),
    }
}

#[test]
fn timestamps_follow_config() {
    let config = load(
        r#"{
            "newline": "LF",
            "header_line": false,
            "column_options": {"local": {"timezone": "+09:00"}}
        }"#,
    );
    let naive = NaiveDate::from_ymd_opt(2015, 1, 27)
        .unwrap()
        .and_hms_micro_opt(19, 23, 49, 123_456)
        .unwrap();
    let ts = Utc.from_utc_datetime(&naive);

    let mut wtr =
        config.record_writer(Vec::<u8>::new(), vec!["utc", "local"]).unwrap();
    wtr.write_record(vec![Value::Timestamp(ts), Value::Timestamp(ts)])
        .unwrap();
    let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    assert_eq!(
        out,
        "2015-01-27 19:23:49.123456 +0000,2015-01-28 04:23:49.123456 +0900\n"
    );

    let err = config.record_writer(Vec::<u8>::new(), vec!["utc"]).unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::UnknownColumn(_))));
}

#[test]
fn writer_honors_header_line() {
    let config = load(r#"{"newline": "LF", "header_line": false}"#);
    let mut wtr = config.record_writer(vec![], vec!["a", "b"]).unwrap();
    wtr.write_record(vec!["1", "2"]).unwrap();
    assert_eq!(wtr.into_inner().unwrap(), b"1,2\n".to_vec());

    let config = load(r#"{"newline": "LF"}"#);
    let mut wtr = config.record_writer(vec![], vec!["a", "b"]).unwrap();
    wtr.write_record(vec!["1", "2"]).unwrap();
    assert_eq!(wtr.into_inner().unwrap(), b"a,b\n1,2\n".to_vec());
}
