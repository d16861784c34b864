//! Line codec decode/encode tests

use chrono::TimeZone;

use super::*;

#[test]
fn decode_raw_lines() {
    let codec = LineCodec::new();
    let events = codec.decode(b"first line\nsecond line\n").unwrap();

    assert_eq!(events.len(), 2);
    let raw = events[0].as_raw().unwrap();
    assert_eq!(raw.source(), "line");
    assert_eq!(raw.value(), b"first line");
    assert_eq!(events[1].as_raw().unwrap().value(), b"second line");
}

#[test]
fn decode_applies_default_tags() {
    let mut tags = Tags::new();
    tags.insert("env".into(), "prod".into());
    let codec = LineCodec::with_tags(tags);

    let events = codec.decode(b"payload").unwrap();
    assert!(events[0].has_tag("env"));
}

#[test]
fn decode_line_rejects_empty() {
    let codec = LineCodec::new();
    let err = codec.decode_line("").unwrap_err();
    assert!(err.to_string().contains("can not decode line"));
}

#[test]
fn logline_event_type_unsupported() {
    let mut codec = LineCodec::new();
    let err = codec.set_event_type(EventType::LogLine).unwrap_err();
    assert!(err.to_string().contains("does not support"));
}

#[test]
fn encode_appends_newline() {
    let codec = LineCodec::new();
    let raw = Raw::new("src", b"abc", Tags::new(), Fields::new(), Utc::now()).unwrap();
    let out = codec.encode(&Event::Raw(raw)).unwrap();
    assert_eq!(out, b"abc\n");
}

#[test]
fn encode_to_extends_destination() {
    let codec = LineCodec::new();
    let raw = Raw::new("src", b"abc", Tags::new(), Fields::new(), Utc::now()).unwrap();
    let mut dst = b"prefix:".to_vec();
    codec.encode_to(&Event::Raw(raw), &mut dst).unwrap();
    assert_eq!(dst, b"prefix:abc\n");
}

#[test]
fn metric_round_trip() {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let mut tags = Tags::new();
    tags.insert("acc".into(), "test".into());
    let mut fields = Fields::new();
    fields.insert("value".into(), FieldValue::Float(101.0));
    fields.insert("count".into(), FieldValue::Int(3));
    fields.insert("ok".into(), FieldValue::Bool(true));
    fields.insert("label".into(), FieldValue::Str(r#"with "quotes" and space"#.into()));

    let original =
        Metric::new("acctest", tags, fields, ts, MetricType::Untyped).unwrap();

    let mut codec = LineCodec::new();
    codec.set_event_type(EventType::Metric).unwrap();

    let encoded = codec.encode(&Event::Metric(original.clone())).unwrap();
    let decoded = codec
        .decode_line(std::str::from_utf8(&encoded).unwrap().trim_end())
        .unwrap();

    let decoded = decoded.as_metric().unwrap();
    assert_eq!(decoded.name(), original.name());
    assert_eq!(decoded.tags(), original.tags());
    assert_eq!(decoded.fields(), original.fields());
    assert_eq!(decoded.metric_type(), original.metric_type());
    assert_eq!(
        decoded.time().timestamp_nanos_opt(),
        original.time().timestamp_nanos_opt()
    );
}

#[test]
fn metric_decode_rejects_garbage() {
    let mut codec = LineCodec::new();
    codec.set_event_type(EventType::Metric).unwrap();

    assert!(codec.decode_line("no fields here").is_err());
    assert!(codec.decode_line("name value=1i notanumber").is_err());
    assert!(codec.decode_line(r#"name value="unterminated 123"#).is_err());
}
