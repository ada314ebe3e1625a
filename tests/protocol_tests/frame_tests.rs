//! Frame Tests
//!
//! Tests for the `[key:]offset:data` write frame grammar.

use vblock::protocol::WriteRequest;
use vblock::VBlockError;

fn parse(frame: &str) -> WriteRequest {
    WriteRequest::parse(frame.as_bytes()).unwrap()
}

fn parse_err(frame: &[u8]) -> VBlockError {
    WriteRequest::parse(frame).unwrap_err()
}

// =============================================================================
// Accepted Frames
// =============================================================================

#[test]
fn test_offset_form() {
    let req = parse("0:HELLO");
    assert_eq!(req.key, None);
    assert_eq!(req.offset, 0);
    assert_eq!(req.data, b"HELLO");
}

#[test]
fn test_keyed_form() {
    let req = parse("5:0:WORLD");
    assert_eq!(req.key, Some(5));
    assert_eq!(req.offset, 0);
    assert_eq!(req.data, b"WORLD");
}

#[test]
fn test_negative_key() {
    let req = parse("-3:512:x");
    assert_eq!(req.key, Some(-3));
    assert_eq!(req.offset, 512);
}

#[test]
fn test_keyed_payload_keeps_colons() {
    let req = parse("111:100:a:b:c");
    assert_eq!(req.key, Some(111));
    assert_eq!(req.offset, 100);
    assert_eq!(req.data, b"a:b:c");
}

#[test]
fn test_unkeyed_payload_keeps_colons() {
    // Second field is not a number, so everything after the first colon is data
    let req = parse("7:time:12:30");
    assert_eq!(req.key, None);
    assert_eq!(req.offset, 7);
    assert_eq!(req.data, b"time:12:30");
}

#[test]
fn test_numeric_first_field_with_text_second_field_is_unkeyed() {
    // "5" could be a key, but "abc" is no offset, so 5 is the offset
    let req = parse("5:abc:WORLD");
    assert_eq!(req.key, None);
    assert_eq!(req.offset, 5);
    assert_eq!(req.data, b"abc:WORLD");

    // A negative first field fits neither form
    assert!(matches!(parse_err(b"-5:abc:WORLD"), VBlockError::InvalidArgument(_)));
}

#[test]
fn test_empty_payload() {
    let req = parse("42:");
    assert_eq!(req.offset, 42);
    assert!(req.data.is_empty());

    let req = parse("1:42:");
    assert_eq!(req.key, Some(1));
    assert!(req.data.is_empty());
}

#[test]
fn test_binary_payload_is_untouched() {
    let mut frame = b"8:".to_vec();
    frame.extend_from_slice(&[0x00, 0xFF, b':', 0x10]);

    let req = WriteRequest::parse(&frame).unwrap();
    assert_eq!(req.data, vec![0x00, 0xFF, b':', 0x10]);
}

// =============================================================================
// Rejected Frames
// =============================================================================

#[test]
fn test_missing_separator() {
    assert!(matches!(parse_err(b"HELLO"), VBlockError::InvalidArgument(_)));
    assert!(matches!(parse_err(b""), VBlockError::InvalidArgument(_)));
}

#[test]
fn test_non_numeric_offset() {
    assert!(matches!(parse_err(b"abc:HELLO"), VBlockError::InvalidArgument(_)));
    assert!(matches!(parse_err(b"x:0:HELLO"), VBlockError::InvalidArgument(_)));
}

#[test]
fn test_negative_offset() {
    assert!(matches!(parse_err(b"-1:HELLO"), VBlockError::InvalidArgument(_)));
}

#[test]
fn test_offset_overflow() {
    assert!(matches!(parse_err(b"99999999999:x"), VBlockError::InvalidArgument(_)));
}

// =============================================================================
// Encoding
// =============================================================================

#[test]
fn test_to_frame() {
    assert_eq!(WriteRequest::new(None, 12, "abc").to_frame(), b"12:abc");
    assert_eq!(WriteRequest::new(Some(9), 0, "x:y").to_frame(), b"9:0:x:y");
}
