//! Decoder Tests
//!
//! Tests verify:
//! - Request decoding (arrays of bulk strings)
//! - Single-line frames (+, -, :)
//! - Framing failures and their error kinds
//! - Nesting and size limits
//! - Pipelined frames on one stream

use std::io::{BufReader, Cursor, Read};

use bytes::Bytes;
use respkv::protocol::{Decoder, DecoderOptions, Frame, MAX_LINE_LEN};
use respkv::KvError;

// =============================================================================
// Helper Functions
// =============================================================================

fn decoder(input: &[u8]) -> Decoder<Cursor<Vec<u8>>> {
    Decoder::new(Cursor::new(input.to_vec()))
}

fn decode(input: &[u8]) -> Result<Frame, KvError> {
    decoder(input).decode()
}

fn bulk(s: &str) -> Frame {
    Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
}

fn assert_protocol_error(input: &[u8]) {
    match decode(input) {
        Err(KvError::Protocol(_)) => {}
        other => panic!(
            "Expected protocol error for {:?}, got {:?}",
            String::from_utf8_lossy(input),
            other
        ),
    }
}

/// Reader that hands out one byte per read call
struct Trickle<'a>(&'a [u8]);

impl Read for Trickle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.0.is_empty() || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.0[0];
        self.0 = &self.0[1..];
        Ok(1)
    }
}

// =============================================================================
// Request Decoding Tests
// =============================================================================

#[test]
fn test_decode_get_request() {
    let frame = decode(b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n").unwrap();
    assert_eq!(frame, Frame::Array(vec![bulk("GET"), bulk("foo")]));
}

#[test]
fn test_decode_set_request() {
    let frame = decode(b"*3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n").unwrap();
    assert_eq!(
        frame,
        Frame::Array(vec![bulk("SET"), bulk("key"), bulk("value")])
    );
}

#[test]
fn test_decode_empty_array() {
    assert_eq!(decode(b"*0\r\n").unwrap(), Frame::Array(vec![]));
}

#[test]
fn test_decode_empty_bulk_string() {
    assert_eq!(decode(b"$0\r\n\r\n").unwrap(), bulk(""));
}

#[test]
fn test_decode_bulk_with_embedded_crlf() {
    // Payload is length-delimited, so CR LF inside it is just data
    let frame = decode(b"$8\r\nab\r\ncd\r\n\r\n").unwrap();
    assert_eq!(frame, bulk("ab\r\ncd\r\n"));
}

#[test]
fn test_decode_binary_bulk() {
    let mut input = b"$4\r\n".to_vec();
    input.extend_from_slice(&[0x00, 0xFF, b'\n', 0x80]);
    input.extend_from_slice(b"\r\n");

    let frame = decode(&input).unwrap();
    assert_eq!(frame, Frame::Bulk(Bytes::from_static(&[0x00, 0xFF, b'\n', 0x80])));
}

#[test]
fn test_decode_nested_array() {
    let frame = decode(b"*2\r\n*1\r\n$1\r\na\r\n$1\r\nb\r\n").unwrap();
    assert_eq!(
        frame,
        Frame::Array(vec![Frame::Array(vec![bulk("a")]), bulk("b")])
    );
}

#[test]
fn test_decode_byte_at_a_time() {
    let input = b"*2\r\n$4\r\nECHO\r\n$5\r\nhello\r\n";
    let mut decoder = Decoder::new(BufReader::new(Trickle(input)));

    let frame = decoder.decode().unwrap();
    assert_eq!(frame, Frame::Array(vec![bulk("ECHO"), bulk("hello")]));
}

// =============================================================================
// Single-Line Frame Tests
// =============================================================================

#[test]
fn test_decode_simple_string() {
    assert_eq!(decode(b"+OK\r\n").unwrap(), Frame::Simple("OK".to_string()));
}

#[test]
fn test_decode_empty_simple_string() {
    assert_eq!(decode(b"+\r\n").unwrap(), Frame::Simple(String::new()));
}

#[test]
fn test_decode_error() {
    assert_eq!(
        decode(b"-ERR unknown command\r\n").unwrap(),
        Frame::Error("ERR unknown command".to_string())
    );
}

#[test]
fn test_decode_integers() {
    assert_eq!(decode(b":0\r\n").unwrap(), Frame::Integer(0));
    assert_eq!(decode(b":123456\r\n").unwrap(), Frame::Integer(123456));
    assert_eq!(decode(b":-4321\r\n").unwrap(), Frame::Integer(-4321));
    assert_eq!(
        decode(b":9223372036854775807\r\n").unwrap(),
        Frame::Integer(i64::MAX)
    );
    assert_eq!(
        decode(b":-9223372036854775808\r\n").unwrap(),
        Frame::Integer(i64::MIN)
    );
}

#[test]
fn test_decode_invalid_integers() {
    assert_protocol_error(b":\r\n");
    assert_protocol_error(b":-\r\n");
    assert_protocol_error(b":12a\r\n");
    assert_protocol_error(b":+5\r\n");
    assert_protocol_error(b":9223372036854775808\r\n");
}

// =============================================================================
// End of Stream Tests
// =============================================================================

#[test]
fn test_empty_stream_is_end_of_stream() {
    assert!(matches!(decode(b""), Err(KvError::EndOfStream)));
}

#[test]
fn test_partial_header_is_end_of_stream() {
    assert!(matches!(decode(b"*2\r"), Err(KvError::EndOfStream)));
}

#[test]
fn test_eof_inside_array_is_protocol_error() {
    assert_protocol_error(b"*2\r\n$3\r\nGET\r\n");
}

#[test]
fn test_eof_inside_bulk_payload_is_protocol_error() {
    assert_protocol_error(b"$10\r\nshort");
}

#[test]
fn test_wait_readable_reports_end_of_stream() {
    let mut empty = decoder(b"");
    assert!(matches!(empty.wait_readable(), Err(KvError::EndOfStream)));

    let mut ready = decoder(b"+OK\r\n");
    ready.wait_readable().unwrap();
    assert_eq!(ready.decode().unwrap(), Frame::Simple("OK".to_string()));
}

// =============================================================================
// Framing Failure Tests
// =============================================================================

#[test]
fn test_bulk_shorter_than_declared() {
    // Declared 3 bytes, only 2 arrive before the terminator
    assert_protocol_error(b"$3\r\nab\r\n");
}

#[test]
fn test_bulk_shorter_than_declared_with_trailing_data() {
    assert_protocol_error(b"$3\r\nab\r\n*1\r\n$4\r\nPING\r\n");
}

#[test]
fn test_bulk_longer_than_declared() {
    assert_protocol_error(b"$2\r\nabc\r\n");
}

#[test]
fn test_missing_cr_before_lf() {
    assert_protocol_error(b"*1\n$4\r\nPING\r\n");
}

#[test]
fn test_line_too_short() {
    assert_protocol_error(b"\r\n");
    assert_protocol_error(b"\n");
}

#[test]
fn test_invalid_lengths() {
    assert_protocol_error(b"*abc\r\n");
    assert_protocol_error(b"$\r\n");
    assert_protocol_error(b"$+3\r\nabc\r\n");
    assert_protocol_error(b"*99999999999999999999999999\r\n");
}

#[test]
fn test_negative_lengths_rejected_by_default() {
    assert_protocol_error(b"$-1\r\n");
    assert_protocol_error(b"*-1\r\n");
    assert_protocol_error(b"$-2\r\n");
}

#[test]
fn test_null_accepted_when_enabled() {
    let options = DecoderOptions::default().accept_null(true);

    let mut decoder = Decoder::with_options(Cursor::new(b"$-1\r\n*-1\r\n".to_vec()), options);
    assert_eq!(decoder.decode().unwrap(), Frame::Null);
    assert_eq!(decoder.decode().unwrap(), Frame::Null);

    // Only -1 means null
    let mut decoder = Decoder::with_options(Cursor::new(b"$-2\r\n".to_vec()), options);
    assert!(matches!(decoder.decode(), Err(KvError::Protocol(_))));
}

#[test]
fn test_unsupported_sigil() {
    assert_protocol_error(b"!oops\r\n");
    assert_protocol_error(b"PING\r\n");
}

#[test]
fn test_invalid_utf8_simple_string() {
    assert_protocol_error(b"+\xff\xfe\r\n");
}

#[test]
fn test_overlong_line() {
    let mut input = vec![b'+'];
    input.extend(std::iter::repeat(b'a').take(MAX_LINE_LEN + 10));
    input.extend_from_slice(b"\r\n");
    assert_protocol_error(&input);
}

// =============================================================================
// Limit Tests
// =============================================================================

#[test]
fn test_nesting_limit() {
    let options = DecoderOptions::default().max_depth(2);

    let ok = b"*1\r\n*1\r\n$1\r\na\r\n".to_vec();
    let mut decoder = Decoder::with_options(Cursor::new(ok), options);
    assert!(decoder.decode().is_ok());

    let too_deep = b"*1\r\n*1\r\n*1\r\n$1\r\na\r\n".to_vec();
    let mut decoder = Decoder::with_options(Cursor::new(too_deep), options);
    assert!(matches!(decoder.decode(), Err(KvError::Protocol(_))));
}

#[test]
fn test_deep_nesting_does_not_overflow_stack() {
    let mut input = Vec::new();
    for _ in 0..100_000 {
        input.extend_from_slice(b"*1\r\n");
    }
    assert_protocol_error(&input);
}

#[test]
fn test_bulk_length_limit() {
    let options = DecoderOptions {
        max_bulk_len: 4,
        ..DecoderOptions::default()
    };

    let mut decoder = Decoder::with_options(Cursor::new(b"$4\r\nabcd\r\n".to_vec()), options);
    assert_eq!(decoder.decode().unwrap(), bulk("abcd"));

    let mut decoder = Decoder::with_options(Cursor::new(b"$5\r\nabcde\r\n".to_vec()), options);
    assert!(matches!(decoder.decode(), Err(KvError::Protocol(_))));
}

#[test]
fn test_array_length_limit() {
    let options = DecoderOptions {
        max_array_len: 1,
        ..DecoderOptions::default()
    };

    let mut decoder = Decoder::with_options(Cursor::new(b"*2\r\n+a\r\n+b\r\n".to_vec()), options);
    assert!(matches!(decoder.decode(), Err(KvError::Protocol(_))));
}

#[test]
fn test_huge_declared_bulk_does_not_allocate_up_front() {
    // Declares ~500 MB but sends 3 bytes; must fail cleanly
    assert_protocol_error(b"$500000000\r\nabc");
}

// =============================================================================
// Pipelining Tests
// =============================================================================

#[test]
fn test_pipelined_frames() {
    let mut pipeline = decoder(b"*1\r\n$4\r\nPING\r\n*2\r\n$4\r\nECHO\r\n$2\r\nhi\r\n");

    assert_eq!(pipeline.decode().unwrap(), Frame::Array(vec![bulk("PING")]));
    assert_eq!(
        pipeline.decode().unwrap(),
        Frame::Array(vec![bulk("ECHO"), bulk("hi")])
    );
    assert!(matches!(pipeline.decode(), Err(KvError::EndOfStream)));
}
