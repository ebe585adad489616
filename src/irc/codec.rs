//! CRLF line codec.
//!
//! Splits an incoming byte stream into protocol lines and terminates outgoing
//! lines with CRLF. Decoding is lossy: invalid UTF-8 is replaced with U+FFFD
//! so a single corrupt byte never tears down the connection.

use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

const TERMINATOR: &[u8; 2] = b"\r\n";

/// Line codec for CRLF-terminated protocol lines.
///
/// The read buffer never holds more than one unterminated fragment between
/// calls. There is no line-length limit.
#[derive(Debug, Default)]
pub struct LineCodec {
    /// Index of next byte to check for a terminator
    next_index: usize,
}

impl LineCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        // Step back one byte so a CR at the end of the last chunk still pairs
        // with an LF at the start of this one.
        let start = self.next_index.saturating_sub(1).min(src.len());
        match src[start..].windows(2).position(|w| w == TERMINATOR) {
            Some(offset) => {
                let end = start + offset;
                let line = src.split_to(end + TERMINATOR.len());
                self.next_index = 0;
                Ok(Some(String::from_utf8_lossy(&line[..end]).into_owned()))
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None => {
                // Unterminated trailing fragment is dropped at end of stream.
                if !src.is_empty() {
                    tracing::debug!(bytes = src.len(), "Discarding partial line at EOF");
                    src.clear();
                }
                self.next_index = 0;
                Ok(None)
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = io::Error;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<(), io::Error> {
        dst.reserve(line.len() + TERMINATOR.len());
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(TERMINATOR);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(codec: &mut LineCodec, buf: &mut BytesMut, out: &mut Vec<String>) {
        while let Some(line) = codec.decode(buf).unwrap() {
            out.push(line);
        }
    }

    fn frame_chunks(chunks: &[&[u8]]) -> Vec<String> {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();
        let mut lines = Vec::new();
        for chunk in chunks {
            buf.extend_from_slice(chunk);
            drain(&mut codec, &mut buf, &mut lines);
        }
        lines
    }

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :test\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :test".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_keeps_partial_fragment() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :a\r\nPRIVMSG #c");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PING :a".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"PRIVMSG #c");

        buf.extend_from_slice(b"han :hi\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PRIVMSG #chan :hi".to_string())
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_terminator_split_across_chunks() {
        let lines = frame_chunks(&[b"NICK a\r", b"\nNICK b\r\n"]);
        assert_eq!(lines, vec!["NICK a", "NICK b"]);
    }

    #[test]
    fn test_lone_newline_is_not_a_terminator() {
        let lines = frame_chunks(&[b"one\ntwo\r\n"]);
        assert_eq!(lines, vec!["one\ntwo"]);
    }

    #[test]
    fn test_chunking_invariance() {
        let stream: &[u8] =
            b":srv 001 bot :Welcome\r\nPING :abc\r\n\r\n:a!b@c PRIVMSG #x :!cmd a b\r\n:srv 353 bot = #x :@alice +bob carol\r\n";
        let expected = frame_chunks(&[stream]);
        assert_eq!(expected.len(), 5);
        assert_eq!(expected[2], "");

        for size in 1..=stream.len() {
            let chunks: Vec<&[u8]> = stream.chunks(size).collect();
            assert_eq!(frame_chunks(&chunks), expected, "chunk size {}", size);
        }
        for split in 0..=stream.len() {
            let (a, b) = stream.split_at(split);
            assert_eq!(frame_chunks(&[a, b]), expected, "split at {}", split);
        }
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let lines = frame_chunks(&[b"PRIVMSG #x :caf\xff\r\nPING :ok\r\n"]);
        assert_eq!(lines, vec!["PRIVMSG #x :caf\u{FFFD}", "PING :ok"]);
    }

    #[test]
    fn test_decode_eof_drops_fragment() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :x\r\nPART");

        assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some("PING :x".to_string()));
        assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("PONG abc".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG abc\r\n");
    }
}
