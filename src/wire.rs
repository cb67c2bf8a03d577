//! Wire framing for the GELF stream protocol.
//!
//! A collector splits the byte stream on NUL bytes, so every serialized
//! record travels as `payload ++ 0x00` with exactly one terminator. Record
//! serialization itself lives outside this crate behind [`WireRecord`].

use std::io;

/// Byte separating consecutive frames on the stream.
pub const FRAME_TERMINATOR: u8 = 0;

/// Serialization collaborator for records shipped through the writer.
///
/// Implementations produce the deterministic wire encoding of one log record
/// (for GELF, a JSON document). The payload must not contain a NUL byte; the
/// collector would split it into two broken frames.
pub trait WireRecord {
    /// Serialize the record into its wire payload, without the terminator.
    fn to_wire(&self) -> io::Result<Vec<u8>>;
}

impl WireRecord for Vec<u8> {
    fn to_wire(&self) -> io::Result<Vec<u8>> {
        Ok(self.clone())
    }
}

/// Append the frame terminator to `payload`.
///
/// Returns `None` when the payload already contains a NUL byte, which would
/// corrupt frame splitting at the collector.
pub fn frame_payload(payload: &[u8]) -> Option<Vec<u8>> {
    if payload.contains(&FRAME_TERMINATOR) {
        return None;
    }
    let mut framed = Vec::with_capacity(payload.len() + 1);
    framed.extend_from_slice(payload);
    framed.push(FRAME_TERMINATOR);
    Some(framed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_single_terminator() {
        let framed = frame_payload(b"{\"version\":\"1.1\"}").expect("payload frames");
        assert_eq!(framed.last(), Some(&FRAME_TERMINATOR));
        assert_eq!(&framed[..framed.len() - 1], b"{\"version\":\"1.1\"}");
        assert_eq!(
            framed.iter().filter(|&&b| b == FRAME_TERMINATOR).count(),
            1
        );
    }

    #[test]
    fn rejects_embedded_nul() {
        assert!(frame_payload(b"abc\0def").is_none());
    }

    #[test]
    fn frames_empty_payload() {
        assert_eq!(frame_payload(b""), Some(vec![FRAME_TERMINATOR]));
    }
}
