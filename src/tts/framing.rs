//! Length-prefixed chunk framing for streamed audio.
//!
//! ```text
//! [u32 LE len][len bytes WAV] [u32 LE len][len bytes WAV] … [u32 LE 0]
//! ```
//!
//! A zero length terminates the stream.

/// Terminator frame.
pub const END_MARKER: [u8; 4] = 0u32.to_le_bytes();

/// Frame one payload.  Empty payloads are never framed (they would read as
/// the terminator), callers skip them.
pub fn encode_chunk(payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(payload.len() + 4);
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// The terminator as an owned frame.
pub fn end_marker() -> Vec<u8> {
    END_MARKER.to_vec()
}

/// Payload of a single frame, `None` for the terminator or a malformed frame.
pub fn frame_payload(frame: &[u8]) -> Option<&[u8]> {
    let (len, payload) = split_len(frame)?;
    (len > 0 && payload.len() == len).then_some(payload)
}

/// Decode a complete stream into its payloads.
///
/// Returns `None` when the stream is truncated or the terminator is missing.
pub fn decode_stream(mut bytes: &[u8]) -> Option<Vec<Vec<u8>>> {
    let mut payloads = Vec::new();
    loop {
        let (len, rest) = split_len(bytes)?;
        if len == 0 {
            return rest.is_empty().then_some(payloads);
        }
        if rest.len() < len {
            return None;
        }
        payloads.push(rest[..len].to_vec());
        bytes = &rest[len..];
    }
}

fn split_len(bytes: &[u8]) -> Option<(usize, &[u8])> {
    if bytes.len() < 4 {
        return None;
    }
    let (head, rest) = bytes.split_at(4);
    let len = u32::from_le_bytes([head[0], head[1], head[2], head[3]]) as usize;
    Some((len, rest))
}
