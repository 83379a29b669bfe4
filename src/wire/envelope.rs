//! The frame envelope and its two wire framings.
//!
//! Binary framing (preferred):
//! `[tokenLen:u8][token][sessionIdLen:u8][sessionId][frameSeq:u64 BE]`
//! `[width:i32 BE][height:i32 BE][formatLen:u8][format][imageBytes:rest]`.
//!
//! JSON framing (legacy, detected by a leading `{` byte) is still accepted
//! because older clients emit it; it MUST NOT be removed.

#![expect(
    clippy::big_endian_bytes,
    reason = "binary frame envelope is explicitly big-endian on the wire"
)]

use base64::Engine as _;
use serde::Deserialize;

use super::errors::WireError;

const JSON_SNIFF_BYTE: u8 = b'{';

/// A single in-flight unit of work decoded from either wire framing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Opaque bearer token, at most 255 bytes.
    pub token: String,
    /// Client-chosen session identifier, stable per streaming session.
    pub session_id: String,
    /// Monotonic frame sequence number, echoed back in the response.
    pub frame_seq: u64,
    /// Image width in pixels.
    pub width: i32,
    /// Image height in pixels.
    pub height: i32,
    /// Short format tag (`"jpeg"`, `"rgba"`, `"grayscale"`, ...).
    pub format: String,
    /// Opaque image payload.
    pub image_bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct JsonEnvelope {
    token: String,
    id: String,
    #[serde(rename = "frameSeq", default)]
    frame_seq: u64,
    width: i32,
    height: i32,
    format: String,
    data: String,
}

/// Decode a frame envelope from either wire framing.
///
/// Detects JSON framing by a leading `{` byte (0x7B); otherwise parses the
/// binary framing.
///
/// # Errors
///
/// Returns [`WireError`] if the buffer is empty, truncated, or malformed.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, WireError> {
    match bytes.first() {
        None => Err(WireError::Empty),
        Some(&JSON_SNIFF_BYTE) => decode_json(bytes),
        Some(_) => decode_binary(bytes),
    }
}

fn decode_json(bytes: &[u8]) -> Result<Envelope, WireError> {
    let parsed: JsonEnvelope = serde_json::from_slice(bytes).map_err(|_| WireError::InvalidJson)?;
    let image_bytes = base64::engine::general_purpose::STANDARD
        .decode(parsed.data)
        .map_err(|_| WireError::InvalidBase64)?;
    Ok(Envelope {
        token: parsed.token,
        session_id: parsed.id,
        frame_seq: parsed.frame_seq,
        width: parsed.width,
        height: parsed.height,
        format: parsed.format,
        image_bytes,
    })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    const fn new(bytes: &'a [u8]) -> Self { Self { bytes, pos: 0 } }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let end = self.pos.checked_add(len).ok_or(WireError::Malformed)?;
        let slice = self.bytes.get(self.pos..end).ok_or(WireError::Malformed)?;
        self.pos = end;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, WireError> {
        let slice = self.take(1)?;
        let [byte] = slice else {
            return Err(WireError::Malformed);
        };
        Ok(*byte)
    }

    fn take_u16_be(&mut self) -> Result<u16, WireError> {
        let slice = self.take(2)?;
        let array: [u8; 2] = slice.try_into().map_err(|_| WireError::Malformed)?;
        Ok(u16::from_be_bytes(array))
    }

    fn take_u64_be(&mut self) -> Result<u64, WireError> {
        let slice = self.take(8)?;
        let array: [u8; 8] = slice.try_into().map_err(|_| WireError::Malformed)?;
        Ok(u64::from_be_bytes(array))
    }

    fn take_i32_be(&mut self) -> Result<i32, WireError> {
        let slice = self.take(4)?;
        let array: [u8; 4] = slice.try_into().map_err(|_| WireError::Malformed)?;
        Ok(i32::from_be_bytes(array))
    }

    fn take_string(&mut self, len: usize) -> Result<String, WireError> {
        let slice = self.take(len)?;
        String::from_utf8(slice.to_vec()).map_err(|_| WireError::Malformed)
    }

    fn remaining(&self) -> &'a [u8] {
        self.bytes.get(self.pos..).unwrap_or_default()
    }
}

fn decode_binary(bytes: &[u8]) -> Result<Envelope, WireError> {
    let mut cursor = Cursor::new(bytes);

    let token_len = cursor.take_u8()?;
    let token = cursor.take_string(usize::from(token_len))?;

    let session_len = cursor.take_u8()?;
    let session_id = cursor.take_string(usize::from(session_len))?;

    let frame_seq = cursor.take_u64_be()?;
    let width = cursor.take_i32_be()?;
    let height = cursor.take_i32_be()?;

    let format_len = cursor.take_u8()?;
    let format = cursor.take_string(usize::from(format_len))?;

    let image_bytes = cursor.remaining().to_vec();

    Ok(Envelope {
        token,
        session_id,
        frame_seq,
        width,
        height,
        format,
        image_bytes,
    })
}

/// Encode an envelope using the binary framing.
///
/// This is the inverse of [`decode_envelope`] for binary input: for every
/// envelope produced by [`decode_binary`], `encode_binary` reproduces the
/// original bytes.
///
/// # Panics
///
/// Panics if `token`, `session_id`, or `format` exceed 255 bytes, or if the
/// resulting frame would overflow a `u8`/`i32` length field. Callers are
/// expected to validate these bounds before encoding (see
/// [`Envelope`] field documentation).
#[must_use]
pub fn encode_binary(envelope: &Envelope) -> Vec<u8> {
    let mut out = Vec::with_capacity(
        2 + envelope.token.len() + envelope.session_id.len() + envelope.format.len() + 16,
    );

    #[expect(
        clippy::cast_possible_truncation,
        reason = "caller-validated: token.len() <= 255"
    )]
    out.push(envelope.token.len() as u8);
    out.extend_from_slice(envelope.token.as_bytes());

    #[expect(
        clippy::cast_possible_truncation,
        reason = "caller-validated: session_id.len() <= 255"
    )]
    out.push(envelope.session_id.len() as u8);
    out.extend_from_slice(envelope.session_id.as_bytes());

    out.extend_from_slice(&envelope.frame_seq.to_be_bytes());
    out.extend_from_slice(&envelope.width.to_be_bytes());
    out.extend_from_slice(&envelope.height.to_be_bytes());

    #[expect(
        clippy::cast_possible_truncation,
        reason = "caller-validated: format.len() <= 255"
    )]
    out.push(envelope.format.len() as u8);
    out.extend_from_slice(envelope.format.as_bytes());

    out.extend_from_slice(&envelope.image_bytes);
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn sample() -> Envelope {
        Envelope {
            token: "tok".to_owned(),
            session_id: "s1".to_owned(),
            frame_seq: 42,
            width: 640,
            height: 360,
            format: "jpeg".to_owned(),
            image_bytes: vec![1, 2, 3, 4],
        }
    }

    #[rstest]
    fn binary_round_trip_is_identity() {
        let envelope = sample();
        let bytes = encode_binary(&envelope);
        let decoded = decode_envelope(&bytes).expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[rstest]
    fn binary_empty_image_round_trips() {
        let mut envelope = sample();
        envelope.image_bytes.clear();
        let bytes = encode_binary(&envelope);
        let decoded = decode_envelope(&bytes).expect("decode");
        assert_eq!(decoded, envelope);
    }

    #[rstest]
    fn rejects_truncated_token_length() {
        let bytes = [5u8, b'a', b'b']; // declares 5 bytes, only 2 present
        let err = decode_envelope(&bytes).expect_err("must fail");
        assert_eq!(err, WireError::Malformed);
    }

    #[rstest]
    fn rejects_empty_buffer() {
        let err = decode_envelope(&[]).expect_err("must fail");
        assert_eq!(err, WireError::Empty);
    }

    #[rstest]
    fn decodes_json_framing() {
        let payload = base64::engine::general_purpose::STANDARD.encode([9u8, 8, 7]);
        let json = format!(
            "{{\"token\":\"tok\",\"id\":\"s1\",\"frameSeq\":7,\"width\":10,\"height\":20,\"format\":\"rgba\",\"data\":\"{payload}\"}}"
        );
        let decoded = decode_envelope(json.as_bytes()).expect("decode");
        assert_eq!(decoded.token, "tok");
        assert_eq!(decoded.frame_seq, 7);
        assert_eq!(decoded.image_bytes, vec![9, 8, 7]);
    }

    #[rstest]
    fn rejects_invalid_json() {
        let err = decode_envelope(b"{not json").expect_err("must fail");
        assert_eq!(err, WireError::InvalidJson);
    }
}
