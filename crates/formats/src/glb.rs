//! Binary glTF (GLB) container.
//!
//! Layout: a 12-byte header (`magic`, `version`, `length`, all u32 LE)
//! followed by chunks of `length`, `type`, payload. The first chunk must be
//! JSON; an optional BIN chunk follows. Chunk payloads are 4-byte aligned.

use crate::model::AssetDecodeError;

pub const GLB_MAGIC: u32 = 0x4654_6C67; // "glTF"
pub const GLB_VERSION: u32 = 2;
pub const CHUNK_JSON: u32 = 0x4E4F_534A; // "JSON"
pub const CHUNK_BIN: u32 = 0x004E_4942; // "BIN\0"

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq)]
pub struct GlbContainer<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

pub fn is_glb(bytes: &[u8]) -> bool {
    read_u32(bytes, 0) == Some(GLB_MAGIC)
}

pub fn parse_glb(bytes: &[u8]) -> Result<GlbContainer<'_>, AssetDecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(AssetDecodeError::Truncated {
            needed: HEADER_LEN,
            available: bytes.len(),
        });
    }
    let magic = read_u32(bytes, 0).unwrap_or_default();
    if magic != GLB_MAGIC {
        return Err(AssetDecodeError::BadMagic(magic));
    }
    let version = read_u32(bytes, 4).unwrap_or_default();
    if version != GLB_VERSION {
        return Err(AssetDecodeError::UnsupportedVersion(version.to_string()));
    }
    let declared = read_u32(bytes, 8).unwrap_or_default() as usize;
    if declared > bytes.len() {
        return Err(AssetDecodeError::Truncated {
            needed: declared,
            available: bytes.len(),
        });
    }
    let body = &bytes[..declared];

    let (json_type, json, next) = read_chunk(body, HEADER_LEN)?;
    if json_type != CHUNK_JSON {
        return Err(AssetDecodeError::MissingJsonChunk);
    }

    let bin = if next + CHUNK_HEADER_LEN <= body.len() {
        let (ty, payload, _) = read_chunk(body, next)?;
        (ty == CHUNK_BIN).then_some(payload)
    } else {
        None
    };

    Ok(GlbContainer { json, bin })
}

fn read_chunk(body: &[u8], offset: usize) -> Result<(u32, &[u8], usize), AssetDecodeError> {
    let header_end = offset + CHUNK_HEADER_LEN;
    let (Some(len), Some(ty)) = (read_u32(body, offset), read_u32(body, offset + 4)) else {
        return Err(AssetDecodeError::Truncated {
            needed: header_end,
            available: body.len(),
        });
    };
    let end = header_end + len as usize;
    if end > body.len() {
        return Err(AssetDecodeError::Truncated {
            needed: end,
            available: body.len(),
        });
    }
    Ok((ty, &body[header_end..end], end))
}

fn read_u32(bytes: &[u8], offset: usize) -> Option<u32> {
    let raw = bytes.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Wraps a JSON document (and optional binary buffer) in a GLB container.
pub fn encode_glb(json: &[u8], bin: Option<&[u8]>) -> Vec<u8> {
    fn padded(len: usize) -> usize {
        len.div_ceil(4) * 4
    }

    let json_len = padded(json.len());
    let bin_len = bin.map(|b| padded(b.len()));
    let total = HEADER_LEN
        + CHUNK_HEADER_LEN
        + json_len
        + bin_len.map(|l| CHUNK_HEADER_LEN + l).unwrap_or(0);

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());

    out.extend_from_slice(&(json_len as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(json);
    out.resize(out.len() + json_len - json.len(), b' ');

    if let (Some(bin), Some(bin_len)) = (bin, bin_len) {
        out.extend_from_slice(&(bin_len as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(bin);
        out.resize(out.len() + bin_len - bin.len(), 0);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{encode_glb, is_glb, parse_glb};
    use crate::model::AssetDecodeError;

    #[test]
    fn parses_json_and_bin_chunks() {
        let bytes = encode_glb(br#"{"asset":{"version":"2.0"}}"#, Some(&[1, 2, 3]));
        assert!(is_glb(&bytes));
        assert_eq!(bytes.len() % 4, 0);

        let glb = parse_glb(&bytes).expect("parse glb");
        let json = std::str::from_utf8(glb.json).unwrap();
        assert_eq!(json.trim_end(), r#"{"asset":{"version":"2.0"}}"#);
        assert_eq!(glb.bin, Some(&[1u8, 2, 3, 0][..]));
    }

    #[test]
    fn rejects_wrong_version() {
        let mut bytes = encode_glb(b"{}", None);
        bytes[4] = 1;
        assert!(matches!(
            parse_glb(&bytes),
            Err(AssetDecodeError::UnsupportedVersion(v)) if v == "1"
        ));
    }

    #[test]
    fn rejects_truncated_payload() {
        let bytes = encode_glb(br#"{"asset":{"version":"2.0"}}"#, None);
        let cut = &bytes[..bytes.len() - 4];
        assert!(matches!(parse_glb(cut), Err(AssetDecodeError::Truncated { .. })));
        assert!(matches!(parse_glb(b"glTF"), Err(AssetDecodeError::Truncated { .. })));
    }

    #[test]
    fn rejects_non_glb_bytes() {
        assert!(!is_glb(b"{\"asset\":{}}"));
        assert!(matches!(
            parse_glb(b"not a glb at all"),
            Err(AssetDecodeError::BadMagic(_))
        ));
    }
}
