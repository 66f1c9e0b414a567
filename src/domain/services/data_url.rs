//! `data:` URL encoding
//!
//! The relay returns fetched images as base64 data URLs; the scan context
//! turns them back into bytes.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Decoded contents of a data URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Builds `data:<media_type>;base64,<payload>`
pub fn encode(media_type: &str, bytes: &[u8]) -> String {
    format!("{SCHEME}{media_type}{BASE64_MARKER},{}", STANDARD.encode(bytes))
}

/// Parses a base64 data URL, `None` for anything else
pub fn decode(url: &str) -> Option<DataUrl> {
    let rest = url.strip_prefix(SCHEME)?;
    let (header, payload) = rest.split_once(',')?;
    let media_type = header.strip_suffix(BASE64_MARKER)?;
    let bytes = STANDARD.decode(payload.trim()).ok()?;

    Some(DataUrl {
        media_type: media_type.to_string(),
        bytes,
    })
}
