//! Byte/Base64 codec - one portable path for every caller.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{CodecError, Result};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Encode bytes with the standard RFC 4648 alphabet, padded, no wrapping.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a standard base64 string. Surrounding whitespace is ignored.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| CodecError::Decode(e.to_string()))
}

/// Wrap PNG bytes as a `data:` URL.
pub fn to_data_url(png: &[u8]) -> String {
    format!("{}{}", PNG_DATA_URL_PREFIX, encode(png))
}

/// Accept either a `data:...;base64,` URL or a bare base64 string.
pub fn from_data_url(url: &str) -> Result<Vec<u8>> {
    let trimmed = url.trim();
    let payload = match trimmed.strip_prefix("data:") {
        Some(rest) => match rest.split_once(',') {
            Some((header, body)) if header.ends_with(";base64") => body,
            _ => return Err(CodecError::Decode("data URL is not base64 encoded".into())),
        },
        None => trimmed,
    };
    decode(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_with_nul_bytes() {
        let data = [0u8, 1, 0, 255, 0, 0];
        let encoded = encode(&data);
        assert_eq!(decode(&encoded).unwrap(), data);
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(encode(b"foobar"), "Zm9vYmFy");
        assert_eq!(encode(b"fo"), "Zm8=");
    }

    #[test]
    fn test_rejects_bad_alphabet() {
        assert!(matches!(decode("Zm9v*mFy"), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_rejects_url_safe_alphabet() {
        assert!(matches!(decode("-_-_"), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_rejects_bad_padding() {
        assert!(matches!(decode("Zm9vY"), Err(CodecError::Decode(_))));
    }

    #[test]
    fn test_data_url() {
        let url = to_data_url(b"\x89PNG");
        assert!(url.starts_with("data:image/png;base64,"));
        assert_eq!(from_data_url(&url).unwrap(), b"\x89PNG");
        assert_eq!(from_data_url("iVBORw==").unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_data_url_without_base64_marker() {
        assert!(from_data_url("data:text/plain,hello").is_err());
    }
}
