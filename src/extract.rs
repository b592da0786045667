//! Payload Extractor
//!
//! Keywords are matched by substring so payloads written by older and newer
//! encoders (`chara`, `IZAKAYA_SOULCORE`, `soulcore-v2`, ...) are all found.

use crate::compress;
use crate::encoding;
use crate::error::{CodecError, Result};
use crate::itxt::TextualMetadataChunk;
use crate::png::{ChunkType, PngImage};

/// Lower-case keyword fragments that mark a soul payload.
pub const RECOGNIZED_KEYWORDS: [&str; 3] = ["izakaya", "soulcore", "chara"];

pub fn matches_keyword(keyword: &str) -> bool {
    let lowered = keyword.to_lowercase();
    RECOGNIZED_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// Text of the first `iTXt` chunk with a recognized keyword.
///
/// `Ok(None)` means the image carries no payload.
pub fn extract(png: &[u8]) -> Result<Option<String>> {
    extract_from(&PngImage::parse(png)?)
}

/// Same as [`extract`], for an image that is already parsed.
pub fn extract_from(image: &PngImage<'_>) -> Result<Option<String>> {
    for chunk in image.chunks_of(ChunkType::iTXt) {
        let metadata = TextualMetadataChunk::decode(&chunk.data)?;
        let raw = metadata.text_bytes()?;
        if !matches_keyword(&metadata.keyword) {
            tracing::debug!(keyword = %metadata.keyword, "skipping unrelated iTXt chunk");
            continue;
        }
        tracing::debug!(keyword = %metadata.keyword, "found payload chunk");
        let text = String::from_utf8(raw.into_owned())
            .map_err(|e| CodecError::CorruptStream(format!("payload is not UTF-8: {}", e)))?;
        return Ok(Some(text));
    }
    Ok(None)
}

/// Every `iTXt` chunk in the image, in order.
pub fn text_chunks(png: &[u8]) -> Result<Vec<TextualMetadataChunk>> {
    let image = PngImage::parse(png)?;
    image
        .chunks_of(ChunkType::iTXt)
        .map(|chunk| TextualMetadataChunk::decode(&chunk.data))
        .collect()
}

/// Undo the QR-asset wrapping (`base64(deflate(json))`) when present.
///
/// JSON text is returned as-is.
pub fn resolve_payload(text: &str) -> Result<String> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(text.to_string());
    }
    let compressed = encoding::decode(text)?;
    compress::inflate(&compressed)
}
