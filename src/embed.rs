//! Payload Embedder
//!
//! Adds one `iTXt` chunk in front of `IEND`. Every other chunk is copied
//! through unchanged, in order.

use crate::error::Result;
use crate::itxt::TextualMetadataChunk;
use crate::png::{ChunkType, PngImage};

/// Embed `text` uncompressed under `keyword`.
pub fn embed(png: &[u8], keyword: &str, text: &str) -> Result<Vec<u8>> {
    embed_chunk(png, &TextualMetadataChunk::new(keyword, text)?)
}

/// Embed `text` as a zlib stream with the compression flag set.
pub fn embed_compressed(png: &[u8], keyword: &str, text: &str) -> Result<Vec<u8>> {
    embed_chunk(png, &TextualMetadataChunk::new_compressed(keyword, text)?)
}

/// Insert a prepared textual chunk before `IEND` and re-serialize.
pub fn embed_chunk(png: &[u8], metadata: &TextualMetadataChunk) -> Result<Vec<u8>> {
    let image = PngImage::parse(png)?;
    let image = image.insert_before(ChunkType::IEND, metadata.to_chunk())?;
    tracing::debug!(
        keyword = %metadata.keyword,
        compressed = metadata.compressed,
        text_bytes = metadata.text.len(),
        "embedded iTXt chunk"
    );
    image.serialize()
}
