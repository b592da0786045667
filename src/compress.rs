//! Compressor - zlib deflate/inflate for textual chunk payloads.
//!
//! PNG only defines compression method 0 (zlib deflate) for iTXt/zTXt, so
//! that is the only method accepted here.

use miniz_oxide::deflate::compress_to_vec_zlib;
use miniz_oxide::inflate::{decompress_to_vec_zlib_with_limit, TINFLStatus};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

const COMPRESSION_LEVEL: u8 = 6;

/// zlib CM nibble for deflate.
const ZLIB_CM_DEFLATE: u8 = 8;

/// Upper bound on inflated text. Soul documents are a few kilobytes.
pub const MAX_INFLATED_LEN: usize = 64 * 1024 * 1024;

/// Compression method byte carried by a textual metadata chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    #[default]
    Deflate,
}

impl CompressionMethod {
    pub fn as_byte(self) -> u8 {
        match self {
            CompressionMethod::Deflate => 0,
        }
    }
}

impl TryFrom<u8> for CompressionMethod {
    type Error = CodecError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(CompressionMethod::Deflate),
            other => Err(CodecError::UnsupportedCompressionMethod(other)),
        }
    }
}

/// Compress text into a zlib stream.
pub fn deflate(text: &str) -> Vec<u8> {
    deflate_bytes(text.as_bytes())
}

/// Compress raw bytes (image scanlines) into a zlib stream.
pub fn deflate_bytes(bytes: &[u8]) -> Vec<u8> {
    compress_to_vec_zlib(bytes, COMPRESSION_LEVEL)
}

/// Inflate a zlib stream back into UTF-8 text.
pub fn inflate(bytes: &[u8]) -> Result<String> {
    String::from_utf8(inflate_bytes(bytes)?)
        .map_err(|e| CodecError::CorruptStream(format!("inflated text is not UTF-8: {}", e)))
}

/// Inflate a zlib stream, capped at [`MAX_INFLATED_LEN`] bytes of output.
pub fn inflate_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    inflate_bytes_with_limit(bytes, MAX_INFLATED_LEN)
}

/// Inflate a zlib stream, failing once the output would exceed `limit`.
pub fn inflate_bytes_with_limit(bytes: &[u8], limit: usize) -> Result<Vec<u8>> {
    let (cmf, flg) = match bytes {
        [cmf, flg, ..] => (*cmf, *flg),
        _ => return Err(CodecError::CorruptStream("zlib header truncated".into())),
    };
    if cmf & 0x0F != ZLIB_CM_DEFLATE {
        return Err(CodecError::UnsupportedCompressionMethod(cmf & 0x0F));
    }
    if (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
        return Err(CodecError::CorruptStream("zlib header check failed".into()));
    }

    decompress_to_vec_zlib_with_limit(bytes, limit).map_err(|e| match e.status {
        TINFLStatus::HasMoreOutput => {
            CodecError::CorruptStream(format!("inflated text exceeds {} bytes", limit))
        }
        status => CodecError::CorruptStream(format!("inflate failed: {:?}", status)),
    })
}

/// Validate the chunk's declared method byte, then inflate.
pub fn inflate_with(method: u8, bytes: &[u8]) -> Result<String> {
    match CompressionMethod::try_from(method)? {
        CompressionMethod::Deflate => inflate(bytes),
    }
}

/// Like [`inflate_with`], without the UTF-8 conversion.
pub fn inflate_bytes_with(method: u8, bytes: &[u8]) -> Result<Vec<u8>> {
    match CompressionMethod::try_from(method)? {
        CompressionMethod::Deflate => inflate_bytes(bytes),
    }
}
