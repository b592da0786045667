//! Error taxonomy for the payload codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid PNG signature")]
    InvalidSignature,

    #[error("PNG stream ended before the IEND chunk")]
    MissingTerminalChunk,

    #[error("Target chunk not found: {0}")]
    TargetChunkNotFound(String),

    #[error("Unsupported compression method: {0}")]
    UnsupportedCompressionMethod(u8),

    #[error("Corrupt stream: {0}")]
    CorruptStream(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("CRC mismatch in {chunk} chunk: declared {declared:#010x}, computed {computed:#010x}")]
    CrcMismatch {
        chunk: String,
        declared: u32,
        computed: u32,
    },

    #[error("{chunk} chunk data is {len} bytes, over the 2^31 - 1 limit")]
    ChunkTooLarge { chunk: String, len: usize },

    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),

    #[error("QR encoding error: {0}")]
    QrEncoding(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
