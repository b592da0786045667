//! SoulCore Codec - steganographic payload transport for character cards
//!
//! # Transports
//! 1. PNG: the soul document rides in an `iTXt` chunk spliced before `IEND`
//! 2. Reincarnation code: `IZ-REIN-V25:` + base64 JSON, no image needed
//! 3. QR asset: a QR code PNG that also carries the payload as metadata
//!
//! All codec functions are pure transforms over in-memory buffers.

pub mod error;
pub mod crc32;
pub mod encoding;
pub mod compress;
pub mod png;
pub mod itxt;
pub mod embed;
pub mod extract;
pub mod reincarnation;
pub mod qr;
pub mod id;
pub mod soulcore;
pub mod batch;

pub use error::{CodecError, Result};
pub use crc32::crc32;
pub use compress::{deflate, inflate, CompressionMethod};
pub use png::{ChunkType, PngChunk, PngImage, PNG_SIGNATURE};
pub use itxt::TextualMetadataChunk;
pub use embed::{embed, embed_compressed};
pub use extract::{extract, resolve_payload, RECOGNIZED_KEYWORDS};
pub use reincarnation::{ReincarnatedCard, ReincarnationCode, ReincarnationError, REINCARNATION_PREFIX};
pub use qr::{QrAssets, QrOptions};
pub use id::{generate_id, IdGenerator};
pub use soulcore::{SoulCore, SoulCorePackage};
pub use batch::{run_batch, BatchConfig, BatchReport};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
