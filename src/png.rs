//! PNG Chunk Model
//!
//! Splits a PNG byte stream into its ordered chunks and writes chunks back
//! out. Pixel data is never decoded; chunks are carried as opaque bytes.

use std::borrow::Cow;
use std::fmt;

use crate::crc32::Crc32;
use crate::error::{CodecError, Result};

/// The fixed 8-byte PNG magic number.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Length + type + CRC framing around each chunk's data.
const CHUNK_OVERHEAD: usize = 12;

/// Largest data length a chunk header may declare (2^31 - 1).
pub const MAX_CHUNK_LEN: usize = 0x7FFF_FFFF;

/// A 4-byte ASCII chunk tag.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

#[allow(non_upper_case_globals)]
impl ChunkType {
    pub const IHDR: Self = Self(*b"IHDR");
    pub const IDAT: Self = Self(*b"IDAT");
    pub const IEND: Self = Self(*b"IEND");
    pub const iTXt: Self = Self(*b"iTXt");
    pub const tEXt: Self = Self(*b"tEXt");
    pub const zTXt: Self = Self(*b"zTXt");

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkType({})", self)
    }
}

/// One chunk. Parsed chunks borrow the input buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct PngChunk<'a> {
    pub chunk_type: ChunkType,
    pub data: Cow<'a, [u8]>,
}

impl<'a> PngChunk<'a> {
    pub fn new(chunk_type: ChunkType, data: impl Into<Cow<'a, [u8]>>) -> Self {
        Self {
            chunk_type,
            data: data.into(),
        }
    }

    /// Data length as written in the chunk header. Always derived from `data`.
    pub fn length(&self) -> usize {
        self.data.len()
    }

    /// CRC over `type ‖ data`.
    pub fn crc(&self) -> u32 {
        let mut hasher = Crc32::new();
        hasher.update(self.chunk_type.as_bytes());
        hasher.update(&self.data);
        hasher.finalize()
    }

    /// Append the framed chunk to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        let length = checked_length(self.chunk_type, self.length())?;
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(self.chunk_type.as_bytes());
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.crc().to_be_bytes());
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(CHUNK_OVERHEAD + self.length());
        self.write_to(&mut out)?;
        Ok(out)
    }
}

impl fmt::Debug for PngChunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PngChunk")
            .field("chunk_type", &self.chunk_type)
            .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
            .finish()
    }
}

/// An ordered chunk sequence. Always ends with `IEND` when parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngImage<'a> {
    chunks: Vec<PngChunk<'a>>,
}

impl<'a> PngImage<'a> {
    /// Build an image from chunks the caller already has in order.
    pub fn from_chunks(chunks: Vec<PngChunk<'a>>) -> Self {
        Self { chunks }
    }

    /// Parse a PNG byte stream up to and including `IEND`.
    ///
    /// Chunk CRCs are not checked; see [`PngImage::parse_verified`].
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        Ok(Self {
            chunks: parse_chunks(bytes)?.into_iter().map(|(chunk, _)| chunk).collect(),
        })
    }

    /// Parse and also check every chunk's declared CRC.
    pub fn parse_verified(bytes: &'a [u8]) -> Result<Self> {
        let mut chunks = Vec::new();
        for (chunk, declared) in parse_chunks(bytes)? {
            let computed = chunk.crc();
            if computed != declared {
                return Err(CodecError::CrcMismatch {
                    chunk: chunk.chunk_type.to_string(),
                    declared,
                    computed,
                });
            }
            chunks.push(chunk);
        }
        Ok(Self { chunks })
    }

    /// Signature followed by every chunk, CRCs recomputed.
    ///
    /// Fails with [`CodecError::ChunkTooLarge`] rather than writing a length
    /// field that disagrees with the data.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let size = PNG_SIGNATURE.len()
            + self.chunks.iter().map(|c| CHUNK_OVERHEAD + c.length()).sum::<usize>();
        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&PNG_SIGNATURE);
        for chunk in &self.chunks {
            chunk.write_to(&mut out)?;
        }
        Ok(out)
    }

    /// Splice `chunk` in front of the first chunk of type `target`.
    pub fn insert_before(mut self, target: ChunkType, chunk: PngChunk<'a>) -> Result<Self> {
        let index = self
            .chunks
            .iter()
            .position(|c| c.chunk_type == target)
            .ok_or_else(|| CodecError::TargetChunkNotFound(target.to_string()))?;
        self.chunks.insert(index, chunk);
        Ok(self)
    }

    pub fn chunks(&self) -> &[PngChunk<'a>] {
        &self.chunks
    }

    pub fn chunks_of(&self, chunk_type: ChunkType) -> impl Iterator<Item = &PngChunk<'a>> {
        self.chunks.iter().filter(move |c| c.chunk_type == chunk_type)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Walk the chunk stream, returning each chunk with its declared CRC.
fn parse_chunks(bytes: &[u8]) -> Result<Vec<(PngChunk<'_>, u32)>> {
    let mut rest = match bytes.strip_prefix(&PNG_SIGNATURE[..]) {
        Some(rest) => rest,
        None => return Err(CodecError::InvalidSignature),
    };

    let mut chunks = Vec::new();
    loop {
        let (length, tail) = take_u32(rest).ok_or(CodecError::MissingTerminalChunk)?;
        let (type_bytes, tail) = take(tail, 4).ok_or(CodecError::MissingTerminalChunk)?;
        let (data, tail) = take(tail, length as usize).ok_or(CodecError::MissingTerminalChunk)?;
        let (declared_crc, tail) = take_u32(tail).ok_or(CodecError::MissingTerminalChunk)?;
        rest = tail;

        let mut tag = [0u8; 4];
        tag.copy_from_slice(type_bytes);
        let chunk_type = ChunkType(tag);
        chunks.push((PngChunk::new(chunk_type, data), declared_crc));

        if chunk_type == ChunkType::IEND {
            tracing::debug!(chunks = chunks.len(), trailing = rest.len(), "parsed PNG");
            return Ok(chunks);
        }
    }
}

fn take(bytes: &[u8], n: usize) -> Option<(&[u8], &[u8])> {
    if bytes.len() >= n {
        Some(bytes.split_at(n))
    } else {
        None
    }
}

fn take_u32(bytes: &[u8]) -> Option<(u32, &[u8])> {
    let (head, rest) = take(bytes, 4)?;
    let mut buf = [0u8; 4];
    buf.copy_from_slice(head);
    Some((u32::from_be_bytes(buf), rest))
}

fn checked_length(chunk_type: ChunkType, len: usize) -> Result<u32> {
    if len > MAX_CHUNK_LEN {
        return Err(CodecError::ChunkTooLarge {
            chunk: chunk_type.to_string(),
            len,
        });
    }
    // MAX_CHUNK_LEN fits in a u32.
    Ok(len as u32)
}
