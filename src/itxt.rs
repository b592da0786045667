//! International textual metadata (`iTXt`) chunk layout.
//!
//! ```text
//! keyword | 0x00 | compression flag | compression method
//!         | language tag | 0x00 | translated keyword | 0x00 | text
//! ```

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::compress::{self, CompressionMethod};
use crate::error::{CodecError, Result};
use crate::png::{ChunkType, PngChunk};

/// PNG limits keywords to 1-79 bytes.
pub const MAX_KEYWORD_LEN: usize = 79;

/// Logical view of an `iTXt` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextualMetadataChunk {
    pub keyword: String,
    pub compressed: bool,
    pub method: CompressionMethod,
    pub language_tag: String,
    pub translated_keyword: String,
    /// Raw text field; deflated when `compressed` is set.
    pub text: Vec<u8>,
}

impl TextualMetadataChunk {
    /// Uncompressed chunk with empty language and translated keyword.
    pub fn new(keyword: &str, text: &str) -> Result<Self> {
        validate_keyword(keyword)?;
        Ok(Self {
            keyword: keyword.to_string(),
            compressed: false,
            method: CompressionMethod::Deflate,
            language_tag: String::new(),
            translated_keyword: String::new(),
            text: text.as_bytes().to_vec(),
        })
    }

    /// Chunk whose text is stored as a zlib stream.
    pub fn new_compressed(keyword: &str, text: &str) -> Result<Self> {
        validate_keyword(keyword)?;
        Ok(Self {
            keyword: keyword.to_string(),
            compressed: true,
            method: CompressionMethod::Deflate,
            language_tag: String::new(),
            translated_keyword: String::new(),
            text: compress::deflate(text),
        })
    }

    /// Byte-exact chunk data.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.keyword.len()
                + self.language_tag.len()
                + self.translated_keyword.len()
                + self.text.len()
                + 5,
        );
        out.extend_from_slice(self.keyword.as_bytes());
        out.push(0);
        out.push(u8::from(self.compressed));
        out.push(self.method.as_byte());
        out.extend_from_slice(self.language_tag.as_bytes());
        out.push(0);
        out.extend_from_slice(self.translated_keyword.as_bytes());
        out.push(0);
        out.extend_from_slice(&self.text);
        out
    }

    pub fn to_chunk(&self) -> PngChunk<'static> {
        PngChunk::new(ChunkType::iTXt, self.encode())
    }

    /// Split chunk data into its fields.
    ///
    /// The method byte is only validated when the compression flag is set,
    /// matching what encoders in the wild emit for uncompressed text.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let keyword = latin1(cursor.take_until_nul("keyword")?);
        let compressed = cursor.take_byte("compression flag")? != 0;
        let method_byte = cursor.take_byte("compression method")?;
        let method = if compressed {
            CompressionMethod::try_from(method_byte)?
        } else {
            CompressionMethod::Deflate
        };
        let language_tag = latin1(cursor.take_until_nul("language tag")?);
        let translated_keyword =
            String::from_utf8_lossy(cursor.take_until_nul("translated keyword")?).into_owned();
        let text = cursor.rest().to_vec();

        Ok(Self {
            keyword,
            compressed,
            method,
            language_tag,
            translated_keyword,
            text,
        })
    }

    /// The text field as UTF-8, inflated if needed.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.text_bytes()?.into_owned())
            .map_err(|e| CodecError::CorruptStream(format!("text is not UTF-8: {}", e)))
    }

    /// The text field inflated if needed, with no encoding check.
    pub fn text_bytes(&self) -> Result<Cow<'_, [u8]>> {
        if self.compressed {
            compress::inflate_bytes_with(self.method.as_byte(), &self.text).map(Cow::Owned)
        } else {
            Ok(Cow::Borrowed(&self.text[..]))
        }
    }
}

/// Keywords are 1-79 printable ASCII bytes; a NUL would break the layout.
pub fn validate_keyword(keyword: &str) -> Result<()> {
    if keyword.is_empty() || keyword.len() > MAX_KEYWORD_LEN {
        return Err(CodecError::InvalidKeyword(format!(
            "length {} outside 1..={}",
            keyword.len(),
            MAX_KEYWORD_LEN
        )));
    }
    if let Some(c) = keyword.chars().find(|&c| !(' '..='~').contains(&c)) {
        return Err(CodecError::InvalidKeyword(format!(
            "character {:?} not allowed",
            c
        )));
    }
    Ok(())
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

/// Bounds-checked reader over chunk data.
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Bytes up to the next NUL; the NUL is consumed.
    pub fn take_until_nul(&mut self, field: &str) -> Result<&'a [u8]> {
        let bytes: &'a [u8] = self.bytes;
        let remaining = &bytes[self.pos..];
        let end = remaining.iter().position(|&b| b == 0).ok_or_else(|| {
            CodecError::CorruptStream(format!("missing NUL after {}", field))
        })?;
        self.pos += end + 1;
        Ok(&remaining[..end])
    }

    pub fn take_byte(&mut self, field: &str) -> Result<u8> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| CodecError::CorruptStream(format!("missing {}", field)))?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn rest(&mut self) -> &'a [u8] {
        let bytes: &'a [u8] = self.bytes;
        let rest = &bytes[self.pos..];
        self.pos = bytes.len();
        rest
    }
}
