//! QR Asset Generator
//!
//! Renders a payload as a QR code PNG, then embeds the same payload
//! (deflated and base64 wrapped) in that PNG under the `chara` keyword, so one
//! image is both scannable and a metadata carrier.

use qrcode::{Color, EcLevel, QrCode};
use serde::{Deserialize, Serialize};

use crate::compress;
use crate::embed;
use crate::encoding;
use crate::error::{CodecError, Result};
use crate::png::{ChunkType, PngChunk, PngImage};

/// Keyword the QR carrier uses for its embedded payload.
pub const QR_KEYWORD: &str = "chara";

const LIGHT: u8 = 0xFF;
const DARK: u8 = 0x00;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrOptions {
    #[serde(default)]
    pub ec_level: ErrorCorrection,
    /// Quiet zone, in modules.
    #[serde(default = "default_margin")]
    pub margin: u32,
    /// Output width (and height) in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
}

fn default_margin() -> u32 { 1 }
fn default_width() -> u32 { 512 }

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            ec_level: ErrorCorrection::M,
            margin: default_margin(),
            width: default_width(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct QrAssets {
    /// Plain QR code PNG.
    pub raw_image: Vec<u8>,
    /// The same PNG with the payload embedded as metadata.
    pub embedded_image: Vec<u8>,
    pub size_kb: f64,
}

impl QrAssets {
    pub fn raw_data_url(&self) -> String {
        encoding::to_data_url(&self.raw_image)
    }

    pub fn embedded_data_url(&self) -> String {
        encoding::to_data_url(&self.embedded_image)
    }
}

pub fn generate(payload: &str) -> Result<QrAssets> {
    generate_with(payload, &QrOptions::default())
}

pub fn generate_with(payload: &str, options: &QrOptions) -> Result<QrAssets> {
    let raw_image = render_png(payload, options)?;
    let wrapped = encoding::encode(&compress::deflate(payload));
    let embedded_image = embed::embed(&raw_image, QR_KEYWORD, &wrapped)?;

    tracing::debug!(
        payload_len = payload.len(),
        raw_bytes = raw_image.len(),
        embedded_bytes = embedded_image.len(),
        "generated QR assets"
    );

    Ok(QrAssets {
        raw_image,
        embedded_image,
        size_kb: size_kb(payload),
    })
}

/// Payload size in KiB, counted in UTF-16 code units, rounded to 2 places.
pub fn size_kb(payload: &str) -> f64 {
    let units = payload.encode_utf16().count() as f64;
    (units / 1024.0 * 100.0).round() / 100.0
}

/// Render the QR symbol as an 8-bit grayscale PNG.
///
/// Modules are scaled fractionally so the image is exactly `width` pixels;
/// a width smaller than the symbol falls back to one pixel per module.
pub fn render_png(payload: &str, options: &QrOptions) -> Result<Vec<u8>> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), options.ec_level.into())
        .map_err(|e| CodecError::QrEncoding(e.to_string()))?;
    let modules = code.width();
    let colors = code.to_colors();

    let margin = options.margin as usize;
    let total = modules + 2 * margin;
    let width = (options.width as usize).max(total);

    let module_at = |pixel: usize| -> Option<usize> {
        let m = pixel * total / width;
        (m >= margin && m < margin + modules).then(|| m - margin)
    };

    let mut scanlines = Vec::with_capacity(width * (width + 1));
    for y in 0..width {
        scanlines.push(0); // filter: none
        let row = module_at(y);
        for x in 0..width {
            let dark = match (module_at(x), row) {
                (Some(mx), Some(my)) => colors[my * modules + mx] == Color::Dark,
                _ => false,
            };
            scanlines.push(if dark { DARK } else { LIGHT });
        }
    }

    let side = u32::try_from(width)
        .map_err(|_| CodecError::QrEncoding(format!("image width {} too large", width)))?;
    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&side.to_be_bytes());
    ihdr.extend_from_slice(&side.to_be_bytes());
    // bit depth 8, grayscale, deflate, adaptive filtering, no interlace
    ihdr.extend_from_slice(&[8, 0, 0, 0, 0]);

    let image = PngImage::from_chunks(vec![
        PngChunk::new(ChunkType::IHDR, ihdr),
        PngChunk::new(ChunkType::IDAT, compress::deflate_bytes(&scanlines)),
        PngChunk::new(ChunkType::IEND, Vec::new()),
    ]);
    image.serialize()
}
