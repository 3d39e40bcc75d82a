//! Raster surface helpers on top of `image::RgbaImage`.
//!
//! A surface is allocated at a pixel size, filled, composited onto and
//! finally encoded. Allocation is size-checked so very high resolutions fail
//! with [`PhotonError::ResourceExhausted`] instead of aborting the process.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use crate::error::{PhotonError, Result};
use crate::geometry::{PixelSize, Placement};

/// Upper bound for a single RGBA surface (1 GiB).
pub const MAX_SURFACE_BYTES: u64 = 1 << 30;

pub const DEFAULT_JPEG_QUALITY: f32 = 0.92;

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a])
    }

    /// Same color with alpha forced to fully opaque.
    pub fn opaque(self) -> Self {
        Self { a: 255, ..self }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl FromStr for Color {
    type Err = PhotonError;

    /// Accepts `white`, `black`, `#rgb`, `#rrggbb` and `#rrggbbaa`.
    fn from_str(s: &str) -> Result<Self> {
        let value = s.trim();
        match value.to_ascii_lowercase().as_str() {
            "white" => return Ok(Color::WHITE),
            "black" => return Ok(Color::BLACK),
            _ => {}
        }

        let invalid = || PhotonError::InvalidColor(s.to_string());
        let hex = value.strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());

        match hex.len() {
            3 => {
                let nibble = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| invalid())
                };
                Ok(Color::rgb(nibble(0)?, nibble(1)?, nibble(2)?))
            }
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color {
                r: byte(0)?,
                g: byte(2)?,
                b: byte(4)?,
                a: byte(6)?,
            }),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = PhotonError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Encoded image format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Png,
    /// Lossy; quality in `[0, 1]`.
    Jpeg { quality: f32 },
}

impl OutputFormat {
    pub fn jpeg() -> Self {
        OutputFormat::Jpeg {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg { .. } => "jpg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Png
    }
}

/// Fail early if a surface of `size` cannot reasonably be allocated.
pub fn check_size(size: PixelSize) -> Result<()> {
    if size.is_empty() {
        return Err(PhotonError::InvalidGeometry(format!(
            "surface is {}x{}",
            size.width, size.height
        )));
    }
    if size.area().saturating_mul(4) > MAX_SURFACE_BYTES {
        return Err(PhotonError::ResourceExhausted {
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

/// Allocate a surface of `size` filled with `background`.
pub fn allocate(size: PixelSize, background: Color) -> Result<RgbaImage> {
    check_size(size)?;
    Ok(RgbaImage::from_pixel(
        size.width,
        size.height,
        background.to_rgba(),
    ))
}

/// Draw `source` onto `canvas` at `placement`, scaling when the placed size
/// differs from the source size. Alpha is blended over what is already there.
pub fn composite(canvas: &mut RgbaImage, source: &RgbaImage, placement: &Placement) {
    let (x, y) = (placement.x as i64, placement.y as i64);
    if source.dimensions() == (placement.width, placement.height) {
        imageops::overlay(canvas, source, x, y);
    } else {
        let scaled = imageops::resize(source, placement.width, placement.height, FilterType::Triangle);
        imageops::overlay(canvas, &scaled, x, y);
    }
}

/// Encode `surface`. JPEG has no alpha channel, so the surface is first
/// flattened over the opaque `background`.
pub fn encode(surface: &RgbaImage, format: OutputFormat, background: Color) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    match format {
        OutputFormat::Png => {
            surface
                .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
                .map_err(|e| PhotonError::EncodingFailure(e.to_string()))?;
        }
        OutputFormat::Jpeg { quality } => {
            let mut flat = RgbaImage::from_pixel(
                surface.width(),
                surface.height(),
                background.opaque().to_rgba(),
            );
            imageops::overlay(&mut flat, surface, 0, 0);
            let rgb = DynamicImage::ImageRgba8(flat).to_rgb8();

            let mut encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality));
            encoder
                .encode_image(&rgb)
                .map_err(|e| PhotonError::EncodingFailure(e.to_string()))?;
        }
    }
    Ok(bytes)
}

/// Map a `[0, 1]` quality onto the encoder's 1..=100 scale.
fn jpeg_quality(quality: f32) -> u8 {
    let quality = if quality.is_finite() {
        quality.clamp(0.0, 1.0)
    } else {
        DEFAULT_JPEG_QUALITY
    };
    ((quality * 100.0).round() as u8).max(1)
}
