//! Resolution and page-fit geometry.
//!
//! PDF sizes are in points (1/72 inch). Everything here is pure arithmetic on
//! pixel sizes; nothing touches a surface.

use serde::{Deserialize, Serialize};

use crate::error::{PhotonError, Result};

/// Points per inch.
pub const POINTS_PER_INCH: f64 = 72.0;
pub const MM_PER_INCH: f64 = 25.4;

/// Lowest accepted resolution. Anything lower is raised to this.
pub const MIN_DPI: u32 = 36;
pub const DEFAULT_DPI: u32 = 120;
pub const DPI_PRESETS: [u32; 6] = [72, 96, 120, 150, 200, 300];

/// ISO A4 in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Integer raster dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Native page size in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Where a source image lands on a fit target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub scale: f64,
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

/// Raise `dpi` to [`MIN_DPI`] if it is below the floor.
pub fn clamp_dpi(dpi: u32) -> u32 {
    dpi.max(MIN_DPI)
}

fn to_pixels(value: f64) -> u32 {
    // `as` saturates, so absurd resolutions end up as u32::MAX and are
    // rejected by the surface size check instead of wrapping.
    (value.round() as u32).max(1)
}

/// Pixel size of a page of `width_pts` x `height_pts` rendered at `dpi`.
///
/// Each axis is rounded to the nearest integer on its own.
pub fn to_pixel_size(width_pts: f32, height_pts: f32, dpi: u32) -> PixelSize {
    let scale = dpi as f64 / POINTS_PER_INCH;
    PixelSize {
        width: to_pixels(width_pts as f64 * scale),
        height: to_pixels(height_pts as f64 * scale),
    }
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// A4 in pixels at `dpi`, computed independently of any source render.
pub fn a4_pixels_at_dpi(dpi: u32) -> PixelSize {
    let dpi = dpi as f64;
    PixelSize {
        width: to_pixels(mm_to_inches(A4_WIDTH_MM) * dpi),
        height: to_pixels(mm_to_inches(A4_HEIGHT_MM) * dpi),
    }
}

/// "Contain" fit of `source` onto `target`: scale uniformly so the whole
/// source is visible, then center it. Odd remainders leave the extra pixel
/// on the right/bottom.
pub fn fit(source: PixelSize, target: PixelSize) -> Result<Placement> {
    if source.is_empty() {
        return Err(PhotonError::InvalidGeometry(format!(
            "source is {}x{}",
            source.width, source.height
        )));
    }
    if target.is_empty() {
        return Err(PhotonError::InvalidGeometry(format!(
            "target is {}x{}",
            target.width, target.height
        )));
    }

    let (sw, sh) = (source.width as f64, source.height as f64);
    let (tw, th) = (target.width as f64, target.height as f64);
    let scale = (tw / sw).min(th / sh);

    let width = ((sw * scale).round() as u32).clamp(1, target.width);
    let height = ((sh * scale).round() as u32).clamp(1, target.height);

    Ok(Placement {
        scale,
        width,
        height,
        x: (target.width - width) / 2,
        y: (target.height - height) / 2,
    })
}
