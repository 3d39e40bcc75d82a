//! The seam between the render pipeline and whatever parses and rasterizes
//! documents.

use image::RgbaImage;

use crate::error::Result;
use crate::geometry::{PageSize, PixelSize};

/// A document parser/rasterizer.
///
/// Page numbers are 1-based. Callers validate them against
/// [`page_count`](DocumentBackend::page_count) before asking for sizes or
/// draws; implementations still reject bad indices with an error.
pub trait DocumentBackend {
    /// Parsed document handle. Owned by the session, lent to each call.
    type Document;

    /// Parse `bytes` into a document.
    fn open(&self, bytes: Vec<u8>) -> Result<Self::Document>;

    fn page_count(&self, document: &Self::Document) -> u32;

    /// Native page size in points.
    fn native_size(&self, document: &Self::Document, page: u32) -> Result<PageSize>;

    /// Rasterize `page` into a surface of exactly `size` pixels.
    fn draw(&self, document: &Self::Document, page: u32, size: PixelSize) -> Result<RgbaImage>;
}
