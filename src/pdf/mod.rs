//! Document backends.
//!
//! This module provides:
//! - The [`DocumentBackend`] trait the render pipeline draws through
//! - A PDFium implementation with on-demand library binding

mod backend;
mod pdfium;

pub use backend::DocumentBackend;
pub use pdfium::{PdfiumBackend, PdfiumDocument};

#[cfg(test)]
pub(crate) use backend::testing;
