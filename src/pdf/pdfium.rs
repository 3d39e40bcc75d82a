//! PDFium-backed document backend.
//!
//! Note: pdfium-render's Pdfium struct is not Send+Sync, so we bind it
//! on-demand within each operation and keep only the document bytes (plus the
//! page sizes read at load time) in the handle.

use image::RgbaImage;
use log::{debug, info, warn};
use pdfium_render::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};

use super::backend::DocumentBackend;
use crate::error::{PhotonError, Result};
use crate::geometry::{PageSize, PixelSize};

/// A parsed PDF: raw bytes plus the native size of every page.
pub struct PdfiumDocument {
    bytes: Vec<u8>,
    page_sizes: Vec<PageSize>,
}

/// Renders through the PDFium shared library.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumBackend;

impl PdfiumBackend {
    pub fn new() -> Self {
        Self
    }
}

static LOGGED_SUCCESS: AtomicBool = AtomicBool::new(false);

fn log_loaded(source: &str) {
    if !LOGGED_SUCCESS.swap(true, Ordering::Relaxed) {
        info!("Loaded PDFium from {}", source);
    }
}

/// Bind to the PDFium library and return a usable Pdfium instance.
///
/// Tried in order: `PDFIUM_LIBRARY` from the environment, a library next to
/// the executable, then the system library.
fn bind_pdfium() -> Result<Pdfium> {
    if let Ok(path) = std::env::var("PDFIUM_LIBRARY") {
        match Pdfium::bind_to_library(&path) {
            Ok(bindings) => {
                log_loaded(&path);
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => warn!("PDFIUM_LIBRARY={} could not be loaded: {:?}", path, e),
        }
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.to_path_buf()))
    {
        let local = exe_dir.join(Pdfium::pdfium_platform_library_name());
        if local.exists() {
            match Pdfium::bind_to_library(&local) {
                Ok(bindings) => {
                    log_loaded(&local.display().to_string());
                    return Ok(Pdfium::new(bindings));
                }
                Err(e) => warn!("Bundled PDFium at {:?} failed: {:?}", local, e),
            }
        }
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            log_loaded("system library");
            Ok(Pdfium::new(bindings))
        }
        Err(e) => Err(PhotonError::InitError(format!(
            "could not load the PDFium library ({e:?}); set PDFIUM_LIBRARY to its path"
        ))),
    }
}

fn load<'a>(pdfium: &'a Pdfium, bytes: &'a [u8]) -> Result<PdfDocument<'a>> {
    pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| PhotonError::Load(e.to_string()))
}

impl DocumentBackend for PdfiumBackend {
    type Document = PdfiumDocument;

    fn open(&self, bytes: Vec<u8>) -> Result<PdfiumDocument> {
        let pdfium = bind_pdfium()?;
        let page_sizes = {
            let doc = load(&pdfium, &bytes)?;
            doc.pages()
                .iter()
                .map(|page| PageSize {
                    width: page.width().value,
                    height: page.height().value,
                })
                .collect::<Vec<_>>()
        };
        debug!("Opened PDF: {} bytes, {} pages", bytes.len(), page_sizes.len());
        Ok(PdfiumDocument { bytes, page_sizes })
    }

    fn page_count(&self, document: &PdfiumDocument) -> u32 {
        document.page_sizes.len() as u32
    }

    fn native_size(&self, document: &PdfiumDocument, page: u32) -> Result<PageSize> {
        page.checked_sub(1)
            .and_then(|index| document.page_sizes.get(index as usize))
            .copied()
            .ok_or(PhotonError::PageOutOfRange {
                page,
                page_count: self.page_count(document),
            })
    }

    fn draw(&self, document: &PdfiumDocument, page: u32, size: PixelSize) -> Result<RgbaImage> {
        self.native_size(document, page)?;
        let width = i32::try_from(size.width).map_err(|_| PhotonError::ResourceExhausted {
            width: size.width,
            height: size.height,
        })?;
        let height = i32::try_from(size.height).map_err(|_| PhotonError::ResourceExhausted {
            width: size.width,
            height: size.height,
        })?;

        let pdfium = bind_pdfium()?;
        let doc = load(&pdfium, &document.bytes)?;
        let pdf_page = doc
            .pages()
            .get((page - 1) as u16)
            .map_err(|e| PhotonError::BackendRenderFailure(e.to_string()))?;

        // Configure high-quality rendering
        let config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_target_height(height)
            .render_form_data(true)
            .render_annotations(true);

        let bitmap = pdf_page
            .render_with_config(&config)
            .map_err(|e| PhotonError::BackendRenderFailure(e.to_string()))?;

        let image = bitmap.as_image().to_rgba8();
        if image.dimensions() == (size.width, size.height) {
            Ok(image)
        } else {
            debug!(
                "PDFium returned {}x{} for page {}, resizing to {}x{}",
                image.width(),
                image.height(),
                page,
                size.width,
                size.height
            );
            Ok(image::imageops::resize(
                &image,
                size.width,
                size.height,
                image::imageops::FilterType::Triangle,
            ))
        }
    }
}
