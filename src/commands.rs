//! Application commands.
//!
//! These wrap the session, renderer and exporters behind one shared state so
//! front ends (the CLI today) only deal with paths, page numbers and options.

use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::archive::ArchiveBuilder;
use crate::clipboard::ClipboardWriter;
use crate::delivery::FileDelivery;
use crate::error::{PhotonError, Result};
use crate::export::{BatchExporter, CancelSignal, ExportMode};
use crate::geometry::{self, PageSize};
use crate::pdf::DocumentBackend;
use crate::renderer::{EncodedImage, PageRenderer, RenderOptions};
use crate::session::PageSession;
use crate::surface::OutputFormat;

/// Application state holding the single loaded document.
pub struct AppState<B: DocumentBackend> {
    session: Mutex<PageSession<B>>,
    /// File path (if loaded from file)
    path: Mutex<Option<PathBuf>>,
}

impl<B: DocumentBackend> AppState<B> {
    pub fn new(backend: B) -> Self {
        Self {
            session: Mutex::new(PageSession::new(backend)),
            path: Mutex::new(None),
        }
    }

    fn session(&self) -> MutexGuard<'_, PageSession<B>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn path(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.path.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of loading a PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadResult {
    pub page_count: u32,
    pub path: Option<PathBuf>,
}

/// Page metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    /// Page number (1-based)
    pub page: u32,
    /// Page width in PDF points
    pub width: f32,
    /// Page height in PDF points
    pub height: f32,
}

/// Document metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub path: Option<PathBuf>,
    pub page_count: u32,
    pub current_page: u32,
    pub pages: Vec<PageInfo>,
}

/// What was rendered, for status lines.
#[derive(Debug, Clone, Serialize)]
pub struct RenderSummary {
    pub width: u32,
    pub height: u32,
    pub dpi: u32,
    pub page: u32,
    pub page_count: u32,
    pub fit_to_a4: bool,
}

impl fmt::Display for RenderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Output: {}×{}px • {}dpi • Page {}/{}",
            self.width, self.height, self.dpi, self.page, self.page_count
        )?;
        if self.fit_to_a4 {
            write!(f, " • A4")?;
        }
        Ok(())
    }
}

/// A rendered current page together with its summary.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: EncodedImage,
    pub summary: RenderSummary,
}

/// Load a PDF from a file path.
pub fn load_pdf<B: DocumentBackend>(state: &AppState<B>, path: &Path) -> Result<LoadResult> {
    let bytes = std::fs::read(path).map_err(|e| PhotonError::Load(format!("{}: {e}", path.display())))?;
    let mut result = load_pdf_bytes(state, bytes)?;
    *state.path() = Some(path.to_path_buf());
    result.path = Some(path.to_path_buf());
    info!("Opened {}", path.display());
    Ok(result)
}

/// Load a PDF from bytes.
pub fn load_pdf_bytes<B: DocumentBackend>(state: &AppState<B>, bytes: Vec<u8>) -> Result<LoadResult> {
    let page_count = state.session().load(bytes)?;
    *state.path() = None;
    Ok(LoadResult {
        page_count,
        path: None,
    })
}

/// Close the document and free its resources.
pub fn close_pdf<B: DocumentBackend>(state: &AppState<B>) {
    state.session().close();
    *state.path() = None;
}

/// Get document info, including every page's native size.
pub fn get_document_info<B: DocumentBackend>(state: &AppState<B>) -> Result<DocumentInfo> {
    let session = state.session();
    let pages = (1..=session.page_count())
        .map(|page| {
            session.page_size(page).map(|PageSize { width, height }| PageInfo {
                page,
                width,
                height,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DocumentInfo {
        path: state.path().clone(),
        page_count: session.page_count(),
        current_page: session.current_page(),
        pages,
    })
}

pub fn go_to_page<B: DocumentBackend>(state: &AppState<B>, page: u32) -> Result<u32> {
    let mut session = state.session();
    session.document()?;
    Ok(session.set_current_page(page))
}

pub fn next_page<B: DocumentBackend>(state: &AppState<B>) -> u32 {
    state.session().next()
}

pub fn previous_page<B: DocumentBackend>(state: &AppState<B>) -> u32 {
    state.session().previous()
}

/// Render the current page.
pub fn render_current<B: DocumentBackend>(
    state: &AppState<B>,
    options: &RenderOptions,
) -> Result<RenderedPage> {
    let session = state.session();
    let document = session.document()?;
    let image = PageRenderer::new(session.backend()).render_page(
        document,
        session.current_page(),
        options,
    )?;

    let summary = RenderSummary {
        width: image.size.width,
        height: image.size.height,
        dpi: options.effective_dpi(),
        page: image.page,
        page_count: session.page_count(),
        fit_to_a4: options.fit_to_standard_page,
    };
    info!("{}", summary);
    Ok(RenderedPage { image, summary })
}

/// The summary [`render_current`] would report, computed from page geometry
/// alone without drawing anything.
pub fn describe_current<B: DocumentBackend>(
    state: &AppState<B>,
    options: &RenderOptions,
) -> Result<RenderSummary> {
    let session = state.session();
    let page = session.current_page();
    let native = session.page_size(page)?;
    let dpi = options.effective_dpi();
    let size = if options.fit_to_standard_page {
        geometry::a4_pixels_at_dpi(dpi)
    } else {
        geometry::to_pixel_size(native.width, native.height, dpi)
    };

    Ok(RenderSummary {
        width: size.width,
        height: size.height,
        dpi,
        page,
        page_count: session.page_count(),
        fit_to_a4: options.fit_to_standard_page,
    })
}

/// Render the current page and save it as `page-NNN.<ext>`.
pub fn export_current<B: DocumentBackend>(
    state: &AppState<B>,
    options: &RenderOptions,
    archive: &dyn ArchiveBuilder,
    delivery: &dyn FileDelivery,
) -> Result<PathBuf> {
    let session = state.session();
    let document = session.document()?;
    let page = session.current_page();
    let output = BatchExporter::new(session.backend(), archive).export_range(
        document,
        page,
        page,
        options,
        ExportMode::Single,
    )?;
    delivery.deliver(output.payload())
}

/// Export a page range, either bundled into one archive or as one file per page.
#[allow(clippy::too_many_arguments)]
pub fn export_range<B: DocumentBackend>(
    state: &AppState<B>,
    from: u32,
    to: u32,
    options: &RenderOptions,
    bundle: bool,
    archive: &dyn ArchiveBuilder,
    delivery: &dyn FileDelivery,
    cancel: CancelSignal,
) -> Result<Vec<PathBuf>> {
    let session = state.session();
    let document = session.document()?;
    let exporter = BatchExporter::new(session.backend(), archive).with_cancel(cancel);

    if bundle {
        let output = exporter.export_range(document, from, to, options, ExportMode::Archive)?;
        return Ok(vec![delivery.deliver(output.payload())?]);
    }

    // Render everything first so a failing page leaves nothing half-saved.
    let range = exporter.resolve_range(document, from, to)?;
    let payloads = exporter.render_range(document, range, options)?;
    payloads
        .iter()
        .map(|payload| delivery.deliver(payload))
        .collect()
}

/// Render the current page as PNG and put it on the clipboard.
pub fn copy_current<B: DocumentBackend>(
    state: &AppState<B>,
    options: &RenderOptions,
    clipboard: &mut dyn ClipboardWriter,
) -> Result<RenderSummary> {
    let png = options.with_format(OutputFormat::Png);
    let rendered = render_current(state, &png)?;
    clipboard.write_png(&rendered.image.bytes)?;
    Ok(rendered.summary)
}
