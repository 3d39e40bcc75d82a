//! Batch export: render a page range in order and name or bundle the results.

use log::{debug, error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::archive::ArchiveBuilder;
use crate::error::{PhotonError, Result};
use crate::pdf::DocumentBackend;
use crate::renderer::{PageRenderer, RenderOptions};

pub const PAGE_FILE_PREFIX: &str = "page-";
pub const ARCHIVE_NAME: &str = "photonpdf_export.zip";

/// `page-007.png` style filename for `page`.
pub fn page_filename(page: u32, extension: &str) -> String {
    format!("{PAGE_FILE_PREFIX}{page:03}.{extension}")
}

/// A named binary payload, ready for delivery or archiving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedPayload {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Inclusive, ascending, in-bounds page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    pub from: u32,
    pub to: u32,
}

impl PageRange {
    /// Swap reversed ends and clamp both into `1..=page_count`.
    pub fn normalize(from: u32, to: u32, page_count: u32) -> Result<Self> {
        if page_count == 0 {
            return Err(PhotonError::PageOutOfRange {
                page: from,
                page_count,
            });
        }
        let (from, to) = if from > to { (to, from) } else { (from, to) };
        Ok(Self {
            from: from.clamp(1, page_count),
            to: to.clamp(1, page_count),
        })
    }

    /// Number of pages in the range; never zero.
    pub fn count(&self) -> u32 {
        self.to - self.from + 1
    }

    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.from..=self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Exactly one page, delivered as its own file.
    Single,
    /// Every page of the range bundled into [`ARCHIVE_NAME`].
    Archive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutput {
    Single(NamedPayload),
    Archive(NamedPayload),
}

impl ExportOutput {
    pub fn payload(&self) -> &NamedPayload {
        match self {
            ExportOutput::Single(payload) | ExportOutput::Archive(payload) => payload,
        }
    }
}

/// Shared flag checked between pages of a batch.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Renders page ranges one page at a time, in ascending order.
///
/// The first failing page aborts the whole batch; nothing rendered before it
/// is handed to the archive builder.
pub struct BatchExporter<'a, B: DocumentBackend> {
    backend: &'a B,
    archive: &'a dyn ArchiveBuilder,
    cancel: CancelSignal,
}

impl<'a, B: DocumentBackend> BatchExporter<'a, B> {
    pub fn new(backend: &'a B, archive: &'a dyn ArchiveBuilder) -> Self {
        Self {
            backend,
            archive,
            cancel: CancelSignal::new(),
        }
    }

    pub fn with_cancel(self, cancel: CancelSignal) -> Self {
        Self { cancel, ..self }
    }

    /// Normalize `from`/`to` against `document`.
    pub fn resolve_range(&self, document: &B::Document, from: u32, to: u32) -> Result<PageRange> {
        PageRange::normalize(from, to, self.backend.page_count(document))
    }

    /// Render every page of `range` and name it. Errors carry the page number.
    pub fn render_range(
        &self,
        document: &B::Document,
        range: PageRange,
        options: &RenderOptions,
    ) -> Result<Vec<NamedPayload>> {
        let renderer = PageRenderer::new(self.backend);
        let extension = options.format.extension();
        let mut payloads = Vec::with_capacity(range.count() as usize);

        for page in range.pages() {
            if self.cancel.is_cancelled() {
                info!("Export cancelled before page {}", page);
                return Err(PhotonError::Cancelled { page });
            }

            let image = renderer
                .render_page(document, page, options)
                .map_err(|source| {
                    error!("Export failed on page {}: {}", page, source);
                    PhotonError::PageFailed {
                        page,
                        source: Box::new(source),
                    }
                })?;

            let name = page_filename(page, extension);
            debug!("Rendered {} ({} bytes)", name, image.bytes.len());
            payloads.push(NamedPayload {
                name,
                bytes: image.bytes,
            });
        }

        Ok(payloads)
    }

    /// Export `from..=to` (either order) as a single file or an archive.
    pub fn export_range(
        &self,
        document: &B::Document,
        from: u32,
        to: u32,
        options: &RenderOptions,
        mode: ExportMode,
    ) -> Result<ExportOutput> {
        let range = self.resolve_range(document, from, to)?;
        info!(
            "Exporting pages {}-{} at {}dpi ({:?})",
            range.from,
            range.to,
            options.effective_dpi(),
            mode
        );

        match mode {
            ExportMode::Single => {
                if range.count() != 1 {
                    return Err(PhotonError::SingleModeRange {
                        from: range.from,
                        to: range.to,
                    });
                }
                let mut payloads = self.render_range(document, range, options)?;
                payloads
                    .pop()
                    .map(ExportOutput::Single)
                    .ok_or(PhotonError::SingleModeRange {
                        from: range.from,
                        to: range.to,
                    })
            }
            ExportMode::Archive => {
                let payloads = self.render_range(document, range, options)?;
                let bytes = self.archive.build(&payloads)?;
                info!("Built {} with {} pages ({} bytes)", ARCHIVE_NAME, payloads.len(), bytes.len());
                Ok(ExportOutput::Archive(NamedPayload {
                    name: ARCHIVE_NAME.to_string(),
                    bytes,
                }))
            }
        }
    }
}
