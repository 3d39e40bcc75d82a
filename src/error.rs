//! Error type shared by the render pipeline, the session and the exporters.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while loading, rendering or exporting pages.
#[derive(Error, Debug)]
pub enum PhotonError {
    #[error("Failed to initialize PDFium: {0}")]
    InitError(String),

    #[error("Failed to load PDF: {0}")]
    Load(String),

    #[error("Document has no pages")]
    EmptyDocument,

    #[error("No document loaded")]
    DocumentNotLoaded,

    #[error("Page {page} is out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: u32 },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Surface of {width}x{height} pixels is too large to allocate")]
    ResourceExhausted { width: u32, height: u32 },

    #[error("Rendering failed: {0}")]
    BackendRenderFailure(String),

    #[error("Image encoding failed: {0}")]
    EncodingFailure(String),

    #[error("Clipboard access denied: {0}")]
    PermissionDenied(String),

    #[error("Archive assembly failed: {0}")]
    ArchiveAssemblyFailure(String),

    #[error("Saving {name} failed: {reason}")]
    DeliveryFailed { name: String, reason: String },

    #[error("Page {page} failed: {source}")]
    PageFailed {
        page: u32,
        #[source]
        source: Box<PhotonError>,
    },

    #[error("Export cancelled before page {page}")]
    Cancelled { page: u32 },

    #[error("Single export needs exactly one page, got {from}-{to}")]
    SingleModeRange { from: u32, to: u32 },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Preferences error: {0}")]
    Config(String),
}

impl PhotonError {
    /// The page a batch export stopped on, if any.
    pub fn failed_page(&self) -> Option<u32> {
        match self {
            PhotonError::PageFailed { page, .. } | PhotonError::Cancelled { page } => Some(*page),
            _ => None,
        }
    }
}

impl Serialize for PhotonError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T, E = PhotonError> = std::result::Result<T, E>;
