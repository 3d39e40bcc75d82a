// PhotonPDF - page to image renderer
//
// Renders PDF pages to PNG/JPEG at a chosen resolution through PDFium,
// optionally fitted onto an A4 canvas, and exports single pages, page ranges
// or a zip of a range.

pub mod archive;
pub mod cli;
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pdf;
pub mod renderer;
pub mod session;
pub mod surface;

pub use error::{PhotonError, Result};
pub use export::{BatchExporter, CancelSignal, ExportMode, ExportOutput, NamedPayload, PageRange};
pub use geometry::{fit, to_pixel_size, PixelSize, Placement};
pub use pdf::{DocumentBackend, PdfiumBackend};
pub use renderer::{EncodedImage, PageRenderer, RenderOptions};
pub use session::PageSession;

use log::{debug, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::{Path, PathBuf};

/// Check if a path is an existing PDF file.
fn is_pdf_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
}

/// Turn a command-line argument into a PDF path.
///
/// Accepts plain paths, `file://` URLs and percent-encoded paths (as some
/// file managers pass them).
pub fn resolve_input(arg: &str) -> Option<PathBuf> {
    // First try as a direct file path
    let direct = Path::new(arg);
    if is_pdf_file(direct) {
        return Some(direct.to_path_buf());
    }

    // Handle file:// URLs
    if arg.starts_with("file://") {
        if let Some(path) = url::Url::parse(arg)
            .ok()
            .and_then(|url| url.to_file_path().ok())
        {
            if is_pdf_file(&path) {
                debug!("Resolved file URL {} to {}", arg, path.display());
                return Some(path);
            }
        }
    }

    // Handle URL-encoded paths (e.g., spaces as %20)
    if let Ok(decoded) = urlencoding::decode(arg) {
        let decoded = PathBuf::from(decoded.as_ref());
        if decoded.as_os_str() != arg && is_pdf_file(&decoded) {
            debug!("Resolved encoded path {} to {}", arg, decoded.display());
            return Some(decoded);
        }
    }

    None
}

/// Log level for a `-v` count.
pub fn log_level(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Parse the command line, set up logging and run the command.
pub async fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = cli::Cli::parse();
    TermLogger::init(
        log_level(cli.verbose),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    debug!("Arguments: {:?}", cli);

    cli::dispatch(cli).await
}
