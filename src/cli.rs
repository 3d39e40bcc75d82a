//! Command-line front end.

use anyhow::{bail, Context};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::Serialize;
use std::path::PathBuf;

use crate::archive::ZipArchiveBuilder;
use crate::clipboard::SystemClipboard;
use crate::commands::{self, AppState};
use crate::config::{FormatPreference, Preferences};
use crate::delivery::DirectoryDelivery;
use crate::export::CancelSignal;
use crate::geometry::DPI_PRESETS;
use crate::pdf::PdfiumBackend;
use crate::resolve_input;
use crate::surface::{Color, OutputFormat};

#[derive(Debug, Parser)]
#[command(name = "photonpdf", version, about = "Render PDF pages to images")]
pub struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show page count and page sizes
    Info {
        /// PDF path or file:// URL
        input: String,
    },
    /// Render one page
    Render {
        input: String,

        /// Page number, clamped to the document
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[command(flatten)]
        render: RenderArgs,

        /// Also copy the page to the clipboard as PNG
        #[arg(long)]
        copy: bool,

        /// Print a data: URL instead of saving a file (ignores --copy)
        #[arg(long)]
        data_url: bool,
    },
    /// Render a page range
    Export {
        input: String,

        #[arg(long, default_value_t = 1)]
        from: u32,

        /// Last page (defaults to the last page of the document)
        #[arg(long)]
        to: Option<u32>,

        /// Bundle the pages into photonpdf_export.zip
        #[arg(long)]
        zip: bool,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Show or change saved preferences
    Prefs {
        #[command(flatten)]
        render: RenderArgs,

        /// Restore defaults before applying changes
        #[arg(long)]
        reset: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Png,
    Jpg,
}

/// Per-invocation overrides of the saved preferences.
#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Resolution in dots per inch (minimum 36)
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Fit pages onto an A4 canvas
    #[arg(long, overrides_with = "no_a4")]
    pub a4: bool,

    /// Keep the page's own size
    #[arg(long)]
    pub no_a4: bool,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// JPEG quality between 0 and 1
    #[arg(long)]
    pub quality: Option<f32>,

    /// Background color (white, black, #rgb, #rrggbb, #rrggbbaa)
    #[arg(long, value_parser = parse_color)]
    pub background: Option<Color>,

    /// Output directory
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

fn parse_color(value: &str) -> Result<Color, String> {
    value.parse::<Color>().map_err(|e| e.to_string())
}

impl RenderArgs {
    /// `prefs` with these overrides applied.
    pub fn apply(&self, prefs: &Preferences) -> Preferences {
        let mut prefs = prefs.clone();
        if let Some(dpi) = self.dpi {
            prefs.dpi = dpi;
        }
        if self.a4 {
            prefs.force_a4 = true;
        }
        if self.no_a4 {
            prefs.force_a4 = false;
        }
        if let Some(format) = self.format {
            prefs.format = match format {
                FormatArg::Png => FormatPreference::Png,
                FormatArg::Jpg => FormatPreference::Jpg,
            };
        }
        if let Some(quality) = self.quality {
            prefs.jpeg_quality = quality;
        }
        if let Some(background) = self.background {
            prefs.background = background;
        }
        if let Some(out) = &self.out {
            prefs.output_dir = Some(out.clone());
        }
        prefs.sanitized()
    }
}

fn output_dir(prefs: &Preferences) -> PathBuf {
    prefs.output_dir.clone().unwrap_or_else(|| PathBuf::from("."))
}

fn print<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

fn open(input: &str) -> anyhow::Result<AppState<PdfiumBackend>> {
    let Some(path) = resolve_input(input) else {
        bail!("{input} is not a PDF file");
    };
    let state = AppState::new(PdfiumBackend::new());
    commands::load_pdf(&state, &path).with_context(|| format!("opening {}", path.display()))?;
    Ok(state)
}

#[derive(Serialize)]
struct RenderReport {
    #[serde(flatten)]
    summary: commands::RenderSummary,
    saved: PathBuf,
    copied: bool,
}

#[derive(Serialize)]
struct ExportReport {
    files: Vec<PathBuf>,
}

/// Run one parsed command line.
pub async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let saved = Preferences::load();

    match cli.command {
        Command::Info { input } => {
            let state = open(&input)?;
            let info = commands::get_document_info(&state)?;
            print(cli.json, &info, || {
                let mut text = format!("Pages: {}", info.page_count);
                for page in &info.pages {
                    text.push_str(&format!(
                        "\n  {:>4}: {:.1} x {:.1} pt",
                        page.page, page.width, page.height
                    ));
                }
                text
            })?;
        }

        Command::Render {
            input,
            page,
            render,
            copy,
            data_url,
        } => {
            let prefs = render.apply(&saved);
            let options = prefs.render_options();
            let state = open(&input)?;
            commands::go_to_page(&state, page)?;

            if data_url {
                let rendered = commands::render_current(&state, &options)?;
                println!("{}", rendered.image.to_data_url());
                return Ok(());
            }

            let path = commands::export_current(
                &state,
                &options,
                &ZipArchiveBuilder::new(),
                &DirectoryDelivery::new(output_dir(&prefs)),
            )?;
            if copy {
                commands::copy_current(&state, &options, &mut SystemClipboard::new())
                    .context("copying to clipboard")?;
            }

            let report = RenderReport {
                summary: commands::describe_current(&state, &options)?,
                saved: path,
                copied: copy,
            };
            print(cli.json, &report, || {
                let mut text = format!("{}\nSaved {}", report.summary, report.saved.display());
                if report.copied {
                    text.push_str("\nImage copied to clipboard");
                }
                text
            })?;
        }

        Command::Export {
            input,
            from,
            to,
            zip,
            render,
        } => {
            let prefs = render.apply(&saved);
            let options = prefs.render_options();
            let state = open(&input)?;
            let to = to.unwrap_or(u32::MAX);
            let dir = output_dir(&prefs);

            let cancel = CancelSignal::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping after the current page");
                    on_interrupt.cancel();
                }
            });

            let files = tokio::task::spawn_blocking(move || {
                commands::export_range(
                    &state,
                    from,
                    to,
                    &options,
                    zip,
                    &ZipArchiveBuilder::new(),
                    &DirectoryDelivery::new(dir),
                    cancel,
                )
            })
            .await??;

            let report = ExportReport { files };
            print(cli.json, &report, || {
                report
                    .files
                    .iter()
                    .map(|path| format!("Saved {}", path.display()))
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
        }

        Command::Prefs { render, reset } => {
            let base = if reset { Preferences::default() } else { saved };
            let prefs = render.apply(&base);
            if reset || prefs != base {
                let path = prefs.save()?;
                info!("Preferences saved to {}", path.display());
            }
            print(cli.json, &prefs, || {
                format!(
                    "dpi: {} (presets: {})\nA4: {}\nformat: {}\nbackground: {}\noutput: {}",
                    prefs.dpi,
                    DPI_PRESETS.map(|d| d.to_string()).join(", "),
                    if prefs.force_a4 { "on" } else { "off" },
                    match prefs.output_format() {
                        OutputFormat::Png => "png".to_string(),
                        OutputFormat::Jpeg { quality } => format!("jpg (quality {quality:.2})"),
                    },
                    prefs.background,
                    output_dir(&prefs).display()
                )
            })?;
        }
    }

    Ok(())
}
