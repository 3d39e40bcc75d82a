//! Page rendering: draw, optionally fit onto A4, encode.

use base64::Engine;
use image::RgbaImage;
use log::debug;

use crate::error::{PhotonError, Result};
use crate::geometry::{self, PixelSize, DEFAULT_DPI};
use crate::pdf::DocumentBackend;
use crate::surface::{self, Color, OutputFormat};

/// Everything a single render call depends on besides the document and page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Dots per inch; values below [`geometry::MIN_DPI`] are raised to it.
    pub dpi: u32,
    /// Contain-fit the page onto an A4 canvas at the same dpi.
    pub fit_to_standard_page: bool,
    /// Fill behind the page on the A4 canvas and under JPEG output.
    pub background: Color,
    pub format: OutputFormat,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dpi: DEFAULT_DPI,
            fit_to_standard_page: false,
            background: Color::WHITE,
            format: OutputFormat::Png,
        }
    }
}

impl RenderOptions {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi,
            ..Self::default()
        }
    }

    pub fn fit_to_a4(self, fit: bool) -> Self {
        Self {
            fit_to_standard_page: fit,
            ..self
        }
    }

    pub fn with_background(self, background: Color) -> Self {
        Self { background, ..self }
    }

    pub fn with_format(self, format: OutputFormat) -> Self {
        Self { format, ..self }
    }

    pub fn effective_dpi(&self) -> u32 {
        geometry::clamp_dpi(self.dpi)
    }
}

/// An encoded page image.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// The page actually rendered, after clamping.
    pub page: u32,
    pub size: PixelSize,
    pub format: OutputFormat,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    /// `data:` URL suitable for an `<img src>` preview.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Renders pages of documents opened by `B`.
///
/// Stateless apart from the borrowed backend: every call re-renders from the
/// document, nothing is cached between calls.
pub struct PageRenderer<'a, B: DocumentBackend> {
    backend: &'a B,
}

impl<'a, B: DocumentBackend> PageRenderer<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Clamp `page` into `1..=page_count`.
    pub fn clamp_page(&self, document: &B::Document, page: u32) -> Result<u32> {
        let page_count = self.backend.page_count(document);
        if page_count == 0 {
            return Err(PhotonError::PageOutOfRange { page, page_count });
        }
        Ok(page.clamp(1, page_count))
    }

    /// Render `page` to a surface, fitted onto A4 when requested.
    /// Returns the clamped page number with the surface.
    pub fn render_surface(
        &self,
        document: &B::Document,
        page: u32,
        options: &RenderOptions,
    ) -> Result<(u32, RgbaImage)> {
        let page = self.clamp_page(document, page)?;
        let dpi = options.effective_dpi();

        let native = self.backend.native_size(document, page)?;
        let size = geometry::to_pixel_size(native.width, native.height, dpi);
        surface::check_size(size)?;
        debug!(
            "Rendering page {} ({}x{}pt) at {}dpi -> {}x{}px",
            page, native.width, native.height, dpi, size.width, size.height
        );

        let drawn = self.backend.draw(document, page, size)?;
        if !options.fit_to_standard_page {
            return Ok((page, drawn));
        }

        let target = geometry::a4_pixels_at_dpi(dpi);
        let source = PixelSize::new(drawn.width(), drawn.height());
        let placement = geometry::fit(source, target)?;
        debug!(
            "Fitting {}x{} onto A4 {}x{}: {}x{} at ({}, {})",
            source.width,
            source.height,
            target.width,
            target.height,
            placement.width,
            placement.height,
            placement.x,
            placement.y
        );

        let mut canvas = surface::allocate(target, options.background)?;
        surface::composite(&mut canvas, &drawn, &placement);
        Ok((page, canvas))
    }

    /// Render and encode `page` in `options.format`.
    pub fn render_page(
        &self,
        document: &B::Document,
        page: u32,
        options: &RenderOptions,
    ) -> Result<EncodedImage> {
        let (page, surface) = self.render_surface(document, page, options)?;
        let bytes = surface::encode(&surface, options.format, options.background)?;
        Ok(EncodedImage {
            page,
            size: PixelSize::new(surface.width(), surface.height()),
            format: options.format,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{fake_pdf, letter_pdf, page_shade, FakeBackend};
    use image::Rgba;

    fn decode(image: &EncodedImage) -> RgbaImage {
        image::load_from_memory(&image.bytes).unwrap().to_rgba8()
    }

    #[test]
    fn test_render_at_native_size() {
        let backend = FakeBackend::default();
        let doc = backend.open(letter_pdf(2)).unwrap();
        let renderer = PageRenderer::new(&backend);

        let image = renderer.render_page(&doc, 2, &RenderOptions::new(144)).unwrap();
        assert_eq!(image.page, 2);
        assert_eq!(image.size, PixelSize::new(1224, 1584));
        assert_eq!(decode(&image).dimensions(), (1224, 1584));
        assert_eq!(backend.drawn_pages(), vec![2]);
    }

    #[test]
    fn test_dpi_floor_applies() {
        let backend = FakeBackend::default();
        let doc = backend.open(fake_pdf(&[(72.0, 144.0)])).unwrap();
        let renderer = PageRenderer::new(&backend);

        let image = renderer.render_page(&doc, 1, &RenderOptions::new(1)).unwrap();
        assert_eq!(image.size, PixelSize::new(36, 72));
    }

    #[test]
    fn test_out_of_range_pages_clamp() {
        let backend = FakeBackend::default();
        let doc = backend.open(letter_pdf(3)).unwrap();
        let renderer = PageRenderer::new(&backend);
        let options = RenderOptions::new(36);

        assert_eq!(renderer.render_page(&doc, 0, &options).unwrap().page, 1);
        assert_eq!(renderer.render_page(&doc, 99, &options).unwrap().page, 3);
        assert_eq!(backend.drawn_pages(), vec![1, 3]);
    }

    #[test]
    fn test_fit_to_a4_centers_square_page() {
        let backend = FakeBackend::default();
        let doc = backend.open(fake_pdf(&[(100.0, 100.0)])).unwrap();
        let renderer = PageRenderer::new(&backend);
        let options = RenderOptions::new(120).fit_to_a4(true);

        let image = renderer.render_page(&doc, 1, &options).unwrap();
        assert_eq!(image.size, PixelSize::new(992, 1403));

        let pixels = decode(&image);
        let shade = page_shade(1);
        let white = Rgba([255, 255, 255, 255]);
        assert_eq!(*pixels.get_pixel(0, 0), white);
        assert_eq!(*pixels.get_pixel(0, 204), white);
        assert_eq!(*pixels.get_pixel(0, 205), Rgba([shade, shade, shade, 255]));
        assert_eq!(*pixels.get_pixel(991, 1196), Rgba([shade, shade, shade, 255]));
        assert_eq!(*pixels.get_pixel(991, 1197), white);
    }

    #[test]
    fn test_fit_fills_custom_background_under_transparent_page() {
        let backend = FakeBackend {
            transparent: true,
            ..FakeBackend::default()
        };
        let doc = backend.open(fake_pdf(&[(300.0, 100.0)])).unwrap();
        let renderer = PageRenderer::new(&backend);
        let options = RenderOptions::new(72)
            .fit_to_a4(true)
            .with_background(Color::rgb(0, 128, 0));

        let (_, surface) = renderer.render_surface(&doc, 1, &options).unwrap();
        assert!(surface.pixels().all(|p| *p == Rgba([0, 128, 0, 255])));
    }

    #[test]
    fn test_jpeg_output() {
        let backend = FakeBackend::default();
        let doc = backend.open(letter_pdf(1)).unwrap();
        let renderer = PageRenderer::new(&backend);
        let options = RenderOptions::new(36).with_format(OutputFormat::jpeg());

        let image = renderer.render_page(&doc, 1, &options).unwrap();
        assert_eq!(image.format.extension(), "jpg");
        assert!(image.bytes.starts_with(&[0xFF, 0xD8]));
        assert!(image.to_data_url().starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn test_backend_failure_propagates() {
        let backend = FakeBackend::failing_on(&[1]);
        let doc = backend.open(letter_pdf(1)).unwrap();
        let renderer = PageRenderer::new(&backend);

        let err = renderer.render_page(&doc, 1, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, PhotonError::BackendRenderFailure(_)));
    }

    #[test]
    fn test_huge_dpi_is_resource_error() {
        let backend = FakeBackend::default();
        let doc = backend.open(letter_pdf(1)).unwrap();
        let renderer = PageRenderer::new(&backend);

        let err = renderer
            .render_page(&doc, 1, &RenderOptions::new(1_000_000))
            .unwrap_err();
        assert!(matches!(err, PhotonError::ResourceExhausted { .. }));
        assert!(backend.drawn_pages().is_empty());
    }

    #[test]
    fn test_empty_document_is_rejected() {
        let backend = FakeBackend::default();
        let doc = backend.open(Vec::new()).unwrap();
        let renderer = PageRenderer::new(&backend);

        let err = renderer.render_page(&doc, 1, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, PhotonError::PageOutOfRange { page_count: 0, .. }));
    }
}
