//! Copying rendered pages to the system clipboard.

use arboard::{Clipboard, ImageData};
use log::{debug, info};
use std::borrow::Cow;

use crate::error::{PhotonError, Result};

/// Accepts a PNG payload and puts it on a clipboard.
pub trait ClipboardWriter {
    fn write_png(&mut self, png: &[u8]) -> Result<()>;
}

/// The desktop clipboard, through arboard.
///
/// On Linux the clipboard is owned by the writing process, so the write
/// blocks until another application takes ownership of the selection.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

fn denied(e: arboard::Error) -> PhotonError {
    PhotonError::PermissionDenied(e.to_string())
}

/// Decode PNG bytes into the raw RGBA layout clipboards expect.
pub(crate) fn png_to_image_data(png: &[u8]) -> Result<ImageData<'static>> {
    let rgba = image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .map_err(|e| PhotonError::EncodingFailure(e.to_string()))?
        .to_rgba8();
    Ok(ImageData {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        bytes: Cow::Owned(rgba.into_raw()),
    })
}

impl ClipboardWriter for SystemClipboard {
    fn write_png(&mut self, png: &[u8]) -> Result<()> {
        let image = png_to_image_data(png)?;
        debug!("Copying {}x{} image to clipboard", image.width, image.height);

        let mut clipboard = Clipboard::new().map_err(denied)?;

        #[cfg(target_os = "linux")]
        {
            use arboard::SetExtLinux;
            info!("Image is on the clipboard; waiting for it to be pasted");
            clipboard.set().wait().image(image).map_err(denied)?;
        }

        #[cfg(not(target_os = "linux"))]
        {
            clipboard.set_image(image).map_err(denied)?;
            info!("Image copied to clipboard");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{self, Color, OutputFormat};
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_png_to_image_data() {
        let surface = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 4]));
        let png = surface::encode(&surface, OutputFormat::Png, Color::WHITE).unwrap();

        let data = png_to_image_data(&png).unwrap();
        assert_eq!((data.width, data.height), (3, 2));
        assert_eq!(&data.bytes[..4], &[1, 2, 3, 4]);
        assert_eq!(data.bytes.len(), 3 * 2 * 4);
    }

    #[test]
    fn test_rejects_non_png() {
        assert!(matches!(
            png_to_image_data(b"\xFF\xD8\xFF not png"),
            Err(PhotonError::EncodingFailure(_))
        ));
    }
}
