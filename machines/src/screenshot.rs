//! PNG screenshots of the active display area.
//!
//! The frame buffer already carries the post-crop image (Game Gear LCD
//! window, SMS left-column blanking), so encoding is a straight row copy.

use std::io::Write;
use std::path::Path;

use lumen_core::video::frame::FrameBuffer;

#[derive(Debug)]
pub enum ScreenshotError {
    Io(std::io::Error),
    Encoding(png::EncodingError),
}

impl std::fmt::Display for ScreenshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Encoding(e) => write!(f, "failed to encode screenshot: {e}"),
        }
    }
}

impl std::error::Error for ScreenshotError {}

impl From<std::io::Error> for ScreenshotError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<png::EncodingError> for ScreenshotError {
    fn from(e: png::EncodingError) -> Self {
        Self::Encoding(e)
    }
}

/// Encode a frame as 8-bit truecolor PNG.
pub fn write_screenshot<W: Write>(writer: W, frame: &FrameBuffer) -> Result<(), ScreenshotError> {
    let mut encoder = png::Encoder::new(writer, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let mut image = Vec::with_capacity(frame.pixels.len() * 3);
    for pixel in &frame.pixels {
        image.extend_from_slice(&[pixel.r, pixel.g, pixel.b]);
    }

    let mut png_writer = encoder.write_header()?;
    png_writer.write_image_data(&image)?;
    Ok(())
}

/// Write a frame to a PNG file.
pub fn save_screenshot(path: &Path, frame: &FrameBuffer) -> Result<(), ScreenshotError> {
    let file = std::fs::File::create(path)?;
    write_screenshot(std::io::BufWriter::new(file), frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_core::video::frame::pixel;

    #[test]
    fn encodes_a_valid_png_header() {
        let mut frame = FrameBuffer::new(4, 2);
        frame.pixels.fill(pixel(0x12, 0x34, 0x56));

        let mut buffer = Vec::new();
        write_screenshot(&mut buffer, &frame).unwrap();

        // PNG signature
        assert_eq!(&buffer[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
        // IHDR dimensions
        assert_eq!(&buffer[16..20], &[0, 0, 0, 4]);
        assert_eq!(&buffer[20..24], &[0, 0, 0, 2]);
    }
}
