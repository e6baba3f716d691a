use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageResult};

use crate::config::{OutputEncoding, OutputFormat};

/// Encodes `image` into a compressed buffer. JPEG output drops any alpha channel.
pub fn encode(image: &DynamicImage, encoding: &OutputEncoding) -> ImageResult<Vec<u8>> {
    let mut buffer = Vec::new();
    match encoding.format {
        OutputFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, encoding.quality))?;
        }
        OutputFormat::Png => {
            image.write_with_encoder(PngEncoder::new(&mut buffer))?;
        }
    }
    Ok(buffer)
}
