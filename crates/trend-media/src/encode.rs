//! Rendition encoding.

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};
use trend_models::{EncodedImage, ImageEncoding, Rendition};

use crate::error::{MediaError, MediaResult};

fn encode_canvas(canvas: &RgbaImage, encoding: ImageEncoding) -> MediaResult<Vec<u8>> {
    let (width, height) = canvas.dimensions();
    let mut buf = Vec::new();
    let result = match encoding {
        ImageEncoding::Png => PngEncoder::new(&mut buf).write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8),
        ImageEncoding::Webp => {
            WebPEncoder::new_lossless(&mut buf).write_image(canvas.as_raw(), width, height, ExtendedColorType::Rgba8)
        }
        ImageEncoding::Jpeg { quality } => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut buf, quality).write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        }
    };
    result.map_err(|e| MediaError::encode(format!("{encoding:?}: {e}")))?;
    Ok(buf)
}

/// Encode `canvas` for one rendition, resizing when the target differs.
pub fn encode_rendition(canvas: &RgbaImage, rendition: Rendition) -> MediaResult<EncodedImage> {
    let (width, height) = rendition.dimensions();
    let resized;
    let source = if canvas.dimensions() == (width, height) {
        canvas
    } else {
        resized = image::imageops::resize(canvas, width, height, FilterType::Lanczos3);
        &resized
    };

    let encoding = rendition.encoding();
    let bytes = encode_canvas(source, encoding)?;
    if bytes.is_empty() {
        return Err(MediaError::encode(format!("{} produced no bytes", rendition.as_str())));
    }

    Ok(EncodedImage {
        rendition,
        encoding,
        width,
        height,
        bytes,
    })
}

/// Encode every rendition, in [`Rendition::ALL`] order.
pub fn encode_all(canvas: &RgbaImage) -> MediaResult<Vec<EncodedImage>> {
    Rendition::ALL
        .iter()
        .map(|rendition| encode_rendition(canvas, *rendition))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};
    use trend_models::{POSTER_HEIGHT, POSTER_WIDTH};

    #[test]
    fn test_all_renditions_encoded() {
        let canvas = RgbaImage::from_pixel(POSTER_WIDTH, POSTER_HEIGHT, Rgba([30, 60, 90, 255]));
        let images = encode_all(&canvas).unwrap();

        assert_eq!(images.len(), 5);
        for img in &images {
            assert!(!img.bytes.is_empty());
            assert_eq!((img.width, img.height), (1080, 1920));
            let expected = match img.encoding {
                ImageEncoding::Png => ImageFormat::Png,
                ImageEncoding::Webp => ImageFormat::WebP,
                ImageEncoding::Jpeg { .. } => ImageFormat::Jpeg,
            };
            assert_eq!(image::guess_format(&img.bytes).unwrap(), expected);
        }
    }

    #[test]
    fn test_small_canvas_is_resized() {
        let canvas = RgbaImage::from_pixel(54, 96, Rgba([0, 0, 0, 255]));
        let encoded = encode_rendition(&canvas, Rendition::InstagramStory).unwrap();
        let decoded = image::load_from_memory(&encoded.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1080, 1920));
    }
}
