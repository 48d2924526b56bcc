//! Canonical decoded bitmaps.

use image::{ImageFormat, RgbaImage};

use crate::error::{MediaError, MediaResult};

/// Raster formats the fetcher will decode.
pub fn is_accepted_format(format: ImageFormat) -> bool {
    match format {
        ImageFormat::Png
        | ImageFormat::Jpeg
        | ImageFormat::WebP
        | ImageFormat::Gif
        | ImageFormat::Tiff => true,
        ImageFormat::Avif => cfg!(feature = "avif"),
        _ => false,
    }
}

/// A decoded bitmap held for the duration of one pipeline run.
#[derive(Debug, Clone)]
pub struct RasterAsset {
    /// Canonical RGBA8 pixels
    pub image: RgbaImage,
    /// Size of the payload the bitmap was decoded from (0 when synthesized)
    pub byte_len: usize,
    pub format: Option<ImageFormat>,
    /// URL the payload came from, `None` for synthesized bitmaps
    pub source: Option<String>,
}

impl RasterAsset {
    /// Wrap a bitmap rendered in-process.
    pub fn synthesized(image: RgbaImage) -> Self {
        Self {
            image,
            byte_len: 0,
            format: None,
            source: None,
        }
    }

    /// Decode `bytes` into the canonical representation.
    ///
    /// Callers are expected to have sniffed the payload already; this only
    /// refuses formats outside [`is_accepted_format`].
    pub fn decode(bytes: &[u8], source: Option<&str>) -> MediaResult<Self> {
        let format = image::guess_format(bytes)
            .map_err(|_| MediaError::unsupported("unrecognized image signature"))?;
        if !is_accepted_format(format) {
            return Err(MediaError::unsupported(format!("{format:?} is not accepted")));
        }

        let decoded = image::load_from_memory_with_format(bytes, format)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(MediaError::Decode("image has zero dimensions".into()));
        }

        Ok(Self {
            image: decoded.to_rgba8(),
            byte_len: bytes.len(),
            format: Some(format),
            source: source.map(str::to_string),
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn is_synthesized(&self) -> bool {
        self.source.is_none()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba, RgbaImage};

    /// Encode a solid-color image in `format`.
    pub fn encoded(width: u32, height: u32, color: [u8; 4], format: ImageFormat) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut buf = Cursor::new(Vec::new());
        match format {
            ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(img)
                .to_rgb8()
                .write_to(&mut buf, format)
                .unwrap(),
            _ => img.write_to(&mut buf, format).unwrap(),
        }
        buf.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::encoded;
    use super::*;

    #[test]
    fn test_decode_png() {
        let bytes = encoded(4, 3, [10, 20, 30, 255], ImageFormat::Png);
        let asset = RasterAsset::decode(&bytes, Some("https://a.test/x.png")).unwrap();
        assert_eq!((asset.width(), asset.height()), (4, 3));
        assert_eq!(asset.byte_len, bytes.len());
        assert_eq!(asset.image.get_pixel(0, 0).0, [10, 20, 30, 255]);
        assert!(!asset.is_synthesized());
    }

    #[test]
    fn test_decode_jpeg() {
        let bytes = encoded(8, 8, [200, 10, 10, 255], ImageFormat::Jpeg);
        let asset = RasterAsset::decode(&bytes, None).unwrap();
        assert_eq!(asset.format, Some(ImageFormat::Jpeg));
    }

    #[test]
    fn test_garbage_is_unsupported() {
        let err = RasterAsset::decode(b"definitely not an image", None).unwrap_err();
        assert!(err.is_unsupported());
    }
}
