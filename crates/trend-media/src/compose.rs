//! Poster compositor.
//!
//! Rendering order: background (center-crop fill, flattened to opaque),
//! image slots, then the overlay SVG.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbaImage};
use tracing::{debug, warn};
use trend_models::{Category, OverlayElement, OverlaySpec, Rect};

use crate::error::{MediaError, MediaResult};
use crate::placeholder::render_placeholder;
use crate::raster::RasterAsset;
use crate::svg::{load_fonts, overlay_svg, rasterize, FontDb};

/// Result of [`Compositor::render_with_fallback`].
#[derive(Debug)]
pub struct Rendered {
    pub image: RgbaImage,
    /// True when the full overlay failed and the simplified layout was used
    pub simplified: bool,
}

/// Renders posters from a background bitmap and an [`OverlaySpec`].
///
/// Holds the font database; build one per process and share it.
#[derive(Clone)]
pub struct Compositor {
    fontdb: FontDb,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    /// Compositor using system fonts.
    pub fn new() -> Self {
        Self::with_fontdb(load_fonts(None))
    }

    /// Compositor using system fonts plus every font file in `dir`.
    pub fn with_font_dir(dir: &Path) -> Self {
        Self::with_fontdb(load_fonts(Some(dir)))
    }

    pub fn with_fontdb(fontdb: FontDb) -> Self {
        Self { fontdb }
    }

    pub fn font_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Synthesize a placeholder background for `title`.
    pub fn placeholder(&self, category: Category, title: &str, width: u32, height: u32) -> MediaResult<RasterAsset> {
        render_placeholder(&self.fontdb, category, title, width, height)
    }

    /// Render `spec` over `background`. Slot rasters are looked up by slot name.
    pub fn render(
        &self,
        background: &RgbaImage,
        spec: &OverlaySpec,
        slots: &HashMap<String, RgbaImage>,
    ) -> MediaResult<RgbaImage> {
        validate(spec)?;

        let mut canvas = fit_background(background, spec.width, spec.height);

        let mut filled: HashSet<&str> = HashSet::new();
        for slot in spec.image_slots() {
            if let Some(raster) = slots.get(&slot.slot) {
                blit(&mut canvas, raster, &slot.rect, slot.corner_radius);
                filled.insert(slot.slot.as_str());
            }
        }

        let svg = overlay_svg(spec, &filled);
        debug!(category = %spec.category, elements = spec.elements.len(), svg_len = svg.len(), "Rendering overlay");
        rasterize(&svg, &self.fontdb, spec.width, spec.height, Some(canvas))
    }

    /// Render `spec`, retrying once with [`OverlaySpec::simplified`] on a
    /// composition failure.
    pub fn render_with_fallback(
        &self,
        background: &RgbaImage,
        spec: &OverlaySpec,
        slots: &HashMap<String, RgbaImage>,
    ) -> MediaResult<Rendered> {
        match self.render(background, spec, slots) {
            Ok(image) => Ok(Rendered {
                image,
                simplified: false,
            }),
            Err(e) if e.is_composition_failure() => {
                warn!(category = %spec.category, "Full overlay failed, using simplified layout: {}", e);
                let image = self.render(background, &spec.simplified(), &HashMap::new())?;
                Ok(Rendered {
                    image,
                    simplified: true,
                })
            }
            Err(e) => Err(e),
        }
    }
}

fn within(rect: &Rect, width: u32, height: u32) -> bool {
    rect.width > 0
        && rect.height > 0
        && rect.x.checked_add(rect.width).is_some_and(|r| r <= width)
        && rect.y.checked_add(rect.height).is_some_and(|b| b <= height)
}

/// Reject specs whose fixed geometry does not fit the canvas.
fn validate(spec: &OverlaySpec) -> MediaResult<()> {
    if spec.width == 0 || spec.height == 0 {
        return Err(MediaError::composition_failed("zero-sized canvas"));
    }

    for (index, element) in spec.elements.iter().enumerate() {
        let rect = match element {
            OverlayElement::Shade(el) => Some(&el.rect),
            OverlayElement::Badge(el) => Some(&el.rect),
            OverlayElement::Cta(el) => Some(&el.rect),
            OverlayElement::ImageSlot(el) => Some(&el.rect),
            OverlayElement::TextBlock(el) => {
                if el.x >= spec.width || el.y >= spec.height {
                    return Err(MediaError::composition_failed(format!(
                        "text block {index} anchored outside canvas"
                    )));
                }
                None
            }
        };
        if let Some(rect) = rect {
            if !within(rect, spec.width, spec.height) {
                return Err(MediaError::composition_failed(format!(
                    "element {index} at {rect:?} exceeds {}x{} canvas",
                    spec.width, spec.height
                )));
            }
        }
    }
    Ok(())
}

/// Center-crop `background` to `width`x`height` and drop any transparency.
pub fn fit_background(background: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let mut canvas = if background.dimensions() == (width, height) {
        background.clone()
    } else {
        DynamicImage::ImageRgba8(background.clone())
            .resize_to_fill(width, height, FilterType::Lanczos3)
            .to_rgba8()
    };

    for pixel in canvas.pixels_mut() {
        let alpha = pixel.0[3] as u16;
        if alpha < 255 {
            for channel in &mut pixel.0[..3] {
                *channel = (*channel as u16 * alpha / 255) as u8;
            }
            pixel.0[3] = 255;
        }
    }
    canvas
}

/// Clear pixels outside a rounded-rectangle mask.
fn round_corners(image: &mut RgbaImage, radius: u32) {
    let (w, h) = image.dimensions();
    let r = radius.min(w / 2).min(h / 2);
    if r == 0 {
        return;
    }
    let rf = r as f32;
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        let cx = if x < r {
            rf
        } else if x >= w - r {
            (w - r) as f32
        } else {
            continue;
        };
        let cy = if y < r {
            rf
        } else if y >= h - r {
            (h - r) as f32
        } else {
            continue;
        };
        let dx = x as f32 + 0.5 - cx;
        let dy = y as f32 + 0.5 - cy;
        if dx * dx + dy * dy > rf * rf {
            pixel.0[3] = 0;
        }
    }
}

fn blit(canvas: &mut RgbaImage, raster: &RgbaImage, rect: &Rect, radius: u32) {
    let mut tile = DynamicImage::ImageRgba8(raster.clone())
        .resize_to_fill(rect.width, rect.height, FilterType::Lanczos3)
        .to_rgba8();
    round_corners(&mut tile, radius);
    imageops::overlay(canvas, &tile, rect.x as i64, rect.y as i64);
}
