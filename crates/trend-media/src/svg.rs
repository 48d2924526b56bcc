//! Overlay SVG generation and rasterization.
//!
//! Each [`OverlayElement`] maps to a fixed SVG fragment. Text is wrapped by
//! character count before emission, so the document never depends on
//! measured glyph metrics.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::Arc;

use image::RgbaImage;
use resvg::tiny_skia::{IntSize, Pixmap, Transform};
use trend_models::{
    Anchor, BadgeElement, CtaElement, ImageSlotElement, OverlayElement, OverlaySpec, ShadeElement,
    TextBlockElement, TextStyle,
};

use crate::error::{MediaError, MediaResult};
use crate::wrap::wrap_text;

/// Font stack used for every text node.
const FONT_FAMILY: &str = "Inter, Helvetica, Arial, sans-serif";

pub type FontDb = Arc<usvg::fontdb::Database>;

/// Escape text for use in SVG character data and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}

fn anchor_attr(anchor: Anchor) -> &'static str {
    match anchor {
        Anchor::Start => "start",
        Anchor::Middle => "middle",
        Anchor::End => "end",
    }
}

/// Baseline that visually centers a single line inside a box.
fn centered_baseline(center_y: u32, font_size: f32) -> f32 {
    center_y as f32 + font_size * 0.35
}

fn text_node(out: &mut String, x: f32, y: f32, text: &str, style: &TextStyle) {
    let text = escape_xml(text);
    let attrs = format!(
        r#"font-family="{FONT_FAMILY}" font-size="{}" font-weight="{}" text-anchor="{}""#,
        style.font_size,
        style.weight.css_value(),
        anchor_attr(style.anchor),
    );
    if style.shadow {
        let offset = (style.font_size / 24.0).max(2.0);
        let _ = write!(
            out,
            r##"<text x="{}" y="{}" {attrs} fill="#000000" fill-opacity="0.45">{text}</text>"##,
            x + offset,
            y + offset,
        );
    }
    let _ = write!(
        out,
        r#"<text x="{x}" y="{y}" {attrs} fill="{}">{text}</text>"#,
        escape_xml(&style.color),
    );
}

fn shade(out: &mut String, index: usize, el: &ShadeElement) {
    let color = escape_xml(&el.color);
    let _ = write!(
        out,
        r#"<defs><linearGradient id="shade{index}" x1="0" y1="0" x2="0" y2="1"><stop offset="0" stop-color="{color}" stop-opacity="{}"/><stop offset="1" stop-color="{color}" stop-opacity="{}"/></linearGradient></defs>"#,
        el.top_opacity.clamp(0.0, 1.0),
        el.bottom_opacity.clamp(0.0, 1.0),
    );
    let _ = write!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="url(#shade{index})"/>"#,
        el.rect.x, el.rect.y, el.rect.width, el.rect.height,
    );
}

fn pill(out: &mut String, rect: &trend_models::Rect, fill: &str, radius: u32, text: &str, style: &TextStyle) {
    let _ = write!(
        out,
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{radius}" fill="{}"/>"#,
        rect.x,
        rect.y,
        rect.width,
        rect.height,
        escape_xml(fill),
    );
    let x = match style.anchor {
        Anchor::Start => rect.x as f32 + radius as f32,
        Anchor::Middle => rect.center_x() as f32,
        Anchor::End => (rect.x + rect.width) as f32 - radius as f32,
    };
    text_node(out, x, centered_baseline(rect.center_y(), style.font_size), text, style);
}

fn badge(out: &mut String, el: &BadgeElement) {
    pill(out, &el.rect, &el.fill, el.corner_radius, &el.text, &el.style);
}

fn cta(out: &mut String, el: &CtaElement) {
    pill(out, &el.rect, &el.fill, el.corner_radius, &el.text, &el.style);
}

fn text_block(out: &mut String, el: &TextBlockElement) {
    for (i, line) in wrap_text(&el.text, el.max_chars_per_line, el.max_lines)
        .iter()
        .enumerate()
    {
        let y = el.y + el.line_height * i as u32;
        text_node(out, el.x as f32, y as f32, line, &el.style);
    }
}

fn image_slot(out: &mut String, el: &ImageSlotElement, filled: bool) {
    if filled {
        return;
    }
    let style = TextStyle {
        anchor: Anchor::Middle,
        ..el.fallback_style.clone()
    };
    pill(out, &el.rect, &el.fallback_fill, el.corner_radius, &el.fallback_initials, &style);
}

/// Build the overlay SVG document for `spec`.
///
/// Slots named in `filled_slots` are left empty so a raster can be blitted
/// underneath; every other slot gets an initials tile.
pub fn overlay_svg(spec: &OverlaySpec, filled_slots: &HashSet<&str>) -> String {
    let mut out = String::with_capacity(4096);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = spec.width,
        h = spec.height,
    );

    for (index, element) in spec.elements.iter().enumerate() {
        match element {
            OverlayElement::Shade(el) => shade(&mut out, index, el),
            OverlayElement::Badge(el) => badge(&mut out, el),
            OverlayElement::TextBlock(el) => text_block(&mut out, el),
            OverlayElement::Cta(el) => cta(&mut out, el),
            OverlayElement::ImageSlot(el) => image_slot(&mut out, el, filled_slots.contains(el.slot.as_str())),
        }
    }

    out.push_str("</svg>");
    out
}

/// Build a font database with system fonts plus any fonts in `extra_dir`.
pub fn load_fonts(extra_dir: Option<&std::path::Path>) -> FontDb {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    if let Some(dir) = extra_dir {
        db.load_fonts_dir(dir);
    }
    Arc::new(db)
}

/// Requested families, then sans-serif, then the first loaded face.
fn font_resolver() -> usvg::FontResolver<'static> {
    use usvg::fontdb::{Family, Query, Stretch, Style, Weight};

    usvg::FontResolver {
        select_font: Box::new(|font, db| {
            let mut families: Vec<Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => Family::Serif,
                    usvg::FontFamily::SansSerif => Family::SansSerif,
                    usvg::FontFamily::Cursive => Family::Cursive,
                    usvg::FontFamily::Fantasy => Family::Fantasy,
                    usvg::FontFamily::Monospace => Family::Monospace,
                    usvg::FontFamily::Named(name) => Family::Name(name),
                })
                .collect();
            families.push(Family::SansSerif);

            let style = match font.style() {
                usvg::FontStyle::Normal => Style::Normal,
                usvg::FontStyle::Italic => Style::Italic,
                usvg::FontStyle::Oblique => Style::Oblique,
            };
            let query = Query {
                families: &families,
                weight: Weight(font.weight()),
                stretch: Stretch::Normal,
                style,
            };
            db.query(&query).or_else(|| db.faces().next().map(|face| face.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

/// Rasterize `svg` on top of `canvas` (or a transparent canvas).
///
/// `canvas` must be opaque, so premultiplied and straight alpha coincide.
pub fn rasterize(svg: &str, fontdb: &FontDb, width: u32, height: u32, canvas: Option<RgbaImage>) -> MediaResult<RgbaImage> {
    let opts = usvg::Options {
        fontdb: fontdb.clone(),
        font_resolver: font_resolver(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| MediaError::composition_failed(format!("parse overlay svg: {e}")))?;

    let mut pixmap = match canvas {
        Some(canvas) => {
            if canvas.dimensions() != (width, height) {
                return Err(MediaError::composition_failed("canvas size mismatch"));
            }
            let size = IntSize::from_wh(width, height)
                .ok_or_else(|| MediaError::composition_failed("zero-sized canvas"))?;
            Pixmap::from_vec(canvas.into_raw(), size)
        }
        None => Pixmap::new(width, height),
    }
    .ok_or_else(|| MediaError::composition_failed(format!("cannot allocate {width}x{height} pixmap")))?;

    resvg::render(&tree, Transform::identity(), &mut pixmap.as_mut());

    RgbaImage::from_raw(width, height, pixmap.take())
        .ok_or_else(|| MediaError::composition_failed("pixmap buffer size mismatch"))
}
