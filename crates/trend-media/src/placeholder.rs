//! Synthetic placeholder backgrounds.
//!
//! Used when every acquisition path for a candidate's imagery fails. The
//! output depends only on the category and title.

use std::fmt::Write as _;

use trend_models::{initials_of, Category};

use crate::error::MediaResult;
use crate::raster::RasterAsset;
use crate::svg::{escape_xml, rasterize, FontDb};
use crate::wrap::wrap_text;

/// Gradient color pair (top-left, bottom-right) for a category.
pub fn category_palette(category: Category) -> (&'static str, &'static str) {
    match category {
        Category::Movies => ("#1e1b4b", "#b91c1c"),
        Category::TvShows => ("#0f172a", "#7c3aed"),
        Category::Sports => ("#052e16", "#16a34a"),
        Category::Recipes => ("#7c2d12", "#f59e0b"),
        Category::Gaming => ("#1e1b4b", "#db2777"),
        Category::Apps => ("#0c4a6e", "#06b6d4"),
        Category::TvChannels => ("#111827", "#2563eb"),
    }
}

/// SVG document for a placeholder of `width`x`height`.
pub fn placeholder_svg(category: Category, title: &str, width: u32, height: u32) -> String {
    let (from, to) = category_palette(category);
    let cx = width / 2;
    let mut svg = String::with_capacity(1024);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><defs><linearGradient id="bg" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="{from}"/><stop offset="1" stop-color="{to}"/></linearGradient></defs><rect x="0" y="0" width="{width}" height="{height}" fill="url(#bg)"/>"#,
    );
    let _ = write!(
        svg,
        r##"<text x="{cx}" y="{}" font-family="sans-serif" font-size="{}" font-weight="900" text-anchor="middle" fill="#ffffff" fill-opacity="0.85">{}</text>"##,
        height * 2 / 5,
        width / 3,
        escape_xml(&initials_of(title)),
    );
    for (i, line) in wrap_text(title, 18, 3).iter().enumerate() {
        let _ = write!(
            svg,
            r##"<text x="{cx}" y="{}" font-family="sans-serif" font-size="{}" font-weight="700" text-anchor="middle" fill="#ffffff">{}</text>"##,
            height / 2 + (i as u32 + 1) * (width / 12),
            width / 15,
            escape_xml(line),
        );
    }
    svg.push_str("</svg>");
    svg
}

/// Render a placeholder bitmap.
pub fn render_placeholder(
    fontdb: &FontDb,
    category: Category,
    title: &str,
    width: u32,
    height: u32,
) -> MediaResult<RasterAsset> {
    let svg = placeholder_svg(category, title, width, height);
    let image = rasterize(&svg, fontdb, width, height, None)?;
    Ok(RasterAsset::synthesized(image))
}
