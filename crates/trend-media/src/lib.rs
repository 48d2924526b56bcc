//! Poster media operations.
//!
//! This crate provides:
//! - Asset fetching with payload sniffing and ordered URL variants
//! - Canonical raster decoding
//! - Placeholder synthesis
//! - Greedy character-count text wrapping
//! - Overlay rendering onto a fixed story canvas
//! - Encoding into every platform rendition

pub mod compose;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod placeholder;
pub mod raster;
pub mod svg;
pub mod variants;
pub mod wrap;

pub use compose::{fit_background, Compositor, Rendered};
pub use encode::{encode_all, encode_rendition};
pub use error::{MediaError, MediaResult};
pub use fetch::{sniff_payload, AcquirePolicy, AssetFetcher};
pub use placeholder::category_palette;
pub use raster::RasterAsset;
pub use variants::{expand, UrlRewrite, ITUNES_ICON_REWRITES, ITUNES_SCREENSHOT_REWRITES, TMDB_POSTER_REWRITES};
pub use wrap::wrap_text;
