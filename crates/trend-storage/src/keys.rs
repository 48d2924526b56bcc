//! Object key layout for published posters.
//!
//! `posters/{category}/{yyyy-mm-dd}/{source}-{id}/{rendition}.{ext}`

use chrono::NaiveDate;
use trend_models::{EncodedImage, PosterBundle};

use crate::publisher::UploadOptions;

/// Replace anything outside `[a-z0-9._-]` so provider ids cannot inject path segments.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '-',
        })
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '-');
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Directory holding every rendition of one bundle.
pub fn bundle_prefix(bundle: &PosterBundle, date: NaiveDate) -> String {
    format!(
        "posters/{}/{}/{}-{}",
        bundle.category.as_str(),
        date.format("%Y-%m-%d"),
        bundle.candidate.source_type.as_str(),
        sanitize_segment(&bundle.candidate.id),
    )
}

/// Key of one rendition under `prefix`.
pub fn rendition_key(prefix: &str, image: &EncodedImage) -> String {
    format!("{}/{}.{}", prefix, image.rendition.as_str(), image.encoding.extension())
}

/// Upload options for one rendition of `bundle`.
pub fn upload_options(bundle: &PosterBundle, image: &EncodedImage) -> UploadOptions {
    // S3 user metadata must be ASCII.
    let title: String = bundle
        .candidate
        .title
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '?' })
        .collect();

    UploadOptions::new(image.encoding.content_type())
        .with_metadata("category", bundle.category.as_str())
        .with_metadata("title", title)
        .with_metadata("source", bundle.candidate.source_type.as_str())
        .with_metadata("candidate-id", bundle.candidate.id.clone())
        .with_metadata("rendition", image.rendition.as_str())
}
