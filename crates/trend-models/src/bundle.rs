//! Poster bundle: the full output of one pipeline run.

use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;
use crate::category::Category;
use crate::copy::PromotionalCopy;

/// Canvas width of a vertical story poster.
pub const POSTER_WIDTH: u32 = 1080;

/// Canvas height of a vertical story poster.
pub const POSTER_HEIGHT: u32 = 1920;

/// Container format of an encoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEncoding {
    Png,
    /// Lossless WebP
    Webp,
    Jpeg { quality: u8 },
}

impl ImageEncoding {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "png",
            ImageEncoding::Webp => "webp",
            ImageEncoding::Jpeg { .. } => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "image/png",
            ImageEncoding::Webp => "image/webp",
            ImageEncoding::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// The five encodings every bundle carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rendition {
    CanonicalPng,
    CanonicalWebp,
    InstagramStory,
    FacebookStory,
    Tiktok,
}

impl Rendition {
    pub const ALL: [Rendition; 5] = [
        Rendition::CanonicalPng,
        Rendition::CanonicalWebp,
        Rendition::InstagramStory,
        Rendition::FacebookStory,
        Rendition::Tiktok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rendition::CanonicalPng => "canonical",
            Rendition::CanonicalWebp => "canonical_webp",
            Rendition::InstagramStory => "instagram_story",
            Rendition::FacebookStory => "facebook_story",
            Rendition::Tiktok => "tiktok",
        }
    }

    pub fn encoding(&self) -> ImageEncoding {
        match self {
            Rendition::CanonicalPng => ImageEncoding::Png,
            Rendition::CanonicalWebp => ImageEncoding::Webp,
            Rendition::InstagramStory => ImageEncoding::Jpeg { quality: 90 },
            Rendition::FacebookStory => ImageEncoding::Jpeg { quality: 85 },
            Rendition::Tiktok => ImageEncoding::Png,
        }
    }

    /// Target dimensions. All platforms currently share the story canvas.
    pub fn dimensions(&self) -> (u32, u32) {
        (POSTER_WIDTH, POSTER_HEIGHT)
    }
}

/// One encoded poster image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedImage {
    pub rendition: Rendition,
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Everything produced by one `generate_poster` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosterBundle {
    pub category: Category,
    pub candidate: Candidate,
    pub copy: PromotionalCopy,
    pub images: Vec<EncodedImage>,
    /// True when the background was synthesized rather than fetched
    pub placeholder_background: bool,
}

impl PosterBundle {
    pub fn image(&self, rendition: Rendition) -> Option<&EncodedImage> {
        self.images.iter().find(|image| image.rendition == rendition)
    }

    /// Exactly one non-empty image per rendition, each at its target size.
    pub fn is_complete(&self) -> bool {
        self.images.len() == Rendition::ALL.len()
            && Rendition::ALL.iter().all(|rendition| {
                self.image(*rendition).is_some_and(|image| {
                    !image.bytes.is_empty()
                        && (image.width, image.height) == rendition.dimensions()
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::SourceType;
    use crate::copy::CopyOrigin;

    fn bundle(images: Vec<EncodedImage>) -> PosterBundle {
        PosterBundle {
            category: Category::Movies,
            candidate: Candidate::new(SourceType::Tmdb, "603", "The Matrix"),
            copy: PromotionalCopy {
                text_primary: "The Matrix".into(),
                text_secondary: "The Matrix".into(),
                primary_origin: CopyOrigin::Template,
                secondary_origin: CopyOrigin::Template,
            },
            images,
            placeholder_background: false,
        }
    }

    fn image(rendition: Rendition, bytes: Vec<u8>) -> EncodedImage {
        EncodedImage {
            rendition,
            encoding: rendition.encoding(),
            width: POSTER_WIDTH,
            height: POSTER_HEIGHT,
            bytes,
        }
    }

    #[test]
    fn test_complete_bundle() {
        let images = Rendition::ALL.iter().map(|r| image(*r, vec![1])).collect();
        assert!(bundle(images).is_complete());
    }

    #[test]
    fn test_incomplete_bundle_with_empty_buffer() {
        let mut images: Vec<_> = Rendition::ALL.iter().map(|r| image(*r, vec![1])).collect();
        images[3].bytes.clear();
        assert!(!bundle(images).is_complete());
    }

    #[test]
    fn test_rendition_content_types() {
        assert_eq!(Rendition::InstagramStory.encoding().content_type(), "image/jpeg");
        assert_eq!(Rendition::CanonicalWebp.encoding().extension(), "webp");
    }
}
