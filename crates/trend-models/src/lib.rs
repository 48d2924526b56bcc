//! Shared data models for the trending poster pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Content categories
//! - Trending candidates and their identity
//! - Bilingual promotional copy
//! - Overlay descriptors consumed by the compositor
//! - Poster bundles and their encoded renditions

pub mod bundle;
pub mod candidate;
pub mod category;
pub mod copy;
pub mod overlay;

// Re-export common types
pub use bundle::{EncodedImage, ImageEncoding, PosterBundle, Rendition, POSTER_HEIGHT, POSTER_WIDTH};
pub use candidate::{initials_of, Candidate, CandidateKey, CandidateMetadata, Fixture, SourceType};
pub use category::{Category, CategoryParseError};
pub use copy::{CopyLanguage, CopyOrigin, PromotionalCopy};
pub use overlay::{
    Anchor, BadgeElement, CtaElement, FontWeight, ImageSlotElement, OverlayElement, OverlaySpec,
    Rect, ShadeElement, TextBlockElement, TextStyle,
};
