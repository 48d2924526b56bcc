//! Overlay descriptors.
//!
//! An [`OverlaySpec`] is a pure-data description of everything drawn on top
//! of the poster background: gradient scrims, badges, wrapped text blocks,
//! call-to-action blocks and image slots. Positions are fixed per category;
//! nothing here is computed from measured text metrics.

use serde::{Deserialize, Serialize};

use crate::bundle::{POSTER_HEIGHT, POSTER_WIDTH};
use crate::category::Category;

/// Axis-aligned rectangle in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> u32 {
        self.x + self.width / 2
    }

    pub fn center_y(&self) -> u32 {
        self.y + self.height / 2
    }
}

/// Horizontal text anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Regular,
    Bold,
    Black,
}

impl FontWeight {
    pub fn css_value(&self) -> u16 {
        match self {
            FontWeight::Regular => 400,
            FontWeight::Bold => 700,
            FontWeight::Black => 900,
        }
    }
}

/// Text appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: f32,
    #[serde(default)]
    pub weight: FontWeight,
    /// `#rrggbb`
    pub color: String,
    #[serde(default)]
    pub anchor: Anchor,
    /// Draw a soft drop shadow behind the glyphs
    #[serde(default)]
    pub shadow: bool,
}

impl TextStyle {
    pub fn new(font_size: f32, color: impl Into<String>) -> Self {
        Self {
            font_size,
            weight: FontWeight::Regular,
            color: color.into(),
            anchor: Anchor::Start,
            shadow: false,
        }
    }

    pub fn weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_shadow(mut self) -> Self {
        self.shadow = true;
        self
    }
}

/// Vertical gradient scrim used to keep text legible over artwork.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadeElement {
    pub rect: Rect,
    pub color: String,
    pub top_opacity: f32,
    pub bottom_opacity: f32,
}

/// Small pill with a single line of text (e.g. "TRENDING", "★ 8.7").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeElement {
    pub rect: Rect,
    pub text: String,
    pub fill: String,
    pub corner_radius: u32,
    pub style: TextStyle,
}

/// Greedy-wrapped multi-line text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlockElement {
    /// Anchor point of the first baseline
    pub x: u32,
    pub y: u32,
    pub line_height: u32,
    pub max_chars_per_line: usize,
    pub max_lines: usize,
    pub text: String,
    pub style: TextStyle,
}

/// Call-to-action button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CtaElement {
    pub rect: Rect,
    pub text: String,
    pub fill: String,
    pub corner_radius: u32,
    pub style: TextStyle,
}

/// Placeholder for a named raster (icon, team logo) supplied at render time.
///
/// When no raster is supplied for `slot`, the renderer draws a rounded tile
/// with `fallback_initials` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSlotElement {
    pub rect: Rect,
    pub slot: String,
    pub corner_radius: u32,
    pub fallback_initials: String,
    pub fallback_fill: String,
    pub fallback_style: TextStyle,
}

/// One typed overlay element. Elements are drawn in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayElement {
    Shade(ShadeElement),
    Badge(BadgeElement),
    TextBlock(TextBlockElement),
    Cta(CtaElement),
    ImageSlot(ImageSlotElement),
}

/// Category-specific structured description of the poster overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpec {
    pub category: Category,
    pub width: u32,
    pub height: u32,
    pub elements: Vec<OverlayElement>,
}

impl OverlaySpec {
    /// Empty spec on the standard story canvas.
    pub fn new(category: Category) -> Self {
        Self {
            category,
            width: POSTER_WIDTH,
            height: POSTER_HEIGHT,
            elements: Vec::new(),
        }
    }

    pub fn push(mut self, element: OverlayElement) -> Self {
        self.elements.push(element);
        self
    }

    /// Image slots referenced by this spec.
    pub fn image_slots(&self) -> impl Iterator<Item = &ImageSlotElement> {
        self.elements.iter().filter_map(|element| match element {
            OverlayElement::ImageSlot(slot) => Some(slot),
            _ => None,
        })
    }

    /// Reduced layout used when the full overlay fails to render:
    /// scrims and text blocks only.
    pub fn simplified(&self) -> Self {
        Self {
            category: self.category,
            width: self.width,
            height: self.height,
            elements: self
                .elements
                .iter()
                .filter(|element| {
                    matches!(
                        element,
                        OverlayElement::Shade(_) | OverlayElement::TextBlock(_)
                    )
                })
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OverlaySpec {
        OverlaySpec::new(Category::Gaming)
            .push(OverlayElement::Shade(ShadeElement {
                rect: Rect::new(0, 1100, 1080, 820),
                color: "#000000".into(),
                top_opacity: 0.0,
                bottom_opacity: 0.85,
            }))
            .push(OverlayElement::ImageSlot(ImageSlotElement {
                rect: Rect::new(80, 1180, 200, 200),
                slot: "icon".into(),
                corner_radius: 40,
                fallback_initials: "MC".into(),
                fallback_fill: "#334155".into(),
                fallback_style: TextStyle::new(88.0, "#ffffff"),
            }))
            .push(OverlayElement::TextBlock(TextBlockElement {
                x: 80,
                y: 1450,
                line_height: 70,
                max_chars_per_line: 22,
                max_lines: 2,
                text: "Minecraft".into(),
                style: TextStyle::new(64.0, "#ffffff").weight(FontWeight::Black),
            }))
    }

    #[test]
    fn test_image_slots() {
        let spec = sample();
        let slots: Vec<_> = spec.image_slots().map(|s| s.slot.as_str()).collect();
        assert_eq!(slots, vec!["icon"]);
    }

    #[test]
    fn test_simplified_drops_slots() {
        let spec = sample().simplified();
        assert_eq!(spec.elements.len(), 2);
        assert_eq!(spec.image_slots().count(), 0);
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["elements"][1]["type"], "image_slot");
        assert_eq!(json["width"], 1080);
    }
}
