//! Shared overlay building blocks.
//!
//! Coordinates are fixed for the 1080x1920 story canvas. Text blocks use
//! `y` as the first baseline.

use trend_models::{
    Anchor, BadgeElement, CtaElement, FontWeight, ImageSlotElement, OverlayElement, PromotionalCopy,
    Rect, ShadeElement, TextBlockElement, TextStyle, POSTER_HEIGHT, POSTER_WIDTH,
};

pub const MARGIN: u32 = 80;
pub const BADGE_HEIGHT: u32 = 64;
pub const CTA_RECT: Rect = Rect::new(140, 1730, 800, 110);

const WHITE: &str = "#ffffff";
const MUTED: &str = "#cbd5e1";

/// Darkening gradient behind the header badges.
pub fn top_shade() -> OverlayElement {
    OverlayElement::Shade(ShadeElement {
        rect: Rect::new(0, 0, POSTER_WIDTH, 360),
        color: "#000000".into(),
        top_opacity: 0.6,
        bottom_opacity: 0.0,
    })
}

/// Darkening gradient from `y` to the bottom edge.
pub fn bottom_shade(y: u32) -> OverlayElement {
    OverlayElement::Shade(ShadeElement {
        rect: Rect::new(0, y, POSTER_WIDTH, POSTER_HEIGHT - y),
        color: "#000000".into(),
        top_opacity: 0.0,
        bottom_opacity: 0.92,
    })
}

/// Pill badge sized from its character count, clamped to the canvas.
pub fn badge(x: u32, y: u32, text: &str, fill: &str) -> OverlayElement {
    let chars = text.chars().count() as u32;
    let width = (chars * 22 + 64).clamp(120, POSTER_WIDTH - MARGIN - x.min(POSTER_WIDTH - MARGIN - 120));
    OverlayElement::Badge(BadgeElement {
        rect: Rect::new(x, y, width, BADGE_HEIGHT),
        text: text.to_uppercase(),
        fill: fill.into(),
        corner_radius: BADGE_HEIGHT / 2,
        style: TextStyle::new(30.0, WHITE).weight(FontWeight::Bold).anchor(Anchor::Middle),
    })
}

pub fn title(text: &str, y: u32, max_chars: usize, max_lines: usize) -> OverlayElement {
    OverlayElement::TextBlock(TextBlockElement {
        x: MARGIN,
        y,
        line_height: 96,
        max_chars_per_line: max_chars,
        max_lines,
        text: text.to_string(),
        style: TextStyle::new(84.0, WHITE).weight(FontWeight::Black).with_shadow(),
    })
}

/// Primary copy followed by secondary copy. Returns the two blocks.
pub fn copy_blocks(copy: &PromotionalCopy, y: u32) -> [OverlayElement; 2] {
    let primary = OverlayElement::TextBlock(TextBlockElement {
        x: MARGIN,
        y,
        line_height: 52,
        max_chars_per_line: 40,
        max_lines: 4,
        text: copy.text_primary.clone(),
        style: TextStyle::new(40.0, WHITE).weight(FontWeight::Bold).with_shadow(),
    });
    let secondary = OverlayElement::TextBlock(TextBlockElement {
        x: MARGIN,
        y: y + 4 * 52 + 24,
        line_height: 46,
        max_chars_per_line: 44,
        max_lines: 4,
        text: copy.text_secondary.clone(),
        style: TextStyle::new(36.0, MUTED),
    });
    [primary, secondary]
}

pub fn cta(text: &str, fill: &str) -> OverlayElement {
    OverlayElement::Cta(CtaElement {
        rect: CTA_RECT,
        text: text.to_string(),
        fill: fill.into(),
        corner_radius: CTA_RECT.height / 2,
        style: TextStyle::new(46.0, WHITE).weight(FontWeight::Black).anchor(Anchor::Middle),
    })
}

/// Square artwork slot with an initials tile as its fallback.
pub fn image_slot(slot: &str, rect: Rect, initials: String, fill: &str) -> OverlayElement {
    OverlayElement::ImageSlot(ImageSlotElement {
        rect,
        slot: slot.to_string(),
        corner_radius: rect.width / 5,
        fallback_initials: initials,
        fallback_fill: fill.into(),
        fallback_style: TextStyle::new(rect.height as f32 * 0.4, WHITE).weight(FontWeight::Black),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_stays_on_canvas() {
        let long = "X".repeat(200);
        for x in [MARGIN, 600, 880] {
            let OverlayElement::Badge(el) = badge(x, 100, &long, "#000") else {
                panic!("expected badge");
            };
            assert!(el.rect.x + el.rect.width <= POSTER_WIDTH);
        }
    }

    #[test]
    fn test_copy_blocks_do_not_overlap() {
        let copy = PromotionalCopy {
            text_primary: "a".into(),
            text_secondary: "b".into(),
            primary_origin: trend_models::CopyOrigin::Template,
            secondary_origin: trend_models::CopyOrigin::Template,
        };
        let [OverlayElement::TextBlock(primary), OverlayElement::TextBlock(secondary)] = copy_blocks(&copy, 1300)
        else {
            panic!("expected text blocks");
        };
        let primary_bottom = primary.y + primary.line_height * (primary.max_lines as u32 - 1);
        assert!(secondary.y > primary_bottom);
        let secondary_bottom = secondary.y + secondary.line_height * (secondary.max_lines as u32 - 1);
        assert!(secondary_bottom < CTA_RECT.y);
    }
}
