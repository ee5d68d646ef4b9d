use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The closed set of collection styles a user can forge into.
///
/// Every per-style table (`label`, `keywords`, `icon`) is an exhaustive match,
/// so adding a variant fails to compile until each table covers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleOption {
    #[default]
    BoredApe,
    CartoonCreature,
    CuteAnimal,
    PixelArt,
}

impl StyleOption {
    /// Selector order.
    pub const ALL: [StyleOption; 4] = [
        StyleOption::BoredApe,
        StyleOption::CartoonCreature,
        StyleOption::CuteAnimal,
        StyleOption::PixelArt,
    ];

    pub fn label(self) -> &'static str {
        match self {
            StyleOption::BoredApe => "Bored Ape Yacht Club Style",
            StyleOption::CartoonCreature => "Vibrant Cartoon Creature",
            StyleOption::CuteAnimal => "Minimalist Chibi Penguin",
            StyleOption::PixelArt => "Retro 8-Bit Pixel Punk",
        }
    }

    pub fn short_label(self) -> &'static str {
        self.label().split(' ').next().unwrap_or_default()
    }

    pub fn slug(self) -> &'static str {
        match self {
            StyleOption::BoredApe => "bored_ape",
            StyleOption::CartoonCreature => "cartoon_creature",
            StyleOption::CuteAnimal => "cute_animal",
            StyleOption::PixelArt => "pixel_art",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            StyleOption::BoredApe => "😜",
            StyleOption::CartoonCreature => "🐉",
            StyleOption::CuteAnimal => "🐧",
            StyleOption::PixelArt => "▦",
        }
    }

    pub fn keywords(self) -> &'static str {
        match self {
            StyleOption::BoredApe => "Bored Ape Yacht Club style, centered cartoon ape portrait, clean vector lines, flat vibrant background, characteristic NFT mouth and eyes expression, streetwear accessories.",
            StyleOption::CartoonCreature => "Clean cartoonish monster/lizard style, thick bold outlines, flat colors, white t-shirt, gold chain accessory, vibrant background, simplistic character design.",
            StyleOption::CuteAnimal => "Cute penguin/animal character, minimalist rounded shapes, wearing sunglasses and headgear, solid pastel background, simple heart detail on body, clean digital illustration.",
            StyleOption::PixelArt => "Retro 8-bit pixel art character, side-profile or front-facing, blocky aesthetic, solid blue background, high-contrast pixels, simple clothing.",
        }
    }

    /// 1-based position in the selector.
    pub fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|style| *style == self)
            .map(|idx| idx + 1)
            .unwrap_or(1)
    }
}

impl fmt::Display for StyleOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StyleOption {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        if normalized.is_empty() {
            return Err("style name is empty".to_string());
        }
        if let Ok(position) = normalized.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|idx| Self::ALL.get(idx).copied())
                .ok_or_else(|| {
                    format!("style position {position} out of range (1-{})", Self::ALL.len())
                });
        }
        Self::ALL
            .into_iter()
            .find(|style| {
                style.slug() == normalized
                    || style.slug().split('_').next() == Some(normalized.as_str())
                    || style.short_label().to_ascii_lowercase() == normalized
                    || style.label().to_ascii_lowercase().replace([' ', '-'], "_") == normalized
            })
            .ok_or_else(|| {
                let known = Self::ALL
                    .iter()
                    .map(|style| style.slug())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("unknown style '{}' (expected one of: {known})", raw.trim())
            })
    }
}
