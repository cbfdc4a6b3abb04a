//! Display colours for category badges and chart segments.
//!
//! Well-known categories use hand-picked hues, every other category gets a
//! hue derived from a SHA-256 digest of its name, so the same name is always
//! drawn in the same colour in the table, the chart and across restarts.

use std::{collections::HashMap, fmt::Display};

use sha2::{Digest, Sha256};

/// The colour scheme the page is rendered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    /// Dark text on light backgrounds.
    #[default]
    Light,
    /// Light text on dark backgrounds.
    Dark,
}

impl Theme {
    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// A colour in the HSL colour space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsl {
    /// Hue in degrees, 0 to 359.
    pub hue: u16,
    /// Saturation percentage.
    pub saturation: u8,
    /// Lightness percentage.
    pub lightness: u8,
}

impl Hsl {
    const fn new(hue: u16, saturation: u8, lightness: u8) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }
}

impl Display for Hsl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

/// A background and foreground pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPair {
    /// Fill colour.
    pub background: Hsl,
    /// Text colour drawn on top of `background`.
    pub foreground: Hsl,
}

impl ColorPair {
    /// An inline CSS declaration for a badge.
    pub fn css(&self) -> String {
        format!(
            "background-color: {}; color: {};",
            self.background, self.foreground
        )
    }
}

/// The colours for one category in both themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryColor {
    /// Used with [Theme::Light].
    pub light: ColorPair,
    /// Used with [Theme::Dark].
    pub dark: ColorPair,
}

impl CategoryColor {
    /// Build the light and dark variants around a single hue.
    ///
    /// The saturation and lightness bands are fixed per theme so that the
    /// text always contrasts with its background.
    pub fn from_hue(hue: u16) -> Self {
        let hue = hue % 360;

        Self {
            light: ColorPair {
                background: Hsl::new(hue, 70, 90),
                foreground: Hsl::new(hue, 60, 25),
            },
            dark: ColorPair {
                background: Hsl::new(hue, 45, 25),
                foreground: Hsl::new(hue, 70, 85),
            },
        }
    }

    fn gray() -> Self {
        Self {
            light: ColorPair {
                background: Hsl::new(220, 14, 96),
                foreground: Hsl::new(215, 28, 17),
            },
            dark: ColorPair {
                background: Hsl::new(217, 19, 27),
                foreground: Hsl::new(216, 12, 84),
            },
        }
    }

    /// The colour pair for `theme`.
    pub fn for_theme(&self, theme: Theme) -> ColorPair {
        match theme {
            Theme::Light => self.light,
            Theme::Dark => self.dark,
        }
    }
}

/// Hues for the categories the categorizer commonly produces.
const CURATED_HUES: [(&str, u16); 8] = [
    ("AI Services", 271),
    ("Cloud Services", 217),
    ("Entertainment", 330),
    ("Health & Fitness", 142),
    ("Fitness", 142),
    ("Transportation", 48),
    ("Parking", 25),
    ("Income", 160),
];

/// The curated colour for `category`, if it has one.
pub fn curated_color(category: &str) -> Option<CategoryColor> {
    if category == crate::transaction::UNCATEGORIZED {
        return Some(CategoryColor::gray());
    }

    CURATED_HUES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, hue)| CategoryColor::from_hue(*hue))
}

/// Derive a hue from the category name.
pub fn hashed_hue(category: &str) -> u16 {
    let digest = Sha256::digest(category.as_bytes());
    let value = u16::from_be_bytes([digest[0], digest[1]]);
    value % 360
}

/// The colour for `category` without caching.
pub fn color_for(category: &str) -> CategoryColor {
    curated_color(category).unwrap_or_else(|| CategoryColor::from_hue(hashed_hue(category)))
}

/// Colours assigned to the categories seen so far in this session.
///
/// Entries are only ever added.
#[derive(Debug, Default)]
pub struct CategoryColorTable {
    colors: HashMap<String, CategoryColor>,
}

impl CategoryColorTable {
    /// Get the colour for `category`, assigning one on first sight.
    pub fn color_for(&mut self, category: &str) -> CategoryColor {
        if let Some(color) = self.colors.get(category) {
            return *color;
        }

        let color = color_for(category);
        self.colors.insert(category.to_owned(), color);
        color
    }

    /// Assign colours for all of `categories` and return them keyed by name.
    pub fn colors_for<'a>(
        &mut self,
        categories: impl IntoIterator<Item = &'a str>,
    ) -> HashMap<String, CategoryColor> {
        categories
            .into_iter()
            .map(|category| (category.to_owned(), self.color_for(category)))
            .collect()
    }
}
