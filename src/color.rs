use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Fixed saturation/lightness shared by every label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub saturation: u8,
    pub lightness: u8,
    /// Lightness points removed for the border color.
    pub border_darken: u8,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            saturation: 55,
            lightness: 78,
            border_darken: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hsl {
    /// `0..360`
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl Hsl {
    pub fn darken(self, points: u8) -> Self {
        Self {
            lightness: self.lightness.saturating_sub(points),
            ..self
        }
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hsl({}, {}%, {}%)",
            self.hue, self.saturation, self.lightness
        )
    }
}

impl Serialize for Hsl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 32-bit rolling hash over the label's UTF-16 code units:
/// `h = c + (h << 5) - h`, wrapping like a signed 32-bit integer.
pub fn label_hash(label: &str) -> i32 {
    label.encode_utf16().fold(0i32, |hash, unit| {
        i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash))
    })
}

pub fn hue_of(label: &str) -> u16 {
    (label_hash(label) % 360).unsigned_abs() as u16
}

/// Depends on nothing but `label` and the theme.
pub fn color_of(label: &str, theme: &Theme) -> Hsl {
    Hsl {
        hue: hue_of(label),
        saturation: theme.saturation,
        lightness: theme.lightness,
    }
}

pub fn border_of(label: &str, theme: &Theme) -> Hsl {
    color_of(label, theme).darken(theme.border_darken)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_reference_values() {
        assert_eq!(label_hash(""), 0);
        assert_eq!(label_hash("a"), 97);
        // 97 * 31 + 98
        assert_eq!(label_hash("ab"), 3105);
        assert_eq!(hue_of("ab"), 225);
    }

    #[test]
    fn hash_wraps_instead_of_overflowing() {
        let long = "The Left Hand of Darkness and Other Stories of Ekumen".repeat(4);
        let hue = hue_of(&long);
        assert!(hue < 360);
        assert_eq!(hue, hue_of(&long));
    }

    #[test]
    fn negative_hashes_give_positive_hues() {
        assert_eq!(label_hash("Sci-Fi"), -1_824_145_609);
        assert_eq!(hue_of("Sci-Fi"), 49);
        assert_eq!(label_hash("Mystery"), -1_102_771_937);
        assert_eq!(hue_of("Mystery"), 137);
    }

    #[test]
    fn hashes_utf16_code_units() {
        // U+1F4DA is a surrogate pair.
        assert_eq!(label_hash("📚"), 1_772_605);
        assert_eq!(hue_of("📚"), 325);
        assert_eq!(hue_of("Unknown"), 74);
        assert_eq!(hue_of("Other"), 184);
    }

    #[test]
    fn color_is_pure_per_label() {
        let theme = Theme::default();
        let first = color_of("Sci-Fi", &theme);
        let _ = color_of("Romance", &theme);
        assert_eq!(first, color_of("Sci-Fi", &theme));
        assert_eq!(first.saturation, 55);
        assert_eq!(first.lightness, 78);
    }

    #[test]
    fn border_is_darker_and_floors_at_zero() {
        let theme = Theme::default();
        let border = border_of("Fantasy", &theme);
        assert_eq!(border.hue, color_of("Fantasy", &theme).hue);
        assert_eq!(border.lightness, 68);

        let dim = Theme {
            lightness: 4,
            ..Theme::default()
        };
        assert_eq!(border_of("Fantasy", &dim).lightness, 0);
    }

    #[test]
    fn renders_as_css_hsl() {
        let color = Hsl {
            hue: 120,
            saturation: 55,
            lightness: 78,
        };
        assert_eq!(color.to_string(), "hsl(120, 55%, 78%)");
        assert_eq!(
            serde_json::to_string(&color).expect("serialize"),
            "\"hsl(120, 55%, 78%)\""
        );
    }
}
