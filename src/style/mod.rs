//! Style configuration for rendering DOCX output.
//!
//! A [`StyleConfig`] is an immutable value built before a conversion starts
//! and passed by reference to the renderer. Out-of-range fields are not
//! errors: accessors fall back to the documented default and
//! [`StyleConfig::validate`] reports each fallback as a warning.

mod loader;

pub use loader::{
    is_style_key, load_style_config, load_style_config_with_warnings, merge_overrides,
    parse_style_config, parse_style_config_with_warnings, sample_config, write_sample_config,
    ConfigFormat,
};

use crate::error::Warning;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default heading color when a level has none configured.
pub const DEFAULT_HEADING_COLOR: RgbColor = RgbColor(0x2E, 0x75, 0xB6);

/// Element categories that `custom_style_map` may override.
pub const STYLE_MAP_KEYS: &[&str] = &[
    "heading1",
    "heading2",
    "heading3",
    "heading4",
    "heading5",
    "heading6",
    "paragraph",
    "list_bullet",
    "list_number",
    "quote",
    "code",
    "table",
];

/// Settings consumed by the DOCX renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Body font
    pub font_name: String,

    /// Body font size in points
    pub font_size: f64,

    /// Line spacing multiplier
    pub line_spacing: f64,

    /// Heading font
    pub heading_font: String,

    /// Heading colors (`#RRGGBB`) by level
    pub heading_colors: BTreeMap<u8, String>,

    /// Heading sizes in points by level
    pub heading_sizes: BTreeMap<u8, f64>,

    /// Space before headings in points by level
    pub heading_spacing_before: BTreeMap<u8, f64>,

    /// Space after headings in points by level
    pub heading_spacing_after: BTreeMap<u8, f64>,

    /// Space after body paragraphs in points
    pub paragraph_spacing_after: f64,

    /// First-line indent of body paragraphs in inches
    pub paragraph_first_line_indent: f64,

    /// Space after list items in points
    pub list_spacing: f64,

    /// Indent per list level in inches
    pub list_indent: f64,

    /// Table style name
    pub table_style: String,

    /// Let tables size columns to content
    pub table_autofit: bool,

    /// Monospace font for code
    pub code_font: String,

    /// Code font size in points
    pub code_size: f64,

    /// Code block background (`#RRGGBB`)
    pub code_background: String,

    /// Use `Heading N` styles rather than direct formatting
    pub use_builtin_styles: bool,

    /// Element category to paragraph style name overrides
    pub custom_style_map: BTreeMap<String, String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let per_level = |values: [f64; 6]| -> BTreeMap<u8, f64> {
            (1..=6u8).zip(values).collect()
        };

        Self {
            font_name: "Calibri".to_string(),
            font_size: 11.0,
            line_spacing: 1.15,
            heading_font: "Calibri".to_string(),
            heading_colors: [
                "#2E75B6", "#C55A11", "#70AD47", "#7030A0", "#264478", "#E7E6E6",
            ]
            .iter()
            .enumerate()
            .map(|(i, c)| (i as u8 + 1, c.to_string()))
            .collect(),
            heading_sizes: per_level([16.0, 14.0, 12.0, 11.0, 11.0, 10.0]),
            heading_spacing_before: per_level([12.0, 10.0, 8.0, 6.0, 6.0, 4.0]),
            heading_spacing_after: per_level([6.0, 6.0, 4.0, 4.0, 2.0, 2.0]),
            paragraph_spacing_after: 6.0,
            paragraph_first_line_indent: 0.0,
            list_spacing: 0.0,
            list_indent: 0.25,
            table_style: "Table Grid".to_string(),
            table_autofit: true,
            code_font: "Consolas".to_string(),
            code_size: 9.0,
            code_background: "#F5F5F5".to_string(),
            use_builtin_styles: true,
            custom_style_map: BTreeMap::new(),
        }
    }
}

// Word accepts font sizes from 1 to 1638 half-points.
const FONT_SIZE_RANGE: (f64, f64) = (1.0, 409.0);
const SPACING_RANGE: (f64, f64) = (0.0, 1584.0);
const INDENT_RANGE: (f64, f64) = (0.0, 22.0);
const LINE_SPACING_RANGE: (f64, f64) = (0.25, 10.0);

fn in_range(value: f64, (min, max): (f64, f64)) -> bool {
    value.is_finite() && value >= min && value <= max
}

impl StyleConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body font and size.
    pub fn with_font(mut self, name: impl Into<String>, size: f64) -> Self {
        self.font_name = name.into();
        self.font_size = size;
        self
    }

    /// Set the color of one heading level.
    pub fn with_heading_color(mut self, level: u8, color: impl Into<String>) -> Self {
        self.heading_colors.insert(level, color.into());
        self
    }

    /// Enable or disable built-in heading styles.
    pub fn with_builtin_styles(mut self, enabled: bool) -> Self {
        self.use_builtin_styles = enabled;
        self
    }

    /// Override the paragraph style used for an element category.
    pub fn with_style_override(mut self, element: impl Into<String>, style: impl Into<String>) -> Self {
        self.custom_style_map.insert(element.into(), style.into());
        self
    }

    /// Body font size, or the default when out of range.
    pub fn body_size(&self) -> f64 {
        self.checked(self.font_size, FONT_SIZE_RANGE, |d| d.font_size)
    }

    /// Line spacing, or the default when out of range.
    pub fn line_spacing(&self) -> f64 {
        self.checked(self.line_spacing, LINE_SPACING_RANGE, |d| d.line_spacing)
    }

    /// Space after body paragraphs.
    pub fn paragraph_after(&self) -> f64 {
        self.checked(self.paragraph_spacing_after, SPACING_RANGE, |d| {
            d.paragraph_spacing_after
        })
    }

    /// First-line indent of body paragraphs.
    pub fn first_line_indent(&self) -> f64 {
        self.checked(self.paragraph_first_line_indent, INDENT_RANGE, |d| {
            d.paragraph_first_line_indent
        })
    }

    /// Space after list items.
    pub fn list_after(&self) -> f64 {
        self.checked(self.list_spacing, SPACING_RANGE, |d| d.list_spacing)
    }

    /// Indent per list level.
    pub fn list_level_indent(&self) -> f64 {
        self.checked(self.list_indent, INDENT_RANGE, |d| d.list_indent)
    }

    /// Code font size.
    pub fn code_font_size(&self) -> f64 {
        self.checked(self.code_size, FONT_SIZE_RANGE, |d| d.code_size)
    }

    /// Code block background.
    pub fn code_shading(&self) -> RgbColor {
        self.code_background
            .parse()
            .unwrap_or(RgbColor(0xF5, 0xF5, 0xF5))
    }

    /// Font for body text; empty names fall back to the default.
    pub fn body_font(&self) -> &str {
        non_empty_or(&self.font_name, "Calibri")
    }

    /// Font for headings.
    pub fn heading_font_name(&self) -> &str {
        non_empty_or(&self.heading_font, "Calibri")
    }

    /// Monospace font for code.
    pub fn code_font_name(&self) -> &str {
        non_empty_or(&self.code_font, "Consolas")
    }

    /// Table style name.
    pub fn table_style_name(&self) -> &str {
        non_empty_or(&self.table_style, "Table Grid")
    }

    /// Heading color for a level.
    ///
    /// Levels without a color, or with an unparseable one, use
    /// [`DEFAULT_HEADING_COLOR`].
    pub fn heading_color(&self, level: u8) -> RgbColor {
        self.heading_colors
            .get(&level)
            .and_then(|c| c.parse().ok())
            .unwrap_or(DEFAULT_HEADING_COLOR)
    }

    /// Heading size for a level.
    pub fn heading_size(&self, level: u8) -> f64 {
        Self::level_value(
            &self.heading_sizes,
            level,
            FONT_SIZE_RANGE,
            |d| d.heading_sizes.get(&level).copied(),
            12.0,
        )
    }

    /// Space before a heading of the given level.
    pub fn heading_before(&self, level: u8) -> f64 {
        Self::level_value(
            &self.heading_spacing_before,
            level,
            SPACING_RANGE,
            |d| d.heading_spacing_before.get(&level).copied(),
            6.0,
        )
    }

    /// Space after a heading of the given level.
    pub fn heading_after(&self, level: u8) -> f64 {
        Self::level_value(
            &self.heading_spacing_after,
            level,
            SPACING_RANGE,
            |d| d.heading_spacing_after.get(&level).copied(),
            3.0,
        )
    }

    /// Style name override for an element category.
    pub fn style_override(&self, element: &str) -> Option<&str> {
        self.custom_style_map
            .get(element)
            .map(String::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Check every field and report those that will fall back to defaults.
    pub fn validate(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let mut check = |field: &str, ok: bool, value: String| {
            if !ok {
                log::warn!("style field {} has invalid value {:?}", field, value);
                warnings.push(Warning::ConfigFallback {
                    field: field.to_string(),
                    value,
                });
            }
        };

        check(
            "font_size",
            in_range(self.font_size, FONT_SIZE_RANGE),
            self.font_size.to_string(),
        );
        check(
            "line_spacing",
            in_range(self.line_spacing, LINE_SPACING_RANGE),
            self.line_spacing.to_string(),
        );
        check(
            "paragraph_spacing_after",
            in_range(self.paragraph_spacing_after, SPACING_RANGE),
            self.paragraph_spacing_after.to_string(),
        );
        check(
            "paragraph_first_line_indent",
            in_range(self.paragraph_first_line_indent, INDENT_RANGE),
            self.paragraph_first_line_indent.to_string(),
        );
        check(
            "list_spacing",
            in_range(self.list_spacing, SPACING_RANGE),
            self.list_spacing.to_string(),
        );
        check(
            "list_indent",
            in_range(self.list_indent, INDENT_RANGE),
            self.list_indent.to_string(),
        );
        check(
            "code_size",
            in_range(self.code_size, FONT_SIZE_RANGE),
            self.code_size.to_string(),
        );
        check(
            "code_background",
            self.code_background.parse::<RgbColor>().is_ok(),
            self.code_background.clone(),
        );
        for (field, name) in [
            ("font_name", &self.font_name),
            ("heading_font", &self.heading_font),
            ("code_font", &self.code_font),
            ("table_style", &self.table_style),
        ] {
            check(field, !name.trim().is_empty(), name.clone());
        }
        for (level, color) in &self.heading_colors {
            check(
                &format!("heading_colors.{}", level),
                (1..=6).contains(level) && color.parse::<RgbColor>().is_ok(),
                color.clone(),
            );
        }
        for (field, map, range) in [
            ("heading_sizes", &self.heading_sizes, FONT_SIZE_RANGE),
            ("heading_spacing_before", &self.heading_spacing_before, SPACING_RANGE),
            ("heading_spacing_after", &self.heading_spacing_after, SPACING_RANGE),
        ] {
            for (level, value) in map {
                check(
                    &format!("{}.{}", field, level),
                    (1..=6).contains(level) && in_range(*value, range),
                    value.to_string(),
                );
            }
        }
        for key in self.custom_style_map.keys() {
            check(
                &format!("custom_style_map.{}", key),
                STYLE_MAP_KEYS.contains(&key.as_str()),
                key.clone(),
            );
        }

        warnings
    }

    fn checked(&self, value: f64, range: (f64, f64), default: impl Fn(&Self) -> f64) -> f64 {
        if in_range(value, range) {
            value
        } else {
            default(&Self::default())
        }
    }

    fn level_value(
        map: &BTreeMap<u8, f64>,
        level: u8,
        range: (f64, f64),
        default: impl Fn(&Self) -> Option<f64>,
        fallback: f64,
    ) -> f64 {
        match map.get(&level) {
            Some(v) if in_range(*v, range) => *v,
            _ => default(&Self::default()).unwrap_or(fallback),
        }
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl RgbColor {
    /// Uppercase hex without `#`, as OOXML expects.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl std::str::FromStr for RgbColor {
    type Err = String;

    /// Parse `#RRGGBB` or `RRGGBB`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("not a hex color: {}", s));
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| e.to_string());
        Ok(RgbColor(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let style = StyleConfig::default();
        assert_eq!(style.font_name, "Calibri");
        assert_eq!(style.heading_size(1), 16.0);
        assert_eq!(style.heading_before(6), 4.0);
        assert_eq!(style.heading_after(5), 2.0);
        assert_eq!(style.heading_color(2), RgbColor(0xC5, 0x5A, 0x11));
        assert!(style.validate().is_empty());
    }

    #[test]
    fn test_rgb_parse() {
        assert_eq!("#2E75B6".parse::<RgbColor>(), Ok(RgbColor(0x2E, 0x75, 0xB6)));
        assert_eq!("70ad47".parse::<RgbColor>(), Ok(RgbColor(0x70, 0xAD, 0x47)));
        assert!("#12345".parse::<RgbColor>().is_err());
        assert!("blue".parse::<RgbColor>().is_err());
        assert_eq!(RgbColor(0x2E, 0x75, 0xB6).to_string(), "#2E75B6");
    }

    #[test]
    fn test_missing_heading_color_falls_back() {
        let mut style = StyleConfig::default();
        style.heading_colors.remove(&4);
        assert_eq!(style.heading_color(4), DEFAULT_HEADING_COLOR);
    }

    #[test]
    fn test_invalid_color_falls_back_with_warning() {
        let style = StyleConfig::default().with_heading_color(3, "not-a-color");
        assert_eq!(style.heading_color(3), DEFAULT_HEADING_COLOR);

        let warnings = style.validate();
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            &warnings[0],
            Warning::ConfigFallback { field, .. } if field == "heading_colors.3"
        ));
    }

    #[test]
    fn test_out_of_range_size_falls_back() {
        let style = StyleConfig::default().with_font("Arial", -3.0);
        assert_eq!(style.body_size(), 11.0);
        assert_eq!(style.body_font(), "Arial");
        assert_eq!(style.validate().len(), 1);
    }

    #[test]
    fn test_unknown_style_map_key_warns() {
        let style = StyleConfig::default().with_style_override("sidebar", "Intense Quote");
        assert_eq!(style.validate().len(), 1);
        assert_eq!(style.style_override("sidebar"), Some("Intense Quote"));
    }
}
