use std::collections::{BTreeMap, BTreeSet};

use palette::{Hsl, IntoColor, Srgb};

use crate::data::Value;

const DEFAULT_COLOR: &str = "#808080";

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct `#rrggbb` colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<String> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            format!("#{:02x}{:02x}{:02x}", rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category value → colour
// ---------------------------------------------------------------------------

/// Maps distinct values of a categorical column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<Value, String>,
}

impl ColorMap {
    /// Build a colour map for the given column from its distinct values.
    pub fn new(column: &str, unique_values: &BTreeSet<&Value>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping = unique_values
            .iter()
            .zip(palette)
            .map(|(v, c)| ((*v).clone(), c))
            .collect();

        ColorMap {
            column: column.to_string(),
            mapping,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> &str {
        self.mapping
            .get(value)
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Legend entries (value label, colour) in value order.
    pub fn legend_entries(&self) -> Vec<(String, String)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.to_string(), c.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_is_distinct_hex() {
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert!(colors.iter().all(|c| c.len() == 7 && c.starts_with('#')));
        let unique: BTreeSet<_> = colors.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_values_get_the_default_colour() {
        let a = Value::String("a".into());
        let b = Value::String("b".into());
        let values: BTreeSet<&Value> = [&a, &b].into_iter().collect();
        let map = ColorMap::new("kind", &values);
        assert_ne!(map.color_for(&a), map.color_for(&b));
        assert_eq!(map.color_for(&Value::Null), DEFAULT_COLOR);
        assert_eq!(map.legend_entries()[0].0, "a");
    }
}
