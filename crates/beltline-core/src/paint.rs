//! Paint colors and the paint-code lookup table.

use std::collections::BTreeMap;

/// Linear RGB color, components in `0.0..=1.0`.
///
/// Serialized as a plain `[r, g, b]` array so config files stay compact.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

impl From<[f32; 3]> for Color {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [f32; 3] {
    fn from(c: Color) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Paint code to color lookup with a fallback for unmapped codes.
///
/// Codes are matched exactly but case-insensitively, after trimming.
#[derive(Debug, Clone)]
pub struct ColorTable {
    colors: BTreeMap<String, Color>,
    fallback: Color,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::new(Color::BLACK)
    }
}

impl ColorTable {
    /// Create an empty table that resolves everything to `fallback`.
    pub fn new(fallback: Color) -> Self {
        Self {
            colors: BTreeMap::new(),
            fallback,
        }
    }

    /// Register (or replace) a paint code.
    pub fn insert(&mut self, code: &str, color: Color) {
        self.colors.insert(normalize(code), color);
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, code: &str, color: Color) -> Self {
        self.insert(code, color);
        self
    }

    /// Look up a code without falling back.
    pub fn get(&self, code: &str) -> Option<Color> {
        self.colors.get(&normalize(code)).copied()
    }

    /// Look up a code, resolving unmapped codes to the fallback color.
    pub fn resolve(&self, code: &str) -> Color {
        self.get(code).unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> Color {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let table = ColorTable::default().with("m35", Color::rgb(1.0, 0.271, 0.0));
        assert_eq!(table.get("M35"), Some(Color::rgb(1.0, 0.271, 0.0)));
        assert_eq!(table.get(" m35 "), Some(Color::rgb(1.0, 0.271, 0.0)));
    }

    #[test]
    fn unmapped_code_resolves_to_fallback() {
        let table = ColorTable::new(Color::rgb(0.5, 0.5, 0.5)).with("209", Color::BLACK);
        assert_eq!(table.get("ZZZ"), None);
        assert_eq!(table.resolve("ZZZ"), Color::rgb(0.5, 0.5, 0.5));
        assert_eq!(table.resolve(""), Color::rgb(0.5, 0.5, 0.5));
    }

    #[test]
    fn insert_replaces_existing_code() {
        let mut table = ColorTable::default();
        table.insert("040", Color::BLACK);
        table.insert("040", Color::WHITE);
        assert_eq!(table.len(), 1);
        assert_eq!(table.resolve("040"), Color::WHITE);
    }

    #[test]
    fn color_serializes_as_array() {
        let json = serde_json::to_string(&Color::rgb(0.25, 0.5, 1.0)).unwrap();
        assert_eq!(json, "[0.25,0.5,1.0]");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(0.25, 0.5, 1.0));
    }
}
