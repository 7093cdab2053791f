//! Station visual assets as the simulation sees them.
//!
//! The renderer owns the real meshes. The core only needs each asset's
//! material identifiers (to decide which ones are paintable), the tint that
//! was resolved for each material, and the optional one-shot presentation
//! cue to fire when a car switches to the asset.

use crate::paint::Color;

/// One material slot inside a station asset.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(from = "MaterialDef")]
pub struct Material {
    /// Material identifier as authored in the asset. May be missing.
    pub id: Option<String>,
    /// Current tint. Untinted materials keep white.
    pub tint: Color,
}

/// Config-side form: either a bare id string or a full table.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum MaterialDef {
    Id(String),
    Full {
        #[serde(default)]
        id: Option<String>,
        #[serde(default = "white")]
        tint: Color,
    },
}

fn white() -> Color {
    Color::WHITE
}

impl From<MaterialDef> for Material {
    fn from(def: MaterialDef) -> Self {
        match def {
            MaterialDef::Id(id) => Material::named(&id),
            MaterialDef::Full { id, tint } => Material { id, tint },
        }
    }
}

impl Material {
    /// A white material with the given id.
    pub fn named(id: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            tint: Color::WHITE,
        }
    }
}

/// The visual for one station along the belt.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StationAsset {
    /// Asset handle understood by the renderer (usually a file name).
    pub name: String,
    #[serde(default)]
    pub materials: Vec<Material>,
    /// Presentation cue (animation clip) played once when a car switches to
    /// this asset.
    #[serde(default)]
    pub cue: Option<String>,
}

impl StationAsset {
    pub fn new(name: &str, materials: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            materials: materials.iter().map(|id| Material::named(id)).collect(),
            cue: None,
        }
    }

    pub fn with_cue(mut self, cue: &str) -> Self {
        self.cue = Some(cue.to_string());
        self
    }

    /// Retint every material `pick` returns a color for. Materials without
    /// an id are never offered. Returns how many were tinted.
    pub fn retint(&mut self, mut pick: impl FnMut(&str) -> Option<Color>) -> usize {
        let mut tinted = 0;
        for material in &mut self.materials {
            let Some(id) = material.id.as_deref().filter(|id| !id.is_empty()) else {
                continue;
            };
            if let Some(color) = pick(id) {
                material.tint = color;
                tinted += 1;
            }
        }
        tinted
    }

    /// Tint of the first material with the given id, if any.
    pub fn tint_of(&self, id: &str) -> Option<Color> {
        self.materials
            .iter()
            .find(|m| m.id.as_deref() == Some(id))
            .map(|m| m.tint)
    }
}
