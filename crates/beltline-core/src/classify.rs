//! Vehicle classification: archetype selection, paint resolution, and
//! construction of a car's independently tinted visual set.
//!
//! Classification is data-driven. Each [`ArchetypeDef`] carries the family
//! codes that select it, its base station assets, and a table of
//! [`PaintTarget`]s describing which materials take which palette slot.
//! Classification never fails: unknown families fall back to the default
//! archetype and unknown paint codes to the table's fallback color.

use crate::asset::StationAsset;
use crate::decode::VehicleEvent;
use crate::id::ArchetypeId;
use crate::paint::{Color, ColorTable};

// ---------------------------------------------------------------------------
// Rule types
// ---------------------------------------------------------------------------

/// Which palette color a paint target receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintSlot {
    Body,
    Roof,
    Secondary,
}

fn default_min_keyword_hits() -> usize {
    2
}

/// Selects paintable materials by id.
///
/// Two tiers: an exact allow-list (case-insensitive), then a keyword-overlap
/// heuristic that needs `min_keyword_hits` of `keywords` to appear in the
/// lower-cased id. Asset authors name materials inconsistently, so the
/// second tier catches `Corolla_Body_Paint` alongside `corollaquw_paint.006`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PaintTarget {
    pub slot: PaintSlot,
    #[serde(default)]
    pub exact_ids: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_min_keyword_hits")]
    pub min_keyword_hits: usize,
}

impl PaintTarget {
    pub fn new(slot: PaintSlot, exact_ids: &[&str], keywords: &[&str]) -> Self {
        Self {
            slot,
            exact_ids: exact_ids.iter().map(|s| s.to_string()).collect(),
            keywords: keywords.iter().map(|s| s.to_lowercase()).collect(),
            min_keyword_hits: default_min_keyword_hits(),
        }
    }

    /// Whether a material id belongs to this target, by either tier.
    pub fn matches(&self, id: Option<&str>) -> bool {
        match id.filter(|id| !id.is_empty()) {
            Some(id) => self.matches_exact(id) || self.matches_keywords(id),
            None => false,
        }
    }

    /// Allow-list tier.
    pub fn matches_exact(&self, id: &str) -> bool {
        !id.is_empty() && self.exact_ids.iter().any(|e| e.eq_ignore_ascii_case(id))
    }

    /// Keyword-overlap tier.
    pub fn matches_keywords(&self, id: &str) -> bool {
        self.min_keyword_hits > 0 && self.keyword_hits(id) >= self.min_keyword_hits
    }

    /// How many keywords appear in the lower-cased id.
    pub fn keyword_hits(&self, id: &str) -> usize {
        let lower = id.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| !kw.is_empty() && lower.contains(kw.to_lowercase().as_str()))
            .count()
    }
}

/// Forces some palette slots to a fixed accent color when the model-spec
/// string starts with a given prefix (case-insensitive, leading whitespace
/// ignored). Otherwise those slots follow the body color.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AccentRule {
    pub katashiki_prefix: String,
    pub color: Color,
    #[serde(default = "default_accent_slots")]
    pub slots: Vec<PaintSlot>,
}

fn default_accent_slots() -> Vec<PaintSlot> {
    vec![PaintSlot::Roof, PaintSlot::Secondary]
}

impl AccentRule {
    pub fn applies_to(&self, katashiki: &str) -> bool {
        let prefix = self.katashiki_prefix.trim().to_lowercase();
        !prefix.is_empty() && katashiki.trim_start().to_lowercase().starts_with(&prefix)
    }
}

/// One vehicle archetype and everything needed to build its visual set.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ArchetypeDef {
    pub name: String,
    /// Catch-all archetype for families no rule selects.
    #[serde(default)]
    pub default: bool,
    /// Exact family codes (case-insensitive).
    #[serde(default)]
    pub family_codes: Vec<String>,
    /// Family substrings (case-insensitive).
    #[serde(default)]
    pub family_substrings: Vec<String>,
    /// Base station assets, in belt order. Never mutated by classification.
    pub stations: Vec<StationAsset>,
    #[serde(default)]
    pub paint_targets: Vec<PaintTarget>,
    #[serde(default)]
    pub accent: Option<AccentRule>,
}

impl ArchetypeDef {
    /// Which palette slot paints a material, if any.
    ///
    /// An exact allow-list hit claims the material outright. Otherwise the
    /// keyword-matching target with the most hits wins, later targets
    /// breaking ties.
    pub fn slot_for_material(&self, id: &str) -> Option<PaintSlot> {
        self.paint_targets
            .iter()
            .find(|t| t.matches_exact(id))
            .or_else(|| {
                self.paint_targets
                    .iter()
                    .filter(|t| t.matches_keywords(id))
                    .max_by_key(|t| t.keyword_hits(id))
            })
            .map(|t| t.slot)
    }

    fn matches_family(&self, family_lower: &str) -> bool {
        if family_lower.is_empty() {
            return false;
        }
        self.family_codes
            .iter()
            .any(|code| code.trim().eq_ignore_ascii_case(family_lower))
            || self
                .family_substrings
                .iter()
                .map(|s| s.trim().to_lowercase())
                .any(|s| !s.is_empty() && family_lower.contains(s.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Classification result
// ---------------------------------------------------------------------------

/// The colors applied to one car.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub body: Color,
    pub roof: Color,
    pub secondary: Color,
}

impl Palette {
    pub fn uniform(color: Color) -> Self {
        Self {
            body: color,
            roof: color,
            secondary: color,
        }
    }

    pub fn color_for(&self, slot: PaintSlot) -> Color {
        match slot {
            PaintSlot::Body => self.body,
            PaintSlot::Roof => self.roof,
            PaintSlot::Secondary => self.secondary,
        }
    }

    fn set(&mut self, slot: PaintSlot, color: Color) {
        match slot {
            PaintSlot::Body => self.body = color,
            PaintSlot::Roof => self.roof = color,
            PaintSlot::Secondary => self.secondary = color,
        }
    }
}

/// Output of [`Classifier::classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub archetype: ArchetypeId,
    pub palette: Palette,
    /// Whether the paint code was found in the table (false means fallback).
    pub color_mapped: bool,
    /// Deep copy of the archetype's stations with the palette applied.
    pub visuals: Vec<StationAsset>,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Errors building a classifier from its rule table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifierError {
    #[error("no archetypes defined")]
    NoArchetypes,
    #[error("more than one default archetype: {0} and {1}")]
    MultipleDefaults(String, String),
    #[error("archetype '{0}' has no station assets")]
    NoStations(String),
    #[error("too many archetypes ({0})")]
    TooMany(usize),
}

/// Immutable rule table. Built once at startup, read every tick.
#[derive(Debug, Clone)]
pub struct Classifier {
    archetypes: Vec<ArchetypeDef>,
    default: ArchetypeId,
    colors: ColorTable,
}

impl Classifier {
    /// Validate the rule table. The archetype flagged `default` (or the
    /// first one, if none is flagged) catches unrecognized families.
    pub fn new(archetypes: Vec<ArchetypeDef>, colors: ColorTable) -> Result<Self, ClassifierError> {
        if archetypes.is_empty() {
            return Err(ClassifierError::NoArchetypes);
        }
        if archetypes.len() > u16::MAX as usize {
            return Err(ClassifierError::TooMany(archetypes.len()));
        }
        if let Some(empty) = archetypes.iter().find(|a| a.stations.is_empty()) {
            return Err(ClassifierError::NoStations(empty.name.clone()));
        }

        let mut default = None;
        for (index, def) in archetypes.iter().enumerate().filter(|(_, a)| a.default) {
            if let Some(ArchetypeId(prev)) = default {
                return Err(ClassifierError::MultipleDefaults(
                    archetypes[prev as usize].name.clone(),
                    def.name.clone(),
                ));
            }
            default = Some(ArchetypeId(index as u16));
        }

        Ok(Self {
            archetypes,
            default: default.unwrap_or(ArchetypeId(0)),
            colors,
        })
    }

    /// Pick the archetype for a family code. First matching rule wins;
    /// anything else, including an empty code, gets the default.
    pub fn archetype_for(&self, car_family: &str) -> ArchetypeId {
        let family = car_family.trim().to_lowercase();
        self.archetypes
            .iter()
            .position(|def| def.matches_family(&family))
            .map(|index| ArchetypeId(index as u16))
            .unwrap_or(self.default)
    }

    /// Resolve archetype, palette, and a freshly tinted copy of the visual set.
    pub fn classify(&self, event: &VehicleEvent) -> Classification {
        let archetype = self.archetype_for(&event.car_family);
        let def = &self.archetypes[archetype.index()];

        let mapped = self.colors.get(&event.color_ext_code);
        let body = mapped.unwrap_or(self.colors.fallback());

        let mut palette = Palette::uniform(body);
        if let Some(accent) = def.accent.as_ref().filter(|a| a.applies_to(&event.katashiki)) {
            for &slot in &accent.slots {
                palette.set(slot, accent.color);
            }
        }

        let visuals = def
            .stations
            .iter()
            .map(|base| {
                let mut asset = base.clone();
                asset.retint(|id| def.slot_for_material(id).map(|slot| palette.color_for(slot)));
                asset
            })
            .collect();

        Classification {
            archetype,
            palette,
            color_mapped: mapped.is_some(),
            visuals,
        }
    }

    pub fn archetype(&self, id: ArchetypeId) -> Option<&ArchetypeDef> {
        self.archetypes.get(id.index())
    }

    /// Archetype name, or `"?"` for an id this classifier never issued.
    pub fn archetype_name(&self, id: ArchetypeId) -> &str {
        self.archetype(id).map(|a| a.name.as_str()).unwrap_or("?")
    }

    pub fn default_archetype(&self) -> ArchetypeId {
        self.default
    }

    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    pub fn colors(&self) -> &ColorTable {
        &self.colors
    }
}

// ===========================================================================
// Tests
// ===========================================================================
