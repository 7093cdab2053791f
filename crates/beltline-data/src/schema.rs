//! Serde structs for the line configuration file, and construction of the
//! core objects they describe.

use std::collections::BTreeMap;

use serde::Deserialize;

use beltline_bus::BusConfig;
use beltline_core::belt::{BeltError, BeltParams, StationLayout};
use beltline_core::classify::{ArchetypeDef, Classifier, ClassifierError};
use beltline_core::engine::LineEngine;
use beltline_core::event::EventLog;
use beltline_core::geometry::BeltGeometry;
use beltline_core::ingest::IngestReceiver;
use beltline_core::paint::{Color, ColorTable};

use crate::loader::ConfigError;

// ===========================================================================
// Sections
// ===========================================================================

/// Station boundaries, metres from the belt entry, strictly ascending.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StationsData {
    pub thresholds_m: Vec<f64>,
}

impl Default for StationsData {
    fn default() -> Self {
        Self {
            thresholds_m: vec![10.0, 20.0, 30.0],
        }
    }
}

fn black() -> Color {
    Color::BLACK
}

/// Paint code table. Codes are matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaintData {
    #[serde(default = "black")]
    pub fallback: Color,
    #[serde(default)]
    pub colors: BTreeMap<String, Color>,
}

impl Default for PaintData {
    fn default() -> Self {
        Self {
            fallback: black(),
            colors: BTreeMap::new(),
        }
    }
}

fn default_event_capacity() -> usize {
    1024
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct EventsData {
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsData {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

// ===========================================================================
// Whole file
// ===========================================================================

/// The complete line configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LineConfig {
    /// Only needed when subscribing live; file replay runs without it.
    #[serde(default)]
    pub bus: Option<BusConfig>,
    #[serde(default)]
    pub belt: BeltParams,
    #[serde(default)]
    pub stations: StationsData,
    #[serde(default)]
    pub paint: PaintData,
    #[serde(default)]
    pub archetypes: Vec<ArchetypeDef>,
    #[serde(default)]
    pub geometry: BeltGeometry,
    #[serde(default)]
    pub events: EventsData,
}

impl LineConfig {
    /// Check everything the engine and subscriber would otherwise reject
    /// later.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(bus) = &self.bus {
            bus.validate().map_err(|e| ConfigError::invalid("bus", e))?;
        }
        self.belt.validate().map_err(|e| ConfigError::invalid("belt", e))?;
        self.station_layout()?;

        if let Some(code) = self.paint.colors.keys().find(|code| code.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                field: "paint.colors",
                detail: format!("empty paint code {code:?}"),
            });
        }
        if self.events.capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "events.capacity",
                detail: "must be at least 1".into(),
            });
        }

        self.classifier()?;
        Ok(())
    }

    /// The bus section, required for a live subscription.
    pub fn bus(&self) -> Result<&BusConfig, ConfigError> {
        self.bus.as_ref().ok_or(ConfigError::Missing("bus"))
    }

    pub fn color_table(&self) -> ColorTable {
        let mut table = ColorTable::new(self.paint.fallback);
        for (code, &color) in &self.paint.colors {
            table.insert(code, color);
        }
        table
    }

    pub fn classifier(&self) -> Result<Classifier, ConfigError> {
        Classifier::new(self.archetypes.clone(), self.color_table()).map_err(|e| match e {
            ClassifierError::NoArchetypes => ConfigError::Missing("archetypes"),
            other => ConfigError::invalid("archetypes", other),
        })
    }

    pub fn station_layout(&self) -> Result<StationLayout, ConfigError> {
        StationLayout::new(&self.stations.thresholds_m)
            .map_err(|e| ConfigError::invalid("stations.thresholds_m", e))
    }

    /// Build a ready-to-step engine fed by `ingest`.
    pub fn build_engine(&self, ingest: IngestReceiver) -> Result<LineEngine, ConfigError> {
        let engine = LineEngine::new(
            &self.belt,
            self.station_layout()?,
            self.classifier()?,
            ingest,
        )
        .map_err(|e: BeltError| ConfigError::invalid("belt", e))?;
        Ok(engine.with_event_log(EventLog::new(self.events.capacity)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltline_core::ingest;
    use beltline_core::test_utils::{primary_archetype, secondary_archetype};

    fn config() -> LineConfig {
        LineConfig {
            bus: Some(BusConfig::new("broker", 1883, "IOT252/#")),
            belt: BeltParams::default(),
            stations: StationsData::default(),
            paint: PaintData::default(),
            archetypes: vec![primary_archetype(), secondary_archetype()],
            geometry: BeltGeometry::default(),
            events: EventsData::default(),
        }
    }

    #[test]
    fn valid_config_passes() {
        config().validate().unwrap();
    }

    #[test]
    fn color_table_uses_fallback_for_unmapped() {
        let mut c = config();
        c.paint.fallback = Color::WHITE;
        c.paint.colors.insert("209".into(), Color::BLACK);
        let table = c.color_table();
        assert_eq!(table.resolve("209"), Color::BLACK);
        assert_eq!(table.resolve("ZZZ"), Color::WHITE);
    }

    #[test]
    fn missing_archetypes_is_reported_as_missing() {
        let mut c = config();
        c.archetypes.clear();
        assert!(matches!(c.validate(), Err(ConfigError::Missing("archetypes"))));
    }

    #[test]
    fn two_defaults_are_invalid() {
        let mut c = config();
        c.archetypes[1].default = true;
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Invalid { field: "archetypes", .. })
        ));
    }

    #[test]
    fn spawn_gap_below_min_gap_is_invalid() {
        let mut c = config();
        c.belt.spawn_gap_m = 0.1;
        assert!(matches!(c.validate(), Err(ConfigError::Invalid { field: "belt", .. })));
    }

    #[test]
    fn descending_thresholds_are_invalid() {
        let mut c = config();
        c.stations.thresholds_m = vec![20.0, 10.0];
        assert!(matches!(
            c.validate(),
            Err(ConfigError::Invalid { field: "stations.thresholds_m", .. })
        ));
    }

    #[test]
    fn bus_section_is_optional_until_asked_for() {
        let mut c = config();
        c.bus = None;
        c.validate().unwrap();
        assert!(matches!(c.bus(), Err(ConfigError::Missing("bus"))));
    }

    #[test]
    fn bad_bus_section_is_invalid() {
        let mut c = config();
        c.bus = Some(BusConfig::new("broker", 0, "IOT252/#"));
        assert!(matches!(c.validate(), Err(ConfigError::Invalid { field: "bus", .. })));
    }

    #[test]
    fn zero_event_capacity_is_invalid() {
        let mut c = config();
        c.events.capacity = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn build_engine_applies_belt_params() {
        let mut c = config();
        c.belt.speed_mps = 1.5;
        let (_tx, rx) = ingest::channel();
        let engine = c.build_engine(rx).unwrap();
        assert_eq!(engine.speed_mps(), 1.5);
        assert_eq!(engine.car_count(), 0);
        assert_eq!(engine.classifier().archetype_count(), 2);
    }
}
