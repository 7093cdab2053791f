//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use crate::asset::StationAsset;
use crate::belt::{BeltParams, StationLayout};
use crate::classify::{AccentRule, ArchetypeDef, Classifier, PaintSlot, PaintTarget};
use crate::decode::VehicleEvent;
use crate::engine::LineEngine;
use crate::fixed::Fixed64;
use crate::ingest::{self, IngestSender};
use crate::paint::{Color, ColorTable};

// ===========================================================================
// Fixed-point helper
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

// ===========================================================================
// Events
// ===========================================================================

/// A decoded event with the given body number, family, and paint code.
pub fn vehicle(body_no: i32, car_family: &str, color_ext_code: &str) -> VehicleEvent {
    VehicleEvent {
        body_no,
        katashiki: "ZWE219L-DEXNBW".to_string(),
        color_ext_code: color_ext_code.to_string(),
        vin_no: format!("NMTBD3BE90R{body_no:06}"),
        car_family: car_family.to_string(),
        lo_date: "20250911".to_string(),
    }
}

pub fn vehicle_with_katashiki(
    body_no: i32,
    car_family: &str,
    color_ext_code: &str,
    katashiki: &str,
) -> VehicleEvent {
    VehicleEvent {
        katashiki: katashiki.to_string(),
        ..vehicle(body_no, car_family, color_ext_code)
    }
}

// ===========================================================================
// Production line data
// ===========================================================================

/// The production paint table (fallback black).
pub fn production_colors() -> ColorTable {
    let blue = Color::rgb(0.078, 0.255, 0.439);
    let grey = Color::rgb(0.431, 0.431, 0.431);
    let red = Color::rgb(0.608, 0.106, 0.188);
    let silver = Color::rgb(0.6, 0.6, 0.6);
    let light_silver = Color::rgb(0.753, 0.753, 0.753);
    ColorTable::new(Color::BLACK)
        .with("785", blue)
        .with("2YB", blue)
        .with("1G3", grey)
        .with("2NB", grey)
        .with("1K6", Color::rgb(0.333, 0.341, 0.325))
        .with("3U5", red)
        .with("2TB", red)
        .with("M35", Color::rgb(1.0, 0.271, 0.0))
        .with("209", Color::BLACK)
        .with("040", Color::WHITE)
        .with("089", Color::rgb(0.957, 0.973, 0.976))
        .with("2VU", silver)
        .with("1L0", silver)
        .with("1J6", light_silver)
        .with("2MR", light_silver)
}

/// Station boundaries 10, 20 and 30 m from the entry.
pub fn production_layout() -> StationLayout {
    StationLayout::new(&[10.0, 20.0, 30.0]).unwrap()
}

fn stations(names: [&str; 4], materials: &[&str]) -> Vec<StationAsset> {
    let [pre, hood, lamp, bumper] = names;
    vec![
        StationAsset::new(pre, materials),
        StationAsset::new(hood, materials).with_cue("kaput_open"),
        StationAsset::new(lamp, materials).with_cue("far_fit"),
        StationAsset::new(bumper, materials).with_cue("tampon_fit"),
    ]
}

/// Primary family, the default archetype. One body paint target.
pub fn primary_archetype() -> ArchetypeDef {
    ArchetypeDef {
        name: "x94W".to_string(),
        default: true,
        family_codes: vec!["x94W".to_string()],
        family_substrings: vec![],
        stations: stations(
            ["beyazpre.glb", "beyazkaput.glb", "beyazfar.glb", "beyaztampon.glb"],
            &["corollaquw_paint.006", "glass", "tyre"],
        ),
        paint_targets: vec![PaintTarget::new(
            PaintSlot::Body,
            &["corollaquw_paint.006"],
            &["corolla", "paint"],
        )],
        accent: None,
    }
}

/// Secondary family: body, roof and secondary paint, with a black
/// two-tone accent for model specs starting with `M`.
pub fn secondary_archetype() -> ArchetypeDef {
    ArchetypeDef {
        name: "x00W".to_string(),
        default: false,
        family_codes: vec!["x00W".to_string()],
        family_substrings: vec!["chr".to_string()],
        stations: stations(
            ["chrPre.glb", "chrKaput.glb", "chrFar.glb", "chrTampon.glb"],
            &["chr_body_paint", "chr_roof_paint", "chr_secondary_paint", "glass"],
        ),
        paint_targets: vec![
            PaintTarget::new(PaintSlot::Body, &["chr_body_paint"], &["chr", "govde", "paint"]),
            PaintTarget::new(PaintSlot::Roof, &["chr_roof_paint"], &["chr", "cati", "paint"]),
            PaintTarget::new(
                PaintSlot::Secondary,
                &["chr_secondary_paint"],
                &["chr", "ikincil", "paint"],
            ),
        ],
        accent: Some(AccentRule {
            katashiki_prefix: "M".to_string(),
            color: Color::BLACK,
            slots: vec![PaintSlot::Roof, PaintSlot::Secondary],
        }),
    }
}

pub fn production_classifier() -> Classifier {
    Classifier::new(
        vec![primary_archetype(), secondary_archetype()],
        production_colors(),
    )
    .unwrap()
}

// ===========================================================================
// Engine constructors
// ===========================================================================

/// An engine on the production line with the producer end of its queue.
pub fn test_engine() -> (LineEngine, IngestSender) {
    test_engine_with(BeltParams::default())
}

pub fn test_engine_with(params: BeltParams) -> (LineEngine, IngestSender) {
    let (tx, rx) = ingest::channel();
    let engine =
        LineEngine::new(&params, production_layout(), production_classifier(), rx).unwrap();
    (engine, tx)
}
