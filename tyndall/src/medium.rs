//! Scattering classes and the substance table
//!
//! Every medium carries its scattering class from creation; the frame renderer branches on
//! that class and never infers it at runtime.

use crate::canvas::Color;
use common::constants;
use serde::{Deserialize, Serialize};

/// Scattering regime of a medium
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScatteringClass {
    /// True solution: particles far below the wavelength, the beam stays invisible
    Transparent,
    /// Suspension: large grains that block and sediment, weak gated response
    Partial,
    /// Colloid: strong lateral scattering, the Tyndall cone
    Colloidal,
}

impl ScatteringClass {
    /// Classify by dispersed-phase particle diameter
    pub fn from_particle_size(nm: f32) -> Self {
        if nm < constants::SOLUTION_MAX_NM {
            ScatteringClass::Transparent
        } else if nm <= constants::COLLOID_MAX_NM {
            ScatteringClass::Colloidal
        } else {
            ScatteringClass::Partial
        }
    }

    pub fn scatters(self) -> bool {
        !matches!(self, ScatteringClass::Transparent)
    }

    /// Multiplier on a particle's illumination rise for a medium of `intensity_scale`
    pub fn response(self, intensity_scale: f32) -> f32 {
        match self {
            ScatteringClass::Transparent => 0.0,
            ScatteringClass::Partial => intensity_scale.clamp(0.0, 1.0),
            ScatteringClass::Colloidal => 1.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScatteringClass::Transparent => "True solution",
            ScatteringClass::Partial => "Suspension",
            ScatteringClass::Colloidal => "Colloid",
        }
    }

    /// Result badge text and color shown above a lit container
    pub fn badge(self) -> (&'static str, Color) {
        match self {
            ScatteringClass::Transparent => ("✗ NO EFFECT", Color::hex("#ef4444")),
            ScatteringClass::Partial => ("⚠ SUSPENSION", Color::hex("#f59e0b")),
            ScatteringClass::Colloidal => ("✓ TYNDALL", Color::hex("#22c55e")),
        }
    }
}

/// Media used across the scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Substance {
    Water,
    SaltWater,
    SugarWater,
    Starch,
    Milk,
    Sand,
    Fog,
    Smoke,
    Gelatin,
    Air,
}

/// Static description of a medium
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Medium {
    pub substance: Substance,
    pub class: ScatteringClass,
    pub name: &'static str,
    pub formula: &'static str,
    /// Attenuation per pixel of path
    pub extinction: f32,
    /// Visual scattering strength in 0..1
    pub intensity_scale: f32,
    pub particle_count: usize,
    pub particle_radius: f32,
    pub particle_color: Color,
    pub liquid_top: Color,
    pub liquid_bottom: Color,
    pub sediments: bool,
}

/// Scattering class of a substance
pub fn classify(substance: Substance) -> ScatteringClass {
    medium(substance).class
}

/// Look up a substance in the table
pub fn medium(substance: Substance) -> Medium {
    let base = Medium {
        substance,
        class: ScatteringClass::Transparent,
        name: "",
        formula: "",
        extinction: 0.0,
        intensity_scale: 0.0,
        particle_count: 0,
        particle_radius: 0.0,
        particle_color: Color::TRANSPARENT,
        liquid_top: Color::rgba(59, 130, 246, 0.25),
        liquid_bottom: Color::rgba(37, 99, 235, 0.35),
        sediments: false,
    };

    match substance {
        Substance::Water => Medium {
            name: "Pure water",
            formula: "H₂O",
            ..base
        },
        Substance::SaltWater => Medium {
            name: "Salt water",
            formula: "NaCl(aq)",
            particle_count: 150,
            particle_radius: 0.7,
            particle_color: Color::rgba(147, 197, 253, 0.5),
            ..base
        },
        Substance::SugarWater => Medium {
            name: "Sugar water",
            formula: "C₁₂H₂₂O₁₁",
            particle_count: 60,
            particle_radius: 1.5,
            particle_color: Color::rgba(200, 220, 255, 0.4),
            liquid_top: Color::rgba(96, 165, 250, 0.3),
            liquid_bottom: Color::rgba(59, 130, 246, 0.4),
            ..base
        },
        Substance::Starch => Medium {
            class: ScatteringClass::Colloidal,
            name: "Starch sol",
            formula: "(C₆H₁₀O₅)n",
            extinction: 0.002,
            intensity_scale: 0.7,
            particle_count: 45,
            particle_radius: 4.0,
            particle_color: Color::rgba(255, 255, 255, 0.75),
            liquid_top: Color::rgba(209, 213, 219, 0.5),
            liquid_bottom: Color::rgba(156, 163, 175, 0.6),
            ..base
        },
        Substance::Milk => Medium {
            class: ScatteringClass::Colloidal,
            name: "Diluted milk",
            formula: "Emulsion",
            extinction: 0.004,
            intensity_scale: 1.0,
            particle_count: 65,
            particle_radius: 5.0,
            particle_color: Color::rgba(255, 255, 250, 0.85),
            liquid_top: Color::rgba(241, 245, 249, 0.75),
            liquid_bottom: Color::rgba(226, 232, 240, 0.85),
            ..base
        },
        Substance::Sand => Medium {
            class: ScatteringClass::Partial,
            name: "Sand in water",
            formula: "SiO₂",
            extinction: 0.006,
            intensity_scale: 0.3,
            particle_count: 30,
            particle_radius: 10.0,
            particle_color: Color::rgba(210, 180, 140, 0.95),
            liquid_top: Color::rgba(180, 160, 130, 0.35),
            liquid_bottom: Color::rgba(160, 140, 100, 0.5),
            sediments: true,
            ..base
        },
        Substance::Fog => Medium {
            class: ScatteringClass::Colloidal,
            name: "Fog",
            formula: "H₂O droplets",
            extinction: 0.025,
            intensity_scale: 1.0,
            particle_count: 150,
            particle_radius: 10.0,
            particle_color: Color::rgba(200, 210, 225, 0.5),
            ..base
        },
        Substance::Smoke => Medium {
            class: ScatteringClass::Colloidal,
            name: "Incense smoke",
            formula: "Aerosol",
            extinction: 0.003,
            intensity_scale: 0.8,
            particle_radius: 3.5,
            particle_color: Color::rgba(150, 150, 160, 0.6),
            ..base
        },
        Substance::Gelatin => Medium {
            class: ScatteringClass::Colloidal,
            name: "Gelatin",
            formula: "Gel",
            extinction: 0.002,
            intensity_scale: 0.6,
            particle_count: 20,
            particle_radius: 1.5,
            particle_color: Color::rgba(180, 255, 180, 0.8),
            liquid_top: Color::rgba(251, 191, 36, 0.35),
            liquid_bottom: Color::rgba(217, 119, 6, 0.5),
            ..base
        },
        Substance::Air => Medium {
            name: "Clean air",
            formula: "N₂ + O₂",
            ..base
        },
    }
}

/// The five beakers of the lab bench, left to right
pub const BENCH_SUBSTANCES: [Substance; 5] = [
    Substance::Water,
    Substance::SugarWater,
    Substance::Starch,
    Substance::Milk,
    Substance::Sand,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bench_classes() {
        let classes: Vec<_> = BENCH_SUBSTANCES.iter().map(|s| classify(*s)).collect();
        assert_eq!(
            classes,
            vec![
                ScatteringClass::Transparent,
                ScatteringClass::Transparent,
                ScatteringClass::Colloidal,
                ScatteringClass::Colloidal,
                ScatteringClass::Partial,
            ]
        );
    }

    #[test]
    fn test_size_classification() {
        assert_eq!(ScatteringClass::from_particle_size(0.5), ScatteringClass::Transparent);
        assert_eq!(ScatteringClass::from_particle_size(300.0), ScatteringClass::Colloidal);
        assert_eq!(ScatteringClass::from_particle_size(5000.0), ScatteringClass::Partial);
    }

    #[test]
    fn test_transparent_never_responds() {
        for scale in [0.0, 0.5, 1.0, 10.0] {
            assert_eq!(ScatteringClass::Transparent.response(scale), 0.0);
        }
        assert!(ScatteringClass::Partial.response(0.3) < ScatteringClass::Colloidal.response(0.3));
    }

    #[test]
    fn test_only_sand_sediments() {
        for s in BENCH_SUBSTANCES {
            assert_eq!(medium(s).sediments, s == Substance::Sand);
        }
    }

    #[test]
    fn test_water_has_no_particles() {
        assert_eq!(medium(Substance::Water).particle_count, 0);
        assert!(!classify(Substance::Water).scatters());
    }
}
