//! Per-frame statistics shown next to the scenes
//!
//! Visibility, glare and effective range are fixed presentation formulas of the headlight mode
//! and fog density. They never depend on the particle simulation.

use serde::{Deserialize, Serialize};

/// Headlight mode of the fog scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Headlight {
    #[default]
    Low,
    High,
}

impl Headlight {
    pub fn name(self) -> &'static str {
        match self {
            Headlight::Low => "Low beam",
            Headlight::High => "High beam",
        }
    }
}

/// Visibility in percent for fog `density` in 0..100
pub fn visibility(headlight: Headlight, density: f32) -> f32 {
    match headlight {
        Headlight::Low => (95.0 - density * 0.4).max(45.0),
        Headlight::High => (90.0 - density * 0.75).max(15.0),
    }
}

/// Glare in percent
pub fn glare(headlight: Headlight, density: f32) -> f32 {
    match headlight {
        Headlight::Low => (5.0 + density * 0.2).min(25.0),
        Headlight::High => (15.0 + density * 0.8).min(95.0),
    }
}

/// Effective range in metres
pub fn effective_range(headlight: Headlight, density: f32) -> f32 {
    match headlight {
        Headlight::Low => (12.0 - density * 0.06).max(5.0),
        Headlight::High => (18.0 - density * 0.16).max(2.0),
    }
}

/// Density above which a high beam produces the wall of white
pub const WALL_OF_WHITE_THRESHOLD: f32 = 30.0;

/// Strength of the backscatter overlay, if it is active
pub fn wall_of_white(headlight: Headlight, density: f32) -> Option<f32> {
    (headlight == Headlight::High && density > WALL_OF_WHITE_THRESHOLD)
        .then(|| (density - WALL_OF_WHITE_THRESHOLD) / 70.0 * 0.65)
}

/// Driving risk shown next to the fog readouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DangerLevel {
    #[default]
    Safe,
    Warning,
    Critical,
}

impl DangerLevel {
    pub fn assess(headlight: Headlight, density: f32) -> Self {
        match headlight {
            Headlight::High if density > 60.0 => DangerLevel::Critical,
            Headlight::High if density > WALL_OF_WHITE_THRESHOLD => DangerLevel::Warning,
            _ => DangerLevel::Safe,
        }
    }

    pub fn message(self) -> Option<&'static str> {
        match self {
            DangerLevel::Safe => None,
            DangerLevel::Warning => Some("⚠ CAUTION"),
            DangerLevel::Critical => Some("⚠ VERY DANGEROUS!"),
        }
    }
}

/// Aggregate numbers for one frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    /// Particles whose illumination is above the visibility threshold
    pub illuminated: usize,
    pub scatter_events: usize,
    pub backscatter_events: usize,
    /// Percent, rounded
    pub visibility: Option<u32>,
    /// Percent, rounded
    pub glare: Option<u32>,
    /// Metres, rounded
    pub effective_range: Option<u32>,
    pub wall_of_white: bool,
    pub danger: DangerLevel,
}

impl FrameStats {
    /// Closed-form readouts for the fog scene
    pub fn fog(headlight: Headlight, density: f32) -> Self {
        Self {
            visibility: Some(round(visibility(headlight, density))),
            glare: Some(round(glare(headlight, density))),
            effective_range: Some(round(effective_range(headlight, density))),
            wall_of_white: wall_of_white(headlight, density).is_some(),
            danger: DangerLevel::assess(headlight, density),
            ..Self::default()
        }
    }
}

/// Round half away from zero, as the readout does
fn round(value: f32) -> u32 {
    value.max(0.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_beam_density_50() {
        assert!((visibility(Headlight::Low, 50.0) - 75.0).abs() < 1e-4);
        assert_eq!(FrameStats::fog(Headlight::Low, 50.0).visibility, Some(75));
    }

    #[test]
    fn test_high_beam_density_50() {
        assert!((visibility(Headlight::High, 50.0) - 52.5).abs() < 1e-4);
        let stats = FrameStats::fog(Headlight::High, 50.0);
        assert_eq!(stats.visibility, Some(53));
        assert_eq!(stats.glare, Some(55));
    }

    #[test]
    fn test_floors_and_caps() {
        let close = |a: f32, b: f32| (a - b).abs() < 1e-4;
        assert!(close(visibility(Headlight::Low, 100.0), 55.0));
        assert!(close(visibility(Headlight::High, 100.0), 15.0));
        assert!(close(glare(Headlight::High, 100.0), 95.0));
        assert!(close(glare(Headlight::Low, 100.0), 25.0));
        assert!(close(effective_range(Headlight::High, 100.0), 2.0));
        assert!(close(effective_range(Headlight::Low, 100.0), 6.0));
    }

    #[test]
    fn test_visibility_decreases_with_density() {
        for headlight in [Headlight::Low, Headlight::High] {
            let mut last = visibility(headlight, 10.0);
            for d in 11..=100 {
                let v = visibility(headlight, d as f32);
                assert!(v <= last);
                last = v;
            }
            assert!(visibility(headlight, 100.0) < visibility(headlight, 10.0));
        }
    }

    #[test]
    fn test_wall_of_white_threshold() {
        assert!(wall_of_white(Headlight::High, 80.0).is_some());
        assert!(wall_of_white(Headlight::High, 20.0).is_none());
        assert!(wall_of_white(Headlight::Low, 80.0).is_none());
        let strength = wall_of_white(Headlight::High, 100.0).unwrap();
        assert!((strength - 0.65).abs() < 1e-5);
    }

    #[test]
    fn test_danger_level() {
        assert_eq!(DangerLevel::assess(Headlight::Low, 90.0), DangerLevel::Safe);
        assert_eq!(DangerLevel::assess(Headlight::High, 30.0), DangerLevel::Safe);
        assert_eq!(DangerLevel::assess(Headlight::High, 45.0), DangerLevel::Warning);
        assert_eq!(DangerLevel::assess(Headlight::High, 61.0), DangerLevel::Critical);
        assert!(DangerLevel::Safe.message().is_none());
    }
}
