//! Scene catalogue and dispatch
//!
//! Each experiment is one variant of [`Scene`], owning its own particle fields. All variants are
//! driven through the same small surface: render a frame for the current parameters, report the
//! per-frame time step, reseed when a parameter changes the population, and reset.

pub mod everyday;
pub mod fog;
pub mod lab_bench;
pub mod two_cups;

use crate::canvas::Canvas2D;
use crate::stats::{FrameStats, Headlight};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use everyday::{Everyday, Example};
pub use fog::Fog;
pub use lab_bench::LabBench;
pub use two_cups::TwoCups;

/// Which cups the flashlight is pointed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CupTarget {
    Solution,
    Colloid,
    #[default]
    Both,
}

impl CupTarget {
    pub fn solution(self) -> bool {
        matches!(self, CupTarget::Solution | CupTarget::Both)
    }

    pub fn colloid(self) -> bool {
        matches!(self, CupTarget::Colloid | CupTarget::Both)
    }
}

/// Point of view in the fog scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewMode {
    #[default]
    External,
    Driver,
}

/// Inputs read by the scenes every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParams {
    /// Flashlight polar angle in degrees (90 is straight above the cup)
    pub angle_deg: f32,
    /// Flashlight offset, 0..100
    pub distance: f32,
    /// Light intensity in percent
    pub intensity: f32,
    /// Medium density (fog level) in percent
    pub density: f32,
    pub target: CupTarget,
    pub headlight: Headlight,
    pub view: ViewMode,
    /// Vehicle speed, 0..100
    pub speed: f32,
    /// Enlarges particles for display only
    pub microscopic: bool,
    pub light_on: bool,
    /// Sedimentation speed-up, 1..10
    pub time_acceleration: f32,
}

impl SceneParams {
    pub fn new() -> Self {
        Self {
            angle_deg: 90.0,
            distance: 50.0,
            intensity: 80.0,
            density: 50.0,
            target: CupTarget::Both,
            headlight: Headlight::Low,
            view: ViewMode::External,
            speed: 30.0,
            microscopic: false,
            light_on: true,
            time_acceleration: 1.0,
        }
    }

    /// Copy with every numeric input forced into its range; non-finite values take the default
    pub fn clamped(&self) -> Self {
        let defaults = Self::new();
        let fit = |name: &str, value: f32, fallback: f32, min: f32, max: f32| -> f32 {
            if !value.is_finite() {
                log::warn!("{} is not a number, using {}", name, fallback);
                return fallback;
            }
            let clamped = value.clamp(min, max);
            if clamped != value {
                log::warn!("{} = {} out of range, clamped to {}", name, value, clamped);
            }
            clamped
        };
        Self {
            angle_deg: fit("angle", self.angle_deg, defaults.angle_deg, 30.0, 150.0),
            distance: fit("distance", self.distance, defaults.distance, 0.0, 100.0),
            intensity: fit("intensity", self.intensity, defaults.intensity, 10.0, 100.0),
            density: fit("density", self.density, defaults.density, 10.0, 100.0),
            speed: fit("speed", self.speed, defaults.speed, 0.0, 100.0),
            time_acceleration: fit(
                "time acceleration",
                self.time_acceleration,
                defaults.time_acceleration,
                1.0,
                10.0,
            ),
            ..*self
        }
    }

    /// Light output in 0..1, zero when the light is switched off
    pub fn light_level(&self) -> f32 {
        if self.light_on {
            self.intensity / 100.0
        } else {
            0.0
        }
    }

    /// Density in 0..1
    pub fn density_factor(&self) -> f32 {
        self.density / 100.0
    }
}

impl Default for SceneParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Tag of a scene, used for selection and configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SceneKind {
    TwoCups,
    Fog,
    LabBench,
    Everyday(Example),
}

impl SceneKind {
    pub const ALL: [SceneKind; 8] = [
        SceneKind::TwoCups,
        SceneKind::Fog,
        SceneKind::LabBench,
        SceneKind::Everyday(Example::Forest),
        SceneKind::Everyday(Example::Milk),
        SceneKind::Everyday(Example::Smoke),
        SceneKind::Everyday(Example::Gelatin),
        SceneKind::Everyday(Example::Sky),
    ];

    /// Command-line and config name
    pub fn id(self) -> &'static str {
        match self {
            SceneKind::TwoCups => "two-cups",
            SceneKind::Fog => "fog",
            SceneKind::LabBench => "lab-bench",
            SceneKind::Everyday(example) => example.id(),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SceneKind::TwoCups => "Solution vs. Colloid",
            SceneKind::Fog => "Headlights in Fog",
            SceneKind::LabBench => "Lab Bench",
            SceneKind::Everyday(example) => example.title(),
        }
    }
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for SceneKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SceneKind::ALL
            .into_iter()
            .find(|kind| kind.id() == s)
            .ok_or_else(|| {
                let names: Vec<_> = SceneKind::ALL.iter().map(|k| k.id()).collect();
                format!("unknown scene '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

impl TryFrom<String> for SceneKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SceneKind> for String {
    fn from(kind: SceneKind) -> Self {
        kind.id().to_string()
    }
}

/// A mounted scene with its simulation state
pub enum Scene {
    TwoCups(TwoCups),
    Fog(Fog),
    LabBench(LabBench),
    Everyday(Everyday),
}

impl Scene {
    /// Create the scene's particle population; `seed` makes it reproducible
    pub fn mount(kind: SceneKind, params: &SceneParams, seed: Option<u64>) -> Self {
        match kind {
            SceneKind::TwoCups => Scene::TwoCups(TwoCups::new(seed)),
            SceneKind::Fog => Scene::Fog(Fog::new(params, seed)),
            SceneKind::LabBench => Scene::LabBench(LabBench::new(seed)),
            SceneKind::Everyday(example) => Scene::Everyday(Everyday::new(example, seed)),
        }
    }

    pub fn kind(&self) -> SceneKind {
        match self {
            Scene::TwoCups(_) => SceneKind::TwoCups,
            Scene::Fog(_) => SceneKind::Fog,
            Scene::LabBench(_) => SceneKind::LabBench,
            Scene::Everyday(scene) => SceneKind::Everyday(scene.example()),
        }
    }

    /// Canvas size in scene pixels
    pub fn size(&self) -> Vec2 {
        match self {
            Scene::TwoCups(_) => two_cups::SIZE,
            Scene::Fog(_) => fog::SIZE,
            Scene::LabBench(_) => lab_bench::SIZE,
            Scene::Everyday(_) => everyday::SIZE,
        }
    }

    /// Animation time added per frame
    pub fn time_step(&self) -> f32 {
        match self {
            Scene::TwoCups(_) => two_cups::TIME_STEP,
            Scene::Fog(_) => fog::TIME_STEP,
            Scene::LabBench(_) => lab_bench::TIME_STEP,
            Scene::Everyday(scene) => scene.example().time_step(),
        }
    }

    /// Whether going from `old` to `new` requires a fresh population
    pub fn needs_reseed(&self, old: &SceneParams, new: &SceneParams) -> bool {
        match self {
            Scene::Fog(_) => Fog::particle_count(old.density) != Fog::particle_count(new.density),
            _ => false,
        }
    }

    pub fn reseed(&mut self, params: &SceneParams) {
        if let Scene::Fog(scene) = self {
            scene.reseed(params);
        }
    }

    pub fn reset(&mut self) {
        match self {
            Scene::TwoCups(scene) => scene.reset(),
            Scene::Fog(scene) => scene.reset(),
            Scene::LabBench(scene) => scene.reset(),
            Scene::Everyday(scene) => scene.reset(),
        }
    }

    /// Draw one frame, advancing the simulation by one step
    pub fn render<C: Canvas2D + ?Sized>(&mut self, canvas: &mut C, params: &SceneParams, time: f32) -> FrameStats {
        match self {
            Scene::TwoCups(scene) => scene.render(canvas, params),
            Scene::Fog(scene) => scene.render(canvas, params, time),
            Scene::LabBench(scene) => scene.render(canvas, params, time),
            Scene::Everyday(scene) => scene.render(canvas, params, time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_pulls_values_into_range() {
        let params = SceneParams {
            angle_deg: 10.0,
            distance: 250.0,
            intensity: 0.0,
            density: f32::NAN,
            speed: -5.0,
            time_acceleration: 50.0,
            ..SceneParams::default()
        }
        .clamped();
        assert_eq!(params.angle_deg, 30.0);
        assert_eq!(params.distance, 100.0);
        assert_eq!(params.intensity, 10.0);
        assert_eq!(params.density, 50.0);
        assert_eq!(params.speed, 0.0);
        assert_eq!(params.time_acceleration, 10.0);
    }

    #[test]
    fn test_defaults_are_in_range() {
        assert_eq!(SceneParams::default().clamped(), SceneParams::default());
    }

    #[test]
    fn test_light_level_off() {
        let params = SceneParams {
            light_on: false,
            ..SceneParams::default()
        };
        assert_eq!(params.light_level(), 0.0);
    }

    #[test]
    fn test_scene_kind_names_round_trip() {
        for kind in SceneKind::ALL {
            assert_eq!(kind.id().parse::<SceneKind>(), Ok(kind));
        }
        assert!("ocean".parse::<SceneKind>().is_err());
    }

    #[test]
    fn test_scene_kind_serializes_as_name() {
        let json = serde_json::to_string(&SceneKind::Everyday(Example::Smoke)).unwrap();
        assert_eq!(json, "\"smoke\"");
        let kind: SceneKind = serde_json::from_str("\"lab-bench\"").unwrap();
        assert_eq!(kind, SceneKind::LabBench);
    }

    #[test]
    fn test_mount_reports_kind() {
        for kind in SceneKind::ALL {
            let scene = Scene::mount(kind, &SceneParams::default(), Some(1));
            assert_eq!(scene.kind(), kind);
            assert!(scene.time_step() > 0.0);
        }
    }

    #[test]
    fn test_fog_reseeds_only_on_density_change() {
        let params = SceneParams::default();
        let scene = Scene::mount(SceneKind::Fog, &params, Some(1));
        let denser = SceneParams {
            density: 80.0,
            ..params
        };
        let faster = SceneParams { speed: 90.0, ..params };
        assert!(scene.needs_reseed(&params, &denser));
        assert!(!scene.needs_reseed(&params, &faster));
    }
}
