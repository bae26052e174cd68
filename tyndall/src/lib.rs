//! Tyndall effect visualizations
//!
//! Light scattering by colloids, drawn as animated 2D scenes: a solution and a colloid under a
//! flashlight, headlights in fog, a lab bench of five beakers and a gallery of everyday
//! examples. Scenes draw through the [`Canvas2D`] interface; the binary tessellates them for
//! wgpu, tests record them in a [`DrawList`].

pub mod beam;
pub mod canvas;
pub mod config;
pub mod driver;
pub mod equations_ui;
pub mod frame;
pub mod medium;
pub mod particles;
pub mod renderer;
pub mod scenes;
pub mod stats;
pub mod tessellate;

pub use beam::{resolve, BeamGeometry, Container, Extinction, LightSource};
pub use canvas::{BlendMode, Canvas2D, Color, DrawList, Paint, Path, Rect, Stroke};
pub use config::{AppConfig, ConfigError};
pub use driver::{AnimationDriver, DriverState, FrameScheduler, StopToken};
pub use medium::{classify, medium, Medium, ScatteringClass, Substance};
pub use particles::{FieldConfig, MotionRule, Particle, ParticleField};
pub use scenes::{Scene, SceneKind, SceneParams};
pub use stats::{FrameStats, Headlight};
pub use tessellate::Tessellator;
