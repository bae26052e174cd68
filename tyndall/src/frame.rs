//! Frame renderer building blocks shared by the scenes
//!
//! Beams are drawn in up to three passes (outer glow, main cone, bright core) whose shape and
//! strength depend on the medium's scattering class. Particles are lit by the Gaussian profile
//! of the beam and drawn with a layered radial glow.

use crate::beam::{BeamGeometry, GAUSSIAN_SHARPNESS};
use crate::canvas::{BlendMode, Canvas2D, Color, Paint, Path, Stroke};
use crate::medium::ScatteringClass;
use crate::particles::{Particle, ParticleField};
use glam::Vec2;

/// Illumination below which a particle is drawn without a halo
pub const GLOW_THRESHOLD: f32 = 0.1;

/// Colors and proportions of a beam
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamStyle {
    /// Tint of the glow and cone
    pub color: Color,
    /// Tint of the bright core
    pub core_color: Color,
    /// Overall opacity in 0..1 before attenuation
    pub opacity: f32,
    /// Main cone width relative to the geometric beam width
    pub cone_scale: f32,
    /// Outer glow width relative to the main cone
    pub glow_scale: f32,
    /// Core width relative to the geometric beam width
    pub core_scale: f32,
}

impl BeamStyle {
    pub fn new(color: Color, opacity: f32) -> Self {
        Self {
            color,
            core_color: Color::WHITE,
            opacity: opacity.clamp(0.0, 1.0),
            cone_scale: 1.0,
            glow_scale: 1.5,
            core_scale: 0.3,
        }
    }
}

/// Peak opacity of the main cone for this class, style and beam
pub fn cone_opacity(beam: &BeamGeometry, class: ScatteringClass, style: &BeamStyle) -> f32 {
    let class_scale = match class {
        ScatteringClass::Colloidal => 0.95,
        ScatteringClass::Partial => 0.5,
        ScatteringClass::Transparent => 0.15,
    };
    style.opacity * beam.intensity * class_scale * beam.attenuation_at(0.0)
}

/// Draw the beam from its entry to its exit point in additive blending
pub fn draw_beam<C: Canvas2D + ?Sized>(
    canvas: &mut C,
    beam: &BeamGeometry,
    class: ScatteringClass,
    style: &BeamStyle,
) {
    let from = beam.entry_distance;
    let to = from + beam.traversal();
    if to - from <= f32::EPSILON || style.opacity <= 0.0 {
        return;
    }

    let start = beam.point_at(from);
    let end = beam.point_at(to);
    let peak = style.opacity * beam.intensity;
    // Attenuation sampled at four stations along the traversal
    let att = |f: f32| beam.attenuation_at((to - from) * f);
    let along = |alphas: [f32; 4], color: Color| {
        let stops: Vec<(f32, Color)> = alphas
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let f = i as f32 / 3.0;
                (f, color.with_alpha(peak * a * att(f)))
            })
            .collect();
        Paint::linear(start, end, &stops)
    };

    canvas.set_blend_mode(BlendMode::Additive);
    match class {
        ScatteringClass::Colloidal => {
            let glow = beam.cone(from, to, style.cone_scale * style.glow_scale);
            canvas.fill_path(&Path::polygon(glow.to_vec()), &along([0.35, 0.25, 0.17, 0.1], style.color));

            let cone = beam.cone(from, to, style.cone_scale);
            canvas.fill_path(&Path::polygon(cone.to_vec()), &along([0.95, 0.85, 0.7, 0.5], style.color));

            let core = beam.cone(from, to, style.core_scale);
            canvas.fill_path(&Path::polygon(core.to_vec()), &along([1.0, 0.9, 0.75, 0.6], style.core_color));
        }
        ScatteringClass::Partial => {
            let haze = beam.cone(from, to, style.cone_scale);
            canvas.fill_path(&Path::polygon(haze.to_vec()), &along([0.15, 0.12, 0.1, 0.08], style.color));
            canvas.stroke_path(
                &Path::line(start, end),
                &along([0.5, 0.45, 0.4, 0.35], style.color),
                &Stroke::dashed((beam.base_width * style.core_scale).max(2.0), 8.0, 12.0),
            );
        }
        ScatteringClass::Transparent => {
            canvas.stroke_path(
                &Path::line(start, end),
                &along([0.15, 0.08, 0.04, 0.02], style.color),
                &Stroke::new((beam.base_width * style.core_scale).clamp(1.0, 3.0)),
            );
        }
    }
    canvas.set_blend_mode(BlendMode::Normal);
}

/// Rise and fall of the illumination accumulator per nominal frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowRates {
    pub rise: f32,
    pub fall: f32,
}

impl GlowRates {
    pub fn new(rise: f32, fall: f32) -> Self {
        Self { rise, fall }
    }
}

/// Update a particle's accumulator; returns whether it gained light this frame
///
/// `weight` is the beam's Gaussian weight at the particle, `response` the class multiplier.
pub fn illuminate(particle: &mut Particle, weight: Option<f32>, response: f32, rates: GlowRates) -> bool {
    match weight {
        Some(w) if w > 0.0 && response > 0.0 => {
            particle.illumination = (particle.illumination + rates.rise * w * response).min(1.0);
            true
        }
        _ => {
            particle.illumination = (particle.illumination - rates.fall).max(0.0);
            false
        }
    }
}

/// Light every particle of `field` from `beam`; returns how many are visibly lit
///
/// With no beam (light off or no entry point) every particle decays.
pub fn illuminate_field(
    field: &mut ParticleField,
    beam: Option<&BeamGeometry>,
    response: f32,
    rates: GlowRates,
) -> usize {
    let mut lit = 0;
    for p in field.particles_mut() {
        let weight = beam.and_then(|b| {
            b.weight_at(p.position, p.radius(), GAUSSIAN_SHARPNESS)
                .map(|w| w * b.intensity)
        });
        illuminate(p, weight, response, rates);
        if p.illumination > GLOW_THRESHOLD {
            lit += 1;
        }
    }
    lit
}

/// Colors and size of a particle halo
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlowStyle {
    pub inner: Color,
    pub outer: Color,
    /// Halo radius relative to the particle radius
    pub radius_scale: f32,
}

impl GlowStyle {
    pub fn new(inner: Color, outer: Color, radius_scale: f32) -> Self {
        Self {
            inner,
            outer,
            radius_scale,
        }
    }
}

/// Draw a layered radial halo around a lit particle
pub fn draw_particle_glow<C: Canvas2D + ?Sized>(
    canvas: &mut C,
    center: Vec2,
    radius: f32,
    illumination: f32,
    style: &GlowStyle,
) {
    if illumination <= GLOW_THRESHOLD {
        return;
    }
    let halo = radius * style.radius_scale;
    canvas.set_blend_mode(BlendMode::Additive);
    canvas.fill_circle(
        center,
        halo,
        &Paint::radial(
            center,
            halo,
            &[
                (0.0, style.inner.fade(illumination)),
                (0.4, style.outer.fade(illumination * 0.5)),
                (1.0, Color::TRANSPARENT),
            ],
        ),
    );
    canvas.fill_circle(
        center,
        radius * 1.2,
        &Paint::radial(
            center,
            radius * 1.2,
            &[(0.0, Color::WHITE.with_alpha(illumination)), (1.0, style.inner.fade(0.0))],
        ),
    );
    canvas.set_blend_mode(BlendMode::Normal);
}
