//! Light sources and beam geometry
//!
//! A [`LightSource`] is rebuilt every frame from the current parameters. [`resolve`] intersects
//! its aim ray with a container to produce a [`BeamGeometry`], which answers width, attenuation
//! and Gaussian-profile questions at any distance along the beam.

use crate::canvas::Rect;
use glam::Vec2;

/// Default sharpness `k` of the Gaussian cross-section, `exp(-k n²)`
pub const GAUSSIAN_SHARPNESS: f32 = 2.0;

/// An emitting element: flashlight, headlight or laser
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSource {
    pub position: Vec2,
    /// Aim direction; need not be normalized, zero is treated as "no beam"
    pub direction: Vec2,
    /// Output in 0..1
    pub intensity: f32,
    /// Half of the divergence angle, in radians
    pub half_angle: f32,
    /// Nominal unattenuated range in pixels
    pub range: f32,
    /// Beam width at the emitter in pixels
    pub base_width: f32,
}

impl LightSource {
    pub fn new(position: Vec2, direction: Vec2, intensity: f32) -> Self {
        Self {
            position,
            direction,
            intensity: intensity.clamp(0.0, 1.0),
            half_angle: 0.0,
            range: 400.0,
            base_width: 8.0,
        }
    }

    /// Emitter placed `offset` pixels from `target` on the polar angle `angle_deg`, aiming at it
    pub fn aimed_at(target: Vec2, angle_deg: f32, offset: f32, intensity: f32) -> Self {
        let direction = Vec2::from_angle(angle_deg.to_radians());
        Self::new(target - direction * offset, direction, intensity)
    }

    pub fn with_half_angle(mut self, radians: f32) -> Self {
        self.half_angle = radians.clamp(0.0, std::f32::consts::FRAC_PI_2 - 0.01);
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range.max(0.0);
        self
    }

    pub fn with_base_width(mut self, width: f32) -> Self {
        self.base_width = width.max(0.0);
        self
    }

    /// Width gained per pixel travelled
    pub fn spread_rate(&self) -> f32 {
        2.0 * self.half_angle.tan()
    }

    pub fn unit_direction(&self) -> Option<Vec2> {
        self.direction.try_normalize()
    }
}

/// Beer-Lambert extinction combined with a density derating term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extinction {
    /// Attenuation per pixel of path
    pub coefficient: f32,
    /// Medium density in 0..1
    pub density: f32,
    /// Fraction of intensity lost at full density, independent of path length
    pub loss_fraction: f32,
}

impl Extinction {
    pub const NONE: Extinction = Extinction {
        coefficient: 0.0,
        density: 0.0,
        loss_fraction: 0.0,
    };

    pub fn new(coefficient: f32, density: f32, loss_fraction: f32) -> Self {
        Self {
            coefficient: coefficient.max(0.0),
            density: density.clamp(0.0, 1.0),
            loss_fraction: loss_fraction.clamp(0.0, 1.0),
        }
    }

    /// `exp(-k d) · (1 - density · loss)`, clamped to 0..1
    pub fn attenuation(&self, distance: f32) -> f32 {
        let d = distance.max(0.0);
        let value = (-self.coefficient * d).exp() * (1.0 - self.density * self.loss_fraction);
        if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// A liquid-filled vessel: the walls, floor and the liquid surface line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Container {
    pub bounds: Rect,
    /// Height of the liquid surface, between the rim and the floor
    pub surface_y: f32,
}

impl Container {
    pub fn new(bounds: Rect, surface_y: f32) -> Self {
        Self {
            bounds,
            surface_y: surface_y.clamp(bounds.min.y, bounds.max.y),
        }
    }

    /// Region actually holding liquid
    pub fn liquid(&self) -> Rect {
        Rect::from_min_max(Vec2::new(self.bounds.min.x, self.surface_y), self.bounds.max)
    }
}

/// Per-frame beam through a medium
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamGeometry {
    pub origin: Vec2,
    /// Unit aim direction
    pub direction: Vec2,
    pub entry: Vec2,
    pub exit: Vec2,
    /// Distance from the origin to the entry point
    pub entry_distance: f32,
    pub base_width: f32,
    pub spread_rate: f32,
    pub range: f32,
    pub intensity: f32,
    pub extinction: Extinction,
}

impl BeamGeometry {
    /// Beam travelling through the medium from its origin, with no container to enter
    pub fn open(source: &LightSource, extinction: Extinction) -> Option<Self> {
        let direction = source.unit_direction()?;
        Some(Self {
            origin: source.position,
            direction,
            entry: source.position,
            exit: source.position + direction * source.range,
            entry_distance: 0.0,
            base_width: source.base_width,
            spread_rate: source.spread_rate(),
            range: source.range,
            intensity: source.intensity,
            extinction,
        })
    }

    /// Distance from entry to exit
    pub fn traversal(&self) -> f32 {
        self.entry.distance(self.exit)
    }

    /// Beam width at distance `d` from the origin
    pub fn width_at(&self, d: f32) -> f32 {
        self.base_width + d.max(0.0) * self.spread_rate
    }

    /// Attenuation after `d` pixels of medium, zero beyond the nominal range
    pub fn attenuation_at(&self, d: f32) -> f32 {
        if d > self.range {
            return 0.0;
        }
        self.extinction.attenuation(d)
    }

    pub fn point_at(&self, d: f32) -> Vec2 {
        self.origin + self.direction * d
    }

    /// Unit vector perpendicular to the aim, rotated clockwise on screen
    pub fn normal(&self) -> Vec2 {
        self.direction.perp()
    }

    /// Longitudinal distance from the origin and signed lateral offset of `p`
    pub fn project(&self, p: Vec2) -> (f32, f32) {
        let rel = p - self.origin;
        (rel.dot(self.direction), rel.dot(self.normal()))
    }

    /// Gaussian illumination weight of a particle of `radius` at `p`
    ///
    /// `None` when the particle lies before the entry point, past the exit, or outside the beam's
    /// half-width (widened by the particle radius) at its longitudinal position.
    pub fn weight_at(&self, p: Vec2, radius: f32, sharpness: f32) -> Option<f32> {
        let (d, lateral) = self.project(p);
        let exit_distance = self.origin.distance(self.exit);
        if d < self.entry_distance || d > exit_distance {
            return None;
        }
        let half = self.width_at(d) * 0.5 + radius.max(0.0);
        if half <= f32::EPSILON {
            return None;
        }
        let n = lateral.abs() / half;
        if n >= 1.0 {
            return None;
        }
        Some((-sharpness * n * n).exp() * self.attenuation_at(d - self.entry_distance))
    }

    /// Corners of the beam cone between distances `from` and `to` from the origin
    pub fn cone(&self, from: f32, to: f32, width_scale: f32) -> [Vec2; 4] {
        let normal = self.normal();
        let near = self.width_at(from) * 0.5 * width_scale;
        let far = self.width_at(to) * 0.5 * width_scale;
        let a = self.point_at(from);
        let b = self.point_at(to);
        [a - normal * near, b - normal * far, b + normal * far, a + normal * near]
    }
}

/// Intersect the light's aim ray with `container`
///
/// The liquid surface is tested first, then the walls and floor; the nearest hit in front of the
/// emitter wins. An emitter already inside the liquid enters at its own position. The exit lies
/// `traversal` pixels past the entry along the aim; clipping it to the container is left to the
/// renderer. Returns `None` for a degenerate aim or a ray that misses the container.
pub fn resolve(
    source: &LightSource,
    container: &Container,
    traversal: f32,
    extinction: Extinction,
) -> Option<BeamGeometry> {
    let direction = source.unit_direction()?;
    let origin = source.position;
    let liquid = container.liquid();

    let entry_distance = if liquid.contains(origin) {
        0.0
    } else {
        entry_hit(origin, direction, &liquid)?
    };
    let entry = origin + direction * entry_distance;

    Some(BeamGeometry {
        origin,
        direction,
        entry,
        exit: entry + direction * traversal.max(0.0),
        entry_distance,
        base_width: source.base_width,
        spread_rate: source.spread_rate(),
        range: source.range,
        intensity: source.intensity,
        extinction,
    })
}

fn entry_hit(origin: Vec2, dir: Vec2, liquid: &Rect) -> Option<f32> {
    let horizontal = |y: f32| -> Option<f32> {
        if dir.y.abs() <= f32::EPSILON {
            return None;
        }
        let t = (y - origin.y) / dir.y;
        let x = origin.x + dir.x * t;
        (t >= 0.0 && x >= liquid.min.x && x <= liquid.max.x).then_some(t)
    };
    let vertical = |x: f32| -> Option<f32> {
        if dir.x.abs() <= f32::EPSILON {
            return None;
        }
        let t = (x - origin.x) / dir.x;
        let y = origin.y + dir.y * t;
        (t >= 0.0 && y >= liquid.min.y && y <= liquid.max.y).then_some(t)
    };

    let surface = horizontal(liquid.min.y);
    [vertical(liquid.min.x), vertical(liquid.max.x), horizontal(liquid.max.y)]
        .into_iter()
        .flatten()
        .fold(surface, |best, t| match best {
            Some(b) if b <= t => Some(b),
            _ => Some(t),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cup() -> Container {
        Container::new(Rect::new(80.0, 180.0, 150.0, 250.0), 200.0)
    }

    #[test]
    fn test_aimed_at_places_emitter_on_polar_offset() {
        let target = Vec2::new(155.0, 305.0);
        let source = LightSource::aimed_at(target, 90.0, 120.0, 1.0);
        assert!(source.position.abs_diff_eq(Vec2::new(155.0, 185.0), 1e-3));
        assert!(source.direction.abs_diff_eq(Vec2::Y, 1e-5));
    }

    #[test]
    fn test_entry_through_liquid_surface() {
        let source = LightSource::aimed_at(cup().bounds.center(), 60.0, 200.0, 1.0);
        let beam = resolve(&source, &cup(), 300.0, Extinction::NONE).unwrap();
        assert!((beam.entry.y - 200.0).abs() < 1e-3);
        assert!(beam.entry.x >= 80.0 && beam.entry.x <= 230.0);
        assert!((beam.traversal() - 300.0).abs() < 1e-2);
    }

    #[test]
    fn test_entry_through_side_wall() {
        let source = LightSource::new(Vec2::new(0.0, 300.0), Vec2::X, 1.0);
        let beam = resolve(&source, &cup(), 300.0, Extinction::NONE).unwrap();
        assert!(beam.entry.abs_diff_eq(Vec2::new(80.0, 300.0), 1e-3));
        assert!((beam.entry_distance - 80.0).abs() < 1e-3);
    }

    #[test]
    fn test_nearest_wall_wins() {
        let source = LightSource::new(Vec2::new(400.0, 300.0), -Vec2::X, 1.0);
        let beam = resolve(&source, &cup(), 300.0, Extinction::NONE).unwrap();
        assert!((beam.entry.x - 230.0).abs() < 1e-3);
    }

    #[test]
    fn test_ray_diverging_from_container_has_no_entry() {
        let source = LightSource::new(Vec2::new(0.0, 300.0), -Vec2::X, 1.0);
        assert!(resolve(&source, &cup(), 300.0, Extinction::NONE).is_none());
        let above = LightSource::new(Vec2::new(155.0, 100.0), -Vec2::Y, 1.0);
        assert!(resolve(&above, &cup(), 300.0, Extinction::NONE).is_none());
    }

    #[test]
    fn test_degenerate_aim_has_no_entry() {
        let zero = LightSource::new(Vec2::new(0.0, 300.0), Vec2::ZERO, 1.0);
        assert!(resolve(&zero, &cup(), 300.0, Extinction::NONE).is_none());
        let nan = LightSource::new(Vec2::new(0.0, 300.0), Vec2::new(f32::NAN, 1.0), 1.0);
        assert!(resolve(&nan, &cup(), 300.0, Extinction::NONE).is_none());
        assert!(BeamGeometry::open(&zero, Extinction::NONE).is_none());
    }

    #[test]
    fn test_emitter_inside_liquid_enters_immediately() {
        let source = LightSource::new(Vec2::new(100.0, 300.0), Vec2::X, 1.0);
        let beam = resolve(&source, &cup(), 50.0, Extinction::NONE).unwrap();
        assert_eq!(beam.entry_distance, 0.0);
    }

    #[test]
    fn test_attenuation_monotone_and_bounded() {
        let ext = Extinction::new(0.02, 0.8, 0.5);
        assert!(ext.attenuation(0.0) <= 1.0);
        let mut last = ext.attenuation(0.0);
        for i in 1..200 {
            let next = ext.attenuation(i as f32 * 5.0);
            assert!(next <= last);
            assert!(next >= 0.0);
            last = next;
        }
        assert_eq!(ext.attenuation(-10.0), ext.attenuation(0.0));
    }

    #[test]
    fn test_attenuation_zero_beyond_range() {
        let source = LightSource::new(Vec2::ZERO, Vec2::X, 1.0).with_range(100.0);
        let beam = BeamGeometry::open(&source, Extinction::NONE).unwrap();
        assert_eq!(beam.attenuation_at(50.0), 1.0);
        assert_eq!(beam.attenuation_at(150.0), 0.0);
    }

    #[test]
    fn test_width_grows_linearly() {
        let source = LightSource::new(Vec2::ZERO, Vec2::X, 1.0)
            .with_base_width(40.0)
            .with_half_angle(0.3);
        let beam = BeamGeometry::open(&source, Extinction::NONE).unwrap();
        let expected = 40.0 + 100.0 * 2.0 * 0.3f32.tan();
        assert!((beam.width_at(100.0) - expected).abs() < 1e-3);
    }

    #[test]
    fn test_gaussian_weight_peaks_on_axis() {
        let source = LightSource::new(Vec2::ZERO, Vec2::X, 1.0).with_base_width(20.0);
        let beam = BeamGeometry::open(&source, Extinction::NONE).unwrap();
        let center = beam.weight_at(Vec2::ZERO, 0.0, GAUSSIAN_SHARPNESS).unwrap();
        assert!((center - 1.0).abs() < 1e-6);
        let off = beam.weight_at(Vec2::new(0.0, 5.0), 0.0, GAUSSIAN_SHARPNESS).unwrap();
        assert!(off < center);
        assert!(beam.weight_at(Vec2::new(0.0, 10.5), 0.0, GAUSSIAN_SHARPNESS).is_none());
        assert!(beam.weight_at(Vec2::new(-1.0, 0.0), 0.0, GAUSSIAN_SHARPNESS).is_none());
    }
}
