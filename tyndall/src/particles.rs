//! Particle field: the dispersed phase of a medium
//!
//! A field owns a batch of particles living inside a container's bounds and advances them with
//! one of four motion rules. Velocities are in pixels per nominal frame and `dt` is measured in
//! nominal frames, so a fixed-step driver passes `1.0` every tick.

use crate::canvas::Rect;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// One dispersed-phase unit: a molecule, droplet or grain
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    radius: f32,
    /// Scattered-light accumulator in 0..1
    pub illumination: f32,
    pub settled: bool,
    /// Depth at which a settling particle freezes
    pub settle_depth: f32,
    /// Phase offset for periodic sway
    pub phase: f32,
    /// Distance from the viewer in 0..1, used for depth-sorted drawing
    pub depth: f32,
    pub opacity: f32,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius: radius.max(0.0),
            illumination: 0.0,
            settled: false,
            settle_depth: f32::INFINITY,
            phase: 0.0,
            depth: 0.5,
            opacity: 1.0,
        }
    }

    /// Radius fixed at creation
    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// How particles move each step
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionRule {
    /// Random velocity kicks, clamped and damped, reflecting off the bounds
    Brownian {
        jitter: f32,
        max_speed: f32,
        damping: f32,
        restitution: f32,
    },
    /// Steady descent scaled by time acceleration until each particle's settle depth
    Settling { rate: f32, sway: f32 },
    /// Horizontal drift against the wind with vertical sway; particles leaving the left edge
    /// respawn unlit along the right edge
    Drift { wind: f32, sway: f32, turbulence: f32 },
    /// No velocity, only sub-pixel positional jitter
    Static { jitter: f32 },
}

impl MotionRule {
    pub fn brownian(jitter: f32, max_speed: f32) -> Self {
        MotionRule::Brownian {
            jitter,
            max_speed,
            damping: 1.0,
            restitution: 1.0,
        }
    }
}

/// Parameters for a freshly seeded population
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub count: usize,
    /// Container bounds the particles never leave
    pub bounds: Rect,
    /// Region particles are spawned in; intersected with `bounds`
    pub spawn: Rect,
    pub radius: (f32, f32),
    pub velocity_x: (f32, f32),
    pub velocity_y: (f32, f32),
    pub opacity: (f32, f32),
    /// Settle depth of the first particle and the increment per particle index
    pub settle_line: Option<(f32, f32)>,
    pub rule: MotionRule,
}

impl FieldConfig {
    pub fn new(count: usize, bounds: Rect, rule: MotionRule) -> Self {
        Self {
            count,
            bounds,
            spawn: bounds,
            radius: (1.0, 1.0),
            velocity_x: (0.0, 0.0),
            velocity_y: (0.0, 0.0),
            opacity: (1.0, 1.0),
            settle_line: None,
            rule,
        }
    }

    pub fn with_spawn(mut self, spawn: Rect) -> Self {
        self.spawn = spawn;
        self
    }

    pub fn with_radius(mut self, min: f32, max: f32) -> Self {
        self.radius = (min, max);
        self
    }

    /// Initial velocity uniform in `±speed` on both axes
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.velocity_x = (-speed, speed);
        self.velocity_y = (-speed, speed);
        self
    }

    pub fn with_velocity(mut self, x: (f32, f32), y: (f32, f32)) -> Self {
        self.velocity_x = x;
        self.velocity_y = y;
        self
    }

    pub fn with_opacity(mut self, min: f32, max: f32) -> Self {
        self.opacity = (min, max);
        self
    }

    pub fn with_settle_line(mut self, first: f32, step: f32) -> Self {
        self.settle_line = Some((first, step));
        self
    }
}

/// Width of the strip along the right edge where drifting particles re-enter
const RESPAWN_BAND: f32 = 150.0;

/// Uniform sample in `[lo, hi)`, collapsing to `lo` for an empty range
pub(crate) fn uniform(rng: &mut StdRng, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// A seeded population of particles and the rule that moves them
pub struct ParticleField {
    particles: Vec<Particle>,
    config: FieldConfig,
    rng: StdRng,
    time_acceleration: f32,
}

impl ParticleField {
    /// Create and populate a field; `seed` makes the population reproducible
    pub fn new(config: FieldConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut field = Self {
            particles: Vec::new(),
            config: FieldConfig::new(0, Rect::new(0.0, 0.0, 0.0, 0.0), MotionRule::Static { jitter: 0.0 }),
            rng,
            time_acceleration: 1.0,
        };
        field.initialize(config);
        field
    }

    /// Discard the population and seed a new one from `config`
    pub fn initialize(&mut self, config: FieldConfig) {
        let bounds = config.bounds;
        let spawn = config.spawn.intersect(&bounds).unwrap_or(bounds);

        self.particles = (0..config.count)
            .map(|i| {
                let rng = &mut self.rng;
                let position = Vec2::new(
                    uniform(rng, spawn.min.x, spawn.max.x),
                    uniform(rng, spawn.min.y, spawn.max.y),
                );
                let velocity = Vec2::new(
                    uniform(rng, config.velocity_x.0, config.velocity_x.1),
                    uniform(rng, config.velocity_y.0, config.velocity_y.1),
                );
                let radius = uniform(rng, config.radius.0, config.radius.1);
                let mut particle = Particle::new(position, velocity, radius);
                particle.phase = uniform(rng, 0.0, std::f32::consts::TAU);
                particle.depth = uniform(rng, 0.0, 1.0);
                particle.opacity = uniform(rng, config.opacity.0, config.opacity.1);
                if let Some((first, step)) = config.settle_line {
                    particle.settle_depth = (first + i as f32 * step).min(bounds.max.y);
                }
                particle
            })
            .collect();

        log::debug!("Seeded {} particles in {:?}", self.particles.len(), bounds);
        self.config = config;
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn bounds(&self) -> Rect {
        self.config.bounds
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn set_rule(&mut self, rule: MotionRule) {
        self.config.rule = rule;
    }

    /// Only the settling rule is affected
    pub fn set_time_acceleration(&mut self, factor: f32) {
        self.time_acceleration = factor.max(0.0);
    }

    /// Advance every particle by `dt` nominal frames; `elapsed` drives periodic sway
    pub fn step(&mut self, dt: f32, elapsed: f32) {
        let bounds = self.config.bounds;
        let spawn = self.config.spawn.intersect(&bounds).unwrap_or(bounds);
        let rule = self.config.rule;
        let accel = self.time_acceleration;
        let rng = &mut self.rng;

        for p in &mut self.particles {
            match rule {
                MotionRule::Brownian {
                    jitter,
                    max_speed,
                    damping,
                    restitution,
                } => {
                    p.velocity += Vec2::new(uniform(rng, -jitter, jitter), uniform(rng, -jitter, jitter));
                    p.velocity = p.velocity.clamp(Vec2::splat(-max_speed), Vec2::splat(max_speed)) * damping;
                    p.position += p.velocity * dt;
                    reflect(p, bounds, restitution);
                }
                MotionRule::Settling { rate, sway } => {
                    if p.settled {
                        continue;
                    }
                    p.position.y += p.velocity.y.max(0.0) * accel * rate * dt;
                    p.position.x += (elapsed * 2.0 + p.phase).sin() * sway * dt;
                    p.position.x = p.position.x.clamp(bounds.min.x, bounds.max.x);
                    let floor = p.settle_depth.min(bounds.max.y);
                    if p.position.y >= floor {
                        p.position.y = floor;
                        p.settled = true;
                    }
                    p.position.y = p.position.y.clamp(bounds.min.y, bounds.max.y);
                }
                MotionRule::Drift {
                    wind,
                    sway,
                    turbulence,
                } => {
                    p.position.x += p.velocity.x * wind * dt;
                    p.position.y += ((elapsed * 2.0 + p.phase).sin() * p.velocity.y * sway
                        + (elapsed * 1.5 + p.position.x * 0.01).cos() * turbulence)
                        * dt;
                    if p.position.x < bounds.min.x {
                        let band = (spawn.max.x - spawn.min.x).min(RESPAWN_BAND);
                        p.position.x = uniform(rng, spawn.max.x - band, spawn.max.x);
                        p.position.y = uniform(rng, spawn.min.y, spawn.max.y);
                        p.depth = uniform(rng, 0.0, 1.0);
                        p.illumination = 0.0;
                    } else if p.position.x > bounds.max.x {
                        p.position.x = spawn.min.x;
                    }
                    p.position = bounds.clamp(p.position);
                }
                MotionRule::Static { jitter } => {
                    p.position += Vec2::new(uniform(rng, -jitter, jitter), uniform(rng, -jitter, jitter));
                    p.position = bounds.clamp(p.position);
                }
            }
        }
    }

    /// Re-randomise depths and clear settled and illumination state
    pub fn reset(&mut self) {
        let bounds = self.config.bounds;
        let spawn = self.config.spawn.intersect(&bounds).unwrap_or(bounds);
        for p in &mut self.particles {
            p.position.y = uniform(&mut self.rng, spawn.min.y, spawn.max.y);
            p.settled = false;
            p.illumination = 0.0;
        }
    }
}

fn reflect(p: &mut Particle, bounds: Rect, restitution: f32) {
    if p.position.x < bounds.min.x || p.position.x > bounds.max.x {
        p.velocity.x = -p.velocity.x * restitution;
    }
    if p.position.y < bounds.min.y || p.position.y > bounds.max.y {
        p.velocity.y = -p.velocity.y * restitution;
    }
    p.position = bounds.clamp(p.position);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(15.0, 30.0, 90.0, 130.0)
    }

    fn all_rules() -> Vec<MotionRule> {
        vec![
            MotionRule::Brownian {
                jitter: 0.5,
                max_speed: 3.0,
                damping: 0.99,
                restitution: 0.5,
            },
            MotionRule::Settling { rate: 0.5, sway: 0.3 },
            MotionRule::Drift {
                wind: 4.0,
                sway: 0.4,
                turbulence: 0.2,
            },
            MotionRule::Static { jitter: 0.3 },
        ]
    }

    #[test]
    fn test_positions_stay_in_bounds_for_every_rule() {
        for (seed, rule) in all_rules().into_iter().enumerate() {
            let config = FieldConfig::new(50, bounds(), rule)
                .with_radius(1.0, 4.0)
                .with_velocity((-1.1, -0.3), (0.1, 0.4))
                .with_settle_line(140.0, 0.8);
            let mut field = ParticleField::new(config, Some(seed as u64));
            field.set_time_acceleration(10.0);
            for frame in 0..2000 {
                field.step(1.0, frame as f32 * 0.016);
                for p in field.particles() {
                    assert!(bounds().contains(p.position), "{:?} escaped: {:?}", rule, p.position);
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_population() {
        let config = FieldConfig::new(20, bounds(), MotionRule::Static { jitter: 0.0 }).with_radius(1.0, 3.0);
        let a = ParticleField::new(config.clone(), Some(7));
        let b = ParticleField::new(config, Some(7));
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_radius_within_configured_range() {
        let config = FieldConfig::new(200, bounds(), MotionRule::brownian(0.05, 0.5)).with_radius(2.0, 4.0);
        let mut field = ParticleField::new(config, Some(1));
        let before: Vec<f32> = field.particles().iter().map(|p| p.radius()).collect();
        for _ in 0..100 {
            field.step(1.0, 0.0);
        }
        for (p, r) in field.particles().iter().zip(before) {
            assert!((2.0..=4.0).contains(&p.radius()));
            assert_eq!(p.radius(), r);
        }
    }

    #[test]
    fn test_settling_particle_freezes_at_threshold() {
        let config = FieldConfig::new(1, bounds(), MotionRule::Settling { rate: 0.5, sway: 0.3 })
            .with_velocity((0.0, 0.0), (0.1, 0.4))
            .with_settle_line(140.0, 0.8);
        let mut field = ParticleField::new(config, Some(3));
        field.particles_mut()[0].position.y = 30.0;

        let mut last_y = 30.0;
        let mut frames = 0;
        while !field.particles()[0].settled {
            field.step(1.0, frames as f32 * 0.016);
            let y = field.particles()[0].position.y;
            assert!(y > last_y, "particle stopped descending at {}", y);
            last_y = y;
            frames += 1;
            assert!(frames < 10_000);
        }
        assert!((last_y - 140.0).abs() < 1e-4);

        let frozen = field.particles()[0].position;
        for i in 0..100 {
            field.step(1.0, i as f32);
        }
        assert_eq!(field.particles()[0].position, frozen);
    }

    #[test]
    fn test_settle_depth_capped_at_container_floor() {
        let config = FieldConfig::new(40, bounds(), MotionRule::Settling { rate: 0.5, sway: 0.0 })
            .with_settle_line(140.0, 0.8);
        let field = ParticleField::new(config, Some(0));
        assert!(field.particles().iter().all(|p| p.settle_depth <= bounds().max.y));
    }

    #[test]
    fn test_reset_unsettles_and_darkens() {
        let config = FieldConfig::new(10, bounds(), MotionRule::Settling { rate: 1.0, sway: 0.0 })
            .with_velocity((0.0, 0.0), (0.3, 0.4))
            .with_settle_line(140.0, 0.8);
        let mut field = ParticleField::new(config, Some(11));
        field.set_time_acceleration(10.0);
        for _ in 0..500 {
            field.step(1.0, 0.0);
        }
        for p in field.particles_mut() {
            p.illumination = 1.0;
        }
        assert!(field.particles().iter().all(|p| p.settled));

        field.reset();
        assert!(field.particles().iter().all(|p| !p.settled && p.illumination == 0.0));
    }

    #[test]
    fn test_drift_respawns_along_right_edge_unlit() {
        let config = FieldConfig::new(20, Rect::new(50.0, 30.0, 750.0, 270.0), MotionRule::Drift {
            wind: 1.0,
            sway: 0.0,
            turbulence: 0.0,
        })
        .with_velocity((-5.0, -5.0), (0.0, 0.0));
        let mut field = ParticleField::new(config, Some(8));
        for p in field.particles_mut() {
            p.position.x = 52.0;
            p.illumination = 0.8;
            p.depth = 0.25;
        }
        field.step(1.0, 0.0);

        let xs: Vec<f32> = field.particles().iter().map(|p| p.position.x).collect();
        assert!(xs.iter().all(|x| (650.0..=800.0).contains(x)), "{:?}", xs);
        assert!(xs.iter().any(|x| (x - xs[0]).abs() > 1.0));
        assert!(field.particles().iter().all(|p| p.illumination == 0.0));
        assert!(field.particles().iter().any(|p| p.depth != 0.25));
        assert!(field.particles().iter().all(|p| (0.0..1.0).contains(&p.depth)));
    }
}
