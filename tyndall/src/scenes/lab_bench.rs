//! Lab bench: one laser through five beakers
//!
//! A horizontal red laser crosses pure water, sugar water, starch, milk and a sand suspension.
//! Each beaker resolves its own segment of the beam; the sand settles over (accelerated) time.

use crate::beam::{resolve, BeamGeometry, Container, Extinction, LightSource};
use crate::canvas::{BlendMode, Canvas2D, Color, Paint, Path, Rect, Stroke};
use crate::frame::{self, GlowRates, GlowStyle};
use crate::medium::{medium, Medium, ScatteringClass, BENCH_SUBSTANCES};
use crate::particles::{FieldConfig, MotionRule, ParticleField};
use crate::scenes::SceneParams;
use crate::stats::FrameStats;
use glam::Vec2;

pub const SIZE: Vec2 = Vec2::new(780.0, 340.0);
pub const TIME_STEP: f32 = 0.016;
/// Wall-clock seconds represented by one frame
const FRAME_SECONDS: f32 = 1.0 / 60.0;

const BENCH_Y: f32 = SIZE.y - 50.0;
const BEAKER_WIDTH: f32 = 120.0;
const BEAKER_HEIGHT: f32 = 180.0;
const BEAKER_SPACING: f32 = 145.0;
const START_X: f32 = 45.0;
const BEAKER_Y: f32 = BENCH_Y - BEAKER_HEIGHT - 15.0;
const LIQUID_Y: f32 = BEAKER_Y + 18.0;
const LASER_Y: f32 = BEAKER_Y + 90.0;
const EMITTER_X: f32 = 8.0;
const EMITTER_WIDTH: f32 = 35.0;
/// Core width of the laser; a particle is lit when within half of it plus its radius
const LASER_WIDTH: f32 = 12.0;

fn beaker_x(index: usize) -> f32 {
    START_X + index as f32 * BEAKER_SPACING
}

fn container(index: usize) -> Container {
    Container::new(Rect::new(beaker_x(index), BEAKER_Y, BEAKER_WIDTH, BEAKER_HEIGHT), LIQUID_Y)
}

fn field_config(index: usize, m: &Medium) -> FieldConfig {
    let x = beaker_x(index);
    let bounds = Rect::from_min_max(Vec2::new(x + 15.0, BEAKER_Y + 30.0), Vec2::new(x + 105.0, BEAKER_Y + 160.0));
    let config = if m.sediments {
        FieldConfig::new(m.particle_count, bounds, MotionRule::Settling { rate: 0.5, sway: 0.3 })
            .with_velocity((-0.2, 0.2), (0.1, 0.4))
            .with_settle_line(BEAKER_Y + 140.0, 0.8)
    } else {
        let rule = MotionRule::Brownian {
            jitter: 0.04,
            max_speed: 0.4,
            damping: 0.99,
            restitution: 0.5,
        };
        FieldConfig::new(m.particle_count, bounds, rule).with_speed(0.2)
    };
    config.with_radius(m.particle_radius * 0.7, m.particle_radius * 1.3)
}

/// The laser as emitted, before it meets any beaker
pub fn laser(params: &SceneParams) -> LightSource {
    LightSource::new(Vec2::new(EMITTER_X + EMITTER_WIDTH, LASER_Y), Vec2::X, params.light_level())
        .with_base_width(LASER_WIDTH)
        .with_range(SIZE.x)
}

/// Laser segment inside the beaker at `index`, wall to wall
fn segment(index: usize, m: &Medium, laser: &LightSource) -> Option<BeamGeometry> {
    resolve(laser, &container(index), BEAKER_WIDTH - 6.0, Extinction::new(m.extinction, 0.0, 0.0))
}

struct Beaker {
    medium: Medium,
    field: ParticleField,
}

pub struct LabBench {
    beakers: Vec<Beaker>,
    elapsed_seconds: f32,
}

impl LabBench {
    pub fn new(seed: Option<u64>) -> Self {
        let beakers = BENCH_SUBSTANCES
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let m = medium(*s);
                Beaker {
                    medium: m,
                    field: ParticleField::new(field_config(i, &m), seed.map(|base| base.wrapping_add(i as u64))),
                }
            })
            .collect();
        Self {
            beakers,
            elapsed_seconds: 0.0,
        }
    }

    /// Simulated seconds since mount or reset, sped up by the time acceleration
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed_seconds
    }

    pub fn field(&self, index: usize) -> Option<&ParticleField> {
        self.beakers.get(index).map(|b| &b.field)
    }

    pub fn class(&self, index: usize) -> Option<ScatteringClass> {
        self.beakers.get(index).map(|b| b.medium.class)
    }

    /// Re-randomise depths and clear settled and illumination state
    pub fn reset(&mut self) {
        for beaker in &mut self.beakers {
            beaker.field.reset();
        }
        self.elapsed_seconds = 0.0;
    }

    pub fn render<C: Canvas2D + ?Sized>(&mut self, canvas: &mut C, params: &SceneParams, time: f32) -> FrameStats {
        self.elapsed_seconds += params.time_acceleration * FRAME_SECONDS;
        let laser = laser(params);
        let level = laser.intensity;

        draw_bench(canvas);
        draw_emitter(canvas, params.light_on, level);

        let mut lit = 0;
        for (index, beaker) in self.beakers.iter_mut().enumerate() {
            let m = beaker.medium;
            draw_liquid(canvas, index, &m);

            let beam = if params.light_on { segment(index, &m, &laser) } else { None };
            if let Some(beam) = &beam {
                draw_laser_segment(canvas, beam, m.class, m.intensity_scale, time);
            }

            beaker.field.set_time_acceleration(params.time_acceleration);
            beaker.field.step(1.0, time);
            let response = m.class.response(m.intensity_scale);
            lit += frame::illuminate_field(&mut beaker.field, beam.as_ref(), response, GlowRates::new(0.2, 0.1));

            let glow = GlowStyle::new(Color::rgba(255, 200, 200, 0.8), Color::rgba(255, 100, 100, 0.3), 4.0);
            for p in beaker.field.particles() {
                frame::draw_particle_glow(canvas, p.position, p.radius(), p.illumination, &glow);
                let dot = Path::circle(p.position, p.radius());
                canvas.fill_path(&dot, &Paint::solid(m.particle_color));
                if p.radius() > 3.0 {
                    canvas.stroke_path(&dot, &Paint::solid(Color::WHITE.with_alpha(0.2)), &Stroke::new(0.5));
                }
            }

            draw_glass(canvas, index, &m);
            if params.light_on {
                draw_badge(canvas, index, m.class);
            }
        }

        canvas.text(
            Vec2::new(SIZE.x - 70.0, 16.0),
            &format!("t = {:.0} s (×{:.0})", self.elapsed_seconds.floor(), params.time_acceleration),
            Color::hex("#94a3b8"),
            11.0,
        );

        FrameStats {
            illuminated: lit,
            scatter_events: lit,
            ..FrameStats::default()
        }
    }
}

fn draw_bench<C: Canvas2D + ?Sized>(canvas: &mut C) {
    canvas.clear(Color::hex("#0a0f1a"));
    canvas.fill_rect(
        Rect::new(0.0, 0.0, SIZE.x, SIZE.y),
        &Paint::linear(Vec2::ZERO, Vec2::new(0.0, SIZE.y), &[(0.0, Color::hex("#0a0f1a")), (1.0, Color::hex("#1a1f2e"))]),
    );
    canvas.fill_rect(
        Rect::new(0.0, BENCH_Y, SIZE.x, SIZE.y - BENCH_Y),
        &Paint::linear(
            Vec2::new(0.0, BENCH_Y),
            Vec2::new(0.0, SIZE.y),
            &[
                (0.0, Color::hex("#374151")),
                (0.3, Color::hex("#1f2937")),
                (1.0, Color::hex("#111827")),
            ],
        ),
    );
    canvas.line(Vec2::new(0.0, BENCH_Y), Vec2::new(SIZE.x, BENCH_Y), Color::hex("#4b5563"), 2.0);
    canvas.fill_rect(Rect::new(0.0, BENCH_Y + 2.0, SIZE.x, 8.0), &Paint::solid(Color::WHITE.with_alpha(0.03)));
}

fn draw_emitter<C: Canvas2D + ?Sized>(canvas: &mut C, on: bool, level: f32) {
    let red = |a: f32| Color::rgba(239, 68, 68, a);
    let housing = Path::rounded_rect(Rect::new(EMITTER_X, LASER_Y - 18.0, EMITTER_WIDTH, 36.0), 4.0);
    canvas.fill_path(&housing, &Paint::solid(Color::hex("#1f2937")));
    canvas.stroke_path(&housing, &Paint::solid(Color::hex("#374151")), &Stroke::new(2.0));

    let lens = Vec2::new(EMITTER_X + EMITTER_WIDTH, LASER_Y);
    if on {
        canvas.set_blend_mode(BlendMode::Additive);
        canvas.fill_circle(
            lens,
            25.0,
            &Paint::radial(lens, 25.0, &[(0.0, red(level)), (0.4, red(level * 0.4)), (1.0, Color::TRANSPARENT)]),
        );
        canvas.set_blend_mode(BlendMode::Normal);
    }
    let (lens_color, led) = if on {
        (Color::hex("#ef4444"), Color::hex("#22c55e"))
    } else {
        (Color::hex("#6b7280"), Color::hex("#374151"))
    };
    canvas.fill_circle(lens - Vec2::X * 2.0, 6.0, &Paint::solid(lens_color));
    canvas.fill_circle(Vec2::new(EMITTER_X + 10.0, LASER_Y - 8.0), 3.0, &Paint::solid(led));
    canvas.text(Vec2::new(EMITTER_X + EMITTER_WIDTH / 2.0, LASER_Y + 25.0), "LASER", Color::hex("#9ca3af"), 8.0);

    if !on {
        return;
    }
    let (from, to) = (Vec2::new(lens.x + 5.0, LASER_Y), Vec2::new(SIZE.x - 15.0, LASER_Y));
    canvas.set_blend_mode(BlendMode::Additive);
    canvas.stroke_path(
        &Path::line(from, to),
        &Paint::linear(from, to, &[(0.0, red(level * 0.9)), (0.5, red(level * 0.7)), (1.0, red(level * 0.3))]),
        &Stroke::new(3.0),
    );
    canvas.line(from, to, red(level * 0.15), 12.0);
    canvas.set_blend_mode(BlendMode::Normal);

    canvas.fill_path(
        &Path::rounded_rect(Rect::new(SIZE.x - 25.0, LASER_Y - 10.0, 15.0, 20.0), 2.0),
        &Paint::solid(Color::hex("#374151")),
    );
    canvas.fill_circle(Vec2::new(SIZE.x - 17.0, LASER_Y), 4.0, &Paint::solid(red(level * 0.8)));
}

fn draw_liquid<C: Canvas2D + ?Sized>(canvas: &mut C, index: usize, m: &Medium) {
    let x = beaker_x(index);
    let depth = BEAKER_HEIGHT - 18.0;
    canvas.fill_path(
        &Path::ellipse(Vec2::new(x + BEAKER_WIDTH / 2.0 + 5.0, BENCH_Y + 3.0), Vec2::new(BEAKER_WIDTH / 2.0 - 5.0, 6.0)),
        &Paint::solid(Color::BLACK.with_alpha(0.3)),
    );
    canvas.fill_rect(
        Rect::new(x + 3.0, LIQUID_Y, BEAKER_WIDTH - 6.0, depth - 3.0),
        &Paint::linear(
            Vec2::new(x, LIQUID_Y),
            Vec2::new(x, LIQUID_Y + depth),
            &[(0.0, m.liquid_top), (0.7, m.liquid_bottom), (1.0, m.liquid_bottom)],
        ),
    );

    // Concave meniscus
    let left = x + 3.0;
    let right = x + BEAKER_WIDTH - 3.0;
    let mid = x + BEAKER_WIDTH / 2.0;
    let mut meniscus = Path::quadratic(Vec2::new(left, LIQUID_Y), Vec2::new(mid, LIQUID_Y + 8.0), Vec2::new(right, LIQUID_Y), 12)
        .points()
        .to_vec();
    meniscus.extend_from_slice(
        Path::quadratic(Vec2::new(right, LIQUID_Y + 10.0), Vec2::new(mid, LIQUID_Y + 3.0), Vec2::new(left, LIQUID_Y + 10.0), 12)
            .points(),
    );
    canvas.fill_path(&Path::polygon(meniscus), &Paint::solid(m.liquid_top));
}

fn draw_laser_segment<C: Canvas2D + ?Sized>(
    canvas: &mut C,
    beam: &BeamGeometry,
    class: ScatteringClass,
    scale: f32,
    time: f32,
) {
    let start = beam.entry + Vec2::X * 3.0;
    let end = beam.exit;
    let length = end.x - start.x;
    let level = beam.intensity * beam.attenuation_at(0.0);
    let fade = beam.attenuation_at(beam.traversal());

    canvas.set_blend_mode(BlendMode::Additive);
    match class {
        ScatteringClass::Colloidal => {
            let intensity = scale * level;
            for layer in 0..5 {
                let spread = 8.0 + layer as f32 * 8.0;
                let opacity = intensity * (0.4 - layer as f32 * 0.07);
                canvas.fill_rect(
                    Rect::new(start.x, LASER_Y - spread, length, spread * 2.0),
                    &Paint::linear(
                        Vec2::new(start.x, LASER_Y - spread),
                        Vec2::new(start.x, LASER_Y + spread),
                        &[
                            (0.0, Color::TRANSPARENT),
                            (0.3, Color::rgba(255, 120, 120, opacity * 0.3)),
                            (0.5, Color::rgba(255, 80, 80, opacity)),
                            (0.7, Color::rgba(255, 120, 120, opacity * 0.3)),
                            (1.0, Color::TRANSPARENT),
                        ],
                    ),
                );
            }
            canvas.fill_rect(
                Rect::new(start.x, LASER_Y - 4.0, length, 8.0),
                &Paint::linear(
                    start,
                    end,
                    &[
                        (0.0, Color::WHITE.with_alpha(intensity * 0.9)),
                        (0.5, Color::rgba(255, 200, 200, intensity * 0.8)),
                        (1.0, Color::rgba(255, 150, 150, intensity * 0.6 * fade)),
                    ],
                ),
            );

            // Scattered rays flickering out of the beam on both sides
            let ray = Color::rgba(255, 100, 100, intensity * 0.4);
            for r in 0..12 {
                let fr = r as f32;
                let x = start.x + (fr + 0.5) * (length / 12.0);
                let angle = (time * 3.0 + fr).sin() * 0.3;
                let reach = 15.0 + (time * 2.0 + fr * 0.5).sin() * 8.0;
                let offset = Vec2::new(reach * angle.sin(), -reach * angle.cos());
                let origin = Vec2::new(x, LASER_Y);
                canvas.line(origin, origin + offset, ray, 1.0);
                canvas.line(origin, origin - offset, ray, 1.0);
            }
        }
        ScatteringClass::Partial => {
            canvas.stroke_path(
                &Path::line(start, end),
                &Paint::solid(Color::rgba(239, 68, 68, level * 0.5)),
                &Stroke::dashed(3.0, 8.0, 12.0),
            );
            canvas.fill_rect(
                Rect::new(start.x, LASER_Y - 8.0, length, 16.0),
                &Paint::solid(Color::rgba(255, 100, 100, scale * level * 0.15)),
            );
        }
        ScatteringClass::Transparent => {
            canvas.line(start, end, Color::rgba(239, 68, 68, level * 0.25), 2.0);
        }
    }
    canvas.set_blend_mode(BlendMode::Normal);
}

fn draw_glass<C: Canvas2D + ?Sized>(canvas: &mut C, index: usize, m: &Medium) {
    let x = beaker_x(index);
    let right = x + BEAKER_WIDTH;
    let bottom = BEAKER_Y + BEAKER_HEIGHT;
    canvas.stroke_path(
        &Path::polyline(vec![
            Vec2::new(x, BEAKER_Y),
            Vec2::new(x, bottom),
            Vec2::new(right, bottom),
            Vec2::new(right, BEAKER_Y),
        ]),
        &Paint::solid(Color::rgba(148, 163, 184, 0.6)),
        &Stroke::new(3.0),
    );
    let lip = Color::rgba(148, 163, 184, 0.8);
    canvas.line(Vec2::new(x - 2.0, BEAKER_Y), Vec2::new(x + 8.0, BEAKER_Y - 5.0), lip, 4.0);
    canvas.line(Vec2::new(right + 2.0, BEAKER_Y), Vec2::new(right - 8.0, BEAKER_Y - 5.0), lip, 4.0);
    canvas.fill_rect(
        Rect::new(x + 5.0, BEAKER_Y + 20.0, 8.0, BEAKER_HEIGHT - 40.0),
        &Paint::solid(Color::WHITE.with_alpha(0.08)),
    );

    let mark = Color::rgba(148, 163, 184, 0.4);
    for step in 1..=3 {
        let y = BEAKER_Y + 25.0 + step as f32 * 40.0;
        canvas.line(Vec2::new(right - 12.0, y), Vec2::new(right - 4.0, y), mark, 1.0);
        canvas.text(
            Vec2::new(right - 22.0, y + 3.0),
            &format!("{}", (4 - step) * 50),
            Color::rgba(148, 163, 184, 0.6),
            8.0,
        );
    }

    let center = x + BEAKER_WIDTH / 2.0;
    canvas.text(Vec2::new(center, bottom + 22.0), m.name, Color::hex("#e2e8f0"), 13.0);
    canvas.text(Vec2::new(center, bottom + 38.0), m.formula, Color::hex("#64748b"), 11.0);
}

fn draw_badge<C: Canvas2D + ?Sized>(canvas: &mut C, index: usize, class: ScatteringClass) {
    let at = Vec2::new(beaker_x(index) + BEAKER_WIDTH / 2.0, BEAKER_Y - 8.0);
    let (text, color) = class.badge();
    if class == ScatteringClass::Colloidal {
        canvas.fill_circle(
            at,
            40.0,
            &Paint::radial(at, 40.0, &[(0.0, Color::rgba(34, 197, 94, 0.2)), (1.0, Color::TRANSPARENT)]),
        );
    }
    canvas.text(at, text, color, 10.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawList;

    const SAND: usize = 4;

    fn run(bench: &mut LabBench, params: &SceneParams, frames: usize) -> FrameStats {
        let mut list = DrawList::new(SIZE.x, SIZE.y);
        let mut stats = FrameStats::default();
        for i in 0..frames {
            list.clear_commands();
            stats = bench.render(&mut list, params, i as f32 * TIME_STEP);
        }
        stats
    }

    #[test]
    fn test_laser_enters_every_beaker_through_its_wall() {
        let laser = laser(&SceneParams::default());
        for (i, s) in BENCH_SUBSTANCES.iter().enumerate() {
            let beam = segment(i, &medium(*s), &laser).unwrap();
            assert!((beam.entry.x - beaker_x(i)).abs() < 1e-3);
            assert!((beam.entry.y - LASER_Y).abs() < 1e-3);
        }
    }

    #[test]
    fn test_solutions_stay_dark() {
        let mut bench = LabBench::new(Some(3));
        run(&mut bench, &SceneParams::default(), 200);
        for i in 0..2 {
            let field = bench.field(i).unwrap();
            assert!(field.particles().iter().all(|p| p.illumination == 0.0));
        }
    }

    #[test]
    fn test_colloids_light_up() {
        let mut bench = LabBench::new(Some(3));
        let stats = run(&mut bench, &SceneParams::default(), 200);
        assert!(stats.illuminated > 0);
        assert_eq!(bench.class(2), Some(ScatteringClass::Colloidal));
    }

    #[test]
    fn test_sand_settles_faster_with_acceleration() {
        let slow = SceneParams::default();
        let fast = SceneParams {
            time_acceleration: 10.0,
            ..SceneParams::default()
        };
        let mut a = LabBench::new(Some(5));
        let mut b = LabBench::new(Some(5));
        run(&mut a, &slow, 100);
        run(&mut b, &fast, 100);
        let settled = |bench: &LabBench| bench.field(SAND).unwrap().particles().iter().filter(|p| p.settled).count();
        assert!(settled(&b) > settled(&a));
        assert!(b.elapsed_seconds() > a.elapsed_seconds());
    }

    #[test]
    fn test_reset_clears_settling_and_timer() {
        let mut bench = LabBench::new(Some(6));
        let fast = SceneParams {
            time_acceleration: 10.0,
            ..SceneParams::default()
        };
        run(&mut bench, &fast, 400);
        bench.reset();
        assert_eq!(bench.elapsed_seconds(), 0.0);
        assert!(bench.field(SAND).unwrap().particles().iter().all(|p| !p.settled && p.illumination == 0.0));
    }

    #[test]
    fn test_laser_off_keeps_rendering_without_badges() {
        let mut bench = LabBench::new(Some(7));
        let off = SceneParams {
            light_on: false,
            ..SceneParams::default()
        };
        let stats = run(&mut bench, &off, 30);
        assert_eq!(stats.illuminated, 0);

        let mut list = DrawList::new(SIZE.x, SIZE.y);
        bench.render(&mut list, &off, 1.0);
        assert!(!list.has_label("TYNDALL"));
        assert!(list.has_label("LASER"));
    }
}
