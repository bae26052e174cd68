//! Solution vs. colloid: one flashlight per cup
//!
//! The flashlight sits on a polar offset from each cup's centre. Its beam crosses the air at a
//! constant width and, once inside the liquid, either fans out into the Tyndall cone (starch
//! colloid) or stays a faint thread (salt solution).

use crate::beam::{resolve, BeamGeometry, Container, Extinction, LightSource};
use crate::canvas::{BlendMode, Canvas2D, Color, Paint, Path, Rect, Stroke};
use crate::frame::{self, BeamStyle, GlowRates, GlowStyle};
use crate::medium::{medium, ScatteringClass, Substance};
use crate::particles::{uniform, FieldConfig, MotionRule, ParticleField};
use crate::scenes::SceneParams;
use crate::stats::FrameStats;
use glam::Vec2;

pub const SIZE: Vec2 = Vec2::new(560.0, 500.0);
pub const TIME_STEP: f32 = 0.016;

const CUP_WIDTH: f32 = 150.0;
const CUP_HEIGHT: f32 = 250.0;
const CUP_Y: f32 = 180.0;
/// Left edges of the solution and colloid cups
const CUP_X: [f32; 2] = [80.0, 320.0];
/// Liquid surface below the rim
const LIQUID_DEPTH: f32 = 20.0;
/// Beam length inside the liquid
const TRAVERSAL: f32 = 300.0;
/// Beam length when it misses the cup
const AIR_LENGTH: f32 = 400.0;
/// Colloid cone width at the end of the traversal, relative to the entry width
const CONE_EXPANSION: f32 = 3.5;

fn cup_rect(index: usize) -> Rect {
    Rect::new(CUP_X[index], CUP_Y, CUP_WIDTH, CUP_HEIGHT)
}

fn container(index: usize) -> Container {
    Container::new(cup_rect(index), CUP_Y + LIQUID_DEPTH)
}

fn solution_config() -> FieldConfig {
    let m = medium(Substance::SaltWater);
    let bounds = Rect::new(CUP_X[0] + 5.0, CUP_Y + 20.0, 140.0, 180.0);
    FieldConfig::new(m.particle_count, bounds, MotionRule::brownian(0.05, 0.5))
        .with_radius(0.3, 1.1)
        .with_speed(0.2)
}

fn colloid_config() -> FieldConfig {
    let bounds = Rect::new(CUP_X[1] + 10.0, CUP_Y + 25.0, 130.0, 170.0);
    FieldConfig::new(40, bounds, MotionRule::brownian(0.075, 0.8))
        .with_radius(2.0, 4.0)
        .with_speed(0.25)
}

/// Flashlight placement and beam shape for one cup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flashlight {
    pub source: LightSource,
    /// Opacity after distance derating
    pub opacity: f32,
}

impl Flashlight {
    /// Place the flashlight for the cup at `index` from the current parameters
    pub fn for_cup(index: usize, params: &SceneParams) -> Self {
        let offset = 120.0 + params.distance * 1.5;
        let derating = 1.0 - params.distance / 200.0;
        let opacity = params.light_level() * derating;
        let source = LightSource::aimed_at(cup_rect(index).center(), params.angle_deg, offset, opacity)
            .with_base_width(8.0 + params.distance / 10.0)
            .with_range(AIR_LENGTH);
        Self { source, opacity }
    }
}

/// Per-frame beam state of one cup
struct CupBeam {
    air: BeamGeometry,
    liquid: Option<BeamGeometry>,
}

fn cup_beam(index: usize, class: ScatteringClass, flashlight: &Flashlight) -> Option<CupBeam> {
    let extinction = match class {
        ScatteringClass::Colloidal => Extinction::new(medium(Substance::Starch).extinction, 0.0, 0.0),
        _ => Extinction::NONE,
    };
    let Some(air) = BeamGeometry::open(&flashlight.source, Extinction::NONE) else {
        log::debug!("Flashlight for cup {} has a degenerate aim, skipping beam", index);
        return None;
    };
    let liquid = resolve(&flashlight.source, &container(index), TRAVERSAL, extinction).and_then(|hit| {
        let bw = flashlight.source.base_width;
        let half_angle = match class {
            ScatteringClass::Colloidal => ((CONE_EXPANSION - 1.0) * bw * 0.5 / TRAVERSAL).atan(),
            _ => 0.0,
        };
        let inside = LightSource::new(hit.entry, hit.direction, flashlight.source.intensity)
            .with_base_width(bw)
            .with_half_angle(half_angle)
            .with_range(TRAVERSAL);
        BeamGeometry::open(&inside, extinction)
    });
    Some(CupBeam { air, liquid })
}

pub struct TwoCups {
    solution: ParticleField,
    colloid: ParticleField,
}

impl TwoCups {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            solution: ParticleField::new(solution_config(), seed),
            colloid: ParticleField::new(colloid_config(), seed.map(|s| s.wrapping_add(1))),
        }
    }

    pub fn solution(&self) -> &ParticleField {
        &self.solution
    }

    pub fn colloid(&self) -> &ParticleField {
        &self.colloid
    }

    pub fn reset(&mut self) {
        self.solution.initialize(solution_config());
        self.colloid.initialize(colloid_config());
    }

    pub fn render<C: Canvas2D + ?Sized>(&mut self, canvas: &mut C, params: &SceneParams) -> FrameStats {
        canvas.clear(Color::hex("#0f172a"));

        draw_cup(canvas, 0, false);
        draw_cup(canvas, 1, true);

        let lit_cups = [
            params.light_on && params.target.solution(),
            params.light_on && params.target.colloid(),
        ];
        let classes = [ScatteringClass::Transparent, ScatteringClass::Colloidal];
        let mut beams: [Option<CupBeam>; 2] = [None, None];

        for index in 0..2 {
            if !lit_cups[index] {
                continue;
            }
            let flashlight = Flashlight::for_cup(index, params);
            draw_flashlight(canvas, &flashlight);
            beams[index] = cup_beam(index, classes[index], &flashlight);
            if let Some(beam) = &beams[index] {
                self.draw_cup_beam(canvas, index, classes[index], beam, flashlight.opacity);
            }
        }

        self.solution.step(1.0, 0.0);
        self.colloid.step(1.0, 0.0);

        let rates = GlowRates::new(0.1, 0.05);
        let solution_beam = beams[0].as_ref().and_then(|b| b.liquid.as_ref());
        frame::illuminate_field(&mut self.solution, solution_beam, ScatteringClass::Transparent.response(1.0), rates);
        let colloid_beam = beams[1].as_ref().and_then(|b| b.liquid.as_ref());
        let lit = frame::illuminate_field(&mut self.colloid, colloid_beam, ScatteringClass::Colloidal.response(1.0), rates);

        self.draw_particles(canvas, params.microscopic);

        if lit_cups[0] {
            draw_result(canvas, 0, false);
        }
        if lit_cups[1] {
            draw_result(canvas, 1, true);
        }

        FrameStats {
            illuminated: lit,
            scatter_events: lit,
            ..FrameStats::default()
        }
    }

    fn draw_cup_beam<C: Canvas2D + ?Sized>(
        &mut self,
        canvas: &mut C,
        index: usize,
        class: ScatteringClass,
        beam: &CupBeam,
        opacity: f32,
    ) {
        let warm = |a: f32| Color::rgba(252, 211, 77, a);
        canvas.set_blend_mode(BlendMode::Additive);

        let Some(liquid) = &beam.liquid else {
            // No entry: the whole beam stays in the air
            let end = beam.air.point_at(AIR_LENGTH);
            canvas.fill_path(
                &Path::polygon(beam.air.cone(0.0, AIR_LENGTH, 1.0).to_vec()),
                &Paint::linear(beam.air.origin, end, &[(0.0, warm(opacity * 0.7)), (1.0, warm(opacity * 0.1))]),
            );
            canvas.set_blend_mode(BlendMode::Normal);
            return;
        };

        let entry_distance = beam.air.origin.distance(liquid.origin);
        let (start, entry) = (beam.air.origin, liquid.origin);
        canvas.fill_path(
            &Path::polygon(beam.air.cone(0.0, entry_distance, 1.0).to_vec()),
            &Paint::linear(
                start,
                entry,
                &[
                    (0.0, Color::rgba(255, 248, 220, opacity * 0.8)),
                    (0.5, Color::rgba(253, 230, 138, opacity * 0.6)),
                    (1.0, warm(opacity * 0.5)),
                ],
            ),
        );
        canvas.fill_path(
            &Path::polygon(beam.air.cone(0.0, entry_distance, 0.3).to_vec()),
            &Paint::linear(
                start,
                entry,
                &[
                    (0.0, Color::WHITE.with_alpha(opacity * 0.5)),
                    (1.0, Color::rgba(255, 255, 240, opacity * 0.3)),
                ],
            ),
        );

        canvas.push_clip(cup_rect(index));
        // The liquid beam already carries the derated opacity as its intensity
        let style = BeamStyle::new(Color::rgba(254, 243, 199, 1.0), 1.0);
        frame::draw_beam(canvas, liquid, class, &style);

        if class == ScatteringClass::Colloidal {
            // Scatter sparkles along the first part of the cone
            canvas.set_blend_mode(BlendMode::Additive);
            let rng = self.colloid.rng();
            for i in 0..12 {
                let t = 0.1 + i as f32 / 12.0 * 0.6;
                let d = TRAVERSAL * t;
                let spread = liquid.width_at(d) * 0.5;
                let jitter = Vec2::new(uniform(rng, -0.5, 0.5), uniform(rng, -0.5, 0.5)) * spread;
                let radius = 1.0 + uniform(rng, 0.0, 2.0);
                let alpha = (0.3 + uniform(rng, 0.0, 0.4)) * opacity;
                canvas.fill_circle(liquid.point_at(d) + jitter, radius, &Paint::solid(Color::WHITE.with_alpha(alpha)));
            }
            canvas.set_blend_mode(BlendMode::Normal);
        }
        canvas.pop_clip();
    }

    fn draw_particles<C: Canvas2D + ?Sized>(&self, canvas: &mut C, microscopic: bool) {
        let scale = if microscopic { 3.0 } else { 1.0 };

        // Ions are only resolvable under the microscope
        if microscopic {
            let ion = Paint::solid(Color::rgba(147, 197, 253, 0.5));
            for p in self.solution.particles() {
                canvas.fill_circle(p.position, p.radius() * scale, &ion);
            }
        }

        let glow = GlowStyle::new(Color::WHITE.with_alpha(0.9), Color::rgba(252, 211, 77, 0.6), 4.0);
        for p in self.colloid.particles() {
            let radius = p.radius() * scale;
            frame::draw_particle_glow(canvas, p.position, radius, p.illumination, &glow);
            let color = if p.illumination > frame::GLOW_THRESHOLD {
                Color::WHITE.with_alpha(0.7 + p.illumination * 0.3)
            } else {
                Color::rgba(203, 213, 225, 0.6)
            };
            canvas.fill_circle(p.position, radius, &Paint::solid(color));
        }
    }
}

fn draw_cup<C: Canvas2D + ?Sized>(canvas: &mut C, index: usize, colloid: bool) {
    let cup = cup_rect(index);
    let (x, y) = (cup.min.x, cup.min.y);
    let liquid_y = y + 18.0;

    canvas.fill_path(
        &Path::ellipse(Vec2::new(cup.center().x + 5.0, cup.max.y + 8.0), Vec2::new(CUP_WIDTH / 2.0 - 5.0, 8.0)),
        &Paint::solid(Color::BLACK.with_alpha(0.3)),
    );
    canvas.fill_rect(cup, &Paint::solid(Color::rgba(148, 163, 184, 0.1)));

    let liquid = Rect::new(x + 3.0, liquid_y, CUP_WIDTH - 6.0, CUP_HEIGHT - 21.0);
    let stops = if colloid {
        [
            (0.0, Color::rgba(220, 230, 240, 0.85)),
            (0.5, Color::rgba(200, 215, 230, 0.8)),
            (1.0, Color::rgba(180, 200, 220, 0.75)),
        ]
    } else {
        [
            (0.0, Color::rgba(100, 180, 255, 0.25)),
            (0.5, Color::rgba(80, 160, 240, 0.2)),
            (1.0, Color::rgba(60, 140, 220, 0.25)),
        ]
    };
    canvas.fill_rect(liquid, &Paint::linear(Vec2::new(x, liquid_y), Vec2::new(x, cup.max.y), &stops));

    let meniscus = if colloid {
        Color::rgba(230, 240, 250, 0.6)
    } else {
        Color::rgba(150, 200, 255, 0.3)
    };
    canvas.fill_path(
        &Path::ellipse(Vec2::new(cup.center().x, liquid_y), Vec2::new(CUP_WIDTH / 2.0 - 3.0, 6.0)),
        &Paint::solid(meniscus),
    );

    // Glass reflection on the left wall
    canvas.fill_rect(
        Rect::new(x + 3.0, y + 5.0, 15.0, CUP_HEIGHT - 10.0),
        &Paint::linear(
            Vec2::new(x, y),
            Vec2::new(x + 20.0, y),
            &[(0.0, Color::WHITE.with_alpha(0.15)), (1.0, Color::WHITE.with_alpha(0.0))],
        ),
    );

    let glass = Color::rgba(148, 163, 184, 0.8);
    canvas.stroke_path(
        &Path::polyline(vec![cup.min, Vec2::new(x, cup.max.y), cup.max, Vec2::new(cup.max.x, y)]),
        &Paint::solid(glass),
        &Stroke::new(2.5),
    );
    canvas.line(Vec2::new(x - 2.0, y), Vec2::new(cup.max.x + 2.0, y), glass.with_alpha(0.9), 3.0);
    for i in 1..=4 {
        let mark_y = cup.max.y - i as f32 * CUP_HEIGHT / 5.0;
        canvas.line(Vec2::new(x + 5.0, mark_y), Vec2::new(x + 20.0, mark_y), glass.with_alpha(0.4), 1.0);
    }

    let (title, subtitle) = if colloid {
        (ScatteringClass::Colloidal.name(), "(Water + Starch)")
    } else {
        (ScatteringClass::Transparent.name(), "(Water + Salt)")
    };
    canvas.text(Vec2::new(cup.center().x, cup.max.y + 28.0), title, Color::hex("#f1f5f9"), 15.0);
    canvas.text(Vec2::new(cup.center().x, cup.max.y + 46.0), subtitle, Color::hex("#94a3b8"), 12.0);
}

fn draw_flashlight<C: Canvas2D + ?Sized>(canvas: &mut C, flashlight: &Flashlight) {
    let Some(dir) = flashlight.source.unit_direction() else {
        return;
    };
    let across = dir.perp();
    let at = |along: f32, side: f32| flashlight.source.position + dir * along + across * side;

    let body = Path::polygon(vec![at(-30.0, -18.0), at(15.0, -18.0), at(15.0, 18.0), at(-30.0, 18.0)]);
    canvas.fill_path(
        &body,
        &Paint::linear(
            at(0.0, -18.0),
            at(0.0, 18.0),
            &[
                (0.0, Color::hex("#1f2937")),
                (0.3, Color::hex("#4b5563")),
                (0.5, Color::hex("#6b7280")),
                (0.7, Color::hex("#4b5563")),
                (1.0, Color::hex("#1f2937")),
            ],
        ),
    );
    let head = Path::polygon(vec![at(15.0, -14.0), at(25.0, -16.0), at(25.0, 16.0), at(15.0, 14.0)]);
    canvas.fill_path(&head, &Paint::solid(Color::hex("#4b5563")));

    let lens = at(25.0, 0.0);
    canvas.fill_circle(
        lens,
        14.0,
        &Paint::radial(
            lens,
            14.0,
            &[
                (0.0, Color::hex("#fefce8")),
                (0.5, Color::hex("#fde047")),
                (1.0, Color::hex("#eab308")),
            ],
        ),
    );
    if flashlight.opacity > 0.0 {
        canvas.set_blend_mode(BlendMode::Additive);
        canvas.fill_circle(
            lens,
            40.0,
            &Paint::radial(
                lens,
                40.0,
                &[
                    (0.0, Color::rgba(254, 240, 138, flashlight.opacity * 0.6)),
                    (1.0, Color::rgba(254, 240, 138, 0.0)),
                ],
            ),
        );
        canvas.set_blend_mode(BlendMode::Normal);
    }
}

fn draw_result<C: Canvas2D + ?Sized>(canvas: &mut C, index: usize, observed: bool) {
    let center = Vec2::new(cup_rect(index).center().x, CUP_Y - 20.0);
    let badge = Rect::new(center.x - 100.0, center.y - 19.0, 200.0, 28.0);

    canvas.fill_path(
        &Path::rounded_rect(badge.translate(Vec2::splat(2.0)), 6.0),
        &Paint::solid(Color::BLACK.with_alpha(0.3)),
    );
    let (top, bottom, border, text) = if observed {
        (
            Color::rgba(16, 185, 129, 0.95),
            Color::rgba(5, 150, 105, 0.95),
            Color::rgba(52, 211, 153, 0.8),
            "✓ Tyndall effect OBSERVED",
        )
    } else {
        (
            Color::rgba(239, 68, 68, 0.9),
            Color::rgba(185, 28, 28, 0.9),
            Color::rgba(248, 113, 113, 0.8),
            "✗ No Tyndall effect",
        )
    };
    let outline = Path::rounded_rect(badge, 6.0);
    canvas.fill_path(
        &outline,
        &Paint::linear(badge.min, Vec2::new(badge.min.x, badge.max.y), &[(0.0, top), (1.0, bottom)]),
    );
    canvas.stroke_path(&outline, &Paint::solid(border), &Stroke::new(1.0));
    canvas.text(center, text, Color::WHITE, 13.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawList;
    use crate::scenes::CupTarget;

    fn run(scene: &mut TwoCups, params: &SceneParams, frames: usize) -> FrameStats {
        let mut list = DrawList::new(SIZE.x, SIZE.y);
        let mut stats = FrameStats::default();
        for _ in 0..frames {
            list.clear_commands();
            stats = scene.render(&mut list, params);
        }
        stats
    }

    #[test]
    fn test_default_flashlight_enters_through_surface() {
        let params = SceneParams::default();
        let flashlight = Flashlight::for_cup(1, &params);
        let beam = cup_beam(1, ScatteringClass::Colloidal, &flashlight).unwrap();
        let liquid = beam.liquid.unwrap();
        assert!((liquid.origin.y - (CUP_Y + LIQUID_DEPTH)).abs() < 1e-3);
        assert!((liquid.width_at(TRAVERSAL) - CONE_EXPANSION * flashlight.source.base_width).abs() < 1e-2);
    }

    #[test]
    fn test_solution_ions_never_light_up() {
        let mut scene = TwoCups::new(Some(4));
        run(&mut scene, &SceneParams::default(), 120);
        assert!(scene.solution().particles().iter().all(|p| p.illumination == 0.0));
    }

    #[test]
    fn test_colloid_particles_light_up_under_beam() {
        let mut scene = TwoCups::new(Some(4));
        let stats = run(&mut scene, &SceneParams::default(), 120);
        assert!(stats.illuminated > 0);
    }

    #[test]
    fn test_targeting_solution_leaves_colloid_dark() {
        let mut scene = TwoCups::new(Some(4));
        let params = SceneParams {
            target: CupTarget::Solution,
            ..SceneParams::default()
        };
        let stats = run(&mut scene, &params, 60);
        assert_eq!(stats.illuminated, 0);
    }

    #[test]
    fn test_badges_follow_target() {
        let mut scene = TwoCups::new(Some(4));
        let mut list = DrawList::new(SIZE.x, SIZE.y);
        scene.render(&mut list, &SceneParams::default());
        assert!(list.has_label("Tyndall effect OBSERVED"));
        assert!(list.has_label("No Tyndall effect"));

        list.clear_commands();
        let off = SceneParams {
            light_on: false,
            ..SceneParams::default()
        };
        scene.render(&mut list, &off);
        assert!(!list.has_label("Tyndall"));
    }

    #[test]
    fn test_flat_aim_misses_cup_without_panicking() {
        let mut scene = TwoCups::new(Some(9));
        let params = SceneParams {
            angle_deg: 150.0,
            distance: 100.0,
            ..SceneParams::default()
        };
        run(&mut scene, &params, 10);
        for p in scene.colloid().particles() {
            assert!(scene.colloid().bounds().contains(p.position));
        }
    }
}
