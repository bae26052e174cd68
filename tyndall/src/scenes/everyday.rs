//! Everyday examples gallery
//!
//! Five small scenes where the Tyndall effect (or its Rayleigh cousin) shows up outside the lab.
//! Each has a single on/off toggle, read from [`SceneParams::light_on`].

use crate::beam::{BeamGeometry, Extinction, LightSource};
use crate::canvas::{BlendMode, Canvas2D, Color, Paint, Path, Rect, Stroke};
use crate::medium::{medium, Substance};
use crate::particles::{uniform, FieldConfig, MotionRule, ParticleField};
use crate::scenes::SceneParams;
use crate::stats::FrameStats;
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

pub const SIZE: Vec2 = Vec2::new(400.0, 250.0);

const SUN: Vec2 = Vec2::new(320.0, 40.0);
const MILK_GLASS: Rect = Rect {
    min: Vec2::new(140.0, 60.0),
    max: Vec2::new(260.0, 220.0),
};
const MILK_BEAM_Y: f32 = 120.0;
const EMBER: Vec2 = Vec2::new(200.0, 180.0);
const SMOKE_LASER_Y: f32 = 110.0;
const GEL_CENTER: Vec2 = Vec2::new(200.0, 150.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Example {
    Forest,
    Milk,
    Smoke,
    Gelatin,
    Sky,
}

impl Example {
    pub const ALL: [Example; 5] = [
        Example::Forest,
        Example::Milk,
        Example::Smoke,
        Example::Gelatin,
        Example::Sky,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Example::Forest => "forest",
            Example::Milk => "milk",
            Example::Smoke => "smoke",
            Example::Gelatin => "gelatin",
            Example::Sky => "sky",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Example::Forest => "Fog in the Forest",
            Example::Milk => "Glass of Milk",
            Example::Smoke => "Incense Smoke",
            Example::Gelatin => "Gelatin",
            Example::Sky => "Blue Sky",
        }
    }

    /// Animation time added per frame
    pub fn time_step(self) -> f32 {
        match self {
            Example::Forest => 0.01,
            Example::Milk | Example::Gelatin => 0.05,
            Example::Smoke => 0.016,
            Example::Sky => 0.005,
        }
    }
}

/// One puff of an incense plume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Puff {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub opacity: f32,
    /// Frames left before the puff is dropped
    pub life: f32,
}

/// Emitted particles with a finite life, rising from a point source
#[derive(Debug, Clone, Default)]
pub struct Plume {
    puffs: Vec<Puff>,
}

impl Plume {
    /// Probability of emitting a puff on a given frame
    const EMIT_CHANCE: f64 = 0.7;

    pub fn puffs(&self) -> &[Puff] {
        &self.puffs
    }

    /// Emit (maybe) one puff at `source`, then age and move every puff
    pub fn step(&mut self, source: Vec2, rng: &mut StdRng) {
        if rng.gen_bool(Self::EMIT_CHANCE) {
            self.puffs.push(Puff {
                position: source,
                velocity: Vec2::new(uniform(rng, -0.25, 0.25), -1.0 - uniform(rng, 0.0, 1.0)),
                size: uniform(rng, 2.0, 5.0),
                opacity: 0.6,
                life: uniform(rng, 100.0, 150.0),
            });
        }
        for puff in &mut self.puffs {
            puff.position.x += puff.velocity.x + (puff.position.y * 0.05).sin() * 0.5;
            puff.position.y += puff.velocity.y;
            puff.size += 0.05;
            puff.opacity -= 0.003;
            puff.life -= 1.0;
        }
        self.puffs.retain(|p| p.opacity > 0.0 && p.life > 0.0);
    }
}

enum State {
    /// Drifting fog blobs
    Forest(ParticleField),
    /// Fat droplets in the glass
    Milk(ParticleField),
    Smoke(Plume),
    Gelatin,
    Sky,
}

fn fog_blobs() -> FieldConfig {
    let rule = MotionRule::Drift {
        wind: 1.0,
        sway: 0.0,
        turbulence: 0.0,
    };
    FieldConfig::new(80, Rect::new(-50.0, 0.0, 500.0, SIZE.y), rule)
        .with_spawn(Rect::new(0.0, 0.0, 450.0, SIZE.y))
        .with_velocity((-0.25, -0.05), (0.0, 0.0))
        .with_radius(10.0, 30.0)
        .with_opacity(0.05, 0.2)
}

fn milk_droplets() -> FieldConfig {
    let bounds = Rect::from_min_max(MILK_GLASS.min + Vec2::new(10.0, 15.0), MILK_GLASS.max - Vec2::new(10.0, 10.0));
    let rule = MotionRule::Brownian {
        jitter: 0.0,
        max_speed: 0.1,
        damping: 1.0,
        restitution: 1.0,
    };
    FieldConfig::new(150, bounds, rule)
        .with_velocity((-0.1, 0.1), (-0.1, 0.1))
        .with_radius(0.5, 2.0)
}

/// Flashlight beam through the milk glass
fn milk_beam() -> Option<BeamGeometry> {
    let source = LightSource::new(Vec2::new(80.0, MILK_BEAM_Y), Vec2::X, 1.0)
        .with_base_width(40.0)
        .with_range(MILK_GLASS.max.x - 80.0);
    let mut beam = BeamGeometry::open(&source, Extinction::new(medium(Substance::Milk).extinction, 1.0, 0.0))?;
    beam.entry = Vec2::new(MILK_GLASS.min.x, MILK_BEAM_Y);
    beam.entry_distance = MILK_GLASS.min.x - 80.0;
    Some(beam)
}

/// Red laser across the smoke plume
fn smoke_laser() -> Option<BeamGeometry> {
    let source = LightSource::new(Vec2::new(50.0, SMOKE_LASER_Y), Vec2::X, 1.0)
        .with_base_width(10.0)
        .with_range(340.0);
    BeamGeometry::open(&source, Extinction::NONE)
}

pub struct Everyday {
    example: Example,
    state: State,
    rng: StdRng,
    seed: Option<u64>,
}

impl Everyday {
    pub fn new(example: Example, seed: Option<u64>) -> Self {
        let state = match example {
            Example::Forest => State::Forest(ParticleField::new(fog_blobs(), seed)),
            Example::Milk => State::Milk(ParticleField::new(milk_droplets(), seed)),
            Example::Smoke => State::Smoke(Plume::default()),
            Example::Gelatin => State::Gelatin,
            Example::Sky => State::Sky,
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        Self {
            example,
            state,
            rng,
            seed,
        }
    }

    pub fn example(&self) -> Example {
        self.example
    }

    pub fn plume(&self) -> Option<&Plume> {
        match &self.state {
            State::Smoke(plume) => Some(plume),
            _ => None,
        }
    }

    pub fn field(&self) -> Option<&ParticleField> {
        match &self.state {
            State::Forest(field) | State::Milk(field) => Some(field),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.example, self.seed);
    }

    pub fn render<C: Canvas2D + ?Sized>(&mut self, canvas: &mut C, params: &SceneParams, time: f32) -> FrameStats {
        let active = params.light_on;
        let lit = match &mut self.state {
            State::Forest(fog) => {
                draw_forest(canvas, fog, active, time);
                0
            }
            State::Milk(droplets) => draw_milk(canvas, droplets, active),
            State::Smoke(plume) => draw_smoke(canvas, plume, &mut self.rng, active),
            State::Gelatin => draw_gelatin(canvas, &mut self.rng, active, time),
            State::Sky => {
                draw_sky(canvas, &mut self.rng, active, time);
                0
            }
        };
        FrameStats {
            illuminated: lit,
            scatter_events: lit,
            ..FrameStats::default()
        }
    }
}

fn vertical(top: Color, bottom: Color) -> Paint {
    Paint::linear(Vec2::ZERO, Vec2::new(0.0, SIZE.y), &[(0.0, top), (1.0, bottom)])
}

fn draw_tree<C: Canvas2D + ?Sized>(canvas: &mut C, x: f32, h: f32, w: f32, color: Color) {
    let ground = SIZE.y;
    canvas.fill_rect(Rect::new(x + w * 0.4, ground - h * 0.3, w * 0.2, h * 0.3), &Paint::solid(Color::hex("#3f2c22")));
    let leaves = Paint::solid(color);
    for (inset, base, top) in [(0.0, 0.2, 0.6), (5.0, 0.5, 0.85), (10.0, 0.75, 1.0)] {
        canvas.fill_path(
            &Path::polygon(vec![
                Vec2::new(x + inset, ground - h * base),
                Vec2::new(x + w - inset, ground - h * base),
                Vec2::new(x + w / 2.0, ground - h * top),
            ]),
            &leaves,
        );
    }
}

fn draw_forest<C: Canvas2D + ?Sized>(canvas: &mut C, fog: &mut ParticleField, active: bool, time: f32) {
    canvas.clear(Color::hex("#bae6fd"));
    canvas.fill_rect(Rect::new(0.0, 0.0, SIZE.x, SIZE.y), &vertical(Color::hex("#38bdf8"), Color::hex("#bae6fd")));

    let sun = |a: f32| Color::rgba(253, 224, 71, a);
    canvas.fill_circle(SUN, 100.0, &Paint::radial(SUN, 100.0, &[(0.1, sun(0.8)), (0.55, sun(0.2)), (1.0, Color::TRANSPARENT)]));
    canvas.fill_circle(SUN, 25.0, &Paint::solid(Color::hex("#facc15")));

    let back = Color::hex("#064e3b");
    for (x, h, w) in [(50.0, 180.0, 60.0), (150.0, 200.0, 70.0), (280.0, 170.0, 50.0), (350.0, 190.0, 60.0)] {
        draw_tree(canvas, x, h, w, back);
    }

    // Crepuscular rays fanning down-left from the sun
    if active {
        canvas.set_blend_mode(BlendMode::Additive);
        let toward = |angle: f32| SUN + Vec2::new(-angle.cos(), angle.sin()) * 400.0;
        for i in 0..6 {
            let fi = i as f32;
            let angle = PI / 3.0 + fi * 0.15 + (time * 0.5 + fi).sin() * 0.05;
            let paint = Paint::linear(
                SUN,
                toward(angle),
                &[(0.0, Color::rgba(255, 255, 200, 0.4)), (1.0, Color::TRANSPARENT)],
            );
            canvas.fill_path(&Path::polygon(vec![SUN, toward(angle - 0.1), toward(angle + 0.1)]), &paint);
        }
        canvas.set_blend_mode(BlendMode::Normal);
    }

    let front = Color::hex("#065f46");
    for (x, h, w) in [(0.0, 220.0, 80.0), (100.0, 240.0, 90.0), (220.0, 210.0, 70.0), (320.0, 230.0, 80.0)] {
        draw_tree(canvas, x, h, w, front);
    }

    fog.step(1.0, time);
    for p in fog.particles() {
        canvas.fill_circle(p.position, p.radius(), &Paint::solid(Color::WHITE.with_alpha(p.opacity)));
    }
}

fn draw_milk<C: Canvas2D + ?Sized>(canvas: &mut C, droplets: &mut ParticleField, active: bool) -> usize {
    canvas.clear(Color::hex("#0f172a"));
    canvas.fill_rect(Rect::new(0.0, 0.0, SIZE.x, SIZE.y), &vertical(Color::hex("#1e293b"), Color::hex("#0f172a")));
    canvas.fill_rect(Rect::new(0.0, 220.0, SIZE.x, 30.0), &Paint::solid(Color::hex("#334155")));

    let glass = MILK_GLASS;
    canvas.fill_rect(
        Rect::new(glass.min.x + 5.0, glass.min.y + 10.0, glass.width() - 10.0, glass.height() - 15.0),
        &Paint::solid(Color::rgba(240, 248, 255, 0.15)),
    );

    let beam = if active { milk_beam() } else { None };
    droplets.step(1.0, 0.0);
    let mut lit = 0;
    for p in droplets.particles() {
        let in_beam = beam.is_some_and(|b| b.weight_at(p.position, 0.0, 1.0).is_some());
        lit += usize::from(in_beam);
        let alpha = if in_beam { 0.9 } else { 0.3 };
        canvas.fill_circle(p.position, p.radius(), &Paint::solid(Color::WHITE.with_alpha(alpha)));
    }

    let rim = Paint::solid(Color::WHITE.with_alpha(0.4));
    canvas.stroke_path(&Path::rect(glass), &rim, &Stroke::new(2.0));
    let shine = Paint::solid(Color::WHITE.with_alpha(0.1));
    canvas.fill_rect(Rect::new(glass.min.x + 10.0, glass.min.y + 10.0, 10.0, glass.height() - 20.0), &shine);
    canvas.fill_rect(Rect::new(glass.max.x - 20.0, glass.min.y + 10.0, 5.0, glass.height() - 20.0), &shine);

    // Flashlight
    let y = MILK_BEAM_Y;
    canvas.fill_rect(Rect::new(20.0, y - 15.0, 60.0, 30.0), &Paint::solid(Color::hex("#475569")));
    canvas.fill_rect(Rect::new(40.0, y - 18.0, 10.0, 3.0), &Paint::solid(Color::hex("#1e293b")));
    canvas.fill_path(&Path::ellipse(Vec2::new(80.0, y), Vec2::new(5.0, 15.0)), &Paint::solid(Color::hex("#facc15")));

    if let Some(beam) = beam {
        let amber = |a: f32| Color::rgba(253, 224, 71, a);
        let (x0, x1) = (80.0, glass.min.x);
        canvas.set_blend_mode(BlendMode::Additive);
        canvas.fill_path(
            &Path::polygon(vec![
                Vec2::new(x0, y - 15.0),
                Vec2::new(x1, y - 20.0),
                Vec2::new(x1, y + 20.0),
                Vec2::new(x0, y + 15.0),
            ]),
            &Paint::linear(Vec2::new(x0, y), Vec2::new(x1, y), &[(0.0, amber(0.4)), (1.0, amber(0.05))]),
        );

        let (in0, in1) = (glass.min.x + 5.0, glass.max.x - 5.0);
        let fade = beam.attenuation_at(in1 - glass.min.x);
        canvas.fill_path(
            &Path::polygon(vec![
                Vec2::new(in0, y - 20.0),
                Vec2::new(in1, y - 25.0),
                Vec2::new(in1, y + 25.0),
                Vec2::new(in0, y + 20.0),
            ]),
            &Paint::linear(
                Vec2::new(glass.min.x, y),
                Vec2::new(glass.max.x, y),
                &[(0.0, amber(0.8)), (1.0, amber(0.2 * fade))],
            ),
        );
        canvas.fill_rect(Rect::new(in0, y - 5.0, in1 - in0, 10.0), &Paint::solid(Color::rgba(255, 255, 200, 0.3)));
        canvas.set_blend_mode(BlendMode::Normal);
    }
    lit
}

fn draw_smoke<C: Canvas2D + ?Sized>(canvas: &mut C, plume: &mut Plume, rng: &mut StdRng, active: bool) -> usize {
    canvas.clear(Color::hex("#020617"));

    canvas.fill_path(
        &Path::polygon(vec![
            Vec2::new(180.0, 240.0),
            Vec2::new(220.0, 240.0),
            Vec2::new(210.0, 220.0),
            Vec2::new(190.0, 220.0),
        ]),
        &Paint::solid(Color::hex("#7c3aed")),
    );
    canvas.line(Vec2::new(EMBER.x, 220.0), EMBER, Color::hex("#a8a29e"), 2.0);
    let flicker = uniform(rng, 2.0, 4.0);
    canvas.fill_circle(EMBER, flicker, &Paint::solid(Color::hex("#ef4444")));

    plume.step(EMBER, rng);

    let laser = if active { smoke_laser() } else { None };
    if let Some(beam) = &laser {
        canvas.fill_rect(Rect::new(10.0, SMOKE_LASER_Y - 10.0, 40.0, 20.0), &Paint::solid(Color::hex("#333333")));
        canvas.fill_circle(beam.origin, 3.0, &Paint::solid(Color::hex("#ef4444")));
        let end = beam.exit;
        canvas.set_blend_mode(BlendMode::Additive);
        canvas.line(beam.origin, end, Color::rgba(239, 68, 68, 0.8), 2.0);
        canvas.line(beam.origin, end, Color::rgba(239, 68, 68, 0.2), 6.0);
        canvas.set_blend_mode(BlendMode::Normal);
    }

    let mut lit = 0;
    for puff in plume.puffs().iter().rev() {
        let in_beam = laser.is_some_and(|b| b.weight_at(puff.position, 0.0, 1.0).is_some());
        let color = if in_beam {
            lit += 1;
            canvas.fill_circle(puff.position, puff.size * 2.0, &Paint::solid(Color::rgba(255, 50, 50, 0.3)));
            Color::rgba(255, 100, 100, puff.opacity + 0.2)
        } else {
            Color::rgba(200, 200, 200, puff.opacity)
        };
        canvas.fill_circle(puff.position, puff.size, &Paint::solid(color));
    }
    lit
}

fn draw_gelatin<C: Canvas2D + ?Sized>(canvas: &mut C, rng: &mut StdRng, active: bool, time: f32) -> usize {
    canvas.clear(Color::hex("#1e293b"));
    canvas.fill_path(&Path::ellipse(Vec2::new(200.0, 200.0), Vec2::new(100.0, 30.0)), &Paint::solid(Color::hex("#e2e8f0")));

    let wobble = (time * 0.5).sin() * 2.0;
    let c = GEL_CENTER;
    let dome = Path::cubic(
        Vec2::new(c.x - 70.0 + wobble, 190.0),
        Vec2::new(c.x - 70.0 + wobble, 100.0 + wobble),
        Vec2::new(c.x + 70.0 - wobble, 100.0 - wobble),
        Vec2::new(c.x + 70.0 - wobble, 190.0),
        24,
    )
    .close();
    canvas.fill_path(
        &dome,
        &Paint::radial(
            c,
            80.0,
            &[(0.125, Color::rgba(236, 72, 153, 0.9)), (1.0, Color::rgba(190, 24, 93, 0.8))],
        ),
    );
    canvas.fill_path(
        &Path::ellipse(Vec2::new(c.x - 20.0 + wobble, 130.0 + wobble), Vec2::new(15.0, 8.0)),
        &Paint::solid(Color::WHITE.with_alpha(0.4)),
    );

    if !active {
        return 0;
    }
    let y = c.y;
    let green = |a: f32| Color::rgba(74, 222, 128, a);
    canvas.fill_rect(Rect::new(20.0, y - 10.0, 40.0, 20.0), &Paint::solid(Color::hex("#333333")));
    canvas.set_blend_mode(BlendMode::Additive);
    canvas.line(Vec2::new(60.0, y), Vec2::new(c.x - 60.0, y), green(0.3), 2.0);
    canvas.line(Vec2::new(c.x - 60.0, y), Vec2::new(c.x + 60.0, y), green(0.9), 4.0);
    canvas.fill_rect(
        Rect::new(c.x - 60.0, y - 5.0, 120.0, 10.0),
        &Paint::linear(Vec2::new(c.x - 60.0, y), Vec2::new(c.x + 60.0, y), &[(0.0, green(0.6)), (1.0, green(0.2))]),
    );
    canvas.set_blend_mode(BlendMode::Normal);

    let sparkle = Paint::solid(Color::hex("#bbf7d0"));
    let count = medium(Substance::Gelatin).particle_count;
    for _ in 0..count {
        let at = Vec2::new(c.x - 50.0 + uniform(rng, 0.0, 100.0), y - 5.0 + uniform(rng, 0.0, 10.0));
        canvas.fill_circle(at, 1.0, &sparkle);
    }
    count
}

fn draw_cloud<C: Canvas2D + ?Sized>(canvas: &mut C, at: Vec2, scale: f32) {
    let white = Paint::solid(Color::WHITE.with_alpha(0.9));
    for (dx, dy, r) in [(0.0, 0.0, 20.0), (25.0, -10.0, 25.0), (50.0, 0.0, 20.0)] {
        canvas.fill_circle(at + Vec2::new(dx, dy) * scale, r * scale, &white);
    }
}

fn draw_sky<C: Canvas2D + ?Sized>(canvas: &mut C, rng: &mut StdRng, active: bool, time: f32) {
    canvas.clear(Color::hex("#bae6fd"));
    canvas.fill_rect(Rect::new(0.0, 0.0, SIZE.x, SIZE.y), &vertical(Color::hex("#0284c7"), Color::hex("#bae6fd")));
    canvas.fill_circle(Vec2::new(350.0, 50.0), 30.0, &Paint::solid(Color::hex("#facc15")));

    draw_cloud(canvas, Vec2::new(50.0 + time.sin() * 20.0, 60.0), 1.0);
    draw_cloud(canvas, Vec2::new(150.0 + (time * 0.8).sin() * 15.0, 100.0), 0.8);

    if !active {
        return;
    }
    // Zoomed-in air molecule scattering sunlight
    let molecule = Vec2::new(200.0, 180.0);
    let lens = Path::circle(molecule, 60.0);
    canvas.fill_path(&lens, &Paint::solid(Color::BLACK.with_alpha(0.3)));
    canvas.stroke_path(&lens, &Paint::solid(Color::WHITE.with_alpha(0.5)), &Stroke::new(2.0));
    let nitrogen = Paint::solid(Color::hex("#60a5fa"));
    canvas.fill_circle(molecule - Vec2::X * 10.0, 10.0, &nitrogen);
    canvas.fill_circle(molecule + Vec2::X * 10.0, 10.0, &nitrogen);

    canvas.line(molecule + Vec2::new(-50.0, -40.0), molecule, Color::WHITE, 3.0);
    let blue = Color::hex("#3b82f6");
    for i in 0..8 {
        let angle = i as f32 / 8.0 * TAU;
        let reach = uniform(rng, 30.0, 40.0);
        canvas.line(molecule, molecule + Vec2::new(angle.cos(), angle.sin()) * reach, blue, 2.0);
    }
    canvas.line(molecule, molecule + Vec2::new(40.0, 30.0), Color::rgba(239, 68, 68, 0.3), 2.0);
    canvas.text(molecule + Vec2::Y * 80.0, "Scatters blue", Color::WHITE, 12.0);
}
