//! Headlights in fog
//!
//! A car on a night road shines its low or high beam into drifting droplets. The beam is
//! attenuated by Beer-Lambert extinction proportional to the fog level; droplets inside the cone
//! light up by the Gaussian profile and are counted as scatter (and, for the high beam near the
//! car, backscatter) events. Above the density threshold the high beam turns into a wall of white.

use crate::beam::{BeamGeometry, Extinction, LightSource, GAUSSIAN_SHARPNESS};
use crate::canvas::{BlendMode, Canvas2D, Color, Paint, Path, Rect, Stroke};
use crate::frame::{self, GlowRates};
use crate::medium::{medium, Substance};
use crate::particles::{uniform, FieldConfig, MotionRule, ParticleField};
use crate::scenes::{SceneParams, ViewMode};
use crate::stats::{self, FrameStats, Headlight};
use glam::Vec2;
use std::f32::consts::{PI, TAU};

pub const SIZE: Vec2 = Vec2::new(800.0, 400.0);
pub const TIME_STEP: f32 = 0.02;

const ROAD_Y: f32 = 310.0;
const CAR_X: f32 = 30.0;
const CAR_Y: f32 = ROAD_Y - 55.0;
const CAR_WIDTH: f32 = 200.0;
const CAR_HEIGHT: f32 = 55.0;
const HEADLIGHT_X: f32 = CAR_X + CAR_WIDTH - 8.0;

/// Weight above which a lit droplet counts as a scatter event
const SCATTER_WEIGHT: f32 = 0.3;
/// Fraction of the beam, measured from the car, where high-beam scatter returns to the driver
const BACKSCATTER_ZONE: f32 = 0.4;

/// Beam geometry of a headlight mode
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamProfile {
    /// Aim below the horizon in degrees
    pub aim_deg: f32,
    pub spread_deg: f32,
    pub length: f32,
    pub core_width: f32,
    /// Screen height of the lamp
    pub mount_y: f32,
}

impl BeamProfile {
    pub fn of(headlight: Headlight) -> Self {
        match headlight {
            Headlight::Low => Self {
                aim_deg: 12.0,
                spread_deg: 22.0,
                length: 400.0,
                core_width: 18.0,
                mount_y: CAR_Y + 40.0,
            },
            Headlight::High => Self {
                aim_deg: -5.0,
                spread_deg: 35.0,
                length: 550.0,
                core_width: 25.0,
                mount_y: CAR_Y + 28.0,
            },
        }
    }

    /// Reach left after fog shortens the beam
    pub fn effective_length(&self, density: f32) -> f32 {
        self.length * (1.0 - density * 0.6)
    }
}

/// Headlight beam for the current parameters
pub fn headlight_beam(params: &SceneParams) -> Option<BeamGeometry> {
    let profile = BeamProfile::of(params.headlight);
    let fog = params.density_factor();
    let source = LightSource::new(
        Vec2::new(HEADLIGHT_X + 10.0, profile.mount_y),
        Vec2::from_angle(profile.aim_deg.to_radians()),
        1.0,
    )
    .with_half_angle((profile.spread_deg * 0.5).to_radians())
    .with_base_width(40.0)
    .with_range(profile.effective_length(fog));
    let extinction = Extinction::new(medium(Substance::Fog).extinction * fog, fog, 0.5);
    BeamGeometry::open(&source, extinction)
}

fn field_config(params: &SceneParams) -> FieldConfig {
    let bounds = Rect::from_min_max(Vec2::new(50.0, 30.0), Vec2::new(SIZE.x, ROAD_Y - 10.0));
    FieldConfig::new(Fog::particle_count(params.density), bounds, drift(params.speed))
        .with_spawn(Rect::new(100.0, 40.0, 700.0, 280.0))
        .with_radius(4.0, 16.0)
        .with_velocity((-1.1, -0.3), (-1.0, 1.0))
        .with_opacity(0.2, 0.7)
}

fn drift(speed: f32) -> MotionRule {
    MotionRule::Drift {
        wind: speed / 25.0,
        sway: 0.4,
        turbulence: 0.2,
    }
}

pub struct Fog {
    droplets: ParticleField,
    params: SceneParams,
}

impl Fog {
    pub fn new(params: &SceneParams, seed: Option<u64>) -> Self {
        Self {
            droplets: ParticleField::new(field_config(params), seed),
            params: *params,
        }
    }

    /// Droplet population for a fog level in percent
    pub fn particle_count(density: f32) -> usize {
        150 + (density.max(0.0) * 4.0).floor() as usize
    }

    pub fn droplets(&self) -> &ParticleField {
        &self.droplets
    }

    pub fn reseed(&mut self, params: &SceneParams) {
        log::debug!("Fog density {} needs {} droplets", params.density, Self::particle_count(params.density));
        self.params = *params;
        self.droplets.initialize(field_config(params));
    }

    pub fn reset(&mut self) {
        self.droplets.initialize(field_config(&self.params));
    }

    pub fn render<C: Canvas2D + ?Sized>(&mut self, canvas: &mut C, params: &SceneParams, time: f32) -> FrameStats {
        self.params = *params;
        let high = params.headlight == Headlight::High;
        let fog = params.density_factor();
        let beam = headlight_beam(params);

        draw_sky(canvas, params.density, time);
        draw_road(canvas, params.speed, time);
        draw_car(canvas, params.speed, time);
        draw_lamp(canvas, BeamProfile::of(params.headlight).mount_y);

        if let Some(beam) = &beam {
            draw_headlight_beam(canvas, beam, params, self.droplets.rng());
        }

        self.droplets.set_rule(drift(params.speed));
        self.droplets.step(1.0, time);

        let rates = GlowRates::new(0.15, 0.04);
        let mut readout = FrameStats::fog(params.headlight, params.density);
        for p in self.droplets.particles_mut() {
            let weight = beam
                .as_ref()
                .and_then(|b| b.weight_at(p.position, 0.0, GAUSSIAN_SHARPNESS).map(|w| (w, b)));
            frame::illuminate(p, weight.map(|(w, _)| w), 1.0, rates);
            if let Some((w, b)) = weight {
                if w > SCATTER_WEIGHT {
                    readout.scatter_events += 1;
                    let (d, _) = b.project(p.position);
                    if high && d < b.range * BACKSCATTER_ZONE {
                        readout.backscatter_events += 1;
                    }
                }
            }
            if p.illumination > frame::GLOW_THRESHOLD {
                readout.illuminated += 1;
            }
        }

        self.draw_droplets(canvas, high, fog, time);

        if let (Some(strength), Some(beam)) = (stats::wall_of_white(params.headlight, params.density), &beam) {
            draw_wall_of_white(canvas, beam.origin, strength, params.density, time);
        }
        if params.view == ViewMode::Driver {
            draw_driver_view(canvas, params);
        }

        let (label, color) = if high {
            ("HIGH BEAM", Color::hex("#fbbf24"))
        } else {
            ("LOW BEAM", Color::hex("#9ca3af"))
        };
        canvas.text(Vec2::new(HEADLIGHT_X + 50.0, BeamProfile::of(params.headlight).mount_y), label, color, 11.0);

        readout
    }

    fn draw_droplets<C: Canvas2D + ?Sized>(&self, canvas: &mut C, high: bool, fog: f32, time: f32) {
        let particles = self.droplets.particles();
        let mut order: Vec<usize> = (0..particles.len()).collect();
        order.sort_by(|a, b| particles[*a].depth.total_cmp(&particles[*b].depth));

        for p in order.into_iter().map(|i| &particles[i]) {
            let depth_scale = 0.7 + p.depth * 0.6;
            let size = p.radius() * depth_scale;
            let glow = p.illumination;

            if glow > 0.03 {
                let glow_size = size * if high { 5.0 } else { 3.0 } * (0.5 + glow * 0.5);
                let opacity = (glow * if high { 1.0 } else { 0.6 } * fog * 1.2).min(0.9);
                let at = p.position;
                canvas.set_blend_mode(BlendMode::Additive);
                canvas.fill_circle(
                    at,
                    glow_size * 2.0,
                    &Paint::radial(
                        at,
                        glow_size * 2.0,
                        &[
                            (0.0, Color::WHITE.with_alpha(opacity * 0.5)),
                            (0.15, Color::rgba(255, 252, 235, opacity * 0.4)),
                            (0.35, Color::rgba(255, 245, 200, opacity * 0.25)),
                            (0.6, Color::rgba(252, 220, 150, opacity * 0.1)),
                            (1.0, Color::TRANSPARENT),
                        ],
                    ),
                );
                canvas.fill_circle(
                    at,
                    glow_size,
                    &Paint::radial(
                        at,
                        glow_size,
                        &[
                            (0.0, Color::rgba(255, 255, 245, opacity * 0.7)),
                            (0.4, Color::rgba(255, 248, 220, opacity * 0.4)),
                            (1.0, Color::TRANSPARENT),
                        ],
                    ),
                );
                let core = glow_size * 0.35;
                canvas.fill_circle(
                    at,
                    core,
                    &Paint::radial(
                        at,
                        core,
                        &[
                            (0.0, Color::WHITE.with_alpha(opacity * 0.95)),
                            (0.5, Color::rgba(255, 255, 240, opacity * 0.5)),
                            (1.0, Color::rgba(255, 250, 220, opacity * 0.1)),
                        ],
                    ),
                );

                // Lateral wings of forward scatter
                if glow > 0.4 && high {
                    let wing = Color::rgba(255, 250, 220, opacity * 0.2);
                    let reach = glow_size * 1.5;
                    canvas.line(at - Vec2::X * reach, at + Vec2::X * reach, wing, 2.0);
                    for r in 0..4 {
                        let angle = r as f32 * PI / 2.0 + time * 0.5;
                        canvas.line(at, at + Vec2::from_angle(angle) * glow_size * 0.8, wing, 2.0);
                    }
                }
                canvas.set_blend_mode(BlendMode::Normal);
            }

            let base = fog * p.opacity * (0.3 + glow * 0.5) * depth_scale;
            let droplet = Path::circle(p.position, size * 0.5);
            canvas.fill_path(&droplet, &Paint::solid(Color::rgba(190, 205, 220, base)));
            if base > 0.15 {
                canvas.stroke_path(&droplet, &Paint::solid(Color::WHITE.with_alpha(base * 0.3)), &Stroke::new(0.5));
            }
        }
    }
}

fn draw_sky<C: Canvas2D + ?Sized>(canvas: &mut C, density: f32, time: f32) {
    canvas.clear(Color::hex("#0a0f1a"));
    canvas.fill_rect(
        Rect::new(0.0, 0.0, SIZE.x, SIZE.y),
        &Paint::linear(
            Vec2::ZERO,
            Vec2::new(0.0, SIZE.y),
            &[
                (0.0, Color::hex("#0a0f1a")),
                (0.3, Color::hex("#0f172a")),
                (0.7, Color::hex("#1a2744")),
                (1.0, Color::hex("#1e293b")),
            ],
        ),
    );

    if density < 40.0 {
        let star = Paint::solid(Color::WHITE.with_alpha((40.0 - density) / 40.0 * 0.5));
        for i in 0..30 {
            let x = ((i * 127 + 50) as f32) % SIZE.x;
            let y = ((i * 83 + 20) as f32) % (SIZE.y - 120.0);
            canvas.fill_circle(Vec2::new(x, y), 0.5 + (time + i as f32).sin() * 0.3, &star);
        }
    }
}

fn draw_road<C: Canvas2D + ?Sized>(canvas: &mut C, speed: f32, time: f32) {
    canvas.fill_rect(
        Rect::new(0.0, ROAD_Y - 10.0, SIZE.x, SIZE.y - ROAD_Y + 10.0),
        &Paint::solid(Color::hex("#1a2e1a")),
    );
    canvas.fill_rect(
        Rect::new(0.0, ROAD_Y, SIZE.x, SIZE.y - ROAD_Y),
        &Paint::linear(
            Vec2::new(0.0, ROAD_Y),
            Vec2::new(0.0, SIZE.y),
            &[
                (0.0, Color::hex("#2a2a2a")),
                (0.3, Color::hex("#1f1f1f")),
                (1.0, Color::hex("#151515")),
            ],
        ),
    );
    canvas.line(
        Vec2::new(0.0, ROAD_Y + 5.0),
        Vec2::new(SIZE.x, ROAD_Y + 5.0),
        Color::WHITE.with_alpha(0.4),
        3.0,
    );

    // Centre dashes scroll with the vehicle speed
    let period = 65.0;
    let shift = (time * speed * 2.0).rem_euclid(period);
    canvas.stroke_path(
        &Path::line(Vec2::new(shift - period, ROAD_Y + 45.0), Vec2::new(SIZE.x, ROAD_Y + 45.0)),
        &Paint::solid(Color::hex("#fcd34d")),
        &Stroke::dashed(4.0, 40.0, 25.0),
    );
}

/// Append a flattened quadratic curve, skipping its first point
fn curve_to(points: &mut Vec<Vec2>, ctrl: Vec2, to: Vec2) {
    let from = points.last().copied().unwrap_or(ctrl);
    points.extend_from_slice(&Path::quadratic(from, ctrl, to, 8).points()[1..]);
}

fn draw_car<C: Canvas2D + ?Sized>(canvas: &mut C, speed: f32, time: f32) {
    let at = |x: f32, y: f32| Vec2::new(CAR_X + x, CAR_Y + y);
    let (w, h) = (CAR_WIDTH, CAR_HEIGHT);

    canvas.fill_path(
        &Path::ellipse(Vec2::new(CAR_X + w / 2.0, ROAD_Y + 5.0), Vec2::new(w / 2.0 + 10.0, 8.0)),
        &Paint::solid(Color::BLACK.with_alpha(0.5)),
    );

    let mut body = vec![at(15.0, h), at(5.0, 35.0)];
    curve_to(&mut body, at(0.0, 25.0), at(15.0, 20.0));
    body.push(at(w - 10.0, 20.0));
    curve_to(&mut body, at(w + 5.0, 25.0), at(w, 35.0));
    body.push(at(w - 5.0, h));
    canvas.fill_path(
        &Path::polygon(body),
        &Paint::linear(
            at(0.0, 20.0),
            at(0.0, h),
            &[
                (0.0, Color::hex("#4a5568")),
                (0.5, Color::hex("#2d3748")),
                (1.0, Color::hex("#1a202c")),
            ],
        ),
    );
    canvas.line(at(20.0, 30.0), at(w - 20.0, 30.0), Color::WHITE.with_alpha(0.1), 1.0);

    let mut cabin = vec![at(55.0, 20.0)];
    curve_to(&mut cabin, at(60.0, -5.0), at(80.0, -15.0));
    cabin.push(at(150.0, -15.0));
    curve_to(&mut cabin, at(170.0, -5.0), at(175.0, 20.0));
    canvas.fill_path(
        &Path::polygon(cabin),
        &Paint::linear(
            at(50.0, -20.0),
            at(50.0, 20.0),
            &[(0.0, Color::hex("#3d4a5c")), (1.0, Color::hex("#2d3748"))],
        ),
    );

    let glass = Paint::linear(
        at(70.0, -10.0),
        at(160.0, 15.0),
        &[
            (0.0, Color::hex("#1e3a5f")),
            (0.3, Color::hex("#0f2744")),
            (1.0, Color::hex("#1e3a5f")),
        ],
    );
    let mut rear = vec![at(72.0, 15.0)];
    curve_to(&mut rear, at(75.0, 0.0), at(85.0, -8.0));
    rear.extend([at(105.0, -8.0), at(105.0, 15.0)]);
    canvas.fill_path(&Path::polygon(rear), &glass);
    let mut windshield = vec![at(115.0, 15.0), at(115.0, -8.0), at(155.0, -8.0)];
    curve_to(&mut windshield, at(165.0, 0.0), at(168.0, 15.0));
    canvas.fill_path(&Path::polygon(windshield), &glass);

    let reflection = Color::rgba(100, 180, 255, 0.2);
    canvas.line(at(78.0, 5.0), at(100.0, -3.0), reflection, 1.0);
    canvas.line(at(125.0, -3.0), at(155.0, 5.0), reflection, 1.0);

    for x in [50.0, w - 45.0] {
        draw_wheel(canvas, at(x, h + 5.0), 22.0, time * speed / 20.0);
    }
}

fn draw_wheel<C: Canvas2D + ?Sized>(canvas: &mut C, center: Vec2, radius: f32, rotation: f32) {
    canvas.fill_circle(center, radius, &Paint::solid(Color::hex("#1a1a1a")));
    canvas.fill_circle(
        center,
        radius * 0.65,
        &Paint::radial(
            center,
            radius * 0.7,
            &[
                (0.0, Color::hex("#a0a0a0")),
                (0.5, Color::hex("#606060")),
                (1.0, Color::hex("#404040")),
            ],
        ),
    );
    for i in 0..5 {
        let angle = i as f32 * TAU / 5.0 + rotation;
        canvas.line(center, center + Vec2::from_angle(angle) * radius * 0.55, Color::hex("#2a2a2a"), 2.0);
    }
    canvas.fill_circle(center, radius * 0.2, &Paint::solid(Color::hex("#505050")));
}

fn draw_lamp<C: Canvas2D + ?Sized>(canvas: &mut C, y: f32) {
    let center = Vec2::new(HEADLIGHT_X, y);
    canvas.fill_path(&Path::ellipse(center, Vec2::new(14.0, 10.0)), &Paint::solid(Color::hex("#1a1a1a")));
    canvas.fill_path(
        &Path::ellipse(center + Vec2::X * 2.0, Vec2::new(8.0, 7.0)),
        &Paint::radial(
            center,
            10.0,
            &[
                (0.0, Color::hex("#fffef0")),
                (0.5, Color::hex("#fcd34d")),
                (1.0, Color::hex("#f59e0b")),
            ],
        ),
    );
    let glow = center + Vec2::X * 5.0;
    canvas.set_blend_mode(BlendMode::Additive);
    canvas.fill_circle(
        glow,
        40.0,
        &Paint::radial(
            glow,
            40.0,
            &[
                (0.0, Color::rgba(255, 250, 220, 0.9)),
                (0.3, Color::rgba(252, 211, 77, 0.4)),
                (1.0, Color::TRANSPARENT),
            ],
        ),
    );
    canvas.set_blend_mode(BlendMode::Normal);
}

fn draw_headlight_beam<C: Canvas2D + ?Sized>(
    canvas: &mut C,
    beam: &BeamGeometry,
    params: &SceneParams,
    rng: &mut rand::rngs::StdRng,
) {
    let high = params.headlight == Headlight::High;
    let profile = BeamProfile::of(params.headlight);
    let derating = 1.0 - params.density_factor() * 0.5;
    let length = beam.range;
    let att = |d: f32| beam.attenuation_at(d);

    canvas.set_blend_mode(BlendMode::Additive);

    // Volumetric glow: one soft disc per station along the beam
    let half_spread = (profile.spread_deg * 0.5).to_radians().tan() * length;
    for layer in 0..12 {
        let progress = layer as f32 / 12.0;
        let d = length * progress;
        let radius = (8.0 + progress * half_spread * 2.0) * 1.5;
        let opacity = if high { 0.4 } else { 0.3 } * derating * att(d) * (1.0 - progress * 0.4);
        if opacity <= 0.01 {
            continue;
        }
        let center = beam.point_at(d);
        canvas.fill_circle(
            center,
            radius,
            &Paint::radial(
                center,
                radius,
                &[
                    (0.0, Color::rgba(255, 250, 220, opacity * 0.6)),
                    (0.4, Color::rgba(252, 220, 100, opacity * 0.3)),
                    (0.7, Color::rgba(252, 200, 80, opacity * 0.1)),
                    (1.0, Color::TRANSPARENT),
                ],
            ),
        );
    }

    let main = if high { 0.35 } else { 0.28 } * derating;
    let end = beam.point_at(length);
    let cone: Vec<Vec2> = beam
        .cone(0.0, length, 1.0)
        .iter()
        .map(|p| Vec2::new(p.x, p.y.clamp(25.0, SIZE.y - 25.0)))
        .collect();
    canvas.fill_path(
        &Path::polygon(cone),
        &Paint::linear(
            beam.origin,
            end,
            &[
                (0.0, Color::rgba(255, 255, 240, main)),
                (0.2, Color::rgba(255, 248, 200, main * 0.7 * att(length * 0.2))),
                (0.5, Color::rgba(252, 230, 120, main * 0.4 * att(length * 0.5))),
                (1.0, Color::rgba(252, 211, 77, main * 0.05 * att(length))),
            ],
        ),
    );

    let core = if high { 0.55 } else { 0.4 } * derating;
    let tip = beam.point_at(length * 0.6);
    let normal = beam.normal() * profile.core_width;
    canvas.fill_path(
        &Path::polygon(vec![beam.origin, tip + normal, tip - normal]),
        &Paint::linear(
            beam.origin,
            tip,
            &[
                (0.0, Color::WHITE.with_alpha(core)),
                (0.3, Color::rgba(255, 255, 230, core * 0.6 * att(length * 0.2))),
                (0.7, Color::rgba(255, 245, 200, core * 0.2 * att(length * 0.4))),
                (1.0, Color::TRANSPARENT),
            ],
        ),
    );

    let rays = if high { 8 } else { 5 };
    let spread = profile.spread_deg.to_radians();
    for i in 0..rays {
        let angle = profile.aim_deg.to_radians() + (i as f32 - rays as f32 / 2.0) * (spread / rays as f32) * 0.8;
        let reach = length * (0.5 + uniform(rng, 0.0, 0.3)) * derating;
        let tip = beam.origin + Vec2::from_angle(angle) * reach;
        let opacity = (0.08 + uniform(rng, 0.0, 0.05)) * derating;
        canvas.stroke_path(
            &Path::line(beam.origin, tip),
            &Paint::linear(
                beam.origin,
                tip,
                &[
                    (0.0, Color::rgba(255, 255, 220, opacity)),
                    (0.5, Color::rgba(255, 240, 180, opacity * 0.4)),
                    (1.0, Color::TRANSPARENT),
                ],
            ),
            &Stroke::new(2.0 + uniform(rng, 0.0, 3.0)),
        );
    }

    // Pool of light where a dipped beam meets the road
    if profile.aim_deg > 0.0 {
        let hit_x = beam.origin.x + (ROAD_Y - beam.origin.y) / profile.aim_deg.to_radians().tan();
        let spot_x = hit_x.min(beam.origin.x + length * 0.7).max(beam.origin.x + 80.0);
        let spot = Vec2::new(spot_x, ROAD_Y + 15.0);
        let reach = length * 0.4 * derating;
        let opacity = if high { 0.15 } else { 0.35 } * derating * att(spot_x - beam.origin.x);
        canvas.fill_path(
            &Path::ellipse(spot, Vec2::new(reach, 40.0)),
            &Paint::radial(
                spot,
                reach,
                &[
                    (0.0, Color::rgba(255, 250, 200, opacity)),
                    (0.3, Color::rgba(252, 230, 150, opacity * 0.6)),
                    (0.6, Color::rgba(252, 211, 77, opacity * 0.2)),
                    (1.0, Color::TRANSPARENT),
                ],
            ),
        );
        if params.density < 60.0 {
            let glint = 0.15 * (1.0 - params.density / 100.0);
            let at = Vec2::new(spot_x - 20.0, ROAD_Y + 8.0);
            canvas.fill_path(
                &Path::ellipse(at, Vec2::new(30.0, 12.0)),
                &Paint::radial(
                    at,
                    30.0,
                    &[
                        (0.0, Color::WHITE.with_alpha(glint)),
                        (0.5, Color::rgba(255, 255, 220, glint * 0.3)),
                        (1.0, Color::TRANSPARENT),
                    ],
                ),
            );
        }
    }

    canvas.set_blend_mode(BlendMode::Normal);
}

fn draw_wall_of_white<C: Canvas2D + ?Sized>(canvas: &mut C, start: Vec2, strength: f32, density: f32, time: f32) {
    canvas.set_blend_mode(BlendMode::Additive);
    for layer in 0..4 {
        let center = start + Vec2::X * (50.0 + layer as f32 * 30.0);
        let intensity = strength * (1.0 - layer as f32 * 0.2);
        let radius = 180.0 - layer as f32 * 20.0;
        let mut sector = Path::arc(center, Vec2::splat(radius), -PI / 2.5, PI / 2.5, 24, false)
            .points()
            .to_vec();
        sector.push(start + Vec2::X * 30.0);
        let sector = Path::polygon(sector);
        canvas.fill_path(
            &sector,
            &Paint::radial(
                center,
                radius,
                &[
                    (0.0, Color::WHITE.with_alpha(intensity * 0.6)),
                    (0.25, Color::rgba(255, 255, 245, intensity * 0.4)),
                    (0.5, Color::rgba(255, 250, 230, intensity * 0.2)),
                    (1.0, Color::TRANSPARENT),
                ],
            ),
        );
    }

    let veil = strength * 0.25;
    canvas.fill_rect(
        Rect::new(start.x, 20.0, 300.0, ROAD_Y - 40.0),
        &Paint::linear(
            Vec2::new(start.x, 0.0),
            Vec2::new(start.x + 300.0, 0.0),
            &[
                (0.0, Color::WHITE.with_alpha(veil)),
                (0.4, Color::rgba(255, 255, 240, veil * 0.5)),
                (1.0, Color::TRANSPARENT),
            ],
        ),
    );

    if density > 50.0 {
        let spots = ((density - 50.0) / 5.0).floor() as usize;
        for i in 0..spots {
            let fi = i as f32;
            let at = Vec2::new(
                start.x + 40.0 + (fi * 37.0 + time * 20.0) % 150.0,
                start.y + (fi * 2.7 + time).sin() * 60.0,
            );
            let size = (5.0 + (time * 3.0 + fi).sin() * 2.0) * 2.0;
            let opacity = 0.3 + (time * 2.0 + fi * 1.5).sin() * 0.15;
            canvas.fill_circle(
                at,
                size,
                &Paint::radial(
                    at,
                    size,
                    &[
                        (0.0, Color::WHITE.with_alpha(opacity)),
                        (0.5, Color::rgba(255, 255, 220, opacity * 0.4)),
                        (1.0, Color::TRANSPARENT),
                    ],
                ),
            );
        }
    }
    canvas.set_blend_mode(BlendMode::Normal);
}

fn draw_driver_view<C: Canvas2D + ?Sized>(canvas: &mut C, params: &SceneParams) {
    let beam_x = HEADLIGHT_X + 10.0;
    canvas.fill_rect(Rect::new(0.0, 0.0, beam_x + 30.0, SIZE.y), &Paint::solid(Color::BLACK.with_alpha(0.85)));

    let frame = Rect::new(beam_x + 50.0, 25.0, SIZE.x - beam_x - 80.0, SIZE.y - 70.0);
    let inner = frame.inset(12.0);
    canvas.stroke_path(&Path::rect(frame), &Paint::solid(Color::hex("#2a2a2a")), &Stroke::new(25.0));
    canvas.stroke_path(&Path::rect(inner), &Paint::solid(Color::hex("#404040")), &Stroke::new(3.0));
    canvas.fill_rect(
        Rect::new(frame.min.x - 10.0, SIZE.y - 45.0, frame.width() + 40.0, 50.0),
        &Paint::solid(Color::hex("#1a1a1a")),
    );

    if stats::wall_of_white(params.headlight, params.density).is_some() {
        let warning = ((params.density - stats::WALL_OF_WHITE_THRESHOLD) / 100.0).min(0.4);
        canvas.fill_rect(inner, &Paint::solid(Color::rgba(255, 100, 100, warning)));
        let center = Vec2::new(SIZE.x / 2.0 + 60.0, SIZE.y / 2.0);
        canvas.text(center, "⚠ VISIBILITY COMPROMISED", Color::hex("#fcd34d"), 28.0);
        canvas.text(center + Vec2::Y * 35.0, "Slow down and use low beam", Color::WHITE, 16.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawList;
    use crate::stats::DangerLevel;

    fn params(headlight: Headlight, density: f32) -> SceneParams {
        SceneParams {
            headlight,
            density,
            ..SceneParams::default()
        }
    }

    /// Render `n` frames; returns the last frame's stats with event counts summed over all frames
    fn frames(scene: &mut Fog, params: &SceneParams, n: usize) -> (FrameStats, DrawList) {
        let mut list = DrawList::new(SIZE.x, SIZE.y);
        let mut stats = FrameStats::default();
        let (mut scatter, mut backscatter) = (0, 0);
        for i in 0..n {
            list.clear_commands();
            stats = scene.render(&mut list, params, i as f32 * TIME_STEP);
            scatter += stats.scatter_events;
            backscatter += stats.backscatter_events;
        }
        stats.scatter_events = scatter;
        stats.backscatter_events = backscatter;
        (stats, list)
    }

    #[test]
    fn test_particle_count_follows_density() {
        assert_eq!(Fog::particle_count(50.0), 350);
        let scene = Fog::new(&params(Headlight::Low, 10.0), Some(1));
        assert_eq!(scene.droplets().len(), 190);
    }

    #[test]
    fn test_reseed_changes_population() {
        let mut scene = Fog::new(&params(Headlight::Low, 10.0), Some(1));
        scene.reseed(&params(Headlight::Low, 80.0));
        assert_eq!(scene.droplets().len(), 470);
    }

    #[test]
    fn test_stats_are_closed_form() {
        let mut scene = Fog::new(&params(Headlight::High, 50.0), Some(2));
        let (stats, _) = frames(&mut scene, &params(Headlight::High, 50.0), 3);
        assert_eq!(stats.visibility, Some(53));
        assert_eq!(stats.glare, Some(55));
        assert_eq!(stats.danger, DangerLevel::Warning);
    }

    #[test]
    fn test_fog_lights_droplets_in_beam() {
        let p = params(Headlight::Low, 50.0);
        let mut scene = Fog::new(&p, Some(3));
        let (stats, _) = frames(&mut scene, &p, 120);
        assert!(stats.illuminated > 0);
        assert!(stats.scatter_events > 0);
        assert_eq!(stats.backscatter_events, 0);
    }

    #[test]
    fn test_high_beam_backscatter() {
        let p = params(Headlight::High, 80.0);
        let mut scene = Fog::new(&p, Some(3));
        let (stats, _) = frames(&mut scene, &p, 300);
        assert!(stats.backscatter_events > 0);
        assert!(stats.backscatter_events <= stats.scatter_events);
        assert!(stats.wall_of_white);
    }

    #[test]
    fn test_driver_view_warning() {
        let p = SceneParams {
            view: ViewMode::Driver,
            ..params(Headlight::High, 80.0)
        };
        let mut scene = Fog::new(&p, Some(4));
        let (_, list) = frames(&mut scene, &p, 1);
        assert!(list.has_label("VISIBILITY COMPROMISED"));

        let low = SceneParams {
            view: ViewMode::Driver,
            ..params(Headlight::Low, 80.0)
        };
        let (_, list) = frames(&mut scene, &low, 1);
        assert!(!list.has_label("VISIBILITY COMPROMISED"));
    }

    #[test]
    fn test_denser_fog_dims_the_beam() {
        let thin = headlight_beam(&params(Headlight::Low, 20.0)).unwrap();
        let thick = headlight_beam(&params(Headlight::Low, 90.0)).unwrap();
        assert!(thick.attenuation_at(50.0) < thin.attenuation_at(50.0));
        assert!(thick.range < thin.range);
    }

    #[test]
    fn test_droplets_stay_above_road() {
        let p = SceneParams {
            speed: 100.0,
            ..params(Headlight::Low, 60.0)
        };
        let mut scene = Fog::new(&p, Some(8));
        frames(&mut scene, &p, 300);
        for d in scene.droplets().particles() {
            assert!(d.position.y <= ROAD_Y - 10.0 && d.position.x >= 50.0);
        }
    }
}
