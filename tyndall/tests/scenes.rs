//! Whole-scene behaviour: particle bounds, beam resolution, scattering classes and the
//! closed-form fog readouts.

use glam::Vec2;
use tyndall::beam::{resolve, BeamGeometry, Container, Extinction, LightSource, GAUSSIAN_SHARPNESS};
use tyndall::canvas::{DrawList, Rect};
use tyndall::frame::{self, cone_opacity, BeamStyle, GlowRates};
use tyndall::medium::ScatteringClass;
use tyndall::particles::{FieldConfig, MotionRule, ParticleField};
use tyndall::scenes::fog::{self, Fog};
use tyndall::scenes::{LabBench, SceneParams};
use tyndall::stats::{self, DangerLevel, FrameStats, Headlight};
use tyndall::Color;

fn params(headlight: Headlight, density: f32) -> SceneParams {
    SceneParams {
        headlight,
        density,
        ..SceneParams::default()
    }
}

#[test]
fn test_every_motion_rule_stays_in_bounds() {
    let bounds = Rect::new(20.0, 40.0, 160.0, 120.0);
    let rules = [
        MotionRule::Brownian {
            jitter: 0.8,
            max_speed: 3.0,
            damping: 0.99,
            restitution: 0.5,
        },
        MotionRule::Settling { rate: 2.0, sway: 1.5 },
        MotionRule::Drift {
            wind: 4.0,
            sway: 2.0,
            turbulence: 1.0,
        },
        MotionRule::Static { jitter: 2.0 },
    ];

    for (i, rule) in rules.into_iter().enumerate() {
        let config = FieldConfig::new(120, bounds, rule)
            .with_speed(2.5)
            .with_velocity((-2.0, 2.0), (0.2, 1.5))
            .with_settle_line(100.0, 0.5);
        let mut field = ParticleField::new(config, Some(i as u64));
        field.set_time_acceleration(10.0);
        for tick in 0..600 {
            field.step(1.0, tick as f32 * 0.02);
            for p in field.particles() {
                assert!(bounds.contains(p.position), "{:?} escaped to {:?}", rule, p.position);
            }
        }
    }
}

#[test]
fn test_denser_fog_dims_beam_and_visibility() {
    for headlight in [Headlight::Low, Headlight::High] {
        let style = BeamStyle::new(Color::WHITE, 0.6);
        let mut last_opacity = f32::INFINITY;
        let mut last_far = f32::INFINITY;
        let mut last_visibility = f32::INFINITY;

        for density in (10..=100).step_by(5).map(|d| d as f32) {
            let beam = fog::headlight_beam(&params(headlight, density)).unwrap();
            let opacity = cone_opacity(&beam, ScatteringClass::Colloidal, &style);
            let far = beam.attenuation_at(200.0);
            let visibility = stats::visibility(headlight, density);

            assert!(opacity <= last_opacity);
            assert!(far <= last_far);
            assert!(visibility <= last_visibility);
            last_opacity = opacity;
            last_far = far;
            last_visibility = visibility;
        }
    }
}

#[test]
fn test_attenuation_never_increases_with_distance() {
    let extinction = Extinction::new(0.02, 0.7, 0.5);
    assert!(extinction.attenuation(0.0) <= 1.0);
    let mut last = extinction.attenuation(0.0);
    for d in 1..500 {
        let value = extinction.attenuation(d as f32);
        assert!(value <= last);
        last = value;
    }
}

#[test]
fn test_solutions_never_light_up() {
    let mut bench = LabBench::new(Some(11));
    let full = SceneParams {
        intensity: 100.0,
        ..SceneParams::default()
    };
    let mut canvas = DrawList::new(780.0, 340.0);
    for tick in 0..300 {
        canvas.clear_commands();
        bench.render(&mut canvas, &full, tick as f32 * 0.016);
    }
    let (water, sugar) = (bench.field(0).unwrap(), bench.field(1).unwrap());
    assert_eq!(bench.class(0), Some(ScatteringClass::Transparent));
    assert_eq!(bench.class(1), Some(ScatteringClass::Transparent));
    for p in water.particles().iter().chain(sugar.particles()) {
        assert!(p.illumination < 1e-3);
    }
}

#[test]
fn test_centerline_particle_gets_full_weight() {
    let source = LightSource::new(Vec2::new(0.0, 50.0), Vec2::X, 1.0).with_base_width(10.0);
    let beam = BeamGeometry::open(&source, Extinction::NONE).unwrap();

    let centre = beam.weight_at(beam.point_at(0.0), 0.5, GAUSSIAN_SHARPNESS).unwrap();
    assert!((centre - 1.0).abs() < 1e-6);
    let off_axis = beam.weight_at(Vec2::new(0.0, 53.0), 0.5, GAUSSIAN_SHARPNESS).unwrap();
    assert!(off_axis < centre);

    let rates = GlowRates::new(0.2, 0.1);
    let config = FieldConfig::new(2, Rect::new(0.0, 0.0, 400.0, 200.0), MotionRule::Static { jitter: 0.0 })
        .with_radius(0.5, 0.5);
    let mut field = ParticleField::new(config, Some(3));
    field.particles_mut()[0].position = beam.point_at(0.0);
    field.particles_mut()[1].position = Vec2::new(100.0, 150.0);

    for _ in 0..20 {
        frame::illuminate_field(&mut field, Some(&beam), ScatteringClass::Colloidal.response(1.0), rates);
    }
    assert_eq!(field.particles()[0].illumination, 1.0);
    assert_eq!(field.particles()[1].illumination, 0.0);
}

#[test]
fn test_resolver_entry_points() {
    let container = Container::new(Rect::new(100.0, 100.0, 80.0, 120.0), 120.0);

    let away = LightSource::new(Vec2::new(140.0, 40.0), Vec2::new(0.0, -1.0), 1.0);
    assert!(resolve(&away, &container, 50.0, Extinction::NONE).is_none());

    let down = LightSource::new(Vec2::new(140.0, 40.0), Vec2::new(0.0, 1.0), 1.0);
    let beam = resolve(&down, &container, 50.0, Extinction::NONE).unwrap();
    assert!(beam.entry.abs_diff_eq(Vec2::new(140.0, 120.0), 1e-3));

    let side = LightSource::new(Vec2::new(20.0, 160.0), Vec2::X, 1.0);
    let beam = resolve(&side, &container, 50.0, Extinction::NONE).unwrap();
    assert!(beam.entry.abs_diff_eq(Vec2::new(100.0, 160.0), 1e-3));
}

#[test]
fn test_zero_aim_yields_no_entry() {
    let container = Container::new(Rect::new(100.0, 100.0, 80.0, 120.0), 120.0);
    for direction in [Vec2::ZERO, Vec2::new(f32::NAN, 1.0), Vec2::new(f32::INFINITY, 0.0)] {
        let source = LightSource::new(Vec2::new(140.0, 40.0), direction, 1.0);
        assert!(resolve(&source, &container, 50.0, Extinction::NONE).is_none());
        assert!(BeamGeometry::open(&source, Extinction::NONE).is_none());
    }
}

#[test]
fn test_fog_readouts_are_pure() {
    let mut scene = Fog::new(&params(Headlight::High, 50.0), Some(9));
    let mut canvas = DrawList::new(800.0, 400.0);
    let first = scene.render(&mut canvas, &params(Headlight::High, 50.0), 0.02);
    canvas.clear_commands();
    let second = scene.render(&mut canvas, &params(Headlight::High, 50.0), 0.04);

    let closed_form = FrameStats::fog(Headlight::High, 50.0);
    for stats in [first, second] {
        assert_eq!(stats.visibility, closed_form.visibility);
        assert_eq!(stats.glare, closed_form.glare);
        assert_eq!(stats.effective_range, closed_form.effective_range);
        assert_eq!(stats.wall_of_white, closed_form.wall_of_white);
    }
}

#[test]
fn test_fog_readout_scenarios() {
    let low = FrameStats::fog(Headlight::Low, 50.0);
    assert_eq!(low.visibility, Some(75));

    let high = FrameStats::fog(Headlight::High, 50.0);
    assert_eq!(high.visibility, Some(53));
    assert_eq!(high.glare, Some(55));
}

#[test]
fn test_wall_of_white_threshold() {
    assert!(FrameStats::fog(Headlight::High, 80.0).wall_of_white);
    assert!(!FrameStats::fog(Headlight::High, 20.0).wall_of_white);
    assert!(!FrameStats::fog(Headlight::Low, 80.0).wall_of_white);

    let mut scene = Fog::new(&params(Headlight::High, 80.0), Some(4));
    let mut canvas = DrawList::new(800.0, 400.0);
    let stats = scene.render(&mut canvas, &params(Headlight::High, 80.0), 0.02);
    assert!(stats.wall_of_white);
    assert_eq!(stats.danger, DangerLevel::Critical);
}

#[test]
fn test_suspension_particle_settles_and_freezes() {
    let bounds = Rect::new(0.0, 0.0, 100.0, 200.0);
    let config = FieldConfig::new(1, bounds, MotionRule::Settling { rate: 1.0, sway: 0.0 })
        .with_velocity((0.0, 0.0), (1.0, 1.0))
        .with_settle_line(140.0, 0.0);
    let mut field = ParticleField::new(config, Some(1));
    field.particles_mut()[0].position = Vec2::new(50.0, 30.0);

    let mut last = 30.0;
    for tick in 0..110 {
        field.step(1.0, tick as f32);
        let y = field.particles()[0].position.y;
        assert!(y > last);
        last = y;
    }
    assert!((last - 140.0).abs() < 1e-3);
    assert!(field.particles()[0].settled);

    let frozen = field.particles()[0].position;
    for tick in 0..50 {
        field.step(1.0, tick as f32);
        assert_eq!(field.particles()[0].position, frozen);
    }
}
