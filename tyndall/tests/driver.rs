//! Every scene driven end to end: mounted by the driver, drawn into the tessellator.

use tyndall::canvas::DrawList;
use tyndall::driver::{AnimationDriver, DriverState, FrameScheduler};
use tyndall::scenes::{Example, SceneKind, SceneParams};
use tyndall::{BlendMode, Tessellator};

#[derive(Default)]
struct Redraws(usize);

impl FrameScheduler for Redraws {
    fn schedule(&mut self) {
        self.0 += 1;
    }
}

#[test]
fn test_every_scene_tessellates() {
    for kind in SceneKind::ALL {
        let mut driver = AnimationDriver::new(Some(42));
        driver.mount(kind, SceneParams::default());
        let size = driver.scene().map(|s| s.size()).unwrap();
        let mut canvas = Tessellator::new(size);
        let mut redraws = Redraws::default();

        for _ in 0..30 {
            assert!(driver.frame(&mut canvas, &mut redraws).is_some());
        }
        assert_eq!(redraws.0, 30);
        assert!(canvas.vertex_count() > 0, "{} drew nothing", kind);
        assert_eq!(canvas.vertex_count() % 3, 0);

        for batch in canvas.batches() {
            for vertex in &batch.vertices {
                assert!(vertex.position.iter().all(|c| c.is_finite()), "{} produced NaN", kind);
                assert!(vertex.color.iter().all(|c| (0.0..=1.0).contains(c)));
            }
        }
    }
}

#[test]
fn test_lit_scenes_use_additive_light() {
    let sky = SceneKind::Everyday(Example::Sky);
    for kind in SceneKind::ALL.into_iter().filter(|k| *k != sky) {
        let mut driver = AnimationDriver::new(Some(5));
        driver.mount(kind, SceneParams::default());
        let mut canvas = DrawList::new(800.0, 500.0);
        driver.tick(&mut canvas);
        assert!(canvas.paints(BlendMode::Additive).count() > 0, "{} has no additive light", kind);
    }
}

#[test]
fn test_same_seed_draws_same_frames() {
    for kind in SceneKind::ALL {
        let frames: Vec<_> = (0..2)
            .map(|_| {
                let mut driver = AnimationDriver::new(Some(7));
                driver.mount(kind, SceneParams::default());
                let mut canvas = DrawList::new(800.0, 500.0);
                for _ in 0..10 {
                    canvas.clear_commands();
                    driver.tick(&mut canvas);
                }
                canvas.commands().to_vec()
            })
            .collect();
        assert_eq!(frames[0], frames[1], "{} is not reproducible", kind);
    }
}

#[test]
fn test_switching_scenes_stops_the_old_loop() {
    let mut driver = AnimationDriver::new(Some(1));
    let fog = driver.mount(SceneKind::Fog, SceneParams::default());
    let mut canvas = DrawList::new(800.0, 400.0);
    let mut redraws = Redraws::default();
    driver.frame(&mut canvas, &mut redraws);

    driver.mount(SceneKind::LabBench, SceneParams::default());
    assert!(fog.is_cancelled());
    assert_eq!(driver.state(), DriverState::Running);
    driver.frame(&mut canvas, &mut redraws);
    assert_eq!(redraws.0, 2);

    driver.unmount();
    assert!(driver.frame(&mut canvas, &mut redraws).is_none());
    assert_eq!(redraws.0, 2);
    assert!(driver.scene().is_none());
}

#[test]
fn test_reset_restarts_the_clock() {
    let mut driver = AnimationDriver::new(Some(2));
    driver.mount(SceneKind::LabBench, SceneParams::default());
    let mut canvas = DrawList::new(780.0, 340.0);
    for _ in 0..20 {
        canvas.clear_commands();
        driver.tick(&mut canvas);
    }
    assert!(driver.time() > 0.0);
    driver.reset();
    assert_eq!(driver.time(), 0.0);
    assert_eq!(driver.state(), DriverState::Running);
}
