//! Animation driver
//!
//! Owns the mounted scene, its accumulated time and the latest statistics. The host window
//! calls [`AnimationDriver::frame`] once per repaint; the driver draws one frame and asks the
//! scheduler for the next repaint only while it is running and its stop token is live.

use crate::canvas::Canvas2D;
use crate::scenes::{Scene, SceneKind, SceneParams};
use crate::stats::FrameStats;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Stopped,
    Running,
}

/// Cancellation flag shared between the driver and whoever scheduled its frames
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Requests another frame from the host (a window redraw, a timer)
pub trait FrameScheduler {
    fn schedule(&mut self);
}

pub struct AnimationDriver {
    scene: Option<Scene>,
    params: SceneParams,
    state: DriverState,
    token: StopToken,
    time: f32,
    frames: u64,
    stats: FrameStats,
    seed: Option<u64>,
}

impl AnimationDriver {
    /// `seed` makes every mounted population reproducible
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            scene: None,
            params: SceneParams::default(),
            state: DriverState::Stopped,
            token: StopToken::new(),
            time: 0.0,
            frames: 0,
            stats: FrameStats::default(),
            seed,
        }
    }

    /// Tear down any current scene, mount `kind` and start running
    pub fn mount(&mut self, kind: SceneKind, params: SceneParams) -> StopToken {
        self.unmount();
        self.params = params.clamped();
        self.scene = Some(Scene::mount(kind, &self.params, self.seed));
        self.token = StopToken::new();
        self.time = 0.0;
        self.frames = 0;
        self.stats = FrameStats::default();
        self.state = DriverState::Running;
        log::info!("Mounted scene '{}'", kind);
        self.token.clone()
    }

    /// Stop scheduling and drop the scene's simulation state
    pub fn unmount(&mut self) {
        self.token.cancel();
        self.state = DriverState::Stopped;
        if let Some(scene) = self.scene.take() {
            log::info!("Unmounted scene '{}' after {} frames", scene.kind(), self.frames);
        }
    }

    pub fn pause(&mut self) {
        self.state = DriverState::Stopped;
    }

    /// Resume a paused scene; a cancelled or unmounted driver stays stopped
    pub fn resume(&mut self) {
        if self.scene.is_some() && !self.token.is_cancelled() {
            self.state = DriverState::Running;
        }
    }

    /// Apply new inputs, re-seeding the population when they change its size
    pub fn set_params(&mut self, params: SceneParams) {
        let params = params.clamped();
        if params == self.params {
            return;
        }
        if let Some(scene) = &mut self.scene {
            if scene.needs_reseed(&self.params, &params) {
                log::debug!("Re-seeding '{}' for new parameters", scene.kind());
                scene.reseed(&params);
            }
        }
        log::debug!("Parameters changed: {:?}", params);
        self.params = params;
    }

    /// Restart the scene's simulation in place
    pub fn reset(&mut self) {
        if let Some(scene) = &mut self.scene {
            scene.reset();
            self.time = 0.0;
        }
    }

    /// Advance the clock one fixed step and draw; `None` when not running
    pub fn tick<C: Canvas2D + ?Sized>(&mut self, canvas: &mut C) -> Option<FrameStats> {
        if self.state != DriverState::Running || self.token.is_cancelled() {
            return None;
        }
        let scene = self.scene.as_mut()?;
        self.time += scene.time_step();
        self.stats = scene.render(canvas, &self.params, self.time);
        self.frames += 1;
        Some(self.stats)
    }

    /// One repaint: draw, then reschedule unless stopped in the meantime
    pub fn frame<C, S>(&mut self, canvas: &mut C, scheduler: &mut S) -> Option<FrameStats>
    where
        C: Canvas2D + ?Sized,
        S: FrameScheduler + ?Sized,
    {
        let stats = self.tick(canvas)?;
        if self.should_reschedule() {
            scheduler.schedule();
        }
        Some(stats)
    }

    pub fn should_reschedule(&self) -> bool {
        self.state == DriverState::Running && self.scene.is_some() && !self.token.is_cancelled()
    }

    /// Accumulated animation time of the mounted scene
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    /// Frames drawn since mount
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Statistics of the last frame drawn
    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::DrawList;
    use crate::scenes::fog;

    #[derive(Default)]
    struct Counter(usize);

    impl FrameScheduler for Counter {
        fn schedule(&mut self) {
            self.0 += 1;
        }
    }

    fn canvas() -> DrawList {
        DrawList::new(800.0, 500.0)
    }

    #[test]
    fn test_stopped_until_mounted() {
        let mut driver = AnimationDriver::new(Some(1));
        assert_eq!(driver.state(), DriverState::Stopped);
        assert!(driver.tick(&mut canvas()).is_none());
        assert!(!driver.should_reschedule());
    }

    #[test]
    fn test_fixed_time_step() {
        let mut driver = AnimationDriver::new(Some(1));
        driver.mount(SceneKind::Fog, SceneParams::default());
        let mut list = canvas();
        for _ in 0..10 {
            list.clear_commands();
            driver.tick(&mut list);
        }
        assert!((driver.time() - 10.0 * fog::TIME_STEP).abs() < 1e-5);
        assert_eq!(driver.frames(), 10);
    }

    #[test]
    fn test_no_frame_after_unmount() {
        let mut driver = AnimationDriver::new(Some(2));
        let token = driver.mount(SceneKind::TwoCups, SceneParams::default());
        let mut scheduler = Counter::default();
        let mut list = canvas();
        assert!(driver.frame(&mut list, &mut scheduler).is_some());
        assert_eq!(scheduler.0, 1);

        driver.unmount();
        assert!(token.is_cancelled());
        assert!(driver.frame(&mut list, &mut scheduler).is_none());
        assert_eq!(scheduler.0, 1);
        driver.resume();
        assert_eq!(driver.state(), DriverState::Stopped);
    }

    #[test]
    fn test_external_cancel_stops_rescheduling() {
        let mut driver = AnimationDriver::new(Some(3));
        let token = driver.mount(SceneKind::LabBench, SceneParams::default());
        token.cancel();
        let mut scheduler = Counter::default();
        assert!(driver.frame(&mut canvas(), &mut scheduler).is_none());
        assert_eq!(scheduler.0, 0);
    }

    #[test]
    fn test_pause_and_resume() {
        let mut driver = AnimationDriver::new(Some(4));
        driver.mount(SceneKind::TwoCups, SceneParams::default());
        driver.pause();
        assert!(driver.tick(&mut canvas()).is_none());
        driver.resume();
        assert!(driver.tick(&mut canvas()).is_some());
    }

    #[test]
    fn test_light_off_keeps_running() {
        let mut driver = AnimationDriver::new(Some(5));
        driver.mount(SceneKind::LabBench, SceneParams::default());
        driver.set_params(SceneParams {
            light_on: false,
            ..SceneParams::default()
        });
        assert_eq!(driver.state(), DriverState::Running);
        assert!(driver.tick(&mut canvas()).is_some());
    }

    #[test]
    fn test_set_params_clamps_and_reseeds() {
        let mut driver = AnimationDriver::new(Some(6));
        driver.mount(SceneKind::Fog, SceneParams::default());
        driver.set_params(SceneParams {
            density: 500.0,
            ..SceneParams::default()
        });
        assert_eq!(driver.params().density, 100.0);
        match driver.scene() {
            Some(Scene::Fog(scene)) => assert_eq!(scene.droplets().len(), fog::Fog::particle_count(100.0)),
            _ => panic!("fog scene not mounted"),
        }
    }

    #[test]
    fn test_remount_replaces_scene() {
        let mut driver = AnimationDriver::new(Some(7));
        let first = driver.mount(SceneKind::Fog, SceneParams::default());
        driver.tick(&mut canvas());
        let second = driver.mount(SceneKind::TwoCups, SceneParams::default());
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(driver.time(), 0.0);
        assert_eq!(driver.scene().map(|s| s.kind()), Some(SceneKind::TwoCups));
    }
}
