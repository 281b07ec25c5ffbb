use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use crate::{assets::AssetStore, render::RenderBackend, scene::Scene};

/// Source of elapsed time for the animation.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    source: ClockSource,
}

#[derive(Debug, Clone)]
enum ClockSource {
    Monotonic(Instant),
    /// Deterministic time that only moves when the loop advances it.
    Manual(Duration),
}

impl PlaybackClock {
    /// Wall clock starting now.
    pub fn start() -> Self {
        Self {
            source: ClockSource::Monotonic(Instant::now()),
        }
    }

    /// Clock frozen at zero until advanced.
    pub fn manual() -> Self {
        Self {
            source: ClockSource::Manual(Duration::ZERO),
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.source, ClockSource::Manual(_))
    }

    pub fn elapsed(&self) -> Duration {
        match &self.source {
            ClockSource::Monotonic(start) => start.elapsed(),
            ClockSource::Manual(now) => *now,
        }
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed().as_secs_f32()
    }

    /// Moves a manual clock forward. Wall clocks ignore this.
    pub fn advance(&mut self, delta: Duration) {
        if let ClockSource::Manual(now) = &mut self.source {
            *now += delta;
        }
    }

    /// Blocks a wall clock until `due`; a manual clock jumps there instead.
    /// Time never moves backwards.
    pub fn wait_until(&mut self, due: Duration) {
        match &mut self.source {
            ClockSource::Monotonic(start) => {
                let elapsed = start.elapsed();
                if due > elapsed {
                    std::thread::sleep(due - elapsed);
                }
            }
            ClockSource::Manual(now) => *now = (*now).max(due),
        }
    }
}

/// Shared flag that stops a scheduler from issuing further frames.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledFrame {
    pub id: FrameId,
    pub due: Duration,
}

/// Explicit queue of pending frame callbacks, ordered by due time.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    queue: VecDeque<ScheduledFrame>,
    next_id: u64,
    token: CancellationToken,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Queues a frame for `due`. Returns `None` once the scheduler is cancelled.
    pub fn request_frame(&mut self, due: Duration) -> Option<FrameId> {
        if self.token.is_cancelled() {
            return None;
        }
        let id = FrameId(self.next_id);
        self.next_id += 1;
        let at = self.queue.partition_point(|frame| frame.due <= due);
        self.queue.insert(at, ScheduledFrame { id, due });
        Some(id)
    }

    /// Drops one pending frame. Returns whether it was still queued.
    pub fn cancel(&mut self, id: FrameId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|frame| frame.id != id);
        self.queue.len() != before
    }

    /// Cancels the token and clears the queue.
    pub fn cancel_all(&mut self) {
        self.token.cancel();
        self.queue.clear();
    }

    pub fn take_next(&mut self) -> Option<ScheduledFrame> {
        if self.token.is_cancelled() {
            self.queue.clear();
            return None;
        }
        self.queue.pop_front()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Outcome of one driver iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub frame_index: u64,
    pub elapsed: f32,
    /// False when the backend rejected the frame.
    pub submitted: bool,
}

/// Drives the per-frame loop: time update, then exactly one submission, then
/// the next frame request.
#[derive(Debug)]
pub struct AnimationDriver {
    clock: PlaybackClock,
    scheduler: FrameScheduler,
    interval: Duration,
    frame_index: u64,
    failures: u64,
}

impl AnimationDriver {
    pub fn new(clock: PlaybackClock, frames_per_second: u32) -> Self {
        Self {
            clock,
            scheduler: FrameScheduler::new(),
            interval: frame_interval(frames_per_second),
            frame_index: 0,
            failures: 0,
        }
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Submissions the backend rejected so far.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn is_running(&self) -> bool {
        !self.scheduler.is_cancelled() && self.scheduler.pending() > 0
    }

    /// Requests the first frame, due immediately.
    pub fn start(&mut self) -> Option<FrameId> {
        if self.scheduler.pending() > 0 {
            return None;
        }
        let id = self.scheduler.request_frame(self.clock.elapsed());
        if id.is_some() {
            tracing::info!(interval_ms = self.interval.as_millis() as u64, "animation started");
        }
        id
    }

    /// Runs the next scheduled frame. Returns `None` when nothing is scheduled
    /// or the driver was stopped.
    pub fn tick<B: RenderBackend + ?Sized>(
        &mut self,
        scene: &mut Scene,
        assets: &AssetStore,
        backend: &mut B,
    ) -> Option<Tick> {
        let frame = self.scheduler.take_next()?;
        self.clock.wait_until(frame.due);

        let elapsed = self.clock.elapsed_secs();
        scene.push_time(elapsed);

        let frame_index = self.frame_index;
        let submitted = match backend.submit(&scene.frame_view(frame_index, elapsed, assets)) {
            Ok(()) => true,
            Err(err) => {
                self.failures += 1;
                tracing::warn!(frame = frame_index, error = %err, "frame submission failed");
                false
            }
        };
        self.frame_index += 1;

        // late frames restart the cadence from now
        let now = self.clock.elapsed();
        let mut next = frame.due + self.interval;
        if next <= now {
            next = now + self.interval;
        }
        self.scheduler.request_frame(next);

        Some(Tick {
            frame_index,
            elapsed,
            submitted,
        })
    }

    /// Cancels the token and every scheduled frame.
    pub fn stop(&mut self) {
        if !self.scheduler.is_cancelled() {
            tracing::info!(frames = self.frame_index, "animation stopped");
        }
        self.scheduler.cancel_all();
    }
}

/// Duration of one frame at `frames_per_second`; zero is treated as one.
pub fn frame_interval(frames_per_second: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(frames_per_second.max(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        render::{upload_scene, HeadlessBackend},
        scene::MeshId,
    };

    fn scene() -> Scene {
        let mut config = AppConfig::default();
        config.braid.sample_count = 12;
        config.tube.length_segments = 6;
        config.tube.radial_segments = 3;
        Scene::build(&config, &mut AssetStore::new()).unwrap()
    }

    #[test]
    fn manual_clock_only_moves_forward() {
        let mut clock = PlaybackClock::manual();
        clock.wait_until(Duration::from_millis(40));
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
        clock.wait_until(Duration::from_millis(10));
        assert_eq!(clock.elapsed(), Duration::from_millis(40));
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.elapsed(), Duration::from_millis(45));
    }

    #[test]
    fn scheduler_orders_by_due_time() {
        let mut scheduler = FrameScheduler::new();
        let late = scheduler.request_frame(Duration::from_millis(30)).unwrap();
        let early = scheduler.request_frame(Duration::from_millis(10)).unwrap();
        assert_eq!(scheduler.pending(), 2);
        assert_eq!(scheduler.take_next().unwrap().id, early);
        assert_eq!(scheduler.take_next().unwrap().id, late);
        assert!(scheduler.take_next().is_none());
    }

    #[test]
    fn cancelled_scheduler_refuses_frames() {
        let mut scheduler = FrameScheduler::new();
        let id = scheduler.request_frame(Duration::ZERO).unwrap();
        assert!(scheduler.cancel(id));
        assert!(!scheduler.cancel(id));

        scheduler.request_frame(Duration::ZERO);
        let token = scheduler.token();
        token.cancel();
        assert!(scheduler.take_next().is_none());
        assert!(scheduler.request_frame(Duration::ZERO).is_none());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn tick_writes_time_then_submits_once() {
        let mut scene = scene();
        let assets = AssetStore::new();
        let mut backend = HeadlessBackend::new();
        upload_scene(&mut backend, &scene).unwrap();

        let mut driver = AnimationDriver::new(PlaybackClock::manual(), 4);
        driver.start();
        for expected in 0..3u64 {
            let tick = driver.tick(&mut scene, &assets, &mut backend).unwrap();
            assert_eq!(tick.frame_index, expected);
            assert!(tick.submitted);
            assert_eq!(backend.submitted(), expected + 1);
            let record = backend.last_frame().unwrap();
            assert_eq!(record.elapsed, expected as f32 * 0.25);
            assert_eq!(record.times, vec![tick.elapsed; 3]);
        }
        assert_eq!(driver.scheduler().pending(), 1);
    }

    #[test]
    fn backend_failures_do_not_stop_the_loop() {
        let mut scene = scene();
        let assets = AssetStore::new();
        let mut backend = HeadlessBackend::new();
        upload_scene(&mut backend, &scene).unwrap();
        backend.release(MeshId(2));

        let mut driver = AnimationDriver::new(PlaybackClock::manual(), 60);
        driver.start();
        for _ in 0..3 {
            let tick = driver.tick(&mut scene, &assets, &mut backend).unwrap();
            assert!(!tick.submitted);
        }
        assert_eq!(driver.failures(), 3);
        assert!(driver.is_running());
    }

    #[test]
    fn stop_cancels_pending_frames() {
        let mut scene = scene();
        let assets = AssetStore::new();
        let mut backend = HeadlessBackend::new();
        let mut driver = AnimationDriver::new(PlaybackClock::manual(), 60);
        driver.start();
        driver.stop();
        assert!(!driver.is_running());
        assert!(driver.tick(&mut scene, &assets, &mut backend).is_none());
        assert!(driver.start().is_none());
    }

    #[test]
    fn stalls_do_not_replay_missed_frames() {
        let mut scene = scene();
        let assets = AssetStore::new();
        let mut backend = HeadlessBackend::new();
        upload_scene(&mut backend, &scene).unwrap();

        let mut driver = AnimationDriver::new(PlaybackClock::manual(), 10);
        driver.start();
        driver.tick(&mut scene, &assets, &mut backend).unwrap();

        driver.clock.advance(Duration::from_secs(1));
        let late = driver.tick(&mut scene, &assets, &mut backend).unwrap();
        assert_eq!(late.elapsed, 1.0);

        let resumed = driver.tick(&mut scene, &assets, &mut backend).unwrap();
        assert!((resumed.elapsed - 1.1).abs() < 1e-6);
        assert_eq!(driver.scheduler().pending(), 1);
    }

    #[test]
    fn zero_fps_falls_back_to_one_second() {
        assert_eq!(frame_interval(0), Duration::from_secs(1));
        assert_eq!(frame_interval(4), Duration::from_millis(250));
    }
}
