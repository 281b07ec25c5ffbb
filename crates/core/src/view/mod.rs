//! Top-level runtime object: one braid scene, its assets, the frame loop and
//! a backend, fed by an input channel.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::{
    assets::AssetStore,
    config::AppConfig,
    mapping::ParameterUpdate,
    render::{upload_scene, RenderBackend},
    scene::Scene,
    timeline::{AnimationDriver, PlaybackClock, Tick},
    Result,
};

/// Input delivered from outside the frame loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewEvent {
    Resize { width: u32, height: u32 },
    Parameter(ParameterUpdate),
}

/// Cloneable sender for [`ViewEvent`]s. Sends after the view is disposed are
/// dropped.
#[derive(Debug, Clone)]
pub struct ViewHandle {
    sender: Sender<ViewEvent>,
}

impl ViewHandle {
    pub fn resize(&self, width: u32, height: u32) {
        let _ = self.sender.send(ViewEvent::Resize { width, height });
    }

    pub fn set_parameter(&self, update: ParameterUpdate) {
        let _ = self.sender.send(ViewEvent::Parameter(update));
    }
}

/// Totals for one [`View::run_frames`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub frames: usize,
    /// Frames the backend rejected.
    pub failures: usize,
    pub last: Option<Tick>,
}

impl RunSummary {
    /// Elapsed time of the last frame, zero when nothing ran.
    pub fn elapsed(&self) -> f32 {
        self.last.map(|tick| tick.elapsed).unwrap_or_default()
    }
}

pub struct View<B: RenderBackend> {
    scene: Scene,
    assets: AssetStore,
    driver: AnimationDriver,
    backend: B,
    sender: Sender<ViewEvent>,
    receiver: Receiver<ViewEvent>,
}

impl<B: RenderBackend> View<B> {
    /// Builds the scene from `config`, uploads it to `backend` and schedules
    /// the first frame.
    pub fn new(config: &AppConfig, clock: PlaybackClock, mut backend: B) -> Result<Self> {
        let mut assets = AssetStore::new();
        let scene = Scene::build(config, &mut assets)?;
        upload_scene(&mut backend, &scene)?;
        backend.resize(config.viewport.width, config.viewport.height);

        let mut driver = AnimationDriver::new(clock, config.animation.frames_per_second);
        driver.start();

        let (sender, receiver) = mpsc::channel();
        Ok(Self {
            scene,
            assets,
            driver,
            backend,
            sender,
            receiver,
        })
    }

    pub fn handle(&self) -> ViewHandle {
        ViewHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn driver(&self) -> &AnimationDriver {
        &self.driver
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Runs up to `frames` iterations. Stops early once the driver has
    /// nothing scheduled.
    pub fn run_frames(&mut self, frames: usize) -> RunSummary {
        let mut summary = RunSummary::default();
        for _ in 0..frames {
            self.drain_events();
            self.assets.poll();
            let Some(tick) = self.driver.tick(&mut self.scene, &self.assets, &mut self.backend)
            else {
                break;
            };
            summary.frames += 1;
            if !tick.submitted {
                summary.failures += 1;
            }
            summary.last = Some(tick);
        }
        summary
    }

    /// Stops the frame loop without releasing anything.
    pub fn stop(&mut self) {
        self.driver.stop();
    }

    /// Applies queued input: resizes first, then parameter writes in arrival
    /// order.
    fn drain_events(&mut self) {
        let mut parameters = Vec::new();
        while let Ok(event) = self.receiver.try_recv() {
            match event {
                ViewEvent::Resize { width, height } => {
                    if self.scene.resize(width, height) {
                        self.backend.resize(width, height);
                    } else {
                        tracing::debug!(width, height, "ignoring zero-area resize");
                    }
                }
                ViewEvent::Parameter(update) => parameters.push(update),
            }
        }
        let bindings = self.scene.bindings_mut();
        for update in parameters {
            bindings.apply(update);
        }
    }

    /// Stops the frame loop, closes the input channel and releases GPU and
    /// texture resources. Returns the backend.
    pub fn dispose(mut self) -> B {
        self.driver.stop();

        let Self {
            scene,
            mut assets,
            mut backend,
            sender,
            receiver,
            ..
        } = self;
        drop(receiver);
        drop(sender);

        for strand in scene.strands() {
            backend.release(strand.id);
        }
        assets.release_all();
        drop(scene);

        tracing::info!("view disposed");
        backend
    }
}
