use std::collections::{BTreeMap, VecDeque};

use glam::{Mat4, Vec2, Vec4};

use crate::{
    mesh::TubeMesh,
    scene::{FrameView, MeshId, Scene},
    shading::ShaderDescriptor,
    BraidError, Result,
};

/// Rendering backend abstraction. Geometry is uploaded once; every frame
/// submits a [`FrameView`] with the current uniforms and transforms.
pub trait RenderBackend {
    fn upload(&mut self, id: MeshId, mesh: &TubeMesh, shader: &ShaderDescriptor) -> Result<()>;

    fn submit(&mut self, frame: &FrameView<'_>) -> Result<()>;

    fn resize(&mut self, width: u32, height: u32);

    fn release(&mut self, id: MeshId);
}

/// Uploads every strand of `scene`.
pub fn upload_scene<B: RenderBackend + ?Sized>(backend: &mut B, scene: &Scene) -> Result<()> {
    for strand in scene.strands() {
        backend.upload(strand.id, &strand.mesh, scene.descriptor())?;
    }
    Ok(())
}

/// Size of a mesh as seen by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadedMesh {
    pub vertex_bytes: usize,
    pub index_count: usize,
    pub shader: &'static str,
}

/// What the headless backend remembers about one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame_index: u64,
    pub elapsed: f32,
    pub view_projection: Mat4,
    pub model: Mat4,
    /// Shader time per strand.
    pub times: Vec<f32>,
    /// Pixel stage evaluated at the probe UV, per strand.
    pub probes: Vec<Vec4>,
}

const DEFAULT_HISTORY: usize = 256;

/// Backend without a GPU. Evaluates the reference shading at a probe UV and
/// keeps a bounded history of submissions.
#[derive(Debug)]
pub struct HeadlessBackend {
    meshes: BTreeMap<MeshId, UploadedMesh>,
    frames: VecDeque<FrameRecord>,
    history: usize,
    submitted: u64,
    viewport: (u32, u32),
    probe_uv: Vec2,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            meshes: BTreeMap::new(),
            frames: VecDeque::new(),
            history: DEFAULT_HISTORY,
            submitted: 0,
            viewport: (0, 0),
            probe_uv: Vec2::splat(0.5),
        }
    }

    pub fn with_probe(mut self, uv: Vec2) -> Self {
        self.probe_uv = uv;
        self
    }

    pub fn with_history(mut self, frames: usize) -> Self {
        self.history = frames.max(1);
        self
    }

    pub fn meshes(&self) -> &BTreeMap<MeshId, UploadedMesh> {
        &self.meshes
    }

    pub fn frames(&self) -> impl Iterator<Item = &FrameRecord> {
        self.frames.iter()
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.frames.back()
    }

    /// Total successful submissions, including ones dropped from history.
    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }
}

impl RenderBackend for HeadlessBackend {
    fn upload(&mut self, id: MeshId, mesh: &TubeMesh, shader: &ShaderDescriptor) -> Result<()> {
        if mesh.vertex_count() == 0 {
            return Err(BraidError::msg(format!("mesh {} has no vertices", id.0)));
        }
        let uploaded = UploadedMesh {
            vertex_bytes: mesh.vertex_bytes().len(),
            index_count: mesh.indices().len(),
            shader: shader.label,
        };
        tracing::debug!(mesh = id.0, vertex_bytes = uploaded.vertex_bytes, "uploaded mesh");
        self.meshes.insert(id, uploaded);
        Ok(())
    }

    fn submit(&mut self, frame: &FrameView<'_>) -> Result<()> {
        let program = frame.program();
        let mut times = Vec::new();
        let mut probes = Vec::new();
        for draw in frame.draws() {
            if !self.meshes.contains_key(&draw.strand.id) {
                return Err(BraidError::msg(format!(
                    "mesh {} was not uploaded",
                    draw.strand.id.0
                )));
            }
            let time = draw.state.time();
            times.push(time);
            probes.push(program.pixel(self.probe_uv, time, draw.texture));
        }

        tracing::debug!(
            frame = frame.frame_index,
            elapsed = frame.elapsed,
            draws = probes.len(),
            "submitted frame"
        );

        if self.frames.len() == self.history {
            self.frames.pop_front();
        }
        self.frames.push_back(FrameRecord {
            frame_index: frame.frame_index,
            elapsed: frame.elapsed,
            view_projection: frame.camera().view_projection(),
            model: frame.group().model_matrix(),
            times,
            probes,
        });
        self.submitted += 1;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn release(&mut self, id: MeshId) {
        if self.meshes.remove(&id).is_some() {
            tracing::debug!(mesh = id.0, "released mesh");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assets::AssetStore, config::AppConfig};

    fn scene() -> Scene {
        let mut config = AppConfig::default();
        config.braid.sample_count = 20;
        config.tube.length_segments = 10;
        config.tube.radial_segments = 4;
        Scene::build(&config, &mut AssetStore::new()).unwrap()
    }

    #[test]
    fn upload_records_buffer_sizes() {
        let scene = scene();
        let mut backend = HeadlessBackend::new();
        upload_scene(&mut backend, &scene).unwrap();

        assert_eq!(backend.meshes().len(), 3);
        let uploaded = backend.meshes()[&MeshId(0)];
        assert_eq!(uploaded.vertex_bytes, 11 * 5 * 32);
        assert_eq!(uploaded.index_count, 10 * 4 * 6);
        assert_eq!(uploaded.shader, "ribbon");
    }

    #[test]
    fn submit_probes_every_strand() {
        let scene = scene();
        let assets = AssetStore::new();
        let mut backend = HeadlessBackend::new().with_probe(Vec2::new(0.5, 0.25));
        upload_scene(&mut backend, &scene).unwrap();

        backend.submit(&scene.frame_view(7, 0.5, &assets)).unwrap();
        let frame = backend.last_frame().unwrap();
        assert_eq!(frame.frame_index, 7);
        assert_eq!(frame.probes.len(), 3);
        assert_eq!(frame.model, Mat4::IDENTITY);
        for probe in &frame.probes {
            assert!(probe.to_array().iter().all(|c| (0.0..=1.0).contains(c)));
        }
    }

    #[test]
    fn submit_fails_for_released_meshes() {
        let scene = scene();
        let assets = AssetStore::new();
        let mut backend = HeadlessBackend::new();
        upload_scene(&mut backend, &scene).unwrap();
        backend.release(MeshId(1));

        assert!(backend.submit(&scene.frame_view(0, 0.0, &assets)).is_err());
        assert_eq!(backend.submitted(), 0);
    }

    #[test]
    fn history_is_bounded() {
        let scene = scene();
        let assets = AssetStore::new();
        let mut backend = HeadlessBackend::new().with_history(2);
        upload_scene(&mut backend, &scene).unwrap();
        for index in 0..5 {
            backend
                .submit(&scene.frame_view(index, index as f32, &assets))
                .unwrap();
        }
        assert_eq!(backend.submitted(), 5);
        let kept: Vec<u64> = backend.frames().map(|f| f.frame_index).collect();
        assert_eq!(kept, [3, 4]);
    }
}
