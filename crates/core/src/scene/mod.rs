//! Scene assembly: strands, their tube meshes, materials and the transform
//! state the renderer reads every frame.

mod camera;

use glam::Vec3;

use crate::{
    assets::{AssetStore, TextureBinding, TextureId},
    config::AppConfig,
    curve::{braid_strands, Curve, Strand},
    mapping::TransformBindings,
    mesh::{extrude_with, TubeMesh},
    shading::{ShaderDescriptor, ShaderSharing, ShaderState, ShadingProgram},
    Result,
};

pub use camera::{CameraState, GroupTransform};

/// Handle of a mesh uploaded to a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshId(pub usize);

/// One strand with its sampled curve, extruded tube and material slot.
#[derive(Debug, Clone)]
pub struct StrandMesh {
    pub id: MeshId,
    pub strand: Strand,
    pub curve: Curve,
    pub mesh: TubeMesh,
    /// Index into the scene's shader states.
    pub shader: usize,
}

/// Everything the renderer draws: geometry is fixed after [`Scene::build`],
/// time and transforms change per frame.
#[derive(Debug)]
pub struct Scene {
    strands: Vec<StrandMesh>,
    shaders: Vec<ShaderState>,
    sharing: ShaderSharing,
    program: ShadingProgram,
    descriptor: ShaderDescriptor,
    bindings: TransformBindings,
}

impl Scene {
    /// Generates and extrudes every strand described by `config`. A configured
    /// texture is requested from `assets` and resolves in the background.
    pub fn build(config: &AppConfig, assets: &mut AssetStore) -> Result<Self> {
        config.validate()?;

        let braid = &config.braid;
        let strands = braid_strands(braid.radius, &braid.strand_offsets, braid.strand_count);

        let texture: Option<TextureId> = config
            .shading
            .texture
            .as_ref()
            .map(|path| assets.request_texture(path));

        let shaders = match config.shading.sharing {
            ShaderSharing::Shared => vec![ShaderState::new(0.0, texture)],
            ShaderSharing::PerStrand => (0..strands.len())
                .map(|index| {
                    ShaderState::new(index as f32 * config.shading.per_strand_time_offset, texture)
                })
                .collect(),
        };

        let strand_meshes: Vec<StrandMesh> = strands
            .into_iter()
            .enumerate()
            .map(|(index, strand)| {
                let curve = strand.curve_with_extents(braid.sample_count, braid.extents);
                let mesh = extrude_with(&curve, config.tube);
                StrandMesh {
                    id: MeshId(index),
                    strand,
                    curve,
                    mesh,
                    shader: match config.shading.sharing {
                        ShaderSharing::Shared => 0,
                        ShaderSharing::PerStrand => index,
                    },
                }
            })
            .collect();

        let bindings = TransformBindings::new(
            CameraState::from_config(&config.camera, &config.viewport),
            GroupTransform::default(),
        );

        tracing::info!(
            strands = strand_meshes.len(),
            vertices = strand_meshes.iter().map(|s| s.mesh.vertex_count()).sum::<usize>(),
            triangles = strand_meshes.iter().map(|s| s.mesh.triangle_count()).sum::<usize>(),
            sharing = ?config.shading.sharing,
            "built braid scene"
        );

        Ok(Self {
            strands: strand_meshes,
            shaders,
            sharing: config.shading.sharing,
            program: ShadingProgram::new(config.shading.style),
            descriptor: ShaderDescriptor::ribbon(config.shading.style),
            bindings,
        })
    }

    pub fn strands(&self) -> &[StrandMesh] {
        &self.strands
    }

    pub fn meshes(&self) -> impl Iterator<Item = &TubeMesh> + '_ {
        self.strands.iter().map(|strand| &strand.mesh)
    }

    pub fn sharing(&self) -> ShaderSharing {
        self.sharing
    }

    pub fn shader_states(&self) -> &[ShaderState] {
        &self.shaders
    }

    /// Material state driving `strand`.
    pub fn shader_state(&self, strand: usize) -> Option<&ShaderState> {
        let slot = self.strands.get(strand)?.shader;
        self.shaders.get(slot)
    }

    pub fn program(&self) -> &ShadingProgram {
        &self.program
    }

    pub fn descriptor(&self) -> &ShaderDescriptor {
        &self.descriptor
    }

    pub fn bindings(&self) -> &TransformBindings {
        &self.bindings
    }

    pub fn bindings_mut(&mut self) -> &mut TransformBindings {
        &mut self.bindings
    }

    pub fn camera(&self) -> &CameraState {
        self.bindings.camera()
    }

    pub fn group(&self) -> &GroupTransform {
        self.bindings.group()
    }

    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        self.bindings.resize_viewport(width, height)
    }

    /// Center of every strand's bounds, useful for framing the braid.
    pub fn center(&self) -> Vec3 {
        if self.strands.is_empty() {
            return Vec3::ZERO;
        }
        let sum: Vec3 = self.strands.iter().map(|s| s.mesh.bounds().center()).sum();
        sum / self.strands.len() as f32
    }

    pub(crate) fn push_time(&mut self, elapsed: f32) {
        for state in &mut self.shaders {
            state.set_elapsed(elapsed);
        }
    }

    /// Read-only snapshot for one render submission.
    pub fn frame_view<'a>(
        &'a self,
        frame_index: u64,
        elapsed: f32,
        assets: &'a AssetStore,
    ) -> FrameView<'a> {
        FrameView {
            frame_index,
            elapsed,
            scene: self,
            assets,
        }
    }
}

/// What a backend sees during one submission.
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    pub frame_index: u64,
    pub elapsed: f32,
    scene: &'a Scene,
    assets: &'a AssetStore,
}

impl<'a> FrameView<'a> {
    pub fn scene(&self) -> &'a Scene {
        self.scene
    }

    pub fn camera(&self) -> &'a CameraState {
        self.scene.camera()
    }

    pub fn group(&self) -> &'a GroupTransform {
        self.scene.group()
    }

    pub fn program(&self) -> &'a ShadingProgram {
        self.scene.program()
    }

    /// Strands paired with the material state and texture each one is drawn
    /// with.
    pub fn draws(&self) -> impl Iterator<Item = Draw<'a>> + 'a {
        let scene = self.scene;
        let assets = self.assets;
        scene.strands.iter().map(move |strand| {
            let state = &scene.shaders[strand.shader];
            Draw {
                strand,
                state,
                texture: assets.binding(state.texture()),
            }
        })
    }
}

/// One strand's draw call inside a [`FrameView`].
#[derive(Debug, Clone, Copy)]
pub struct Draw<'a> {
    pub strand: &'a StrandMesh,
    pub state: &'a ShaderState,
    pub texture: TextureBinding<'a>,
}
