//! Core library for the braided ribbon engine.
//!
//! A braid is a handful of helical strands, each sampled into a Catmull-Rom
//! curve and extruded into a tube mesh. Meshes are built once; afterwards only
//! shader time, camera and group transform change from frame to frame. Each
//! module owns one stage of that pipeline and the [`view`] module wires them
//! into a frame loop.

pub mod assets;
pub mod config;
pub mod curve;
pub mod error;
pub mod mapping;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod shading;
pub mod timeline;
pub mod view;

pub use assets::{AssetStore, Texture, TextureBinding, TextureId, TextureStatus};
pub use config::AppConfig;
pub use curve::{braid_strands, generate_strand_curve, Curve, Strand};
pub use error::{BraidError, Result};
pub use mapping::{Axis, ParameterTarget, ParameterUpdate, TransformBindings, TransformKind};
pub use mesh::{extrude_tube, ObjWriter, TubeMesh, TubeParams, TubeVertex};
pub use render::{HeadlessBackend, RenderBackend};
pub use scene::{CameraState, FrameView, GroupTransform, Scene};
pub use shading::{ShaderDescriptor, ShaderSharing, ShaderState, ShadingProgram, ShadingStyle};
pub use timeline::{AnimationDriver, CancellationToken, FrameScheduler, PlaybackClock};
pub use view::{RunSummary, View, ViewEvent, ViewHandle};
