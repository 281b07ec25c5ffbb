//! Animated ribbon material.
//!
//! The same two stages exist twice: as WGSL for GPU backends (see
//! [`ShaderDescriptor`]) and as a CPU evaluation in [`ShadingProgram`] used by
//! headless backends and tests. Both read only the per-frame uniforms.

use glam::{Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::assets::{TextureBinding, TextureId};

/// Ribbon vertex stage source.
pub const RIBBON_VERTEX: &str = include_str!("../../shaders/ribbon_vertex.wgsl");

/// Ribbon fragment stage source.
pub const RIBBON_FRAGMENT: &str = include_str!("../../shaders/ribbon_fragment.wgsl");

const DISPLACE_FREQUENCY: f32 = 200.0;
const DISPLACE_SPEED: f32 = 2.0;
const DISPLACE_AMPLITUDE: f32 = 0.04;

const STRIPE_FREQUENCY: f32 = 60.0;
const STRIPE_SPEED: f32 = 0.5;
const STRIPE_INTENSITY: f32 = 0.1;

const GRADIENT_FREQUENCY: f32 = 3.0;
const GRADIENT_SPEED: f32 = 0.2;

const HIGHLIGHT_FREQUENCY: f32 = 12.0;
const HIGHLIGHT_SPEED: f32 = 1.5;
const HIGHLIGHT_SHARPNESS: i32 = 8;
const HIGHLIGHT_INTENSITY: f32 = 0.15;

/// How strands map onto shader states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderSharing {
    /// One state for the whole braid; strands animate in lock-step.
    #[default]
    Shared,
    /// One state per strand, each shifted in time by its index.
    PerStrand,
}

/// Uniform block of one material instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderState {
    time: f32,
    time_offset: f32,
    texture: Option<TextureId>,
}

impl ShaderState {
    pub fn new(time_offset: f32, texture: Option<TextureId>) -> Self {
        Self {
            time: time_offset.max(0.0),
            time_offset,
            texture,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn time_offset(&self) -> f32 {
        self.time_offset
    }

    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Only the animation driver advances time.
    pub(crate) fn set_elapsed(&mut self, elapsed: f32) {
        self.time = (elapsed + self.time_offset).max(0.0);
    }
}

/// Colours and blending constants of the ribbon material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingStyle {
    /// Pink end of the gradient.
    pub accent_a: Vec3,
    /// Peach end of the gradient.
    pub accent_b: Vec3,
    /// Drawn in place of a texture that is not available.
    pub fallback: Vec3,
    /// Colour opaque strands fade into near their UV edges.
    pub fade_color: Vec3,
    pub fade_margin: f32,
    pub opacity: f32,
    pub translucent: bool,
}

impl Default for ShadingStyle {
    fn default() -> Self {
        Self {
            accent_a: Vec3::new(1.0, 0.411, 0.706),
            accent_b: Vec3::new(1.0, 0.855, 0.725),
            fallback: Vec3::new(0.92, 0.62, 0.72),
            fade_color: Vec3::ONE,
            fade_margin: 0.1,
            opacity: 0.9,
            translucent: false,
        }
    }
}

/// Vertex stage result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub position: Vec3,
    pub uv: Vec2,
}

/// CPU evaluation of the ribbon material.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ShadingProgram {
    style: ShadingStyle,
}

impl ShadingProgram {
    pub fn new(style: ShadingStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &ShadingStyle {
        &self.style
    }

    /// Ripples the surface along z as a function of the length coordinate.
    pub fn vertex(&self, position: Vec3, uv: Vec2, time: f32) -> VertexOutput {
        let mut position = position;
        position.z +=
            (uv.y * DISPLACE_FREQUENCY + time * DISPLACE_SPEED).sin() * DISPLACE_AMPLITUDE;
        VertexOutput { position, uv }
    }

    /// Colour of one pixel as RGBA, every channel in `[0, 1]`.
    pub fn pixel(&self, uv: Vec2, time: f32, texture: TextureBinding<'_>) -> Vec4 {
        let style = &self.style;
        let stripe = smoothstep(0.4, 0.6, fract(uv.y * STRIPE_FREQUENCY + time * STRIPE_SPEED));

        let base = match texture {
            TextureBinding::Unbound => {
                let mix = (uv.y * GRADIENT_FREQUENCY + time * GRADIENT_SPEED).sin() * 0.5 + 0.5;
                style.accent_a.lerp(style.accent_b, mix)
            }
            TextureBinding::Ready(texture) => texture.sample(uv).truncate(),
            TextureBinding::Unavailable => style.fallback,
        };

        let highlight = ((uv.y * HIGHLIGHT_FREQUENCY - time * HIGHLIGHT_SPEED).sin() * 0.5 + 0.5)
            .powi(HIGHLIGHT_SHARPNESS)
            * HIGHLIGHT_INTENSITY;
        let mut color = base + Vec3::splat(stripe * STRIPE_INTENSITY + highlight);

        let fade = edge_fade(uv.x, style.fade_margin) * edge_fade(uv.y, style.fade_margin);
        let alpha = if style.translucent {
            fade * style.opacity
        } else {
            color = style.fade_color.lerp(color, fade);
            1.0
        };

        Vec4::new(
            saturate(color.x),
            saturate(color.y),
            saturate(color.z),
            saturate(alpha),
        )
    }
}

/// Uniform slot exposed by a shading program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Texture2d,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformSlot {
    /// Binding path in the WGSL sources, e.g. `ribbon.time`.
    pub name: &'static str,
    pub kind: UniformKind,
}

/// Everything a GPU backend needs to build the ribbon pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderDescriptor {
    pub label: &'static str,
    pub vertex_source: &'static str,
    pub vertex_entry: &'static str,
    pub fragment_source: &'static str,
    pub fragment_entry: &'static str,
    pub uniforms: Vec<UniformSlot>,
    pub style: ShadingStyle,
}

impl ShaderDescriptor {
    pub fn ribbon(style: ShadingStyle) -> Self {
        Self {
            label: "ribbon",
            vertex_source: RIBBON_VERTEX,
            vertex_entry: "vs_main",
            fragment_source: RIBBON_FRAGMENT,
            fragment_entry: "fs_main",
            uniforms: vec![
                UniformSlot {
                    name: "ribbon.time",
                    kind: UniformKind::Float,
                },
                UniformSlot {
                    name: "u_texture",
                    kind: UniformKind::Texture2d,
                },
            ],
            style,
        }
    }
}

fn edge_fade(d: f32, margin: f32) -> f32 {
    if margin <= 0.0 {
        return 1.0;
    }
    smoothstep(0.0, margin, d) * smoothstep(0.0, margin, 1.0 - d)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn saturate(x: f32) -> f32 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}
