use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    curve::{BraidExtents, DEFAULT_SAMPLES, MIN_SAMPLES},
    mesh::TubeParams,
    shading::{ShaderSharing, ShadingStyle},
    BraidError, Result,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub braid: BraidConfig,
    pub tube: TubeParams,
    pub shading: ShadingConfig,
    pub camera: CameraConfig,
    pub viewport: ViewportConfig,
    pub animation: AnimationConfig,
}

impl AppConfig {
    /// Settings closest to the hand-tuned brush-stroke look: jittered strand
    /// offsets, a thicker tube and twice the length resolution.
    pub fn brush_stroke() -> Self {
        Self {
            braid: BraidConfig::brush_stroke(),
            tube: TubeParams {
                length_segments: 600,
                radius: 0.24,
                ..TubeParams::default()
            },
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rejects values the engine cannot build a scene from.
    pub fn validate(&self) -> Result<()> {
        if self.braid.strand_count == 0 {
            return Err(BraidError::invalid_config("braid needs at least one strand"));
        }
        if self.braid.sample_count < MIN_SAMPLES {
            return Err(BraidError::invalid_config(format!(
                "sample count must be at least {MIN_SAMPLES}, got {}",
                self.braid.sample_count
            )));
        }
        if !(self.braid.radius.is_finite() && self.braid.radius >= 0.0) {
            return Err(BraidError::invalid_config("braid radius must be a non-negative number"));
        }
        if self.tube.length_segments == 0 || self.tube.radial_segments < 3 {
            return Err(BraidError::invalid_config(
                "tube needs at least one length segment and three radial segments",
            ));
        }
        if !(self.tube.radius.is_finite() && self.tube.radius > 0.0) {
            return Err(BraidError::invalid_config("tube radius must be positive"));
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near) {
            return Err(BraidError::invalid_config("camera planes must satisfy 0 < near < far"));
        }
        if self.animation.frames_per_second == 0 {
            return Err(BraidError::invalid_config("frames per second must be positive"));
        }
        Ok(())
    }
}

/// Shape of the braid before extrusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BraidConfig {
    pub radius: f32,
    pub strand_count: usize,
    pub sample_count: usize,
    pub extents: BraidExtents,
    /// Per-strand offsets, by strand index.
    pub strand_offsets: Vec<Vec3>,
}

impl Default for BraidConfig {
    fn default() -> Self {
        Self {
            radius: 0.2,
            strand_count: 3,
            sample_count: DEFAULT_SAMPLES,
            extents: BraidExtents::default(),
            strand_offsets: Vec::new(),
        }
    }
}

impl BraidConfig {
    pub fn brush_stroke() -> Self {
        Self {
            strand_offsets: vec![
                Vec3::ZERO,
                Vec3::new(0.04, 0.0, -0.04),
                Vec3::new(-0.04, 0.0, 0.04),
            ],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadingConfig {
    pub sharing: ShaderSharing,
    /// Seconds added to strand `i`'s clock, times `i`, when states are not
    /// shared.
    pub per_strand_time_offset: f32,
    pub style: ShadingStyle,
    pub texture: Option<String>,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            sharing: ShaderSharing::Shared,
            per_strand_time_offset: 0.75,
            style: ShadingStyle::default(),
            texture: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(2.6, -1.7, 3.2),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub frames_per_second: u32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            frames_per_second: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        AppConfig::default().validate().unwrap();
        AppConfig::brush_stroke().validate().unwrap();
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "braid": { "strand_count": 4 }, "shading": { "sharing": "per_strand" } }"#)
                .unwrap();
        assert_eq!(config.braid.strand_count, 4);
        assert_eq!(config.braid.sample_count, DEFAULT_SAMPLES);
        assert_eq!(config.shading.sharing, ShaderSharing::PerStrand);
        assert_eq!(config.tube, TubeParams::default());
    }

    #[test]
    fn rejects_unusable_values() {
        let mut config = AppConfig::default();
        config.braid.sample_count = 2;
        assert!(matches!(config.validate(), Err(BraidError::InvalidConfig(_))));

        let mut config = AppConfig::default();
        config.camera.far = 0.05;
        assert!(config.validate().is_err());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("braid.json");
        let config = AppConfig::brush_stroke();
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
