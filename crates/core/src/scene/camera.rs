use glam::{EulerRot, Mat4, Quat, Vec3};

use crate::config::{CameraConfig, ViewportConfig};

/// Perspective camera looking at a fixed target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    position: Vec3,
    target: Vec3,
    fov: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl CameraState {
    pub fn new(position: Vec3, target: Vec3, fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target,
            fov,
            aspect,
            near,
            far,
        }
    }

    pub fn from_config(config: &CameraConfig, viewport: &ViewportConfig) -> Self {
        let mut camera = Self::new(
            config.position,
            config.target,
            config.fov_degrees.to_radians(),
            1.0,
            config.near,
            config.far,
        );
        camera.resize(viewport.width, viewport.height);
        camera
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Vertical field of view in radians.
    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub(crate) fn position_mut(&mut self) -> &mut Vec3 {
        &mut self.position
    }

    /// Recomputes the aspect ratio. Zero-area viewports leave it untouched and
    /// return `false`.
    pub(crate) fn resize(&mut self, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 {
            return false;
        }
        self.aspect = width as f32 / height as f32;
        true
    }

    pub fn view_matrix(&self) -> Mat4 {
        let forward = (self.target - self.position).normalize_or_zero();
        if forward == Vec3::ZERO {
            return Mat4::look_to_rh(self.position, Vec3::NEG_Z, Vec3::Y);
        }
        let up = if forward.cross(Vec3::Y).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        Mat4::look_to_rh(self.position, forward, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Rigid-plus-scale transform applied to the whole braid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTransform {
    position: Vec3,
    /// Euler angles in radians, applied in XYZ order.
    rotation: Vec3,
    scale: Vec3,
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl GroupTransform {
    pub fn new(position: Vec3, rotation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub(crate) fn position_mut(&mut self) -> &mut Vec3 {
        &mut self.position
    }

    pub(crate) fn rotation_mut(&mut self) -> &mut Vec3 {
        &mut self.rotation
    }

    pub(crate) fn scale_mut(&mut self) -> &mut Vec3 {
        &mut self.scale
    }

    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_follows_viewport() {
        let camera = CameraState::from_config(
            &CameraConfig::default(),
            &ViewportConfig {
                width: 1600,
                height: 800,
            },
        );
        assert_eq!(camera.aspect(), 2.0);
        assert!((camera.fov() - 75f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn zero_area_resize_keeps_aspect() {
        let mut camera = CameraState::from_config(&CameraConfig::default(), &ViewportConfig::default());
        let before = camera.aspect();
        assert!(!camera.resize(0, 720));
        assert!(!camera.resize(1280, 0));
        assert_eq!(camera.aspect().to_bits(), before.to_bits());
        assert!(camera.resize(100, 50));
        assert_eq!(camera.aspect(), 2.0);
    }

    #[test]
    fn view_matrix_is_finite_in_degenerate_poses() {
        let overhead = CameraState::new(Vec3::Y * 5.0, Vec3::ZERO, 1.0, 1.0, 0.1, 100.0);
        let collapsed = CameraState::new(Vec3::ONE, Vec3::ONE, 1.0, 1.0, 0.1, 100.0);
        for camera in [overhead, collapsed] {
            assert!(camera.view_matrix().is_finite());
            assert!(camera.view_projection().is_finite());
        }
    }

    #[test]
    fn camera_looks_at_target() {
        let camera = CameraState::new(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0, 1.0, 0.1, 100.0);
        let target_in_view = camera.view_matrix().transform_point3(Vec3::ZERO);
        assert!((target_in_view - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-5);
    }

    #[test]
    fn model_matrix_applies_scale_rotation_then_translation() {
        let group = GroupTransform::new(
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::splat(2.0),
        );
        let moved = group.model_matrix().transform_point3(Vec3::X);
        assert!((moved - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5);
    }
}
