//! Routing of live scalar inputs onto camera and group state.
//!
//! Every input addresses exactly one scalar through a [`ParameterTarget`].
//! Writes are clamped to the target's range and never touch geometry; the
//! renderer picks the new value up on its next frame.

use std::{f32::consts::PI, fmt, str::FromStr};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{
    scene::{CameraState, GroupTransform},
    BraidError, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    fn component(self, vector: &mut Vec3) -> &mut f32 {
        match self {
            Axis::X => &mut vector.x,
            Axis::Y => &mut vector.y,
            Axis::Z => &mut vector.z,
        }
    }

    fn read(self, vector: Vec3) -> f32 {
        match self {
            Axis::X => vector.x,
            Axis::Y => vector.y,
            Axis::Z => vector.z,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Position,
    Rotation,
    Scale,
}

impl TransformKind {
    pub const ALL: [TransformKind; 3] = [
        TransformKind::Position,
        TransformKind::Rotation,
        TransformKind::Scale,
    ];

    fn name(self) -> &'static str {
        match self {
            TransformKind::Position => "position",
            TransformKind::Rotation => "rotation",
            TransformKind::Scale => "scale",
        }
    }
}

/// Inclusive bounds of a live parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f32,
    pub max: f32,
}

impl ParameterRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// One addressable scalar of the camera or group transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParameterTarget {
    Camera(Axis),
    Group(TransformKind, Axis),
}

impl ParameterTarget {
    /// Every target, camera first.
    pub fn all() -> impl Iterator<Item = ParameterTarget> {
        let camera = Axis::ALL.into_iter().map(ParameterTarget::Camera);
        let group = TransformKind::ALL
            .into_iter()
            .flat_map(|kind| Axis::ALL.into_iter().map(move |axis| ParameterTarget::Group(kind, axis)));
        camera.chain(group)
    }

    pub fn range(self) -> ParameterRange {
        match self {
            ParameterTarget::Camera(Axis::X | Axis::Y) => ParameterRange::new(-10.0, 10.0),
            ParameterTarget::Camera(Axis::Z) => ParameterRange::new(2.0, 15.0),
            ParameterTarget::Group(TransformKind::Position, _) => ParameterRange::new(-5.0, 5.0),
            ParameterTarget::Group(TransformKind::Rotation, _) => ParameterRange::new(-PI, PI),
            ParameterTarget::Group(TransformKind::Scale, _) => ParameterRange::new(0.1, 3.0),
        }
    }
}

impl fmt::Display for ParameterTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterTarget::Camera(axis) => write!(f, "camera.{}", axis.name()),
            ParameterTarget::Group(kind, axis) => {
                write!(f, "group.{}.{}", kind.name(), axis.name())
            }
        }
    }
}

impl FromStr for ParameterTarget {
    type Err = BraidError;

    fn from_str(s: &str) -> Result<Self> {
        let unknown = || BraidError::UnknownParameter(s.to_string());
        let axis = |name: &str| match name {
            "x" => Some(Axis::X),
            "y" => Some(Axis::Y),
            "z" => Some(Axis::Z),
            _ => None,
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        match parts.as_slice() {
            ["camera", a] | ["camera", "position", a] => {
                axis(*a).map(ParameterTarget::Camera).ok_or_else(unknown)
            }
            ["group", kind, a] => {
                let kind = match *kind {
                    "position" => TransformKind::Position,
                    "rotation" => TransformKind::Rotation,
                    "scale" => TransformKind::Scale,
                    _ => return Err(unknown()),
                };
                axis(*a)
                    .map(|axis| ParameterTarget::Group(kind, axis))
                    .ok_or_else(unknown)
            }
            _ => Err(unknown()),
        }
    }
}

impl TryFrom<String> for ParameterTarget {
    type Error = BraidError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ParameterTarget> for String {
    fn from(value: ParameterTarget) -> Self {
        value.to_string()
    }
}

/// Concrete value routed to a camera or group parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    pub target: ParameterTarget,
    pub value: f32,
}

impl ParameterUpdate {
    pub fn new(target: ParameterTarget, value: f32) -> Self {
        Self { target, value }
    }
}

/// Parses `name=value`, e.g. `group.rotation.y=1.2`.
impl FromStr for ParameterUpdate {
    type Err = BraidError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| BraidError::msg(format!("expected `name=value`, got `{s}`")))?;
        let target = name.parse()?;
        let value = value
            .trim()
            .parse::<f32>()
            .map_err(|err| BraidError::msg(format!("invalid value for `{name}`: {err}")))?;
        Ok(Self { target, value })
    }
}

/// Sole writer of camera and group state.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformBindings {
    camera: CameraState,
    group: GroupTransform,
}

impl TransformBindings {
    pub fn new(camera: CameraState, group: GroupTransform) -> Self {
        Self { camera, group }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn group(&self) -> &GroupTransform {
        &self.group
    }

    /// Writes one camera position component. Returns the value actually
    /// stored, or `None` for non-finite input.
    pub fn set_camera_field(&mut self, axis: Axis, value: f32) -> Option<f32> {
        self.apply(ParameterUpdate::new(ParameterTarget::Camera(axis), value))
    }

    /// Writes one component of the group position, rotation or scale.
    pub fn set_group_field(&mut self, kind: TransformKind, axis: Axis, value: f32) -> Option<f32> {
        self.apply(ParameterUpdate::new(ParameterTarget::Group(kind, axis), value))
    }

    pub fn apply(&mut self, update: ParameterUpdate) -> Option<f32> {
        if !update.value.is_finite() {
            tracing::warn!(parameter = %update.target, value = update.value, "ignoring non-finite parameter");
            return None;
        }

        let range = update.target.range();
        let value = range.clamp(update.value);
        if value != update.value {
            tracing::debug!(parameter = %update.target, requested = update.value, value, "parameter clamped");
        }

        let slot = match update.target {
            ParameterTarget::Camera(axis) => axis.component(self.camera.position_mut()),
            ParameterTarget::Group(kind, axis) => {
                let vector = match kind {
                    TransformKind::Position => self.group.position_mut(),
                    TransformKind::Rotation => self.group.rotation_mut(),
                    TransformKind::Scale => self.group.scale_mut(),
                };
                axis.component(vector)
            }
        };
        *slot = value;
        Some(value)
    }

    pub fn get(&self, target: ParameterTarget) -> f32 {
        match target {
            ParameterTarget::Camera(axis) => axis.read(self.camera.position()),
            ParameterTarget::Group(TransformKind::Position, axis) => axis.read(self.group.position()),
            ParameterTarget::Group(TransformKind::Rotation, axis) => axis.read(self.group.rotation()),
            ParameterTarget::Group(TransformKind::Scale, axis) => axis.read(self.group.scale()),
        }
    }

    /// Viewport change: only the aspect ratio moves.
    pub fn resize_viewport(&mut self, width: u32, height: u32) -> bool {
        let resized = self.camera.resize(width, height);
        if !resized {
            tracing::debug!(width, height, "ignoring zero-area viewport");
        }
        resized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, ViewportConfig};

    fn bindings() -> TransformBindings {
        TransformBindings::new(
            CameraState::from_config(&CameraConfig::default(), &ViewportConfig::default()),
            GroupTransform::default(),
        )
    }

    fn snapshot(bindings: &TransformBindings) -> Vec<(ParameterTarget, u32)> {
        ParameterTarget::all()
            .map(|target| (target, bindings.get(target).to_bits()))
            .collect()
    }

    #[test]
    fn writes_only_the_addressed_field() {
        for target in ParameterTarget::all() {
            let mut bindings = bindings();
            let before = snapshot(&bindings);
            let range = target.range();
            let value = (range.min + range.max) * 0.5 + 0.125;
            assert_eq!(bindings.apply(ParameterUpdate::new(target, value)), Some(value));

            for ((name, old), (_, new)) in before.iter().zip(snapshot(&bindings)) {
                if *name == target {
                    assert_eq!(f32::from_bits(new), value);
                } else {
                    assert_eq!(*old, new, "{name} changed while writing {target}");
                }
            }
        }
    }

    #[test]
    fn setters_clamp_out_of_range_values() {
        let mut bindings = bindings();
        assert_eq!(bindings.set_camera_field(Axis::Z, 100.0), Some(15.0));
        assert_eq!(bindings.set_camera_field(Axis::Z, -100.0), Some(2.0));
        assert_eq!(
            bindings.set_group_field(TransformKind::Scale, Axis::X, 0.0),
            Some(0.1)
        );
        assert_eq!(
            bindings.set_group_field(TransformKind::Rotation, Axis::Y, 10.0),
            Some(PI)
        );
        assert_eq!(bindings.group().scale().x, 0.1);
        assert_eq!(bindings.group().rotation().y, PI);
    }

    #[test]
    fn ignores_non_finite_values() {
        let mut bindings = bindings();
        let before = bindings.clone();
        assert_eq!(bindings.set_camera_field(Axis::X, f32::NAN), None);
        assert_eq!(
            bindings.set_group_field(TransformKind::Position, Axis::Y, f32::INFINITY),
            None
        );
        assert_eq!(bindings, before);
    }

    #[test]
    fn parses_external_names() {
        assert_eq!(
            "camera.x".parse::<ParameterTarget>().unwrap(),
            ParameterTarget::Camera(Axis::X)
        );
        assert_eq!(
            "group.rotation.y".parse::<ParameterTarget>().unwrap(),
            ParameterTarget::Group(TransformKind::Rotation, Axis::Y)
        );
        assert!(matches!(
            "group.skew.x".parse::<ParameterTarget>(),
            Err(BraidError::UnknownParameter(_))
        ));
        for target in ParameterTarget::all() {
            assert_eq!(target.to_string().parse::<ParameterTarget>().unwrap(), target);
        }
        assert_eq!(ParameterTarget::all().count(), 12);
    }

    #[test]
    fn parses_assignments() {
        let update: ParameterUpdate = "group.scale.z = 2.5".parse().unwrap();
        assert_eq!(update.target, ParameterTarget::Group(TransformKind::Scale, Axis::Z));
        assert_eq!(update.value, 2.5);
        assert!("camera.x".parse::<ParameterUpdate>().is_err());
        assert!("camera.x=abc".parse::<ParameterUpdate>().is_err());
    }

    #[test]
    fn updates_serialise_with_external_names() {
        let update = ParameterUpdate::new(ParameterTarget::Camera(Axis::Y), 1.5);
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"target":"camera.y","value":1.5}"#);
        let back: ParameterUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(back, update);
    }

    #[test]
    fn zero_area_resize_is_skipped() {
        let mut bindings = bindings();
        let aspect = bindings.camera().aspect();
        assert!(!bindings.resize_viewport(0, 600));
        assert!(!bindings.resize_viewport(800, 0));
        assert_eq!(bindings.camera().aspect().to_bits(), aspect.to_bits());
    }
}
