use glam::{Quat, Vec3};

use crate::curve::Curve;

const PARALLEL_EPSILON: f32 = 1e-6;

/// Orientation of one cross-section along a tube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub tangent: Vec3,
    pub normal: Vec3,
    pub binormal: Vec3,
}

/// Computes `segments + 1` twist-free frames at evenly spaced `t`.
///
/// The first normal is built against the world axis the tangent is least
/// aligned with. Each following normal is the previous one rotated by the
/// angle between consecutive tangents. For closed paths the twist left
/// between the first and last frame is spread evenly along the tube.
pub(crate) fn parallel_transport_frames(curve: &Curve, segments: usize, closed: bool) -> Vec<Frame> {
    let tangents = sample_tangents(curve, segments);

    let mut frames: Vec<Frame> = Vec::with_capacity(tangents.len());
    let first = tangents[0];
    let normal = seed_normal(first);
    frames.push(Frame {
        tangent: first,
        normal,
        binormal: first.cross(normal),
    });

    for i in 1..tangents.len() {
        let previous = frames[i - 1];
        let tangent = tangents[i];
        let mut normal = previous.normal;

        let axis = previous.tangent.cross(tangent);
        if axis.length() > PARALLEL_EPSILON {
            let theta = previous.tangent.dot(tangent).clamp(-1.0, 1.0).acos();
            normal = Quat::from_axis_angle(axis.normalize(), theta) * normal;
        }

        let normal = orthogonalize(normal, tangent);
        frames.push(Frame {
            tangent,
            normal,
            binormal: tangent.cross(normal),
        });
    }

    if closed && segments > 0 {
        distribute_twist(&mut frames, segments);
    }

    frames
}

fn sample_tangents(curve: &Curve, segments: usize) -> Vec<Vec3> {
    let mut tangents = Vec::with_capacity(segments + 1);
    let mut last = Vec3::Y;
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let tangent = curve.tangent_at(t);
        // zero-length spans keep the previous direction
        let tangent = if tangent == Vec3::ZERO { last } else { tangent };
        tangents.push(tangent);
        last = tangent;
    }
    tangents
}

fn seed_normal(tangent: Vec3) -> Vec3 {
    let abs = tangent.abs();
    let mut min = f32::MAX;
    let mut axis = Vec3::X;
    if abs.x <= min {
        min = abs.x;
        axis = Vec3::X;
    }
    if abs.y <= min {
        min = abs.y;
        axis = Vec3::Y;
    }
    if abs.z <= min {
        axis = Vec3::Z;
    }

    let side = tangent.cross(axis).normalize();
    tangent.cross(side)
}

/// Removes the tangent component of `normal`, substituting a fresh axis when
/// the two have become parallel.
fn orthogonalize(normal: Vec3, tangent: Vec3) -> Vec3 {
    let projected = normal - tangent * tangent.dot(normal);
    if projected.length() > PARALLEL_EPSILON {
        projected.normalize()
    } else {
        seed_normal(tangent)
    }
}

fn distribute_twist(frames: &mut [Frame], segments: usize) {
    let first = frames[0].normal;
    let last = frames[segments].normal;
    let mut theta = first.dot(last).clamp(-1.0, 1.0).acos() / segments as f32;
    if frames[0].tangent.dot(first.cross(last)) > 0.0 {
        theta = -theta;
    }

    for (i, frame) in frames.iter_mut().enumerate().skip(1) {
        let rotation = Quat::from_axis_angle(frame.tangent, theta * i as f32);
        frame.normal = rotation * frame.normal;
        frame.binormal = frame.tangent.cross(frame.normal);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::generate_strand_curve;

    fn assert_orthonormal(frame: &Frame) {
        assert!((frame.tangent.length() - 1.0).abs() < 1e-4);
        assert!((frame.normal.length() - 1.0).abs() < 1e-4);
        assert!((frame.binormal.length() - 1.0).abs() < 1e-4);
        assert!(frame.tangent.dot(frame.normal).abs() < 1e-3);
        assert!(frame.tangent.dot(frame.binormal).abs() < 1e-3);
    }

    #[test]
    fn frames_stay_orthonormal_along_a_helix() {
        let curve = generate_strand_curve(0.2, Vec3::ZERO, 0.0, 300);
        let frames = parallel_transport_frames(&curve, 120, false);
        assert_eq!(frames.len(), 121);
        frames.iter().for_each(assert_orthonormal);
    }

    #[test]
    fn straight_line_keeps_a_constant_frame() {
        let curve = Curve::new(vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0, Vec3::X * 3.0]);
        let frames = parallel_transport_frames(&curve, 8, false);
        for frame in &frames {
            assert!((frame.normal - frames[0].normal).length() < 1e-5);
        }
    }

    #[test]
    fn degenerate_curve_gets_default_frames() {
        let curve = Curve::new(vec![Vec3::ONE; 4]);
        let frames = parallel_transport_frames(&curve, 4, false);
        for frame in &frames {
            assert_eq!(frame.tangent, Vec3::Y);
            assert_orthonormal(frame);
        }
    }
}
