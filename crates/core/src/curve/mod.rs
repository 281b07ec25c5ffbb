//! Parametric helix paths for the strands of a braid.
//!
//! Each strand is a helix that winds three full turns while drifting sideways
//! and dropping. Strands of one braid differ only in their phase, so at equal
//! `t` they sit at the same height and drift but at different angles around the
//! shared drift axis.

use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of full turns a strand makes over its length.
const TURNS: f32 = 3.0;

/// Smallest sample count for which the spline has enough neighbours.
pub const MIN_SAMPLES: usize = 4;

/// Default number of samples taken along a strand.
pub const DEFAULT_SAMPLES: usize = 300;

/// Fixed extents shared by every strand of a braid. Offsets shift strands
/// sideways only; every strand drops by the same amount.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BraidExtents {
    /// Sideways drift applied to both x and z over the full length.
    pub lateral_drift: f32,
    /// Total drop along -y over the full length.
    pub drop: f32,
}

impl Default for BraidExtents {
    fn default() -> Self {
        Self {
            lateral_drift: 5.0,
            drop: 10.0,
        }
    }
}

/// One helical component of a braid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Strand {
    pub radius: f32,
    pub offset: Vec3,
    pub phase: f32,
}

impl Strand {
    pub fn new(radius: f32, offset: Vec3, phase: f32) -> Self {
        Self {
            radius,
            offset,
            phase,
        }
    }

    /// Samples this strand with the default extents.
    pub fn curve(&self, sample_count: usize) -> Curve {
        generate_strand_curve(self.radius, self.offset, self.phase, sample_count)
    }

    pub fn curve_with_extents(&self, sample_count: usize, extents: BraidExtents) -> Curve {
        sample_helix(self, sample_count, extents)
    }
}

/// Builds `count` strands spaced evenly in phase (0, 2π/3, 4π/3 for three).
///
/// Offsets are assigned by index; strands without an entry get no offset.
pub fn braid_strands(radius: f32, offsets: &[Vec3], count: usize) -> Vec<Strand> {
    (0..count)
        .map(|index| {
            let phase = index as f32 * TAU / count as f32;
            let offset = offsets.get(index).copied().unwrap_or(Vec3::ZERO);
            Strand::new(radius, offset, phase)
        })
        .collect()
}

/// Samples a strand helix with the default [`BraidExtents`].
///
/// Sample counts below [`MIN_SAMPLES`] are raised to it.
pub fn generate_strand_curve(radius: f32, offset: Vec3, phase: f32, sample_count: usize) -> Curve {
    sample_helix(
        &Strand::new(radius, offset, phase),
        sample_count,
        BraidExtents::default(),
    )
}

fn sample_helix(strand: &Strand, sample_count: usize, extents: BraidExtents) -> Curve {
    let sample_count = sample_count.max(MIN_SAMPLES);
    let last = (sample_count - 1) as f32;

    let points = (0..sample_count)
        .map(|i| {
            let t = i as f32 / last;
            let angle = t * TURNS * TAU + strand.phase;
            Vec3::new(
                angle.sin() * strand.radius + strand.offset.x + t * extents.lateral_drift,
                -t * extents.drop,
                angle.cos() * strand.radius + strand.offset.z + t * extents.lateral_drift,
            )
        })
        .collect();

    Curve::new(points)
}

/// Sampled path interpolated with a uniform Catmull-Rom spline.
///
/// The spline passes through every sample; `t = 0` is the first sample and
/// `t = 1` the last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    points: Vec<Vec3>,
}

impl Curve {
    /// Wraps a list of samples. Missing neighbours are padded by repeating the
    /// last sample so that the spline is always defined.
    pub fn new(mut points: Vec<Vec3>) -> Self {
        let pad = points.last().copied().unwrap_or(Vec3::ZERO);
        while points.len() < 2 {
            points.push(pad);
        }
        Self { points }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Evaluates the spline at `t ∈ [0, 1]`; values outside are clamped.
    pub fn point_at(&self, t: f32) -> Vec3 {
        let (index, weight) = self.locate(t);
        let [p0, p1, p2, p3] = self.neighbours(index);
        catmull_rom(p0, p1, p2, p3, weight)
    }

    /// Unit tangent at `t`, or [`Vec3::ZERO`] where the spline does not move.
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        let (index, weight) = self.locate(t);
        let [p0, p1, p2, p3] = self.neighbours(index);
        catmull_rom_derivative(p0, p1, p2, p3, weight).normalize_or_zero()
    }

    fn locate(&self, t: f32) -> (usize, f32) {
        let spans = self.points.len() - 1;
        let p = t.clamp(0.0, 1.0) * spans as f32;
        let index = (p.floor() as usize).min(spans - 1);
        (index, p - index as f32)
    }

    fn neighbours(&self, index: usize) -> [Vec3; 4] {
        let points = &self.points;
        let p1 = points[index];
        let p2 = points[index + 1];
        let p0 = if index > 0 {
            points[index - 1]
        } else {
            2.0 * p1 - p2
        };
        let p3 = if index + 2 < points.len() {
            points[index + 2]
        } else {
            2.0 * p2 - p1
        };
        [p0, p1, p2, p3]
    }
}

fn catmull_rom(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}

fn catmull_rom_derivative(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let t2 = t * t;
    0.5 * ((p2 - p0)
        + 2.0 * (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t
        + 3.0 * (3.0 * p1 - p0 - 3.0 * p2 + p3) * t2)
}
