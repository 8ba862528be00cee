use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

pub const SHAPE_SPHERE: u32 = 0;
pub const SHAPE_BOX: u32 = 1;

/// Bounding volume centered on its owner's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Volume {
    Sphere { radius: f32 },
    /// Oriented box; `extents` are full edge lengths along the rotated axes.
    Box { rotation: Mat3, extents: Vec3 },
}

impl Default for Volume {
    fn default() -> Self {
        Volume::Sphere { radius: 0.0 }
    }
}

impl Volume {
    /// Distance of `point` from `center` scaled so the boundary is 1.0.
    ///
    /// Boxes use the largest per-axis ratio, so the result is 1.0 anywhere
    /// on the box surface. Degenerate axes count as infinitely far unless
    /// the point lies exactly on them.
    pub fn normalized_distance(&self, center: Vec3, point: Vec3) -> f32 {
        let offset = point - center;
        match *self {
            Volume::Sphere { radius } => ratio(offset.length(), radius),
            Volume::Box { rotation, extents } => {
                let local = rotation.transpose() * offset;
                let half = extents * 0.5;
                ratio(local.x.abs(), half.x)
                    .max(ratio(local.y.abs(), half.y))
                    .max(ratio(local.z.abs(), half.z))
            }
        }
    }

    pub fn contains(&self, center: Vec3, point: Vec3) -> bool {
        self.normalized_distance(center, point) <= 1.0
    }
}

fn ratio(distance: f32, limit: f32) -> f32 {
    if limit > 0.0 {
        distance / limit
    } else if distance == 0.0 {
        0.0
    } else {
        f32::INFINITY
    }
}

/// How a region's strength varies with the occupant's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Falloff {
    #[default]
    Uniform,
    /// Zero at the center, full strength at the boundary.
    GrowsToBoundary,
    /// Full strength at the center, zero at the boundary.
    GrowsToCenter,
}

impl Falloff {
    /// Strength multiplier for a normalized distance in `[0, 1]`.
    pub fn scale(self, normalized_distance: f32) -> f32 {
        let d = normalized_distance.clamp(0.0, 1.0);
        match self {
            Falloff::Uniform => 1.0,
            Falloff::GrowsToBoundary => d,
            Falloff::GrowsToCenter => 1.0 - d,
        }
    }
}
