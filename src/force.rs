use glam::Vec3;
use serde::Serialize;

use crate::level::{PushRegion, PushRegionFlags};
use crate::volume::Falloff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ForceMode {
    /// Adds `direction * strength` per second to the occupant's velocity.
    AddVelocity,
    /// Replaces the occupant's velocity outright.
    SetVelocity,
    /// Holds the vertical velocity at the region's strength.
    Climb,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForceRegion {
    index: usize,
    id: i32,
    mode: ForceMode,
    falloff: Falloff,
    radial: bool,
    affects_occupant: bool,
}

impl ForceRegion {
    pub fn new(index: usize, record: &PushRegion) -> Self {
        let flags = record.flags;
        let mode = if flags.contains(PushRegionFlags::JUMP_PAD) {
            ForceMode::SetVelocity
        } else if flags.contains(PushRegionFlags::CLIMB) {
            ForceMode::Climb
        } else {
            ForceMode::AddVelocity
        };
        let falloff = if flags.contains(PushRegionFlags::GROWS_TOWARDS_CENTER) {
            Falloff::GrowsToCenter
        } else if flags.contains(PushRegionFlags::GROWS_TOWARDS_BOUNDARY) {
            Falloff::GrowsToBoundary
        } else {
            Falloff::Uniform
        };
        Self {
            index,
            id: record.id,
            mode,
            falloff,
            radial: flags.contains(PushRegionFlags::RADIAL),
            affects_occupant: !flags.contains(PushRegionFlags::DOESNT_AFFECT_PLAYER),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn mode(&self) -> ForceMode {
        self.mode
    }

    pub fn falloff(&self) -> Falloff {
        self.falloff
    }

    /// Velocity after one tick inside the region, or `None` when the
    /// occupant is outside or unaffected.
    pub fn apply(&self, record: &PushRegion, position: Vec3, velocity: Vec3, dt: f32) -> Option<Vec3> {
        if !self.affects_occupant {
            return None;
        }
        let center = record.transform.position;
        let distance = record.volume.normalized_distance(center, position);
        if distance > 1.0 {
            return None;
        }
        let magnitude = record.strength * self.falloff.scale(distance);
        let direction = if self.radial {
            (position - center).normalize_or_zero()
        } else {
            record.transform.rotation_or_identity().z_axis
        };
        Some(match self.mode {
            ForceMode::AddVelocity => velocity + direction * magnitude * dt,
            ForceMode::SetVelocity => direction * magnitude,
            ForceMode::Climb => Vec3::new(velocity.x, magnitude, velocity.z),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Transform;
    use crate::volume::Volume;
    use glam::Mat3;

    fn region(flags: PushRegionFlags) -> PushRegion {
        PushRegion {
            id: 1,
            transform: Transform::new(Vec3::ZERO, Mat3::IDENTITY),
            volume: Volume::Sphere { radius: 4.0 },
            strength: 10.0,
            flags,
            ..PushRegion::default()
        }
    }

    #[test]
    fn mode_and_falloff_come_from_flags() {
        let pad = ForceRegion::new(0, &region(PushRegionFlags::JUMP_PAD | PushRegionFlags::CLIMB));
        assert_eq!(pad.mode(), ForceMode::SetVelocity);
        let climb = ForceRegion::new(0, &region(PushRegionFlags::CLIMB));
        assert_eq!(climb.mode(), ForceMode::Climb);
        let push = ForceRegion::new(0, &region(PushRegionFlags::GROWS_TOWARDS_CENTER));
        assert_eq!(push.mode(), ForceMode::AddVelocity);
        assert_eq!(push.falloff(), Falloff::GrowsToCenter);
    }

    #[test]
    fn add_velocity_pushes_along_forward_axis() {
        let record = region(PushRegionFlags::empty());
        let force = ForceRegion::new(0, &record);
        let velocity = force
            .apply(&record, Vec3::new(1.0, 0.0, 0.0), Vec3::X, 0.5)
            .unwrap();
        assert_eq!(velocity, Vec3::new(1.0, 0.0, 5.0));
        assert!(force.apply(&record, Vec3::new(5.0, 0.0, 0.0), Vec3::X, 0.5).is_none());
    }

    #[test]
    fn radial_jump_pad_with_boundary_falloff() {
        let record = region(
            PushRegionFlags::JUMP_PAD | PushRegionFlags::RADIAL | PushRegionFlags::GROWS_TOWARDS_BOUNDARY,
        );
        let force = ForceRegion::new(0, &record);
        let velocity = force
            .apply(&record, Vec3::new(0.0, 2.0, 0.0), Vec3::new(3.0, -9.0, 0.0), 0.1)
            .unwrap();
        assert!((velocity - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn climb_replaces_vertical_velocity_only() {
        let record = region(PushRegionFlags::CLIMB);
        let force = ForceRegion::new(0, &record);
        let velocity = force
            .apply(&record, Vec3::ZERO, Vec3::new(2.0, -4.0, 1.0), 0.1)
            .unwrap();
        assert_eq!(velocity, Vec3::new(2.0, 10.0, 1.0));
    }

    #[test]
    fn player_exempt_regions_do_nothing() {
        let record = region(PushRegionFlags::DOESNT_AFFECT_PLAYER);
        let force = ForceRegion::new(0, &record);
        assert!(force.apply(&record, Vec3::ZERO, Vec3::ZERO, 0.1).is_none());
    }
}
