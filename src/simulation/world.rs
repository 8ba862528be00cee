use std::collections::{HashMap, HashSet};

use glam::Mat3;

use crate::ids::Binding;
use crate::level::{LevelData, LightFlags, Transform};
use crate::mover::Motion;

/// Mutable world facts the event graph reads and writes.
///
/// Objects are never deleted from [`LevelData`]; removal and enable state
/// live here, keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    gravity: f32,
    goals: HashMap<String, i32>,
    removed: HashSet<i32>,
    enabled: HashMap<i32, bool>,
    poses: HashMap<i32, Transform>,
}

impl WorldState {
    /// Creates the initial state, switching off emitters and lights that
    /// start disabled.
    pub fn new(level: &LevelData, gravity: f32) -> Self {
        let mut world = Self {
            gravity,
            ..Self::default()
        };
        for emitter in &level.particle_emitters {
            world.set_enabled(emitter.info.id, emitter.initially_on);
        }
        for emitter in &level.bolt_emitters {
            world.set_enabled(emitter.info.id, emitter.initially_on);
        }
        for light in &level.lights {
            world.set_enabled(light.info.id, light.flags.contains(LightFlags::INITIALLY_ON));
        }
        world
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: f32) {
        self.gravity = gravity;
    }

    /// Current value of a named goal; unknown goals read as zero.
    pub fn goal(&self, name: &str) -> i32 {
        self.goals
            .get(&name.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }

    pub fn set_goal(&mut self, name: &str, value: i32) {
        self.goals.insert(name.to_ascii_lowercase(), value);
    }

    pub fn increment_goal(&mut self, name: &str) -> i32 {
        let value = self.goals.entry(name.to_ascii_lowercase()).or_insert(0);
        *value += 1;
        *value
    }

    pub fn is_removed(&self, id: i32) -> bool {
        self.removed.contains(&id)
    }

    pub fn remove(&mut self, id: i32) -> bool {
        self.removed.insert(id)
    }

    /// Objects are enabled unless something switched them off.
    pub fn is_enabled(&self, id: i32) -> bool {
        self.enabled.get(&id).copied().unwrap_or(true)
    }

    pub fn set_enabled(&mut self, id: i32, enabled: bool) {
        self.enabled.insert(id, enabled);
    }

    pub fn pose(&self, id: i32) -> Option<Transform> {
        self.poses.get(&id).copied()
    }

    /// Current pose of `binding`, falling back to its decoded pose.
    pub fn current_pose(&self, level: &LevelData, binding: Binding) -> Option<Transform> {
        self.pose(binding.id)
            .or_else(|| level.initial_transform(binding.path))
    }

    /// Moves `binding` rigidly by `motion`.
    pub fn apply_motion(&mut self, level: &LevelData, binding: Binding, motion: Motion) {
        let Some(mut pose) = self.current_pose(level, binding) else {
            return;
        };
        match motion {
            Motion::None => return,
            Motion::Translate(delta) => pose.position += delta,
            Motion::Rotate { rotation, pivot } => {
                pose.position = pivot + rotation * (pose.position - pivot);
                pose.rotation = Some(Mat3::from_quat(rotation) * pose.rotation_or_identity());
            }
        }
        self.poses.insert(binding.id, pose);
    }
}
