use glam::Vec3;

use crate::ids::Binding;
use crate::level::{EventRecord, Transform};

/// The object triggers and force regions act on, usually the player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Occupant {
    pub handle: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    pub use_key_held: bool,
}

/// Capabilities the embedding engine provides to the simulation.
pub trait Host {
    fn active_occupant(&self) -> Option<Occupant>;

    /// Seconds left on the level countdown, if one is running.
    fn countdown_value(&self) -> Option<f32>;

    fn play_effect(&mut self, name: &str, pose: &Transform);

    /// Spawns a copy of the linked object at `pose`.
    fn instantiate_prefab(&mut self, source: Binding, pose: &Transform);

    /// Condition polled by `When_*` detectors that the core cannot observe
    /// itself (deaths, hits, vehicles, cutscenes).
    fn detector_condition(&self, _event: &EventRecord, _watched: &[Binding]) -> bool {
        false
    }
}

/// Host with no occupant, no countdown and no presentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullHost;

impl Host for NullHost {
    fn active_occupant(&self) -> Option<Occupant> {
        None
    }

    fn countdown_value(&self) -> Option<f32> {
        None
    }

    fn play_effect(&mut self, _name: &str, _pose: &Transform) {}

    fn instantiate_prefab(&mut self, _source: Binding, _pose: &Transform) {}
}
