use glam::Vec3;
use log::{debug, trace};
use serde::Serialize;

use crate::level::TriggerRecord;
use crate::simulation::Occupant;

/// Remaining firings of a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Uses {
    Unlimited,
    Remaining(u32),
}

impl Uses {
    fn from_resets(resets: i32) -> Self {
        u32::try_from(resets).map_or(Uses::Unlimited, Uses::Remaining)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Trigger {
    index: usize,
    id: i32,
    uses: Uses,
    enabled: bool,
    inside_for: f32,
    use_held_for: f32,
    cooldown: f32,
    fire_count: u32,
}

impl Trigger {
    pub fn new(index: usize, record: &TriggerRecord) -> Self {
        Self {
            index,
            id: record.id,
            uses: Uses::from_resets(record.resets),
            enabled: !record.disabled,
            inside_for: 0.0,
            use_held_for: 0.0,
            cooldown: 0.0,
            fire_count: 0,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn uses(&self) -> Uses {
        self.uses
    }

    pub fn fire_count(&self) -> u32 {
        self.fire_count
    }

    pub fn is_exhausted(&self) -> bool {
        self.uses == Uses::Remaining(0)
    }

    /// Consumes one use. Returns `false` when the trigger is disabled or
    /// exhausted, in which case nothing changes.
    pub fn fire(&mut self, record: &TriggerRecord) -> bool {
        if !self.enabled || self.is_exhausted() {
            trace!("trigger {} ignored activation", self.id);
            return false;
        }
        if let Uses::Remaining(left) = &mut self.uses {
            *left -= 1;
        }
        self.fire_count += 1;
        self.cooldown = record.reset_delay.max(0.0);
        self.inside_for = 0.0;
        self.use_held_for = 0.0;
        debug!("trigger {} fired ({:?} left)", self.id, self.uses);
        true
    }

    /// Fires auto triggers once at simulation start.
    pub fn start(&mut self, record: &TriggerRecord) -> bool {
        record.auto && self.fire(record)
    }

    /// Advances dwell and cooldown timers. Returns `true` when the trigger
    /// fires this tick.
    ///
    /// `position` is the trigger's current center, which differs from the
    /// record when a mover carries it.
    pub fn tick(
        &mut self,
        record: &TriggerRecord,
        position: Vec3,
        occupant: Option<&Occupant>,
        dt: f32,
    ) -> bool {
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt).max(0.0);
        }
        if record.auto || !self.enabled || self.is_exhausted() {
            return false;
        }

        let inside = occupant.filter(|occupant| record.volume.contains(position, occupant.position));
        let Some(occupant) = inside else {
            self.inside_for = 0.0;
            self.use_held_for = 0.0;
            return false;
        };

        self.inside_for += dt;
        if record.use_key_required {
            if occupant.use_key_held {
                self.use_held_for += dt;
            } else {
                self.use_held_for = 0.0;
            }
        }

        if self.cooldown > 0.0 || self.inside_for < record.inside_dwell {
            return false;
        }
        if record.use_key_required && (!occupant.use_key_held || self.use_held_for < record.use_dwell)
        {
            return false;
        }
        self.fire(record)
    }
}
