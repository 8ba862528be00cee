use glam::Vec3;

use crate::events::EventType;
use crate::ids::Binding;
use crate::level::Transform;
use crate::mover::Motion;

/// Request for the host, produced while ticking and drained by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Activation reached an object the core does not simulate.
    Activate { target: Binding, on: bool },
    SetEnabled { target: Binding, enabled: bool },
    Remove { target: Binding },
    MoveGroup {
        group: usize,
        members: Vec<Binding>,
        motion: Motion,
    },
    PulseSwitch { trigger_id: i32, switch_id: i32 },
    SetOccupantVelocity { handle: u32, velocity: Vec3 },
    Teleport {
        event_id: i32,
        targets: Vec<Binding>,
        destination: Transform,
    },
    TeleportOccupant { event_id: i32, destination: Transform },
    Slay { target: Binding },
    PlaySound {
        event_id: i32,
        sound: String,
        position: Vec3,
        volume: f32,
        looping: bool,
    },
    Message { event_id: i32, text: String },
    Explosion {
        position: Vec3,
        radius: f32,
        damage: f32,
    },
    Damage { handle: u32, amount: f32 },
    SetGravity { gravity: f32 },
    CountdownBegin { seconds: i32 },
    CountdownEnd,
    LoadLevel { name: String },
    Endgame,
    ContinuousTick {
        event_id: i32,
        kind: EventType,
        dt: f32,
    },
    ContinuousStopped { event_id: i32, kind: EventType },
    /// Effect the host implements itself, with the links it consumes.
    Delegate {
        event_id: i32,
        kind: EventType,
        targets: Vec<Binding>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Activate { .. } => "activate",
            Command::SetEnabled { .. } => "set_enabled",
            Command::Remove { .. } => "remove",
            Command::MoveGroup { .. } => "move_group",
            Command::PulseSwitch { .. } => "pulse_switch",
            Command::SetOccupantVelocity { .. } => "set_occupant_velocity",
            Command::Teleport { .. } => "teleport",
            Command::TeleportOccupant { .. } => "teleport_occupant",
            Command::Slay { .. } => "slay",
            Command::PlaySound { .. } => "play_sound",
            Command::Message { .. } => "message",
            Command::Explosion { .. } => "explosion",
            Command::Damage { .. } => "damage",
            Command::SetGravity { .. } => "set_gravity",
            Command::CountdownBegin { .. } => "countdown_begin",
            Command::CountdownEnd => "countdown_end",
            Command::LoadLevel { .. } => "load_level",
            Command::Endgame => "endgame",
            Command::ContinuousTick { .. } => "continuous_tick",
            Command::ContinuousStopped { .. } => "continuous_stopped",
            Command::Delegate { .. } => "delegate",
        }
    }
}
