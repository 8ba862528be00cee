//! Decoder and scripted-object runtime for RFL level files.
//!
//! [`rfl::decode_level`] turns a level file into an immutable
//! [`LevelData`]. [`Simulation`] binds every ID in it and runs the event
//! graph, triggers, movers and force regions in discrete ticks. Rendering,
//! audio and physics stay with the embedding host, which talks to the
//! simulation through the [`Host`] trait and the [`Command`] outbox.

pub mod app;
pub mod error;
pub mod events;
pub mod force;
pub mod ids;
pub mod level;
pub mod mover;
pub mod rfl;
pub mod simulation;
pub mod trigger;
pub mod volume;

pub use error::{Diagnostics, FormatError, Warning};
pub use events::{BehaviorClass, EventType};
pub use ids::{Binding, IdTable, IdType, ObjectPath};
pub use level::LevelData;
pub use mover::{Mover, SequencePolicy};
pub use rfl::decode_level;
pub use simulation::{Command, Host, NullHost, Occupant, Simulation, SimulationConfig};
