use bitflags::bitflags;
use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use crate::events::EventType;
use crate::ids::{IdType, ObjectPath};
use crate::volume::Volume;

pub use crate::rfl::geometry::{Face, FaceVertex, Geometry, Liquid, Room};

/// ID value used by the format for "no object".
pub const NO_ID: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Mat3>,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: None,
        }
    }

    pub fn new(position: Vec3, rotation: Mat3) -> Self {
        Self {
            position,
            rotation: Some(rotation),
        }
    }

    pub fn rotation_or_identity(&self) -> Mat3 {
        self.rotation.unwrap_or(Mat3::IDENTITY)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub id: i32,
    /// Editor class, empty for record kinds that do not store one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class_name: String,
    pub transform: Transform,
    pub script_name: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelHeader {
    pub version: u32,
    pub timestamp: u32,
    pub player_start_offset: u32,
    pub level_info_offset: u32,
    pub section_count: u32,
    pub name: String,
}

/// Where a section sat in the file and how it was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    pub tag: u32,
    pub offset: usize,
    pub length: u32,
    pub decoded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LevelInfo {
    pub level_name: String,
    pub author: String,
    pub date: String,
    pub has_moving_geometry: bool,
    pub multiplayer: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelProperties {
    pub geomod_texture: String,
    pub hardness: i32,
    pub ambient_color: Color,
    pub fog_color: Color,
    pub fog_near: f32,
    pub fog_far: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerStart {
    pub transform: Transform,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct BrushFlags: u32 {
        const PORTAL = 0x01;
        const AIR = 0x02;
        const DETAIL = 0x04;
        const EMIT_STEAM = 0x10;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Brush {
    pub id: i32,
    pub transform: Transform,
    pub geometry: Geometry,
    pub flags: BrushFlags,
    /// Hit points before destruction; negative means indestructible.
    pub life: i32,
    pub state: u32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LightFlags: u32 {
        const INITIALLY_ON = 0x01;
        const DYNAMIC = 0x02;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Light {
    pub info: ObjectInfo,
    pub flags: LightFlags,
    pub color: Color,
    pub range: f32,
    pub fov: f32,
    pub fov_dropoff: f32,
    pub intensity: f32,
    pub on_time: f32,
    pub off_time: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    pub info: ObjectInfo,
    pub team: i32,
    pub friendliness: u32,
    pub waypoint_list: String,
    pub waypoint_method: String,
    pub boarded: bool,
    pub life: i32,
    pub armor: f32,
    pub weapon: String,
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Item {
    pub info: ObjectInfo,
    pub count: i32,
    pub respawn_time: i32,
    pub team: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Clutter {
    pub info: ObjectInfo,
    pub skin: String,
    pub links: Vec<i32>,
}

/// The fixed parameter bag every event carries. Meaning depends on the
/// event type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventParams {
    pub bool1: bool,
    pub bool2: bool,
    pub int1: i32,
    pub int2: i32,
    pub float1: f32,
    pub float2: f32,
    pub str1: String,
    pub str2: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i32,
    pub class_name: String,
    /// `None` when the class name is not a known event type.
    pub event_type: Option<EventType>,
    pub transform: Transform,
    pub script_name: String,
    pub hidden: bool,
    pub delay: f32,
    pub params: EventParams,
    pub links: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TriggerRecord {
    pub id: i32,
    pub script_name: String,
    pub hidden: bool,
    pub position: Vec3,
    /// Initial remaining-uses counter; negative means unlimited.
    pub resets: i32,
    pub reset_delay: f32,
    pub use_key_required: bool,
    pub key_name: String,
    pub weapon_activates: bool,
    pub npc_activates: bool,
    pub auto: bool,
    pub in_vehicle: bool,
    pub volume: Volume,
    pub one_way: bool,
    pub airlock_room: i32,
    pub attached_to: i32,
    pub switch_id: i32,
    pub disabled: bool,
    /// Seconds the use key must be held inside the volume.
    pub use_dwell: f32,
    /// Seconds the occupant must stay inside the volume.
    pub inside_dwell: f32,
    pub team: u32,
    pub links: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Keyframe {
    pub id: i32,
    pub transform: Transform,
    pub script_name: String,
    pub hidden: bool,
    pub pause_time: f32,
    /// Travel time (or speed) toward the next keyframe.
    pub depart_travel_time: f32,
    /// Travel time (or speed) coming back from the next keyframe.
    pub return_travel_time: f32,
    pub accel_time: f32,
    pub decel_time: f32,
    pub arrival_trigger_id: i32,
    pub contain_ids: [i32; 2],
    pub degrees_about_axis: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SoundRef {
    pub name: String,
    pub volume: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MoverSounds {
    pub start: SoundRef,
    pub looping: SoundRef,
    pub stop: SoundRef,
    pub close: SoundRef,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MovingGroup {
    pub name: String,
    pub keyframes: Vec<Keyframe>,
    pub members: Vec<i32>,
    pub is_door: bool,
    pub rotate_in_place: bool,
    pub starts_backwards: bool,
    /// Travel times are speeds rather than durations.
    pub time_is_speed: bool,
    pub force_orient: bool,
    pub no_player_collide: bool,
    /// Raw sequence policy value, see [`crate::mover::SequencePolicy`].
    pub movement_type: u32,
    pub starting_keyframe: i32,
    pub sounds: MoverSounds,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParticleEmitter {
    pub info: ObjectInfo,
    pub radius: f32,
    pub bitmap: String,
    pub spawn_delay: f32,
    pub spawn_randomize: f32,
    pub velocity: f32,
    pub life_seconds: f32,
    pub color: Color,
    pub initially_on: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoltEmitter {
    pub info: ObjectInfo,
    pub target_id: i32,
    pub thickness: f32,
    pub jitter: f32,
    pub segments: i32,
    pub spawn_delay: f32,
    pub spawn_randomize: f32,
    pub decay: f32,
    pub color: Color,
    pub bitmap: String,
    pub flags: u32,
    pub initially_on: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Decal {
    pub info: ObjectInfo,
    pub extents: Vec3,
    pub texture: String,
    pub alpha: i32,
    pub self_illuminated: bool,
    pub tiling: u32,
    pub scale: f32,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct PushRegionFlags: u32 {
        const MASS_INDEPENDENT = 0x01;
        const GROWS_TOWARDS_CENTER = 0x02;
        const GROWS_TOWARDS_BOUNDARY = 0x04;
        const RADIAL = 0x08;
        const DOESNT_AFFECT_PLAYER = 0x10;
        const JUMP_PAD = 0x20;
        const CLIMB = 0x40;
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PushRegion {
    pub id: i32,
    pub script_name: String,
    pub hidden: bool,
    pub transform: Transform,
    pub volume: Volume,
    pub strength: f32,
    pub flags: PushRegionFlags,
    pub turbulence: u16,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoRegion {
    pub id: i32,
    pub transform: Transform,
    pub volume: Volume,
    pub hardness: i32,
    pub shallow: bool,
    pub ice: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SpawnPoint {
    pub info: ObjectInfo,
    pub team: u32,
    pub red: bool,
    pub blue: bool,
    pub bot: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Target {
    pub info: ObjectInfo,
}

/// Everything decoded from one level file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LevelData {
    pub header: LevelHeader,
    pub sections: Vec<SectionSummary>,
    pub info: LevelInfo,
    pub properties: LevelProperties,
    pub player_start: PlayerStart,
    pub static_geometry: Geometry,
    pub brushes: Vec<Brush>,
    pub mover_brushes: Vec<Brush>,
    pub lights: Vec<Light>,
    pub entities: Vec<Entity>,
    pub items: Vec<Item>,
    pub clutter: Vec<Clutter>,
    pub triggers: Vec<TriggerRecord>,
    pub events: Vec<EventRecord>,
    pub moving_groups: Vec<MovingGroup>,
    pub particle_emitters: Vec<ParticleEmitter>,
    pub bolt_emitters: Vec<BoltEmitter>,
    pub decals: Vec<Decal>,
    pub push_regions: Vec<PushRegion>,
    pub geo_regions: Vec<GeoRegion>,
    pub spawn_points: Vec<SpawnPoint>,
    pub targets: Vec<Target>,
}

impl LevelData {
    /// Display name: the level-info name when present, else the header name.
    pub fn display_name(&self) -> &str {
        if self.info.level_name.is_empty() {
            &self.header.name
        } else {
            &self.info.level_name
        }
    }

    pub fn ambient_color(&self) -> Color {
        self.properties.ambient_color
    }

    /// Pose an object had when the level was decoded.
    ///
    /// Brush paths past the static brushes index into the mover brushes, the
    /// same way [`crate::ids::IdTable::from_level`] binds them.
    pub fn initial_transform(&self, path: ObjectPath) -> Option<Transform> {
        let index = path.index;
        match path.kind {
            IdType::Brush => match self.brushes.get(index) {
                Some(brush) => Some(brush.transform),
                None => self
                    .mover_brushes
                    .get(index - self.brushes.len())
                    .map(|brush| brush.transform),
            },
            IdType::Light => self.lights.get(index).map(|l| l.info.transform),
            IdType::Entity => self.entities.get(index).map(|e| e.info.transform),
            IdType::Item => self.items.get(index).map(|i| i.info.transform),
            IdType::Clutter => self.clutter.get(index).map(|c| c.info.transform),
            IdType::Trigger => self.triggers.get(index).map(|t| Transform::at(t.position)),
            IdType::Event => self.events.get(index).map(|e| e.transform),
            IdType::Keyframe => self
                .moving_groups
                .get(index)
                .and_then(|group| group.keyframes.get(path.key))
                .map(|key| key.transform),
            IdType::ParticleEmitter => self.particle_emitters.get(index).map(|p| p.info.transform),
            IdType::BoltEmitter => self.bolt_emitters.get(index).map(|b| b.info.transform),
            IdType::PushRegion => self.push_regions.get(index).map(|p| p.transform),
            IdType::GeoRegion => self.geo_regions.get(index).map(|g| g.transform),
            IdType::SpawnPoint => self.spawn_points.get(index).map(|s| s.info.transform),
            IdType::Target => self.targets.get(index).map(|t| t.info.transform),
            IdType::All | IdType::None => None,
        }
    }
}
