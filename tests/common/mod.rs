#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub const MAGIC: u32 = 0xD4BA_DA55;
pub const VERSION: u32 = 0x64;

pub const STATIC_GEOMETRY: u32 = 0x0000_0100;
pub const GEO_REGIONS: u32 = 0x0000_0200;
pub const LIGHTS: u32 = 0x0000_0300;
pub const AMBIENT_SOUNDS: u32 = 0x0000_0500;
pub const EVENTS: u32 = 0x0000_0600;
pub const SPAWN_POINTS: u32 = 0x0000_0700;
pub const LEVEL_PROPERTIES: u32 = 0x0000_0900;
pub const PARTICLE_EMITTERS: u32 = 0x0000_0A00;
pub const BOLT_EMITTERS: u32 = 0x0000_0E00;
pub const TARGETS: u32 = 0x0000_0F00;
pub const DECALS: u32 = 0x0000_1000;
pub const PUSH_REGIONS: u32 = 0x0000_1100;
pub const MOVER_BRUSHES: u32 = 0x0000_2000;
pub const MOVING_GROUPS: u32 = 0x0000_3000;
pub const ENTITIES: u32 = 0x0003_0000;
pub const ITEMS: u32 = 0x0004_0000;
pub const CLUTTER: u32 = 0x0005_0000;
pub const TRIGGERS: u32 = 0x0006_0000;
pub const PLAYER_START: u32 = 0x0007_0000;
pub const LEVEL_INFO: u32 = 0x0100_0000;
pub const BRUSHES: u32 = 0x0200_0000;

/// Little-endian byte writer.
#[derive(Debug, Default, Clone)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, value: u8) -> &mut Self {
        self.0.push(value);
        self
    }

    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.u8(value as u8)
    }

    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32(&mut self, value: f32) -> &mut Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn vec3(&mut self, [x, y, z]: [f32; 3]) -> &mut Self {
        self.f32(x).f32(y).f32(z)
    }

    pub fn identity(&mut self) -> &mut Self {
        self.vec3([1.0, 0.0, 0.0])
            .vec3([0.0, 1.0, 0.0])
            .vec3([0.0, 0.0, 1.0])
    }

    pub fn color(&mut self, rgba: [u8; 4]) -> &mut Self {
        self.0.extend_from_slice(&rgba);
        self
    }

    pub fn str16(&mut self, value: &str) -> &mut Self {
        self.u16(value.len() as u16);
        self.0.extend_from_slice(value.as_bytes());
        self
    }

    pub fn cstr(&mut self, value: &str) -> &mut Self {
        self.0.extend_from_slice(value.as_bytes());
        self.u8(0)
    }

    pub fn links(&mut self, links: &[i32]) -> &mut Self {
        self.u32(links.len() as u32);
        for link in links {
            self.i32(*link);
        }
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

/// Assembles a complete level file from section payloads.
#[derive(Debug, Clone)]
pub struct LevelBuilder {
    pub magic: u32,
    pub version: u32,
    pub name: String,
    pub sections: Vec<(u32, Vec<u8>)>,
}

impl LevelBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            name: name.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn section(mut self, tag: u32, payload: Vec<u8>) -> Self {
        self.sections.push((tag, payload));
        self
    }

    /// A `u32 count` list section.
    pub fn list(self, tag: u32, records: Vec<Vec<u8>>) -> Self {
        let mut payload = Bytes::new();
        payload.u32(records.len() as u32);
        for record in &records {
            payload.raw(record);
        }
        self.section(tag, payload.into_inner())
    }

    pub fn header_len(&self) -> usize {
        28 + self.name.len() + 1
    }

    /// Absolute payload offset of the first section carrying `tag`.
    pub fn payload_offset(&self, tag: u32) -> Option<usize> {
        let mut offset = self.header_len();
        for (section, payload) in &self.sections {
            if *section == tag {
                return Some(offset + 8);
            }
            offset += 8 + payload.len();
        }
        None
    }

    pub fn build(&self) -> Vec<u8> {
        let checkpoint = |tag| self.payload_offset(tag).unwrap_or(0) as u32;
        let mut out = Bytes::new();
        out.u32(self.magic)
            .u32(self.version)
            .u32(0x5F00_0000)
            .u32(checkpoint(PLAYER_START))
            .u32(checkpoint(LEVEL_INFO))
            .u32(self.sections.len() as u32)
            .u32(0)
            .cstr(&self.name);
        for (tag, payload) in &self.sections {
            out.u32(*tag).u32(payload.len() as u32).raw(payload);
        }
        out.u32(0).u32(0);
        out.into_inner()
    }

    pub fn write_temp(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp level");
        file.write_all(&self.build()).expect("write level");
        file
    }
}

pub fn empty_geometry() -> Vec<u8> {
    let mut out = Bytes::new();
    out.u32(0).u32(0).u32(0).u32(0).u32(0);
    out.into_inner()
}

pub fn player_start(position: [f32; 3]) -> Vec<u8> {
    let mut out = Bytes::new();
    out.vec3(position).identity();
    out.into_inner()
}

pub fn level_info(name: &str, author: &str) -> Vec<u8> {
    let mut out = Bytes::new();
    out.u32(1)
        .str16(name)
        .str16(author)
        .str16("10/16/26")
        .bool(true)
        .bool(false);
    out.into_inner()
}

/// Event parameters written after the common header.
#[derive(Debug, Clone, Default)]
pub struct EventFields {
    pub delay: f32,
    pub bool1: bool,
    pub int1: i32,
    pub float1: f32,
    pub float2: f32,
    pub str1: String,
    pub links: Vec<i32>,
}

const ORIENTED: [&str; 4] = ["Alarm", "Teleport", "Teleport_Player", "Play_Vclip"];

pub fn event(id: i32, class: &str, position: [f32; 3], fields: &EventFields) -> Vec<u8> {
    let mut out = Bytes::new();
    out.i32(id)
        .str16(class)
        .vec3(position)
        .str16("")
        .bool(false)
        .f32(fields.delay)
        .bool(fields.bool1)
        .bool(false)
        .i32(fields.int1)
        .i32(0)
        .f32(fields.float1)
        .f32(fields.float2)
        .str16(&fields.str1)
        .str16("")
        .links(&fields.links);
    if ORIENTED.contains(&class) {
        out.identity();
    }
    out.color([255, 255, 255, 255]);
    out.into_inner()
}

/// Sphere trigger with no dwell and no use key.
pub fn trigger(id: i32, position: [f32; 3], radius: f32, resets: i32, auto: bool, links: &[i32]) -> Vec<u8> {
    let mut out = Bytes::new();
    out.i32(id)
        .str16("")
        .bool(false)
        .vec3(position)
        .i32(resets)
        .f32(0.0)
        .bool(false)
        .str16("")
        .bool(false)
        .bool(false)
        .bool(auto)
        .bool(false)
        .u32(0)
        .f32(radius)
        .i32(-1)
        .i32(-1)
        .i32(-1)
        .bool(false)
        .f32(0.0)
        .f32(0.0)
        .u32(0)
        .links(links);
    out.into_inner()
}

pub fn keyframe(id: i32, position: [f32; 3], travel_time: f32, arrival_trigger: i32) -> Vec<u8> {
    let mut out = Bytes::new();
    out.i32(id)
        .vec3(position)
        .identity()
        .str16("")
        .bool(false)
        .f32(0.0)
        .f32(travel_time)
        .f32(travel_time)
        .f32(0.0)
        .f32(0.0)
        .i32(arrival_trigger)
        .i32(-1)
        .i32(-1)
        .f32(0.0);
    out.into_inner()
}

pub fn moving_group(name: &str, keyframes: Vec<Vec<u8>>, members: &[i32], movement_type: u32) -> Vec<u8> {
    let mut out = Bytes::new();
    out.str16(name).u32(keyframes.len() as u32);
    for key in &keyframes {
        out.raw(key);
    }
    out.links(members)
        .bool(false)
        .bool(false)
        .bool(false)
        .bool(false)
        .bool(false)
        .bool(false)
        .u32(movement_type)
        .i32(0);
    for _ in 0..4 {
        out.str16("").f32(1.0);
    }
    out.into_inner()
}

/// Brush with empty geometry.
pub fn brush(id: i32, position: [f32; 3]) -> Vec<u8> {
    let mut out = Bytes::new();
    out.i32(id)
        .vec3(position)
        .identity()
        .raw(&empty_geometry())
        .u32(0)
        .i32(-1)
        .u32(0);
    out.into_inner()
}

/// Id, position, identity orientation, empty script name, not hidden.
fn placed(out: &mut Bytes, id: i32, position: [f32; 3]) {
    out.i32(id).vec3(position).identity().str16("").bool(false);
}

fn classed(out: &mut Bytes, id: i32, class: &str, position: [f32; 3]) {
    out.i32(id)
        .str16(class)
        .vec3(position)
        .identity()
        .str16("")
        .bool(false);
}

/// Geometry with one texture and one room carrying the optional liquid
/// and ambient color sub-records.
pub fn liquid_room_geometry() -> Vec<u8> {
    let mut out = Bytes::new();
    out.u32(0).u32(1).str16("rock.tga");
    out.u32(1)
        .i32(3)
        .vec3([-1.0, -1.0, -1.0])
        .vec3([1.0, 1.0, 1.0])
        .bool(false)
        .bool(false)
        .bool(false)
        .bool(false)
        .bool(true)
        .bool(true)
        .bool(false)
        .f32(-1.0)
        .str16("cave");
    out.f32(2.0)
        .color([0, 64, 128, 255])
        .str16("water.tga")
        .f32(5.0)
        .u32(1)
        .u32(200)
        .u32(0)
        .f32(0.5)
        .f32(0.25);
    out.color([10, 20, 30, 255]);
    out.u32(0).u32(0);
    out.into_inner()
}

pub fn geo_region(id: i32, position: [f32; 3], radius: f32, hardness: i32) -> Vec<u8> {
    let mut out = Bytes::new();
    out.i32(id)
        .u32(0)
        .i32(hardness)
        .bool(true)
        .bool(false)
        .vec3(position)
        .f32(radius);
    out.into_inner()
}

pub fn light(id: i32, position: [f32; 3], flags: u32, range: f32) -> Vec<u8> {
    let mut out = Bytes::new();
    classed(&mut out, id, "Light", position);
    out.u32(flags)
        .color([255, 200, 100, 255])
        .f32(range)
        .f32(90.0)
        .f32(10.0)
        .f32(1.0)
        .f32(0.5)
        .f32(0.25);
    out.into_inner()
}

pub fn spawn_point(id: i32, position: [f32; 3], team: u32) -> Vec<u8> {
    let mut out = Bytes::new();
    placed(&mut out, id, position);
    out.u32(team).bool(true).bool(false).bool(true);
    out.into_inner()
}

pub fn level_properties(texture: &str, hardness: i32) -> Vec<u8> {
    let mut out = Bytes::new();
    out.str16(texture)
        .i32(hardness)
        .color([40, 40, 40, 255])
        .color([0, 0, 0, 255])
        .f32(10.0)
        .f32(250.0);
    out.into_inner()
}

pub fn particle_emitter(id: i32, position: [f32; 3], bitmap: &str, initially_on: bool) -> Vec<u8> {
    let mut out = Bytes::new();
    placed(&mut out, id, position);
    out.f32(0.5)
        .str16(bitmap)
        .f32(0.1)
        .f32(0.05)
        .f32(3.0)
        .f32(2.0)
        .color([255, 255, 255, 128])
        .bool(initially_on);
    out.into_inner()
}

/// Bolt emitter with an empty bitmap, the smallest record of its kind.
pub fn bolt_emitter(id: i32, position: [f32; 3], target: i32) -> Vec<u8> {
    let mut out = Bytes::new();
    placed(&mut out, id, position);
    out.i32(target)
        .f32(0.2)
        .f32(0.1)
        .i32(8)
        .f32(1.0)
        .f32(0.5)
        .f32(0.3)
        .color([100, 100, 255, 255])
        .str16("")
        .u32(0)
        .bool(true);
    out.into_inner()
}

pub fn target(id: i32, position: [f32; 3]) -> Vec<u8> {
    let mut out = Bytes::new();
    placed(&mut out, id, position);
    out.into_inner()
}

pub fn decal(id: i32, position: [f32; 3], texture: &str) -> Vec<u8> {
    let mut out = Bytes::new();
    placed(&mut out, id, position);
    out.vec3([1.0, 2.0, 0.5])
        .str16(texture)
        .i32(255)
        .bool(true)
        .u32(1)
        .f32(2.0);
    out.into_inner()
}

/// Box push region aligned with the world axes.
pub fn push_region(id: i32, position: [f32; 3], strength: f32, flags: u32) -> Vec<u8> {
    let mut out = Bytes::new();
    out.i32(id)
        .str16("")
        .bool(false)
        .vec3(position)
        .identity()
        .u32(1)
        .vec3([2.0, 2.0, 2.0])
        .f32(strength)
        .u32(flags)
        .u16(3);
    out.into_inner()
}

pub fn entity(id: i32, class: &str, position: [f32; 3], weapon: &str) -> Vec<u8> {
    let mut out = Bytes::new();
    classed(&mut out, id, class, position);
    out.i32(1)
        .u32(2)
        .str16("patrol")
        .str16("loop")
        .bool(false)
        .i32(100)
        .f32(25.0)
        .str16(weapon)
        .u32(0);
    out.into_inner()
}

pub fn item(id: i32, class: &str, position: [f32; 3], count: i32) -> Vec<u8> {
    let mut out = Bytes::new();
    classed(&mut out, id, class, position);
    out.i32(count).i32(30).i32(0);
    out.into_inner()
}

pub fn clutter(id: i32, class: &str, position: [f32; 3], links: &[i32]) -> Vec<u8> {
    let mut out = Bytes::new();
    classed(&mut out, id, class, position);
    out.str16("rusty").links(links);
    out.into_inner()
}
