pub mod cursor;
pub mod geometry;
pub mod sections;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::error::FormatError;
use crate::level::{LevelData, LevelHeader, SectionSummary};

use cursor::{Cursor, DecodeResult};
use geometry::decode_geometry;
use sections::*;

pub const MAGIC: u32 = 0xD4BA_DA55;
/// Newest format revision the decoder understands.
pub const MAX_VERSION: u32 = 0xC8;

/// Section tags.
pub mod tags {
    pub const STATIC_GEOMETRY: u32 = 0x0000_0100;
    pub const GEO_REGIONS: u32 = 0x0000_0200;
    pub const LIGHTS: u32 = 0x0000_0300;
    pub const CUTSCENE_CAMERAS: u32 = 0x0000_0400;
    pub const AMBIENT_SOUNDS: u32 = 0x0000_0500;
    pub const EVENTS: u32 = 0x0000_0600;
    pub const SPAWN_POINTS: u32 = 0x0000_0700;
    pub const LEVEL_PROPERTIES: u32 = 0x0000_0900;
    pub const PARTICLE_EMITTERS: u32 = 0x0000_0A00;
    pub const GAS_REGIONS: u32 = 0x0000_0B00;
    pub const ROOM_EFFECTS: u32 = 0x0000_0C00;
    pub const BOLT_EMITTERS: u32 = 0x0000_0E00;
    pub const TARGETS: u32 = 0x0000_0F00;
    pub const DECALS: u32 = 0x0000_1000;
    pub const PUSH_REGIONS: u32 = 0x0000_1100;
    pub const LIGHTMAPS: u32 = 0x0000_1200;
    pub const MOVER_BRUSHES: u32 = 0x0000_2000;
    pub const MOVING_GROUPS: u32 = 0x0000_3000;
    pub const CUTSCENE_PATH_NODES: u32 = 0x0000_5000;
    pub const UNKNOWN_6000: u32 = 0x0000_6000;
    pub const TGA_FILES: u32 = 0x0000_7000;
    pub const VFX_FILES: u32 = 0x0000_7004;
    pub const EAX_EFFECTS: u32 = 0x0000_8000;
    pub const UNKNOWN_10000: u32 = 0x0001_0000;
    pub const NAV_POINTS: u32 = 0x0002_0000;
    pub const ENTITIES: u32 = 0x0003_0000;
    pub const ITEMS: u32 = 0x0004_0000;
    pub const CLUTTER: u32 = 0x0005_0000;
    pub const TRIGGERS: u32 = 0x0006_0000;
    pub const PLAYER_START: u32 = 0x0007_0000;
    pub const LEVEL_INFO: u32 = 0x0100_0000;
    pub const BRUSHES: u32 = 0x0200_0000;
    pub const EDITOR_GROUPS: u32 = 0x0300_0000;
    pub const EDITOR_ONLY_LIGHTS: u32 = 0x0400_0000;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Skip,
    Decode,
}

fn strategy(tag: u32) -> Option<Strategy> {
    use tags::*;
    match tag {
        CUTSCENE_CAMERAS | AMBIENT_SOUNDS | GAS_REGIONS | ROOM_EFFECTS | LIGHTMAPS
        | CUTSCENE_PATH_NODES | UNKNOWN_6000 | TGA_FILES..=VFX_FILES | EAX_EFFECTS
        | UNKNOWN_10000 | NAV_POINTS | EDITOR_GROUPS | EDITOR_ONLY_LIGHTS => Some(Strategy::Skip),
        STATIC_GEOMETRY | GEO_REGIONS | LIGHTS | EVENTS | SPAWN_POINTS | LEVEL_PROPERTIES
        | PARTICLE_EMITTERS | BOLT_EMITTERS | TARGETS | DECALS | PUSH_REGIONS | MOVER_BRUSHES
        | MOVING_GROUPS | ENTITIES | ITEMS | CLUTTER | TRIGGERS | PLAYER_START | LEVEL_INFO
        | BRUSHES => Some(Strategy::Decode),
        _ => None,
    }
}

impl LevelData {
    /// Reads and decodes a level file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).with_context(|| format!("unable to read {}", path.display()))?;
        decode_level(&data).with_context(|| format!("unable to decode {}", path.display()))
    }

    /// Decodes a level already resident in memory.
    pub fn from_bytes(data: &[u8]) -> Result<Self, FormatError> {
        decode_level(data)
    }
}

/// Decodes a complete level buffer.
pub fn decode_level(data: &[u8]) -> Result<LevelData, FormatError> {
    let mut cursor = Cursor::new(data);
    let header = decode_header(&mut cursor)?;
    debug!(
        "level '{}' version {:#x} declares {} sections",
        header.name, header.version, header.section_count
    );

    let section_count = header.section_count;
    let mut level = LevelData {
        header,
        ..LevelData::default()
    };

    for _ in 0..section_count {
        let offset = cursor.position();
        let tag = cursor.read_u32("section tag")?;
        let length = cursor.read_u32("section length")?;
        let payload = cursor.position();
        let decoded = match strategy(tag) {
            Some(Strategy::Skip) => {
                cursor.skip(length as usize, "skipped section payload")?;
                false
            }
            Some(Strategy::Decode) => {
                decode_section(tag, &mut cursor, &mut level)?;
                let consumed = cursor.position() - payload;
                if consumed != length as usize {
                    warn!(
                        "section {tag:#010x} at {offset} declared {length} bytes but its records used {consumed}"
                    );
                }
                check_checkpoint(tag, payload, &level.header);
                true
            }
            None => return Err(FormatError::UnknownSection { tag, offset }),
        };
        level.sections.push(SectionSummary {
            tag,
            offset,
            length,
            decoded,
        });
    }

    let terminator = cursor.position();
    let bad_terminator = FormatError::BadTerminator {
        offset: terminator,
        len: data.len(),
    };
    if cursor.remaining() != 8 {
        return Err(bad_terminator);
    }
    let end_tag = cursor.read_u32("terminator")?;
    let end_len = cursor.read_u32("terminator")?;
    if end_tag != 0 || end_len != 0 {
        return Err(bad_terminator);
    }
    Ok(level)
}

fn decode_header(cursor: &mut Cursor<'_>) -> DecodeResult<LevelHeader> {
    let magic = cursor.read_u32("magic")?;
    if magic != MAGIC {
        return Err(FormatError::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    let version = cursor.read_u32("version")?;
    if version > MAX_VERSION {
        return Err(FormatError::UnsupportedVersion {
            found: version,
            max: MAX_VERSION,
        });
    }
    let timestamp = cursor.read_u32("timestamp")?;
    let player_start_offset = cursor.read_u32("player start offset")?;
    let level_info_offset = cursor.read_u32("level info offset")?;
    let section_count = cursor.read_u32("section count")?;
    cursor.skip(4, "reserved header field")?;
    let name = cursor.read_cstr("level name")?;
    Ok(LevelHeader {
        version,
        timestamp,
        player_start_offset,
        level_info_offset,
        section_count,
        name,
    })
}

fn decode_section(tag: u32, cursor: &mut Cursor<'_>, level: &mut LevelData) -> DecodeResult<()> {
    use tags::*;
    match tag {
        STATIC_GEOMETRY => level.static_geometry = decode_geometry(cursor)?,
        GEO_REGIONS => level
            .geo_regions
            .extend(decode_list(cursor, "geo region", 27, decode_geo_region)?),
        LIGHTS => level
            .lights
            .extend(decode_list(cursor, "light", 87, decode_light)?),
        EVENTS => level
            .events
            .extend(decode_list(cursor, "event", 55, decode_event)?),
        SPAWN_POINTS => level
            .spawn_points
            .extend(decode_list(cursor, "spawn point", 62, decode_spawn_point)?),
        LEVEL_PROPERTIES => level.properties = decode_level_properties(cursor)?,
        PARTICLE_EMITTERS => level.particle_emitters.extend(decode_list(
            cursor,
            "particle emitter",
            82,
            decode_particle_emitter,
        )?),
        BOLT_EMITTERS => level.bolt_emitters.extend(decode_list(
            cursor,
            "bolt emitter",
            94,
            decode_bolt_emitter,
        )?),
        TARGETS => level
            .targets
            .extend(decode_list(cursor, "target", 55, decode_target)?),
        DECALS => level
            .decals
            .extend(decode_list(cursor, "decal", 82, decode_decal)?),
        PUSH_REGIONS => level
            .push_regions
            .extend(decode_list(cursor, "push region", 69, decode_push_region)?),
        MOVER_BRUSHES => level
            .mover_brushes
            .extend(decode_list(cursor, "mover brush", 80, decode_brush)?),
        MOVING_GROUPS => level
            .moving_groups
            .extend(decode_list(cursor, "moving group", 46, decode_moving_group)?),
        ENTITIES => level
            .entities
            .extend(decode_list(cursor, "entity", 84, decode_entity)?),
        ITEMS => level
            .items
            .extend(decode_list(cursor, "item", 69, decode_item)?),
        CLUTTER => level
            .clutter
            .extend(decode_list(cursor, "clutter", 63, decode_clutter)?),
        TRIGGERS => level
            .triggers
            .extend(decode_list(cursor, "trigger", 66, decode_trigger)?),
        PLAYER_START => level.player_start = decode_player_start(cursor)?,
        LEVEL_INFO => level.info = decode_level_info(cursor)?,
        BRUSHES => level
            .brushes
            .extend(decode_list(cursor, "brush", 80, decode_brush)?),
        _ => return Err(FormatError::UnknownSection {
            tag,
            offset: cursor.position(),
        }),
    }
    Ok(())
}

/// Compares a decoded section's payload offset with the header checkpoint.
fn check_checkpoint(tag: u32, payload: usize, header: &LevelHeader) {
    let declared = match tag {
        tags::PLAYER_START => header.player_start_offset,
        tags::LEVEL_INFO => header.level_info_offset,
        _ => return,
    };
    if declared != 0 && declared as usize != payload {
        debug!("section {tag:#010x} payload at {payload}, header checkpoint says {declared}");
    }
}
