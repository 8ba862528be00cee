use glam::Mat3;

use crate::error::FormatError;
use crate::events::EventType;
use crate::level::{
    BoltEmitter, Brush, BrushFlags, Clutter, Decal, Entity, EventParams, EventRecord, GeoRegion,
    Item, Keyframe, LevelInfo, LevelProperties, Light, LightFlags, MoverSounds, MovingGroup,
    ObjectInfo, ParticleEmitter, PlayerStart, PushRegion, PushRegionFlags, SoundRef, SpawnPoint,
    Target, Transform, TriggerRecord,
};
use crate::volume::{Volume, SHAPE_BOX, SHAPE_SPHERE};

use super::cursor::{Cursor, DecodeResult};
use super::geometry::decode_geometry;

/// Reads a `u32 count` followed by that many records.
pub fn decode_list<T>(
    cursor: &mut Cursor<'_>,
    what: &'static str,
    min_record_size: usize,
    mut decode: impl FnMut(&mut Cursor<'_>) -> DecodeResult<T>,
) -> DecodeResult<Vec<T>> {
    let count = cursor.read_count(what, min_record_size)?;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        records.push(decode(cursor)?);
    }
    Ok(records)
}

fn read_links(cursor: &mut Cursor<'_>) -> DecodeResult<Vec<i32>> {
    let count = cursor.read_count("link", 4)?;
    (0..count).map(|_| cursor.read_i32("link id")).collect()
}

fn read_shape(cursor: &mut Cursor<'_>) -> DecodeResult<u32> {
    let offset = cursor.position();
    let shape = cursor.read_u32("volume shape")?;
    if shape == SHAPE_SPHERE || shape == SHAPE_BOX {
        Ok(shape)
    } else {
        Err(FormatError::InvalidEnum {
            what: "volume shape",
            value: shape,
            offset,
        })
    }
}

/// Sphere radius, or a box whose rotation is stored alongside its extents.
fn read_volume(cursor: &mut Cursor<'_>, shape: u32) -> DecodeResult<Volume> {
    if shape == SHAPE_SPHERE {
        Ok(Volume::Sphere {
            radius: cursor.read_f32("sphere radius")?,
        })
    } else {
        Ok(Volume::Box {
            rotation: cursor.read_mat3("box orientation")?,
            extents: cursor.read_vec3("box extents")?,
        })
    }
}

/// Sphere radius, or box extents using a rotation read earlier.
fn read_volume_with_rotation(
    cursor: &mut Cursor<'_>,
    shape: u32,
    rotation: Mat3,
) -> DecodeResult<Volume> {
    if shape == SHAPE_SPHERE {
        Ok(Volume::Sphere {
            radius: cursor.read_f32("sphere radius")?,
        })
    } else {
        Ok(Volume::Box {
            rotation,
            extents: cursor.read_vec3("box extents")?,
        })
    }
}

fn read_classed_info(cursor: &mut Cursor<'_>) -> DecodeResult<ObjectInfo> {
    let id = cursor.read_i32("object id")?;
    let class_name = cursor.read_str16("object class")?;
    let position = cursor.read_vec3("object position")?;
    let rotation = cursor.read_mat3("object orientation")?;
    Ok(ObjectInfo {
        id,
        class_name,
        transform: Transform::new(position, rotation),
        script_name: cursor.read_str16("object script name")?,
        hidden: cursor.read_bool("object hidden")?,
    })
}

fn read_placed_info(cursor: &mut Cursor<'_>) -> DecodeResult<ObjectInfo> {
    let id = cursor.read_i32("object id")?;
    let position = cursor.read_vec3("object position")?;
    let rotation = cursor.read_mat3("object orientation")?;
    Ok(ObjectInfo {
        id,
        class_name: String::new(),
        transform: Transform::new(position, rotation),
        script_name: cursor.read_str16("object script name")?,
        hidden: cursor.read_bool("object hidden")?,
    })
}

fn read_sound(cursor: &mut Cursor<'_>) -> DecodeResult<SoundRef> {
    Ok(SoundRef {
        name: cursor.read_str16("sound name")?,
        volume: cursor.read_f32("sound volume")?,
    })
}

pub fn decode_brush(cursor: &mut Cursor<'_>) -> DecodeResult<Brush> {
    let id = cursor.read_i32("brush id")?;
    let position = cursor.read_vec3("brush position")?;
    let rotation = cursor.read_mat3("brush orientation")?;
    let geometry = decode_geometry(cursor)?;
    Ok(Brush {
        id,
        transform: Transform::new(position, rotation),
        geometry,
        flags: BrushFlags::from_bits_retain(cursor.read_u32("brush flags")?),
        life: cursor.read_i32("brush life")?,
        state: cursor.read_u32("brush state")?,
    })
}

pub fn decode_geo_region(cursor: &mut Cursor<'_>) -> DecodeResult<GeoRegion> {
    let id = cursor.read_i32("geo region id")?;
    let shape = read_shape(cursor)?;
    let hardness = cursor.read_i32("geo region hardness")?;
    let shallow = cursor.read_bool("geo region shallow")?;
    let ice = cursor.read_bool("geo region ice")?;
    let position = cursor.read_vec3("geo region position")?;
    let volume = read_volume(cursor, shape)?;
    let transform = match volume {
        Volume::Box { rotation, .. } => Transform::new(position, rotation),
        Volume::Sphere { .. } => Transform::at(position),
    };
    Ok(GeoRegion {
        id,
        transform,
        volume,
        hardness,
        shallow,
        ice,
    })
}

pub fn decode_light(cursor: &mut Cursor<'_>) -> DecodeResult<Light> {
    Ok(Light {
        info: read_classed_info(cursor)?,
        flags: LightFlags::from_bits_retain(cursor.read_u32("light flags")?),
        color: cursor.read_color("light color")?,
        range: cursor.read_f32("light range")?,
        fov: cursor.read_f32("light fov")?,
        fov_dropoff: cursor.read_f32("light fov dropoff")?,
        intensity: cursor.read_f32("light intensity")?,
        on_time: cursor.read_f32("light on time")?,
        off_time: cursor.read_f32("light off time")?,
    })
}

pub fn decode_event(cursor: &mut Cursor<'_>) -> DecodeResult<EventRecord> {
    let id = cursor.read_i32("event id")?;
    let class_name = cursor.read_str16("event class")?;
    let event_type = EventType::from_name(&class_name);
    let position = cursor.read_vec3("event position")?;
    let script_name = cursor.read_str16("event script name")?;
    let hidden = cursor.read_bool("event hidden")?;
    let delay = cursor.read_f32("event delay")?;
    let bool1 = cursor.read_bool("event bool1")?;
    let bool2 = cursor.read_bool("event bool2")?;
    let int1 = cursor.read_i32("event int1")?;
    let int2 = cursor.read_i32("event int2")?;
    let float1 = cursor.read_f32("event float1")?;
    let float2 = cursor.read_f32("event float2")?;
    let str1 = cursor.read_str16("event str1")?;
    let str2 = cursor.read_str16("event str2")?;
    let links = read_links(cursor)?;
    let transform = if event_type.is_some_and(EventType::is_oriented) {
        Transform::new(position, cursor.read_mat3("event orientation")?)
    } else {
        Transform::at(position)
    };
    let color = cursor.read_color("event color")?;
    Ok(EventRecord {
        id,
        class_name,
        event_type,
        transform,
        script_name,
        hidden,
        delay,
        params: EventParams {
            bool1,
            bool2,
            int1,
            int2,
            float1,
            float2,
            str1,
            str2,
            color,
        },
        links,
    })
}

pub fn decode_spawn_point(cursor: &mut Cursor<'_>) -> DecodeResult<SpawnPoint> {
    Ok(SpawnPoint {
        info: read_placed_info(cursor)?,
        team: cursor.read_u32("spawn team")?,
        red: cursor.read_bool("spawn red")?,
        blue: cursor.read_bool("spawn blue")?,
        bot: cursor.read_bool("spawn bot")?,
    })
}

pub fn decode_level_properties(cursor: &mut Cursor<'_>) -> DecodeResult<LevelProperties> {
    Ok(LevelProperties {
        geomod_texture: cursor.read_str16("geomod texture")?,
        hardness: cursor.read_i32("level hardness")?,
        ambient_color: cursor.read_color("ambient color")?,
        fog_color: cursor.read_color("fog color")?,
        fog_near: cursor.read_f32("fog near plane")?,
        fog_far: cursor.read_f32("fog far plane")?,
    })
}

pub fn decode_particle_emitter(cursor: &mut Cursor<'_>) -> DecodeResult<ParticleEmitter> {
    Ok(ParticleEmitter {
        info: read_placed_info(cursor)?,
        radius: cursor.read_f32("emitter radius")?,
        bitmap: cursor.read_str16("emitter bitmap")?,
        spawn_delay: cursor.read_f32("emitter spawn delay")?,
        spawn_randomize: cursor.read_f32("emitter spawn randomize")?,
        velocity: cursor.read_f32("emitter velocity")?,
        life_seconds: cursor.read_f32("emitter life")?,
        color: cursor.read_color("emitter color")?,
        initially_on: cursor.read_bool("emitter initially on")?,
    })
}

pub fn decode_bolt_emitter(cursor: &mut Cursor<'_>) -> DecodeResult<BoltEmitter> {
    Ok(BoltEmitter {
        info: read_placed_info(cursor)?,
        target_id: cursor.read_i32("bolt target")?,
        thickness: cursor.read_f32("bolt thickness")?,
        jitter: cursor.read_f32("bolt jitter")?,
        segments: cursor.read_i32("bolt segments")?,
        spawn_delay: cursor.read_f32("bolt spawn delay")?,
        spawn_randomize: cursor.read_f32("bolt spawn randomize")?,
        decay: cursor.read_f32("bolt decay")?,
        color: cursor.read_color("bolt color")?,
        bitmap: cursor.read_str16("bolt bitmap")?,
        flags: cursor.read_u32("bolt flags")?,
        initially_on: cursor.read_bool("bolt initially on")?,
    })
}

pub fn decode_target(cursor: &mut Cursor<'_>) -> DecodeResult<Target> {
    Ok(Target {
        info: read_placed_info(cursor)?,
    })
}

pub fn decode_decal(cursor: &mut Cursor<'_>) -> DecodeResult<Decal> {
    Ok(Decal {
        info: read_placed_info(cursor)?,
        extents: cursor.read_vec3("decal extents")?,
        texture: cursor.read_str16("decal texture")?,
        alpha: cursor.read_i32("decal alpha")?,
        self_illuminated: cursor.read_bool("decal self illuminated")?,
        tiling: cursor.read_u32("decal tiling")?,
        scale: cursor.read_f32("decal scale")?,
    })
}

pub fn decode_push_region(cursor: &mut Cursor<'_>) -> DecodeResult<PushRegion> {
    let id = cursor.read_i32("push region id")?;
    let script_name = cursor.read_str16("push region script name")?;
    let hidden = cursor.read_bool("push region hidden")?;
    let position = cursor.read_vec3("push region position")?;
    let rotation = cursor.read_mat3("push region orientation")?;
    let shape = read_shape(cursor)?;
    let volume = read_volume_with_rotation(cursor, shape, rotation)?;
    Ok(PushRegion {
        id,
        script_name,
        hidden,
        transform: Transform::new(position, rotation),
        volume,
        strength: cursor.read_f32("push region strength")?,
        flags: PushRegionFlags::from_bits_retain(cursor.read_u32("push region flags")?),
        turbulence: cursor.read_u16("push region turbulence")?,
    })
}

fn decode_keyframe(cursor: &mut Cursor<'_>) -> DecodeResult<Keyframe> {
    let id = cursor.read_i32("keyframe id")?;
    let position = cursor.read_vec3("keyframe position")?;
    let rotation = cursor.read_mat3("keyframe orientation")?;
    Ok(Keyframe {
        id,
        transform: Transform::new(position, rotation),
        script_name: cursor.read_str16("keyframe script name")?,
        hidden: cursor.read_bool("keyframe hidden")?,
        pause_time: cursor.read_f32("keyframe pause")?,
        depart_travel_time: cursor.read_f32("keyframe depart time")?,
        return_travel_time: cursor.read_f32("keyframe return time")?,
        accel_time: cursor.read_f32("keyframe accel time")?,
        decel_time: cursor.read_f32("keyframe decel time")?,
        arrival_trigger_id: cursor.read_i32("keyframe trigger id")?,
        contain_ids: [
            cursor.read_i32("keyframe contain id")?,
            cursor.read_i32("keyframe contain id")?,
        ],
        degrees_about_axis: cursor.read_f32("keyframe rotation")?,
    })
}

pub fn decode_moving_group(cursor: &mut Cursor<'_>) -> DecodeResult<MovingGroup> {
    let name = cursor.read_str16("moving group name")?;
    let keyframes = decode_list(cursor, "keyframe", 91, decode_keyframe)?;
    let members = read_links(cursor)?;
    Ok(MovingGroup {
        name,
        keyframes,
        members,
        is_door: cursor.read_bool("moving group door")?,
        rotate_in_place: cursor.read_bool("moving group rotate in place")?,
        starts_backwards: cursor.read_bool("moving group starts backwards")?,
        time_is_speed: cursor.read_bool("moving group time is speed")?,
        force_orient: cursor.read_bool("moving group force orient")?,
        no_player_collide: cursor.read_bool("moving group no player collide")?,
        movement_type: cursor.read_u32("moving group movement type")?,
        starting_keyframe: cursor.read_i32("moving group starting keyframe")?,
        sounds: MoverSounds {
            start: read_sound(cursor)?,
            looping: read_sound(cursor)?,
            stop: read_sound(cursor)?,
            close: read_sound(cursor)?,
        },
    })
}

pub fn decode_entity(cursor: &mut Cursor<'_>) -> DecodeResult<Entity> {
    Ok(Entity {
        info: read_classed_info(cursor)?,
        team: cursor.read_i32("entity team")?,
        friendliness: cursor.read_u32("entity friendliness")?,
        waypoint_list: cursor.read_str16("entity waypoint list")?,
        waypoint_method: cursor.read_str16("entity waypoint method")?,
        boarded: cursor.read_bool("entity boarded")?,
        life: cursor.read_i32("entity life")?,
        armor: cursor.read_f32("entity armor")?,
        weapon: cursor.read_str16("entity weapon")?,
        flags: cursor.read_u32("entity flags")?,
    })
}

pub fn decode_item(cursor: &mut Cursor<'_>) -> DecodeResult<Item> {
    Ok(Item {
        info: read_classed_info(cursor)?,
        count: cursor.read_i32("item count")?,
        respawn_time: cursor.read_i32("item respawn time")?,
        team: cursor.read_i32("item team")?,
    })
}

pub fn decode_clutter(cursor: &mut Cursor<'_>) -> DecodeResult<Clutter> {
    Ok(Clutter {
        info: read_classed_info(cursor)?,
        skin: cursor.read_str16("clutter skin")?,
        links: read_links(cursor)?,
    })
}

pub fn decode_trigger(cursor: &mut Cursor<'_>) -> DecodeResult<TriggerRecord> {
    let id = cursor.read_i32("trigger id")?;
    let script_name = cursor.read_str16("trigger script name")?;
    let hidden = cursor.read_bool("trigger hidden")?;
    let position = cursor.read_vec3("trigger position")?;
    let resets = cursor.read_i32("trigger resets")?;
    let reset_delay = cursor.read_f32("trigger reset delay")?;
    let use_key_required = cursor.read_bool("trigger use key")?;
    let key_name = cursor.read_str16("trigger key name")?;
    let weapon_activates = cursor.read_bool("trigger weapon activates")?;
    let npc_activates = cursor.read_bool("trigger npc activates")?;
    let auto = cursor.read_bool("trigger auto")?;
    let in_vehicle = cursor.read_bool("trigger in vehicle")?;
    let shape = read_shape(cursor)?;
    let (volume, one_way) = if shape == SHAPE_SPHERE {
        (read_volume(cursor, shape)?, false)
    } else {
        let volume = read_volume(cursor, shape)?;
        (volume, cursor.read_bool("trigger one way")?)
    };
    Ok(TriggerRecord {
        id,
        script_name,
        hidden,
        position,
        resets,
        reset_delay,
        use_key_required,
        key_name,
        weapon_activates,
        npc_activates,
        auto,
        in_vehicle,
        volume,
        one_way,
        airlock_room: cursor.read_i32("trigger airlock room")?,
        attached_to: cursor.read_i32("trigger attached to")?,
        switch_id: cursor.read_i32("trigger switch")?,
        disabled: cursor.read_bool("trigger disabled")?,
        use_dwell: cursor.read_f32("trigger use dwell")?,
        inside_dwell: cursor.read_f32("trigger inside dwell")?,
        team: cursor.read_u32("trigger team")?,
        links: read_links(cursor)?,
    })
}

pub fn decode_player_start(cursor: &mut Cursor<'_>) -> DecodeResult<PlayerStart> {
    let position = cursor.read_vec3("player start position")?;
    let rotation = cursor.read_mat3("player start orientation")?;
    Ok(PlayerStart {
        transform: Transform::new(position, rotation),
    })
}

pub fn decode_level_info(cursor: &mut Cursor<'_>) -> DecodeResult<LevelInfo> {
    cursor.skip(4, "level info header")?;
    Ok(LevelInfo {
        level_name: cursor.read_str16("level name")?,
        author: cursor.read_str16("level author")?,
        date: cursor.read_str16("level date")?,
        has_moving_geometry: cursor.read_bool("level moving geometry flag")?,
        multiplayer: cursor.read_bool("level multiplayer flag")?,
    })
}
