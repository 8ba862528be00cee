use glam::{Vec2, Vec3};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::level::Color;

use super::cursor::{Cursor, DecodeResult};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub flags: u32,
    pub textures: Vec<String>,
    pub rooms: Vec<Room>,
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Room {
    pub id: i32,
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
    pub is_skyroom: bool,
    pub is_cold: bool,
    pub is_outside: bool,
    pub is_airlock: bool,
    pub is_liquid: bool,
    pub has_ambient_light: bool,
    pub is_subroom: bool,
    pub life: f32,
    pub eax_effect: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid: Option<Liquid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ambient_color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Liquid {
    pub depth: f32,
    pub color: Color,
    pub surface_texture: String,
    pub visibility: f32,
    pub liquid_type: u32,
    pub alpha: u32,
    pub waveform: u32,
    pub scroll_u: f32,
    pub scroll_v: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Face {
    pub normal: Vec3,
    pub dist: f32,
    /// Index into [`Geometry::textures`].
    pub texture: i32,
    pub face_id: i32,
    pub show_sky: bool,
    pub mirrored: bool,
    pub full_bright: bool,
    pub vertices: Vec<FaceVertex>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceVertex {
    /// Index into [`Geometry::vertices`].
    pub index: u32,
    pub uv: Vec2,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lightmap_uv: Option<Vec2>,
}

pub fn decode_geometry(cursor: &mut Cursor<'_>) -> DecodeResult<Geometry> {
    let flags = cursor.read_u32("geometry flags")?;

    let texture_count = cursor.read_count("texture", 2)?;
    let mut textures = Vec::with_capacity(texture_count);
    for _ in 0..texture_count {
        textures.push(cursor.read_str16("texture name")?);
    }

    let room_count = cursor.read_count("room", 37)?;
    let mut rooms = Vec::with_capacity(room_count);
    for _ in 0..room_count {
        rooms.push(decode_room(cursor)?);
    }

    let vertex_count = cursor.read_count("vertex", 12)?;
    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        vertices.push(cursor.read_vec3("vertex")?);
    }

    let face_count = cursor.read_count("face", 31)?;
    let mut faces = Vec::with_capacity(face_count);
    for _ in 0..face_count {
        faces.push(decode_face(cursor, vertex_count)?);
    }

    trace!(
        "decoded geometry: {} textures, {} rooms, {} vertices, {} faces",
        textures.len(),
        rooms.len(),
        vertices.len(),
        faces.len()
    );

    Ok(Geometry {
        flags,
        textures,
        rooms,
        vertices,
        faces,
    })
}

fn decode_room(cursor: &mut Cursor<'_>) -> DecodeResult<Room> {
    let mut room = Room {
        id: cursor.read_i32("room id")?,
        bounds_min: cursor.read_vec3("room bounds")?,
        bounds_max: cursor.read_vec3("room bounds")?,
        is_skyroom: cursor.read_bool("room flags")?,
        is_cold: cursor.read_bool("room flags")?,
        is_outside: cursor.read_bool("room flags")?,
        is_airlock: cursor.read_bool("room flags")?,
        is_liquid: cursor.read_bool("room flags")?,
        has_ambient_light: cursor.read_bool("room flags")?,
        is_subroom: cursor.read_bool("room flags")?,
        life: cursor.read_f32("room life")?,
        eax_effect: cursor.read_str16("room eax effect")?,
        ..Room::default()
    };
    if room.is_liquid {
        room.liquid = Some(Liquid {
            depth: cursor.read_f32("liquid depth")?,
            color: cursor.read_color("liquid color")?,
            surface_texture: cursor.read_str16("liquid texture")?,
            visibility: cursor.read_f32("liquid visibility")?,
            liquid_type: cursor.read_u32("liquid type")?,
            alpha: cursor.read_u32("liquid alpha")?,
            waveform: cursor.read_u32("liquid waveform")?,
            scroll_u: cursor.read_f32("liquid scroll")?,
            scroll_v: cursor.read_f32("liquid scroll")?,
        });
    }
    if room.has_ambient_light {
        room.ambient_color = Some(cursor.read_color("room ambient color")?);
    }
    Ok(room)
}

fn decode_face(cursor: &mut Cursor<'_>, vertex_count: usize) -> DecodeResult<Face> {
    let normal = cursor.read_vec3("face plane")?;
    let dist = cursor.read_f32("face plane")?;
    let texture = cursor.read_i32("face texture")?;
    let face_id = cursor.read_i32("face id")?;
    let show_sky = cursor.read_bool("face flags")?;
    let mirrored = cursor.read_bool("face flags")?;
    let full_bright = cursor.read_bool("face flags")?;

    let count = cursor.read_count("face vertex", 12)?;
    let mut vertices = Vec::with_capacity(count);
    // Decided once from the first vertex and trusted for the rest of the face.
    let mut has_lightmap_uv: Option<bool> = None;
    for _ in 0..count {
        let index = cursor.read_u32("face vertex index")?;
        let u = cursor.read_f32("face vertex uv")?;
        let v = cursor.read_f32("face vertex uv")?;
        let extras = *has_lightmap_uv
            .get_or_insert_with(|| !next_is_vertex_index(cursor, vertex_count));
        let lightmap_uv = if extras {
            let lu = cursor.read_f32("face vertex lightmap uv")?;
            let lv = cursor.read_f32("face vertex lightmap uv")?;
            Some(Vec2::new(lu, lv))
        } else {
            None
        };
        vertices.push(FaceVertex {
            index,
            uv: Vec2::new(u, v),
            lightmap_uv,
        });
    }

    Ok(Face {
        normal,
        dist,
        texture,
        face_id,
        show_sky,
        mirrored,
        full_bright,
        vertices,
    })
}

/// Whether the next four bytes read as an index into the vertex array.
///
/// Lightmap coordinates follow the texture coordinates only for some
/// textures and the format has no flag for it. A plausible vertex index
/// right after `u, v` means the next vertex record starts there; anything
/// else (including running out of data) means the extra pair is present.
/// A lightmap `u` of exactly 0.0 reads as index 0 and is misclassified;
/// existing files depend on this exact rule, so it stays as is.
fn next_is_vertex_index(cursor: &Cursor<'_>, vertex_count: usize) -> bool {
    cursor
        .peek_u32()
        .is_some_and(|value| (value as usize) < vertex_count)
}
