use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Diagnostics, Warning};
use crate::level::{LevelData, NO_ID};

/// Object type of a bound ID, plus the `All`/`None` filter sentinels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    Brush,
    Light,
    Entity,
    Item,
    Clutter,
    Trigger,
    Event,
    Keyframe,
    ParticleEmitter,
    BoltEmitter,
    PushRegion,
    GeoRegion,
    SpawnPoint,
    Target,
    /// Filter matching every type.
    All,
    /// Filter matching nothing.
    None,
}

impl IdType {
    /// Whether a binding of type `kind` passes this filter.
    pub fn matches(self, kind: IdType) -> bool {
        match self {
            IdType::All => true,
            IdType::None => false,
            filter => filter == kind,
        }
    }
}

/// Location of a record inside [`LevelData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectPath {
    pub kind: IdType,
    /// Index into the array for `kind` (the moving group for keyframes).
    pub index: usize,
    /// Keyframe index within the group; zero for every other type.
    pub key: usize,
}

impl ObjectPath {
    pub const fn record(kind: IdType, index: usize) -> Self {
        Self {
            kind,
            index,
            key: 0,
        }
    }

    pub const fn keyframe(group: usize, key: usize) -> Self {
        Self {
            kind: IdType::Keyframe,
            index: group,
            key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Binding {
    pub id: i32,
    pub path: ObjectPath,
}

impl Binding {
    pub fn kind(&self) -> IdType {
        self.path.kind
    }
}

/// ID → path table. Filled once before the first tick, read-only after.
#[derive(Debug, Clone, Default)]
pub struct IdTable {
    bindings: HashMap<i32, ObjectPath>,
}

impl IdTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds every linkable record of `level` under its own type.
    pub fn from_level(level: &LevelData, diagnostics: &mut Diagnostics) -> Self {
        let mut table = Self::new();
        let mut bind_all = |kind: IdType, ids: &mut dyn Iterator<Item = i32>| {
            for (index, id) in ids.enumerate() {
                table.bind_first(id, ObjectPath::record(kind, index), diagnostics);
            }
        };
        bind_all(IdType::Brush, &mut level.brushes.iter().map(|b| b.id));
        bind_all(IdType::Light, &mut level.lights.iter().map(|l| l.info.id));
        bind_all(IdType::Entity, &mut level.entities.iter().map(|e| e.info.id));
        bind_all(IdType::Item, &mut level.items.iter().map(|i| i.info.id));
        bind_all(IdType::Clutter, &mut level.clutter.iter().map(|c| c.info.id));
        bind_all(IdType::Trigger, &mut level.triggers.iter().map(|t| t.id));
        bind_all(IdType::Event, &mut level.events.iter().map(|e| e.id));
        bind_all(
            IdType::ParticleEmitter,
            &mut level.particle_emitters.iter().map(|p| p.info.id),
        );
        bind_all(
            IdType::BoltEmitter,
            &mut level.bolt_emitters.iter().map(|b| b.info.id),
        );
        bind_all(IdType::PushRegion, &mut level.push_regions.iter().map(|p| p.id));
        bind_all(IdType::GeoRegion, &mut level.geo_regions.iter().map(|g| g.id));
        bind_all(
            IdType::SpawnPoint,
            &mut level.spawn_points.iter().map(|s| s.info.id),
        );
        bind_all(IdType::Target, &mut level.targets.iter().map(|t| t.info.id));

        // Mover brushes share the brush type but live in their own array, so
        // their index is offset past the static brushes.
        let offset = level.brushes.len();
        for (index, brush) in level.mover_brushes.iter().enumerate() {
            table.bind_first(
                brush.id,
                ObjectPath::record(IdType::Brush, offset + index),
                diagnostics,
            );
        }
        for (group, moving_group) in level.moving_groups.iter().enumerate() {
            for (key, keyframe) in moving_group.keyframes.iter().enumerate() {
                table.bind_first(keyframe.id, ObjectPath::keyframe(group, key), diagnostics);
            }
        }
        debug!("bound {} ids", table.len());
        table
    }

    /// Binds `id` to `path`.
    ///
    /// Rebinding an ID to the same type replaces the old path. Binding it to
    /// a different type is rejected with [`Warning::DuplicateId`].
    pub fn bind(&mut self, id: i32, path: ObjectPath, diagnostics: &mut Diagnostics) -> bool {
        if id == NO_ID {
            return false;
        }
        match self.bindings.get(&id) {
            Some(existing) if existing.kind != path.kind => {
                diagnostics.report(Warning::DuplicateId {
                    id,
                    existing: existing.kind,
                    rejected: path.kind,
                });
                false
            }
            _ => {
                self.bindings.insert(id, path);
                true
            }
        }
    }

    /// Like [`IdTable::bind`], but an ID that is already bound under any
    /// type keeps its first binding.
    fn bind_first(&mut self, id: i32, path: ObjectPath, diagnostics: &mut Diagnostics) -> bool {
        match self.bindings.get(&id) {
            Some(existing) if id != NO_ID => {
                diagnostics.report(Warning::DuplicateId {
                    id,
                    existing: existing.kind,
                    rejected: path.kind,
                });
                false
            }
            _ => self.bind(id, path, diagnostics),
        }
    }

    pub fn resolve(&self, id: i32) -> Option<Binding> {
        self.bindings
            .get(&id)
            .map(|path| Binding { id, path: *path })
    }

    pub fn resolve_filtered(&self, id: i32, filter: IdType) -> Option<Binding> {
        self.resolve(id)
            .filter(|binding| filter.matches(binding.kind()))
    }

    /// Resolves a link list, keeping the bindings that pass `filter`.
    ///
    /// Links that do not resolve at all are reported once and dropped.
    pub fn resolve_links(
        &self,
        from: i32,
        links: &[i32],
        filter: IdType,
        diagnostics: &mut Diagnostics,
    ) -> Vec<Binding> {
        if filter == IdType::None {
            return Vec::new();
        }
        links
            .iter()
            .filter(|id| **id != NO_ID)
            .filter_map(|id| match self.resolve(*id) {
                Some(binding) => Some(binding),
                None => {
                    diagnostics.report(Warning::Unresolved {
                        from,
                        id: *id,
                        expected: filter,
                    });
                    None
                }
            })
            .filter(|binding| filter.matches(binding.kind()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{EventRecord, Keyframe, MovingGroup, TriggerRecord};

    fn sample_level() -> LevelData {
        LevelData {
            triggers: vec![TriggerRecord {
                id: 10,
                ..TriggerRecord::default()
            }],
            events: vec![
                EventRecord {
                    id: 20,
                    ..EventRecord::default()
                },
                EventRecord {
                    id: 21,
                    ..EventRecord::default()
                },
            ],
            moving_groups: vec![MovingGroup {
                keyframes: vec![
                    Keyframe {
                        id: 30,
                        ..Keyframe::default()
                    },
                    Keyframe {
                        id: 31,
                        ..Keyframe::default()
                    },
                ],
                ..MovingGroup::default()
            }],
            ..LevelData::default()
        }
    }

    #[test]
    fn resolving_twice_yields_the_same_binding() {
        let mut diagnostics = Diagnostics::new();
        let table = IdTable::from_level(&sample_level(), &mut diagnostics);
        let first = table.resolve(21).unwrap();
        let second = table.resolve(21).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.path, ObjectPath::record(IdType::Event, 1));
        assert_eq!(table.resolve(31).unwrap().path, ObjectPath::keyframe(0, 1));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn filters_all_and_none() {
        let table = IdTable::from_level(&sample_level(), &mut Diagnostics::new());
        assert!(table.resolve_filtered(10, IdType::All).is_some());
        assert!(table.resolve_filtered(10, IdType::Trigger).is_some());
        assert!(table.resolve_filtered(10, IdType::Event).is_none());
        assert!(table.resolve_filtered(10, IdType::None).is_none());
    }

    #[test]
    fn unresolved_links_are_warned_once_and_dropped() {
        let table = IdTable::from_level(&sample_level(), &mut Diagnostics::new());
        let mut diagnostics = Diagnostics::new();
        let links = [20, 404, 30, NO_ID];
        let resolved = table.resolve_links(1, &links, IdType::All, &mut diagnostics);
        assert_eq!(resolved.len(), 2);
        table.resolve_links(1, &links, IdType::All, &mut diagnostics);
        assert_eq!(diagnostics.warnings().len(), 1);

        let keyframes = table.resolve_links(1, &links, IdType::Keyframe, &mut diagnostics);
        assert_eq!(keyframes.len(), 1);
        assert_eq!(keyframes[0].id, 30);
        assert!(table
            .resolve_links(1, &links, IdType::None, &mut diagnostics)
            .is_empty());
    }

    #[test]
    fn conflicting_type_keeps_first_binding() {
        let mut diagnostics = Diagnostics::new();
        let mut table = IdTable::new();
        assert!(table.bind(5, ObjectPath::record(IdType::Item, 0), &mut diagnostics));
        assert!(!table.bind(5, ObjectPath::record(IdType::Light, 3), &mut diagnostics));
        assert_eq!(table.resolve(5).unwrap().kind(), IdType::Item);
        assert!(table.bind(5, ObjectPath::record(IdType::Item, 2), &mut diagnostics));
        assert_eq!(table.resolve(5).unwrap().path.index, 2);
        assert_eq!(diagnostics.warnings().len(), 1);
    }

    #[test]
    fn repeated_ids_in_a_level_keep_the_first_record() {
        let mut level = sample_level();
        level.events[1].id = 20;
        let mut diagnostics = Diagnostics::new();
        let table = IdTable::from_level(&level, &mut diagnostics);
        assert_eq!(table.resolve(20).unwrap().path, ObjectPath::record(IdType::Event, 0));
        assert_eq!(
            diagnostics.warnings(),
            &[Warning::DuplicateId {
                id: 20,
                existing: IdType::Event,
                rejected: IdType::Event,
            }]
        );
    }
}
