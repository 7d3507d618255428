use thiserror::Error;
use tracing::debug;

use super::Stamp;
use crate::content::{ContentLookup, MonStatRecord, ObjectLookupRecord, ObjectRecord};
use crate::formats::{ObjectPlacement, PathPoint, PlacementKind};

/// A creature ready to be placed, in global sub-tile coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct NpcSpawn {
    pub x: i32,
    pub y: i32,
    pub direction: i32,
    pub stats: MonStatRecord,
    pub path: Vec<PathPoint>,
}

/// An interactive object ready to be placed, in global sub-tile coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSpawn {
    pub x: i32,
    pub y: i32,
    pub flags: i32,
    pub lookup: ObjectLookupRecord,
    pub object: ObjectRecord,
}

/// Builds world entities from resolved placements.
pub trait EntityFactory {
    type Entity;
    type Error;

    fn create_npc(&mut self, spawn: NpcSpawn) -> Self::Entity;

    fn create_object(&mut self, spawn: ObjectSpawn) -> Result<Self::Entity, Self::Error>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntitySpawn {
    Npc(NpcSpawn),
    Object(ObjectSpawn),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("object {index} ({name}) has no animation token")]
    MissingToken { index: i32, name: String },
}

/// Factory that returns the resolved spawn descriptions unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpawnListFactory;

impl EntityFactory for SpawnListFactory {
    type Entity = EntitySpawn;
    type Error = SpawnError;

    fn create_npc(&mut self, spawn: NpcSpawn) -> EntitySpawn {
        EntitySpawn::Npc(spawn)
    }

    fn create_object(&mut self, spawn: ObjectSpawn) -> Result<EntitySpawn, SpawnError> {
        if spawn.object.token.is_empty() {
            return Err(SpawnError::MissingToken {
                index: spawn.object.index,
                name: spawn.object.name.clone(),
            });
        }
        Ok(EntitySpawn::Object(spawn))
    }
}

/// Shifts waypoints by a sub-tile origin, keeping each action. `None` when a
/// shifted coordinate leaves the `i32` range.
pub fn convert_paths(origin_x: i32, origin_y: i32, path: &[PathPoint]) -> Option<Vec<PathPoint>> {
    path.iter()
        .map(|point| {
            Some(PathPoint {
                action: point.action,
                x: origin_x.checked_add(point.x)?,
                y: origin_y.checked_add(point.y)?,
            })
        })
        .collect()
}

impl Stamp {
    /// Resolves every layout placement and hands it to `factory`, in layout
    /// order. The stamp's top-left corner sits at `(tile_offset_x,
    /// tile_offset_y)` in layout cells. Placements whose definitions are
    /// missing, or whose global coordinates overflow `i32`, are skipped.
    pub fn entities<C, F>(
        &self,
        tile_offset_x: i32,
        tile_offset_y: i32,
        content: &C,
        factory: &mut F,
    ) -> Result<Vec<F::Entity>, F::Error>
    where
        C: ContentLookup + ?Sized,
        F: EntityFactory,
    {
        let origin = tile_offset_x
            .checked_mul(self.tiles_per_stamp_unit)
            .zip(tile_offset_y.checked_mul(self.tiles_per_stamp_unit));
        let act = self.layout.act;

        let mut entities = Vec::new();
        for placement in &self.layout.objects {
            match placement.kind {
                PlacementKind::Character => {
                    let Some(stats) = character_stats(content, act, placement) else {
                        continue;
                    };
                    let Some(((x, y), path)) = origin.and_then(|(origin_x, origin_y)| {
                        let position = global_position((origin_x, origin_y), placement)?;
                        Some((position, convert_paths(origin_x, origin_y, &placement.path)?))
                    }) else {
                        log_skipped(placement, act, "coordinates out of range");
                        continue;
                    };
                    entities.push(factory.create_npc(NpcSpawn {
                        x,
                        y,
                        direction: 0,
                        stats: stats.clone(),
                        path,
                    }));
                }
                PlacementKind::Item => {
                    let Some((lookup, object)) = item_records(content, act, placement) else {
                        continue;
                    };
                    let Some((x, y)) = origin.and_then(|origin| global_position(origin, placement))
                    else {
                        log_skipped(placement, act, "coordinates out of range");
                        continue;
                    };
                    entities.push(factory.create_object(ObjectSpawn {
                        x,
                        y,
                        flags: placement.flags,
                        lookup: lookup.clone(),
                        object: object.clone(),
                    })?);
                }
                PlacementKind::Other(_) => {}
            }
        }

        debug!(
            region_path = %self.region_path,
            tile_offset_x,
            tile_offset_y,
            placements = self.layout.objects.len(),
            entities = entities.len(),
            "stamp_entities_materialized"
        );
        Ok(entities)
    }
}

fn global_position((origin_x, origin_y): (i32, i32), placement: &ObjectPlacement) -> Option<(i32, i32)> {
    Some((
        origin_x.checked_add(placement.x)?,
        origin_y.checked_add(placement.y)?,
    ))
}

fn character_stats<'c, C: ContentLookup + ?Sized>(
    content: &'c C,
    act: i32,
    placement: &ObjectPlacement,
) -> Option<&'c MonStatRecord> {
    let Some(key) = content.monster_preset(act, placement.id) else {
        log_skipped(placement, act, "no monster preset");
        return None;
    };
    let stats = content.monster_stats(key);
    if stats.is_none() {
        debug!(
            act,
            id = placement.id,
            key,
            x = placement.x,
            y = placement.y,
            reason = "no monster stats",
            "stamp_placement_skipped"
        );
    }
    stats
}

fn item_records<'c, C: ContentLookup + ?Sized>(
    content: &'c C,
    act: i32,
    placement: &ObjectPlacement,
) -> Option<(&'c ObjectLookupRecord, &'c ObjectRecord)> {
    let Some(lookup) = content.object_lookup(act, placement.kind.raw(), placement.id) else {
        log_skipped(placement, act, "no object lookup");
        return None;
    };
    let Some(object) = content.object(lookup.objects_txt_id) else {
        log_skipped(placement, act, "no object definition");
        return None;
    };
    Some((lookup, object))
}

fn log_skipped(placement: &ObjectPlacement, act: i32, reason: &'static str) {
    debug!(
        act,
        kind = placement.kind.raw(),
        id = placement.id,
        x = placement.x,
        y = placement.y,
        reason,
        "stamp_placement_skipped"
    );
}
