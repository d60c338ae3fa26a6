/// Resource definitions for the object layer.

use bevy::prelude::*;
use rustc_hash::FxHashMap;
use crate::scene::config::SceneConfig;
use crate::scene::depth_order::DepthSorter;
use crate::scene::nav_grid::NavGrid;
use crate::scene::spatial_hash::{ProxyHandle, SpatialHashGrid};

// ============================================================================
// Spatial Index
// ============================================================================

/// Spatial hash over scene entities plus the entity → proxy lookup.
#[derive(Resource)]
pub struct SceneIndex {
    pub grid: SpatialHashGrid<Entity>,
    handles: FxHashMap<Entity, ProxyHandle>,
}

impl Default for SceneIndex {
    fn default() -> Self {
        let config = SceneConfig::default();
        let divisions = config.spatial_divisions();
        Self::new(config.world_rect(), divisions.x, divisions.y)
    }
}

impl SceneIndex {
    pub fn new(region: Rect, divx: u32, divy: u32) -> Self {
        Self {
            grid: SpatialHashGrid::new(region, divx, divy),
            handles: FxHashMap::default(),
        }
    }

    /// Insert `entity` at `position`, or move it there if already indexed.
    pub fn place(&mut self, entity: Entity, position: Vec2) {
        match self.handles.get(&entity) {
            Some(&handle) => self.grid.move_to(handle, position),
            None => {
                let handle = self.grid.create_proxy(position, entity);
                self.grid.update_for_new_location(handle);
                self.handles.insert(entity, handle);
            }
        }
    }

    /// Drop `entity` from the index. Returns whether it was indexed.
    pub fn remove(&mut self, entity: Entity) -> bool {
        match self.handles.remove(&entity) {
            Some(handle) => self.grid.destroy_proxy(handle).is_some(),
            None => false,
        }
    }

    pub fn handle(&self, entity: Entity) -> Option<ProxyHandle> {
        self.handles.get(&entity).copied()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.handles.contains_key(&entity)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Append every indexed entity anchored inside `rect`.
    pub fn entities_in_rect(&self, rect: Rect, out: &mut Vec<Entity>) {
        self.grid.collect_in_rect(rect, out);
    }

    /// Append every indexed entity strictly within `radius` of `center`.
    pub fn entities_in_radius(&self, center: Vec2, radius: f32, out: &mut Vec<Entity>) {
        self.grid.map_over_all_objects_in_locality(center, radius, |_, entity, _| out.push(*entity));
    }
}

// ============================================================================
// Navigation & Ordering
// ============================================================================

#[derive(Resource, Default)]
pub struct SceneNav(pub NavGrid);

#[derive(Resource, Default)]
pub struct SceneDepth(pub DepthSorter<Entity>);

/// Set when collision geometry changed; terrain is rebuilt once per frame at most.
#[derive(Resource, Default)]
pub struct TerrainDirty(pub bool);

// ============================================================================
// Visibility
// ============================================================================

/// World rectangle currently on screen.
#[derive(Resource, Debug, Clone, Copy)]
pub struct ActiveRegion(pub Rect);

impl Default for ActiveRegion {
    fn default() -> Self {
        Self(SceneConfig::default().world_rect())
    }
}

/// Active entities in draw order, back to front.
#[derive(Resource, Debug, Default)]
pub struct VisibleOrder(pub Vec<Entity>);

/// Where [`ScenePlugin`](super::ScenePlugin) reads its config from.
#[derive(Resource, Debug, Clone)]
pub struct SceneConfigPath(pub String);
