/// Object layer systems.
///
/// Per frame, in [`SceneSet`](super::SceneSet) order:
/// - keep the spatial index in sync with entity positions
/// - rebuild terrain from collision shapes when dirty
/// - answer path requests and move bodies
/// - depth-sort the active set

use bevy::diagnostic::FrameCount;
use bevy::prelude::*;
use std::collections::VecDeque;
use crate::scene::profiling::profile;
use crate::profile_log;
use crate::scene::config::SceneConfig;
use crate::scene::depth_order::OriginLine;
use crate::scene::nav_grid::TerrainFlags;

use super::components::*;
use super::events::PathRequest;
use super::resources::*;

// ============================================================================
// Startup
// ============================================================================

/// Insert [`SceneConfig`] from disk unless one was provided up front.
pub fn load_scene_config(
    mut commands: Commands,
    existing: Option<Res<SceneConfig>>,
    path: Res<SceneConfigPath>,
) {
    if existing.is_some() {
        debug!("[CONFIG] SceneConfig already present, skipping {}", path.0);
        return;
    }
    commands.insert_resource(SceneConfig::load_or_default(&path.0));
}

/// Rebuild both grids from the current [`SceneConfig`] and re-insert every
/// indexed entity. Terrain is flagged for a rebuild.
pub fn resize_scene(world: &mut World) {
    let config = world.get_resource::<SceneConfig>().cloned().unwrap_or_default();
    let divisions = config.spatial_divisions();

    if let Some(mut index) = world.get_resource_mut::<SceneIndex>() {
        index.grid.init(config.world_rect(), divisions.x, divisions.y);
        index.grid.reinsert_all();
    }
    if let Some(mut nav) = world.get_resource_mut::<SceneNav>() {
        nav.0.resize(config.world_width, config.world_height, config.nav_cell_width, config.nav_cell_height);
        nav.0.set_shortcut_distance(config.line_of_sight_shortcut_distance);
    }
    if let Some(mut dirty) = world.get_resource_mut::<TerrainDirty>() {
        dirty.0 = true;
    }

    info!(
        "[LAYER] Scene resized to {}x{} ({}x{} buckets, {}x{} nav cells)",
        config.world_width, config.world_height, divisions.x, divisions.y,
        config.nav_cell_width, config.nav_cell_height
    );
}

// ============================================================================
// Index
// ============================================================================

/// Index new and moved objects. Drag previews stay out until committed.
pub fn index_scene_objects(
    mut index: ResMut<SceneIndex>,
    moved: Query<(Entity, &ScenePosition), (Changed<ScenePosition>, Without<DropPreview>)>,
    mut committed: RemovedComponents<DropPreview>,
    positions: Query<&ScenePosition, Without<DropPreview>>,
) {
    for (entity, pos) in moved.iter() {
        index.place(entity, pos.0);
    }
    for entity in committed.read() {
        if let Ok(pos) = positions.get(entity) {
            index.place(entity, pos.0);
        }
    }
}

/// Drop proxies of despawned objects and objects turned back into previews.
pub fn remove_despawned_objects(
    mut index: ResMut<SceneIndex>,
    mut removed: RemovedComponents<ScenePosition>,
    previews: Query<Entity, Added<DropPreview>>,
) {
    for entity in removed.read() {
        index.remove(entity);
    }
    for entity in previews.iter() {
        index.remove(entity);
    }
}

// ============================================================================
// Terrain
// ============================================================================

pub fn mark_terrain_dirty(
    mut dirty: ResMut<TerrainDirty>,
    changed: Query<
        (),
        (
            With<CollisionShape>,
            Without<DropPreview>,
            Or<(Changed<CollisionShape>, Changed<ScenePosition>)>,
        ),
    >,
    mut removed: RemovedComponents<CollisionShape>,
    mut committed: RemovedComponents<DropPreview>,
) {
    let removed_any = removed.read().count() > 0;
    let committed_any = committed.read().count() > 0;
    if removed_any || committed_any || !changed.is_empty() {
        dirty.0 = true;
    }
}

/// Re-rasterize every collision shape as blocked terrain, once per dirty frame.
#[profile(4)]
pub fn rebuild_terrain(
    mut dirty: ResMut<TerrainDirty>,
    mut nav: ResMut<SceneNav>,
    shapes: Query<(&ScenePosition, &CollisionShape), Without<DropPreview>>,
    mut poly: Local<Vec<Vec2>>,
) {
    if !dirty.0 {
        return;
    }
    dirty.0 = false;

    let nav = &mut nav.0;
    nav.reset_terrain();

    let mut count = 0;
    for (pos, shape) in shapes.iter() {
        poly.clear();
        poly.extend(shape.0.iter().map(|p| *p + pos.0));
        nav.apply_terrain(&poly, TerrainFlags::BLOCKED, true);
        count += 1;
    }
    debug!("[LAYER] Terrain rebuilt from {} collision shapes", count);
}

// ============================================================================
// Navigation
// ============================================================================

pub fn process_path_requests(
    mut requests: MessageReader<PathRequest>,
    mut nav: ResMut<SceneNav>,
    mut agents: Query<(&ScenePosition, Option<&mut NavPath>)>,
    mut commands: Commands,
    mut waypoints: Local<Vec<IVec2>>,
) {
    for request in requests.read() {
        let Ok((pos, path)) = agents.get_mut(request.entity) else {
            warn!("[LAYER] Path request for unknown entity {:?}", request.entity);
            continue;
        };

        let start = nav.0.world_to_cell(pos.0);
        let goal = nav.0.world_to_cell(request.target);
        if !nav.0.find_waypoints(start, goal, &mut waypoints) {
            debug!("[LAYER] No path for {:?}: start {:?} is off the grid", request.entity, start);
            waypoints.clear();
        }

        match path {
            Some(mut path) => {
                path.0.clear();
                path.0.extend(waypoints.iter().copied());
            }
            None => {
                commands
                    .entity(request.entity)
                    .insert(NavPath(waypoints.iter().copied().collect::<VecDeque<_>>()));
            }
        }
    }
}

/// Point each body's velocity at its next waypoint.
pub fn steer_bodies(
    nav: Res<SceneNav>,
    config: Res<SceneConfig>,
    mut bodies: Query<(&ScenePosition, &mut Body, &mut NavPath)>,
) {
    for (pos, mut body, mut path) in bodies.iter_mut() {
        body.velocity = nav.0.steer_along_path(&mut path.0, pos.0, config.agent_speed, config.arrival_threshold);
    }
}

/// Integrate velocities, clamped against blocked terrain.
pub fn move_bodies(
    time: Res<Time>,
    nav: Res<SceneNav>,
    mut bodies: Query<(&mut ScenePosition, &Body), Without<DropPreview>>,
) {
    let dt = time.delta_secs();
    for (mut pos, body) in bodies.iter_mut() {
        if body.velocity == Vec2::ZERO {
            continue;
        }
        let from = pos.0;
        let result = nav.0.clip_movement(from, from + body.velocity * dt);
        if result != from {
            pos.0 = result;
        }
    }
}

// ============================================================================
// Visibility
// ============================================================================

/// Collect the active set around [`ActiveRegion`], add any drag preview and
/// publish the painter's order in [`VisibleOrder`].
#[profile(2)]
pub fn sort_visible_objects(
    #[allow(unused_variables)] frame: Res<FrameCount>,
    config: Res<SceneConfig>,
    region: Res<ActiveRegion>,
    index: Res<SceneIndex>,
    mut depth: ResMut<SceneDepth>,
    mut visible: ResMut<VisibleOrder>,
    objects: Query<(&ScenePosition, Option<&SceneBounds>, Option<&IsoAnchor>)>,
    previews: Query<Entity, With<DropPreview>>,
    mut candidates: Local<Vec<Entity>>,
) {
    candidates.clear();
    // Objects are indexed by anchor only; the margin catches sprites that
    // reach into view from outside.
    index.entities_in_rect(region.0.inflate(config.tile_size), &mut candidates);
    candidates.extend(previews.iter());

    let sorter = &mut depth.0;
    sorter.begin_frame();
    for &entity in candidates.iter() {
        let Ok((pos, bounds, anchor)) = objects.get(entity) else {
            continue;
        };
        let bbox = bounds.map_or(Rect::from_center_size(pos.0, Vec2::ZERO), |b| b.world_box(pos.0));
        let origin = anchor.map_or(OriginLine::new(pos.0, pos.0), |a| a.origin(pos.0));
        sorter.push(entity, bbox, origin);
    }

    visible.0.clear();
    visible.0.extend_from_slice(sorter.sort());

    profile_log!(
        frame,
        "[DEPTH] {} visible, {} overlap edges, {} cycle breaks",
        visible.0.len(),
        sorter.edge_count(),
        sorter.cycle_breaks()
    );
}
