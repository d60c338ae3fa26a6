/// Object layer - binds scene entities to the spatial index, the navigation
/// grid and the depth sorter.
///
/// This module is organized into:
/// - **components**: placement, sprite extents, baselines, collision, movement
/// - **resources**: the three scene cores plus visibility state
/// - **events**: path requests
/// - **systems**: per-frame synchronisation

use bevy::prelude::*;
use crate::scene::config::DEFAULT_CONFIG_PATH;

// Module declarations
pub mod components;
pub mod resources;
pub mod events;
pub mod systems;

// Re-export commonly used items
pub use components::*;
pub use resources::*;
pub use events::*;
pub use systems::resize_scene;

// System sets for organizing execution order
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum SceneSet {
    Index,      // Spatial index follows entity positions
    Terrain,    // Collision shapes rasterized into the nav grid
    Navigation, // Path requests, steering, clipped movement
    Visibility  // Active set collection and depth sort
}

/// Scene plugin. Loads [`SceneConfig`](crate::scene::SceneConfig) from
/// `config_path` at startup unless the app already has one.
pub struct ScenePlugin {
    pub config_path: String,
}

impl Default for ScenePlugin {
    fn default() -> Self {
        Self { config_path: DEFAULT_CONFIG_PATH.to_string() }
    }
}

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SceneConfigPath(self.config_path.clone()));
        app.init_resource::<SceneIndex>();
        app.init_resource::<SceneNav>();
        app.init_resource::<SceneDepth>();
        app.init_resource::<TerrainDirty>();
        app.init_resource::<ActiveRegion>();
        app.init_resource::<VisibleOrder>();

        app.add_message::<PathRequest>();

        app.configure_sets(Update, (
            SceneSet::Index,
            SceneSet::Terrain,
            SceneSet::Navigation,
            SceneSet::Visibility,
        ).chain());

        app.add_systems(Startup, (
            systems::load_scene_config,
            systems::resize_scene,
        ).chain());

        app.add_systems(Update, (
            (
                systems::index_scene_objects,
                systems::remove_despawned_objects,
            ).chain().in_set(SceneSet::Index),
            (
                systems::mark_terrain_dirty,
                systems::rebuild_terrain,
            ).chain().in_set(SceneSet::Terrain),
            (
                systems::process_path_requests,
                systems::steer_bodies,
                systems::move_bodies,
            ).chain().in_set(SceneSet::Navigation),
            systems::sort_visible_objects.in_set(SceneSet::Visibility),
        ));
    }
}
