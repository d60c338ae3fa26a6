use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::scene::error::SceneError;
use crate::scene::spatial_hash::MAX_DIVISIONS;

pub const DEFAULT_CONFIG_PATH: &str = "assets/scene_config.ron";

/// Scene dimensions and agent tuning, loaded once at startup.
///
/// Changing the world or cell sizes afterwards requires
/// [`resize_scene`](crate::scene::layer::resize_scene) so both grids are
/// rebuilt and every proxy is re-inserted.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    // World
    pub world_width: f32,
    pub world_height: f32,
    /// Spatial-hash bucket size; also the margin added around the active region.
    pub tile_size: f32,

    // Navigation
    pub nav_cell_width: u32,
    pub nav_cell_height: u32,
    pub agent_speed: f32,
    pub arrival_threshold: f32,
    /// In cells. Nearby goals in plain sight skip A*.
    pub line_of_sight_shortcut_distance: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            world_width: 1024.0,
            world_height: 1024.0,
            tile_size: 64.0,
            nav_cell_width: 16,
            nav_cell_height: 16,
            agent_speed: 60.0,
            arrival_threshold: 1.0,
            line_of_sight_shortcut_distance: 100.0,
        }
    }
}

impl SceneConfig {
    pub fn from_ron_str(contents: &str) -> Result<Self, SceneError> {
        Ok(ron::from_str::<SceneConfig>(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load `path`, logging and falling back to defaults on any failure.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                info!("[CONFIG] Loaded scene config from {}", path.display());
                config
            }
            Err(e) => {
                error!("[CONFIG] Failed to load {}: {}", path.display(), e);
                error!("[CONFIG] Using default SceneConfig");
                Self::default()
            }
        }
    }

    /// Spatial-hash subdivision covering the world with `tile_size` buckets,
    /// at most [`MAX_DIVISIONS`] per axis.
    pub fn spatial_divisions(&self) -> UVec2 {
        let tile = self.tile_size.max(1.0);
        let max = MAX_DIVISIONS as f32;
        UVec2::new(
            (self.world_width / tile).ceil().clamp(1.0, max) as u32,
            (self.world_height / tile).ceil().clamp(1.0, max) as u32,
        )
    }

    pub fn world_rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.world_width, self.world_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = SceneConfig::from_ron_str("(world_width: 2048.0, agent_speed: 90.0)").unwrap();
        assert_eq!(config.world_width, 2048.0);
        assert_eq!(config.agent_speed, 90.0);
        assert_eq!(config.world_height, 1024.0);
        assert_eq!(config.nav_cell_width, 16);
    }

    #[test]
    fn test_bad_ron_is_a_parse_error() {
        let err = SceneConfig::from_ron_str("(world_width: \"wide\")").unwrap_err();
        assert!(matches!(err, SceneError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_falls_back() {
        assert!(matches!(SceneConfig::load("does/not/exist.ron"), Err(SceneError::Io(_))));
        assert_eq!(SceneConfig::load_or_default("does/not/exist.ron"), SceneConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let config = SceneConfig { tile_size: 32.0, ..Default::default() };
        let json = serde_json::to_string(&config).unwrap();
        let back: SceneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_spatial_divisions() {
        let config = SceneConfig { world_width: 1000.0, ..Default::default() };
        assert_eq!(config.spatial_divisions(), UVec2::new(16, 16));

        let fine = SceneConfig { world_width: 1.0e7, tile_size: 0.001, ..Default::default() };
        assert_eq!(fine.spatial_divisions(), UVec2::new(MAX_DIVISIONS, 1024));
    }

    #[test]
    fn test_bundled_config_parses() {
        let config = SceneConfig::load(DEFAULT_CONFIG_PATH).unwrap();
        assert!(config.world_width > 0.0);
        assert!(config.nav_cell_width > 0);
    }
}
