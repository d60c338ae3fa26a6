/// Scene core: spatial indexing, terrain navigation and isometric draw order.
///
/// This module is organized into:
/// - **spatial_hash**: uniform-grid proximity index over point-located proxies
/// - **nav_grid**: terrain-cost grid, polygon rasterization and A*
/// - **depth_order**: painter's-order sorting of overlapping isometric objects
/// - **layer**: bevy plugin wiring the three cores to entities
/// - **config**: RON-backed scene configuration
/// - **error**: failures at the I/O edges

pub mod config;
pub mod depth_order;
pub mod error;
pub mod layer;
pub mod nav_grid;
pub mod profiling;
pub mod spatial_hash;

pub use config::SceneConfig;
pub use error::SceneError;
pub use layer::{ScenePlugin, SceneSet};
