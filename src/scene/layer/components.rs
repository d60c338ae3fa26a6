/// Component definitions for the object layer.
///
/// Everything the scene cores need is extracted from these: anchor points for
/// the spatial index, sprite extents and baselines for depth ordering,
/// collision polygons for terrain.

use bevy::prelude::*;
use std::collections::VecDeque;
use crate::scene::depth_order::OriginLine;

// ============================================================================
// Placement
// ============================================================================

/// World-space anchor point of a scene object. This is what gets indexed.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct ScenePosition(pub Vec2);

/// Sprite extent relative to [`ScenePosition`].
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SceneBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl SceneBounds {
    /// Sprite of `size` whose origin pixel sits at `origin` inside it.
    pub fn from_sprite(size: Vec2, origin: Vec2) -> Self {
        Self { min: -origin, max: size - origin }
    }

    pub fn world_box(&self, position: Vec2) -> Rect {
        Rect::from_corners(position + self.min, position + self.max)
    }
}

/// Isometric ground baseline, as offsets from [`ScenePosition`].
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct IsoAnchor {
    pub a: Vec2,
    pub b: Vec2,
    pub elevation: f32,
}

impl IsoAnchor {
    pub fn origin(&self, position: Vec2) -> OriginLine {
        OriginLine::from_anchor(position, self.a, self.b, self.elevation)
    }
}

/// Blocking footprint, as a polygon relative to [`ScenePosition`].
#[derive(Component, Debug, Clone, Default)]
pub struct CollisionShape(pub Vec<Vec2>);

// ============================================================================
// Movement
// ============================================================================

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Body {
    pub velocity: Vec2,
}

/// Remaining waypoints (cells), front first.
#[derive(Component, Debug, Clone, Default)]
pub struct NavPath(pub VecDeque<IVec2>);

/// Object being dragged in an editor. Depth-sorted with the active set but
/// kept out of the index and the terrain until the marker is removed.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct DropPreview;
