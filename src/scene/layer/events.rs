use bevy::prelude::*;

/// Ask the layer to route `entity` towards `target` (world space).
/// The answer lands in the entity's [`NavPath`](super::NavPath).
#[derive(Message, Debug, Clone, Copy)]
pub struct PathRequest {
    pub entity: Entity,
    pub target: Vec2,
}
