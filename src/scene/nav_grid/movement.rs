use bevy::prelude::*;
use std::collections::VecDeque;
use super::NavGrid;

impl NavGrid {
    /// Clamp a continuous `from`→`to` move against blocked terrain.
    ///
    /// Same-cell moves are accepted iff that cell is walkable (otherwise the
    /// agent stays at `from`). Longer moves are sampled once per crossed cell
    /// along the segment; the result is the last sample before the first
    /// unwalkable cell.
    pub fn clip_movement(&self, from: Vec2, to: Vec2) -> Vec2 {
        let start = self.world_to_cell(from);
        let end = self.world_to_cell(to);
        let delta = end - start;
        let steps = delta.x.abs().max(delta.y.abs());

        if steps == 0 {
            return if self.is_walkable(end.x, end.y) { to } else { from };
        }

        let step = (to - from) / steps as f32;
        let mut probe = from;
        let mut result = from;
        for _ in 0..steps {
            probe += step;
            let cell = self.world_to_cell(probe);
            if !self.is_walkable(cell.x, cell.y) {
                break;
            }
            result = probe;
        }
        result
    }

    /// Velocity that moves an agent at `position` along `path`.
    ///
    /// The front waypoint is consumed once the agent is within `threshold` of
    /// its cell centre; returns zero when the path is exhausted.
    pub fn steer_along_path(
        &self,
        path: &mut VecDeque<IVec2>,
        position: Vec2,
        speed: f32,
        threshold: f32,
    ) -> Vec2 {
        let Some(&front) = path.front() else {
            return Vec2::ZERO;
        };

        let mut delta = self.cell_to_world(front) - position;
        if delta.length() < threshold {
            path.pop_front();
            let Some(&next) = path.front() else {
                return Vec2::ZERO;
            };
            delta = self.cell_to_world(next) - position;
        }
        delta.normalize_or_zero() * speed
    }
}
