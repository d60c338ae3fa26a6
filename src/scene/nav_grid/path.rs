use bevy::prelude::*;
use super::{heuristic, NavGrid};

impl NavGrid {
    /// Bresenham walk from `start` to `end`; false if any visited cell
    /// (endpoints included) is not walkable.
    pub fn line_of_sight(&self, start: IVec2, end: IVec2) -> bool {
        // Both endpoints on the grid keeps the deltas small
        if !self.is_walkable(start.x, start.y) || !self.is_walkable(end.x, end.y) {
            return false;
        }

        let (mut x0, mut y0) = (start.x, start.y);
        let (x1, y1) = (end.x, end.y);

        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;

        loop {
            if !self.is_walkable(x0, y0) {
                return false;
            }
            if x0 == x1 && y0 == y1 {
                return true;
            }
            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x0 += sx;
            }
            if e2 < dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Path query used by agents: shortcut, then A*, then turn-point refinement.
    ///
    /// - `start == end` yields `[start]`
    /// - a nearby goal in plain sight yields `[start, end]`
    /// - anything else runs [`find_path`](Self::find_path) and keeps only the
    ///   turning points and the goal
    pub fn find_waypoints(&mut self, start: IVec2, end: IVec2, out_path: &mut Vec<IVec2>) -> bool {
        out_path.clear();
        if start == end {
            out_path.push(start);
            return true;
        }

        let shortcut = f64::from(self.shortcut_distance);
        if start.as_dvec2().distance_squared(end.as_dvec2()) < shortcut * shortcut
            && self.line_of_sight(start, end)
        {
            out_path.extend([start, end]);
            return true;
        }

        if !self.find_path(start, end, out_path) {
            return false;
        }
        refine_path(out_path);
        true
    }

    /// Greedy line-of-sight string pulling: from each kept point, jump to the
    /// farthest later point still in plain sight.
    pub fn smooth_path(&self, path: &mut Vec<IVec2>) {
        if path.len() < 3 {
            return;
        }

        let mut optimized = Vec::with_capacity(path.len());
        optimized.push(path[0]);

        let mut start_idx = 0;
        while start_idx + 1 < path.len() {
            let mut farthest = start_idx + 1;
            for i in (start_idx + 2)..path.len() {
                if !self.line_of_sight(path[start_idx], path[i]) {
                    break;
                }
                farthest = i;
            }
            optimized.push(path[farthest]);
            start_idx = farthest;
        }

        *path = optimized;
    }

    /// Cumulative movement cost of a cell path.
    ///
    /// Each segment costs its octile length (1 for a cardinal step, √2 for a
    /// diagonal one) times the destination cell's terrain factor.
    pub fn path_cost(&self, path: &[IVec2]) -> f32 {
        path.windows(2)
            .map(|step| heuristic(step[0], step[1]) * self.cost(step[1].x, step[1].y))
            .sum()
    }
}

/// Drop cells that continue in the same direction as the previous step,
/// keeping the start, every turning point and the goal.
pub fn refine_path(path: &mut Vec<IVec2>) {
    if path.len() < 3 {
        return;
    }

    let mut write_idx = 1;
    let mut last_dir = (path[1] - path[0]).signum();

    for i in 2..path.len() {
        let dir = (path[i] - path[i - 1]).signum();
        if dir != last_dir {
            path[write_idx] = path[i - 1];
            write_idx += 1;
            last_dir = dir;
        }
    }

    path[write_idx] = path[path.len() - 1];
    write_idx += 1;
    path.truncate(write_idx);
}
