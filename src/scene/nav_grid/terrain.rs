use bevy::prelude::*;
use super::{NavGrid, TerrainFlags};

/// Debug-image colour of a blocked cell before tinting.
const BLOCKED_COLOR: [u8; 4] = [230, 41, 55, 255];
const TINT: u8 = 200;

impl NavGrid {
    /// Scanline-fill a world-space polygon onto the grid.
    ///
    /// For each covered row the polygon edges are intersected with the row's
    /// horizontal midline; sorted crossings are paired even-odd and every cell
    /// column between a pair gets `flag` OR-ed in (`add`) or masked out.
    /// Polygons with fewer than three points are ignored.
    pub fn apply_terrain(&mut self, poly: &[Vec2], flag: TerrainFlags, add: bool) {
        if poly.len() < 3 {
            debug!("[NAV] ignoring degenerate terrain polygon ({} points)", poly.len());
            return;
        }
        self.changed = true;

        let cell = self.cell_size.as_vec2();
        let (min_y, max_y) = poly
            .iter()
            .fold((poly[0].y, poly[0].y), |(lo, hi), p| (lo.min(p.y), hi.max(p.y)));

        let min_row = ((min_y / cell.y).floor() as i32).max(0);
        let max_row = ((max_y / cell.y).floor() as i32).min(self.grid_size.y - 1);

        let mut crossings: Vec<f32> = Vec::with_capacity(poly.len());
        for row in min_row..=max_row {
            let scan_y = row as f32 * cell.y + 0.5 * cell.y;

            crossings.clear();
            let mut j = poly.len() - 1;
            for i in 0..poly.len() {
                let (p1, p2) = (poly[i], poly[j]);
                if (p1.y <= scan_y && p2.y > scan_y) || (p2.y <= scan_y && p1.y > scan_y) {
                    crossings.push(p1.x + (scan_y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y));
                }
                j = i;
            }
            crossings.sort_unstable_by(f32::total_cmp);

            for span in crossings.chunks_exact(2) {
                let start_col = ((span[0] / cell.x).floor() as i32).max(0);
                let end_col = ((span[1] / cell.x).floor() as i32).min(self.grid_size.x - 1);
                for col in start_col..=end_col {
                    let idx = self.get_index(col, row);
                    self.terrain[idx].set(flag, add);
                }
            }
        }
    }

    /// Clear every flag without resizing.
    pub fn reset_terrain(&mut self) {
        self.terrain.fill(TerrainFlags::empty());
        self.changed = true;
    }

    /// RGBA8 image (row-major, one pixel per cell) highlighting blocked cells.
    ///
    /// Blocked cells are red, with green added for fast, blue for slow and
    /// extra red for danger. Everything else is transparent.
    pub fn debug_colors(&self) -> Vec<[u8; 4]> {
        self.terrain
            .iter()
            .map(|flags| {
                if !flags.contains(TerrainFlags::BLOCKED) {
                    return [0; 4];
                }
                let mut color = BLOCKED_COLOR;
                if flags.contains(TerrainFlags::FAST) {
                    color[1] = color[1].saturating_add(TINT);
                }
                if flags.contains(TerrainFlags::SLOW) {
                    color[2] = color[2].saturating_add(TINT);
                }
                if flags.contains(TerrainFlags::DANGER) {
                    color[0] = color[0].saturating_add(TINT);
                }
                color
            })
            .collect()
    }
}
