use bevy::prelude::*;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

mod astar;
mod movement;
mod path;
mod snapshot;
mod terrain;
#[cfg(test)]
mod tests;

pub use astar::heuristic;
pub use path::refine_path;
pub use snapshot::{load_terrain, save_terrain, TerrainSnapshot, TERRAIN_SNAPSHOT_VERSION};

bitflags! {
    /// Per-cell terrain bits. Independently combinable.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TerrainFlags: u8 {
        const BLOCKED = 1 << 0;
        const SLOW    = 1 << 1;
        const FAST    = 1 << 2;
        const DANGER  = 1 << 3;
    }
}

impl TerrainFlags {
    /// Movement cost factor for a cell with these flags.
    ///
    /// Base 1.0, ×3 when slow, ×0.5 when fast, +10 when dangerous,
    /// infinite when blocked.
    pub fn cost(self) -> f32 {
        if self.contains(Self::BLOCKED) {
            return f32::INFINITY;
        }
        let mut base = 1.0;
        if self.contains(Self::SLOW) {
            base *= 3.0;
        }
        if self.contains(Self::FAST) {
            base *= 0.5;
        }
        if self.contains(Self::DANGER) {
            base += 10.0;
        }
        base
    }
}

/// Largest grid [`NavGrid::resize`] will allocate.
pub const MAX_GRID_CELLS: usize = 4096 * 4096;

/// Number of cells in a `size.x` by `size.y` grid, `None` when a side is
/// negative or the total exceeds [`MAX_GRID_CELLS`].
pub(crate) fn cell_count(size: IVec2) -> Option<usize> {
    let w = usize::try_from(size.x).ok()?;
    let h = usize::try_from(size.y).ok()?;
    w.checked_mul(h).filter(|&n| n <= MAX_GRID_CELLS)
}

/// Default line-of-sight shortcut range for [`NavGrid::find_waypoints`], in cells.
pub const DEFAULT_SHORTCUT_DISTANCE: f32 = 100.0;

/// Transient A* bookkeeping for one cell. Valid only while `stamp` matches
/// the grid's current search generation; anything older reads as fresh.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SearchNode {
    pub g_cost: f32,
    pub f_cost: f32,
    pub parent: Option<IVec2>,
    pub open: bool,
    pub closed: bool,
    stamp: u32,
}

impl SearchNode {
    const FRESH: Self = Self {
        g_cost: f32::INFINITY,
        f_cost: f32::INFINITY,
        parent: None,
        open: false,
        closed: false,
        stamp: 0,
    };
}

/// Terrain-cost grid with A* search.
///
/// The world rectangle `[0, world_size)` is divided into cells of
/// `cell_size` world units. Each cell stores [`TerrainFlags`]; the movement
/// cost is derived from them on demand.
///
/// # Algorithm
///
/// 1. **Terrain:** polygons are scan-converted onto the grid ([`apply_terrain`](Self::apply_terrain))
/// 2. **Search:** 8-connected A* with octile heuristic ([`find_path`](Self::find_path))
/// 3. **Post-processing:** turn-point refinement and line-of-sight smoothing
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use isoscene::scene::nav_grid::{NavGrid, TerrainFlags};
///
/// let mut nav = NavGrid::new(1024.0, 1024.0, 16, 16);
/// let wall = [
///     Vec2::new(160.0, 0.0),
///     Vec2::new(176.0, 0.0),
///     Vec2::new(176.0, 512.0),
///     Vec2::new(160.0, 512.0),
/// ];
/// nav.apply_terrain(&wall, TerrainFlags::BLOCKED, true);
/// assert!(!nav.is_walkable(10, 5));
///
/// let mut path = Vec::new();
/// assert!(nav.find_path(IVec2::new(2, 5), IVec2::new(20, 5), &mut path));
/// assert_eq!(path.last(), Some(&IVec2::new(20, 5)));
/// ```
///
/// # Reentrancy
///
/// The search buffer is owned by the grid and reused across calls, so
/// `find_path` takes `&mut self`; shared use must be serialized externally.
#[derive(Clone)]
pub struct NavGrid {
    world_size: Vec2,
    cell_size: UVec2,
    grid_size: IVec2,
    terrain: Vec<TerrainFlags>,
    nodes: Vec<SearchNode>,
    search_gen: u32,
    shortcut_distance: f32,
    changed: bool,
}

impl Default for NavGrid {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1, 1)
    }
}

impl NavGrid {
    pub fn new(world_width: f32, world_height: f32, cell_width: u32, cell_height: u32) -> Self {
        let mut nav = Self {
            world_size: Vec2::ZERO,
            cell_size: UVec2::ONE,
            grid_size: IVec2::ZERO,
            terrain: Vec::new(),
            nodes: Vec::new(),
            search_gen: 0,
            shortcut_distance: DEFAULT_SHORTCUT_DISTANCE,
            changed: false,
        };
        nav.resize(world_width, world_height, cell_width, cell_height);
        nav
    }

    /// Recompute grid dimensions and reallocate terrain and search buffers.
    /// All terrain flags are cleared. Sizes over [`MAX_GRID_CELLS`] leave an
    /// empty grid.
    pub fn resize(&mut self, world_width: f32, world_height: f32, cell_width: u32, cell_height: u32) {
        self.cell_size = UVec2::new(cell_width.max(1), cell_height.max(1));
        self.world_size = Vec2::new(world_width.max(0.0), world_height.max(0.0));
        self.grid_size = IVec2::new(
            (self.world_size.x / self.cell_size.x as f32).ceil() as i32,
            (self.world_size.y / self.cell_size.y as f32).ceil() as i32,
        );

        let len = match cell_count(self.grid_size) {
            Some(len) => len,
            None => {
                warn!(
                    "[NAV] {}x{} cells is too large, falling back to an empty grid",
                    self.grid_size.x, self.grid_size.y
                );
                self.grid_size = IVec2::ZERO;
                0
            }
        };
        self.terrain.clear();
        self.terrain.resize(len, TerrainFlags::empty());
        self.nodes.clear();
        self.nodes.resize(len, SearchNode::FRESH);
        self.search_gen = 0;
        self.changed = true;

        debug!(
            "[NAV] resized to {}x{} cells ({}x{} world units per cell)",
            self.grid_size.x, self.grid_size.y, self.cell_size.x, self.cell_size.y
        );
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.grid_size.x && y < self.grid_size.y
    }

    pub(crate) fn get_index(&self, x: i32, y: i32) -> usize {
        y as usize * self.grid_size.x as usize + x as usize
    }

    pub fn flags(&self, x: i32, y: i32) -> Option<TerrainFlags> {
        self.in_bounds(x, y).then(|| self.terrain[self.get_index(x, y)])
    }

    /// Out-of-bounds cells are never walkable.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.flags(x, y)
            .is_some_and(|flags| !flags.contains(TerrainFlags::BLOCKED))
    }

    /// Movement cost factor; infinite when blocked or out of bounds.
    pub fn cost(&self, x: i32, y: i32) -> f32 {
        self.flags(x, y).map_or(f32::INFINITY, TerrainFlags::cost)
    }

    pub fn world_to_cell(&self, pos: Vec2) -> IVec2 {
        IVec2::new(
            (pos.x / self.cell_size.x as f32).floor() as i32,
            (pos.y / self.cell_size.y as f32).floor() as i32,
        )
    }

    /// World-space centre of a cell.
    pub fn cell_to_world(&self, cell: IVec2) -> Vec2 {
        (cell.as_vec2() + Vec2::splat(0.5)) * self.cell_size.as_vec2()
    }

    pub fn world_size(&self) -> Vec2 { self.world_size }
    pub fn cell_size(&self) -> UVec2 { self.cell_size }
    pub fn grid_size(&self) -> IVec2 { self.grid_size }

    pub fn shortcut_distance(&self) -> f32 {
        self.shortcut_distance
    }

    /// Range (in cells) under which `find_waypoints` tries a straight segment first.
    pub fn set_shortcut_distance(&mut self, cells: f32) {
        self.shortcut_distance = cells.max(0.0);
    }

    /// Whether terrain changed since the last call. Resets the flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }
}
