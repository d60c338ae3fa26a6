use bevy::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::f32::consts::SQRT_2;
use super::{NavGrid, SearchNode};

/// Neighbour offsets: four cardinals first, then the diagonals.
const DX: [i32; 8] = [-1, 1, 0, 0, -1, -1, 1, 1];
const DY: [i32; 8] = [0, 0, -1, 1, -1, 1, -1, 1];
const CARDINALS: usize = 4;

/// Octile distance between two cells.
pub fn heuristic(a: IVec2, b: IVec2) -> f32 {
    let d = (a.as_vec2() - b.as_vec2()).abs();
    (d.x + d.y) + (SQRT_2 - 2.0) * d.x.min(d.y)
}

/// Open-set entry. Ordered so the smallest `f_cost` pops first from the max-heap.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f_cost: f32,
    cell: IVec2,
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f_cost.total_cmp(&self.f_cost)
            .then_with(|| self.cell.x.cmp(&other.cell.x))
            .then_with(|| self.cell.y.cmp(&other.cell.y))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl NavGrid {
    /// Grid A* from `start` to `end`, written to `out_path` (start first).
    ///
    /// Returns `true` with the full path when the goal is reached, and `true`
    /// with a best-effort path to the explored cell closest to the goal (by
    /// heuristic) when it is not. Returns `false` only when `start` lies
    /// outside the grid; `out_path` is then empty.
    ///
    /// Diagonal steps may cut past blocked corners; only the destination cell
    /// has to be walkable.
    pub fn find_path(&mut self, start: IVec2, end: IVec2, out_path: &mut Vec<IVec2>) -> bool {
        out_path.clear();

        if !self.in_bounds(start.x, start.y) {
            debug!("[NAV] find_path: start {:?} outside the {:?} grid", start, self.grid_size);
            return false;
        }
        if start == end {
            out_path.push(start);
            return true;
        }

        self.begin_search();

        let start_idx = self.get_index(start.x, start.y);
        let f_start = heuristic(start, end);
        {
            let node = self.node_mut(start_idx);
            node.g_cost = 0.0;
            node.f_cost = f_start;
            node.open = true;
        }

        let mut open_set = BinaryHeap::new();
        open_set.push(OpenEntry { f_cost: f_start, cell: start });

        let mut best: Option<IVec2> = None;
        let mut best_dist = f32::MAX;

        while let Some(OpenEntry { cell: current, .. }) = open_set.pop() {
            let current_idx = self.get_index(current.x, current.y);
            let g_current = {
                let node = self.node_mut(current_idx);
                // Superseded duplicate of an already expanded cell
                if node.closed {
                    continue;
                }
                node.closed = true;
                node.g_cost
            };

            let dist_to_goal = heuristic(current, end);
            if dist_to_goal < best_dist {
                best_dist = dist_to_goal;
                best = Some(current);
            }

            if current == end {
                self.reconstruct_path(end, out_path);
                return true;
            }

            for d in 0..DX.len() {
                let next = IVec2::new(current.x + DX[d], current.y + DY[d]);
                if !self.is_walkable(next.x, next.y) {
                    continue;
                }

                let weight = if d < CARDINALS { 1.0 } else { SQRT_2 };
                let move_cost = g_current + self.cost(next.x, next.y) * weight;
                let next_idx = self.get_index(next.x, next.y);
                let neighbor = self.node_mut(next_idx);
                if neighbor.closed {
                    continue;
                }

                if !neighbor.open || move_cost < neighbor.g_cost {
                    neighbor.g_cost = move_cost;
                    neighbor.f_cost = move_cost + heuristic(next, end);
                    neighbor.parent = Some(current);
                    neighbor.open = true;
                    let f_cost = neighbor.f_cost;
                    open_set.push(OpenEntry { f_cost, cell: next });
                }
            }
        }

        match best {
            Some(best) => {
                debug!(
                    "[NAV] goal {:?} unreachable from {:?}, falling back to closest cell {:?}",
                    end, start, best
                );
                self.reconstruct_path(best, out_path);
                true
            }
            None => false,
        }
    }

    /// Start a new search generation. Nodes stamped with an older generation
    /// read as fresh, so the buffer never needs a per-cell reset.
    fn begin_search(&mut self) {
        self.search_gen = self.search_gen.wrapping_add(1);
        if self.search_gen == 0 {
            for node in &mut self.nodes {
                node.stamp = 0;
            }
            self.search_gen = 1;
        }
    }

    fn node_mut(&mut self, idx: usize) -> &mut SearchNode {
        let generation = self.search_gen;
        let node = &mut self.nodes[idx];
        if node.stamp != generation {
            *node = SearchNode { stamp: generation, ..SearchNode::FRESH };
        }
        node
    }

    fn reconstruct_path(&self, end: IVec2, out_path: &mut Vec<IVec2>) {
        out_path.clear();
        let mut current = Some(end);
        while let Some(cell) = current {
            out_path.push(cell);
            current = self.nodes[self.get_index(cell.x, cell.y)].parent;
        }
        out_path.reverse();
    }
}
