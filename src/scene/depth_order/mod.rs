//! Isometric draw ordering.
//!
//! Objects whose bounding boxes overlap are compared through their ground
//! baselines ([`OriginLine`]); the "behind" relation becomes a back-edge and
//! each object's depth is the longest back-chain below it. Sorting by depth
//! yields a painter's order.
//!
//! Overlap relations are not guaranteed to be acyclic (three mutually crossing
//! diagonals are the classic case). A cycle is broken where the traversal
//! re-enters an object still being evaluated: that edge contributes depth 0.
//! The result is plausible rather than unique for such configurations.

use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use smallvec::SmallVec;

mod line;

pub use line::OriginLine;

/// One candidate of the current frame. Pooled and reused across frames.
#[derive(Clone, Debug)]
pub struct IsoObject<K> {
    pub key: K,
    pub bbox: Rect,
    pub origin: OriginLine,
    /// 0 until assigned.
    depth: i32,
    /// Pool indices of objects drawn before this one.
    back: SmallVec<[u32; 4]>,
}

impl<K> IsoObject<K> {
    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn back(&self) -> &[u32] {
        &self.back
    }
}

/// Traversal frame of the iterative depth walk.
struct Frame {
    node: u32,
    next_child: usize,
    acc: i32,
}

/// Inclusive box overlap; touching edges count.
pub fn boxes_overlap(a: &Rect, b: &Rect) -> bool {
    !(a.max.x < b.min.x || b.max.x < a.min.x || a.max.y < b.min.y || b.max.y < a.min.y)
}

/// Per-frame painter's-order sorter over caller keys.
///
/// Usage per frame: [`begin_frame`](Self::begin_frame), one
/// [`push`](Self::push) per candidate, then [`sort`](Self::sort). The pool
/// only ever grows, so steady-state frames do not allocate.
pub struct DepthSorter<K> {
    pool: Vec<IsoObject<K>>,
    len: usize,
    order: Vec<u32>,
    sorted: Vec<K>,
    on_stack: FixedBitSet,
    done: FixedBitSet,
    stack: Vec<Frame>,
    edge_count: usize,
    cycle_breaks: usize,
}

impl<K> Default for DepthSorter<K> {
    fn default() -> Self {
        Self {
            pool: Vec::new(),
            len: 0,
            order: Vec::new(),
            sorted: Vec::new(),
            on_stack: FixedBitSet::new(),
            done: FixedBitSet::new(),
            stack: Vec::new(),
            edge_count: 0,
            cycle_breaks: 0,
        }
    }
}

impl<K: Copy> DepthSorter<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate the previous frame's candidates. Pool storage is kept.
    pub fn begin_frame(&mut self) {
        self.len = 0;
        self.order.clear();
        self.sorted.clear();
        self.edge_count = 0;
        self.cycle_breaks = 0;
    }

    /// Add a candidate; returns its pool index for this frame.
    pub fn push(&mut self, key: K, bbox: Rect, origin: OriginLine) -> usize {
        let idx = self.len;
        if let Some(slot) = self.pool.get_mut(idx) {
            slot.key = key;
            slot.bbox = bbox;
            slot.origin = origin;
            slot.depth = 0;
            slot.back.clear();
        } else {
            self.pool.push(IsoObject {
                key,
                bbox,
                origin,
                depth: 0,
                back: SmallVec::new(),
            });
        }
        self.len += 1;
        idx
    }

    /// Build back-edges, assign depths and return keys in draw order
    /// (ascending depth, stable with respect to push order).
    pub fn sort(&mut self) -> &[K] {
        self.build_edges();
        self.assign_depths();

        self.order.clear();
        self.order.extend(0..self.len as u32);
        let pool = &self.pool;
        self.order.sort_by_key(|&idx| pool[idx as usize].depth);

        self.sorted.clear();
        self.sorted.extend(self.order.iter().map(|&idx| self.pool[idx as usize].key));

        if self.cycle_breaks > 0 {
            debug!(
                "[DEPTH] {} objects, {} edges, {} cycle(s) broken",
                self.len, self.edge_count, self.cycle_breaks
            );
        }
        &self.sorted
    }

    /// Keys in draw order from the last `sort`.
    pub fn ordered(&self) -> &[K] {
        &self.sorted
    }

    /// Candidates of the current frame, in push order.
    pub fn objects(&self) -> &[IsoObject<K>] {
        &self.pool[..self.len]
    }

    pub fn depth_of(&self, index: usize) -> Option<i32> {
        self.objects().get(index).map(IsoObject::depth)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pool size, which never shrinks.
    pub fn capacity(&self) -> usize {
        self.pool.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn cycle_breaks(&self) -> usize {
        self.cycle_breaks
    }

    /// Pairwise pass over overlapping candidates. For each pair `i < j`,
    /// `j` goes behind `i` unless its baseline compares strictly below.
    pub(crate) fn build_edges(&mut self) {
        let objects = &mut self.pool[..self.len];
        for i in 0..objects.len() {
            for j in (i + 1)..objects.len() {
                if !boxes_overlap(&objects[i].bbox, &objects[j].bbox) {
                    continue;
                }
                if objects[j].origin.compare(&objects[i].origin) >= 0 {
                    objects[i].back.push(j as u32);
                } else {
                    objects[j].back.push(i as u32);
                }
                self.edge_count += 1;
            }
        }
    }

    /// `depth = 1 + max(depth of back objects)`, 1 for objects with nothing
    /// behind them. Iterative three-colour DFS: unvisited, on the stack, done.
    /// Reaching an object that is still on the stack contributes 0.
    pub(crate) fn assign_depths(&mut self) {
        self.on_stack.clear();
        self.on_stack.grow(self.len);
        self.done.clear();
        self.done.grow(self.len);

        for root in 0..self.len {
            if self.done.contains(root) {
                continue;
            }
            self.stack.clear();
            self.stack.push(Frame { node: root as u32, next_child: 0, acc: 0 });
            self.on_stack.insert(root);

            while let Some(frame) = self.stack.last_mut() {
                let node = frame.node as usize;
                let Some(&child) = self.pool[node].back.get(frame.next_child) else {
                    let depth = frame.acc + 1;
                    self.pool[node].depth = depth;
                    self.on_stack.set(node, false);
                    self.done.insert(node);
                    self.stack.pop();
                    if let Some(parent) = self.stack.last_mut() {
                        parent.acc = parent.acc.max(depth);
                        parent.next_child += 1;
                    }
                    continue;
                };

                let child = child as usize;
                if self.done.contains(child) {
                    frame.acc = frame.acc.max(self.pool[child].depth);
                    frame.next_child += 1;
                } else if self.on_stack.contains(child) {
                    // Cycle: this edge contributes nothing
                    self.cycle_breaks += 1;
                    frame.next_child += 1;
                } else {
                    self.on_stack.insert(child);
                    self.stack.push(Frame { node: child as u32, next_child: 0, acc: 0 });
                }
            }
        }
    }
}
