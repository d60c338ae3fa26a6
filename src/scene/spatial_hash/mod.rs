use bevy::prelude::*;

mod grid;
mod query;

/// Generation-checked handle to a proxy owned by a [`SpatialHashGrid`].
///
/// Handles stay cheap to copy and never dangle: once a proxy is destroyed its
/// slot generation is bumped and every outstanding handle to it goes stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProxyHandle {
    index: u32,
    generation: u32,
}

impl ProxyHandle {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Which bucket list a proxy is linked into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Bin {
    Cell(u32),
    /// Catch-all list for positions outside the indexed region.
    Outside,
}

pub(crate) struct ProxySlot<T> {
    generation: u32,
    /// `None` while the slot sits on the free list.
    payload: Option<T>,
    position: Vec2,
    prev: Option<u32>,
    next: Option<u32>,
    /// `None` iff the proxy is detached.
    bin: Option<Bin>,
}

/// Per-axis bucket limit. Keeps the bucket count addressable by `u32`.
pub const MAX_DIVISIONS: u32 = 4096;

/// Uniform-grid proximity index over point-located proxies.
///
/// The indexed `region` is split into `divx × divy` buckets. Each bucket is a
/// doubly linked list threaded through the proxy slots by index, so moving a
/// proxy between buckets is two O(1) splices and never allocates. Positions
/// outside the region go to a catch-all list that every query scans.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use isoscene::scene::spatial_hash::SpatialHashGrid;
///
/// let mut grid = SpatialHashGrid::new(Rect::new(0.0, 0.0, 256.0, 256.0), 4, 4);
///
/// let a = grid.create_proxy(Vec2::new(10.0, 10.0), "a");
/// grid.update_for_new_location(a);
///
/// let mut hits = Vec::new();
/// grid.map_over_all_objects_in_locality(Vec2::new(12.0, 12.0), 5.0, |_, name, _| hits.push(*name));
/// assert_eq!(hits, vec!["a"]);
/// ```
///
/// # Performance
///
/// - **Relocate / remove:** O(1), no allocation
/// - **Query:** O(k) where k = proxies in the covered buckets plus the catch-all list
/// - **Init:** O(bins + proxies); all membership is dropped
///
/// # Caller contract
///
/// Call [`update_for_new_location`](Self::update_for_new_location) after every
/// position change (the first call inserts) and
/// [`remove_from_bin`](Self::remove_from_bin) or
/// [`destroy_proxy`](Self::destroy_proxy) before the owner goes away. The grid is
/// not reentrant: mutation and queries must be serialized by the caller.
pub struct SpatialHashGrid<T> {
    region: Rect,
    divx: u32,
    divy: u32,
    bins: Vec<Option<u32>>,
    outside: Option<u32>,
    slots: Vec<ProxySlot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> SpatialHashGrid<T> {
    pub fn new(region: Rect, divx: u32, divy: u32) -> Self {
        let mut grid = Self {
            region,
            divx: 0,
            divy: 0,
            bins: Vec::new(),
            outside: None,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        };
        grid.init(region, divx, divy);
        grid
    }

    /// Reallocate the bucket array for a new region and subdivision.
    ///
    /// Every live proxy is detached; call [`reinsert_all`](Self::reinsert_all)
    /// or `update_for_new_location` per proxy to index them again.
    ///
    /// Each axis is clamped to `1..=MAX_DIVISIONS`.
    pub fn init(&mut self, region: Rect, divx: u32, divy: u32) {
        self.region = region;
        self.divx = divx.clamp(1, MAX_DIVISIONS);
        self.divy = divy.clamp(1, MAX_DIVISIONS);
        if (self.divx, self.divy) != (divx, divy) {
            warn!(
                "[SPATIAL] {}x{} bins requested, clamped to {}x{}",
                divx, divy, self.divx, self.divy
            );
        }
        self.bins.clear();
        self.bins.resize(self.divx as usize * self.divy as usize, None);
        self.outside = None;

        for slot in &mut self.slots {
            slot.prev = None;
            slot.next = None;
            slot.bin = None;
        }

        debug!(
            "[SPATIAL] init {}x{} bins over ({:.1}, {:.1})-({:.1}, {:.1}), {} proxies detached",
            self.divx, self.divy, region.min.x, region.min.y, region.max.x, region.max.y, self.live
        );
    }

    /// Allocate a detached proxy. It is not visible to queries until
    /// `update_for_new_location` links it into a bucket.
    pub fn create_proxy(&mut self, position: Vec2, payload: T) -> ProxyHandle {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.payload = Some(payload);
            slot.position = position;
            return ProxyHandle { index, generation: slot.generation };
        }

        let index = self.slots.len() as u32;
        self.slots.push(ProxySlot {
            generation: 0,
            payload: Some(payload),
            position,
            prev: None,
            next: None,
            bin: None,
        });
        ProxyHandle { index, generation: 0 }
    }

    /// Unlink and free a proxy, returning its payload. Stale handles yield `None`.
    pub fn destroy_proxy(&mut self, handle: ProxyHandle) -> Option<T> {
        let idx = self.slot_index(handle)?;
        self.unlink(idx);
        let slot = &mut self.slots[idx];
        let payload = slot.payload.take();
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(idx as u32);
        self.live -= 1;
        payload
    }

    /// Store a new position without relinking. Pair with `update_for_new_location`.
    pub fn set_position(&mut self, handle: ProxyHandle, position: Vec2) {
        if let Some(idx) = self.slot_index(handle) {
            self.slots[idx].position = position;
        }
    }

    /// Convenience for `set_position` followed by `update_for_new_location`.
    pub fn move_to(&mut self, handle: ProxyHandle, position: Vec2) {
        if let Some(idx) = self.slot_index(handle) {
            self.slots[idx].position = position;
            self.relocate(idx);
        }
    }

    pub fn position(&self, handle: ProxyHandle) -> Option<Vec2> {
        self.slot_index(handle).map(|idx| self.slots[idx].position)
    }

    pub fn payload(&self, handle: ProxyHandle) -> Option<&T> {
        self.slot_index(handle).and_then(|idx| self.slots[idx].payload.as_ref())
    }

    pub fn payload_mut(&mut self, handle: ProxyHandle) -> Option<&mut T> {
        self.slot_index(handle).and_then(|idx| self.slots[idx].payload.as_mut())
    }

    pub fn is_attached(&self, handle: ProxyHandle) -> bool {
        self.slot_index(handle).is_some_and(|idx| self.slots[idx].bin.is_some())
    }

    /// Whether the proxy currently sits in the catch-all list.
    pub fn is_outside(&self, handle: ProxyHandle) -> bool {
        self.slot_index(handle)
            .is_some_and(|idx| self.slots[idx].bin == Some(Bin::Outside))
    }

    /// Link every live proxy at its stored position. Used after `init`.
    pub fn reinsert_all(&mut self) {
        for idx in 0..self.slots.len() {
            if self.slots[idx].payload.is_some() {
                self.relocate(idx);
            }
        }
    }

    /// Handles of every live proxy, attached or not.
    pub fn handles(&self) -> impl Iterator<Item = ProxyHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(idx, slot)| {
            slot.payload.as_ref().map(|_| ProxyHandle {
                index: idx as u32,
                generation: slot.generation,
            })
        })
    }

    /// Number of live proxies (attached or detached).
    pub fn proxy_count(&self) -> usize {
        self.live
    }

    /// Number of proxies linked into any list, including the catch-all.
    /// Useful for debugging and diagnostics.
    pub fn attached_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.bin.is_some()).count()
    }

    /// Number of proxies in the catch-all list.
    pub fn outside_count(&self) -> usize {
        self.list_len(self.outside)
    }

    /// Number of non-empty buckets (the catch-all list is not counted).
    pub fn non_empty_bins(&self) -> usize {
        self.bins.iter().filter(|head| head.is_some()).count()
    }

    // Getters for grid parameters
    pub fn region(&self) -> Rect { self.region }
    pub fn divx(&self) -> u32 { self.divx }
    pub fn divy(&self) -> u32 { self.divy }

    pub(crate) fn slot_index(&self, handle: ProxyHandle) -> Option<usize> {
        let idx = handle.index as usize;
        let slot = self.slots.get(idx)?;
        (slot.generation == handle.generation && slot.payload.is_some()).then_some(idx)
    }

    fn list_len(&self, mut cursor: Option<u32>) -> usize {
        let mut count = 0;
        while let Some(idx) = cursor {
            count += 1;
            cursor = self.slots[idx as usize].next;
        }
        count
    }
}
