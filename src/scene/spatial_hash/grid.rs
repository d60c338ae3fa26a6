use bevy::prelude::*;
use super::{Bin, ProxyHandle, SpatialHashGrid};

impl<T> SpatialHashGrid<T> {
    /// Bucket column/row for a coordinate, clamped to the grid. Inputs outside
    /// the region clamp to the border; callers route those to the catch-all.
    pub(crate) fn bin_coords(&self, x: f32, y: f32) -> (i32, i32) {
        let ix = ((x - self.region.min.x) / self.region.width() * self.divx as f32).floor() as i32;
        let iy = ((y - self.region.min.y) / self.region.height() * self.divy as f32).floor() as i32;
        (
            ix.clamp(0, self.divx as i32 - 1),
            iy.clamp(0, self.divy as i32 - 1),
        )
    }

    /// Linear bucket number for a point inside the region.
    pub fn bin_index(&self, x: f32, y: f32) -> usize {
        let (ix, iy) = self.bin_coords(x, y);
        (iy as u32 * self.divx + ix as u32) as usize
    }

    pub(crate) fn bin_for_location(&self, position: Vec2) -> Bin {
        // Inclusive on both edges; the far edge clamps into the last bucket.
        if !self.region.contains(position) {
            return Bin::Outside;
        }
        Bin::Cell(self.bin_index(position.x, position.y) as u32)
    }

    pub(crate) fn head(&self, bin: Bin) -> Option<u32> {
        match bin {
            Bin::Cell(i) => self.bins[i as usize],
            Bin::Outside => self.outside,
        }
    }

    fn head_mut(&mut self, bin: Bin) -> &mut Option<u32> {
        match bin {
            Bin::Cell(i) => &mut self.bins[i as usize],
            Bin::Outside => &mut self.outside,
        }
    }

    /// Relink the proxy if its position now maps to a different bucket.
    /// The first call for a detached proxy inserts it.
    pub fn update_for_new_location(&mut self, handle: ProxyHandle) {
        if let Some(idx) = self.slot_index(handle) {
            self.relocate(idx);
        }
    }

    /// Detach the proxy from whatever list holds it. Idempotent; stale or
    /// detached handles are ignored.
    pub fn remove_from_bin(&mut self, handle: ProxyHandle) {
        if let Some(idx) = self.slot_index(handle) {
            self.unlink(idx);
        }
    }

    pub(crate) fn relocate(&mut self, idx: usize) {
        let new_bin = self.bin_for_location(self.slots[idx].position);
        if self.slots[idx].bin != Some(new_bin) {
            self.unlink(idx);
            self.link(idx, new_bin);
        }
    }

    /// Push the proxy at the head of `bin`.
    fn link(&mut self, idx: usize, bin: Bin) {
        let old_head = self.head(bin);
        if let Some(h) = old_head {
            self.slots[h as usize].prev = Some(idx as u32);
        }

        let slot = &mut self.slots[idx];
        slot.prev = None;
        slot.next = old_head;
        slot.bin = Some(bin);

        *self.head_mut(bin) = Some(idx as u32);
    }

    pub(crate) fn unlink(&mut self, idx: usize) {
        let (prev, next, bin) = {
            let slot = &self.slots[idx];
            (slot.prev, slot.next, slot.bin)
        };

        if let Some(bin) = bin {
            let head = self.head_mut(bin);
            if *head == Some(idx as u32) {
                *head = next;
            }
            if let Some(p) = prev {
                self.slots[p as usize].next = next;
            }
            if let Some(n) = next {
                self.slots[n as usize].prev = prev;
            }
        }

        let slot = &mut self.slots[idx];
        slot.prev = None;
        slot.next = None;
        slot.bin = None;
    }
}
