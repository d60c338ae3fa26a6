use bevy::prelude::*;
use super::{ProxyHandle, SpatialHashGrid};

/// Inclusive bucket rectangle covered by a query.
struct BinRange {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl<T> SpatialHashGrid<T> {
    /// Visit every proxy strictly within `radius` of `center`.
    ///
    /// The callback receives the handle, the payload and the squared distance.
    /// The catch-all list is always scanned; if the circle lies entirely outside
    /// the region it is the only list scanned.
    pub fn map_over_all_objects_in_locality<F>(&self, center: Vec2, radius: f32, mut callback: F)
    where
        F: FnMut(ProxyHandle, &T, f32),
    {
        if radius.is_nan() || radius < 0.0 {
            return;
        }
        let radius_sq = radius * radius;
        let region = self.region();

        let completely_outside = center.x + radius < region.min.x
            || center.y + radius < region.min.y
            || center.x - radius >= region.max.x
            || center.y - radius >= region.max.y;

        self.traverse_within(self.outside, center, radius_sq, &mut callback);
        if completely_outside {
            return;
        }

        let range = self.bin_range(center - Vec2::splat(radius), center + Vec2::splat(radius));
        for row in range.min_y..=range.max_y {
            let line = row as usize * self.divx() as usize;
            for col in range.min_x..=range.max_x {
                self.traverse_within(self.bins[line + col as usize], center, radius_sq, &mut callback);
            }
        }
    }

    /// Visit every proxy whose position lies inside `rect` (edges inclusive).
    pub fn map_over_all_objects_in_rect<F>(&self, rect: Rect, mut callback: F)
    where
        F: FnMut(ProxyHandle, &T),
    {
        let region = self.region();
        let overlaps = !(region.max.x < rect.min.x
            || rect.max.x < region.min.x
            || region.max.y < rect.min.y
            || rect.max.y < region.min.y);

        self.traverse_contained(self.outside, rect, &mut callback);
        if !overlaps {
            return;
        }

        let range = self.bin_range(rect.min, rect.max);
        for row in range.min_y..=range.max_y {
            let line = row as usize * self.divx() as usize;
            for col in range.min_x..=range.max_x {
                self.traverse_contained(self.bins[line + col as usize], rect, &mut callback);
            }
        }
    }

    /// Handles of every proxy within `radius` of `center`.
    ///
    /// Populates `out` instead of allocating; clears it first.
    pub fn query_radius(&self, center: Vec2, radius: f32, out: &mut Vec<ProxyHandle>) {
        out.clear();
        self.map_over_all_objects_in_locality(center, radius, |handle, _, _| out.push(handle));
    }

    /// Payloads of every proxy inside `rect`, appended to `out`.
    pub fn collect_in_rect(&self, rect: Rect, out: &mut Vec<T>)
    where
        T: Clone,
    {
        self.map_over_all_objects_in_rect(rect, |_, payload| out.push(payload.clone()));
    }

    fn bin_range(&self, min: Vec2, max: Vec2) -> BinRange {
        let (min_x, min_y) = self.bin_coords(min.x, min.y);
        let (max_x, max_y) = self.bin_coords(max.x, max.y);
        BinRange { min_x, min_y, max_x, max_y }
    }

    fn traverse_within<F>(&self, mut cursor: Option<u32>, center: Vec2, radius_sq: f32, callback: &mut F)
    where
        F: FnMut(ProxyHandle, &T, f32),
    {
        while let Some(idx) = cursor {
            let slot = &self.slots[idx as usize];
            let distance_sq = center.distance_squared(slot.position);
            if distance_sq < radius_sq {
                if let Some(payload) = &slot.payload {
                    callback(ProxyHandle { index: idx, generation: slot.generation }, payload, distance_sq);
                }
            }
            cursor = slot.next;
        }
    }

    fn traverse_contained<F>(&self, mut cursor: Option<u32>, rect: Rect, callback: &mut F)
    where
        F: FnMut(ProxyHandle, &T),
    {
        while let Some(idx) = cursor {
            let slot = &self.slots[idx as usize];
            if rect.contains(slot.position) {
                if let Some(payload) = &slot.payload {
                    callback(ProxyHandle { index: idx, generation: slot.generation }, payload);
                }
            }
            cursor = slot.next;
        }
    }
}
