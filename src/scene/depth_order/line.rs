use bevy::prelude::*;
use std::cmp::Ordering;

/// Ground baseline of an isometric object, in world space.
///
/// Sidedness is measured in screen coordinates (y grows downwards), so a line
/// whose points compare as "above" (`-1`) is further back.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OriginLine {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl OriginLine {
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        Self { p1, p2 }
    }

    /// Anchor offsets `a`/`b` translated to `position`, raised by `elevation`.
    pub fn from_anchor(position: Vec2, a: Vec2, b: Vec2, elevation: f32) -> Self {
        let lift = Vec2::new(0.0, elevation);
        Self::new(position + a + lift, position + b + lift)
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.p1 + self.p2) * 0.5
    }

    /// Side of the infinite line through `p1`/`p2` that `point` lies on:
    /// `-1`, `0` (collinear) or `1`. Vertical lines compare by x.
    pub fn side_of(&self, point: Vec2) -> i32 {
        if self.p1.x == self.p2.x {
            return match point.x.partial_cmp(&self.p1.x) {
                Some(Ordering::Less) => -1,
                Some(Ordering::Greater) => 1,
                _ => 0,
            };
        }

        let cross1 = (point.y - self.p1.y) * (self.p2.x - self.p1.x);
        let cross2 = (self.p2.y - self.p1.y) * (point.x - self.p1.x);
        if cross1 == cross2 {
            0
        } else if cross1 < cross2 {
            -1
        } else {
            1
        }
    }

    /// Relative placement of `other` with respect to this line.
    ///
    /// Each line is tested against the other's endpoints. A test only counts
    /// when both endpoints fall on the same side. If both tests count and
    /// agree, or only one counts, that verdict wins. Otherwise the midpoint
    /// heights decide ([`compare_centers`](Self::compare_centers)).
    pub fn compare(&self, other: &OriginLine) -> i32 {
        let comp1 = self.side_of(other.p1);
        let one_vs_two = (comp1 == self.side_of(other.p2)).then_some(comp1);

        let comp2 = other.side_of(self.p1);
        let two_vs_one = (comp2 == other.side_of(self.p2)).then_some(-comp2);

        match (one_vs_two, two_vs_one) {
            (Some(a), Some(b)) if a == b => a,
            (Some(_), Some(_)) => self.compare_centers(other),
            (Some(a), None) | (None, Some(a)) => a,
            (None, None) => self.compare_centers(other),
        }
    }

    /// Midpoint height of `other` minus ours, truncated toward zero.
    /// Sub-unit differences therefore compare as equal.
    pub fn compare_centers(&self, other: &OriginLine) -> i32 {
        let h1 = (self.p1.y + self.p2.y) / 2.0;
        let h2 = (other.p1.y + other.p2.y) / 2.0;
        (h2 - h1) as i32
    }
}
