//! Collision tests for circles, boxes and segment chains
//!
//! Everything the levels need: plain and wrap-aware circle overlap, the
//! padded head-vs-torso test from the mount, and nearest-point queries over
//! worm segments.

use glam::Vec2;

use crate::wrap_distance;

/// Vertical extent of a box, top < bottom in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub top: f32,
    pub bottom: f32,
}

impl Band {
    pub fn new(top: f32, bottom: f32) -> Self {
        Self {
            top: top.min(bottom),
            bottom: top.max(bottom),
        }
    }

    /// Does [center - radius, center + radius] overlap the band?
    pub fn overlaps_span(&self, center: f32, radius: f32) -> bool {
        center + radius > self.top && center - radius < self.bottom
    }
}

/// Circle overlap on a torus
#[inline]
pub fn circles_overlap_wrapped(a: Vec2, ra: f32, b: Vec2, rb: f32, world: Vec2) -> bool {
    wrap_distance(a, b, world) < ra + rb
}

/// Head-vs-player contact
///
/// Horizontally the head circle is padded by half the player's width;
/// vertically only the torso band counts, so grazing the feet or the top of
/// the head is survivable.
pub fn head_hits_torso(head: Vec2, head_radius: f32, player_x: f32, half_width: f32, torso: Band) -> bool {
    (head.x - player_x).abs() < head_radius + half_width && torso.overlaps_span(head.y, head_radius)
}

/// Index and distance of the point closest to `target`
pub fn nearest<I>(points: I, target: Vec2) -> Option<(usize, f32)>
where
    I: IntoIterator<Item = (usize, Vec2)>,
{
    points
        .into_iter()
        .map(|(i, p)| (i, p.distance(target)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Count points within `radius` of `center` on a torus
pub fn count_within_wrapped<I>(points: I, center: Vec2, radius: f32, world: Vec2) -> usize
where
    I: IntoIterator<Item = Vec2>,
{
    points
        .into_iter()
        .filter(|p| wrap_distance(*p, center, world) < radius)
        .count()
}

/// Clamp a point into a rectangle inset by `margin`
#[inline]
pub fn clamp_to_bounds(p: Vec2, size: Vec2, margin: f32) -> Vec2 {
    let min = Vec2::splat(margin);
    let max = (size - Vec2::splat(margin)).max(min);
    p.clamp(min, max)
}
