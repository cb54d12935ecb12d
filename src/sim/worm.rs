//! Segmented worm body
//!
//! The head (index 0) is authoritative. The rest of the body is either
//! dragged behind it with a follow-the-leader distance constraint or laid out
//! parametrically by the level that owns it.

use glam::Vec2;

use crate::{wrap_delta, wrap_position};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub pos: Vec2,
    pub radius: f32,
    /// 0 = fully surfaced, 1 = fully under the sand
    pub submersion: f32,
}

impl Segment {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius,
            submersion: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Worm {
    pub segments: Vec<Segment>,
}

impl Worm {
    /// Straight worm with the head at `head`, body extending along `back`
    pub fn straight(head: Vec2, back: Vec2, count: usize, spacing: f32, head_radius: f32, body_radius: f32) -> Self {
        let back = back.normalize_or(Vec2::NEG_X);
        let segments = (0..count.max(1))
            .map(|i| {
                let radius = if i == 0 { head_radius } else { body_radius };
                Segment::new(head + back * spacing * i as f32, radius)
            })
            .collect();
        Self { segments }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn head(&self) -> Vec2 {
        self.segments.first().map(|s| s.pos).unwrap_or(Vec2::ZERO)
    }

    pub fn head_radius(&self) -> f32 {
        self.segments.first().map(|s| s.radius).unwrap_or(0.0)
    }

    pub fn set_head(&mut self, pos: Vec2) {
        if let Some(head) = self.segments.first_mut() {
            head.pos = pos;
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.segments.iter().map(|s| s.pos)
    }

    /// Follow-the-leader on a torus: offsets use the shortest wrapped delta
    pub fn follow_wrapped(&mut self, spacing: f32, world: Vec2) {
        for i in 1..self.segments.len() {
            let prev = self.segments[i - 1].pos;
            let offset = wrap_delta(self.segments[i].pos, prev, world);
            if offset.length() > spacing {
                let placed = prev + offset.normalize_or_zero() * spacing;
                self.segments[i].pos = wrap_position(placed, world);
            }
        }
    }

    /// Lay segments out horizontally behind the head, `spacing` apart
    pub fn place_trailing_x(&mut self, head_x: f32, spacing: f32, y_at: impl Fn(f32) -> f32) {
        for (i, seg) in self.segments.iter_mut().enumerate() {
            let x = head_x - spacing * i as f32;
            seg.pos = Vec2::new(x, y_at(x));
        }
    }

    /// Add a tail segment on top of the current tail
    pub fn grow(&mut self, max_len: usize) -> bool {
        if self.segments.len() >= max_len {
            return false;
        }
        match self.segments.last().copied() {
            Some(tail) => {
                self.segments.push(tail);
                true
            }
            None => false,
        }
    }

    /// Position at a fractional segment index, interpolated between neighbours
    pub fn point_at(&self, index: f32) -> Vec2 {
        if self.segments.is_empty() {
            return Vec2::ZERO;
        }
        let max = (self.segments.len() - 1) as f32;
        let index = index.clamp(0.0, max);
        let lo = index.floor() as usize;
        let hi = (lo + 1).min(self.segments.len() - 1);
        let t = index - lo as f32;
        self.segments[lo].pos.lerp(self.segments[hi].pos, t)
    }

    /// Submersion at a fractional index (the deeper neighbour wins)
    pub fn submersion_at(&self, index: f32) -> f32 {
        if self.segments.is_empty() {
            return 1.0;
        }
        let max = self.segments.len() - 1;
        let lo = (index.max(0.0).floor() as usize).min(max);
        let hi = (lo + 1).min(max);
        if index.fract() == 0.0 {
            self.segments[lo].submersion
        } else {
            self.segments[lo].submersion.max(self.segments[hi].submersion)
        }
    }
}
