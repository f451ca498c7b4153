//! Discretised line segments for line-of-sight and hit-scan queries.
//!
//! A ray is rasterised by stepping along its dominant axis exactly one pixel
//! at a time; the minor axis advances by the slope and is rounded. The result
//! is a pixel mask that can be overlap-tested against sprite masks.

use glam::Vec2;

use crate::geometry::{Mask, Rect};

/// Step vector scaled so its dominant component is exactly ±1.
pub fn half_normalize(v: Vec2) -> Vec2 {
    let ax = v.x.abs();
    let ay = v.y.abs();
    if ax == 0.0 && ay == 0.0 {
        Vec2::ZERO
    } else if ax >= ay {
        v / ax
    } else {
        v / ay
    }
}

/// Lazily yields the pixels of a rasterised segment, start to end inclusive.
#[derive(Clone, Debug)]
pub struct RayPoints {
    major_start: i32,
    major_sign: i32,
    minor_start: f32,
    minor_step: f32,
    x_major: bool,
    step: i32,
    steps: i32,
}

impl RayPoints {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        let delta = end - start;
        let normal = half_normalize(delta);
        let x_major = delta.x.abs() >= delta.y.abs();
        let (major_from, major_to, minor_from, minor_step) = if x_major {
            (start.x, end.x, start.y, normal.y)
        } else {
            (start.y, end.y, start.x, normal.x)
        };
        let major_start = major_from.round() as i32;
        let major_end = major_to.round() as i32;
        Self {
            major_start,
            major_sign: if major_end >= major_start { 1 } else { -1 },
            minor_start: minor_from,
            minor_step,
            x_major,
            step: 0,
            steps: (major_end - major_start).abs() + 1,
        }
    }
}

impl Iterator for RayPoints {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.step >= self.steps {
            return None;
        }
        let major = self.major_start + self.step * self.major_sign;
        let minor = (self.minor_start + self.minor_step * self.step as f32).round() as i32;
        self.step += 1;
        Some(if self.x_major {
            (major, minor)
        } else {
            (minor, major)
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.steps - self.step).max(0) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for RayPoints {}

/// Pixel rect covering every point a ray will produce. The first and last
/// points bound the rest because both axes move monotonically.
fn ray_bounds(start: Vec2, end: Vec2) -> Rect {
    let mut points = RayPoints::new(start, end);
    let first = points.next().unwrap_or((start.x.round() as i32, start.y.round() as i32));
    let last = points.last().unwrap_or(first);
    let x = first.0.min(last.0);
    let y = first.1.min(last.1);
    Rect::new(
        x,
        y,
        (first.0 - last.0).abs() + 1,
        (first.1 - last.1).abs() + 1,
    )
}

/// One rasterised segment: its mask, the mask's placement and, optionally, the
/// explicit pixel list.
#[derive(Clone, Debug)]
pub struct RayCastMask {
    pub start: Vec2,
    pub end: Vec2,
    pub mask: Mask,
    pub rect: Rect,
    points: Option<Vec<(i32, i32)>>,
}

impl RayCastMask {
    /// Rasterise and keep the point list.
    pub fn from_ray_include_points(start: Vec2, end: Vec2) -> Self {
        let rect = ray_bounds(start, end);
        let mut mask = Mask::new(rect.w, rect.h);
        let points: Vec<(i32, i32)> = RayPoints::new(start, end).collect();
        for &(x, y) in &points {
            mask.set(x - rect.x, y - rect.y);
        }
        Self {
            start,
            end,
            mask,
            rect,
            points: Some(points),
        }
    }

    /// Rasterise straight into the mask without keeping the points. This is
    /// the variant used for per-frame line-of-sight checks.
    pub fn from_ray_ignore_points(start: Vec2, end: Vec2) -> Self {
        let rect = ray_bounds(start, end);
        let mut mask = Mask::new(rect.w, rect.h);
        for (x, y) in RayPoints::new(start, end) {
            mask.set(x - rect.x, y - rect.y);
        }
        Self {
            start,
            end,
            mask,
            rect,
            points: None,
        }
    }

    pub fn points(&self) -> Option<&[(i32, i32)]> {
        self.points.as_deref()
    }

    /// Exact test against the continuous segment; independent of the mask.
    pub fn collide_rect(&self, other: &Rect) -> bool {
        other.clipline(self.start, self.end).is_some()
    }

    /// Pixel overlap with `other_mask` placed at `other_offset` relative to
    /// this ray's rect.
    pub fn collide_mask(&self, other_mask: &Mask, other_offset: (i32, i32)) -> bool {
        self.mask.overlap(other_mask, other_offset).is_some()
    }

    /// `collide_rect` as a cheap reject, then `collide_mask` against a sprite
    /// placed at `other_rect`.
    pub fn hits_sprite(&self, other_rect: &Rect, other_mask: &Mask) -> bool {
        self.collide_rect(other_rect)
            && self.collide_mask(
                other_mask,
                (other_rect.x - self.rect.x, other_rect.y - self.rect.y),
            )
    }

    /// 0/1 grid of the ray's pixels, row-major, for debugging output. Only
    /// available when the points were kept.
    pub fn grid(&self) -> Option<Vec<Vec<u8>>> {
        let points = self.points.as_ref()?;
        let mut grid = vec![vec![0u8; self.rect.w as usize]; self.rect.h as usize];
        for &(x, y) in points {
            grid[(y - self.rect.y) as usize][(x - self.rect.x) as usize] = 1;
        }
        Some(grid)
    }
}
