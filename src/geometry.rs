//! Integer rectangles, pixel masks and the few vector helpers the combat code
//! needs. Coordinates are display pixels with y growing downward.

use glam::Vec2;

// ── Rect ──────────────────────────────────────────────────────────────────────

/// Axis-aligned integer rectangle. `x`/`y` is the top-left corner; the right
/// and bottom edges are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Rect of `size` centred on `center` (rounded to the nearest pixel).
    pub fn from_center(center: Vec2, size: (i32, i32)) -> Self {
        let (w, h) = size;
        Self {
            x: center.x.round() as i32 - w / 2,
            y: center.y.round() as i32 - h / 2,
            w,
            h,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            self.x as f32 + (self.w / 2) as f32,
            self.y as f32 + (self.h / 2) as f32,
        )
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.x as f32
            && p.x < self.right() as f32
            && p.y >= self.y as f32
            && p.y < self.bottom() as f32
    }

    pub fn colliderect(&self, other: &Rect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Move this rect so it lies inside `bounds`. A rect larger than `bounds`
    /// on some axis is centred on that axis.
    pub fn clamp_inside(&self, bounds: &Rect) -> Rect {
        let x = if self.w >= bounds.w {
            bounds.x + bounds.w / 2 - self.w / 2
        } else if self.x < bounds.x {
            bounds.x
        } else if self.right() > bounds.right() {
            bounds.right() - self.w
        } else {
            self.x
        };
        let y = if self.h >= bounds.h {
            bounds.y + bounds.h / 2 - self.h / 2
        } else if self.y < bounds.y {
            bounds.y
        } else if self.bottom() > bounds.bottom() {
            bounds.bottom() - self.h
        } else {
            self.y
        };
        Rect { x, y, ..*self }
    }

    /// Clip the continuous segment `a → b` against this rect's pixel area
    /// (`x ..= right - 1`, `y ..= bottom - 1`). Returns the clipped endpoints,
    /// or `None` when the segment misses. Liang–Barsky.
    pub fn clipline(&self, a: Vec2, b: Vec2) -> Option<(Vec2, Vec2)> {
        if self.is_empty() {
            return None;
        }
        let x_min = self.x as f32;
        let x_max = (self.right() - 1) as f32;
        let y_min = self.y as f32;
        let y_max = (self.bottom() - 1) as f32;

        let d = b - a;
        let mut t0 = 0.0_f32;
        let mut t1 = 1.0_f32;
        let edges = [
            (-d.x, a.x - x_min),
            (d.x, x_max - a.x),
            (-d.y, a.y - y_min),
            (d.y, y_max - a.y),
        ];
        for (p, q) in edges {
            if p == 0.0 {
                // Parallel to this edge: reject if outside it.
                if q < 0.0 {
                    return None;
                }
                continue;
            }
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }
        Some((a + d * t0, a + d * t1))
    }
}

// ── Mask ──────────────────────────────────────────────────────────────────────

/// 1-bit-per-pixel collision mask, rows packed into `u64` words.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: i32,
    height: i32,
    stride: usize,
    words: Vec<u64>,
}

impl Mask {
    /// An empty (all clear) mask.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let stride = (width as usize).div_ceil(64);
        Self {
            width,
            height,
            stride,
            words: vec![0; stride * height as usize],
        }
    }

    pub fn filled(width: i32, height: i32) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..mask.height {
            for x in 0..mask.width {
                mask.set(x, y);
            }
        }
        mask
    }

    /// A disc of the given radius inscribed in a `2r × 2r` mask.
    pub fn circle(radius: i32) -> Self {
        let size = radius * 2;
        let mut mask = Self::new(size, size);
        let r = radius as f32;
        for y in 0..size {
            for x in 0..size {
                let dx = x as f32 + 0.5 - r;
                let dy = y as f32 + 0.5 - r;
                if dx * dx + dy * dy <= r * r {
                    mask.set(x, y);
                }
            }
        }
        mask
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    /// Set a pixel. Out-of-range coordinates are ignored.
    pub fn set(&mut self, x: i32, y: i32) {
        if !self.in_bounds(x, y) {
            return;
        }
        let idx = y as usize * self.stride + x as usize / 64;
        self.words[idx] |= 1 << (x as usize % 64);
    }

    pub fn get(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = y as usize * self.stride + x as usize / 64;
        self.words[idx] & (1 << (x as usize % 64)) != 0
    }

    pub fn count(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// First set pixel shared with `other`, where `other`'s top-left sits at
    /// `offset` in this mask's coordinates.
    pub fn overlap(&self, other: &Mask, offset: (i32, i32)) -> Option<(i32, i32)> {
        let (ox, oy) = offset;
        let x0 = ox.max(0);
        let y0 = oy.max(0);
        let x1 = (ox + other.width).min(self.width);
        let y1 = (oy + other.height).min(self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) && other.get(x - ox, y - oy) {
                    return Some((x, y));
                }
            }
        }
        None
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Bounding-box test followed by a pixel-mask test.
pub fn sprites_overlap(a_rect: &Rect, a_mask: &Mask, b_rect: &Rect, b_mask: &Mask) -> bool {
    a_rect.colliderect(b_rect)
        && a_mask
            .overlap(b_mask, (b_rect.x - a_rect.x, b_rect.y - a_rect.y))
            .is_some()
}

/// Unsigned angle between two non-zero vectors, in degrees. Zero vectors give
/// `None`.
pub fn angle_between_deg(a: Vec2, b: Vec2) -> Option<f32> {
    let a = a.try_normalize()?;
    let b = b.try_normalize()?;
    Some(a.dot(b).clamp(-1.0, 1.0).acos().to_degrees())
}
