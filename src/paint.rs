//! Software drawing primitives for [`Canvas`].
//!
//! All coordinates and lengths are logical; the canvas scales them by its
//! pixel ratio. Shapes are anti-aliased by coverage (one physical pixel of
//! feathering) and composited source-over. Alpha is always clamped to
//! `0.0..=1.0` before blending, and non-finite geometry is skipped.

use glam::{Vec2, Vec3, Vec4};

use crate::glyphs::{Glyph, GLYPH_COLUMNS, GLYPH_ROWS};
use crate::surface::Canvas;

/// A colour at a position along a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position in `0.0..=1.0`.
    pub offset: f32,
    pub color: Vec3,
    pub alpha: f32,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Vec3, alpha: f32) -> Self {
        Self {
            offset,
            color,
            alpha,
        }
    }
}

/// Sample a gradient at `t`, returning colour and clamped alpha.
///
/// Stops must be sorted by offset. Outside the stops the nearest end colour is
/// used; an empty gradient is fully transparent.
pub fn sample_gradient(stops: &[ColorStop], t: f32) -> (Vec3, f32) {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return (Vec3::ZERO, 0.0),
    };
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

    if t <= first.offset {
        return (first.color, first.alpha.clamp(0.0, 1.0));
    }
    for pair in stops.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.offset {
            let span = b.offset - a.offset;
            let k = if span > f32::EPSILON { (t - a.offset) / span } else { 1.0 };
            let alpha = a.alpha + (b.alpha - a.alpha) * k;
            return (a.color.lerp(b.color, k), alpha.clamp(0.0, 1.0));
        }
    }
    (last.color, last.alpha.clamp(0.0, 1.0))
}

/// Source-over blend of a straight-alpha colour into a straight-alpha pixel.
#[inline]
pub(crate) fn blend(dst: &mut Vec4, color: Vec3, alpha: f32) {
    // Also rejects NaN.
    if !(alpha > 0.0) {
        return;
    }
    let a = alpha.min(1.0);
    let da = dst.w;
    let out_a = a + da * (1.0 - a);
    let rgb = (color * a + dst.truncate() * da * (1.0 - a)) / out_a;
    *dst = rgb.extend(out_a);
}

#[inline]
fn coverage(edge_distance: f32) -> f32 {
    (edge_distance + 0.5).clamp(0.0, 1.0)
}

fn finite2(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

impl Canvas {
    /// Physical pixel range covering `[min, max]`, clipped to the canvas.
    fn pixel_span(&self, min: Vec2, max: Vec2) -> Option<(u32, u32, u32, u32)> {
        if !finite2(min) || !finite2(max) {
            return None;
        }
        let x0 = min.x.floor().max(0.0);
        let y0 = min.y.floor().max(0.0);
        let x1 = max.x.ceil().min(self.width as f32);
        let y1 = max.y.ceil().min(self.height as f32);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0 as u32, y0 as u32, x1 as u32, y1 as u32))
    }

    #[inline]
    fn blend_at(&mut self, x: u32, y: u32, color: Vec3, alpha: f32) {
        let idx = (y * self.width + x) as usize;
        blend(&mut self.pixels[idx], color, alpha);
    }

    /// Make every pixel transparent.
    pub fn clear(&mut self) {
        self.pixels.fill(Vec4::ZERO);
    }

    /// Cover the whole canvas with a translucent colour, leaving motion trails.
    pub fn fade(&mut self, color: Vec3, alpha: f32) {
        for px in &mut self.pixels {
            blend(px, color, alpha);
        }
    }

    /// Axis-aligned rectangle, hard-edged.
    pub fn fill_rect(&mut self, min: Vec2, max: Vec2, color: Vec3, alpha: f32) {
        let s = self.scale;
        let Some((x0, y0, x1, y1)) = self.pixel_span(min * s, max * s) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_at(x, y, color, alpha);
            }
        }
    }

    /// Solid disc.
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Vec3, alpha: f32) {
        let stop = [ColorStop::new(0.0, color, alpha)];
        self.fill_radial(center, radius, radius, &stop);
    }

    /// Disc of `radius` filled with a radial gradient that reaches its last
    /// stop at `gradient_radius`.
    pub fn fill_radial(
        &mut self,
        center: Vec2,
        radius: f32,
        gradient_radius: f32,
        stops: &[ColorStop],
    ) {
        let s = self.scale;
        let c = center * s;
        let r = radius * s;
        let gr = gradient_radius * s;
        if !(r > 0.0) || !finite2(c) {
            return;
        }
        let Some((x0, y0, x1, y1)) = self.pixel_span(c - Vec2::splat(r + 1.0), c + Vec2::splat(r + 1.0)) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let d = p.distance(c);
                let cov = coverage(r - d);
                if cov <= 0.0 {
                    continue;
                }
                let t = if gr > f32::EPSILON { d / gr } else { 0.0 };
                let (color, alpha) = sample_gradient(stops, t);
                self.blend_at(x, y, color, alpha * cov);
            }
        }
    }

    /// Round-capped line whose colour follows `stops` from `from` to `to`.
    pub fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, stops: &[ColorStop]) {
        let s = self.scale;
        let a = from * s;
        let b = to * s;
        let half = width * s * 0.5;
        if !(half > 0.0) || !finite2(a) || !finite2(b) {
            return;
        }
        let ab = b - a;
        let len_sq = ab.length_squared();
        let pad = Vec2::splat(half + 1.0);
        let Some((x0, y0, x1, y1)) = self.pixel_span(a.min(b) - pad, a.max(b) + pad) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let t = if len_sq > f32::EPSILON {
                    ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let d = p.distance(a + ab * t);
                let cov = coverage(half - d);
                if cov <= 0.0 {
                    continue;
                }
                let (color, alpha) = sample_gradient(stops, t);
                self.blend_at(x, y, color, alpha * cov);
            }
        }
    }

    /// Connected line segments in a single colour.
    pub fn stroke_polyline(&mut self, points: &[Vec2], width: f32, color: Vec3, alpha: f32) {
        let stop = [ColorStop::new(0.0, color, alpha)];
        for seg in points.windows(2) {
            self.stroke_line(seg[0], seg[1], width, &stop);
        }
    }

    /// Fill the whole canvas with a linear gradient running from `from` to `to`.
    pub fn fill_linear_gradient(&mut self, from: Vec2, to: Vec2, stops: &[ColorStop]) {
        let s = self.scale;
        let a = from * s;
        let ab = to * s - a;
        let len_sq = ab.length_squared();
        if !finite2(a) || !finite2(ab) {
            return;
        }
        for y in 0..self.height {
            for x in 0..self.width {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let t = if len_sq > f32::EPSILON { (p - a).dot(ab) / len_sq } else { 0.0 };
                let (color, alpha) = sample_gradient(stops, t);
                self.blend_at(x, y, color, alpha);
            }
        }
    }

    /// Draw a bitmap glyph inside a `size × size` cell whose top-left corner is `origin`.
    pub fn fill_glyph(&mut self, glyph: &Glyph, origin: Vec2, size: f32, color: Vec3, alpha: f32) {
        let dot = size / 8.0;
        let inset = Vec2::new(dot * 1.5, dot * 0.5);
        for row in 0..GLYPH_ROWS {
            for col in 0..GLYPH_COLUMNS {
                if glyph.is_set(col, row) {
                    let min = origin + inset + Vec2::new(col as f32, row as f32) * dot;
                    self.fill_rect(min, min + Vec2::splat(dot), color, alpha);
                }
            }
        }
    }
}
