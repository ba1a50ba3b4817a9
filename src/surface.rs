//! Drawing surface management.
//!
//! A [`Surface`] owns the pixel buffer the engine paints into. It is sized in
//! *logical* units (what the pointer and the simulation see) and backed by
//! `logical × pixel_ratio` physical pixels, so drawing stays crisp on high-DPI
//! displays while every drawing call keeps using logical coordinates.
//!
//! ```ignore
//! let mut surface = Surface::new();
//! surface.configure(1280.0, 720.0, 2.0);
//! assert_eq!(surface.viewport().physical_size(), (2560, 1440));
//! ```

use glam::{Vec2, Vec3, Vec4};
use tracing::debug;

/// Logical size and pixel ratio of the drawing surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Logical width in CSS-like pixels.
    pub width: f32,
    /// Logical height in CSS-like pixels.
    pub height: f32,
    /// Physical pixels per logical pixel.
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            1.0
        };
        Self {
            width: sanitize_extent(width),
            height: sanitize_extent(height),
            pixel_ratio,
        }
    }

    /// Logical size as a vector, the bounds every agent lives in.
    #[inline]
    pub fn bounds(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Logical centre of the viewport.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.bounds() * 0.5
    }

    /// Backing resolution in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        (
            (self.width * self.pixel_ratio).round() as u32,
            (self.height * self.pixel_ratio).round() as u32,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

fn sanitize_extent(v: f32) -> f32 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

/// A physical-resolution RGBA buffer with a logical coordinate transform.
///
/// Pixels are straight (non-premultiplied) RGBA in `0.0..=1.0`. A fresh canvas
/// is fully transparent. Drawing primitives live in [`crate::paint`].
#[derive(Debug, Clone)]
pub struct Canvas {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) scale: f32,
    pub(crate) pixels: Vec<Vec4>,
}

impl Canvas {
    fn new(width: u32, height: u32, scale: f32) -> Self {
        Self {
            width,
            height,
            scale,
            pixels: vec![Vec4::ZERO; width as usize * height as usize],
        }
    }

    /// Physical width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Physical height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Logical-to-physical scale (the pixel ratio).
    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Read one physical pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec4> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Read the pixel under a logical coordinate.
    pub fn pixel_at(&self, logical: Vec2) -> Option<Vec4> {
        let p = logical * self.scale;
        if p.x < 0.0 || p.y < 0.0 {
            return None;
        }
        self.pixel(p.x as u32, p.y as u32)
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> &[Vec4] {
        &self.pixels
    }

    /// Composite over an opaque background into packed RGBA8.
    pub fn to_rgba8(&self, background: Vec3) -> Vec<[u8; 4]> {
        self.pixels
            .iter()
            .map(|px| {
                let c = composite(*px, background);
                [to_u8(c.x), to_u8(c.y), to_u8(c.z), 255]
            })
            .collect()
    }

    /// Composite over an opaque background into `0RGB` words.
    pub fn write_xrgb(&self, background: Vec3, out: &mut [u32]) {
        for (dst, px) in out.iter_mut().zip(&self.pixels) {
            let c = composite(*px, background);
            *dst = (u32::from(to_u8(c.x)) << 16) | (u32::from(to_u8(c.y)) << 8) | u32::from(to_u8(c.z));
        }
    }
}

#[inline]
fn composite(px: Vec4, background: Vec3) -> Vec3 {
    let a = px.w.clamp(0.0, 1.0);
    px.truncate() * a + background * (1.0 - a)
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Owns the viewport and, once configured, the canvas.
///
/// The canvas is absent before the first [`configure`](Surface::configure),
/// after [`detach`](Surface::detach), and whenever the viewport has no physical
/// pixels. Callers treat a missing canvas as "skip drawing this frame".
#[derive(Debug, Default)]
pub struct Surface {
    viewport: Viewport,
    canvas: Option<Canvas>,
}

impl Surface {
    /// A detached surface with no canvas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Size the surface to `logical × pixel_ratio` physical pixels.
    ///
    /// Always allocates a fresh, transparent canvas: nothing drawn before the
    /// call survives it.
    pub fn configure(&mut self, logical_width: f32, logical_height: f32, pixel_ratio: f32) {
        self.viewport = Viewport::new(logical_width, logical_height, pixel_ratio);
        let (width, height) = self.viewport.physical_size();
        self.canvas = if width == 0 || height == 0 {
            None
        } else {
            Some(Canvas::new(width, height, self.viewport.pixel_ratio))
        };
        debug!(
            logical_width = self.viewport.width,
            logical_height = self.viewport.height,
            pixel_ratio = self.viewport.pixel_ratio,
            width,
            height,
            "surface configured"
        );
    }

    /// Drop the canvas. The viewport is kept so a later `configure` can restore it.
    pub fn detach(&mut self) {
        self.canvas = None;
    }

    #[inline]
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    #[inline]
    pub fn is_available(&self) -> bool {
        self.canvas.is_some()
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn canvas_mut(&mut self) -> Option<&mut Canvas> {
        self.canvas.as_mut()
    }
}
