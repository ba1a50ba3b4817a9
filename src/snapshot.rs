//! PNG export of the current frame.

use std::path::Path;

use glam::Vec3;
use image::{ImageFormat, RgbaImage};
use tracing::info;

use crate::error::SnapshotError;
use crate::surface::{Canvas, Surface};

/// Composite `canvas` over an opaque `background` into an RGBA image.
pub fn to_image(canvas: &Canvas, background: Vec3) -> Option<RgbaImage> {
    let pixels = canvas.to_rgba8(background);
    let bytes: Vec<u8> = bytemuck::cast_slice(&pixels).to_vec();
    RgbaImage::from_raw(canvas.width(), canvas.height(), bytes)
}

/// Write the surface's canvas as a PNG at `path`.
pub fn save_png(surface: &Surface, background: Vec3, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    let canvas = surface.canvas().ok_or(SnapshotError::Unavailable)?;
    let image = to_image(canvas, background).ok_or(SnapshotError::Unavailable)?;
    image.save_with_format(path, ImageFormat::Png)?;
    info!(path = %path.display(), width = image.width(), height = image.height(), "snapshot written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn test_snapshot_writes_physical_pixels() {
        let mut surface = Surface::new();
        surface.configure(20.0, 10.0, 2.0);
        let canvas = surface.canvas_mut().unwrap();
        canvas.fill_rect(Vec2::ZERO, Vec2::new(5.0, 5.0), Vec3::X, 1.0);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        save_png(&surface, Vec3::ZERO, &path).unwrap();

        let image = image::open(&path).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (40, 20));
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(39, 19).0, [0, 0, 0, 255]);
    }

    #[test]
    fn test_missing_canvas() {
        let surface = Surface::new();
        let err = save_png(&surface, Vec3::ONE, "never-written.png").unwrap_err();
        assert!(matches!(err, SnapshotError::Unavailable));
    }
}
