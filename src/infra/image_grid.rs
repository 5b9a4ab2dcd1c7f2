// ============================================================
// Layer 6 — Sample Grid Writer
// ============================================================
// Tiles square grayscale images into one PNG:
//
//   ┌──┬──┬──┬──┐
//   │  │  │  │  │   columns = ⌈√n⌉
//   ├──┼──┼──┼──┤   rows    = ⌈n / columns⌉
//   │  │  │  │  │   GRID_PADDING black pixels between tiles
//   └──┴──┴──┴──┘
//
// Pixels are expected in [0, 1]; anything outside is clamped.

use anyhow::{bail, Context, Result};
use image::{GrayImage, ImageBuffer, Luma};
use std::{fs, path::Path};

use crate::domain::image::ImageVector;

pub const GRID_PADDING: u32 = 2;

/// (columns, rows) of the grid for `count` images.
pub fn grid_shape(count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let cols = (count as f64).sqrt().ceil() as usize;
    (cols, count.div_ceil(cols))
}

/// Render `images` (each `side × side`) as one grayscale grid.
pub fn render_grid(images: &[ImageVector], side: usize) -> Result<GrayImage> {
    if images.is_empty() {
        bail!("No images to render");
    }
    if let Some(bad) = images.iter().find(|img| img.len() != side * side) {
        bail!("Image has {} pixels, expected {}x{}", bad.len(), side, side);
    }

    let (cols, rows) = grid_shape(images.len());
    let side = side as u32;
    let cell = side + GRID_PADDING;
    let width = cols as u32 * cell + GRID_PADDING;
    let height = rows as u32 * cell + GRID_PADDING;
    let mut canvas: GrayImage = ImageBuffer::new(width, height);

    for (i, img) in images.iter().enumerate() {
        let x0 = GRID_PADDING + (i % cols) as u32 * cell;
        let y0 = GRID_PADDING + (i / cols) as u32 * cell;
        for (p, value) in img.to_bytes().into_iter().enumerate() {
            let (x, y) = (p as u32 % side, p as u32 / side);
            canvas.put_pixel(x0 + x, y0 + y, Luma([value]));
        }
    }
    Ok(canvas)
}

/// Render and write a PNG, creating parent directories.
pub fn save_grid(images: &[ImageVector], side: usize, path: &Path) -> Result<()> {
    let canvas = render_grid(images, side)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create '{}'", parent.display()))?;
    }
    canvas
        .save(path)
        .with_context(|| format!("Failed to write image grid to '{}'", path.display()))?;

    tracing::debug!("Wrote {} samples to '{}'", images.len(), path.display());
    Ok(())
}
