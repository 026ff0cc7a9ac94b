use std::io::Cursor;

use anyhow::{Context, Result};
use dermascan_contracts::imaging::{DataUri, SourceImage};
use dermascan_contracts::views::{grid_cell, GRID_COLUMNS, GRID_ROWS, VIEW_DEFINITIONS};
use image::{ImageFormat, Rgb, RgbImage};
use sha2::{Digest, Sha256};

use super::ImageAnalyzer;

const CELL_WIDTH: u32 = 96;
const CELL_HEIGHT: u32 = 128;

/// Offline analyzer that paints a deterministic grid of view accents.
pub struct DryrunAnalyzer {
    profile: String,
}

impl DryrunAnalyzer {
    pub fn new(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
        }
    }

    fn render(&self, image: &SourceImage) -> RgbImage {
        let digest = seed_digest(&self.profile, image);
        let mut grid = RgbImage::new(
            CELL_WIDTH * GRID_COLUMNS as u32,
            CELL_HEIGHT * GRID_ROWS as u32,
        );
        for (idx, view) in VIEW_DEFINITIONS.iter().enumerate() {
            let (row, col) = grid_cell(idx);
            let (r, g, b) = view.accent.rgb();
            let shade = digest[idx] / 4;
            let color = Rgb([
                r.saturating_add(shade),
                g.saturating_add(shade),
                b.saturating_add(shade),
            ]);
            let x0 = col as u32 * CELL_WIDTH;
            let y0 = row as u32 * CELL_HEIGHT;
            for y in y0..y0 + CELL_HEIGHT {
                for x in x0..x0 + CELL_WIDTH {
                    grid.put_pixel(x, y, color);
                }
            }
        }
        grid
    }
}

impl ImageAnalyzer for DryrunAnalyzer {
    fn name(&self) -> &str {
        "dryrun"
    }

    fn analyze(&self, image: &SourceImage) -> Result<DataUri> {
        let grid = self.render(image);
        let mut encoded = Cursor::new(Vec::new());
        grid.write_to(&mut encoded, ImageFormat::Png)
            .context("dryrun grid encode failed")?;
        Ok(DataUri::from_bytes("image/png", encoded.get_ref()))
    }
}

fn seed_digest(profile: &str, image: &SourceImage) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(profile.as_bytes());
    hasher.update(image.data_uri().data().as_bytes());
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}
