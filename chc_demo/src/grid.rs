//! Instance grid generation.

use anyhow::{ensure, Result};
use glam::Vec2;

/// Positions of a `resolution × resolution` grid with unit spacing,
/// ordered so that instance `i * resolution + j` sits at `(i, j)`.
pub fn grid_positions(resolution: u32) -> Result<Vec<Vec2>> {
    ensure!(resolution > 0, "grid resolution must be at least 1");
    let count = (resolution as usize)
        .checked_mul(resolution as usize)
        .filter(|count| u32::try_from(*count).is_ok());
    ensure!(count.is_some(), "grid resolution {} is too large", resolution);

    Ok((0..resolution)
        .flat_map(|i| (0..resolution).map(move |j| Vec2::new(i as f32, j as f32)))
        .collect())
}
