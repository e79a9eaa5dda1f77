// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Bird's-eye-view rasterizers.
//!
//! Two rasters are produced from one frame:
//!
//! - [`bird_view`]: a `grid_cells x grid_cells x 3` byte image with
//!   channels (max height, point density, mean intensity), each
//!   independently scaled to 0-255.
//! - [`bird_ground`]: a `grid_cells x grid_cells` float ground-elevation
//!   raster built from a coarse minimum-elevation grid, median filtered and
//!   upsampled by block replication.
//!
//! Both use the rasterizer index convention `grid_cells/2 - coord/cell`,
//! which is distinct from the ground segmenter's `grid_dim/2 + coord/cell`
//! convention; the two mappings are not interchangeable.
//!
//! All grids are created fresh per call and released at the end; the only
//! state reused across frames is the read-only normalization map.

use ndarray::{Array2, Array3};

use crate::cloud::Cloud;
use crate::config::BevConfig;
use crate::normmap::NormalizationMap;
use crate::transform::RigidTransform;

/// Elevation below this is treated as sensor noise / ground artifacts and
/// excluded from the ground raster, meters.
pub const GROUND_NOISE_CUTOFF: f32 = -3.0;

/// Untouched coarse ground cells hold this sentinel until filtering.
const GROUND_SENTINEL: f32 = 9999.9;

/// Untouched height accumulator sentinel, clamped to 0 before emission.
const HEIGHT_SENTINEL: f32 = -9999.9;

/// Half-extent of the blind-spot patch around the vehicle, meters.
const BLIND_SPOT_RANGE: f64 = 5.0;

/// Coarse cells inside the blind spot deviating from zero by more than
/// this are forced to 0, meters.
const BLIND_SPOT_TOLERANCE: f32 = 0.2;

/// Rasterizer cell index (`grid_cells/2 - coord/cell_size`), floored. The
/// result may fall outside `[0, grid_cells)`; callers drop those points.
fn fine_index(coord: f32, grid_cells: usize, cell_size: f64) -> i64 {
    ((grid_cells / 2) as f64 - coord as f64 / cell_size).floor() as i64
}

/// Coarse ground-grid index: division by `span` with a -0.5 centering
/// offset, truncated toward zero. The same mapping is used for the
/// downsample and the upsample so the two stay index-consistent.
fn coarse_index(fine: i64, span: usize) -> i64 {
    (fine as f64 / span as f64 - 0.5) as i64
}

/// 3x3 median filter with replicated borders.
pub fn median3x3(src: &Array2<f32>) -> Array2<f32> {
    let (rows, cols) = src.dim();
    if rows == 0 || cols == 0 {
        return src.clone();
    }

    let mut out = Array2::zeros((rows, cols));
    let mut window = [0.0f32; 9];

    for r in 0..rows {
        for c in 0..cols {
            let mut k = 0;
            for dr in -1i64..=1 {
                for dc in -1i64..=1 {
                    let rr = (r as i64 + dr).clamp(0, rows as i64 - 1) as usize;
                    let cc = (c as i64 + dc).clamp(0, cols as i64 - 1) as usize;
                    window[k] = src[[rr, cc]];
                    k += 1;
                }
            }
            window.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            out[[r, c]] = window[4];
        }
    }

    out
}

/// Build the smoothed ground-elevation raster at full BEV resolution.
///
/// Points above [`GROUND_NOISE_CUTOFF`] contribute their vehicle-frame
/// elevation (`z + base_to_sensor.z`) to a coarse grid keeping the minimum
/// per cell. Coarse cells within [`BLIND_SPOT_RANGE`] of the origin that
/// deviate from zero are forced to 0 (the area under the vehicle is
/// assumed flat even when unobserved), the grid is denoised with a 3x3
/// median filter, and the result is upsampled by block replication.
pub fn bird_ground(
    cloud: &Cloud,
    base_to_sensor: &RigidTransform,
    bv_cell_size: f64,
    ground_cell_span: usize,
    grid_dim: u32,
) -> Array2<f32> {
    let grid_cells = (grid_dim as f64 / bv_cell_size) as usize;
    let ground_cells = grid_cells / ground_cell_span;
    if ground_cells == 0 {
        return Array2::zeros((grid_cells, grid_cells));
    }

    let mut coarse = Array2::from_elem((ground_cells, ground_cells), GROUND_SENTINEL);

    // Minimum vehicle-frame elevation per coarse cell
    for point in cloud.iter() {
        if point.z < GROUND_NOISE_CUTOFF {
            continue;
        }
        let z = point.z + base_to_sensor.translation.z as f32;

        let fx = fine_index(point.x, grid_cells, bv_cell_size);
        let fy = fine_index(point.y, grid_cells, bv_cell_size);
        let cx = coarse_index(fx, ground_cell_span);
        let cy = coarse_index(fy, ground_cell_span);

        if (0..ground_cells as i64).contains(&cx) && (0..ground_cells as i64).contains(&cy) {
            let cell = &mut coarse[[cx as usize, cy as usize]];
            *cell = cell.min(z);
        }
    }

    // Blind-spot patch: the sensor cannot observe the area under and around
    // the vehicle, so cells there are assumed to be flat ground.
    for i in 0..ground_cells {
        for j in 0..ground_cells {
            let z = coarse[[i, j]];
            let x_m = ((i * ground_cell_span) as f64 - grid_cells as f64 / 2.0) * bv_cell_size;
            let y_m = ((j * ground_cell_span) as f64 - grid_cells as f64 / 2.0) * bv_cell_size;
            if z.abs() > BLIND_SPOT_TOLERANCE
                && x_m.abs() < BLIND_SPOT_RANGE
                && y_m.abs() < BLIND_SPOT_RANGE
            {
                coarse[[i, j]] = 0.0;
            }
        }
    }

    let median = median3x3(&coarse);

    // Upsample by block replication using the same fine->coarse mapping as
    // the downsample, clamped into range at the edges.
    let mut full = Array2::zeros((grid_cells, grid_cells));
    for i in 0..grid_cells {
        let cx = coarse_index(i as i64, ground_cell_span).clamp(0, ground_cells as i64 - 1);
        for j in 0..grid_cells {
            let cy = coarse_index(j as i64, ground_cell_span).clamp(0, ground_cells as i64 - 1);
            full[[i, j]] = median[[cx as usize, cy as usize]];
        }
    }

    full
}

/// Rasterize the cloud into the 3-channel BEV byte image.
///
/// Channel 0 is max height (`255 * max(h, 0) / max_height`, saturating at
/// 255), channel 1 is point density normalized against the per-cell
/// expected maximum, channel 2 is mean intensity. Cells without points
/// emit 0 in every channel.
pub fn bird_view(
    cloud: &Cloud,
    base_to_sensor: &RigidTransform,
    config: &BevConfig,
    norm_map: &NormalizationMap,
) -> Array3<u8> {
    let grid_cells = config.grid_cells();
    let cell_size = config.cell_size;

    let mut height = Array2::from_elem((grid_cells, grid_cells), HEIGHT_SENTINEL);
    let mut density = Array2::<u32>::zeros((grid_cells, grid_cells));
    let mut intensity = Array2::<f32>::zeros((grid_cells, grid_cells));

    for point in cloud.iter() {
        let z = point.z + base_to_sensor.translation.z as f32;
        if (z as f64) >= config.max_height {
            continue;
        }

        let x = fine_index(point.x, grid_cells, cell_size);
        let y = fine_index(point.y, grid_cells, cell_size);
        if (0..grid_cells as i64).contains(&x) && (0..grid_cells as i64).contains(&y) {
            let (x, y) = (x as usize, y as usize);
            height[[x, y]] = height[[x, y]].max(z);
            density[[x, y]] += 1;
            intensity[[x, y]] += point.intensity / config.max_expected_intensity;
        }
    }

    let mut view = Array3::zeros((grid_cells, grid_cells, 3));
    for i in 0..grid_cells {
        for j in 0..grid_cells {
            // Untouched heights clamp to 0 before scaling.
            let h = height[[i, j]].max(0.0);
            view[[i, j, 0]] = (255.0 * h / config.max_height as f32) as u8;

            let count = density[[i, j]];
            let norm = norm_map.get(i, j);
            view[[i, j, 1]] = if count == 0 {
                0
            } else if norm > 0.0 {
                (255.0 * count as f32 / norm).min(255.0) as u8
            } else {
                // Non-positive table entry: any observed point saturates.
                255
            };

            view[[i, j, 2]] = if count > 0 {
                (255.0 * intensity[[i, j]] / count as f32).min(255.0) as u8
            } else {
                0
            };
        }
    }

    view
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::Point;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    fn test_config(grid_dim: u32, cell_size: f64) -> BevConfig {
        BevConfig {
            grid_dim,
            cell_size,
            ground_cell_size: 0.5,
            ground_cell_span: 4,
            height_threshold: 0.1,
            horizontal_fov: 90.0,
            max_height: 3.0,
            max_expected_intensity: 1.0,
            intensity_threshold: None,
            num_planes: 64,
            min_angle: -24.9,
            horizontal_res: 0.2,
            vertical_res: 0.4,
        }
    }

    fn uniform_map(grid_cells: usize, value: f32) -> NormalizationMap {
        NormalizationMap::from_values(Array2::from_elem((grid_cells, grid_cells), value))
    }

    #[test]
    fn test_fine_index_conventions() {
        // 20 cells of 0.5m: origin maps to cell 10, +x decreases the index.
        assert_eq!(fine_index(0.0, 20, 0.5), 10);
        assert_eq!(fine_index(1.0, 20, 0.5), 8);
        assert_eq!(fine_index(-1.0, 20, 0.5), 12);
        // Beyond the extent the index leaves [0, cells)
        assert_eq!(fine_index(6.0, 20, 0.5), -2);
        assert_eq!(fine_index(-6.0, 20, 0.5), 22);
    }

    #[test]
    fn test_coarse_index_centering() {
        // Truncation toward zero with the -0.5 offset: fine cells 0 and 1
        // both land in coarse 0 for span 4.
        assert_eq!(coarse_index(0, 4), 0);
        assert_eq!(coarse_index(1, 4), 0);
        assert_eq!(coarse_index(2, 4), 0);
        assert_eq!(coarse_index(6, 4), 1);
        assert_eq!(coarse_index(10, 4), 2);
    }

    #[test]
    fn test_median3x3_removes_outlier() {
        let mut grid = Array2::zeros((5, 5));
        grid[[2, 2]] = 100.0;
        let out = median3x3(&grid);
        assert_eq!(out[[2, 2]], 0.0);
    }

    #[test]
    fn test_median3x3_constant_grid() {
        let grid = Array2::from_elem((4, 4), 1.5);
        let out = median3x3(&grid);
        for v in out.iter() {
            assert_eq!(*v, 1.5);
        }
    }

    #[test]
    fn test_bird_view_height_channel_midpoint() {
        // Single point at max_height/2 with density normalization saturated
        // should emit a height byte of ~127.
        let config = test_config(10, 0.5);
        let grid_cells = config.grid_cells();
        let norm_map = uniform_map(grid_cells, 1.0);
        let tf = RigidTransform::default();

        let cloud = Cloud::from_points(vec![Point::new(1.0, 1.0, 1.5, 0.5)]);
        let view = bird_view(&cloud, &tf, &config, &norm_map);

        let (x, y) = (8, 8);
        let h = view[[x, y, 0]];
        assert!((126..=128).contains(&h), "height byte {} not ~127", h);
        // Density saturates at 255 with a map entry of 1.0
        assert_eq!(view[[x, y, 1]], 255);
        // Mean intensity 0.5 scaled to 0-255
        assert_eq!(view[[x, y, 2]], 127);
    }

    #[test]
    fn test_bird_view_density_bounded() {
        let config = test_config(10, 0.5);
        let grid_cells = config.grid_cells();
        // Tiny normalization entries push the ratio far past 255.
        let norm_map = uniform_map(grid_cells, 0.001);
        let tf = RigidTransform::default();

        let mut cloud = Cloud::new();
        for _ in 0..1000 {
            cloud.push(Point::new(1.0, 1.0, 0.5, 0.0));
        }
        let view = bird_view(&cloud, &tf, &config, &norm_map);
        // The min() keeps the scaled value from wrapping in u8 storage.
        assert_eq!(view[[8, 8, 1]], 255);
    }

    #[test]
    fn test_bird_view_height_saturates() {
        // Elevation above max_height * cell value saturates instead of
        // wrapping around 8 bits.
        let config = test_config(10, 0.5);
        let norm_map = uniform_map(config.grid_cells(), 10.0);
        let tf = RigidTransform::default();

        let cloud = Cloud::from_points(vec![
            Point::new(1.0, 1.0, 2.9999, 0.0),
            Point::new(1.0, 1.0, 0.1, 0.0),
        ]);
        let view = bird_view(&cloud, &tf, &config, &norm_map);
        assert_eq!(view[[8, 8, 0]], 254);
    }

    #[test]
    fn test_bird_view_skips_high_points() {
        let config = test_config(10, 0.5);
        let norm_map = uniform_map(config.grid_cells(), 10.0);
        let tf = RigidTransform::default();

        // At or above max_height the point is excluded entirely.
        let cloud = Cloud::from_points(vec![Point::new(1.0, 1.0, 3.0, 1.0)]);
        let view = bird_view(&cloud, &tf, &config, &norm_map);
        assert_eq!(view[[8, 8, 0]], 0);
        assert_eq!(view[[8, 8, 1]], 0);
        assert_eq!(view[[8, 8, 2]], 0);
    }

    #[test]
    fn test_bird_view_empty_cells_zero() {
        let config = test_config(10, 0.5);
        let norm_map = uniform_map(config.grid_cells(), 10.0);
        let view = bird_view(&Cloud::new(), &RigidTransform::default(), &config, &norm_map);
        for v in view.iter() {
            assert_eq!(*v, 0);
        }
    }

    #[test]
    fn test_bird_view_uses_vehicle_frame_elevation() {
        let config = test_config(10, 0.5);
        let norm_map = uniform_map(config.grid_cells(), 1.0);
        // Sensor mounted 1.5m above the base: a point at z=0 sits at 1.5m
        // vehicle elevation -> height byte ~127.
        let tf = RigidTransform::from_translation(0.0, 0.0, 1.5);

        let cloud = Cloud::from_points(vec![Point::new(1.0, 1.0, 0.0, 0.0)]);
        let view = bird_view(&cloud, &tf, &config, &norm_map);
        assert!((126..=128).contains(&view[[8, 8, 0]]));
    }

    #[test]
    fn test_bird_ground_flat_floor() {
        // Floor at z = -1.73 with the sensor 1.73m up: vehicle elevation 0.
        let tf = RigidTransform::from_translation(0.0, 0.0, 1.73);
        let mut cloud = Cloud::new();
        for i in -40i32..40 {
            for j in -40i32..40 {
                cloud.push(Point::new(i as f32 * 0.25, j as f32 * 0.25, -1.73, 0.0));
            }
        }

        let ground = bird_ground(&cloud, &tf, 0.5, 4, 20);
        let grid_cells = 40;
        assert_eq!(ground.dim(), (grid_cells, grid_cells));
        for v in ground.iter() {
            assert_abs_diff_eq!(*v, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_bird_ground_blind_spot_patched() {
        // No points at all: the coarse grid stays at the sentinel, but
        // cells around the origin must be forced to flat ground.
        let tf = RigidTransform::default();
        let ground = bird_ground(&Cloud::new(), &tf, 0.5, 4, 20);

        // Grid center corresponds to the sensor origin.
        let center = 20; // grid_cells/2 of 40
        assert_abs_diff_eq!(ground[[center, center]], 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_bird_ground_noise_cutoff() {
        // Points below -3m are excluded from the ground estimate.
        let tf = RigidTransform::default();
        let mut low = Cloud::new();
        for i in -40i32..40 {
            for j in -40i32..40 {
                low.push(Point::new(i as f32 * 0.25, j as f32 * 0.25, -5.0, 0.0));
            }
        }
        let with_low = bird_ground(&low, &tf, 0.5, 4, 20);
        let without = bird_ground(&Cloud::new(), &tf, 0.5, 4, 20);
        assert_eq!(with_low, without);
    }

    #[test]
    fn test_bird_ground_keeps_minimum() {
        // A floor point and an object point in the same coarse cell: the
        // minimum elevation wins.
        let tf = RigidTransform::from_translation(0.0, 0.0, 1.7);
        let mut cloud = Cloud::new();
        // Fill the whole quadrant around the probe so the median filter
        // window never touches sentinel cells, away from the blind spot.
        for i in 0..80 {
            for j in 0..80 {
                let x = -2.0 - i as f32 * 0.1;
                let y = -2.0 - j as f32 * 0.1;
                cloud.push(Point::new(x, y, -1.7, 0.0));
                cloud.push(Point::new(x, y, 0.3, 0.0)); // object above
            }
        }

        let ground = bird_ground(&cloud, &tf, 0.5, 4, 20);
        // Probe the raster at (-7, -7), well inside the filled quadrant.
        let fx = fine_index(-7.0, 40, 0.5) as usize;
        let fy = fine_index(-7.0, 40, 0.5) as usize;
        assert_abs_diff_eq!(ground[[fx, fy]], 0.0, epsilon = 1e-5);
    }
}
