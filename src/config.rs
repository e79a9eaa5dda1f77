// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! BEV pipeline configuration.
//!
//! Every field is required; the pipeline assumes no defaults. Validation
//! happens once when the [`crate::pipeline::FrameProcessor`] is built.

use serde::{Deserialize, Serialize};

use crate::error::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BevConfig {
    /// Grid extent in meters (square, centered on the sensor).
    pub grid_dim: u32,
    /// Bird's-eye cell size, meters per cell.
    pub cell_size: f64,
    /// Fine cell size for ground segmentation, meters per cell.
    pub ground_cell_size: f64,
    /// Coarse/fine cell ratio for the ground-elevation raster.
    pub ground_cell_span: usize,
    /// Ground flatness tolerance, meters.
    pub height_threshold: f64,
    /// Horizontal camera field of view, degrees.
    pub horizontal_fov: f64,
    /// Elevation cutoff for the BEV raster, meters above the vehicle base.
    pub max_height: f64,
    /// Maximum expected point intensity, used to normalize intensities.
    pub max_expected_intensity: f32,
    /// Optional intensity filter threshold; points strictly above it are
    /// removed before rasterization.
    pub intensity_threshold: Option<f32>,
    /// Number of sensor scan planes (normalization map selection).
    pub num_planes: u32,
    /// Lowest scan plane angle, degrees.
    pub min_angle: f64,
    /// Sensor horizontal angular resolution, degrees.
    pub horizontal_res: f64,
    /// Sensor vertical angular resolution, degrees.
    pub vertical_res: f64,
}

impl BevConfig {
    /// Number of rows/cols of the bird's-eye rasters.
    pub fn grid_cells(&self) -> usize {
        (self.grid_dim as f64 / self.cell_size) as usize
    }

    /// Number of rows/cols of the coarse ground grid.
    pub fn ground_cells(&self) -> usize {
        self.grid_cells() / self.ground_cell_span
    }

    /// Fine grid dimension in cells for ground segmentation, covering the
    /// same footprint as the bird's-eye rasters.
    pub fn segmentation_grid_dim(&self) -> usize {
        (self.grid_dim as f64 / self.ground_cell_size) as usize
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.grid_dim == 0 {
            return Err(Error::Config("grid_dim must be positive".to_string()));
        }
        if self.cell_size <= 0.0 || self.ground_cell_size <= 0.0 {
            return Err(Error::Config("cell sizes must be positive".to_string()));
        }
        if self.ground_cell_span == 0 {
            return Err(Error::Config("ground_cell_span must be positive".to_string()));
        }
        if self.grid_cells() < self.ground_cell_span {
            return Err(Error::Config(format!(
                "ground_cell_span {} exceeds grid of {} cells",
                self.ground_cell_span,
                self.grid_cells()
            )));
        }
        if self.height_threshold <= 0.0 {
            return Err(Error::Config("height_threshold must be positive".to_string()));
        }
        if !(0.0..=180.0).contains(&self.horizontal_fov) {
            return Err(Error::Config(format!(
                "horizontal_fov {} out of range [0, 180]",
                self.horizontal_fov
            )));
        }
        if self.max_height <= 0.0 {
            return Err(Error::Config("max_height must be positive".to_string()));
        }
        if self.max_expected_intensity <= 0.0 {
            return Err(Error::Config(
                "max_expected_intensity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
