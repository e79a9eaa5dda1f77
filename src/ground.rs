// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Height-map ground segmentation.
//!
//! One pass over the cloud builds a fine grid of per-cell minimum and
//! maximum elevation. A point is classified as ground when its cell was
//! visited and the cell's vertical extent is below the flatness threshold;
//! cell flatness is a cheap proxy for "this patch of ground has little
//! vertical extent" that avoids full plane fitting.
//!
//! The grid is scope-local to one call and discarded afterwards.

use crate::cloud::{Cloud, Point};

/// Ground/non-ground decision for a single point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroundClass {
    /// Point belongs to a locally flat, visited cell.
    Ground,
    /// Point is above-ground, in an unvisited cell, or out of grid bounds.
    NotGround,
}

/// Per-cell (min_z, max_z, visited) statistics over a `grid_dim x grid_dim`
/// grid. Indices follow the segmenter convention
/// `floor(grid_dim/2 + coord/cell_size)`; note the rasterizers use a
/// different, non-interchangeable convention.
struct HeightStats {
    grid_dim: usize,
    cell_size: f64,
    min: Vec<f32>,
    max: Vec<f32>,
    visited: Vec<bool>,
}

impl HeightStats {
    fn new(grid_dim: usize, cell_size: f64) -> Self {
        Self {
            grid_dim,
            cell_size,
            min: vec![0.0; grid_dim * grid_dim],
            max: vec![0.0; grid_dim * grid_dim],
            visited: vec![false; grid_dim * grid_dim],
        }
    }

    /// Flat index of the cell containing the point, or None when the point
    /// falls outside the grid.
    fn cell_index(&self, point: &Point) -> Option<usize> {
        let half = (self.grid_dim / 2) as f64;
        let x = (half + point.x as f64 / self.cell_size).floor();
        let y = (half + point.y as f64 / self.cell_size).floor();

        if x < 0.0 || x >= self.grid_dim as f64 || y < 0.0 || y >= self.grid_dim as f64 {
            return None;
        }
        Some(x as usize * self.grid_dim + y as usize)
    }

    fn visit(&mut self, index: usize, z: f32) {
        if self.visited[index] {
            self.min[index] = self.min[index].min(z);
            self.max[index] = self.max[index].max(z);
        } else {
            self.min[index] = z;
            self.max[index] = z;
            self.visited[index] = true;
        }
    }

    /// Classify a point against the accumulated statistics.
    ///
    /// Unvisited cells and out-of-bounds points carry no height evidence,
    /// so the point is kept (`NotGround`).
    fn classify(&self, point: &Point, height_threshold: f64) -> GroundClass {
        match self.cell_index(point) {
            Some(index) if self.visited[index] => {
                if ((self.max[index] - self.min[index]) as f64) < height_threshold {
                    GroundClass::Ground
                } else {
                    GroundClass::NotGround
                }
            }
            _ => GroundClass::NotGround,
        }
    }
}

/// Remove floor points in place using the height-map flatness test.
///
/// `grid_dim` is the fine grid dimension in cells; with cell size
/// `cell_size` the grid covers `grid_dim * cell_size` meters centered on
/// the sensor.
pub fn remove_floor(cloud: &mut Cloud, cell_size: f64, height_threshold: f64, grid_dim: usize) {
    if grid_dim == 0 {
        return;
    }

    let mut stats = HeightStats::new(grid_dim, cell_size);
    for point in cloud.iter() {
        if let Some(index) = stats.cell_index(point) {
            stats.visit(index, point.z);
        }
    }

    cloud.retain(|p| stats.classify(p, height_threshold) == GroundClass::NotGround);
}
