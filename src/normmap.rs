// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-cell expected-maximum-point-count table for density normalization.
//!
//! The table is a function of the sensor geometry (mount height, angular
//! resolution, number of scan planes), not of any single frame, so it is
//! precomputed by an external tool, cached on disk, and loaded once. The
//! file name deterministically encodes the geometry key so repeated runs
//! with identical geometry reuse the cached file.
//!
//! Generation is modeled as an injected [`MapGenerator`] capability so the
//! core never shells out directly; [`CommandMapGenerator`] is the default
//! implementation wrapping the external tool.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use ndarray::Array2;
use tracing::{info, warn};

use crate::bev::GROUND_NOISE_CUTOFF;
use crate::config::BevConfig;
use crate::error::Error;

/// Geometry key identifying one normalization table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapGeometry {
    /// Grid extent, meters.
    pub grid_dim: u32,
    /// Bird's-eye cell size, meters per cell.
    pub cell_size: f64,
    /// Lower elevation bound passed to the generator, meters.
    pub min_height: f64,
    /// Upper elevation bound passed to the generator, meters.
    pub max_height: f64,
    /// Number of sensor scan planes.
    pub num_planes: u32,
    /// Lowest scan plane angle, degrees.
    pub min_angle: f64,
    /// Horizontal angular resolution, degrees.
    pub horizontal_res: f64,
    /// Vertical angular resolution, degrees.
    pub vertical_res: f64,
    /// Sensor mount height above the vehicle base, meters.
    pub sensor_height: f64,
}

impl MapGeometry {
    /// Derive the geometry key from the pipeline configuration and the
    /// base->sensor mount height. The lower elevation bound reuses the
    /// ground raster's noise cutoff.
    pub fn from_config(config: &BevConfig, sensor_height: f64) -> Self {
        Self {
            grid_dim: config.grid_dim,
            cell_size: config.cell_size,
            min_height: GROUND_NOISE_CUTOFF as f64,
            max_height: config.max_height,
            num_planes: config.num_planes,
            min_angle: config.min_angle,
            horizontal_res: config.horizontal_res,
            vertical_res: config.vertical_res,
            sensor_height,
        }
    }

    /// Cache file name: `{grid_dim}_{cell_size}_{planes}_{height}_map.txt`
    /// with cell size and sensor height fixed to 2 decimals.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{:.2}_{}_{:.2}_map.txt",
            self.grid_dim, self.cell_size, self.num_planes, self.sensor_height
        )
    }

    pub fn grid_cells(&self) -> usize {
        (self.grid_dim as f64 / self.cell_size) as usize
    }
}

/// Expected maximum point count per BEV cell, loaded once and reused
/// read-only across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizationMap {
    values: Array2<f32>,
}

impl NormalizationMap {
    pub fn from_values(values: Array2<f32>) -> Self {
        Self { values }
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[[row, col]]
    }

    pub fn grid_cells(&self) -> usize {
        self.values.nrows()
    }

    pub fn values(&self) -> &Array2<f32> {
        &self.values
    }

    /// Load a map from the plain-text format: `grid_cells` lines of
    /// `grid_cells` whitespace-separated floats, row-major.
    ///
    /// Dimension mismatches are a load error rather than a silent partial
    /// fill.
    pub fn load(path: &Path, grid_cells: usize) -> Result<Self, Error> {
        let text = fs::read_to_string(path)?;

        let mut data = Vec::with_capacity(grid_cells * grid_cells);
        let mut rows = 0usize;
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let before = data.len();
            for token in line.split_whitespace() {
                let value: f32 = token.parse().map_err(|_| {
                    Error::MapFormat(format!(
                        "{}:{}: invalid float {:?}",
                        path.display(),
                        lineno + 1,
                        token
                    ))
                })?;
                data.push(value);
            }
            let cols = data.len() - before;
            if cols != grid_cells {
                return Err(Error::MapFormat(format!(
                    "{}:{}: expected {} values per row, found {}",
                    path.display(),
                    lineno + 1,
                    grid_cells,
                    cols
                )));
            }
            rows += 1;
        }

        if rows != grid_cells {
            return Err(Error::MapFormat(format!(
                "{}: expected {} rows, found {}",
                path.display(),
                grid_cells,
                rows
            )));
        }

        let values = Array2::from_shape_vec((grid_cells, grid_cells), data)?;
        Ok(Self { values })
    }

    /// Write the map in the same plain-text format [`Self::load`] reads.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut file = fs::File::create(path)?;
        for row in self.values.rows() {
            let line = row
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

/// Capability to produce a missing normalization map file.
pub trait MapGenerator {
    /// Generate the map for `geometry` into `maps_dir`, blocking until the
    /// file exists or an error occurs.
    fn generate(&self, maps_dir: &Path, geometry: &MapGeometry) -> Result<(), Error>;
}

/// Default generator: invokes the external map tool as a blocking process
/// with the geometry passed as named arguments.
#[derive(Clone, Debug)]
pub struct CommandMapGenerator {
    program: PathBuf,
}

impl CommandMapGenerator {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }
}

impl MapGenerator for CommandMapGenerator {
    fn generate(&self, maps_dir: &Path, geometry: &MapGeometry) -> Result<(), Error> {
        info!(
            "generating normalization map with {}",
            self.program.display()
        );
        let status = Command::new(&self.program)
            .arg("--maps")
            .arg(maps_dir)
            .arg("--map_size")
            .arg(geometry.grid_dim.to_string())
            .arg("--cell_size")
            .arg(geometry.cell_size.to_string())
            .arg("--min_height")
            .arg(geometry.min_height.to_string())
            .arg("--max_height")
            .arg(geometry.max_height.to_string())
            .arg("--num_planes")
            .arg(geometry.num_planes.to_string())
            .arg("--velo_minangle")
            .arg(geometry.min_angle.to_string())
            .arg("--velo_hres")
            .arg(geometry.horizontal_res.to_string())
            .arg("--velo_vres")
            .arg(geometry.vertical_res.to_string())
            .arg("--velo_height")
            .arg(format!("{:.2}", geometry.sensor_height))
            .status()?;

        if !status.success() {
            return Err(Error::Generator(format!(
                "{} exited with {}",
                self.program.display(),
                status
            )));
        }
        Ok(())
    }
}

/// Load the map for `geometry` from `maps_dir`, invoking the generator
/// first when the cache file is missing.
///
/// An unreadable map after generation is unrecoverable for the pipeline;
/// the caller is expected to terminate on [`Error::MapUnavailable`].
pub fn load_or_generate(
    maps_dir: &Path,
    geometry: &MapGeometry,
    generator: &dyn MapGenerator,
) -> Result<NormalizationMap, Error> {
    let path = maps_dir.join(geometry.file_name());

    if !path.exists() {
        warn!(
            "normalization map {} not found, invoking generator",
            path.display()
        );
        generator.generate(maps_dir, geometry)?;
    }

    NormalizationMap::load(&path, geometry.grid_cells()).map_err(|err| {
        warn!("normalization map load failed: {}", err);
        Error::MapUnavailable(path)
    })
}
