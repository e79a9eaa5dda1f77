// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::config::BevConfig;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Input point cloud file, one `x y z intensity` line per point.
    #[arg(env)]
    pub cloud: PathBuf,

    /// Output directory for the BEV and ground rasters.
    #[arg(long, env, default_value = "out")]
    pub output: PathBuf,

    /// Directory holding the cached normalization map files.
    #[arg(long, env, default_value = "maps")]
    pub maps: PathBuf,

    /// External tool invoked to generate missing normalization maps.
    #[arg(long, env, default_value = "max_points_map.py")]
    pub map_generator: PathBuf,

    /// Grid extent in meters.
    #[arg(long, env)]
    pub grid_dim: u32,

    /// Bird's-eye cell size in meters.
    #[arg(long, env)]
    pub cell_size: f64,

    /// Ground segmentation cell size in meters.
    #[arg(long, env)]
    pub ground_cell_size: f64,

    /// Coarse/fine cell ratio for the ground-elevation raster.
    #[arg(long, env)]
    pub ground_cell_span: usize,

    /// Ground flatness tolerance in meters.
    #[arg(long, env)]
    pub height_threshold: f64,

    /// Horizontal camera field of view in degrees.
    #[arg(long, env)]
    pub horizontal_fov: f64,

    /// Elevation cutoff for the BEV raster in meters.
    #[arg(long, env)]
    pub max_height: f64,

    /// Maximum expected point intensity.
    #[arg(long, env)]
    pub max_expected_intensity: f32,

    /// Remove points with intensity above this threshold before
    /// rasterization.
    #[arg(long, env)]
    pub intensity_threshold: Option<f32>,

    /// Number of sensor scan planes.
    #[arg(long, env)]
    pub num_planes: u32,

    /// Lowest scan plane angle in degrees.
    #[arg(long, env)]
    pub min_angle: f64,

    /// Sensor horizontal angular resolution in degrees.
    #[arg(long, env)]
    pub horizontal_res: f64,

    /// Sensor vertical angular resolution in degrees.
    #[arg(long, env)]
    pub vertical_res: f64,

    /// Sensor to camera transform translation.
    #[arg(
        long,
        env,
        default_value = "0 0 0",
        value_delimiter = ' ',
        num_args = 3
    )]
    pub sensor_cam_tf: Vec<f64>,

    /// Vehicle base to sensor transform translation.
    #[arg(
        long,
        env,
        default_value = "0 0 1.73",
        value_delimiter = ' ',
        num_args = 3
    )]
    pub base_sensor_tf: Vec<f64>,

    /// The name of the sensor frame
    #[arg(long, env, default_value = "lidar")]
    pub frame_id: String,

    /// The name of the camera frame
    #[arg(long, env, default_value = "camera")]
    pub camera_frame_id: String,

    /// The name of the base frame
    #[arg(long, env, default_value = "base_link")]
    pub base_frame_id: String,

    /// Transform acquisition timeout in seconds.
    #[arg(long, env, default_value = "5")]
    pub tf_timeout: u64,

    /// Application log level
    #[arg(long, env, default_value = "info")]
    pub rust_log: LevelFilter,
}

impl From<&Args> for BevConfig {
    fn from(args: &Args) -> Self {
        BevConfig {
            grid_dim: args.grid_dim,
            cell_size: args.cell_size,
            ground_cell_size: args.ground_cell_size,
            ground_cell_span: args.ground_cell_span,
            height_threshold: args.height_threshold,
            horizontal_fov: args.horizontal_fov,
            max_height: args.max_height,
            max_expected_intensity: args.max_expected_intensity,
            intensity_threshold: args.intensity_threshold,
            num_planes: args.num_planes,
            min_angle: args.min_angle,
            horizontal_res: args.horizontal_res,
            vertical_res: args.vertical_res,
        }
    }
}
