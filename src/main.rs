// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use lidar_bev::args::Args;
use lidar_bev::normmap::{load_or_generate, CommandMapGenerator};
use lidar_bev::transform::{wait_for_context, StaticTransformProvider};
use lidar_bev::{BevConfig, Cloud, Error, FrameProcessor, MapGeometry, Point, RigidTransform};
use ndarray::{Array2, Array3};
use tracing::{debug, info};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.rust_log)
        .init();

    let config = BevConfig::from(&args);
    config.validate()?;
    debug!("config: {}", serde_json::to_string(&config)?);

    let mut provider = StaticTransformProvider::new();
    provider.insert(
        &args.frame_id,
        &args.camera_frame_id,
        RigidTransform::from_translation(
            args.sensor_cam_tf[0],
            args.sensor_cam_tf[1],
            args.sensor_cam_tf[2],
        ),
    );
    provider.insert(
        &args.base_frame_id,
        &args.frame_id,
        RigidTransform::from_translation(
            args.base_sensor_tf[0],
            args.base_sensor_tf[1],
            args.base_sensor_tf[2],
        ),
    );
    let tf = wait_for_context(
        &provider,
        &args.frame_id,
        &args.camera_frame_id,
        &args.base_frame_id,
        Duration::from_secs(args.tf_timeout),
        Duration::from_millis(100),
    )?;
    debug!(
        "transforms: sensor->camera ({}, {}), base->sensor z {}",
        tf.sensor_to_camera.translation.x,
        tf.sensor_to_camera.translation.y,
        tf.base_to_sensor.translation.z
    );

    let geometry = MapGeometry::from_config(&config, tf.base_to_sensor.translation.z);
    let generator = CommandMapGenerator::new(args.map_generator.clone());
    fs::create_dir_all(&args.maps)?;
    let norm_map = load_or_generate(&args.maps, &geometry, &generator)?;

    let mut cloud = read_cloud(&args.cloud)?;
    info!(points = cloud.len(), "loaded cloud");

    let processor = FrameProcessor::new(config, tf, norm_map)?;
    let frame = processor.process(&mut cloud);
    info!(points = cloud.len(), "pipeline complete");

    fs::create_dir_all(&args.output)?;
    let view_path = args.output.join("bird_view.ppm");
    let ground_path = args.output.join("bird_ground.txt");
    write_ppm(&view_path, &frame.bird_view)?;
    write_ground(&ground_path, &frame.ground)?;
    info!(
        "wrote {} and {}",
        view_path.display(),
        ground_path.display()
    );

    Ok(())
}

/// Read a flat text cloud: one `x y z intensity` line per point. Blank
/// lines and `#` comments are skipped.
fn read_cloud(path: &Path) -> Result<Cloud, Error> {
    let text = fs::read_to_string(path)?;
    let mut cloud = Cloud::new();

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = [0.0f32; 4];
        let mut count = 0;
        for token in line.split_whitespace() {
            if count >= 4 {
                count += 1;
                break;
            }
            fields[count] = token.parse().map_err(|_| {
                Error::CloudFormat(format!(
                    "{}:{}: invalid float {:?}",
                    path.display(),
                    lineno + 1,
                    token
                ))
            })?;
            count += 1;
        }
        if count != 4 {
            return Err(Error::CloudFormat(format!(
                "{}:{}: expected `x y z intensity`",
                path.display(),
                lineno + 1
            )));
        }

        cloud.push(Point::new(fields[0], fields[1], fields[2], fields[3]));
    }

    Ok(cloud)
}

/// Write the BEV raster as a binary PPM (P6) image.
fn write_ppm(path: &Path, view: &Array3<u8>) -> std::io::Result<()> {
    let (rows, cols, _) = view.dim();
    let mut file = BufWriter::new(fs::File::create(path)?);
    write!(file, "P6\n{} {}\n255\n", cols, rows)?;

    let mut data = Vec::with_capacity(rows * cols * 3);
    for i in 0..rows {
        for j in 0..cols {
            for k in 0..3 {
                data.push(view[[i, j, k]]);
            }
        }
    }
    file.write_all(&data)?;
    file.flush()
}

/// Write the ground raster as whitespace-separated floats, one row per
/// line (the same layout as the normalization map files).
fn write_ground(path: &Path, ground: &Array2<f32>) -> std::io::Result<()> {
    let mut file = BufWriter::new(fs::File::create(path)?);
    for row in ground.rows() {
        let line = row
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(file, "{}", line)?;
    }
    file.flush()
}
