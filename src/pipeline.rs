// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Per-frame pipeline orchestration.
//!
//! One [`FrameProcessor`] is built per sensor setup (configuration,
//! transforms, normalization map) and reused across frames; everything
//! else is allocated per call. Processing is single-threaded and
//! synchronous: the cloud is exclusively owned by the pipeline for the
//! duration of one frame and mutated destructively. Concurrent frames need
//! independent `Cloud` instances.

use ndarray::{Array2, Array3};
use tracing::{debug, info_span};

use crate::bev;
use crate::cloud::Cloud;
use crate::config::BevConfig;
use crate::error::Error;
use crate::filter;
use crate::ground;
use crate::normmap::NormalizationMap;
use crate::transform::TransformContext;

/// Rasters produced from one frame.
#[derive(Clone, Debug)]
pub struct BevFrame {
    /// `grid_cells x grid_cells x 3` byte image, channels
    /// (height, density, mean intensity).
    pub bird_view: Array3<u8>,
    /// `grid_cells x grid_cells` ground-elevation raster, meters.
    pub ground: Array2<f32>,
}

pub struct FrameProcessor {
    config: BevConfig,
    tf: TransformContext,
    norm_map: NormalizationMap,
}

impl FrameProcessor {
    pub fn new(
        config: BevConfig,
        tf: TransformContext,
        norm_map: NormalizationMap,
    ) -> Result<Self, Error> {
        config.validate()?;
        if norm_map.grid_cells() != config.grid_cells() {
            return Err(Error::Config(format!(
                "normalization map is {} cells, grid is {}",
                norm_map.grid_cells(),
                config.grid_cells()
            )));
        }
        Ok(Self {
            config,
            tf,
            norm_map,
        })
    }

    pub fn config(&self) -> &BevConfig {
        &self.config
    }

    /// Run the full pipeline on one frame.
    ///
    /// The cloud is filtered in place and left in its post-segmentation
    /// state. The ground raster is built before floor removal since it
    /// needs the floor points.
    pub fn process(&self, cloud: &mut Cloud) -> BevFrame {
        info_span!("filter_fov").in_scope(|| {
            filter::filter_fov(cloud, &self.tf.sensor_to_camera, self.config.horizontal_fov)
        });
        debug!(points = cloud.len(), "after FOV filter");

        if let Some(threshold) = self.config.intensity_threshold {
            info_span!("filter_intensities")
                .in_scope(|| filter::filter_intensities(cloud, threshold));
            debug!(points = cloud.len(), "after intensity filter");
        }

        let ground = info_span!("bird_ground").in_scope(|| {
            bev::bird_ground(
                cloud,
                &self.tf.base_to_sensor,
                self.config.cell_size,
                self.config.ground_cell_span,
                self.config.grid_dim,
            )
        });

        info_span!("remove_floor").in_scope(|| {
            ground::remove_floor(
                cloud,
                self.config.ground_cell_size,
                self.config.height_threshold,
                self.config.segmentation_grid_dim(),
            )
        });
        debug!(points = cloud.len(), "after ground removal");

        let bird_view = info_span!("bird_view").in_scope(|| {
            bev::bird_view(cloud, &self.tf.base_to_sensor, &self.config, &self.norm_map)
        });

        BevFrame { bird_view, ground }
    }
}
