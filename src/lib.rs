// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! LiDAR Bird's-Eye-View Rasterization Library
//!
//! This library converts a single frame of 3-D range-sensor points into a
//! fixed-resolution 2-D bird's-eye-view representation for a downstream
//! perception stage, optionally stripping ground-plane points first.
//!
//! # Architecture
//!
//! ```text
//! ┌────────┐   ┌─────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ Cloud  │──►│ filter_fov  │──►│ remove_floor  │──►│  bird_view   │
//! │ (flat) │   │ [intensity] │   │ (height map)  │   │ (3 channels) │
//! └────────┘   └──────┬──────┘   └───────────────┘   └──────▲───────┘
//!                     │                                     │
//!                     ▼                              ┌──────┴───────┐
//!              ┌─────────────┐                       │ Normalization│
//!              │ bird_ground │                       │     Map      │
//!              │ (elevation) │                       └──────────────┘
//!              └─────────────┘
//! ```
//!
//! The cloud is exclusively owned by the pipeline for the duration of one
//! frame and filtered destructively in place. All grids are created fresh
//! per call; the only cross-frame state is the normalization map, loaded
//! once and reused read-only.
//!
//! # Modules
//!
//! - [`cloud`]: flat point cloud container with in-place filtering
//! - [`transform`]: rigid transforms and bounded acquisition
//! - [`filter`]: camera-FOV and intensity point filters
//! - [`ground`]: height-map ground segmentation
//! - [`bev`]: bird's-eye-view and ground-elevation rasterizers
//! - [`normmap`]: density normalization table loading and generation
//! - [`pipeline`]: per-frame orchestration
//! - [`config`]: pipeline configuration
//!
//! # Example
//!
//! ```ignore
//! use lidar_bev::{Cloud, FrameProcessor};
//!
//! let processor = FrameProcessor::new(config, transforms, norm_map)?;
//! let mut cloud = Cloud::from_columns(&x, &y, &z, &intensity);
//! let frame = processor.process(&mut cloud);
//! // frame.bird_view: grid_cells x grid_cells x 3 bytes
//! // frame.ground:    grid_cells x grid_cells floats
//! ```

pub mod args;
pub mod bev;
pub mod cloud;
pub mod config;
pub mod error;
pub mod filter;
pub mod ground;
pub mod normmap;
pub mod pipeline;
pub mod transform;

// Re-exports for convenience
pub use cloud::{Cloud, Point};
pub use config::BevConfig;
pub use error::Error;
pub use normmap::{CommandMapGenerator, MapGenerator, MapGeometry, NormalizationMap};
pub use pipeline::{BevFrame, FrameProcessor};
pub use transform::{
    RigidTransform, StaticTransformProvider, TransformContext, TransformProvider,
};
