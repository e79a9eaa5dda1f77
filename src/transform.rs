// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Rigid transforms between sensor, camera, and vehicle reference frames.
//!
//! Transform computation itself is an external collaborator; this module
//! only defines the transform types, the provider abstraction, and a
//! bounded acquisition helper. Lookups retry until a configurable deadline
//! and surface failure to the caller instead of blocking forever.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

/// Translation plus rotation relating two reference frames.
///
/// Only the translation participates in the BEV coordinate shifts; the
/// rotation is carried for interface completeness but assumed identity by
/// the rasterizers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    pub translation: Vec3,
    pub rotation: Quaternion,
}

impl RigidTransform {
    pub fn from_translation(x: f64, y: f64, z: f64) -> Self {
        Self {
            translation: Vec3::new(x, y, z),
            rotation: Quaternion::default(),
        }
    }
}

/// The two transforms consumed by the pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransformContext {
    /// sensor -> camera, used by the FOV filter
    pub sensor_to_camera: RigidTransform,
    /// vehicle base -> sensor, used for vehicle-frame elevations
    pub base_to_sensor: RigidTransform,
}

/// Source of rigid transforms between named frames.
///
/// Implementations may be backed by a live transform tree or by static
/// configuration. A failed lookup is not fatal; acquisition helpers retry
/// until their deadline.
pub trait TransformProvider {
    fn try_lookup(&self, from: &str, to: &str) -> Result<RigidTransform, Error>;
}

/// Fixed transform table, for CLI wiring and tests.
#[derive(Clone, Debug, Default)]
pub struct StaticTransformProvider {
    transforms: HashMap<(String, String), RigidTransform>,
}

impl StaticTransformProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: &str, to: &str, transform: RigidTransform) {
        self.transforms
            .insert((from.to_string(), to.to_string()), transform);
    }
}

impl TransformProvider for StaticTransformProvider {
    fn try_lookup(&self, from: &str, to: &str) -> Result<RigidTransform, Error> {
        self.transforms
            .get(&(from.to_string(), to.to_string()))
            .copied()
            .ok_or_else(|| Error::TransformTimeout(format!("no transform {} -> {}", from, to)))
    }
}

/// Acquire the sensor->camera and base->sensor transforms, retrying failed
/// lookups until `timeout` elapses.
///
/// Returns `Error::TransformTimeout` at the deadline rather than retrying
/// indefinitely.
pub fn wait_for_context<P: TransformProvider>(
    provider: &P,
    sensor_frame: &str,
    camera_frame: &str,
    base_frame: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<TransformContext, Error> {
    let deadline = Instant::now() + timeout;

    loop {
        let sensor_to_camera = provider.try_lookup(sensor_frame, camera_frame);
        let base_to_sensor = provider.try_lookup(base_frame, sensor_frame);

        match (sensor_to_camera, base_to_sensor) {
            (Ok(sensor_to_camera), Ok(base_to_sensor)) => {
                return Ok(TransformContext {
                    sensor_to_camera,
                    base_to_sensor,
                })
            }
            (Err(e), _) | (_, Err(e)) => {
                if Instant::now() >= deadline {
                    return Err(Error::TransformTimeout(format!(
                        "transforms {} -> {} / {} -> {} unavailable after {:?}: {}",
                        sensor_frame, camera_frame, base_frame, sensor_frame, timeout, e
                    )));
                }
                warn!("transform lookup failed, retrying: {}", e);
                std::thread::sleep(poll_interval.min(deadline.saturating_duration_since(Instant::now())));
            }
        }
    }
}
