// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Point cloud container for per-frame BEV processing.
//!
//! The cloud is an ordered, flat sequence of points with no row/column
//! organization. Filtering stages remove points in place, preserving the
//! relative order of survivors, and never copy the cloud wholesale. Each
//! frame's cloud is exclusively owned by the pipeline for the duration of
//! that frame; an empty cloud after filtering is a valid terminal state.

use itertools::izip;

/// A single LiDAR return. Intensity is a non-negative scalar, unbounded in
/// source data; it is normalized against the configured maximum expected
/// intensity only at rasterization time.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub intensity: f32,
}

impl Point {
    pub fn new(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        Self { x, y, z, intensity }
    }
}

/// An ordered, mutable sequence of points.
#[derive(Clone, Debug, Default)]
pub struct Cloud {
    points: Vec<Point>,
}

impl Cloud {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Build a cloud from structure-of-arrays columns. All slices must have
    /// the same length.
    pub fn from_columns(x: &[f32], y: &[f32], z: &[f32], intensity: &[f32]) -> Self {
        assert_eq!(x.len(), y.len());
        assert_eq!(x.len(), z.len());
        assert_eq!(x.len(), intensity.len());
        let points = izip!(x, y, z, intensity)
            .map(|(&x, &y, &z, &intensity)| Point { x, y, z, intensity })
            .collect();
        Self { points }
    }

    pub fn push(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Point> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }

    /// Remove every point for which the predicate returns false, in place.
    /// Survivor order is preserved.
    pub fn retain<F: FnMut(&Point) -> bool>(&mut self, keep: F) {
        self.points.retain(keep);
    }
}

impl<'a> IntoIterator for &'a Cloud {
    type Item = &'a Point;
    type IntoIter = std::slice::Iter<'a, Point>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
