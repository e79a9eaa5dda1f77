// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Point filters applied ahead of rasterization.
//!
//! Both filters remove points from the cloud in place, preserving the order
//! of survivors. Filtering down to an empty cloud is a valid outcome.

use crate::cloud::{Cloud, Point};
use crate::transform::RigidTransform;

/// Points beyond this forward range (in the camera frame) are always
/// rejected by the FOV filter, meters.
const MAX_FORWARD_RANGE: f32 = 100.0;

/// Return true if the point lies inside the camera's horizontal FOV wedge.
///
/// The point is translated into the camera frame by subtracting the
/// sensor->camera translation (x/y only). Points behind the camera or
/// beyond [`MAX_FORWARD_RANGE`] are rejected outright. The wedge test uses
/// the linear relation `|y| < (fov/90) * x` rather than the exact `atan`;
/// the approximation is part of the output contract and must not be
/// replaced with the true angular test.
pub fn in_camera_fov(
    point: &Point,
    sensor_to_camera: &RigidTransform,
    horizontal_fov: f64,
) -> bool {
    let x = point.x - sensor_to_camera.translation.x as f32;
    let y = point.y - sensor_to_camera.translation.y as f32;

    if x < 0.0 || x > MAX_FORWARD_RANGE {
        return false;
    }

    (y.abs() as f64) < (horizontal_fov / 90.0) * x as f64
}

/// Remove every point outside the camera FOV.
pub fn filter_fov(cloud: &mut Cloud, sensor_to_camera: &RigidTransform, horizontal_fov: f64) {
    cloud.retain(|p| in_camera_fov(p, sensor_to_camera, horizontal_fov));
}

/// Remove every point whose intensity is strictly greater than the
/// threshold (reflective clutter). Ties at the threshold are kept; this is
/// a removal filter, not a clamp.
pub fn filter_intensities(cloud: &mut Cloud, intensity_threshold: f32) {
    cloud.retain(|p| p.intensity <= intensity_threshold);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> RigidTransform {
        RigidTransform::default()
    }

    #[test]
    fn test_fov_wedge_boundary() {
        // fov = 90 degrees: accept iff |y| < x
        let tf = identity();
        assert!(in_camera_fov(&Point::new(10.0, 5.0, 0.0, 0.0), &tf, 90.0));
        assert!(!in_camera_fov(&Point::new(10.0, 11.0, 0.0, 0.0), &tf, 90.0));
        assert!(!in_camera_fov(&Point::new(10.0, -11.0, 0.0, 0.0), &tf, 90.0));
        // strict inequality on the wedge edge
        assert!(!in_camera_fov(&Point::new(10.0, 10.0, 0.0, 0.0), &tf, 90.0));
    }

    #[test]
    fn test_fov_rejects_behind_and_far() {
        let tf = identity();
        assert!(!in_camera_fov(&Point::new(-0.1, 0.0, 0.0, 0.0), &tf, 90.0));
        assert!(!in_camera_fov(&Point::new(100.1, 0.0, 0.0, 0.0), &tf, 90.0));
        assert!(in_camera_fov(&Point::new(100.0, 0.0, 0.0, 0.0), &tf, 90.0));
    }

    #[test]
    fn test_fov_applies_camera_translation() {
        // Camera sits 2m ahead of the sensor: a point at x=1 is behind it.
        let tf = RigidTransform::from_translation(2.0, 0.0, 0.0);
        assert!(!in_camera_fov(&Point::new(1.0, 0.0, 0.0, 0.0), &tf, 90.0));
        assert!(in_camera_fov(&Point::new(3.0, 0.5, 0.0, 0.0), &tf, 90.0));

        // Lateral offset shifts the wedge: (10, 5) with y offset 5 lands on
        // the centerline.
        let tf = RigidTransform::from_translation(0.0, 5.0, 0.0);
        assert!(in_camera_fov(&Point::new(10.0, 5.0, 0.0, 0.0), &tf, 30.0));
    }

    #[test]
    fn test_fov_narrow_angle() {
        let tf = identity();
        // fov = 45: accept iff |y| < 0.5 * x
        assert!(in_camera_fov(&Point::new(10.0, 4.9, 0.0, 0.0), &tf, 45.0));
        assert!(!in_camera_fov(&Point::new(10.0, 5.1, 0.0, 0.0), &tf, 45.0));
    }

    #[test]
    fn test_filter_fov_in_place() {
        let mut cloud = Cloud::from_points(vec![
            Point::new(10.0, 5.0, 0.0, 0.0),
            Point::new(10.0, 11.0, 0.0, 0.0),
            Point::new(-1.0, 0.0, 0.0, 0.0),
            Point::new(20.0, 1.0, 0.0, 0.0),
        ]);

        filter_fov(&mut cloud, &identity(), 90.0);
        let xs: Vec<f32> = cloud.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![10.0, 20.0]);
    }

    #[test]
    fn test_filter_intensities_keeps_ties() {
        let mut cloud = Cloud::from_points(vec![
            Point::new(0.0, 0.0, 0.0, 0.5),
            Point::new(0.0, 0.0, 0.0, 1.0),
            Point::new(0.0, 0.0, 0.0, 1.0001),
            Point::new(0.0, 0.0, 0.0, 2.0),
        ]);

        filter_intensities(&mut cloud, 1.0);
        let intensities: Vec<f32> = cloud.iter().map(|p| p.intensity).collect();
        assert_eq!(intensities, vec![0.5, 1.0]);
    }

    #[test]
    fn test_filters_tolerate_empty_cloud() {
        let mut cloud = Cloud::new();
        filter_fov(&mut cloud, &identity(), 90.0);
        filter_intensities(&mut cloud, 1.0);
        assert!(cloud.is_empty());
    }
}
