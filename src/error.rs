// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Au-Zone Technologies. All Rights Reserved.

//! Common error type for BEV pipeline operations.

use std::fmt;
use std::path::PathBuf;

/// Consolidated error type for cloud loading, normalization map handling,
/// transform acquisition, and configuration validation.
#[derive(Debug)]
pub enum Error {
    /// I/O error (file operations, external process spawn)
    Io(std::io::Error),
    /// Malformed point cloud input at a given line
    CloudFormat(String),
    /// Malformed normalization map file
    MapFormat(String),
    /// Normalization map could not be loaded even after generation
    MapUnavailable(PathBuf),
    /// Normalization map generator tool failed
    Generator(String),
    /// Transform lookup did not succeed within the configured timeout
    TransformTimeout(String),
    /// Configuration error
    Config(String),
    /// Shape error from ndarray operations
    Shape(ndarray::ShapeError),
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::CloudFormat(msg) => write!(f, "malformed point cloud: {}", msg),
            Error::MapFormat(msg) => write!(f, "malformed normalization map: {}", msg),
            Error::MapUnavailable(path) => {
                write!(f, "normalization map unavailable: {}", path.display())
            }
            Error::Generator(msg) => write!(f, "map generator failed: {}", msg),
            Error::TransformTimeout(msg) => write!(f, "transform timeout: {}", msg),
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::Shape(err) => write!(f, "shape error: {}", err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err)
    }
}
