//! Image Codec Facade: decode a file path to a pixel matrix, or fail loudly.
//!
//! This is the only place the crate touches the `image` decoding stack;
//! everything above it works in [`crate::matrix::ImageMatrix`] /
//! [`crate::matrix::LabelMatrix`].

use crate::error::PipelineError;
use image::{GenericImageView, GrayImage, RgbImage};

fn open(path: &str) -> Result<image::DynamicImage, PipelineError> {
    image::open(path).map_err(|err| PipelineError::Io {
        path: path.to_string(),
        source: err.to_string(),
    })
}

/// Decode `path` as 3-channel 8-bit color.
pub fn decode_color(path: &str) -> Result<RgbImage, PipelineError> {
    let img = open(path)?;
    if img.dimensions() == (0, 0) {
        return Err(PipelineError::Io {
            path: path.to_string(),
            source: "decoder returned an empty image".to_string(),
        });
    }
    Ok(img.into_rgb8())
}

/// Decode `path` as single-channel 8-bit.
pub fn decode_gray(path: &str) -> Result<GrayImage, PipelineError> {
    let img = open(path)?;
    if img.dimensions() == (0, 0) {
        return Err(PipelineError::Io {
            path: path.to_string(),
            source: "decoder returned an empty image".to_string(),
        });
    }
    Ok(img.into_luma8())
}
