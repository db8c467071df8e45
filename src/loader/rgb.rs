use super::ImageLoader;
use crate::codec;
use crate::error::PipelineError;
use crate::matrix::ImageMatrix;

/// Decodes the file as 3-channel color, converts to 32-bit float, and scales
/// intensities by `1/255` into `[0, 1]`.
///
/// The decoder this crate uses (`image`) already emits R, G, B order; unlike
/// the OpenCV-backed original this loader replaces, no B,G,R swap is needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct RgbLoader;

impl RgbLoader {
    pub fn new() -> Self {
        Self
    }
}

impl ImageLoader for RgbLoader {
    fn load(&self, path: &str) -> Result<ImageMatrix, PipelineError> {
        let img = codec::decode_color(path)?;
        let (width, height) = (img.width() as usize, img.height() as usize);
        let mut data = Vec::with_capacity(width * height * 3);
        for pixel in img.pixels() {
            let [r, g, b] = pixel.0;
            data.push(r as f32 / 255.0);
            data.push(g as f32 / 255.0);
            data.push(b as f32 / 255.0);
        }
        Ok(ImageMatrix::new(data, height, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_is_zero_sized_and_reentrant() {
        let a = RgbLoader::new();
        let b = a;
        let _ = (a, b); // Copy, so both remain usable.
    }
}
