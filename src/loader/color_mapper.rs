use std::collections::HashMap;

use super::TargetLoader;
use crate::codec;
use crate::error::PipelineError;
use crate::matrix::LabelMatrix;

/// Decodes as 3-channel 8-bit, then maps each `(R, G, B)` pixel to an 8-bit
/// label via a lookup table. An unmapped color is a fatal error for that
/// image.
#[derive(Debug, Clone, new)]
pub struct ColorMapperLoader {
    map: HashMap<(u8, u8, u8), u8>,
}

impl TargetLoader for ColorMapperLoader {
    fn load(&self, path: &str) -> Result<LabelMatrix, PipelineError> {
        let img = codec::decode_color(path)?;
        let (width, height) = (img.width() as usize, img.height() as usize);
        let mut data = Vec::with_capacity(width * height);
        for pixel in img.pixels() {
            let rgb = (pixel.0[0], pixel.0[1], pixel.0[2]);
            let label = self.map.get(&rgb).copied().ok_or_else(|| {
                PipelineError::UnknownColor {
                    path: path.to_string(),
                    rgb,
                }
            })?;
            data.push(label);
        }
        Ok(LabelMatrix::new(data, height, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructs_with_given_map() {
        let mut map = HashMap::new();
        map.insert((0, 0, 0), 0u8);
        let loader = ColorMapperLoader::new(map);
        assert_eq!(loader.map.get(&(0, 0, 0)), Some(&0));
    }
}
