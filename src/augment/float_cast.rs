use super::Augmentor;
use crate::error::PipelineError;
use crate::pair::ImageLabelPair;

/// Declared first step of the standard chain: the image becomes 32-bit
/// float, 3 channels, scaled `1/255`. In this crate the pair loader already
/// guarantees that representation (see [`crate::loader::RgbLoader`]), so
/// this augmentor is a documented no-op kept for parity with chains that
/// declare it explicitly. The target plane is always untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct FloatCastAugmentor;

impl FloatCastAugmentor {
    pub fn new() -> Self {
        Self
    }
}

impl Augmentor for FloatCastAugmentor {
    fn augment(&self, _pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        Ok(())
    }
}
