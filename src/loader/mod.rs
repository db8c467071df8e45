//! Loaders map one filename to one typed matrix. Pure and reentrant; all
//! variants fail loudly when the codec returns no data.

mod color_mapper;
mod label;
mod rgb;
mod value_mapper;

pub use color_mapper::ColorMapperLoader;
pub use label::LabelLoader;
pub use rgb::RgbLoader;
pub use value_mapper::ValueMapperLoader;

use crate::error::PipelineError;
use crate::matrix::{ImageMatrix, LabelMatrix};

/// Loads the source (color) half of a pair.
pub trait ImageLoader: Send + Sync {
    fn load(&self, path: &str) -> Result<ImageMatrix, PipelineError>;
}

/// Loads the target (label) half of a pair.
pub trait TargetLoader: Send + Sync {
    fn load(&self, path: &str) -> Result<LabelMatrix, PipelineError>;
}
