use crate::error::PipelineError;
use crate::loader::{ImageLoader, TargetLoader};
use crate::pair::{FilenamePair, ImageLabelPair};

/// Composes an [`ImageLoader`] and a [`TargetLoader`] into one step that
/// turns a filename pair into a loaded image/target pair. Both loads run
/// independently; the first error propagates.
pub struct PairLoader<I: ImageLoader, T: TargetLoader> {
    image_loader: I,
    target_loader: T,
}

impl<I: ImageLoader, T: TargetLoader> PairLoader<I, T> {
    pub fn new(image_loader: I, target_loader: T) -> Self {
        Self {
            image_loader,
            target_loader,
        }
    }

    pub fn load(&self, handle: &FilenamePair) -> Result<ImageLabelPair, PipelineError> {
        let image = self.image_loader.load(handle.image())?;
        let target = self.target_loader.load(handle.target())?;
        Ok(ImageLabelPair::new(image, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{ImageMatrix, LabelMatrix};

    struct StubImageLoader;
    impl ImageLoader for StubImageLoader {
        fn load(&self, _path: &str) -> Result<ImageMatrix, PipelineError> {
            Ok(ImageMatrix::zeros(2, 2))
        }
    }

    struct StubTargetLoader;
    impl TargetLoader for StubTargetLoader {
        fn load(&self, _path: &str) -> Result<LabelMatrix, PipelineError> {
            Ok(LabelMatrix::filled(2, 2, 0))
        }
    }

    struct FailingImageLoader;
    impl ImageLoader for FailingImageLoader {
        fn load(&self, path: &str) -> Result<ImageMatrix, PipelineError> {
            Err(PipelineError::Io {
                path: path.to_string(),
                source: "decoder returned no data".to_string(),
            })
        }
    }

    #[test]
    fn loads_both_halves() {
        let loader = PairLoader::new(StubImageLoader, StubTargetLoader);
        let handle = FilenamePair::new("a.png", "a_t.png").unwrap();
        let pair = loader.load(&handle).unwrap();
        assert_eq!(pair.image.height(), 2);
        assert_eq!(pair.target.height(), 2);
    }

    #[test]
    fn propagates_image_loader_error() {
        let loader = PairLoader::new(FailingImageLoader, StubTargetLoader);
        let handle = FilenamePair::new("a.png", "a_t.png").unwrap();
        assert!(loader.load(&handle).is_err());
    }
}
