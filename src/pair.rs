use crate::error::PipelineError;
use crate::matrix::{ImageMatrix, LabelMatrix};

/// Two non-empty UTF-8 paths, immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilenamePair {
    image: String,
    target: String,
}

impl FilenamePair {
    pub fn new(image: impl Into<String>, target: impl Into<String>) -> Result<Self, PipelineError> {
        let image = image.into();
        let target = target.into();
        if image.is_empty() || target.is_empty() {
            return Err(PipelineError::Config(
                "filename pair paths must be non-empty".to_string(),
            ));
        }
        Ok(Self { image, target })
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// A loaded, mutable image/target pair. Carries a 3-channel float image and
/// a 1-channel 8-bit target; augmentors mutate both in place.
#[derive(Debug, Clone)]
pub struct ImageLabelPair {
    pub image: ImageMatrix,
    pub target: LabelMatrix,
}

impl ImageLabelPair {
    pub fn new(image: ImageMatrix, target: LabelMatrix) -> Self {
        Self { image, target }
    }

    /// Whether image and target describe the same pixel grid. Required at
    /// augmentor boundaries that need geometric coherence (translation,
    /// zoom, rotation, crop) — everything except subsample.
    pub fn dims_match(&self) -> bool {
        self.image.height() == self.target.height() && self.image.width() == self.target.width()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_paths() {
        assert!(FilenamePair::new("", "target.png").is_err());
        assert!(FilenamePair::new("image.png", "").is_err());
    }

    #[test]
    fn accepts_non_empty_paths() {
        let pair = FilenamePair::new("a.png", "a_t.png").unwrap();
        assert_eq!(pair.image(), "a.png");
        assert_eq!(pair.target(), "a_t.png");
    }

    #[test]
    fn dims_match_detects_mismatch() {
        let pair = ImageLabelPair::new(ImageMatrix::zeros(4, 4), LabelMatrix::filled(2, 2, 255));
        assert!(!pair.dims_match());
    }
}
