use super::Augmentor;
use crate::error::PipelineError;
use crate::pair::ImageLabelPair;

/// Runs an ordered chain of augmentors against the same pair, each seeing the
/// previous one's output. The first failing augmentor short-circuits the
/// chain and its error propagates.
#[derive(new)]
pub struct CombinedAugmentor {
    stages: Vec<Box<dyn Augmentor>>,
}

impl Augmentor for CombinedAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        for stage in &self.stages {
            stage.augment(pair)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{ImageMatrix, LabelMatrix};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingAugmentor {
        order: Arc<AtomicUsize>,
        seen: std::sync::Mutex<Vec<usize>>,
    }

    impl Augmentor for CountingAugmentor {
        fn augment(&self, _pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
            let n = self.order.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(n);
            Ok(())
        }
    }

    struct FailingAugmentor;
    impl Augmentor for FailingAugmentor {
        fn augment(&self, _pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
            Err(PipelineError::Invariant("deliberate failure".to_string()))
        }
    }

    #[test]
    fn runs_stages_in_order() {
        let order = Arc::new(AtomicUsize::new(0));
        let combined = CombinedAugmentor::new(vec![
            Box::new(CountingAugmentor {
                order: order.clone(),
                seen: std::sync::Mutex::new(Vec::new()),
            }),
            Box::new(CountingAugmentor {
                order: order.clone(),
                seen: std::sync::Mutex::new(Vec::new()),
            }),
        ]);

        let mut pair = ImageLabelPair::new(ImageMatrix::zeros(1, 1), LabelMatrix::filled(1, 1, 0));
        combined.augment(&mut pair).unwrap();
        assert_eq!(order.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn short_circuits_on_first_error() {
        let order = Arc::new(AtomicUsize::new(0));
        let combined = CombinedAugmentor::new(vec![
            Box::new(FailingAugmentor),
            Box::new(CountingAugmentor {
                order: order.clone(),
                seen: std::sync::Mutex::new(Vec::new()),
            }),
        ]);
        let mut pair = ImageLabelPair::new(ImageMatrix::zeros(1, 1), LabelMatrix::filled(1, 1, 0));
        assert!(combined.augment(&mut pair).is_err());
        assert_eq!(order.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_chain_is_noop() {
        let combined = CombinedAugmentor::new(vec![]);
        let mut image = ImageMatrix::zeros(2, 2);
        image.set(0, 0, [0.1, 0.2, 0.3]);
        let before = image.clone();
        let mut pair = ImageLabelPair::new(image, LabelMatrix::filled(2, 2, 0));
        combined.augment(&mut pair).unwrap();
        assert_eq!(pair.image, before);
    }
}
