//! Provider core: one dedicated prefetch worker assembles batches on a
//! background thread and hands them to the consumer over a single-slot
//! condvar handshake. Intra-batch decode fans out across `rayon`; the
//! augmentor chain itself runs sequentially in batch-index order so that a
//! fixed iterator seed and augmentor seed reproduce byte-identical batches
//! regardless of how decode work happened to interleave across threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use rayon::prelude::*;

use crate::augment::Augmentor;
use crate::error::PipelineError;
use crate::iterator::FilenameIterator;
use crate::loader::{ImageLoader, TargetLoader};
use crate::matrix::VOID_LABEL;
use crate::pair::{FilenamePair, ImageLabelPair};
use crate::tensor::Tensor;

/// Which shape the `targets` tensor takes. A binding-time choice threaded
/// through [`DataProvider::new`], not an unconstructed open question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetEncoding {
    /// `(B, H_t, W_t)` of 32-bit signed label index, −1 for void.
    Dense,
    /// `(B, C, H_t, W_t)` of 32-bit float, 1.0 in the class channel.
    OneHot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Targets {
    Dense(Tensor<i32>),
    OneHot(Tensor<f32>),
}

/// One assembled batch: `images` and `targets` share the batch dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub images: Tensor<f32>,
    pub targets: Targets,
}

enum Slot {
    Empty,
    Filled(Result<Batch, PipelineError>),
}

struct Shared {
    slot: Mutex<Slot>,
    cv: Condvar,
    terminate: AtomicBool,
}

struct Assembler {
    augmentor: Arc<dyn Augmentor>,
    image_loader: Arc<dyn ImageLoader>,
    target_loader: Arc<dyn TargetLoader>,
    iterator: Arc<dyn FilenameIterator>,
    batch_size: usize,
    num_classes: usize,
    encoding: TargetEncoding,
    height: usize,
    width: usize,
}

impl Assembler {
    fn load_pair(&self, handle: &FilenamePair) -> Result<ImageLabelPair, PipelineError> {
        let image = self.image_loader.load(handle.image())?;
        let target = self.target_loader.load(handle.target())?;
        Ok(ImageLabelPair::new(image, target))
    }

    fn assemble(&self) -> Result<Batch, PipelineError> {
        let result = self.assemble_inner();
        if let Err(err) = &result {
            log::warn!("batch assembly failed, surfacing on next `next()` call: {err}");
        }
        result
    }

    fn assemble_inner(&self) -> Result<Batch, PipelineError> {
        // Phase 1: acquire this batch's filenames in fixed index order —
        // preserves the iterator policy's deterministic sequence.
        let handles: Vec<FilenamePair> = (0..self.batch_size)
            .map(|_| self.iterator.next())
            .collect::<Result<_, _>>()?;

        // Phase 2: decode in parallel. Pure, no shared mutable state.
        let loaded: Vec<Result<ImageLabelPair, PipelineError>> = handles
            .par_iter()
            .map(|h| self.load_pair(h))
            .collect();

        let mut images = Tensor::zeros(&[self.batch_size, 3, self.height, self.width]);
        let mut targets = match self.encoding {
            TargetEncoding::Dense => {
                Targets::Dense(Tensor::filled(&[self.batch_size, self.height, self.width], -1))
            }
            TargetEncoding::OneHot => Targets::OneHot(Tensor::zeros(&[
                self.batch_size,
                self.num_classes,
                self.height,
                self.width,
            ])),
        };

        // Phase 3: augment sequentially, by index, so stochastic draws from
        // the shared augmentor chain happen in a fixed, reproducible order.
        for (i, pair) in loaded.into_iter().enumerate() {
            let mut pair = pair?;
            self.augmentor.augment(&mut pair)?;
            pair.image.scrub_nans();

            if pair.image.height() != self.height
                || pair.image.width() != self.width
                || pair.target.height() != self.height
                || pair.target.width() != self.width
            {
                return Err(PipelineError::Invariant(format!(
                    "pair {i} has dims {}x{}/{}x{} but batch expects {}x{}",
                    pair.image.height(),
                    pair.image.width(),
                    pair.target.height(),
                    pair.target.width(),
                    self.height,
                    self.width
                )));
            }

            pack_image(&mut images, i, &pair);
            pack_targets(&mut targets, i, &pair, self.num_classes);
        }

        Ok(Batch { images, targets })
    }
}

fn pack_image(images: &mut Tensor<f32>, batch_index: usize, pair: &ImageLabelPair) {
    let (h, w) = (pair.image.height(), pair.image.width());
    for y in 0..h {
        for x in 0..w {
            let px = pair.image.get(y, x);
            for c in 0..3 {
                images.set(&[batch_index, c, y, x], px[c]);
            }
        }
    }
}

fn pack_targets(targets: &mut Targets, batch_index: usize, pair: &ImageLabelPair, num_classes: usize) {
    let (h, w) = (pair.target.height(), pair.target.width());
    match targets {
        Targets::Dense(tensor) => {
            for y in 0..h {
                for x in 0..w {
                    let label = pair.target.get(y, x);
                    let value = if label == VOID_LABEL { -1 } else { label as i32 };
                    tensor.set(&[batch_index, y, x], value);
                }
            }
        }
        Targets::OneHot(tensor) => {
            for y in 0..h {
                for x in 0..w {
                    let label = pair.target.get(y, x);
                    if label != VOID_LABEL && (label as usize) < num_classes {
                        tensor.set(&[batch_index, label as usize, y, x], 1.0);
                    }
                }
            }
        }
    }
}

/// Prefetch-driven batch provider: one background thread assembles batches
/// ahead of the consumer. At most one undelivered batch exists at a time.
pub struct DataProvider {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    iterator: Arc<dyn FilenameIterator>,
    batch_size: usize,
}

impl DataProvider {
    pub fn new(
        augmentor: Arc<dyn Augmentor>,
        image_loader: Arc<dyn ImageLoader>,
        target_loader: Arc<dyn TargetLoader>,
        iterator: Arc<dyn FilenameIterator>,
        batch_size: usize,
        num_classes: usize,
        encoding: TargetEncoding,
    ) -> Result<Self, PipelineError> {
        if batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be greater than zero".to_string(),
            ));
        }
        if num_classes == 0 {
            return Err(PipelineError::Config(
                "num_classes must be greater than zero".to_string(),
            ));
        }
        if iterator.count() == 0 {
            return Err(PipelineError::Exhaustion(
                "iterator has no elements to provide".to_string(),
            ));
        }

        // Probe dimensions with one throwaway pair, run through the full
        // augmentor chain, since Subsample/Crop change spatial dims
        // deterministically given fixed augmentor parameters — the batch
        // tensors must be sized from the post-augment shape, not the raw
        // decoded shape.
        let probe_handle = iterator.next()?;
        let mut probe_pair = {
            let image = image_loader.load(probe_handle.image())?;
            let target = target_loader.load(probe_handle.target())?;
            ImageLabelPair::new(image, target)
        };
        augmentor.augment(&mut probe_pair)?;
        let (height, width) = (probe_pair.image.height(), probe_pair.image.width());
        iterator.reset();

        let assembler = Arc::new(Assembler {
            augmentor,
            image_loader,
            target_loader,
            iterator: iterator.clone(),
            batch_size,
            num_classes,
            encoding,
            height,
            width,
        });

        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot::Empty),
            cv: Condvar::new(),
            terminate: AtomicBool::new(false),
        });

        let worker_shared = shared.clone();
        let worker = std::thread::spawn(move || worker_loop(worker_shared, assembler));

        Ok(Self {
            shared,
            worker: Some(worker),
            iterator,
            batch_size,
        })
    }

    /// Blocks until a batch is available, then takes it and releases the
    /// slot for the next one.
    pub fn next(&self) -> Result<Batch, PipelineError> {
        let mut slot = self.shared.slot.lock().unwrap();
        while matches!(*slot, Slot::Empty) {
            slot = self.shared.cv.wait(slot).unwrap();
        }
        let filled = std::mem::replace(&mut *slot, Slot::Empty);
        self.shared.cv.notify_one();
        match filled {
            Slot::Filled(result) => result,
            Slot::Empty => unreachable!("loop guard only exits on Filled"),
        }
    }

    /// Forwards to the iterator. Does not drain an already-prefetched batch
    /// — the consumer may observe one pre-reset batch after this call; a
    /// benign, documented race, not a bug.
    pub fn reset(&self) {
        self.iterator.reset();
    }

    pub fn count_batches(&self) -> usize {
        self.iterator.count() / self.batch_size
    }
}

fn worker_loop(shared: Arc<Shared>, assembler: Arc<Assembler>) {
    log::debug!("prefetch worker started");
    loop {
        if shared.terminate.load(Ordering::Acquire) {
            log::debug!("prefetch worker observed shutdown before assembling, exiting");
            return;
        }
        let batch = assembler.assemble();

        let mut slot = shared.slot.lock().unwrap();
        while !matches!(*slot, Slot::Empty) {
            if shared.terminate.load(Ordering::Acquire) {
                log::debug!("prefetch worker observed shutdown while waiting for slot, exiting");
                return;
            }
            slot = shared.cv.wait(slot).unwrap();
        }
        if shared.terminate.load(Ordering::Acquire) {
            log::debug!("prefetch worker observed shutdown after acquiring slot, exiting");
            return;
        }
        *slot = Slot::Filled(batch);
        shared.cv.notify_one();
    }
}

impl Drop for DataProvider {
    fn drop(&mut self) {
        log::debug!("signaling prefetch worker to shut down");
        self.shared.terminate.store(true, Ordering::Release);
        // Wake both the worker (if waiting for Empty) and any consumer
        // blocked in `next()`; release the slot either way.
        {
            let mut slot = self.shared.slot.lock().unwrap();
            *slot = Slot::Empty;
        }
        self.shared.cv.notify_all();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        log::debug!("prefetch worker joined");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iterator::SequentialIterator;
    use crate::matrix::{ImageMatrix, LabelMatrix};

    struct ConstImageLoader;
    impl ImageLoader for ConstImageLoader {
        fn load(&self, _path: &str) -> Result<ImageMatrix, PipelineError> {
            Ok(ImageMatrix::zeros(2, 2))
        }
    }

    struct ConstTargetLoader;
    impl TargetLoader for ConstTargetLoader {
        fn load(&self, _path: &str) -> Result<LabelMatrix, PipelineError> {
            let mut m = LabelMatrix::filled(2, 2, VOID_LABEL);
            m.set(0, 0, 1);
            Ok(m)
        }
    }

    struct NoopAugmentor;
    impl Augmentor for NoopAugmentor {
        fn augment(&self, _pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
            Ok(())
        }
    }

    fn files(n: usize) -> Vec<FilenamePair> {
        (0..n)
            .map(|i| FilenamePair::new(format!("{i}.png"), format!("{i}_t.png")).unwrap())
            .collect()
    }

    #[test]
    fn rejects_zero_batch_size() {
        let iterator: Arc<dyn FilenameIterator> = Arc::new(SequentialIterator::new(files(4)).unwrap());
        let result = DataProvider::new(
            Arc::new(NoopAugmentor),
            Arc::new(ConstImageLoader),
            Arc::new(ConstTargetLoader),
            iterator,
            0,
            2,
            TargetEncoding::Dense,
        );
        assert!(result.is_err());
    }

    #[test]
    fn produces_batch_with_dense_void_and_class_values() {
        let iterator: Arc<dyn FilenameIterator> = Arc::new(SequentialIterator::new(files(4)).unwrap());
        let provider = DataProvider::new(
            Arc::new(NoopAugmentor),
            Arc::new(ConstImageLoader),
            Arc::new(ConstTargetLoader),
            iterator,
            2,
            3,
            TargetEncoding::Dense,
        )
        .unwrap();

        let batch = provider.next().unwrap();
        assert_eq!(batch.images.shape(), &[2, 3, 2, 2]);
        match &batch.targets {
            Targets::Dense(t) => {
                assert_eq!(*t.get(&[0, 0, 0]), 1);
                assert_eq!(*t.get(&[0, 0, 1]), -1);
            }
            Targets::OneHot(_) => panic!("expected dense targets"),
        }
    }

    #[test]
    fn one_hot_sums_to_zero_or_one() {
        let iterator: Arc<dyn FilenameIterator> = Arc::new(SequentialIterator::new(files(2)).unwrap());
        let provider = DataProvider::new(
            Arc::new(NoopAugmentor),
            Arc::new(ConstImageLoader),
            Arc::new(ConstTargetLoader),
            iterator,
            1,
            3,
            TargetEncoding::OneHot,
        )
        .unwrap();

        let batch = provider.next().unwrap();
        match &batch.targets {
            Targets::OneHot(t) => {
                for y in 0..2 {
                    for x in 0..2 {
                        let sum: f32 = (0..3).map(|c| *t.get(&[0, c, y, x])).sum();
                        assert!(sum == 0.0 || sum == 1.0);
                    }
                }
            }
            Targets::Dense(_) => panic!("expected one-hot targets"),
        }
    }
}
