use image::imageops::FilterType;
use image::{ImageBuffer, Rgb};

use super::Augmentor;
use crate::error::PipelineError;
use crate::matrix::{ImageMatrix, LabelMatrix};
use crate::pair::ImageLabelPair;

/// Resizes the image to `(H/f, W/f)` with Lanczos, and the target to the
/// same size by per-tile majority vote: for each output pixel, the argmax
/// label of the `f x f` input block wins unless its count is at most `f^2/2`,
/// in which case the output is the void sentinel. The only augmentor allowed
/// to change the pair's dimensions.
pub struct SubsampleAugmentor {
    factor: usize,
}

impl SubsampleAugmentor {
    pub fn new(factor: usize) -> Result<Self, PipelineError> {
        if factor == 0 {
            return Err(PipelineError::Config(
                "subsample factor must be >= 1".to_string(),
            ));
        }
        Ok(Self { factor })
    }
}

impl Augmentor for SubsampleAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        if !pair.dims_match() {
            return Err(PipelineError::Invariant(
                "subsample requires image and target to share dimensions".to_string(),
            ));
        }
        let f = self.factor;
        let h = pair.image.height();
        let w = pair.image.width();
        let new_h = h / f;
        let new_w = w / f;
        if new_h == 0 || new_w == 0 {
            return Err(PipelineError::Invariant(format!(
                "subsample factor {f} too large for {h}x{w} input"
            )));
        }

        pair.image = lanczos_resize(&pair.image, new_h, new_w);
        pair.target = majority_vote(&pair.target, f, new_h, new_w);
        Ok(())
    }
}

fn lanczos_resize(image: &ImageMatrix, new_h: usize, new_w: usize) -> ImageMatrix {
    let (h, w) = (image.height(), image.width());
    let buf: ImageBuffer<Rgb<f32>, Vec<f32>> =
        ImageBuffer::from_raw(w as u32, h as u32, image.as_slice().to_vec())
            .expect("image matrix is always h*w*3");
    let resized = image::imageops::resize(&buf, new_w as u32, new_h as u32, FilterType::Lanczos3);
    ImageMatrix::new(resized.into_raw(), new_h, new_w)
}

fn majority_vote(target: &LabelMatrix, f: usize, new_h: usize, new_w: usize) -> LabelMatrix {
    let threshold = (f * f) as u32;
    let mut data = vec![0u8; new_h * new_w];
    let mut hist = [0u32; 256];
    for oy in 0..new_h {
        for ox in 0..new_w {
            hist.iter_mut().for_each(|c| *c = 0);
            for dy in 0..f {
                for dx in 0..f {
                    let v = target.get(oy * f + dy, ox * f + dx);
                    hist[v as usize] += 1;
                }
            }
            let (argmax_label, argmax_count) = hist
                .iter()
                .enumerate()
                .max_by_key(|&(_, c)| *c)
                .map(|(i, c)| (i as u8, *c))
                .unwrap();
            let out = if argmax_count * 2 <= threshold {
                crate::matrix::VOID_LABEL
            } else {
                argmax_label
            };
            data[oy * new_w + ox] = out;
        }
    }
    LabelMatrix::new(data, new_h, new_w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_factor() {
        assert!(SubsampleAugmentor::new(0).is_err());
    }

    #[test]
    fn s3_majority_vote_clear_winner() {
        let target = LabelMatrix::new(
            vec![1, 1, 2, 2, 1, 1, 2, 2, 3, 3, 4, 4, 3, 3, 4, 4],
            4,
            4,
        );
        let out = majority_vote(&target, 2, 2, 2);
        assert_eq!(out.get(0, 0), 1);
        assert_eq!(out.get(0, 1), 2);
        assert_eq!(out.get(1, 0), 3);
        assert_eq!(out.get(1, 1), 4);
    }

    #[test]
    fn s3_majority_vote_still_holds_with_minor_mix() {
        let target = LabelMatrix::new(
            vec![1, 1, 2, 3, 1, 1, 2, 2, 3, 3, 4, 4, 3, 3, 4, 4],
            4,
            4,
        );
        let out = majority_vote(&target, 2, 2, 2);
        assert_eq!(out.get(0, 0), 1);
        assert_eq!(out.get(0, 1), 2);
    }

    #[test]
    fn s3_tied_block_becomes_void() {
        // Top-left 2x2 block: 1,1,2,2 -> wait that's a clear tie 2-2, no label exceeds half.
        let target = LabelMatrix::new(
            vec![1, 1, 2, 2, 2, 2, 1, 1, 3, 3, 4, 4, 3, 3, 4, 4],
            4,
            4,
        );
        let out = majority_vote(&target, 2, 2, 2);
        assert_eq!(out.get(0, 0), crate::matrix::VOID_LABEL);
    }
}
