use std::sync::Mutex;

use image::imageops::FilterType;
use image::{ImageBuffer, Luma, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Augmentor;
use crate::error::PipelineError;
use crate::matrix::{ImageMatrix, LabelMatrix, VOID_LABEL};
use crate::pair::ImageLabelPair;
use crate::rng::nondeterministic_seed;

/// Draws `f ~ U(1-r, 1+r)`, resizes both planes to `(floor(H*f), floor(W*f))`
/// (Lanczos for image, nearest for target), then center-crops back to
/// `(H, W)` if `f > 1` or center-embeds into a zero/void-filled canvas if
/// `f < 1`.
pub struct ZoomAugmentor {
    range: f64,
    rng: Mutex<StdRng>,
}

impl ZoomAugmentor {
    pub fn new(range: f64, seed: Option<u64>) -> Result<Self, PipelineError> {
        if !(range > 0.0 && range < 1.0) {
            return Err(PipelineError::Config(
                "zoom range must lie in (0, 1)".to_string(),
            ));
        }
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Ok(Self {
            range,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl Augmentor for ZoomAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        if !pair.dims_match() {
            return Err(PipelineError::Invariant(
                "zoom requires image and target to share dimensions".to_string(),
            ));
        }
        let f: f64 = {
            let mut rng = self.rng.lock().unwrap();
            rng.gen_range((1.0 - self.range)..(1.0 + self.range))
        };

        let h = pair.image.height();
        let w = pair.image.width();
        let new_h = ((h as f64) * f).floor().max(1.0) as usize;
        let new_w = ((w as f64) * f).floor().max(1.0) as usize;

        let resized_image = lanczos_resize(&pair.image, new_h, new_w);
        let resized_target = nearest_resize(&pair.target, new_h, new_w);

        let (final_image, final_target) = if f > 1.0 {
            (
                center_crop_image(&resized_image, h, w),
                center_crop_target(&resized_target, h, w),
            )
        } else {
            (
                center_embed_image(&resized_image, h, w),
                center_embed_target(&resized_target, h, w),
            )
        };

        pair.image = final_image;
        pair.target = final_target;
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

fn nearest_resize(target: &LabelMatrix, new_h: usize, new_w: usize) -> LabelMatrix {
    let (h, w) = (target.height(), target.width());
    let buf: ImageBuffer<Luma<u8>, Vec<u8>> =
        ImageBuffer::from_raw(w as u32, h as u32, target.as_slice().to_vec())
            .expect("label matrix is always h*w");
    let resized = image::imageops::resize(&buf, new_w as u32, new_h as u32, FilterType::Nearest);
    LabelMatrix::new(resized.into_raw(), new_h, new_w)
}

fn center_crop_image(src: &ImageMatrix, out_h: usize, out_w: usize) -> ImageMatrix {
    let off_y = (src.height().saturating_sub(out_h)) / 2;
    let off_x = (src.width().saturating_sub(out_w)) / 2;
    let mut out = ImageMatrix::zeros(out_h, out_w);
    for y in 0..out_h {
        for x in 0..out_w {
            out.set(y, x, src.get(y + off_y, x + off_x));
        }
    }
    out
}

fn center_crop_target(src: &LabelMatrix, out_h: usize, out_w: usize) -> LabelMatrix {
    let off_y = (src.height().saturating_sub(out_h)) / 2;
    let off_x = (src.width().saturating_sub(out_w)) / 2;
    let mut out = LabelMatrix::filled(out_h, out_w, VOID_LABEL);
    for y in 0..out_h {
        for x in 0..out_w {
            out.set(y, x, src.get(y + off_y, x + off_x));
        }
    }
    out
}

fn center_embed_image(src: &ImageMatrix, canvas_h: usize, canvas_w: usize) -> ImageMatrix {
    let off_y = (canvas_h.saturating_sub(src.height())) / 2;
    let off_x = (canvas_w.saturating_sub(src.width())) / 2;
    let mut out = ImageMatrix::zeros(canvas_h, canvas_w);
    for y in 0..src.height() {
        for x in 0..src.width() {
            out.set(y + off_y, x + off_x, src.get(y, x));
        }
    }
    out
}

fn center_embed_target(src: &LabelMatrix, canvas_h: usize, canvas_w: usize) -> LabelMatrix {
    let off_y = (canvas_h.saturating_sub(src.height())) / 2;
    let off_x = (canvas_w.saturating_sub(src.width())) / 2;
    let mut out = LabelMatrix::filled(canvas_h, canvas_w, VOID_LABEL);
    for y in 0..src.height() {
        for x in 0..src.width() {
            out.set(y + off_y, x + off_x, src.get(y, x));
        }
    }
    out
}
