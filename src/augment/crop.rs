use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Augmentor;
use crate::error::PipelineError;
use crate::matrix::{ImageMatrix, LabelMatrix, VOID_LABEL};
use crate::pair::ImageLabelPair;
use crate::rng::nondeterministic_seed;

/// Extracts an `s x s` window whose top-left position is sampled
/// proportionally to the class-entropy of the window's label histogram.
///
/// Window histograms are computed from `num_classes` per-class 2-D summed
/// area tables rather than the literal corner-correction recurrence: both
/// give the same `O(H*W*C)` total cost, and a summed-area table makes every
/// window query O(1) regardless of border position, so the construction
/// below doesn't special-case the top row, left column, or origin. Void
/// pixels (the sentinel, or any id outside `0..num_classes`) never
/// contribute to a class bucket.
pub struct CropAugmentor {
    size: usize,
    num_classes: usize,
    rng: Mutex<StdRng>,
}

impl CropAugmentor {
    pub fn new(size: usize, num_classes: usize, seed: Option<u64>) -> Result<Self, PipelineError> {
        if size == 0 {
            return Err(PipelineError::Config(
                "crop size must be greater than zero".to_string(),
            ));
        }
        if num_classes == 0 {
            return Err(PipelineError::Config(
                "crop requires at least one class".to_string(),
            ));
        }
        let seed = seed.unwrap_or_else(nondeterministic_seed);
        Ok(Self {
            size,
            num_classes,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        })
    }
}

impl Augmentor for CropAugmentor {
    fn augment(&self, pair: &mut ImageLabelPair) -> Result<(), PipelineError> {
        if !pair.dims_match() {
            return Err(PipelineError::Invariant(
                "crop requires image and target to share dimensions".to_string(),
            ));
        }
        let (h, w) = (pair.target.height(), pair.target.width());
        if self.size > h || self.size > w {
            return Err(PipelineError::Config(format!(
                "crop size {} exceeds target dimensions {}x{}",
                self.size, h, w
            )));
        }

        let tables = build_class_tables(&pair.target, self.num_classes);
        let rows = h - self.size + 1;
        let cols = w - self.size + 1;

        let mut scores = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                scores.push(window_entropy_score(&tables, i, j, self.size));
            }
        }

        let total: f64 = scores.iter().sum();
        let cumulative: Vec<f64> = if total <= 0.0 {
            // Every window is void-only: fall back to a uniform distribution
            // over positions rather than dividing by zero.
            let n = scores.len() as f64;
            let mut acc = 0.0;
            scores.iter().map(|_| { acc += 1.0 / n; acc }).collect()
        } else {
            let mut acc = 0.0;
            scores.iter().map(|s| { acc += s / total; acc }).collect()
        };

        let u: f64 = {
            let mut rng = self.rng.lock().unwrap();
            rng.gen_range(0.0..1.0)
        };
        // Half-open bins [c_{k-1}, c_k): land on the upper bin on an exact
        // boundary hit rather than the lower one.
        let flat = cumulative.partition_point(|&c| c <= u).min(cumulative.len() - 1);
        let (top, left) = (flat / cols, flat % cols);

        pair.image = crop_image(&pair.image, top, left, self.size);
        pair.target = crop_target(&pair.target, top, left, self.size);
        Ok(())
    }
}

/// `tables[c][y][x]` is the sum of class-`c` indicators over the rectangle
/// `[0, y) x [0, x)`, i.e. a `(H+1) x (W+1)` summed-area table.
struct ClassTables {
    tables: Vec<Vec<f64>>,
    height: usize,
    width: usize,
}

fn build_class_tables(target: &LabelMatrix, num_classes: usize) -> ClassTables {
    let (h, w) = (target.height(), target.width());
    let stride = w + 1;
    let mut tables = vec![vec![0.0f64; (h + 1) * stride]; num_classes];

    for (c, table) in tables.iter_mut().enumerate() {
        for y in 0..h {
            for x in 0..w {
                let label = target.get(y, x);
                let indicator = if label != VOID_LABEL && label as usize == c {
                    1.0
                } else {
                    0.0
                };
                let idx = (y + 1) * stride + (x + 1);
                let above = idx - stride;
                let left = idx - 1;
                let above_left = above - 1;
                table[idx] = table[above] + table[left] - table[above_left] + indicator;
            }
        }
    }

    ClassTables {
        tables,
        height: h,
        width: w,
    }
}

fn window_sum(table: &[f64], width: usize, top: usize, left: usize, size: usize) -> f64 {
    let (y0, x0, y1, x1) = (top, left, top + size, left + size);
    let stride = width + 1;
    table[y1 * stride + x1] - table[y0 * stride + x1] - table[y1 * stride + x0]
        + table[y0 * stride + x0]
}

fn window_entropy_score(tables: &ClassTables, top: usize, left: usize, size: usize) -> f64 {
    let mut total = 0.0;
    let mut neg_sum_nlogn = 0.0;
    for table in &tables.tables {
        let n = window_sum(table, tables.width, top, left, size);
        if n > 0.0 {
            neg_sum_nlogn -= n * n.ln();
            total += n;
        }
    }
    if total <= 0.0 {
        return 0.0;
    }
    let score = neg_sum_nlogn + total * total.ln();
    (score / (size * size) as f64).max(0.0)
}

fn crop_image(src: &ImageMatrix, top: usize, left: usize, size: usize) -> ImageMatrix {
    let mut out = ImageMatrix::zeros(size, size);
    for y in 0..size {
        for x in 0..size {
            out.set(y, x, src.get(top + y, left + x));
        }
    }
    out
}

fn crop_target(src: &LabelMatrix, top: usize, left: usize, size: usize) -> LabelMatrix {
    let mut out = LabelMatrix::filled(size, size, VOID_LABEL);
    for y in 0..size {
        for x in 0..size {
            out.set(y, x, src.get(top + y, left + x));
        }
    }
    out
}
