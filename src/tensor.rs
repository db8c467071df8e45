//! Row-major contiguous buffer with a fixed-rank shape. Used for the batch's
//! `images` and `targets` outputs; generic over element type so it serves
//! both the `f32` image tensor and the `i32`/`f32` target tensor.

/// A row-major, contiguous, fixed-rank array of `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    data: Vec<T>,
    shape: Vec<usize>,
    strides: Vec<usize>,
}

impl<T: Clone> Tensor<T> {
    pub fn filled(shape: &[usize], value: T) -> Self {
        let len: usize = shape.iter().product();
        Self {
            data: vec![value; len],
            shape: shape.to_vec(),
            strides: row_major_strides(shape),
        }
    }
}

impl<T: Clone + Default> Tensor<T> {
    pub fn zeros(shape: &[usize]) -> Self {
        Self::filled(shape, T::default())
    }
}

impl<T> Tensor<T> {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    #[inline]
    pub fn flat_index(&self, idx: &[usize]) -> usize {
        debug_assert_eq!(idx.len(), self.shape.len());
        idx.iter().zip(&self.strides).map(|(i, s)| i * s).sum()
    }

    #[inline]
    pub fn get(&self, idx: &[usize]) -> &T {
        &self.data[self.flat_index(idx)]
    }

    #[inline]
    pub fn set(&mut self, idx: &[usize], value: T) {
        let flat = self.flat_index(idx);
        self.data[flat] = value;
    }
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1usize; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_has_requested_shape_and_length() {
        let t: Tensor<f32> = Tensor::zeros(&[2, 3, 4, 4]);
        assert_eq!(t.shape(), &[2, 3, 4, 4]);
        assert_eq!(t.as_slice().len(), 2 * 3 * 4 * 4);
    }

    #[test]
    fn get_set_roundtrip_is_row_major() {
        let mut t: Tensor<f32> = Tensor::zeros(&[2, 2]);
        t.set(&[0, 1], 5.0);
        t.set(&[1, 0], 9.0);
        assert_eq!(*t.get(&[0, 1]), 5.0);
        assert_eq!(*t.get(&[1, 0]), 9.0);
        assert_eq!(t.as_slice(), &[0.0, 5.0, 9.0, 0.0]);
    }

    #[test]
    fn filled_sets_every_element() {
        let t: Tensor<i32> = Tensor::filled(&[3], -1);
        assert_eq!(t.as_slice(), &[-1, -1, -1]);
    }
}
