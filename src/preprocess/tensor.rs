use ndarray::Array4;

pub const CHANNELS: usize = 3;
pub const INPUT_SIZE: usize = 224;

/// Normalized model input, NCHW with a batch of one.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageTensor {
    data: Array4<f32>,
}

impl ImageTensor {
    pub const SHAPE: [usize; 4] = [1, CHANNELS, INPUT_SIZE, INPUT_SIZE];

    /// Returns `None` unless `data` has shape `(1, 3, 224, 224)`.
    pub fn new(data: Array4<f32>) -> Option<Self> {
        if data.shape() != &Self::SHAPE[..] {
            return None;
        }
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };
        Some(Self { data })
    }

    pub fn from_fn(f: impl FnMut((usize, usize, usize, usize)) -> f32) -> Self {
        Self {
            data: Array4::from_shape_fn((1, CHANNELS, INPUT_SIZE, INPUT_SIZE), f),
        }
    }

    pub fn zeros() -> Self {
        Self::from_fn(|_| 0.0)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn as_array(&self) -> &Array4<f32> {
        &self.data
    }

    pub fn as_slice(&self) -> &[f32] {
        // always standard layout, see `new` and `from_fn`
        self.data.as_slice().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Axis;

    #[test]
    fn test_new_rejects_wrong_shape() {
        assert!(ImageTensor::new(Array4::zeros((1, 3, 32, 32))).is_none());
        assert!(ImageTensor::new(Array4::zeros((2, 3, 224, 224))).is_none());
        assert!(ImageTensor::new(Array4::zeros((1, 3, 224, 224))).is_some());
    }

    #[test]
    fn test_new_normalizes_layout() {
        let mut nhwc = Array4::<f32>::zeros((1, 224, 224, 3));
        nhwc[[0, 2, 3, 1]] = 7.0;
        let nchw_view = nhwc.permuted_axes([0, 3, 1, 2]);
        assert!(!nchw_view.is_standard_layout());

        let tensor = ImageTensor::new(nchw_view).unwrap();

        assert_eq!(tensor.as_slice().len(), 3 * 224 * 224);
        assert_eq!(tensor.as_array()[[0, 1, 2, 3]], 7.0);
        assert_eq!(tensor.as_slice()[224 * 224 + 2 * 224 + 3], 7.0);
        assert_eq!(tensor.as_array().len_of(Axis(1)), 3);
    }

    #[test]
    fn test_slice_is_channel_first() {
        let tensor = ImageTensor::from_fn(|(_, c, _, _)| c as f32);
        let slice = tensor.as_slice();

        assert_eq!(slice[0], 0.0);
        assert_eq!(slice[224 * 224], 1.0);
        assert_eq!(slice[2 * 224 * 224], 2.0);
    }
}
