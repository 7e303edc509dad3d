use crate::error::{MatchError, Result};

/// A single 8-bit grayscale raster.
/// Immutable after construction; rows are `stride` bytes apart and only
/// the first `width` bytes of each row are image samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    stride: usize,
    data: Vec<u8>,
}

impl GrayImage {
    /// Wrap a tightly packed row-major buffer (`stride == width`).
    pub fn from_raw(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        Self::from_raw_with_stride(width, height, width, data)
    }

    /// Wrap a row-major buffer with an explicit row stride.
    pub fn from_raw_with_stride(
        width: usize,
        height: usize,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self> {
        if stride < width {
            return Err(MatchError::InvalidImage(format!(
                "stride {stride} smaller than width {width}"
            )));
        }
        if data.len() != stride * height {
            return Err(MatchError::InvalidImage(format!(
                "buffer length {} does not match {stride}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub(crate) fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            stride: width,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The `width` samples of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.stride + x]
    }

    /// The underlying buffer, including any padding past `width`.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
