//! Grayscale image containers.
//!
//! Two storage types are provided: [`GrayImage`] for 8-bit input frames as
//! delivered by the ingestion side, and [`ImageF32`] for float pyramid levels
//! in `[0, 1]`. Both are compact row-major buffers with `stride == width`.
//! Frames are immutable once produced; tracking assumes consecutive frames
//! share dimensions.

use anyhow::{ensure, Result};

/// An 8-bit grayscale image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl GrayImage {
    /// Create an image from a row-major pixel buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer length does not equal `width * height`
    /// or either dimension is zero.
    pub fn from_vec(width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        ensure!(width > 0 && height > 0, "image dimensions must be non-zero");
        ensure!(
            data.len() == width * height,
            "pixel buffer length {} does not match {}x{}",
            data.len(),
            width,
            height
        );
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Create a constant-intensity image.
    pub fn filled(width: usize, height: usize, value: u8) -> Result<Self> {
        Self::from_vec(width, height, vec![value; width * height])
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn same_dimensions(&self, other: &GrayImage) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// A float grayscale image with values nominally in `[0, 1]`.
#[derive(Debug, Clone)]
pub struct ImageF32 {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl ImageF32 {
    pub fn zeros(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    /// Convert an 8-bit image to float in `[0, 1]`.
    pub fn from_gray(src: &GrayImage) -> Self {
        let data = src.data().iter().map(|&v| v as f32 / 255.0).collect();
        Self {
            width: src.width(),
            height: src.height(),
            data,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: f32) {
        self.data[y * self.width + x] = v;
    }

    /// Bilinear sample at a sub-pixel position, clamping to the border.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let max_x = (self.width - 1) as f32;
        let max_y = (self.height - 1) as f32;
        let x = x.clamp(0.0, max_x);
        let y = y.clamp(0.0, max_y);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = self.get(x0, y0) * (1.0 - fx) + self.get(x1, y0) * fx;
        let bot = self.get(x0, y1) * (1.0 - fx) + self.get(x1, y1) * fx;
        top * (1.0 - fy) + bot * fy
    }
}
