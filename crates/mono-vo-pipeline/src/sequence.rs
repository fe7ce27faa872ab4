//! Validated frame sequences.

use mono_vo_core::GrayImage;

use crate::error::SequenceError;

/// An ordered grayscale frame sequence with uniform dimensions.
///
/// Validation happens once here so the processing loop can assume at least
/// two frames of identical size.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<GrayImage>,
}

impl FrameSequence {
    /// # Errors
    ///
    /// Fails when fewer than two frames are given or any frame differs in
    /// size from the first.
    pub fn new(frames: Vec<GrayImage>) -> Result<Self, SequenceError> {
        if frames.len() < 2 {
            return Err(SequenceError::TooFewFrames(frames.len()));
        }
        let (w, h) = (frames[0].width(), frames[0].height());
        for (index, frame) in frames.iter().enumerate().skip(1) {
            if frame.width() != w || frame.height() != h {
                return Err(SequenceError::MismatchedDimensions {
                    index,
                    got_w: frame.width(),
                    got_h: frame.height(),
                    want_w: w,
                    want_h: h,
                });
            }
        }
        Ok(Self { frames })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn frames(&self) -> &[GrayImage] {
        &self.frames
    }

    /// Iterate over consecutive `(index, earlier, later)` frame pairs.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, &GrayImage, &GrayImage)> {
        self.frames
            .windows(2)
            .enumerate()
            .map(|(i, w)| (i, &w[0], &w[1]))
    }
}
