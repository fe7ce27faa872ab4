//! Matched point sets between two frames.
//!
//! [`Correspondences`] is the canonical hand-off type between tracking and
//! motion estimation: point `i` in the first frame matches point `i` in the
//! second. The constructor enforces the equal-length invariant so downstream
//! code can index both sides freely.

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::math::Pt2;

/// Paired 2D observations of the same scene points in two frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Correspondences {
    /// Observations in the first (earlier) frame.
    pub points_a: Vec<Pt2>,
    /// Observations in the second (later) frame.
    pub points_b: Vec<Pt2>,
}

impl Correspondences {
    /// Construct a correspondence set.
    ///
    /// # Errors
    ///
    /// Returns an error if the two point counts differ.
    pub fn new(points_a: Vec<Pt2>, points_b: Vec<Pt2>) -> Result<Self> {
        ensure!(
            points_a.len() == points_b.len(),
            "point counts must match: {} vs {}",
            points_a.len(),
            points_b.len()
        );
        Ok(Self { points_a, points_b })
    }

    /// Number of matched pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.points_a.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points_a.is_empty()
    }

    /// Iterate over matched `(first frame, second frame)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Pt2, &Pt2)> {
        self.points_a.iter().zip(self.points_b.iter())
    }

    /// Keep only the pairs at the given indices.
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            points_a: indices.iter().map(|&i| self.points_a[i]).collect(),
            points_b: indices.iter().map(|&i| self.points_b[i]).collect(),
        }
    }
}
