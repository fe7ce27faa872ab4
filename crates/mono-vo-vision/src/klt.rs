//! Pyramidal Lucas-Kanade sparse optical flow.
//!
//! Forward-additive LK over a Gaussian pyramid: the displacement estimated at
//! a coarse level is doubled and used as the starting guess one level finer.
//! Each level iterates `H·δ = b` updates until the step shrinks below the
//! convergence epsilon or the iteration budget runs out. A singular normal
//! matrix (textureless window) marks the track [`TrackStatus::Lost`]; a final
//! position outside the frame marks it [`TrackStatus::OutOfBounds`].

use log::debug;
use mono_vo_core::{Correspondences, GrayImage, ImageF32, Pt2, Pyramid};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tracking failures that the caller cannot recover from by filtering.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("no input points to track")]
    NoInputPoints,
    #[error("frame dimensions differ: {0}x{1} vs {2}x{3}")]
    MismatchedFrames(usize, usize, usize, usize),
}

/// Per-point outcome of one tracking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    Tracked,
    /// The window had no usable texture or the solver diverged.
    Lost,
    /// The converged position left the image bounds.
    OutOfBounds,
}

/// Tracker parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerOptions {
    /// Half window size; the full patch is `(2h+1) × (2h+1)`.
    pub window_half: usize,
    /// Pyramid depth including the base level.
    pub levels: usize,
    /// Iteration budget per pyramid level.
    pub max_iterations: usize,
    /// Convergence threshold on the update step norm, in pixels.
    pub epsilon: f32,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            window_half: 10,
            levels: 3,
            max_iterations: 30,
            epsilon: 0.01,
        }
    }
}

/// Pyramidal Lucas-Kanade tracker.
#[derive(Debug, Clone, Default)]
pub struct LkTracker {
    opts: TrackerOptions,
}

impl LkTracker {
    pub fn new(opts: TrackerOptions) -> Self {
        Self { opts }
    }

    /// Track `points` from `prev` into `next`, keeping only surviving pairs.
    ///
    /// The returned correspondences hold the original position and the
    /// tracked position for every point whose status came back
    /// [`TrackStatus::Tracked`]. An all-lost result is a valid empty set.
    ///
    /// # Errors
    ///
    /// Fails if `points` is empty or the frames differ in size.
    pub fn track(
        &self,
        prev: &GrayImage,
        next: &GrayImage,
        points: &[Pt2],
    ) -> Result<Correspondences, TrackError> {
        let tracked = self.track_points(prev, next, points)?;

        let mut points_a = Vec::with_capacity(points.len());
        let mut points_b = Vec::with_capacity(points.len());
        for (i, (pos, status)) in tracked.iter().enumerate() {
            if *status == TrackStatus::Tracked {
                points_a.push(points[i]);
                points_b.push(*pos);
            }
        }
        debug!(
            "tracked {}/{} points across frame pair",
            points_a.len(),
            points.len()
        );

        Ok(Correspondences {
            points_a,
            points_b,
        })
    }

    /// Track `points` and report a position and status per input point.
    pub fn track_points(
        &self,
        prev: &GrayImage,
        next: &GrayImage,
        points: &[Pt2],
    ) -> Result<Vec<(Pt2, TrackStatus)>, TrackError> {
        if points.is_empty() {
            return Err(TrackError::NoInputPoints);
        }
        if !prev.same_dimensions(next) {
            return Err(TrackError::MismatchedFrames(
                prev.width(),
                prev.height(),
                next.width(),
                next.height(),
            ));
        }

        let pyr_prev = Pyramid::build(prev, self.opts.levels);
        let pyr_next = Pyramid::build(next, self.opts.levels);
        let depth = pyr_prev.num_levels().min(pyr_next.num_levels());

        Ok(points
            .iter()
            .map(|p| self.track_one(&pyr_prev, &pyr_next, p, depth))
            .collect())
    }

    fn track_one(
        &self,
        pyr_prev: &Pyramid,
        pyr_next: &Pyramid,
        point: &Pt2,
        depth: usize,
    ) -> (Pt2, TrackStatus) {
        let px = point.x as f32;
        let py = point.y as f32;

        let mut dx = 0.0f32;
        let mut dy = 0.0f32;

        for lvl in (0..depth).rev() {
            let scale = 1.0 / (1 << lvl) as f32;
            let lx = px * scale;
            let ly = py * scale;

            match self.refine_at_level(&pyr_prev.levels[lvl], &pyr_next.levels[lvl], lx, ly, dx, dy)
            {
                Some((rx, ry)) => {
                    dx = rx;
                    dy = ry;
                }
                None => return (*point, TrackStatus::Lost),
            }

            if lvl > 0 {
                dx *= 2.0;
                dy *= 2.0;
            }
        }

        let fx = px + dx;
        let fy = py + dy;
        let base = &pyr_next.levels[0];
        if fx < 0.0 || fy < 0.0 || fx > (base.width() - 1) as f32 || fy > (base.height() - 1) as f32
        {
            return (*point, TrackStatus::OutOfBounds);
        }

        (Pt2::new(fx as f64, fy as f64), TrackStatus::Tracked)
    }

    /// One level of forward-additive LK. Returns the refined displacement, or
    /// `None` when the normal matrix is singular.
    fn refine_at_level(
        &self,
        prev: &ImageF32,
        next: &ImageF32,
        lx: f32,
        ly: f32,
        mut dx: f32,
        mut dy: f32,
    ) -> Option<(f32, f32)> {
        let h = self.opts.window_half as i32;

        for _ in 0..self.opts.max_iterations {
            let mut hxx = 0.0f32;
            let mut hxy = 0.0f32;
            let mut hyy = 0.0f32;
            let mut bx = 0.0f32;
            let mut by = 0.0f32;

            for wy in -h..=h {
                for wx in -h..=h {
                    let tx = lx + wx as f32;
                    let ty = ly + wy as f32;
                    let cx = tx + dx;
                    let cy = ty + dy;

                    let template = prev.sample_bilinear(tx, ty);
                    let current = next.sample_bilinear(cx, cy);

                    let gx =
                        0.5 * (next.sample_bilinear(cx + 1.0, cy) - next.sample_bilinear(cx - 1.0, cy));
                    let gy =
                        0.5 * (next.sample_bilinear(cx, cy + 1.0) - next.sample_bilinear(cx, cy - 1.0));

                    let err = template - current;
                    hxx += gx * gx;
                    hxy += gx * gy;
                    hyy += gy * gy;
                    bx += err * gx;
                    by += err * gy;
                }
            }

            let det = hxx * hyy - hxy * hxy;
            if det.abs() < 1e-7 {
                return None;
            }

            let sx = (hyy * bx - hxy * by) / det;
            let sy = (hxx * by - hxy * bx) / det;
            dx += sx;
            dy += sy;

            if (sx * sx + sy * sy).sqrt() < self.opts.epsilon {
                break;
            }
        }

        Some((dx, dy))
    }
}
