//! Grayscale image pyramid with separable Gaussian blur and 2× decimation.
//!
//! Level 0 converts the 8-bit input to [`ImageF32`] in `[0, 1]`; each
//! subsequent level applies a separable 5-tap Gaussian (kernel
//! `[1, 4, 6, 4, 1] / 16`) followed by 2× decimation. Borders are handled by
//! replication. Coarse levels let the tracker handle displacements larger
//! than its search window.

use crate::image::{GrayImage, ImageF32};

#[derive(Debug, Clone)]
pub struct Pyramid {
    pub levels: Vec<ImageF32>,
}

impl Pyramid {
    /// Build an `n_levels`-deep pyramid from an 8-bit frame.
    ///
    /// Always produces at least one level. Levels stop early if a dimension
    /// would collapse below two pixels.
    pub fn build(gray: &GrayImage, n_levels: usize) -> Self {
        let mut levels = Vec::with_capacity(n_levels.max(1));
        levels.push(ImageF32::from_gray(gray));

        for lvl in 1..n_levels.max(1) {
            let prev = &levels[lvl - 1];
            if prev.width() < 4 || prev.height() < 4 {
                break;
            }
            let mut blurred = ImageF32::zeros(prev.width(), prev.height());
            gaussian5_separable(prev, &mut blurred);

            let nw = prev.width().div_ceil(2);
            let nh = prev.height().div_ceil(2);
            let mut down = ImageF32::zeros(nw, nh);
            for y in 0..nh {
                for x in 0..nw {
                    let sx = (x * 2).min(prev.width() - 1);
                    let sy = (y * 2).min(prev.height() - 1);
                    down.set(x, y, blurred.get(sx, sy));
                }
            }
            levels.push(down);
        }

        Self { levels }
    }

    #[inline]
    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }
}

/// 5-tap separable Gaussian (sigma ≈ 1) with replicated borders.
fn gaussian5_separable(inp: &ImageF32, out: &mut ImageF32) {
    let w = inp.width();
    let h = inp.height();
    let mut tmp = ImageF32::zeros(w, h);

    for y in 0..h {
        for x in 0..w {
            let xm1 = x.saturating_sub(1);
            let xm2 = x.saturating_sub(2);
            let xp1 = (x + 1).min(w - 1);
            let xp2 = (x + 2).min(w - 1);
            let v = (inp.get(xm2, y)
                + 4.0 * inp.get(xm1, y)
                + 6.0 * inp.get(x, y)
                + 4.0 * inp.get(xp1, y)
                + inp.get(xp2, y))
                * (1.0 / 16.0);
            tmp.set(x, y, v);
        }
    }

    for y in 0..h {
        let ym1 = y.saturating_sub(1);
        let ym2 = y.saturating_sub(2);
        let yp1 = (y + 1).min(h - 1);
        let yp2 = (y + 2).min(h - 1);
        for x in 0..w {
            let v = (tmp.get(x, ym2)
                + 4.0 * tmp.get(x, ym1)
                + 6.0 * tmp.get(x, y)
                + 4.0 * tmp.get(x, yp1)
                + tmp.get(x, yp2))
                * (1.0 / 16.0);
            out.set(x, y, v);
        }
    }
}
