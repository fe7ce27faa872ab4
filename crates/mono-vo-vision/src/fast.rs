//! FAST segment-test corner detection.
//!
//! A pixel is a corner when a contiguous arc of at least `arc_length` pixels
//! on the 16-pixel Bresenham ring of radius 3 is uniformly brighter or darker
//! than the center by more than the threshold. A four-pixel cardinal pretest
//! rejects most candidates cheaply, and 3×3 non-maximum suppression on a SAD
//! score keeps only locally strongest responses.

use mono_vo_core::{GrayImage, Pt2};
use serde::{Deserialize, Serialize};

/// Radius-3 Bresenham ring, clockwise from twelve o'clock.
const RING: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Detection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FastOptions {
    /// Minimum absolute intensity difference to the center.
    pub threshold: u8,
    /// Required contiguous arc length on the 16-pixel ring (9 gives FAST-9).
    pub arc_length: usize,
    /// Apply 3×3 non-maximum suppression on the corner score.
    pub nonmax_suppression: bool,
}

impl Default for FastOptions {
    fn default() -> Self {
        Self {
            threshold: 20,
            arc_length: 9,
            nonmax_suppression: true,
        }
    }
}

/// A detected corner with its suppression score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub x: usize,
    pub y: usize,
    pub score: u32,
}

impl Corner {
    #[inline]
    pub fn position(&self) -> Pt2 {
        Pt2::new(self.x as f64, self.y as f64)
    }
}

/// Detect FAST corners in a grayscale image.
///
/// Pixels closer than 3 to the border are never tested. An image without
/// corners (a blank frame, say) yields an empty vector.
pub fn detect_corners(image: &GrayImage, opts: &FastOptions) -> Vec<Corner> {
    let w = image.width();
    let h = image.height();
    if w < 7 || h < 7 {
        return Vec::new();
    }

    let mut scores = vec![0u32; w * h];
    let mut candidates = Vec::new();

    for y in 3..h - 3 {
        for x in 3..w - 3 {
            let center = image.get(x, y) as i32;
            let t = opts.threshold as i32;

            if !cardinal_pretest(image, x, y, center, t, opts.arc_length) {
                continue;
            }

            let ring: [i32; 16] = std::array::from_fn(|i| {
                let (dx, dy) = RING[i];
                image.get((x as i32 + dx) as usize, (y as i32 + dy) as usize) as i32
            });

            if !has_arc(&ring, center, t, opts.arc_length) {
                continue;
            }

            let score: u32 = ring
                .iter()
                .map(|&v| ((v - center).abs() - t).max(0) as u32)
                .sum();
            scores[y * w + x] = score;
            candidates.push(Corner { x, y, score });
        }
    }

    if !opts.nonmax_suppression {
        return candidates;
    }

    candidates
        .into_iter()
        .filter(|c| {
            let mut is_max = true;
            'outer: for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = (c.x as i32 + dx) as usize;
                    let ny = (c.y as i32 + dy) as usize;
                    if scores[ny * w + nx] > c.score {
                        is_max = false;
                        break 'outer;
                    }
                }
            }
            is_max
        })
        .collect()
}

/// Cheap rejection on the four cardinal ring pixels (indices 0, 4, 8, 12).
///
/// The cardinals are spaced four apart, so a contiguous arc of 12 covers at
/// least three of them but an arc of 9 may cover only two. The required
/// count follows the configured arc length; short arcs get no useful
/// pretest and only need a single differing cardinal.
#[inline]
fn cardinal_pretest(
    image: &GrayImage,
    x: usize,
    y: usize,
    center: i32,
    t: i32,
    arc_length: usize,
) -> bool {
    let needed = match arc_length {
        12.. => 3,
        8..=11 => 2,
        _ => 1,
    };

    let mut brighter = 0;
    let mut darker = 0;
    for &i in &[0usize, 4, 8, 12] {
        let (dx, dy) = RING[i];
        let v = image.get((x as i32 + dx) as usize, (y as i32 + dy) as usize) as i32;
        if v >= center + t {
            brighter += 1;
        } else if v <= center - t {
            darker += 1;
        }
    }
    brighter >= needed || darker >= needed
}

/// Wrap-around search for a contiguous brighter or darker arc.
fn has_arc(ring: &[i32; 16], center: i32, t: i32, arc_length: usize) -> bool {
    let mut run_brighter = 0usize;
    let mut run_darker = 0usize;
    // Double pass over the ring handles arcs that wrap past index 15.
    for i in 0..32 {
        let v = ring[i % 16];
        if v >= center + t {
            run_brighter += 1;
            run_darker = 0;
        } else if v <= center - t {
            run_darker += 1;
            run_brighter = 0;
        } else {
            run_brighter = 0;
            run_darker = 0;
        }
        if run_brighter >= arc_length || run_darker >= arc_length {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bright_square(w: usize, h: usize, x0: usize, y0: usize, side: usize) -> GrayImage {
        let mut data = vec![30u8; w * h];
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                data[y * w + x] = 220;
            }
        }
        GrayImage::from_vec(w, h, data).unwrap()
    }

    #[test]
    fn blank_image_has_no_corners() {
        let img = GrayImage::filled(64, 64, 127).unwrap();
        let corners = detect_corners(&img, &FastOptions::default());
        assert!(corners.is_empty());
    }

    #[test]
    fn detects_square_corners() {
        let img = bright_square(64, 64, 20, 20, 16);
        let corners = detect_corners(&img, &FastOptions::default());
        assert!(!corners.is_empty());

        // Every detection should sit near one of the four square corners.
        let vertices = [(20.0, 20.0), (35.0, 20.0), (20.0, 35.0), (35.0, 35.0)];
        for c in &corners {
            let near = vertices.iter().any(|&(vx, vy)| {
                let d = ((c.x as f64 - vx).powi(2) + (c.y as f64 - vy).powi(2)).sqrt();
                d < 4.0
            });
            assert!(near, "corner at ({}, {}) away from any vertex", c.x, c.y);
        }
    }

    #[test]
    fn default_arc_nine_keeps_block_corners() {
        // An axis-aligned block corner puts only two of the four cardinal
        // ring pixels on the dark side, which a FAST-9 pretest must accept.
        let mut data = vec![20u8; 64 * 64];
        for (sx, sy) in [(10, 10), (40, 12), (22, 44), (48, 48)] {
            for y in sy..sy + 8 {
                for x in sx..sx + 8 {
                    data[y * 64 + x] = 230;
                }
            }
        }
        let img = GrayImage::from_vec(64, 64, data).unwrap();
        let corners = detect_corners(&img, &FastOptions::default());
        assert!(
            corners.len() >= 4,
            "expected corners on every block, got {}",
            corners.len()
        );
    }

    #[test]
    fn suppression_thins_responses() {
        let img = bright_square(64, 64, 20, 20, 16);
        let with_nms = detect_corners(&img, &FastOptions::default());
        let without = detect_corners(
            &img,
            &FastOptions {
                nonmax_suppression: false,
                ..Default::default()
            },
        );
        assert!(with_nms.len() <= without.len());
    }

    #[test]
    fn tiny_image_is_empty() {
        let img = GrayImage::filled(6, 6, 0).unwrap();
        assert!(detect_corners(&img, &FastOptions::default()).is_empty());
    }

    #[test]
    fn higher_threshold_detects_fewer_corners() {
        let img = bright_square(64, 64, 20, 20, 16);
        let low = detect_corners(
            &img,
            &FastOptions {
                threshold: 10,
                ..Default::default()
            },
        );
        let high = detect_corners(
            &img,
            &FastOptions {
                threshold: 120,
                ..Default::default()
            },
        );
        assert!(high.len() <= low.len());
    }
}
