//! Brightness filter: drop detections on near-black or near-white regions

use image::GrayImage;
use crate::types::Candidate;
use crate::{BRIGHTNESS_HIGH, BRIGHTNESS_LOW};

/// Open interval (low, high) of accepted mean luminance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessBand {
    low: f64,
    high: f64,
}

impl Default for BrightnessBand {
    fn default() -> Self {
        Self::new(BRIGHTNESS_LOW, BRIGHTNESS_HIGH)
    }
}

impl BrightnessBand {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn low(&self) -> f64 {
        self.low
    }

    pub fn high(&self) -> f64 {
        self.high
    }

    /// Both bounds are exclusive
    pub fn admits(&self, mean: f64) -> bool {
        mean > self.low && mean < self.high
    }

    /// Candidates whose mean intensity lies inside the band, in input order
    pub fn filter(&self, gray: &GrayImage, candidates: &[Candidate]) -> Vec<Candidate> {
        candidates
            .iter()
            .copied()
            .filter(|c| {
                mean_intensity(gray, c)
                    .map(|mean| self.admits(mean))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// True iff at least one candidate survives the filter
    pub fn presence(&self, gray: &GrayImage, candidates: &[Candidate]) -> bool {
        candidates.iter().any(|c| {
            mean_intensity(gray, c)
                .map(|mean| self.admits(mean))
                .unwrap_or(false)
        })
    }
}

/// Mean pixel value inside the candidate, clipped to the image.
/// None when the region has no pixels in the image.
pub fn mean_intensity(gray: &GrayImage, candidate: &Candidate) -> Option<f64> {
    let (x0, y0, x1, y1) = candidate.clipped(gray.width(), gray.height())?;

    let mut sum: u64 = 0;
    for y in y0..y1 {
        for x in x0..x1 {
            sum += gray.get_pixel(x, y)[0] as u64;
        }
    }
    let count = (x1 - x0) as u64 * (y1 - y0) as u64;
    Some(sum as f64 / count as f64)
}

// =============================================================================
// TESTS
// =============================================================================
