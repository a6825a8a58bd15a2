//! Face detections and frames

use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A detected face rectangle, before brightness validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Candidate {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Region clipped to a `frame_width` × `frame_height` image.
    /// Returns (x0, y0, x1, y1) with exclusive ends, or None if nothing overlaps.
    pub fn clipped(&self, frame_width: u32, frame_height: u32) -> Option<(u32, u32, u32, u32)> {
        let x1 = self.x.saturating_add(self.width).min(frame_width);
        let y1 = self.y.saturating_add(self.height).min(frame_height);
        if self.x >= x1 || self.y >= y1 {
            return None;
        }
        Some((self.x, self.y, x1, y1))
    }
}

/// One captured grayscale frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Luminance, 0-255
    pub gray: GrayImage,
    /// When the frame was read from the source
    pub captured_at: Instant,
    /// Position in the capture stream, starting at 1
    pub sequence: u64,
}

impl Frame {
    pub fn new(gray: GrayImage, captured_at: Instant, sequence: u64) -> Self {
        Self { gray, captured_at, sequence }
    }

    pub fn width(&self) -> u32 {
        self.gray.width()
    }

    pub fn height(&self) -> u32 {
        self.gray.height()
    }
}
