//! Seams to the face localization and gender/age classification models.
//!
//! Both models are external; the station only needs these two calls. Tests and
//! offline replays plug in deterministic implementations.

use anyhow::Result;
use image::{DynamicImage, GenericImageView};

use crate::models::Sample;

/// Face bounding box in frame pixel coordinates, `(x1, y1)` inclusive and
/// `(x2, y2)` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
    pub confidence: f32,
}

pub trait FaceLocator {
    fn locate(&self, frame: &DynamicImage) -> Result<Vec<Region>>;
}

pub trait Classifier {
    fn classify(&self, face: &DynamicImage) -> Result<Sample>;
}

/// Cuts the face out of `frame` with `padding` pixels of context on each side,
/// clamped to the frame. Returns `None` when nothing of the region is inside.
pub fn crop_face(frame: &DynamicImage, region: &Region, padding: u32) -> Option<DynamicImage> {
    let (width, height) = frame.dimensions();
    let left = region.x1.saturating_sub(padding);
    let top = region.y1.saturating_sub(padding);
    let right = region.x2.saturating_add(padding).min(width);
    let bottom = region.y2.saturating_add(padding).min(height);

    if left >= right || top >= bottom {
        return None;
    }
    Some(frame.crop_imm(left, top, right - left, bottom - top))
}
