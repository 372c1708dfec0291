use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in image pixels (origin top-left, y grows downward).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Builds a box from a left/top origin plus size, as Tesseract reports it.
    pub fn from_origin_size(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    /// Builds the enclosing rectangle of a four-corner polygon
    /// (top-left, top-right, bottom-right, bottom-left).
    pub fn from_corners(corners: [[f32; 2]; 4]) -> Self {
        let xs = corners.map(|p| p[0]);
        let ys = corners.map(|p| p[1]);
        Self::new(
            xs.iter().copied().fold(f32::INFINITY, f32::min),
            ys.iter().copied().fold(f32::INFINITY, f32::min),
            xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            ys.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        )
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) / 2.0
    }

    pub fn center_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.left.min(other.left),
            self.top.min(other.top),
            self.right.max(other.right),
            self.bottom.max(other.bottom),
        )
    }
}

/// One recognized text span with its position and confidence (0.0 to 1.0).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub bbox: BoundingBox,
    pub text: String,
    pub confidence: f32,
}

impl TextFragment {
    pub fn new(bbox: BoundingBox, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence,
        }
    }
}
