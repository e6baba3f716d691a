//! Pixel-space rectangles shared by the filtering stages.
use serde::Serialize;

/// Axis-aligned box around a tag candidate, in pixels.
///
/// Coordinates are signed because detector quads can sit partly outside the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width) * i64::from(self.height)
    }

    /// True when the box has no extent along either axis.
    pub fn is_degenerate(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

/// Rectangle actually cut from the source image; always inside the image bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_does_not_overflow() {
        let bbox = BoundingBox::new(0, 0, 100_000, 100_000);
        assert_eq!(bbox.area(), 10_000_000_000);
    }

    #[test]
    fn test_degenerate() {
        assert!(BoundingBox::new(5, 5, 0, 10).is_degenerate());
        assert!(BoundingBox::new(5, 5, 10, -1).is_degenerate());
        assert!(!BoundingBox::new(5, 5, 1, 1).is_degenerate());
    }
}
