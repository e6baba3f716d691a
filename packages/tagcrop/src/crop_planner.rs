use crate::geometry::{BoundingBox, CropRegion};

/// Expands a tag box upward by its own height so the crop also shows the product above it,
/// then clips the result to the image.
///
/// Returns `None` when the box starts left of or outside the image, or the clipped region
/// is empty.
pub fn plan(bbox: &BoundingBox, image_width: u32, image_height: u32) -> Option<CropRegion> {
    let (image_width, image_height) = (i64::from(image_width), i64::from(image_height));
    let (x, y) = (i64::from(bbox.x), i64::from(bbox.y));
    let (width, height) = (i64::from(bbox.width), i64::from(bbox.height));

    if bbox.is_degenerate() || x < 0 || x >= image_width || y >= image_height {
        return None;
    }

    let top = (y - height).max(0);
    let bottom = (y + height).min(image_height);
    let left = x;
    let right = (x + width).min(image_width);

    if right <= left || bottom <= top {
        return None;
    }

    Some(CropRegion {
        x: left as u32,
        y: top as u32,
        width: (right - left) as u32,
        height: (bottom - top) as u32,
    })
}
