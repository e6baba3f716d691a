//! Size plausibility filter for candidate boxes.
use std::collections::HashSet;

use crate::geometry::BoundingBox;

/// Smallest accepted tag, as a fraction of image area (0.2%).
pub const DEFAULT_MIN_AREA_FRACTION: f64 = 0.2 / 100.0;

/// Largest accepted tag, as a fraction of image area (the whole image).
pub const DEFAULT_MAX_AREA_FRACTION: f64 = 1.0;

/// Deduplicates `boxes` and keeps those whose area lies strictly between
/// `min_area_fraction` and `max_area_fraction` of the image area.
///
/// Duplicates are collapsed by value before filtering. The order of the returned boxes is
/// unspecified; callers that need a stable order must sort.
pub fn filter(
    boxes: &[BoundingBox],
    image_width: u32,
    image_height: u32,
    min_area_fraction: f64,
    max_area_fraction: f64,
) -> Vec<BoundingBox> {
    let total_area = f64::from(image_width) * f64::from(image_height);
    let min_area = total_area * min_area_fraction;
    let max_area = total_area * max_area_fraction;

    let unique: HashSet<BoundingBox> = boxes.iter().copied().collect();

    unique
        .into_iter()
        .filter(|bbox| {
            let area = bbox.area() as f64;
            min_area < area && area < max_area
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut boxes: Vec<BoundingBox>) -> Vec<BoundingBox> {
        boxes.sort();
        boxes
    }

    #[test]
    fn test_min_area_is_strict() {
        // 1000x1000 at 0.2% puts the floor at exactly 2000 px.
        let at_floor = BoundingBox::new(0, 0, 40, 50);
        let above_floor = BoundingBox::new(100, 100, 52, 50);

        let kept = filter(
            &[at_floor, above_floor],
            1000,
            1000,
            DEFAULT_MIN_AREA_FRACTION,
            DEFAULT_MAX_AREA_FRACTION,
        );
        assert_eq!(kept, vec![above_floor]);
    }

    #[test]
    fn test_floor_tracks_fraction() {
        // A 2500 px box sits exactly on the floor once the fraction is 0.25%.
        let tag = BoundingBox::new(0, 0, 50, 50);
        assert!(filter(&[tag], 1000, 1000, 0.0025, 1.0).is_empty());
        assert_eq!(filter(&[tag], 1000, 1000, 0.002, 1.0), vec![tag]);
    }

    #[test]
    fn test_max_area_is_strict() {
        let whole = BoundingBox::new(0, 0, 100, 100);
        let most = BoundingBox::new(0, 0, 99, 100);
        let kept = filter(&[whole, most], 100, 100, 0.0, 1.0);
        assert_eq!(kept, vec![most]);
    }

    #[test]
    fn test_duplicates_collapse() {
        let tag = BoundingBox::new(10, 10, 60, 60);
        let kept = filter(&[tag, tag, tag], 1000, 1000, 0.002, 1.0);
        assert_eq!(kept, vec![tag]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let boxes = vec![
            BoundingBox::new(10, 10, 60, 60),
            BoundingBox::new(10, 10, 60, 60),
            BoundingBox::new(300, 10, 5, 5),
            BoundingBox::new(500, 500, 200, 100),
            BoundingBox::new(0, 0, 1000, 1000),
        ];
        let once = filter(&boxes, 1000, 1000, 0.002, 1.0);
        let twice = filter(&once, 1000, 1000, 0.002, 1.0);
        assert_eq!(sorted(once.clone()), sorted(twice));
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter(&[], 640, 480, 0.002, 1.0).is_empty());
    }

    #[test]
    fn test_fractions_are_parameters() {
        let tag = BoundingBox::new(0, 0, 100, 100);
        assert!(filter(&[tag], 1000, 1000, 0.02, 1.0).is_empty());
        assert_eq!(filter(&[tag], 1000, 1000, 0.002, 0.5), vec![tag]);
        assert!(filter(&[tag], 1000, 1000, 0.0, 0.005).is_empty());
    }
}
