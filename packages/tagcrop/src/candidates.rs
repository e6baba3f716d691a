//! Keyword matching over detector output.
//!
//! Matching is plain substring containment on the lowercased, trimmed text. Short keywords
//! such as `"rs"` therefore also fire inside unrelated words (`"ruairs"`, `"offers"`); that
//! trades precision for recall on tags like `"Rs.199"` where OCR glues currency and digits.
use serde::{Deserialize, Serialize};
use tagcrop_ocr::Detection;

use crate::geometry::BoundingBox;

/// Terms printed on discount tags in the reference deployment.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "off", "%", "save", "free", "discount", "offer", "rs", "!", "deals", "keels",
];

/// Normalized set of discount keywords.
///
/// Keywords are lowercased, trimmed, and deduplicated on construction; empty entries are
/// dropped. Insertion order is kept only so matching short-circuits predictably.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Keywords(Vec<String>);

impl Keywords {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the first keyword contained in `text` after normalization.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let normalized = normalize(text);
        self.iter().find(|keyword| normalized.contains(keyword))
    }

    pub fn matches(&self, text: &str) -> bool {
        self.first_match(text).is_some()
    }
}

impl Default for Keywords {
    fn default() -> Self {
        DEFAULT_KEYWORDS.iter().copied().collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Keywords {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut keywords: Vec<String> = Vec::new();
        for keyword in iter {
            let keyword = normalize(keyword.as_ref());
            if !keyword.is_empty() && !keywords.contains(&keyword) {
                keywords.push(keyword);
            }
        }
        Self(keywords)
    }
}

impl From<Vec<String>> for Keywords {
    fn from(keywords: Vec<String>) -> Self {
        keywords.into_iter().collect()
    }
}

impl From<Keywords> for Vec<String> {
    fn from(keywords: Keywords) -> Self {
        keywords.0
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Derives the axis-aligned box of a detection from its top-left and bottom-right corners.
///
/// Extents are truncated toward zero after subtraction, so fractional corners never round up.
pub fn bounding_box(detection: &Detection) -> BoundingBox {
    let tl = detection.quad.top_left();
    let br = detection.quad.bottom_right();
    BoundingBox {
        x: tl.x as i32,
        y: tl.y as i32,
        width: (br.x - tl.x) as i32,
        height: (br.y - tl.y) as i32,
    }
}

/// Keeps the boxes of detections whose text mentions a keyword.
///
/// Output follows input order. Degenerate boxes (from mis-ordered or collapsed quads) are
/// dropped silently.
pub fn extract(detections: &[Detection], keywords: &Keywords) -> Vec<BoundingBox> {
    detections
        .iter()
        .filter(|detection| keywords.matches(&detection.text))
        .map(bounding_box)
        .filter(|bbox| !bbox.is_degenerate())
        .collect()
}
