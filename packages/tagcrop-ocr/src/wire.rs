//! JSON form of detector output.
//!
//! Each detection is a `[quad, text, confidence]` triple where `quad` is four `[x, y]` points
//! in top-left, top-right, bottom-right, bottom-left order:
//!
//! ```text
//! [[[12, 40], [96, 40], [96, 71], [12, 71]], "50% OFF", 0.93]
//! ```
use crate::engine::DetectionError;
use crate::region::{Detection, Point, Quad};

type RawDetection = (Vec<Point>, String, f32);

/// Parses a JSON array of detection triples.
pub fn parse_detections(data: &[u8]) -> Result<Vec<Detection>, DetectionError> {
    let raw: Vec<RawDetection> = serde_json::from_slice(data)
        .map_err(|e| DetectionError::MalformedOutput(e.to_string()))?;

    raw.into_iter()
        .enumerate()
        .map(|(i, (points, text, confidence))| {
            let count = points.len();
            let quad: [Point; 4] = points.try_into().map_err(|_| {
                DetectionError::MalformedOutput(format!(
                    "detection {i}: expected 4 points, got {count}"
                ))
            })?;

            if !(0.0..=1.0).contains(&confidence) {
                return Err(DetectionError::MalformedOutput(format!(
                    "detection {i}: confidence {confidence} outside [0, 1]"
                )));
            }

            Ok(Detection {
                quad: Quad(quad),
                text,
                confidence,
            })
        })
        .collect()
}

/// Serializes detections into the triple form accepted by [`parse_detections`].
pub fn to_json(detections: &[Detection]) -> Result<String, DetectionError> {
    let raw: Vec<RawDetection> = detections
        .iter()
        .map(|d| (d.quad.0.to_vec(), d.text.clone(), d.confidence))
        .collect();
    serde_json::to_string(&raw).map_err(|e| DetectionError::MalformedOutput(e.to_string()))
}
