use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::engine::{DetectionError, DetectionInput, TextDetector};
use crate::region::Detection;

/// Returns the same detections for every input and counts how often it was asked.
#[derive(Debug, Default)]
pub struct StaticDetector {
    detections: Vec<Detection>,
    calls: AtomicUsize,
}

impl StaticDetector {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextDetector for StaticDetector {
    async fn detect(&self, _input: &DetectionInput) -> Result<Vec<Detection>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.detections.clone())
    }
}
