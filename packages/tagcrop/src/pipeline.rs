//! Per-image orchestration: decode, detect, filter, plan, and encode crops.
use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use tagcrop_ocr::{DetectionError, DetectionInput, TextDetector};
use thiserror::Error;
use tracing::{debug, info};

use crate::area_filter;
use crate::candidates;
use crate::config::PipelineConfig;
use crate::crop_planner;
use crate::encode::encode;
use crate::geometry::{BoundingBox, CropRegion};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("text detection failed: {0}")]
    Detection(#[from] DetectionError),
    #[error("text detection timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to encode crop {index}: {source}")]
    Encode {
        index: usize,
        #[source]
        source: image::ImageError,
    },
}

impl PipelineError {
    /// Pipeline stage the error came from, for log context.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Decode(_) => "decode",
            PipelineError::Detection(_) | PipelineError::Timeout(_) => "detect",
            PipelineError::Encode { .. } => "encode",
        }
    }
}

/// One encoded crop; `index` is 1-based in emission order.
#[derive(Debug, Clone)]
pub struct Crop {
    pub index: usize,
    pub region: CropRegion,
    pub bytes: Vec<u8>,
}

/// Runs the tag cropping stages over one image at a time.
///
/// The pipeline owns no per-image state, so one instance can serve concurrent invocations.
pub struct ImagePipeline {
    detector: Arc<dyn TextDetector>,
    config: PipelineConfig,
}

impl ImagePipeline {
    pub fn new(detector: Arc<dyn TextDetector>, config: PipelineConfig) -> Self {
        Self { detector, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Crops every discount tag found in `image_bytes`.
    ///
    /// Undecodable input fails before the detector is consulted. An image without
    /// qualifying tags yields an empty vector.
    pub async fn process(&self, image_bytes: Vec<u8>) -> Result<Vec<Crop>, PipelineError> {
        let image = image::load_from_memory(&image_bytes).map_err(PipelineError::Decode)?;
        let (width, height) = (image.width(), image.height());
        debug!(width, height, "decoded image");

        let input = DetectionInput::Bytes(image_bytes);
        let detections = match self.config.detection_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.detector.detect(&input))
                .await
                .map_err(|_| PipelineError::Timeout(limit))??,
            None => self.detector.detect(&input).await?,
        };

        let candidates = candidates::extract(&detections, &self.config.keywords);
        info!(
            detections = detections.len(),
            candidates = candidates.len(),
            "found candidate tags based on keywords"
        );

        let mut selected = area_filter::filter(
            &candidates,
            width,
            height,
            self.config.min_area_fraction,
            self.config.max_area_fraction,
        );
        info!(selected = selected.len(), "filtered candidates by area");

        if selected.is_empty() {
            info!("no tags met the final criteria");
            return Ok(Vec::new());
        }

        selected.sort_by_key(|bbox| (bbox.y, bbox.x, bbox.width, bbox.height));
        self.crop_all(&image, &selected)
    }

    fn crop_all(
        &self,
        image: &DynamicImage,
        boxes: &[BoundingBox],
    ) -> Result<Vec<Crop>, PipelineError> {
        let mut crops = Vec::with_capacity(boxes.len());
        for bbox in boxes {
            let Some(region) = crop_planner::plan(bbox, image.width(), image.height()) else {
                debug!(?bbox, "skipping box with empty crop region");
                continue;
            };

            let pixels = image.crop_imm(region.x, region.y, region.width, region.height);
            if pixels.width() == 0 || pixels.height() == 0 {
                continue;
            }

            let index = crops.len() + 1;
            let bytes = encode(&pixels, &self.config.output)
                .map_err(|source| PipelineError::Encode { index, source })?;
            crops.push(Crop {
                index,
                region,
                bytes,
            });
        }
        Ok(crops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use tagcrop_ocr::{Detection, Quad, StaticDetector};

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 90]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn tag(text: &str, x: f32, y: f32, w: f32, h: f32) -> Detection {
        Detection::new(Quad::from_rect(x, y, w, h), text, 0.9)
    }

    fn pipeline(detections: Vec<Detection>) -> (Arc<StaticDetector>, ImagePipeline) {
        let detector = Arc::new(StaticDetector::new(detections));
        let pipeline = ImagePipeline::new(detector.clone(), PipelineConfig::default());
        (detector, pipeline)
    }

    struct SlowDetector;

    #[async_trait]
    impl TextDetector for SlowDetector {
        async fn detect(&self, _input: &DetectionInput) -> Result<Vec<Detection>, DetectionError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_crops_are_ordered_top_to_bottom() {
        let (_, pipeline) = pipeline(vec![
            tag("free", 20.0, 150.0, 40.0, 20.0),
            tag("50% off", 100.0, 40.0, 40.0, 20.0),
        ]);
        let crops = pipeline.process(png(200, 200)).await.unwrap();

        assert_eq!(crops.len(), 2);
        assert_eq!(crops[0].index, 1);
        assert_eq!(crops[0].region.y, 20);
        assert_eq!(crops[1].index, 2);
        assert_eq!(crops[1].region.y, 130);
    }

    #[tokio::test]
    async fn test_crop_bytes_match_region() {
        let (_, pipeline) = pipeline(vec![tag("save", 10.0, 50.0, 20.0, 30.0)]);
        let crops = pipeline.process(png(200, 200)).await.unwrap();

        let decoded = image::load_from_memory(&crops[0].bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (20, 60));
        assert_eq!(image::guess_format(&crops[0].bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_no_candidates_is_empty_success() {
        let (detector, pipeline) = pipeline(vec![tag("buy 2 get 1", 10.0, 10.0, 50.0, 50.0)]);
        let crops = pipeline.process(png(100, 100)).await.unwrap();
        assert!(crops.is_empty());
        assert_eq!(detector.calls(), 1);
    }

    #[tokio::test]
    async fn test_decode_error_skips_detection() {
        let (detector, pipeline) = pipeline(vec![tag("off", 10.0, 10.0, 50.0, 50.0)]);
        let err = pipeline.process(b"not an image".to_vec()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert_eq!(err.stage(), "decode");
        assert_eq!(detector.calls(), 0);
    }

    #[tokio::test]
    async fn test_detection_timeout() {
        let config = PipelineConfig {
            detection_timeout_secs: Some(0.05),
            ..Default::default()
        };
        let pipeline = ImagePipeline::new(Arc::new(SlowDetector), config);
        let err = pipeline.process(png(50, 50)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(_)));
        assert_eq!(err.stage(), "detect");
    }

    #[tokio::test]
    async fn test_unrepresentable_timeout_does_not_panic() {
        let config = PipelineConfig {
            detection_timeout_secs: Some(1e20),
            ..Default::default()
        };
        let detector = Arc::new(StaticDetector::new(vec![tag("off", 20.0, 60.0, 30.0, 20.0)]));
        let pipeline = Arc::new(ImagePipeline::new(detector.clone(), config));

        let task = tokio::spawn({
            let pipeline = pipeline.clone();
            async move { pipeline.process(png(100, 100)).await }
        });
        let crops = task.await.unwrap().unwrap();
        assert_eq!(crops.len(), 1);
        assert_eq!(detector.calls(), 1);
    }
}
