//! # tagcrop
//!
//! Finds discount tags in shelf photographs and crops the region around each one, including
//! the product shelved above it.
//!
//! ## Stages
//!
//! - **Candidate extraction**: keep text detections mentioning a discount keyword
//!   ([`candidates::extract`])
//! - **Area filtering**: drop duplicates and boxes implausibly small or large for the frame
//!   ([`area_filter::filter`])
//! - **Crop planning**: grow each box upward by its own height, clipped to the image
//!   ([`crop_planner::plan`])
//! - **Orchestration**: decode, detect once, run the stages, encode crops ([`ImagePipeline`])
//!
//! Text detection itself is delegated to a [`TextDetector`] from `tagcrop-ocr`; storage and
//! upload live in the [`host`] module.
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use tagcrop::prelude::*;
//!
//! let detector = Arc::new(CommandDetector::new("/usr/local/bin/recognize"));
//! let pipeline = ImagePipeline::new(detector, PipelineConfig::default());
//!
//! let crops = pipeline.process(std::fs::read("shelf.jpg")?).await?;
//! for crop in crops {
//!     std::fs::write(crop_name("shelf.jpg", crop.index), &crop.bytes)?;
//! }
//! ```

pub mod area_filter;
pub mod candidates;
pub mod config;
pub mod crop_planner;
pub mod encode;
pub mod geometry;
pub mod host;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod store;

// Re-export commonly used types at the root level
pub use candidates::{extract, Keywords, DEFAULT_KEYWORDS};
pub use config::{AppConfig, ConfigError, DetectorConfig, OutputEncoding, OutputFormat, PipelineConfig};
pub use geometry::{BoundingBox, CropRegion};
pub use host::{InvocationReport, InvocationStatus, TriggerHost};
pub use logging::init_tracing;
pub use naming::crop_name;
pub use pipeline::{Crop, ImagePipeline, PipelineError};
pub use store::{BlobStore, LocalBlobStore, MemoryBlobStore, StoreError};
pub use tagcrop_ocr::{
    CommandDetector, Detection, DetectionError, DetectionInput, Point, Quad, StaticDetector, TextDetector,
};

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```ignore
/// use tagcrop::prelude::*;
/// ```
pub mod prelude {
    pub use crate::area_filter::filter as filter_by_area;
    pub use crate::crop_planner::plan as plan_crop;
    pub use crate::{
        crop_name, extract, AppConfig, BlobStore, BoundingBox, CommandDetector, Crop, CropRegion, Detection,
        DetectionError, DetectionInput, ImagePipeline, InvocationReport, InvocationStatus, Keywords,
        LocalBlobStore, MemoryBlobStore, OutputEncoding, OutputFormat, PipelineConfig, PipelineError, Point,
        Quad, StaticDetector, StoreError, TextDetector, TriggerHost,
    };
}
