//! Replays recorded detector output against an image and writes the crops next to it,
//! along with `<image>.tags.json` holding the detections that matched a keyword.
//!
//! ```bash
//! cargo run --example replay_detections -- shelf.jpg shelf.detections.json
//! ```
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tagcrop::prelude::*;
use tagcrop_ocr::{parse_detections, to_json};

#[tokio::main]
async fn main() -> Result<()> {
    tagcrop::init_tracing(false);

    let mut args = std::env::args().skip(1);
    let image_path = PathBuf::from(args.next().context("usage: replay_detections <image> <detections.json>")?);
    let detections_path = PathBuf::from(args.next().context("missing detections file")?);

    let detections = parse_detections(&std::fs::read(&detections_path)?)?;
    println!("Loaded {} detections from {}", detections.len(), detections_path.display());

    let config = PipelineConfig::default();
    let tags: Vec<_> = detections
        .iter()
        .filter(|d| config.keywords.matches(&d.text))
        .cloned()
        .collect();
    let tags_path = image_path.with_extension("tags.json");
    std::fs::write(&tags_path, to_json(&tags)?)?;
    println!("{} tag detection(s) recorded in {}", tags.len(), tags_path.display());

    let pipeline = ImagePipeline::new(Arc::new(StaticDetector::new(detections)), config);
    let crops = pipeline.process(std::fs::read(&image_path)?).await?;

    let blob_name = image_path.to_string_lossy();
    for crop in &crops {
        let out = image_path.with_file_name(crop_name(&blob_name, crop.index));
        std::fs::write(&out, &crop.bytes)?;
        println!(
            "  {} <- region x={} y={} {}x{}",
            out.display(),
            crop.region.x,
            crop.region.y,
            crop.region.width,
            crop.region.height
        );
    }
    println!("{} crop(s) written", crops.len());

    Ok(())
}
