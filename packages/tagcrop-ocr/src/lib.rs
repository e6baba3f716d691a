pub mod command;
pub mod engine;
pub mod fixed;
pub mod region;
pub mod wire;

pub use command::CommandDetector;
pub use engine::{DetectionError, DetectionInput, TextDetector};
pub use fixed::StaticDetector;
pub use region::{Detection, Point, Quad};
pub use wire::{parse_detections, to_json};
