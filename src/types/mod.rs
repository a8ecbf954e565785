//! Type definitions for packed frame files and camera streams

pub mod camera;
pub mod config;
pub mod frame;
pub mod geometry;
pub mod selection;

// Re-export the main types for convenience
pub use camera::{CONTRAST_PERCENTILES, CameraParams, CameraStream, ContrastRange, Orientation};
pub use config::ReaderConfig;
pub use frame::{DecodedFrame, FrameStack};
pub use geometry::{FileLayout, FrameGeometry, TRAILER_BYTES};
pub use selection::{FrameSelection, IndexRun};
