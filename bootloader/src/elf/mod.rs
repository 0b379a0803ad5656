//! ELF64 image parsing and fixed-address segment loading

pub mod format;
pub mod loader;

pub use format::{ImageHeader, SegmentDescriptor, SegmentFlags};
pub use loader::{load_segments, read_image_header, read_segment_table, LoadSummary, SegmentTable};
