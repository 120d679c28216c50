use std::path::PathBuf;

/// Stream-level properties of a video or image source.
///
/// Images are modeled as one-frame videos with `fps = 0.0`.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}
