pub const DETECTOR_MODEL_NAME: &str = "yolo11n-face_widerface.onnx";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/facemosaic/models/releases/download/v0.1.0/yolo11n-face_widerface.onnx";

pub const EMBEDDER_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDER_MODEL_URL: &str =
    "https://github.com/facemosaic/models/releases/download/v0.1.0/w600k_r50.onnx";

/// Minimum frame-to-frame overlap for an identity to carry over.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.8;

/// Distance credit for the identity that occupied an overlapping box
/// in the previous frame.
pub const DEFAULT_RECOGNITION_BIAS: f32 = 0.4;

/// Exclusive upper bound on the (biased) L2 distance for a match.
pub const DEFAULT_RECOGNITION_THRESHOLD: f32 = 1.0;

/// Mosaic block size: the region is shrunk by this factor, then blown
/// back up with nearest-neighbor sampling.
pub const DEFAULT_MOSAIC_KERNEL: usize = 10;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
