use thiserror::Error;

use crate::shared::bounding_box::BoundingBox;

use super::identity::Identity;

#[derive(Error, Debug)]
pub enum InvalidTrackerConfig {
    #[error("iou_threshold must be in (0, 1], got {0}")]
    IouThreshold(f64),
    #[error("recognition_bias must be finite and >= 0, got {0}")]
    RecognitionBias(f32),
}

/// Tuning parameters for frame-to-frame identity carry-over.
#[derive(Clone, Copy, Debug)]
pub struct TrackerConfig {
    iou_threshold: f64,
    recognition_bias: f32,
}

impl TrackerConfig {
    pub fn new(iou_threshold: f64, recognition_bias: f32) -> Result<Self, InvalidTrackerConfig> {
        if !(iou_threshold > 0.0 && iou_threshold <= 1.0) {
            return Err(InvalidTrackerConfig::IouThreshold(iou_threshold));
        }
        if !recognition_bias.is_finite() || recognition_bias < 0.0 {
            return Err(InvalidTrackerConfig::RecognitionBias(recognition_bias));
        }
        Ok(Self {
            iou_threshold,
            recognition_bias,
        })
    }

    pub fn iou_threshold(&self) -> f64 {
        self.iou_threshold
    }

    pub fn recognition_bias(&self) -> f32 {
        self.recognition_bias
    }
}

/// Per-stream carry-over of recognized identities between frames.
///
/// Holds the previous frame's identity → box map and turns it into
/// per-detection hints for the current frame via spatial overlap. One
/// instance per video stream; single-image processing uses no tracker.
pub struct IdentityTracker {
    config: TrackerConfig,
    known: Vec<(String, BoundingBox)>,
}

impl IdentityTracker {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            known: Vec::new(),
        }
    }

    pub fn recognition_bias(&self) -> f32 {
        self.config.recognition_bias()
    }

    /// Identities the tracker currently carries, in insertion order.
    pub fn tracked(&self) -> impl Iterator<Item = (&str, &BoundingBox)> {
        self.known.iter().map(|(name, bbox)| (name.as_str(), bbox))
    }

    /// One hint per current box: the first tracked identity (insertion
    /// order; deterministic but arbitrary on ties) whose stored box has
    /// IoU strictly above the threshold, else `Unknown`.
    ///
    /// Before the first `update`, every hint is `Unknown`.
    pub fn previous_identity_hints(&self, boxes: &[BoundingBox]) -> Vec<Identity> {
        boxes
            .iter()
            .map(|bbox| {
                self.known
                    .iter()
                    .find(|(_, known_bbox)| bbox.iou(known_bbox) > self.config.iou_threshold())
                    .map(|(name, _)| Identity::known(name.clone()))
                    .unwrap_or(Identity::Unknown)
            })
            .collect()
    }

    /// Replaces the tracked map with this frame's resolved pairs.
    ///
    /// Only non-`Unknown` identities are kept; an all-unknown frame
    /// leaves an empty map, so the next frame gets no hints.
    pub fn update(&mut self, identities: &[Identity], boxes: &[BoundingBox]) {
        debug_assert_eq!(identities.len(), boxes.len());
        self.known = identities
            .iter()
            .zip(boxes)
            .filter_map(|(identity, bbox)| {
                identity.name().map(|name| (name.to_string(), *bbox))
            })
            .collect();
    }
}
