use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for face embedding.
///
/// Returns one fixed-length vector per box, in the same order as the
/// input boxes.
pub trait FaceEmbedder: Send {
    fn embed(
        &mut self,
        frame: &Frame,
        boxes: &[BoundingBox],
    ) -> Result<Vec<Vec<f32>>, Box<dyn std::error::Error>>;
}
