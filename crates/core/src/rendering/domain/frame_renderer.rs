use crate::recognition::domain::identity::Identity;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Domain interface for drawing recognition results onto a frame.
///
/// The contract: unknown faces are obscured, recognized faces get a
/// visible marker with their name. Implementations modify the frame
/// in-place.
pub trait FrameRenderer: Send {
    fn render(
        &self,
        frame: &mut Frame,
        boxes: &[BoundingBox],
        identities: &[Identity],
    ) -> Result<(), Box<dyn std::error::Error>>;
}
