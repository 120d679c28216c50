use ndarray::ArrayView3;

use crate::shared::bounding_box::BoundingBox;

/// A single RGB video/image frame: tightly-packed bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; everything above the
/// readers and writers works on this one representation.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * 3,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// View as `[height, width, 3]` for model preprocessing.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, 3),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels under `bbox` (clamped to the frame, rounded to
    /// whole pixels) into a new frame. Returns `None` when the clamped
    /// region is empty.
    pub fn crop(&self, bbox: &BoundingBox) -> Option<Frame> {
        let clamped = bbox.clamp(self.width, self.height);
        let x0 = clamped.x0.round() as usize;
        let y0 = clamped.y0.round() as usize;
        let x1 = (clamped.x1.round() as usize).min(self.width as usize);
        let y1 = (clamped.y1.round() as usize).min(self.height as usize);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let w = x1 - x0;
        let h = y1 - y0;
        let stride = self.width as usize * 3;
        let mut data = Vec::with_capacity(w * h * 3);
        for row in y0..y1 {
            let start = row * stride + x0 * 3;
            data.extend_from_slice(&self.data[start..start + w * 3]);
        }
        Some(Frame::new(data, w as u32, h as u32, self.index))
    }
}
