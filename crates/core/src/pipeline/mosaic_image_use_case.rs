use std::path::Path;

use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_reader::VideoReader;

use super::frame_processor::FrameProcessor;

/// Single-image pipeline: read → process → write.
///
/// No tracker: every face is matched on embedding distance alone.
pub struct MosaicImageUseCase {
    reader: Box<dyn VideoReader>,
    image_writer: Box<dyn ImageWriter>,
    processor: FrameProcessor,
}

impl MosaicImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        image_writer: Box<dyn ImageWriter>,
        processor: FrameProcessor,
    ) -> Self {
        Self {
            reader,
            image_writer,
            processor,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let _metadata = self.reader.open(input_path)?;

        let mut frame = self.reader.frames().next().ok_or("No frames in image")??;
        self.reader.close();

        self.processor.process(&mut frame, None)?;
        self.image_writer.write(output_path, &frame)?;

        Ok(())
    }
}
