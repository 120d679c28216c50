use std::path::Path;
use std::time::Instant;

use crate::recognition::domain::identity_tracker::IdentityTracker;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::frame_processor::FrameProcessor;
use super::pipeline_logger::PipelineLogger;

/// Full video pipeline: read → process each frame → write.
///
/// Frames are processed strictly in decode order on one thread; the
/// tracker's hint-then-update cycle depends on that ordering. The
/// tracker lives here, one per video stream.
pub struct MosaicVideoUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    processor: FrameProcessor,
    tracker: IdentityTracker,
    logger: Box<dyn PipelineLogger>,
}

impl MosaicVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        processor: FrameProcessor,
        tracker: IdentityTracker,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            writer,
            processor,
            tracker,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let metadata = self.reader.open(input_path)?;
        self.writer.open(output_path, &metadata)?;
        self.logger.info(&format!(
            "Processing {} ({}x{}, {:.1} fps)",
            input_path.display(),
            metadata.width,
            metadata.height,
            metadata.fps
        ));

        let total = metadata.total_frames;
        let mut processed = 0;

        let mut frames = self.reader.frames();
        while let Some(result) = frames.next() {
            let mut frame = result?;

            let start = Instant::now();
            self.processor.process(&mut frame, Some(&mut self.tracker))?;
            self.logger
                .timing("process", start.elapsed().as_secs_f64() * 1000.0);

            let start = Instant::now();
            self.writer.write(&frame)?;
            self.logger
                .timing("write", start.elapsed().as_secs_f64() * 1000.0);

            processed += 1;
            self.logger.progress(processed, total);
        }
        drop(frames);

        self.reader.close();
        self.writer.close()?;

        self.logger
            .info(&format!("Wrote {} frames to {}", processed, output_path.display()));
        self.logger.summary();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::domain::face_database::FaceDatabase;
    use crate::detection::domain::face_detector::FaceDetector;
    use crate::detection::domain::face_embedder::FaceEmbedder;
    use crate::pipeline::pipeline_logger::NullPipelineLogger;
    use crate::recognition::domain::identity::Identity;
    use crate::recognition::domain::identity_tracker::TrackerConfig;
    use crate::recognition::domain::recognizer::Recognizer;
    use crate::rendering::domain::frame_renderer::FrameRenderer;
    use crate::shared::bounding_box::BoundingBox;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    struct StubReader {
        frames: Vec<Frame>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubReader {
        fn new(frames: Vec<Frame>) -> Self {
            Self {
                frames,
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(&mut self, _path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
            Ok(VideoMetadata {
                width: 100,
                height: 100,
                fps: 30.0,
                total_frames: self.frames.len(),
                codec: String::new(),
                source_path: None,
            })
        }

        fn frames(
            &mut self,
        ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
            Box::new(self.frames.drain(..).map(Ok))
        }

        fn close(&mut self) {
            *self.closed.lock().unwrap() = true;
        }
    }

    struct StubWriter {
        written: Arc<Mutex<Vec<Frame>>>,
        closed: Arc<Mutex<bool>>,
    }

    impl StubWriter {
        fn new() -> Self {
            Self {
                written: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(false)),
            }
        }
    }

    impl VideoWriter for StubWriter {
        fn open(
            &mut self,
            _path: &Path,
            _metadata: &VideoMetadata,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Ok(())
        }

        fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.written.lock().unwrap().push(frame.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
            *self.closed.lock().unwrap() = true;
            Ok(())
        }
    }

    struct FixedDetector {
        boxes: Vec<BoundingBox>,
    }

    impl FaceDetector for FixedDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            Ok(self.boxes.clone())
        }
    }

    struct ConstantEmbedder;

    impl FaceEmbedder for ConstantEmbedder {
        fn embed(
            &mut self,
            _frame: &Frame,
            boxes: &[BoundingBox],
        ) -> Result<Vec<Vec<f32>>, Box<dyn std::error::Error>> {
            Ok(vec![vec![0.1, 0.0]; boxes.len()])
        }
    }

    struct RecordingRenderer {
        calls: Arc<Mutex<Vec<Vec<Identity>>>>,
    }

    impl FrameRenderer for RecordingRenderer {
        fn render(
            &self,
            _frame: &mut Frame,
            _boxes: &[BoundingBox],
            identities: &[Identity],
        ) -> Result<(), Box<dyn std::error::Error>> {
            self.calls.lock().unwrap().push(identities.to_vec());
            Ok(())
        }
    }

    // --- Helpers ---

    fn make_frame(index: usize) -> Frame {
        Frame::new(vec![128; 100 * 100 * 3], 100, 100, index)
    }

    fn use_case(
        frames: Vec<Frame>,
        boxes: Vec<BoundingBox>,
        database: FaceDatabase,
    ) -> (MosaicVideoUseCase, Arc<Mutex<Vec<Frame>>>, Arc<Mutex<bool>>, Arc<Mutex<bool>>) {
        let reader = StubReader::new(frames);
        let reader_closed = reader.closed.clone();
        let writer = StubWriter::new();
        let written = writer.written.clone();
        let writer_closed = writer.closed.clone();

        let processor = FrameProcessor::new(
            Box::new(FixedDetector { boxes }),
            Box::new(ConstantEmbedder),
            Recognizer::new(1.0),
            Box::new(RecordingRenderer {
                calls: Arc::new(Mutex::new(Vec::new())),
            }),
            database,
        );

        let uc = MosaicVideoUseCase::new(
            Box::new(reader),
            Box::new(writer),
            processor,
            IdentityTracker::new(TrackerConfig::new(0.8, 0.4).unwrap()),
            Box::new(NullPipelineLogger),
        );
        (uc, written, reader_closed, writer_closed)
    }

    // --- Tests ---

    #[test]
    fn test_all_frames_written_in_order() {
        let frames = (0..5).map(make_frame).collect();
        let (mut uc, written, _, _) = use_case(frames, vec![], FaceDatabase::new());

        uc.execute(Path::new("in.mp4"), Path::new("out.mp4"))
            .unwrap();

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 5);
        for (i, frame) in written.iter().enumerate() {
            assert_eq!(frame.index(), i);
        }
    }

    #[test]
    fn test_reader_and_writer_closed() {
        let (mut uc, _, reader_closed, writer_closed) =
            use_case(vec![make_frame(0)], vec![], FaceDatabase::new());

        uc.execute(Path::new("in.mp4"), Path::new("out.mp4"))
            .unwrap();

        assert!(*reader_closed.lock().unwrap());
        assert!(*writer_closed.lock().unwrap());
    }

    #[test]
    fn test_tracker_carries_identity_across_frames() {
        let mut db = FaceDatabase::new();
        db.insert("alice", vec![0.1, 0.0]);

        let frames = (0..3).map(make_frame).collect();
        let bbox = BoundingBox::from_corners(10.0, 10.0, 50.0, 50.0);
        let (mut uc, _, _, _) = use_case(frames, vec![bbox], db);

        uc.execute(Path::new("in.mp4"), Path::new("out.mp4"))
            .unwrap();

        // After the run the tracker holds last frame's recognized face
        assert_eq!(
            uc.tracker.previous_identity_hints(&[bbox]),
            vec![Identity::known("alice")]
        );
    }

    #[test]
    fn test_empty_video_completes() {
        let (mut uc, written, _, _) = use_case(vec![], vec![], FaceDatabase::new());
        uc.execute(Path::new("in.mp4"), Path::new("out.mp4"))
            .unwrap();
        assert!(written.lock().unwrap().is_empty());
    }
}
