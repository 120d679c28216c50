use crate::database::domain::face_database::FaceDatabase;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::recognition::domain::identity::Identity;
use crate::recognition::domain::identity_tracker::IdentityTracker;
use crate::recognition::domain::recognizer::{RecognitionResult, Recognizer};
use crate::rendering::domain::frame_renderer::FrameRenderer;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Per-frame orchestration: detect → embed → recognize → render.
///
/// Owns the model seams and the face database; the caller owns the
/// per-stream [`IdentityTracker`], passed in for video processing and
/// omitted for single images.
pub struct FrameProcessor {
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
    recognizer: Recognizer,
    renderer: Box<dyn FrameRenderer>,
    database: FaceDatabase,
}

impl FrameProcessor {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
        recognizer: Recognizer,
        renderer: Box<dyn FrameRenderer>,
        database: FaceDatabase,
    ) -> Self {
        Self {
            detector,
            embedder,
            recognizer,
            renderer,
            database,
        }
    }

    /// Processes one frame in place and returns the per-face results,
    /// aligned with detection order.
    ///
    /// A frame with no usable detections passes through unmodified and
    /// the tracker keeps its previous state, so a single dropped
    /// detection does not break identity continuity.
    pub fn process(
        &mut self,
        frame: &mut Frame,
        mut tracker: Option<&mut IdentityTracker>,
    ) -> Result<Vec<RecognitionResult>, Box<dyn std::error::Error>> {
        let detected = self.detector.detect(frame)?;
        let boxes: Vec<BoundingBox> = detected
            .iter()
            .map(|bbox| bbox.clamp(frame.width(), frame.height()))
            .filter(|bbox| !bbox.is_degenerate())
            .collect();

        if boxes.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed(frame, &boxes)?;

        let (hints, bias) = match tracker.as_deref() {
            Some(tracker) => (
                tracker.previous_identity_hints(&boxes),
                tracker.recognition_bias(),
            ),
            None => (vec![Identity::Unknown; boxes.len()], 0.0),
        };

        let results = self
            .recognizer
            .recognize(&embeddings, &hints, &self.database, bias);

        let identities: Vec<Identity> = results.iter().map(|r| r.identity.clone()).collect();

        if let Some(tracker) = tracker.as_deref_mut() {
            tracker.update(&identities, &boxes);
        }

        self.renderer.render(frame, &boxes, &identities)?;

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::domain::identity_tracker::TrackerConfig;
    use std::sync::{Arc, Mutex};

    // --- Stubs ---

    /// Returns a fixed box list per call, in order.
    struct ScriptedDetector {
        script: Vec<Vec<BoundingBox>>,
        call: usize,
    }

    impl ScriptedDetector {
        fn new(script: Vec<Vec<BoundingBox>>) -> Self {
            Self { script, call: 0 }
        }
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
            let boxes = self.script.get(self.call).cloned().unwrap_or_default();
            self.call += 1;
            Ok(boxes)
        }
    }

    /// Returns a fixed embedding per box.
    struct ConstantEmbedder {
        embedding: Vec<f32>,
    }

    impl FaceEmbedder for ConstantEmbedder {
        fn embed(
            &mut self,
            _frame: &Frame,
            boxes: &[BoundingBox],
        ) -> Result<Vec<Vec<f32>>, Box<dyn std::error::Error>> {
            Ok(vec![self.embedding.clone(); boxes.len()])
        }
    }

    struct RecordingRenderer {
        calls: Arc<Mutex<Vec<Vec<Identity>>>>,
    }

    impl RecordingRenderer {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }
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

    fn make_frame(w: u32, h: u32) -> Frame {
        Frame::new(vec![128; (w * h * 3) as usize], w, h, 0)
    }

    fn bbox(x0: f64, y0: f64, x1: f64, y1: f64) -> BoundingBox {
        BoundingBox::from_corners(x0, y0, x1, y1)
    }

    fn single_entry_db(name: &str, embedding: Vec<f32>) -> FaceDatabase {
        let mut db = FaceDatabase::new();
        db.insert(name, embedding);
        db
    }

    fn processor(
        detector: ScriptedDetector,
        embedding: Vec<f32>,
        threshold: f32,
        database: FaceDatabase,
        renderer: RecordingRenderer,
    ) -> FrameProcessor {
        FrameProcessor::new(
            Box::new(detector),
            Box::new(ConstantEmbedder { embedding }),
            Recognizer::new(threshold),
            Box::new(renderer),
            database,
        )
    }

    // --- Tests ---

    #[test]
    fn test_recognized_face_rendered_with_name() {
        let renderer = RecordingRenderer::new();
        let calls = renderer.calls.clone();
        let mut fp = processor(
            ScriptedDetector::new(vec![vec![bbox(10.0, 10.0, 50.0, 50.0)]]),
            vec![0.1, 0.0],
            1.0,
            single_entry_db("alice", vec![0.1, 0.0]),
            renderer,
        );

        let mut frame = make_frame(100, 100);
        let results = fp.process(&mut frame, None).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].identity, Identity::known("alice"));
        assert_eq!(calls.lock().unwrap()[0], vec![Identity::known("alice")]);
    }

    #[test]
    fn test_unmatched_face_rendered_unknown() {
        let renderer = RecordingRenderer::new();
        let calls = renderer.calls.clone();
        let mut fp = processor(
            ScriptedDetector::new(vec![vec![bbox(10.0, 10.0, 50.0, 50.0)]]),
            vec![10.0, 0.0],
            1.0,
            single_entry_db("alice", vec![0.1, 0.0]),
            renderer,
        );

        let mut frame = make_frame(100, 100);
        let results = fp.process(&mut frame, None).unwrap();
        assert_eq!(results[0].identity, Identity::Unknown);
        assert_eq!(calls.lock().unwrap()[0], vec![Identity::Unknown]);
    }

    #[test]
    fn test_no_detections_passes_frame_through() {
        let renderer = RecordingRenderer::new();
        let calls = renderer.calls.clone();
        let mut fp = processor(
            ScriptedDetector::new(vec![vec![]]),
            vec![0.0, 0.0],
            1.0,
            single_entry_db("alice", vec![0.1, 0.0]),
            renderer,
        );

        let mut frame = make_frame(100, 100);
        let before = frame.clone();
        let results = fp.process(&mut frame, None).unwrap();

        assert!(results.is_empty());
        assert_eq!(frame.data(), before.data());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_no_detections_keeps_tracker_state() {
        let renderer = RecordingRenderer::new();
        let face = bbox(10.0, 10.0, 50.0, 50.0);
        let mut fp = processor(
            ScriptedDetector::new(vec![vec![face], vec![], vec![face]]),
            vec![0.1, 0.0],
            1.0,
            single_entry_db("alice", vec![0.1, 0.0]),
            renderer,
        );

        let mut tracker = IdentityTracker::new(TrackerConfig::new(0.8, 0.4).unwrap());
        let mut frame = make_frame(100, 100);

        fp.process(&mut frame, Some(&mut tracker)).unwrap();
        assert_eq!(tracker.tracked().count(), 1);

        // Dropped frame: tracker unchanged
        fp.process(&mut frame, Some(&mut tracker)).unwrap();
        assert_eq!(tracker.tracked().count(), 1);
        assert_eq!(
            tracker.previous_identity_hints(&[face]),
            vec![Identity::known("alice")]
        );
    }

    #[test]
    fn test_degenerate_boxes_dropped_before_embedding() {
        let renderer = RecordingRenderer::new();
        let calls = renderer.calls.clone();
        let mut fp = processor(
            ScriptedDetector::new(vec![vec![
                bbox(10.0, 10.0, 50.0, 50.0),
                // Fully outside: clamps to zero area
                bbox(200.0, 200.0, 300.0, 300.0),
            ]]),
            vec![0.1, 0.0],
            1.0,
            single_entry_db("alice", vec![0.1, 0.0]),
            renderer,
        );

        let mut frame = make_frame(100, 100);
        let results = fp.process(&mut frame, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(calls.lock().unwrap()[0].len(), 1);
    }

    #[test]
    fn test_tracker_bias_keeps_identity_across_frames() {
        // Frame 1: embedding near alice → recognized.
        // Frame 2: same face shifted slightly, embedding drifts to just
        // past the threshold; the IoU hint plus bias keeps it as alice.
        struct DriftingEmbedder {
            call: usize,
        }
        impl FaceEmbedder for DriftingEmbedder {
            fn embed(
                &mut self,
                _frame: &Frame,
                boxes: &[BoundingBox],
            ) -> Result<Vec<Vec<f32>>, Box<dyn std::error::Error>> {
                let embedding = if self.call == 0 {
                    vec![0.1, 0.0]
                } else {
                    vec![1.2, 0.0]
                };
                self.call += 1;
                Ok(vec![embedding; boxes.len()])
            }
        }

        let mut fp = FrameProcessor::new(
            Box::new(ScriptedDetector::new(vec![
                vec![bbox(10.0, 10.0, 50.0, 50.0)],
                vec![bbox(11.0, 10.0, 51.0, 50.0)],
            ])),
            Box::new(DriftingEmbedder { call: 0 }),
            Recognizer::new(1.0),
            Box::new(RecordingRenderer::new()),
            single_entry_db("alice", vec![0.0, 0.0]),
        );

        let mut tracker = IdentityTracker::new(TrackerConfig::new(0.8, 0.4).unwrap());
        let mut frame = make_frame(100, 100);

        let first = fp.process(&mut frame, Some(&mut tracker)).unwrap();
        assert_eq!(first[0].identity, Identity::known("alice"));

        // Distance 1.2 alone would be Unknown; 1.2 - 0.4 = 0.8 < 1.0
        let second = fp.process(&mut frame, Some(&mut tracker)).unwrap();
        assert_eq!(second[0].identity, Identity::known("alice"));
    }

    #[test]
    fn test_bias_insufficient_drops_identity() {
        // Frame 2's embedding drifts so far that even the bias cannot
        // save it: 1.5 - 0.4 = 1.1 >= 1.0 → Unknown, and the tracker
        // forgets the face.
        struct DriftingEmbedder {
            call: usize,
        }
        impl FaceEmbedder for DriftingEmbedder {
            fn embed(
                &mut self,
                _frame: &Frame,
                boxes: &[BoundingBox],
            ) -> Result<Vec<Vec<f32>>, Box<dyn std::error::Error>> {
                let embedding = if self.call == 0 {
                    vec![0.1, 0.0]
                } else {
                    vec![1.5, 0.0]
                };
                self.call += 1;
                Ok(vec![embedding; boxes.len()])
            }
        }

        let face = bbox(10.0, 10.0, 50.0, 50.0);
        let mut fp = FrameProcessor::new(
            Box::new(ScriptedDetector::new(vec![vec![face], vec![face]])),
            Box::new(DriftingEmbedder { call: 0 }),
            Recognizer::new(1.0),
            Box::new(RecordingRenderer::new()),
            single_entry_db("alice", vec![0.0, 0.0]),
        );

        let mut tracker = IdentityTracker::new(TrackerConfig::new(0.8, 0.4).unwrap());
        let mut frame = make_frame(100, 100);

        let first = fp.process(&mut frame, Some(&mut tracker)).unwrap();
        assert_eq!(first[0].identity, Identity::known("alice"));

        let second = fp.process(&mut frame, Some(&mut tracker)).unwrap();
        assert_eq!(second[0].identity, Identity::Unknown);
        assert_eq!(tracker.tracked().count(), 0);
    }

    #[test]
    fn test_without_tracker_no_bias_applies() {
        // Same drifted embedding as above, but image-mode (no tracker):
        // distance 1.2 >= threshold 1.0 → Unknown.
        let mut fp = processor(
            ScriptedDetector::new(vec![vec![bbox(10.0, 10.0, 50.0, 50.0)]]),
            vec![1.2, 0.0],
            1.0,
            single_entry_db("alice", vec![0.0, 0.0]),
            RecordingRenderer::new(),
        );

        let mut frame = make_frame(100, 100);
        let results = fp.process(&mut frame, None).unwrap();
        assert_eq!(results[0].identity, Identity::Unknown);
    }

    #[test]
    fn test_detector_error_propagates() {
        struct FailingDetector;
        impl FaceDetector for FailingDetector {
            fn detect(
                &mut self,
                _frame: &Frame,
            ) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
                Err("inference failed".into())
            }
        }

        let mut fp = FrameProcessor::new(
            Box::new(FailingDetector),
            Box::new(ConstantEmbedder {
                embedding: vec![0.0],
            }),
            Recognizer::new(1.0),
            Box::new(RecordingRenderer::new()),
            FaceDatabase::new(),
        );

        let mut frame = make_frame(100, 100);
        assert!(fp.process(&mut frame, None).is_err());
    }
}
