use crate::database::domain::face_database::FaceDatabase;

use super::identity::Identity;

/// One recognized (or rejected) face: the assigned identity and the
/// winning post-bias distance, kept for diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionResult {
    pub identity: Identity,
    pub distance: f32,
}

/// Nearest-neighbor matcher over the face database.
///
/// A pure function of its inputs: given a fixed database order, repeated
/// calls with identical embeddings and hints yield identical results.
pub struct Recognizer {
    recognition_threshold: f32,
}

impl Recognizer {
    /// `recognition_threshold` is the exclusive upper bound on the
    /// (biased) L2 distance for a match.
    pub fn new(recognition_threshold: f32) -> Self {
        Self {
            recognition_threshold,
        }
    }

    /// Matches each embedding against every database entry.
    ///
    /// The candidate named by the embedding's hint gets `bias` subtracted
    /// from its distance before comparison, making last frame's identity
    /// sticky against embedding noise. The minimum-distance candidate
    /// wins; the first database entry wins ties. A distance equal to the
    /// threshold does not match.
    ///
    /// An empty database yields `Unknown` with infinite distance; empty
    /// input yields empty output.
    pub fn recognize(
        &self,
        embeddings: &[Vec<f32>],
        hints: &[Identity],
        database: &FaceDatabase,
        bias: f32,
    ) -> Vec<RecognitionResult> {
        debug_assert_eq!(embeddings.len(), hints.len());
        embeddings
            .iter()
            .zip(hints)
            .map(|(embedding, hint)| self.recognize_one(embedding, hint, database, bias))
            .collect()
    }

    fn recognize_one(
        &self,
        embedding: &[f32],
        hint: &Identity,
        database: &FaceDatabase,
        bias: f32,
    ) -> RecognitionResult {
        let mut best: Option<(&str, f32)> = None;
        for entry in database.entries() {
            let mut distance = l2_distance(embedding, &entry.embedding);
            if hint.name() == Some(entry.name.as_str()) {
                distance -= bias;
            }
            // Strict comparison keeps the earlier entry on ties
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((&entry.name, distance));
            }
        }

        match best {
            Some((name, distance)) if distance < self.recognition_threshold => {
                RecognitionResult {
                    identity: Identity::known(name),
                    distance,
                }
            }
            Some((_, distance)) => RecognitionResult {
                identity: Identity::Unknown,
                distance,
            },
            None => RecognitionResult {
                identity: Identity::Unknown,
                distance: f32::INFINITY,
            },
        }
    }
}

fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "embedding dimensions must match");
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
