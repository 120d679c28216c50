use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::database::domain::face_database::FaceDatabase;
use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::shared::constants::IMAGE_EXTENSIONS;
use crate::video::domain::video_reader::VideoReader;

#[derive(Error, Debug)]
pub enum EnrollmentError {
    #[error("enrollment directory not found: {0}")]
    DirectoryMissing(PathBuf),
    #[error("no enrollable faces found under {0}")]
    Empty(PathBuf),
}

/// Builds the face database from a directory of reference photos.
///
/// Layout: one subdirectory per identity, named after the person, with
/// any number of photos inside. Each identity gets the mean embedding
/// of the first face found in each of its photos; images where no face
/// is detected are skipped with a warning.
pub struct EnrollFacesUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn FaceDetector>,
    embedder: Box<dyn FaceEmbedder>,
}

impl EnrollFacesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn FaceDetector>,
        embedder: Box<dyn FaceEmbedder>,
    ) -> Self {
        Self {
            reader,
            detector,
            embedder,
        }
    }

    pub fn execute(
        &mut self,
        people_dir: &Path,
    ) -> Result<FaceDatabase, Box<dyn std::error::Error>> {
        if !people_dir.is_dir() {
            return Err(Box::new(EnrollmentError::DirectoryMissing(
                people_dir.to_path_buf(),
            )));
        }

        let mut database = FaceDatabase::new();

        // Sorted for a stable database order across runs
        let mut identity_dirs: Vec<PathBuf> = std::fs::read_dir(people_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        identity_dirs.sort();

        for dir in identity_dirs {
            let Some(name) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let embeddings = self.collect_embeddings(&dir)?;
            if embeddings.is_empty() {
                log::warn!("No faces found for '{name}', skipping");
                continue;
            }

            let count = embeddings.len();
            log::info!("Enrolled '{name}' from {count} photo(s)");
            database.insert(name, mean_embedding(&embeddings));
        }

        if database.is_empty() {
            return Err(Box::new(EnrollmentError::Empty(people_dir.to_path_buf())));
        }

        Ok(database)
    }

    /// One embedding per photo in `dir` that contains at least one face.
    fn collect_embeddings(
        &mut self,
        dir: &Path,
    ) -> Result<Vec<Vec<f32>>, Box<dyn std::error::Error>> {
        let mut image_paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| is_image_file(path))
            .collect();
        image_paths.sort();

        let mut embeddings = Vec::new();
        for path in image_paths {
            self.reader.open(&path)?;
            let frame = self.reader.frames().next().ok_or("No frames in image")??;
            self.reader.close();

            let boxes = self.detector.detect(&frame)?;
            let Some(face) = boxes.first() else {
                log::warn!("No face detected in {}, skipping", path.display());
                continue;
            };

            let mut face_embeddings = self.embedder.embed(&frame, &[*face])?;
            if let Some(embedding) = face_embeddings.pop() {
                embeddings.push(embedding);
            }
        }
        Ok(embeddings)
    }
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
}

fn mean_embedding(embeddings: &[Vec<f32>]) -> Vec<f32> {
    let dim = embeddings[0].len();
    let mut mean = vec![0.0f32; dim];
    for embedding in embeddings {
        debug_assert_eq!(embedding.len(), dim);
        for (acc, value) in mean.iter_mut().zip(embedding) {
            *acc += value;
        }
    }
    let n = embeddings.len() as f32;
    for value in &mut mean {
        *value /= n;
    }
    mean
}
