use serde::{Deserialize, Serialize};

/// One enrolled identity: a unique name and its reference embedding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceDatabaseEntry {
    pub name: String,
    pub embedding: Vec<f32>,
}

/// Name → embedding lookup table for recognition.
///
/// Entries keep insertion order; that order is the recognizer's
/// tie-break, so it must be stable across load/save. The database is
/// read-only during recognition and mutated only by enrollment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceDatabase {
    entries: Vec<FaceDatabaseEntry>,
}

impl FaceDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for `name`. Replacing keeps the
    /// original position so iteration order stays stable.
    pub fn insert(&mut self, name: impl Into<String>, embedding: Vec<f32>) {
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.embedding = embedding,
            None => self.entries.push(FaceDatabaseEntry { name, embedding }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.embedding.as_slice())
    }

    pub fn entries(&self) -> &[FaceDatabaseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
