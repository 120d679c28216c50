pub mod identity;
pub mod identity_tracker;
pub mod recognizer;
