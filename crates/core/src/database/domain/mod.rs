pub mod face_database;
