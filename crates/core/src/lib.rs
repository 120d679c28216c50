pub mod database;
pub mod detection;
pub mod pipeline;
pub mod recognition;
pub mod rendering;
pub mod shared;
pub mod video;
