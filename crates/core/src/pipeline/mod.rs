pub mod enroll_faces_use_case;
pub mod frame_processor;
pub mod mosaic_image_use_case;
pub mod mosaic_video_use_case;
pub mod pipeline_logger;
