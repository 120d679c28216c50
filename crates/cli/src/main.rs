use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use facemosaic_core::database::domain::face_database::FaceDatabase;
use facemosaic_core::database::infrastructure::json_store;
use facemosaic_core::detection::domain::face_detector::FaceDetector;
use facemosaic_core::detection::domain::face_embedder::FaceEmbedder;
use facemosaic_core::detection::infrastructure::model_resolver;
use facemosaic_core::detection::infrastructure::onnx_arcface_embedder::OnnxArcFaceEmbedder;
use facemosaic_core::detection::infrastructure::onnx_face_detector::{
    OnnxFaceDetector, DEFAULT_CONFIDENCE,
};
use facemosaic_core::pipeline::enroll_faces_use_case::EnrollFacesUseCase;
use facemosaic_core::pipeline::frame_processor::FrameProcessor;
use facemosaic_core::pipeline::mosaic_image_use_case::MosaicImageUseCase;
use facemosaic_core::pipeline::mosaic_video_use_case::MosaicVideoUseCase;
use facemosaic_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facemosaic_core::recognition::domain::identity_tracker::{IdentityTracker, TrackerConfig};
use facemosaic_core::recognition::domain::recognizer::Recognizer;
use facemosaic_core::rendering::infrastructure::mosaic_renderer::MosaicRenderer;
use facemosaic_core::shared::constants::{
    DEFAULT_IOU_THRESHOLD, DEFAULT_MOSAIC_KERNEL, DEFAULT_RECOGNITION_BIAS,
    DEFAULT_RECOGNITION_THRESHOLD, DETECTOR_MODEL_NAME, DETECTOR_MODEL_URL, EMBEDDER_MODEL_NAME,
    EMBEDDER_MODEL_URL, IMAGE_EXTENSIONS,
};
use facemosaic_core::video::domain::video_reader::VideoReader;
use facemosaic_core::video::domain::video_writer::VideoWriter;
use facemosaic_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use facemosaic_core::video::infrastructure::ffmpeg_writer::FfmpegWriter;
use facemosaic_core::video::infrastructure::image_file_reader::ImageFileReader;
use facemosaic_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Face recognition and mosaic anonymization for videos and images.
///
/// Recognized faces are labeled; everyone else gets pixelated.
#[derive(Parser)]
#[command(name = "facemosaic")]
struct Cli {
    /// Input video or image file (not used with --enroll).
    input: Option<PathBuf>,

    /// Output file (not used with --enroll).
    output: Option<PathBuf>,

    /// Build the face database from a directory of reference photos
    /// (one subdirectory per person) instead of processing media.
    #[arg(long)]
    enroll: Option<PathBuf>,

    /// Face database file.
    #[arg(long, default_value = "face_db.json")]
    database: PathBuf,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Minimum frame-to-frame box overlap for identity carry-over (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_IOU_THRESHOLD)]
    iou_threshold: f64,

    /// Distance credit for last frame's identity at an overlapping box.
    #[arg(long, default_value_t = DEFAULT_RECOGNITION_BIAS)]
    recognition_bias: f32,

    /// Maximum embedding distance for a face to count as recognized.
    #[arg(long, default_value_t = DEFAULT_RECOGNITION_THRESHOLD)]
    recognition_threshold: f32,

    /// Mosaic block size: larger values give coarser pixelation.
    #[arg(long, default_value_t = DEFAULT_MOSAIC_KERNEL)]
    mosaic_kernel: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    if let Some(people_dir) = cli.enroll.as_deref() {
        return run_enroll(people_dir, &cli.database, cli.confidence);
    }

    // validate() guarantees both are present past this point
    let input = cli.input.as_ref().ok_or("Input file is required")?;
    let output = cli.output.as_ref().ok_or("Output file is required")?;
    let database = json_store::load(&cli.database)?;
    log::info!(
        "Loaded {} identities from {}",
        database.len(),
        cli.database.display()
    );

    let processor = build_processor(&cli, database)?;
    if is_image(input) {
        run_image(input, output, processor)
    } else {
        run_video(input, output, processor, &cli)
    }
}

fn run_enroll(
    people_dir: &Path,
    database_path: &Path,
    confidence: f64,
) -> Result<(), Box<dyn std::error::Error>> {
    let detector = build_detector(confidence)?;
    let embedder = build_embedder()?;

    let mut use_case =
        EnrollFacesUseCase::new(Box::new(ImageFileReader::new()), detector, embedder);
    let database = use_case.execute(people_dir)?;
    json_store::save(database_path, &database)?;
    log::info!(
        "Saved {} identities to {}",
        database.len(),
        database_path.display()
    );
    Ok(())
}

fn run_image(
    input: &Path,
    output: &Path,
    processor: FrameProcessor,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = MosaicImageUseCase::new(
        Box::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        processor,
    );
    use_case.execute(input, output)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_video(
    input: &Path,
    output: &Path,
    processor: FrameProcessor,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader: Box<dyn VideoReader> = Box::new(FfmpegReader::new());
    let writer: Box<dyn VideoWriter> = Box::new(FfmpegWriter::new());
    let tracker = IdentityTracker::new(TrackerConfig::new(
        cli.iou_threshold,
        cli.recognition_bias,
    )?);

    let mut use_case = MosaicVideoUseCase::new(
        reader,
        writer,
        processor,
        tracker,
        Box::new(StdoutPipelineLogger::default()),
    );
    use_case.execute(input, output)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn build_processor(
    cli: &Cli,
    database: FaceDatabase,
) -> Result<FrameProcessor, Box<dyn std::error::Error>> {
    Ok(FrameProcessor::new(
        build_detector(cli.confidence)?,
        build_embedder()?,
        Recognizer::new(cli.recognition_threshold),
        Box::new(MosaicRenderer::new(cli.mosaic_kernel)),
        database,
    ))
}

fn build_detector(confidence: f64) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {DETECTOR_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        DETECTOR_MODEL_NAME,
        DETECTOR_MODEL_URL,
        Some(Box::new(|d, t| download_progress("face detection", d, t))),
    )?;
    eprintln!();
    Ok(Box::new(OnnxFaceDetector::new(&model_path, confidence)?))
}

fn build_embedder() -> Result<Box<dyn FaceEmbedder>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {EMBEDDER_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        EMBEDDER_MODEL_NAME,
        EMBEDDER_MODEL_URL,
        Some(Box::new(|d, t| download_progress("face embedding", d, t))),
    )?;
    eprintln!();
    Ok(Box::new(OnnxArcFaceEmbedder::new(&model_path)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.enroll.is_some() {
        if cli.input.is_some() || cli.output.is_some() {
            return Err("--enroll does not take input/output files".into());
        }
        return Ok(());
    }
    let Some(input) = cli.input.as_ref() else {
        return Err("Input file is required unless --enroll is used".into());
    };
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    if cli.output.is_none() {
        return Err("Output file is required unless --enroll is used".into());
    }
    if !cli.database.exists() {
        return Err(format!(
            "Face database not found: {} (run with --enroll first)",
            cli.database.display()
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if !(cli.iou_threshold > 0.0 && cli.iou_threshold <= 1.0) {
        return Err(format!(
            "IoU threshold must be in (0.0, 1.0], got {}",
            cli.iou_threshold
        )
        .into());
    }
    if !cli.recognition_bias.is_finite() || cli.recognition_bias < 0.0 {
        return Err(format!(
            "Recognition bias must be >= 0, got {}",
            cli.recognition_bias
        )
        .into());
    }
    if !(cli.recognition_threshold > 0.0) {
        return Err(format!(
            "Recognition threshold must be > 0, got {}",
            cli.recognition_threshold
        )
        .into());
    }
    if cli.mosaic_kernel < 2 {
        return Err(format!(
            "Mosaic kernel must be at least 2, got {}",
            cli.mosaic_kernel
        )
        .into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(what: &str, downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading {what} model... {pct}%");
    } else {
        eprint!("\rDownloading {what} model... {downloaded} bytes");
    }
}
