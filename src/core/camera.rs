//! OpenCV-backed camera, Haar cascade detector and preview window

use image::GrayImage;
use opencv::{
    core::{self, Mat, Point, Rect, Scalar, Size, Vector},
    highgui, imgproc, objdetect,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

use crate::config::LampConfig;
use crate::core::runner::{FaceDetector, FrameSource, Preview};
use crate::error::{LampError, Result};
use crate::types::{Candidate, Frame, StepOutput};

const CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";

/// Install locations searched when the configured cascade path fails
const CASCADE_DIRS: [&str; 5] = [
    "/usr/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    "/usr/local/share/opencv/haarcascades",
    "/opt/homebrew/share/opencv4/haarcascades",
];

const WINDOW_NAME: &str = "Face Detection - Press Q to quit";

// =============================================================================
// CAMERA
// =============================================================================

/// Webcam frames, converted to grayscale
pub struct CameraSource {
    capture: VideoCapture,
    index: i32,
    sequence: u64,
    bgr: Mat,
    gray: Mat,
}

impl CameraSource {
    /// Open the configured camera, falling back through the other indices
    pub fn open(config: &LampConfig) -> Result<Self> {
        let tried = config.camera_candidates();
        for &index in &tried {
            match Self::open_index(index, config) {
                Ok(Some(source)) => {
                    if index != config.camera_index {
                        info!(index, "using fallback camera");
                    }
                    return Ok(source);
                }
                Ok(None) => warn!(index, "camera did not open"),
                Err(e) => warn!(index, error = %e, "camera did not open"),
            }
        }
        Err(LampError::NoCamera { tried })
    }

    fn open_index(index: i32, config: &LampConfig) -> Result<Option<Self>> {
        let mut capture = VideoCapture::new(index, videoio::CAP_ANY)?;
        if !capture.is_opened()? {
            return Ok(None);
        }
        capture.set(videoio::CAP_PROP_FRAME_WIDTH, config.frame_width as f64)?;
        capture.set(videoio::CAP_PROP_FRAME_HEIGHT, config.frame_height as f64)?;
        Ok(Some(Self {
            capture,
            index,
            sequence: 0,
            bgr: Mat::default(),
            gray: Mat::default(),
        }))
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    /// Frame rate reported by the driver, if any
    pub fn fps(&self) -> Option<f64> {
        self.capture
            .get(videoio::CAP_PROP_FPS)
            .ok()
            .filter(|fps| *fps > 0.0)
    }
}

impl FrameSource for CameraSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        if !self.capture.read(&mut self.bgr)? || self.bgr.empty() {
            return Err(LampError::Capture("camera returned no frame".into()));
        }
        let captured_at = Instant::now();

        imgproc::cvt_color(&self.bgr, &mut self.gray, imgproc::COLOR_BGR2GRAY, 0)?;
        let gray = gray_image_from_mat(&self.gray)?;

        self.sequence += 1;
        Ok(Some(Frame::new(gray, captured_at, self.sequence)))
    }
}

fn gray_image_from_mat(mat: &Mat) -> Result<GrayImage> {
    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    let data = mat.data_bytes()?.to_vec();
    GrayImage::from_raw(width, height, data)
        .ok_or_else(|| LampError::Capture(format!("unexpected buffer size for {}x{}", width, height)))
}

fn mat_from_gray_image(gray: &GrayImage) -> Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(
        gray.height() as i32,
        gray.width() as i32,
        core::CV_8UC1,
        Scalar::all(0.0),
    )?;
    mat.data_bytes_mut()?.copy_from_slice(gray.as_raw());
    Ok(mat)
}

// =============================================================================
// DETECTOR
// =============================================================================

/// Haar cascade frontal-face detector
pub struct CascadeDetector {
    classifier: objdetect::CascadeClassifier,
    path: PathBuf,
}

impl CascadeDetector {
    /// Load the configured cascade, else search the usual install locations
    pub fn load(configured: Option<&Path>) -> Result<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(path) = configured {
            candidates.push(path.to_path_buf());
        }
        candidates.extend(CASCADE_DIRS.iter().map(|dir| Path::new(dir).join(CASCADE_FILE)));

        for path in &candidates {
            if !path.is_file() {
                continue;
            }
            let Some(path_str) = path.to_str() else {
                continue;
            };
            match objdetect::CascadeClassifier::new(path_str) {
                Ok(classifier) if !classifier.empty().unwrap_or(true) => {
                    info!(path = %path.display(), "face cascade loaded");
                    return Ok(Self {
                        classifier,
                        path: path.clone(),
                    });
                }
                Ok(_) => warn!(path = %path.display(), "cascade file is empty or corrupt"),
                Err(e) => warn!(path = %path.display(), error = %e, "cascade failed to load"),
            }
        }

        Err(LampError::DetectorInit(format!(
            "could not load {} (searched {} locations)",
            CASCADE_FILE,
            candidates.len()
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FaceDetector for CascadeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Candidate>> {
        let gray = mat_from_gray_image(&frame.gray)?;
        let mut equalized = Mat::default();
        imgproc::equalize_hist(&gray, &mut equalized).map_err(detection_error)?;

        let mut faces = Vector::<Rect>::new();
        self.classifier
            .detect_multi_scale(
                &equalized,
                &mut faces,
                1.05,
                5,
                0,
                Size::new(50, 50),
                Size::new(300, 300),
            )
            .map_err(detection_error)?;

        Ok(faces
            .iter()
            .map(|r| {
                Candidate::new(
                    r.x.max(0) as u32,
                    r.y.max(0) as u32,
                    r.width.max(0) as u32,
                    r.height.max(0) as u32,
                )
            })
            .collect())
    }
}

fn detection_error(e: opencv::Error) -> LampError {
    LampError::Detection(e.to_string())
}

// =============================================================================
// PREVIEW
// =============================================================================

/// HighGUI window with face boxes and lamp status; 'q' quits
pub struct PreviewWindow {
    fps: Option<f64>,
}

impl PreviewWindow {
    pub fn open(fps: Option<f64>) -> Result<Self> {
        highgui::named_window(WINDOW_NAME, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self { fps })
    }
}

impl Preview for PreviewWindow {
    fn show(&mut self, frame: &Frame, valid: &[Candidate], output: &StepOutput) -> Result<bool> {
        let green = Scalar::new(0.0, 255.0, 0.0, 0.0);
        let white = Scalar::new(255.0, 255.0, 255.0, 0.0);

        let gray = mat_from_gray_image(&frame.gray)?;
        let mut canvas = Mat::default();
        imgproc::cvt_color(&gray, &mut canvas, imgproc::COLOR_GRAY2BGR, 0)?;

        for c in valid {
            let rect = Rect::new(c.x as i32, c.y as i32, c.width as i32, c.height as i32);
            imgproc::rectangle(&mut canvas, rect, green, 2, imgproc::LINE_8, 0)?;
            imgproc::put_text(
                &mut canvas,
                "Face",
                Point::new(rect.x, rect.y - 10),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.5,
                green,
                2,
                imgproc::LINE_8,
                false,
            )?;
        }

        if !valid.is_empty() {
            imgproc::put_text(
                &mut canvas,
                &format!("Faces: {}", valid.len()),
                Point::new(10, 30),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.7,
                green,
                2,
                imgproc::LINE_8,
                false,
            )?;
        }

        if let Some(fps) = self.fps {
            imgproc::put_text(
                &mut canvas,
                &format!("FPS: {:.1}", fps),
                Point::new(10, 60),
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.6,
                white,
                2,
                imgproc::LINE_8,
                false,
            )?;
        }

        imgproc::put_text(
            &mut canvas,
            &format!("LED: {}", output.state),
            Point::new(10, 90),
            imgproc::FONT_HERSHEY_SIMPLEX,
            0.6,
            white,
            2,
            imgproc::LINE_8,
            false,
        )?;

        highgui::imshow(WINDOW_NAME, &canvas)?;
        let key = highgui::wait_key(1)?;
        Ok(key & 0xFF == 'q' as i32)
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        let _ = highgui::destroy_all_windows();
    }
}
