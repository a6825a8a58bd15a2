//! Frame processing loop
//!
//! source → (every Nth frame) → detector → brightness band → actuator → sink
//!
//! The loop is blocking and single-threaded; the only work leaving it is
//! `CommandSink::submit`. It stops when the stop flag is raised, the preview
//! asks to quit, or a finite source runs dry, and always sends a final OFF.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::LampConfig;
use crate::core::actuator::PresenceActuator;
use crate::core::brightness::BrightnessBand;
use crate::core::dispatch::CommandSink;
use crate::error::Result;
use crate::types::{Candidate, Frame, StepOutput};

/// Where frames come from
pub trait FrameSource {
    /// Ok(Some) = a frame, Ok(None) = stream ended, Err = transient read failure
    fn read(&mut self) -> Result<Option<Frame>>;
}

/// Face detection capability; the loop only consumes its rectangles
pub trait FaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Candidate>>;
}

/// Debug overlay for processed frames
pub trait Preview {
    /// Render one frame. Returns true when the user asked to quit.
    fn show(&mut self, frame: &Frame, valid: &[Candidate], output: &StepOutput) -> Result<bool>;
}

/// Called with every processed frame's output (terminal / JSON reporting)
pub type StepObserver<'a> = dyn FnMut(&StepOutput) + 'a;

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCause {
    /// Stop flag raised (Ctrl-C)
    Signal,
    /// Preview window asked to quit
    PreviewQuit,
    /// Finite source ran out of frames
    EndOfStream,
}

/// Counters reported when the loop exits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    pub frames_read: u64,
    pub frames_processed: u64,
    pub capture_failures: u64,
    pub detector_failures: u64,
    pub commands_submitted: u64,
    pub stop_cause: StopCause,
}

/// The presence loop: owns the source, detector and actuator
pub struct PresenceLoop<S, D, K> {
    source: S,
    detector: D,
    sink: K,
    actuator: PresenceActuator,
    band: BrightnessBand,
    frame_stride: u32,
    capture_retry: Duration,
    frames_read: u64,
    frames_processed: u64,
    capture_failures: u64,
    detector_failures: u64,
    commands_submitted: u64,
}

impl<S, D, K> PresenceLoop<S, D, K>
where
    S: FrameSource,
    D: FaceDetector,
    K: CommandSink,
{
    pub fn new(source: S, detector: D, sink: K, config: &LampConfig) -> Self {
        Self {
            source,
            detector,
            sink,
            actuator: PresenceActuator::new(config.cooldown()),
            band: BrightnessBand::new(config.brightness_low, config.brightness_high),
            frame_stride: config.frame_stride.max(1),
            capture_retry: config.capture_retry(),
            frames_read: 0,
            frames_processed: 0,
            capture_failures: 0,
            detector_failures: 0,
            commands_submitted: 0,
        }
    }

    pub fn actuator(&self) -> &PresenceActuator {
        &self.actuator
    }

    /// Run until stopped. Sends the final OFF, then hands the source back
    /// to the caller's drop (releasing the camera).
    pub fn run(
        mut self,
        stop: &AtomicBool,
        mut preview: Option<&mut dyn Preview>,
        observer: &mut StepObserver<'_>,
    ) -> LoopSummary {
        let stop_cause = loop {
            if stop.load(Ordering::SeqCst) {
                break StopCause::Signal;
            }

            let frame = match self.source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => break StopCause::EndOfStream,
                Err(e) => {
                    self.capture_failures += 1;
                    warn!(error = %e, "could not read frame, retrying");
                    if !self.capture_retry.is_zero() {
                        std::thread::sleep(self.capture_retry);
                    }
                    continue;
                }
            };

            self.frames_read += 1;
            if self.frames_read % self.frame_stride as u64 != 0 {
                continue;
            }

            let Some((valid, output)) = self.process(&frame) else {
                continue;
            };
            observer(&output);

            if let Some(view) = preview.as_deref_mut() {
                match view.show(&frame, &valid, &output) {
                    Ok(true) => break StopCause::PreviewQuit,
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "preview failed"),
                }
            }
        };

        let output = self.actuator.shutdown();
        if let Some(command) = output.command {
            self.sink.submit(command);
            self.commands_submitted += 1;
        }
        observer(&output);
        info!(?stop_cause, frames = self.frames_read, "presence loop stopped, lamp off");

        LoopSummary {
            frames_read: self.frames_read,
            frames_processed: self.frames_processed,
            capture_failures: self.capture_failures,
            detector_failures: self.detector_failures,
            commands_submitted: self.commands_submitted,
            stop_cause,
        }
    }

    /// Detect, filter and step the actuator for one frame.
    /// None when the detector failed and the frame was skipped.
    fn process(&mut self, frame: &Frame) -> Option<(Vec<Candidate>, StepOutput)> {
        let candidates = match self.detector.detect(frame) {
            Ok(c) => c,
            Err(e) => {
                self.detector_failures += 1;
                warn!(sequence = frame.sequence, error = %e, "detection failed, frame skipped");
                return None;
            }
        };
        self.frames_processed += 1;

        let valid = self.band.filter(&frame.gray, &candidates);
        debug!(
            sequence = frame.sequence,
            detected = candidates.len(),
            valid = valid.len(),
            "frame processed"
        );

        let output = self.actuator.update_at(!valid.is_empty(), frame.captured_at);
        if let Some(command) = output.command {
            info!(
                command = command.tag(),
                faces = valid.len(),
                reason = output.reason.code(),
                "lamp transition"
            );
            self.sink.submit(command);
            self.commands_submitted += 1;
        }
        Some((valid, output))
    }
}
