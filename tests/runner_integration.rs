//! Integration tests for the frame processing loop
//!
//! Scripted frame source and detector in place of the camera and cascade,
//! a recording sink in place of the HTTP dispatcher.

use facelamp::core::{
    CommandSink, FaceDetector, FrameSource, LoopSummary, PresenceLoop, Preview, StopCause,
};
use facelamp::types::{Candidate, Frame, LampState, LedCommand, StepOutput};
use facelamp::{LampConfig, LampError, Result};
use image::{GrayImage, Luma};
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// One scripted capture event
#[derive(Clone, Copy)]
enum Shot {
    /// Frame of uniform brightness with one face rectangle
    Face(u8),
    /// Frame with no face
    Empty,
    /// Read failure
    ReadError,
    /// Detector error on this frame
    DetectError,
}

struct ScriptedSource {
    shots: VecDeque<Shot>,
    t0: Instant,
    sequence: u64,
    /// Shots of frames handed out since the detector last looked
    delivered: Arc<Mutex<VecDeque<Shot>>>,
}

/// Detector that reads back which shot the newest frame was
struct ScriptedDetector {
    delivered: Arc<Mutex<VecDeque<Shot>>>,
}

fn rig(shots: impl IntoIterator<Item = Shot>) -> (ScriptedSource, ScriptedDetector) {
    let delivered = Arc::new(Mutex::new(VecDeque::new()));
    let source = ScriptedSource {
        shots: shots.into_iter().collect(),
        t0: Instant::now(),
        sequence: 0,
        delivered: Arc::clone(&delivered),
    };
    (source, ScriptedDetector { delivered })
}

impl FrameSource for ScriptedSource {
    fn read(&mut self) -> Result<Option<Frame>> {
        let Some(shot) = self.shots.pop_front() else {
            return Ok(None);
        };
        if let Shot::ReadError = shot {
            return Err(LampError::Capture("scripted read failure".into()));
        }
        let brightness = match shot {
            Shot::Face(b) => b,
            _ => 100,
        };
        let at = self.t0 + FRAME_INTERVAL * self.sequence as u32;
        self.sequence += 1;
        self.delivered.lock().unwrap().push_back(shot);
        Ok(Some(Frame::new(
            GrayImage::from_pixel(64, 48, Luma([brightness])),
            at,
            self.sequence,
        )))
    }
}

impl FaceDetector for ScriptedDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<Candidate>> {
        // Skipped frames are never detected on; keep only the newest
        let shot = {
            let mut delivered = self.delivered.lock().unwrap();
            let last = delivered.back().copied();
            delivered.clear();
            last
        };
        match shot {
            Some(Shot::Face(_)) => Ok(vec![Candidate::new(10, 10, 20, 20)]),
            Some(Shot::DetectError) => Err(LampError::Detection("scripted failure".into())),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Default, Clone)]
struct RecordingSink {
    commands: Arc<Mutex<Vec<LedCommand>>>,
}

impl RecordingSink {
    fn commands(&self) -> Vec<LedCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl CommandSink for RecordingSink {
    fn submit(&self, command: LedCommand) {
        self.commands.lock().unwrap().push(command);
    }
}

fn test_config(stride: u32) -> LampConfig {
    LampConfig {
        frame_stride: stride,
        capture_retry_ms: 0,
        cooldown_ms: 2000,
        ..Default::default()
    }
}

fn run(shots: Vec<Shot>, stride: u32) -> (LoopSummary, Vec<LedCommand>, Vec<StepOutput>) {
    let (source, detector) = rig(shots);
    let sink = RecordingSink::default();
    let stop = AtomicBool::new(false);
    let mut outputs = Vec::new();
    let presence = PresenceLoop::new(source, detector, sink.clone(), &test_config(stride));
    let summary = presence.run(&stop, None, &mut |o: &StepOutput| outputs.push(o.clone()));
    (summary, sink.commands(), outputs)
}

#[test]
fn test_ten_faces_one_on_then_shutdown_off() {
    let (summary, commands, outputs) = run(vec![Shot::Face(100); 10], 1);

    assert_eq!(commands, vec![LedCommand::On, LedCommand::Off]);
    assert_eq!(summary.frames_processed, 10);
    assert_eq!(summary.commands_submitted, 2);
    assert_eq!(summary.stop_cause, StopCause::EndOfStream);
    // Lamp was on for the whole run until shutdown
    assert!(outputs[..10].iter().all(|o| o.state == LampState::On));
}

#[test]
fn test_overexposed_faces_only_shutdown_off() {
    let (_, commands, outputs) = run(vec![Shot::Face(250); 20], 1);
    assert_eq!(commands, vec![LedCommand::Off]);
    assert!(outputs.iter().all(|o| !o.presence));
}

#[test]
fn test_every_second_frame_processed() {
    let (summary, _, _) = run(vec![Shot::Empty; 10], 2);
    assert_eq!(summary.frames_read, 10);
    assert_eq!(summary.frames_processed, 5);
}

#[test]
fn test_read_errors_are_retried() {
    let shots = vec![Shot::ReadError, Shot::ReadError, Shot::Face(100), Shot::ReadError, Shot::Face(100)];
    let (summary, commands, _) = run(shots, 1);
    assert_eq!(summary.capture_failures, 3);
    assert_eq!(summary.frames_read, 2);
    assert_eq!(commands, vec![LedCommand::On, LedCommand::Off]);
}

#[test]
fn test_detector_error_skips_frame() {
    let shots = vec![Shot::DetectError, Shot::DetectError, Shot::Face(100)];
    let (summary, commands, outputs) = run(shots, 1);
    assert_eq!(summary.detector_failures, 2);
    assert_eq!(summary.frames_processed, 1);
    // Only the processed frame and the shutdown were reported
    assert_eq!(outputs.len(), 2);
    assert_eq!(commands, vec![LedCommand::On, LedCommand::Off]);
}

#[test]
fn test_stop_flag_ends_loop_with_off() {
    let (source, detector) = rig(vec![Shot::Face(100); 100]);
    let sink = RecordingSink::default();
    let stop = AtomicBool::new(true);
    let presence = PresenceLoop::new(source, detector, sink.clone(), &test_config(1));
    let summary = presence.run(&stop, None, &mut |_: &StepOutput| {});

    assert_eq!(summary.stop_cause, StopCause::Signal);
    assert_eq!(summary.frames_read, 0);
    assert_eq!(sink.commands(), vec![LedCommand::Off]);
}

/// Preview that asks to quit after a number of frames
struct QuitAfter {
    remaining: usize,
    shown: usize,
}

impl Preview for QuitAfter {
    fn show(&mut self, _frame: &Frame, _valid: &[Candidate], _output: &StepOutput) -> Result<bool> {
        self.shown += 1;
        self.remaining = self.remaining.saturating_sub(1);
        Ok(self.remaining == 0)
    }
}

#[test]
fn test_preview_quit_while_on_sends_single_off() {
    let (source, detector) = rig(vec![Shot::Face(100); 100]);
    let sink = RecordingSink::default();
    let stop = AtomicBool::new(false);
    let mut preview = QuitAfter { remaining: 3, shown: 0 };
    let presence = PresenceLoop::new(source, detector, sink.clone(), &test_config(1));
    let summary = presence.run(&stop, Some(&mut preview as &mut dyn Preview), &mut |_: &StepOutput| {});

    assert_eq!(summary.stop_cause, StopCause::PreviewQuit);
    assert_eq!(preview.shown, 3);
    // ON on the first frame, quit 0.2s later: the OFF bypasses the cooldown
    assert_eq!(sink.commands(), vec![LedCommand::On, LedCommand::Off]);
    assert!(!stop.load(Ordering::SeqCst));
}
