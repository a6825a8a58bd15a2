//! Core modules for facelamp

pub mod brightness;
pub mod actuator;
pub mod device;
pub mod dispatch;
pub mod runner;
pub mod simulator;
#[cfg(feature = "opencv")]
pub mod camera;

pub use brightness::{BrightnessBand, mean_intensity};
pub use actuator::PresenceActuator;
pub use device::DeviceClient;
pub use dispatch::{CommandSink, DispatchCounts, HttpDispatcher};
pub use runner::{FaceDetector, FrameSource, LoopSummary, PresenceLoop, Preview, StopCause};
pub use simulator::{device_router, run_device_server, DeviceStatus, SimulatedDevice};
#[cfg(feature = "opencv")]
pub use camera::{CameraSource, CascadeDetector, PreviewWindow};
