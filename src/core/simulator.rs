//! Simulated LED controller
//!
//! Serves the same endpoints as the real device so the detector can run
//! without hardware:
//! - GET /           - banner (connectivity probe)
//! - GET /led/on     - LED on
//! - GET /led/off    - LED off
//! - GET /led/state  - current LED state and request counters (JSON)

use axum::{
    extract::State,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::types::{LampState, LedCommand};

/// LED as seen by the simulated device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub on: bool,
    pub on_requests: u64,
    pub off_requests: u64,
}

/// Shared simulator state
#[derive(Debug)]
pub struct SimulatedDevice {
    status: RwLock<DeviceStatus>,
    log: RwLock<Vec<LedCommand>>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedDevice {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(DeviceStatus {
                on: false,
                on_requests: 0,
                off_requests: 0,
            }),
            log: RwLock::new(Vec::new()),
        }
    }

    pub async fn status(&self) -> DeviceStatus {
        *self.status.read().await
    }

    pub async fn lamp_state(&self) -> LampState {
        if self.status.read().await.on {
            LampState::On
        } else {
            LampState::Off
        }
    }

    /// Commands received, in arrival order
    pub async fn received(&self) -> Vec<LedCommand> {
        self.log.read().await.clone()
    }

    async fn apply(&self, command: LedCommand) -> DeviceStatus {
        let mut status = self.status.write().await;
        match command {
            LedCommand::On => {
                status.on = true;
                status.on_requests += 1;
            }
            LedCommand::Off => {
                status.on = false;
                status.off_requests += 1;
            }
        }
        self.log.write().await.push(command);
        info!(command = command.tag(), "simulated LED switched");
        *status
    }
}

/// Create the simulator router around shared state
pub fn device_router(device: Arc<SimulatedDevice>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/led/on", get(led_on))
        .route("/led/off", get(led_off))
        .route("/led/state", get(led_state))
        .with_state(device)
}

async fn banner() -> &'static str {
    "facelamp simulated LED controller"
}

async fn led_on(State(device): State<Arc<SimulatedDevice>>) -> &'static str {
    device.apply(LedCommand::On).await;
    "LED ON"
}

async fn led_off(State(device): State<Arc<SimulatedDevice>>) -> &'static str {
    device.apply(LedCommand::Off).await;
    "LED OFF"
}

async fn led_state(State(device): State<Arc<SimulatedDevice>>) -> Json<DeviceStatus> {
    Json(device.status().await)
}

/// Serve the simulator until the process stops
pub async fn run_device_server(addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let device = Arc::new(SimulatedDevice::new());
    let router = device_router(device);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "simulated LED controller listening");
    println!("  GET /          - Probe");
    println!("  GET /led/on    - LED on");
    println!("  GET /led/off   - LED off");
    println!("  GET /led/state - Current state");
    axum::serve(listener, router).await?;
    Ok(())
}
