//! # Sensor Bridge
//!
//! Turns push-based simulator sensors into pull-based frame sources.
//!
//! Responsibilities:
//! - Decode raw buffers into typed arrays (`decode`)
//! - Bounded hand-off queue with an explicit overflow policy
//! - Sensor actor lifecycle: spawn, poll, destroy
//! - Latest-frame store for snapshot readers
//! - Ingestion metrics (received / dropped / decode errors / queue depth)

mod bridge;
mod config;
mod decode;
mod error;
mod latest;
mod queue;

pub use bridge::{BridgeState, SensorBridge};
pub use config::{
    BridgeConfig, DropPolicy, IngestionMetrics, MetricsSnapshot, DEFAULT_CAPACITY,
    DEFAULT_POLL_INTERVAL,
};
pub use decode::decode;
pub use error::{BridgeError, Result};
pub use latest::LatestFrames;
pub use queue::FrameQueue;
