//! # Simulator
//!
//! High-level façade over the simulator client.
//!
//! Responsibilities:
//! - Connect with a bounded timeout
//! - Spawn the ego vehicle (lifted, collision-checked)
//! - Attach named cameras and lidar, keep their latest decoded frames
//! - Forward control commands
//! - Ordered teardown: sensors first, then the vehicle

mod error;
mod facade;

pub use error::{FacadeError, Result};
pub use facade::{CarlaSimulator, SPAWN_Z_LIFT};
