//! # Contracts
//!
//! Shared interface contracts between the harness crates: poses, sensor kinds,
//! raw and decoded frames, control commands and the sensor source trait.
//! Business crates depend on this crate only, never on each other in reverse.
//!
//! ## Time Model
//! - Uses the simulator timestamp (seconds, f64) as primary clock
//! - `frame_id` is the simulator frame number, used for ordering/diagnostics

mod control;
mod error;
mod runtime;
mod sensor;
mod sensor_source;
mod transform;
mod weather;

pub use control::*;
pub use error::*;
pub use runtime::*;
pub use sensor::*;
pub use sensor_source::{SensorDataCallback, SensorSource};
pub use transform::*;
pub use weather::*;
