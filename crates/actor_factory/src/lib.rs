//! # Actor Factory
//!
//! CARLA simulator client layer.
//!
//! Responsibilities:
//! - Connect to the simulator with a bounded timeout
//! - Spawn vehicles (collision-checked) and sensors, destroy actors
//! - Apply vehicle control
//! - Provide unified `SensorSource` abstraction for real and mock sensors
//!
//! ## Feature Flags
//!
//! - `real-carla`: Enable real CARLA client (requires carla crate)

pub mod client;
pub mod error;
pub mod mock_client;
pub mod mock_sensor;

#[cfg(feature = "real-carla")]
pub mod carla_client;
#[cfg(feature = "real-carla")]
pub mod carla_sensor_source;
#[cfg(feature = "real-carla")]
pub mod sensor_data_converter;

pub use client::{SimulatorClient, DEFAULT_CONNECT_TIMEOUT};
pub use contracts::{ActorId, SensorSource};
pub use error::{Result, SimulatorError};
pub use mock_client::{MockActor, MockConfig, MockSimulatorClient, Obstacle, MOCK_BLUEPRINTS};
pub use mock_sensor::{synthetic_frame, MockSensorSource, MOCK_LIDAR_POINTS};

#[cfg(feature = "real-carla")]
pub use carla_client::RealCarlaClient;
#[cfg(feature = "real-carla")]
pub use carla_sensor_source::CarlaSensorSource;
