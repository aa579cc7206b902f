//! Simulator client abstraction
//!
//! Defines the trait for interacting with CARLA, with a real implementation
//! and a mock for tests.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use contracts::{ActorId, SensorKind, SensorSource, Transform, VehicleControl};

use crate::error::Result;

/// Default connection timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Simulator client trait
///
/// All methods take `&self`; implementations keep connection and actor state
/// behind interior mutability so one client can be shared (`Arc`) between the
/// façade and any sensor bridges it hands out.
pub trait SimulatorClient: Send + Sync {
    /// Connect to the server and fetch the active world.
    ///
    /// Fails with `ConnectionFailed` naming host/port when the server does not
    /// answer within `timeout`. No retry.
    fn connect(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Whether a world is available
    fn is_connected(&self) -> bool;

    /// Drop the connection and world handles.
    ///
    /// Actors still alive are not destroyed. Idempotent; a later `connect`
    /// starts over.
    fn disconnect(&self);

    /// Collision-checked vehicle spawn
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint id, e.g. "vehicle.tesla.model3"
    /// * `transform` - Exact spawn pose (no adjustment is applied here)
    /// * `role_name` - Value for the blueprint's `role_name` attribute
    ///
    /// # Errors
    /// `BlueprintNotFound` for an unknown model, `SpawnCollision` when the
    /// position is occupied.
    fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
        role_name: &str,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Spawn a sensor, optionally attached to a parent actor
    ///
    /// # Arguments
    /// * `blueprint` - Blueprint id, e.g. "sensor.camera.rgb"
    /// * `transform` - Pose relative to the parent (world pose without one)
    /// * `parent` - Parent actor
    /// * `attributes` - Blueprint attributes
    fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent: Option<ActorId>,
        attributes: &HashMap<String, String>,
    ) -> impl Future<Output = Result<ActorId>> + Send;

    /// Get the push-based data source of a spawned sensor
    ///
    /// Returns None if the actor doesn't exist or is not a sensor.
    fn sensor_source(
        &self,
        actor_id: ActorId,
        name: &str,
        kind: SensorKind,
    ) -> Option<Box<dyn SensorSource>>;

    /// Apply a control command to a vehicle
    fn apply_control(
        &self,
        vehicle_id: ActorId,
        control: VehicleControl,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Destroy actor
    ///
    /// Idempotent operation: returns Ok if actor doesn't exist
    fn destroy_actor(&self, actor_id: ActorId) -> impl Future<Output = Result<()>> + Send;

    /// Check if actor exists
    fn actor_exists(&self, actor_id: ActorId) -> impl Future<Output = Result<bool>> + Send;

    /// Actors currently alive in the world
    fn actor_ids(&self) -> impl Future<Output = Result<Vec<ActorId>>> + Send;
}
