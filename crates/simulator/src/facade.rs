//! CarlaSimulator 核心实现
//!
//! 一个连接、至多一辆车、按名称管理的传感器，以及每个传感器的最新帧。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use actor_factory::{SimulatorClient, DEFAULT_CONNECT_TIMEOUT};
use contracts::{
    ActorId, DropPolicy, Frame, Location, Rotation, SensorKind, SensorMount, Transform,
    VehicleControl, DEFAULT_ROLE_NAME,
};
use sensor_bridge::{BridgeConfig, LatestFrames, SensorBridge};
use tracing::{debug, info, instrument, warn};

use crate::error::{FacadeError, Result};

/// Height added to every requested vehicle spawn, so the chassis clears the road
pub const SPAWN_Z_LIFT: f64 = 0.2;

/// Simulator Façade
///
/// Owns the ego vehicle and every sensor attached to it. Sensors are keyed by
/// name; each keeps only its most recent decoded frame for `get_sensor_data`.
pub struct CarlaSimulator<C: SimulatorClient> {
    client: Arc<C>,
    timeout: Duration,
    vehicle: Option<ActorId>,
    sensors: HashMap<String, SensorBridge<C>>,
    latest: LatestFrames,
}

impl<C: SimulatorClient> CarlaSimulator<C> {
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(client),
            timeout: DEFAULT_CONNECT_TIMEOUT,
            vehicle: None,
            sensors: HashMap::new(),
            latest: LatestFrames::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    pub fn vehicle(&self) -> Option<ActorId> {
        self.vehicle
    }

    pub fn sensor_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sensors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn sensor(&self, name: &str) -> Option<&SensorBridge<C>> {
        self.sensors.get(name)
    }

    /// Connect and fetch the world. No retry.
    #[instrument(name = "simulator_connect", skip(self), fields(host = %host, port))]
    pub async fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.client.connect(host, port, self.timeout).await?;
        info!("connected");
        Ok(())
    }

    /// Spawn the ego vehicle.
    ///
    /// # Arguments
    /// * `model` - Blueprint id, with or without the `vehicle.` prefix
    /// * `pose` - `Transform` or `SpawnPose`; z is raised by `SPAWN_Z_LIFT`
    /// * `role_name` - Role attribute, usually `DEFAULT_ROLE_NAME`
    ///
    /// # Errors
    /// Unknown model, occupied spawn point ("collision"), missing connection
    /// or an already spawned vehicle.
    #[instrument(name = "simulator_spawn_vehicle", skip(self, pose), fields(model = %model))]
    pub async fn spawn_vehicle(
        &mut self,
        model: &str,
        pose: impl Into<Transform>,
        role_name: &str,
    ) -> Result<ActorId> {
        if !self.is_connected() {
            return Err(FacadeError::NotConnected);
        }
        if let Some(actor_id) = self.vehicle {
            return Err(FacadeError::VehicleExists { actor_id });
        }

        let blueprint = if model.starts_with("vehicle.") {
            model.to_string()
        } else {
            format!("vehicle.{model}")
        };
        let mut transform = pose.into();
        transform.location = transform.location.lifted(SPAWN_Z_LIFT);

        let actor_id = self
            .client
            .spawn_vehicle(&blueprint, transform, role_name)
            .await?;
        self.vehicle = Some(actor_id);
        info!(actor_id, z = transform.location.z, "vehicle spawned");
        Ok(actor_id)
    }

    /// Spawn the ego vehicle with the default role name
    pub async fn spawn_default_vehicle(
        &mut self,
        model: &str,
        pose: impl Into<Transform>,
    ) -> Result<ActorId> {
        self.spawn_vehicle(model, pose, DEFAULT_ROLE_NAME).await
    }

    pub async fn add_rgb_camera(
        &mut self,
        name: &str,
        position: Location,
        rotation: Rotation,
        fov: f64,
    ) -> Result<ActorId> {
        self.add_sensor(name, SensorKind::rgb_camera(fov), position, rotation)
            .await
    }

    pub async fn add_lidar(
        &mut self,
        name: &str,
        position: Location,
        rotation: Rotation,
        channels: u32,
        range: f64,
    ) -> Result<ActorId> {
        self.add_sensor(name, SensorKind::lidar(channels, range), position, rotation)
            .await
    }

    pub async fn add_semantic_camera(
        &mut self,
        name: &str,
        position: Location,
        rotation: Rotation,
        fov: f64,
    ) -> Result<ActorId> {
        self.add_sensor(name, SensorKind::semantic_camera(fov), position, rotation)
            .await
    }

    pub async fn add_depth_camera(
        &mut self,
        name: &str,
        position: Location,
        rotation: Rotation,
        fov: f64,
    ) -> Result<ActorId> {
        self.add_sensor(name, SensorKind::depth_camera(fov), position, rotation)
            .await
    }

    /// Attach a sensor to the vehicle and keep its latest frame under `name`.
    ///
    /// Re-using a name replaces the stored sensor; the previous actor stays
    /// in the world.
    #[instrument(
        name = "simulator_add_sensor",
        skip(self, position, rotation),
        fields(sensor = %name, kind = kind.label())
    )]
    pub async fn add_sensor(
        &mut self,
        name: &str,
        kind: SensorKind,
        position: Location,
        rotation: Rotation,
    ) -> Result<ActorId> {
        let vehicle = self.vehicle.ok_or(FacadeError::NoVehicle)?;

        // Only the latest frame is read here, so the queue holds a single slot.
        let mut bridge = SensorBridge::with_config(
            self.client.clone(),
            name,
            kind,
            SensorMount::new(position, rotation, Some(vehicle)),
            BridgeConfig::new(1, DropPolicy::DropOldest),
        )
        .with_latest(self.latest.clone());
        let actor_id = bridge.spawn().await?;

        if let Some(previous) = self.sensors.insert(name.to_string(), bridge) {
            warn!(
                sensor = %name,
                orphaned_actor = ?previous.actor_id(),
                "sensor name reused, previous actor is no longer managed"
            );
        }
        debug!(actor_id, "sensor attached");
        Ok(actor_id)
    }

    /// Unspawned queued bridge attached to the vehicle, for callers that
    /// need every frame rather than the latest one. `name` labels its logs
    /// and metrics; the façade does not track it.
    pub fn bridge(
        &self,
        name: &str,
        kind: SensorKind,
        position: Location,
        rotation: Rotation,
    ) -> Result<SensorBridge<C>> {
        let vehicle = self.vehicle.ok_or(FacadeError::NoVehicle)?;
        Ok(SensorBridge::new(
            self.client.clone(),
            name,
            kind,
            SensorMount::new(position, rotation, Some(vehicle)),
        ))
    }

    /// Latest decoded frame of every sensor, by name
    pub fn get_sensor_data(&self) -> HashMap<String, Frame> {
        self.latest.snapshot()
    }

    /// Actors alive in the world
    pub async fn get_actors(&self) -> Result<Vec<ActorId>> {
        if !self.is_connected() {
            return Err(FacadeError::NotConnected);
        }
        Ok(self.client.actor_ids().await?)
    }

    /// Forward a control command to the vehicle
    pub async fn apply_control(&self, control: VehicleControl) -> Result<()> {
        let vehicle = self.vehicle.ok_or(FacadeError::NoVehicle)?;
        self.client.apply_control(vehicle, control).await?;
        Ok(())
    }

    /// Destroy every sensor, then the vehicle, then close the connection.
    ///
    /// Safe with nothing spawned and safe to call repeatedly. A new
    /// `connect` is needed before spawning again.
    #[instrument(
        name = "simulator_disconnect",
        skip(self),
        fields(sensors = self.sensors.len(), vehicle = ?self.vehicle)
    )]
    pub async fn disconnect(&mut self) {
        for (name, mut bridge) in self.sensors.drain() {
            debug!(sensor = %name, "destroying sensor");
            bridge.destroy().await;
        }

        if let Some(vehicle) = self.vehicle.take() {
            match self.client.destroy_actor(vehicle).await {
                Ok(()) => debug!(actor_id = vehicle, "vehicle destroyed"),
                Err(e) => warn!(actor_id = vehicle, error = %e, "failed to destroy vehicle"),
            }
        }

        self.latest.clear();
        self.client.disconnect();
        info!("disconnected");
    }
}
