//! Real CARLA client implementation
//!
//! Connects to CARLA server using carla-rust crate.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use carla::client::{ActorBase, Client, Sensor, Vehicle, World};
use carla::geom::{Location, Rotation, Transform as CarlaTransform};
use carla::rpc::VehicleControl as CarlaControl;
use contracts::{ActorId, SensorKind, SensorSource, Transform, VehicleControl};
use tracing::{debug, info, instrument, warn};

use crate::carla_sensor_source::CarlaSensorSource;
use crate::client::SimulatorClient;
use crate::error::{Result, SimulatorError};

/// Real CARLA client
///
/// Wraps carla-rust's Client. Uses Mutex for interior mutability, allowing
/// `&self` methods to modify World.
#[derive(Default, Clone)]
pub struct RealCarlaClient {
    client: Arc<Mutex<Option<Client>>>,
    world: Arc<Mutex<Option<World>>>,
    /// Actors created through this client (for teardown)
    actors: Arc<Mutex<HashMap<ActorId, ActorType>>>,
}

#[derive(Clone)]
enum ActorType {
    Vehicle(Vehicle),
    Sensor(Sensor),
}

impl RealCarlaClient {
    /// Create new client (disconnected state)
    pub fn new() -> Self {
        Self::default()
    }

    /// Access World with mutable reference, ensuring connected
    fn with_world_mut<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut World) -> Result<R>,
    {
        let mut world_guard = self.world.lock().unwrap();
        let world = world_guard.as_mut().ok_or(SimulatorError::NotConnected)?;
        f(world)
    }

    fn store_actor(&self, actor_id: ActorId, actor: ActorType) {
        self.actors.lock().unwrap().insert(actor_id, actor);
    }

    /// carla-rust panics when the server does not answer; turn that into an error.
    fn open(host: String, port: u16, timeout: Duration) -> std::result::Result<(Client, World), String> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            let mut client = Client::connect(&host, port, None);
            client.set_timeout(timeout);
            let world = client.world();
            (client, world)
        }))
        .map_err(|payload| {
            payload
                .downcast_ref::<String>()
                .cloned()
                .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
                .unwrap_or_else(|| "server did not respond".to_string())
        })
    }

    fn create_vehicle(
        world: &mut World,
        blueprint: &str,
        transform: Transform,
        role_name: &str,
    ) -> Result<Vehicle> {
        let bp_library = world.blueprint_library();
        let mut vehicle_bp =
            bp_library
                .find(blueprint)
                .ok_or_else(|| SimulatorError::BlueprintNotFound {
                    blueprint: blueprint.to_string(),
                })?;
        if !vehicle_bp.set_attribute("role_name", role_name) {
            warn!(role_name, "failed to set vehicle role_name");
        }

        let actor = world
            .spawn_actor(&vehicle_bp, &Self::to_carla_transform(&transform))
            .map_err(|e| {
                let message = e.to_string();
                if message.contains("collision") {
                    SimulatorError::SpawnCollision {
                        blueprint: blueprint.to_string(),
                        location: transform.location,
                    }
                } else {
                    SimulatorError::vehicle_spawn(blueprint, message)
                }
            })?;

        Vehicle::try_from(actor)
            .map_err(|_| SimulatorError::vehicle_spawn(blueprint, "spawned actor is not a vehicle"))
    }

    fn parent_vehicle(&self, blueprint: &str, parent: Option<ActorId>) -> Result<Option<Vehicle>> {
        let Some(parent_id) = parent else {
            return Ok(None);
        };
        match self.actors.lock().unwrap().get(&parent_id) {
            Some(ActorType::Vehicle(v)) => Ok(Some(v.clone())),
            _ => Err(SimulatorError::sensor_spawn(
                blueprint,
                parent,
                "parent vehicle not found",
            )),
        }
    }

    fn create_sensor(
        world: &mut World,
        blueprint: &str,
        transform: Transform,
        parent: Option<(ActorId, &Vehicle)>,
        attributes: &HashMap<String, String>,
    ) -> Result<Sensor> {
        let parent_id = parent.map(|(id, _)| id);
        let bp_library = world.blueprint_library();
        let mut sensor_bp =
            bp_library
                .find(blueprint)
                .ok_or_else(|| SimulatorError::BlueprintNotFound {
                    blueprint: blueprint.to_string(),
                })?;

        for (key, value) in attributes {
            if !sensor_bp.set_attribute(key, value) {
                warn!(key, value, "failed to set sensor attribute");
            }
        }

        let carla_transform = Self::to_carla_transform(&transform);
        let actor = match parent {
            Some((_, vehicle)) => {
                world.spawn_actor_attached(&sensor_bp, &carla_transform, vehicle, None)
            }
            None => world.spawn_actor(&sensor_bp, &carla_transform),
        }
        .map_err(|e| SimulatorError::sensor_spawn(blueprint, parent_id, e.to_string()))?;

        Sensor::try_from(actor).map_err(|_| {
            SimulatorError::sensor_spawn(blueprint, parent_id, "spawned actor is not a sensor")
        })
    }

    fn destroy_vehicle_actor(vehicle: Vehicle, actor_id: ActorId) {
        if !vehicle.destroy() {
            warn!(actor_id, "destroy vehicle returned false");
        }
    }

    fn destroy_sensor_actor(sensor: Sensor, actor_id: ActorId) {
        if sensor.is_listening() {
            sensor.stop();
        }
        if !sensor.destroy() {
            warn!(actor_id, "destroy sensor returned false");
        }
    }

    fn to_carla_transform(transform: &Transform) -> CarlaTransform {
        CarlaTransform {
            location: Location {
                x: transform.location.x as f32,
                y: transform.location.y as f32,
                z: transform.location.z as f32,
            },
            rotation: Rotation {
                pitch: transform.rotation.pitch as f32,
                yaw: transform.rotation.yaw as f32,
                roll: transform.rotation.roll as f32,
            },
        }
    }

    /// Get underlying CARLA Sensor object
    pub fn get_sensor(&self, actor_id: ActorId) -> Option<Sensor> {
        match self.actors.lock().unwrap().get(&actor_id) {
            Some(ActorType::Sensor(sensor)) => Some(sensor.clone()),
            _ => None,
        }
    }
}

impl SimulatorClient for RealCarlaClient {
    #[instrument(name = "real_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        let target = host.to_string();
        let handshake = tokio::task::spawn_blocking(move || Self::open(target, port, timeout));

        let (client, world) = match tokio::time::timeout(timeout, handshake).await {
            Ok(Ok(Ok(pair))) => pair,
            Ok(Ok(Err(message))) => return Err(SimulatorError::connection(host, port, message)),
            Ok(Err(join_err)) => {
                return Err(SimulatorError::connection(host, port, join_err.to_string()))
            }
            Err(_) => {
                return Err(SimulatorError::connection(
                    host,
                    port,
                    format!("no response within {:.1}s", timeout.as_secs_f64()),
                ))
            }
        };

        info!(map = %world.map().name(), "connected to CARLA server");

        *self.client.lock().unwrap() = Some(client);
        *self.world.lock().unwrap() = Some(world);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.world.lock().unwrap().is_some()
    }

    fn disconnect(&self) {
        let released = self.actors.lock().unwrap().drain().count();
        self.world.lock().unwrap().take();
        if self.client.lock().unwrap().take().is_some() {
            info!(released, "disconnected from CARLA server");
        }
    }

    #[instrument(
        name = "real_carla_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint, role_name = %role_name)
    )]
    async fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
        role_name: &str,
    ) -> Result<ActorId> {
        let vehicle = self
            .with_world_mut(|world| Self::create_vehicle(world, blueprint, transform, role_name))?;
        let actor_id = vehicle.id();

        debug!(actor_id, blueprint, "vehicle spawned");
        self.store_actor(actor_id, ActorType::Vehicle(vehicle));
        Ok(actor_id)
    }

    #[instrument(
        name = "real_carla_spawn_sensor",
        skip(self, transform, attributes),
        fields(blueprint = %blueprint, parent = ?parent)
    )]
    async fn spawn_sensor(
        &self,
        blueprint: &str,
        transform: Transform,
        parent: Option<ActorId>,
        attributes: &HashMap<String, String>,
    ) -> Result<ActorId> {
        let parent_vehicle = self.parent_vehicle(blueprint, parent)?;
        let sensor = self.with_world_mut(|world| {
            let attach = parent.zip(parent_vehicle.as_ref());
            Self::create_sensor(world, blueprint, transform, attach, attributes)
        })?;

        let actor_id = sensor.id();
        debug!(actor_id, blueprint, ?parent, "sensor spawned");
        self.store_actor(actor_id, ActorType::Sensor(sensor));
        Ok(actor_id)
    }

    fn sensor_source(
        &self,
        actor_id: ActorId,
        name: &str,
        kind: SensorKind,
    ) -> Option<Box<dyn SensorSource>> {
        let sensor = self.get_sensor(actor_id)?;
        Some(Box::new(CarlaSensorSource::new(name.to_string(), kind, sensor)))
    }

    #[instrument(name = "real_carla_apply_control", skip(self, control), fields(vehicle_id))]
    async fn apply_control(&self, vehicle_id: ActorId, control: VehicleControl) -> Result<()> {
        let vehicle = match self.actors.lock().unwrap().get(&vehicle_id) {
            Some(ActorType::Vehicle(v)) => v.clone(),
            _ => {
                return Err(SimulatorError::ActorNotFound {
                    actor_id: vehicle_id,
                })
            }
        };
        vehicle.apply_control(&CarlaControl {
            throttle: control.throttle as f32,
            steer: control.steer as f32,
            brake: control.brake as f32,
            hand_brake: control.hand_brake,
            reverse: control.reverse,
            manual_gear_shift: false,
            gear: 0,
        });
        Ok(())
    }

    #[instrument(name = "real_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        let removed = self.actors.lock().unwrap().remove(&actor_id);
        if let Some(actor) = removed {
            match actor {
                ActorType::Vehicle(v) => Self::destroy_vehicle_actor(v, actor_id),
                ActorType::Sensor(s) => Self::destroy_sensor_actor(s, actor_id),
            }
            debug!(actor_id, "actor destroyed");
        }

        // Idempotent: return Ok even if not exists
        Ok(())
    }

    #[instrument(name = "real_carla_actor_exists", skip(self), fields(actor_id))]
    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(self.actors.lock().unwrap().contains_key(&actor_id))
    }

    async fn actor_ids(&self) -> Result<Vec<ActorId>> {
        if !self.is_connected() {
            return Err(SimulatorError::NotConnected);
        }
        let mut ids: Vec<ActorId> = self.actors.lock().unwrap().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    // Real client tests require CARLA server running
    use super::*;

    #[tokio::test]
    #[ignore = "requires CARLA server"]
    async fn test_real_client_connect() {
        let client = RealCarlaClient::new();
        client
            .connect("localhost", 2000, Duration::from_secs(10))
            .await
            .unwrap();
        assert!(client.is_connected());
    }
}
