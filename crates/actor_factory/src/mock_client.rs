//! Mock CARLA 客户端
//!
//! 用于单元测试的 mock 实现，支持注入失败场景。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use contracts::{ActorId, Location, SensorKind, SensorSource, Transform, VehicleControl};
use tracing::{debug, instrument};

use crate::client::SimulatorClient;
use crate::error::{Result, SimulatorError};
use crate::mock_sensor::MockSensorSource;

/// Blueprints the mock world knows about
pub const MOCK_BLUEPRINTS: &[&str] = &[
    "vehicle.tesla.model3",
    "vehicle.lincoln.mkz_2017",
    "vehicle.audi.tt",
    "sensor.camera.rgb",
    "sensor.camera.semantic_segmentation",
    "sensor.camera.depth",
    "sensor.lidar.ray_cast",
];

/// Vehicles closer than this (planar and vertical) overlap
const VEHICLE_CLEARANCE: f64 = 2.0;

/// Static world geometry a spawn can collide with
///
/// A pose is blocked when it lies within `radius` of `center` in the x/y plane
/// and below `top_z`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Location,
    pub radius: f64,
    pub top_z: f64,
}

impl Obstacle {
    pub fn new(center: Location, radius: f64, top_z: f64) -> Self {
        Self {
            center,
            radius,
            top_z,
        }
    }

    fn blocks(&self, location: &Location) -> bool {
        location.planar_distance(&self.center) <= self.radius && location.z < self.top_z
    }
}

/// Mock 客户端配置
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// 连接失败
    pub unreachable: bool,
    /// 额外的 blueprint（在 `MOCK_BLUEPRINTS` 之外）
    pub extra_blueprints: Vec<String>,
    /// 场景中的静态障碍物
    pub obstacles: Vec<Obstacle>,
    /// 应该失败的 sensor blueprints
    pub fail_sensors: Vec<String>,
    /// 应该失败的 destroy actor IDs
    pub fail_destroy: Vec<ActorId>,
}

/// Actor record kept by the mock world
#[derive(Debug, Clone)]
pub struct MockActor {
    pub blueprint: String,
    pub transform: Transform,
    pub parent: Option<ActorId>,
    pub role_name: Option<String>,
    pub attributes: HashMap<String, String>,
}

impl MockActor {
    pub fn is_vehicle(&self) -> bool {
        self.blueprint.starts_with("vehicle.")
    }
}

/// Mock CARLA 客户端
pub struct MockSimulatorClient {
    /// 配置（可注入失败场景）
    config: MockConfig,
    /// Actor ID 计数器
    next_actor_id: AtomicU32,
    /// 已创建的 actors
    actors: Mutex<HashMap<ActorId, MockActor>>,
    /// 已创建的 sensor sources
    sensors: Mutex<HashMap<ActorId, MockSensorSource>>,
    /// 已应用的控制指令
    controls: Mutex<Vec<(ActorId, VehicleControl)>>,
    /// destroy 调用记录
    destroyed: Mutex<Vec<ActorId>>,
    /// 连接状态
    connected: AtomicBool,
}

impl MockSimulatorClient {
    /// 创建默认 mock 客户端
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock 客户端
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            next_actor_id: AtomicU32::new(1000), // 从 1000 开始，便于识别
            actors: Mutex::new(HashMap::new()),
            sensors: Mutex::new(HashMap::new()),
            controls: Mutex::new(Vec::new()),
            destroyed: Mutex::new(Vec::new()),
            connected: AtomicBool::new(false),
        }
    }

    /// Client that is already connected
    pub fn connected() -> Self {
        let client = Self::new();
        client.connected.store(true, Ordering::SeqCst);
        client
    }

    /// 获取当前已创建的 actor 数量
    pub fn actor_count(&self) -> usize {
        self.actors.lock().unwrap().len()
    }

    /// Snapshot of one actor record
    pub fn actor(&self, actor_id: ActorId) -> Option<MockActor> {
        self.actors.lock().unwrap().get(&actor_id).cloned()
    }

    /// Sensor source handed out for `actor_id`, for injecting frames
    pub fn sensor(&self, actor_id: ActorId) -> Option<MockSensorSource> {
        self.sensors.lock().unwrap().get(&actor_id).cloned()
    }

    /// Sensor source by its name
    pub fn sensor_by_name(&self, name: &str) -> Option<MockSensorSource> {
        self.sensors
            .lock()
            .unwrap()
            .values()
            .find(|s| s.name() == name)
            .cloned()
    }

    /// Control commands applied so far
    pub fn applied_controls(&self) -> Vec<(ActorId, VehicleControl)> {
        self.controls.lock().unwrap().clone()
    }

    /// Every destroy call that removed an actor, in order
    pub fn destroyed_actors(&self) -> Vec<ActorId> {
        self.destroyed.lock().unwrap().clone()
    }

    fn allocate_actor_id(&self) -> ActorId {
        self.next_actor_id.fetch_add(1, Ordering::SeqCst)
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(SimulatorError::NotConnected)
        }
    }

    fn knows_blueprint(&self, blueprint: &str) -> bool {
        MOCK_BLUEPRINTS.contains(&blueprint)
            || self.config.extra_blueprints.iter().any(|b| b == blueprint)
    }

    fn is_occupied(&self, actors: &HashMap<ActorId, MockActor>, location: &Location) -> bool {
        if self.config.obstacles.iter().any(|o| o.blocks(location)) {
            return true;
        }
        actors.values().filter(|a| a.is_vehicle()).any(|a| {
            let other = a.transform.location;
            other.planar_distance(location) < VEHICLE_CLEARANCE
                && (other.z - location.z).abs() < VEHICLE_CLEARANCE
        })
    }
}

impl Default for MockSimulatorClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatorClient for MockSimulatorClient {
    #[instrument(name = "mock_carla_connect", skip(self), fields(host = %host, port))]
    async fn connect(&self, host: &str, port: u16, timeout: Duration) -> Result<()> {
        if self.config.unreachable {
            return Err(SimulatorError::connection(
                host,
                port,
                format!("no response within {:.1}s", timeout.as_secs_f64()),
            ));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!("mock client disconnected");
        }
    }

    #[instrument(
        name = "mock_carla_spawn_vehicle",
        skip(self, transform),
        fields(blueprint = %blueprint, z = transform.location.z)
    )]
    async fn spawn_vehicle(
        &self,
        blueprint: &str,
        transform: Transform,
        role_name: &str,
    ) -> Result<ActorId> {
        self.ensure_connected()?;

        if !blueprint.starts_with("vehicle.") || !self.knows_blueprint(blueprint) {
            return Err(SimulatorError::BlueprintNotFound {
                blueprint: blueprint.to_string(),
            });
        }

        let mut actors = self.actors.lock().unwrap();
        if self.is_occupied(&actors, &transform.location) {
            return Err(SimulatorError::SpawnCollision {
                blueprint: blueprint.to_string(),
                location: transform.location,
            });
        }

        let actor_id = self.allocate_actor_id();
        actors.insert(
            actor_id,
            MockActor {
                blueprint: blueprint.to_string(),
                transform,
                parent: None,
                role_name: Some(role_name.to_string()),
                attributes: HashMap::new(),
            },
        );
        debug!(actor_id, "mock vehicle spawned");
        Ok(actor_id)
    }

    #[instrument(
        name = "mock_carla_spawn_sensor",
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
        self.ensure_connected()?;

        if !blueprint.starts_with("sensor.") || !self.knows_blueprint(blueprint) {
            return Err(SimulatorError::BlueprintNotFound {
                blueprint: blueprint.to_string(),
            });
        }

        let mut actors = self.actors.lock().unwrap();

        // 验证 parent 存在
        if let Some(parent_id) = parent {
            if !actors.contains_key(&parent_id) {
                return Err(SimulatorError::sensor_spawn(
                    blueprint,
                    parent,
                    "parent actor not found",
                ));
            }
        }

        if self.config.fail_sensors.iter().any(|b| b == blueprint) {
            return Err(SimulatorError::sensor_spawn(blueprint, parent, "mock failure"));
        }

        let actor_id = self.allocate_actor_id();
        actors.insert(
            actor_id,
            MockActor {
                blueprint: blueprint.to_string(),
                transform,
                parent,
                role_name: None,
                attributes: attributes.clone(),
            },
        );
        debug!(actor_id, "mock sensor spawned");
        Ok(actor_id)
    }

    fn sensor_source(
        &self,
        actor_id: ActorId,
        name: &str,
        kind: SensorKind,
    ) -> Option<Box<dyn SensorSource>> {
        let is_sensor = self
            .actors
            .lock()
            .unwrap()
            .get(&actor_id)
            .is_some_and(|a| !a.is_vehicle());
        if !is_sensor {
            return None;
        }

        let source = self
            .sensors
            .lock()
            .unwrap()
            .entry(actor_id)
            .or_insert_with(|| MockSensorSource::new(name, kind))
            .clone();
        Some(Box::new(source))
    }

    #[instrument(name = "mock_carla_apply_control", skip(self, control), fields(vehicle_id))]
    async fn apply_control(&self, vehicle_id: ActorId, control: VehicleControl) -> Result<()> {
        self.ensure_connected()?;
        let is_vehicle = self
            .actors
            .lock()
            .unwrap()
            .get(&vehicle_id)
            .is_some_and(MockActor::is_vehicle);
        if !is_vehicle {
            return Err(SimulatorError::ActorNotFound {
                actor_id: vehicle_id,
            });
        }
        self.controls.lock().unwrap().push((vehicle_id, control));
        Ok(())
    }

    #[instrument(name = "mock_carla_destroy_actor", skip(self), fields(actor_id))]
    async fn destroy_actor(&self, actor_id: ActorId) -> Result<()> {
        if self.config.fail_destroy.contains(&actor_id) {
            return Err(SimulatorError::DestroyFailed {
                actor_id,
                message: "mock failure".into(),
            });
        }

        if let Some(sensor) = self.sensors.lock().unwrap().remove(&actor_id) {
            sensor.stop();
        }

        // 幂等：即使不存在也返回 Ok
        if self.actors.lock().unwrap().remove(&actor_id).is_some() {
            self.destroyed.lock().unwrap().push(actor_id);
        }
        Ok(())
    }

    #[instrument(name = "mock_carla_actor_exists", skip(self), fields(actor_id))]
    async fn actor_exists(&self, actor_id: ActorId) -> Result<bool> {
        Ok(self.actors.lock().unwrap().contains_key(&actor_id))
    }

    async fn actor_ids(&self) -> Result<Vec<ActorId>> {
        self.ensure_connected()?;
        let mut ids: Vec<ActorId> = self.actors.lock().unwrap().keys().copied().collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Rotation;

    fn at(x: f64, y: f64, z: f64) -> Transform {
        Transform::new(Location::new(x, y, z), Rotation::default())
    }

    async fn connected_with(config: MockConfig) -> MockSimulatorClient {
        let client = MockSimulatorClient::with_config(config);
        client
            .connect("localhost", 2000, Duration::from_secs(1))
            .await
            .unwrap();
        client
    }

    #[tokio::test]
    async fn test_mock_spawn_vehicle() {
        let client = connected_with(MockConfig::default()).await;

        let actor_id = client
            .spawn_vehicle("vehicle.tesla.model3", at(0.0, 0.0, 0.5), "hero")
            .await
            .unwrap();
        assert!(actor_id >= 1000);
        assert_eq!(client.actor_count(), 1);
        assert_eq!(
            client.actor(actor_id).unwrap().role_name.as_deref(),
            Some("hero")
        );
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let client = MockSimulatorClient::with_config(MockConfig {
            unreachable: true,
            ..Default::default()
        });
        let err = client
            .connect("10.1.1.1", 2010, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::ConnectionFailed { port: 2010, .. }));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_drops_connection() {
        let client = connected_with(MockConfig::default()).await;
        client
            .spawn_vehicle("vehicle.tesla.model3", at(0.0, 0.0, 0.5), "hero")
            .await
            .unwrap();

        client.disconnect();
        client.disconnect();
        assert!(!client.is_connected());
        assert!(matches!(client.actor_ids().await, Err(SimulatorError::NotConnected)));
        let err = client
            .spawn_vehicle("vehicle.tesla.model3", at(10.0, 0.0, 0.5), "hero")
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::NotConnected));

        client.connect("localhost", 2000, Duration::from_secs(1)).await.unwrap();
        assert_eq!(client.actor_ids().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_requires_connection() {
        let client = MockSimulatorClient::new();
        let err = client
            .spawn_vehicle("vehicle.tesla.model3", at(0.0, 0.0, 0.5), "hero")
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::NotConnected));
    }

    #[tokio::test]
    async fn test_unknown_blueprint() {
        let client = connected_with(MockConfig::default()).await;
        let err = client
            .spawn_vehicle("vehicle.flying.car", at(0.0, 0.0, 0.5), "hero")
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::BlueprintNotFound { .. }));
    }

    #[tokio::test]
    async fn test_obstacle_collision() {
        let client = connected_with(MockConfig {
            obstacles: vec![Obstacle::new(Location::new(10.0, 0.0, 0.0), 1.5, 0.5)],
            ..Default::default()
        })
        .await;

        let err = client
            .spawn_vehicle("vehicle.tesla.model3", at(10.0, 0.5, 0.4), "hero")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("collision"));

        // above the obstacle top
        client
            .spawn_vehicle("vehicle.tesla.model3", at(10.0, 0.5, 0.6), "hero")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_vehicles_collide_with_each_other() {
        let client = connected_with(MockConfig::default()).await;
        client
            .spawn_vehicle("vehicle.audi.tt", at(0.0, 0.0, 0.5), "a")
            .await
            .unwrap();
        let err = client
            .spawn_vehicle("vehicle.audi.tt", at(1.0, 0.0, 0.5), "b")
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::SpawnCollision { .. }));
    }

    #[tokio::test]
    async fn test_mock_spawn_sensor() {
        let client = connected_with(MockConfig::default()).await;

        let vehicle_id = client
            .spawn_vehicle("vehicle.tesla.model3", at(0.0, 0.0, 0.5), "hero")
            .await
            .unwrap();
        let attrs = SensorKind::rgb_camera(90.0).attributes();
        let sensor_id = client
            .spawn_sensor("sensor.camera.rgb", at(0.0, 0.0, 2.0), Some(vehicle_id), &attrs)
            .await
            .unwrap();

        assert!(sensor_id > vehicle_id);
        assert_eq!(client.actor_count(), 2);
        assert_eq!(client.actor(sensor_id).unwrap().parent, Some(vehicle_id));
        assert!(client
            .sensor_source(sensor_id, "rgb_front", SensorKind::rgb_camera(90.0))
            .is_some());
        assert!(client.sensor_by_name("rgb_front").is_some());
        // vehicles are not sensors
        assert!(client
            .sensor_source(vehicle_id, "x", SensorKind::rgb_camera(90.0))
            .is_none());
    }

    #[tokio::test]
    async fn test_sensor_missing_parent() {
        let client = connected_with(MockConfig::default()).await;
        let err = client
            .spawn_sensor("sensor.lidar.ray_cast", at(0.0, 0.0, 2.5), Some(42), &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::SensorSpawnFailed { parent: Some(42), .. }));
    }

    #[tokio::test]
    async fn test_apply_control_recorded() {
        let client = connected_with(MockConfig::default()).await;
        let vehicle_id = client
            .spawn_vehicle("vehicle.tesla.model3", at(0.0, 0.0, 0.5), "hero")
            .await
            .unwrap();
        client
            .apply_control(vehicle_id, VehicleControl::new(0.5, 0.1, 0.0))
            .await
            .unwrap();
        assert_eq!(client.applied_controls().len(), 1);

        let err = client
            .apply_control(9999, VehicleControl::stop())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulatorError::ActorNotFound { actor_id: 9999 }));
    }

    #[tokio::test]
    async fn test_mock_destroy_idempotent() {
        let client = connected_with(MockConfig::default()).await;

        let actor_id = client
            .spawn_vehicle("vehicle.tesla.model3", at(0.0, 0.0, 0.5), "hero")
            .await
            .unwrap();
        client.destroy_actor(actor_id).await.unwrap();
        // Second destroy should also succeed
        client.destroy_actor(actor_id).await.unwrap();
        assert_eq!(client.actor_count(), 0);
        assert_eq!(client.destroyed_actors(), vec![actor_id]);
    }
}
