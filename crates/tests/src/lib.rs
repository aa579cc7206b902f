//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置合并与加载
//! - 模拟 e2e 测试（无需 CARLA）：传感器桥、仿真门面、驾驶循环

#[cfg(test)]
mod config_tests {
    use config_loader::{merge, ConfigFormat, ConfigLoader};
    use serde_json::json;

    #[test]
    fn test_merge_example() {
        let mut base = json!({"a": {"x": 1, "y": 2}});
        merge(&mut base, json!({"a": {"y": 3, "z": 4}}));
        assert_eq!(base, json!({"a": {"x": 1, "y": 3, "z": 4}}));
    }

    #[test]
    fn test_yaml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(
            &path,
            "carla:\n  port: 2010\nsensors:\n  lidar:\n    channels: 64\ncustom:\n  tag: night\n",
        )
        .unwrap();

        let layered = ConfigLoader::load_from_path(&path).unwrap();
        let settings = layered.settings();
        assert_eq!(settings.carla.port, 2010);
        assert_eq!(settings.carla.host, "localhost");
        assert_eq!(settings.sensors.lidar.channels, 64);
        assert_eq!(settings.sensors.lidar.range, 50.0);
        assert_eq!(layered.get("custom.tag"), Some(&json!("night")));
        assert!(layered.get("custom.missing").is_none());
    }

    #[test]
    fn test_invalid_override_rejected() {
        let err = ConfigLoader::load_from_str("[sensors.rgb_camera]\nfov = 200.0\n", ConfigFormat::Toml)
            .unwrap_err();
        assert!(err.to_string().to_lowercase().contains("fov"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actor_factory::{synthetic_frame, MockConfig, MockSimulatorClient, Obstacle, SimulatorClient};
    use contracts::{
        DropPolicy, FrameData, Location, Rotation, SensorKind, SensorMount, SpawnPose,
        Transform, VehicleControl,
    };
    use evaluation::{drive, ConstantAgent, DriveOptions, EnvConfig, EvalError};
    use renderer::{Renderer, RendererConfig};
    use sensor_bridge::{BridgeConfig, BridgeState, SensorBridge};
    use simulator::CarlaSimulator;

    fn small_camera() -> SensorKind {
        SensorKind::RgbCamera {
            fov: 90.0,
            width: 64,
            height: 48,
        }
    }

    async fn connected_sim(client: MockSimulatorClient) -> CarlaSimulator<MockSimulatorClient> {
        let mut sim = CarlaSimulator::new(client);
        sim.connect("localhost", 2000).await.unwrap();
        sim
    }

    /// MockSensorSource -> SensorBridge -> get_data, in arrival order
    #[tokio::test]
    async fn test_bridge_fifo_end_to_end() {
        let client = Arc::new(MockSimulatorClient::connected());
        let vehicle = client
            .spawn_vehicle("vehicle.tesla.model3", Transform::default(), "hero")
            .await
            .unwrap();

        let mut bridge = SensorBridge::new(
            client.clone(),
            "front",
            small_camera(),
            SensorMount::new(Location::new(0.0, 0.0, 2.0), Rotation::default(), Some(vehicle)),
        );
        assert!(bridge.get_data().is_none());

        let actor_id = bridge.spawn().await.unwrap();
        let sensor = client.sensor(actor_id).unwrap();
        for id in 1..=4 {
            sensor.emit(synthetic_frame(small_camera(), id, id as f64 * 0.05));
        }

        for expected in 1..=4 {
            let frame = bridge.get_data().unwrap();
            assert_eq!(frame.frame_id, expected);
            match frame.data {
                FrameData::Rgb(ref image) => assert_eq!(image.shape(), &[48, 64, 3]),
                ref other => panic!("unexpected frame data: {:?}", other.shape()),
            }
        }
        assert!(bridge.get_data().is_none());

        bridge.destroy().await;
        bridge.destroy().await;
        assert_eq!(bridge.state(), BridgeState::Destroyed);
        assert!(!bridge.has_consumer());
        assert!(!client.actor_exists(actor_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_overflow_keeps_newest_frames() {
        let client = Arc::new(MockSimulatorClient::connected());
        let mut bridge = SensorBridge::with_config(
            client.clone(),
            "lidar",
            SensorKind::lidar(32, 50.0),
            SensorMount::new(Location::default(), Rotation::default(), None),
            BridgeConfig::new(3, DropPolicy::DropOldest),
        );
        let actor_id = bridge.spawn().await.unwrap();
        let sensor = client.sensor(actor_id).unwrap();
        for id in 1..=8 {
            sensor.emit(synthetic_frame(SensorKind::lidar(32, 50.0), id, 0.0));
        }

        let ids: Vec<u64> = std::iter::from_fn(|| bridge.get_data())
            .map(|f| f.frame_id)
            .collect();
        assert_eq!(ids, vec![6, 7, 8]);
        assert_eq!(bridge.metrics().dropped, 5);
        bridge.destroy().await;
    }

    #[tokio::test]
    async fn test_disconnect_empty_facade() {
        let mut sim = CarlaSimulator::new(MockSimulatorClient::new());
        sim.disconnect().await;
        assert!(sim.vehicle().is_none());
        assert!(sim.sensor_names().is_empty());
        assert!(sim.get_sensor_data().is_empty());
    }

    #[tokio::test]
    async fn test_collision_then_higher_spawn_succeeds() {
        let client = MockSimulatorClient::with_config(MockConfig {
            obstacles: vec![Obstacle::new(Location::new(10.0, 5.0, 0.0), 2.0, 0.5)],
            ..Default::default()
        });
        let mut sim = connected_sim(client).await;

        let blocked = SpawnPose {
            x: 10.0,
            y: 5.0,
            z: 0.2,
            ..Default::default()
        };
        let err = sim.spawn_default_vehicle("tesla.model3", blocked).await.unwrap_err();
        assert!(err.to_string().contains("collision"));
        assert!(sim.vehicle().is_none());

        let higher = SpawnPose {
            z: 0.4,
            ..blocked
        };
        let vehicle = sim.spawn_default_vehicle("tesla.model3", higher).await.unwrap();
        let actor = sim.client().actor(vehicle).unwrap();
        assert!((actor.transform.location.z - 0.6).abs() < 1e-9);

        sim.disconnect().await;
        assert_eq!(sim.client().actor_count(), 0);
    }

    #[tokio::test]
    async fn test_drive_loop_with_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let mut sim = connected_sim(MockSimulatorClient::new()).await;
        sim.spawn_default_vehicle("tesla.model3", SpawnPose::default())
            .await
            .unwrap();
        sim.add_sensor("rgb", small_camera(), Location::new(0.0, 0.0, 2.0), Rotation::default())
            .await
            .unwrap();
        sim.add_lidar("lidar", Location::new(0.0, 0.0, 2.5), Rotation::default(), 32, 50.0)
            .await
            .unwrap();

        // one camera frame, no lidar frames
        assert!(sim.client().sensor_by_name("rgb").unwrap().emit_synthetic());

        let mut renderer = Renderer::new(RendererConfig {
            output_dir: dir.path().to_path_buf(),
            save_video: true,
            fps: 10,
            font_path: None,
        })
        .unwrap();
        let mut agent = ConstantAgent::new(VehicleControl::new(0.4, 0.1, 0.0)).requiring(["rgb"]);
        let options = DriveOptions {
            ticks: 3,
            tick_interval: Duration::from_millis(1),
            camera: "rgb".to_string(),
        };

        let report = drive(&sim, &mut agent, Some(&mut renderer), &options)
            .await
            .unwrap();

        assert_eq!(report.summary.ticks, 3);
        assert_eq!(report.summary.missing.get("lidar"), Some(&3));
        assert_eq!(renderer.frame_count(), 3);
        assert!(!renderer.is_recording());
        assert!(dir.path().join(evaluation::VIDEO_FILENAME).exists());
        let snapshot = report.snapshot.unwrap();
        assert!(snapshot.ends_with("frame_000003.jpg"));
        assert!(snapshot.exists());

        let controls = sim.client().applied_controls();
        assert_eq!(controls.len(), 3);
        assert!(controls.iter().all(|(_, c)| c.throttle == 0.4));

        sim.disconnect().await;
        assert!(sim.get_sensor_data().is_empty());
        assert_eq!(sim.client().actor_count(), 0);
    }

    #[test]
    fn test_env_validation_precedes_simulator() {
        let err = EnvConfig::from_lookup(|_| None).unwrap_err();
        match err {
            EvalError::MissingEnv { names } => assert_eq!(names.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
