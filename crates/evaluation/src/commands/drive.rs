//! `drive` command implementation.

use std::time::Duration;

use actor_factory::{MockSimulatorClient, SimulatorClient};
use anyhow::{Context, Result};
use config_loader::Settings;
use contracts::{SpawnPose, VehicleControl};
use evaluation::{drive, ConstantAgent, DriveOptions};
use renderer::{Renderer, RendererConfig};
use simulator::CarlaSimulator;
use tracing::{info, warn};

use super::{load_settings, shutdown_signal};
use crate::cli::DriveArgs;

const CAMERA: &str = "rgb";
const LIDAR: &str = "lidar";

/// Execute the `drive` command
pub async fn run_drive(args: &DriveArgs) -> Result<()> {
    let layered = load_settings(args.config.as_deref())?;
    let settings = layered.settings().clone();

    if args.mock {
        let mut sim = prepare(MockSimulatorClient::new(), &settings, args).await?;
        for name in [CAMERA, LIDAR] {
            if let Some(sensor) = sim.client().sensor_by_name(name) {
                sensor.start_streaming(args.hz);
            }
        }
        return run_loop(&mut sim, &settings, args).await;
    }

    #[cfg(feature = "real-carla")]
    {
        let mut sim = prepare(actor_factory::RealCarlaClient::new(), &settings, args).await?;
        return run_loop(&mut sim, &settings, args).await;
    }

    #[cfg(not(feature = "real-carla"))]
    {
        anyhow::bail!(
            "built without the `real-carla` feature; pass --mock to drive the in-process simulator"
        )
    }
}

/// Connect, spawn the ego vehicle and attach the configured sensors
async fn prepare<C: SimulatorClient>(
    client: C,
    settings: &Settings,
    args: &DriveArgs,
) -> Result<CarlaSimulator<C>> {
    let carla = &settings.carla;
    let mut sim = CarlaSimulator::new(client).with_timeout(Duration::from_secs_f64(carla.timeout));
    sim.connect(&carla.host, carla.port)
        .await
        .context("Failed to connect to CARLA")?;

    let pose = SpawnPose {
        x: args.x,
        y: args.y,
        z: args.z,
        yaw: args.yaw,
        ..Default::default()
    };
    if let Err(e) = sim.spawn_default_vehicle(&carla.vehicle_type, pose).await {
        sim.disconnect().await;
        return Err(e).context("Failed to spawn vehicle");
    }

    if let Err(e) = attach_sensors(&mut sim, settings).await {
        sim.disconnect().await;
        return Err(e).context("Failed to attach sensors");
    }

    info!(vehicle = ?sim.vehicle(), sensors = ?sim.sensor_names(), "Vehicle ready");
    Ok(sim)
}

async fn attach_sensors<C: SimulatorClient>(
    sim: &mut CarlaSimulator<C>,
    settings: &Settings,
) -> simulator::Result<()> {
    let camera = &settings.sensors.rgb_camera;
    sim.add_rgb_camera(CAMERA, camera.location(), camera.rotation(), camera.fov)
        .await?;

    let lidar = &settings.sensors.lidar;
    sim.add_lidar(
        LIDAR,
        lidar.location(),
        lidar.rotation(),
        lidar.channels,
        lidar.range,
    )
    .await?;
    Ok(())
}

/// Drive, print the summary, and always tear down
async fn run_loop<C: SimulatorClient>(
    sim: &mut CarlaSimulator<C>,
    settings: &Settings,
    args: &DriveArgs,
) -> Result<()> {
    let mut renderer = if settings.visualization.enabled && !args.no_render {
        Some(
            Renderer::new(RendererConfig::from(&settings.visualization))
                .context("Failed to create renderer")?,
        )
    } else {
        None
    };

    let mut agent = ConstantAgent::new(VehicleControl::new(args.throttle, args.steer, 0.0))
        .requiring([CAMERA]);
    let options = DriveOptions {
        ticks: args.ticks,
        tick_interval: Duration::from_secs_f64(1.0 / args.hz.max(0.1)),
        camera: CAMERA.to_string(),
    };

    let result = tokio::select! {
        result = drive(sim, &mut agent, renderer.as_mut(), &options) => Some(result),
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping drive loop");
            None
        }
    };

    if let Some(renderer) = renderer.as_mut() {
        renderer.cleanup();
    }
    sim.disconnect().await;

    match result {
        Some(Ok(report)) => {
            print!("{}", report.summary);
            if let Some(path) = report.snapshot {
                println!("Last frame: {}", path.display());
            }
            Ok(())
        }
        Some(Err(e)) => Err(e).context("Drive loop failed"),
        None => Ok(()),
    }
}
