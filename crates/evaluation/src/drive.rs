//! Local closed loop: sensors in, agent, control out, optional rendering.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use actor_factory::SimulatorClient;
use observability::{DriveMetricsAggregator, DriveSummary};
use renderer::Renderer;
use simulator::CarlaSimulator;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument};

use crate::agent::DrivingAgent;
use crate::error::Result;

/// Video file written when the renderer records
pub const VIDEO_FILENAME: &str = "drive.gif";

#[derive(Debug, Clone)]
pub struct DriveOptions {
    pub ticks: u64,
    pub tick_interval: Duration,
    /// Sensor whose frames are rendered
    pub camera: String,
}

impl Default for DriveOptions {
    fn default() -> Self {
        Self {
            ticks: 100,
            tick_interval: Duration::from_millis(50),
            camera: "rgb".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DriveReport {
    pub summary: DriveSummary,
    /// Last rendered frame, saved when the loop ends
    pub snapshot: Option<PathBuf>,
}

/// Run `options.ticks` control steps against a spawned vehicle.
///
/// Each tick reads the latest frame of every sensor, asks the agent for a
/// command and applies it. Sensors without data yet are counted as missing.
#[instrument(
    name = "drive_loop",
    skip_all,
    fields(ticks = options.ticks, camera = %options.camera)
)]
pub async fn drive<C, A>(
    sim: &CarlaSimulator<C>,
    agent: &mut A,
    mut renderer: Option<&mut Renderer>,
    options: &DriveOptions,
) -> Result<DriveReport>
where
    C: SimulatorClient,
    A: DrivingAgent,
{
    let mut interval = tokio::time::interval(options.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stats = DriveMetricsAggregator::new();
    let mut last_image = None;
    let mut video_opened = false;
    let started = Instant::now();

    for tick in 0..options.ticks {
        interval.tick().await;
        let step_started = Instant::now();

        let input = sim.get_sensor_data();
        let missing: Vec<&str> = sim
            .sensor_names()
            .into_iter()
            .filter(|name| !input.contains_key(*name))
            .collect();
        for name in &missing {
            observability::record_sensor_missing(name);
        }

        let control = agent.run_step(&input, started.elapsed().as_secs_f64());
        sim.apply_control(control).await?;

        if let (Some(renderer), Some(frame)) = (renderer.as_deref_mut(), input.get(&options.camera))
        {
            if !video_opened {
                let shape = frame.data.shape();
                let (height, width) = (shape[0], shape.get(1).copied().unwrap_or(0));
                renderer.setup_video_writer(width as u32, height as u32, VIDEO_FILENAME)?;
                video_opened = true;
            }
            let lines = vec![
                ("tick".to_string(), tick.to_string()),
                ("frame".to_string(), frame.frame_id.to_string()),
                ("brake".to_string(), format!("{:.2}", control.brake)),
            ];
            let image = renderer.render_frame(
                frame,
                Some((control.steer, control.throttle)),
                Some(lines.as_slice()),
            )?;
            last_image = Some(image);
        }

        let latency_ms = step_started.elapsed().as_secs_f64() * 1000.0;
        observability::record_tick(&control, latency_ms);
        stats.update(&control, latency_ms, &missing);
        debug!(tick, latency_ms, missing = missing.len(), "tick done");
    }

    agent.destroy();

    let snapshot = match (renderer, last_image) {
        (Some(renderer), Some(image)) => {
            let path = renderer.save_frame(&image, None)?;
            renderer.cleanup();
            Some(path)
        }
        (Some(renderer), None) => {
            renderer.cleanup();
            None
        }
        _ => None,
    };

    let summary = stats.summary();
    info!(ticks = summary.ticks, "drive loop finished");
    Ok(DriveReport { summary, snapshot })
}
