//! Push-to-pull sensor adapter
//!
//! A `SensorBridge` owns exactly one simulator sensor actor. Frames pushed by
//! the simulator's delivery thread are decoded and queued; the control loop
//! pulls them with `get_data()`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use actor_factory::SimulatorClient;
use contracts::{
    ActorId, Frame, RawSensorData, SensorDataCallback, SensorKind, SensorMount, SensorSource,
};
use metrics::{counter, gauge};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::config::{BridgeConfig, IngestionMetrics, MetricsSnapshot};
use crate::decode::decode;
use crate::error::{BridgeError, Result};
use crate::latest::LatestFrames;
use crate::queue::FrameQueue;

/// Bridge lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    /// Constructed, no actor yet
    Idle,
    /// Actor spawned, frames flowing
    Running,
    /// Torn down; terminal
    Destroyed,
}

impl BridgeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Destroyed => "destroyed",
        }
    }
}

/// Sensor bridge
///
/// # Example
///
/// ```ignore
/// let mut camera = SensorBridge::new(client, "rgb_front", SensorKind::rgb_camera(90.0), mount);
/// camera.spawn().await?;
/// while let Some(frame) = camera.get_data() {
///     // ...
/// }
/// camera.destroy().await;
/// ```
pub struct SensorBridge<C: SimulatorClient> {
    name: String,
    kind: SensorKind,
    mount: SensorMount,
    config: BridgeConfig,
    client: Arc<C>,
    queue: FrameQueue,
    latest: Option<LatestFrames>,
    metrics: Arc<IngestionMetrics>,
    running: Arc<AtomicBool>,
    state: BridgeState,
    actor_id: Option<ActorId>,
    source: Option<Box<dyn SensorSource>>,
    consumer: Option<JoinHandle<()>>,
    shutdown: Option<watch::Sender<bool>>,
}

impl<C: SimulatorClient> SensorBridge<C> {
    pub fn new(
        client: Arc<C>,
        name: impl Into<String>,
        kind: SensorKind,
        mount: SensorMount,
    ) -> Self {
        Self::with_config(client, name, kind, mount, BridgeConfig::default())
    }

    pub fn with_config(
        client: Arc<C>,
        name: impl Into<String>,
        kind: SensorKind,
        mount: SensorMount,
        config: BridgeConfig,
    ) -> Self {
        let queue = FrameQueue::bounded(config.capacity, config.drop_policy);
        Self {
            name: name.into(),
            kind,
            mount,
            config,
            client,
            queue,
            latest: None,
            metrics: Arc::new(IngestionMetrics::new()),
            running: Arc::new(AtomicBool::new(false)),
            state: BridgeState::Idle,
            actor_id: None,
            source: None,
            consumer: None,
            shutdown: None,
        }
    }

    /// Also publish every decoded frame into `latest` under this bridge's name
    pub fn with_latest(mut self, latest: LatestFrames) -> Self {
        self.latest = Some(latest);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    pub fn mount(&self) -> SensorMount {
        self.mount
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn actor_id(&self) -> Option<ActorId> {
        self.actor_id
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn has_consumer(&self) -> bool {
        self.consumer.is_some()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Create the sensor actor and start delivering frames.
    ///
    /// Frames arriving before this returns are discarded.
    ///
    /// # Errors
    /// - `InvalidState` when already spawned or destroyed
    /// - `Spawn` when the simulator refuses the actor
    /// - `NoSource` when the client cannot stream the new actor
    #[instrument(
        name = "sensor_bridge_spawn",
        skip(self),
        fields(sensor = %self.name, kind = self.kind.label())
    )]
    pub async fn spawn(&mut self) -> Result<ActorId> {
        if self.state != BridgeState::Idle {
            return Err(BridgeError::InvalidState {
                name: self.name.clone(),
                state: self.state.as_str(),
                operation: "spawn",
            });
        }

        let attributes = self.kind.attributes();
        let actor_id = self
            .client
            .spawn_sensor(
                self.kind.blueprint(),
                self.mount.transform(),
                self.mount.attachment(),
                &attributes,
            )
            .await
            .map_err(|source| BridgeError::Spawn {
                name: self.name.clone(),
                source,
            })?;

        let Some(source) = self.client.sensor_source(actor_id, &self.name, self.kind) else {
            if let Err(e) = self.client.destroy_actor(actor_id).await {
                warn!(actor_id, error = %e, "failed to remove sensor actor without source");
            }
            return Err(BridgeError::NoSource { actor_id });
        };

        self.actor_id = Some(actor_id);
        source.listen(self.decode_callback());
        self.source = Some(source);
        self.start_consumer();

        self.running.store(true, Ordering::Release);
        self.state = BridgeState::Running;
        info!(actor_id, parent = ?self.mount.attachment(), "sensor bridge running");
        Ok(actor_id)
    }

    /// Oldest queued frame, or None when empty. Never blocks.
    pub fn get_data(&self) -> Option<Frame> {
        let frame = self.queue.try_pop();
        if frame.is_some() {
            self.metrics.update_queue_len(self.queue.len());
        }
        frame
    }

    /// Stop delivery, join the consumer and destroy the actor.
    ///
    /// Idempotent; actor-destroy failures are logged, not returned.
    #[instrument(name = "sensor_bridge_destroy", skip(self), fields(sensor = %self.name))]
    pub async fn destroy(&mut self) {
        if self.state == BridgeState::Destroyed {
            return;
        }

        self.running.store(false, Ordering::Release);
        if let Some(source) = self.source.take() {
            source.stop();
        }

        if let Some(shutdown) = self.shutdown.take() {
            // receiver gone means the consumer already exited
            let _ = shutdown.send(true);
        }
        if let Some(consumer) = self.consumer.take() {
            if let Err(e) = consumer.await {
                warn!(error = %e, "bridge consumer ended abnormally");
            }
        }

        if let Some(actor_id) = self.actor_id.take() {
            match self.client.destroy_actor(actor_id).await {
                Ok(()) => debug!(actor_id, "sensor actor destroyed"),
                Err(e) => warn!(actor_id, error = %e, "failed to destroy sensor actor"),
            }
        }

        self.state = BridgeState::Destroyed;
        info!(metrics = ?self.metrics.snapshot(), "sensor bridge destroyed");
    }

    fn decode_callback(&self) -> SensorDataCallback {
        let name = self.name.clone();
        let kind = self.kind;
        let running = self.running.clone();
        let queue = self.queue.clone();
        let latest = self.latest.clone();
        let metrics = self.metrics.clone();

        Arc::new(move |raw: RawSensorData| {
            if !running.load(Ordering::Acquire) {
                return;
            }
            metrics.record_received();

            match decode(kind, &raw) {
                Ok(frame) => {
                    if let Some(latest) = &latest {
                        latest.store(&name, frame.clone());
                    }
                    queue.push(frame, &metrics, &name);
                }
                Err(e) => {
                    metrics.record_decode_error();
                    warn!(sensor = %name, frame_id = raw.frame_id, error = %e, "dropping malformed frame");
                }
            }
        })
    }

    fn start_consumer(&mut self) {
        let (shutdown, mut stop) = watch::channel(false);
        let name = self.name.clone();
        let queue = self.queue.clone();
        let metrics = self.metrics.clone();
        let poll_interval = self.config.poll_interval;

        let consumer = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = stop.changed() => break,
                    _ = ticker.tick() => publish(&name, &queue, &metrics),
                }
            }
            publish(&name, &queue, &metrics);
            debug!(sensor = %name, "bridge consumer stopped");
        });

        self.shutdown = Some(shutdown);
        self.consumer = Some(consumer);
    }
}

impl<C: SimulatorClient> Drop for SensorBridge<C> {
    fn drop(&mut self) {
        if self.state == BridgeState::Running {
            self.running.store(false, Ordering::Release);
            if let Some(source) = self.source.take() {
                source.stop();
            }
            // the consumer exits once `shutdown` drops
            warn!(
                sensor = %self.name,
                actor_id = ?self.actor_id,
                "sensor bridge dropped without destroy, actor left in world"
            );
        }
    }
}

fn publish(name: &str, queue: &FrameQueue, metrics: &IngestionMetrics) {
    metrics.update_queue_len(queue.len());
    let snap = metrics.snapshot();
    let sensor = name.to_string();

    gauge!("sensor_bridge_queue_depth", "sensor" => sensor.clone()).set(snap.queue_len as f64);
    counter!("sensor_bridge_frames_received_total", "sensor" => sensor.clone())
        .absolute(snap.received);
    counter!("sensor_bridge_frames_dropped_total", "sensor" => sensor.clone())
        .absolute(snap.dropped);
    counter!("sensor_bridge_decode_errors_total", "sensor" => sensor)
        .absolute(snap.decode_errors);
}
