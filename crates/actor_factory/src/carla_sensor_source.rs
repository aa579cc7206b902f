//! CARLA Sensor SensorSource wrapper
//!
//! Wraps a CARLA native Sensor as a `SensorSource`.
//! Only compiled when `real-carla` feature is enabled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use carla::client::Sensor;
use contracts::{SensorDataCallback, SensorKind, SensorSource};
use tracing::{debug, trace, warn};

use crate::sensor_data_converter::to_raw_frame;

/// CARLA Sensor wrapper
///
/// Lets the sensor bridge treat real and mock sensors uniformly.
pub struct CarlaSensorSource {
    name: String,
    kind: SensorKind,
    sensor: Sensor,
    listening: Arc<AtomicBool>,
}

impl CarlaSensorSource {
    pub fn new(name: String, kind: SensorKind, sensor: Sensor) -> Self {
        Self {
            name,
            kind,
            sensor,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SensorSource for CarlaSensorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn listen(&self, callback: SensorDataCallback) {
        // Idempotent: if already listening, don't register again
        if self.listening.swap(true, Ordering::SeqCst) {
            warn!(sensor = %self.name, "sensor already listening");
            return;
        }

        let name = self.name.clone();
        let kind = self.kind;
        let listening = self.listening.clone();

        debug!(sensor = %name, kind = kind.label(), "starting CARLA sensor");

        self.sensor.listen(move |sensor_data| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            match to_raw_frame(kind, &sensor_data) {
                Some(raw) => {
                    trace!(sensor = %name, frame_id = raw.frame_id, "CARLA sensor data received");
                    callback(raw);
                }
                None => {
                    trace!(sensor = %name, "sensor data did not match sensor kind");
                }
            }
        });
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(sensor = %self.name, "stopping CARLA sensor");
            self.sensor.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}
