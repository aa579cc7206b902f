//! Mock sensor implementation
//!
//! Implements `SensorSource`, delivering synthetic or injected raw frames.
//! Used for testing and development without a CARLA environment.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;
use contracts::{
    RawSensorData, SensorDataCallback, SensorKind, SensorSource, CAMERA_BYTES_PER_PIXEL,
    LIDAR_POINT_STRIDE,
};
use tracing::{debug, trace};

/// Points per synthetic lidar sweep
pub const MOCK_LIDAR_POINTS: usize = 1024;

/// Mock sensor
///
/// Cloning yields a handle to the same sensor, so a test can keep one clone
/// to inject frames while the bridge listens through another.
#[derive(Clone)]
pub struct MockSensorSource {
    inner: Arc<Inner>,
}

struct Inner {
    name: String,
    kind: SensorKind,
    listening: AtomicBool,
    callback: Mutex<Option<SensorDataCallback>>,
    next_frame: AtomicU64,
    started: Instant,
}

impl MockSensorSource {
    pub fn new(name: impl Into<String>, kind: SensorKind) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                kind,
                listening: AtomicBool::new(false),
                callback: Mutex::new(None),
                next_frame: AtomicU64::new(1),
                started: Instant::now(),
            }),
        }
    }

    /// Deliver a raw frame to the registered callback.
    ///
    /// Returns false (frame discarded) when nobody is listening.
    pub fn emit(&self, raw: RawSensorData) -> bool {
        if !self.is_listening() {
            return false;
        }
        // Clone out of the lock so the callback never runs under it.
        let callback = self.inner.callback.lock().unwrap().clone();
        match callback {
            Some(callback) => {
                trace!(sensor = %self.inner.name, frame_id = raw.frame_id, "mock frame delivered");
                callback(raw);
                true
            }
            None => false,
        }
    }

    /// Deliver a well-formed synthetic frame with the next frame number
    pub fn emit_synthetic(&self) -> bool {
        let frame_id = self.inner.next_frame.fetch_add(1, Ordering::SeqCst);
        let timestamp = self.inner.started.elapsed().as_secs_f64();
        self.emit(synthetic_frame(self.inner.kind, frame_id, timestamp))
    }

    /// Stream synthetic frames from a background thread until `stop`.
    pub fn start_streaming(&self, frequency_hz: f64) {
        let sensor = self.clone();
        let interval = Duration::from_secs_f64(1.0 / frequency_hz.max(f64::EPSILON));

        thread::spawn(move || {
            debug!(
                sensor = %sensor.inner.name,
                kind = sensor.inner.kind.label(),
                frequency_hz,
                "mock sensor streaming"
            );
            while sensor.is_listening() {
                sensor.emit_synthetic();
                thread::sleep(interval);
            }
            debug!(sensor = %sensor.inner.name, "mock sensor streaming stopped");
        });
    }
}

/// Build a correctly sized raw buffer for `kind`.
///
/// Cameras get a BGRA gradient, lidar gets points on a circle.
pub fn synthetic_frame(kind: SensorKind, frame_id: u64, timestamp: f64) -> RawSensorData {
    match kind {
        SensorKind::RgbCamera { width, height, .. }
        | SensorKind::SemanticCamera { width, height, .. }
        | SensorKind::DepthCamera { width, height, .. } => {
            let pixels = width as usize * height as usize;
            let mut data = Vec::with_capacity(pixels * CAMERA_BYTES_PER_PIXEL);
            for i in 0..pixels {
                let shade = ((i as u64 + frame_id) % 256) as u8;
                data.extend_from_slice(&[shade, shade / 2, 255 - shade, 255]);
            }
            RawSensorData::image(frame_id, timestamp, width, height, Bytes::from(data))
        }
        SensorKind::Lidar { range, .. } => {
            let mut data = Vec::with_capacity(MOCK_LIDAR_POINTS * LIDAR_POINT_STRIDE);
            let radius = (range / 2.0) as f32;
            for i in 0..MOCK_LIDAR_POINTS {
                let angle = i as f32 / MOCK_LIDAR_POINTS as f32 * std::f32::consts::TAU;
                for value in [radius * angle.cos(), radius * angle.sin(), -1.5f32, 0.8f32] {
                    data.extend_from_slice(&value.to_ne_bytes());
                }
            }
            RawSensorData::points(frame_id, timestamp, Bytes::from(data))
        }
    }
}

impl SensorSource for MockSensorSource {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn kind(&self) -> SensorKind {
        self.inner.kind
    }

    fn listen(&self, callback: SensorDataCallback) {
        // Idempotent: if already listening, keep the first callback
        if self.inner.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        *self.inner.callback.lock().unwrap() = Some(callback);
        debug!(sensor = %self.inner.name, "mock sensor listening");
    }

    fn stop(&self) {
        if self.inner.listening.swap(false, Ordering::SeqCst) {
            self.inner.callback.lock().unwrap().take();
            debug!(sensor = %self.inner.name, "mock sensor stopped");
        }
    }

    fn is_listening(&self) -> bool {
        self.inner.listening.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> (Arc<AtomicU64>, SensorDataCallback) {
        let count = Arc::new(AtomicU64::new(0));
        let count_clone = count.clone();
        let callback: SensorDataCallback = Arc::new(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });
        (count, callback)
    }

    #[test]
    fn test_emit_requires_listener() {
        let sensor = MockSensorSource::new("front", SensorKind::rgb_camera(90.0));
        assert!(!sensor.emit_synthetic());

        let (count, callback) = counter();
        sensor.listen(callback);
        assert!(sensor.emit_synthetic());
        sensor.stop();
        assert!(!sensor.emit_synthetic());
        assert_eq!(count.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_idempotent_listen() {
        let sensor = MockSensorSource::new("lidar", SensorKind::lidar(32, 50.0));
        let (first, cb1) = counter();
        let (second, cb2) = counter();

        sensor.listen(cb1);
        sensor.listen(cb2);
        sensor.emit_synthetic();

        assert_eq!(first.load(Ordering::Relaxed), 1);
        assert_eq!(second.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_synthetic_sizes() {
        let camera = synthetic_frame(SensorKind::rgb_camera(90.0), 1, 0.0);
        assert_eq!(camera.data.len(), 960 * 480 * 4);
        assert_eq!((camera.width, camera.height), (960, 480));

        let lidar = synthetic_frame(SensorKind::lidar(32, 50.0), 1, 0.0);
        assert_eq!(lidar.data.len(), MOCK_LIDAR_POINTS * LIDAR_POINT_STRIDE);
        assert_eq!(lidar.width, 0);
    }

    #[test]
    fn test_streaming_stops_with_listener() {
        let sensor = MockSensorSource::new("front", SensorKind::depth_camera(90.0));
        let (count, callback) = counter();
        sensor.listen(callback);
        sensor.start_streaming(200.0);

        thread::sleep(Duration::from_millis(60));
        sensor.stop();
        let after_stop = count.load(Ordering::Relaxed);
        assert!(after_stop > 0);

        thread::sleep(Duration::from_millis(30));
        // at most one frame was in flight when stop landed
        assert!(count.load(Ordering::Relaxed) <= after_stop + 1);
    }
}
