//! SensorSource trait - push-based sensor data source abstraction
//!
//! Real simulator sensors and mock sensors both deliver raw measurements
//! through a callback on their own delivery thread.

use std::sync::Arc;

use crate::{RawSensorData, SensorKind};

/// Sensor data callback type
///
/// Invoked on the source's delivery thread, one call per raw measurement,
/// never concurrently for the same sensor.
pub type SensorDataCallback = Arc<dyn Fn(RawSensorData) + Send + Sync>;

/// Sensor data source trait
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn SensorSource> = client.sensor_source(actor_id, name, kind)?;
/// source.listen(Arc::new(|raw| {
///     println!("frame {}", raw.frame_id);
/// }));
/// // ...
/// source.stop();
/// ```
pub trait SensorSource: Send + Sync {
    /// Sensor name (façade key or bridge label)
    fn name(&self) -> &str;

    /// Sensor kind
    fn kind(&self) -> SensorKind;

    /// Register data callback
    ///
    /// Repeated calls while listening are ignored; only the first callback
    /// stays registered.
    fn listen(&self, callback: SensorDataCallback);

    /// Stop delivering data
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
