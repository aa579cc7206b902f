//! CARLA 传感器数据转换
//!
//! 将 CARLA 原生传感器数据转换为 `RawSensorData`，解码由 sensor bridge 完成。
//! 仅在 `real-carla` feature 启用时编译。

use bytes::Bytes;
use carla::sensor::data::{Image, LidarMeasurement};
use carla::sensor::{SensorData, SensorDataBase};
use contracts::{RawSensorData, SensorKind};

/// 将 POD 切片转换为 bytes::Bytes
///
/// # Safety
/// 调用者必须确保 T 是 POD 类型
#[inline]
unsafe fn pod_slice_to_bytes_unchecked<T>(slice: &[T]) -> Bytes {
    let ptr = slice.as_ptr() as *const u8;
    let len = std::mem::size_of_val(slice);
    Bytes::copy_from_slice(std::slice::from_raw_parts(ptr, len))
}

/// 将 CARLA 传感器数据转换为 RawSensorData
///
/// 如果数据类型与传感器类型不匹配，返回 None。
pub fn to_raw_frame(kind: SensorKind, data: &SensorData) -> Option<RawSensorData> {
    let timestamp = data.timestamp();
    let frame_id = data.frame() as u64;

    if kind.is_camera() {
        let image = Image::try_from(data.clone()).ok()?;
        Some(RawSensorData::image(
            frame_id,
            timestamp,
            image.width() as u32,
            image.height() as u32,
            Bytes::copy_from_slice(image.as_raw_bytes()),
        ))
    } else {
        let lidar = LidarMeasurement::try_from(data.clone()).ok()?;
        // LidarDetection is four packed f32 (x, y, z, intensity)
        let bytes = unsafe { pod_slice_to_bytes_unchecked(lidar.as_slice()) };
        Some(RawSensorData::points(frame_id, timestamp, bytes))
    }
}
