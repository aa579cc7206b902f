//! Raw simulator buffers to typed arrays.
//!
//! | kind     | raw layout           | decoded  |
//! |----------|----------------------|----------|
//! | rgb      | BGRA bytes           | H×W×3    |
//! | lidar    | f32 x, y, z, i       | N×4      |
//! | semantic | BGRA bytes, tag in B | H×W      |
//! | depth    | BGRA bytes           | H×W (B)  |

use contracts::{
    Frame, FrameData, RawSensorData, SensorKind, CAMERA_BYTES_PER_PIXEL, LIDAR_POINT_STRIDE,
};
use ndarray::{s, Array2, ArrayView3};

use crate::error::{BridgeError, Result};

/// Decode one raw measurement according to the sensor kind.
pub fn decode(kind: SensorKind, raw: &RawSensorData) -> Result<Frame> {
    let data = match kind {
        SensorKind::RgbCamera { .. } => {
            let pixels = image_view(kind, raw)?;
            FrameData::Rgb(pixels.slice(s![.., .., ..3]).to_owned())
        }
        SensorKind::SemanticCamera { .. } => {
            let pixels = image_view(kind, raw)?;
            FrameData::Semantic(pixels.slice(s![.., .., 0]).to_owned())
        }
        SensorKind::DepthCamera { .. } => {
            let pixels = image_view(kind, raw)?;
            FrameData::Depth(pixels.slice(s![.., .., 0]).to_owned())
        }
        SensorKind::Lidar { .. } => FrameData::Points(decode_points(raw)?),
    };

    Ok(Frame {
        frame_id: raw.frame_id,
        timestamp: raw.timestamp,
        data,
    })
}

fn image_view(kind: SensorKind, raw: &RawSensorData) -> Result<ArrayView3<'_, u8>> {
    let (width, height) = (raw.width as usize, raw.height as usize);
    if width == 0 || height == 0 {
        return Err(BridgeError::decode(kind.label(), "image has no pixels"));
    }
    let expected = width * height * CAMERA_BYTES_PER_PIXEL;
    if raw.data.len() != expected {
        return Err(BridgeError::decode(
            kind.label(),
            format!(
                "buffer is {} bytes, expected {expected} for {width}x{height}",
                raw.data.len()
            ),
        ));
    }

    ArrayView3::from_shape((height, width, CAMERA_BYTES_PER_PIXEL), &raw.data[..])
        .map_err(|e| BridgeError::decode(kind.label(), e.to_string()))
}

fn decode_points(raw: &RawSensorData) -> Result<Array2<f32>> {
    if raw.data.len() % LIDAR_POINT_STRIDE != 0 {
        return Err(BridgeError::decode(
            "lidar",
            format!(
                "buffer is {} bytes, not a multiple of {LIDAR_POINT_STRIDE}",
                raw.data.len()
            ),
        ));
    }

    // Bytes carries no alignment guarantee for f32, so copy out.
    let values: Vec<f32> = bytemuck::pod_collect_to_vec(&raw.data[..]);
    let n = values.len() / 4;
    Array2::from_shape_vec((n, 4), values).map_err(|e| BridgeError::decode("lidar", e.to_string()))
}
