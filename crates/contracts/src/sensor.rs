//! Sensor kinds, mounts, raw simulator frames and decoded frames.

use std::collections::HashMap;

use bytes::Bytes;
use ndarray::{Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::{ActorId, Location, Rotation, Transform};

/// Default camera resolution used when attaching cameras to the ego vehicle
pub const DEFAULT_IMAGE_WIDTH: u32 = 960;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 480;

/// Bytes per camera pixel as delivered by the simulator (BGRA)
pub const CAMERA_BYTES_PER_PIXEL: usize = 4;

/// Bytes per lidar point (x, y, z, intensity: f32 each)
pub const LIDAR_POINT_STRIDE: usize = 16;

/// 传感器类型
///
/// Each variant carries its kind-specific blueprint parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorKind {
    RgbCamera { fov: f64, width: u32, height: u32 },
    Lidar { channels: u32, range: f64 },
    SemanticCamera { fov: f64, width: u32, height: u32 },
    DepthCamera { fov: f64, width: u32, height: u32 },
}

impl SensorKind {
    pub fn rgb_camera(fov: f64) -> Self {
        Self::RgbCamera {
            fov,
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }

    pub fn semantic_camera(fov: f64) -> Self {
        Self::SemanticCamera {
            fov,
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }

    pub fn depth_camera(fov: f64) -> Self {
        Self::DepthCamera {
            fov,
            width: DEFAULT_IMAGE_WIDTH,
            height: DEFAULT_IMAGE_HEIGHT,
        }
    }

    pub fn lidar(channels: u32, range: f64) -> Self {
        Self::Lidar { channels, range }
    }

    /// Simulator blueprint id for this kind
    pub fn blueprint(&self) -> &'static str {
        match self {
            Self::RgbCamera { .. } => "sensor.camera.rgb",
            Self::Lidar { .. } => "sensor.lidar.ray_cast",
            Self::SemanticCamera { .. } => "sensor.camera.semantic_segmentation",
            Self::DepthCamera { .. } => "sensor.camera.depth",
        }
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::RgbCamera { .. } => "rgb_camera",
            Self::Lidar { .. } => "lidar",
            Self::SemanticCamera { .. } => "semantic_camera",
            Self::DepthCamera { .. } => "depth_camera",
        }
    }

    pub fn is_camera(&self) -> bool {
        !matches!(self, Self::Lidar { .. })
    }

    /// Blueprint attributes set before spawning
    pub fn attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();
        match *self {
            Self::RgbCamera { fov, width, height }
            | Self::SemanticCamera { fov, width, height }
            | Self::DepthCamera { fov, width, height } => {
                attrs.insert("fov".to_string(), fov.to_string());
                attrs.insert("image_size_x".to_string(), width.to_string());
                attrs.insert("image_size_y".to_string(), height.to_string());
            }
            Self::Lidar { channels, range } => {
                attrs.insert("channels".to_string(), channels.to_string());
                attrs.insert("range".to_string(), range.to_string());
            }
        }
        attrs
    }
}

/// Where a sensor sits: pose relative to its parent plus the optional parent.
///
/// Built once when the sensor is constructed and never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorMount {
    location: Location,
    rotation: Rotation,
    attachment: Option<ActorId>,
}

impl SensorMount {
    pub fn new(location: Location, rotation: Rotation, attachment: Option<ActorId>) -> Self {
        Self {
            location,
            rotation,
            attachment,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn attachment(&self) -> Option<ActorId> {
        self.attachment
    }

    pub fn transform(&self) -> Transform {
        Transform::new(self.location, self.rotation)
    }
}

/// Raw measurement as handed over by the simulator's delivery thread
#[derive(Debug, Clone)]
pub struct RawSensorData {
    /// Simulator frame number
    pub frame_id: u64,

    /// Simulation timestamp (seconds)
    pub timestamp: f64,

    /// Image width in pixels (0 for non-image sensors)
    pub width: u32,

    /// Image height in pixels (0 for non-image sensors)
    pub height: u32,

    /// Packed raw buffer
    pub data: Bytes,
}

impl RawSensorData {
    pub fn image(frame_id: u64, timestamp: f64, width: u32, height: u32, data: Bytes) -> Self {
        Self {
            frame_id,
            timestamp,
            width,
            height,
            data,
        }
    }

    pub fn points(frame_id: u64, timestamp: f64, data: Bytes) -> Self {
        Self {
            frame_id,
            timestamp,
            width: 0,
            height: 0,
            data,
        }
    }
}

/// Decoded sensor array
#[derive(Debug, Clone, PartialEq)]
pub enum FrameData {
    /// H×W×3, simulator channel order with alpha removed
    Rgb(Array3<u8>),
    /// N×4 (x, y, z, intensity)
    Points(Array2<f32>),
    /// H×W semantic tags
    Semantic(Array2<u8>),
    /// H×W raw depth channel, not linearized
    Depth(Array2<u8>),
}

impl FrameData {
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Rgb(a) => a.shape(),
            Self::Points(a) => a.shape(),
            Self::Semantic(a) | Self::Depth(a) => a.shape(),
        }
    }

    pub fn as_rgb(&self) -> Option<&Array3<u8>> {
        match self {
            Self::Rgb(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&Array2<f32>> {
        match self {
            Self::Points(a) => Some(a),
            _ => None,
        }
    }
}

/// Decoded frame with its simulator stamp
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub frame_id: u64,
    pub timestamp: f64,
    pub data: FrameData,
}

/// 队列满时的丢弃策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// 丢弃最旧的帧
    #[default]
    DropOldest,
    /// 丢弃最新的帧
    DropNewest,
}
