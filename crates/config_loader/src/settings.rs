//! Typed harness settings and their built-in defaults.

use std::path::PathBuf;

use contracts::{Location, Rotation, SensorKind};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Complete harness settings
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub carla: CarlaSettings,

    #[validate(nested)]
    pub sensors: SensorSettings,

    #[validate(nested)]
    pub model: ModelSettings,

    #[validate(nested)]
    pub visualization: VisualizationSettings,
}

/// Simulator connection and ego vehicle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CarlaSettings {
    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// Connection timeout in seconds
    #[validate(range(exclusive_min = 0.0))]
    pub timeout: f64,

    /// Vehicle blueprint name without the `vehicle.` prefix
    #[validate(length(min = 1))]
    pub vehicle_type: String,
}

impl Default for CarlaSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2000,
            timeout: 10.0,
            vehicle_type: "tesla.model3".to_string(),
        }
    }
}

impl CarlaSettings {
    /// Full blueprint id, e.g. `vehicle.tesla.model3`
    pub fn vehicle_blueprint(&self) -> String {
        if self.vehicle_type.starts_with("vehicle.") {
            self.vehicle_type.clone()
        } else {
            format!("vehicle.{}", self.vehicle_type)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct SensorSettings {
    #[validate(nested)]
    pub rgb_camera: CameraSettings,

    #[validate(nested)]
    pub lidar: LidarSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CameraSettings {
    pub location: [f64; 3],
    pub rotation: [f64; 3],

    #[validate(range(exclusive_min = 0.0, exclusive_max = 180.0))]
    pub fov: f64,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            location: [0.0, 0.0, 2.0],
            rotation: [0.0, 0.0, 0.0],
            fov: 90.0,
        }
    }
}

impl CameraSettings {
    pub fn location(&self) -> Location {
        self.location.into()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation.into()
    }

    pub fn kind(&self) -> SensorKind {
        SensorKind::rgb_camera(self.fov)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct LidarSettings {
    pub location: [f64; 3],
    pub rotation: [f64; 3],

    #[validate(range(min = 1))]
    pub channels: u32,

    /// Maximum range in meters
    #[validate(range(exclusive_min = 0.0))]
    pub range: f64,
}

impl Default for LidarSettings {
    fn default() -> Self {
        Self {
            location: [0.0, 0.0, 2.5],
            rotation: [0.0, 0.0, 0.0],
            channels: 32,
            range: 50.0,
        }
    }
}

impl LidarSettings {
    pub fn location(&self) -> Location {
        self.location.into()
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation.into()
    }

    pub fn kind(&self) -> SensorKind {
        SensorKind::lidar(self.channels, self.range)
    }
}

/// Driving-policy model parameters, passed through to the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ModelSettings {
    #[serde(rename = "type")]
    pub model_type: String,

    pub weights_path: PathBuf,

    pub input_size: [u32; 2],

    #[validate(range(min = 1))]
    pub batch_size: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_type: "transfuser".to_string(),
            weights_path: PathBuf::from("model_ckpt/model.ckpt"),
            input_size: [224, 224],
            batch_size: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct VisualizationSettings {
    pub enabled: bool,
    pub save_video: bool,
    pub output_dir: PathBuf,

    /// Video frame rate
    #[serde(default = "default_fps")]
    #[validate(range(min = 1))]
    pub fps: u32,

    /// TrueType font for debug text overlays; text is skipped without one
    #[serde(default)]
    pub font_path: Option<PathBuf>,
}

fn default_fps() -> u32 {
    30
}

impl Default for VisualizationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            save_video: false,
            output_dir: PathBuf::from("results"),
            fps: default_fps(),
            font_path: None,
        }
    }
}
