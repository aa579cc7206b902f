//! Poses in simulator coordinates.
//!
//! Location in meters, rotation in degrees (pitch, yaw, roll), matching the
//! simulator's own transform type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same x/y, z raised by `dz`
    pub fn lifted(self, dz: f64) -> Self {
        Self {
            z: self.z + dz,
            ..self
        }
    }

    /// Horizontal (x/y plane) distance to another location
    pub fn planar_distance(&self, other: &Location) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<[f64; 3]> for Location {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl Rotation {
    pub fn new(pitch: f64, yaw: f64, roll: f64) -> Self {
        Self { pitch, yaw, roll }
    }
}

impl From<[f64; 3]> for Rotation {
    fn from([pitch, yaw, roll]: [f64; 3]) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// 位姿
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z) 单位：米
    pub location: Location,

    /// 旋转 (pitch, yaw, roll) 单位：度
    pub rotation: Rotation,
}

impl Transform {
    pub fn new(location: Location, rotation: Rotation) -> Self {
        Self { location, rotation }
    }
}

/// Flat pose description, as written in route/settings files.
///
/// Every field is optional and defaults to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnPose {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub pitch: f64,
    pub yaw: f64,
    pub roll: f64,
}

impl From<SpawnPose> for Transform {
    fn from(pose: SpawnPose) -> Self {
        Transform {
            location: Location::new(pose.x, pose.y, pose.z),
            rotation: Rotation::new(pose.pitch, pose.yaw, pose.roll),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_pose_missing_fields_default_to_zero() {
        let pose: SpawnPose = serde_json::from_str(r#"{ "x": 10.5, "yaw": 90.0 }"#).unwrap();
        let transform = Transform::from(pose);
        assert_eq!(transform.location, Location::new(10.5, 0.0, 0.0));
        assert_eq!(transform.rotation.yaw, 90.0);
        assert_eq!(transform.rotation.pitch, 0.0);
    }

    #[test]
    fn test_lifted_keeps_planar_position() {
        let loc = Location::new(1.0, -2.0, 0.3).lifted(0.2);
        assert_eq!(loc.x, 1.0);
        assert_eq!(loc.y, -2.0);
        assert!((loc.z - 0.5).abs() < 1e-9);
        assert_eq!(loc.planar_distance(&Location::new(1.0, -2.0, 9.0)), 0.0);
    }
}
