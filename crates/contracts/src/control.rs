//! Vehicle control command produced by the driving agent.

use serde::{Deserialize, Serialize};

/// Control command applied to the ego vehicle each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleControl {
    /// [0, 1]
    pub throttle: f64,
    /// [-1, 1], negative is left
    pub steer: f64,
    /// [0, 1]
    pub brake: f64,
    #[serde(default)]
    pub hand_brake: bool,
    #[serde(default)]
    pub reverse: bool,
}

impl VehicleControl {
    /// Build a command with every axis clamped into its valid range
    pub fn new(throttle: f64, steer: f64, brake: f64) -> Self {
        Self {
            throttle: throttle.clamp(0.0, 1.0),
            steer: steer.clamp(-1.0, 1.0),
            brake: brake.clamp(0.0, 1.0),
            hand_brake: false,
            reverse: false,
        }
    }

    /// Full brake, no throttle
    pub fn stop() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_is_clamped() {
        let c = VehicleControl::new(1.7, -3.0, -0.2);
        assert_eq!(c.throttle, 1.0);
        assert_eq!(c.steer, -1.0);
        assert_eq!(c.brake, 0.0);
    }
}
