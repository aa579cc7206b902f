//! Simulator client error types

use contracts::{ActorId, Location};
use thiserror::Error;

/// Simulator client error
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// Server unreachable or handshake failed
    #[error("failed to connect to CARLA at {host}:{port}: {message}")]
    ConnectionFailed {
        host: String,
        port: u16,
        message: String,
    },

    /// Operation requires a prior successful connect
    #[error("not connected to CARLA server")]
    NotConnected,

    /// Blueprint id missing from the blueprint library
    #[error("blueprint '{blueprint}' not found")]
    BlueprintNotFound { blueprint: String },

    /// Spawn point occupied
    #[error(
        "failed to spawn '{blueprint}': spawn failed because of collision at spawn position \
         ({:.2}, {:.2}, {:.2})",
        location.x, location.y, location.z
    )]
    SpawnCollision {
        blueprint: String,
        location: Location,
    },

    /// Vehicle spawn error
    #[error("failed to spawn vehicle '{blueprint}': {message}")]
    VehicleSpawnFailed { blueprint: String, message: String },

    /// Sensor spawn error
    #[error("failed to spawn sensor '{blueprint}' (parent {parent:?}): {message}")]
    SensorSpawnFailed {
        blueprint: String,
        parent: Option<ActorId>,
        message: String,
    },

    /// Actor id unknown to the client
    #[error("actor {actor_id} not found")]
    ActorNotFound { actor_id: ActorId },

    /// Destroy error
    #[error("failed to destroy actor {actor_id}: {message}")]
    DestroyFailed { actor_id: ActorId, message: String },
}

impl SimulatorError {
    /// Create connection error
    pub fn connection(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    /// Create vehicle spawn error
    pub fn vehicle_spawn(blueprint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::VehicleSpawnFailed {
            blueprint: blueprint.into(),
            message: message.into(),
        }
    }

    /// Create sensor spawn error
    pub fn sensor_spawn(
        blueprint: impl Into<String>,
        parent: Option<ActorId>,
        message: impl Into<String>,
    ) -> Self {
        Self::SensorSpawnFailed {
            blueprint: blueprint.into(),
            parent,
            message: message.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, SimulatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collision_message_names_collision() {
        let err = SimulatorError::SpawnCollision {
            blueprint: "vehicle.tesla.model3".into(),
            location: Location::new(1.0, 2.0, 0.5),
        };
        let text = err.to_string();
        assert!(text.contains("collision"));
        assert!(text.contains("(1.00, 2.00, 0.50)"));
    }

    #[test]
    fn test_connection_message_names_endpoint() {
        let err = SimulatorError::connection("10.0.0.7", 2000, "timed out");
        assert!(err.to_string().contains("10.0.0.7:2000"));
    }
}
