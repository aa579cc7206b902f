//! Simulator façade 错误类型

use actor_factory::SimulatorError;
use contracts::ActorId;
use sensor_bridge::BridgeError;
use thiserror::Error;

/// Simulator façade 错误
#[derive(Debug, Error)]
pub enum FacadeError {
    /// 尚未连接
    #[error("not connected to CARLA server, call connect() first")]
    NotConnected,

    /// 尚未生成车辆
    #[error("no vehicle spawned, call spawn_vehicle() first")]
    NoVehicle,

    /// 已有车辆
    #[error("vehicle {actor_id} already spawned")]
    VehicleExists { actor_id: ActorId },

    #[error(transparent)]
    Simulator(#[from] SimulatorError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, FacadeError>;
