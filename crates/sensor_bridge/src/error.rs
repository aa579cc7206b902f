//! Sensor bridge 错误类型

use actor_factory::SimulatorError;
use contracts::ActorId;
use thiserror::Error;

/// Sensor bridge 错误
#[derive(Debug, Error)]
pub enum BridgeError {
    /// 原始数据与传感器类型不符
    #[error("failed to decode {kind} frame: {message}")]
    Decode {
        /// 传感器类型标签
        kind: &'static str,
        /// 错误消息
        message: String,
    },

    /// 传感器 actor 创建失败
    #[error("failed to construct sensor '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: SimulatorError,
    },

    /// 客户端无法为该 actor 提供数据源
    #[error("no data source for sensor actor {actor_id}")]
    NoSource { actor_id: ActorId },

    /// 生命周期状态不允许该操作
    #[error("sensor '{name}' is {state}, cannot {operation}")]
    InvalidState {
        name: String,
        state: &'static str,
        operation: &'static str,
    },
}

impl BridgeError {
    pub fn decode(kind: &'static str, message: impl Into<String>) -> Self {
        Self::Decode {
            kind,
            message: message.into(),
        }
    }
}

/// Sensor bridge Result 类型别名
pub type Result<T> = std::result::Result<T, BridgeError>;
