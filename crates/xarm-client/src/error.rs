//! 客户端错误类型

use crate::types::Deg;
use thiserror::Error;
use xarm_driver::DriverError;

/// 客户端错误类型
#[derive(Debug, Error)]
pub enum ClientError {
    /// 驱动层错误（传输、协议、配置）
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// 舵机定义无效（要求 `min_angle < max_angle` 且均为有限值）
    #[error("Invalid servo definition for servo {servo_id}: [{min_angle}, {max_angle}]")]
    InvalidServoDefinition {
        servo_id: u8,
        min_angle: Deg,
        max_angle: Deg,
    },

    /// 机械臂模型无效（连杆长度必须为非负有限值）
    #[error("Invalid arm model: {0}")]
    InvalidArmModel(String),
}

impl ClientError {
    /// 超时内没有收到应答
    pub fn is_no_response(&self) -> bool {
        matches!(self, ClientError::Driver(e) if e.is_no_response())
    }

    /// 是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Driver(e) => e.is_retryable(),
            _ => false,
        }
    }
}
