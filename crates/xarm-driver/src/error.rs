//! 驱动层错误类型定义

use xarm_protocol::ProtocolError;
use xarm_transport::TransportError;
use thiserror::Error;

/// 驱动层错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 传输层错误
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// 协议编解码错误（含参数越界、无应答、应答校验失败）
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(String),

    /// 无效输入（如空的舵机列表）
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DriverError {
    /// 超时内没有收到任何应答
    pub fn is_no_response(&self) -> bool {
        matches!(self, DriverError::Protocol(ProtocolError::NoResponse))
    }

    /// 重发同一请求是否有意义
    ///
    /// 无应答和应答校验失败可以重试；参数越界、配置错误和设备级致命错误不行。
    pub fn is_retryable(&self) -> bool {
        match self {
            DriverError::Protocol(e) => {
                matches!(e, ProtocolError::NoResponse) || e.is_validation_failure()
            },
            DriverError::Transport(e) => !e.is_fatal(),
            DriverError::Config(_) | DriverError::InvalidInput(_) => false,
        }
    }
}
