//! Prelude - 常用类型的便捷导入
//!
//! ```rust
//! use xarm_sdk::prelude::*;
//! ```

// 客户端层
pub use xarm_client::types::*;
pub use xarm_client::{ArmModel, Position, PositionMove, ServoDefinition, ServoMotor};

// 驱动层
pub use xarm_driver::{Controller, ControllerBuilder, DriverConfig, ServoBus, SharedController};

// 协议层数据类型
pub use xarm_protocol::{Alarm, MotorMode, ServoTarget};

// 传输层 Trait
pub use xarm_transport::Transport;

// 错误类型
pub use xarm_client::ClientError;
pub use xarm_driver::DriverError;
pub use xarm_protocol::ProtocolError;
pub use xarm_transport::TransportError;
