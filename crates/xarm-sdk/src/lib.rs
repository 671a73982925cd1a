//! xArm SDK - xArm 机械臂与 LewanSoul 总线舵机 Rust SDK
//!
//! # 架构设计
//!
//! 从底层到高层：
//!
//! - **协议层** (`protocol`): 固定槽协议与总线协议的帧编解码
//! - **传输层** (`transport`): USB / 串口 / Mock 字节传输
//! - **驱动层** (`driver`): 请求/应答控制器、配置与 Builder
//! - **客户端层** (`client`): 角度级舵机、高度表定位
//!
//! # 快速开始
//!
//! ```no_run
//! use xarm_sdk::prelude::*;
//!
//! xarm_sdk::logging::init();
//!
//! let controller = ControllerBuilder::new().build_shared()?;
//! let base = ServoMotor::new(ServoDefinition::new(6, Deg(-90.0), Deg(90.0))?, controller);
//! base.set_position(Deg(30.0), 1000, true)?;
//! # Ok::<(), ClientError>(())
//! ```

pub use xarm_client as client;
pub use xarm_driver as driver;
pub use xarm_protocol as protocol;
pub use xarm_transport as transport;

pub mod logging;
pub mod prelude;

pub use xarm_client::ClientError;
pub use xarm_driver::{Controller, ControllerBuilder, DriverConfig, DriverError, ServoBus, SharedController};
pub use xarm_protocol::ProtocolError;
pub use xarm_transport::{Transport, TransportError};
