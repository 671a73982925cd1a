//! # xArm Driver
//!
//! 请求/应答驱动层：把协议编解码器与传输对象组合成同步控制器。
//!
//! ## 模块
//!
//! - `link`: 通用链路（编码 → 写 → 读 → 解码）
//! - `controller`: xArm 控制板控制器（固定槽协议）
//! - `servo_bus`: LewanSoul 总线舵机控制器
//! - `config`: TOML 配置
//! - `builder`: 按配置组装控制器
//!
//! ## 并发
//!
//! 控制器内部不加锁，同一时间只允许一个请求在途。需要跨线程共享时使用
//! [`SharedController`]（`Arc<parking_lot::Mutex<_>>`）。

pub mod builder;
pub mod config;
pub mod controller;
pub mod error;
pub mod link;
pub mod servo_bus;

pub use builder::{BoxedTransport, ControllerBuilder};
pub use config::{DriverConfig, SerialConfig, TransportKind, UsbConfig};
pub use controller::{Controller, SENTINEL, SharedController};
pub use error::DriverError;
pub use link::Link;
pub use servo_bus::ServoBus;
