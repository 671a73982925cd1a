//! # xArm Transport Layer
//!
//! 字节传输抽象层：控制器只依赖 [`Transport`] trait，不关心底层是 USB 还是串口。
//!
//! ## 后端
//!
//! - `usb`: xArm 控制板（基于 `rusb`，显式持有 `rusb::Context`）
//! - `serial`: 串口（基于 `serialport`）
//! - `mock`: 脚本化应答 + 写入记录，用于测试
//!
//! ## 超时语义
//!
//! 读操作在超时时间内没有收到任何字节时返回 `Ok(0)`，而不是错误。
//! 是否把"无应答"视为错误由上层决定。

use thiserror::Error;

#[cfg(feature = "usb")]
pub mod usb;

#[cfg(feature = "usb")]
pub use usb::{UsbTransport, UsbTransportConfig};

#[cfg(feature = "serial")]
pub mod serial;

#[cfg(feature = "serial")]
pub use serial::SerialTransport;

#[cfg(feature = "mock")]
pub mod mock;

#[cfg(feature = "mock")]
pub use mock::MockTransport;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device Error: {0}")]
    Device(#[from] TransportDeviceError),
    #[error("Transport not open")]
    NotOpen,
    #[error("Payload too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },
}

impl TransportError {
    /// 是否为不可恢复错误（设备拔出、无权限等）
    pub fn is_fatal(&self) -> bool {
        match self {
            TransportError::Device(e) => e.is_fatal(),
            _ => false,
        }
    }
}

/// 设备/后端错误的结构化分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportDeviceErrorKind {
    Unknown,
    NotFound,
    NoDevice,
    AccessDenied,
    Busy,
    InvalidEndpoint,
    Backend,
}

/// 结构化设备错误
#[derive(Error, Debug, Clone)]
#[error("{kind:?}: {message}")]
pub struct TransportDeviceError {
    pub kind: TransportDeviceErrorKind,
    pub message: String,
}

impl TransportDeviceError {
    pub fn new(kind: TransportDeviceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            TransportDeviceErrorKind::NoDevice
                | TransportDeviceErrorKind::AccessDenied
                | TransportDeviceErrorKind::NotFound
        )
    }
}

impl From<String> for TransportDeviceError {
    fn from(message: String) -> Self {
        Self::new(TransportDeviceErrorKind::Unknown, message)
    }
}

impl From<&str> for TransportDeviceError {
    fn from(message: &str) -> Self {
        Self::new(TransportDeviceErrorKind::Unknown, message)
    }
}

/// 点对点字节传输
///
/// 一个传输对象同一时间只服务一个请求；调用方负责串行化访问。
pub trait Transport {
    /// 打开设备并占用它
    fn open(&mut self) -> Result<(), TransportError>;

    /// 释放设备（幂等：未打开时直接返回 `Ok`）
    fn close(&mut self) -> Result<(), TransportError>;

    /// 写入完整的一帧
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// 读取到 `buffer`，返回实际读到的字节数（超时返回 0）
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError>;

    fn is_open(&self) -> bool;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read(buffer)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn open(&mut self) -> Result<(), TransportError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(bytes)
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read(buffer)
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }
}
