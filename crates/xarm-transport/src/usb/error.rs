//! USB 错误类型
//!
//! 定义 USB 设备操作中的错误类型，以及到 [`TransportError`] 的结构化映射

use crate::{TransportDeviceError, TransportDeviceErrorKind, TransportError};
use thiserror::Error;

/// USB 错误类型
#[derive(Error, Debug)]
pub enum UsbError {
    /// USB 错误（来自 rusb）
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// 设备未找到
    #[error("Device {vendor_id:04X}:{product_id:04X} not found")]
    DeviceNotFound { vendor_id: u16, product_id: u16 },

    /// 接口上没有可用的 IN/OUT 端点
    #[error("No usable IN/OUT endpoints on interface {interface}")]
    NoEndpoints { interface: u8 },

    /// 传输失败
    #[error("Transfer on endpoint 0x{endpoint:02X} failed: {source}")]
    Transfer { endpoint: u8, source: rusb::Error },
}

impl UsbError {
    /// 检查是否为超时错误
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            UsbError::Usb(rusb::Error::Timeout)
                | UsbError::Transfer {
                    source: rusb::Error::Timeout,
                    ..
                }
        )
    }

    fn kind(&self) -> TransportDeviceErrorKind {
        let source = match self {
            UsbError::DeviceNotFound { .. } => return TransportDeviceErrorKind::NotFound,
            UsbError::NoEndpoints { .. } => return TransportDeviceErrorKind::InvalidEndpoint,
            UsbError::Usb(e) | UsbError::Transfer { source: e, .. } => e,
        };
        match source {
            rusb::Error::NotFound => TransportDeviceErrorKind::NotFound,
            rusb::Error::NoDevice => TransportDeviceErrorKind::NoDevice,
            rusb::Error::Access => TransportDeviceErrorKind::AccessDenied,
            rusb::Error::Busy => TransportDeviceErrorKind::Busy,
            _ => TransportDeviceErrorKind::Backend,
        }
    }
}

impl From<UsbError> for TransportError {
    fn from(e: UsbError) -> Self {
        TransportError::Device(TransportDeviceError::new(e.kind(), e.to_string()))
    }
}
