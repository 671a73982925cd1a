//! Builder 模式实现
//!
//! 提供链式构造控制器的便捷方式：选择传输、设置超时，然后构建
//! [`Controller`]（固定槽协议）或 [`ServoBus`]（总线协议）。

use crate::config::{DriverConfig, TransportKind};
use crate::controller::{Controller, SharedController};
use crate::error::DriverError;
use crate::servo_bus::ServoBus;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use xarm_transport::Transport;

/// 构建器产出的传输对象
pub type BoxedTransport = Box<dyn Transport + Send>;

/// 控制器 Builder（链式构造）
///
/// # Example
///
/// ```no_run
/// use xarm_driver::ControllerBuilder;
///
/// // 默认：第一块 USB 控制板
/// let mut controller = ControllerBuilder::new().build().unwrap();
/// controller.set_position(1, 500, 1000, true).unwrap();
///
/// // 串口总线舵机
/// let mut bus = ControllerBuilder::new()
///     .serial("/dev/ttyUSB0", 115_200)
///     .build_servo_bus()
///     .unwrap();
/// bus.move_to(1, 500, 1000).unwrap();
/// ```
pub struct ControllerBuilder {
    config: DriverConfig,
    /// 调用方提供的 USB 上下文（不提供时构建时新建一个）
    #[cfg(feature = "usb")]
    usb_context: Option<rusb::Context>,
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBuilder {
    pub fn new() -> Self {
        Self::from_config(DriverConfig::default())
    }

    pub fn from_config(config: DriverConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "usb")]
            usb_context: None,
        }
    }

    /// 从 TOML 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        Ok(Self::from_config(DriverConfig::load_from_file(path)?))
    }

    /// 使用 USB 传输
    pub fn usb(mut self) -> Self {
        self.config.transport = TransportKind::Usb;
        self
    }

    /// 指定 USB 设备的 VID/PID（默认 0x0483 / 0x5750）
    pub fn usb_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.config.usb.vendor_id = vendor_id;
        self.config.usb.product_id = product_id;
        self
    }

    /// 使用串口传输
    pub fn serial(mut self, port: impl Into<String>, baud_rate: u32) -> Self {
        self.config.transport = TransportKind::Serial;
        self.config.serial.port = Some(port.into());
        self.config.serial.baud_rate = baud_rate;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// 使用调用方持有的 USB 上下文
    #[cfg(feature = "usb")]
    pub fn usb_context(mut self, context: rusb::Context) -> Self {
        self.usb_context = Some(context);
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// 按配置创建（尚未打开的）传输对象
    pub fn build_transport(&self) -> Result<BoxedTransport, DriverError> {
        self.config.validate()?;
        match self.config.transport {
            TransportKind::Usb => self.usb_transport(),
            TransportKind::Serial => self.serial_transport(),
        }
    }

    #[cfg(feature = "usb")]
    fn usb_transport(&self) -> Result<BoxedTransport, DriverError> {
        use xarm_transport::usb::{UsbError, UsbTransport, UsbTransportConfig};

        let context = match &self.usb_context {
            Some(context) => context.clone(),
            None => rusb::Context::new().map_err(|e| DriverError::Transport(UsbError::from(e).into()))?,
        };
        let config = UsbTransportConfig {
            vendor_id: self.config.usb.vendor_id,
            product_id: self.config.usb.product_id,
            read_timeout: self.config.read_timeout(),
            write_timeout: self.config.write_timeout(),
        };
        info!(
            "Using USB transport {:04X}:{:04X}",
            config.vendor_id, config.product_id
        );
        Ok(Box::new(UsbTransport::new(context, config)))
    }

    #[cfg(not(feature = "usb"))]
    fn usb_transport(&self) -> Result<BoxedTransport, DriverError> {
        Err(DriverError::Config("USB support not compiled in (enable the `usb` feature)".into()))
    }

    #[cfg(feature = "serial")]
    fn serial_transport(&self) -> Result<BoxedTransport, DriverError> {
        use xarm_transport::SerialTransport;

        let port = self
            .config
            .serial
            .port
            .clone()
            .ok_or_else(|| DriverError::Config("serial.port is required".into()))?;
        info!("Using serial transport {} at {} baud", port, self.config.serial.baud_rate);
        Ok(Box::new(SerialTransport::new(
            port,
            self.config.serial.baud_rate,
            self.config.read_timeout(),
        )))
    }

    #[cfg(not(feature = "serial"))]
    fn serial_transport(&self) -> Result<BoxedTransport, DriverError> {
        Err(DriverError::Config(
            "Serial support not compiled in (enable the `serial` feature)".into(),
        ))
    }

    /// 构建 xArm 控制板控制器（打开设备）
    pub fn build(self) -> Result<Controller<BoxedTransport>, DriverError> {
        Controller::new(self.build_transport()?)
    }

    /// 构建可在线程间共享的控制器
    pub fn build_shared(self) -> Result<SharedController<BoxedTransport>, DriverError> {
        Ok(self.build()?.into_shared())
    }

    /// 构建总线舵机控制器（打开设备）
    pub fn build_servo_bus(self) -> Result<ServoBus<BoxedTransport>, DriverError> {
        ServoBus::new(self.build_transport()?)
    }
}
