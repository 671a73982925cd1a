//! 串口传输
//!
//! xArm 控制板的串口模式默认 9600 波特；LewanSoul 总线舵机调试板通常为 115200。
//! 数据格式固定 8N1。

use crate::{Transport, TransportDeviceError, TransportDeviceErrorKind, TransportError};
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// xArm 控制板串口默认波特率
pub const DEFAULT_BAUD_RATE: u32 = 9600;
/// 总线舵机调试板常用波特率
pub const BUS_SERVO_BAUD_RATE: u32 = 115_200;

/// 串口传输
pub struct SerialTransport {
    port_name: String,
    baud_rate: u32,
    timeout: Duration,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialTransport {
    pub fn new(port_name: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            timeout,
            port: None,
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// 列出系统上可用的串口名
    pub fn available_ports() -> Result<Vec<String>, TransportError> {
        let ports = serialport::available_ports().map_err(map_serial_error)?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }
}

fn map_serial_error(e: serialport::Error) -> TransportError {
    let kind = match e.kind() {
        serialport::ErrorKind::NoDevice => TransportDeviceErrorKind::NoDevice,
        serialport::ErrorKind::Io(ErrorKind::NotFound) => TransportDeviceErrorKind::NotFound,
        serialport::ErrorKind::Io(ErrorKind::PermissionDenied) => TransportDeviceErrorKind::AccessDenied,
        serialport::ErrorKind::Io(ErrorKind::ResourceBusy) => TransportDeviceErrorKind::Busy,
        _ => TransportDeviceErrorKind::Backend,
    };
    TransportError::Device(TransportDeviceError::new(kind, e.to_string()))
}

impl Transport for SerialTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }
        let port = serialport::new(&self.port_name, self.baud_rate)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(self.timeout)
            .open()
            .map_err(map_serial_error)?;
        debug!("Serial port {} opened at {} baud", self.port_name, self.baud_rate);
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if self.port.take().is_some() {
            debug!("Serial port {} closed", self.port_name);
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        port.write_all(bytes)?;
        port.flush()?;
        trace!("serial write {} bytes", bytes.len());
        Ok(())
    }

    /// 持续读取直到缓冲区填满或超时，返回已读字节数
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        let port = self.port.as_mut().ok_or(TransportError::NotOpen)?;
        let mut filled = 0;
        while filled < buffer.len() {
            match port.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        trace!("serial read {} bytes", filled);
        Ok(filled)
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }
}
