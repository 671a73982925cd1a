//! xArm 控制板 USB 传输
//!
//! 控制板枚举为 VID `0x0483` / PID `0x5750`，第 0 个配置的第 0 个接口上
//! 各有一个 IN 与 OUT 端点（中断或批量传输）。每次传输固定 64 字节。
//!
//! 不使用进程级全局上下文：调用方创建 `rusb::Context` 并交给传输对象，
//! 同一个上下文可以在多个传输对象之间共享。

pub mod error;

pub use error::UsbError;

use crate::{Transport, TransportError};
use rusb::{Context, DeviceHandle, Direction, TransferType, UsbContext};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// xArm 控制板默认 Vendor ID
pub const XARM_VENDOR_ID: u16 = 0x0483;
/// xArm 控制板默认 Product ID
pub const XARM_PRODUCT_ID: u16 = 0x5750;
/// 单次 USB 传输字节数
pub const USB_PACKET_LEN: usize = 64;

/// USB 传输配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbTransportConfig {
    pub vendor_id: u16,
    pub product_id: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

impl Default for UsbTransportConfig {
    fn default() -> Self {
        Self {
            vendor_id: XARM_VENDOR_ID,
            product_id: XARM_PRODUCT_ID,
            read_timeout: Duration::from_millis(1000),
            write_timeout: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Endpoint {
    address: u8,
    transfer_type: TransferType,
}

struct OpenDevice {
    handle: DeviceHandle<Context>,
    interface_number: u8,
    endpoint_in: Endpoint,
    endpoint_out: Endpoint,
}

impl OpenDevice {
    fn read_packet(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, UsbError> {
        let ep = self.endpoint_in;
        let result = match ep.transfer_type {
            TransferType::Interrupt => self.handle.read_interrupt(ep.address, buf, timeout),
            _ => self.handle.read_bulk(ep.address, buf, timeout),
        };
        result.map_err(|source| UsbError::Transfer {
            endpoint: ep.address,
            source,
        })
    }

    fn write_packet(&self, buf: &[u8], timeout: Duration) -> Result<usize, UsbError> {
        let ep = self.endpoint_out;
        let result = match ep.transfer_type {
            TransferType::Interrupt => self.handle.write_interrupt(ep.address, buf, timeout),
            _ => self.handle.write_bulk(ep.address, buf, timeout),
        };
        result.map_err(|source| UsbError::Transfer {
            endpoint: ep.address,
            source,
        })
    }

    /// 释放 USB 接口（交还给操作系统）
    fn release(&mut self) -> Result<(), UsbError> {
        self.handle.release_interface(self.interface_number)?;
        trace!("[Release] USB interface {} released", self.interface_number);
        Ok(())
    }
}

/// xArm 控制板 USB 传输
pub struct UsbTransport {
    context: Context,
    config: UsbTransportConfig,
    device: Option<OpenDevice>,
}

impl UsbTransport {
    /// 使用调用方提供的上下文创建传输对象（此时不访问设备）
    pub fn new(context: Context, config: UsbTransportConfig) -> Self {
        Self {
            context,
            config,
            device: None,
        }
    }

    /// 使用默认 VID/PID 与超时
    pub fn with_context(context: Context) -> Self {
        Self::new(context, UsbTransportConfig::default())
    }

    pub fn config(&self) -> &UsbTransportConfig {
        &self.config
    }

    /// 统计当前连接的匹配设备数量
    pub fn count_devices(context: &Context, vendor_id: u16, product_id: u16) -> Result<usize, UsbError> {
        let mut count = 0;
        for device in context.devices()?.iter() {
            let Ok(desc) = device.device_descriptor() else {
                continue;
            };
            if desc.vendor_id() == vendor_id && desc.product_id() == product_id {
                count += 1;
            }
        }
        Ok(count)
    }

    fn open_device(&self) -> Result<OpenDevice, UsbError> {
        let UsbTransportConfig {
            vendor_id,
            product_id,
            read_timeout,
            ..
        } = self.config;

        let device = self
            .context
            .devices()?
            .iter()
            .find(|device| {
                device
                    .device_descriptor()
                    .map(|d| d.vendor_id() == vendor_id && d.product_id() == product_id)
                    .unwrap_or(false)
            })
            .ok_or(UsbError::DeviceNotFound {
                vendor_id,
                product_id,
            })?;

        let config_desc = device.config_descriptor(0)?;
        let interface = config_desc
            .interfaces()
            .next()
            .and_then(|iface| iface.descriptors().next())
            .ok_or(UsbError::NoEndpoints { interface: 0 })?;
        let interface_number = interface.interface_number();
        let (endpoint_in, endpoint_out) =
            find_endpoints(&interface).ok_or(UsbError::NoEndpoints {
                interface: interface_number,
            })?;

        let mut handle = device.open()?;

        // 非 Windows 平台需要先卸载内核驱动（HID）
        #[cfg(not(target_os = "windows"))]
        {
            if handle.kernel_driver_active(interface_number).unwrap_or(false) {
                handle.detach_kernel_driver(interface_number)?;
            }
        }
        handle.claim_interface(interface_number)?;

        let open = OpenDevice {
            handle,
            interface_number,
            endpoint_in,
            endpoint_out,
        };

        // 丢弃控制板上电后残留的一包数据
        let mut scratch = [0u8; USB_PACKET_LEN];
        match open.read_packet(&mut scratch, read_timeout) {
            Ok(n) => trace!("drained {} stale bytes", n),
            Err(e) if e.is_timeout() => {},
            Err(e) => warn!("Failed to drain stale input: {}", e),
        }

        debug!(
            "USB device {:04X}:{:04X} opened (in=0x{:02X}, out=0x{:02X})",
            vendor_id, product_id, endpoint_in.address, endpoint_out.address
        );
        Ok(open)
    }
}

/// 查找 IN/OUT 端点（中断或批量）
fn find_endpoints(interface: &rusb::InterfaceDescriptor) -> Option<(Endpoint, Endpoint)> {
    let mut endpoint_in = None;
    let mut endpoint_out = None;

    for endpoint in interface.endpoint_descriptors() {
        let transfer_type = endpoint.transfer_type();
        if !matches!(transfer_type, TransferType::Interrupt | TransferType::Bulk) {
            continue;
        }
        let ep = Endpoint {
            address: endpoint.address(),
            transfer_type,
        };
        match endpoint.direction() {
            Direction::In => endpoint_in = endpoint_in.or(Some(ep)),
            Direction::Out => endpoint_out = endpoint_out.or(Some(ep)),
        }
    }

    Some((endpoint_in?, endpoint_out?))
}

/// 把一帧补零到 64 字节；超过 64 字节返回错误
fn pad_packet(bytes: &[u8]) -> Result<[u8; USB_PACKET_LEN], TransportError> {
    if bytes.len() > USB_PACKET_LEN {
        return Err(TransportError::PayloadTooLarge {
            len: bytes.len(),
            max: USB_PACKET_LEN,
        });
    }
    let mut packet = [0u8; USB_PACKET_LEN];
    packet[..bytes.len()].copy_from_slice(bytes);
    Ok(packet)
}

impl Transport for UsbTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.device.is_some() {
            return Ok(());
        }
        self.device = Some(self.open_device()?);
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(mut device) = self.device.take() {
            device.release()?;
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let packet = pad_packet(bytes)?;
        let device = self.device.as_ref().ok_or(TransportError::NotOpen)?;
        let written = device.write_packet(&packet, self.config.write_timeout)?;
        trace!("USB write {} bytes", written);
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        let device = self.device.as_ref().ok_or(TransportError::NotOpen)?;
        let mut packet = [0u8; USB_PACKET_LEN];
        let n = match device.read_packet(&mut packet, self.config.read_timeout) {
            Ok(n) => n,
            Err(e) if e.is_timeout() => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let n = n.min(buffer.len());
        buffer[..n].copy_from_slice(&packet[..n]);
        trace!("USB read {} bytes", n);
        Ok(n)
    }

    fn is_open(&self) -> bool {
        self.device.is_some()
    }
}

impl Drop for UsbTransport {
    fn drop(&mut self) {
        if let Some(mut device) = self.device.take() {
            // 设备可能已经拔出，释放失败不应 panic
            if let Err(e) = device.release() {
                trace!("Failed to release USB interface on drop: {}", e);
            }
        }
    }
}
