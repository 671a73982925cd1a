//! # xArm Protocol
//!
//! 机械臂舵机协议定义（无硬件依赖）
//!
//! ## 模块
//!
//! - `constants`: 帧格式与参数范围常量
//! - `commands`: 两套协议的命令字
//! - `raw`: 固定槽协议（xArm 控制板，64 字节定长帧）
//! - `bus`: 总线协议（LewanSoul 串口舵机，按舵机 ID 寻址，带校验和）
//!
//! ## 字节序
//!
//! 两套协议的多字节字段都使用小端字节序（低字节在前）。

pub mod bus;
pub mod commands;
pub mod constants;
pub mod raw;

pub use bus::{Alarm, BusCodec, MotorMode};
pub use commands::{BusCommand, RawCommand};
pub use constants::*;
pub use raw::{RawCodec, ServoTarget};

use thiserror::Error;

/// 协议帧的统一抽象
///
/// 两套协议共用的帧类型：编码器产出 `Frame`，传输层只关心字节。
///
/// # 设计特性
///
/// - **Copy trait**：固定容量，无堆分配
/// - **固定 64 字节容量**：与 USB 端点单次传输上限一致
///
/// ```rust
/// use xarm_protocol::Frame;
///
/// let frame = Frame::from_slice(&[0x55, 0x55, 0x02, 0x0F]).unwrap();
/// assert_eq!(frame.len(), 4);
/// assert_eq!(frame.as_bytes(), &[0x55, 0x55, 0x02, 0x0F]);
/// ```
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    data: [u8; MAX_FRAME_LEN],
    len: u8,
}

impl Frame {
    /// 从字节切片构建帧（超过 64 字节返回错误）
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() > MAX_FRAME_LEN {
            return Err(ProtocolError::PayloadTooLong {
                len: bytes.len(),
                max: MAX_FRAME_LEN,
            });
        }
        let mut data = [0u8; MAX_FRAME_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            data,
            len: bytes.len() as u8,
        })
    }

    /// 全零填充的 64 字节帧（固定槽协议使用）
    pub(crate) fn zeroed_full() -> Self {
        Self {
            data: [0u8; MAX_FRAME_LEN],
            len: MAX_FRAME_LEN as u8,
        }
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data[..self.len as usize]
    }

    /// 有效字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame[")?;
        for (i, b) in self.as_bytes().iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        write!(f, "]")
    }
}

/// 一次请求的内容
///
/// 固定槽协议的舵机号位于载荷中，因此 `servo_id` 为 `None`；
/// 总线协议的舵机 ID 位于帧头，必须提供。
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub command: u8,
    pub servo_id: Option<u8>,
    pub payload: &'a [u8],
}

impl<'a> Request<'a> {
    /// 不带地址的请求（固定槽协议）
    pub fn unaddressed(command: impl Into<u8>, payload: &'a [u8]) -> Self {
        Self {
            command: command.into(),
            servo_id: None,
            payload,
        }
    }

    /// 按舵机 ID 寻址的请求（总线协议）
    pub fn addressed(command: impl Into<u8>, servo_id: u8, payload: &'a [u8]) -> Self {
        Self {
            command: command.into(),
            servo_id: Some(servo_id),
            payload,
        }
    }
}

/// 对应答的期望
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expect {
    /// 期望回显的命令字
    pub command: u8,
    /// 期望回显的舵机 ID（`None` 表示不检查）
    pub servo_id: Option<u8>,
    /// 期望的载荷长度
    pub payload_len: usize,
}

impl Expect {
    pub fn new(command: impl Into<u8>, servo_id: Option<u8>, payload_len: usize) -> Self {
        Self {
            command: command.into(),
            servo_id,
            payload_len,
        }
    }
}

/// 帧编解码策略
///
/// 两套协议各有一个实现，控制器通过该 trait 完成 编码 → 写 → 读 → 解码。
pub trait FrameCodec {
    /// 编码一帧
    fn encode(&self, request: &Request<'_>) -> Result<Frame, ProtocolError>;

    /// 校验应答并返回载荷切片
    ///
    /// `response` 是实际读到的字节（长度为 0 表示超时未收到任何数据）。
    fn decode<'a>(&self, response: &'a [u8], expect: &Expect) -> Result<&'a [u8], ProtocolError>;

    /// 读取应答时需要准备的缓冲区大小
    fn response_capacity(&self, expect: &Expect) -> usize;
}

/// 协议层错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// 超时内没有读到任何字节
    #[error("No response from device")]
    NoResponse,

    /// 固定槽协议应答不匹配（签名、命令字、回显舵机号或长度）
    #[error("Protocol mismatch on {field}: expected {expected}, got {actual}")]
    ProtocolMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid signature: {actual:02X?}")]
    InvalidSignature { actual: [u8; 2] },

    #[error("Invalid servo id: expected {expected}, got {actual}")]
    InvalidServoId { expected: u8, actual: u8 },

    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Invalid command: expected 0x{expected:02X}, got 0x{actual:02X}")]
    InvalidCommand { expected: u8, actual: u8 },

    #[error("Checksum mismatch: expected 0x{expected:02X}, got 0x{actual:02X}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// 写入参数越界（在任何 IO 之前检出）
    #[error("Parameter {argument} out of range: {value} not in [{min}, {max}]")]
    ParameterOutOfRange {
        argument: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Payload too long: {len} bytes (max {max})")]
    PayloadTooLong { len: usize, max: usize },

    /// 总线协议请求缺少舵机 ID
    #[error("Bus request requires a servo id")]
    MissingServoId,

    #[error("Invalid value for field {field}: {value}")]
    InvalidValue { field: &'static str, value: u8 },
}

impl ProtocolError {
    /// 是否为应答校验失败（签名、地址、长度、命令、校验和）
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            ProtocolError::ProtocolMismatch { .. }
                | ProtocolError::InvalidSignature { .. }
                | ProtocolError::InvalidServoId { .. }
                | ProtocolError::InvalidLength { .. }
                | ProtocolError::InvalidCommand { .. }
                | ProtocolError::ChecksumMismatch { .. }
        )
    }
}

/// 参数范围检查，越界时返回 `ParameterOutOfRange`
pub(crate) fn check_range<T>(argument: &'static str, value: T, min: T, max: T) -> Result<T, ProtocolError>
where
    T: PartialOrd + Copy + Into<i64>,
{
    if value < min || value > max {
        return Err(ProtocolError::ParameterOutOfRange {
            argument,
            value: value.into(),
            min: min.into(),
            max: max.into(),
        });
    }
    Ok(value)
}

/// 小端字节序转 u16
pub fn bytes_to_u16_le(bytes: [u8; 2]) -> u16 {
    u16::from_le_bytes(bytes)
}

/// 小端字节序转 i16
pub fn bytes_to_i16_le(bytes: [u8; 2]) -> i16 {
    i16::from_le_bytes(bytes)
}

/// u16 转小端字节序
pub fn u16_to_bytes_le(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}
