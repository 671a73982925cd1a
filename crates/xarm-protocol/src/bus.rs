//! 总线协议（LewanSoul / Hiwonder 串口舵机）
//!
//! 帧格式：
//!
//! ```text
//! 0x55 0x55 ID Length Cmd Prm1 ... PrmN Checksum
//! ```
//!
//! - `ID`: 0~253，254（0xFE）为广播地址
//! - `Length`: 载荷长度 + 3
//! - `Checksum`: `~(ID + Length + Cmd + Prm1 + ... + PrmN)`，结果只取低 8 位
//!
//! 所有带范围的写参数都在编码前检查，越界参数不会发送给舵机。

use crate::commands::BusCommand;
use crate::constants::*;
use crate::{
    Expect, Frame, FrameCodec, ProtocolError, Request, bytes_to_i16_le, bytes_to_u16_le, check_range,
    u16_to_bytes_le,
};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use tracing::trace;

/// 计算校验和
///
/// `body` 为 ID 到最后一个载荷字节（不含签名和校验和本身）。
pub fn checksum(body: &[u8]) -> u8 {
    !body.iter().fold(0u8, |sum, &b| sum.wrapping_add(b))
}

/// 总线协议编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct BusCodec;

impl FrameCodec for BusCodec {
    fn encode(&self, request: &Request<'_>) -> Result<Frame, ProtocolError> {
        let servo_id = request.servo_id.ok_or(ProtocolError::MissingServoId)?;
        let payload = request.payload;
        if payload.len() > BUS_MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLong {
                len: payload.len(),
                max: BUS_MAX_PAYLOAD_LEN,
            });
        }

        let mut bytes = [0u8; MAX_FRAME_LEN];
        let len = payload.len() + BUS_MIN_FRAME_LEN;
        bytes[0] = SIGNATURE;
        bytes[1] = SIGNATURE;
        bytes[BUS_ID_OFFSET] = servo_id;
        bytes[BUS_LENGTH_OFFSET] = (payload.len() + BUS_LENGTH_BIAS) as u8;
        bytes[BUS_COMMAND_OFFSET] = request.command;
        bytes[BUS_PAYLOAD_OFFSET..BUS_PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);
        bytes[len - 1] = checksum(&bytes[BUS_ID_OFFSET..len - 1]);

        let frame = Frame::from_slice(&bytes[..len])?;
        trace!("bus encode: {:?}", frame);
        Ok(frame)
    }

    fn decode<'a>(&self, response: &'a [u8], expect: &Expect) -> Result<&'a [u8], ProtocolError> {
        let len = response.len();
        if len == 0 {
            return Err(ProtocolError::NoResponse);
        }
        if len < SIGNATURE_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: BUS_MIN_FRAME_LEN,
                actual: len,
            });
        }
        if response[0] != SIGNATURE || response[1] != SIGNATURE {
            return Err(ProtocolError::InvalidSignature {
                actual: [response[0], response[1]],
            });
        }
        if len < BUS_MIN_FRAME_LEN {
            return Err(ProtocolError::InvalidLength {
                expected: BUS_MIN_FRAME_LEN,
                actual: len,
            });
        }

        // ID_READ 本身用于发现未知 ID，不检查回显地址
        let servo_id = response[BUS_ID_OFFSET];
        if expect.command != u8::from(BusCommand::IdRead)
            && let Some(expected) = expect.servo_id
            && servo_id != expected
        {
            return Err(ProtocolError::InvalidServoId {
                expected,
                actual: servo_id,
            });
        }

        let declared = response[BUS_LENGTH_OFFSET] as usize + BUS_LENGTH_BIAS;
        if declared != len {
            return Err(ProtocolError::InvalidLength {
                expected: declared,
                actual: len,
            });
        }

        let command = response[BUS_COMMAND_OFFSET];
        if command != expect.command {
            return Err(ProtocolError::InvalidCommand {
                expected: expect.command,
                actual: command,
            });
        }

        let expected_sum = checksum(&response[BUS_ID_OFFSET..len - 1]);
        let actual_sum = response[len - 1];
        if expected_sum != actual_sum {
            return Err(ProtocolError::ChecksumMismatch {
                expected: expected_sum,
                actual: actual_sum,
            });
        }

        let payload = &response[BUS_PAYLOAD_OFFSET..len - 1];
        if payload.len() != expect.payload_len {
            return Err(ProtocolError::InvalidLength {
                expected: expect.payload_len + BUS_MIN_FRAME_LEN,
                actual: len,
            });
        }
        Ok(payload)
    }

    fn response_capacity(&self, expect: &Expect) -> usize {
        expect.payload_len + BUS_MIN_FRAME_LEN
    }
}

// ============================================================================
// 枚举参数
// ============================================================================

/// 舵机报警状态（LED 闪烁触发条件）
///
/// 数值按位组合：bit0 过温，bit1 过压，bit2 堵转。
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Alarm {
    NoAlarm = 0,
    OverTemperature = 1,
    OverVoltage = 2,
    OverTemperatureAndOverVoltage = 3,
    LockedRotor = 4,
    OverTemperatureAndStalled = 5,
    OverVoltageAndStalled = 6,
    OverTemperatureOverVoltageAndStalled = 7,
}

/// 舵机工作模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MotorMode {
    /// 位置伺服模式
    Servo,
    /// 连续旋转模式，`speed` 范围 -1000~1000
    Motor { speed: i16 },
}

// ============================================================================
// 写参数构建（带范围检查）
// ============================================================================

/// MOVE_TIME_WRITE / MOVE_TIME_WAIT_WRITE 载荷：`pos_lo, pos_hi, time_lo, time_hi`
pub fn move_time_payload(position: u16, time_ms: u16) -> Result<[u8; 4], ProtocolError> {
    check_range("position", position, POSITION_MIN, POSITION_MAX)?;
    check_range("time_ms", time_ms, MOVE_TIME_MIN_MS, MOVE_TIME_MAX_MS)?;
    Ok(u16_pair(position, time_ms))
}

/// ID_WRITE 载荷
pub fn servo_id_payload(new_id: u8) -> Result<[u8; 1], ProtocolError> {
    check_range("new_id", new_id, 0, BUS_SERVO_ID_MAX)?;
    Ok([new_id])
}

/// ANGLE_OFFSET_ADJUST / ANGLE_OFFSET_WRITE 载荷
pub fn angle_offset_payload(offset: i8) -> Result<[u8; 1], ProtocolError> {
    check_range("offset", offset, ANGLE_OFFSET_MIN, ANGLE_OFFSET_MAX)?;
    Ok([offset as u8])
}

/// ANGLE_LIMIT_WRITE 载荷：`min_lo, min_hi, max_lo, max_hi`
pub fn angle_limit_payload(min_angle: u16, max_angle: u16) -> Result<[u8; 4], ProtocolError> {
    check_range("min_angle", min_angle, POSITION_MIN, POSITION_MAX)?;
    check_range("max_angle", max_angle, POSITION_MIN, POSITION_MAX)?;
    check_range("min_angle", min_angle, POSITION_MIN, max_angle)?;
    Ok(u16_pair(min_angle, max_angle))
}

/// VIN_LIMIT_WRITE 载荷（毫伏）
pub fn vin_limit_payload(min_mv: u16, max_mv: u16) -> Result<[u8; 4], ProtocolError> {
    check_range("min_voltage_mv", min_mv, VIN_MIN_MV, VIN_MAX_MV)?;
    check_range("max_voltage_mv", max_mv, VIN_MIN_MV, VIN_MAX_MV)?;
    check_range("min_voltage_mv", min_mv, VIN_MIN_MV, max_mv)?;
    Ok(u16_pair(min_mv, max_mv))
}

/// TEMP_MAX_LIMIT_WRITE 载荷（摄氏度）
pub fn max_temperature_payload(celsius: u8) -> Result<[u8; 1], ProtocolError> {
    check_range("max_temperature_c", celsius, TEMP_LIMIT_MIN_C, TEMP_LIMIT_MAX_C)?;
    Ok([celsius])
}

/// OR_MOTOR_MODE_WRITE 载荷：`mode, 0, speed_lo, speed_hi`
pub fn motor_mode_payload(mode: MotorMode) -> Result<[u8; 4], ProtocolError> {
    match mode {
        MotorMode::Servo => Ok([0, 0, 0, 0]),
        MotorMode::Motor { speed } => {
            check_range("speed", speed, MOTOR_SPEED_MIN, MOTOR_SPEED_MAX)?;
            let [lo, hi] = speed.to_le_bytes();
            Ok([1, 0, lo, hi])
        },
    }
}

/// 单字节开关载荷（上电/掉电、LED）
pub fn switch_payload(on: bool) -> [u8; 1] {
    [u8::from(on)]
}

fn u16_pair(first: u16, second: u16) -> [u8; 4] {
    let [a, b] = u16_to_bytes_le(first);
    let [c, d] = u16_to_bytes_le(second);
    [a, b, c, d]
}

// ============================================================================
// 应答解析
// ============================================================================

fn short(payload: &[u8], expected: usize) -> ProtocolError {
    ProtocolError::InvalidLength {
        expected: expected + BUS_MIN_FRAME_LEN,
        actual: payload.len() + BUS_MIN_FRAME_LEN,
    }
}

/// 单字节载荷
pub fn parse_u8(payload: &[u8]) -> Result<u8, ProtocolError> {
    payload.first().copied().ok_or_else(|| short(payload, 1))
}

/// 有符号单字节载荷（角度偏差）
pub fn parse_i8(payload: &[u8]) -> Result<i8, ProtocolError> {
    parse_u8(payload).map(|b| b as i8)
}

/// 开关状态载荷
pub fn parse_switch(payload: &[u8]) -> Result<bool, ProtocolError> {
    parse_u8(payload).map(|b| b == 1)
}

/// 双字节无符号载荷（电压）
pub fn parse_u16(payload: &[u8]) -> Result<u16, ProtocolError> {
    match payload {
        [lo, hi, ..] => Ok(bytes_to_u16_le([*lo, *hi])),
        _ => Err(short(payload, 2)),
    }
}

/// 位置载荷（有符号，舵机越过零点时会读到负值）
pub fn parse_position(payload: &[u8]) -> Result<i16, ProtocolError> {
    match payload {
        [lo, hi, ..] => Ok(bytes_to_i16_le([*lo, *hi])),
        _ => Err(short(payload, 2)),
    }
}

/// 两个 u16 组成的载荷（限位、运动参数）
pub fn parse_u16_pair(payload: &[u8]) -> Result<(u16, u16), ProtocolError> {
    match payload {
        [a, b, c, d, ..] => Ok((bytes_to_u16_le([*a, *b]), bytes_to_u16_le([*c, *d]))),
        _ => Err(short(payload, 4)),
    }
}

/// 报警状态载荷
pub fn parse_alarm(payload: &[u8]) -> Result<Alarm, ProtocolError> {
    let value = parse_u8(payload)?;
    Alarm::try_from(value).map_err(|_| ProtocolError::InvalidValue {
        field: "alarm",
        value,
    })
}

/// 工作模式载荷
pub fn parse_motor_mode(payload: &[u8]) -> Result<MotorMode, ProtocolError> {
    match payload {
        [0, _, _, _, ..] => Ok(MotorMode::Servo),
        [1, _, lo, hi, ..] => Ok(MotorMode::Motor {
            speed: bytes_to_i16_le([*lo, *hi]),
        }),
        [mode, _, _, _, ..] => Err(ProtocolError::InvalidValue {
            field: "motor_mode",
            value: *mode,
        }),
        _ => Err(short(payload, 4)),
    }
}
