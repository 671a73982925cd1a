//! 固定槽协议（xArm 控制板）
//!
//! 每帧固定 64 字节：
//!
//! ```text
//! [0]=0x55 [1]=0x55 [2]=len(payload)+2 [3]=command [4..]=payload  （其余补零）
//! ```
//!
//! 应答使用相同布局。多舵机命令的载荷为 `count` 后跟若干 `(id, lo, hi)` 条目。

use crate::constants::*;
use crate::{
    Expect, Frame, FrameCodec, ProtocolError, Request, bytes_to_u16_le, check_range, u16_to_bytes_le,
};
use tracing::trace;

/// 单个舵机的目标位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoTarget {
    pub id: u8,
    pub position: u16,
}

impl ServoTarget {
    pub fn new(id: u8, position: u16) -> Self {
        Self { id, position }
    }
}

/// 固定槽协议编解码器
#[derive(Debug, Clone, Copy, Default)]
pub struct RawCodec;

impl FrameCodec for RawCodec {
    fn encode(&self, request: &Request<'_>) -> Result<Frame, ProtocolError> {
        let payload = request.payload;
        if payload.len() > RAW_MAX_PAYLOAD_LEN {
            return Err(ProtocolError::PayloadTooLong {
                len: payload.len(),
                max: RAW_MAX_PAYLOAD_LEN,
            });
        }

        let mut frame = Frame::zeroed_full();
        let data = frame.data_mut();
        data[0] = SIGNATURE;
        data[1] = SIGNATURE;
        data[RAW_LENGTH_OFFSET] = (payload.len() + RAW_LENGTH_BIAS) as u8;
        data[RAW_COMMAND_OFFSET] = request.command;
        data[RAW_PAYLOAD_OFFSET..RAW_PAYLOAD_OFFSET + payload.len()].copy_from_slice(payload);

        trace!("raw encode: {:?}", frame);
        Ok(frame)
    }

    fn decode<'a>(&self, response: &'a [u8], expect: &Expect) -> Result<&'a [u8], ProtocolError> {
        if response.is_empty() {
            return Err(ProtocolError::NoResponse);
        }
        if response.len() < RAW_PAYLOAD_OFFSET {
            return Err(mismatch("length", RAW_PAYLOAD_OFFSET, response.len()));
        }
        for &b in &response[..SIGNATURE_LEN] {
            if b != SIGNATURE {
                return Err(mismatch("signature", SIGNATURE as usize, b as usize));
            }
        }
        let command = response[RAW_COMMAND_OFFSET];
        if command != expect.command {
            return Err(mismatch("command", expect.command as usize, command as usize));
        }

        let declared = response[RAW_LENGTH_OFFSET] as usize;
        if declared < RAW_LENGTH_BIAS {
            return Err(mismatch("length", RAW_LENGTH_BIAS, declared));
        }
        let payload_len = declared - RAW_LENGTH_BIAS;
        let end = RAW_PAYLOAD_OFFSET + payload_len;
        if end > response.len() {
            return Err(mismatch("length", end, response.len()));
        }
        if payload_len < expect.payload_len {
            return Err(mismatch("length", expect.payload_len, payload_len));
        }
        let payload = &response[RAW_PAYLOAD_OFFSET..end];

        // 单舵机应答：count 必须为 1，且回显的舵机号与请求一致
        if let Some(servo_id) = expect.servo_id {
            if payload.len() < 2 {
                return Err(mismatch("length", 2, payload.len()));
            }
            if payload[0] != 1 {
                return Err(mismatch("count", 1, payload[0] as usize));
            }
            if payload[1] != servo_id {
                return Err(mismatch("servo_id", servo_id as usize, payload[1] as usize));
            }
        }

        Ok(payload)
    }

    fn response_capacity(&self, _expect: &Expect) -> usize {
        MAX_FRAME_LEN
    }
}

fn mismatch(field: &'static str, expected: usize, actual: usize) -> ProtocolError {
    ProtocolError::ProtocolMismatch {
        field,
        expected,
        actual,
    }
}

/// 检查控制板舵机编号（S1~S6）
pub fn check_servo_id(id: u8) -> Result<u8, ProtocolError> {
    check_range("servo_id", id, RAW_SERVO_ID_MIN, RAW_SERVO_ID_MAX)
}

/// 单帧最多可携带的舵机条目数（定时运动命令）
pub const MAX_MOVE_TARGETS: usize = (RAW_MAX_PAYLOAD_LEN - 3) / RAW_SERVO_ENTRY_LEN;

/// 构建定时运动载荷：`count, duration_lo, duration_hi, (id, lo, hi)...`
///
/// 条目顺序与调用方给出的顺序一致，不做排序；位置值原样透传，不做范围检查。
pub fn servo_move_payload(duration_ms: u16, targets: &[ServoTarget]) -> Result<Vec<u8>, ProtocolError> {
    if targets.len() > MAX_MOVE_TARGETS {
        return Err(ProtocolError::PayloadTooLong {
            len: 3 + targets.len() * RAW_SERVO_ENTRY_LEN,
            max: RAW_MAX_PAYLOAD_LEN,
        });
    }

    let mut payload = Vec::with_capacity(3 + targets.len() * RAW_SERVO_ENTRY_LEN);
    payload.push(targets.len() as u8);
    payload.extend_from_slice(&u16_to_bytes_le(duration_ms));
    for target in targets {
        payload.push(target.id);
        payload.extend_from_slice(&u16_to_bytes_le(target.position));
    }
    Ok(payload)
}

/// 构建舵机选择载荷：`count, id...`（用于停止与读取位置）
pub fn servo_select_payload(ids: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    if ids.len() + 1 > RAW_MAX_PAYLOAD_LEN {
        return Err(ProtocolError::PayloadTooLong {
            len: ids.len() + 1,
            max: RAW_MAX_PAYLOAD_LEN,
        });
    }
    let mut payload = Vec::with_capacity(ids.len() + 1);
    payload.push(ids.len() as u8);
    payload.extend_from_slice(ids);
    Ok(payload)
}

/// 构建动作组载荷：`group, value_lo, value_hi`
///
/// `value` 对运行命令是执行次数（0 表示无限循环），对调速命令是速度百分比。
pub fn action_group_payload(group: u8, value: u16) -> [u8; 3] {
    let [lo, hi] = u16_to_bytes_le(value);
    [group, lo, hi]
}

/// 解析读取位置的应答载荷
///
/// 载荷布局与请求对称：`count` 后跟 `(id, lo, hi)` 条目，步长 3。
/// 回显的舵机号必须与请求顺序一一对应。
pub fn parse_positions(payload: &[u8], ids: &[u8]) -> Result<Vec<u16>, ProtocolError> {
    let Some((&count, entries)) = payload.split_first() else {
        return Err(mismatch("length", 1, 0));
    };
    if count as usize != ids.len() {
        return Err(mismatch("count", ids.len(), count as usize));
    }
    let needed = ids.len() * RAW_SERVO_ENTRY_LEN;
    if entries.len() < needed {
        return Err(mismatch("length", needed, entries.len()));
    }

    entries
        .chunks_exact(RAW_SERVO_ENTRY_LEN)
        .zip(ids)
        .map(|(entry, &id)| {
            if entry[0] != id {
                return Err(mismatch("servo_id", id as usize, entry[0] as usize));
            }
            Ok(bytes_to_u16_le([entry[1], entry[2]]))
        })
        .collect()
}

/// 解析电池电压应答载荷（毫伏）
pub fn parse_battery_voltage(payload: &[u8]) -> Result<u16, ProtocolError> {
    match payload {
        [lo, hi, ..] => Ok(bytes_to_u16_le([*lo, *hi])),
        _ => Err(mismatch("length", 2, payload.len())),
    }
}
