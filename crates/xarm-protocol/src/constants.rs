//! 协议常量定义
//!
//! 集中定义帧格式和参数范围相关的常量，避免在代码中散落"魔法数"。

// ============================================================================
// 帧格式
// ============================================================================

/// 帧起始签名字节（两种协议共用，帧头连续出现两次）
pub const SIGNATURE: u8 = 0x55;

/// 帧头签名长度
pub const SIGNATURE_LEN: usize = 2;

/// 单帧最大字节数
///
/// 固定槽协议的帧恰好是 64 字节；USB 端点单次传输上限同样是 64 字节，
/// 总线协议的帧也按此上限约束。
pub const MAX_FRAME_LEN: usize = 64;

// ============================================================================
// 固定槽协议（xArm 控制板）
// ============================================================================

/// 固定槽协议：长度字节偏移
pub const RAW_LENGTH_OFFSET: usize = 2;
/// 固定槽协议：命令字节偏移
pub const RAW_COMMAND_OFFSET: usize = 3;
/// 固定槽协议：载荷起始偏移
pub const RAW_PAYLOAD_OFFSET: usize = 4;
/// 固定槽协议：长度字段 = 载荷长度 + 2（长度字节与命令字节本身）
pub const RAW_LENGTH_BIAS: usize = 2;
/// 固定槽协议：最大载荷长度
pub const RAW_MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - RAW_PAYLOAD_OFFSET;

/// 每个舵机条目（id, pos_lo, pos_hi）的字节数
pub const RAW_SERVO_ENTRY_LEN: usize = 3;

/// 固定槽协议舵机编号范围（控制板上的 S1~S6）
pub const RAW_SERVO_ID_MIN: u8 = 1;
pub const RAW_SERVO_ID_MAX: u8 = 6;

// ============================================================================
// 总线协议（LewanSoul / Hiwonder 串口舵机）
// ============================================================================

/// 总线协议：舵机 ID 偏移
pub const BUS_ID_OFFSET: usize = 2;
/// 总线协议：长度字节偏移
pub const BUS_LENGTH_OFFSET: usize = 3;
/// 总线协议：命令字节偏移
pub const BUS_COMMAND_OFFSET: usize = 4;
/// 总线协议：载荷起始偏移
pub const BUS_PAYLOAD_OFFSET: usize = 5;
/// 总线协议：长度字段 = 载荷长度 + 3（长度、命令、校验和各 1 字节）
pub const BUS_LENGTH_BIAS: usize = 3;
/// 总线协议：空载荷时的帧长度（签名 2 + ID + 长度 + 命令 + 校验和）
pub const BUS_MIN_FRAME_LEN: usize = 6;
/// 总线协议：最大载荷长度
pub const BUS_MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - BUS_MIN_FRAME_LEN;

/// 总线协议：广播地址（所有舵机都会执行，但不会应答）
pub const BROADCAST_ID: u8 = 0xFE;
/// 总线协议：最大可分配舵机 ID
pub const BUS_SERVO_ID_MAX: u8 = 253;

// ============================================================================
// 参数范围
// ============================================================================

/// 舵机原始位置范围（设备单位，无物理量纲）
pub const POSITION_MIN: u16 = 0;
pub const POSITION_MAX: u16 = 1000;

/// 总线协议运动时间范围（毫秒）
pub const MOVE_TIME_MIN_MS: u16 = 0;
pub const MOVE_TIME_MAX_MS: u16 = 30_000;

/// 输入电压限制范围（毫伏）
pub const VIN_MIN_MV: u16 = 4_500;
pub const VIN_MAX_MV: u16 = 12_000;

/// 最高温度限制范围（摄氏度）
pub const TEMP_LIMIT_MIN_C: u8 = 50;
pub const TEMP_LIMIT_MAX_C: u8 = 100;

/// 角度偏差调整范围（设备单位，约 0.24° 每单位）
pub const ANGLE_OFFSET_MIN: i8 = -125;
pub const ANGLE_OFFSET_MAX: i8 = 125;

/// 电机模式转速范围（设备单位）
pub const MOTOR_SPEED_MIN: i16 = -1000;
pub const MOTOR_SPEED_MAX: i16 = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout_constants() {
        assert_eq!(RAW_PAYLOAD_OFFSET + RAW_MAX_PAYLOAD_LEN, MAX_FRAME_LEN);
        assert_eq!(BUS_MIN_FRAME_LEN + BUS_MAX_PAYLOAD_LEN, MAX_FRAME_LEN);
        // 总线协议的长度字段覆盖 长度 + 命令 + 载荷 + 校验和
        assert_eq!(BUS_MIN_FRAME_LEN - BUS_LENGTH_BIAS, BUS_LENGTH_OFFSET);
    }

    #[test]
    fn test_broadcast_outside_assignable_range() {
        assert!(BROADCAST_ID > BUS_SERVO_ID_MAX);
    }
}
