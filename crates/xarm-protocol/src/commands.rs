//! 命令字定义
//!
//! 两套协议各自的命令字枚举。命令字直接写入帧的命令字节。

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// 固定槽协议命令字（xArm 控制板）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum RawCommand {
    /// 多舵机定时运动
    ServoMove = 0x03,
    /// 运行动作组
    ActionGroupRun = 0x06,
    /// 停止动作组
    ActionGroupStop = 0x07,
    /// 设置动作组速度
    ActionGroupSpeed = 0x0B,
    /// 读取电池电压
    BatteryVoltage = 0x0F,
    /// 舵机掉电（停止）
    ServoStop = 0x14,
    /// 读取舵机位置
    GetServoPosition = 0x15,
}

/// 总线协议命令字（LewanSoul / Hiwonder 串口舵机）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum BusCommand {
    MoveTimeWrite = 1,
    MoveTimeRead = 2,
    MoveTimeWaitWrite = 7,
    MoveTimeWaitRead = 8,
    MoveStart = 11,
    MoveStop = 12,
    IdWrite = 13,
    IdRead = 14,
    AngleOffsetAdjust = 17,
    AngleOffsetWrite = 18,
    AngleOffsetRead = 19,
    AngleLimitWrite = 20,
    AngleLimitRead = 21,
    VinLimitWrite = 22,
    VinLimitRead = 23,
    TempMaxLimitWrite = 24,
    TempMaxLimitRead = 25,
    TempRead = 26,
    VinRead = 27,
    PosRead = 28,
    OrMotorModeWrite = 29,
    OrMotorModeRead = 30,
    LoadOrUnloadWrite = 31,
    LoadOrUnloadRead = 32,
    LedCtrlWrite = 33,
    LedCtrlRead = 34,
    LedErrorWrite = 35,
    LedErrorRead = 36,
}

impl BusCommand {
    /// 读命令的应答载荷长度；写命令没有应答，返回 `None`
    pub const fn response_len(self) -> Option<usize> {
        match self {
            BusCommand::MoveTimeRead
            | BusCommand::MoveTimeWaitRead
            | BusCommand::AngleLimitRead
            | BusCommand::VinLimitRead
            | BusCommand::OrMotorModeRead => Some(4),
            BusCommand::VinRead | BusCommand::PosRead => Some(2),
            BusCommand::IdRead
            | BusCommand::AngleOffsetRead
            | BusCommand::TempMaxLimitRead
            | BusCommand::TempRead
            | BusCommand::LoadOrUnloadRead
            | BusCommand::LedCtrlRead
            | BusCommand::LedErrorRead => Some(1),
            _ => None,
        }
    }

    /// 是否为读命令（舵机会应答）
    pub const fn is_read(self) -> bool {
        self.response_len().is_some()
    }
}
