//! LewanSoul / Hiwonder 串口总线舵机控制器
//!
//! 每个舵机按 ID（0~253）寻址，254 为广播地址。写命令没有应答；
//! 读命令必须发给单个舵机（广播读只用于 ID_READ，要求总线上只接一个舵机）。
//!
//! 所有带范围的写参数都在写入前检查，越界时返回
//! `ProtocolError::ParameterOutOfRange`，不会产生任何 IO。

use crate::error::DriverError;
use crate::link::Link;
use tracing::{error, warn};
use xarm_protocol::bus::{
    angle_limit_payload, angle_offset_payload, max_temperature_payload, motor_mode_payload,
    move_time_payload, parse_alarm, parse_i8, parse_motor_mode, parse_position, parse_switch,
    parse_u16, parse_u16_pair, parse_u8, servo_id_payload, switch_payload, vin_limit_payload,
};
use xarm_protocol::{Alarm, BROADCAST_ID, BusCodec, BusCommand, Expect, MotorMode, Request};
use xarm_transport::Transport;

/// 总线舵机控制器
pub struct ServoBus<T: Transport> {
    link: Link<T, BusCodec>,
}

impl<T: Transport> ServoBus<T> {
    /// 打开传输并创建控制器
    pub fn new(transport: T) -> Result<Self, DriverError> {
        let mut link = Link::new(transport, BusCodec);
        link.open()?;
        Ok(Self { link })
    }

    pub fn close(&mut self) -> Result<(), DriverError> {
        self.link.close()
    }

    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    pub fn transport(&self) -> &T {
        self.link.transport()
    }

    fn write(&mut self, servo_id: u8, command: BusCommand, payload: &[u8]) -> Result<(), DriverError> {
        self.link
            .send(&Request::addressed(command, servo_id, payload))
    }

    fn read(&mut self, servo_id: u8, command: BusCommand) -> Result<&[u8], DriverError> {
        let payload_len = command
            .response_len()
            .ok_or_else(|| DriverError::InvalidInput(format!("{:?} has no response", command)))?;
        let expect = Expect::new(command, Some(servo_id), payload_len);
        self.link
            .query(&Request::addressed(command, servo_id, &[]), &expect)
    }

    // ------------------------------------------------------------------------
    // 运动
    // ------------------------------------------------------------------------

    /// 在 `time_ms` 内转到 `position`（立即执行）
    pub fn move_to(&mut self, servo_id: u8, position: u16, time_ms: u16) -> Result<(), DriverError> {
        let payload = move_time_payload(position, time_ms)?;
        self.write(servo_id, BusCommand::MoveTimeWrite, &payload)
    }

    /// 广播：所有舵机转到同一位置
    pub fn move_all(&mut self, position: u16, time_ms: u16) -> Result<(), DriverError> {
        self.move_to(BROADCAST_ID, position, time_ms)
    }

    /// 预置运动参数，等待 [`start_move`](Self::start_move) 触发
    pub fn prepare_move(&mut self, servo_id: u8, position: u16, time_ms: u16) -> Result<(), DriverError> {
        let payload = move_time_payload(position, time_ms)?;
        self.write(servo_id, BusCommand::MoveTimeWaitWrite, &payload)
    }

    pub fn prepare_move_all(&mut self, position: u16, time_ms: u16) -> Result<(), DriverError> {
        self.prepare_move(BROADCAST_ID, position, time_ms)
    }

    pub fn start_move(&mut self, servo_id: u8) -> Result<(), DriverError> {
        self.write(servo_id, BusCommand::MoveStart, &[])
    }

    pub fn start_all(&mut self) -> Result<(), DriverError> {
        self.start_move(BROADCAST_ID)
    }

    pub fn stop_move(&mut self, servo_id: u8) -> Result<(), DriverError> {
        self.write(servo_id, BusCommand::MoveStop, &[])
    }

    pub fn stop_all(&mut self) -> Result<(), DriverError> {
        self.stop_move(BROADCAST_ID)
    }

    /// 最近一次 MOVE_TIME_WRITE 的参数：`(position, time_ms)`
    pub fn read_move_time(&mut self, servo_id: u8) -> Result<(u16, u16), DriverError> {
        let payload = self.read(servo_id, BusCommand::MoveTimeRead)?;
        Ok(parse_u16_pair(payload)?)
    }

    /// 预置但尚未触发的运动参数：`(position, time_ms)`
    pub fn read_prepared_move(&mut self, servo_id: u8) -> Result<(u16, u16), DriverError> {
        let payload = self.read(servo_id, BusCommand::MoveTimeWaitRead)?;
        Ok(parse_u16_pair(payload)?)
    }

    /// 当前位置（舵机越过零点时可能略小于 0）
    pub fn read_position(&mut self, servo_id: u8) -> Result<i16, DriverError> {
        let payload = self.read(servo_id, BusCommand::PosRead)?;
        Ok(parse_position(payload)?)
    }

    // ------------------------------------------------------------------------
    // ID 与偏差
    // ------------------------------------------------------------------------

    /// 修改舵机 ID（写入后立即生效并掉电保存）
    pub fn write_servo_id(&mut self, current_id: u8, new_id: u8) -> Result<(), DriverError> {
        let payload = servo_id_payload(new_id)?;
        self.write(current_id, BusCommand::IdWrite, &payload)
    }

    /// 通过广播读取 ID：总线上只能接一个舵机
    pub fn read_servo_id(&mut self) -> Result<u8, DriverError> {
        let payload = self.read(BROADCAST_ID, BusCommand::IdRead)?;
        Ok(parse_u8(payload)?)
    }

    /// 调整角度偏差（立即生效，掉电不保存）
    pub fn adjust_angle_offset(&mut self, servo_id: u8, offset: i8) -> Result<(), DriverError> {
        let payload = angle_offset_payload(offset)?;
        self.write(servo_id, BusCommand::AngleOffsetAdjust, &payload)
    }

    /// 调整角度偏差并掉电保存
    pub fn write_angle_offset(&mut self, servo_id: u8, offset: i8) -> Result<(), DriverError> {
        self.adjust_angle_offset(servo_id, offset)?;
        self.write(servo_id, BusCommand::AngleOffsetWrite, &[])
    }

    pub fn read_angle_offset(&mut self, servo_id: u8) -> Result<i8, DriverError> {
        let payload = self.read(servo_id, BusCommand::AngleOffsetRead)?;
        Ok(parse_i8(payload)?)
    }

    // ------------------------------------------------------------------------
    // 限位
    // ------------------------------------------------------------------------

    pub fn write_angle_limit(&mut self, servo_id: u8, min_angle: u16, max_angle: u16) -> Result<(), DriverError> {
        let payload = angle_limit_payload(min_angle, max_angle)?;
        self.write(servo_id, BusCommand::AngleLimitWrite, &payload)
    }

    /// `(min, max)` 原始位置
    pub fn read_angle_limit(&mut self, servo_id: u8) -> Result<(u16, u16), DriverError> {
        let payload = self.read(servo_id, BusCommand::AngleLimitRead)?;
        Ok(parse_u16_pair(payload)?)
    }

    /// 输入电压限制（毫伏）
    pub fn write_vin_limit(&mut self, servo_id: u8, min_mv: u16, max_mv: u16) -> Result<(), DriverError> {
        let payload = vin_limit_payload(min_mv, max_mv)?;
        self.write(servo_id, BusCommand::VinLimitWrite, &payload)
    }

    /// `(min_mv, max_mv)`
    pub fn read_vin_limit(&mut self, servo_id: u8) -> Result<(u16, u16), DriverError> {
        let payload = self.read(servo_id, BusCommand::VinLimitRead)?;
        Ok(parse_u16_pair(payload)?)
    }

    /// 最高温度限制（摄氏度）
    pub fn write_max_temperature_limit(&mut self, servo_id: u8, celsius: u8) -> Result<(), DriverError> {
        let payload = max_temperature_payload(celsius)?;
        self.write(servo_id, BusCommand::TempMaxLimitWrite, &payload)
    }

    pub fn read_max_temperature_limit(&mut self, servo_id: u8) -> Result<u8, DriverError> {
        let payload = self.read(servo_id, BusCommand::TempMaxLimitRead)?;
        Ok(parse_u8(payload)?)
    }

    // ------------------------------------------------------------------------
    // 遥测
    // ------------------------------------------------------------------------

    /// 当前温度（摄氏度）
    pub fn read_temperature(&mut self, servo_id: u8) -> Result<u8, DriverError> {
        let payload = self.read(servo_id, BusCommand::TempRead)?;
        Ok(parse_u8(payload)?)
    }

    /// 当前输入电压（毫伏）
    pub fn read_vin(&mut self, servo_id: u8) -> Result<u16, DriverError> {
        let payload = self.read(servo_id, BusCommand::VinRead)?;
        Ok(parse_u16(payload)?)
    }

    /// 当前位置，读失败时返回 -1
    pub fn position_or_sentinel(&mut self, servo_id: u8) -> i32 {
        match self.read_position(servo_id) {
            Ok(position) => i32::from(position),
            Err(e) => {
                warn!("Failed to read position of servo {}: {}, returning sentinel", servo_id, e);
                crate::controller::SENTINEL
            },
        }
    }

    // ------------------------------------------------------------------------
    // 工作模式、扭矩、LED
    // ------------------------------------------------------------------------

    /// 切换到连续旋转模式，`speed` 范围 -1000~1000
    pub fn set_motor_mode(&mut self, servo_id: u8, speed: i16) -> Result<(), DriverError> {
        let payload = motor_mode_payload(MotorMode::Motor { speed })?;
        self.write(servo_id, BusCommand::OrMotorModeWrite, &payload)
    }

    /// 切换回位置伺服模式
    pub fn set_servo_mode(&mut self, servo_id: u8) -> Result<(), DriverError> {
        let payload = motor_mode_payload(MotorMode::Servo)?;
        self.write(servo_id, BusCommand::OrMotorModeWrite, &payload)
    }

    pub fn read_motor_mode(&mut self, servo_id: u8) -> Result<MotorMode, DriverError> {
        let payload = self.read(servo_id, BusCommand::OrMotorModeRead)?;
        Ok(parse_motor_mode(payload)?)
    }

    /// 上电（有扭矩）或掉电（可手动转动）
    pub fn set_torque(&mut self, servo_id: u8, enabled: bool) -> Result<(), DriverError> {
        self.write(servo_id, BusCommand::LoadOrUnloadWrite, &switch_payload(enabled))
    }

    pub fn is_torque_enabled(&mut self, servo_id: u8) -> Result<bool, DriverError> {
        let payload = self.read(servo_id, BusCommand::LoadOrUnloadRead)?;
        Ok(parse_switch(payload)?)
    }

    /// 设置 LED（舵机侧 0 = 常亮，1 = 熄灭）
    pub fn set_led(&mut self, servo_id: u8, on: bool) -> Result<(), DriverError> {
        self.write(servo_id, BusCommand::LedCtrlWrite, &switch_payload(!on))
    }

    pub fn led(&mut self, servo_id: u8) -> Result<bool, DriverError> {
        let payload = self.read(servo_id, BusCommand::LedCtrlRead)?;
        Ok(!parse_switch(payload)?)
    }

    /// 设置哪些故障会让 LED 闪烁报警
    pub fn set_alarm(&mut self, servo_id: u8, alarm: Alarm) -> Result<(), DriverError> {
        self.write(servo_id, BusCommand::LedErrorWrite, &[u8::from(alarm)])
    }

    pub fn alarm(&mut self, servo_id: u8) -> Result<Alarm, DriverError> {
        let payload = self.read(servo_id, BusCommand::LedErrorRead)?;
        Ok(parse_alarm(payload)?)
    }
}

impl<T: Transport> Drop for ServoBus<T> {
    fn drop(&mut self) {
        if let Err(e) = self.link.close() {
            error!("Failed to close transport: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xarm_protocol::ProtocolError;
    use xarm_protocol::bus::checksum;
    use xarm_transport::MockTransport;

    /// 构造一帧舵机应答
    fn reply(servo_id: u8, command: BusCommand, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x55, 0x55, servo_id, (payload.len() + 3) as u8, u8::from(command)];
        bytes.extend_from_slice(payload);
        bytes.push(checksum(&bytes[2..]));
        bytes
    }

    fn bus() -> (ServoBus<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        let bus = ServoBus::new(mock.clone()).unwrap();
        (bus, mock)
    }

    #[test]
    fn test_move_to_frame() {
        let (mut bus, mock) = bus();
        bus.move_to(1, 500, 1000).unwrap();
        let sum: u32 = 1 + 7 + 1 + 0xF4 + 0x01 + 0xE8 + 0x03;
        assert_eq!(
            mock.last_write().unwrap(),
            vec![0x55, 0x55, 0x01, 0x07, 0x01, 0xF4, 0x01, 0xE8, 0x03, !(sum as u8)]
        );
    }

    #[test]
    fn test_broadcast_commands() {
        let (mut bus, mock) = bus();
        bus.move_all(0, 0).unwrap();
        bus.prepare_move_all(1000, 30_000).unwrap();
        bus.start_all().unwrap();
        bus.stop_all().unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 4);
        assert!(writes.iter().all(|w| w[2] == BROADCAST_ID));
        assert_eq!(writes[1][4], u8::from(BusCommand::MoveTimeWaitWrite));
        assert_eq!(writes[2][4], u8::from(BusCommand::MoveStart));
        assert_eq!(writes[3][4], u8::from(BusCommand::MoveStop));
    }

    #[test]
    fn test_out_of_range_rejected_before_write() {
        let (mut bus, mock) = bus();
        assert!(bus.move_to(1, 1001, 0).is_err());
        assert!(bus.move_to(1, 0, 30_001).is_err());
        let err = bus.write_angle_limit(1, 1200, 1000).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Protocol(ProtocolError::ParameterOutOfRange { argument: "min_angle", .. })
        ));
        assert!(bus.write_vin_limit(1, 4000, 12_000).is_err());
        assert!(bus.write_max_temperature_limit(1, 120).is_err());
        assert!(bus.write_angle_offset(1, 127).is_err());
        assert!(bus.set_motor_mode(1, -1001).is_err());
        assert!(bus.write_servo_id(1, BROADCAST_ID).is_err());
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_read_position() {
        let (mut bus, mock) = bus();
        mock.push_response(reply(2, BusCommand::PosRead, &[0xF4, 0x01]));
        assert_eq!(bus.read_position(2).unwrap(), 500);

        // 读请求不带载荷
        let request = mock.last_write().unwrap();
        assert_eq!(request.len(), 6);
        assert_eq!(&request[..5], &[0x55, 0x55, 0x02, 0x03, 28]);
    }

    #[test]
    fn test_read_position_wrong_servo() {
        let (mut bus, mock) = bus();
        mock.push_response(reply(3, BusCommand::PosRead, &[0xF4, 0x01]));
        let err = bus.read_position(2).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Protocol(ProtocolError::InvalidServoId { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_read_position_corrupted() {
        let (mut bus, mock) = bus();
        let mut bytes = reply(2, BusCommand::PosRead, &[0xF4, 0x01]);
        bytes[5] ^= 0x01;
        mock.push_response(bytes);
        let err = bus.read_position(2).unwrap_err();
        assert!(matches!(err, DriverError::Protocol(ProtocolError::ChecksumMismatch { .. })));
    }

    #[test]
    fn test_read_servo_id_broadcast() {
        let (mut bus, mock) = bus();
        mock.push_response(reply(9, BusCommand::IdRead, &[9]));
        assert_eq!(bus.read_servo_id().unwrap(), 9);
        assert_eq!(mock.last_write().unwrap()[2], BROADCAST_ID);
    }

    #[test]
    fn test_write_servo_id() {
        let (mut bus, mock) = bus();
        bus.write_servo_id(1, 5).unwrap();
        let request = mock.last_write().unwrap();
        assert_eq!(request[2], 1);
        assert_eq!(request[4], u8::from(BusCommand::IdWrite));
        assert_eq!(request[5], 5);
    }

    #[test]
    fn test_write_angle_offset_adjusts_then_stores() {
        let (mut bus, mock) = bus();
        bus.write_angle_offset(1, -20).unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0][4], u8::from(BusCommand::AngleOffsetAdjust));
        assert_eq!(writes[0][5], (-20i8) as u8);
        assert_eq!(writes[1][4], u8::from(BusCommand::AngleOffsetWrite));
    }

    #[test]
    fn test_limit_reads() {
        let (mut bus, mock) = bus();
        mock.push_response(reply(1, BusCommand::AngleLimitRead, &[0x64, 0x00, 0x84, 0x03]));
        assert_eq!(bus.read_angle_limit(1).unwrap(), (100, 900));

        mock.push_response(reply(1, BusCommand::VinLimitRead, &[0x94, 0x11, 0xE0, 0x2E]));
        assert_eq!(bus.read_vin_limit(1).unwrap(), (4500, 12_000));

        mock.push_response(reply(1, BusCommand::TempMaxLimitRead, &[85]));
        assert_eq!(bus.read_max_temperature_limit(1).unwrap(), 85);

        mock.push_response(reply(1, BusCommand::AngleOffsetRead, &[0xF6]));
        assert_eq!(bus.read_angle_offset(1).unwrap(), -10);
    }

    #[test]
    fn test_telemetry_reads() {
        let (mut bus, mock) = bus();
        mock.push_response(reply(1, BusCommand::TempRead, &[41]));
        assert_eq!(bus.read_temperature(1).unwrap(), 41);

        mock.push_response(reply(1, BusCommand::VinRead, &[0x10, 0x27]));
        assert_eq!(bus.read_vin(1).unwrap(), 10_000);

        mock.push_response(reply(1, BusCommand::MoveTimeRead, &[0xF4, 0x01, 0xE8, 0x03]));
        assert_eq!(bus.read_move_time(1).unwrap(), (500, 1000));

        mock.push_response(reply(1, BusCommand::MoveTimeWaitRead, &[0x00, 0x00, 0x64, 0x00]));
        assert_eq!(bus.read_prepared_move(1).unwrap(), (0, 100));
    }

    #[test]
    fn test_mode_torque_led_alarm() {
        let (mut bus, mock) = bus();

        bus.set_motor_mode(1, 500).unwrap();
        assert_eq!(&mock.last_write().unwrap()[5..9], &[1, 0, 0xF4, 0x01]);
        mock.push_response(reply(1, BusCommand::OrMotorModeRead, &[1, 0, 0xF4, 0x01]));
        assert_eq!(bus.read_motor_mode(1).unwrap(), MotorMode::Motor { speed: 500 });

        bus.set_servo_mode(1).unwrap();
        assert_eq!(&mock.last_write().unwrap()[5..9], &[0, 0, 0, 0]);

        bus.set_torque(1, true).unwrap();
        assert_eq!(mock.last_write().unwrap()[5], 1);
        mock.push_response(reply(1, BusCommand::LoadOrUnloadRead, &[0]));
        assert!(!bus.is_torque_enabled(1).unwrap());

        bus.set_led(1, true).unwrap();
        assert_eq!(mock.last_write().unwrap()[5], 0);
        mock.push_response(reply(1, BusCommand::LedCtrlRead, &[1]));
        assert!(!bus.led(1).unwrap());

        bus.set_alarm(1, Alarm::LockedRotor).unwrap();
        assert_eq!(mock.last_write().unwrap()[5], 4);
        mock.push_response(reply(1, BusCommand::LedErrorRead, &[3]));
        assert_eq!(bus.alarm(1).unwrap(), Alarm::OverTemperatureAndOverVoltage);
    }

    #[test]
    fn test_position_or_sentinel() {
        let (mut bus, mock) = bus();
        mock.push_timeout();
        assert_eq!(bus.position_or_sentinel(1), -1);
        mock.push_response(reply(1, BusCommand::PosRead, &[0xF6, 0xFF]));
        assert_eq!(bus.position_or_sentinel(1), -10);
    }

    #[test]
    fn test_drop_closes() {
        let mock = MockTransport::new();
        drop(ServoBus::new(mock.clone()).unwrap());
        assert_eq!(mock.close_count(), 1);
    }
}
