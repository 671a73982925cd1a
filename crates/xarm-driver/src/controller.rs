//! xArm 控制板控制器（固定槽协议）
//!
//! 控制板上的 6 个舵机编号为 S1~S6。位置为设备原始单位（通常 0~1000），
//! 时间单位为毫秒。

use crate::error::DriverError;
use crate::link::Link;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, warn};
use xarm_protocol::raw::{
    action_group_payload, check_servo_id, parse_battery_voltage, parse_positions, servo_move_payload,
    servo_select_payload,
};
use xarm_protocol::{
    Expect, RAW_SERVO_ENTRY_LEN, RAW_SERVO_ID_MAX, RAW_SERVO_ID_MIN, RawCodec, RawCommand, Request,
    ServoTarget,
};
use xarm_transport::Transport;

/// 读失败时 `*_or_sentinel` 系列方法返回的值
pub const SENTINEL: i32 = -1;

/// 多线程共享的控制器
pub type SharedController<T> = Arc<Mutex<Controller<T>>>;

/// xArm 控制板控制器
///
/// 构造时打开传输，`Drop` 时关闭。
pub struct Controller<T: Transport> {
    link: Link<T, RawCodec>,
}

impl<T: Transport> Controller<T> {
    /// 打开传输并创建控制器
    pub fn new(transport: T) -> Result<Self, DriverError> {
        let mut link = Link::new(transport, RawCodec);
        link.open()?;
        Ok(Self { link })
    }

    /// 包装为可共享的控制器
    pub fn into_shared(self) -> SharedController<T> {
        Arc::new(Mutex::new(self))
    }

    /// 关闭传输（幂等）
    pub fn close(&mut self) -> Result<(), DriverError> {
        self.link.close()
    }

    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    pub fn transport(&self) -> &T {
        self.link.transport()
    }

    /// 单个舵机定时运动
    ///
    /// `wait` 为 `true` 时阻塞到运动时间结束。
    pub fn set_position(&mut self, servo_id: u8, position: u16, duration_ms: u16, wait: bool) -> Result<(), DriverError> {
        self.set_positions(&[ServoTarget::new(servo_id, position)], duration_ms, wait)
    }

    /// 多个舵机同时定时运动（按调用方给出的顺序编码）
    pub fn set_positions(&mut self, targets: &[ServoTarget], duration_ms: u16, wait: bool) -> Result<(), DriverError> {
        if targets.is_empty() {
            return Err(DriverError::InvalidInput("no servo targets".into()));
        }
        for target in targets {
            check_servo_id(target.id)?;
        }
        let payload = servo_move_payload(duration_ms, targets)?;
        self.link
            .send(&Request::unaddressed(RawCommand::ServoMove, &payload))?;
        if wait {
            thread::sleep(Duration::from_millis(u64::from(duration_ms)));
        }
        Ok(())
    }

    /// 读取单个舵机位置
    pub fn position(&mut self, servo_id: u8) -> Result<u16, DriverError> {
        check_servo_id(servo_id)?;
        let ids = [servo_id];
        let payload = servo_select_payload(&ids)?;
        let expect = Expect::new(
            RawCommand::GetServoPosition,
            Some(servo_id),
            1 + RAW_SERVO_ENTRY_LEN,
        );
        let response = self
            .link
            .query(&Request::unaddressed(RawCommand::GetServoPosition, &payload), &expect)?;
        let positions = parse_positions(response, &ids)?;
        Ok(positions[0])
    }

    /// 一次读取多个舵机位置（结果顺序与 `servo_ids` 一致）
    pub fn positions(&mut self, servo_ids: &[u8]) -> Result<Vec<u16>, DriverError> {
        if servo_ids.is_empty() {
            return Err(DriverError::InvalidInput("no servo ids".into()));
        }
        for &id in servo_ids {
            check_servo_id(id)?;
        }
        let payload = servo_select_payload(servo_ids)?;
        let expect = Expect::new(
            RawCommand::GetServoPosition,
            None,
            1 + servo_ids.len() * RAW_SERVO_ENTRY_LEN,
        );
        let response = self
            .link
            .query(&Request::unaddressed(RawCommand::GetServoPosition, &payload), &expect)?;
        Ok(parse_positions(response, servo_ids)?)
    }

    /// 单个舵机掉电
    pub fn stop_servo(&mut self, servo_id: u8) -> Result<(), DriverError> {
        self.stop_servos(&[servo_id])
    }

    /// 多个舵机掉电
    pub fn stop_servos(&mut self, servo_ids: &[u8]) -> Result<(), DriverError> {
        if servo_ids.is_empty() {
            return Err(DriverError::InvalidInput("no servo ids".into()));
        }
        for &id in servo_ids {
            check_servo_id(id)?;
        }
        let payload = servo_select_payload(servo_ids)?;
        self.link
            .send(&Request::unaddressed(RawCommand::ServoStop, &payload))
    }

    /// S1~S6 全部掉电
    pub fn stop_all(&mut self) -> Result<(), DriverError> {
        let ids: Vec<u8> = (RAW_SERVO_ID_MIN..=RAW_SERVO_ID_MAX).collect();
        self.stop_servos(&ids)
    }

    /// 运行控制板上保存的动作组，`times` 为 0 时无限循环
    pub fn run_action_group(&mut self, group: u8, times: u16) -> Result<(), DriverError> {
        let payload = action_group_payload(group, times);
        self.link
            .send(&Request::unaddressed(RawCommand::ActionGroupRun, &payload))
    }

    pub fn stop_action_group(&mut self) -> Result<(), DriverError> {
        self.link
            .send(&Request::unaddressed(RawCommand::ActionGroupStop, &[]))
    }

    /// 设置动作组运行速度（百分比）
    pub fn set_action_group_speed(&mut self, group: u8, percent: u16) -> Result<(), DriverError> {
        let payload = action_group_payload(group, percent);
        self.link
            .send(&Request::unaddressed(RawCommand::ActionGroupSpeed, &payload))
    }

    /// 电池电压（毫伏）
    pub fn battery_voltage(&mut self) -> Result<u16, DriverError> {
        let expect = Expect::new(RawCommand::BatteryVoltage, None, 2);
        let response = self
            .link
            .query(&Request::unaddressed(RawCommand::BatteryVoltage, &[]), &expect)?;
        Ok(parse_battery_voltage(response)?)
    }

    /// 读取位置，失败时返回 [`SENTINEL`]
    pub fn position_or_sentinel(&mut self, servo_id: u8) -> i32 {
        self.position(servo_id)
            .map(i32::from)
            .unwrap_or_else(|e| degrade("position", e))
    }

    /// 批量读取位置，失败时每一项都是 [`SENTINEL`]
    pub fn positions_or_sentinel(&mut self, servo_ids: &[u8]) -> Vec<i32> {
        match self.positions(servo_ids) {
            Ok(positions) => positions.into_iter().map(i32::from).collect(),
            Err(e) => vec![degrade("positions", e); servo_ids.len()],
        }
    }

    /// 电池电压（毫伏），失败时返回 [`SENTINEL`]
    pub fn battery_or_sentinel(&mut self) -> i32 {
        self.battery_voltage()
            .map(i32::from)
            .unwrap_or_else(|e| degrade("battery voltage", e))
    }
}

fn degrade(what: &str, e: DriverError) -> i32 {
    warn!("Failed to read {}: {}, returning sentinel", what, e);
    SENTINEL
}

impl<T: Transport> Drop for Controller<T> {
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
    use xarm_transport::{MockTransport, TransportDeviceErrorKind};

    fn response(command: u8, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0u8; 64];
        bytes[0] = 0x55;
        bytes[1] = 0x55;
        bytes[2] = (payload.len() + 2) as u8;
        bytes[3] = command;
        bytes[4..4 + payload.len()].copy_from_slice(payload);
        bytes
    }

    fn controller() -> (Controller<MockTransport>, MockTransport) {
        let mock = MockTransport::new();
        let controller = Controller::new(mock.clone()).unwrap();
        (controller, mock)
    }

    #[test]
    fn test_new_opens_and_drop_closes() {
        let mock = MockTransport::new();
        {
            let controller = Controller::new(mock.clone()).unwrap();
            assert!(controller.is_open());
            assert_eq!(mock.open_count(), 1);
        }
        assert_eq!(mock.close_count(), 1);
        assert!(!mock.is_open());
    }

    #[test]
    fn test_open_failure_propagates() {
        let mock = MockTransport::new();
        mock.fail_next_open(TransportDeviceErrorKind::AccessDenied);
        let err = Controller::new(mock).err().unwrap();
        assert!(matches!(err, DriverError::Transport(e) if e.is_fatal()));
    }

    #[test]
    fn test_explicit_close_then_drop() {
        let (mut controller, mock) = controller();
        controller.close().unwrap();
        drop(controller);
        assert_eq!(mock.close_count(), 1);
    }

    #[test]
    fn test_set_position_frame() {
        let (mut controller, mock) = controller();
        controller.set_position(3, 500, 1000, false).unwrap();
        let written = mock.last_write().unwrap();
        assert_eq!(
            &written[..10],
            &[0x55, 0x55, 0x08, 0x03, 0x01, 0xE8, 0x03, 0x03, 0xF4, 0x01]
        );
    }

    #[test]
    fn test_set_positions_rejects_bad_id_before_write() {
        let (mut controller, mock) = controller();
        let err = controller
            .set_positions(&[ServoTarget::new(1, 100), ServoTarget::new(7, 100)], 500, false)
            .unwrap_err();
        assert!(matches!(
            err,
            DriverError::Protocol(ProtocolError::ParameterOutOfRange { argument: "servo_id", .. })
        ));
        assert!(mock.writes().is_empty());
    }

    #[test]
    fn test_set_positions_empty() {
        let (mut controller, _) = controller();
        assert!(matches!(
            controller.set_positions(&[], 500, false),
            Err(DriverError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_position_read() {
        let (mut controller, mock) = controller();
        mock.push_response(response(0x15, &[1, 2, 0xF4, 0x01]));
        assert_eq!(controller.position(2).unwrap(), 500);
        assert_eq!(&mock.last_write().unwrap()[..6], &[0x55, 0x55, 0x04, 0x15, 0x01, 0x02]);
    }

    #[test]
    fn test_position_wrong_echo() {
        let (mut controller, mock) = controller();
        mock.push_response(response(0x15, &[1, 3, 0xF4, 0x01]));
        let err = controller.position(2).unwrap_err();
        assert!(matches!(
            err,
            DriverError::Protocol(ProtocolError::ProtocolMismatch { field: "servo_id", .. })
        ));
    }

    #[test]
    fn test_positions_read() {
        let (mut controller, mock) = controller();
        mock.push_response(response(0x15, &[2, 1, 0x64, 0x00, 6, 0x84, 0x03]));
        assert_eq!(controller.positions(&[1, 6]).unwrap(), vec![100, 900]);
        assert_eq!(&mock.last_write().unwrap()[..7], &[0x55, 0x55, 0x05, 0x15, 2, 1, 6]);
    }

    #[test]
    fn test_stop_frames() {
        let (mut controller, mock) = controller();
        controller.stop_servo(4).unwrap();
        assert_eq!(&mock.last_write().unwrap()[..6], &[0x55, 0x55, 0x04, 0x14, 1, 4]);

        controller.stop_all().unwrap();
        assert_eq!(
            &mock.last_write().unwrap()[..11],
            &[0x55, 0x55, 0x09, 0x14, 6, 1, 2, 3, 4, 5, 6]
        );
    }

    #[test]
    fn test_action_group_frames() {
        let (mut controller, mock) = controller();
        controller.run_action_group(2, 3).unwrap();
        assert_eq!(&mock.last_write().unwrap()[..7], &[0x55, 0x55, 0x05, 0x06, 2, 3, 0]);

        controller.set_action_group_speed(2, 150).unwrap();
        assert_eq!(&mock.last_write().unwrap()[..7], &[0x55, 0x55, 0x05, 0x0B, 2, 150, 0]);

        controller.stop_action_group().unwrap();
        assert_eq!(&mock.last_write().unwrap()[..4], &[0x55, 0x55, 0x02, 0x07]);
    }

    #[test]
    fn test_battery_voltage() {
        let (mut controller, mock) = controller();
        mock.push_response(response(0x0F, &[0x7C, 0x1E]));
        assert_eq!(controller.battery_voltage().unwrap(), 7804);
    }

    #[test]
    fn test_sentinels() {
        let (mut controller, mock) = controller();
        mock.push_timeout();
        assert_eq!(controller.position_or_sentinel(1), SENTINEL);

        mock.push_response(response(0x0F, &[0x7C, 0x1E]));
        assert_eq!(controller.battery_or_sentinel(), 7804);

        mock.push_response(vec![0x00, 0x55, 0x04]);
        assert_eq!(controller.positions_or_sentinel(&[1, 2, 3]), vec![SENTINEL; 3]);

        mock.push_timeout();
        assert_eq!(controller.battery_or_sentinel(), SENTINEL);
    }

    #[test]
    fn test_no_response_is_distinct() {
        let (mut controller, mock) = controller();
        mock.push_timeout();
        let err = controller.battery_voltage().unwrap_err();
        assert!(err.is_no_response());

        mock.push_response(response(0x15, &[0x7C, 0x1E]));
        let err = controller.battery_voltage().unwrap_err();
        assert!(!err.is_no_response());
    }

    #[test]
    fn test_shared_controller() {
        let (controller, mock) = controller();
        let shared = controller.into_shared();
        let worker = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || shared.lock().stop_servo(1))
        };
        worker.join().unwrap().unwrap();
        assert_eq!(mock.writes().len(), 1);
    }
}
