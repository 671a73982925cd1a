//! 笛卡尔目标点定位
//!
//! 高度 Z 通过高度表得到 alpha，水平面 (X, Y) 通过 [`bearing`] 得到 teta，
//! 然后一次性驱动 S3..S6。

use super::model::{ArmModel, Position, alpha_to_raw, bearing, bearing_to_raw};
use crate::error::ClientError;
use crate::types::Rad;
use std::thread;
use std::time::Duration;
use tracing::debug;
use xarm_driver::SharedController;
use xarm_protocol::{POSITION_MAX, ServoTarget};
use xarm_transport::Transport;

/// 定位时驱动的舵机（S3, S4, S5, S6）
pub const POSITION_SERVOS: [u8; 4] = [3, 4, 5, 6];

/// 一次定位的计算结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovePlan {
    /// 高度表下标
    pub alpha_index: usize,
    pub alpha: Rad,
    pub alpha_raw: u16,
    pub teta: Rad,
    pub teta_raw: u16,
}

impl MovePlan {
    /// S3..S6 的目标原始位置：`[1000 − alpha_raw, alpha_raw, alpha_raw, teta_raw]`
    pub fn targets(&self) -> [ServoTarget; 4] {
        let positions = [
            POSITION_MAX - self.alpha_raw,
            self.alpha_raw,
            self.alpha_raw,
            self.teta_raw,
        ];
        let mut targets = [ServoTarget::new(0, 0); 4];
        for ((target, id), position) in targets.iter_mut().zip(POSITION_SERVOS).zip(positions) {
            *target = ServoTarget::new(id, position);
        }
        targets
    }
}

/// 基于 [`ArmModel`] 的定位器
pub struct PositionMove<T: Transport> {
    model: ArmModel,
    controller: SharedController<T>,
}

impl<T: Transport> PositionMove<T> {
    pub fn new(model: ArmModel, controller: SharedController<T>) -> Self {
        Self { model, controller }
    }

    pub fn model(&self) -> &ArmModel {
        &self.model
    }

    /// 只计算，不发送
    pub fn plan(&self, position: &Position) -> MovePlan {
        let (alpha_index, alpha) = self.model.alpha_for_height(position.z);
        let teta = bearing(position.x, position.y);
        MovePlan {
            alpha_index,
            alpha,
            alpha_raw: alpha_to_raw(alpha),
            teta,
            teta_raw: bearing_to_raw(teta),
        }
    }

    /// 移动到目标点
    ///
    /// FIXME: 只有 S3..S6 参与定位，XY 平面上的距离没有参与计算，
    /// 到达的只是高度和方位上的近似点。
    pub fn move_to(&self, position: &Position, duration_ms: u16, wait: bool) -> Result<MovePlan, ClientError> {
        let plan = self.plan(position);
        debug!(
            "Positioning to ({}, {}, {}): alpha[{}] = {} -> {}, teta = {} -> {}",
            position.x,
            position.y,
            position.z,
            plan.alpha_index,
            plan.alpha,
            plan.alpha_raw,
            plan.teta,
            plan.teta_raw
        );
        self.controller.lock().set_positions(&plan.targets(), duration_ms, false)?;
        if wait {
            thread::sleep(Duration::from_millis(u64::from(duration_ms)));
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::HeightTable;
    use xarm_driver::Controller;
    use xarm_transport::MockTransport;

    fn positioner(mock: &MockTransport) -> PositionMove<MockTransport> {
        let model = ArmModel::new(0.0, 0.0, 10.0, 5.0).unwrap();
        let controller = Controller::new(mock.clone()).unwrap().into_shared();
        PositionMove::new(model, controller)
    }

    #[test]
    fn test_plan() {
        let mock = MockTransport::new();
        let mover = positioner(&mock);

        let plan = mover.plan(&Position::new(1.0, 0.0, 5.0));
        assert_eq!(plan.alpha_index, 0);
        assert_eq!(plan.alpha, Rad::ZERO);
        assert_eq!(plan.alpha_raw, 900);
        assert_eq!(plan.teta, Rad::ZERO);
        assert_eq!(plan.teta_raw, 300);

        let plan = mover.plan(&Position::new(0.0, 0.0, 100.0));
        assert_eq!(plan.alpha_index, 127);
        assert_eq!(plan.alpha, HeightTable::alpha(127));
        assert_eq!(plan.teta_raw, 300);
    }

    #[test]
    fn test_targets() {
        let plan = MovePlan {
            alpha_index: 64,
            alpha: HeightTable::alpha(64),
            alpha_raw: 700,
            teta: Rad::FRAC_PI_2,
            teta_raw: 500,
        };
        assert_eq!(
            plan.targets(),
            [
                ServoTarget::new(3, 300),
                ServoTarget::new(4, 700),
                ServoTarget::new(5, 700),
                ServoTarget::new(6, 500),
            ]
        );
    }

    #[test]
    fn test_move_to_writes_four_servos() {
        let mock = MockTransport::new();
        let mover = positioner(&mock);

        let plan = mover.move_to(&Position::new(1.0, 0.0, 5.0), 1000, false).unwrap();
        assert_eq!(plan.alpha_raw, 900);

        let frame = mock.last_write().unwrap();
        // 长度 = 3 + 4·3 + 2 = 17，命令 0x03，4 个舵机，1000 ms
        assert_eq!(&frame[..7], &[0x55, 0x55, 17, 0x03, 4, 0xE8, 0x03]);
        assert_eq!(
            &frame[7..19],
            &[
                3, 0x64, 0x00, // 100
                4, 0x84, 0x03, // 900
                5, 0x84, 0x03, // 900
                6, 0x2C, 0x01, // 300
            ]
        );
    }
}
