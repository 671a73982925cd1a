//! 角度级舵机控制
//!
//! [`ServoDefinition`] 描述一个舵机的物理角度范围，原始位置 0~1000 线性映射到
//! `[min_angle, max_angle]`。[`ServoMotor`] 通过共享控制器按角度读写位置。

use crate::error::ClientError;
use crate::types::Deg;
use std::thread;
use std::time::Duration;
use tracing::warn;
use xarm_driver::SharedController;
use xarm_protocol::{POSITION_MAX, raw::check_servo_id};
use xarm_transport::Transport;

/// 读失败时 [`ServoMotor::position_or_sentinel`] 返回的值
pub const ANGLE_SENTINEL: i32 = i32::MIN;

/// 舵机定义：舵机号 + 角度范围
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServoDefinition {
    servo_id: u8,
    min_angle: Deg,
    max_angle: Deg,
}

impl ServoDefinition {
    /// 创建舵机定义（要求 `min_angle < max_angle`，舵机号 1~6）
    pub fn new(servo_id: u8, min_angle: Deg, max_angle: Deg) -> Result<Self, ClientError> {
        check_servo_id(servo_id).map_err(xarm_driver::DriverError::from)?;
        let valid = min_angle.value().is_finite() && max_angle.value().is_finite() && min_angle < max_angle;
        if !valid {
            return Err(ClientError::InvalidServoDefinition {
                servo_id,
                min_angle,
                max_angle,
            });
        }
        Ok(Self {
            servo_id,
            min_angle,
            max_angle,
        })
    }

    pub fn servo_id(&self) -> u8 {
        self.servo_id
    }

    pub fn min_angle(&self) -> Deg {
        self.min_angle
    }

    pub fn max_angle(&self) -> Deg {
        self.max_angle
    }

    /// 角度 → 原始位置：`round(1000 * (clamp(angle) - min) / (max - min))`
    ///
    /// 超出范围的角度先限幅，因此结果总在 0~1000。
    pub fn angle_to_raw(&self, angle: Deg) -> u16 {
        let angle = angle.clamp(self.min_angle, self.max_angle);
        let ratio = (angle - self.min_angle) / (self.max_angle - self.min_angle);
        (ratio * f64::from(POSITION_MAX)).round() as u16
    }

    /// 原始位置 → 角度：`clamp(raw, 0, 1000) / 1000 * (max - min) + min`
    pub fn raw_to_angle(&self, raw: i32) -> Deg {
        let raw = raw.clamp(0, i32::from(POSITION_MAX));
        let span = self.max_angle - self.min_angle;
        span * (f64::from(raw) / f64::from(POSITION_MAX)) + self.min_angle
    }
}

/// 通过共享控制器按角度驱动的舵机
pub struct ServoMotor<T: Transport> {
    definition: ServoDefinition,
    controller: SharedController<T>,
}

impl<T: Transport> ServoMotor<T> {
    pub fn new(definition: ServoDefinition, controller: SharedController<T>) -> Self {
        Self {
            definition,
            controller,
        }
    }

    pub fn definition(&self) -> &ServoDefinition {
        &self.definition
    }

    /// 当前角度
    pub fn position(&self) -> Result<Deg, ClientError> {
        let raw = self.controller.lock().position(self.definition.servo_id)?;
        Ok(self.definition.raw_to_angle(i32::from(raw)))
    }

    /// 当前角度（取整到度），读失败时返回 [`ANGLE_SENTINEL`]
    pub fn position_or_sentinel(&self) -> i32 {
        match self.position() {
            Ok(angle) => angle.value() as i32,
            Err(e) => {
                warn!(
                    "Failed to read servo {}: {}, returning sentinel",
                    self.definition.servo_id, e
                );
                ANGLE_SENTINEL
            },
        }
    }

    /// 转到指定角度
    ///
    /// `wait` 为 `true` 时在释放控制器锁之后再等待运动结束，
    /// 其他线程可以在等待期间使用同一个控制器。
    pub fn set_position(&self, angle: Deg, duration_ms: u16, wait: bool) -> Result<(), ClientError> {
        let raw = self.definition.angle_to_raw(angle);
        self.controller
            .lock()
            .set_position(self.definition.servo_id, raw, duration_ms, false)?;
        if wait {
            thread::sleep(Duration::from_millis(u64::from(duration_ms)));
        }
        Ok(())
    }
}
