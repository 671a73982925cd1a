//! # xArm Client
//!
//! 面向用户的上层接口：
//! - 强类型单位（[`Rad`]、[`Deg`]）
//! - 角度级舵机控制（[`ServoMotor`]）
//! - 高度表与方位角定位（[`PositionMove`]）
//!
//! 需要直接发送帧或使用总线舵机时，使用 [`xarm_driver`]。

pub mod error;
pub mod kinematics;
pub mod servo;
pub mod types;

pub use error::ClientError;
pub use kinematics::{ArmModel, HeightTable, MovePlan, Position, PositionMove};
pub use servo::{ANGLE_SENTINEL, ServoDefinition, ServoMotor};
pub use types::*;
