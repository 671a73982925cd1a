//! 运动映射
//!
//! - `model`: 连杆模型、高度表、方位角
//! - `position_move`: 笛卡尔目标点 → S3..S6 原始位置

pub mod model;
pub mod position_move;

pub use model::{ArmModel, HEIGHT_TABLE_LEN, HeightTable, Position, alpha_to_raw, bearing, bearing_to_raw};
pub use position_move::{MovePlan, POSITION_SERVOS, PositionMove};
