//! 机械臂几何模型
//!
//! 高度表：`alpha_i = (i/128)(π/2)`，
//! `Pz[i] = L4 + L3·sin(alpha_i) − L2·cos(2·alpha_i) − L1·sin(3·alpha_i)`。
//! 由目标高度 Z 反查 alpha 时线性扫描整张表，不假设单调。

use crate::error::ClientError;
use crate::types::Rad;
use std::f64::consts::{FRAC_PI_2, PI};
use xarm_protocol::POSITION_MAX;

/// 高度表采样点数
pub const HEIGHT_TABLE_LEN: usize = 128;

/// 笛卡尔目标点（单位与连杆长度一致）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// 四分之一圈上的 Z 高度采样
#[derive(Debug, Clone, PartialEq)]
pub struct HeightTable {
    samples: [f64; HEIGHT_TABLE_LEN],
}

impl HeightTable {
    fn build(l1: f64, l2: f64, l3: f64, l4: f64) -> Self {
        let mut samples = [0.0; HEIGHT_TABLE_LEN];
        for (i, sample) in samples.iter_mut().enumerate() {
            let a = Self::alpha(i).value();
            *sample = l4 + l3 * a.sin() - l2 * (2.0 * a).cos() - l1 * (3.0 * a).sin();
        }
        Self { samples }
    }

    /// 第 `i` 个采样点对应的 alpha
    pub fn alpha(i: usize) -> Rad {
        Rad(i as f64 / HEIGHT_TABLE_LEN as f64 * FRAC_PI_2)
    }

    pub fn get(&self, i: usize) -> Option<f64> {
        self.samples.get(i).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.samples
    }

    /// 第一个满足 `z <= Pz[i]` 的下标，全部不满足时返回最后一个下标
    pub fn index_for_height(&self, z: f64) -> usize {
        self.samples
            .iter()
            .position(|&pz| z <= pz)
            .unwrap_or(HEIGHT_TABLE_LEN - 1)
    }
}

/// 连杆长度 L1..L4 及其高度表
#[derive(Debug, Clone, PartialEq)]
pub struct ArmModel {
    lengths: [f64; 4],
    table: HeightTable,
}

impl ArmModel {
    /// 创建模型并预先计算高度表
    pub fn new(l1: f64, l2: f64, l3: f64, l4: f64) -> Result<Self, ClientError> {
        let lengths = [l1, l2, l3, l4];
        if let Some((i, len)) = lengths
            .iter()
            .enumerate()
            .find(|(_, len)| !len.is_finite() || **len < 0.0)
        {
            return Err(ClientError::InvalidArmModel(format!(
                "link length L{} must be a non-negative finite number, got {}",
                i + 1,
                len
            )));
        }
        Ok(Self {
            lengths,
            table: HeightTable::build(l1, l2, l3, l4),
        })
    }

    pub fn lengths(&self) -> [f64; 4] {
        self.lengths
    }

    pub fn height_table(&self) -> &HeightTable {
        &self.table
    }

    /// 目标高度对应的 (下标, alpha)
    pub fn alpha_for_height(&self, z: f64) -> (usize, Rad) {
        let i = self.table.index_for_height(z);
        (i, HeightTable::alpha(i))
    }
}

/// alpha → 原始位置：`round(900 − alpha/(π/2)·400)`，限幅到 0~1000
pub fn alpha_to_raw(alpha: Rad) -> u16 {
    let raw = (900.0 - alpha.value() / FRAC_PI_2 * 400.0).round();
    raw.clamp(0.0, f64::from(POSITION_MAX)) as u16
}

/// 水平面方位角 teta
///
/// `|x| >= |y|` 时取 `atan(y/x)`，否则取 `π/2 − atan(x/y)`。
/// 这不是 atan2：x 取负时结果不区分象限。原点返回 0。
pub fn bearing(x: f64, y: f64) -> Rad {
    if x == 0.0 && y == 0.0 {
        return Rad::ZERO;
    }
    if x.abs() >= y.abs() {
        Rad((y / x).atan())
    } else {
        Rad(FRAC_PI_2 - (x / y).atan())
    }
}

/// teta → 底座舵机原始位置：限幅到 `[−π/2, π/2]` 后
/// `(teta + π/2)/(2π)·800 + 100`，截断取整
pub fn bearing_to_raw(teta: Rad) -> u16 {
    let teta = teta.clamp(-Rad::FRAC_PI_2, Rad::FRAC_PI_2).value();
    ((teta + FRAC_PI_2) / (2.0 * PI) * 800.0 + 100.0) as u16
}
