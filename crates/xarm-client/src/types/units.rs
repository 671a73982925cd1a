//! 强类型单位系统
//!
//! 使用 NewType 模式区分弧度与角度，避免舵机映射和运动学计算中单位混用。
//!
//! ```rust
//! use xarm_client::types::{Deg, Rad};
//!
//! let quarter = Rad::FRAC_PI_2;
//! assert!((quarter.to_deg().value() - 90.0).abs() < 1e-9);
//! assert!((Deg(180.0).to_rad().value() - std::f64::consts::PI).abs() < 1e-9);
//! ```

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// 弧度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rad(pub f64);

impl Rad {
    pub const ZERO: Self = Rad(0.0);

    /// π/2 弧度（90度）
    pub const FRAC_PI_2: Self = Rad(std::f64::consts::FRAC_PI_2);

    #[inline]
    pub const fn new(value: f64) -> Self {
        Rad(value)
    }

    #[inline]
    pub fn to_deg(self) -> Deg {
        Deg(self.0.to_degrees())
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// 限制范围
    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Rad(self.0.clamp(min.0, max.0))
    }
}

impl fmt::Display for Rad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4} rad", self.0)
    }
}

/// 角度（NewType）
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Deg(pub f64);

impl Deg {
    pub const ZERO: Self = Deg(0.0);

    #[inline]
    pub const fn new(value: f64) -> Self {
        Deg(value)
    }

    #[inline]
    pub fn to_rad(self) -> Rad {
        Rad(self.0.to_radians())
    }

    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Deg(self.0.clamp(min.0, max.0))
    }
}

impl fmt::Display for Deg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}°", self.0)
    }
}

macro_rules! impl_linear_ops {
    ($unit:ident) => {
        impl Add for $unit {
            type Output = Self;
            #[inline]
            fn add(self, rhs: Self) -> Self {
                $unit(self.0 + rhs.0)
            }
        }

        impl Sub for $unit {
            type Output = Self;
            #[inline]
            fn sub(self, rhs: Self) -> Self {
                $unit(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $unit {
            type Output = Self;
            #[inline]
            fn mul(self, rhs: f64) -> Self {
                $unit(self.0 * rhs)
            }
        }

        impl Div<f64> for $unit {
            type Output = Self;
            #[inline]
            fn div(self, rhs: f64) -> Self {
                $unit(self.0 / rhs)
            }
        }

        /// 同单位相除得到无量纲比值
        impl Div for $unit {
            type Output = f64;
            #[inline]
            fn div(self, rhs: Self) -> f64 {
                self.0 / rhs.0
            }
        }

        impl Neg for $unit {
            type Output = Self;
            #[inline]
            fn neg(self) -> Self {
                $unit(-self.0)
            }
        }
    };
}

impl_linear_ops!(Rad);
impl_linear_ops!(Deg);

impl From<Deg> for Rad {
    fn from(deg: Deg) -> Self {
        deg.to_rad()
    }
}

impl From<Rad> for Deg {
    fn from(rad: Rad) -> Self {
        rad.to_deg()
    }
}
