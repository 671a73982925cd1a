//! 客户端类型

pub mod units;

pub use units::{Deg, Rad};
