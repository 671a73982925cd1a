//! 集成测试共用的应答构造函数

#![allow(dead_code)]

use xarm_sdk::protocol::BusCommand;
use xarm_sdk::protocol::bus::checksum;

/// 控制板应答（补齐到 64 字节）
pub fn raw_reply(command: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0u8; 64];
    bytes[..4].copy_from_slice(&[0x55, 0x55, (payload.len() + 2) as u8, command]);
    bytes[4..4 + payload.len()].copy_from_slice(payload);
    bytes
}

/// 总线舵机应答
pub fn bus_reply(servo_id: u8, command: BusCommand, payload: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x55, 0x55, servo_id, (payload.len() + 3) as u8, u8::from(command)];
    bytes.extend_from_slice(payload);
    bytes.push(checksum(&bytes[2..]));
    bytes
}
