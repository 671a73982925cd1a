//! 编解码与映射的属性测试
//!
//! 使用 proptest 验证校验和、载荷往返和角度/高度映射的性质。

mod common;

use common::{bus_reply, raw_reply};
use proptest::prelude::*;
use xarm_sdk::client::kinematics::{ArmModel, HEIGHT_TABLE_LEN, bearing_to_raw};
use xarm_sdk::client::{Deg, Rad, ServoDefinition};
use xarm_sdk::protocol::bus::{checksum, move_time_payload, parse_u16_pair};
use xarm_sdk::protocol::raw::{parse_positions, servo_move_payload};
use xarm_sdk::protocol::{
    BusCodec, BusCommand, Expect, FrameCodec, ProtocolError, RawCodec, RawCommand, Request, ServoTarget,
};

proptest! {
    /// 校验和：帧体字节和加上校验和恒为 0xFF
    #[test]
    fn bus_checksum_complements_sum(body in prop::collection::vec(any::<u8>(), 3..60)) {
        let sum = body.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        prop_assert_eq!(sum.wrapping_add(checksum(&body)), 0xFF);
    }

    /// 总线应答任意单字节篡改（签名之后）都会被拒绝
    #[test]
    fn bus_single_byte_mutation_rejected(
        servo_id in 0u8..=253,
        lo in any::<u8>(),
        hi in any::<u8>(),
        offset in 2usize..8,
        delta in 1u8..=255,
    ) {
        let mut reply = bus_reply(servo_id, BusCommand::PosRead, &[lo, hi]);
        let expect = Expect::new(BusCommand::PosRead, Some(servo_id), 2);
        prop_assert!(BusCodec.decode(&reply, &expect).is_ok());

        reply[offset] = reply[offset].wrapping_add(delta);
        let err = BusCodec.decode(&reply, &expect).unwrap_err();
        prop_assert!(err.is_validation_failure());
        if offset >= 5 {
            let is_checksum_mismatch = matches!(err, ProtocolError::ChecksumMismatch { .. });
            prop_assert!(is_checksum_mismatch);
        }
    }

    /// 总线写参数经编码、回环解码后保持不变
    #[test]
    fn bus_move_time_payload_roundtrip(servo_id in 0u8..=253, position in 0u16..=1000, time_ms in 0u16..=30_000) {
        let payload = move_time_payload(position, time_ms).unwrap();
        let frame = BusCodec
            .encode(&Request::addressed(BusCommand::MoveTimeRead, servo_id, &payload))
            .unwrap();
        let expect = Expect::new(BusCommand::MoveTimeRead, Some(servo_id), 4);
        let decoded = BusCodec.decode(frame.as_bytes(), &expect).unwrap();
        prop_assert_eq!(parse_u16_pair(decoded).unwrap(), (position, time_ms));
    }

    /// 控制板多舵机位置应答按请求顺序解析
    #[test]
    fn raw_positions_roundtrip(targets in prop::collection::vec((1u8..=6, 0u16..=1000), 1..=6)) {
        let targets: Vec<ServoTarget> = targets.into_iter().map(|(id, p)| ServoTarget::new(id, p)).collect();
        let ids: Vec<u8> = targets.iter().map(|t| t.id).collect();
        let expected: Vec<u16> = targets.iter().map(|t| t.position).collect();

        // 定时运动载荷去掉时间字段后与位置应答布局相同
        let mut payload = servo_move_payload(0, &targets).unwrap();
        payload.drain(1..3);

        let reply = raw_reply(u8::from(RawCommand::GetServoPosition), &payload);
        let expect = Expect::new(RawCommand::GetServoPosition, None, payload.len());
        let decoded = RawCodec.decode(&reply, &expect).unwrap();
        prop_assert_eq!(parse_positions(decoded, &ids).unwrap(), expected);
    }

    /// 角度 → 原始 → 角度 的误差不超过一个原始单位
    #[test]
    fn angle_roundtrip_within_resolution(
        min in -180.0..0.0f64,
        span in 1.0..360.0f64,
        t in 0.0..=1.0f64,
    ) {
        let def = ServoDefinition::new(1, Deg(min), Deg(min + span)).unwrap();
        let angle = Deg(min + span * t);
        let back = def.raw_to_angle(i32::from(def.angle_to_raw(angle)));
        prop_assert!((back.value() - angle.value()).abs() <= span / 1000.0 + 1e-9);
    }

    /// angle_to_raw 单调不减，越界时限幅到 0 / 1000
    #[test]
    fn angle_to_raw_monotonic_and_clamped(a in -720.0..720.0f64, b in -720.0..720.0f64) {
        let def = ServoDefinition::new(2, Deg(-90.0), Deg(90.0)).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(def.angle_to_raw(Deg(lo)) <= def.angle_to_raw(Deg(hi)));
        if lo <= -90.0 {
            prop_assert_eq!(def.angle_to_raw(Deg(lo)), 0);
        }
        if hi >= 90.0 {
            prop_assert_eq!(def.angle_to_raw(Deg(hi)), 1000);
        }
    }

    /// 高度反查：z == Pz[k] 时下标不超过 k
    #[test]
    fn height_inversion_bounded(
        l1 in 0.0..10.0f64,
        l2 in 0.0..10.0f64,
        l3 in 0.0..10.0f64,
        l4 in 0.0..10.0f64,
        k in 0usize..HEIGHT_TABLE_LEN,
    ) {
        let model = ArmModel::new(l1, l2, l3, l4).unwrap();
        let table = model.height_table();
        let pz = table.get(k).unwrap();
        prop_assert!(table.index_for_height(pz) <= k);

        let above = table.as_slice().iter().copied().fold(f64::MIN, f64::max) + 1.0;
        prop_assert_eq!(table.index_for_height(above), HEIGHT_TABLE_LEN - 1);
    }

    /// 底座舵机原始位置总在 100~500
    #[test]
    fn bearing_raw_bounded(teta in -10.0..10.0f64) {
        let raw = bearing_to_raw(Rad(teta));
        prop_assert!((100..=500).contains(&raw));
    }
}
