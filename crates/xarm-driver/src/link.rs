//! 请求/应答链路
//!
//! 把一个 [`FrameCodec`] 和一个 [`Transport`] 组合在一起：
//! 编码 → 写 → 读 → 解码。同一时间只有一个请求在途，链路本身不加锁。

use crate::error::DriverError;
use tracing::{debug, trace};
use xarm_protocol::{Expect, FrameCodec, MAX_FRAME_LEN, Request};
use xarm_transport::Transport;

/// 通用请求/应答链路
pub struct Link<T: Transport, C: FrameCodec> {
    transport: T,
    codec: C,
    buffer: [u8; MAX_FRAME_LEN],
}

impl<T: Transport, C: FrameCodec> Link<T, C> {
    pub fn new(transport: T, codec: C) -> Self {
        Self {
            transport,
            codec,
            buffer: [0u8; MAX_FRAME_LEN],
        }
    }

    pub fn open(&mut self) -> Result<(), DriverError> {
        self.transport.open()?;
        Ok(())
    }

    /// 关闭传输（幂等）
    pub fn close(&mut self) -> Result<(), DriverError> {
        self.transport.close()?;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.transport.is_open()
    }

    /// 只写不读
    pub fn send(&mut self, request: &Request<'_>) -> Result<(), DriverError> {
        let frame = self.codec.encode(request)?;
        debug!(
            "send cmd=0x{:02X} servo={:?} payload={} bytes",
            request.command,
            request.servo_id,
            request.payload.len()
        );
        self.transport.write(frame.as_bytes())?;
        Ok(())
    }

    /// 写入请求并等待应答，返回校验通过的载荷
    ///
    /// 写入前丢弃上一轮残留在缓冲区里的数据；读到 0 字节时返回 `NoResponse`。
    pub fn query(&mut self, request: &Request<'_>, expect: &Expect) -> Result<&[u8], DriverError> {
        self.send(request)?;

        let capacity = self.codec.response_capacity(expect).min(MAX_FRAME_LEN);
        self.buffer = [0u8; MAX_FRAME_LEN];
        let n = self.transport.read(&mut self.buffer[..capacity])?;
        trace!("recv {} bytes: {:02X?}", n, &self.buffer[..n]);

        let payload = self.codec.decode(&self.buffer[..n], expect)?;
        debug!("recv cmd=0x{:02X} payload={} bytes", expect.command, payload.len());
        Ok(payload)
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
