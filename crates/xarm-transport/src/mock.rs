//! Mock 传输（测试用）
//!
//! 预先排队应答，记录所有写入。内部状态通过 `Arc<Mutex<_>>` 共享，
//! 测试代码克隆一份句柄后即可在控制器持有传输对象期间检查流量。

use crate::{Transport, TransportDeviceError, TransportDeviceErrorKind, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Scripted {
    Bytes(Vec<u8>),
    Timeout,
    Error(TransportDeviceErrorKind),
}

#[derive(Debug, Default)]
struct MockState {
    open: bool,
    open_count: usize,
    close_count: usize,
    writes: Vec<Vec<u8>>,
    responses: VecDeque<Scripted>,
    fail_open: Option<TransportDeviceErrorKind>,
}

/// 脚本化 Mock 传输
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 排队一条应答（下一次 `read` 返回这些字节）
    pub fn push_response(&self, bytes: impl Into<Vec<u8>>) -> &Self {
        self.state.lock().responses.push_back(Scripted::Bytes(bytes.into()));
        self
    }

    /// 排队一次超时（`read` 返回 0）
    pub fn push_timeout(&self) -> &Self {
        self.state.lock().responses.push_back(Scripted::Timeout);
        self
    }

    /// 排队一次设备错误
    pub fn push_error(&self, kind: TransportDeviceErrorKind) -> &Self {
        self.state.lock().responses.push_back(Scripted::Error(kind));
        self
    }

    /// 下一次 `open` 失败
    pub fn fail_next_open(&self, kind: TransportDeviceErrorKind) {
        self.state.lock().fail_open = Some(kind);
    }

    /// 到目前为止写入的所有帧
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    pub fn last_write(&self) -> Option<Vec<u8>> {
        self.state.lock().writes.last().cloned()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    /// 尚未被读取的应答数量
    pub fn pending_responses(&self) -> usize {
        self.state.lock().responses.len()
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().open_count
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }
}

impl Transport for MockTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if let Some(kind) = state.fail_open.take() {
            return Err(TransportDeviceError::new(kind, "mock open failure").into());
        }
        if !state.open {
            state.open = true;
            state.open_count += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.open {
            state.open = false;
            state.close_count += 1;
        }
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        state.writes.push(bytes.to_vec());
        Ok(())
    }

    fn read(&mut self, buffer: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(TransportError::NotOpen);
        }
        match state.responses.pop_front() {
            Some(Scripted::Bytes(bytes)) => {
                let n = bytes.len().min(buffer.len());
                buffer[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            },
            Some(Scripted::Error(kind)) => Err(TransportDeviceError::new(kind, "mock read failure").into()),
            Some(Scripted::Timeout) | None => Ok(0),
        }
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }
}
