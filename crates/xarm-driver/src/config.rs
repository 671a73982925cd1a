//! 驱动配置
//!
//! 从 TOML 加载，例如：
//!
//! ```toml
//! transport = "serial"
//! read_timeout_ms = 500
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 115200
//! ```
//!
//! 未出现的字段使用默认值（USB 传输，读写超时各 1000 ms）。

use crate::error::DriverError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// 传输类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Usb,
    Serial,
}

/// USB 设备选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsbConfig {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl Default for UsbConfig {
    fn default() -> Self {
        Self {
            vendor_id: 0x0483,
            product_id: 0x5750,
        }
    }
}

/// 串口参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// 串口名（如 `/dev/ttyUSB0`、`COM3`）
    pub port: Option<String>,
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 9600,
        }
    }
}

/// 驱动配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub transport: TransportKind,
    /// 读超时（毫秒）：超时内没有字节到达视为无应答
    pub read_timeout_ms: u64,
    /// 写超时（毫秒）
    pub write_timeout_ms: u64,
    pub usb: UsbConfig,
    pub serial: SerialConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::Usb,
            read_timeout_ms: 1000,
            write_timeout_ms: 1000,
            usb: UsbConfig::default(),
            serial: SerialConfig::default(),
        }
    }
}

impl DriverConfig {
    /// 解析 TOML 文本并校验
    pub fn from_toml_str(content: &str) -> Result<Self, DriverError> {
        let config: DriverConfig =
            toml::from_str(content).map_err(|e| DriverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, DriverError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| DriverError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String, DriverError> {
        toml::to_string(self).map_err(|e| DriverError::Config(e.to_string()))
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DriverError> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?)
            .map_err(|e| DriverError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<(), DriverError> {
        if self.read_timeout_ms == 0 {
            return Err(DriverError::Config("read_timeout_ms must be positive".into()));
        }
        if self.write_timeout_ms == 0 {
            return Err(DriverError::Config("write_timeout_ms must be positive".into()));
        }
        if self.transport == TransportKind::Serial {
            if self.serial.port.as_deref().is_none_or(str::is_empty) {
                return Err(DriverError::Config(
                    "serial.port is required for the serial transport".into(),
                ));
            }
            if self.serial.baud_rate == 0 {
                return Err(DriverError::Config("serial.baud_rate must be positive".into()));
            }
        }
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DriverConfig::from_toml_str("").unwrap();
        assert_eq!(config, DriverConfig::default());
        assert_eq!(config.transport, TransportKind::Usb);
        assert_eq!(config.read_timeout(), Duration::from_millis(1000));
        assert_eq!(config.usb.vendor_id, 0x0483);
        assert_eq!(config.usb.product_id, 0x5750);
    }

    #[test]
    fn test_serial_config() {
        let config = DriverConfig::from_toml_str(
            r#"
transport = "serial"
read_timeout_ms = 250

[serial]
port = "/dev/ttyUSB0"
baud_rate = 115200
"#,
        )
        .unwrap();
        assert_eq!(config.transport, TransportKind::Serial);
        assert_eq!(config.read_timeout_ms, 250);
        assert_eq!(config.write_timeout_ms, 1000);
        assert_eq!(config.serial.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.serial.baud_rate, 115_200);
    }

    #[test]
    fn test_hex_usb_ids() {
        let config = DriverConfig::from_toml_str(
            r#"
[usb]
vendor_id = 0x1234
"#,
        )
        .unwrap();
        assert_eq!(config.usb.vendor_id, 0x1234);
        assert_eq!(config.usb.product_id, 0x5750);
    }

    #[test]
    fn test_serial_requires_port() {
        let err = DriverConfig::from_toml_str(r#"transport = "serial""#).unwrap_err();
        assert!(matches!(err, DriverError::Config(msg) if msg.contains("serial.port")));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(DriverConfig::from_toml_str("read_timeout_ms = 0").is_err());
        assert!(DriverConfig::from_toml_str("write_timeout_ms = 0").is_err());
    }

    #[test]
    fn test_rejects_unknown_transport() {
        let err = DriverConfig::from_toml_str(r#"transport = "bluetooth""#).unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xarm.toml");

        let mut config = DriverConfig::default();
        config.transport = TransportKind::Serial;
        config.serial.port = Some("COM3".to_string());
        config.save_to_file(&path).unwrap();

        let loaded = DriverConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DriverConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, DriverError::Config(_)));
    }
}
