use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub widget: WidgetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            remote: RemoteConfig::default(),
            widget: WidgetConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// 获取配置值的快捷方法
    pub fn get_value(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["version"] => Some(self.version.clone()),
            ["remote", "base_url"] => Some(self.remote.base_url.clone()),
            ["remote", "query_path"] => Some(self.remote.query_path.clone()),
            ["remote", "thread_header"] => Some(self.remote.thread_header.clone()),
            ["remote", "handshake_greeting"] => Some(self.remote.handshake_greeting.clone()),
            ["remote", "timeout_seconds"] => self.remote.timeout_seconds.map(|t| t.to_string()),
            ["widget", "welcome_message"] => self.widget.welcome_message.clone(),
            ["widget", "rich_text"] => Some(self.widget.rich_text.to_string()),
            ["widget", "fallback"] => Some(self.widget.fallback.to_string()),
            ["logging", "level"] => Some(self.logging.level.to_string()),
            ["logging", "file"] => self.logging.file.clone(),
            ["logging", "json_format"] => Some(self.logging.json_format.to_string()),
            _ => None,
        }
    }

    /// 设置配置值
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["remote", "base_url"] => {
                self.remote.base_url = value.to_string();
            }
            ["remote", "query_path"] => {
                self.remote.query_path = value.to_string();
            }
            ["remote", "thread_header"] => {
                self.remote.thread_header = value.to_string();
            }
            ["remote", "handshake_greeting"] => {
                self.remote.handshake_greeting = value.to_string();
            }
            ["remote", "timeout_seconds"] => {
                self.remote.timeout_seconds = match value {
                    "" | "none" => None,
                    _ => Some(value.parse().map_err(|_| {
                        ConfigError::Validation(format!("Invalid number: {}", value))
                    })?),
                };
            }
            ["widget", "welcome_message"] => {
                self.widget.welcome_message = Some(value.to_string());
            }
            ["widget", "rich_text"] => {
                self.widget.rich_text = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            ["widget", "fallback"] => {
                self.widget.fallback = value.parse()?;
            }
            ["logging", "level"] => {
                self.logging.level = value.parse()?;
            }
            ["logging", "file"] => {
                self.logging.file = Some(value.to_string());
            }
            ["logging", "json_format"] => {
                self.logging.json_format = value.parse().map_err(|_| {
                    ConfigError::Validation(format!("Invalid boolean: {}", value))
                })?;
            }
            _ => return Err(ConfigError::KeyNotFound(key.to_string())),
        }
        Ok(())
    }
}

/// 查询服务配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    pub base_url: String,
    pub query_path: String,
    /// 携带 continuity token 的请求头
    pub thread_header: String,
    /// 握手时代替空输入发送的文本
    pub handshake_greeting: String,
    /// 单次请求超时（秒），未设置则不限时
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:4000".to_string(),
            query_path: "/query".to_string(),
            thread_header: "threadid".to_string(),
            handshake_greeting: "Hi".to_string(),
            timeout_seconds: None,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// 离线回复策略
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FallbackKind {
    /// 关键词匹配的礼宾回复
    #[default]
    Concierge,
    /// 固定的连接失败道歉
    Apology,
}

impl std::fmt::Display for FallbackKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackKind::Concierge => write!(f, "concierge"),
            FallbackKind::Apology => write!(f, "apology"),
        }
    }
}

impl std::str::FromStr for FallbackKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "concierge" => Ok(FallbackKind::Concierge),
            "apology" => Ok(FallbackKind::Apology),
            _ => Err(ConfigError::Validation(format!("Invalid fallback: {}", s))),
        }
    }
}

/// Widget 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WidgetConfig {
    /// 为空时使用内置欢迎语
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
    pub rich_text: bool,
    pub fallback: FallbackKind,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            welcome_message: None,
            rich_text: true,
            fallback: FallbackKind::Concierge,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", level)
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.concierge/logs/concierge.log".to_string()),
            json_format: false,
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
