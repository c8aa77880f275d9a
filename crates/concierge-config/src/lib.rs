pub mod config;
pub mod manager;

pub use config::{
    Config, ConfigError, ConfigResult, FallbackKind, LogLevel, LoggingConfig, RemoteConfig,
    WidgetConfig,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 Concierge 配置目录路径
pub fn concierge_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".concierge"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    concierge_dir().map(|dir| dir.join("config.json"))
}

/// 初始化 Concierge 目录结构
pub async fn init_concierge_dirs() -> ConfigResult<()> {
    if let Some(concierge) = concierge_dir() {
        tokio::fs::create_dir_all(&concierge).await?;
        tokio::fs::create_dir_all(concierge.join("logs")).await?;
    }
    Ok(())
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}
