//! Concierge Config 集成模块
//!
//! 把 concierge-config 中的 `logging` 段转换为观测性配置。

use concierge_config::{expand_tilde, LoggingConfig as FileLoggingConfig};

use crate::config::{Config, LoggingConfig};

impl From<&FileLoggingConfig> for LoggingConfig {
    fn from(file: &FileLoggingConfig) -> Self {
        let file_path = file.file.as_deref().and_then(expand_tilde);
        Self {
            level: file.level.to_string(),
            json_format: file.json_format,
            file: file_path.is_some(),
            file_path,
            ..Self::default()
        }
    }
}

impl Config {
    /// 从 concierge-config 配置构建
    pub fn from_concierge(app_name: impl Into<String>, config: &concierge_config::Config) -> Self {
        Self {
            app_name: app_name.into(),
            logging: LoggingConfig::from(&config.logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_config::LogLevel;

    #[test]
    fn test_from_concierge_config() {
        let mut file_config = concierge_config::Config::default();
        file_config.logging.level = LogLevel::Debug;
        file_config.logging.file = Some("/var/log/concierge/concierge.log".to_string());

        let config = Config::from_concierge("concierge-cli", &file_config);
        assert_eq!(config.app_name, "concierge-cli");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file);
        assert_eq!(
            config.logging.file_path.as_deref(),
            Some(std::path::Path::new("/var/log/concierge/concierge.log"))
        );
    }

    #[test]
    fn test_no_file_disables_file_output() {
        let mut file_config = concierge_config::Config::default();
        file_config.logging.file = None;

        let logging = LoggingConfig::from(&file_config.logging);
        assert!(!logging.file);
        assert!(logging.file_path.is_none());
        assert!(logging.stdout);
    }
}
