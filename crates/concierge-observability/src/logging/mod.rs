//! 结构化日志模块
//!
//! 提供基于 tracing 的结构化日志功能。

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::MakeWriter,
    layer::SubscriberExt,
    registry::LookupSpan,
    reload::{self, Handle},
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{Config, LoggingConfig};
use crate::error::{ObservabilityError, Result};

/// 日志级别重新加载句柄类型
type ReloadHandle = Handle<EnvFilter, Registry>;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// 日志管理器
///
/// 全局 subscriber 只能安装一次；管理器被丢弃时文件写入线程会刷新并退出。
#[derive(Debug)]
pub struct LogManager {
    /// 配置
    config: LoggingConfig,

    /// 过滤器重新加载句柄
    reload_handle: Arc<RwLock<ReloadHandle>>,

    /// 文件写入线程的守卫
    _file_guard: Option<WorkerGuard>,
}

impl LogManager {
    /// 安装全局 subscriber
    pub fn new(config: &Config) -> Result<Self> {
        let logging_config = config.logging.clone();

        let filter = build_filter(&logging_config)?;
        let (filter, reload_handle) = reload::Layer::new(filter);

        let stdout_layer = logging_config
            .stdout
            .then(|| fmt_layer(&logging_config, std::io::stdout, logging_config.ansi_colors));

        let (file_layer, file_guard) = match file_writer(&logging_config)? {
            Some((writer, guard)) => (Some(fmt_layer(&logging_config, writer, false)), Some(guard)),
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(stdout_layer)
            .with(file_layer)
            .try_init()
            .map_err(|e| ObservabilityError::init(e.to_string()))?;

        tracing::info!(
            target: "concierge_observability",
            app = %config.app_name,
            "Log manager initialized with level: {}",
            logging_config.level
        );

        Ok(Self {
            config: logging_config,
            reload_handle: Arc::new(RwLock::new(reload_handle)),
            _file_guard: file_guard,
        })
    }

    /// 动态更新日志级别
    pub fn update_level(&mut self, level: &str) -> Result<()> {
        let mut probe = self.config.clone();
        probe.level = level.to_string();
        let new_filter = build_filter(&probe)?;

        self.reload_handle
            .write()
            .modify(|filter| {
                *filter = new_filter;
            })
            .map_err(|e| ObservabilityError::logging(format!("Failed to update log level: {}", e)))?;

        self.config.level = level.to_string();

        tracing::info!(
            target: "concierge_observability",
            "Log level updated to: {}",
            level
        );

        Ok(())
    }

    /// 获取当前配置
    pub fn config(&self) -> &LoggingConfig {
        &self.config
    }
}

/// 构建环境过滤器
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    // 添加模块级别的过滤器
    for (module, level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

fn fmt_layer<S, W>(config: &LoggingConfig, writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(config.include_target)
        .with_line_number(config.include_line_number)
        .with_ansi(ansi);

    if config.json_format {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

fn file_writer(
    config: &LoggingConfig,
) -> Result<Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)>> {
    if !config.file {
        return Ok(None);
    }

    let path = config
        .file_path
        .as_ref()
        .ok_or_else(|| ObservabilityError::config("File logging enabled without a file path"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| ObservabilityError::config(format!("Invalid log file path: {:?}", path)))?;
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };

    std::fs::create_dir_all(&dir)?;
    let appender = tracing_appender::rolling::never(dir, file_name);
    Ok(Some(tracing_appender::non_blocking(appender)))
}

/// 创建带有会话上下文的 span
pub fn create_session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("session", session_id = %session_id)
}

/// 创建单轮对话的 span
pub fn create_turn_span(session_id: &str, message_id: &str) -> tracing::Span {
    tracing::info_span!(
        "turn",
        session_id = %session_id,
        message_id = %message_id,
    )
}
