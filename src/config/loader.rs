//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `ALOUD_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `ALOUD_SESSION_STORE__URL=http://pdf-server:8000`
/// - `ALOUD_NARRATION__WORDS_PER_MINUTE=200`
/// - `ALOUD_PLAYBACK__PRESERVE_POSITION_ON_SETTINGS_CHANGE=true`
/// - `ALOUD_STORAGE__STATE_PATH=/data/state.sled`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级），音色列表由 serde default 提供
    builder = builder
        .set_default("session_store.url", "http://localhost:8000")?
        .set_default("session_store.timeout_secs", 30)?
        .set_default("upload.max_size_bytes", 20 * 1024 * 1024)?
        .set_default("narration.words_per_minute", 180)?
        .set_default("playback.preserve_position_on_settings_change", false)?
        .set_default("storage.state_path", "data/state.sled")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级），变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix("ALOUD")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.session_store.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Session store URL cannot be empty".to_string(),
        ));
    }

    if config.narration.words_per_minute == 0 {
        return Err(ConfigError::ValidationError(
            "Words per minute cannot be 0".to_string(),
        ));
    }

    if config
        .narration
        .voices
        .iter()
        .any(|v| v.name.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "Voice name cannot be empty".to_string(),
        ));
    }

    if config.storage.state_path.is_empty() {
        return Err(ConfigError::ValidationError(
            "State path cannot be empty".to_string(),
        ));
    }

    if config.upload.max_size_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Upload size limit cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Session Store URL: {}", config.session_store.url);
    tracing::info!("Session Store Timeout: {}s", config.session_store.timeout_secs);
    tracing::info!("Upload Limit: {} bytes", config.upload.max_size_bytes);
    tracing::info!("Words Per Minute: {}", config.narration.words_per_minute);
    tracing::info!("Voices: {}", config.narration.voices.len());
    tracing::info!(
        "Preserve Position On Settings Change: {}",
        config.playback.preserve_position_on_settings_change
    );
    tracing::info!("State Path: {}", config.storage.state_path);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
